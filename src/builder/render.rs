//! Rule rendering.
//!
//! Turns a [`RuleInvocation`] plus a [`ResolvedToolchain`] into a concrete
//! token sequence. A template token that is exactly one `${name}` placeholder
//! may expand to any number of tokens (`${in}` to every input, a flags
//! variable to its shell words); a token mixing text and placeholders is
//! substituted in place and stays one token.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::core::action::Action;
use crate::core::invocation::{RuleInvocation, VariableOverrides};
use crate::errors::RuleError;
use crate::toolchain::{CommandSpec, DependencyMode, ResolvedToolchain};

/// Variables bound from the invocation; callers cannot override them.
pub const RESERVED_VARIABLES: [&str; 3] = ["in", "out", "depfile"];

/// Variable holding the `/showIncludes` line prefix.
pub const DEPS_PREFIX_VARIABLE: &str = "msvc_deps_prefix";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

static WHOLE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{([A-Za-z_][A-Za-z0-9_]*)\}$").expect("placeholder pattern is valid")
});

/// A rule ready for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRule {
    /// Backend that rendered this rule
    pub backend: String,
    /// Action that was rendered
    pub action: Action,
    /// Command to run
    pub command: CommandSpec,
    /// Progress label, e.g. `CC obj/main.o`
    pub description: String,
    /// Declared inputs, in invocation order
    pub inputs: Vec<PathBuf>,
    /// Primary output
    pub output: PathBuf,
    /// Extra outputs, including the depfile if one is written
    pub extra_outputs: BTreeSet<PathBuf>,
    /// Depfile the command writes, for depfile-based actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depfile: Option<PathBuf>,
    /// How dependencies are reported after execution
    pub dependency_mode: DependencyMode,
    /// Stdout prefix marking included headers, for stdout-scanning actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps_prefix: Option<String>,
}

/// Values a template can see while rendering.
struct Scope<'a> {
    toolchain: &'a ResolvedToolchain,
    vars: Option<&'a VariableOverrides>,
    inputs: &'a [PathBuf],
    output: Option<&'a Path>,
    depfile: Option<&'a Path>,
}

impl<'a> Scope<'a> {
    fn toolchain_only(toolchain: &'a ResolvedToolchain) -> Self {
        Scope {
            toolchain,
            vars: None,
            inputs: &[],
            output: None,
            depfile: None,
        }
    }

    /// Invocation overrides, then toolchain overrides, then descriptor
    /// defaults, then the empty string.
    fn variable(&self, name: &str) -> &str {
        self.vars
            .and_then(|vars| vars.get(name))
            .or_else(|| self.toolchain.variable(name))
            .unwrap_or("")
    }

    fn inline_value(&self, name: &str) -> String {
        match name {
            "in" => self
                .inputs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" "),
            "out" => self
                .output
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "depfile" => self
                .depfile
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => self.variable(name).to_string(),
        }
    }

    fn expand_inline(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| self.inline_value(&caps[1]))
            .into_owned()
    }

    /// Expand one template token, appending the resulting tokens.
    fn expand_token(&self, token: &str, out: &mut Vec<String>) -> Result<(), String> {
        if let Some(caps) = WHOLE_PLACEHOLDER.captures(token) {
            match &caps[1] {
                "in" => out.extend(self.inputs.iter().map(|p| p.display().to_string())),
                "out" => out.extend(self.output.map(|p| p.display().to_string())),
                "depfile" => out.extend(self.depfile.map(|p| p.display().to_string())),
                name => out.extend(split_words(name, self.variable(name))?),
            }
        } else if PLACEHOLDER.is_match(token) {
            let expanded = self.expand_inline(token);
            if !expanded.is_empty() {
                out.push(expanded);
            }
        } else {
            out.push(token.to_string());
        }
        Ok(())
    }
}

/// Split a variable value into shell words.
fn split_words(name: &str, value: &str) -> Result<Vec<String>, String> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    shlex::split(value).ok_or_else(|| format!("variable `{}` has unbalanced quotes: {}", name, value))
}

/// Program named by an executable template, resolved against toolchain-level
/// variables only. Launcher words count as the program.
pub(crate) fn executable_program(executable: &str, toolchain: &ResolvedToolchain) -> Option<String> {
    let scope = Scope::toolchain_only(toolchain);
    split_words("executable", &scope.expand_inline(executable))
        .ok()?
        .into_iter()
        .next()
}

/// Depfile location: the first `.d` extra output, or `<output>.d`.
fn depfile_path(invocation: &RuleInvocation) -> PathBuf {
    invocation
        .extra_outputs
        .iter()
        .find(|p| p.extension().is_some_and(|ext| ext == "d"))
        .cloned()
        .unwrap_or_else(|| {
            let mut path = invocation.output.clone().into_os_string();
            path.push(".d");
            PathBuf::from(path)
        })
}

fn validate(invocation: &RuleInvocation, toolchain: &ResolvedToolchain) -> Result<(), RuleError> {
    let invalid = |reason: String| RuleError::invalid(invocation.action, &invocation.output, reason);

    if invocation.output.as_os_str().is_empty() {
        return Err(invalid("output path is empty".to_string()));
    }

    if invocation.inputs.is_empty() {
        return Err(invalid("at least one input is required".to_string()));
    }

    if invocation.inputs.iter().any(|p| p.as_os_str().is_empty()) {
        return Err(invalid("input paths must not be empty".to_string()));
    }

    for name in RESERVED_VARIABLES {
        if invocation.vars.contains(name) || toolchain.overrides().contains(name) {
            return Err(invalid(format!("variable `{}` is reserved", name)));
        }
    }

    Ok(())
}

/// Render an invocation against a resolved toolchain.
pub fn render(
    invocation: &RuleInvocation,
    toolchain: &ResolvedToolchain,
) -> Result<RenderedRule, RuleError> {
    validate(invocation, toolchain)?;

    let action = invocation.action;
    let template = toolchain.template(action)?;
    let mode = template.dependency_mode;
    let invalid = |reason: String| RuleError::invalid(action, &invocation.output, reason);

    let depfile = (mode == DependencyMode::GccDepfile).then(|| depfile_path(invocation));

    let scope = Scope {
        toolchain,
        vars: Some(&invocation.vars),
        inputs: &invocation.inputs,
        output: Some(&invocation.output),
        depfile: depfile.as_deref(),
    };

    let mut words = split_words("executable", &scope.expand_inline(&template.executable))
        .map_err(invalid)?
        .into_iter();
    let program = words.next().ok_or_else(|| {
        invalid(format!(
            "executable `{}` resolves to an empty string",
            template.executable
        ))
    })?;

    let mut args: Vec<String> = words.collect();
    for token in &template.flags {
        scope.expand_token(token, &mut args).map_err(invalid)?;
    }

    let mut extra_outputs = invocation.extra_outputs.clone();
    if let Some(ref depfile) = depfile {
        extra_outputs.insert(depfile.clone());
    }

    let deps_prefix = (mode == DependencyMode::MsvcStdoutScan)
        .then(|| scope.variable(DEPS_PREFIX_VARIABLE).to_string());

    let command = CommandSpec::new(program).args(args);
    let description = format!("{} {}", action.tag(), invocation.output.display());

    tracing::debug!("{}: {}", description, command.display_line());

    Ok(RenderedRule {
        backend: toolchain.name().to_string(),
        action,
        command,
        description,
        inputs: invocation.inputs.clone(),
        output: invocation.output.clone(),
        extra_outputs,
        depfile,
        dependency_mode: mode,
        deps_prefix,
    })
}
