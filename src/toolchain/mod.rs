//! Toolchain descriptors.
//!
//! A descriptor is plain data: for every [`Action`] it names the executable,
//! the ordered flag template and the way the compiler reports header
//! dependencies. One rendering engine interprets all descriptors, so adding
//! a backend means adding one descriptor and nothing else.
//!
//! Templates reference variables as `${name}`. `in`, `out` and `depfile` are
//! reserved and bound from the invocation being rendered.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::action::Action;
use crate::core::invocation::VariableOverrides;

mod gcc;
mod msvc;
mod registry;
mod select;

pub use gcc::{gcc_like, infer_cxx, GCC_LIKE};
pub use msvc::{msvc_like, MSVC_DEPS_PREFIX, MSVC_LIKE};
pub use registry::{registry, ToolchainRegistry};
pub use select::{host_default_backend, select, ResolvedToolchain, ToolProbe};

/// How a backend reports the headers a compile step read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyMode {
    /// No dependency information is produced.
    #[serde(rename = "none")]
    None,
    /// The compiler writes a Makefile fragment next to the output.
    #[serde(rename = "gcc-style-depfile")]
    GccDepfile,
    /// The compiler prints `Note: including file:` lines on stdout.
    #[serde(rename = "msvc-style-stdout-scan")]
    MsvcStdoutScan,
}

impl DependencyMode {
    /// Get the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyMode::None => "none",
            DependencyMode::GccDepfile => "gcc-style-depfile",
            DependencyMode::MsvcStdoutScan => "msvc-style-stdout-scan",
        }
    }
}

impl fmt::Display for DependencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(DependencyMode::None),
            "gcc-style-depfile" | "gcc" => Ok(DependencyMode::GccDepfile),
            "msvc-style-stdout-scan" | "msvc" => Ok(DependencyMode::MsvcStdoutScan),
            other => Err(format!(
                "unknown dependency mode `{}` (expected none, gcc-style-depfile or msvc-style-stdout-scan)",
                other
            )),
        }
    }
}

/// A command to execute: program and arguments.
///
/// Arguments are final tokens: they are passed to the process directly and
/// never re-interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    /// The program to run (e.g., "gcc", "cl")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// The full token sequence, program first.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.args.len() + 1);
        tokens.push(self.program.display().to_string());
        tokens.extend(self.args.iter().cloned());
        tokens
    }

    /// Render the command for display, quoting tokens where a POSIX shell
    /// would need it.
    pub fn display_line(&self) -> String {
        let tokens = self.tokens();
        shlex::try_join(tokens.iter().map(String::as_str)).unwrap_or_else(|_| tokens.join(" "))
    }
}

/// Template for one action of one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionTemplate {
    /// Executable template; may expand to a launcher followed by the program
    pub executable: String,
    /// Ordered flag template tokens
    pub flags: Vec<String>,
    /// How this action reports header dependencies
    pub dependency_mode: DependencyMode,
}

impl ActionTemplate {
    /// Create a template with no dependency tracking.
    pub fn new(
        executable: impl Into<String>,
        flags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        ActionTemplate {
            executable: executable.into(),
            flags: flags.into_iter().map(Into::into).collect(),
            dependency_mode: DependencyMode::None,
        }
    }

    /// Set the dependency mode.
    pub fn deps(mut self, mode: DependencyMode) -> Self {
        self.dependency_mode = mode;
        self
    }
}

impl fmt::Display for ActionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.executable)?;
        for flag in &self.flags {
            write!(f, " {}", flag)?;
        }
        Ok(())
    }
}

/// File naming conventions for artifacts produced by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArtifactConventions {
    /// Object file extension (without dot)
    pub object_extension: &'static str,
    /// Static library prefix (e.g., "lib" on Unix)
    pub static_lib_prefix: &'static str,
    /// Static library extension (without dot)
    pub static_lib_extension: &'static str,
    /// Executable extension (without dot, may be empty)
    pub exe_extension: &'static str,
}

impl ArtifactConventions {
    /// Object file name for a source stem.
    pub fn object_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.object_extension)
    }

    /// Static library file name for a library name.
    pub fn static_lib_name(&self, name: &str) -> String {
        format!(
            "{}{}.{}",
            self.static_lib_prefix, name, self.static_lib_extension
        )
    }

    /// Executable file name.
    pub fn exe_name(&self, name: &str) -> String {
        if self.exe_extension.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", name, self.exe_extension)
        }
    }
}

/// Everything a backend needs to turn actions into commands.
#[derive(Debug, Clone, Serialize)]
pub struct ToolchainDescriptor {
    name: String,
    templates: BTreeMap<Action, ActionTemplate>,
    defaults: VariableOverrides,
    conventions: ArtifactConventions,
}

impl ToolchainDescriptor {
    /// Start a descriptor with no templates.
    pub fn new(name: impl Into<String>, conventions: ArtifactConventions) -> Self {
        ToolchainDescriptor {
            name: name.into(),
            templates: BTreeMap::new(),
            defaults: VariableOverrides::new(),
            conventions,
        }
    }

    /// Add a backend-level default variable.
    pub fn default_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.set(name, value);
        self
    }

    /// Add the template for an action.
    pub fn template(mut self, action: Action, template: ActionTemplate) -> Self {
        self.templates.insert(action, template);
        self
    }

    /// Backend name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template for an action, if defined.
    pub fn get(&self, action: Action) -> Option<&ActionTemplate> {
        self.templates.get(&action)
    }

    /// Iterate over defined templates in action order.
    pub fn templates(&self) -> impl Iterator<Item = (Action, &ActionTemplate)> + '_ {
        self.templates.iter().map(|(a, t)| (*a, t))
    }

    /// Backend-level default variables.
    pub fn defaults(&self) -> &VariableOverrides {
        &self.defaults
    }

    /// Artifact naming conventions.
    pub fn conventions(&self) -> &ArtifactConventions {
        &self.conventions
    }

    /// Actions that have no template.
    pub fn missing_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| !self.templates.contains_key(a))
            .collect()
    }
}
