//! Plan files.
//!
//! A plan is a TOML list of independent build steps plus the backend and
//! variables they share:
//!
//! ```toml
//! backend = "gcc-like"
//!
//! [vars]
//! cflags = "-O2 -Wall"
//!
//! [[step]]
//! action = "compile-c"
//! inputs = ["src/main.c"]
//! output = "obj/main.o"
//! ```
//!
//! Loading a plan schedules nothing. Steps are rendered independently and
//! in parallel; ordering them is up to whoever executes the commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::render::RenderedRule;
use crate::core::invocation::{RuleInvocation, VariableOverrides};
use crate::errors::RuleError;
use crate::toolchain::{self, ResolvedToolchain};
use crate::util::fs;

/// A set of build steps sharing one backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plan {
    /// Backend requested by the plan, if any
    pub backend: Option<String>,

    /// Directory the commands are run from, relative to the plan file
    pub working_dir: Option<PathBuf>,

    /// Plan-wide variables
    #[serde(skip_serializing_if = "VariableOverrides::is_empty")]
    pub vars: VariableOverrides,

    /// Build steps
    #[serde(rename = "step")]
    pub steps: Vec<RuleInvocation>,
}

impl Plan {
    /// Parse a plan from TOML.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse plan")
    }

    /// Load a plan file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut plan = Self::parse(&content)
            .with_context(|| format!("invalid plan: {}", path.display()))?;

        // A relative working directory is anchored at the plan file.
        let base = path.parent().unwrap_or(Path::new(""));
        plan.working_dir = Some(match plan.working_dir.take() {
            Some(dir) if dir.is_relative() => base.join(dir),
            Some(dir) => dir,
            None => base.to_path_buf(),
        });

        tracing::debug!("Loaded plan {} with {} steps", path.display(), plan.steps.len());
        Ok(plan)
    }

    /// Backend named by the plan, ignoring blank values.
    pub fn backend(&self) -> Option<&str> {
        self.backend
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Select `backend` with the plan's variables bound.
    ///
    /// Plan variables override `base` (configuration, environment) and are
    /// themselves overridden by `top` (command line).
    pub fn select(
        &self,
        backend: &str,
        base: &VariableOverrides,
        top: &VariableOverrides,
    ) -> Result<ResolvedToolchain, RuleError> {
        let mut overrides = base.clone();
        overrides.merge(&self.vars);
        overrides.merge(top);
        toolchain::select(backend, overrides)
    }

    /// Render every step, in plan order.
    pub fn render(&self, toolchain: &ResolvedToolchain) -> Vec<Result<RenderedRule, RuleError>> {
        toolchain.render_all(&self.steps)
    }

    /// Directory the commands run from.
    pub fn working_dir(&self) -> &Path {
        self.working_dir.as_deref().unwrap_or(Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::Action;
    use crate::toolchain::GCC_LIKE;

    const PLAN: &str = r#"
backend = "gcc-like"

[vars]
cflags = "-O2 -Wall"

[[step]]
action = "compile-c"
inputs = ["src/main.c"]
output = "obj/main.o"

[[step]]
action = "compile-c"
inputs = ["src/util.c"]
output = "obj/util.o"
vars = { cflags = "-O0" }

[[step]]
action = "link-exe"
inputs = ["obj/main.o", "obj/util.o", "libfoo.a"]
output = "app"
"#;

    #[test]
    fn test_parse_plan() {
        let plan = Plan::parse(PLAN).unwrap();
        assert_eq!(plan.backend(), Some(GCC_LIKE));
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.steps[2].action, Action::LinkExe);
        assert_eq!(plan.steps[1].vars.get("cflags"), Some("-O0"));
    }

    #[test]
    fn test_render_plan_layers_variables() {
        let plan = Plan::parse(PLAN).unwrap();
        let base = VariableOverrides::new().with("cc", "clang").with("cflags", "-g");
        let tc = plan
            .select(GCC_LIKE, &base, &VariableOverrides::new())
            .unwrap();

        let rules: Vec<RenderedRule> = plan
            .render(&tc)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        let main = rules[0].command.tokens();
        assert_eq!(main[0], "clang");
        assert!(main.contains(&"-Wall".to_string()));
        assert!(!main.contains(&"-g".to_string()));

        let util = rules[1].command.tokens();
        assert!(util.contains(&"-O0".to_string()));
        assert!(!util.contains(&"-O2".to_string()));

        let link = &rules[2].command.args;
        let pos: Vec<usize> = ["obj/main.o", "obj/util.o", "libfoo.a"]
            .iter()
            .map(|i| link.iter().position(|a| a == i).unwrap())
            .collect();
        assert!(pos.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_command_line_beats_plan_variables() {
        let plan = Plan::parse(PLAN).unwrap();
        let top = VariableOverrides::new().with("cflags", "-Os");
        let tc = plan
            .select(GCC_LIKE, &VariableOverrides::new(), &top)
            .unwrap();
        assert_eq!(tc.variable("cflags"), Some("-Os"));
    }

    #[test]
    fn test_invalid_step_does_not_hide_others() {
        let plan = Plan::parse(
            r#"
[[step]]
action = "archive"
output = "libempty.a"

[[step]]
action = "archive"
inputs = ["a.o"]
output = "liba.a"
"#,
        )
        .unwrap();
        let none = VariableOverrides::new();
        let tc = plan.select(GCC_LIKE, &none, &none).unwrap();
        let results = plan.render(&tc);

        assert!(matches!(results[0], Err(RuleError::InvalidInvocation { .. })));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_load_anchors_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(&path, "working_dir = \"build\"\n").unwrap();

        let plan = Plan::load(&path).unwrap();
        assert_eq!(plan.working_dir(), dir.path().join("build"));
        assert!(plan.steps.is_empty());
        assert!(plan.backend().is_none());
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let err = Plan::parse("[[step]]\naction = \"compile-rust\"\noutput = \"x\"\ninputs = [\"x.rs\"]\n");
        assert!(err.is_err());
    }
}
