//! Backend selection.
//!
//! [`ResolvedToolchain`] is the one handle callers hold: a descriptor with
//! the caller's overrides bound to it, so every render for that backend sees
//! them without passing them again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::builder::render::{self, RenderedRule};
use crate::core::action::Action;
use crate::core::invocation::{RuleInvocation, VariableOverrides};
use crate::deps::{self, DepStore, ExtractContext, Extracted, ParseErrorPolicy, StepReport};
use crate::errors::{DependencyParseError, RuleError};

use super::registry::registry;
use super::{ActionTemplate, DependencyMode, ToolchainDescriptor, GCC_LIKE, MSVC_LIKE};

/// Select a built-in backend by name.
///
/// Shorthand for `registry()?.select(name, overrides)`.
pub fn select(name: &str, overrides: VariableOverrides) -> Result<ResolvedToolchain, RuleError> {
    registry()?.select(name, overrides)
}

/// The backend a host would use when nothing else is configured.
pub fn host_default_backend() -> &'static str {
    if cfg!(target_os = "windows") {
        MSVC_LIKE
    } else {
        GCC_LIKE
    }
}

/// Result of looking a tool up on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolProbe {
    /// Program name as it appears in rendered commands
    pub program: String,
    /// Actions that invoke this program
    pub actions: Vec<Action>,
    /// Where it was found, if anywhere
    pub path: Option<PathBuf>,
}

/// A descriptor with caller-supplied overrides applied at the descriptor
/// level.
#[derive(Debug, Clone)]
pub struct ResolvedToolchain {
    descriptor: Arc<ToolchainDescriptor>,
    overrides: VariableOverrides,
}

impl ResolvedToolchain {
    pub(crate) fn new(descriptor: Arc<ToolchainDescriptor>, overrides: VariableOverrides) -> Self {
        ResolvedToolchain {
            descriptor,
            overrides,
        }
    }

    /// Backend name.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Overrides bound at selection time.
    pub fn overrides(&self) -> &VariableOverrides {
        &self.overrides
    }

    /// Resolve a variable: selection-time overrides first, then the
    /// descriptor's defaults.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.overrides
            .get(name)
            .or_else(|| self.descriptor.defaults().get(name))
    }

    /// Template for an action.
    pub fn template(&self, action: Action) -> Result<&ActionTemplate, RuleError> {
        self.descriptor
            .get(action)
            .ok_or_else(|| RuleError::MissingTemplate {
                backend: self.name().to_string(),
                action,
            })
    }

    /// Render one invocation.
    pub fn render(&self, invocation: &RuleInvocation) -> Result<RenderedRule, RuleError> {
        render::render(invocation, self)
    }

    /// Render many independent invocations in parallel.
    ///
    /// Results come back in the order of `invocations`.
    pub fn render_all(&self, invocations: &[RuleInvocation]) -> Vec<Result<RenderedRule, RuleError>> {
        invocations
            .par_iter()
            .map(|invocation| self.render(invocation))
            .collect()
    }

    /// Extract dependencies for a rendered rule from raw compiler data.
    ///
    /// `raw` is the depfile contents for depfile-based actions and the
    /// captured stdout otherwise.
    pub fn extract(
        &self,
        rule: &RenderedRule,
        raw: &str,
        working_dir: &Path,
    ) -> Result<Extracted, DependencyParseError> {
        let ctx = ExtractContext::for_rule(rule, working_dir);
        deps::extract(rule.dependency_mode, raw, &ctx)
    }

    /// Record the dependencies of a step that has finished executing.
    ///
    /// Reads the depfile for depfile-based actions, scans `stdout` for the
    /// others, and updates `store` according to `policy`. Dependency
    /// problems are reported in the returned [`StepReport`], never as an
    /// error: the step's artifact stands regardless.
    pub fn finish_step(
        &self,
        rule: &RenderedRule,
        stdout: &str,
        working_dir: &Path,
        store: &mut DepStore,
        policy: ParseErrorPolicy,
    ) -> StepReport {
        let ctx = ExtractContext::for_rule(rule, working_dir);
        let output = ctx.output_key();

        match rule.dependency_mode {
            DependencyMode::None => StepReport::untracked(output, stdout),
            DependencyMode::GccDepfile => {
                let result = match &rule.depfile {
                    Some(depfile) => deps::load_depfile(&working_dir.join(depfile))
                        .and_then(|content| deps::extract(rule.dependency_mode, &content, &ctx)),
                    None => Err(DependencyParseError::Empty),
                };
                // The depfile carries no diagnostics; stdout is forwarded whole
                let mut report = store.record_step(&output, result, policy);
                report.passthrough = stdout.lines().map(String::from).collect();
                report
            }
            DependencyMode::MsvcStdoutScan => {
                let result = deps::extract(rule.dependency_mode, stdout, &ctx);
                store.record_step(&output, result, policy)
            }
        }
    }

    /// Look every program used by this toolchain up on `PATH`.
    pub fn probe(&self) -> Vec<ToolProbe> {
        let mut probes: Vec<ToolProbe> = Vec::new();

        for action in Action::ALL {
            let Some(program) = self
                .descriptor
                .get(action)
                .and_then(|t| render::executable_program(&t.executable, self))
            else {
                continue;
            };

            match probes.iter_mut().find(|p| p.program == program) {
                Some(probe) => probe.actions.push(action),
                None => {
                    let path = which::which(&program).ok();
                    probes.push(ToolProbe {
                        program,
                        actions: vec![action],
                        path,
                    });
                }
            }
        }

        probes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_binds_overrides() {
        let tc = select(GCC_LIKE, VariableOverrides::new().with("cc", "clang")).unwrap();
        assert_eq!(tc.name(), GCC_LIKE);
        assert_eq!(tc.variable("cc"), Some("clang"));
        assert_eq!(tc.variable("cxx"), Some("g++"));
        assert_eq!(tc.variable("nonexistent"), None);
    }

    #[test]
    fn test_unknown_backend_is_not_defaulted() {
        let err = select("clang-cl", VariableOverrides::new()).unwrap_err();
        assert!(matches!(err, RuleError::UnknownBackend { .. }));
    }

    #[test]
    fn test_host_default_is_registered() {
        assert!(registry().unwrap().contains(host_default_backend()));
    }

    #[test]
    fn test_probe_groups_actions_by_program() {
        let tc = select(MSVC_LIKE, VariableOverrides::new()).unwrap();
        let probes = tc.probe();

        let cl = probes.iter().find(|p| p.program == "cl").unwrap();
        assert!(cl.actions.contains(&Action::CompileC));
        assert!(cl.actions.contains(&Action::Preprocess));

        let link = probes.iter().find(|p| p.program == "link").unwrap();
        assert_eq!(link.actions, vec![Action::LinkExe, Action::LinkCxxExe]);
    }

    #[test]
    fn test_render_all_preserves_order() {
        let tc = select(GCC_LIKE, VariableOverrides::new()).unwrap();
        let invocations: Vec<_> = (0..16)
            .map(|i| {
                RuleInvocation::new(Action::CompileC, format!("obj/{}.o", i))
                    .input(format!("src/{}.c", i))
            })
            .collect();

        let rendered = tc.render_all(&invocations);
        for (i, rule) in rendered.into_iter().enumerate() {
            assert_eq!(rule.unwrap().output, PathBuf::from(format!("obj/{}.o", i)));
        }
    }
}
