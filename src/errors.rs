//! Error types for rule rendering and dependency extraction.
//!
//! Two families are kept apart:
//! [`RuleError`] aborts the call that produced it, while
//! [`DependencyParseError`] only degrades dependency bookkeeping and never
//! fails the build step whose output it describes.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::action::Action;
use crate::util::diagnostic::Diagnostic;

/// What an error is fatal to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// The step (or the whole run) cannot proceed.
    Build,
    /// The artifact is fine; only incremental bookkeeping is degraded.
    Bookkeeping,
}

/// Broad classification of a [`RuleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleErrorKind {
    /// The descriptor registry is incomplete or inconsistent.
    Configuration,
    /// The caller asked for a backend that is not registered.
    UnknownBackend,
    /// The invocation itself is structurally invalid.
    InvalidInvocation,
}

/// Error raised while selecting a backend or rendering a rule.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum RuleError {
    #[error("toolchain `{backend}` has no template for action `{action}`")]
    #[diagnostic(
        code(rulesmith::toolchain::missing_template),
        help("every registered toolchain must define all actions")
    )]
    MissingTemplate { backend: String, action: Action },

    #[error("toolchain `{backend}` is not registered (requested for action `{action}`)")]
    #[diagnostic(code(rulesmith::toolchain::unregistered))]
    UnregisteredBackend { backend: String, action: Action },

    #[error("toolchain `{backend}` is registered more than once")]
    #[diagnostic(code(rulesmith::toolchain::duplicate))]
    DuplicateBackend { backend: String },

    #[error("unknown backend `{name}`")]
    #[diagnostic(code(rulesmith::select::unknown_backend))]
    UnknownBackend { name: String, available: Vec<String> },

    #[error("backend name must not be empty")]
    #[diagnostic(code(rulesmith::select::empty_name))]
    EmptyBackendName,

    #[error("invalid `{action}` invocation for `{}`: {reason}", output.display())]
    #[diagnostic(code(rulesmith::render::invalid_invocation))]
    InvalidInvocation {
        action: Action,
        output: PathBuf,
        reason: String,
    },
}

impl RuleError {
    /// Create an invalid invocation error.
    pub fn invalid(action: Action, output: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RuleError::InvalidInvocation {
            action,
            output: output.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> RuleErrorKind {
        match self {
            RuleError::MissingTemplate { .. }
            | RuleError::UnregisteredBackend { .. }
            | RuleError::DuplicateBackend { .. }
            | RuleError::EmptyBackendName => RuleErrorKind::Configuration,
            RuleError::UnknownBackend { .. } => RuleErrorKind::UnknownBackend,
            RuleError::InvalidInvocation { .. } => RuleErrorKind::InvalidInvocation,
        }
    }

    /// Rule errors always stop the call that raised them.
    pub fn scope(&self) -> ErrorScope {
        ErrorScope::Build
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RuleError::MissingTemplate { backend, action } => {
                Diagnostic::error(self.to_string())
                    .with_context(format!("backend: {}", backend))
                    .with_context(format!("action: {}", action))
                    .with_suggestion(format!(
                        "Add a `{}` template to the `{}` descriptor",
                        action, backend
                    ))
            }

            RuleError::UnregisteredBackend { backend, .. } => Diagnostic::error(self.to_string())
                .with_suggestion(format!(
                    "Register a descriptor named `{}` or pick a registered backend",
                    backend
                )),

            RuleError::DuplicateBackend { backend } => Diagnostic::error(self.to_string())
                .with_suggestion(format!("Give each `{}` descriptor a distinct name", backend)),

            RuleError::UnknownBackend { available, .. } => {
                let mut diag = Diagnostic::error(self.to_string());
                if !available.is_empty() {
                    diag = diag.with_context(format!(
                        "available backends: {}",
                        available.join(", ")
                    ));
                }
                diag.with_suggestion("Backend names are case-sensitive; check the spelling")
            }

            RuleError::EmptyBackendName => Diagnostic::error(self.to_string()).with_suggestion(
                "Pass `--backend <name>` or set `toolchain.backend` in .rulesmith/config.toml",
            ),

            RuleError::InvalidInvocation { output, .. } => {
                Diagnostic::error(self.to_string()).with_location(output)
            }
        }
    }
}

/// Malformed or missing dependency metadata.
///
/// Reported as a warning against the affected output; the artifact itself is
/// still considered built.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum DependencyParseError {
    #[error("dependency data is empty")]
    #[diagnostic(code(rulesmith::deps::empty))]
    Empty,

    #[error("line {line}: expected `<target>: <deps>` but found no colon")]
    #[diagnostic(code(rulesmith::deps::missing_colon))]
    MissingColon { line: usize },

    #[error("line {line}: rule has no target before the colon")]
    #[diagnostic(code(rulesmith::deps::missing_target))]
    MissingTarget { line: usize },

    #[error("line {line}: line continuation at end of input")]
    #[diagnostic(code(rulesmith::deps::unterminated_continuation))]
    UnterminatedContinuation { line: usize },

    #[error("depfile does not mention `{}`", expected.display())]
    #[diagnostic(
        code(rulesmith::deps::output_not_mentioned),
        help("the depfile was probably written by a different step")
    )]
    OutputNotMentioned { expected: PathBuf },

    #[error("failed to read `{}`: {message}", path.display())]
    #[diagnostic(code(rulesmith::deps::unreadable))]
    Unreadable { path: PathBuf, message: String },
}

impl DependencyParseError {
    /// Dependency errors never fail the step that produced the data.
    pub fn scope(&self) -> ErrorScope {
        ErrorScope::Bookkeeping
    }

    /// Convert to a warning diagnostic attached to `output`.
    pub fn to_diagnostic(&self, output: &std::path::Path) -> Diagnostic {
        Diagnostic::warning(format!(
            "dependency information for `{}` is unusable",
            output.display()
        ))
        .with_context(self.to_string())
        .with_location(output)
        .with_suggestion("The artifact was built; it will be treated as having unknown dependencies")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = RuleError::UnknownBackend {
            name: "clang-cl".to_string(),
            available: vec!["gcc-like".to_string()],
        };
        assert_eq!(err.kind(), RuleErrorKind::UnknownBackend);
        assert_eq!(err.scope(), ErrorScope::Build);

        let err = RuleError::MissingTemplate {
            backend: "gcc-like".to_string(),
            action: Action::Archive,
        };
        assert_eq!(err.kind(), RuleErrorKind::Configuration);
        assert!(err.to_string().contains("gcc-like"));
        assert!(err.to_string().contains("archive"));
    }

    #[test]
    fn test_unknown_backend_diagnostic_lists_names() {
        let err = RuleError::UnknownBackend {
            name: "clang-cl".to_string(),
            available: vec!["gcc-like".to_string(), "msvc-like".to_string()],
        };
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("error: unknown backend `clang-cl`"));
        assert!(output.contains("gcc-like, msvc-like"));
    }

    #[test]
    fn test_parse_error_is_bookkeeping_only() {
        let err = DependencyParseError::MissingColon { line: 3 };
        assert_eq!(err.scope(), ErrorScope::Bookkeeping);

        let output = err.to_diagnostic(std::path::Path::new("obj/a.o")).format(false);
        assert!(output.starts_with("warning:"));
        assert!(output.contains("line 3"));
    }
}
