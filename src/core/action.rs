//! Abstract build actions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An abstract build step kind.
///
/// The set is closed: every registered toolchain must provide a template
/// for each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Compile a C source file to an object file
    CompileC,
    /// Compile a C++ source file to an object file
    CompileCxx,
    /// Link objects into an executable using the C driver
    LinkExe,
    /// Link objects into an executable using the C++ driver
    LinkCxxExe,
    /// Create a static library from object files
    Archive,
    /// Assemble an assembly source file
    Assemble,
    /// Run the preprocessor only
    Preprocess,
}

impl Action {
    /// Every action, in declaration order.
    pub const ALL: [Action; 7] = [
        Action::CompileC,
        Action::CompileCxx,
        Action::LinkExe,
        Action::LinkCxxExe,
        Action::Archive,
        Action::Assemble,
        Action::Preprocess,
    ];

    /// Get the action name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CompileC => "compile-c",
            Action::CompileCxx => "compile-cxx",
            Action::LinkExe => "link-exe",
            Action::LinkCxxExe => "link-cxx-exe",
            Action::Archive => "archive",
            Action::Assemble => "assemble",
            Action::Preprocess => "preprocess",
        }
    }

    /// Short tag used in progress descriptions.
    pub fn tag(&self) -> &'static str {
        match self {
            Action::CompileC => "CC",
            Action::CompileCxx => "CXX",
            Action::LinkExe | Action::LinkCxxExe => "LINK",
            Action::Archive => "AR",
            Action::Assemble => "AS",
            Action::Preprocess => "CPP",
        }
    }

    /// Whether this action translates a single source file.
    pub fn is_compile(&self) -> bool {
        matches!(self, Action::CompileC | Action::CompileCxx)
    }

    /// Whether this action combines objects and libraries into one artifact.
    ///
    /// Inputs of these actions form an ordered list where position matters
    /// (static library resolution order).
    pub fn is_link_like(&self) -> bool {
        matches!(self, Action::LinkExe | Action::LinkCxxExe | Action::Archive)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action `{0}` (expected one of: compile-c, compile-cxx, link-exe, link-cxx-exe, archive, assemble, preprocess)")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}
