//! Dependency extraction.
//!
//! Turns whatever a compiler reported about the headers it read (a
//! Makefile-style depfile, or `/showIncludes` lines on stdout) into one
//! backend-agnostic [`DependencyRecord`]. Paths are normalized so records
//! from different backends run from the same root compare equal.

pub mod depfile;
pub mod normalize;
pub mod show_includes;
pub mod store;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::render::RenderedRule;
use crate::errors::DependencyParseError;
use crate::toolchain::{DependencyMode, MSVC_DEPS_PREFIX};

pub use depfile::{parse_depfile, DepfileRule};
pub use normalize::normalize_path;
pub use show_includes::scan_show_includes;
pub use store::{DepStatus, DepStore, ParseErrorPolicy, StepReport};

/// Headers (and other discovered inputs) an output depends on beyond its
/// declared inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Normalized output path
    pub output: PathBuf,

    /// Normalized dependency paths
    pub dependencies: BTreeSet<PathBuf>,
}

impl DependencyRecord {
    /// Create an empty record for an output.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        DependencyRecord {
            output: output.into(),
            dependencies: BTreeSet::new(),
        }
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub record: DependencyRecord,

    /// Compiler output lines that were not dependency markers
    pub passthrough: Vec<String>,
}

/// What extraction needs to know about the step that ran.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Primary output as declared in the invocation
    pub output: PathBuf,

    /// Declared inputs; excluded from the record
    pub inputs: Vec<PathBuf>,

    /// Directory the action ran in
    pub working_dir: PathBuf,

    /// Marker that introduces an include line on stdout
    pub deps_prefix: String,
}

impl ExtractContext {
    /// Create a context with the default MSVC marker.
    pub fn new(output: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        ExtractContext {
            output: output.into(),
            inputs: Vec::new(),
            working_dir: working_dir.into(),
            deps_prefix: MSVC_DEPS_PREFIX.to_string(),
        }
    }

    /// Add declared inputs.
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Use a different stdout marker.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.deps_prefix = prefix.into();
        self
    }

    /// Context for a rendered rule run in `working_dir`.
    pub fn for_rule(rule: &RenderedRule, working_dir: &Path) -> Self {
        let ctx = ExtractContext::new(&rule.output, working_dir).with_inputs(rule.inputs.iter());
        match &rule.deps_prefix {
            Some(prefix) => ctx.with_prefix(prefix.as_str()),
            None => ctx,
        }
    }

    /// The normalized output path records are keyed by.
    pub fn output_key(&self) -> PathBuf {
        self.normalize(&self.output.to_string_lossy())
    }

    fn normalize(&self, path: &str) -> PathBuf {
        normalize_path(path, &self.working_dir)
    }

    fn declared_inputs(&self) -> BTreeSet<PathBuf> {
        self.inputs
            .iter()
            .map(|input| self.normalize(&input.to_string_lossy()))
            .collect()
    }

    /// Build a record from raw paths, dropping declared inputs.
    fn record<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> DependencyRecord {
        let declared = self.declared_inputs();
        let mut record = DependencyRecord::new(self.output_key());
        record.dependencies = paths
            .into_iter()
            .map(|path| self.normalize(path))
            .filter(|path| !declared.contains(path))
            .collect();
        record
    }
}

/// Extract a dependency record from raw compiler data.
///
/// `raw` is the depfile contents for [`DependencyMode::GccDepfile`] and the
/// captured stdout for the other modes.
pub fn extract(
    mode: DependencyMode,
    raw: &str,
    ctx: &ExtractContext,
) -> Result<Extracted, DependencyParseError> {
    match mode {
        DependencyMode::None => Ok(Extracted {
            record: DependencyRecord::new(ctx.output_key()),
            passthrough: raw.lines().map(String::from).collect(),
        }),

        DependencyMode::GccDepfile => {
            let rules = parse_depfile(raw)?;
            let expected = ctx.output_key();

            let matching: Vec<&DepfileRule> = rules
                .iter()
                .filter(|rule| rule.targets.iter().any(|t| ctx.normalize(t) == expected))
                .collect();

            if matching.is_empty() {
                return Err(DependencyParseError::OutputNotMentioned {
                    expected: ctx.output.clone(),
                });
            }

            let record = ctx.record(
                matching
                    .iter()
                    .flat_map(|rule| rule.deps.iter().map(String::as_str)),
            );
            Ok(Extracted {
                record,
                passthrough: Vec::new(),
            })
        }

        DependencyMode::MsvcStdoutScan => {
            let (includes, passthrough) = scan_show_includes(raw, &ctx.deps_prefix);
            Ok(Extracted {
                record: ctx.record(includes.iter().map(String::as_str)),
                passthrough,
            })
        }
    }
}

/// Read a depfile written by an action.
///
/// A missing file usually means the action was cancelled or failed before
/// writing it.
pub fn load_depfile(path: &Path) -> Result<String, DependencyParseError> {
    std::fs::read_to_string(path).map_err(|e| DependencyParseError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
