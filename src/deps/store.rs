//! Persisted dependency records.
//!
//! The store is what the next build consults to decide whether an output is
//! stale. A successful extraction replaces the record for its output
//! wholesale; nothing is ever merged.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::DependencyParseError;
use crate::util::diagnostic::Diagnostic;
use crate::util::fs;

use super::{DependencyRecord, Extracted};

/// What to do with the stored record when new dependency data is unusable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseErrorPolicy {
    /// Drop the stored record so the output has no known dependencies and
    /// is treated as stale by the next build.
    #[default]
    MarkStale,
    /// Keep the previous record and only warn.
    Warn,
}

impl ParseErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorPolicy::MarkStale => "mark-stale",
            ParseErrorPolicy::Warn => "warn",
        }
    }
}

impl fmt::Display for ParseErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParseErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mark-stale" => Ok(ParseErrorPolicy::MarkStale),
            "warn" => Ok(ParseErrorPolicy::Warn),
            other => Err(format!(
                "unknown parse error policy `{}` (expected `mark-stale` or `warn`)",
                other
            )),
        }
    }
}

/// Outcome of dependency bookkeeping for one finished step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepStatus {
    /// A fresh record was stored.
    Recorded { dependencies: usize },
    /// The action does not report dependencies.
    Untracked,
    /// Dependency data was unusable; the artifact still stands.
    Degraded {
        error: DependencyParseError,
        policy: ParseErrorPolicy,
    },
}

/// Report for one finished step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Normalized output path
    pub output: PathBuf,
    pub status: DepStatus,
    /// Compiler output to forward to the user
    pub passthrough: Vec<String>,
}

impl StepReport {
    /// Report for an action without dependency capture.
    pub fn untracked(output: PathBuf, stdout: &str) -> Self {
        StepReport {
            output,
            status: DepStatus::Untracked,
            passthrough: stdout.lines().map(String::from).collect(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, DepStatus::Degraded { .. })
    }

    /// Warning to show the user, if bookkeeping was degraded.
    pub fn warning(&self) -> Option<Diagnostic> {
        match &self.status {
            DepStatus::Degraded { error, .. } => Some(error.to_diagnostic(&self.output)),
            _ => None,
        }
    }
}

/// Dependency records keyed by normalized output path.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DepStore {
    records: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl DepStore {
    /// Load a store from a JSON file. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(DepStore::default());
        }

        let content = fs::read_to_string(path)?;
        let store: DepStore = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dependency store: {}", path.display()))?;
        Ok(store)
    }

    /// Save the store as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write_string(path, &content)
    }

    /// Dependencies recorded for an output.
    pub fn get(&self, output: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.records.get(output)
    }

    /// Store a record, replacing any previous one for the same output.
    pub fn replace(&mut self, record: DependencyRecord) {
        self.records.insert(record.output, record.dependencies);
    }

    /// Forget an output.
    pub fn remove(&mut self, output: &Path) -> Option<BTreeSet<PathBuf>> {
        self.records.remove(output)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &BTreeSet<PathBuf>)> {
        self.records.iter()
    }

    /// Apply the extraction result of a finished step.
    ///
    /// Parse failures are logged and reflected in the report; they are
    /// never returned as errors.
    pub fn record_step(
        &mut self,
        output: &Path,
        result: Result<Extracted, DependencyParseError>,
        policy: ParseErrorPolicy,
    ) -> StepReport {
        match result {
            Ok(Extracted { record, passthrough }) => {
                let dependencies = record.dependencies.len();
                tracing::debug!(
                    "Recorded {} dependencies for {}",
                    dependencies,
                    output.display()
                );
                self.replace(record);
                StepReport {
                    output: output.to_path_buf(),
                    status: DepStatus::Recorded { dependencies },
                    passthrough,
                }
            }
            Err(error) => {
                tracing::warn!(
                    "Dependency information for {} is unusable ({}): {}",
                    output.display(),
                    policy,
                    error
                );
                if policy == ParseErrorPolicy::MarkStale {
                    self.remove(output);
                }
                StepReport {
                    output: output.to_path_buf(),
                    status: DepStatus::Degraded { error, policy },
                    passthrough: Vec::new(),
                }
            }
        }
    }
}
