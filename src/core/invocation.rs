//! Rule invocations and variable overrides.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::action::Action;

/// Environment variables recognised by [`VariableOverrides::from_env_vars`],
/// paired with the template variable they populate.
pub const ENV_VARIABLES: &[(&str, &str)] = &[
    ("CC", "cc"),
    ("CXX", "cxx"),
    ("AR", "ar"),
    ("ARFLAGS", "arflags"),
    ("CFLAGS", "cflags"),
    ("CXXFLAGS", "cxxflags"),
    ("CPPFLAGS", "cppflags"),
    ("ASFLAGS", "asflags"),
    ("LDFLAGS", "ldflags"),
    ("LIBS", "libs"),
];

/// Named string values substituted into rule templates.
///
/// Values are opaque: nothing here validates them. When two layers are
/// merged the later one wins key by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableOverrides {
    vars: BTreeMap<String, String>,
}

impl VariableOverrides {
    /// Create an empty set of overrides.
    pub fn new() -> Self {
        VariableOverrides::default()
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a variable, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Check if a variable is set.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Number of variables set.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Check if no variables are set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge another layer into this one (other takes precedence).
    pub fn merge(&mut self, other: &VariableOverrides) {
        for (name, value) in &other.vars {
            self.vars.insert(name.clone(), value.clone());
        }
    }

    /// Build overrides from environment-style variables.
    ///
    /// Only the names in [`ENV_VARIABLES`] are picked up; empty values are
    /// ignored. The caller decides where the pairs come from, so nothing
    /// here reads the process environment.
    pub fn from_env_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut overrides = VariableOverrides::new();
        for (key, value) in vars {
            let Some((_, name)) = ENV_VARIABLES.iter().find(|(env, _)| *env == key.as_ref())
            else {
                continue;
            };
            let value = value.into();
            if !value.is_empty() {
                overrides.set(*name, value);
            }
        }
        overrides
    }

    /// Parse a `NAME=VALUE` assignment.
    pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format!("invalid variable assignment `{}` (expected NAME=VALUE)", s))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("invalid variable assignment `{}`: empty name", s));
        }
        Ok((name.to_string(), value.to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableOverrides {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut overrides = VariableOverrides::new();
        for (k, v) in iter {
            overrides.set(k, v);
        }
        overrides
    }
}

/// A single build step to be rendered.
///
/// Inputs are kept exactly as given: no sorting and no deduplication, since
/// link order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInvocation {
    /// What kind of step this is
    pub action: Action,
    /// Ordered input paths
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    /// Primary output path
    pub output: PathBuf,
    /// Additional outputs (depfiles)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub extra_outputs: BTreeSet<PathBuf>,
    /// Per-invocation variable overrides
    #[serde(default, skip_serializing_if = "VariableOverrides::is_empty")]
    pub vars: VariableOverrides,
}

impl RuleInvocation {
    /// Create an invocation with no inputs yet.
    pub fn new(action: Action, output: impl Into<PathBuf>) -> Self {
        RuleInvocation {
            action,
            inputs: Vec::new(),
            output: output.into(),
            extra_outputs: BTreeSet::new(),
            vars: VariableOverrides::new(),
        }
    }

    /// Add an input.
    pub fn input(mut self, input: impl Into<PathBuf>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Add multiple inputs, preserving their order.
    pub fn inputs(mut self, inputs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Declare an extra output.
    pub fn extra_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_outputs.insert(path.into());
        self
    }

    /// Set a per-invocation variable.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.set(name, value);
        self
    }

    /// Replace the per-invocation variables.
    pub fn with_vars(mut self, vars: VariableOverrides) -> Self {
        self.vars = vars;
        self
    }
}
