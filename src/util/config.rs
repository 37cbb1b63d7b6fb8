//! Configuration file support for rulesmith.
//!
//! Two configuration file locations are read:
//! - Global: `~/.rulesmith/config.toml` - User-wide defaults
//! - Project: `.rulesmith/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Variables are merged
//! key by key, so a project can override `cc` without losing a global
//! `cflags`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::invocation::VariableOverrides;
use crate::deps::ParseErrorPolicy;

/// rulesmith configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Toolchain selection and variables
    pub toolchain: ToolchainSection,

    /// Dependency bookkeeping
    pub deps: DepsSection,
}

/// `[toolchain]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSection {
    /// Backend name (e.g. "gcc-like", "msvc-like")
    pub backend: Option<String>,

    /// Variable overrides bound at selection time
    #[serde(skip_serializing_if = "VariableOverrides::is_empty")]
    pub vars: VariableOverrides,
}

/// `[deps]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepsSection {
    /// What to do when dependency data cannot be parsed
    pub on_parse_error: Option<ParseErrorPolicy>,

    /// Dependency store location
    pub store: Option<PathBuf>,
}

impl RulesConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't
    /// exist or is broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }

        let contents =
            toml::to_string_pretty(self).with_context(|| "failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: RulesConfig) {
        if other.toolchain.backend.is_some() {
            self.toolchain.backend = other.toolchain.backend;
        }
        self.toolchain.vars.merge(&other.toolchain.vars);

        if other.deps.on_parse_error.is_some() {
            self.deps.on_parse_error = other.deps.on_parse_error;
        }
        if other.deps.store.is_some() {
            self.deps.store = other.deps.store;
        }
    }

    /// Configured backend, ignoring blank values.
    pub fn backend(&self) -> Option<&str> {
        self.toolchain
            .backend
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Effective parse error policy.
    pub fn parse_error_policy(&self) -> ParseErrorPolicy {
        self.deps.on_parse_error.unwrap_or_default()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.rulesmith/config.toml)
/// 2. Global config (~/.rulesmith/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> RulesConfig {
    let mut config = RulesConfig::default();

    if let Some(global_path) = global_path {
        config.merge(RulesConfig::load_or_default(global_path));
    }

    config.merge(RulesConfig::load_or_default(project_path));

    config
}

/// Get the global rulesmith config directory (~/.rulesmith).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".rulesmith"))
}

/// Get the global config path (~/.rulesmith/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.rulesmith/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".rulesmith").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = RulesConfig::default();
        assert!(config.backend().is_none());
        assert!(config.toolchain.vars.is_empty());
        assert_eq!(config.parse_error_policy(), ParseErrorPolicy::MarkStale);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[toolchain]
backend = "msvc-like"

[toolchain.vars]
cl = "clang-cl"
cflags = "-W4"

[deps]
on_parse_error = "warn"
store = "build/deps.json"
"#,
        )
        .unwrap();

        let config = RulesConfig::load(&config_path).unwrap();
        assert_eq!(config.backend(), Some("msvc-like"));
        assert_eq!(config.toolchain.vars.get("cl"), Some("clang-cl"));
        assert_eq!(config.toolchain.vars.get("cflags"), Some("-W4"));
        assert_eq!(config.parse_error_policy(), ParseErrorPolicy::Warn);
        assert_eq!(config.deps.store, Some(PathBuf::from("build/deps.json")));
    }

    #[test]
    fn test_config_rejects_unknown_policy() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[deps]\non_parse_error = \"retry\"\n").unwrap();

        assert!(RulesConfig::load(&config_path).is_err());
        assert_eq!(
            RulesConfig::load_or_default(&config_path),
            RulesConfig::default()
        );
    }

    #[test]
    fn test_config_merge() {
        let mut base = RulesConfig::default();
        base.toolchain.backend = Some("gcc-like".to_string());
        base.toolchain.vars.set("cc", "gcc-13");
        base.toolchain.vars.set("cflags", "-O2");

        let mut project = RulesConfig::default();
        project.toolchain.vars.set("cc", "clang");
        project.deps.on_parse_error = Some(ParseErrorPolicy::Warn);

        base.merge(project);

        assert_eq!(base.backend(), Some("gcc-like"));
        assert_eq!(base.toolchain.vars.get("cc"), Some("clang"));
        assert_eq!(base.toolchain.vars.get("cflags"), Some("-O2"));
        assert_eq!(base.parse_error_policy(), ParseErrorPolicy::Warn);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = project_config_path(tmp.path());

        let mut global_cfg = RulesConfig::default();
        global_cfg.toolchain.backend = Some("msvc-like".to_string());
        global_cfg.toolchain.vars.set("ldflags", "-debug");
        global_cfg.save(&global).unwrap();

        let mut project_cfg = RulesConfig::default();
        project_cfg.toolchain.backend = Some("gcc-like".to_string());
        project_cfg.save(&project).unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(config.backend(), Some("gcc-like"));
        assert_eq!(config.toolchain.vars.get("ldflags"), Some("-debug"));
    }

    #[test]
    fn test_blank_backend_is_unset() {
        let mut config = RulesConfig::default();
        config.toolchain.backend = Some("  ".to_string());
        assert!(config.backend().is_none());
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, &tmp.path().join("missing.toml"));
        assert_eq!(config, RulesConfig::default());
    }
}
