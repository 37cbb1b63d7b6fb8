//! Command implementations

pub mod backends;
pub mod deps;
pub mod plan;
pub mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};

use rulesmith::core::invocation::VariableOverrides;
use rulesmith::toolchain::{host_default_backend, infer_cxx, GCC_LIKE};
use rulesmith::util::config::{global_config_path, load_config, project_config_path};
use rulesmith::util::RulesConfig;

use crate::cli::ToolchainOpts;

/// Merged global and project configuration for the current directory.
pub fn current_config() -> Result<(PathBuf, RulesConfig)> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let config = load_config(global_config_path().as_deref(), &project_config_path(&cwd));
    Ok((cwd, config))
}

/// Where the backend name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSource {
    CommandLine,
    Plan,
    Config,
    HostDefault,
}

/// Backend name and variable layers chosen for one command.
pub struct ToolchainChoice {
    pub backend: String,
    pub source: BackendSource,
    /// Configuration and environment variables
    pub base: VariableOverrides,
    /// `--var` assignments
    pub cli: VariableOverrides,
}

impl ToolchainChoice {
    /// Resolve the backend (`--backend`, plan, config, host default) and
    /// collect the variable layers.
    pub fn resolve(opts: &ToolchainOpts, plan_backend: Option<&str>, config: &RulesConfig) -> Self {
        let (backend, source) = match (&opts.backend, plan_backend, config.backend()) {
            // An explicit empty name is passed on and rejected by selection
            (Some(name), _, _) => (name.clone(), BackendSource::CommandLine),
            (None, Some(name), _) => (name.to_string(), BackendSource::Plan),
            (None, None, Some(name)) => (name.to_string(), BackendSource::Config),
            (None, None, None) => (host_default_backend().to_string(), BackendSource::HostDefault),
        };

        match source {
            BackendSource::Config => tracing::info!("Using backend {} from config", backend),
            BackendSource::HostDefault => tracing::debug!("Using host default backend {}", backend),
            _ => tracing::debug!("Using backend {}", backend),
        }

        let mut base = config.toolchain.vars.clone();
        if opts.from_env {
            base.merge(&env_overrides(&backend));
        }

        let cli = opts.vars.iter().cloned().collect();

        ToolchainChoice {
            backend,
            source,
            base,
            cli,
        }
    }

    /// All layers merged, command line last.
    pub fn overrides(&self) -> VariableOverrides {
        let mut overrides = self.base.clone();
        overrides.merge(&self.cli);
        overrides
    }
}

/// Overrides imported from the process environment.
///
/// For gcc-like backends a C++ compiler is inferred from `CC` when `CXX`
/// is not set.
fn env_overrides(backend: &str) -> VariableOverrides {
    let mut overrides = VariableOverrides::from_env_vars(std::env::vars());
    if backend == GCC_LIKE && !overrides.contains("cxx") {
        if let Some(cc) = overrides.get("cc").map(str::to_string) {
            let cxx = infer_cxx(&cc);
            tracing::debug!("Inferred CXX={} from CC={}", cxx, cc);
            overrides.set("cxx", cxx);
        }
    }
    overrides
}
