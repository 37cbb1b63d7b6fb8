//! Registry of toolchain descriptors.
//!
//! Construction validates every descriptor up front: a registry either
//! holds complete descriptors for every action or does not exist. Nothing
//! degrades later at render time.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use crate::core::action::Action;
use crate::core::invocation::VariableOverrides;
use crate::errors::RuleError;

use super::select::ResolvedToolchain;
use super::{gcc_like, msvc_like, ActionTemplate, ToolchainDescriptor};

static BUILTIN: LazyLock<Result<ToolchainRegistry, RuleError>> =
    LazyLock::new(ToolchainRegistry::builtin);

/// The process-wide registry of built-in backends.
///
/// Built once on first use and never mutated afterwards.
pub fn registry() -> Result<&'static ToolchainRegistry, RuleError> {
    BUILTIN.as_ref().map_err(Clone::clone)
}

/// A validated, immutable set of toolchain descriptors.
#[derive(Debug, Clone)]
pub struct ToolchainRegistry {
    descriptors: BTreeMap<String, Arc<ToolchainDescriptor>>,
}

impl ToolchainRegistry {
    /// Build a registry, failing on the first incomplete or duplicate
    /// descriptor.
    pub fn new(descriptors: impl IntoIterator<Item = ToolchainDescriptor>) -> Result<Self, RuleError> {
        let mut map = BTreeMap::new();

        for descriptor in descriptors {
            if let Some(action) = descriptor.missing_actions().first() {
                return Err(RuleError::MissingTemplate {
                    backend: descriptor.name().to_string(),
                    action: *action,
                });
            }

            let name = descriptor.name().to_string();
            if map.contains_key(&name) {
                return Err(RuleError::DuplicateBackend { backend: name });
            }

            tracing::debug!("registered toolchain `{}`", name);
            map.insert(name, Arc::new(descriptor));
        }

        Ok(ToolchainRegistry { descriptors: map })
    }

    /// Registry with the built-in `gcc-like` and `msvc-like` backends.
    pub fn builtin() -> Result<Self, RuleError> {
        ToolchainRegistry::new([gcc_like(), msvc_like()])
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.descriptors.keys().cloned().collect()
    }

    /// Iterate over registered descriptors in name order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolchainDescriptor> + '_ {
        self.descriptors.values().map(|d| d.as_ref())
    }

    /// Check if a backend is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Look up the template of one action of one backend.
    ///
    /// Both failure modes are configuration errors naming the
    /// `(backend, action)` pair.
    pub fn get_template(&self, backend: &str, action: Action) -> Result<&ActionTemplate, RuleError> {
        let descriptor = self
            .descriptors
            .get(backend)
            .ok_or_else(|| RuleError::UnregisteredBackend {
                backend: backend.to_string(),
                action,
            })?;

        descriptor.get(action).ok_or_else(|| RuleError::MissingTemplate {
            backend: backend.to_string(),
            action,
        })
    }

    /// Select a backend by exact, case-sensitive name and bind caller
    /// overrides to it.
    pub fn select(
        &self,
        name: &str,
        overrides: VariableOverrides,
    ) -> Result<ResolvedToolchain, RuleError> {
        if name.is_empty() {
            return Err(RuleError::EmptyBackendName);
        }

        let descriptor = self
            .descriptors
            .get(name)
            .ok_or_else(|| RuleError::UnknownBackend {
                name: name.to_string(),
                available: self.names(),
            })?;

        tracing::debug!(
            "selected toolchain `{}` with {} override(s)",
            name,
            overrides.len()
        );

        Ok(ResolvedToolchain::new(Arc::clone(descriptor), overrides))
    }
}
