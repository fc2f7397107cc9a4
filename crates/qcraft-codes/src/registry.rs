//! Code family registry.
//!
//! The [`FamilyRegistry`] pairs an ordered list of [`FamilyDescriptor`]s from
//! configuration with a table of provider factories registered at startup.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CodeError, CodeResult};
use crate::provider::FamilyProvider;
use crate::qldpc::{QLDPC_FAMILY, QldpcConfig, QldpcProvider};
use crate::surface::{SURFACE_FAMILY, SurfaceProvider};

/// Factory function type for family providers.
type ProviderFactory = Box<dyn Fn() -> Arc<dyn FamilyProvider> + Send + Sync>;

fn default_enabled() -> bool {
    true
}

/// A configured code family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDescriptor {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Registered factory to instantiate; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl FamilyDescriptor {
    /// An enabled family backed by the factory of the same name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            provider: None,
        }
    }

    /// Mark the family disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Name of the factory backing this family.
    pub fn provider_name(&self) -> &str {
        self.provider.as_deref().unwrap_or(&self.name)
    }
}

/// Default descriptors: surface, then qldpc, both enabled.
pub fn default_descriptors() -> Vec<FamilyDescriptor> {
    vec![
        FamilyDescriptor::new(SURFACE_FAMILY),
        FamilyDescriptor::new(QLDPC_FAMILY),
    ]
}

/// Registry of QEC code families.
pub struct FamilyRegistry {
    descriptors: Vec<FamilyDescriptor>,
    factories: FxHashMap<String, ProviderFactory>,
}

impl FamilyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            factories: FxHashMap::default(),
        }
    }

    /// Registry with the built-in surface and qldpc families.
    pub fn with_builtin_families() -> Self {
        Self::with_builtin_families_config(QldpcConfig::default())
    }

    /// Registry with the built-in families, using `qldpc` for the qLDPC codes.
    pub fn with_builtin_families_config(qldpc: QldpcConfig) -> Self {
        let mut registry = Self::new().with_descriptors(default_descriptors());
        registry.register_factory(SURFACE_FAMILY, || Arc::new(SurfaceProvider::new()));
        registry.register_factory(QLDPC_FAMILY, move || {
            Arc::new(QldpcProvider::with_config(qldpc.clone()))
        });
        registry
    }

    /// Replace the family descriptors.
    #[must_use]
    pub fn with_descriptors(mut self, descriptors: Vec<FamilyDescriptor>) -> Self {
        self.descriptors = descriptors;
        self
    }

    /// Register a provider factory.
    ///
    /// A factory registered under a name with no descriptor also adds an
    /// enabled descriptor for it.
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Arc<dyn FamilyProvider> + Send + Sync + 'static,
    ) {
        let name = name.into();
        debug!("Registering code family factory: {}", name);
        if !self.descriptors.iter().any(|d| d.provider_name() == name) {
            self.descriptors.push(FamilyDescriptor::new(name.clone()));
        }
        self.factories.insert(name, Box::new(factory));
    }

    /// Look up an enabled family by name.
    pub fn get_family_api(&self, name: &str) -> CodeResult<Arc<dyn FamilyProvider>> {
        let descriptor = self
            .descriptors
            .iter()
            .find(|d| d.name == name && d.enabled)
            .ok_or_else(|| CodeError::UnknownFamily(name.to_string()))?;
        let factory = self
            .factories
            .get(descriptor.provider_name())
            .ok_or_else(|| CodeError::UnknownFamily(name.to_string()))?;
        Ok(factory())
    }

    /// Enabled family names in descriptor order.
    pub fn enabled_families(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .filter(|d| d.enabled)
            .map(|d| d.name.clone())
            .collect()
    }

    /// All descriptors, enabled or not.
    pub fn descriptors(&self) -> &[FamilyDescriptor] {
        &self.descriptors
    }

    /// Check if an enabled family is available.
    pub fn has_family(&self, name: &str) -> bool {
        self.get_family_api(name).is_ok()
    }
}

impl Default for FamilyRegistry {
    fn default() -> Self {
        Self::with_builtin_families()
    }
}

impl std::fmt::Debug for FamilyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut factories: Vec<&String> = self.factories.keys().collect();
        factories.sort();
        f.debug_struct("FamilyRegistry")
            .field("descriptors", &self.descriptors)
            .field("factories", &factories)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_families() {
        let registry = FamilyRegistry::with_builtin_families();
        assert_eq!(registry.enabled_families(), vec!["surface", "qldpc"]);
        assert_eq!(registry.get_family_api("surface").unwrap().family(), "surface");
        assert_eq!(registry.get_family_api("qldpc").unwrap().family(), "qldpc");
    }

    #[test]
    fn test_unknown_family() {
        let registry = FamilyRegistry::with_builtin_families();
        assert!(matches!(
            registry.get_family_api("bacon-shor"),
            Err(CodeError::UnknownFamily(name)) if name == "bacon-shor"
        ));
        assert!(!registry.has_family("bacon-shor"));
    }

    #[test]
    fn test_disabled_family_is_unknown() {
        let mut registry = FamilyRegistry::new().with_descriptors(vec![
            FamilyDescriptor::new("surface"),
            FamilyDescriptor::new("qldpc").disabled(),
        ]);
        registry.register_factory("surface", || Arc::new(SurfaceProvider::new()));
        registry.register_factory("qldpc", || Arc::new(QldpcProvider::new()));
        assert_eq!(registry.enabled_families(), vec!["surface"]);
        assert!(matches!(registry.get_family_api("qldpc"), Err(CodeError::UnknownFamily(_))));
        assert_eq!(registry.descriptors().len(), 2);
    }

    #[test]
    fn test_descriptor_without_factory() {
        let registry = FamilyRegistry::new().with_descriptors(vec![FamilyDescriptor::new("color-only")]);
        assert_eq!(registry.enabled_families(), vec!["color-only"]);
        assert!(matches!(
            registry.get_family_api("color-only"),
            Err(CodeError::UnknownFamily(_))
        ));
    }

    #[test]
    fn test_descriptor_aliases_provider() {
        let mut registry = FamilyRegistry::new().with_descriptors(vec![FamilyDescriptor {
            name: "surface-lab".into(),
            enabled: true,
            provider: Some("surface".into()),
        }]);
        registry.register_factory("surface", || Arc::new(SurfaceProvider::new()));
        assert_eq!(registry.get_family_api("surface-lab").unwrap().family(), "surface");
        assert_eq!(registry.enabled_families(), vec!["surface-lab"]);
    }

    #[test]
    fn test_descriptor_deserialization_defaults() {
        let d: FamilyDescriptor = serde_json::from_str(r#"{"name": "qldpc"}"#).unwrap();
        assert!(d.enabled);
        assert_eq!(d.provider_name(), "qldpc");
    }
}
