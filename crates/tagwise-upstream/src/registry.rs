//! Provider registry for resolving upstream backends by name

use crate::openai::OpenAiProvider;
use crate::provider::Provider;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tagwise_core::ProviderConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("provider not found: {0}")]
    NotFound(String),

    #[error("invalid configuration for provider {name}: {reason}")]
    InvalidConfig { name: String, reason: String },
}

/// Builds a provider from configuration
pub type ProviderFactory =
    Box<dyn Fn(&ProviderConfig) -> Result<Arc<dyn Provider>, RegistryError> + Send + Sync>;

/// Name → factory mapping. Each registry is an independent value.
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in providers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(OpenAiProvider::NAME, |config| {
            Ok(Arc::new(OpenAiProvider::new(config)?) as Arc<dyn Provider>)
        });
        registry
    }

    /// Register a factory; an existing entry with the same name is replaced
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderConfig) -> Result<Arc<dyn Provider>, RegistryError> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(provider = %name, "registered provider");
        self.factories.insert(name, Box::new(factory));
    }

    /// Build the provider registered under `name`
    pub fn resolve(
        &self,
        name: &str,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn Provider>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        factory(config)
    }

    /// Build the provider named by `config.provider`
    pub fn resolve_configured(
        &self,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn Provider>, RegistryError> {
        self.resolve(&config.provider, config)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get number of registered providers
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
