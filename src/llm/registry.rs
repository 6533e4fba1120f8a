use super::providers::factory_for;
use super::AdapterFactory;
use crate::config::ModelConfig;
use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Maps `"provider.modelId"` keys to adapter factories
///
/// Populated once at start-up; lookups never mutate it.
#[derive(Debug, Default, Clone)]
pub struct AdapterRegistry {
    factories: HashMap<String, Arc<dyn AdapterFactory>>,
}

impl AdapterRegistry {
    pub fn new(factories: impl IntoIterator<Item = (String, Arc<dyn AdapterFactory>)>) -> Self {
        Self {
            factories: factories.into_iter().collect(),
        }
    }

    /// Registers one built-in provider factory per configured model
    pub fn from_config(models: &[ModelConfig]) -> Result<Self> {
        let mut factories = Vec::with_capacity(models.len());
        for model in models {
            let key = Self::key(&model.provider, &model.model_id);
            info!("Registering model adapter {}", key);
            factories.push((key, factory_for(&model.provider)?));
        }
        Ok(Self::new(factories))
    }

    pub fn key(provider: &str, model_id: &str) -> String {
        format!("{}.{}", provider, model_id)
    }

    /// Resolves the factory registered for a provider and model
    pub fn resolve(&self, provider: &str, model_id: &str) -> Result<Arc<dyn AdapterFactory>> {
        let key = Self::key(provider, model_id);
        self.factories
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Adapter '{}'", key)))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedFactory;

    #[test]
    fn resolves_by_provider_and_model() {
        let factory: Arc<dyn AdapterFactory> = Arc::new(ScriptedFactory::default());
        let registry = AdapterRegistry::new([(AdapterRegistry::key("test", "m1"), factory)]);

        assert!(registry.resolve("test", "m1").is_ok());
        let err = registry.resolve("test", "m2").unwrap_err();
        assert_eq!(err.to_string(), "Adapter 'test.m2' not found");
    }

    #[test]
    fn from_config_rejects_unknown_provider() {
        let models = vec![ModelConfig {
            provider: "acme".to_string(),
            model_id: "x".to_string(),
        }];
        assert!(matches!(
            AdapterRegistry::from_config(&models),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn from_config_registers_builtin_providers() {
        let models = vec![
            ModelConfig {
                provider: "openai".to_string(),
                model_id: "gpt-4o-mini".to_string(),
            },
            ModelConfig {
                provider: "ollama".to_string(),
                model_id: "llama3".to_string(),
            },
        ];
        let registry = AdapterRegistry::from_config(&models).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("ollama", "llama3").is_ok());
    }
}
