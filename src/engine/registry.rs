//! Named transport engine providers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::TransportEngine;
use crate::collector::ErrorCollector;
use crate::error::{BoxError, Error};

/// Constructs a transport engine.
pub type EngineFactory = Arc<dyn Fn() -> Result<Arc<dyn TransportEngine>, BoxError> + Send + Sync>;

/// Explicit registry of transport engine providers, keyed by name.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    providers: BTreeMap<String, EngineFactory>,
}

impl EngineRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous provider.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<dyn TransportEngine>, BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(provider = %name, "transport engine provider registered");
        self.providers.insert(name, Arc::new(factory));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Instantiate the provider `name`, recording any failure in `errors`.
    pub fn load(
        &self,
        name: &str,
        errors: &mut ErrorCollector,
    ) -> Option<Arc<dyn TransportEngine>> {
        let Some(factory) = self.providers.get(name) else {
            errors.add(Error::ProviderLoad {
                provider: name.to_string(),
                source: format!("no provider registered under {:?}", name).into(),
            });
            return None;
        };
        match factory() {
            Ok(engine) => {
                tracing::debug!(provider = name, "transport engine loaded");
                Some(engine)
            }
            Err(source) => {
                errors.add(Error::ProviderLoad {
                    provider: name.to_string(),
                    source,
                });
                None
            }
        }
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
