//! The statically known set of providers and their load results.

use cliapi_registry::CliapiConfig;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{CatalogError, Provider, ProviderLoadError, ResolutionError};

/// Builds and registers one provider.
pub type ProviderInit = fn() -> anyhow::Result<Provider>;

/// A compiled-in provider entry.
#[derive(Debug, Clone, Copy)]
pub struct ProviderFactory {
    pub name: &'static str,
    pub init: ProviderInit,
}

impl ProviderFactory {
    pub const fn new(name: &'static str, init: ProviderInit) -> Self {
        Self { name, init }
    }
}

/// Providers that loaded successfully, plus the ones that did not.
///
/// Each provider keeps its own registry and cache, so aliases never collide
/// across providers.
#[derive(Debug, Default)]
pub struct ProviderCatalog {
    providers: IndexMap<String, Provider>,
    failures: Vec<ProviderLoadError>,
}

impl ProviderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes every factory not disabled by `config`.
    ///
    /// A provider whose initialization fails is recorded in
    /// [`failures`](Self::failures) and logged; the remaining providers
    /// still load. Configured option values are bound right after a
    /// provider initializes, so they act as its defaults.
    pub fn load(factories: &[ProviderFactory], config: &CliapiConfig) -> Self {
        let mut catalog = Self::new();
        for factory in factories {
            if config.is_disabled(factory.name) {
                debug!(provider = %factory.name, "provider disabled by config");
                continue;
            }
            match (factory.init)() {
                Ok(mut provider) => {
                    provider.apply_options(config.options_for(factory.name));
                    info!(provider = %factory.name, apis = provider.aliases().count(), "provider loaded");
                    catalog.insert(provider);
                }
                Err(error) => {
                    let reason = format!("{error:#}");
                    warn!(provider = %factory.name, reason = %reason, "provider failed to load");
                    catalog.failures.push(ProviderLoadError {
                        provider: factory.name.to_string(),
                        reason,
                    });
                }
            }
        }
        catalog
    }

    /// Adds `provider`, replacing any provider with the same name.
    pub fn insert(&mut self, provider: Provider) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Loaded provider names in load order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn first(&self) -> Result<&str, CatalogError> {
        self.names().next().ok_or(CatalogError::NoProviders)
    }

    pub fn get(&self, name: &str) -> Result<&Provider, CatalogError> {
        self.providers.get(name).ok_or_else(|| CatalogError::UnknownProvider { name: name.to_string() })
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Provider, CatalogError> {
        self.providers
            .get_mut(name)
            .ok_or_else(|| CatalogError::UnknownProvider { name: name.to_string() })
    }

    /// Removes and returns the named provider.
    pub fn take(&mut self, name: &str) -> Result<Provider, CatalogError> {
        self.providers
            .shift_remove(name)
            .ok_or_else(|| CatalogError::UnknownProvider { name: name.to_string() })
    }

    pub fn failures(&self) -> &[ProviderLoadError] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Resolves a provider-qualified alias such as `test.meta_data`.
    pub fn get_qualified(&mut self, qualified: &str) -> Result<&Value, CatalogError> {
        let Some((provider, alias)) = qualified.split_once('.') else {
            return Err(ResolutionError::UnknownAlias {
                alias: qualified.to_string(),
            }
            .into());
        };
        Ok(self.get_mut(provider)?.get(alias)?)
    }
}
