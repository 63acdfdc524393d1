use std::sync::Arc;

use cliapi_registry::{ApiRegistration, ApiRegistry, FetcherDescriptor, OptionSurface, TemplateError};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{ResolutionError, cache::ResolutionCache};

/// One loaded provider: its registration tables plus the values resolved so far.
///
/// A provider behaves as a lazy, alias-indexed value source. Looking up an
/// alias the first time substitutes the current option bindings into the
/// alias's templates and calls the registered function; the result is kept
/// for the rest of the process.
#[derive(Debug, Clone)]
pub struct Provider {
    name: String,
    pub(crate) registry: ApiRegistry,
    pub(crate) cache: ResolutionCache,
}

impl Provider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: ApiRegistry::new(),
            cache: ResolutionCache::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers one API. See [`ApiRegistry::register`].
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when an option template is malformed.
    pub fn register(&mut self, registration: ApiRegistration) -> Result<Arc<FetcherDescriptor>, TemplateError> {
        self.registry.register(registration)
    }

    pub fn registry(&self) -> &ApiRegistry {
        &self.registry
    }

    /// Registered aliases in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.registry.aliases()
    }

    /// Binds `option` for every resolution performed afterwards.
    ///
    /// Aliases that were already resolved keep their value.
    pub fn bind_option(&mut self, option: &str, value: impl Into<String>) {
        let value = value.into();
        debug!(provider = %self.name, option = %option, value = %value, "option bound");
        self.registry.bind_option(option, value);
    }

    pub fn apply_options<'a>(&mut self, options: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (option, value) in options {
            self.bind_option(option, value);
        }
    }

    /// Derives the command-line option surface from the current registrations and bindings.
    pub fn option_surface(&self) -> OptionSurface {
        OptionSurface::derive(&self.name, &self.registry)
    }

    /// The memoized value for `alias`, without resolving it.
    pub fn cached(&self, alias: &str) -> Option<&Value> {
        self.cache.get(alias)
    }

    pub fn is_resolved(&self, alias: &str) -> bool {
        self.cache.contains(alias)
    }

    /// Returns the value for `alias`, resolving it on first access.
    ///
    /// # Errors
    ///
    /// - [`ResolutionError::UnknownAlias`] when nothing is registered under `alias`
    /// - [`ResolutionError::MissingRequiredOption`] naming the first placeholder
    ///   with no binding
    /// - [`ResolutionError::CallableFailure`] when the registered function fails
    ///
    /// Nothing is cached on failure.
    pub fn get(&mut self, alias: &str) -> Result<&Value, ResolutionError> {
        let Self { name, registry, cache } = self;
        let (name, registry) = (name.as_str(), &*registry);
        cache.get_or_try_insert_with(alias, || invoke(name, registry, alias))
    }
}

fn invoke(provider: &str, registry: &ApiRegistry, alias: &str) -> Result<Value, ResolutionError> {
    let descriptor = registry
        .descriptor(alias)
        .ok_or_else(|| ResolutionError::UnknownAlias {
            alias: alias.to_string(),
        })?;

    let arguments = descriptor.bind(&registry.template).map_err(|unbound| {
        warn!(provider = %provider, alias = %alias, option = %unbound.name, "required option missing");
        ResolutionError::MissingRequiredOption {
            alias: alias.to_string(),
            option: unbound.name,
        }
    })?;

    debug!(
        provider = %provider,
        alias = %alias,
        target = %descriptor.target,
        positional = arguments.positional.len(),
        keyword = arguments.keyword.len(),
        "cache miss, invoking api"
    );
    let value = descriptor.invoke_direct(&arguments).map_err(|source| {
        warn!(provider = %provider, alias = %alias, error = %format!("{source:#}"), "api failed");
        ResolutionError::CallableFailure {
            alias: alias.to_string(),
            source,
        }
    })?;
    info!(provider = %provider, alias = %alias, "api resolved");
    Ok(value)
}
