use cliapi_types::QueryError;
use thiserror::Error;

/// Why an alias, scoop or path could not be resolved.
///
/// Every variant names the alias or option responsible. Nothing is retried.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("unknown API alias '{alias}'")]
    UnknownAlias { alias: String },

    #[error("required option --{option} missing (needed by '{alias}')")]
    MissingRequiredOption { alias: String, option: String },

    #[error(transparent)]
    MalformedQuery(#[from] QueryError),

    #[error("API '{alias}' failed")]
    CallableFailure {
        alias: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ResolutionError {
    /// The option whose absence caused this error, if that is the cause.
    pub fn missing_option(&self) -> Option<&str> {
        match self {
            ResolutionError::MissingRequiredOption { option, .. } => Some(option.as_str()),
            _ => None,
        }
    }
}

/// A provider that failed to initialize.
#[derive(Debug, Error)]
#[error("provider '{provider}' failed to load: {reason}")]
pub struct ProviderLoadError {
    pub provider: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no provider named '{name}' is loaded")]
    UnknownProvider { name: String },

    #[error("no providers could be loaded")]
    NoProviders,

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
