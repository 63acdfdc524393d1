//! # Cliapi Engine
//!
//! The engine turns a provider's registrations into a lazy, memoized value
//! source and answers queries against the resulting value tree.
//!
//! ## Key Features
//!
//! - **Lazy resolution**: an alias is resolved on first access by binding the
//!   current option values into its templates and calling the provider
//!   function once
//! - **Failure classification**: unknown aliases, missing required options,
//!   malformed queries and provider failures are distinct [`ResolutionError`]s
//! - **Queries**: resolve-all, ordered depth-first scans, suffix lookup,
//!   scoops and path queries
//! - **Catalog**: a compiled-in provider table that reports providers that
//!   fail to load instead of dropping them
//!
//! ## Usage
//!
//! ```rust
//! use cliapi_engine::Provider;
//! use cliapi_registry::{ApiRegistration, CallArguments, FieldPath};
//! use serde_json::{Value, json};
//!
//! let mut provider = Provider::new("demo");
//! provider.register(
//!     ApiRegistration::new("meta_data", |_: &CallArguments| -> anyhow::Result<Value> {
//!         Ok(json!({"compute": {"name": "vm1"}}))
//!     })
//!     .scoop("instance-name", FieldPath::new().key("meta_data").key("compute").key("name")),
//! )?;
//!
//! assert_eq!(provider.resolve_scoop("instance-name")?, Some(&json!("vm1")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`cache`**: the append-only alias to value store
//! - **`provider`**: registration tables plus cache, and alias resolution
//! - **`query`**: bulk resolution, scoops, path and suffix lookups
//! - **`scan`**: ordered leaf traversal
//! - **`catalog`**: provider loading and selection

pub mod cache;
pub mod catalog;
pub mod errors;
pub mod provider;
pub mod query;
pub mod scan;

pub use cache::ResolutionCache;
pub use catalog::{ProviderCatalog, ProviderFactory, ProviderInit};
pub use errors::{CatalogError, ProviderLoadError, ResolutionError};
pub use provider::Provider;
pub use scan::{Scan, find_by_path_suffix, find_by_suffix};
