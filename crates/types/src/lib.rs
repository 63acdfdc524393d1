//! Shared type definitions for the cliapi framework.
//!
//! These types are consumed by the registry (which compiles provider
//! registrations into descriptors), the engine (which resolves and caches
//! values), and the provider plugins themselves.

pub mod api;
pub mod path;
pub mod template;

pub use api::{ApiCallable, CallArguments, FetcherDescriptor, Parameter};
pub use path::{FieldPath, PathStep, QueryError};
pub use template::{Template, TemplateContext, TemplateError, TemplateSegment, UnboundPlaceholder};
