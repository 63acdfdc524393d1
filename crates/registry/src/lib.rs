//! Registry crate for cliapi provider declarations.
//!
//! This crate compiles provider API registrations into fetcher descriptors,
//! keeps the provider-wide option, help and scoop tables, and derives the
//! command-line option surface from whatever is currently registered.

pub mod clap_builder;
pub mod common;
pub mod config;
pub mod models;
pub mod registrar;

pub use clap_builder::{CliSelection, OptionSurface, SurfaceOption, build_clap};
pub use cliapi_types::{ApiCallable, CallArguments, FetcherDescriptor, FieldPath, Parameter, PathStep, Template, TemplateContext, TemplateError};
pub use common::{COMMON_OPTIONS, CommonOption};
pub use config::{CliapiConfig, ConfigError};
pub use models::ApiRegistry;
pub use registrar::ApiRegistration;
