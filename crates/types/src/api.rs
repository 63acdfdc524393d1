//! API callables, their parameter manifests, and compiled fetcher descriptors.

use std::{fmt, sync::Arc};

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::template::{Template, TemplateContext, UnboundPlaceholder};

/// One entry of an API's parameter manifest, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name; also the key under which provider options are looked up.
    pub name: String,
    /// Compiled-in default. `None` marks the parameter as required.
    pub default: Option<String>,
}

impl Parameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn defaulted(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Fully substituted arguments handed to an [`ApiCallable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArguments {
    /// Values for required parameters, in manifest order.
    pub positional: Vec<String>,
    /// Values for defaulted parameters, keyed by parameter name.
    pub keyword: IndexMap<String, String>,
}

impl CallArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    pub fn keyword(&self, name: &str) -> Option<&str> {
        self.keyword.get(name).map(String::as_str)
    }
}

/// A provider function backing one API alias.
///
/// Any `Fn(&CallArguments) -> anyhow::Result<Value>` closure implements this
/// trait, so providers usually register plain functions.
pub trait ApiCallable: Send + Sync {
    fn call(&self, arguments: &CallArguments) -> anyhow::Result<Value>;
}

impl<F> ApiCallable for F
where
    F: Fn(&CallArguments) -> anyhow::Result<Value> + Send + Sync,
{
    fn call(&self, arguments: &CallArguments) -> anyhow::Result<Value> {
        self(arguments)
    }
}

/// Deferred call descriptor compiled from one registration.
///
/// Descriptors are created once when a provider registers an API and are
/// shared behind an `Arc` afterwards; nothing mutates them.
pub struct FetcherDescriptor {
    /// Public alias, unique within the owning provider.
    pub alias: String,
    /// Name of the backing function, for diagnostics.
    pub target: String,
    /// Templates for required parameters, in manifest order.
    pub positional: Vec<Template>,
    /// Templates for defaulted parameters.
    pub keyword: IndexMap<String, Template>,
    /// Parameters whose compiled-in default was captured as an initial placeholder binding.
    pub captured_defaults: IndexSet<String>,
    callable: Arc<dyn ApiCallable>,
}

impl FetcherDescriptor {
    pub fn new(
        alias: String,
        target: String,
        positional: Vec<Template>,
        keyword: IndexMap<String, Template>,
        captured_defaults: IndexSet<String>,
        callable: Arc<dyn ApiCallable>,
    ) -> Self {
        Self {
            alias,
            target,
            positional,
            keyword,
            captured_defaults,
            callable,
        }
    }

    /// Substitutes every template against `context`.
    ///
    /// # Errors
    ///
    /// Returns the first unbound placeholder, checking positional templates
    /// before keyword templates.
    pub fn bind(&self, context: &TemplateContext) -> Result<CallArguments, UnboundPlaceholder> {
        let positional = self
            .positional
            .iter()
            .map(|template| template.substitute(context))
            .collect::<Result<Vec<_>, _>>()?;
        let keyword = self
            .keyword
            .iter()
            .map(|(name, template)| template.substitute(context).map(|value| (name.clone(), value)))
            .collect::<Result<IndexMap<_, _>, _>>()?;
        Ok(CallArguments { positional, keyword })
    }

    /// Calls the backing function with caller-supplied arguments.
    ///
    /// No templates are substituted and nothing is cached, so the function
    /// behaves exactly as if it had never been registered.
    pub fn invoke_direct(&self, arguments: &CallArguments) -> anyhow::Result<Value> {
        self.callable.call(arguments)
    }
}

impl fmt::Debug for FetcherDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherDescriptor")
            .field("alias", &self.alias)
            .field("target", &self.target)
            .field("positional", &self.positional)
            .field("keyword", &self.keyword)
            .field("captured_defaults", &self.captured_defaults)
            .finish_non_exhaustive()
    }
}
