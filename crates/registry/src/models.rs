use std::sync::Arc;

use cliapi_types::{FetcherDescriptor, FieldPath, Template, TemplateContext};
use indexmap::{IndexMap, IndexSet};

/// The per-provider tables populated by API registration.
///
/// Each provider owns one registry, so two providers may both declare an
/// alias such as `meta_data` without colliding.
#[derive(Debug, Clone, Default)]
pub struct ApiRegistry {
    /// Compiled descriptors keyed by alias, in registration order
    pub fetchers: IndexMap<String, Arc<FetcherDescriptor>>,
    /// Short display name to structural path into the resolved tree
    pub scoops: IndexMap<String, FieldPath>,
    /// Parameter name to the template bound to it
    pub options: IndexMap<String, Template>,
    /// Help text keyed by option or scoop name
    pub help: IndexMap<String, String>,
    /// Current placeholder bindings
    pub template: TemplateContext,
}

impl ApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered aliases in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.fetchers.keys().map(String::as_str)
    }

    pub fn descriptor(&self, alias: &str) -> Option<&Arc<FetcherDescriptor>> {
        self.fetchers.get(alias)
    }

    pub fn scoop(&self, name: &str) -> Option<&FieldPath> {
        self.scoops.get(name)
    }

    pub fn help_for(&self, name: &str) -> Option<&str> {
        self.help.get(name).map(String::as_str)
    }

    /// Placeholder names exposed as command-line options, deduplicated, in declaration order.
    pub fn placeholder_options(&self) -> IndexSet<&str> {
        self.options.values().flat_map(Template::placeholders).collect()
    }

    /// Overwrites the binding for `option`, visible to every later resolution.
    pub fn bind_option(&mut self, option: &str, value: impl Into<String>) {
        self.template.bind(option, value);
    }
}
