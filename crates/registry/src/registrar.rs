//! Compiles provider API registrations into fetcher descriptors.
//!
//! Registration happens while a provider initializes. Option templates are
//! parsed here, so a malformed template fails the registration. The
//! registered function is never called: a placeholder that ends up unbound is
//! reported when the alias is resolved, not here.

use std::sync::Arc;

use cliapi_types::{ApiCallable, FetcherDescriptor, FieldPath, Parameter, Template, TemplateError};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::ApiRegistry;

/// Everything a provider declares for one API.
///
/// Options, help and scoops are provider-wide: registering them here merges
/// them into the provider's shared tables, overwriting earlier entries with
/// the same name.
pub struct ApiRegistration {
    alias: String,
    target: String,
    callable: Arc<dyn ApiCallable>,
    parameters: Vec<Parameter>,
    options: IndexMap<String, String>,
    help: IndexMap<String, String>,
    scoops: IndexMap<String, FieldPath>,
}

impl ApiRegistration {
    /// Starts a registration for `alias` backed by `callable`.
    ///
    /// The target name used in diagnostics defaults to the alias.
    pub fn new(alias: impl Into<String>, callable: impl ApiCallable + 'static) -> Self {
        let alias = alias.into();
        Self {
            target: alias.clone(),
            alias,
            callable: Arc::new(callable),
            parameters: Vec::new(),
            options: IndexMap::new(),
            help: IndexMap::new(),
            scoops: IndexMap::new(),
        }
    }

    /// Names the backing function for diagnostics.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Appends one entry to the parameter manifest.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Declares the template bound to parameter `name`, such as `"$smurf"`.
    ///
    /// The source is parsed by [`ApiRegistry::register`].
    pub fn option(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.options.insert(name.into(), template.into());
        self
    }

    pub fn options<K: Into<String>, V: Into<String>>(mut self, options: impl IntoIterator<Item = (K, V)>) -> Self {
        self.options
            .extend(options.into_iter().map(|(name, template)| (name.into(), template.into())));
        self
    }

    pub fn help(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.help.insert(name.into(), text.into());
        self
    }

    pub fn scoop(mut self, name: impl Into<String>, path: FieldPath) -> Self {
        self.scoops.insert(name.into(), path);
        self
    }
}

impl ApiRegistry {
    /// Compiles `registration` into a descriptor and records it under its alias.
    ///
    /// Required parameters get the declared option template, or their own name
    /// as a literal when nothing is declared. Defaulted parameters bound to a
    /// single placeholder capture their default as that placeholder's initial
    /// binding; defaulted parameters with no declared option use the default
    /// directly.
    ///
    /// Returns the descriptor, whose [`FetcherDescriptor::invoke_direct`] still
    /// calls the function exactly as registered.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when a declared option template is malformed.
    /// Nothing is recorded in that case.
    pub fn register(&mut self, registration: ApiRegistration) -> Result<Arc<FetcherDescriptor>, TemplateError> {
        let ApiRegistration {
            alias,
            target,
            callable,
            parameters,
            options,
            help,
            scoops,
        } = registration;

        let options = options
            .into_iter()
            .map(|(name, source)| Template::parse(&source).map(|template| (name, template)))
            .collect::<Result<IndexMap<_, _>, _>>()?;

        self.scoops.extend(scoops);
        self.options.extend(options);
        self.help.extend(help);

        let mut positional = Vec::new();
        let mut keyword = IndexMap::new();
        let mut captured_defaults = IndexSet::new();

        for Parameter { name, default } in parameters {
            let declared = self.options.get(&name).cloned();
            match (default, declared) {
                (None, Some(template)) => positional.push(template),
                (None, None) => positional.push(Template::literal(name)),
                (Some(default), Some(template)) => {
                    if let Some(placeholder) = template.sole_placeholder() {
                        self.template.bind(placeholder, default);
                        captured_defaults.insert(name.clone());
                    }
                    keyword.insert(name, template);
                }
                (Some(default), None) => {
                    keyword.insert(name, Template::literal(default));
                }
            }
        }

        let descriptor = Arc::new(FetcherDescriptor::new(
            alias.clone(),
            target,
            positional,
            keyword,
            captured_defaults,
            callable,
        ));
        debug!(
            alias = %alias,
            target = %descriptor.target,
            positional = descriptor.positional.len(),
            keyword = descriptor.keyword.len(),
            "api registered"
        );
        self.fetchers.insert(alias, Arc::clone(&descriptor));
        Ok(descriptor)
    }
}
