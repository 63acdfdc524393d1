//! `$placeholder` argument templates and the binding context they resolve against.
//!
//! Templates use the `$name` / `${name}` syntax, with `$$` standing for a
//! literal dollar sign. A template is parsed once, when a provider registers
//! an API or when configuration is loaded, and substituted every time a
//! fetcher is resolved.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))")
        .expect("placeholder pattern compiles")
});

/// Raised when a template string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("malformed template '{template}': invalid placeholder at byte {position}")]
    Malformed { template: String, position: usize },
}

/// Raised when a template references a placeholder with no binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("placeholder '{name}' has no binding")]
pub struct UnboundPlaceholder {
    /// Name of the first placeholder that could not be substituted.
    pub name: String,
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateSegment {
    /// Text copied verbatim into the substituted output.
    Literal(String),
    /// Named slot filled from the [`TemplateContext`].
    Placeholder(String),
}

/// A parsed argument template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Template {
    segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parses `$name`, `${name}` and `$$` sequences out of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Malformed`] for a dangling `$`, an unterminated
    /// `${`, or a placeholder whose name is not an identifier.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut cursor = 0;

        for captures in PLACEHOLDER_PATTERN.captures_iter(source) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            literal.push_str(&source[cursor..whole.start()]);
            cursor = whole.end();

            if captures.name("escaped").is_some() {
                literal.push('$');
                continue;
            }
            let Some(name) = captures.name("named").or_else(|| captures.name("braced")) else {
                return Err(TemplateError::Malformed {
                    template: source.to_string(),
                    position: whole.start(),
                });
            };
            if !literal.is_empty() {
                segments.push(TemplateSegment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(TemplateSegment::Placeholder(name.as_str().to_string()));
        }

        literal.push_str(&source[cursor..]);
        if !literal.is_empty() {
            segments.push(TemplateSegment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// A template that always yields `value`, with no placeholder parsing.
    pub fn literal(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            return Self::default();
        }
        Self {
            segments: vec![TemplateSegment::Literal(value)],
        }
    }

    /// A template consisting of exactly one placeholder.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            segments: vec![TemplateSegment::Placeholder(name.into())],
        }
    }

    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// Returns the placeholder name when the whole template is a single placeholder.
    pub fn sole_placeholder(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [TemplateSegment::Placeholder(name)] => Some(name.as_str()),
            _ => None,
        }
    }

    /// Placeholder names in the order they appear.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            TemplateSegment::Placeholder(name) => Some(name.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }

    pub fn is_literal(&self) -> bool {
        self.placeholders().next().is_none()
    }

    /// Substitutes every placeholder from `context`.
    ///
    /// # Errors
    ///
    /// Returns the first placeholder (in template order) that has no binding.
    pub fn substitute(&self, context: &TemplateContext) -> Result<String, UnboundPlaceholder> {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => output.push_str(text),
                TemplateSegment::Placeholder(name) => {
                    let value = context.get(name).ok_or_else(|| UnboundPlaceholder { name: name.clone() })?;
                    output.push_str(value);
                }
            }
        }
        Ok(output)
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => f.write_str(&text.replace('$', "$$"))?,
                TemplateSegment::Placeholder(name) => write!(f, "${{{name}}}")?,
            }
        }
        Ok(())
    }
}

/// Current placeholder bindings for one provider.
///
/// Bindings start out as the compiled-in defaults captured at registration
/// time and are overwritten by configuration and command-line values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateContext {
    bindings: IndexMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, returning the previous binding if any.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.bindings.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
