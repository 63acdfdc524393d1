use indexmap::{IndexMap, map::Entry};
use serde_json::Value;
use tracing::debug;

/// Memoized API results keyed by alias.
///
/// Entries are only ever added. A failed resolution stores nothing, so the
/// alias stays unresolved and the next lookup tries again.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    values: IndexMap<String, Value>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, alias: &str) -> Option<&Value> {
        self.values.get(alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.values.contains_key(alias)
    }

    /// Returns the stored value for `alias`, running `resolve` to produce it
    /// when there is none yet.
    ///
    /// An existing value is never replaced. When `resolve` fails its error is
    /// returned and nothing is stored.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        alias: &str,
        resolve: impl FnOnce() -> Result<Value, E>,
    ) -> Result<&Value, E> {
        match self.values.entry(alias.to_string()) {
            Entry::Occupied(entry) => {
                debug!(alias = %alias, "cache hit");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => Ok(entry.insert(resolve()?)),
        }
    }

    /// Resolved aliases in resolution order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
