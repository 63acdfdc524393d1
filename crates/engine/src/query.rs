//! Bulk resolution, scoops and leaf addressing over a provider's value tree.
//!
//! The provider's tree is the mapping from each registered alias to its
//! resolved value, in registration order. Scoop paths and path queries
//! start with an alias.

use cliapi_types::{FieldPath, QueryError, path::lookup_steps};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    Provider, ResolutionError,
    scan::{self, Scan},
};

impl Provider {
    /// Resolves every registered alias, stopping at the first failure.
    pub fn resolve_all(&mut self) -> Result<(), ResolutionError> {
        let aliases: Vec<String> = self.aliases().map(str::to_string).collect();
        for alias in &aliases {
            self.get(alias)?;
        }
        Ok(())
    }

    /// The fully resolved tree as one ordered mapping of alias to value.
    pub fn snapshot(&mut self) -> Result<Value, ResolutionError> {
        self.resolve_all()?;
        let tree: Map<String, Value> = self
            .registry()
            .aliases()
            .filter_map(|alias| self.cached(alias).map(|value| (alias.to_string(), value.clone())))
            .collect();
        Ok(Value::Object(tree))
    }

    /// Resolves everything, then scans the whole tree.
    ///
    /// Leaf paths start with the alias that produced them.
    pub fn scan(&mut self) -> Result<Scan<'_>, ResolutionError> {
        self.resolve_all()?;
        Ok(self.scan_resolved())
    }

    /// Scans only the aliases resolved so far, in registration order.
    pub fn scan_resolved(&self) -> Scan<'_> {
        let entries = self
            .registry
            .aliases()
            .filter_map(|alias| self.cache.get(alias).map(|value| (alias, value)));
        Scan::over_entries(entries)
    }

    /// Value of the first leaf whose final key is `name`.
    pub fn find_by_suffix(&mut self, name: &str) -> Result<Option<&Value>, ResolutionError> {
        Ok(scan::find_by_suffix(self.scan()?, name))
    }

    /// Follows `path` into the tree, resolving only the alias it starts with.
    ///
    /// # Errors
    ///
    /// A path that does not start with a key is a malformed query. An
    /// unregistered first key is an unknown alias. Missing keys or indices
    /// further down are not errors; they yield `None`.
    pub fn resolve_path(&mut self, path: &FieldPath) -> Result<Option<&Value>, ResolutionError> {
        let Some(alias) = path.first_key() else {
            return Err(QueryError {
                query: path.to_string(),
                reason: "path must start with an API alias".to_string(),
            }
            .into());
        };
        let root = self.get(alias)?;
        Ok(lookup_steps(&path.steps()[1..], root))
    }

    /// Parses `expression` (`meta_data.network.interface[0].macAddress`) and resolves it.
    pub fn resolve_query(&mut self, expression: &str) -> Result<Option<&Value>, ResolutionError> {
        let path = FieldPath::parse(expression)?;
        self.resolve_path(&path)
    }

    /// Resolves the scoop `name`. `None` when no such scoop is declared or its
    /// path leads nowhere.
    pub fn resolve_scoop(&mut self, name: &str) -> Result<Option<&Value>, ResolutionError> {
        let Some(path) = self.registry().scoop(name).cloned() else {
            return Ok(None);
        };
        debug!(provider = %self.name(), scoop = %name, path = %path, "resolving scoop");
        self.resolve_path(&path)
    }

    /// Value of the first leaf, in scan order, whose path ends with `suffix`.
    pub fn find_by_path_suffix(&mut self, suffix: &FieldPath) -> Result<Option<&Value>, ResolutionError> {
        Ok(scan::find_by_path_suffix(self.scan()?, suffix))
    }

    /// Looks up a display item by short name.
    ///
    /// A declared scoop wins. A name containing `.` or `[` is parsed as a
    /// path: when it starts with a registered alias it is followed from that
    /// alias, otherwise it names the right-most steps of a leaf
    /// (`compute.name`, `interface[0].macAddress`). Anything else is matched
    /// against the final key of every leaf of the fully resolved tree.
    pub fn find_item(&mut self, item: &str) -> Result<Option<&Value>, ResolutionError> {
        if self.registry().scoop(item).is_some() {
            return self.resolve_scoop(item);
        }
        if item.contains(['.', '[']) {
            let path = FieldPath::parse(item)?;
            let rooted = path.first_key().is_some_and(|alias| self.registry().descriptor(alias).is_some());
            if rooted {
                return self.resolve_path(&path);
            }
            return self.find_by_path_suffix(&path);
        }
        self.find_by_suffix(item)
    }
}
