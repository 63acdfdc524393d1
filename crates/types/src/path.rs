//! Structural paths into resolved value trees.
//!
//! A [`FieldPath`] is an ordered list of map-key and sequence-index steps.
//! Scoops are declared as typed paths; the textual form
//! (`meta_data.network.interface[0].macAddress`, or the bracketed
//! `['meta_data']['compute']['name']`) is accepted wherever paths come from
//! user input or configuration.

use std::{fmt, str::FromStr};

use serde_json::Value;
use thiserror::Error;

/// Raised for an ill-formed path or scoop expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed query '{query}': {reason}")]
pub struct QueryError {
    /// The expression as supplied.
    pub query: String,
    /// What was wrong with it.
    pub reason: String,
}

/// A single step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Member of an ordered mapping.
    Key(String),
    /// Element of a sequence.
    Index(usize),
}

impl PathStep {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathStep::Key(key) => Some(key.as_str()),
            PathStep::Index(_) => None,
        }
    }
}

/// Ordered sequence of steps from a root value down to a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    steps: Vec<PathStep>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a map-key step.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.steps.push(PathStep::Key(key.into()));
        self
    }

    /// Appends a sequence-index step.
    pub fn index(mut self, index: usize) -> Self {
        self.steps.push(PathStep::Index(index));
        self
    }

    /// Returns a copy of this path extended by one key.
    pub fn child_key(&self, key: &str) -> Self {
        self.clone().key(key)
    }

    /// Returns a copy of this path extended by one index.
    pub fn child_index(&self, index: usize) -> Self {
        self.clone().index(index)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The first step when it is a key; for provider-rooted paths this is the alias.
    pub fn first_key(&self) -> Option<&str> {
        self.steps.first().and_then(PathStep::as_key)
    }

    pub fn leaf(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// The final component when it is a key. Index steps never have a name.
    pub fn leaf_name(&self) -> Option<&str> {
        self.leaf().and_then(PathStep::as_key)
    }

    /// True when the last steps of this path equal every step of `suffix`.
    pub fn ends_with(&self, suffix: &FieldPath) -> bool {
        self.steps.ends_with(&suffix.steps)
    }

    /// Walks `value` along every step of this path.
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        lookup_steps(&self.steps, value)
    }

    /// Parses the dotted / bracketed textual form.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for empty keys, unterminated brackets, and
    /// bracket contents that are neither a quoted key nor an index.
    pub fn parse(expression: &str) -> Result<Self, QueryError> {
        PathParser::new(expression).parse()
    }
}

/// Walks `value` along `steps`, returning `None` at the first step that does not exist.
pub fn lookup_steps<'a>(steps: &[PathStep], value: &'a Value) -> Option<&'a Value> {
    steps.iter().try_fold(value, |current, step| match (step, current) {
        (PathStep::Key(key), Value::Object(map)) => map.get(key),
        (PathStep::Index(index), Value::Array(items)) => items.get(*index),
        _ => None,
    })
}

impl From<Vec<PathStep>> for FieldPath {
    fn from(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }
}

impl FromStr for FieldPath {
    type Err = QueryError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        Self::parse(expression)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Key(key) if key.contains(['.', '[', ']']) => write!(f, "['{key}']")?,
                PathStep::Key(key) if position == 0 => f.write_str(key)?,
                PathStep::Key(key) => write!(f, ".{key}")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

struct PathParser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    cursor: usize,
}

impl<'a> PathParser<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            expression,
            chars: expression.trim().chars().collect(),
            cursor: 0,
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> QueryError {
        QueryError {
            query: self.expression.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn parse(mut self) -> Result<FieldPath, QueryError> {
        if self.chars.is_empty() {
            return Err(self.malformed("empty path"));
        }

        let mut steps = Vec::new();
        loop {
            if self.peek() == Some('[') {
                steps.push(self.bracket_step()?);
            } else {
                steps.push(PathStep::Key(self.bare_key()?));
            }
            while self.peek() == Some('[') {
                steps.push(self.bracket_step()?);
            }
            match self.peek() {
                None => break,
                Some('.') => self.cursor += 1,
                Some(other) => return Err(self.malformed(format!("unexpected '{other}' at position {}", self.cursor))),
            }
        }
        Ok(FieldPath::from(steps))
    }

    fn bare_key(&mut self) -> Result<String, QueryError> {
        let start = self.cursor;
        while let Some(character) = self.peek() {
            match character {
                '.' | '[' => break,
                ']' | '\'' | '"' => return Err(self.malformed(format!("unexpected '{character}' at position {}", self.cursor))),
                _ => self.cursor += 1,
            }
        }
        if self.cursor == start {
            return Err(self.malformed(format!("empty key at position {start}")));
        }
        Ok(self.chars[start..self.cursor].iter().collect())
    }

    fn bracket_step(&mut self) -> Result<PathStep, QueryError> {
        let open = self.cursor;
        self.cursor += 1;
        let step = match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.cursor += 1;
                let start = self.cursor;
                while self.peek().is_some_and(|character| character != quote) {
                    self.cursor += 1;
                }
                if self.peek().is_none() {
                    return Err(self.malformed(format!("unterminated quote opened at position {}", start - 1)));
                }
                let key: String = self.chars[start..self.cursor].iter().collect();
                self.cursor += 1;
                PathStep::Key(key)
            }
            _ => {
                let start = self.cursor;
                while self.peek().is_some_and(|character| character != ']') {
                    self.cursor += 1;
                }
                let digits: String = self.chars[start..self.cursor].iter().collect();
                let index = digits
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| self.malformed(format!("'[{digits}]' is neither an index nor a quoted key")))?;
                PathStep::Index(index)
            }
        };
        if self.peek() != Some(']') {
            return Err(self.malformed(format!("unterminated '[' at position {open}")));
        }
        self.cursor += 1;
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_dotted_paths_with_indices() {
        let path = FieldPath::parse("meta_data.network.interface[0].macAddress").expect("parse");
        assert_eq!(
            path,
            FieldPath::new()
                .key("meta_data")
                .key("network")
                .key("interface")
                .index(0)
                .key("macAddress")
        );
        assert_eq!(path.to_string(), "meta_data.network.interface[0].macAddress");
    }

    #[test]
    fn parses_bracketed_keys() {
        let bracketed = FieldPath::parse("['meta_data']['compute'][\"name\"]").expect("parse");
        let mixed = FieldPath::parse("meta_data['compute'].name").expect("parse");
        let expected = FieldPath::new().key("meta_data").key("compute").key("name");
        assert_eq!(bracketed, expected);
        assert_eq!(mixed, expected);
    }

    #[test]
    fn rejects_malformed_expressions() {
        for expression in ["", "a..b", "a.", ".a", "a[0", "a[x]", "a['b]", "a[0]b", "a]"] {
            let error = FieldPath::parse(expression).expect_err(expression);
            assert_eq!(error.query, expression);
        }
    }

    #[test]
    fn lookup_walks_keys_and_indices() {
        let value = json!({"network": {"interface": [{"macAddress": "000D3A3AE8A5"}]}});
        let path = FieldPath::parse("network.interface[0].macAddress").expect("parse");
        assert_eq!(path.lookup(&value), Some(&json!("000D3A3AE8A5")));

        let missing = FieldPath::parse("network.interface[3].macAddress").expect("parse");
        assert_eq!(missing.lookup(&value), None);
        let wrong_shape = FieldPath::parse("network[0]").expect("parse");
        assert_eq!(wrong_shape.lookup(&value), None);
    }

    #[test]
    fn leaf_name_ignores_index_steps() {
        assert_eq!(FieldPath::new().key("tags").index(2).leaf_name(), None);
        assert_eq!(FieldPath::new().key("compute").key("name").leaf_name(), Some("name"));
        assert_eq!(FieldPath::new().key("compute").first_key(), Some("compute"));
    }
}
