//! Ordered prefix substitution tables.
//!
//! Pathmaps are authored as loosely-quoted dictionary literals such as
//! `{'$JOB/':'/proj/job42/', 'D:/':'/mnt/d/'}`. Rules keep their source order, which decides
//! how rewrites compound when several prefixes match the same path.

use std::fmt;

use serde_json::{Map, Value};

/// A single `prefix -> replacement` rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathmapRule {
  /// Leading text matched against the asset path. Never empty.
  pub prefix: String,
  /// Text substituted for the matched prefix.
  pub replacement: String,
}

/// Ordered set of prefix rewrite rules owned by a resolution context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathmapTable {
  rules: Vec<PathmapRule>,
}

impl PathmapTable {
  /// Create an empty table.
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse the loosely-quoted dictionary form.
  ///
  /// Backslashes are escaped and single quotes turned into double quotes before the text is
  /// read as a JSON object. Anything that does not yield an object produces an empty table.
  /// String values are kept verbatim, numbers and booleans are coerced to their textual
  /// form, and any other value drops its entry.
  pub fn parse(text: &str) -> Self {
    if text.is_empty() {
      return Self::default();
    }

    let quoted = text.replace('\\', "\\\\").replace('\'', "\"");
    match first_json_value(&quoted) {
      Some(Value::Object(object)) => Self::from_object(object),
      _ => {
        tracing::debug!(pathmap = text, "pathmap text is not a dictionary, using empty table");
        Self::default()
      }
    }
  }

  /// Build a table from `(prefix, replacement)` pairs in iteration order.
  ///
  /// Empty prefixes are discarded. A repeated prefix keeps its first position and takes the
  /// last replacement.
  pub fn from_rules<I, K, V>(rules: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let mut table = Self::default();
    for (prefix, replacement) in rules {
      table.insert(prefix.into(), replacement.into());
    }
    table
  }

  /// Rules in application order.
  pub fn rules(&self) -> &[PathmapRule] {
    &self.rules
  }

  /// Iterate `(prefix, replacement)` pairs in application order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .rules
      .iter()
      .map(|rule| (rule.prefix.as_str(), rule.replacement.as_str()))
  }

  /// Replacement registered for `prefix`, if any.
  pub fn get(&self, prefix: &str) -> Option<&str> {
    self
      .rules
      .iter()
      .find(|rule| rule.prefix == prefix)
      .map(|rule| rule.replacement.as_str())
  }

  /// Number of rules in the table.
  pub fn len(&self) -> usize {
    self.rules.len()
  }

  /// Returns `true` when the table holds no rules.
  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  /// Rewrite `path` in place, applying every matching rule in order.
  ///
  /// Each rule sees the output of the previous ones, so `a -> b` followed by `b -> c` turns
  /// `a/x` into `c/x`. Returns the number of rules that matched.
  pub fn apply(&self, path: &mut String) -> usize {
    let mut applied = 0;
    for rule in &self.rules {
      if path.starts_with(&rule.prefix) {
        path.replace_range(..rule.prefix.len(), &rule.replacement);
        applied += 1;
        tracing::debug!(
          prefix = %rule.prefix,
          replacement = %rule.replacement,
          mapped = %path,
          "mapped path prefix"
        );
      }
    }
    applied
  }

  fn from_object(object: Map<String, Value>) -> Self {
    let mut table = Self::default();
    for (prefix, value) in object {
      match coerce_value(value) {
        Some(replacement) => table.insert(prefix, replacement),
        None => tracing::debug!(prefix = %prefix, "skipping pathmap entry with non-scalar value"),
      }
    }
    table
  }

  fn insert(&mut self, prefix: String, replacement: String) {
    if prefix.is_empty() {
      return;
    }
    match self.rules.iter_mut().find(|rule| rule.prefix == prefix) {
      Some(rule) => rule.replacement = replacement,
      None => self.rules.push(PathmapRule {
        prefix,
        replacement,
      }),
    }
  }
}

impl fmt::Display for PathmapTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("{")?;
    for (index, (prefix, replacement)) in self.iter().enumerate() {
      if index > 0 {
        f.write_str(", ")?;
      }
      write!(f, "'{prefix}':'{replacement}'")?;
    }
    f.write_str("}")
  }
}

/// Read the first JSON value from `text`, ignoring anything that trails it.
fn first_json_value(text: &str) -> Option<Value> {
  serde_json::Deserializer::from_str(text)
    .into_iter::<Value>()
    .next()
    .and_then(Result::ok)
}

fn coerce_value(value: Value) -> Option<String> {
  match value {
    Value::String(text) => Some(text),
    Value::Number(number) => Some(number.to_string()),
    Value::Bool(flag) => Some(flag.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}
