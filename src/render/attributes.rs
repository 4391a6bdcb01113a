//! Ordered HTML attribute maps with the merge semantics tags are built from.

/// Value rendered for a single HTML attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
  /// Render `name="value"`, with the value escaped.
  Text(String),
  /// Render the bare attribute name, e.g. `defer`.
  Present,
  /// Suppress the attribute entirely, e.g. to cancel a configured default.
  Omitted,
}

impl From<&str> for AttributeValue {
  fn from(value: &str) -> Self {
    AttributeValue::Text(value.to_string())
  }
}

impl From<String> for AttributeValue {
  fn from(value: String) -> Self {
    AttributeValue::Text(value)
  }
}

impl From<bool> for AttributeValue {
  fn from(value: bool) -> Self {
    if value {
      AttributeValue::Present
    } else {
      AttributeValue::Omitted
    }
  }
}

/// Attribute name/value pairs preserving insertion order.
///
/// Overriding an existing name keeps its original position, so merged
/// defaults and call-site overrides serialize deterministically regardless of
/// which layer supplied the final value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
  entries: Vec<(String, AttributeValue)>,
}

impl AttributeMap {
  /// Create an empty map.
  pub fn new() -> Self {
    Self::default()
  }

  /// Set `name` to `value`, replacing an existing entry in place.
  pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
    let name = name.into();
    let value = value.into();
    match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
      Some(entry) => entry.1 = value,
      None => self.entries.push((name, value)),
    }
  }

  /// Set `name` to `value` only when the map has no entry for it yet.
  pub fn set_if_absent(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
    let name = name.into();
    if self.get(&name).is_none() {
      self.entries.push((name, value.into()));
    }
  }

  /// Remove the entry for `name`, if any.
  pub fn remove(&mut self, name: &str) {
    self.entries.retain(|(existing, _)| existing != name);
  }

  /// Value stored for `name`.
  pub fn get(&self, name: &str) -> Option<&AttributeValue> {
    self
      .entries
      .iter()
      .find(|(existing, _)| existing == name)
      .map(|(_, value)| value)
  }

  /// Merge `defaults` without overriding entries already present.
  pub fn merge_defaults(&mut self, defaults: &AttributeMap) {
    for (name, value) in &defaults.entries {
      self.set_if_absent(name.clone(), value.clone());
    }
  }

  /// Merge `overrides`, replacing existing entries in place.
  pub fn merge_overrides(&mut self, overrides: &AttributeMap) {
    for (name, value) in &overrides.entries {
      self.set(name.clone(), value.clone());
    }
  }

  /// Iterate entries in insertion order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
    self
      .entries
      .iter()
      .map(|(name, value)| (name.as_str(), value))
  }

  /// Number of entries, including suppressed ones.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Whether the map holds no entries at all.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Serialize to tag-interior HTML, e.g. `src="app.js" defer`.
  ///
  /// [`AttributeValue::Omitted`] entries produce nothing; everything else is
  /// emitted in insertion order with values escaped.
  pub fn to_html(&self) -> String {
    let mut parts = Vec::with_capacity(self.entries.len());
    for (name, value) in &self.entries {
      match value {
        AttributeValue::Text(text) => {
          parts.push(format!("{}=\"{}\"", name, escape_attribute_value(text)));
        }
        AttributeValue::Present => parts.push(name.clone()),
        AttributeValue::Omitted => {}
      }
    }
    parts.join(" ")
  }
}

impl<N: Into<String>, V: Into<AttributeValue>> FromIterator<(N, V)> for AttributeMap {
  fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
    let mut map = AttributeMap::new();
    for (name, value) in iter {
      map.set(name, value);
    }
    map
  }
}

/// Escape a value for placement inside a double-quoted HTML attribute.
pub fn escape_attribute_value(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for ch in value.chars() {
    match ch {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      _ => escaped.push(ch),
    }
  }
  escaped
}
