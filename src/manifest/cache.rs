//! Pluggable cache for parsed manifest documents.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::document::ManifestDocument;

/// Storage for parsed manifests shared across lookups.
///
/// A hit short-circuits manifest file I/O and parsing entirely; whatever the
/// cache hands back is served as-is.
pub trait ManifestCache {
  /// Fetch a previously stored document for `key`.
  fn get(&self, key: &str) -> Option<Rc<ManifestDocument>>;

  /// Store a parsed document under `key`.
  fn put(&self, key: &str, document: Rc<ManifestDocument>);
}

/// Process-local manifest cache backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryManifestCache {
  entries: RefCell<BTreeMap<String, Rc<ManifestDocument>>>,
}

impl InMemoryManifestCache {
  /// Create an empty cache.
  pub fn new() -> Self {
    Self::default()
  }
}

impl ManifestCache for InMemoryManifestCache {
  fn get(&self, key: &str) -> Option<Rc<ManifestDocument>> {
    self.entries.borrow().get(key).cloned()
  }

  fn put(&self, key: &str, document: Rc<ManifestDocument>) {
    self.entries.borrow_mut().insert(key.to_string(), document);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stores_and_returns_documents_by_key() {
    let cache = InMemoryManifestCache::new();
    let document = Rc::new(ManifestDocument::default());

    assert!(cache.get("build").is_none());

    cache.put("build", Rc::clone(&document));
    let cached = cache.get("build").unwrap();

    assert!(Rc::ptr_eq(&cached, &document));
    assert!(cache.get("other").is_none());
  }
}
