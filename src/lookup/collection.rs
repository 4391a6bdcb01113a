//! Routing from build names to their entrypoint lookup instances.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Error, Result};

use super::entrypoint::EntrypointProvider;

/// Shared, interiorly mutable handle to a registered lookup.
///
/// Lookup state is request-scoped and single-threaded, so handles are shared
/// with `Rc`/`RefCell` rather than synchronized.
pub type SharedEntrypointLookup = Rc<RefCell<dyn EntrypointProvider>>;

/// Immutable registry of per-build entrypoint lookups.
///
/// Multi-bundle setups register one lookup per build; single-bundle setups
/// register one build and mark it as the default.
pub struct EntrypointLookupCollection {
  builds: BTreeMap<String, SharedEntrypointLookup>,
  default_build: Option<String>,
}

impl EntrypointLookupCollection {
  /// Create a collection over pre-built lookups.
  pub fn new(
    builds: BTreeMap<String, SharedEntrypointLookup>,
    default_build: Option<String>,
  ) -> Self {
    Self {
      builds,
      default_build,
    }
  }

  /// Resolve `build_name`, falling back to the configured default build.
  pub fn entrypoint_lookup(&self, build_name: Option<&str>) -> Result<SharedEntrypointLookup> {
    let name = match build_name {
      Some(name) => name,
      None => self.default_build.as_deref().ok_or(Error::NoDefaultBuild)?,
    };

    self
      .builds
      .get(name)
      .cloned()
      .ok_or_else(|| Error::UndefinedBuild {
        name: name.to_string(),
      })
  }

  /// Name of the default build, when one is configured.
  pub fn default_build(&self) -> Option<&str> {
    self.default_build.as_deref()
  }

  /// Names of every registered build.
  pub fn build_names(&self) -> impl Iterator<Item = &str> {
    self.builds.keys().map(String::as_str)
  }

  /// Clear the returned-file history of every registered lookup.
  ///
  /// The host calls this at the top-level request boundary. It must not be
  /// called between nested sub-renders of the same request, or files emitted
  /// by a parent render would be emitted again by its children.
  pub fn reset_all(&self) {
    for lookup in self.builds.values() {
      lookup.borrow_mut().reset();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lookup::EntrypointLookup;
  use std::fs;
  use tempfile::tempdir;

  fn collection_with(
    names: &[&str],
    default_build: Option<&str>,
  ) -> (tempfile::TempDir, EntrypointLookupCollection) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("entrypoints.json");
    fs::write(&path, r#"{"entrypoints": {"app": {"js": ["app.js"]}}}"#).unwrap();

    let mut builds: BTreeMap<String, SharedEntrypointLookup> = BTreeMap::new();
    for name in names {
      builds.insert(
        name.to_string(),
        Rc::new(RefCell::new(EntrypointLookup::new(&path))),
      );
    }

    (
      dir,
      EntrypointLookupCollection::new(builds, default_build.map(str::to_string)),
    )
  }

  #[test]
  fn fails_for_unknown_builds() {
    let (_dir, collection) = collection_with(&[], None);

    let err = collection.entrypoint_lookup(Some("something")).err().unwrap();

    assert!(matches!(err, Error::UndefinedBuild { .. }));
    assert_eq!(err.to_string(), "the build \"something\" is not configured");
  }

  #[test]
  fn fails_when_no_default_build_is_configured() {
    let (_dir, collection) = collection_with(&[], None);

    let err = collection.entrypoint_lookup(None).err().unwrap();

    assert!(matches!(err, Error::NoDefaultBuild));
  }

  #[test]
  fn falls_back_to_the_default_build() {
    let (_dir, collection) = collection_with(&["the_default"], Some("the_default"));

    let by_default = collection.entrypoint_lookup(None).unwrap();
    let by_name = collection.entrypoint_lookup(Some("the_default")).unwrap();

    assert!(Rc::ptr_eq(&by_default, &by_name));
  }

  #[test]
  fn reset_all_restores_every_lookup() {
    let (_dir, collection) = collection_with(&["first", "second"], None);

    for name in ["first", "second"] {
      let lookup = collection.entrypoint_lookup(Some(name)).unwrap();
      assert_eq!(
        lookup.borrow_mut().javascript_files("app").unwrap(),
        ["app.js"]
      );
      assert!(lookup.borrow_mut().javascript_files("app").unwrap().is_empty());
    }

    collection.reset_all();

    for name in ["first", "second"] {
      let lookup = collection.entrypoint_lookup(Some(name)).unwrap();
      assert_eq!(
        lookup.borrow_mut().javascript_files("app").unwrap(),
        ["app.js"]
      );
    }
  }
}
