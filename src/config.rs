//! Configuration surface wired in by the host application.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::locator::BuildFileLocator;
use crate::lookup::{EntrypointLookup, EntrypointLookupCollection, SharedEntrypointLookup};
use crate::manifest::ManifestCache;

/// Build name used when a single unnamed build is configured.
pub const DEFAULT_BUILD: &str = "_default";

/// Configuration for one named build.
///
/// Multi-bundle setups configure several of these, each with its own
/// manifest and output directory.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  /// Name render calls and the file locator address this build by.
  pub name: String,
  /// Path to the entrypoints manifest JSON produced by the bundler.
  pub entrypoints_path: PathBuf,
  /// Build output directory, needed only to locate built files on disk.
  pub output_path: Option<String>,
  /// Whether a missing manifest or unknown entry is fatal.
  pub strict: bool,
  /// Cache key under which the parsed manifest is shared, when caching.
  pub cache_key: Option<String>,
}

impl BuildConfig {
  /// Configuration for a strict build without caching.
  pub fn new(name: impl Into<String>, entrypoints_path: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      entrypoints_path: entrypoints_path.into(),
      output_path: None,
      strict: true,
      cache_key: None,
    }
  }
}

impl EntrypointLookupCollection {
  /// Build a collection from per-build configuration.
  ///
  /// `cache` is shared by every build carrying a cache key; builds without a
  /// key always read their manifest from disk.
  pub fn from_configs(
    builds: &[BuildConfig],
    default_build: Option<&str>,
    cache: Option<Rc<dyn ManifestCache>>,
  ) -> Self {
    let mut lookups: BTreeMap<String, SharedEntrypointLookup> = BTreeMap::new();
    for build in builds {
      let mut lookup =
        EntrypointLookup::new(&build.entrypoints_path).with_strict_mode(build.strict);
      if let (Some(cache), Some(key)) = (cache.as_ref(), build.cache_key.as_ref()) {
        lookup = lookup.with_cache(Rc::clone(cache), key.clone());
      }
      lookups.insert(build.name.clone(), Rc::new(RefCell::new(lookup)));
    }

    Self::new(lookups, default_build.map(str::to_string))
  }
}

impl BuildFileLocator {
  /// Build a locator from per-build configuration.
  ///
  /// Builds without an output path are skipped; their files cannot be read
  /// back from disk.
  pub fn from_configs(builds: &[BuildConfig]) -> Self {
    let build_paths = builds
      .iter()
      .filter_map(|build| {
        build
          .output_path
          .as_ref()
          .map(|path| (build.name.clone(), path.clone()))
      })
      .collect();

    Self::new(build_paths)
  }
}
