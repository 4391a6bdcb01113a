//! Per-build entry file resolution with request-scoped dedup tracking.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::manifest::{FileKind, ManifestCache, ManifestDocument};

/// Resolves the built files a named entry needs.
///
/// Implementations keep request-scoped state so a file is handed out at most
/// once between calls to [`EntrypointProvider::reset`]. The surrounding
/// request layer resets at the top-level request boundary only, never between
/// nested sub-renders, so assets emitted by a parent render are not emitted
/// again by a child render of the same page.
pub trait EntrypointProvider {
  /// JavaScript files for `entry_name` not yet returned this lifecycle.
  fn javascript_files(&mut self, entry_name: &str) -> Result<Vec<String>>;

  /// Stylesheets for `entry_name` not yet returned this lifecycle.
  fn css_files(&mut self, entry_name: &str) -> Result<Vec<String>>;

  /// Whether the manifest declares `entry_name`, without touching dedup state.
  fn entry_exists(&self, entry_name: &str) -> Result<bool>;

  /// Clear the returned-file history. Idempotent.
  fn reset(&mut self);

  /// Toggle returned-file tracking, returning the previous setting.
  ///
  /// While tracking is disabled every call returns the full file list and
  /// records nothing; callers fetching raw source content for inlining use
  /// this to avoid perturbing the tag dedup state, restoring the previous
  /// setting afterwards.
  fn enable_returned_file_tracking(&mut self, enabled: bool) -> bool;

  /// Integrity capability, when the underlying manifest carries hash data.
  fn integrity(&self) -> Option<&dyn IntegrityProvider> {
    None
  }
}

/// Optional capability exposing subresource-integrity hashes.
pub trait IntegrityProvider {
  /// Integrity hashes keyed by built file path; empty when the manifest
  /// declares none.
  fn integrity_data(&self) -> Result<BTreeMap<String, String>>;
}

/// Entry file lookup over a single build's entrypoints manifest.
///
/// The manifest is loaded lazily on first use and memoized for the lifetime
/// of the lookup; an optional [`ManifestCache`] shares the parsed document
/// across lookups and requests.
pub struct EntrypointLookup {
  entrypoints_path: PathBuf,
  cache: Option<Rc<dyn ManifestCache>>,
  cache_key: Option<String>,
  strict: bool,
  document: RefCell<Option<Rc<ManifestDocument>>>,
  returned_files: BTreeSet<String>,
  track_returned_files: bool,
}

impl EntrypointLookup {
  /// Create a strict lookup over the manifest at `entrypoints_path`.
  pub fn new(entrypoints_path: impl Into<PathBuf>) -> Self {
    Self {
      entrypoints_path: entrypoints_path.into(),
      cache: None,
      cache_key: None,
      strict: true,
      document: RefCell::new(None),
      returned_files: BTreeSet::new(),
      track_returned_files: true,
    }
  }

  /// Set whether a missing manifest or unknown entry is fatal.
  ///
  /// Outside strict mode both resolve to empty results instead of errors.
  pub fn with_strict_mode(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  /// Serve and store the parsed manifest through `cache` under `cache_key`.
  pub fn with_cache(mut self, cache: Rc<dyn ManifestCache>, cache_key: impl Into<String>) -> Self {
    self.cache = Some(cache);
    self.cache_key = Some(cache_key.into());
    self
  }

  fn entries(&self) -> Result<Rc<ManifestDocument>> {
    if let Some(document) = self.document.borrow().as_ref() {
      return Ok(Rc::clone(document));
    }

    if let (Some(cache), Some(key)) = (&self.cache, &self.cache_key) {
      if let Some(cached) = cache.get(key) {
        *self.document.borrow_mut() = Some(Rc::clone(&cached));
        return Ok(cached);
      }
    }

    match ManifestDocument::load(&self.entrypoints_path) {
      Ok(document) => {
        let document = Rc::new(document);
        if let (Some(cache), Some(key)) = (&self.cache, &self.cache_key) {
          cache.put(key, Rc::clone(&document));
        }
        *self.document.borrow_mut() = Some(Rc::clone(&document));
        Ok(document)
      }
      // A missing manifest resolves as empty outside strict mode. The result
      // is intentionally not memoized so the file is picked up once it
      // appears.
      Err(Error::ManifestMissing { .. }) if !self.strict => {
        Ok(Rc::new(ManifestDocument::default()))
      }
      Err(err) => Err(err),
    }
  }

  fn entry_files(&mut self, entry_name: &str, kind: FileKind) -> Result<Vec<String>> {
    self.validate_entry_name(entry_name)?;
    let document = self.entries()?;

    let Some(entry) = document.entrypoints.get(entry_name) else {
      // Reachable outside strict mode only; unknown entries resolve as empty.
      return Ok(Vec::new());
    };

    let files = entry.files(kind);
    if !self.track_returned_files {
      return Ok(files.to_vec());
    }

    let fresh: Vec<String> = files
      .iter()
      .filter(|file| !self.returned_files.contains(file.as_str()))
      .cloned()
      .collect();
    self.returned_files.extend(fresh.iter().cloned());

    Ok(fresh)
  }

  fn validate_entry_name(&self, entry_name: &str) -> Result<()> {
    if !self.strict {
      return Ok(());
    }

    let document = self.entries()?;
    if document.entry_exists(entry_name) {
      return Ok(());
    }

    let suggestion = entry_name
      .rfind('.')
      .map(|index| &entry_name[..index])
      .filter(|stripped| document.entry_exists(stripped))
      .map(str::to_string);

    Err(Error::EntrypointNotFound {
      name: entry_name.to_string(),
      suggestion,
      manifest_path: self.entrypoints_path.clone(),
      available: document.entrypoints.keys().cloned().collect(),
    })
  }
}

impl EntrypointProvider for EntrypointLookup {
  fn javascript_files(&mut self, entry_name: &str) -> Result<Vec<String>> {
    self.entry_files(entry_name, FileKind::JavaScript)
  }

  fn css_files(&mut self, entry_name: &str) -> Result<Vec<String>> {
    self.entry_files(entry_name, FileKind::Css)
  }

  fn entry_exists(&self, entry_name: &str) -> Result<bool> {
    Ok(self.entries()?.entry_exists(entry_name))
  }

  fn reset(&mut self) {
    self.returned_files.clear();
  }

  fn enable_returned_file_tracking(&mut self, enabled: bool) -> bool {
    std::mem::replace(&mut self.track_returned_files, enabled)
  }

  fn integrity(&self) -> Option<&dyn IntegrityProvider> {
    Some(self)
  }
}

impl IntegrityProvider for EntrypointLookup {
  fn integrity_data(&self) -> Result<BTreeMap<String, String>> {
    Ok(self.entries()?.integrity.clone())
  }
}
