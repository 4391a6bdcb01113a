//! Typed representation of the bundler's entrypoints manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Asset kinds a manifest entry can list files for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
  /// Built JavaScript files, listed under the `js` key.
  JavaScript,
  /// Built stylesheets, listed under the `css` key.
  Css,
}

/// Built files recorded for a single entry, grouped by asset kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFiles {
  /// JavaScript files emitted for the entry, in load order.
  #[serde(default)]
  pub js: Vec<String>,
  /// Stylesheets emitted for the entry, in load order.
  #[serde(default)]
  pub css: Vec<String>,
}

impl EntryFiles {
  /// Files of the requested kind, in manifest order.
  ///
  /// An entry that does not list the kind yields an empty slice, never an
  /// error.
  pub fn files(&self, kind: FileKind) -> &[String] {
    match kind {
      FileKind::JavaScript => &self.js,
      FileKind::Css => &self.css,
    }
  }
}

/// Deserialized entrypoints manifest produced by the bundler.
///
/// Immutable after loading; share it freely across lookups and requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestDocument {
  /// Mapping of entry name to the files built for it.
  pub entrypoints: BTreeMap<String, EntryFiles>,
  /// Subresource-integrity hashes keyed by built file path.
  #[serde(default)]
  pub integrity: BTreeMap<String, String>,
}

impl ManifestDocument {
  /// Load and validate a manifest from disk.
  pub fn load(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Err(Error::ManifestMissing {
        path: path.to_path_buf(),
      });
    }

    let contents = fs::read_to_string(path).map_err(|source| Error::ManifestIo {
      path: path.to_path_buf(),
      source,
    })?;

    Self::from_json_str(path, &contents)
  }

  /// Parse manifest JSON, reporting failures against `path`.
  ///
  /// Invalid JSON, a missing top-level `entrypoints` key and a structurally
  /// wrong document are surfaced as distinct errors so callers can report
  /// the actual configuration mistake.
  pub fn from_json_str(path: &Path, json: &str) -> Result<Self> {
    let value: serde_json::Value =
      serde_json::from_str(json).map_err(|source| Error::ManifestJson {
        path: path.to_path_buf(),
        source,
      })?;

    if value.get("entrypoints").is_none() {
      return Err(Error::EntrypointsKeyMissing {
        path: path.to_path_buf(),
      });
    }

    serde_json::from_value(value).map_err(|source| Error::ManifestShape {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Whether the manifest declares an entry under `entry_name`.
  pub fn entry_exists(&self, entry_name: &str) -> bool {
    self.entrypoints.contains_key(entry_name)
  }
}
