//! URL resolution collaborators turning built file paths into public URLs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Maps a built file path to the public URL a tag should reference.
///
/// This is the seam for the host's static-asset base-path or versioning
/// service; the renderer never builds URLs itself.
pub trait AssetUrlResolver {
  /// Public URL for `path`, optionally routed through a named asset package.
  fn asset_url(&self, path: &str, package: Option<&str>) -> Result<String>;
}

/// Prefixes asset paths with configured base URLs.
#[derive(Debug, Clone, Default)]
pub struct BasePathUrlResolver {
  default_base: String,
  packages: BTreeMap<String, String>,
}

impl BasePathUrlResolver {
  /// Resolver prefixing every path with `default_base`.
  pub fn new(default_base: impl Into<String>) -> Self {
    Self {
      default_base: default_base.into(),
      packages: BTreeMap::new(),
    }
  }

  /// Register a named package with its own base URL.
  pub fn with_package(mut self, name: impl Into<String>, base: impl Into<String>) -> Self {
    self.packages.insert(name.into(), base.into());
    self
  }

  fn join(base: &str, path: &str) -> String {
    if base.is_empty() {
      return path.to_string();
    }
    format!(
      "{}/{}",
      base.trim_end_matches('/'),
      path.trim_start_matches('/')
    )
  }
}

impl AssetUrlResolver for BasePathUrlResolver {
  fn asset_url(&self, path: &str, package: Option<&str>) -> Result<String> {
    let base = match package {
      Some(name) => self.packages.get(name).ok_or_else(|| Error::UnknownPackage {
        name: name.to_string(),
      })?,
      None => &self.default_base,
    };

    Ok(Self::join(base, path))
  }
}

/// Resolves logical paths through the bundler's `manifest.json` mapping.
///
/// Bundlers emit a flat manifest mapping source-relative paths to their
/// hashed output names. The file is loaded lazily and memoized; paths the
/// manifest does not mention pass through unchanged. Named packages are not
/// meaningful for this resolver and are ignored.
pub struct ManifestUrlResolver {
  manifest_path: PathBuf,
  entries: RefCell<Option<Rc<BTreeMap<String, String>>>>,
}

impl ManifestUrlResolver {
  /// Resolver over the `manifest.json` at `manifest_path`.
  pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
    Self {
      manifest_path: manifest_path.into(),
      entries: RefCell::new(None),
    }
  }

  fn entries(&self) -> Result<Rc<BTreeMap<String, String>>> {
    if let Some(entries) = self.entries.borrow().as_ref() {
      return Ok(Rc::clone(entries));
    }

    if !self.manifest_path.exists() {
      return Err(Error::UrlManifestMissing {
        path: self.manifest_path.clone(),
      });
    }

    let contents =
      fs::read_to_string(&self.manifest_path).map_err(|err| Error::UrlManifestInvalid {
        path: self.manifest_path.clone(),
        message: err.to_string(),
      })?;
    let entries: BTreeMap<String, String> =
      serde_json::from_str(&contents).map_err(|err| Error::UrlManifestInvalid {
        path: self.manifest_path.clone(),
        message: err.to_string(),
      })?;

    let entries = Rc::new(entries);
    *self.entries.borrow_mut() = Some(Rc::clone(&entries));
    Ok(entries)
  }
}

impl AssetUrlResolver for ManifestUrlResolver {
  fn asset_url(&self, path: &str, _package: Option<&str>) -> Result<String> {
    let entries = self.entries()?;
    Ok(
      entries
        .get(path)
        .cloned()
        .unwrap_or_else(|| path.to_string()),
    )
  }
}
