//! Maps logical asset paths back to files in a build output directory.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::DEFAULT_BUILD;
use crate::error::{Error, Result};

/// Locates built files on disk so their raw source can be read back.
///
/// Works on `/`-separated path strings rather than platform paths: manifest
/// asset paths sometimes redundantly repeat the last directory component of
/// the build output path, and the locator trims that overlap before joining.
pub struct BuildFileLocator {
  build_paths: BTreeMap<String, String>,
  ensure_file_exists: bool,
}

impl BuildFileLocator {
  /// Locator over the given build-name to output-path mapping.
  pub fn new(build_paths: BTreeMap<String, String>) -> Self {
    Self {
      build_paths,
      ensure_file_exists: true,
    }
  }

  /// Skip on-disk existence verification and return computed paths as-is.
  ///
  /// Intended for composition and testing; the check is on by default.
  pub fn disable_file_exists_check(&mut self) {
    self.ensure_file_exists = false;
  }

  /// Path of `asset_path` within the named build's output directory.
  ///
  /// `None` addresses the [`DEFAULT_BUILD`]. Only `.css` and `.js` files may
  /// be located, as a guard against arbitrary file disclosure.
  pub fn find_file(&self, asset_path: &str, build_name: Option<&str>) -> Result<String> {
    if !asset_path.ends_with(".css") && !asset_path.ends_with(".js") {
      return Err(Error::InvalidAssetPath {
        path: asset_path.to_string(),
      });
    }

    let build_name = build_name.unwrap_or(DEFAULT_BUILD);
    let build_path = self
      .build_paths
      .get(build_name)
      .ok_or_else(|| Error::UndefinedBuild {
        name: build_name.to_string(),
      })?;

    let target = combine_paths(build_path, asset_path);

    if self.ensure_file_exists && !Path::new(&target).exists() {
      return Err(Error::FileNotLocated {
        asset_path: asset_path.to_string(),
        build_path: build_path.clone(),
        resolved: target,
      });
    }

    Ok(target)
  }
}

/// Join a build output path and an asset path, trimming head overlap.
///
/// While the first remaining asset segment equals the last directory
/// component of the build path and more than one segment remains, the
/// segment is dropped. Overlap elsewhere in the path is left alone; so is a
/// build path without `/` separators (e.g. a Windows-style path), whose last
/// component never matches.
fn combine_paths(build_path: &str, asset_path: &str) -> String {
  let build_path = build_path.trim_end_matches('/');
  let build_dir_name = build_path.rsplit('/').next().unwrap_or(build_path);

  let mut segments: Vec<&str> = asset_path.trim_start_matches('/').split('/').collect();
  while segments.len() > 1 && segments[0] == build_dir_name {
    segments.remove(0);
  }

  format!("{}/{}", build_path, segments.join("/"))
}
