//! Error types shared across the crate.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced while resolving entrypoints or rendering tags.
///
/// Every cause is deterministic; nothing here is retried. Manifest and build
/// configuration problems are fatal, while [`Error::EntrypointNotFound`] is
/// recoverable by the caller and carries an actionable message.
#[derive(Error, Debug)]
pub enum Error {
  /// The entrypoints manifest file does not exist.
  #[error("could not find the entrypoints file: \"{}\" does not exist", .path.display())]
  ManifestMissing {
    /// Path that was looked up.
    path: PathBuf,
  },

  /// The entrypoints manifest file exists but could not be read.
  #[error("failed to read the entrypoints file \"{}\": {source}", .path.display())]
  ManifestIo {
    /// Path that was read.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },

  /// The entrypoints manifest is not valid JSON.
  #[error("there was a problem JSON decoding the \"{}\" file: {source}", .path.display())]
  ManifestJson {
    /// Path that was parsed.
    path: PathBuf,
    /// Underlying parse error.
    source: serde_json::Error,
  },

  /// The entrypoints manifest parsed but has no top-level `entrypoints` key.
  #[error("could not find an \"entrypoints\" key in the \"{}\" file", .path.display())]
  EntrypointsKeyMissing {
    /// Path that was parsed.
    path: PathBuf,
  },

  /// The entrypoints manifest parsed but does not match the expected layout.
  #[error("the \"{}\" file does not match the entrypoints layout: {source}", .path.display())]
  ManifestShape {
    /// Path that was parsed.
    path: PathBuf,
    /// Underlying deserialization error.
    source: serde_json::Error,
  },

  /// The requested entry name is not declared in the manifest.
  #[error("{}", entrypoint_not_found_message(.name, .suggestion, .manifest_path, .available))]
  EntrypointNotFound {
    /// Entry name that was requested.
    name: String,
    /// Known entry matching the name once its trailing extension is removed.
    suggestion: Option<String>,
    /// Manifest the entry was looked up in.
    manifest_path: PathBuf,
    /// Every entry name the manifest declares.
    available: Vec<String>,
  },

  /// A build name was requested that no lookup is registered under.
  #[error("the build \"{name}\" is not configured")]
  UndefinedBuild {
    /// Build name that was requested.
    name: String,
  },

  /// No build name was given and no default build is configured.
  #[error("there is no default build configured: pass an explicit build name")]
  NoDefaultBuild,

  /// An asset path with a disallowed extension was passed to the file locator.
  #[error("can only read files ending in .css and .js, got \"{path}\"")]
  InvalidAssetPath {
    /// Asset path that was rejected.
    path: String,
  },

  /// The file locator computed a path that does not exist on disk.
  #[error(
    "cannot locate \"{asset_path}\" by combining it with the build path \"{build_path}\": looked in \"{resolved}\""
  )]
  FileNotLocated {
    /// Logical asset path that was requested.
    asset_path: String,
    /// Configured build output path.
    build_path: String,
    /// Absolute path that was computed and checked.
    resolved: String,
  },

  /// A located build file could not be read back for inlining.
  #[error("failed to read the built file \"{path}\": {source}")]
  SourceIo {
    /// File that was read.
    path: String,
    /// Underlying I/O error.
    source: std::io::Error,
  },

  /// A named asset package was requested that the URL resolver does not know.
  #[error("the package \"{name}\" is not configured on the URL resolver")]
  UnknownPackage {
    /// Package name that was requested.
    name: String,
  },

  /// The hashed-filename asset manifest does not exist.
  #[error("asset manifest file \"{}\" does not exist", .path.display())]
  UrlManifestMissing {
    /// Path that was looked up.
    path: PathBuf,
  },

  /// The hashed-filename asset manifest could not be read or parsed.
  #[error("error parsing JSON from asset manifest file \"{}\": {message}", .path.display())]
  UrlManifestInvalid {
    /// Path that was parsed.
    path: PathBuf,
    /// Description of the read or parse failure.
    message: String,
  },
}

fn entrypoint_not_found_message(
  name: &str,
  suggestion: &Option<String>,
  manifest_path: &Path,
  available: &[String],
) -> String {
  match suggestion {
    Some(suggestion) => {
      format!("could not find the entry \"{name}\". Try \"{suggestion}\" instead (without the extension)")
    }
    None => format!(
      "could not find the entry \"{name}\" in \"{}\". Found: {}",
      manifest_path.display(),
      available.join(", ")
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn suggests_stripped_name_for_entries_with_extension() {
    let err = Error::EntrypointNotFound {
      name: "my_entry.js".to_string(),
      suggestion: Some("my_entry".to_string()),
      manifest_path: PathBuf::from("/build/entrypoints.json"),
      available: vec!["my_entry".to_string()],
    };

    assert_eq!(
      err.to_string(),
      "could not find the entry \"my_entry.js\". Try \"my_entry\" instead (without the extension)"
    );
  }

  #[test]
  fn lists_known_entries_when_no_suggestion_applies() {
    let err = Error::EntrypointNotFound {
      name: "missing".to_string(),
      suggestion: None,
      manifest_path: PathBuf::from("/build/entrypoints.json"),
      available: vec!["app".to_string(), "admin".to_string()],
    };

    assert_eq!(
      err.to_string(),
      "could not find the entry \"missing\" in \"/build/entrypoints.json\". Found: app, admin"
    );
  }

  #[test]
  fn names_the_missing_manifest_path() {
    let err = Error::ManifestMissing {
      path: PathBuf::from("/build/entrypoints.json"),
    };

    assert_eq!(
      err.to_string(),
      "could not find the entrypoints file: \"/build/entrypoints.json\" does not exist"
    );
  }
}
