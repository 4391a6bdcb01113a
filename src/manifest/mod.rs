//! Manifest document model, parsing and caching.

mod cache;
mod document;

pub use cache::{InMemoryManifestCache, ManifestCache};
pub use document::{EntryFiles, FileKind, ManifestDocument};
