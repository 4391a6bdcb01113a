#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod locator;
pub mod lookup;
pub mod manifest;
pub mod render;
pub mod source;
pub mod urls;

pub use config::{BuildConfig, DEFAULT_BUILD};
pub use error::{Error, Result};
pub use locator::BuildFileLocator;
pub use lookup::{
  EntrypointLookup, EntrypointLookupCollection, EntrypointProvider, IntegrityProvider,
  SharedEntrypointLookup,
};
pub use manifest::{EntryFiles, FileKind, InMemoryManifestCache, ManifestCache, ManifestDocument};
pub use render::{
  AttributeMap, AttributeValue, CrossOrigin, RenderedTag, TagKind, TagListener, TagRenderer,
  TagRendererConfig,
};
pub use source::EntrySourceReader;
pub use urls::{AssetUrlResolver, BasePathUrlResolver, ManifestUrlResolver};
