//! Entry file lookups and the per-build routing collection.

mod collection;
mod entrypoint;

pub use collection::{EntrypointLookupCollection, SharedEntrypointLookup};
pub use entrypoint::{EntrypointLookup, EntrypointProvider, IntegrityProvider};
