//! Raw source concatenation for inlining built entry files.

use std::fs;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::locator::BuildFileLocator;
use crate::lookup::{EntrypointLookupCollection, EntrypointProvider};
use crate::manifest::FileKind;

/// Reads the concatenated source of an entry's built files.
///
/// Used to inline scripts or styles directly into a page. The lookup's
/// returned-file tracking is suspended around the file-list fetch, so
/// inlining an entry neither consumes nor replays the tag-rendering dedup
/// state of the surrounding request.
pub struct EntrySourceReader {
  lookups: Rc<EntrypointLookupCollection>,
  locator: BuildFileLocator,
}

impl EntrySourceReader {
  /// Reader resolving entries through `lookups` and files through `locator`.
  pub fn new(lookups: Rc<EntrypointLookupCollection>, locator: BuildFileLocator) -> Self {
    Self { lookups, locator }
  }

  /// Concatenated JavaScript source for `entry_name`, in manifest order.
  pub fn javascript_source(&self, entry_name: &str, build_name: Option<&str>) -> Result<String> {
    self.concatenated_source(entry_name, build_name, FileKind::JavaScript)
  }

  /// Concatenated stylesheet source for `entry_name`, in manifest order.
  pub fn css_source(&self, entry_name: &str, build_name: Option<&str>) -> Result<String> {
    self.concatenated_source(entry_name, build_name, FileKind::Css)
  }

  fn concatenated_source(
    &self,
    entry_name: &str,
    build_name: Option<&str>,
    kind: FileKind,
  ) -> Result<String> {
    let build_name = build_name.or_else(|| self.lookups.default_build());
    let lookup = self.lookups.entrypoint_lookup(build_name)?;

    let files = {
      let mut lookup = lookup.borrow_mut();
      // The full file list is needed regardless of which tags already went
      // out; the previous tracking setting is restored even when the lookup
      // fails.
      let previous = lookup.enable_returned_file_tracking(false);
      let files = match kind {
        FileKind::JavaScript => lookup.javascript_files(entry_name),
        FileKind::Css => lookup.css_files(entry_name),
      };
      lookup.enable_returned_file_tracking(previous);
      files?
    };

    let mut combined = String::new();
    for file in files {
      let path = self.locator.find_file(&file, build_name)?;
      let contents = fs::read_to_string(&path).map_err(|source| Error::SourceIo {
        path: path.clone(),
        source,
      })?;
      combined.push_str(&contents);
    }

    Ok(combined)
  }
}
