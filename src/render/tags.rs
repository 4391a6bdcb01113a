//! Composition of entry files, URLs and attributes into HTML asset tags.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::Result;
use crate::lookup::{EntrypointLookupCollection, EntrypointProvider, IntegrityProvider};
use crate::urls::AssetUrlResolver;

use super::attributes::{AttributeMap, AttributeValue};

/// Kind of tag being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
  /// A `<script>` tag.
  Script,
  /// A `<link rel="stylesheet">` tag.
  Link,
}

/// A tag about to be serialized, handed to listeners for customization.
#[derive(Debug, Clone)]
pub struct RenderedTag {
  kind: TagKind,
  url: String,
  attributes: AttributeMap,
}

impl RenderedTag {
  /// Kind of tag being rendered.
  pub fn kind(&self) -> TagKind {
    self.kind
  }

  /// Resolved public URL the tag references.
  pub fn url(&self) -> &str {
    &self.url
  }

  /// Assembled attributes, in serialization order.
  pub fn attributes(&self) -> &AttributeMap {
    &self.attributes
  }

  /// Set or replace an attribute.
  pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
    self.attributes.set(name, value);
  }

  /// Remove an attribute entirely.
  pub fn remove_attribute(&mut self, name: &str) {
    self.attributes.remove(name);
  }
}

/// Observer invoked for every tag before it is serialized.
///
/// Listeners may add, change or remove attributes; with no listeners
/// registered, tags render exactly as assembled.
pub trait TagListener {
  /// Inspect or modify an assembled tag.
  fn on_tag_render(&self, tag: &mut RenderedTag);
}

/// Cross-origin policy merged into the global default attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossOrigin {
  /// `crossorigin="anonymous"`.
  Anonymous,
  /// `crossorigin="use-credentials"`.
  UseCredentials,
}

impl CrossOrigin {
  fn as_str(self) -> &'static str {
    match self {
      CrossOrigin::Anonymous => "anonymous",
      CrossOrigin::UseCredentials => "use-credentials",
    }
  }
}

/// Renderer configuration; every field has a working default.
#[derive(Default)]
pub struct TagRendererConfig {
  /// Cross-origin attribute applied to every tag unless already set.
  pub crossorigin: Option<CrossOrigin>,
  /// Attributes applied to every rendered tag.
  pub default_attributes: AttributeMap,
  /// Additional attributes applied to script tags only.
  pub default_script_attributes: AttributeMap,
  /// Additional attributes applied to link tags only.
  pub default_link_attributes: AttributeMap,
  /// Observers allowed to customize each tag before serialization.
  pub listeners: Vec<Box<dyn TagListener>>,
}

/// Renders the script and link tags a page entry needs.
///
/// Rendering is stateless apart from per-render bookkeeping: every emitted
/// tag's final attribute set is recorded so a later stage (such as a preload
/// `Link` header generator) can enumerate what actually went out.
pub struct TagRenderer {
  lookups: Rc<EntrypointLookupCollection>,
  urls: Box<dyn AssetUrlResolver>,
  default_attributes: AttributeMap,
  default_script_attributes: AttributeMap,
  default_link_attributes: AttributeMap,
  listeners: Vec<Box<dyn TagListener>>,
  rendered_scripts: Vec<AttributeMap>,
  rendered_styles: Vec<AttributeMap>,
}

impl TagRenderer {
  /// Create a renderer over `lookups`, resolving URLs through `urls`.
  pub fn new(
    lookups: Rc<EntrypointLookupCollection>,
    urls: Box<dyn AssetUrlResolver>,
    config: TagRendererConfig,
  ) -> Self {
    let TagRendererConfig {
      crossorigin,
      mut default_attributes,
      default_script_attributes,
      default_link_attributes,
      listeners,
    } = config;

    if let Some(crossorigin) = crossorigin {
      default_attributes.set_if_absent("crossorigin", crossorigin.as_str());
    }

    Self {
      lookups,
      urls,
      default_attributes,
      default_script_attributes,
      default_link_attributes,
      listeners,
      rendered_scripts: Vec::new(),
      rendered_styles: Vec::new(),
    }
  }

  /// Render `<script>` tags for every not-yet-emitted JavaScript file of the
  /// entry.
  pub fn render_script_tags(
    &mut self,
    entry_name: &str,
    package: Option<&str>,
    build_name: Option<&str>,
    extra_attributes: Option<&AttributeMap>,
  ) -> Result<String> {
    self.render_tags(TagKind::Script, entry_name, package, build_name, extra_attributes)
  }

  /// Render `<link rel="stylesheet">` tags for every not-yet-emitted
  /// stylesheet of the entry.
  pub fn render_link_tags(
    &mut self,
    entry_name: &str,
    package: Option<&str>,
    build_name: Option<&str>,
    extra_attributes: Option<&AttributeMap>,
  ) -> Result<String> {
    self.render_tags(TagKind::Link, entry_name, package, build_name, extra_attributes)
  }

  fn render_tags(
    &mut self,
    kind: TagKind,
    entry_name: &str,
    package: Option<&str>,
    build_name: Option<&str>,
    extra_attributes: Option<&AttributeMap>,
  ) -> Result<String> {
    let lookup = self.lookups.entrypoint_lookup(build_name)?;

    let files = {
      let mut lookup = lookup.borrow_mut();
      match kind {
        TagKind::Script => lookup.javascript_files(entry_name)?,
        TagKind::Link => lookup.css_files(entry_name)?,
      }
    };

    let integrity = {
      let lookup = lookup.borrow();
      match lookup.integrity() {
        Some(provider) => provider.integrity_data()?,
        None => BTreeMap::new(),
      }
    };

    let mut tags = String::new();
    for file in files {
      let url = self.urls.asset_url(&file, package)?;

      let mut attributes = AttributeMap::new();
      match kind {
        TagKind::Script => attributes.set("src", url.as_str()),
        TagKind::Link => {
          attributes.set("rel", "stylesheet");
          attributes.set("href", url.as_str());
        }
      }

      attributes.merge_defaults(&self.default_attributes);
      attributes.merge_defaults(match kind {
        TagKind::Script => &self.default_script_attributes,
        TagKind::Link => &self.default_link_attributes,
      });
      if let Some(extra) = extra_attributes {
        attributes.merge_overrides(extra);
      }
      if let Some(hash) = integrity.get(&file) {
        attributes.set("integrity", hash.as_str());
      }

      let mut tag = RenderedTag {
        kind,
        url,
        attributes,
      };
      for listener in &self.listeners {
        listener.on_tag_render(&mut tag);
      }

      tags.push_str(&match kind {
        TagKind::Script => format!("<script {}></script>", tag.attributes.to_html()),
        TagKind::Link => format!("<link {}>", tag.attributes.to_html()),
      });

      match kind {
        TagKind::Script => self.rendered_scripts.push(tag.attributes),
        TagKind::Link => self.rendered_styles.push(tag.attributes),
      }
    }

    Ok(tags)
  }

  /// URLs of every script tag emitted since the last [`TagRenderer::reset`].
  pub fn rendered_scripts(&self) -> Vec<String> {
    urls_of(&self.rendered_scripts, "src")
  }

  /// URLs of every link tag emitted since the last [`TagRenderer::reset`].
  pub fn rendered_styles(&self) -> Vec<String> {
    urls_of(&self.rendered_styles, "href")
  }

  /// Full attribute sets of every emitted script tag, post-listener.
  pub fn rendered_scripts_with_attributes(&self) -> &[AttributeMap] {
    &self.rendered_scripts
  }

  /// Full attribute sets of every emitted link tag, post-listener.
  pub fn rendered_styles_with_attributes(&self) -> &[AttributeMap] {
    &self.rendered_styles
  }

  /// Configured global default attributes.
  ///
  /// A downstream preload generator merges these back over the recorded
  /// per-tag attributes.
  pub fn default_attributes(&self) -> &AttributeMap {
    &self.default_attributes
  }

  /// The collection this renderer resolves entry files through.
  pub fn entrypoint_lookups(&self) -> &Rc<EntrypointLookupCollection> {
    &self.lookups
  }

  /// Clear the rendered-tag record.
  ///
  /// Independent of the lookups' own dedup state; the host typically resets
  /// both at the same top-level request boundary.
  pub fn reset(&mut self) {
    self.rendered_scripts.clear();
    self.rendered_styles.clear();
  }
}

fn urls_of(rendered: &[AttributeMap], url_attribute: &str) -> Vec<String> {
  rendered
    .iter()
    .filter_map(|attributes| match attributes.get(url_attribute) {
      Some(AttributeValue::Text(url)) => Some(url.clone()),
      _ => None,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;
  use crate::lookup::{
    EntrypointLookup, EntrypointProvider, IntegrityProvider, SharedEntrypointLookup,
  };
  use crate::urls::BasePathUrlResolver;
  use std::cell::RefCell;
  use std::fs;
  use tempfile::tempdir;

  struct StubLookup {
    js: Vec<String>,
    css: Vec<String>,
    integrity: Option<BTreeMap<String, String>>,
  }

  impl StubLookup {
    fn with_js(files: &[&str]) -> Self {
      Self {
        js: files.iter().map(|file| file.to_string()).collect(),
        css: Vec::new(),
        integrity: None,
      }
    }

    fn with_css(files: &[&str]) -> Self {
      Self {
        js: Vec::new(),
        css: files.iter().map(|file| file.to_string()).collect(),
        integrity: None,
      }
    }
  }

  impl EntrypointProvider for StubLookup {
    fn javascript_files(&mut self, _entry_name: &str) -> Result<Vec<String>> {
      Ok(self.js.clone())
    }

    fn css_files(&mut self, _entry_name: &str) -> Result<Vec<String>> {
      Ok(self.css.clone())
    }

    fn entry_exists(&self, _entry_name: &str) -> Result<bool> {
      Ok(true)
    }

    fn reset(&mut self) {}

    fn enable_returned_file_tracking(&mut self, _enabled: bool) -> bool {
      true
    }

    fn integrity(&self) -> Option<&dyn IntegrityProvider> {
      self.integrity.as_ref().map(|_| self as &dyn IntegrityProvider)
    }
  }

  impl IntegrityProvider for StubLookup {
    fn integrity_data(&self) -> Result<BTreeMap<String, String>> {
      Ok(self.integrity.clone().unwrap_or_default())
    }
  }

  fn collection_of(lookup: StubLookup) -> Rc<EntrypointLookupCollection> {
    let mut builds: BTreeMap<String, SharedEntrypointLookup> = BTreeMap::new();
    builds.insert("_default".to_string(), Rc::new(RefCell::new(lookup)));
    Rc::new(EntrypointLookupCollection::new(
      builds,
      Some("_default".to_string()),
    ))
  }

  fn renderer_with(lookup: StubLookup, config: TagRendererConfig) -> TagRenderer {
    TagRenderer::new(
      collection_of(lookup),
      Box::new(BasePathUrlResolver::new("http://localhost:8080")),
      config,
    )
  }

  #[test]
  fn renders_script_tags_with_default_attributes() {
    let mut renderer = renderer_with(
      StubLookup::with_js(&["/build/file1.js", "/build/file2.js"]),
      TagRendererConfig {
        default_attributes: [("defer", true)].into_iter().collect(),
        ..TagRendererConfig::default()
      },
    );

    let output = renderer.render_script_tags("my_entry", None, None, None).unwrap();

    assert!(output.contains("<script src=\"http://localhost:8080/build/file1.js\" defer></script>"));
    assert!(output.contains("<script src=\"http://localhost:8080/build/file2.js\" defer></script>"));
  }

  #[test]
  fn extra_attributes_override_defaults_in_place() {
    let mut renderer = renderer_with(
      StubLookup::with_js(&["/build/file1.js"]),
      TagRendererConfig {
        default_attributes: [("defer", AttributeValue::Present), ("nonce", "abc123".into())]
          .into_iter()
          .collect(),
        default_script_attributes: [("referrerpolicy", "origin")].into_iter().collect(),
        ..TagRendererConfig::default()
      },
    );

    let extra: AttributeMap = [("nonce", "12345")].into_iter().collect();
    let output = renderer
      .render_script_tags("my_entry", None, None, Some(&extra))
      .unwrap();

    assert_eq!(
      output,
      "<script src=\"http://localhost:8080/build/file1.js\" defer nonce=\"12345\" referrerpolicy=\"origin\"></script>"
    );
  }

  #[test]
  fn omitted_values_suppress_and_present_values_render_bare() {
    let mut renderer = renderer_with(
      StubLookup::with_js(&["/build/file1.js"]),
      TagRendererConfig {
        default_attributes: [("defer", false), ("async", true)].into_iter().collect(),
        ..TagRendererConfig::default()
      },
    );

    let output = renderer.render_script_tags("my_entry", None, None, None).unwrap();

    assert_eq!(
      output,
      "<script src=\"http://localhost:8080/build/file1.js\" async></script>"
    );
  }

  #[test]
  fn escapes_urls_with_html_characters() {
    let mut renderer = renderer_with(
      StubLookup::with_js(&["/build/file<\"bad_chars.js"]),
      TagRendererConfig {
        crossorigin: Some(CrossOrigin::Anonymous),
        ..TagRendererConfig::default()
      },
    );

    let output = renderer.render_script_tags("my_entry", None, None, None).unwrap();

    assert_eq!(
      output,
      "<script src=\"http://localhost:8080/build/file&lt;&quot;bad_chars.js\" crossorigin=\"anonymous\"></script>"
    );
  }

  #[test]
  fn sets_integrity_from_the_lookup_capability() {
    let mut lookup = StubLookup::with_js(&["/build/file1.js", "/build/file2.js"]);
    lookup.integrity = Some(
      [
        (
          "/build/file1.js".to_string(),
          "sha384-Q86c+opr0lBUPWN28BLJFqmLhho+9ZcJpXHorQvX6mYDWJ24RQcdDarXFQYN8HLc".to_string(),
        ),
        (
          "/build/file2.js".to_string(),
          "sha384-ymG7OyjISWrOpH9jsGvajKMDEOP/mKJq8bHC0XdjQA6P8sg2nu+2RLQxcNNwE/3J".to_string(),
        ),
      ]
      .into_iter()
      .collect(),
    );

    let mut renderer = renderer_with(
      lookup,
      TagRendererConfig {
        crossorigin: Some(CrossOrigin::Anonymous),
        ..TagRendererConfig::default()
      },
    );

    let output = renderer.render_script_tags("my_entry", None, None, None).unwrap();

    assert!(output.contains(
      "<script src=\"http://localhost:8080/build/file1.js\" crossorigin=\"anonymous\" integrity=\"sha384-Q86c+opr0lBUPWN28BLJFqmLhho+9ZcJpXHorQvX6mYDWJ24RQcdDarXFQYN8HLc\"></script>"
    ));
    assert!(output.contains(
      "<script src=\"http://localhost:8080/build/file2.js\" crossorigin=\"anonymous\" integrity=\"sha384-ymG7OyjISWrOpH9jsGvajKMDEOP/mKJq8bHC0XdjQA6P8sg2nu+2RLQxcNNwE/3J\"></script>"
    ));
  }

  #[test]
  fn integrity_is_only_set_for_matching_paths() {
    let mut lookup = StubLookup::with_js(&["/build/file1.js"]);
    lookup.integrity = Some(
      [("/build/other.js".to_string(), "sha384-aaaa".to_string())]
        .into_iter()
        .collect(),
    );

    let mut renderer = renderer_with(lookup, TagRendererConfig::default());

    let output = renderer.render_script_tags("my_entry", None, None, None).unwrap();

    assert!(!output.contains("integrity"));
  }

  #[test]
  fn listeners_can_rewrite_attributes_before_serialization() {
    struct NonceListener;
    impl TagListener for NonceListener {
      fn on_tag_render(&self, tag: &mut RenderedTag) {
        if tag.kind() == TagKind::Script {
          tag.set_attribute("nonce", "some_nonce_here");
          tag.remove_attribute("defer");
        }
      }
    }

    let mut renderer = renderer_with(
      StubLookup::with_js(&["/build/file1.js"]),
      TagRendererConfig {
        default_attributes: [("defer", true)].into_iter().collect(),
        listeners: vec![Box::new(NonceListener)],
        ..TagRendererConfig::default()
      },
    );

    let output = renderer.render_script_tags("my_entry", None, None, None).unwrap();

    assert_eq!(
      output,
      "<script src=\"http://localhost:8080/build/file1.js\" nonce=\"some_nonce_here\"></script>"
    );
  }

  #[test]
  fn renders_link_tags() {
    let mut renderer = renderer_with(
      StubLookup::with_css(&["/build/file1.css"]),
      TagRendererConfig::default(),
    );

    let output = renderer.render_link_tags("my_entry", None, None, None).unwrap();

    assert_eq!(
      output,
      "<link rel=\"stylesheet\" href=\"http://localhost:8080/build/file1.css\">"
    );
  }

  #[test]
  fn records_rendered_tags_until_reset() {
    let mut lookup = StubLookup::with_js(&["/build/file1.js", "/build/file2.js"]);
    lookup.css = vec!["/build/file1.css".to_string()];

    let mut renderer = renderer_with(lookup, TagRendererConfig::default());

    renderer.render_script_tags("my_entry", None, None, None).unwrap();
    renderer.render_link_tags("my_entry", None, None, None).unwrap();

    assert_eq!(
      renderer.rendered_scripts(),
      [
        "http://localhost:8080/build/file1.js",
        "http://localhost:8080/build/file2.js"
      ]
    );
    assert_eq!(
      renderer.rendered_styles(),
      ["http://localhost:8080/build/file1.css"]
    );
    assert_eq!(renderer.rendered_scripts_with_attributes().len(), 2);

    renderer.reset();

    assert!(renderer.rendered_scripts().is_empty());
    assert!(renderer.rendered_styles().is_empty());
  }

  #[test]
  fn exposes_the_configured_default_attributes() {
    let renderer = renderer_with(
      StubLookup::with_js(&[]),
      TagRendererConfig {
        crossorigin: Some(CrossOrigin::UseCredentials),
        ..TagRendererConfig::default()
      },
    );

    assert_eq!(
      renderer.default_attributes().get("crossorigin"),
      Some(&AttributeValue::Text("use-credentials".into()))
    );
  }

  #[test]
  fn fails_for_unknown_builds() {
    let mut renderer = renderer_with(StubLookup::with_js(&[]), TagRendererConfig::default());

    let err = renderer
      .render_script_tags("my_entry", None, Some("third"), None)
      .unwrap_err();

    assert!(matches!(err, Error::UndefinedBuild { .. }));
  }

  #[test]
  fn dedup_holds_across_nested_renders_with_a_real_lookup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("entrypoints.json");
    fs::write(
      &path,
      r#"{"entrypoints": {"app": {"js": ["a.js", "b.js"], "css": []}}}"#,
    )
    .unwrap();

    let mut builds: BTreeMap<String, SharedEntrypointLookup> = BTreeMap::new();
    builds.insert(
      "_default".to_string(),
      Rc::new(RefCell::new(EntrypointLookup::new(&path))),
    );
    let collection = Rc::new(EntrypointLookupCollection::new(
      builds,
      Some("_default".to_string()),
    ));

    let mut renderer = TagRenderer::new(
      Rc::clone(&collection),
      Box::new(BasePathUrlResolver::default()),
      TagRendererConfig::default(),
    );

    // Parent render emits everything; the nested render adds nothing.
    let first = renderer.render_script_tags("app", None, None, None).unwrap();
    assert_eq!(first, "<script src=\"a.js\"></script><script src=\"b.js\"></script>");
    let nested = renderer.render_script_tags("app", None, None, None).unwrap();
    assert!(nested.is_empty());

    // The next top-level request starts from a clean slate.
    collection.reset_all();
    renderer.reset();
    let next = renderer.render_script_tags("app", None, None, None).unwrap();
    assert_eq!(next, first);
  }
}
