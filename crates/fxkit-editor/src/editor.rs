//! Editor - Main entry point
//!
//! Holds what documents share: configuration, the metadata registry, the
//! resource loader, the background task runner and the scanned component
//! library.

use std::path::Path;
use std::sync::Arc;

use fxkit_fxom::{
    FileSystemLoader, FxomDocument, FxomFragment, LoadContext, ResourceBundle, ResourceLoader,
};
use fxkit_metadata::MetadataRegistry;
use url::Url;

use crate::{
    EditorConfig, EditorDocument, EditorError, EditorResult, Library, LibraryItem, LibraryScanner,
    TaskHandle, TaskRunner,
};

#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    registry: Arc<MetadataRegistry>,
    loader: Arc<dyn ResourceLoader>,
    runner: TaskRunner,
    items: Vec<LibraryItem>,
}

impl Editor {
    /// Create an editor, loading the configured component catalogs
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        let mut registry = MetadataRegistry::builtin();
        for catalog in &config.catalogs {
            let json = std::fs::read_to_string(catalog).map_err(|e| EditorError::io(catalog, e))?;
            let count = registry.register_catalog_json(&json)?;
            tracing::info!("Loaded {count} components from {}", catalog.display());
        }
        config.target_version()?;
        tracing::info!("fxkit {} ready ({} components)", crate::VERSION, registry.len());

        Ok(Self {
            config,
            registry: Arc::new(registry),
            loader: Arc::new(FileSystemLoader::new()),
            runner: TaskRunner::new(),
            items: Vec::new(),
        })
    }

    /// Read documents and their resources through `loader`
    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_runner(mut self, runner: TaskRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &Arc<dyn ResourceLoader> {
        &self.loader
    }

    /// Load context for a document at `location`
    pub fn context(&self, location: Option<Url>) -> LoadContext {
        let context = LoadContext::new(Arc::clone(&self.registry)).with_loader(Arc::clone(&self.loader));
        match location {
            Some(location) => context.with_location(location),
            None => context,
        }
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Parse markup located at `location`, with an optional resource bundle
    pub fn parse(
        &self,
        text: &str,
        location: Option<Url>,
        resources: Option<ResourceBundle>,
    ) -> EditorResult<EditorDocument> {
        let mut context = self.context(location);
        if let Some(resources) = resources {
            context = context.with_resources(resources);
        }
        EditorDocument::parse(text, &context, &self.config)
    }

    /// Load and parse the document at `url`
    pub fn open_url(&self, url: &Url, resources: Option<ResourceBundle>) -> EditorResult<EditorDocument> {
        let text = self.loader.read_text(url, None)?;
        tracing::info!("Opening {url}");
        self.parse(&text, Some(url.clone()), resources)
    }

    /// Open a local file
    pub fn open(&self, path: impl AsRef<Path>) -> EditorResult<EditorDocument> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|e| EditorError::io(path, e))?;
        let url = Url::from_file_path(&absolute).map_err(|_| EditorError::InvalidPath(absolute.clone()))?;
        let text = std::fs::read_to_string(&absolute).map_err(|e| EditorError::io(&absolute, e))?;
        tracing::info!("Opening {}", absolute.display());
        let mut document = self.parse(&text, Some(url), None)?;
        document.set_path(Some(absolute));
        Ok(document)
    }

    // ------------------------------------------------------------------
    // Library
    // ------------------------------------------------------------------

    /// Scan the configured library paths in the background
    pub fn scan_library(&self) -> TaskHandle<Library> {
        LibraryScanner::new(self.config.library_paths.iter().cloned()).spawn(&self.runner)
    }

    /// Take in a finished scan
    ///
    /// Components join the registry used by documents opened from now on.
    /// Items replace earlier items of the same name. Returns the number of
    /// components and items added.
    pub fn apply_library(&mut self, library: Library) -> usize {
        let count = library.components.len() + library.items.len();
        let registry = Arc::make_mut(&mut self.registry);
        for component in library.components {
            registry.register(component);
        }
        for item in library.items {
            self.items.retain(|existing| existing.name != item.name);
            self.items.push(item);
        }
        tracing::debug!("Applied library: {count} entries");
        count
    }

    pub fn library_items(&self) -> &[LibraryItem] {
        &self.items
    }

    /// Parse a library document into a fragment ready to insert
    pub fn library_fragment(&self, name: &str) -> EditorResult<FxomFragment> {
        let unknown = || EditorError::UnknownLibraryItem(name.to_string());
        let item = self.items.iter().find(|item| item.name == name).ok_or_else(unknown)?;
        let document = FxomDocument::parse(&item.text, &self.context(Some(item.location.clone())))?;
        let root = document.root().ok_or_else(unknown)?;
        Ok(FxomFragment::extract(&document, root)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxkit_fxom::MemoryLoader;

    #[test]
    fn test_new_with_defaults() {
        let editor = Editor::new(EditorConfig::default()).unwrap();
        assert!(editor.registry().lookup("VBox").is_some());
        assert!(editor.library_items().is_empty());
    }

    #[test]
    fn test_bad_version_rejected() {
        let config = EditorConfig {
            target_version: "x".into(),
            ..EditorConfig::default()
        };
        assert!(Editor::new(config).is_err());
    }

    #[test]
    fn test_open_url_through_loader() {
        let url = Url::parse("mem:/ui/main.fxml").unwrap();
        let loader = MemoryLoader::new().with(&url, r#"<VBox><Label text="%title"/></VBox>"#);
        let editor = Editor::new(EditorConfig::default())
            .unwrap()
            .with_loader(Arc::new(loader));
        let mut resources = ResourceBundle::new();
        resources.insert("title", "Hello");
        let mut document = editor.open_url(&url, Some(resources)).unwrap();
        assert_eq!(document.document().location(), Some(&url));
        assert!(document.query_errors().is_empty());
    }

    #[test]
    fn test_apply_library_extends_registry() {
        let mut editor = Editor::new(EditorConfig::default()).unwrap();
        assert!(editor.registry().lookup("acme.Gauge").is_none());
        let mut library = Library::default();
        library
            .components
            .push(fxkit_metadata::ComponentDescriptor::new("acme.Gauge"));
        library.items.push(LibraryItem {
            name: "login".into(),
            root_type: "VBox".into(),
            location: Url::parse("mem:/lib/login.fxml").unwrap(),
            text: r#"<VBox><Button fx:id="login" text="Login"/></VBox>"#.into(),
        });
        assert_eq!(editor.apply_library(library), 2);
        assert!(editor.registry().lookup("acme.Gauge").is_some());

        let fragment = editor.library_fragment("login").unwrap();
        assert_eq!(fragment.fx_ids(), vec!["login"]);
        assert!(matches!(
            editor.library_fragment("signup"),
            Err(EditorError::UnknownLibraryItem(_))
        ));
    }
}
