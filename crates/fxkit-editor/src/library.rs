//! Component library scanning
//!
//! Walks library directories for component catalogs (`*.json`, arrays of
//! component descriptors) and reusable documents (`*.fxml`). Runs as a
//! background task; the scanner only reads files and never touches an open
//! document.

use std::path::{Path, PathBuf};

use fxkit_metadata::ComponentDescriptor;
use url::Url;

use crate::{TaskHandle, TaskOutcome, TaskProgress, TaskRunner};

/// Reusable document found in a library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    /// File stem
    pub name: String,
    /// Type of the document's root element as written
    pub root_type: String,
    pub location: Url,
    pub text: String,
}

/// Scan result
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub components: Vec<ComponentDescriptor>,
    pub items: Vec<LibraryItem>,
    /// Files that could not be used, with the reason
    pub problems: Vec<(PathBuf, String)>,
}

impl Library {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.items.is_empty()
    }
}

/// Library directory scanner
#[derive(Debug, Clone, Default)]
pub struct LibraryScanner {
    paths: Vec<PathBuf>,
}

impl LibraryScanner {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Run the scan on `runner`
    pub fn spawn(self, runner: &TaskRunner) -> TaskHandle<Library> {
        runner.submit("library scan", move |progress| self.scan(progress))
    }

    /// Scan synchronously, checking `progress` for cancellation between files
    pub fn scan(&self, progress: &TaskProgress) -> TaskOutcome<Library> {
        let mut files = Vec::new();
        for path in &self.paths {
            collect_files(path, &mut files);
        }
        files.sort();
        progress.set_total(files.len());
        tracing::debug!("Scanning {} library files", files.len());

        let mut library = Library::default();
        for file in files {
            if progress.is_cancelled() {
                return TaskOutcome::Cancelled;
            }
            if let Err(problem) = scan_file(&file, &mut library) {
                tracing::warn!("Skipping {}: {problem}", file.display());
                library.problems.push((file, problem));
            }
            progress.advance(1);
        }

        tracing::info!(
            "Library scan found {} components and {} documents",
            library.components.len(),
            library.items.len()
        );
        TaskOutcome::Completed(library)
    }
}

/// Catalogs and documents under `path`, recursively
fn collect_files(path: &Path, files: &mut Vec<PathBuf>) {
    if path.is_file() {
        if is_library_file(path) {
            files.push(path.to_path_buf());
        }
        return;
    }
    let Ok(entries) = std::fs::read_dir(path) else {
        tracing::warn!("Cannot read library directory {}", path.display());
        return;
    };
    for entry in entries.flatten() {
        collect_files(&entry.path(), files);
    }
}

fn is_library_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json") | Some("fxml")
    )
}

fn scan_file(file: &Path, library: &mut Library) -> Result<(), String> {
    let text = std::fs::read_to_string(file).map_err(|e| e.to_string())?;
    match file.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let components: Vec<ComponentDescriptor> =
                serde_json::from_str(&text).map_err(|e| e.to_string())?;
            library.components.extend(components);
        }
        _ => library.items.push(document_item(file, text)?),
    }
    Ok(())
}

fn document_item(file: &Path, text: String) -> Result<LibraryItem, String> {
    let glue = fxkit_glue::parse(&text).map_err(|e| e.to_string())?;
    let root = glue.root.as_ref().ok_or("document has no root element")?;
    let root_type = match root.name.as_str() {
        "fx:root" => root.attribute("type").ok_or("fx:root without a type")?,
        name => name,
    }
    .to_string();
    let absolute = std::path::absolute(file).map_err(|e| e.to_string())?;
    let location = Url::from_file_path(&absolute).map_err(|_| "not a local path".to_string())?;
    let name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&root_type)
        .to_string();
    Ok(LibraryItem {
        name,
        root_type,
        location,
        text,
    })
}
