//! fxkit Editor
//!
//! Editing session facade over the fxkit crates: documents with their undo
//! history and error report, configuration, component catalogs and the
//! background library scanner.
//!
//! # Example
//!
//! ```rust,ignore
//! use fxkit_editor::{Editor, EditorConfig};
//!
//! let editor = Editor::new(EditorConfig::default())?;
//! let mut document = editor.open("ui/main.fxml")?;
//! let errors = document.query_errors().len();
//! std::fs::write("ui/main.fxml", document.save()?.text)?;
//! ```

mod config;
mod document;
mod editor;
mod library;
mod logging;
mod task;

pub use config::EditorConfig;
pub use document::EditorDocument;
pub use editor::Editor;
pub use library::{Library, LibraryItem, LibraryScanner};
pub use logging::init_logging;
pub use task::{TaskHandle, TaskOutcome, TaskProgress, TaskRunner};

// Re-export sub-crates for advanced usage
pub use fxkit_fxom as fxom;
pub use fxkit_job as job;
pub use fxkit_metadata as metadata;

use std::path::PathBuf;

/// fxkit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;

/// Editor errors
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Metadata(#[from] fxkit_metadata::MetadataError),

    #[error(transparent)]
    Document(#[from] fxkit_fxom::FxomError),

    #[error(transparent)]
    Job(#[from] fxkit_job::JobError),

    #[error("Not a usable location: {0}")]
    InvalidPath(PathBuf),

    #[error("Unknown library item: {0}")]
    UnknownLibraryItem(String),

    #[error("Nothing selected")]
    EmptySelection,
}

impl EditorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
