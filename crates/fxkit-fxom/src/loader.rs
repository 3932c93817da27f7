//! Resource Loader
//!
//! Reads included documents, external scripts and stylesheets relative to a
//! document's base location.

use std::collections::HashMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use url::Url;

use crate::{FxomError, FxomResult};

/// Location-based resource access
pub trait ResourceLoader: Send + Sync + fmt::Debug {
    /// Read the raw bytes at `url`
    fn read_bytes(&self, url: &Url) -> FxomResult<Vec<u8>>;

    /// Whether `url` can be read
    fn exists(&self, url: &Url) -> bool {
        self.read_bytes(url).is_ok()
    }

    /// Changes whenever the content behind any location may have changed
    fn epoch(&self) -> u64 {
        0
    }

    /// Value that changes when the content at `url` changes; `None` when unreadable
    fn fingerprint(&self, url: &Url) -> Option<u64> {
        let bytes = self.read_bytes(url).ok()?;
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Some(hasher.finish())
    }

    /// Read and decode text
    fn read_text(&self, url: &Url, charset: Option<&str>) -> FxomResult<String> {
        let bytes = self.read_bytes(url)?;
        decode_text(&bytes, charset).map_err(|e| match e {
            FxomError::Load { message, .. } => FxomError::Load {
                url: url.to_string(),
                message,
            },
            other => other,
        })
    }
}

/// Resolve `path` against an optional base location
pub fn resolve_location(base: Option<&Url>, path: &str) -> FxomResult<Url> {
    if let Ok(absolute) = Url::parse(path) {
        return Ok(absolute);
    }
    let unresolved = || FxomError::UnresolvedPath {
        path: path.to_string(),
    };
    base.ok_or_else(unresolved)?.join(path).map_err(|_| unresolved())
}

/// Decode bytes in the given charset (UTF-8 when absent)
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> FxomResult<String> {
    let charset = charset.unwrap_or("UTF-8");
    match charset.to_ascii_uppercase().as_str() {
        "UTF-8" | "UTF8" => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            String::from_utf8(bytes.to_vec()).map_err(|e| FxomError::Load {
                url: String::new(),
                message: format!("invalid UTF-8: {e}"),
            })
        }
        "ISO-8859-1" | "LATIN1" => Ok(bytes.iter().map(|&b| b as char).collect()),
        "US-ASCII" | "ASCII" => {
            if bytes.is_ascii() {
                Ok(bytes.iter().map(|&b| b as char).collect())
            } else {
                Err(FxomError::Load {
                    url: String::new(),
                    message: "non-ASCII content".to_string(),
                })
            }
        }
        _ => Err(FxomError::UnsupportedCharset(charset.to_string())),
    }
}

/// Loader for `file:` locations
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemLoader;

impl FileSystemLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceLoader for FileSystemLoader {
    fn read_bytes(&self, url: &Url) -> FxomResult<Vec<u8>> {
        let load_error = |message: String| FxomError::Load {
            url: url.to_string(),
            message,
        };
        if url.scheme() != "file" {
            return Err(load_error(format!("unsupported scheme {}", url.scheme())));
        }
        let path = url
            .to_file_path()
            .map_err(|_| load_error("not a local path".to_string()))?;
        std::fs::read(&path).map_err(|e| load_error(e.to_string()))
    }

    fn exists(&self, url: &Url) -> bool {
        url.scheme() == "file" && url.to_file_path().is_ok_and(|p| p.is_file())
    }

    /// Modification time and length, without reading the file
    fn fingerprint(&self, url: &Url) -> Option<u64> {
        if url.scheme() != "file" {
            return None;
        }
        let metadata = std::fs::metadata(url.to_file_path().ok()?).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |elapsed| elapsed.as_nanos());
        let mut hasher = DefaultHasher::new();
        (modified, metadata.len()).hash(&mut hasher);
        Some(hasher.finish())
    }
}

/// In-memory loader keyed by URL
#[derive(Debug, Default)]
pub struct MemoryLoader {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    epoch: AtomicU64,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource
    pub fn insert(&self, url: &Url, content: impl Into<Vec<u8>>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(url.to_string(), content.into());
        }
        self.epoch.fetch_add(1, Ordering::Relaxed);
    }

    pub fn remove(&self, url: &Url) -> bool {
        let removed = self
            .entries
            .write()
            .is_ok_and(|mut entries| entries.remove(url.as_str()).is_some());
        if removed {
            self.epoch.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    pub fn with(self, url: &Url, content: impl Into<Vec<u8>>) -> Self {
        self.insert(url, content);
        self
    }
}

impl ResourceLoader for MemoryLoader {
    fn read_bytes(&self, url: &Url) -> FxomResult<Vec<u8>> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(url.as_str()).cloned())
            .ok_or_else(|| FxomError::Load {
                url: url.to_string(),
                message: "not found".to_string(),
            })
    }

    fn exists(&self, url: &Url) -> bool {
        self.entries
            .read()
            .is_ok_and(|entries| entries.contains_key(url.as_str()))
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Relaxed)
    }
}
