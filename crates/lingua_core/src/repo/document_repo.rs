//! Document repository contract with JSON-file and in-memory backends.
//!
//! # Responsibility
//! - Load the whole glossary document, bootstrapping an empty one on first
//!   use.
//! - Replace the whole document on save.
//!
//! # Invariants
//! - A missing file loads as `{meta: {}, layers: []}` and is persisted
//!   immediately.
//! - A present but unreadable or malformed file fails loudly; it is never
//!   silently replaced.
//! - Saves write a sibling temp file and rename it over the target, so a
//!   crash mid-write leaves the previous document intact.
//! - No locking: the last writer wins.

use crate::model::document::Document;
use log::{error, info};
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage error for document load/save.
#[derive(Debug)]
pub enum RepoError {
    /// File-system failure other than "file does not exist".
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// File exists but does not contain a valid document.
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Document could not be serialized.
    Serialize(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "document storage failed at `{}`: {source}", path.display())
            }
            Self::Malformed { path, source } => write!(
                f,
                "document at `{}` is not a valid glossary file: {source}",
                path.display()
            ),
            Self::Serialize(err) => write!(f, "failed to serialize document: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}

/// Whole-document persistence.
pub trait DocumentRepository {
    /// Reads the document, creating and persisting an empty one when absent.
    fn load(&self) -> RepoResult<Document>;
    /// Overwrites storage with `doc`.
    fn save(&self, doc: &Document) -> RepoResult<()>;
}

impl<R: DocumentRepository + ?Sized> DocumentRepository for &R {
    fn load(&self) -> RepoResult<Document> {
        (**self).load()
    }

    fn save(&self, doc: &Document) -> RepoResult<()> {
        (**self).save(doc)
    }
}

/// JSON file repository.
#[derive(Debug, Clone)]
pub struct JsonDocumentRepository {
    path: PathBuf,
}

impl JsonDocumentRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn io_error(&self, source: std::io::Error) -> RepoError {
        RepoError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_replace(&self, payload: &[u8]) -> RepoResult<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|err| self.io_error(err))?;

        let mut staged = NamedTempFile::new_in(&parent).map_err(|err| self.io_error(err))?;
        let write = |file: &mut NamedTempFile| -> std::io::Result<()> {
            file.write_all(payload)?;
            file.write_all(b"\n")?;
            file.as_file().sync_all()
        };
        write(&mut staged).map_err(|err| self.io_error(err))?;
        staged
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

impl DocumentRepository for JsonDocumentRepository {
    fn load(&self) -> RepoResult<Document> {
        let started_at = Instant::now();
        info!("event=doc_load module=repo status=start");

        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let doc = Document::new();
                self.save(&doc)?;
                info!(
                    "event=doc_load module=repo status=ok mode=bootstrap duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Ok(doc);
            }
            Err(err) => {
                error!(
                    "event=doc_load module=repo status=error error_code=io_failed error={}",
                    err
                );
                return Err(self.io_error(err));
            }
        };

        match serde_json::from_str::<Document>(&text) {
            Ok(doc) => {
                info!(
                    "event=doc_load module=repo status=ok mode=file layers={} concepts={} duration_ms={}",
                    doc.layers.len(),
                    doc.concept_count(),
                    started_at.elapsed().as_millis()
                );
                Ok(doc)
            }
            Err(err) => {
                error!(
                    "event=doc_load module=repo status=error error_code=malformed line={} column={}",
                    err.line(),
                    err.column()
                );
                Err(RepoError::Malformed {
                    path: self.path.clone(),
                    source: err,
                })
            }
        }
    }

    fn save(&self, doc: &Document) -> RepoResult<()> {
        let started_at = Instant::now();
        let payload = serde_json::to_vec_pretty(doc).map_err(RepoError::Serialize)?;

        match self.write_replace(&payload) {
            Ok(()) => {
                info!(
                    "event=doc_save module=repo status=ok bytes={} duration_ms={}",
                    payload.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=doc_save module=repo status=error error_code=write_failed error={}",
                    err
                );
                Err(err)
            }
        }
    }
}

/// In-process repository used by tests and throwaway sessions.
///
/// Starts absent, like a fresh file path, and counts saves.
#[derive(Debug, Default)]
pub struct MemoryDocumentRepository {
    stored: RefCell<Option<Document>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds storage with an existing document.
    pub fn with_document(doc: Document) -> Self {
        Self {
            stored: RefCell::new(Some(doc)),
            ..Self::default()
        }
    }

    /// Makes every following `save` fail with an I/O error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    /// Number of completed `save` calls, including the bootstrap save.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Returns a copy of what is currently persisted.
    pub fn stored(&self) -> Option<Document> {
        self.stored.borrow().clone()
    }
}

impl DocumentRepository for MemoryDocumentRepository {
    fn load(&self) -> RepoResult<Document> {
        if let Some(doc) = self.stored.borrow().as_ref() {
            return Ok(doc.clone());
        }
        let doc = Document::new();
        self.save(&doc)?;
        Ok(doc)
    }

    fn save(&self, doc: &Document) -> RepoResult<()> {
        if self.fail_saves.get() {
            return Err(RepoError::Io {
                path: PathBuf::from(":memory:"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "save disabled"),
            });
        }
        *self.stored.borrow_mut() = Some(doc.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
