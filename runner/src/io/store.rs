//! Durable, append-only storage for the plan document.
//!
//! The file is the only persisted state. Every append is flushed to disk
//! before returning, so a crash can lose at most the in-flight generation and
//! a rerun resumes from exactly what was written.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::document::Document;

/// Single-writer store backed by one UTF-8 text file.
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted document, or an empty one if the file does not exist.
    pub fn load(&self) -> Result<Document> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                debug!(path = %self.path.display(), bytes = text.len(), "loaded document");
                Ok(Document::from_text(text))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no document yet");
                Ok(Document::default())
            }
            Err(err) => {
                Err(err).with_context(|| format!("read document {}", self.path.display()))
            }
        }
    }

    /// Append `chunk` to the file and then to `document`.
    ///
    /// The chunk is preceded by a newline unless the document is empty. The
    /// file is synced before `document` is updated.
    #[instrument(skip_all, fields(path = %self.path.display(), chunk_bytes = chunk.len()))]
    pub fn append(&self, document: &mut Document, chunk: &str) -> Result<()> {
        let piece = document.piece_for(chunk);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open document {}", self.path.display()))?;
        file.write_all(piece.as_bytes())
            .with_context(|| format!("append to {}", self.path.display()))?;
        file.sync_all()
            .with_context(|| format!("sync {}", self.path.display()))?;
        document.push_piece(&piece);
        debug!(total_bytes = document.as_str().len(), "chunk appended");
        Ok(())
    }

    /// Load the document and seed it with `title` if it is blank.
    ///
    /// Returns the document and whether the title was written.
    pub fn load_or_seed(&self, title: &str) -> Result<(Document, bool)> {
        let mut document = self.load()?;
        if !document.is_blank() {
            return Ok((document, false));
        }
        self.append(&mut document, title)?;
        Ok((document, true))
    }
}
