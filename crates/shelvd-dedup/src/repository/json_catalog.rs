use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{BookRemover, BookSource};
use crate::error::Result;
use crate::models::{BookId, BookRecord};

/// A collection exported as a single JSON array of records.
///
/// The file is parsed once, on the first page request; later pages are
/// served from that snapshot. Removals rewrite the file and the snapshot
/// together.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
    snapshot: RefCell<Option<Vec<BookRecord>>>,
}

impl JsonCatalog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: RefCell::new(None),
        }
    }

    /// Write `books` to `path`, replacing any existing catalog.
    pub fn create(path: impl Into<PathBuf>, books: &[BookRecord]) -> Result<Self> {
        let catalog = Self::open(path);
        catalog.write(books)?;
        Ok(catalog)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the file from disk, bypassing the page snapshot.
    pub fn read(&self) -> Result<Vec<BookRecord>> {
        let contents = fs::read_to_string(&self.path)?;
        let books: Vec<BookRecord> = serde_json::from_str(&contents)?;
        Ok(books)
    }

    fn write(&self, books: &[BookRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(books)?)?;
        Ok(())
    }
}

impl BookSource for JsonCatalog {
    fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<BookRecord>> {
        if self.snapshot.borrow().is_none() {
            let books = self.read()?;
            debug!(path = %self.path.display(), books = books.len(), "parsed catalog");
            self.snapshot.replace(Some(books));
        }
        let snapshot = self.snapshot.borrow();
        Ok(snapshot
            .iter()
            .flatten()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

impl BookRemover for JsonCatalog {
    fn remove(&self, ids: &[BookId]) -> Result<usize> {
        let doomed: HashSet<&BookId> = ids.iter().collect();
        let books = self.read()?;
        let before = books.len();
        let kept: Vec<BookRecord> = books
            .into_iter()
            .filter(|book| !doomed.contains(&book.id))
            .collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.write(&kept)?;
        }
        self.snapshot.replace(Some(kept));
        Ok(removed)
    }
}
