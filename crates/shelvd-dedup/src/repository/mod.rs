//! Interfaces to the collaborators that own the records.
//!
//! Detection needs the complete collection in memory, so paged sources are
//! drained up front. Removal is the only mutation and it goes through the
//! owning repository in bounded batches.

mod json_catalog;

pub use json_catalog::JsonCatalog;

use indexmap::IndexSet;
use tracing::debug;

use crate::error::{DedupError, Result};
use crate::models::{BookId, BookRecord};

pub trait BookSource {
    /// Return up to `limit` records starting at `offset`. A page shorter
    /// than `limit` marks the end of the collection.
    fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<BookRecord>>;
}

pub trait BookRemover {
    /// Remove the given records, returning how many were actually removed.
    fn remove(&self, ids: &[BookId]) -> Result<usize>;
}

/// Drain a paged source into one in-memory collection.
pub fn load_all<S>(source: &S, page_size: usize) -> Result<Vec<BookRecord>>
where
    S: BookSource + ?Sized,
{
    if page_size == 0 {
        return Err(DedupError::InvalidPageSize);
    }

    let mut books = Vec::new();
    loop {
        let page = source.fetch_page(books.len(), page_size)?;
        let last = page.len() < page_size;
        books.extend(page);
        if last {
            break;
        }
    }

    debug!(books = books.len(), page_size, "loaded collection");
    Ok(books)
}

/// Remove `ids` in batches of at most `batch_size`, skipping repeated ids.
pub fn remove_in_batches<R>(remover: &R, ids: &[BookId], batch_size: usize) -> Result<usize>
where
    R: BookRemover + ?Sized,
{
    if batch_size == 0 {
        return Err(DedupError::InvalidBatchSize);
    }

    let unique: Vec<BookId> = ids.iter().copied().collect::<IndexSet<_>>().into_iter().collect();
    let mut removed = 0;
    for batch in unique.chunks(batch_size) {
        removed += remover.remove(batch)?;
        debug!(batch = batch.len(), removed, "removed batch");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use uuid::Uuid;

    struct VecSource(Vec<BookRecord>);

    impl BookSource for VecSource {
        fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<BookRecord>> {
            Ok(self.0.iter().skip(offset).take(limit).cloned().collect())
        }
    }

    #[derive(Default)]
    struct RecordingRemover {
        batches: RefCell<Vec<Vec<BookId>>>,
    }

    impl BookRemover for RecordingRemover {
        fn remove(&self, ids: &[BookId]) -> Result<usize> {
            self.batches.borrow_mut().push(ids.to_vec());
            Ok(ids.len())
        }
    }

    fn books(count: u128) -> Vec<BookRecord> {
        (0..count)
            .map(|i| BookRecord::new(Uuid::from_u128(i), format!("Book {i}")))
            .collect()
    }

    #[test]
    fn load_all_drains_every_page() {
        let source = VecSource(books(25));
        let loaded = load_all(&source, 10).unwrap();
        assert_eq!(loaded.len(), 25);
        assert_eq!(loaded[24].id, Uuid::from_u128(24));
    }

    #[test]
    fn load_all_handles_exact_multiple_of_page_size() {
        let source = VecSource(books(20));
        assert_eq!(load_all(&source, 10).unwrap().len(), 20);
        assert!(load_all(&VecSource(Vec::new()), 10).unwrap().is_empty());
    }

    #[test]
    fn load_all_rejects_zero_page_size() {
        assert!(matches!(
            load_all(&VecSource(books(1)), 0),
            Err(DedupError::InvalidPageSize)
        ));
    }

    #[test]
    fn removal_is_batched_and_deduplicated() {
        let remover = RecordingRemover::default();
        let mut ids: Vec<BookId> = (0..250).map(Uuid::from_u128).collect();
        ids.push(Uuid::from_u128(3));

        let removed = remove_in_batches(&remover, &ids, 100).unwrap();

        assert_eq!(removed, 250);
        let sizes: Vec<usize> = remover.batches.borrow().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn removal_rejects_zero_batch_size() {
        let remover = RecordingRemover::default();
        assert!(matches!(
            remove_in_batches(&remover, &[Uuid::nil()], 0),
            Err(DedupError::InvalidBatchSize)
        ));
    }
}
