//! Shelvd duplicate detection — identifier matching and fuzzy title clustering
//! over a book collection.

pub mod config;
pub mod dedup;
pub mod distance;
pub mod error;
pub mod models;
pub mod repository;
pub mod summary;
pub mod title;

pub use config::DedupConfig;
pub use dedup::{
    DuplicateFinder, FuzzyThreshold, MIN_FUZZY_TITLE_CHARS, detect_duplicates,
    group_by_exact_keys, group_by_fuzzy_title,
};
#[cfg(feature = "async")]
pub use dedup::detect_in_background;
pub use distance::{levenshtein, similarity};
pub use error::{DedupError, Result};
pub use models::{BookId, BookRecord, DuplicateGroup, MatchKind};
pub use repository::{BookRemover, BookSource, JsonCatalog, load_all, remove_in_batches};
pub use summary::{DetectionSummary, IdentifierCoverage};
pub use title::normalize_title;

pub use tokio_util::sync::CancellationToken;
