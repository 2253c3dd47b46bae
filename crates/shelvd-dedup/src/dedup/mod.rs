mod exact;
mod fuzzy;

pub use exact::group_by_exact_keys;
pub use fuzzy::{MIN_FUZZY_TITLE_CHARS, group_by_fuzzy_title};

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{BookRecord, DuplicateGroup};
use crate::{DedupError, Result};

/// Minimum similarity percentage for a fuzzy title match, validated to
/// lie in `70..=99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuzzyThreshold(u8);

impl FuzzyThreshold {
    pub const MIN: u8 = 70;
    pub const MAX: u8 = 99;
    pub const DEFAULT: u8 = 85;

    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DedupError::ThresholdOutOfRange {
                threshold: value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Identical titles (100) belong to the exact pass, never the fuzzy one.
    pub fn accepts(self, score: u8) -> bool {
        score >= self.0 && score < 100
    }
}

impl Default for FuzzyThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u8> for FuzzyThreshold {
    type Error = DedupError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for FuzzyThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Runs the exact passes followed by the fuzzy title pass.
///
/// The finder holds no state between runs; every call starts from an
/// unclaimed collection.
#[derive(Debug, Clone, Default)]
pub struct DuplicateFinder {
    threshold: FuzzyThreshold,
}

impl DuplicateFinder {
    pub fn new(threshold: FuzzyThreshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> FuzzyThreshold {
        self.threshold
    }

    pub fn with_threshold(mut self, threshold: FuzzyThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn detect(&self, books: &[BookRecord]) -> Vec<DuplicateGroup> {
        self.run(books, &|| false).unwrap_or_default()
    }

    /// Like [`detect`](Self::detect), but gives up with
    /// [`DedupError::Cancelled`] once `cancel` fires. A cancelled run never
    /// yields partial groups.
    pub fn detect_cancellable(
        &self,
        books: &[BookRecord],
        cancel: &CancellationToken,
    ) -> Result<Vec<DuplicateGroup>> {
        self.run(books, &|| cancel.is_cancelled()).ok_or_else(|| {
            warn!(books = books.len(), "duplicate detection cancelled");
            DedupError::Cancelled
        })
    }

    /// Worst-case number of title comparisons the fuzzy pass performs over
    /// `remaining` unclaimed records.
    pub fn fuzzy_comparison_bound(remaining: usize) -> usize {
        remaining.saturating_mul(remaining.saturating_sub(1)) / 2
    }

    fn run(
        &self,
        books: &[BookRecord],
        is_cancelled: &dyn Fn() -> bool,
    ) -> Option<Vec<DuplicateGroup>> {
        if is_cancelled() {
            return None;
        }

        let (exact_groups, claimed) = group_by_exact_keys(books);
        let remaining: Vec<BookRecord> = books
            .iter()
            .filter(|book| !claimed.contains(&book.id))
            .cloned()
            .collect();

        debug!(
            remaining = remaining.len(),
            comparisons = Self::fuzzy_comparison_bound(remaining.len()),
            "starting fuzzy pass"
        );
        let fuzzy_groups = fuzzy::scan(&remaining, self.threshold, is_cancelled)?;

        let groups = assemble(exact_groups, fuzzy_groups);
        info!(
            books = books.len(),
            groups = groups.len(),
            threshold = self.threshold.value(),
            "duplicate detection finished"
        );
        Some(groups)
    }
}

/// Exact groups first, then fuzzy groups; anything smaller than a pair is
/// dropped.
fn assemble(exact: Vec<DuplicateGroup>, fuzzy: Vec<DuplicateGroup>) -> Vec<DuplicateGroup> {
    exact
        .into_iter()
        .chain(fuzzy)
        .filter(|group| group.len() >= 2)
        .collect()
}

/// Find duplicate groups in a full collection.
///
/// Fails only when `fuzzy_threshold` lies outside `70..=99`; the value is
/// never clamped.
pub fn detect_duplicates(books: &[BookRecord], fuzzy_threshold: u8) -> Result<Vec<DuplicateGroup>> {
    let threshold = FuzzyThreshold::new(fuzzy_threshold).inspect_err(|err| {
        warn!(error = %err, "rejected fuzzy threshold");
    })?;
    Ok(DuplicateFinder::new(threshold).detect(books))
}

/// Run detection on the blocking pool so a large fuzzy pass does not stall
/// the async runtime.
#[cfg(feature = "async")]
pub async fn detect_in_background(
    books: Vec<BookRecord>,
    threshold: FuzzyThreshold,
    cancel: CancellationToken,
) -> Result<Vec<DuplicateGroup>> {
    tokio::task::spawn_blocking(move || {
        DuplicateFinder::new(threshold).detect_cancellable(&books, &cancel)
    })
    .await
    .map_err(|err| DedupError::Worker(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchKind;
    use uuid::Uuid;

    fn book(id: u128, title: &str) -> BookRecord {
        BookRecord::new(Uuid::from_u128(id), title)
    }

    #[test]
    fn threshold_bounds_are_enforced_without_clamping() {
        assert!(FuzzyThreshold::new(69).is_err());
        assert!(FuzzyThreshold::new(100).is_err());
        assert_eq!(FuzzyThreshold::new(70).unwrap().value(), 70);
        assert_eq!(FuzzyThreshold::try_from(99).unwrap().value(), 99);
        assert_eq!(FuzzyThreshold::default().value(), 85);
        assert_eq!(FuzzyThreshold::default().to_string(), "85%");

        match detect_duplicates(&[], 50) {
            Err(DedupError::ThresholdOutOfRange { threshold, min, max }) => {
                assert_eq!((threshold, min, max), (50, 70, 99));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn accepts_excludes_identical_scores() {
        let threshold = FuzzyThreshold::new(90).unwrap();
        assert!(!threshold.accepts(89));
        assert!(threshold.accepts(90));
        assert!(threshold.accepts(99));
        assert!(!threshold.accepts(100));
    }

    #[test]
    fn exact_groups_precede_fuzzy_groups() {
        let a = book(1, "Brave New World");
        let b = book(2, "Brave New Wrld");
        let mut c = book(3, "Island");
        c.isbn_10 = Some("0060085495".to_string());
        let mut d = book(4, "Island (reissue)");
        d.isbn_10 = Some("0060085495".to_string());

        let groups = detect_duplicates(&[a, b, c, d], 80).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, MatchKind::Isbn10);
        assert!(matches!(groups[1].kind, MatchKind::FuzzyTitle { .. }));
    }

    #[test]
    fn claimed_records_are_excluded_from_fuzzy_pass() {
        let mut a = book(1, "Brave New World");
        a.oclc_number = Some("123".to_string());
        let mut b = book(2, "Brave New World Revisited");
        b.oclc_number = Some("123".to_string());
        let c = book(3, "Brave New Wrld");

        let groups = detect_duplicates(&[a, b, c], 80).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, MatchKind::Oclc);
    }

    #[test]
    fn assemble_drops_undersized_groups() {
        let single = DuplicateGroup {
            kind: MatchKind::ExactTitle,
            label: String::new(),
            key: "exact-x".to_string(),
            books: vec![book(1, "x")],
        };
        let pair = DuplicateGroup {
            kind: MatchKind::Isbn13,
            label: String::new(),
            key: "isbn13-y".to_string(),
            books: vec![book(2, "y"), book(3, "y")],
        };
        let groups = assemble(vec![single, pair], vec![]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "isbn13-y");
    }

    #[test]
    fn cancelled_run_returns_no_groups() {
        let books = vec![book(1, "The Hobbit"), book(2, "Hobbit")];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = DuplicateFinder::default().detect_cancellable(&books, &cancel);

        assert!(matches!(result, Err(DedupError::Cancelled)));
    }

    #[test]
    fn cancellation_during_fuzzy_pass_yields_no_groups() {
        let mut a = book(1, "Emma");
        a.isbn_13 = Some("9780141439587".to_string());
        let mut b = book(2, "Emma (Penguin)");
        b.isbn_13 = Some("9780141439587".to_string());
        let books = vec![
            a,
            b,
            book(3, "The Great Gatsby"),
            book(4, "The Great Gatsbi"),
            book(5, "Pride and Prejudice"),
            book(6, "Pride and Prejudise"),
        ];
        let finder = DuplicateFinder::default();
        assert_eq!(finder.detect(&books).len(), 3);

        // Poll 1 precedes the exact passes; polls 2-3 are the Gatsby anchors.
        let polls = std::cell::Cell::new(0);
        let result = finder.run(&books, &|| {
            polls.set(polls.get() + 1);
            polls.get() >= 4
        });

        assert!(result.is_none());
        assert_eq!(polls.get(), 4);
    }

    #[test]
    fn uncancelled_token_matches_plain_detect() {
        let books = vec![book(1, "The Hobbit"), book(2, "Hobbit"), book(3, "Dune")];
        let finder = DuplicateFinder::default();
        let cancel = CancellationToken::new();

        let with_token = finder.detect_cancellable(&books, &cancel).unwrap();

        assert_eq!(with_token, finder.detect(&books));
    }

    #[test]
    fn comparison_bound_is_pair_count() {
        assert_eq!(DuplicateFinder::fuzzy_comparison_bound(0), 0);
        assert_eq!(DuplicateFinder::fuzzy_comparison_bound(1), 0);
        assert_eq!(DuplicateFinder::fuzzy_comparison_bound(4), 6);
        assert_eq!(DuplicateFinder::fuzzy_comparison_bound(2000), 1_999_000);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn background_detection_matches_foreground() {
        let books = vec![book(1, "The Great Gatsby"), book(2, "The Great Gatsbi")];
        let threshold = FuzzyThreshold::new(85).unwrap();

        let groups = detect_in_background(books.clone(), threshold, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(groups, DuplicateFinder::new(threshold).detect(&books));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn background_detection_honours_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result =
            detect_in_background(vec![book(1, "Emma")], FuzzyThreshold::default(), cancel).await;

        assert!(matches!(result, Err(DedupError::Cancelled)));
    }
}
