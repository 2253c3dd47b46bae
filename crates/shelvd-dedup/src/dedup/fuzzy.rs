use tracing::debug;

use super::FuzzyThreshold;
use crate::distance::similarity;
use crate::models::{BookRecord, DuplicateGroup, MatchKind};
use crate::title::normalize_title;

/// Normalized titles shorter than this are too generic to compare.
pub const MIN_FUZZY_TITLE_CHARS: usize = 3;

/// Cluster records whose normalized titles are similar but not identical.
///
/// Single greedy pass in input order: each unclaimed record with a usable
/// title becomes an anchor and absorbs every later unclaimed record that
/// scores within the threshold against it. Matching is not transitive and
/// the result depends on input order.
pub fn group_by_fuzzy_title(
    remaining: &[BookRecord],
    threshold: FuzzyThreshold,
) -> Vec<DuplicateGroup> {
    scan(remaining, threshold, &|| false).unwrap_or_default()
}

/// Same as [`group_by_fuzzy_title`], polling `is_cancelled` before each
/// anchor. Returns `None` when cancelled.
pub(crate) fn scan(
    remaining: &[BookRecord],
    threshold: FuzzyThreshold,
    is_cancelled: &dyn Fn() -> bool,
) -> Option<Vec<DuplicateGroup>> {
    let titles: Vec<Option<String>> = remaining
        .iter()
        .map(|book| comparable_title(&book.title))
        .collect();
    let mut claimed = vec![false; remaining.len()];
    let mut groups = Vec::new();

    for anchor in 0..remaining.len() {
        if is_cancelled() {
            return None;
        }
        if claimed[anchor] {
            continue;
        }
        let Some(anchor_title) = titles[anchor].as_deref() else {
            continue;
        };

        let mut members = vec![anchor];
        let mut lowest = 100u8;
        for candidate in (anchor + 1)..remaining.len() {
            if claimed[candidate] {
                continue;
            }
            let Some(candidate_title) = titles[candidate].as_deref() else {
                continue;
            };
            let score = similarity(anchor_title, candidate_title);
            if threshold.accepts(score) {
                members.push(candidate);
                lowest = lowest.min(score);
            }
        }

        if members.len() < 2 {
            continue;
        }
        for &member in &members {
            claimed[member] = true;
        }
        groups.push(DuplicateGroup {
            kind: MatchKind::FuzzyTitle { similarity: lowest },
            label: format!("Similar titles ({lowest}%)"),
            key: format!("fuzzy-{}", remaining[anchor].id),
            books: members.into_iter().map(|idx| remaining[idx].clone()).collect(),
        });
    }

    debug!(
        candidates = remaining.len(),
        groups = groups.len(),
        threshold = threshold.value(),
        "fuzzy pass finished"
    );
    Some(groups)
}

fn comparable_title(title: &str) -> Option<String> {
    let normalized = normalize_title(title);
    (normalized.chars().count() >= MIN_FUZZY_TITLE_CHARS).then_some(normalized)
}
