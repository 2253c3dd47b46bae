use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::models::{BookId, BookRecord, DuplicateGroup, MatchKind};
use crate::title::normalize_title;

/// Identifier passes run strictly in this order; a record claimed by one
/// pass never takes part in a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExactPass {
    Isbn13,
    Isbn10,
    Oclc,
    Title,
}

impl ExactPass {
    const ORDER: [Self; 4] = [Self::Isbn13, Self::Isbn10, Self::Oclc, Self::Title];

    fn kind(self) -> MatchKind {
        match self {
            Self::Isbn13 => MatchKind::Isbn13,
            Self::Isbn10 => MatchKind::Isbn10,
            Self::Oclc => MatchKind::Oclc,
            Self::Title => MatchKind::ExactTitle,
        }
    }

    fn key_prefix(self) -> &'static str {
        match self {
            Self::Isbn13 => "isbn13",
            Self::Isbn10 => "isbn10",
            Self::Oclc => "oclc",
            Self::Title => "exact",
        }
    }

    fn key(self, book: &BookRecord) -> Option<String> {
        match self {
            Self::Isbn13 => book.isbn13_key().map(str::to_string),
            Self::Isbn10 => book.isbn10_key().map(str::to_string),
            Self::Oclc => book.oclc_key().map(str::to_string),
            Self::Title => Some(normalize_title(&book.title)).filter(|t| !t.is_empty()),
        }
    }

    fn label(self, key: &str, first: &BookRecord) -> String {
        match self {
            Self::Isbn13 => format!("ISBN-13: {key}"),
            Self::Isbn10 => format!("ISBN-10: {key}"),
            Self::Oclc => format!("OCLC: {key}"),
            Self::Title => format!("Exact title: \"{}\"", first.title),
        }
    }
}

/// Run the identifier and exact-title passes over the whole collection.
///
/// Returns the groups in pass order together with every id they claimed.
pub fn group_by_exact_keys(books: &[BookRecord]) -> (Vec<DuplicateGroup>, HashSet<BookId>) {
    let mut claimed = HashSet::new();
    let mut groups = Vec::new();

    for pass in ExactPass::ORDER {
        let found = run_pass(books, pass, &claimed);
        for group in &found {
            claimed.extend(group.ids());
        }
        debug!(
            pass = pass.key_prefix(),
            groups = found.len(),
            claimed = claimed.len(),
            "exact pass finished"
        );
        groups.extend(found);
    }

    (groups, claimed)
}

fn run_pass(
    books: &[BookRecord],
    pass: ExactPass,
    claimed: &HashSet<BookId>,
) -> Vec<DuplicateGroup> {
    let mut buckets: IndexMap<String, Vec<&BookRecord>> = IndexMap::new();
    for book in books.iter().filter(|book| !claimed.contains(&book.id)) {
        if let Some(key) = pass.key(book) {
            buckets.entry(key).or_default().push(book);
        }
    }

    buckets
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(key, members)| DuplicateGroup {
            kind: pass.kind(),
            label: pass.label(&key, members[0]),
            key: format!("{}-{key}", pass.key_prefix()),
            books: members.into_iter().cloned().collect(),
        })
        .collect()
}
