use serde::{Deserialize, Serialize};

use crate::models::{BookRecord, DuplicateGroup, MatchKind};

/// How many records carry each kind of identifier the exact passes use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierCoverage {
    pub total: usize,
    pub with_isbn_13: usize,
    pub with_isbn_10: usize,
    pub with_oclc: usize,
}

impl IdentifierCoverage {
    pub fn of(books: &[BookRecord]) -> Self {
        books.iter().fold(Self::default(), |mut acc, book| {
            acc.total += 1;
            acc.with_isbn_13 += usize::from(book.isbn13_key().is_some());
            acc.with_isbn_10 += usize::from(book.isbn10_key().is_some());
            acc.with_oclc += usize::from(book.oclc_key().is_some());
            acc
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub groups: usize,
    pub books_in_groups: usize,
    pub isbn_13: usize,
    pub isbn_10: usize,
    pub oclc: usize,
    pub exact_title: usize,
    pub fuzzy_title: usize,
}

impl DetectionSummary {
    pub fn from_groups(groups: &[DuplicateGroup]) -> Self {
        let mut summary = Self {
            groups: groups.len(),
            ..Self::default()
        };
        for group in groups {
            summary.books_in_groups += group.len();
            let counter = match group.kind {
                MatchKind::Isbn13 => &mut summary.isbn_13,
                MatchKind::Isbn10 => &mut summary.isbn_10,
                MatchKind::Oclc => &mut summary.oclc,
                MatchKind::ExactTitle => &mut summary.exact_title,
                MatchKind::FuzzyTitle { .. } => &mut summary.fuzzy_title,
            };
            *counter += 1;
        }
        summary
    }
}
