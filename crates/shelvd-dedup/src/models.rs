use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub type BookId = Uuid;

/// A catalog record as supplied by the book repository.
///
/// Field names follow the repository's column names so that exported
/// catalogs deserialize without a mapping layer. Every descriptive field
/// is optional; an absent or blank value simply means "no match key".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: BookId,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn_13: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn_10: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oclc_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Unknown, blank or unparseable timestamps all read as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl BookRecord {
    pub fn new(id: BookId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            subtitle: None,
            isbn_13: None,
            isbn_10: None,
            oclc_number: None,
            publication_year: None,
            publisher_name: None,
            condition_name: None,
            author: None,
            created_at: None,
        }
    }

    /// Trimmed ISBN-13, or `None` when absent or blank.
    pub fn isbn13_key(&self) -> Option<&str> {
        non_blank(self.isbn_13.as_deref())
    }

    pub fn isbn10_key(&self) -> Option<&str> {
        non_blank(self.isbn_10.as_deref())
    }

    pub fn oclc_key(&self) -> Option<&str> {
        non_blank(self.oclc_number.as_deref())
    }

    /// One-line "author — year — publisher" description, skipping unknown parts.
    pub fn byline(&self) -> String {
        [
            self.author.as_deref(),
            self.publication_year.as_deref(),
            self.publisher_name.as_deref(),
        ]
        .into_iter()
        .filter_map(non_blank)
        .collect::<Vec<_>>()
        .join(" — ")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(non_blank(raw.as_deref()).and_then(|v| v.parse::<DateTime<Utc>>().ok()))
}

/// Why a group of records was considered duplicate.
///
/// The similarity score only exists for fuzzy title matches; every other
/// kind is an exact agreement on some key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchKind {
    #[serde(rename = "isbn_13")]
    Isbn13,
    #[serde(rename = "isbn_10")]
    Isbn10,
    Oclc,
    ExactTitle,
    FuzzyTitle { similarity: u8 },
}

impl MatchKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Isbn13 => "ISBN-13 Match",
            Self::Isbn10 => "ISBN-10 Match",
            Self::Oclc => "OCLC Match",
            Self::ExactTitle => "Exact Title",
            Self::FuzzyTitle { .. } => "Similar Title",
        }
    }

    pub fn is_exact(&self) -> bool {
        !matches!(self, Self::FuzzyTitle { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    #[serde(flatten)]
    pub kind: MatchKind,
    pub label: String,
    pub key: String,
    pub books: Vec<BookRecord>,
}

impl DuplicateGroup {
    /// Lowest pairwise similarity observed, for fuzzy groups only.
    pub fn similarity(&self) -> Option<u8> {
        match self.kind {
            MatchKind::FuzzyTitle { similarity } => Some(similarity),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BookId> + '_ {
        self.books.iter().map(|book| book.id)
    }
}
