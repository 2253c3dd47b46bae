//! Title canonicalization for duplicate comparison.

/// Definite and indefinite articles (English, Dutch, French, German,
/// Spanish) that are ignored at the start of a title.
pub const LEADING_ARTICLES: &[&str] = &[
    "the", "a", "an", "de", "het", "een", "le", "la", "les", "der", "die", "das", "el", "los",
    "las",
];

/// Canonicalize a title for comparison.
///
/// Lower-cases, drops a leading article (including the catalog form
/// `"Hobbit, The"`), removes everything that is not alphanumeric or
/// whitespace and collapses whitespace. The result is stable under
/// re-normalization. An empty result means the title is not comparable.
pub fn normalize_title(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let uninverted = strip_inverted_article(&lowered);

    let cleaned: String = uninverted
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    // A title that is only an article keeps its last token.
    let leading = tokens
        .iter()
        .take_while(|token| is_article(token))
        .count()
        .min(tokens.len().saturating_sub(1));

    tokens[leading..].join(" ")
}

pub fn is_article(token: &str) -> bool {
    LEADING_ARTICLES.contains(&token)
}

fn strip_inverted_article(title: &str) -> &str {
    let Some((head, tail)) = title.trim_end().rsplit_once(',') else {
        return title;
    };
    let tail = tail.trim_matches(|c: char| !c.is_alphanumeric());
    if is_article(tail) && head.chars().any(char::is_alphanumeric) {
        head
    } else {
        title
    }
}
