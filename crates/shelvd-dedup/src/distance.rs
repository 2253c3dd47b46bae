//! Edit distance and percentage similarity between normalized titles.

/// Unit-cost Levenshtein distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Similarity as a whole percentage in `0..=100`.
///
/// Equal strings (both empty included) score 100 and a string compared
/// with the empty string scores 0. Otherwise the distance is scaled by the
/// longer length in chars and rounded half up.
pub fn similarity(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let longest = a.chars().count().max(b.chars().count());
    let distance = levenshtein(a, b).min(longest);
    percentage(longest - distance, longest)
}

fn percentage(part: usize, whole: usize) -> u8 {
    // round(100 * part / whole), half up, without floats
    let rounded = (200 * part + whole) / (2 * whole);
    rounded.min(100) as u8
}
