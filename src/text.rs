//! Text segmentation helpers.
//!
//! Sentence units are the granularity the BERT-style and partial-correctness
//! metrics align on. Splitting is purely lexical: any run of `.`, `?`, `!` or
//! newline characters ends a unit.

/// Returns true for characters that terminate a sentence unit.
fn is_sentence_delimiter(c: char) -> bool {
    matches!(c, '.' | '?' | '!' | '\n')
}

/// Returns true for characters trimmed from the ends of a unit.
///
/// Unicode whitespace plus the information separators U+001C..=U+001F.
fn is_unit_padding(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{1c}'..='\u{1f}')
}

/// Split text into trimmed, non-empty sentence units, in order.
///
/// A run of consecutive delimiters counts as a single boundary. Fragments
/// that are empty after trimming are dropped, so empty or whitespace-only
/// input yields an empty vector. Trimming also strips the U+001C..=U+001F
/// separators, which [`str::trim`] keeps.
///
/// ```
/// use span_eval::text::split_sentences;
///
/// let units = split_sentences("Water daily!! Mulch in autumn...\nDone");
/// assert_eq!(units, vec!["Water daily", "Mulch in autumn", "Done"]);
/// ```
pub fn split_sentences(text: &str) -> Vec<String> {
    // Splitting on single delimiters leaves empty fragments between the
    // members of a run; those are discarded below with the blank ones.
    text.split(is_sentence_delimiter)
        .map(|fragment| fragment.trim_matches(is_unit_padding))
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join retrieved passages into one candidate text.
///
/// Each passage is trimmed, blank passages are discarded, and the rest are
/// joined with single spaces in their original order.
pub fn join_passages<S: AsRef<str>>(passages: &[S]) -> String {
    passages
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
