//! Small text helpers shared by the summary and artifact pipelines.

/// Replaces typographic dashes and quotes with their ASCII counterparts.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            other => other,
        })
        .collect()
}

/// Keeps the first `max_words` whitespace-separated words, joined by single
/// spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectral::prelude::*;

    #[test]
    fn typographic_punctuation_is_flattened() {
        let cleaned = clean_text("\u{201c}Rust\u{201d} \u{2013} it\u{2019}s fast \u{2014} really");
        assert_that(&cleaned).is_equal_to("\"Rust\" - it's fast - really".to_owned());
    }

    #[test]
    fn words_are_capped() {
        assert_that(&truncate_words("one  two\nthree four", 3)).is_equal_to("one two three".to_owned());
        assert_that(&truncate_words("short", 10)).is_equal_to("short".to_owned());
    }
}
