//! Recursive character splitting of long documents into overlapping chunks.
//!
//! The text is cut on the coarsest separator that occurs in it (paragraphs,
//! then lines, then words, then characters); pieces still larger than the
//! chunk size are split again with the next separator. Neighbouring pieces
//! are merged back up to the chunk size, carrying up to `overlap`
//! characters of context into the next chunk.

use std::collections::VecDeque;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits `text` into chunks of at most `chunk_size` characters.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    split_recursive(text, &SEPARATORS, chunk_size.max(1), overlap)
}

fn split_recursive(text: &str, separators: &[&str], chunk_size: usize, overlap: usize) -> Vec<String> {
    let position = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
        .unwrap_or(separators.len().saturating_sub(1));
    let separator = separators.get(position).copied().unwrap_or("");
    let finer = separators.get(position + 1..).unwrap_or(&[]);

    let pieces: Vec<String> = if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator).map(str::to_owned).collect()
    };

    let mut chunks = Vec::new();
    let mut fitting = Vec::new();

    for piece in pieces {
        if char_len(&piece) < chunk_size {
            fitting.push(piece);
            continue;
        }

        if !fitting.is_empty() {
            chunks.extend(merge_pieces(&fitting, separator, chunk_size, overlap));
            fitting.clear();
        }

        if finer.is_empty() {
            chunks.push(piece);
        } else {
            chunks.extend(split_recursive(&piece, finer, chunk_size, overlap));
        }
    }

    if !fitting.is_empty() {
        chunks.extend(merge_pieces(&fitting, separator, chunk_size, overlap));
    }

    chunks
}

fn join_trimmed(window: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn merge_pieces(pieces: &[String], separator: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let separator_len = char_len(separator);
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    let joined_len = |window: &VecDeque<&str>, total: usize| {
        total + separator_len * window.len().saturating_sub(1)
    };

    for piece in pieces {
        let len = char_len(piece);
        let grown = joined_len(&window, total) + len + if window.is_empty() { 0 } else { separator_len };

        if grown > chunk_size && !window.is_empty() {
            chunks.extend(join_trimmed(&window, separator));

            while let Some(front) = window.front() {
                let current = joined_len(&window, total);
                let still_too_big = current + len + separator_len > chunk_size;
                if current <= overlap && !still_too_big {
                    break;
                }
                total -= char_len(front);
                window.pop_front();
            }
        }

        window.push_back(piece);
        total += len;
    }

    chunks.extend(join_trimmed(&window, separator));
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectral::prelude::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_that(&split_text("  hello world  ", 100, 10)).is_equal_to(vec!["hello world".to_owned()]);
        assert_that(&split_text("", 100, 10)).is_empty();
    }

    #[test]
    fn chunks_respect_size() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa ".repeat(40);
        let chunks = split_text(&text, 100, 20);

        assert_that(&chunks.len()).is_greater_than(1);
        for chunk in &chunks {
            assert_that(&char_len(chunk)).is_less_than_or_equal_to(100);
        }
    }

    #[test]
    fn paragraphs_are_preferred_boundaries() {
        let text = format!("{}\n\n{}", "a".repeat(60), "b".repeat(60));
        let chunks = split_text(&text, 100, 0);

        assert_that(&chunks).is_equal_to(vec!["a".repeat(60), "b".repeat(60)]);
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let text = (0..60).map(|i| format!("w{i:02}")).collect::<Vec<_>>().join(" ");
        let chunks = split_text(&text, 40, 12);

        let first_tail = chunks[0].split(' ').next_back().unwrap_or_default();
        assert_that(&(chunks[1].starts_with(first_tail) || chunks[1].contains(first_tail))).is_true();
    }

    #[test]
    fn words_longer_than_chunk_are_split_by_character() {
        let chunks = split_text(&"x".repeat(25), 10, 0);

        assert_that(&chunks).is_equal_to(vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }
}
