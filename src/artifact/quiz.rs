//! Parses "Q) / A)..D) / Answer: / Explanation:" blocks into quiz questions.

use serde::{Deserialize, Serialize};

/// Number of questions a quiz holds.
pub const QUIZ_LENGTH: usize = 3;

/// Option labels, in the order the options are presented.
pub const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// A complete multiple choice question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: [String; 4],
    pub correct_index: usize,
    pub explanation: String,
}

impl QuizQuestion {
    /// Text of the correct option.
    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.correct_index)
            .map_or("", String::as_str)
    }
}

/// A question block as it is being read, before validation.
#[derive(Debug, Default)]
struct DraftQuestion {
    question: String,
    options: Vec<(char, String)>,
    answer: Option<char>,
    explanation: Option<String>,
}

impl DraftQuestion {
    fn new(question: &str) -> Self {
        Self {
            question: question.to_owned(),
            ..Default::default()
        }
    }

    /// Validates the draft, resolving the answer by label rather than by
    /// position. Incomplete drafts yield `None`.
    fn finish(self) -> Option<QuizQuestion> {
        if self.question.is_empty() || self.options.len() != OPTION_LABELS.len() {
            return None;
        }

        let mut options: [String; 4] = Default::default();
        for (slot, label) in options.iter_mut().zip(OPTION_LABELS) {
            let mut matching = self.options.iter().filter(|(l, _)| *l == label);
            *slot = match (matching.next(), matching.next()) {
                (Some((_, text)), None) => text.clone(),
                _ => return None,
            };
        }

        let answer = self.answer?;
        let correct_index = OPTION_LABELS.iter().position(|label| *label == answer)?;
        let explanation = self.explanation.filter(|e| !e.is_empty())?;

        Some(QuizQuestion {
            question: self.question,
            options,
            correct_index,
            explanation,
        })
    }
}

enum QuizLine<'a> {
    Question(&'a str),
    Option(char, &'a str),
    Answer(Option<char>),
    Explanation(&'a str),
    Other,
}

fn classify(line: &str) -> QuizLine<'_> {
    if let Some(question) = line.strip_prefix("Q)") {
        return QuizLine::Question(question.trim());
    }

    for label in OPTION_LABELS {
        if let Some(text) = line.strip_prefix(label).and_then(|l| l.strip_prefix(')')) {
            return QuizLine::Option(label, text.trim());
        }
    }

    if line.starts_with("Answer:") {
        return QuizLine::Answer(answer_label(line));
    }

    match line.strip_prefix("Explanation:") {
        Some(explanation) => QuizLine::Explanation(explanation.trim()),
        None => QuizLine::Other,
    }
}

/// The character right before the first `)` is the declared letter; with no
/// `)` the line's last character is used instead.
fn answer_label(line: &str) -> Option<char> {
    let head = line.split(')').next().unwrap_or(line);
    head.chars()
        .next_back()
        .map(|label| label.to_ascii_uppercase())
}

enum State {
    Seeking,
    InQuestion(DraftQuestion),
}

/// Converts quiz text into at most [`QUIZ_LENGTH`] complete questions.
///
/// Blocks missing the question text, any of the four labelled options, a
/// resolvable answer letter or an explanation are dropped before the list
/// is truncated. A short list is a valid result.
pub fn parse_quiz(raw_text: &str) -> Vec<QuizQuestion> {
    let mut drafts = Vec::new();
    let mut state = State::Seeking;

    for line in raw_text.lines().map(str::trim) {
        state = match (state, classify(line)) {
            (previous, QuizLine::Question(question)) => {
                if let State::InQuestion(draft) = previous {
                    drafts.push(draft);
                }
                State::InQuestion(DraftQuestion::new(question))
            }
            (State::InQuestion(mut draft), QuizLine::Option(label, text)) => {
                draft.options.push((label, text.to_owned()));
                State::InQuestion(draft)
            }
            (State::InQuestion(mut draft), QuizLine::Answer(label)) => {
                draft.answer = label;
                State::InQuestion(draft)
            }
            (State::InQuestion(mut draft), QuizLine::Explanation(explanation)) => {
                draft.explanation = Some(explanation.to_owned());
                State::InQuestion(draft)
            }
            (state, _) => state,
        };
    }

    if let State::InQuestion(draft) = state {
        drafts.push(draft);
    }

    drafts
        .into_iter()
        .filter_map(DraftQuestion::finish)
        .take(QUIZ_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectral::prelude::*;

    const SKY: &str = "Q) What color is the sky?\n\
        A) Red\n\
        B) Blue\n\
        C) Green\n\
        D) Yellow\n\
        Answer: B) Blue\n\
        Explanation: Sky scatters blue light.\n";

    fn block(n: usize) -> String {
        format!(
            "Q) Question {n}?\nA) a{n}\nB) b{n}\nC) c{n}\nD) d{n}\nAnswer: C) c{n}\nExplanation: because {n}\n"
        )
    }

    #[test]
    fn resolves_answer_letter_to_option() {
        let quiz = parse_quiz(SKY);

        assert_that(&quiz).has_length(1);
        assert_that(&quiz[0].correct_index).is_equal_to(1);
        assert_that(&quiz[0].correct_option()).is_equal_to("Blue");
        assert_that(&quiz[0].question.as_str()).is_equal_to("What color is the sky?");
        assert_that(&quiz[0].explanation.as_str()).is_equal_to("Sky scatters blue light.");
    }

    #[test]
    fn three_blocks_in_order() {
        let text: String = (1..=3).map(block).collect();
        let quiz = parse_quiz(&text);

        assert_that(&quiz).has_length(3);
        for (i, question) in quiz.iter().enumerate() {
            assert_that(&question.question).is_equal_to(format!("Question {}?", i + 1));
            assert_that(&question.correct_option().to_owned()).is_equal_to(format!("c{}", i + 1));
        }
    }

    #[test]
    fn extra_blocks_are_truncated() {
        let text: String = (1..=5).map(block).collect();
        let quiz = parse_quiz(&text);

        assert_that(&quiz).has_length(QUIZ_LENGTH);
        assert_that(&quiz[2].question.as_str()).is_equal_to("Question 3?");
    }

    #[test]
    fn incomplete_blocks_are_dropped_before_truncation() {
        let text = format!(
            "Q) Missing option\nA) x\nB) y\nC) z\nAnswer: A\nExplanation: nope\n{}{}{}",
            block(1),
            block(2),
            block(3)
        );
        let quiz = parse_quiz(&text);

        assert_that(&quiz).has_length(3);
        assert_that(&quiz[0].question.as_str()).is_equal_to("Question 1?");
    }

    #[test]
    fn missing_explanation_or_answer_drops_question() {
        let no_explanation = "Q) q\nA) a\nB) b\nC) c\nD) d\nAnswer: A) a\n";
        let bad_answer = "Q) q\nA) a\nB) b\nC) c\nD) d\nAnswer: E) e\nExplanation: x\n";

        assert_that(&parse_quiz(no_explanation)).is_empty();
        assert_that(&parse_quiz(bad_answer)).is_empty();
    }

    #[test]
    fn answer_is_matched_by_label_not_position() {
        let shuffled = "Q) Pick\nB) second\nA) first\nD) fourth\nC) third\nAnswer: b) second\nExplanation: e\n";
        let quiz = parse_quiz(shuffled);

        assert_that(&quiz[0].correct_option()).is_equal_to("second");
        assert_that(&quiz[0].options[0].as_str()).is_equal_to("first");
    }

    #[test]
    fn answer_without_parenthesis_uses_last_letter() {
        let text = "Q) q\nA) a\nB) b\nC) c\nD) d\nAnswer: D\nExplanation: x\n";

        assert_that(&parse_quiz(text)[0].correct_index).is_equal_to(3);
    }

    #[test]
    fn options_before_any_question_are_ignored() {
        let text = format!("A) stray\nAnswer: A\n{SKY}");

        assert_that(&parse_quiz(&text)).has_length(1);
        assert_that(&parse_quiz("")).is_empty();
    }

    #[test]
    fn parsing_is_repeatable() {
        let text = format!("Intro line\n{SKY}{}Q) Broken?\nA) only one\n{}", block(2), block(3));

        assert_that(&parse_quiz(&text)).is_equal_to(parse_quiz(&text));
        assert_that(&parse_quiz(&text)).has_length(3);
    }
}
