//! Quiz session controller: collects answers for a parsed quiz, scores the
//! submission and produces per-question feedback.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use crate::artifact::quiz::{OPTION_LABELS, QuizQuestion};
use crate::error::QuizError;

/// Progress through one quiz, kept in the session between commands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizProgress {
    pub questions: Vec<QuizQuestion>,
    /// Chosen option index per question index.
    pub answers: BTreeMap<usize, usize>,
    pub submitted: bool,
    pub score: usize,
}

/// Outcome of one answered question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionFeedback {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
}

/// Scored submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizReport {
    pub score: usize,
    pub total: usize,
    pub feedback: Vec<QuestionFeedback>,
}

impl QuizReport {
    pub fn performance(&self) -> &'static str {
        match self.total.saturating_sub(self.score) {
            0 => "Excellent! You got all questions right!",
            _ if self.score * 3 >= self.total * 2 => "Good job! You got most questions right.",
            _ if self.score > 0 => "Not bad! Review the material and try again.",
            _ => "Let's review the content and try again.",
        }
    }
}

impl QuizProgress {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            ..Default::default()
        }
    }

    /// Records the option labelled `label` (A-D) for question `index`.
    ///
    /// # Errors
    ///
    /// Fails if the quiz was submitted, or the question or label is unknown.
    pub fn answer(&mut self, index: usize, label: char) -> Result<(), QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        if index >= self.questions.len() {
            return Err(QuizError::NoSuchQuestion(index + 1));
        }
        let label = label.to_ascii_uppercase();
        let option = OPTION_LABELS
            .iter()
            .position(|l| *l == label)
            .ok_or(QuizError::NoSuchOption(label))?;

        self.answers.insert(index, option);
        Ok(())
    }

    /// Scores the quiz once every question has an answer.
    ///
    /// # Errors
    ///
    /// Fails if the quiz was already submitted or answers are missing.
    pub fn submit(&mut self) -> Result<QuizReport, QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        let total = self.questions.len();
        let answered = (0..total).filter(|i| self.answers.contains_key(i)).count();
        if answered < total || total == 0 {
            return Err(QuizError::Incomplete { answered, total });
        }

        let report = self.build_report();
        self.score = report.score;
        self.submitted = true;
        Ok(report)
    }

    /// Report of an already submitted quiz.
    pub fn report(&self) -> Option<QuizReport> {
        self.submitted.then(|| self.build_report())
    }

    fn build_report(&self) -> QuizReport {
        let feedback: Vec<QuestionFeedback> = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| {
                let chosen = self.answers.get(&i).copied().unwrap_or_default();
                QuestionFeedback {
                    question: question.question.clone(),
                    user_answer: question.options.get(chosen).cloned().unwrap_or_default(),
                    correct_answer: question.correct_option().to_owned(),
                    is_correct: chosen == question.correct_index,
                    explanation: question.explanation.clone(),
                }
            })
            .collect();

        QuizReport {
            score: feedback.iter().filter(|f| f.is_correct).count(),
            total: self.questions.len(),
            feedback,
        }
    }

    /// Clears answers and score, keeping the questions.
    pub fn retake(&mut self) {
        *self = Self::new(std::mem::take(&mut self.questions));
    }
}

/// Asks every unanswered question on `output`, reading one option letter
/// per line from `input`, then submits and prints the feedback.
///
/// Returns `None` when input ends before every question is answered; the
/// answers given so far stay in `progress`.
///
/// # Errors
///
/// Returns an error if reading or writing fails, or the quiz was already
/// submitted.
pub fn run_quiz<R: BufRead, W: Write>(
    progress: &mut QuizProgress,
    input: &mut R,
    output: &mut W,
) -> Result<Option<QuizReport>> {
    let total = progress.questions.len();
    writeln!(output, "Answer all {total} questions, one letter (A-D) each:")?;

    for index in 0..total {
        if progress.answers.contains_key(&index) {
            continue;
        }
        let Some(question) = progress.questions.get(index) else {
            break;
        };

        writeln!(output, "\nQ{}) {}", index + 1, question.question)?;
        for (label, option) in OPTION_LABELS.iter().zip(&question.options) {
            writeln!(output, "  {label}) {option}")?;
        }

        loop {
            write!(output, "Your answer: ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let choice = line.trim().chars().next().unwrap_or(' ');
            match progress.answer(index, choice) {
                Ok(()) => break,
                Err(err) => writeln!(output, "{err}")?,
            }
        }
    }

    let report = progress.submit()?;
    write_report(&report, output)?;
    Ok(Some(report))
}

/// Prints the score, the performance message and per-question feedback.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_report<W: Write>(report: &QuizReport, output: &mut W) -> Result<()> {
    writeln!(output, "\nQuiz Results: {}/{}", report.score, report.total)?;
    writeln!(output, "{}\n", report.performance())?;

    for (i, feedback) in report.feedback.iter().enumerate() {
        writeln!(output, "Q{}) {}", i + 1, feedback.question)?;
        writeln!(output, "Your answer: {}", feedback.user_answer)?;
        if !feedback.is_correct {
            writeln!(output, "Correct answer: {}", feedback.correct_answer)?;
        }
        writeln!(output, "Explanation: {}\n", feedback.explanation)?;
    }

    Ok(())
}
