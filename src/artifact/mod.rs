//! Artifacts derived from a stored summary: slide deck, quiz, mindmap,
//! narration script and summary chat answers.
//!
//! Each generator makes one LLM call and hands the free-text answer to the
//! matching parser. Parsers never fail; an under-populated result is logged
//! as a warning and returned as is.

pub mod mindmap;
pub mod quiz;
pub mod slides;

use anyhow::Result;
use log::warn;

use crate::constants::{
    AUDIO_PROMPT_TEMPLATE, AUDIO_SCRIPT_MAX_WORDS, CHAT_PROMPT_TEMPLATE, MINDMAP_PROMPT_TEMPLATE,
    QUIZ_PROMPT_TEMPLATE, SLIDES_PROMPT_TEMPLATE,
};
use crate::generate::{GenerateContext, generate_text};
use crate::text::truncate_words;

use mindmap::{Mindmap, parse_mindmap};
use quiz::{QUIZ_LENGTH, QuizQuestion, parse_quiz};
use slides::{SlideSpec, parse_slides};

fn fill(template: &str, summary: &str) -> String {
    template.replace("{summary}", summary)
}

/// Asks the model for a slide outline of `summary` and parses it.
///
/// # Errors
///
/// Returns an error if the LLM call fails.
pub async fn generate_slides(ctx: &GenerateContext<'_>, summary: &str) -> Result<Vec<SlideSpec>> {
    let answer = generate_text(ctx, &fill(SLIDES_PROMPT_TEMPLATE, summary)).await?;
    let slides = parse_slides(&answer);
    if slides.is_empty() {
        warn!("The model answer contained no slide headers");
    }
    Ok(slides)
}

/// Asks the model for three quiz questions about `summary` and parses them.
///
/// # Errors
///
/// Returns an error if the LLM call fails.
pub async fn generate_quiz(ctx: &GenerateContext<'_>, summary: &str) -> Result<Vec<QuizQuestion>> {
    let answer = generate_text(ctx, &fill(QUIZ_PROMPT_TEMPLATE, summary)).await?;
    let questions = parse_quiz(&answer);
    if questions.len() < QUIZ_LENGTH {
        warn!(
            "Only {}/{QUIZ_LENGTH} complete quiz questions could be parsed",
            questions.len()
        );
    }
    Ok(questions)
}

/// Asks the model for a mindmap outline of `summary` and parses it.
///
/// # Errors
///
/// Returns an error if the LLM call fails.
pub async fn generate_mindmap(ctx: &GenerateContext<'_>, summary: &str) -> Result<Mindmap> {
    let answer = generate_text(ctx, &fill(MINDMAP_PROMPT_TEMPLATE, summary)).await?;
    let map = parse_mindmap(&answer);
    if map.is_empty() {
        warn!("The model answer contained no central topic");
    }
    Ok(map)
}

/// Asks the model for a short narration script, capped at
/// [`AUDIO_SCRIPT_MAX_WORDS`] words.
///
/// # Errors
///
/// Returns an error if the LLM call fails.
pub async fn generate_audio_script(ctx: &GenerateContext<'_>, summary: &str) -> Result<String> {
    let answer = generate_text(ctx, &fill(AUDIO_PROMPT_TEMPLATE, summary)).await?;
    Ok(truncate_words(&answer, AUDIO_SCRIPT_MAX_WORDS))
}

/// Answers `question` using only `summary` as context.
///
/// # Errors
///
/// Returns an error if the LLM call fails.
pub async fn answer_question(
    ctx: &GenerateContext<'_>,
    summary: &str,
    question: &str,
) -> Result<String> {
    let prompt = fill(CHAT_PROMPT_TEMPLATE, summary).replace("{question}", question);
    generate_text(ctx, &prompt).await
}
