//! The generate module wraps a single LLM completion call, which every
//! summary and artifact goes through.

use anyhow::Result;
use llm::chat::{ChatMessage, ChatProvider};
use log::{debug, trace};
use once_cell::sync::Lazy;
use rate_guard::{RateLimit, StdTokenBucket, TokenBucketBuilder};
use regex::Regex;
use std::time::Duration;

use crate::constants::THINK_STRIPPER;

static THINK_STRIPPER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(THINK_STRIPPER).expect("Failed to compile THINK_STRIPPER regex"));

/// Configuration containing shared data for generation calls
pub struct GenerateContext<'a> {
    /// LLM model to send prompts to
    pub model: &'a dyn ChatProvider,
    /// Rate limiter for controlling request frequency
    pub rate_limiter: Option<&'a StdTokenBucket>,
}

/// Builds a token bucket allowing `rpm` requests per minute.
///
/// Returns `None` when no limit was requested or the bucket can't be built.
pub fn build_rate_limiter(rpm: Option<u32>) -> Option<StdTokenBucket> {
    rpm.and_then(|rpm| {
        let capacity = rpm.max(1) as u64;
        let refill_interval = Duration::from_secs_f64(60.0 / capacity as f64);

        TokenBucketBuilder::builder()
            .capacity(capacity)
            .refill_amount(1_u64)
            .refill_every(refill_interval)
            .with_time(rate_guard::StdTimeSource::new())
            .with_precision::<rate_guard::Nanos>()
            .build()
            .ok()
    })
}

/// Sends `prompt` to the model as one user message and returns its answer
/// with any `<think>` section removed.
///
/// # Errors
///
/// Returns an error if the LLM chat operation fails. No retry is attempted.
pub async fn generate_text(ctx: &GenerateContext<'_>, prompt: &str) -> Result<String> {
    let messages = vec![ChatMessage::user().content(prompt).build()];

    if let Some(limiter) = ctx.rate_limiter {
        while limiter.try_acquire(1).is_err() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    trace!("Prompt: {prompt}");
    let response = ctx
        .model
        .chat(&messages)
        .await
        .map_err(|err| anyhow::anyhow!("LLM error: {err}."))?
        .to_string();

    let text = THINK_STRIPPER_REGEX
        .replace_all(&response, "")
        .trim()
        .to_owned();
    debug!("LLM answered with {} characters", text.len());

    Ok(text)
}
