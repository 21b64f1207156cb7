//! The summarize module loads a submitted document, summarizes its leading
//! chunks for the session's role and stores the result in the user's history.

use anyhow::Result;
use log::{debug, info};

use crate::Role;
use crate::constants::{CHUNK_OVERLAP, CHUNK_SIZE, MAX_SUMMARY_CHUNKS, SUMMARY_PROMPT_TEMPLATE};
use crate::generate::{GenerateContext, generate_text};
use crate::session::SessionContext;
use crate::source::{LoadOptions, Source, load_source};
use crate::split::split_text;
use crate::storage::{NewSummary, Storage};
use crate::text::clean_text;
use crate::translate::translate_text;

/// Summary stored in the history.
#[derive(Debug)]
pub struct StoredSummary {
    /// History entry id
    pub id: i64,
    /// Title of the loaded document, if any
    pub title: Option<String>,
    /// Final, possibly translated, summary text
    pub summary: String,
}

/// Fills the summary prompt for one chunk.
///
/// A custom template without a `{text}` placeholder gets the chunk appended.
pub fn summary_prompt(template: Option<&str>, role: Role, chunk: &str) -> String {
    let template = template.unwrap_or(SUMMARY_PROMPT_TEMPLATE);
    let prompt = template
        .replace("{role}", role.as_str())
        .replace("{role_instructions}", role.instructions())
        .replace("{text}", chunk);

    if template.contains("{text}") {
        prompt
    } else {
        format!("{prompt}\n\n{chunk}")
    }
}

/// Summarizes the first [`MAX_SUMMARY_CHUNKS`] chunks of `text`, one LLM
/// call each, and joins the partial summaries with blank lines.
///
/// # Errors
///
/// Returns an error if any LLM call fails.
pub async fn summarize_text(
    ctx: &GenerateContext<'_>,
    text: &str,
    role: Role,
    prompt_template: Option<&str>,
) -> Result<String> {
    let chunks = split_text(text, CHUNK_SIZE, CHUNK_OVERLAP);
    debug!(
        "Document split into {} chunks, summarizing the first {}",
        chunks.len(),
        chunks.len().min(MAX_SUMMARY_CHUNKS)
    );

    let mut parts = Vec::new();
    for chunk in chunks.iter().take(MAX_SUMMARY_CHUNKS) {
        let prompt = summary_prompt(prompt_template, role, chunk);
        parts.push(generate_text(ctx, &prompt).await?);
    }

    Ok(clean_text(&parts.join("\n\n")))
}

/// Loads `source`, summarizes it for the session's role and language and
/// appends the result to the session user's history.
///
/// # Arguments
///
/// * `storage` - Database receiving the history entry
/// * `ctx` - Model and rate limiter used for the summary calls
/// * `session` - The logged-in session (user, role, language)
/// * `source` - The document to summarize
/// * `options` - HTML extraction options
/// * `prompt_template` - Optional replacement for the built-in prompt
///
/// # Errors
///
/// Returns an error if:
/// * The document can't be loaded or has no text
/// * An LLM call fails
/// * Database operations fail
pub async fn summarize(
    storage: &Storage,
    ctx: &GenerateContext<'_>,
    session: &SessionContext,
    source: &Source,
    options: &LoadOptions,
    prompt_template: Option<&str>,
) -> Result<StoredSummary> {
    let document = load_source(source, options).await?;

    info!(
        "Summarizing {} for a {} in {}...",
        source.value(),
        session.role,
        session.language
    );
    let summary = summarize_text(ctx, &document.text, session.role, prompt_template).await?;
    let summary = translate_text(&summary, &session.language).await;

    let id = storage.append_summary(&NewSummary {
        username: session.username.clone(),
        source_type: source.kind().to_owned(),
        source_value: source.value(),
        summary: summary.clone(),
    })?;
    info!("Stored summary #{id} in {}'s history", session.username);

    Ok(StoredSummary {
        id,
        title: document.title,
        summary,
    })
}
