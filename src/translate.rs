//! Best-effort translation of summaries through the public Google Translate
//! web endpoint. Any failure falls back to the untranslated text.

use anyhow::{Context, Result};
use log::warn;
use serde_json::Value;

const TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Languages offered for summaries, as (display name, code) pairs.
pub const LANGUAGES: [(&str, &str); 8] = [
    ("English", "en"),
    ("Hindi", "hi"),
    ("Telugu", "te"),
    ("Tamil", "ta"),
    ("Kannada", "kn"),
    ("French", "fr"),
    ("Spanish", "es"),
    ("German", "de"),
];

/// Resolves a language given either by display name or by code.
pub fn language_code(input: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(name, code)| name.eq_ignore_ascii_case(input) || code.eq_ignore_ascii_case(input))
        .map(|(_, code)| *code)
}

/// Translates `text` into `target_lang`.
///
/// English is returned unchanged without a request. Network or decoding
/// errors are logged and the original text is returned.
pub async fn translate_text(text: &str, target_lang: &str) -> String {
    if target_lang == "en" || text.trim().is_empty() {
        return text.to_owned();
    }

    match request_translation(text, target_lang).await {
        Ok(translated) if !translated.is_empty() => translated,
        Ok(_) => text.to_owned(),
        Err(err) => {
            warn!("Translation to {target_lang} failed, keeping original text: {err:#}");
            text.to_owned()
        }
    }
}

async fn request_translation(text: &str, target_lang: &str) -> Result<String> {
    let body: Value = reqwest::Client::new()
        .get(TRANSLATE_ENDPOINT)
        .query(&[
            ("client", "gtx"),
            ("sl", "auto"),
            ("tl", target_lang),
            ("dt", "t"),
            ("q", text),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .context("Unable to decode translation response")?;

    Ok(collect_segments(&body))
}

/// The endpoint answers `[[["translated", "source", ...], ...], ...]`.
fn collect_segments(body: &Value) -> String {
    body.get(0)
        .and_then(Value::as_array)
        .map(|segments| {
            segments
                .iter()
                .filter_map(|segment| segment.get(0).and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spectral::prelude::*;

    #[test]
    fn languages_resolve_by_name_or_code() {
        assert_that(&language_code("German")).is_equal_to(Some("de"));
        assert_that(&language_code("kn")).is_equal_to(Some("kn"));
        assert_that(&language_code("Klingon")).is_none();
    }

    #[test]
    fn segments_are_concatenated() {
        let body = json!([[["Hallo ", "Hello ", null], ["Welt", "world", null]], null, "en"]);
        assert_that(&collect_segments(&body)).is_equal_to("Hallo Welt".to_owned());
        assert_that(&collect_segments(&json!({}))).is_equal_to(String::new());
    }

    #[tokio::test]
    async fn english_is_identity() {
        assert_that(&translate_text("Hello", "en").await).is_equal_to("Hello".to_owned());
    }
}
