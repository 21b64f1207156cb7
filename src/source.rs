//! The source module loads the documents users submit for summarization:
//! web pages, YouTube videos and local PDF files.

use anyhow::{Context, Result};
use dom_smoothie::{Article, CandidateSelectMode, Config, Readability, TextMode};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector as ScraperSelector};
use std::path::{Path, PathBuf};
use url::Url;

use crate::TextBy;

static CAPTION_TRACK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""captionTracks":\[\{[^}]*?"baseUrl":"(?P<url>(?:[^"\\]|\\.)+)""#)
        .expect("Failed to compile CAPTION_TRACK regex")
});

/// A document submitted for summarization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Any web page.
    Web(Url),
    /// A YouTube video page.
    YouTube(Url),
    /// A PDF file on the local disk.
    Pdf(PathBuf),
}

impl Source {
    /// Classifies user input: an existing `.pdf` path, a YouTube URL or any
    /// other web URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is neither a PDF path nor a valid URL.
    pub fn parse(input: &str) -> Result<Self> {
        let path = Path::new(input);
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            return Ok(Source::Pdf(path.to_path_buf()));
        }

        let url = Url::parse(input).map_err(|e| anyhow::anyhow!("Invalid URL {input}: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Unsupported URL scheme: {}", url.scheme());
        }

        let host = url.host_str().unwrap_or_default().to_lowercase();
        if host.contains("youtube") || host.contains("youtu.be") {
            Ok(Source::YouTube(url))
        } else {
            Ok(Source::Web(url))
        }
    }

    /// Short kind tag stored in the summary history.
    pub fn kind(&self) -> &'static str {
        match self {
            Source::Web(_) => "url",
            Source::YouTube(_) => "youtube",
            Source::Pdf(_) => "pdf",
        }
    }

    /// The URL or file name stored in the summary history.
    pub fn value(&self) -> String {
        match self {
            Source::Web(url) | Source::YouTube(url) => url.to_string(),
            Source::Pdf(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
        }
    }
}

/// Options controlling how HTML pages are turned into text.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Text extraction method (dom_smoothie or fast_html2md).
    pub text_by: TextBy,
    /// CSS selector limiting the HTML subset from which content is extracted.
    pub selector: Option<ScraperSelector>,
}

/// Text extracted from a source.
#[derive(Debug)]
pub struct Document {
    /// The title of the document, if available.
    pub title: Option<String>,
    /// The text content of the document.
    pub text: String,
}

/// Loads and extracts the text of `source`.
///
/// # Errors
///
/// This function will return an error if:
///
/// - The page or file can't be fetched or read.
/// - Text extraction fails.
/// - The extracted text is empty.
pub async fn load_source(source: &Source, options: &LoadOptions) -> Result<Document> {
    info!("Loading {} source {}", source.kind(), source.value());

    let document = match source {
        Source::Web(url) => {
            let html = fetch_html(url).await?;
            extract_article(&html, options.text_by.clone(), &options.selector)?
        }
        Source::YouTube(url) => {
            let html = fetch_html(url).await?;
            load_video(&html).await
        }
        Source::Pdf(path) => extract_pdf(path)?,
    };

    if document.text.trim().is_empty() {
        anyhow::bail!("No content found at {}", source.value());
    }

    debug!(
        "Loaded {} characters titled {:?}",
        document.text.len(),
        document.title
    );
    Ok(document)
}

async fn fetch_html(url: &Url) -> Result<String> {
    let response = reqwest::Client::new()
        .get(url.as_str())
        .send()
        .await
        .context(format!("Failed to fetch {url}"))?
        .error_for_status()?;

    Ok(response.text().await?)
}

/// Prefers the first caption track of a video page, falling back to the
/// page's title and description when there are no usable captions.
async fn load_video(html: &str) -> Document {
    let description = extract_video_description(html);

    let Some(track_url) = caption_track_url(html) else {
        warn!("No captions found, summarizing the video description instead");
        return description;
    };

    let transcript = match fetch_transcript(&track_url).await {
        Ok(transcript) => transcript,
        Err(err) => {
            warn!("{err:#}, summarizing the video description instead");
            return description;
        }
    };
    if transcript.is_empty() {
        warn!("Captions are empty, summarizing the video description instead");
        return description;
    }

    Document {
        title: description.title,
        text: transcript,
    }
}

async fn fetch_transcript(track_url: &str) -> Result<String> {
    let xml = reqwest::Client::new()
        .get(track_url)
        .send()
        .await
        .context("Failed to fetch captions")?
        .error_for_status()?
        .text()
        .await?;

    Ok(transcript_text(&xml))
}

/// URL of the first caption track listed in the page's player response.
fn caption_track_url(html: &str) -> Option<String> {
    let raw = CAPTION_TRACK_REGEX.captures(html)?.name("url")?.as_str();
    // The URL is a JSON string literal, with `&` escaped as `\u0026`.
    serde_json::from_str::<String>(&format!("\"{raw}\"")).ok()
}

/// Joins the `<text>` cues of a timedtext caption document.
fn transcript_text(xml: &str) -> String {
    let document = Html::parse_document(xml);
    let Ok(selector) = ScraperSelector::parse("text") else {
        return String::new();
    };

    document
        .select(&selector)
        .map(|cue| {
            // Cue text is escaped twice.
            let once = cue.text().collect::<String>();
            Html::parse_fragment(&once)
                .root_element()
                .text()
                .collect::<String>()
        })
        .flat_map(|cue| {
            cue.split_whitespace()
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_pdf(path: &Path) -> Result<Document> {
    let bytes =
        std::fs::read(path).context(format!("Failed to read PDF file: {}", path.display()))?;
    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| anyhow::anyhow!("Unable to extract text from {}: {e}", path.display()))?;

    Ok(Document {
        title: path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned()),
        text,
    })
}

/// Extracts the readable article from the given HTML content.
///
/// # Errors
///
/// Returns an error if the chosen extraction method fails on the content.
pub fn extract_article(
    html: &str,
    text_by: TextBy,
    selector: &Option<ScraperSelector>,
) -> Result<Document> {
    let title = parse_title(html);
    let selected_html = match selector {
        Some(sel) => Html::parse_document(html)
            .select(sel)
            .map(|el| el.html())
            .collect::<Vec<_>>()
            .join("\n"),
        None => html.to_owned(),
    };

    let text = match text_by {
        TextBy::DomSmoothie => {
            let config = Config {
                text_mode: TextMode::Markdown,
                candidate_select_mode: CandidateSelectMode::DomSmoothie,
                ..Default::default()
            };

            let mut readability = Readability::new(selected_html.as_str(), None, Some(config))?;
            let article: Article = readability.parse()?;
            article.text_content.to_string()
        }
        TextBy::FastHtml2Md => html2md::parse_html(&selected_html, false),
    };

    Ok(Document { title, text })
}

fn element_text(document: &Html, query: &str) -> Option<String> {
    let selector = ScraperSelector::parse(query).ok()?;
    let element = document.select(&selector).next()?;
    let text = element.text().collect::<Vec<_>>().join(" ").trim().to_owned();
    (!text.is_empty()).then_some(text)
}

fn meta_content(document: &Html, query: &str) -> Option<String> {
    let selector = ScraperSelector::parse(query).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_owned)
}

/// Title from `<title>`, falling back to the first `h1` or `h2`.
fn parse_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    ["title", "h1", "h2"]
        .iter()
        .find_map(|query| element_text(&document, query))
}

/// A video page exposes its title and description through meta tags.
fn extract_video_description(html: &str) -> Document {
    let document = Html::parse_document(html);
    let title = meta_content(&document, r#"meta[property="og:title"]"#)
        .or_else(|| element_text(&document, "title"));
    let description = meta_content(&document, r#"meta[name="description"]"#)
        .or_else(|| meta_content(&document, r#"meta[property="og:description"]"#))
        .unwrap_or_default();

    let text = match &title {
        Some(title) if !description.is_empty() => format!("{title}\n\n{description}"),
        _ => description,
    };

    Document { title, text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectral::prelude::*;

    #[test]
    fn classifies_inputs() {
        let youtube = Source::parse("https://www.youtube.com/watch?v=abc").expect("valid url");
        let web = Source::parse("https://example.com/post").expect("valid url");

        assert_that(&youtube.kind()).is_equal_to("youtube");
        assert_that(&web.kind()).is_equal_to("url");
        assert_that(&Source::parse("https://youtu.be/abc").map(|s| s.kind()).ok())
            .is_equal_to(Some("youtube"));
    }

    #[test]
    fn rejects_non_urls() {
        assert_that(&Source::parse("not a url").is_err()).is_true();
        assert_that(&Source::parse("missing.pdf").is_err()).is_true();
        assert_that(&Source::parse("ftp://example.com/file").is_err()).is_true();
    }

    #[test]
    fn title_falls_back_to_headings() {
        let html = "<html><head><title> </title></head><body><h1>Heading</h1></body></html>";
        assert_that(&parse_title(html)).is_equal_to(Some("Heading".to_owned()));
    }

    #[test]
    fn video_description_is_read_from_meta_tags() {
        let html = r#"<html><head>
            <meta property="og:title" content="Rust in 100 seconds">
            <meta name="description" content="A quick tour of Rust.">
            </head></html>"#;
        let document = extract_video_description(html);

        assert_that(&document.title).is_equal_to(Some("Rust in 100 seconds".to_owned()));
        assert_that(&document.text).is_equal_to("Rust in 100 seconds\n\nA quick tour of Rust.".to_owned());
    }

    #[test]
    fn caption_track_is_found_in_player_response() {
        let html = r#"<script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc\u0026lang=en","name":{"simpleText":"English"},"languageCode":"en"},{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc\u0026lang=fr"}]}}};</script>"#;

        assert_that(&caption_track_url(html))
            .is_equal_to(Some("https://www.youtube.com/api/timedtext?v=abc&lang=en".to_owned()));
        assert_that(&caption_track_url("<html><head></head></html>")).is_none();
    }

    #[test]
    fn transcript_cues_are_joined_and_unescaped() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0" dur="1.5">Hello &amp;amp; welcome</text><text start="1.5" dur="2">to Rust&amp;#39;s
tour</text></transcript>"#;

        assert_that(&transcript_text(xml)).is_equal_to("Hello & welcome to Rust's tour".to_owned());
    }

    #[test]
    fn selector_limits_extracted_html() {
        let html = "<html><head><title>T</title></head><body><nav>menu</nav><main><p>Body text</p></main></body></html>";
        let selector = ScraperSelector::parse("main").ok();
        let document =
            extract_article(html, TextBy::FastHtml2Md, &selector).expect("extraction succeeds");

        assert_that(&document.text.contains("Body text")).is_true();
        assert_that(&document.text.contains("menu")).is_false();
        assert_that(&document.title).is_equal_to(Some("T".to_owned()));
    }
}
