//! Parses the "Slide N: Title | Theme" outline produced by the LLM into an
//! ordered list of slide records.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Theme used when a header carries no `| theme` part.
pub const DEFAULT_THEME: &str = "Default";

static SLIDE_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Slide\s*\d*\s*:(?P<title>[^|]*)(?:\|(?P<theme>.*))?$")
        .expect("Failed to compile SLIDE_HEADER regex")
});

/// A single slide recovered from the outline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SlideSpec {
    pub title: String,
    pub theme: String,
    pub is_title_slide: bool,
    pub bullets: Vec<String>,
}

enum SlideLine<'a> {
    Header { title: &'a str, theme: &'a str, titled: bool },
    Bullet(&'a str),
    Other,
}

fn classify(line: &str) -> SlideLine<'_> {
    if let Some(bullet) = line.strip_prefix('-') {
        return SlideLine::Bullet(bullet.trim());
    }

    if !line.starts_with("Slide") {
        return SlideLine::Other;
    }

    match SLIDE_HEADER_REGEX.captures(line) {
        Some(caps) => SlideLine::Header {
            title: caps.name("title").map_or("", |m| m.as_str().trim()),
            theme: caps
                .name("theme")
                .map_or(DEFAULT_THEME, |m| m.as_str().trim()),
            titled: line.contains("Title"),
        },
        None => SlideLine::Other,
    }
}

enum State {
    Seeking,
    InSlide(SlideSpec),
}

/// Converts the LLM outline into slides, in header order.
///
/// Never fails: lines that are neither a header nor a bullet are skipped,
/// and bullets seen before the first header are dropped. Only the first
/// header containing `Title` is flagged as the title slide.
pub fn parse_slides(raw_text: &str) -> Vec<SlideSpec> {
    let mut slides = Vec::new();
    let mut state = State::Seeking;
    let mut title_slide_seen = false;

    for line in raw_text.lines().map(str::trim) {
        state = match (state, classify(line)) {
            (previous, SlideLine::Header { title, theme, titled }) => {
                if let State::InSlide(slide) = previous {
                    slides.push(slide);
                }
                let is_title_slide = titled && !title_slide_seen;
                title_slide_seen |= is_title_slide;
                State::InSlide(SlideSpec {
                    title: title.to_owned(),
                    theme: theme.to_owned(),
                    is_title_slide,
                    bullets: Vec::new(),
                })
            }
            (State::InSlide(mut slide), SlideLine::Bullet(bullet)) => {
                slide.bullets.push(bullet.to_owned());
                State::InSlide(slide)
            }
            (state, SlideLine::Bullet(_) | SlideLine::Other) => state,
        };
    }

    if let State::InSlide(slide) = state {
        slides.push(slide);
    }

    slides
}
