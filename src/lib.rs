//! The smartsum library turns web pages, YouTube videos and PDFs into
//! role-tailored LLM summaries and derives slide decks, quizzes, mindmaps and
//! narration scripts from them.

pub mod artifact;
pub mod auth;
pub mod compose;
pub mod constants;
pub mod error;
pub mod generate;
pub mod quiz_session;
pub mod session;
pub mod source;
pub mod split;
pub mod storage;
pub mod summarize;
pub mod text;
pub mod translate;

use serde::{Deserialize, Serialize};

/// Enum representing the text extraction method.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum TextBy {
    /// Use dom_smoothie for text extraction
    #[default]
    DomSmoothie,
    /// Use fast_html2md for text extraction
    FastHtml2Md,
}

impl std::str::FromStr for TextBy {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "dom_smoothie" => Ok(TextBy::DomSmoothie),
            "fast_html2md" => Ok(TextBy::FastHtml2Md),
            _ => Err(format!("Invalid text extraction method: {}", input)),
        }
    }
}

/// Audience the summary is written for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    #[default]
    Student,
    Kid,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Kid => "kid",
        }
    }

    /// Tone instructions appended to the summary prompt.
    pub fn instructions(self) -> &'static str {
        match self {
            Role::Teacher => {
                "Focus on key insights, main concepts, and pedagogical value. Use formal academic tone."
            }
            Role::Student => {
                "Provide detailed explanations with examples. Include study tips and practical applications."
            }
            Role::Kid => {
                "Use simple language (5th grade level). Include fun examples and analogies. Keep sentences short."
            }
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "kid" => Ok(Role::Kid),
            _ => Err(format!("Invalid role: {input} (expected teacher, student or kid)")),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub use artifact::{
    mindmap::{Mindmap, MindmapNode, NodeKind, parse_mindmap},
    quiz::{QuizQuestion, parse_quiz},
    slides::{SlideSpec, parse_slides},
};
pub use compose::compose;
pub use generate::generate_text;
pub use source::{Source, load_source};
pub use summarize::summarize;
