//! Typed errors the command handlers need to tell apart.

use thiserror::Error;

/// Account registration, login and password reset failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Account {0} does not exist. Please create an account.")]
    UnknownUser(String),

    #[error("Username {0} already exists.")]
    UserExists(String),

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error(
        "Password must be at least 6 characters long, with at least one uppercase letter, one lowercase letter, and one digit."
    )]
    WeakPassword,

    #[error("Username must not be empty.")]
    EmptyUsername,
}

/// Session lookup failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {0} not found. Please log in.")]
    NotFound(String),

    #[error("Session {0} has expired. Please log in again.")]
    Expired(String),
}

/// Quiz controller misuse.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QuizError {
    #[error("Please answer all questions before submitting! ({answered}/{total} answered)")]
    Incomplete { answered: usize, total: usize },

    #[error("Question {0} does not exist.")]
    NoSuchQuestion(usize),

    #[error("Option {0} does not exist.")]
    NoSuchOption(char),

    #[error("Quiz was already submitted.")]
    AlreadySubmitted,
}

/// Renderer failures, reported separately from generation failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("No slides to render.")]
    EmptyDeck,

    #[error("No mindmap to render: the outline has no central topic.")]
    EmptyMindmap,
}
