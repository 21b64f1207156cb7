//! Per-login session context: who is logged in, in which role and language,
//! plus the chat histories and quiz progress of that login keyed by summary
//! id. Contexts are persisted as JSON and expire after
//! [`SESSION_TTL_HOURS`] without use.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use uuid::Uuid;

use crate::Role;
use crate::constants::SESSION_TTL_HOURS;
use crate::error::SessionError;
use crate::quiz_session::QuizProgress;
use crate::storage::{SessionRow, Storage};

/// Who wrote a chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub content: String,
}

impl ChatTurn {
    pub fn new(speaker: Speaker, content: &str) -> Self {
        Self {
            speaker,
            content: content.to_owned(),
        }
    }
}

/// Prints chat turns as a transcript, one `You:`/`Assistant:` line each.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_chat<W: Write>(turns: &[ChatTurn], output: &mut W) -> Result<()> {
    for turn in turns {
        let speaker = match turn.speaker {
            Speaker::User => "You",
            Speaker::Assistant => "Assistant",
        };
        writeln!(output, "{speaker}: {}", turn.content)?;
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub username: String,
    pub role: Role,
    pub language: String,
    #[serde(default)]
    pub chats: BTreeMap<i64, Vec<ChatTurn>>,
    #[serde(default)]
    pub quizzes: BTreeMap<i64, QuizProgress>,
}

impl SessionContext {
    /// Chat history about one summary.
    pub fn chat(&self, summary_id: i64) -> &[ChatTurn] {
        self.chats
            .get(&summary_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn push_chat(&mut self, summary_id: i64, speaker: Speaker, content: &str) {
        self.chats
            .entry(summary_id)
            .or_default()
            .push(ChatTurn::new(speaker, content));
    }

    /// Forgets everything tied to a deleted summary.
    pub fn forget_summary(&mut self, summary_id: i64) {
        self.chats.remove(&summary_id);
        self.quizzes.remove(&summary_id);
    }
}

/// Starts a session for an authenticated user.
///
/// # Errors
///
/// Returns an error if the session can't be stored.
pub fn create(storage: &Storage, username: &str, role: Role, language: &str) -> Result<SessionContext> {
    let context = SessionContext {
        id: Uuid::new_v4().to_string(),
        username: username.to_owned(),
        role,
        language: language.to_owned(),
        chats: BTreeMap::new(),
        quizzes: BTreeMap::new(),
    };
    update(storage, &context)?;
    info!("Started {role} session for {username}");
    Ok(context)
}

/// Loads a live session, expiring stale ones first.
///
/// # Errors
///
/// Returns [`SessionError`] when the session is unknown or expired, or a
/// database/decoding error.
pub fn read(storage: &Storage, id: &str) -> Result<SessionContext> {
    let row = storage
        .get_session(id)?
        .ok_or_else(|| SessionError::NotFound(id.to_owned()))?;

    let cutoff = Utc::now() - Duration::hours(SESSION_TTL_HOURS);
    if row.last_seen < cutoff {
        let purged = storage.delete_sessions_before(cutoff)?;
        debug!("Purged {purged} expired sessions");
        return Err(SessionError::Expired(id.to_owned()).into());
    }

    let mut context: SessionContext =
        serde_json::from_str(&row.context).context("Corrupted session context")?;
    context.id = row.id;
    context.username = row.username;
    Ok(context)
}

/// Stores the context and refreshes its last use.
///
/// # Errors
///
/// Returns an error if the session can't be stored.
pub fn update(storage: &Storage, context: &SessionContext) -> Result<()> {
    storage.upsert_session(&SessionRow {
        id: context.id.clone(),
        username: context.username.clone(),
        context: serde_json::to_string(context)?,
        last_seen: Utc::now(),
    })
}

/// Ends a session.
///
/// # Errors
///
/// Returns an error if database operation fails.
pub fn expire(storage: &Storage, id: &str) -> Result<bool> {
    storage.delete_session(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectral::prelude::*;

    fn session_error(result: Result<SessionContext>) -> Option<SessionError> {
        result.err().and_then(|e| e.downcast::<SessionError>().ok())
    }

    #[test]
    fn lifecycle() {
        let storage = Storage::new(":memory:").expect("in-memory database");
        let mut context = create(&storage, "ada", Role::Kid, "fr").expect("create");

        context.push_chat(7, Speaker::User, "What is it?");
        update(&storage, &context).expect("update");

        let loaded = read(&storage, &context.id).expect("read");
        assert_that(&loaded).is_equal_to(context.clone());
        assert_that(&loaded.chat(7).len()).is_equal_to(1);
        assert_that(&loaded.chat(8).is_empty()).is_true();

        assert_that(&expire(&storage, &context.id).expect("expire")).is_true();
        assert_that(&session_error(read(&storage, &context.id)))
            .is_equal_to(Some(SessionError::NotFound(context.id.clone())));
    }

    #[test]
    fn stale_sessions_expire() {
        let storage = Storage::new(":memory:").expect("in-memory database");
        storage
            .upsert_session(&SessionRow {
                id: "old".to_owned(),
                username: "ada".to_owned(),
                context: r#"{"role":"teacher","language":"en"}"#.to_owned(),
                last_seen: Utc::now() - Duration::hours(SESSION_TTL_HOURS + 1),
            })
            .expect("upsert");

        assert_that(&session_error(read(&storage, "old")))
            .is_equal_to(Some(SessionError::Expired("old".to_owned())));
        assert_that(&storage.get_session("old").expect("get").is_none()).is_true();
    }

    #[test]
    fn forgetting_a_summary_drops_its_state() {
        let mut context = SessionContext {
            id: String::new(),
            username: String::new(),
            role: Role::Student,
            language: "en".to_owned(),
            chats: BTreeMap::new(),
            quizzes: BTreeMap::new(),
        };
        context.push_chat(1, Speaker::Assistant, "hi");
        context.quizzes.insert(1, QuizProgress::default());
        context.forget_summary(1);

        assert_that(&(context.chats.is_empty() && context.quizzes.is_empty())).is_true();
    }

    #[test]
    fn stored_conversation_is_printed_in_order() {
        let storage = Storage::new(":memory:").expect("in-memory database");
        let mut context = create(&storage, "ada", Role::Student, "en").expect("create");
        context.push_chat(3, Speaker::User, "What is a leaf?");
        context.push_chat(3, Speaker::Assistant, "Where photosynthesis happens.");
        context.push_chat(4, Speaker::User, "Unrelated");
        update(&storage, &context).expect("update");

        let loaded = read(&storage, &context.id).expect("read");
        let mut output = Vec::new();
        write_chat(loaded.chat(3), &mut output).expect("writing to a Vec succeeds");

        assert_that(&String::from_utf8(output).expect("utf-8 output")).is_equal_to(
            "You: What is a leaf?\nAssistant: Where photosynthesis happens.\n".to_owned(),
        );
    }
}
