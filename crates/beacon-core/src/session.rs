//! Session state machine.
//!
//! ```text
//! NoSession ──start──▶ Active ──pause──▶ Paused
//!                        ▲                 │
//!                        └──start──────────┘  (within timeout: same session,
//!                                              otherwise: new session, index + 1)
//! ```
//!
//! A paused session is what gets persisted. On restart the tracker is
//! rebuilt in `Paused` from the stored session (or `NoSession` when nothing
//! was stored) and the next `start` decides whether it continues.

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};
use crate::record::SessionSnapshot;

const SESSION_ID_UNIQUE_ID_LENGTH: usize = 8;
const SESSION_ID_PAD_CHAR: char = '_';
const SESSION_ID_TIME_FORMAT: &str = "%Y%m%d-%H%M%S%3f";

/// Default inactivity window after which a paused session expires.
pub const DEFAULT_SESSION_TIMEOUT_MS: i64 = 1_800_000;

/// One period of activity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "sessionID")]
    session_id: String,
    #[serde(rename = "startTime")]
    start_time: i64,
    #[serde(rename = "pauseTime", default)]
    pause_time: Option<i64>,
    #[serde(rename = "sessionIndex")]
    session_index: u32,
}

impl Session {
    /// Start a new active session.
    pub fn new(unique_id: &str, start_time: i64, session_index: u32) -> Self {
        Self {
            session_id: generate_session_id(unique_id, start_time),
            start_time,
            pause_time: None,
            session_index,
        }
    }

    /// Session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Start time, epoch ms.
    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Pause time, if paused.
    pub fn pause_time(&self) -> Option<i64> {
        self.pause_time
    }

    /// 1-based session counter.
    pub fn session_index(&self) -> u32 {
        self.session_index
    }

    /// Whether the session is suspended.
    pub fn is_paused(&self) -> bool {
        self.pause_time.is_some()
    }

    /// Elapsed time from start to pause (or `now`), never negative.
    pub fn duration(&self, now: i64) -> i64 {
        let end = self.pause_time.unwrap_or(now);
        (end - self.start_time).max(0)
    }

    /// Attributes written onto events recorded during this session.
    pub fn snapshot(&self, now: i64) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            start_timestamp: self.start_time,
            duration: self.duration(now),
            session_number: self.session_index,
        }
    }

    /// Persisted JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the persisted JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let session: Self = serde_json::from_str(json)?;
        if session.session_id.is_empty() {
            return Err(CoreError::InvalidSession("empty sessionID".into()));
        }
        Ok(session)
    }
}

/// `last-8-chars(unique_id)` (left-padded with `_`) + `-` + UTC start time.
pub fn generate_session_id(unique_id: &str, start_time: i64) -> String {
    let time = chrono::DateTime::from_timestamp_millis(start_time).map_or_else(
        || start_time.to_string(),
        |dt| dt.format(SESSION_ID_TIME_FORMAT).to_string(),
    );
    format!(
        "{}-{time}",
        trim_or_pad(unique_id, SESSION_ID_UNIQUE_ID_LENGTH, SESSION_ID_PAD_CHAR)
    )
}

fn trim_or_pad(input: &str, len: usize, pad: char) -> String {
    let count = input.chars().count();
    if count >= len {
        input.chars().skip(count - len).collect()
    } else {
        let mut out: String = std::iter::repeat_n(pad, len - count).collect();
        out.push_str(input);
        out
    }
}

/// Where the tracker currently stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been started or restored.
    NoSession,
    /// Session in progress.
    Active(Session),
    /// Session suspended; may continue if resumed within the timeout.
    Paused(Session),
}

/// Drives [`SessionState`] transitions.
#[derive(Debug)]
pub struct SessionTracker {
    state: SessionState,
    unique_id: String,
    timeout_ms: i64,
    new_session: bool,
}

impl SessionTracker {
    /// Tracker with no session.
    pub fn new(unique_id: impl Into<String>, timeout_ms: i64) -> Self {
        Self {
            state: SessionState::NoSession,
            unique_id: unique_id.into(),
            timeout_ms,
            new_session: false,
        }
    }

    /// Tracker rebuilt from a persisted session.
    ///
    /// A stored session without a pause time is treated as paused at its
    /// start time.
    pub fn restore(unique_id: impl Into<String>, timeout_ms: i64, stored: Option<Session>) -> Self {
        let mut tracker = Self::new(unique_id, timeout_ms);
        if let Some(mut session) = stored {
            if session.pause_time.is_none() {
                session.pause_time = Some(session.start_time);
            }
            tracker.state = SessionState::Paused(session);
        }
        tracker
    }

    /// Begin or resume a session at `now`. Returns `true` when a new session
    /// was created (the caller then records `_session_start`).
    pub fn start(&mut self, now: i64) -> bool {
        let next = match std::mem::replace(&mut self.state, SessionState::NoSession) {
            SessionState::NoSession => {
                self.new_session = true;
                Session::new(&self.unique_id, now, 1)
            }
            SessionState::Active(session) => {
                self.state = SessionState::Active(session);
                return false;
            }
            SessionState::Paused(mut session) => {
                let paused_at = session.pause_time.unwrap_or(session.start_time);
                if now - paused_at < self.timeout_ms {
                    session.pause_time = None;
                    self.new_session = false;
                    session
                } else {
                    self.new_session = true;
                    Session::new(&self.unique_id, now, session.session_index + 1)
                }
            }
        };

        if self.new_session {
            tracing::debug!(
                session_id = next.session_id(),
                index = next.session_index(),
                "new session"
            );
        } else {
            tracing::debug!(session_id = next.session_id(), "session continued");
        }
        self.state = SessionState::Active(next);
        self.new_session
    }

    /// Pause the active session at `now`. Returns the newly paused session
    /// for persistence; `None` if no session was active, including when it
    /// was already paused.
    pub fn pause(&mut self, now: i64) -> Option<&Session> {
        let SessionState::Active(session) = &self.state else {
            return None;
        };
        let mut session = session.clone();
        session.pause_time = Some(now);
        self.state = SessionState::Paused(session);
        self.current()
    }

    /// Whether the last `start` created a new session.
    pub fn is_new_session(&self) -> bool {
        self.new_session
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The active or paused session.
    pub fn current(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Active(s) | SessionState::Paused(s) => Some(s),
            SessionState::NoSession => None,
        }
    }

    /// Snapshot for stamping events; only while a session is active.
    pub fn snapshot(&self, now: i64) -> Option<SessionSnapshot> {
        match &self.state {
            SessionState::Active(s) => Some(s.snapshot(now)),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
