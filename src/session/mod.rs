//! Typing session lifecycle.
//!
//! A [`Session`] is one attempt at a challenge. It moves
//! `Idle -> Playing -> Finished` as input arrives through
//! [`Session::record_input`], timestamps every update, and scores itself
//! exactly once when the input reaches the target length.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::challenges::catalog;
use crate::models::Challenge;
use crate::scoring::{self, ScoringInput, SessionMetrics};
use crate::storage::{JsonlReader, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Challenge text is empty")]
    EmptyTarget,

    #[error("Session already finished")]
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Playing,
    Finished,
}

/// Running delay samples for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CadenceTracker {
    pub last_keystroke_at: Option<DateTime<Utc>>,
    pub last_word_boundary_at: Option<DateTime<Utc>>,
    pub max_key_delay_ms: u64,
    pub max_word_delay_ms: u64,
}

fn millis_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> u64 {
    (later - earlier).num_milliseconds().max(0) as u64
}

impl CadenceTracker {
    fn start(&mut self, now: DateTime<Utc>) {
        self.last_keystroke_at = Some(now);
        self.last_word_boundary_at = Some(now);
    }

    /// One sample per update, however many characters it inserted.
    pub fn record_keystroke(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.last_keystroke_at {
            self.max_key_delay_ms = self.max_key_delay_ms.max(millis_between(last, now));
        }
        self.last_keystroke_at = Some(now);
    }

    pub fn record_word_boundary(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.last_word_boundary_at {
            self.max_word_delay_ms = self.max_word_delay_ms.max(millis_between(last, now));
        }
        self.last_word_boundary_at = Some(now);
    }
}

/// What happened to an accepted input update.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Nothing typed yet; the session is still idle.
    Ignored,
    Progress,
    Finished(SessionMetrics),
}

#[derive(Debug, Clone)]
pub struct Session {
    challenge: Challenge,
    target_len: usize,
    input: String,
    status: SessionStatus,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    cadence: CadenceTracker,
    metrics: Option<SessionMetrics>,
}

impl Session {
    pub fn new(challenge: Challenge) -> Result<Self, SessionError> {
        let target_len = challenge.content.chars().count();
        if target_len == 0 {
            return Err(SessionError::EmptyTarget);
        }
        Ok(Self {
            challenge,
            target_len,
            input: String::new(),
            status: SessionStatus::Idle,
            started_at: None,
            finished_at: None,
            cadence: CadenceTracker::default(),
            metrics: None,
        })
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn target(&self) -> &str {
        &self.challenge.content
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn cadence(&self) -> &CadenceTracker {
        &self.cadence
    }

    /// Metrics of a finished session.
    pub fn metrics(&self) -> Option<&SessionMetrics> {
        self.metrics.as_ref()
    }

    /// Apply the full current contents of the input field at time `now`.
    pub fn record_input(
        &mut self,
        now: DateTime<Utc>,
        new_input: &str,
    ) -> Result<InputOutcome, SessionError> {
        match self.status {
            SessionStatus::Finished => return Err(SessionError::Finished),
            SessionStatus::Idle if new_input.is_empty() => return Ok(InputOutcome::Ignored),
            SessionStatus::Idle => {
                self.status = SessionStatus::Playing;
                self.started_at = Some(now);
                self.cadence.start(now);
            }
            SessionStatus::Playing => {}
        }

        let grew = new_input.chars().count() > self.input.chars().count();
        if grew {
            self.cadence.record_keystroke(now);
        }
        if ends_with_whitespace(new_input) && !ends_with_whitespace(&self.input) {
            self.cadence.record_word_boundary(now);
        }
        self.input.clear();
        self.input.push_str(new_input);

        if self.input.chars().count() >= self.target_len {
            return Ok(InputOutcome::Finished(self.finish(now)));
        }
        Ok(InputOutcome::Progress)
    }

    fn finish(&mut self, now: DateTime<Utc>) -> SessionMetrics {
        let elapsed_ms = self
            .started_at
            .map(|start| millis_between(start, now))
            .unwrap_or(0);
        let metrics = scoring::score(&ScoringInput {
            target: &self.challenge.content,
            input: &self.input,
            elapsed_ms,
            max_key_delay_ms: self.cadence.max_key_delay_ms,
            max_word_delay_ms: self.cadence.max_word_delay_ms,
        });
        self.status = SessionStatus::Finished;
        self.finished_at = Some(now);
        self.metrics = Some(metrics.clone());
        metrics
    }

    /// Discard all captured state for a fresh attempt.
    ///
    /// Randomized categories draw a new text, avoiding the current one when
    /// possible; the daily text follows `today`; custom keeps its text.
    pub fn reset<R: Rng + ?Sized>(&mut self, today: NaiveDate, rng: &mut R) {
        if let Some(next) =
            catalog::pick_next(self.challenge.category, &self.challenge.content, today, rng)
        {
            self.target_len = next.content.chars().count();
            self.challenge = next;
        }
        self.input.clear();
        self.status = SessionStatus::Idle;
        self.started_at = None;
        self.finished_at = None;
        self.cadence = CadenceTracker::default();
        self.metrics = None;
    }
}

/// One line of a recorded keystroke log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputEvent {
    /// Milliseconds since the recording began.
    pub offset_ms: u64,
    /// Full contents of the input field at that moment.
    pub input: String,
}

/// Load a recorded keystroke log, one [`InputEvent`] per line. Any
/// malformed line fails the whole load so a damaged log is never scored.
pub fn load_log(path: &Path) -> Result<Vec<InputEvent>, StorageError> {
    JsonlReader::new(path.to_path_buf()).read_all_strict()
}

/// Feed a recorded log through `session`, with offsets relative to `start`.
///
/// Events after the session finishes are ignored. Returns the metrics if the
/// log reached the end of the target.
pub fn replay(
    session: &mut Session,
    start: DateTime<Utc>,
    events: &[InputEvent],
) -> Result<Option<SessionMetrics>, SessionError> {
    for event in events {
        let now = start + chrono::Duration::milliseconds(event.offset_ms as i64);
        if let InputOutcome::Finished(metrics) = session.record_input(now, &event.input)? {
            return Ok(Some(metrics));
        }
    }
    Ok(None)
}

fn ends_with_whitespace(s: &str) -> bool {
    s.chars().last().is_some_and(char::is_whitespace)
}
