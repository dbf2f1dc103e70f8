// src/timer.rs

//! Exam attempt lifecycle: duration parsing, start-time persistence and
//! recovery after reload, the one-second countdown, and lateness.
//!
//! The persisted start lives in a `KeyValueStore` under
//! `exam_start_<examId>`, scoped to the student's NISN. Remaining time is
//! always recomputed from that timestamp, so a reload never resets the clock.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::store::{KeyValueStore, StoreError, StoreResult};

/// Used when a duration string holds no usable number: 120 minutes.
pub const FALLBACK_DURATION_SECS: i64 = 7200;

/// Remaining time below which the client shows the low-time indicator.
pub const LOW_TIME_THRESHOLD_SECS: i64 = 600;

/// Developer-tool shortcuts the browser suppresses during an attempt.
/// Cosmetic only: nothing here is enforced server-side.
pub const SUPPRESSED_SHORTCUTS: &[&str] = &["F12", "Ctrl+Shift+I", "Ctrl+Shift+J", "Ctrl+Shift+C", "Ctrl+U"];

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Parses "120 Menit", "2 Jam" or a bare "90" into seconds.
///
/// The first run of digits is the amount; "jam" anywhere (case-insensitive)
/// means hours, anything else means minutes.
pub fn parse_duration_secs(raw: &str) -> i64 {
    let Some(amount) = DIGITS
        .find(raw)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .filter(|n| *n > 0)
    else {
        return FALLBACK_DURATION_SECS;
    };

    let unit = if raw.to_lowercase().contains("jam") { 3600 } else { 60 };
    amount.checked_mul(unit).unwrap_or(FALLBACK_DURATION_SECS)
}

/// Key under which an attempt's start timestamp (epoch millis) is kept.
pub fn exam_start_key(exam_id: Uuid) -> String {
    format!("exam_start_{}", exam_id)
}

/// `HH:MM:SS`; hours are not wrapped.
pub fn format_hms(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// What the browser is asked to do while an attempt is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientGuards {
    /// Native "confirm leave" prompt on unload. Best-effort.
    pub confirm_before_unload: bool,
    pub suppress_context_menu: bool,
    pub suppressed_shortcuts: Vec<&'static str>,
    /// Always false: the guards are a deterrent, not a security boundary.
    pub enforced: bool,
}

impl ClientGuards {
    fn for_attempt() -> Self {
        Self {
            confirm_before_unload: true,
            suppress_context_menu: true,
            suppressed_shortcuts: SUPPRESSED_SHORTCUTS.to_vec(),
            enforced: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptState {
    pub started: bool,
    pub agreed_to_rules: bool,
    /// Epoch millis of rule acceptance.
    pub start_timestamp: Option<i64>,
    pub total_seconds: i64,
    pub remaining_seconds: i64,
    pub low_time: bool,
    /// Present only while started and not submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guards: Option<ClientGuards>,
}

impl AttemptState {
    /// Computes the state from the total duration and the persisted start.
    /// The remaining time is `max(0, total - (now - start))`; a start in the
    /// future counts as no time elapsed.
    pub fn recover(total_seconds: i64, start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(start) = start else {
            return Self {
                started: false,
                agreed_to_rules: false,
                start_timestamp: None,
                total_seconds,
                remaining_seconds: total_seconds,
                low_time: total_seconds < LOW_TIME_THRESHOLD_SECS,
                guards: None,
            };
        };

        let elapsed = (now - start).num_seconds().max(0);
        let remaining = total_seconds.saturating_sub(elapsed).max(0);

        Self {
            started: true,
            agreed_to_rules: true,
            start_timestamp: Some(start.timestamp_millis()),
            total_seconds,
            remaining_seconds: remaining,
            low_time: remaining < LOW_TIME_THRESHOLD_SECS,
            guards: Some(ClientGuards::for_attempt()),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.started && self.remaining_seconds <= 0
    }

    /// A submission is late iff no time remains at the moment of submit.
    /// Without a recorded start the full duration is still available.
    pub fn is_late(&self) -> bool {
        self.is_expired()
    }
}

/// Reads and writes attempt start timestamps for one student.
pub struct AttemptClock<'a> {
    kv: &'a dyn KeyValueStore,
    nisn: &'a str,
}

impl<'a> AttemptClock<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, nisn: &'a str) -> Self {
        Self { kv, nisn }
    }

    async fn start_of(&self, exam_id: Uuid) -> StoreResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.kv.get(self.nisn, &exam_start_key(exam_id)).await? else {
            return Ok(None);
        };
        let millis: i64 = raw
            .parse()
            .map_err(|_| StoreError::Backend(format!("corrupt start timestamp '{}'", raw)))?;
        Ok(Utc.timestamp_millis_opt(millis).single())
    }

    /// Current state of the attempt; never creates one.
    pub async fn state(&self, exam_id: Uuid, duration: &str, now: DateTime<Utc>) -> StoreResult<AttemptState> {
        let start = self.start_of(exam_id).await?;
        Ok(AttemptState::recover(parse_duration_secs(duration), start, now))
    }

    /// Persists `start = now` on first acceptance. Accepting again keeps the
    /// original start so a reload cannot buy extra time.
    pub async fn accept_rules(&self, exam_id: Uuid, duration: &str, now: DateTime<Utc>) -> StoreResult<AttemptState> {
        let start = match self.start_of(exam_id).await? {
            Some(existing) => existing,
            None => {
                self.kv
                    .set(self.nisn, &exam_start_key(exam_id), &now.timestamp_millis().to_string())
                    .await?;
                tracing::info!("Attempt started: nisn={} exam={}", self.nisn, exam_id);
                now
            }
        };
        Ok(AttemptState::recover(parse_duration_secs(duration), Some(start), now))
    }

    /// Forgets the start timestamp. Clearing an absent key is a no-op.
    pub async fn clear(&self, exam_id: Uuid) -> StoreResult<()> {
        self.kv.remove(self.nisn, &exam_start_key(exam_id)).await
    }
}

/// A running one-second countdown. Dropping it cancels the task.
pub struct Countdown {
    rx: watch::Receiver<i64>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Starts ticking down from `remaining`. Values never go below zero and
    /// the task stops on reaching it.
    pub fn spawn(remaining: i64) -> Self {
        let remaining = remaining.max(0);
        let (tx, rx) = watch::channel(remaining);

        let task = tokio::spawn(async move {
            if remaining == 0 {
                return;
            }
            let period = Duration::from_secs(1);
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            let mut left = remaining;
            while left > 0 {
                interval.tick().await;
                left -= 1;
                if tx.send(left).is_err() {
                    break;
                }
            }
        });

        Self { rx, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.rx.clone()
    }

    pub fn remaining(&self) -> i64 {
        *self.rx.borrow()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}
