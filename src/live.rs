// src/live.rs

//! Per-exam live rooms: presence for students, presence snapshots and
//! warning broadcasts for teachers.
//!
//! Each room `exam-<examId>` is a `broadcast` channel plus a presence table
//! keyed by NISN. The teacher's active list is replaced wholesale by every
//! `sync` event; `join` and `leave` are informational and are never applied
//! on their own. Nothing here is on the submission or grading path: a lagged
//! or closed subscription just ends live monitoring for that client.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

const ROOM_CAPACITY: usize = 64;

pub fn room_name(exam_id: Uuid) -> String {
    format!("exam-{}", exam_id)
}

/// What a student publishes when joining a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub nisn: String,
    pub name: String,
    pub class: String,
    pub online_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub message: String,
    /// `None` addresses every active student.
    pub target_nisn: Option<String>,
}

impl Warning {
    pub fn is_for(&self, nisn: &str) -> bool {
        self.target_nisn.as_deref().is_none_or(|target| target == nisn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PresenceEvent {
    /// Full snapshot, sorted by name.
    Sync { students: Vec<Presence> },
    Join { key: String, presence: Presence },
    Leave { key: String, presence: Presence },
}

/// Messages carried by a room, in wire shape
/// `{ "event": "...", "payload": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "lowercase")]
pub enum RoomEvent {
    Warning(Warning),
    Presence(PresenceEvent),
}

/// Attempt lifecycle changes for one student, relayed to that student's
/// open connections so their countdowns follow the HTTP calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptChange {
    Started { remaining_seconds: i64 },
    Submitted,
}

/// What travels through a room's channel. Only `Event` is ever put on the wire.
#[derive(Debug, Clone)]
enum RoomMessage {
    Event(RoomEvent),
    Attempt { nisn: String, change: AttemptChange },
}

/// What a student connection reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentUpdate {
    Warning(Warning),
    Attempt(AttemptChange),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LiveError {
    #[error("Pesan peringatan tidak boleh kosong.")]
    EmptyMessage,
}

struct Tracked {
    presence: Presence,
    /// Open connections for this NISN; the entry goes away at zero.
    connections: usize,
}

struct Room {
    tx: broadcast::Sender<RoomMessage>,
    presence: HashMap<String, Tracked>,
    monitors: usize,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(ROOM_CAPACITY);
        Self {
            tx,
            presence: HashMap::new(),
            monitors: 0,
        }
    }

    fn snapshot(&self) -> Vec<Presence> {
        let mut students: Vec<Presence> = self.presence.values().map(|t| t.presence.clone()).collect();
        sort_by_name(&mut students);
        students
    }

    fn publish(&self, event: RoomEvent) -> usize {
        // No subscribers is not an error.
        self.tx.send(RoomMessage::Event(event)).unwrap_or(0)
    }

    fn publish_sync(&self) {
        self.publish(RoomEvent::Presence(PresenceEvent::Sync {
            students: self.snapshot(),
        }));
    }

    fn is_idle(&self) -> bool {
        self.presence.is_empty() && self.monitors == 0
    }
}

pub fn sort_by_name(students: &mut [Presence]) {
    students.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.nisn.cmp(&b.nisn))
    });
}

/// Monitor search: name contains the query (case-insensitive) or NISN does.
pub fn filter_active(students: &[Presence], query: Option<&str>) -> Vec<Presence> {
    let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return students.to_vec();
    };
    let lowered = q.to_lowercase();
    students
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&lowered) || s.nisn.contains(q))
        .cloned()
        .collect()
}

/// Registry of live rooms.
#[derive(Default)]
pub struct LiveHub {
    rooms: Mutex<HashMap<String, Room>>,
}

impl LiveHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, Room>> {
        self.rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Student role: track presence and listen for warnings.
    pub fn join_as_student(self: &Arc<Self>, exam_id: Uuid, presence: Presence) -> StudentSession {
        let room_key = room_name(exam_id);
        let nisn = presence.nisn.clone();

        let rx = {
            let mut rooms = self.rooms();
            let room = rooms.entry(room_key.clone()).or_insert_with(Room::new);
            let rx = room.tx.subscribe();

            match room.presence.get_mut(&nisn) {
                Some(tracked) => {
                    tracked.connections += 1;
                    tracked.presence = presence;
                }
                None => {
                    room.presence.insert(
                        nisn.clone(),
                        Tracked {
                            presence: presence.clone(),
                            connections: 1,
                        },
                    );
                    room.publish(RoomEvent::Presence(PresenceEvent::Join {
                        key: nisn.clone(),
                        presence,
                    }));
                }
            }
            room.publish_sync();
            rx
        };

        tracing::info!("Student {} joined {}", nisn, room_key);

        StudentSession {
            hub: Arc::clone(self),
            room: room_key,
            nisn,
            rx,
        }
    }

    /// Teacher role: subscribe without tracking presence.
    pub fn join_as_teacher(self: &Arc<Self>, exam_id: Uuid) -> TeacherSession {
        let room_key = room_name(exam_id);
        let (rx, snapshot) = {
            let mut rooms = self.rooms();
            let room = rooms.entry(room_key.clone()).or_insert_with(Room::new);
            room.monitors += 1;
            (room.tx.subscribe(), room.snapshot())
        };

        tracing::info!("Monitor joined {}", room_key);

        TeacherSession {
            hub: Arc::clone(self),
            exam_id,
            rx,
            active: Vec::new(),
            initial: Some(snapshot),
        }
    }

    /// Current snapshot of the room's active students, sorted by name.
    pub fn active_students(&self, exam_id: Uuid) -> Vec<Presence> {
        self.rooms()
            .get(&room_name(exam_id))
            .map(Room::snapshot)
            .unwrap_or_default()
    }

    /// Broadcasts a warning. Returns the number of subscribers reached
    /// (teachers included); zero when nobody is connected.
    pub fn send_warning(
        &self,
        exam_id: Uuid,
        message: &str,
        target_nisn: Option<&str>,
    ) -> Result<usize, LiveError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(LiveError::EmptyMessage);
        }
        let target_nisn = target_nisn
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);

        let rooms = self.rooms();
        let Some(room) = rooms.get(&room_name(exam_id)) else {
            return Ok(0);
        };

        tracing::info!(
            "Warning to {} in exam-{}",
            target_nisn.as_deref().unwrap_or("all"),
            exam_id
        );
        Ok(room.publish(RoomEvent::Warning(Warning {
            message: message.to_string(),
            target_nisn,
        })))
    }

    /// The student accepted the rules (or resumed); their connections start
    /// counting down from `remaining_seconds`.
    pub fn attempt_started(&self, exam_id: Uuid, nisn: &str, remaining_seconds: i64) {
        self.notify_attempt(exam_id, nisn, AttemptChange::Started { remaining_seconds });
    }

    /// The student submitted; their connections stop the countdown and leave.
    pub fn attempt_submitted(&self, exam_id: Uuid, nisn: &str) {
        self.notify_attempt(exam_id, nisn, AttemptChange::Submitted);
    }

    fn notify_attempt(&self, exam_id: Uuid, nisn: &str, change: AttemptChange) {
        let rooms = self.rooms();
        let Some(room) = rooms.get(&room_name(exam_id)) else {
            return;
        };
        tracing::debug!("Attempt {:?} for {} in exam-{}", change, nisn, exam_id);
        let _ = room.tx.send(RoomMessage::Attempt {
            nisn: nisn.to_string(),
            change,
        });
    }

    fn untrack(&self, room_key: &str, nisn: &str) {
        let mut rooms = self.rooms();
        let Some(room) = rooms.get_mut(room_key) else {
            return;
        };

        let left = match room.presence.get(nisn).map(|t| t.connections) {
            Some(n) if n > 1 => {
                if let Some(tracked) = room.presence.get_mut(nisn) {
                    tracked.connections -= 1;
                }
                None
            }
            Some(_) => room.presence.remove(nisn).map(|t| t.presence),
            None => None,
        };

        if let Some(presence) = left {
            room.publish(RoomEvent::Presence(PresenceEvent::Leave {
                key: nisn.to_string(),
                presence,
            }));
            room.publish_sync();
            tracing::info!("Student {} left {}", nisn, room_key);
        }

        Self::drop_if_idle(&mut rooms, room_key);
    }

    fn release_monitor(&self, room_key: &str) {
        let mut rooms = self.rooms();
        if let Some(room) = rooms.get_mut(room_key) {
            room.monitors = room.monitors.saturating_sub(1);
        }
        Self::drop_if_idle(&mut rooms, room_key);
    }

    fn drop_if_idle(rooms: &mut HashMap<String, Room>, room_key: &str) {
        if rooms.get(room_key).is_some_and(Room::is_idle) {
            rooms.remove(room_key);
        }
    }
}

/// A student's membership in a room. Dropping it untracks the presence.
pub struct StudentSession {
    hub: Arc<LiveHub>,
    room: String,
    nisn: String,
    rx: broadcast::Receiver<RoomMessage>,
}

impl StudentSession {
    /// Next warning addressed to this student (broadcast or targeted) or
    /// change to this student's attempt. `None` once the room is gone.
    pub async fn next_update(&mut self) -> Option<StudentUpdate> {
        loop {
            match self.rx.recv().await {
                Ok(RoomMessage::Event(RoomEvent::Warning(w))) if w.is_for(&self.nisn) => {
                    return Some(StudentUpdate::Warning(w));
                }
                Ok(RoomMessage::Attempt { nisn, change }) if nisn == self.nisn => {
                    return Some(StudentUpdate::Attempt(change));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Student {} lagged by {} events", self.nisn, skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Like `next_update`, ignoring attempt changes.
    pub async fn next_warning(&mut self) -> Option<Warning> {
        loop {
            match self.next_update().await? {
                StudentUpdate::Warning(w) => return Some(w),
                StudentUpdate::Attempt(_) => continue,
            }
        }
    }
}

impl Drop for StudentSession {
    fn drop(&mut self) {
        self.hub.untrack(&self.room, &self.nisn);
    }
}

/// A teacher's view of a room.
pub struct TeacherSession {
    hub: Arc<LiveHub>,
    exam_id: Uuid,
    rx: broadcast::Receiver<RoomMessage>,
    active: Vec<Presence>,
    initial: Option<Vec<Presence>>,
}

impl TeacherSession {
    /// Next presence event. A `Sync` replaces the active list; after a lag
    /// the session resynchronizes from the hub and reports that as a `Sync`.
    /// Warnings echoed back by the room are skipped.
    pub async fn next_event(&mut self) -> Option<PresenceEvent> {
        if let Some(students) = self.initial.take() {
            self.active = students.clone();
            return Some(PresenceEvent::Sync { students });
        }

        loop {
            match self.rx.recv().await {
                Ok(RoomMessage::Event(RoomEvent::Presence(PresenceEvent::Sync { students }))) => {
                    self.active = students.clone();
                    return Some(PresenceEvent::Sync { students });
                }
                Ok(RoomMessage::Event(RoomEvent::Presence(event))) => return Some(event),
                Ok(RoomMessage::Event(RoomEvent::Warning(_)) | RoomMessage::Attempt { .. }) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Monitor lagged by {} events, resyncing", skipped);
                    let students = self.hub.active_students(self.exam_id);
                    self.active = students.clone();
                    return Some(PresenceEvent::Sync { students });
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Active students as of the last sync.
    pub fn active_students(&self) -> &[Presence] {
        &self.active
    }

    pub fn send_warning(&self, message: &str, target_nisn: Option<&str>) -> Result<usize, LiveError> {
        self.hub.send_warning(self.exam_id, message, target_nisn)
    }
}

impl Drop for TeacherSession {
    fn drop(&mut self) {
        self.hub.release_monitor(&room_name(self.exam_id));
    }
}
