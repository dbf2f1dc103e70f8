// src/handlers/live.rs

//! WebSocket transport for the live rooms, plus the HTTP monitor endpoints.
//!
//! Browsers cannot set headers on a WebSocket handshake, so the socket routes
//! take the JWT as a `token` query parameter.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    live::{AttemptChange, LiveError, LiveHub, Presence, RoomEvent, StudentUpdate, Warning, filter_active},
    state::AppState,
    timer::{AttemptClock, AttemptState, Countdown, LOW_TIME_THRESHOLD_SECS, format_hms, parse_duration_secs},
    utils::jwt::{Claims, Role, verify_jwt},
};

#[derive(Debug, Deserialize)]
pub struct SocketAuth {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerFrame {
    pub remaining_seconds: i64,
    pub display: String,
    pub low_time: bool,
}

impl TimerFrame {
    fn new(remaining_seconds: i64) -> Self {
        Self {
            remaining_seconds,
            display: format_hms(remaining_seconds),
            low_time: remaining_seconds < LOW_TIME_THRESHOLD_SECS,
        }
    }
}

/// Frames pushed to a student socket. `submitted` is the last frame before
/// the server closes the socket.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "lowercase")]
enum StudentFrame {
    Warning(Warning),
    Timer(TimerFrame),
    Submitted,
}

/// Frames a monitor may send up its socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "lowercase")]
enum MonitorCommand {
    Warning(Warning),
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "lowercase")]
enum MonitorReply {
    Error { message: String },
}

fn socket_claims(state: &AppState, auth: &SocketAuth, role: Role) -> Result<Claims, AppError> {
    let claims = verify_jwt(&auth.token, &state.config.jwt_secret)?;
    claims.require(role)?;
    Ok(claims)
}

/// Sends a JSON frame. `false` means the socket is gone.
async fn send_json<T: Serialize>(socket: &mut WebSocket, frame: &T) -> bool {
    match serde_json::to_string(frame) {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to encode live frame: {:?}", e);
            true
        }
    }
}

/// Student socket: tracks presence, relays warnings and ticks the timer.
///
/// The countdown follows the attempt: it starts when the student accepts the
/// rules (possibly after the socket opened) and the socket closes on submit.
pub async fn student_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
    Query(auth): Query<SocketAuth>,
) -> Result<Response, AppError> {
    let claims = socket_claims(&state, &auth, Role::Student)?;
    let exam = state
        .session()
        .exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Soal tidak ditemukan.".to_string()))?;

    Ok(ws.on_upgrade(move |socket| run_student_socket(socket, state, exam_id, exam.duration, claims)))
}

async fn run_student_socket(
    mut socket: WebSocket,
    state: AppState,
    exam_id: Uuid,
    duration: String,
    claims: Claims,
) {
    let presence = Presence {
        nisn: claims.sub.clone(),
        name: claims.name.clone(),
        class: claims.class.clone().unwrap_or_default(),
        online_at: chrono::Utc::now(),
    };
    // Join before reading the attempt so a start in between is not missed.
    let mut session = state.hub.join_as_student(exam_id, presence);

    let attempt = match AttemptClock::new(state.kv.as_ref(), &claims.sub)
        .state(exam_id, &duration, chrono::Utc::now())
        .await
    {
        Ok(attempt) => attempt,
        Err(e) => {
            tracing::warn!("Failed to read attempt for {}: {}", claims.sub, e);
            AttemptState::recover(parse_duration_secs(&duration), None, chrono::Utc::now())
        }
    };

    // Only a started attempt counts down.
    let mut countdown = attempt
        .started
        .then(|| Countdown::spawn(attempt.remaining_seconds));
    let mut timer_rx = countdown.as_ref().map(Countdown::subscribe);

    if !send_json(&mut socket, &StudentFrame::Timer(TimerFrame::new(attempt.remaining_seconds))).await {
        return;
    }

    loop {
        tokio::select! {
            update = session.next_update() => {
                let frame = match update {
                    Some(StudentUpdate::Warning(warning)) => StudentFrame::Warning(warning),
                    Some(StudentUpdate::Attempt(AttemptChange::Started { remaining_seconds })) => {
                        let restarted = Countdown::spawn(remaining_seconds);
                        timer_rx = Some(restarted.subscribe());
                        countdown = Some(restarted);
                        StudentFrame::Timer(TimerFrame::new(remaining_seconds))
                    }
                    Some(StudentUpdate::Attempt(AttemptChange::Submitted)) => {
                        let _ = send_json(&mut socket, &StudentFrame::Submitted).await;
                        break;
                    }
                    None => break,
                };
                if !send_json(&mut socket, &frame).await {
                    break;
                }
            }
            changed = async {
                match timer_rx.as_mut() {
                    Some(rx) => rx.changed().await.map(|_| *rx.borrow_and_update()),
                    None => std::future::pending().await,
                }
            } => {
                match changed {
                    Ok(remaining) => {
                        if !send_json(&mut socket, &StudentFrame::Timer(TimerFrame::new(remaining))).await {
                            break;
                        }
                    }
                    // Countdown reached zero; no auto-submit.
                    Err(_) => timer_rx = None,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Student socket error for {}: {}", claims.sub, e);
                        break;
                    }
                    // Acknowledgements and pings need no reply beyond axum's own.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Leave the room before the client sees the close.
    drop(countdown);
    drop(session);
    let _ = socket.send(Message::Close(None)).await;
}

/// Monitor socket: presence events in, warnings out.
pub async fn teacher_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
    Query(auth): Query<SocketAuth>,
) -> Result<Response, AppError> {
    socket_claims(&state, &auth, Role::Teacher)?;
    state
        .session()
        .exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Soal tidak ditemukan.".to_string()))?;

    let hub = Arc::clone(&state.hub);
    Ok(ws.on_upgrade(move |socket| run_teacher_socket(socket, hub, exam_id)))
}

async fn run_teacher_socket(mut socket: WebSocket, hub: Arc<LiveHub>, exam_id: Uuid) {
    let mut monitor = hub.join_as_teacher(exam_id);

    loop {
        tokio::select! {
            event = monitor.next_event() => {
                let Some(event) = event else { break };
                if !send_json(&mut socket, &RoomEvent::Presence(event)).await {
                    break;
                }
            }
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Monitor socket error: {}", e);
                        break;
                    }
                    Some(Ok(_)) => continue,
                };

                let reply = match serde_json::from_str::<MonitorCommand>(text.as_str()) {
                    Ok(MonitorCommand::Warning(w)) => monitor
                        .send_warning(&w.message, w.target_nisn.as_deref())
                        .err()
                        .map(|e| e.to_string()),
                    Err(e) => Some(format!("Perintah tidak dikenal: {}", e)),
                };
                if let Some(message) = reply {
                    if !send_json(&mut socket, &MonitorReply::Error { message }).await {
                        break;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MonitorParams {
    pub q: Option<String>,
}

/// Snapshot of the active students for polling clients.
pub async fn monitor_snapshot(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
    Query(params): Query<MonitorParams>,
) -> Result<impl IntoResponse, AppError> {
    let exam = state
        .session()
        .exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Soal tidak ditemukan.".to_string()))?;

    let active = state.hub.active_students(exam_id);
    let shown = filter_active(&active, params.q.as_deref());

    Ok(Json(serde_json::json!({
        "exam": exam,
        "room": crate::live::room_name(exam_id),
        "activeCount": active.len(),
        "activeStudents": shown,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningRequest {
    pub message: String,
    #[serde(default)]
    pub target_nisn: Option<String>,
}

/// Broadcasts a warning to all active students or to one NISN.
pub async fn send_warning(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<WarningRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .session()
        .exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Soal tidak ditemukan.".to_string()))?;

    let target = payload
        .target_nisn
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    state
        .hub
        .send_warning(exam_id, &payload.message, target)
        .map_err(|e| match e {
            LiveError::EmptyMessage => AppError::BadRequest(e.to_string()),
        })?;

    let active = state.hub.active_students(exam_id);
    let recipients = match target {
        Some(nisn) => active.iter().filter(|s| s.nisn == nisn).count(),
        None => active.len(),
    };

    Ok(Json(serde_json::json!({
        "sent": true,
        "recipients": recipients,
    })))
}
