// tests/api_tests.rs

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, Message},
};
use ujian_gto::{
    config::Config,
    live::{LiveHub, Presence},
    models::student::NewStudent,
    routes,
    state::AppState,
    storage::LocalBlobStore,
    store::{DataStore, KeyValueStore, MemoryKv, MemoryStore},
    timer::exam_start_key,
};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

struct TestApp {
    address: String,
    hub: Arc<LiveHub>,
    kv: Arc<MemoryKv>,
    client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn login(&self, role: &str, username: &str, password: &str) -> String {
        let resp: Value = self
            .client
            .post(self.url(&format!("/api/auth/{}/login", role)))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");
        resp["token"].as_str().expect("Token not found").to_string()
    }

    async fn teacher_token(&self) -> String {
        self.login("teacher", "guru", "rahasia").await
    }

    async fn student_token(&self) -> String {
        self.login("student", "0012345678", "0012345678").await
    }

    /// Creates an exam as the teacher and returns its id.
    async fn create_exam(&self, token: &str, duration: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/teacher/exams"))
            .bearer_auth(token)
            .json(&json!({
                "title": "Rangka Atap Baja",
                "description": "<p>Modelkan rangka atap.</p><script>alert(1)</script>",
                "duration": duration,
            }))
            .send()
            .await
            .expect("Create exam failed");
        assert_eq!(resp.status().as_u16(), 201);

        let exams: Vec<Value> = resp.json().await.unwrap();
        exams[0]["id"].as_str().unwrap().to_string()
    }

    async fn connect(&self, role: &str, exam_id: &str, token: &str) -> Result<Socket, WsError> {
        let url = format!(
            "{}/api/live/exams/{}/{}?token={}",
            self.address.replacen("http://", "ws://", 1),
            exam_id,
            role,
            token
        );
        connect_async(url).await.map(|(socket, _)| socket)
    }
}

/// Next JSON frame, or `None` once the server closed the socket.
async fn next_frame(socket: &mut Socket) -> Option<Value> {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(3), socket.next())
            .await
            .expect("no frame within 3s")?;
        match message.ok()? {
            Message::Text(text) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// Spawns the app on a random port with the in-memory stores.
/// Seeds one teacher (guru / rahasia) and two students.
async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_teacher("guru", "rahasia", "Bu Sari")
        .await
        .expect("Failed to seed teacher");
    store
        .insert_students(vec![
            NewStudent {
                name: "Andi Pratama".to_string(),
                nisn: "0012345678".to_string(),
                class: "XI TGB 1".to_string(),
            },
            NewStudent {
                name: "Budi Santoso".to_string(),
                nisn: "0087654321".to_string(),
                class: "XI TGB 2".to_string(),
            },
        ])
        .await
        .expect("Failed to seed students");

    let upload_dir = std::env::temp_dir().join(format!("ujian-gto-test-{}", uuid::Uuid::new_v4()));
    let config = Config::for_tests("test_secret_for_integration_tests", upload_dir.clone());
    let hub = LiveHub::new();
    let kv = Arc::new(MemoryKv::new());

    let state = AppState {
        store,
        kv: kv.clone(),
        blobs: Arc::new(LocalBlobStore::new(upload_dir, config.public_base_url.clone())),
        hub: hub.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        hub,
        kv,
        client: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn student_login_uses_nisn_as_password() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/auth/student/login"))
        .json(&json!({ "username": "0012345678", "password": "0012345678" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["type"], "Bearer");
    assert_eq!(body["user"]["name"], "Andi Pratama");
    assert_eq!(body["user"]["class"], "XI TGB 1");
    assert_eq!(body["user"]["role"], "student");
}

#[tokio::test]
async fn student_login_failures() {
    let app = spawn_app().await;

    let wrong_password = app
        .client
        .post(app.url("/api/auth/student/login"))
        .json(&json!({ "username": "0012345678", "password": "12345" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_password.status().as_u16(), 401);

    let unknown = app
        .client
        .post(app.url("/api/auth/student/login"))
        .json(&json!({ "username": "9999999999", "password": "9999999999" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 401);
    let body: Value = unknown.json().await.unwrap();
    assert_eq!(body["error"], "NISN tidak terdaftar.");
}

#[tokio::test]
async fn teacher_login_and_role_guard() {
    let app = spawn_app().await;

    let bad = app
        .client
        .post(app.url("/api/auth/teacher/login"))
        .json(&json!({ "username": "guru", "password": "salah" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 401);

    let student = app.student_token().await;
    let forbidden = app
        .client
        .get(app.url("/api/teacher/submissions"))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let anonymous = app
        .client
        .get(app.url("/api/exams"))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let teacher = app.teacher_token().await;
    let ok = app
        .client
        .get(app.url("/api/teacher/submissions"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status().as_u16(), 200);
}

#[tokio::test]
async fn exam_description_is_sanitized_and_duration_normalized() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;
    let exam_id = app.create_exam(&teacher, "120").await;

    let student = app.student_token().await;
    let exam: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(exam["duration"], "120 Menit");
    assert_eq!(exam["status"], "Aktif");
    let description = exam["description"].as_str().unwrap();
    assert!(description.contains("Modelkan rangka atap."));
    assert!(!description.contains("<script>"));
}

#[tokio::test]
async fn attempt_submit_and_grade_flow() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;
    let student = app.student_token().await;
    let exam_id = app.create_exam(&teacher, "120 Menit").await;

    // Before accepting the rules nothing counts down
    let before: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}/attempt", exam_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before["started"], false);
    assert_eq!(before["totalSeconds"], 7200);

    let started: Value = app
        .client
        .post(app.url(&format!("/api/exams/{}/attempt", exam_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(started["started"], true);
    assert!(started["startTimestamp"].is_i64());
    assert!(started["remainingSeconds"].as_i64().unwrap() > 7190);

    // Reloading resumes from the same start
    let resumed: Value = app
        .client
        .post(app.url(&format!("/api/exams/{}/attempt", exam_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resumed["startTimestamp"], started["startTimestamp"]);

    let invalid = app
        .client
        .post(app.url(&format!("/api/exams/{}/submissions", exam_id)))
        .bearer_auth(&student)
        .json(&json!({ "onshapeLink": "https://example.com/documents/abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status().as_u16(), 400);

    let link = "https://cad.onshape.com/documents/0123456789abcdef";
    let submitted = app
        .client
        .post(app.url(&format!("/api/exams/{}/submissions", exam_id)))
        .bearer_auth(&student)
        .json(&json!({ "onshapeLink": link }))
        .send()
        .await
        .unwrap();
    assert_eq!(submitted.status().as_u16(), 201);
    let submission: Value = submitted.json().await.unwrap();
    assert_eq!(submission["status"], "pending");
    assert_eq!(submission["isLate"], false);
    assert_eq!(submission["nis"], "0012345678");
    assert_eq!(submission["examTitle"], "Rangka Atap Baja");
    let submission_id = submission["id"].as_str().unwrap().to_string();

    // Submitting clears the stored start
    let cleared: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}/attempt", exam_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["started"], false);

    let again = app
        .client
        .post(app.url(&format!("/api/exams/{}/submissions", exam_id)))
        .bearer_auth(&student)
        .json(&json!({ "onshapeLink": link }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);

    let out_of_range = app
        .client
        .put(app.url(&format!("/api/teacher/submissions/{}/grade", submission_id)))
        .bearer_auth(&teacher)
        .json(&json!({ "criteria": { "dimension": 41, "efficiency": 35, "aesthetics": 20 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(out_of_range.status().as_u16(), 400);

    let graded: Value = app
        .client
        .put(app.url(&format!("/api/teacher/submissions/{}/grade", submission_id)))
        .bearer_auth(&teacher)
        .json(&json!({
            "criteria": { "dimension": 40, "efficiency": 35, "aesthetics": 20 },
            "feedback": "  Rapi, perhatikan efisiensi.  "
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(graded["status"], "graded");
    assert_eq!(graded["score"], 95);
    assert_eq!(graded["feedback"], "Rapi, perhatikan efisiensi.");

    let stats: Value = app
        .client
        .get(app.url("/api/teacher/submissions/stats"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["graded"], 1);
    assert_eq!(stats["pending"], 0);

    let mine: Vec<Value> = app
        .client
        .get(app.url("/api/student/submissions"))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["score"], 95);
}

#[tokio::test]
async fn import_rejects_duplicates_without_partial_insert() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;

    let resp = app
        .client
        .post(app.url("/api/teacher/students/import"))
        .bearer_auth(&teacher)
        .json(&json!({
            "rows": [
                { "Nama": "Citra Lestari", "NISN": "0011111111", "Kelas": "XI TGB 1" },
                { "Nama": "Andi Pratama", "NISN": "0012345678", "Kelas": "XI TGB 1" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let students: Vec<Value> = app
        .client
        .get(app.url("/api/teacher/students"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(students.len(), 2);
}

#[tokio::test]
async fn import_skips_incomplete_rows() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;

    let resp = app
        .client
        .post(app.url("/api/teacher/students/import"))
        .bearer_auth(&teacher)
        .json(&json!({
            "csv": "Nama,NISN,Kelas\nCitra Lestari,0011111111,XI TGB 1\nDewi,,XI TGB 2\n"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["imported"], 1);
    assert_eq!(body["students"].as_array().unwrap().len(), 3);

    let empty = app
        .client
        .post(app.url("/api/teacher/students/import"))
        .bearer_auth(&teacher)
        .json(&json!({ "rows": [ { "Nama": "Tanpa NISN" } ] }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status().as_u16(), 400);
}

#[tokio::test]
async fn monitor_lists_active_students_and_sends_warnings() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;
    let exam_id = app.create_exam(&teacher, "90 Menit").await;
    let exam_uuid: uuid::Uuid = exam_id.parse().unwrap();

    let mut session = app.hub.join_as_student(
        exam_uuid,
        Presence {
            nisn: "0012345678".to_string(),
            name: "Andi Pratama".to_string(),
            class: "XI TGB 1".to_string(),
            online_at: chrono::Utc::now(),
        },
    );

    let monitor: Value = app
        .client
        .get(app.url(&format!("/api/teacher/exams/{}/monitor", exam_id)))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(monitor["room"], format!("exam-{}", exam_id));
    assert_eq!(monitor["activeStudents"].as_array().unwrap().len(), 1);
    assert_eq!(monitor["activeStudents"][0]["nisn"], "0012345678");

    let empty = app
        .client
        .post(app.url(&format!("/api/teacher/exams/{}/warnings", exam_id)))
        .bearer_auth(&teacher)
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status().as_u16(), 400);

    let sent: Value = app
        .client
        .post(app.url(&format!("/api/teacher/exams/{}/warnings", exam_id)))
        .bearer_auth(&teacher)
        .json(&json!({ "message": "Jangan membuka tab lain!", "targetNisn": "0012345678" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sent["recipients"], 1);

    let warning = session.next_warning().await.expect("warning not delivered");
    assert_eq!(warning.message, "Jangan membuka tab lain!");
    assert_eq!(warning.target_nisn.as_deref(), Some("0012345678"));
}

#[tokio::test]
async fn blueprint_upload_is_served_back() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;

    let resp = app
        .client
        .put(app.url("/api/teacher/blueprints/denah-1.png"))
        .bearer_auth(&teacher)
        .body(vec![0x89, b'P', b'N', b'G'])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.unwrap();
    assert!(body["url"].as_str().unwrap().ends_with("/files/blueprints/denah-1.png"));

    let conflict = app
        .client
        .put(app.url("/api/teacher/blueprints/denah-1.png"))
        .bearer_auth(&teacher)
        .body(vec![1, 2, 3])
        .send()
        .await
        .unwrap();
    assert_eq!(conflict.status().as_u16(), 409);

    let served = app
        .client
        .get(app.url("/files/blueprints/denah-1.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(served.status().as_u16(), 200);
    assert_eq!(served.bytes().await.unwrap().as_ref(), &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn submit_after_time_is_up_is_late() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;
    let student = app.student_token().await;
    let exam_id = app.create_exam(&teacher, "1 Menit").await;
    let exam_uuid: uuid::Uuid = exam_id.parse().unwrap();

    // Rules accepted five minutes ago.
    let start = chrono::Utc::now() - chrono::Duration::minutes(5);
    app.kv
        .set("0012345678", &exam_start_key(exam_uuid), &start.timestamp_millis().to_string())
        .await
        .unwrap();

    let attempt: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}/attempt", exam_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(attempt["started"], true);
    assert_eq!(attempt["remainingSeconds"], 0);

    let submitted: Value = app
        .client
        .post(app.url(&format!("/api/exams/{}/submissions", exam_id)))
        .bearer_auth(&student)
        .json(&json!({ "onshapeLink": "https://cad.onshape.com/documents/late" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(submitted["isLate"], true);
}

#[tokio::test]
async fn student_socket_follows_attempt_lifecycle() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;
    let student = app.student_token().await;
    let exam_id = app.create_exam(&teacher, "120 Menit").await;
    let exam_uuid: uuid::Uuid = exam_id.parse().unwrap();

    let mut socket = app.connect("student", &exam_id, &student).await.unwrap();

    // Not started yet: the full duration, no ticking.
    let first = next_frame(&mut socket).await.unwrap();
    assert_eq!(first["event"], "timer");
    assert_eq!(first["payload"]["remainingSeconds"], 7200);
    assert_eq!(first["payload"]["display"], "02:00:00");
    assert_eq!(app.hub.active_students(exam_uuid).len(), 1);

    let accepted = app
        .client
        .post(app.url(&format!("/api/exams/{}/attempt", exam_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status().as_u16(), 200);

    let started = next_frame(&mut socket).await.unwrap();
    assert_eq!(started["event"], "timer");
    let from = started["payload"]["remainingSeconds"].as_i64().unwrap();
    assert!(from > 7190);

    let tick = next_frame(&mut socket).await.unwrap();
    assert_eq!(tick["event"], "timer");
    assert_eq!(tick["payload"]["remainingSeconds"].as_i64().unwrap(), from - 1);

    let submitted = app
        .client
        .post(app.url(&format!("/api/exams/{}/submissions", exam_id)))
        .bearer_auth(&student)
        .json(&json!({ "onshapeLink": "https://cad.onshape.com/documents/abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(submitted.status().as_u16(), 201);

    // Ticks already in flight may arrive first; then the last frame and close.
    loop {
        let frame = next_frame(&mut socket).await.expect("socket closed before submitted frame");
        if frame["event"] == "submitted" {
            break;
        }
        assert_eq!(frame["event"], "timer");
    }
    assert!(next_frame(&mut socket).await.is_none());
    assert!(app.hub.active_students(exam_uuid).is_empty());
}

#[tokio::test]
async fn teacher_socket_streams_presence_and_relays_warnings() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;
    let exam_id = app.create_exam(&teacher, "90 Menit").await;
    let exam_uuid: uuid::Uuid = exam_id.parse().unwrap();

    let mut socket = app.connect("teacher", &exam_id, &teacher).await.unwrap();

    let initial = next_frame(&mut socket).await.unwrap();
    assert_eq!(initial["event"], "presence");
    assert_eq!(initial["payload"]["kind"], "sync");
    assert_eq!(initial["payload"]["students"].as_array().unwrap().len(), 0);

    let mut andi = app.hub.join_as_student(
        exam_uuid,
        Presence {
            nisn: "0012345678".to_string(),
            name: "Andi Pratama".to_string(),
            class: "XI TGB 1".to_string(),
            online_at: chrono::Utc::now(),
        },
    );

    let joined = next_frame(&mut socket).await.unwrap();
    assert_eq!(joined["payload"]["kind"], "join");
    assert_eq!(joined["payload"]["key"], "0012345678");
    let synced = next_frame(&mut socket).await.unwrap();
    assert_eq!(synced["payload"]["kind"], "sync");
    assert_eq!(synced["payload"]["students"][0]["name"], "Andi Pratama");

    socket
        .send(Message::text(
            json!({ "event": "warning", "payload": { "message": "Fokus ke soal", "targetNisn": null } })
                .to_string(),
        ))
        .await
        .unwrap();
    let warning = andi.next_warning().await.unwrap();
    assert_eq!(warning.message, "Fokus ke soal");
    assert_eq!(warning.target_nisn, None);

    socket
        .send(Message::text(
            json!({ "event": "warning", "payload": { "message": "   " } }).to_string(),
        ))
        .await
        .unwrap();
    let empty = next_frame(&mut socket).await.unwrap();
    assert_eq!(empty["event"], "error");
    assert_eq!(empty["payload"]["message"], "Pesan peringatan tidak boleh kosong.");

    socket.send(Message::text("halo")).await.unwrap();
    let unknown = next_frame(&mut socket).await.unwrap();
    assert_eq!(unknown["event"], "error");
    assert!(
        unknown["payload"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Perintah tidak dikenal")
    );

    drop(andi);
    let left = next_frame(&mut socket).await.unwrap();
    assert_eq!(left["payload"]["kind"], "leave");
    let emptied = next_frame(&mut socket).await.unwrap();
    assert_eq!(emptied["payload"]["kind"], "sync");
    assert_eq!(emptied["payload"]["students"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn sockets_check_token_and_role() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;
    let student = app.student_token().await;
    let exam_id = app.create_exam(&teacher, "90 Menit").await;

    let status = |result: Result<Socket, WsError>| match result {
        Err(WsError::Http(response)) => response.status().as_u16(),
        other => panic!("expected an HTTP rejection, got {:?}", other.map(|_| ())),
    };

    assert_eq!(status(app.connect("teacher", &exam_id, &student).await), 403);
    assert_eq!(status(app.connect("student", &exam_id, &teacher).await), 403);
    assert_eq!(status(app.connect("student", &exam_id, "not-a-token").await), 401);

    let unknown_exam = uuid::Uuid::new_v4().to_string();
    assert_eq!(status(app.connect("student", &unknown_exam, &student).await), 404);
}

#[tokio::test]
async fn warning_for_unknown_exam_is_not_found() {
    let app = spawn_app().await;
    let teacher = app.teacher_token().await;

    let resp = app
        .client
        .post(app.url(&format!("/api/teacher/exams/{}/warnings", uuid::Uuid::new_v4())))
        .bearer_auth(&teacher)
        .json(&json!({ "message": "Halo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
