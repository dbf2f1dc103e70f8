// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{attempts, auth, blueprints, exams, live, students, submissions},
    state::AppState,
    storage::{FILES_ROUTE, MAX_BLUEPRINT_BYTES},
    utils::jwt::{auth_middleware, student_middleware, teacher_middleware},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public: login for both roles and the live sockets (token in query).
/// * Authenticated: exam browsing for both roles.
/// * Student only: attempt lifecycle and submitting.
/// * Teacher only: exam management, grading, students, blueprints, monitor.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let auth_routes = Router::new()
        .route("/student/login", post(auth::student_login))
        .route("/teacher/login", post(auth::teacher_login));

    let exam_routes = Router::new()
        .route("/", get(exams::list_exams))
        .route("/{id}", get(exams::get_exam))
        .merge(
            Router::new()
                .route(
                    "/{id}/attempt",
                    get(attempts::get_attempt).post(attempts::start_attempt),
                )
                .route("/{id}/submissions", post(submissions::submit))
                .layer(middleware::from_fn(student_middleware)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let student_routes = Router::new()
        .route("/submissions", get(submissions::my_submissions))
        // Auth first, then the role check
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let teacher_routes = Router::new()
        .route("/exams", post(exams::create_exam))
        .route(
            "/exams/{id}",
            put(exams::update_exam).delete(exams::delete_exam),
        )
        .route("/exams/{id}/monitor", get(live::monitor_snapshot))
        .route("/exams/{id}/warnings", post(live::send_warning))
        .route("/submissions", get(submissions::list_submissions))
        .route("/submissions/stats", get(submissions::submission_stats))
        .route(
            "/submissions/{id}",
            get(submissions::get_submission).delete(submissions::delete_submission),
        )
        .route("/submissions/{id}/grade", put(submissions::grade_submission))
        .route("/students", get(students::list_students))
        .route("/students/import", post(students::import_students))
        .route("/students/template", get(students::import_template))
        .route(
            "/students/{id}",
            delete(students::delete_student),
        )
        .route(
            "/blueprints/{name}",
            put(blueprints::upload_blueprint).layer(DefaultBodyLimit::max(MAX_BLUEPRINT_BYTES)),
        )
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let live_routes = Router::new()
        .route("/exams/{id}/student", get(live::student_socket))
        .route("/exams/{id}/teacher", get(live::teacher_socket));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/student", student_routes)
        .nest("/api/teacher", teacher_routes)
        .nest("/api/live", live_routes)
        .nest_service(FILES_ROUTE, ServeDir::new(&state.config.upload_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        live::LiveHub,
        storage::LocalBlobStore,
        store::{MemoryKv, MemoryStore},
    };

    fn test_router() -> Router {
        let upload_dir = std::env::temp_dir().join("ujian-gto-router-test");
        let config = Config::for_tests("router_secret", upload_dir.clone());
        create_router(AppState {
            store: Arc::new(MemoryStore::new()),
            kv: Arc::new(MemoryKv::new()),
            blobs: Arc::new(LocalBlobStore::new(upload_dir, config.public_base_url.clone())),
            hub: LiveHub::new(),
            config,
        })
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/exams", "/api/student/submissions", "/api/teacher/students"] {
            let response = test_router()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn template_download_is_csv() {
        let token = crate::utils::jwt::sign_jwt(
            &crate::utils::jwt::Claims::new("guru", crate::utils::jwt::Role::Teacher, "Bu Sari", None, 60)
                .unwrap(),
            "router_secret",
        )
        .unwrap();

        let response = test_router()
            .oneshot(
                Request::get("/api/teacher/students/template")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv; charset=utf-8"
        );
    }
}
