//! Shared test fixtures: in-memory server state, seed data, and a mock
//! AI assignment service.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use axum::{Json, Router, http::StatusCode, routing::post};
use neurodesk_server::core::{Config, ServerState};
use neurodesk_server::db::models::{Technician, TechnicianCreate, User, UserCreate};
use neurodesk_server::db::repository::{TechnicianRepository, UserRepository};

/// Build server state over an in-memory database
pub async fn test_state(ai_url: Option<String>) -> ServerState {
    test_state_with_timeout(ai_url, 800).await
}

/// Same, with an explicit AI call timeout (ms)
pub async fn test_state_with_timeout(ai_url: Option<String>, ai_timeout_ms: u64) -> ServerState {
    let config = Config {
        work_dir: ".".to_string(),
        http_port: 0,
        environment: "test".to_string(),
        ai_service_url: ai_url,
        ai_timeout_ms,
        restrict_reactivate: false,
    };
    ServerState::initialize_in_memory(&config).await
}

pub async fn seed_user(state: &ServerState, name: &str, email: &str) -> User {
    UserRepository::new(state.db.clone())
        .create(UserCreate {
            name: name.to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            contact_no: None,
            role: None,
            department: Some("IT".to_string()),
        })
        .await
        .expect("failed to seed user")
}

pub async fn seed_technician(state: &ServerState, name: &str, user_id: i64) -> Technician {
    TechnicianRepository::new(state.db.clone())
        .create(TechnicianCreate {
            name: name.to_string(),
            user_id,
            skills: None,
            availability_status: None,
            skill_level: None,
            specialization: None,
        })
        .await
        .expect("failed to seed technician")
}

/// What the mock AI service should do on each request
#[derive(Clone)]
pub enum MockAi {
    /// Respond 200 with this body
    Respond(serde_json::Value),
    /// Respond with this status code
    Status(u16),
    /// Sleep, then respond 200 with this body
    Delay(u64, serde_json::Value),
}

/// Spin up a mock AI service on an ephemeral port. Returns its base URL
/// and a counter of received requests.
pub async fn spawn_mock_ai(behavior: MockAi) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler_calls = calls.clone();

    let handler = move || {
        let behavior = behavior.clone();
        let calls = handler_calls.clone();
        async move {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            match behavior {
                MockAi::Respond(body) => (StatusCode::OK, Json(body)),
                MockAi::Status(code) => (
                    StatusCode::from_u16(code).unwrap(),
                    Json(serde_json::json!({"error": "mock failure"})),
                ),
                MockAi::Delay(ms, body) => {
                    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
                    (StatusCode::OK, Json(body))
                }
            }
        }
    };

    let app = Router::new()
        .route("/api/ticket-assignment", post(handler.clone()))
        .route("/api/evaluate-skills", post(handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock AI listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), calls)
}

/// Serve the full application router on an ephemeral port
pub async fn spawn_app(state: ServerState) -> String {
    let app = neurodesk_server::api::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind app listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
