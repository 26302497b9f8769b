pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/interview/:domain/sessions",
            post(handlers::handle_start),
        )
        .route(
            "/api/v1/interview/:domain/sessions/:id/messages",
            post(handlers::handle_message),
        )
        .route(
            "/api/v1/interview/sessions/:id",
            get(handlers::handle_get_session),
        )
        .route(
            "/api/v1/interview/sessions/:id/transcript",
            get(handlers::handle_get_transcript),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::interview::schema::RetryPolicy;
    use crate::interview::service::InterviewService;
    use crate::interview::testing::{answered, MemorySessionStore, ScriptedCollaborators};

    fn app(scripted: &Arc<ScriptedCollaborators>) -> Router {
        let service = InterviewService::new(
            MemorySessionStore::new(),
            scripted.collaborators(),
            RetryPolicy::default(),
            10,
        );
        build_router(AppState {
            interviews: Arc::new(service),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(b) => Body::from(b.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(&ScriptedCollaborators::new());
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "interview-api");
    }

    #[tokio::test]
    async fn test_start_then_answer_then_read_back() {
        let scripted = ScriptedCollaborators::new();
        let app = app(&scripted);

        let (status, started) = send(&app, "POST", "/api/v1/interview/experience/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(started["domain"], "experience");
        assert_eq!(started["percent_complete"], 0);
        assert_eq!(started["mode"], "collecting");
        let id = started["session_id"].as_str().unwrap().to_string();

        scripted.push_extraction(answered(json!("Engineer")));
        let (status, turn) = send(
            &app,
            "POST",
            &format!("/api/v1/interview/experience/sessions/{id}/messages"),
            Some(json!({"message": "I was an Engineer"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(turn["completion_map"]["title"], true);
        assert_eq!(turn["percent_complete"], 9);
        assert_eq!(turn["is_done"], false);

        let (status, view) = send(&app, "GET", &format!("/api/v1/interview/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"]["record"]["title"], "Engineer");
        assert_eq!(view["progress"]["percent_complete"], 9);

        let (status, transcript) = send(
            &app,
            "GET",
            &format!("/api/v1/interview/sessions/{id}/transcript"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transcript.as_array().unwrap().len(), 3);
        assert_eq!(transcript[1]["role"], "user");
        assert_eq!(transcript[1]["text"], "I was an Engineer");
    }

    #[tokio::test]
    async fn test_unknown_domain_is_bad_request() {
        let app = app(&ScriptedCollaborators::new());
        let (status, body) = send(&app, "POST", "/api/v1/interview/project/sessions", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_blank_message_is_bad_request() {
        let app = app(&ScriptedCollaborators::new());
        let id = Uuid::new_v4();
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/interview/skills/sessions/{id}/messages"),
            Some(json!({"message": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let app = app(&ScriptedCollaborators::new());
        let id = Uuid::new_v4();
        let (status, body) = send(&app, "GET", &format!("/api/v1/interview/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_session_id_is_bad_request() {
        let app = app(&ScriptedCollaborators::new());
        let (status, _) = send(&app, "GET", "/api/v1/interview/sessions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
