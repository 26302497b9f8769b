use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::domains::Domain;
use crate::interview::service::{SessionView, TurnResponse};
use crate::interview::session::ChatTurn;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

fn parse_domain(raw: &str) -> Result<Domain, AppError> {
    raw.parse()
        .map_err(|e: anyhow::Error| AppError::Validation(e.to_string()))
}

fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(format!("'{raw}' is not a valid session id")))
}

/// POST /api/v1/interview/:domain/sessions
///
/// Opens a new item and returns the first question.
pub async fn handle_start(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<(StatusCode, Json<TurnResponse>), AppError> {
    let domain = parse_domain(&domain)?;
    let response = state.interviews.start_item(domain).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/interview/:domain/sessions/:id/messages
pub async fn handle_message(
    State(state): State<AppState>,
    Path((domain, session_id)): Path<(String, String)>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let domain = parse_domain(&domain)?;
    let session_id = parse_session_id(&session_id)?;
    let response = state
        .interviews
        .handle_utterance(domain, session_id, &request.message)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/interview/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    Ok(Json(state.interviews.session_view(session_id).await?))
}

/// GET /api/v1/interview/sessions/:id/transcript
///
/// Every stored turn, oldest first.
pub async fn handle_get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatTurn>>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    Ok(Json(state.interviews.transcript(session_id).await?))
}
