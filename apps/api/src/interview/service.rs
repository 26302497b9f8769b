//! Interview service: loads a session, runs one turn through the dispatcher,
//! persists the outcome, and shapes the response.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::collaborators::Collaborators;
use crate::interview::completion::{compute_progress, Progress};
use crate::interview::dispatcher::{TurnDispatcher, TurnOutcome};
use crate::interview::domains::Domain;
use crate::interview::schema::{DomainSchema, RetryPolicy};
use crate::interview::session::{ChatTurn, Mode, Role, SessionState};
use crate::interview::store::SessionStore;
use crate::interview::summary::commit_failed_message;

/// What the client gets back after every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    pub session_id: Uuid,
    pub domain: Domain,
    pub message: String,
    pub percent_complete: u8,
    pub is_done: bool,
    pub completion_map: BTreeMap<String, bool>,
    pub mode: Mode,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: SessionState,
    pub progress: Progress,
}

pub struct InterviewService {
    store: Arc<dyn SessionStore>,
    collaborators: Collaborators,
    retries: RetryPolicy,
    history_window: usize,
}

impl InterviewService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        collaborators: Collaborators,
        retries: RetryPolicy,
        history_window: usize,
    ) -> Self {
        Self {
            store,
            collaborators,
            retries,
            history_window,
        }
    }

    fn schema(&self, domain: Domain) -> DomainSchema {
        domain.schema(self.retries)
    }

    /// Opens a new item for `domain` under a fresh session id.
    pub async fn start_item(&self, domain: Domain) -> Result<TurnResponse, AppError> {
        let session_id = Uuid::new_v4();
        info!("Starting {domain} interview {session_id}");
        self.open(session_id, &self.schema(domain)).await
    }

    async fn open(&self, session_id: Uuid, schema: &DomainSchema) -> Result<TurnResponse, AppError> {
        let dispatcher = TurnDispatcher::new(schema, &self.collaborators);
        let outcome = dispatcher.open(SessionState::new(schema));

        self.persist(session_id, &outcome.state).await;
        self.record_turn(session_id, Role::Assistant, &outcome.message).await;
        Ok(respond(session_id, schema, &outcome))
    }

    pub async fn handle_utterance(
        &self,
        domain: Domain,
        session_id: Uuid,
        utterance: &str,
    ) -> Result<TurnResponse, AppError> {
        if utterance.trim().is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }

        let schema = self.schema(domain);
        let loaded = match self.store.load_session(session_id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("Failed to load session {session_id}, treating it as unknown: {e:#}");
                None
            }
        };
        let Some(state) = loaded else {
            info!("Unknown session {session_id}, starting a new {domain} interview under it");
            self.record_turn(session_id, Role::User, utterance).await;
            return self.open(session_id, &schema).await;
        };
        if state.domain != domain {
            return Err(AppError::Validation(format!(
                "session {session_id} belongs to the {} interview, not {domain}",
                state.domain
            )));
        }

        // Closed sessions answer with a fixed message; no model call needs the history.
        let mut history = if state.mode.is_terminal() {
            Vec::new()
        } else {
            match self.store.recent_transcript(session_id, self.history_window).await {
                Ok(turns) => turns,
                Err(e) => {
                    warn!("Transcript unavailable for {session_id}, continuing without history: {e:#}");
                    Vec::new()
                }
            }
        };
        history.push(ChatTurn::user(utterance));

        let dispatcher = TurnDispatcher::new(&schema, &self.collaborators);
        let mut outcome = dispatcher.dispatch(state, utterance, &history).await;

        if let Some(record) = outcome.commit.take() {
            if let Err(e) = self.store.commit_record(session_id, domain, &record).await {
                error!("Commit failed for session {session_id}: {e:#}");
                outcome.state.mode = Mode::AwaitingConfirmation;
                outcome.message = commit_failed_message(&schema);
            }
        }

        self.persist(session_id, &outcome.state).await;
        self.record_turn(session_id, Role::User, utterance).await;
        self.record_turn(session_id, Role::Assistant, &outcome.message).await;

        info!(
            "Session {session_id} turn {} done, mode {:?}",
            outcome.state.interaction_count, outcome.state.mode
        );
        Ok(respond(session_id, &schema, &outcome))
    }

    pub async fn session_view(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        let state = self
            .store
            .load_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
        let progress = compute_progress(&self.schema(state.domain), &state);
        Ok(SessionView {
            session_id,
            state,
            progress,
        })
    }

    pub async fn transcript(&self, session_id: Uuid) -> Result<Vec<ChatTurn>, AppError> {
        if self.store.load_session(session_id).await?.is_none() {
            return Err(AppError::NotFound(format!("session {session_id}")));
        }
        Ok(self.store.transcript(session_id).await?)
    }

    /// A lost save replays the previous question on the next turn; the reply still goes out.
    async fn persist(&self, session_id: Uuid, state: &SessionState) {
        if let Err(e) = self.store.save_session(session_id, state).await {
            error!("Failed to save session {session_id}: {e:#}");
        }
    }

    async fn record_turn(&self, session_id: Uuid, role: Role, text: &str) {
        if let Err(e) = self.store.append_transcript(session_id, role, text).await {
            warn!("Failed to append {role} turn for {session_id}: {e:#}");
        }
    }
}

fn respond(session_id: Uuid, schema: &DomainSchema, outcome: &TurnOutcome) -> TurnResponse {
    let progress = compute_progress(schema, &outcome.state);
    TurnResponse {
        session_id,
        domain: schema.domain,
        message: outcome.message.clone(),
        percent_complete: progress.percent_complete,
        is_done: progress.is_done,
        completion_map: progress.completion_map,
        mode: outcome.state.mode,
    }
}
