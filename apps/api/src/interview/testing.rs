//! Test doubles: scripted collaborators and an in-memory session store.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::interview::collaborators::{
    Clarification, ClarificationGenerator, CollaboratorError, Collaborators, ExtractionResult,
    FieldExtractor, GeneratedQuestion, Intent, IntentClassification, IntentClassifier,
    QuestionGenerator, TurnContext,
};
use crate::interview::domains::Domain;
use crate::interview::schema::FieldSpec;
use crate::interview::session::{ChatTurn, FieldValue, Role, SessionState};
use crate::interview::store::SessionStore;

/// A confident, complete extraction of `value`.
pub fn answered(value: Value) -> ExtractionResult {
    ExtractionResult {
        extracted_value: Some(value),
        is_complete: true,
        confidence: 0.9,
        needs_clarification: false,
        clarification_reason: None,
    }
}

/// Nothing usable in the answer.
pub fn ambiguous() -> ExtractionResult {
    ExtractionResult {
        extracted_value: None,
        is_complete: false,
        confidence: 0.2,
        needs_clarification: true,
        clarification_reason: Some("too vague".to_string()),
    }
}

fn scripted_failure() -> CollaboratorError {
    CollaboratorError::Malformed("scripted failure".to_string())
}

/// Collaborators that replay queued replies. With an empty queue, every message is
/// an answer and every extraction is ambiguous. Questions read `Q[<field>#<retry>]`.
#[derive(Default)]
pub struct ScriptedCollaborators {
    intents: Mutex<VecDeque<Result<IntentClassification, CollaboratorError>>>,
    extractions: Mutex<VecDeque<Result<ExtractionResult, CollaboratorError>>>,
    questions_fail: AtomicBool,
    clarifications_fail: AtomicBool,
    pub classify_calls: AtomicUsize,
    pub extract_calls: AtomicUsize,
}

impl ScriptedCollaborators {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators::from_shared(self.clone())
    }

    pub fn push_intent(&self, intent: Intent) {
        self.intents.lock().unwrap().push_back(Ok(IntentClassification {
            intent,
            confidence: 0.9,
            clarification_topic: None,
        }));
    }

    pub fn push_intent_error(&self) {
        self.intents.lock().unwrap().push_back(Err(scripted_failure()));
    }

    pub fn push_extraction(&self, result: ExtractionResult) {
        self.extractions.lock().unwrap().push_back(Ok(result));
    }

    pub fn push_extraction_error(&self) {
        self.extractions.lock().unwrap().push_back(Err(scripted_failure()));
    }

    pub fn fail_questions(&self) {
        self.questions_fail.store(true, Ordering::SeqCst);
    }

    pub fn fail_clarifications(&self) {
        self.clarifications_fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IntentClassifier for ScriptedCollaborators {
    async fn classify_intent(
        &self,
        _utterance: &str,
        _field: &FieldSpec,
        _ctx: TurnContext<'_>,
    ) -> Result<IntentClassification, CollaboratorError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        self.intents.lock().unwrap().pop_front().unwrap_or(Ok(IntentClassification {
            intent: Intent::AnswerQuestion,
            confidence: 0.9,
            clarification_topic: None,
        }))
    }
}

#[async_trait]
impl FieldExtractor for ScriptedCollaborators {
    async fn extract_field(
        &self,
        _field: &FieldSpec,
        _ctx: TurnContext<'_>,
        _current: Option<&FieldValue>,
    ) -> Result<ExtractionResult, CollaboratorError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.extractions.lock().unwrap().pop_front().unwrap_or(Ok(ambiguous()))
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedCollaborators {
    async fn generate_question(
        &self,
        field: &FieldSpec,
        _ctx: TurnContext<'_>,
        retry_count: u32,
    ) -> Result<GeneratedQuestion, CollaboratorError> {
        if self.questions_fail.load(Ordering::SeqCst) {
            return Err(scripted_failure());
        }
        Ok(GeneratedQuestion {
            question: format!("Q[{}#{}]", field.name, retry_count),
            follow_up_examples: vec![],
        })
    }
}

#[async_trait]
impl ClarificationGenerator for ScriptedCollaborators {
    async fn generate_clarification(
        &self,
        _utterance: &str,
        field: &FieldSpec,
        _topic: Option<&str>,
        _ctx: TurnContext<'_>,
    ) -> Result<Clarification, CollaboratorError> {
        if self.clarifications_fail.load(Ordering::SeqCst) {
            return Err(scripted_failure());
        }
        Ok(Clarification {
            explanation: format!("About {}", field.name),
            example: Some("like this".to_string()),
            follow_up_question: format!("Q[{}]?", field.name),
        })
    }
}

/// In-memory `SessionStore` with switchable failures.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, SessionState>>,
    transcripts: Mutex<HashMap<Uuid, Vec<ChatTurn>>>,
    pub commits: Mutex<Vec<(Uuid, Domain, Value)>>,
    fail_commits: AtomicBool,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
    fail_transcript_reads: AtomicBool,
    pub recent_limits: Mutex<Vec<usize>>,
}

impl MemorySessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn fail_loads(&self) {
        self.fail_loads.store(true, Ordering::SeqCst);
    }

    pub fn fail_transcript_reads(&self) {
        self.fail_transcript_reads.store(true, Ordering::SeqCst);
    }

    pub fn stored(&self, session_id: Uuid) -> Option<SessionState> {
        self.sessions.lock().unwrap().get(&session_id).cloned()
    }

    pub fn insert(&self, session_id: Uuid, state: SessionState) {
        self.sessions.lock().unwrap().insert(session_id, state);
    }

    pub fn commit_count(&self) -> usize {
        self.commits.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load_session(&self, session_id: Uuid) -> Result<Option<SessionState>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(anyhow!("db down"));
        }
        Ok(self.stored(session_id))
    }

    async fn save_session(&self, session_id: Uuid, state: &SessionState) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(anyhow!("save refused"));
        }
        self.insert(session_id, state.clone());
        Ok(())
    }

    async fn commit_record(&self, session_id: Uuid, domain: Domain, record: &Value) -> Result<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(anyhow!("commit refused"));
        }
        let mut commits = self.commits.lock().unwrap();
        commits.retain(|(id, _, _)| *id != session_id);
        commits.push((session_id, domain, record.clone()));
        Ok(())
    }

    async fn append_transcript(&self, session_id: Uuid, role: Role, text: &str) -> Result<()> {
        let turn = ChatTurn {
            role,
            text: text.to_string(),
        };
        self.transcripts
            .lock()
            .unwrap()
            .entry(session_id)
            .or_default()
            .push(turn);
        Ok(())
    }

    async fn recent_transcript(&self, session_id: Uuid, limit: usize) -> Result<Vec<ChatTurn>> {
        if self.fail_transcript_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("transcript unavailable"));
        }
        self.recent_limits.lock().unwrap().push(limit);
        let all = self.transcript(session_id).await?;
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }

    async fn transcript(&self, session_id: Uuid) -> Result<Vec<ChatTurn>> {
        Ok(self
            .transcripts
            .lock()
            .unwrap()
            .get(&session_id)
            .cloned()
            .unwrap_or_default())
    }
}
