//! Language-model implementations of the four collaborator traits.
//!
//! One `LlmCollaborators` value serves every role over the shared `LlmClient`.
//! Replies are validated here (confidence clamped, empty texts rejected); anything
//! unusable comes back as a `CollaboratorError` for the dispatcher to degrade.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::interview::collaborators::{
    Clarification, ClarificationGenerator, CollaboratorError, ExtractionResult, FieldExtractor,
    GeneratedQuestion, IntentClassification, IntentClassifier, QuestionGenerator, TurnContext,
};
use crate::interview::prompts::{clarify_prompt, extract_prompt, intent_prompt, question_prompt};
use crate::interview::schema::FieldSpec;
use crate::interview::session::FieldValue;
use crate::llm_client::prompts::{persona_system, JSON_ONLY_SYSTEM};
use crate::llm_client::LlmClient;

#[derive(Clone)]
pub struct LlmCollaborators {
    llm: LlmClient,
    history_window: usize,
}

impl LlmCollaborators {
    pub fn new(llm: LlmClient, history_window: usize) -> Self {
        Self {
            llm,
            history_window,
        }
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

fn normalize_intent(mut c: IntentClassification) -> IntentClassification {
    c.confidence = clamp_confidence(c.confidence);
    c.clarification_topic = non_blank(c.clarification_topic);
    c
}

fn normalize_extraction(mut r: ExtractionResult) -> ExtractionResult {
    r.confidence = clamp_confidence(r.confidence);
    r.clarification_reason = non_blank(r.clarification_reason);
    r
}

fn validate_question(q: GeneratedQuestion) -> Result<GeneratedQuestion, CollaboratorError> {
    if q.question.trim().is_empty() {
        return Err(CollaboratorError::Malformed("empty question".to_string()));
    }
    Ok(GeneratedQuestion {
        question: q.question.trim().to_string(),
        follow_up_examples: q
            .follow_up_examples
            .into_iter()
            .filter(|e| !e.trim().is_empty())
            .collect(),
    })
}

fn validate_clarification(c: Clarification) -> Result<Clarification, CollaboratorError> {
    if c.explanation.trim().is_empty() || c.follow_up_question.trim().is_empty() {
        return Err(CollaboratorError::Malformed(
            "clarification without explanation or question".to_string(),
        ));
    }
    Ok(Clarification {
        explanation: c.explanation.trim().to_string(),
        example: non_blank(c.example),
        follow_up_question: c.follow_up_question.trim().to_string(),
    })
}

#[async_trait]
impl IntentClassifier for LlmCollaborators {
    async fn classify_intent(
        &self,
        utterance: &str,
        field: &FieldSpec,
        ctx: TurnContext<'_>,
    ) -> Result<IntentClassification, CollaboratorError> {
        let prompt = intent_prompt(utterance, field, &ctx, self.history_window);
        let raw: IntentClassification = self.llm.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
        Ok(normalize_intent(raw))
    }
}

#[async_trait]
impl FieldExtractor for LlmCollaborators {
    async fn extract_field(
        &self,
        field: &FieldSpec,
        ctx: TurnContext<'_>,
        current: Option<&FieldValue>,
    ) -> Result<ExtractionResult, CollaboratorError> {
        let current_text = current.filter(|v| v.is_present()).map(FieldValue::render);
        let prompt = extract_prompt(
            field,
            &ctx,
            current_text.as_deref(),
            self.history_window,
            Utc::now().date_naive(),
        );
        let raw: ExtractionResult = self.llm.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
        let result = normalize_extraction(raw);
        debug!(
            "Extracted '{}': complete={} confidence={:.2}",
            field.name, result.is_complete, result.confidence
        );
        Ok(result)
    }
}

#[async_trait]
impl QuestionGenerator for LlmCollaborators {
    async fn generate_question(
        &self,
        field: &FieldSpec,
        ctx: TurnContext<'_>,
        retry_count: u32,
    ) -> Result<GeneratedQuestion, CollaboratorError> {
        let prompt = question_prompt(field, &ctx, retry_count, self.history_window);
        let raw: GeneratedQuestion = self.llm.call_json(&prompt, &persona_system()).await?;
        validate_question(raw)
    }
}

#[async_trait]
impl ClarificationGenerator for LlmCollaborators {
    async fn generate_clarification(
        &self,
        utterance: &str,
        field: &FieldSpec,
        topic: Option<&str>,
        ctx: TurnContext<'_>,
    ) -> Result<Clarification, CollaboratorError> {
        let prompt = clarify_prompt(utterance, field, topic, &ctx, self.history_window);
        let raw: Clarification = self.llm.call_json(&prompt, &persona_system()).await?;
        validate_clarification(raw)
    }
}
