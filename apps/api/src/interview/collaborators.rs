//! Collaborator contracts: the four language-model-backed calls the dispatcher makes.
//!
//! Every call returns a `Result`. Implementations report failure honestly; the
//! dispatcher owns the degradation policy and substitutes the `fallback` values
//! defined here, so a failing model never surfaces as a user-visible error.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::interview::schema::{DomainSchema, FieldSpec};
use crate::interview::session::{ChatTurn, FieldValue, ItemRecord};
use crate::llm_client::LlmError;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed collaborator output: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AnswerQuestion,
    RequestSummary,
    RequestClarification,
    RequestDone,
    OffTopic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub clarification_topic: Option<String>,
}

impl IntentClassification {
    /// Safe default: treat the message as an answer and let extraction decide.
    pub fn fallback() -> Self {
        Self {
            intent: Intent::AnswerQuestion,
            confidence: 0.3,
            clarification_topic: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub extracted_value: Option<Value>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub needs_clarification: bool,
    #[serde(default)]
    pub clarification_reason: Option<String>,
}

impl ExtractionResult {
    /// Leaves the field exactly as it was: complete only if it already had a value.
    pub fn fallback(current: Option<&FieldValue>) -> Self {
        let present = current.map(FieldValue::is_present).unwrap_or(false);
        Self {
            extracted_value: current.map(FieldValue::to_json),
            is_complete: present,
            confidence: 0.0,
            needs_clarification: false,
            clarification_reason: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(default, alias = "follow_up_prompts")]
    pub follow_up_examples: Vec<String>,
}

impl GeneratedQuestion {
    pub fn fallback(field: &FieldSpec, schema: &DomainSchema) -> Self {
        Self {
            question: format!(
                "Could you tell me about the {} of your {}?",
                field.spoken_name(),
                schema.item_noun
            ),
            follow_up_examples: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    pub explanation: String,
    #[serde(default)]
    pub example: Option<String>,
    pub follow_up_question: String,
}

impl Clarification {
    pub fn fallback(field: &FieldSpec, schema: &DomainSchema) -> Self {
        Self {
            explanation: format!(
                "I'm asking about the {} of your {}: {}.",
                field.spoken_name(),
                schema.item_noun,
                field.description
            ),
            example: None,
            follow_up_question: format!("Could you tell me about the {}?", field.spoken_name()),
        }
    }
}

/// What every collaborator call gets to see about the conversation.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub schema: &'a DomainSchema,
    pub history: &'a [ChatTurn],
    pub record: &'a ItemRecord,
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify_intent(
        &self,
        utterance: &str,
        field: &FieldSpec,
        ctx: TurnContext<'_>,
    ) -> Result<IntentClassification, CollaboratorError>;
}

#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract_field(
        &self,
        field: &FieldSpec,
        ctx: TurnContext<'_>,
        current: Option<&FieldValue>,
    ) -> Result<ExtractionResult, CollaboratorError>;
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_question(
        &self,
        field: &FieldSpec,
        ctx: TurnContext<'_>,
        retry_count: u32,
    ) -> Result<GeneratedQuestion, CollaboratorError>;
}

#[async_trait]
pub trait ClarificationGenerator: Send + Sync {
    async fn generate_clarification(
        &self,
        utterance: &str,
        field: &FieldSpec,
        topic: Option<&str>,
        ctx: TurnContext<'_>,
    ) -> Result<Clarification, CollaboratorError>;
}

/// The four collaborator handles, injected into the dispatcher.
#[derive(Clone)]
pub struct Collaborators {
    pub intents: Arc<dyn IntentClassifier>,
    pub extractor: Arc<dyn FieldExtractor>,
    pub questions: Arc<dyn QuestionGenerator>,
    pub clarifier: Arc<dyn ClarificationGenerator>,
}

impl Collaborators {
    /// Uses one value for all four roles.
    pub fn from_shared<T>(shared: Arc<T>) -> Self
    where
        T: IntentClassifier + FieldExtractor + QuestionGenerator + ClarificationGenerator + 'static,
    {
        Self {
            intents: shared.clone(),
            extractor: shared.clone(),
            questions: shared.clone(),
            clarifier: shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::interview::domains::Domain;
    use crate::interview::schema::RetryPolicy;

    #[test]
    fn test_intent_serde_snake_case() {
        let parsed: IntentClassification =
            serde_json::from_str(r#"{"intent": "request_summary", "confidence": 0.9}"#).unwrap();
        assert_eq!(parsed.intent, Intent::RequestSummary);
        assert!(parsed.clarification_topic.is_none());
    }

    #[test]
    fn test_unknown_intent_is_malformed() {
        let parsed = serde_json::from_str::<IntentClassification>(r#"{"intent": "chit_chat"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_intent_fallback_is_low_confidence_answer() {
        let fb = IntentClassification::fallback();
        assert_eq!(fb.intent, Intent::AnswerQuestion);
        assert!(fb.confidence < 0.5);
    }

    #[test]
    fn test_extraction_fallback_keeps_current_value() {
        let current = FieldValue::Scalar(json!("Acme"));
        let fb = ExtractionResult::fallback(Some(&current));
        assert_eq!(fb.extracted_value, Some(json!("Acme")));
        assert!(fb.is_complete);
        assert_eq!(fb.confidence, 0.0);

        let empty = ExtractionResult::fallback(None);
        assert!(empty.extracted_value.is_none());
        assert!(!empty.is_complete);
    }

    #[test]
    fn test_extraction_defaults_missing_keys() {
        let parsed: ExtractionResult =
            serde_json::from_str(r#"{"extracted_value": ["Rust"], "is_complete": true}"#).unwrap();
        assert_eq!(parsed.extracted_value, Some(json!(["Rust"])));
        assert_eq!(parsed.confidence, 0.0);
        assert!(!parsed.needs_clarification);
    }

    #[test]
    fn test_question_accepts_follow_up_prompts_alias() {
        let parsed: GeneratedQuestion = serde_json::from_str(
            r#"{"question": "Where?", "follow_up_prompts": ["At Acme"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.follow_up_examples, vec!["At Acme".to_string()]);
    }

    #[test]
    fn test_fallbacks_name_the_field() {
        let schema = Domain::Experience.schema(RetryPolicy::default());
        let field = schema.field("tools_and_technologies").unwrap();
        let q = GeneratedQuestion::fallback(field, &schema);
        assert!(q.question.contains("tools and technologies"));
        assert!(q.question.contains("experience"));
        let c = Clarification::fallback(field, &schema);
        assert!(c.explanation.contains("tools and technologies"));
        assert!(c.follow_up_question.contains("tools and technologies"));
    }
}
