//! Turn Dispatcher: one user utterance in, one new session state and one message out.
//!
//! Flow per turn:
//!   awaiting_edit_target → reopen a named field | back to confirmation | ask again
//!   awaiting_confirmation → yes: commit | no: pick a field to edit | ask again
//!   collecting → skip check → intent → summary | clarify | abandon | redirect | extract
//!
//! Every branch is total: collaborator failures are replaced by their fallbacks,
//! so a turn always produces a message. Persistence is the caller's job; a confirmed
//! item is handed back in `TurnOutcome::commit`.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::interview::collaborators::{
    Clarification, Collaborators, ExtractionResult, GeneratedQuestion, Intent,
    IntentClassification, TurnContext,
};
use crate::interview::phrases::{
    acknowledgment, classify_confirmation, find_edit_target, is_skip, is_stop_editing,
    re_ask_intro, ConfirmationReply,
};
use crate::interview::schema::{DomainSchema, FieldSpec};
use crate::interview::session::{ChatTurn, FieldValue, Mode, SessionState};
use crate::interview::summary;

/// Result of processing one utterance.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: SessionState,
    pub message: String,
    /// The finished item, present only on the turn the user confirmed it.
    pub commit: Option<Value>,
}

impl TurnOutcome {
    fn reply(state: SessionState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            commit: None,
        }
    }
}

pub struct TurnDispatcher<'a> {
    schema: &'a DomainSchema,
    collaborators: &'a Collaborators,
}

impl<'a> TurnDispatcher<'a> {
    pub fn new(schema: &'a DomainSchema, collaborators: &'a Collaborators) -> Self {
        Self {
            schema,
            collaborators,
        }
    }

    /// First message of a fresh item. Uses the domain's fixed opening question.
    pub fn open(&self, state: SessionState) -> TurnOutcome {
        TurnOutcome::reply(state, self.schema.opening)
    }

    pub async fn dispatch(
        &self,
        mut state: SessionState,
        utterance: &str,
        history: &[ChatTurn],
    ) -> TurnOutcome {
        state.interaction_count += 1;
        let mode_before = state.mode;

        let outcome = match state.mode {
            Mode::AwaitingEditTarget => self.handle_edit_target(state, utterance, history).await,
            Mode::AwaitingConfirmation => self.handle_confirmation(state, utterance),
            Mode::Collecting => self.handle_collecting(state, utterance, history).await,
            Mode::Submitted | Mode::Abandoned => {
                TurnOutcome::reply(state, summary::closed_message(self.schema))
            }
        };

        if outcome.state.mode != mode_before {
            info!(
                "{} turn {}: {:?} -> {:?}",
                self.schema.domain, outcome.state.interaction_count, mode_before, outcome.state.mode
            );
        }
        outcome
    }

    // ────────────────────────────────────────────────────────────────────────
    // Edit / confirmation subflow
    // ────────────────────────────────────────────────────────────────────────

    async fn handle_edit_target(
        &self,
        mut state: SessionState,
        utterance: &str,
        history: &[ChatTurn],
    ) -> TurnOutcome {
        if let Some(field) = find_edit_target(self.schema, utterance) {
            info!("Reopening field '{}' for edit", field.name);
            state.reopen(field.name);
            state.set_retries(field.name, 1);
            state.current_field = Some(field.name.to_string());
            state.mode = Mode::Collecting;

            let question = self.ask(field, &state, history, 1).await;
            let message = format!(
                "Sure, let's update the **{}**. {question}",
                field.spoken_name()
            );
            return TurnOutcome::reply(state, message);
        }

        if is_stop_editing(utterance) {
            return self.enter_confirmation(state, "Excellent! Let's take another look.");
        }

        TurnOutcome::reply(state, summary::edit_target_reprompt(self.schema))
    }

    fn handle_confirmation(&self, mut state: SessionState, utterance: &str) -> TurnOutcome {
        match classify_confirmation(utterance) {
            ConfirmationReply::Yes => {
                let record = state.record.to_committed(self.schema);
                state.mode = Mode::Submitted;
                state.current_field = None;
                info!("{} item confirmed, committing", self.schema.domain);
                TurnOutcome {
                    state,
                    message: summary::submitted_message(self.schema),
                    commit: Some(record),
                }
            }
            ConfirmationReply::No => {
                state.mode = Mode::AwaitingEditTarget;
                state.current_field = None;
                TurnOutcome::reply(state, summary::edit_target_prompt(self.schema))
            }
            ConfirmationReply::Unclear => {
                TurnOutcome::reply(state, summary::confirmation_reprompt(self.schema))
            }
        }
    }

    fn enter_confirmation(&self, mut state: SessionState, lead: &str) -> TurnOutcome {
        state.mode = Mode::AwaitingConfirmation;
        state.current_field = None;
        let message = summary::confirmation_prompt(self.schema, &state.record, lead);
        TurnOutcome::reply(state, message)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Collecting
    // ────────────────────────────────────────────────────────────────────────

    async fn handle_collecting(
        &self,
        mut state: SessionState,
        utterance: &str,
        history: &[ChatTurn],
    ) -> TurnOutcome {
        let Some(field) = self.resolve_current_field(&mut state) else {
            return self.enter_confirmation(state, "It looks like we have everything.");
        };

        // Explicit skips never reach the classifier.
        if is_skip(utterance) {
            info!("Field '{}' skipped explicitly", field.name);
            state.mark_complete(field.name);
            let lead = format!("That's fine, we can skip {}.", field.spoken_name());
            return self
                .advance(state, history, &lead, "No worries! That's everything.")
                .await;
        }

        let classification = match self
            .collaborators
            .intents
            .classify_intent(utterance, field, self.ctx(&state, history))
            .await
        {
            Ok(c) => c,
            Err(e) => {
                warn!("Intent classification failed, treating as answer: {e}");
                IntentClassification::fallback()
            }
        };
        debug!(
            "Intent for '{}': {:?} ({:.2})",
            field.name, classification.intent, classification.confidence
        );

        match classification.intent {
            Intent::AnswerQuestion => self.handle_answer(state, field, history).await,
            Intent::RequestSummary => {
                let question = self.ask(field, &state, history, state.retries(field.name)).await;
                let message = format!(
                    "{}\n\nNow, let's continue: {question}",
                    summary::progress_summary(self.schema, &state.record)
                );
                TurnOutcome::reply(state, message)
            }
            Intent::RequestClarification => {
                let message = self
                    .clarify(
                        utterance,
                        field,
                        classification.clarification_topic.as_deref(),
                        &state,
                        history,
                    )
                    .await;
                TurnOutcome::reply(state, message)
            }
            Intent::RequestDone => {
                info!("{} item abandoned by user", self.schema.domain);
                let message = summary::abandoned_message(self.schema, &state.record);
                state.mode = Mode::Abandoned;
                state.current_field = None;
                TurnOutcome::reply(state, message)
            }
            Intent::OffTopic => {
                let question = self.ask(field, &state, history, state.retries(field.name)).await;
                let message = format!("{} {question}", summary::off_topic_redirect(self.schema));
                TurnOutcome::reply(state, message)
            }
        }
    }

    async fn handle_answer(
        &self,
        mut state: SessionState,
        field: &'static FieldSpec,
        history: &[ChatTurn],
    ) -> TurnOutcome {
        let current = state.record.get(field.name).cloned();
        let extraction = match self
            .collaborators
            .extractor
            .extract_field(field, self.ctx(&state, history), current.as_ref())
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Extraction for '{}' failed, keeping current value: {e}", field.name);
                ExtractionResult::fallback(current.as_ref())
            }
        };

        let extracted = extraction
            .extracted_value
            .and_then(|raw| {
                FieldValue::from_extracted(raw, self.schema.is_multivalued(field.name))
            });
        let has_value = extracted.is_some();
        if let Some(value) = extracted {
            state.record.merge(field, value);
        }
        if extraction.needs_clarification {
            debug!(
                "Extractor flagged '{}' as ambiguous: {}",
                field.name,
                extraction.clarification_reason.as_deref().unwrap_or("no reason given")
            );
        }

        // Any extracted value counts as an answer, even if the extractor said otherwise.
        let complete = (extraction.is_complete && extraction.confidence > 0.5) || has_value;
        if complete {
            state.mark_complete(field.name);
            let ack = acknowledgment(field, state.interaction_count);
            return self
                .advance(state, history, ack, "Excellent! I believe I have all the information.")
                .await;
        }

        let asked = state.retries(field.name);
        let max = self.schema.max_retries(field.name);
        if asked >= max {
            info!("Field '{}' force-skipped after {asked} asks", field.name);
            state.mark_complete(field.name);
            let lead = format!("No problem, let's move on from {}.", field.spoken_name());
            return self
                .advance(state, history, &lead, "That's alright. I think we have everything.")
                .await;
        }

        let attempt = asked + 1;
        state.set_retries(field.name, attempt);
        let question = self.ask(field, &state, history, attempt).await;
        let intro = re_ask_intro(attempt >= max, state.interaction_count);
        TurnOutcome::reply(state, format!("{intro} {question}"))
    }

    /// Moves to the next incomplete field, or to confirmation when none is left.
    async fn advance(
        &self,
        mut state: SessionState,
        history: &[ChatTurn],
        lead: &str,
        confirmation_lead: &str,
    ) -> TurnOutcome {
        state.current_field = None;
        let Some(next) = self.schema.next_incomplete(&state.completion) else {
            return self.enter_confirmation(state, confirmation_lead);
        };

        state.set_retries(next.name, 1);
        state.current_field = Some(next.name.to_string());
        let question = self.ask(next, &state, history, 1).await;
        TurnOutcome::reply(state, format!("{lead} {question}"))
    }

    /// The pending field, or the first incomplete one if nothing valid is pending.
    fn resolve_current_field(&self, state: &mut SessionState) -> Option<&'static FieldSpec> {
        let pending = state
            .current_field
            .as_deref()
            .and_then(|name| self.schema.field(name))
            .filter(|f| !state.is_complete(f.name));
        let field = pending.or_else(|| self.schema.next_incomplete(&state.completion))?;

        state.current_field = Some(field.name.to_string());
        if state.retries(field.name) == 0 {
            state.set_retries(field.name, 1);
        }
        Some(field)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Collaborator calls with fallbacks
    // ────────────────────────────────────────────────────────────────────────

    fn ctx<'s>(&'s self, state: &'s SessionState, history: &'s [ChatTurn]) -> TurnContext<'s> {
        TurnContext {
            schema: self.schema,
            history,
            record: &state.record,
        }
    }

    async fn ask(
        &self,
        field: &FieldSpec,
        state: &SessionState,
        history: &[ChatTurn],
        retry_count: u32,
    ) -> String {
        match self
            .collaborators
            .questions
            .generate_question(field, self.ctx(state, history), retry_count)
            .await
        {
            Ok(q) if !q.question.trim().is_empty() => with_examples(q, retry_count),
            Ok(_) => {
                warn!("Question generator returned an empty question for '{}'", field.name);
                GeneratedQuestion::fallback(field, self.schema).question
            }
            Err(e) => {
                warn!("Question generation for '{}' failed: {e}", field.name);
                GeneratedQuestion::fallback(field, self.schema).question
            }
        }
    }

    async fn clarify(
        &self,
        utterance: &str,
        field: &FieldSpec,
        topic: Option<&str>,
        state: &SessionState,
        history: &[ChatTurn],
    ) -> String {
        let clarification = match self
            .collaborators
            .clarifier
            .generate_clarification(utterance, field, topic, self.ctx(state, history))
            .await
        {
            Ok(c) => c,
            Err(e) => {
                warn!("Clarification for '{}' failed: {e}", field.name);
                Clarification::fallback(field, self.schema)
            }
        };

        let mut message = clarification.explanation;
        if let Some(example) = clarification.example.filter(|e| !e.trim().is_empty()) {
            message.push_str(&format!("\n\n**For example:** {example}"));
        }
        message.push_str("\n\n");
        message.push_str(&clarification.follow_up_question);
        message
    }
}

/// Re-asks carry the generator's sample answers, when it gave any.
fn with_examples(question: GeneratedQuestion, retry_count: u32) -> String {
    if retry_count > 1 && !question.follow_up_examples.is_empty() {
        format!(
            "{} (e.g., {})",
            question.question,
            question.follow_up_examples.join(", ")
        )
    } else {
        question.question
    }
}
