// Prompt templates for the four interview collaborators.
// Placeholders are `{name}` tokens filled with `str::replace`.

use chrono::NaiveDate;

use crate::interview::collaborators::TurnContext;
use crate::interview::schema::FieldSpec;
use crate::interview::session::{ChatTurn, Role};

/// Intent classification. Replace: {item_noun}, {field_name}, {field_description},
/// {collected_json}, {history}, {utterance}
pub const INTENT_PROMPT_TEMPLATE: &str = r#"You are classifying one message in an interview that collects a single {item_noun} for a resume.

The interviewer is currently asking about the field "{field_name}": {field_description}

Information collected so far:
{collected_json}

Recent conversation:
{history}

Latest user message:
"{utterance}"

Classify the latest message as exactly one intent:
- "answer_question": the user is answering (even partially or vaguely) the current question
- "request_summary": the user asks what has been collected so far
- "request_clarification": the user asks what the question means, or asks for an example
- "request_done": the user wants to stop working on this {item_noun} without finishing it
- "off_topic": the message has nothing to do with the {item_noun}

When unsure between answer_question and anything else, choose answer_question.

Return a JSON object with this EXACT schema:
{
  "intent": "answer_question",
  "confidence": 0.9,
  "clarification_topic": null
}
Set "clarification_topic" to a short phrase only for request_clarification."#;

/// Field extraction. Replace: {item_noun}, {field_name}, {field_description},
/// {value_shape}, {current_value}, {collected_json}, {history}, {date_note}
pub const EXTRACT_PROMPT_TEMPLATE: &str = r#"You extract one field of a {item_noun} from an interview.

TARGET FIELD: "{field_name}": {field_description}
VALUE SHAPE: {value_shape}
CURRENT VALUE: {current_value}

Information collected so far (for context only):
{collected_json}

Conversation (the LAST user message is the one to extract from):
{history}
{date_note}
Rules:
1. Extract ONLY information about the target field. If the latest message talks about other fields but not this one, return "extracted_value": null, "is_complete": false, "confidence": 0.1.
2. Never invent details the user did not state.
3. If the user says they have nothing for this field, return "extracted_value": null, "is_complete": true, "confidence": 1.0.
4. Confidence: 1.0 for an explicit answer, below 0.8 for an inference, below 0.3 for vague or unrelated text.
5. Set "needs_clarification" to true when the answer is too ambiguous to record, and say why.

Return a JSON object with this EXACT schema:
{
  "extracted_value": null,
  "is_complete": false,
  "confidence": 0.0,
  "needs_clarification": false,
  "clarification_reason": null
}"#;

/// Question generation. Replace: {item_noun}, {field_name}, {field_description},
/// {attempt_note}, {collected_json}, {history}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Write the next interview question for a {item_noun} on a resume.

Ask about exactly this field: "{field_name}": {field_description}
{attempt_note}

Information collected so far:
{collected_json}

Recent conversation:
{history}

Rules:
- One or two sentences. No greeting, no acknowledgment of the previous answer.
- Refer to what is already known when it makes the question more natural.
- Do not ask about any other field.

Return a JSON object with this EXACT schema:
{
  "question": "...",
  "follow_up_examples": ["...", "..."]
}"#;

/// Clarification. Replace: {item_noun}, {field_name}, {field_description},
/// {topic}, {utterance}, {collected_json}, {history}
pub const CLARIFY_PROMPT_TEMPLATE: &str = r#"The user is confused by an interview question about their {item_noun}.

The question is about the field "{field_name}": {field_description}
What they are unsure about: {topic}
Their message: "{utterance}"

Information collected so far:
{collected_json}

Recent conversation:
{history}

Explain in one or two friendly sentences what this field means, give one short concrete
example, then ask the question again in simpler words.

Return a JSON object with this EXACT schema:
{
  "explanation": "...",
  "example": "...",
  "follow_up_question": "..."
}"#;

/// Renders the last `window` turns as `User:` / `AI:` lines.
pub fn format_history(history: &[ChatTurn], window: usize) -> String {
    let start = history.len().saturating_sub(window);
    let lines: Vec<String> = history[start..]
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::User => "User",
                Role::Assistant => "AI",
            };
            format!("{speaker}: {}", turn.text.trim())
        })
        .collect();

    if lines.is_empty() {
        "(no conversation yet)".to_string()
    } else {
        lines.join("\n")
    }
}

fn collected_json(ctx: &TurnContext<'_>) -> String {
    serde_json::to_string_pretty(&ctx.record.present_values()).unwrap_or_else(|_| "{}".to_string())
}

fn value_shape(field: &FieldSpec) -> &'static str {
    if field.multivalued {
        "a JSON array of short strings, one item per entry"
    } else if is_timeline(field) {
        r#"an object {"start_date": "Mon YYYY", "end_date": "Mon YYYY" or "Present"}"#
    } else {
        "a single string (or a number if the field is numeric)"
    }
}

fn is_timeline(field: &FieldSpec) -> bool {
    field.name == "timeline"
}

pub fn intent_prompt(
    utterance: &str,
    field: &FieldSpec,
    ctx: &TurnContext<'_>,
    window: usize,
) -> String {
    INTENT_PROMPT_TEMPLATE
        .replace("{item_noun}", ctx.schema.item_noun)
        .replace("{field_name}", field.name)
        .replace("{field_description}", field.description)
        .replace("{collected_json}", &collected_json(ctx))
        .replace("{history}", &format_history(ctx.history, window))
        .replace("{utterance}", utterance.trim())
}

/// `today` anchors relative dates ("last summer") for timeline fields.
pub fn extract_prompt(
    field: &FieldSpec,
    ctx: &TurnContext<'_>,
    current_value: Option<&str>,
    window: usize,
    today: NaiveDate,
) -> String {
    let date_note = if is_timeline(field) {
        format!(
            "\nToday's date is {}. Resolve relative dates against it.\n",
            today.format("%B %-d, %Y")
        )
    } else {
        String::new()
    };

    EXTRACT_PROMPT_TEMPLATE
        .replace("{item_noun}", ctx.schema.item_noun)
        .replace("{field_name}", field.name)
        .replace("{field_description}", field.description)
        .replace("{value_shape}", value_shape(field))
        .replace("{current_value}", current_value.unwrap_or("(none)"))
        .replace("{collected_json}", &collected_json(ctx))
        .replace("{history}", &format_history(ctx.history, window))
        .replace("{date_note}", &date_note)
}

pub fn question_prompt(
    field: &FieldSpec,
    ctx: &TurnContext<'_>,
    retry_count: u32,
    window: usize,
) -> String {
    let attempt_note = if retry_count > 1 {
        format!(
            "This is attempt {retry_count}: the previous answer was unclear. \
             Rephrase more simply and include a short example of a good answer."
        )
    } else {
        "This is the first time this field is asked.".to_string()
    };

    QUESTION_PROMPT_TEMPLATE
        .replace("{item_noun}", ctx.schema.item_noun)
        .replace("{field_name}", field.name)
        .replace("{field_description}", field.description)
        .replace("{attempt_note}", &attempt_note)
        .replace("{collected_json}", &collected_json(ctx))
        .replace("{history}", &format_history(ctx.history, window))
}

pub fn clarify_prompt(
    utterance: &str,
    field: &FieldSpec,
    topic: Option<&str>,
    ctx: &TurnContext<'_>,
    window: usize,
) -> String {
    CLARIFY_PROMPT_TEMPLATE
        .replace("{item_noun}", ctx.schema.item_noun)
        .replace("{field_name}", field.name)
        .replace("{field_description}", field.description)
        .replace("{topic}", topic.unwrap_or("the question in general"))
        .replace("{utterance}", utterance.trim())
        .replace("{collected_json}", &collected_json(ctx))
        .replace("{history}", &format_history(ctx.history, window))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::interview::domains::Domain;
    use crate::interview::schema::RetryPolicy;
    use crate::interview::session::{FieldValue, ItemRecord};

    fn history(n: usize) -> Vec<ChatTurn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatTurn::assistant(format!("question {i}"))
                } else {
                    ChatTurn::user(format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn test_format_history_keeps_last_window() {
        let turns = history(5);
        let text = format_history(&turns, 2);
        assert_eq!(text, "User: answer 3\nAI: question 4");
    }

    #[test]
    fn test_format_history_labels_roles() {
        let turns = vec![ChatTurn::assistant("What was your title?"), ChatTurn::user(" Engineer ")];
        assert_eq!(
            format_history(&turns, 10),
            "AI: What was your title?\nUser: Engineer"
        );
        assert_eq!(format_history(&[], 10), "(no conversation yet)");
    }

    #[test]
    fn test_intent_prompt_fills_every_placeholder() {
        let schema = Domain::Experience.schema(RetryPolicy::default());
        let mut record = ItemRecord::default();
        record.merge(schema.field("title").unwrap(), FieldValue::Scalar(json!("Engineer")));
        let turns = history(2);
        let ctx = TurnContext {
            schema: &schema,
            history: &turns,
            record: &record,
        };
        let field = schema.field("organization_name").unwrap();
        let prompt = intent_prompt("Acme Corp", field, &ctx, 10);

        assert!(prompt.contains("\"organization_name\""));
        assert!(prompt.contains("\"Engineer\""));
        assert!(prompt.contains("\"Acme Corp\""));
        assert!(!prompt.contains("{item_noun}"));
        assert!(!prompt.contains("{history}"));
    }

    #[test]
    fn test_extract_prompt_dates_only_timeline() {
        let schema = Domain::Education.schema(RetryPolicy::default());
        let record = ItemRecord::default();
        let ctx = TurnContext {
            schema: &schema,
            history: &[],
            record: &record,
        };
        let today = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();

        let timeline = schema.field("timeline").unwrap();
        let prompt = extract_prompt(timeline, &ctx, None, 10, today);
        assert!(prompt.contains("Today's date is November 3, 2025."));
        assert!(prompt.contains("start_date"));
        assert!(prompt.contains("CURRENT VALUE: (none)"));

        let school = schema.field("institution_name").unwrap();
        let prompt = extract_prompt(school, &ctx, Some("MIT"), 10, today);
        assert!(!prompt.contains("Today's date"));
        assert!(prompt.contains("CURRENT VALUE: MIT"));
        assert!(!prompt.contains("{date_note}"));
    }

    #[test]
    fn test_extract_prompt_describes_list_shape() {
        let schema = Domain::Skills.schema(RetryPolicy::default());
        let record = ItemRecord::default();
        let ctx = TurnContext {
            schema: &schema,
            history: &[],
            record: &record,
        };
        let field = schema.field("skills_list").unwrap();
        let prompt = extract_prompt(field, &ctx, None, 10, NaiveDate::MIN);
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_question_prompt_mentions_retry() {
        let schema = Domain::Achievement.schema(RetryPolicy::default());
        let record = ItemRecord::default();
        let ctx = TurnContext {
            schema: &schema,
            history: &[],
            record: &record,
        };
        let field = schema.field("achievement_title").unwrap();
        assert!(question_prompt(field, &ctx, 1, 10).contains("first time"));
        assert!(question_prompt(field, &ctx, 2, 10).contains("attempt 2"));
    }

    #[test]
    fn test_clarify_prompt_defaults_topic() {
        let schema = Domain::Skills.schema(RetryPolicy::default());
        let record = ItemRecord::default();
        let ctx = TurnContext {
            schema: &schema,
            history: &[],
            record: &record,
        };
        let field = schema.field("proficiency_level").unwrap();
        let prompt = clarify_prompt("what?", field, None, &ctx, 10);
        assert!(prompt.contains("the question in general"));
        let prompt = clarify_prompt("what levels?", field, Some("levels"), &ctx, 10);
        assert!(prompt.contains("What they are unsure about: levels"));
    }
}
