//! Summary rendering and the fixed texts of the confirmation/edit subflow.

use crate::interview::schema::{DomainSchema, HeaderStyle};
use crate::interview::session::ItemRecord;

/// Scalar text of a header field, if the user gave one.
fn header_value(record: &ItemRecord, field: &str) -> Option<String> {
    record
        .get(field)
        .filter(|v| v.is_present())
        .map(|v| v.render())
}

/// The item's display title, e.g. "Software Engineer" for an experience.
pub fn item_title(schema: &DomainSchema, record: &ItemRecord) -> String {
    header_value(record, schema.header.primary())
        .unwrap_or_else(|| format!("Untitled {}", capitalize(schema.item_noun)))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_header(schema: &DomainSchema, record: &ItemRecord) -> String {
    let title = item_title(schema, record);
    match schema.header {
        HeaderStyle::At { secondary, .. } => {
            let place = header_value(record, secondary).unwrap_or_else(|| "Unnamed Organization".to_string());
            format!("**{title} at {place}**")
        }
        HeaderStyle::From { secondary, .. } => match header_value(record, secondary) {
            Some(org) => format!("**{title}** (from {org})"),
            None => format!("**{title}**"),
        },
        HeaderStyle::Single { .. } => format!("**{title}**"),
    }
}

/// Header line plus one `- <Label>: <value>` line per present non-header field,
/// in schema order.
pub fn render_summary(schema: &DomainSchema, record: &ItemRecord) -> String {
    let mut lines = vec![render_header(schema, record)];
    for field in schema.fields_in_order() {
        if schema.is_header_field(field.name) {
            continue;
        }
        if let Some(value) = record.get(field.name).filter(|v| v.is_present()) {
            lines.push(format!("- {}: {}", field.label(), value.render()));
        }
    }
    lines.join("\n")
}

const CONFIRM_QUESTION: &str = "**Does everything look correct?** (Please respond 'yes' or 'no').";

/// Summary + yes/no prompt shown when entering confirmation. `lead` sets the tone
/// for how the last field was closed (answered, skipped, or given up on).
pub fn confirmation_prompt(schema: &DomainSchema, record: &ItemRecord, lead: &str) -> String {
    format!(
        "{lead} Here's the summary for **{}**:\n\n{}\n\n{CONFIRM_QUESTION}",
        item_title(schema, record),
        render_summary(schema, record)
    )
}

pub fn confirmation_reprompt(schema: &DomainSchema) -> String {
    format!(
        "I didn't quite catch that. Is the {} information correct and ready to submit? \
         (Please respond 'yes' or 'no').",
        schema.item_noun
    )
}

pub fn submitted_message(schema: &DomainSchema) -> String {
    format!(
        "Perfect! Your {} has been submitted successfully. Thanks for sharing!",
        schema.item_noun
    )
}

pub fn commit_failed_message(schema: &DomainSchema) -> String {
    format!(
        "Sorry, I couldn't save your {} just now. Please reply 'yes' to try again.",
        schema.item_noun
    )
}

pub fn edit_target_prompt(schema: &DomainSchema) -> String {
    format!(
        "No problem! **Which field would you like to update?** (e.g., {}).\n\n\
         Once you're satisfied with the changes, just say 'submit'.",
        schema.edit_examples()
    )
}

pub fn edit_target_reprompt(schema: &DomainSchema) -> String {
    format!(
        "I'm not sure which field you'd like to edit. Could you specify? (e.g., {}). \
         Or just say 'submit' if everything looks good.",
        schema.edit_examples()
    )
}

pub fn progress_summary(schema: &DomainSchema, record: &ItemRecord) -> String {
    if record.is_empty() {
        format!("We haven't captured any {} details yet!", schema.item_noun)
    } else {
        format!(
            "Of course! Here's what we have so far:\n\n{}",
            render_summary(schema, record)
        )
    }
}

pub fn abandoned_message(schema: &DomainSchema, record: &ItemRecord) -> String {
    if record.has_value(schema.header.primary()) {
        format!(
            "Understood. I'll stop collecting information for this {}. Since we haven't captured \
             everything, I won't save this one. Feel free to start again anytime!",
            schema.item_noun
        )
    } else {
        format!(
            "Alright, no {} has been captured yet. Let me know if you'd like to start!",
            schema.item_noun
        )
    }
}

pub fn closed_message(schema: &DomainSchema) -> String {
    format!(
        "This {} is already closed. Start a new one whenever you're ready.",
        schema.item_noun
    )
}

pub fn off_topic_redirect(schema: &DomainSchema) -> String {
    format!(
        "I appreciate you sharing that! However, I'm specifically focused on collecting \
         information about {} right now.",
        schema.topic
    )
}
