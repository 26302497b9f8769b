//! Fixed phrase sets and the keyword matching that runs before (or instead of)
//! any model call: skips, yes/no confirmation, edit-target naming.

use crate::interview::schema::{DomainSchema, FieldSpec};

const SKIP_PHRASES: &[&str] = &[
    "skip",
    "i don't know",
    "don't know",
    "n/a",
    "na",
    "not applicable",
    "none",
    "nothing",
];

const CONFIRM_YES: &[&str] = &[
    "yes",
    "ok",
    "okay",
    "correct",
    "submit",
    "looks good",
    "yep",
    "sure",
    "confirm",
];

const CONFIRM_NO: &[&str] = &["no", "edit", "change", "wrong", "nope", "incorrect"];

const STOP_EDITING: &[&str] = &["submit", "done", "looks good", "that's all"];

const RE_ASK_FIRST: &[&str] = &[
    "I didn't quite catch that.",
    "Could you elaborate on that?",
    "I need a bit more detail on that.",
    "Let me ask that differently:",
    "Could you clarify that for me?",
];

const RE_ASK_LAST: &[&str] = &[
    "I'm still not clear on that part.",
    "Let me try asking again:",
    "Could you help me understand this better?",
    "If you recall,",
    "Just to make sure I have this right,",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationReply {
    Yes,
    No,
    Unclear,
}

/// Drops punctuation, trims, lowercases. `"N/A!"` → `"na"`.
pub fn clean_user_input(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Word-bounded containment on already-cleaned text.
fn contains_phrase(cleaned: &str, phrase: &str) -> bool {
    let phrase = clean_user_input(phrase);
    if phrase.is_empty() {
        return false;
    }
    let haystack = format!(" {} ", cleaned.split_whitespace().collect::<Vec<_>>().join(" "));
    haystack.contains(&format!(" {phrase} "))
}

fn matches_any(cleaned: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(cleaned, p))
}

/// The whole message is a skip phrase; partial matches do not count.
pub fn is_skip(utterance: &str) -> bool {
    let cleaned = clean_user_input(utterance);
    SKIP_PHRASES.iter().any(|p| clean_user_input(p) == cleaned)
}

pub fn classify_confirmation(utterance: &str) -> ConfirmationReply {
    let cleaned = clean_user_input(utterance);
    match (matches_any(&cleaned, CONFIRM_YES), matches_any(&cleaned, CONFIRM_NO)) {
        (true, false) => ConfirmationReply::Yes,
        (false, true) => ConfirmationReply::No,
        _ => ConfirmationReply::Unclear,
    }
}

pub fn is_stop_editing(utterance: &str) -> bool {
    matches_any(&clean_user_input(utterance), STOP_EDITING)
}

/// First field, in schema order, that the user names by field name, label, or alias.
pub fn find_edit_target(schema: &DomainSchema, utterance: &str) -> Option<&'static FieldSpec> {
    let cleaned = clean_user_input(utterance);
    // Padded so a field name only matches whole `_`-separated tokens.
    let underscored = format!("_{}_", cleaned.split_whitespace().collect::<Vec<_>>().join("_"));
    schema.fields_in_order().iter().find(|f| {
        underscored.contains(&format!("_{}_", f.name))
            || contains_phrase(&cleaned, &f.spoken_name())
            || f.aliases.iter().any(|a| contains_phrase(&cleaned, a))
    })
}

/// Deterministic pick so a replayed session produces the same wording.
fn pick(options: &'static [&'static str], seed: u64) -> &'static str {
    if options.is_empty() {
        return "";
    }
    options[(seed % options.len() as u64) as usize]
}

pub fn acknowledgment(field: &FieldSpec, seed: u64) -> &'static str {
    pick(field.acknowledgments, seed)
}

/// Re-ask framing: the final attempt gets the "last chance" wording.
pub fn re_ask_intro(final_attempt: bool, seed: u64) -> &'static str {
    if final_attempt {
        pick(RE_ASK_LAST, seed)
    } else {
        pick(RE_ASK_FIRST, seed)
    }
}
