//! Per-conversation state: the item under construction plus the bookkeeping the
//! dispatcher needs to decide what to ask next.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::interview::domains::Domain;
use crate::interview::schema::{DomainSchema, FieldSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Collecting,
    AwaitingConfirmation,
    AwaitingEditTarget,
    /// Terminal: the item was committed.
    Submitted,
    /// Terminal: the user stopped before committing; nothing was saved.
    Abandoned,
}

impl Mode {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Mode::Submitted | Mode::Abandoned)
    }
}

/// True when a JSON value carries actual content.
pub fn value_is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// The value held for one field: a list for multivalued fields, otherwise a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    List(Vec<Value>),
    Scalar(Value),
}

impl FieldValue {
    /// Normalizes a raw extracted value to the shape the field expects.
    /// Returns `None` when nothing meaningful was extracted.
    pub fn from_extracted(raw: Value, multivalued: bool) -> Option<Self> {
        if !value_is_present(&raw) {
            return None;
        }
        match (raw, multivalued) {
            (Value::Array(items), true) => {
                let items: Vec<Value> = items.into_iter().filter(value_is_present).collect();
                (!items.is_empty()).then_some(FieldValue::List(items))
            }
            (scalar, true) => Some(FieldValue::List(vec![scalar])),
            (scalar, false) => Some(FieldValue::Scalar(scalar)),
        }
    }

    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::List(items) => items.iter().any(value_is_present),
            FieldValue::Scalar(v) => value_is_present(v),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::List(items) => Value::Array(items.clone()),
            FieldValue::Scalar(v) => v.clone(),
        }
    }

    /// Human-readable rendering for summaries.
    pub fn render(&self) -> String {
        match self {
            FieldValue::List(items) => items
                .iter()
                .filter(|v| value_is_present(v))
                .map(render_json)
                .collect::<Vec<_>>()
                .join(", "),
            FieldValue::Scalar(v) => render_json(v),
        }
    }
}

fn render_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) if map.contains_key("start_date") || map.contains_key("end_date") => {
            let start = map.get("start_date").and_then(|v| v.as_str()).unwrap_or("");
            let end = map
                .get("end_date")
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("Present");
            format!("{start} - {end}")
        }
        other => other.to_string(),
    }
}

/// The partial or complete item under construction, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRecord(BTreeMap<String, FieldValue>);

impl ItemRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn has_value(&self, field: &str) -> bool {
        self.get(field).map(FieldValue::is_present).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        !self.0.values().any(FieldValue::is_present)
    }

    /// Merges an extracted value into the record.
    ///
    /// Multivalued fields take the union of old and new items, first-seen order,
    /// duplicates dropped. Scalar fields are overwritten.
    pub fn merge(&mut self, field: &FieldSpec, value: FieldValue) {
        if !field.multivalued {
            self.0.insert(field.name.to_string(), value);
            return;
        }

        let incoming = match value {
            FieldValue::List(items) => items,
            FieldValue::Scalar(v) => vec![v],
        };
        let mut merged = match self.0.remove(field.name) {
            Some(FieldValue::List(items)) => items,
            Some(FieldValue::Scalar(v)) if value_is_present(&v) => vec![v],
            _ => Vec::new(),
        };
        for item in incoming {
            if value_is_present(&item) && !merged.contains(&item) {
                merged.push(item);
            }
        }
        self.0.insert(field.name.to_string(), FieldValue::List(merged));
    }

    /// Only the fields that currently hold a value, as a JSON object.
    pub fn present_values(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .filter(|(_, v)| v.is_present())
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// The finished item as committed: every schema field, `null` where nothing was captured.
    pub fn to_committed(&self, schema: &DomainSchema) -> Value {
        Value::Object(
            schema
                .fields_in_order()
                .iter()
                .map(|f| {
                    let value = self
                        .get(f.name)
                        .filter(|v| v.is_present())
                        .map(FieldValue::to_json)
                        .unwrap_or(Value::Null);
                    (f.name.to_string(), value)
                })
                .collect(),
        )
    }
}

/// Everything the engine knows about one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub domain: Domain,
    pub record: ItemRecord,
    pub completion: BTreeMap<String, bool>,
    pub retry_count: BTreeMap<String, u32>,
    pub mode: Mode,
    pub current_field: Option<String>,
    pub interaction_count: u64,
}

impl SessionState {
    /// Fresh state for a new item: nothing collected, the first field pending.
    pub fn new(schema: &DomainSchema) -> Self {
        let completion = schema
            .fields_in_order()
            .iter()
            .map(|f| (f.name.to_string(), false))
            .collect();
        let mut retry_count: BTreeMap<String, u32> = schema
            .fields_in_order()
            .iter()
            .map(|f| (f.name.to_string(), 0))
            .collect();
        let current_field = schema.first_field().map(|f| {
            retry_count.insert(f.name.to_string(), 1);
            f.name.to_string()
        });

        Self {
            domain: schema.domain,
            record: ItemRecord::default(),
            completion,
            retry_count,
            mode: Mode::Collecting,
            current_field,
            interaction_count: 0,
        }
    }

    pub fn is_complete(&self, field: &str) -> bool {
        self.completion.get(field).copied().unwrap_or(false)
    }

    pub fn mark_complete(&mut self, field: &str) {
        self.completion.insert(field.to_string(), true);
    }

    pub fn retries(&self, field: &str) -> u32 {
        self.retry_count.get(field).copied().unwrap_or(0)
    }

    pub fn set_retries(&mut self, field: &str, count: u32) {
        self.retry_count.insert(field.to_string(), count);
    }

    /// Edit subflow: the only path on which a completion flag goes back to false.
    pub fn reopen(&mut self, field: &str) {
        self.completion.insert(field.to_string(), false);
        self.retry_count.insert(field.to_string(), 0);
    }

    pub fn all_complete(&self, schema: &DomainSchema) -> bool {
        schema
            .fields_in_order()
            .iter()
            .all(|f| self.is_complete(f.name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(anyhow::anyhow!("unknown transcript role '{other}'")),
        }
    }
}

/// One line of the conversation, as handed to the language model for context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}
