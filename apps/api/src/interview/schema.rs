//! Field schema: the static, per-domain description of what an interview collects.
//!
//! A domain is nothing more than an ordered list of `FieldSpec`s plus a retry policy.
//! The dispatcher never branches on domain; everything domain-specific lives here
//! and in `domains.rs`.

use std::collections::BTreeMap;

use crate::interview::domains::Domain;

const GENERIC_ACKNOWLEDGMENTS: &[&str] = &["Thanks!", "Got it.", "Noted."];

/// One collectible attribute of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub mandatory: bool,
    pub multivalued: bool,
    /// Short words a user may use to name this field when choosing what to edit.
    pub aliases: &'static [&'static str],
    pub acknowledgments: &'static [&'static str],
}

impl FieldSpec {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            mandatory: true,
            multivalued: false,
            aliases: &[],
            acknowledgments: GENERIC_ACKNOWLEDGMENTS,
        }
    }

    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            mandatory: false,
            ..Self::required(name, description)
        }
    }

    pub const fn list(self) -> Self {
        Self {
            multivalued: true,
            ..self
        }
    }

    pub const fn aka(self, aliases: &'static [&'static str]) -> Self {
        Self { aliases, ..self }
    }

    pub const fn acks(self, acknowledgments: &'static [&'static str]) -> Self {
        Self {
            acknowledgments,
            ..self
        }
    }

    /// `tools_and_technologies` → `Tools And Technologies`
    pub fn label(&self) -> String {
        self.name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `tools_and_technologies` → `tools and technologies`
    pub fn spoken_name(&self) -> String {
        self.name.replace('_', " ")
    }
}

/// How many times a field is asked before it is force-skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub mandatory: u32,
    pub optional: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            mandatory: 2,
            optional: 1,
        }
    }
}

/// How the item's title line is rendered at the top of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    /// `**<primary> at <secondary>**`
    At {
        primary: &'static str,
        secondary: &'static str,
    },
    /// `**<primary>** (from <secondary>)`
    From {
        primary: &'static str,
        secondary: &'static str,
    },
    /// `**<primary>**`
    Single { primary: &'static str },
}

impl HeaderStyle {
    pub fn primary(&self) -> &'static str {
        match *self {
            HeaderStyle::At { primary, .. }
            | HeaderStyle::From { primary, .. }
            | HeaderStyle::Single { primary } => primary,
        }
    }

    pub fn fields(&self) -> Vec<&'static str> {
        match *self {
            HeaderStyle::At { primary, secondary } | HeaderStyle::From { primary, secondary } => {
                vec![primary, secondary]
            }
            HeaderStyle::Single { primary } => vec![primary],
        }
    }
}

/// The ordered field list of one domain plus its presentation details.
#[derive(Debug, Clone)]
pub struct DomainSchema {
    pub domain: Domain,
    /// Singular noun for the item, e.g. "experience".
    pub item_noun: &'static str,
    /// What the interview is about, used when steering an off-topic user back.
    pub topic: &'static str,
    /// Fixed first message; asks for the first field without a model call.
    pub opening: &'static str,
    pub header: HeaderStyle,
    pub retries: RetryPolicy,
    fields: &'static [FieldSpec],
}

impl DomainSchema {
    pub fn new(
        domain: Domain,
        item_noun: &'static str,
        topic: &'static str,
        opening: &'static str,
        header: HeaderStyle,
        fields: &'static [FieldSpec],
        retries: RetryPolicy,
    ) -> Self {
        Self {
            domain,
            item_noun,
            topic,
            opening,
            header,
            retries,
            fields,
        }
    }

    pub fn fields_in_order(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn first_field(&self) -> Option<&'static FieldSpec> {
        self.fields.first()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_mandatory(&self, name: &str) -> bool {
        self.field(name).map(|f| f.mandatory).unwrap_or(false)
    }

    /// Whether answers to `name` accumulate into a list. Unknown names are scalar.
    pub fn is_multivalued(&self, name: &str) -> bool {
        self.field(name).map(|f| f.multivalued).unwrap_or(false)
    }

    pub fn max_retries(&self, name: &str) -> u32 {
        if self.is_mandatory(name) {
            self.retries.mandatory
        } else {
            self.retries.optional
        }
    }

    pub fn is_header_field(&self, name: &str) -> bool {
        self.header.fields().contains(&name)
    }

    /// First field in schema order whose completion flag is not set.
    pub fn next_incomplete(&self, completion: &BTreeMap<String, bool>) -> Option<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|f| !completion.get(f.name).copied().unwrap_or(false))
    }

    /// A few spoken field names to show as examples in the edit prompt.
    pub fn edit_examples(&self) -> String {
        self.fields
            .iter()
            .take(3)
            .map(|f| format!("'{}'", f.aliases.first().copied().unwrap_or(f.name).replace('_', " ")))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
