//! Structured memory cards produced by the condensation worker.
//!
//! A condensed summary is either a memory-card JSON document or free text.
//! Cards may arrive double-encoded (a JSON string whose content is the card),
//! so parsing unwraps one level of string encoding before checking the schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schemas recognised as memory cards.
pub const MEMORY_CARD_SCHEMAS: [&str; 2] = ["memos.memory_card.v1", "memos.memory_card.v2"];
/// Risks shown per card.
pub const MAX_RISKS: usize = 8;
/// Actions shown per card.
pub const MAX_ACTIONS: usize = 12;

/// Parsed memory card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MemoryCard {
    pub schema: String,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub pitfalls: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub raw_excerpt: Option<String>,
}

/// Named list of card entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardBucket<'a> {
    pub label: &'static str,
    pub items: &'a [String],
}

impl MemoryCard {
    /// Facts, decisions, constraints and preferences in display order.
    pub fn buckets(&self) -> [CardBucket<'_>; 4] {
        [
            CardBucket {
                label: "Facts",
                items: &self.facts,
            },
            CardBucket {
                label: "Decisions",
                items: &self.decisions,
            },
            CardBucket {
                label: "Constraints",
                items: &self.constraints,
            },
            CardBucket {
                label: "Preferences",
                items: &self.preferences,
            },
        ]
    }

    /// Risks, falling back to v1 `pitfalls`, capped for display.
    pub fn display_risks(&self) -> Vec<&str> {
        let source = if self.risks.is_empty() {
            &self.pitfalls
        } else {
            &self.risks
        };
        non_empty(source, MAX_RISKS)
    }

    /// Actions, falling back to v1 `commands`, capped for display.
    pub fn display_actions(&self) -> Vec<&str> {
        let source = if self.actions.is_empty() {
            &self.commands
        } else {
            &self.actions
        };
        non_empty(source, MAX_ACTIONS)
    }
}

fn non_empty(items: &[String], limit: usize) -> Vec<&str> {
    items
        .iter()
        .map(String::as_str)
        .filter(|item| !item.is_empty())
        .take(limit)
        .collect()
}

/// Parse `text` as a memory card, returning `None` for free text.
pub fn parse_memory_card(text: &str) -> Option<MemoryCard> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('"')) {
        return None;
    }
    let mut value: Value = serde_json::from_str(trimmed).ok()?;
    if let Value::String(inner) = &value {
        let inner = inner.trim();
        if !inner.starts_with('{') {
            return None;
        }
        value = serde_json::from_str(inner).ok()?;
    }
    let schema = value.get("schema").and_then(Value::as_str)?;
    if !MEMORY_CARD_SCHEMAS.contains(&schema) {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Whether `text` is a structured memory card.
pub fn is_memory_card(text: &str) -> bool {
    parse_memory_card(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn card_json() -> String {
        json!({
            "schema": "memos.memory_card.v2",
            "facts": ["deadline is Jan 2024"],
            "decisions": ["manager approved"],
            "risks": [],
            "pitfalls": ["frontend module slips again"],
            "actions": ["notify QA", ""],
            "raw_excerpt": "User delayed Project Phoenix"
        })
        .to_string()
    }

    #[test]
    fn parses_plain_card() {
        let card = parse_memory_card(&format!("  {}\n", card_json())).expect("card");
        assert_eq!(card.schema, "memos.memory_card.v2");
        assert_eq!(card.facts, vec!["deadline is Jan 2024".to_string()]);
        assert_eq!(card.raw_excerpt.as_deref(), Some("User delayed Project Phoenix"));
    }

    #[test]
    fn parses_double_encoded_card() {
        let encoded = serde_json::to_string(&card_json()).expect("encode");
        assert!(encoded.starts_with('"'));
        assert!(is_memory_card(&encoded));
    }

    #[test]
    fn rejects_free_text_and_other_schemas() {
        assert!(!is_memory_card("User delayed the deadline."));
        assert!(!is_memory_card(""));
        assert!(!is_memory_card(r#"{"schema": "memos.summary.v1"}"#));
        assert!(!is_memory_card(r#"{"facts": []}"#));
        assert!(!is_memory_card(r#""just a quoted string""#));
        assert!(!is_memory_card("{not json"));
    }

    #[test]
    fn risks_and_actions_fall_back_to_legacy_fields() {
        let card = parse_memory_card(&card_json()).expect("card");
        assert_eq!(card.display_risks(), vec!["frontend module slips again"]);
        assert_eq!(card.display_actions(), vec!["notify QA"]);

        let legacy = MemoryCard {
            schema: "memos.memory_card.v1".to_string(),
            commands: (0..20).map(|i| format!("cmd {i}")).collect(),
            ..MemoryCard::default()
        };
        assert_eq!(legacy.display_actions().len(), MAX_ACTIONS);
    }

    #[test]
    fn buckets_follow_display_order() {
        let card = parse_memory_card(&card_json()).expect("card");
        let labels: Vec<&str> = card.buckets().iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["Facts", "Decisions", "Constraints", "Preferences"]);
        assert_eq!(card.buckets()[1].items.len(), 1);
    }
}
