//! Read-only projection of a backend context pack.
//!
//! Packs are loosely typed JSON. Every accessor tolerates missing or
//! mistyped fields and substitutes the same defaults the dashboard shows.

use serde_json::{Map, Value};

pub const MAX_PACK_TOOLS: usize = 8;
pub const MAX_PACK_L1_MESSAGES: usize = 10;
pub const MAX_PACK_CHUNKS: usize = 8;
/// Shown when the pack has no session summary yet.
pub const NO_SUMMARY_PLACEHOLDER: &str = "(no summary yet)";

#[derive(Debug, Clone, PartialEq)]
pub struct PackTool {
    pub name: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackMessage {
    pub role: String,
    pub text: String,
}

impl PackMessage {
    /// `[role] text`
    pub fn line(&self) -> String {
        format!("[{}] {}", self.role, self.text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackChunk {
    /// Last eight characters of the chunk id.
    pub short_id: String,
    pub score: Option<f64>,
    pub tier: String,
}

impl PackChunk {
    /// `- <id> score=0.912 <tier>` with absent parts left out.
    pub fn line(&self) -> String {
        let mut parts = vec![format!("- {}", self.short_id)];
        if let Some(score) = self.score {
            parts.push(format!("score={score:.3}"));
        }
        if !self.tier.is_empty() {
            parts.push(self.tier.clone());
        }
        parts.join(" ")
    }
}

/// Display-ready context pack.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextPackView {
    pub schema: String,
    pub query_text: String,
    pub prompt_name: String,
    pub prompt_description: String,
    /// First [`MAX_PACK_TOOLS`] tools.
    pub tools: Vec<PackTool>,
    /// First [`MAX_PACK_L1_MESSAGES`] L1 messages.
    pub l1_window: Vec<PackMessage>,
    /// Summary text; may be a memory card.
    pub session_summary: String,
    /// Last eight characters of the summary id, empty when absent.
    pub session_summary_short_id: String,
    /// First [`MAX_PACK_CHUNKS`] retrieved chunks.
    pub raw_chunks: Vec<PackChunk>,
}

impl ContextPackView {
    pub fn from_value(pack: &Value) -> Self {
        let empty = Map::new();
        let pack = as_object(pack).unwrap_or(&empty);
        let procedural = field_object(pack, "procedural");
        let prompt = procedural.and_then(|p| field_object(p, "prompt"));
        let working = field_object(pack, "working_memory");
        let retrieval = field_object(pack, "retrieval");

        let tools = procedural
            .map(|p| field_array(p, "tools"))
            .unwrap_or_default()
            .iter()
            .take(MAX_PACK_TOOLS)
            .map(|tool| {
                let tool = as_object(tool);
                PackTool {
                    name: or_default(tool.map(|t| field_str(t, "name")).unwrap_or(""), "tool"),
                    endpoint: tool
                        .map(|t| field_str(t, "endpoint"))
                        .unwrap_or("")
                        .to_string(),
                }
            })
            .collect();

        let l1_window = working
            .map(|w| field_array(w, "l1_window"))
            .unwrap_or_default()
            .iter()
            .take(MAX_PACK_L1_MESSAGES)
            .map(|msg| {
                let msg = as_object(msg);
                PackMessage {
                    role: msg.map(|m| field_str(m, "role")).unwrap_or("").to_string(),
                    text: msg.map(|m| field_str(m, "text")).unwrap_or("").to_string(),
                }
            })
            .collect();

        let raw_chunks = retrieval
            .map(|r| field_array(r, "raw_chunks"))
            .unwrap_or_default()
            .iter()
            .take(MAX_PACK_CHUNKS)
            .map(|chunk| {
                let chunk = as_object(chunk);
                PackChunk {
                    short_id: tail(chunk.map(|c| field_str(c, "id")).unwrap_or(""), 8),
                    score: chunk
                        .and_then(|c| c.get("score"))
                        .and_then(Value::as_f64)
                        .filter(|score| score.is_finite()),
                    tier: chunk.map(|c| field_str(c, "tier")).unwrap_or("").to_string(),
                }
            })
            .collect();

        let summary = working.map(|w| field_str(w, "session_summary")).unwrap_or("");
        let summary_id = working
            .map(|w| field_str(w, "session_summary_id"))
            .unwrap_or("");

        Self {
            schema: field_str(pack, "schema").to_string(),
            query_text: field_str(pack, "query_text").to_string(),
            prompt_name: or_default(prompt.map(|p| field_str(p, "name")).unwrap_or(""), "default"),
            prompt_description: prompt
                .map(|p| field_str(p, "description"))
                .unwrap_or("")
                .to_string(),
            tools,
            l1_window,
            session_summary: or_default(summary, NO_SUMMARY_PLACEHOLDER),
            session_summary_short_id: tail(summary_id, 8),
            raw_chunks,
        }
    }

    /// `prompt: name - description`, description omitted when empty.
    pub fn prompt_line(&self) -> String {
        if self.prompt_description.is_empty() {
            format!("prompt: {}", self.prompt_name)
        } else {
            format!("prompt: {} - {}", self.prompt_name, self.prompt_description)
        }
    }
}

/// Last `count` characters of `value`.
pub fn tail(value: &str, count: usize) -> String {
    let len = value.chars().count();
    value.chars().skip(len.saturating_sub(count)).collect()
}

fn as_object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object()
}

fn field_object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

fn field_array<'a>(map: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    map.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn field_str<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or("")
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn projects_full_pack() {
        let tools: Vec<Value> = (0..10)
            .map(|i| json!({"name": format!("t{i}"), "endpoint": "/v1/x"}))
            .collect();
        let l1: Vec<Value> = (0..12)
            .map(|i| json!({"role": "user", "text": format!("m{i}")}))
            .collect();
        let pack = json!({
            "schema": "memos.context_pack.v1",
            "query_text": "deadline?",
            "procedural": {
                "prompt": {"name": "memos-default", "description": "grounded answers"},
                "tools": tools
            },
            "working_memory": {
                "l1_window": l1,
                "session_summary": "summary text",
                "session_summary_id": "cond-1234567890abcdef"
            },
            "retrieval": {
                "raw_chunks": [
                    {"id": "chunk-0000aaaabbbb", "score": 0.91234, "tier": "L2 Semantic (Vector DB)"},
                    {"id": "x", "score": "high"}
                ]
            }
        });
        let view = ContextPackView::from_value(&pack);
        assert_eq!(view.schema, "memos.context_pack.v1");
        assert_eq!(view.prompt_line(), "prompt: memos-default - grounded answers");
        assert_eq!(view.tools.len(), MAX_PACK_TOOLS);
        assert_eq!(view.l1_window.len(), MAX_PACK_L1_MESSAGES);
        assert_eq!(view.l1_window[0].line(), "[user] m0");
        assert_eq!(view.session_summary_short_id, "90abcdef");
        assert_eq!(
            view.raw_chunks[0].line(),
            "- aaaabbbb score=0.912 L2 Semantic (Vector DB)"
        );
        assert_eq!(view.raw_chunks[1].line(), "- x");
    }

    #[test]
    fn empty_pack_uses_defaults() {
        let view = ContextPackView::from_value(&json!({"procedural": {"tools": [{}]}}));
        assert_eq!(view.prompt_name, "default");
        assert_eq!(view.prompt_line(), "prompt: default");
        assert_eq!(view.tools[0].name, "tool");
        assert_eq!(view.session_summary, NO_SUMMARY_PLACEHOLDER);
        assert!(view.raw_chunks.is_empty());

        let view = ContextPackView::from_value(&json!("not an object"));
        assert_eq!(view.session_summary, NO_SUMMARY_PLACEHOLDER);
    }

    #[test]
    fn tail_handles_short_and_multibyte() {
        assert_eq!(tail("abc", 8), "abc");
        assert_eq!(tail("ééééééééé", 8).chars().count(), 8);
    }
}
