//! Normalizes the free-form AI evaluation stored on a candidate into a fixed
//! set of display sections.
//!
//! Producers of `ai_analysis` are inconsistent: the value may be a pending
//! marker, a JSON object serialized into a string (often wrapped in a
//! markdown code fence), an already-structured object, or plain prose. Each
//! section is resolved from an ordered list of candidate keys, so adding a
//! new upstream field name is a one-line change to [`SECTIONS`].

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Placeholder written by the analysis job before it has produced output.
pub const PENDING_SENTINEL: &str = "Pending AI Analysis...";
pub const NOT_SPECIFIED: &str = "Not specified";
pub const NO_GAPS: &str = "No major gaps identified.";

/// Key under which unparseable analysis text is kept.
pub const RAW_TEXT_KEY: &str = "verdict";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Verdict,
    TechnicalAlignment,
    LocationMatch,
    Gaps,
}

#[derive(Debug)]
pub struct SectionSpec {
    pub key: SectionKey,
    pub title: &'static str,
    pub keys: &'static [&'static str],
    pub fallback: &'static str,
}

pub static SECTIONS: [SectionSpec; 4] = [
    SectionSpec {
        key: SectionKey::Verdict,
        title: "AI Verdict",
        keys: &[
            "role_alignment",
            "summary",
            "verdict",
            "overall_summary",
            "recommendation",
        ],
        fallback: NOT_SPECIFIED,
    },
    SectionSpec {
        key: SectionKey::TechnicalAlignment,
        title: "Technical Alignment",
        keys: &[
            "skill_match",
            "technical_skills_match",
            "technical_alignment",
            "skills_match",
            "education_match",
        ],
        fallback: NOT_SPECIFIED,
    },
    SectionSpec {
        key: SectionKey::LocationMatch,
        title: "Location Match",
        keys: &[
            "location_match",
            "location_and_education",
            "location",
            "strengths",
        ],
        fallback: NOT_SPECIFIED,
    },
    SectionSpec {
        key: SectionKey::Gaps,
        title: "Lacking Skills & Gaps",
        keys: &[
            "weaknesses",
            "experience_match",
            "missing_skills",
            "skill_gaps",
            "experience_gap",
            "soft_skills_match",
        ],
        fallback: NO_GAPS,
    },
];

/// Decoded shape of an `ai_analysis` value.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisPayload {
    Pending,
    Structured(Map<String, JsonValue>),
    RawText(String),
}

impl AnalysisPayload {
    pub fn decode(raw: Option<&JsonValue>) -> Self {
        match raw {
            None | Some(JsonValue::Null) => AnalysisPayload::Pending,
            Some(JsonValue::String(text)) => Self::decode_text(text),
            Some(JsonValue::Object(map)) => AnalysisPayload::Structured(map.clone()),
            Some(other) if is_empty_value(other) => AnalysisPayload::Pending,
            Some(other) => AnalysisPayload::RawText(render_value(other, "")),
        }
    }

    pub fn decode_text(text: &str) -> Self {
        if text.is_empty() || text == PENDING_SENTINEL {
            return AnalysisPayload::Pending;
        }

        match serde_json::from_str::<JsonValue>(&strip_code_fences(text)) {
            Ok(JsonValue::Object(map)) => AnalysisPayload::Structured(map),
            Ok(_) => AnalysisPayload::RawText(text.to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "analysis is not JSON, keeping raw text");
                AnalysisPayload::RawText(text.to_string())
            }
        }
    }

    pub fn resolve(&self, keys: &[&str], fallback: &str) -> String {
        match self {
            AnalysisPayload::Pending => fallback.to_string(),
            AnalysisPayload::Structured(map) => resolve(map, keys, fallback),
            AnalysisPayload::RawText(text) => {
                if keys.contains(&RAW_TEXT_KEY) && !text.is_empty() {
                    text.clone()
                } else {
                    fallback.to_string()
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSection {
    pub key: SectionKey,
    pub title: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisView {
    Pending,
    Ready { sections: Vec<AnalysisSection> },
}

impl AnalysisView {
    pub fn section(&self, key: SectionKey) -> Option<&AnalysisSection> {
        match self {
            AnalysisView::Pending => None,
            AnalysisView::Ready { sections } => sections.iter().find(|s| s.key == key),
        }
    }
}

pub fn render(raw: Option<&JsonValue>) -> AnalysisView {
    let payload = AnalysisPayload::decode(raw);
    if payload == AnalysisPayload::Pending {
        return AnalysisView::Pending;
    }

    let sections = SECTIONS
        .iter()
        .map(|spec| AnalysisSection {
            key: spec.key,
            title: spec.title,
            text: payload.resolve(spec.keys, spec.fallback),
        })
        .collect();

    AnalysisView::Ready { sections }
}

pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// First non-empty value among `keys`, in order.
pub fn resolve(fields: &Map<String, JsonValue>, keys: &[&str], fallback: &str) -> String {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !is_empty_value(value))
        .map(|value| render_value(value, fallback))
        .unwrap_or_else(|| fallback.to_string())
}

pub fn render_value(value: &JsonValue, fallback: &str) -> String {
    if is_empty_value(value) {
        return fallback.to_string();
    }
    render_nested(value)
}

fn render_nested(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(items) => items
            .iter()
            .map(render_nested)
            .collect::<Vec<_>>()
            .join(", "),
        JsonValue::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, render_nested(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
    }
}
