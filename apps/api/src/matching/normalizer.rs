//! Response Normalizer: turns whatever the model sent back into a `MatchRecord`.
//!
//! A reply is classified once into a `RawReply` variant, then coerced by the path for that
//! variant. `normalize` is total: every input, however malformed, yields a fully populated
//! record. A reply that cannot be read as a structured record becomes a summary-only record.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::models::match_record::MatchRecord;

/// Fence language tags treated as JSON (compared case-insensitively). An empty tag also counts.
const JSON_FENCE_TAGS: &[&str] = &["json", "jsonc", "json5"];

/// Keys probed, in order, for each record field.
const SCORE_KEYS: &[&str] = &["match_score", "score", "matchScore"];
const MATCHED_KEYS: &[&str] = &["matched_skills", "matchedSkills"];
const MISSING_KEYS: &[&str] = &["missing_skills", "missingSkills"];
const SUMMARY_KEY: &str = "summary";

/// Characters stripped from the front of a skill parsed out of free text.
const SKILL_BULLETS: &[char] = &['•', '▪', '◦', '●', '‣', '·', '-', '*'];

lazy_static! {
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[ \t]*\r?\n?(.*?)```").expect("valid fence regex");
    static ref SKILL_SEPARATORS: Regex = Regex::new(r"[,;\r\n]+").expect("valid separator regex");
}

// ────────────────────────────────────────────────────────────────────────────
// Classification
// ────────────────────────────────────────────────────────────────────────────

/// The shape of a raw model reply, decided once before any coercion.
///
/// String variants carry the JSON candidate to parse and the trimmed reply text used
/// as the summary if parsing does not produce a mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply<'a> {
    /// A mapping with record fields.
    Structured(&'a Map<String, Value>),
    /// A mapping carrying an `error` key; the model reported failure instead of content.
    ErrorPayload(&'a Map<String, Value>),
    /// The body of the first JSON-tagged (or untagged) fenced code block.
    FencedJson { candidate: &'a str, text: &'a str },
    /// The first `{` through the last `}` of a reply that wraps JSON in prose.
    EmbeddedJson { candidate: &'a str, text: &'a str },
    /// The whole trimmed reply, which may or may not be JSON.
    Plain(&'a str),
    /// Null, booleans, numbers and lists.
    Scalar(&'a Value),
}

impl<'a> RawReply<'a> {
    pub fn classify(raw: &'a Value) -> Self {
        match raw {
            Value::Object(map) if map.get("error").is_some_and(|e| !e.is_null()) => {
                RawReply::ErrorPayload(map)
            }
            Value::Object(map) => RawReply::Structured(map),
            Value::String(text) => RawReply::from_text(text),
            other => RawReply::Scalar(other),
        }
    }

    /// Classifies a reply that arrived as raw text.
    pub fn from_text(text: &'a str) -> Self {
        classify_text(text)
    }

    /// The error message when the reply is the model reporting failure rather than content.
    ///
    /// Covers both a structured error payload and a textual reply whose JSON is an
    /// object with a non-null `error` key.
    pub fn refusal(&self) -> Option<String> {
        match self {
            RawReply::ErrorPayload(map) => map.get("error").map(error_message),
            RawReply::FencedJson { candidate, .. }
            | RawReply::EmbeddedJson { candidate, .. }
            | RawReply::Plain(candidate) => match parse_mapping(candidate)?.get("error") {
                Some(Value::Null) | None => None,
                Some(error) => Some(error_message(error)),
            },
            RawReply::Structured(_) | RawReply::Scalar(_) => None,
        }
    }
}

fn classify_text(text: &str) -> RawReply<'_> {
    let text = text.trim();

    if let Some(candidate) = first_json_fence(text) {
        return RawReply::FencedJson { candidate, text };
    }

    if !text.starts_with('{') {
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if start < end {
                return RawReply::EmbeddedJson {
                    candidate: &text[start..=end],
                    text,
                };
            }
        }
    }

    RawReply::Plain(text)
}

fn first_json_fence(text: &str) -> Option<&str> {
    FENCED_BLOCK.captures_iter(text).find_map(|caps| {
        let tag = caps.get(1).map_or("", |m| m.as_str());
        let is_json = tag.is_empty() || JSON_FENCE_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag));
        if is_json {
            caps.get(2).map(|body| body.as_str().trim())
        } else {
            None
        }
    })
}

fn parse_mapping(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.trim().to_string(),
        Value::Object(body) => match body.get("message") {
            Some(Value::String(message)) => message.trim().to_string(),
            _ => error.to_string(),
        },
        other => other.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

/// Coerces an arbitrary model reply into a `MatchRecord`. Never fails.
pub fn normalize(raw: &Value) -> MatchRecord {
    normalize_reply(&RawReply::classify(raw))
}

/// Coerces an already-classified reply.
pub fn normalize_reply(reply: &RawReply<'_>) -> MatchRecord {
    match reply {
        RawReply::Structured(map) | RawReply::ErrorPayload(map) => from_mapping(map),
        RawReply::FencedJson { candidate, text } | RawReply::EmbeddedJson { candidate, text } => {
            from_candidate(candidate, text)
        }
        RawReply::Plain(text) => from_candidate(text, text),
        RawReply::Scalar(value) => MatchRecord {
            summary: value.to_string(),
            ..from_mapping(&Map::new())
        },
    }
}

fn from_candidate(candidate: &str, text: &str) -> MatchRecord {
    match parse_mapping(candidate) {
        Some(map) => from_mapping(&map),
        None => MatchRecord::summary_only(text),
    }
}

/// Builds a record field by field; a malformed field never spoils the others.
fn from_mapping(map: &Map<String, Value>) -> MatchRecord {
    MatchRecord {
        score: coerce_score(first_present(map, SCORE_KEYS)),
        matched_skills: coerce_skills(first_present(map, MATCHED_KEYS)),
        missing_skills: coerce_skills(first_present(map, MISSING_KEYS)),
        summary: coerce_summary(map.get(SUMMARY_KEY)),
    }
}

fn first_present<'m>(map: &'m Map<String, Value>, keys: &[&str]) -> Option<&'m Value> {
    keys.iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
}

/// Non-integers truncate toward zero before clamping to 0 – 100.
fn coerce_score(value: Option<&Value>) -> Option<u8> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim_end().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.trunc().clamp(0.0, 100.0) as u8)
}

fn coerce_skills(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(skill_text).collect(),
        Some(Value::String(text)) => split_skills(text),
        _ => Vec::new(),
    }
}

/// Text form of one list element. Objects shaped like `{"name": ...}` or `{"skill": ...}`
/// contribute that field.
fn skill_text(item: &Value) -> Option<String> {
    let text = match item {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Object(obj) => match obj.get("skill").or_else(|| obj.get("name")) {
            Some(Value::String(s)) => s.trim().to_string(),
            _ => item.to_string(),
        },
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn split_skills(text: &str) -> Vec<String> {
    SKILL_SEPARATORS
        .split(text)
        .map(|piece| {
            piece
                .trim_start_matches(|c: char| c.is_whitespace() || SKILL_BULLETS.contains(&c))
                .trim()
        })
        .filter(|piece| !piece.is_empty())
        .map(String::from)
        .collect()
}

fn coerce_summary(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
