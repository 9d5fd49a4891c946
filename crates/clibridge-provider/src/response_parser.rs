//! Normalization of assistant CLI stdout.
//!
//! The CLI's JSON output mode emits either one terminal object or an array of
//! typed events (`system`, `assistant`, `result`, ...). Anything that is not a
//! JSON object or array degrades to the trimmed raw text; parsing never fails.

use serde_json::{Map, Value};

use crate::types::{RunResult, UsageStats};

const EVENT_TYPE_RESULT: &str = "result";
const EVENT_TYPE_ASSISTANT: &str = "assistant";
const CONTENT_TYPE_TEXT: &str = "text";

#[derive(Debug, Clone, PartialEq)]
/// Stdout decoded once into the shapes the CLI is known to produce.
pub enum ResponseShape {
    SingleObject(Map<String, Value>),
    EventArray(Vec<Value>),
    PlainText(String),
}

/// Stdout that did not decode to a JSON object or array.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Unparsed {
    text: String,
}

impl Unparsed {
    fn from_raw(raw: &str) -> Self {
        Self {
            text: raw.trim().to_string(),
        }
    }

    fn into_plain_text(self) -> ResponseShape {
        ResponseShape::PlainText(self.text)
    }
}

fn decode_structured(raw: &str) -> Result<ResponseShape, Unparsed> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Ok(ResponseShape::SingleObject(object)),
        Ok(Value::Array(events)) => Ok(ResponseShape::EventArray(events)),
        Ok(_) | Err(_) => Err(Unparsed::from_raw(raw)),
    }
}

impl ResponseShape {
    pub fn decode(raw: &str) -> Self {
        decode_structured(raw).unwrap_or_else(Unparsed::into_plain_text)
    }

    fn event_objects(&self) -> Vec<&Map<String, Value>> {
        match self {
            Self::SingleObject(object) => vec![object],
            Self::EventArray(events) => events.iter().filter_map(Value::as_object).collect(),
            Self::PlainText(_) => Vec::new(),
        }
    }

    fn result(&self) -> ParsedResult {
        match self {
            Self::SingleObject(object) => ParsedResult {
                text: result_text(object),
                session_id: string_field(object, "session_id"),
            },
            Self::EventArray(events) => result_from_events(events),
            Self::PlainText(text) => ParsedResult {
                text: text.clone(),
                session_id: None,
            },
        }
    }

    fn stats(&self) -> UsageStats {
        let mut stats = UsageStats::default();
        for event in self.event_objects() {
            if event_type(event) == Some(EVENT_TYPE_RESULT) {
                stats.merge_event(event);
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResult {
    pub text: String,
    pub session_id: Option<String>,
}

/// Extracts the reply text and session id from raw CLI stdout.
pub fn parse_result(raw: &str) -> ParsedResult {
    ResponseShape::decode(raw).result()
}

/// Collects usage fields from every `result` event. Never fails.
pub fn parse_stats(raw: &str) -> UsageStats {
    ResponseShape::decode(raw).stats()
}

/// Decodes stdout once and builds the full [`RunResult`].
pub fn parse_response(raw: &str) -> RunResult {
    let shape = ResponseShape::decode(raw);
    let ParsedResult { text, session_id } = shape.result();
    let stats = shape.stats();
    RunResult {
        text,
        session_id,
        stats: (!stats.is_empty()).then_some(stats),
    }
}

fn result_from_events(events: &[Value]) -> ParsedResult {
    let mut first_session_id: Option<String> = None;
    for event in events.iter().filter_map(Value::as_object) {
        let session_id = string_field(event, "session_id");
        if first_session_id.is_none() {
            first_session_id = session_id.clone();
        }
        if event_type(event) == Some(EVENT_TYPE_RESULT) {
            return ParsedResult {
                text: result_text(event),
                session_id: session_id.or(first_session_id),
            };
        }
    }

    ParsedResult {
        text: assistant_text(events),
        session_id: first_session_id,
    }
}

/// Joins the text blocks of every `assistant` event, in order.
fn assistant_text(events: &[Value]) -> String {
    events
        .iter()
        .filter_map(Value::as_object)
        .filter(|event| event_type(event) == Some(EVENT_TYPE_ASSISTANT))
        .filter_map(|event| event.get("message")?.get("content")?.as_array())
        .flatten()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some(CONTENT_TYPE_TEXT))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

fn result_text(event: &Map<String, Value>) -> String {
    match event.get("result") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn event_type(event: &Map<String, Value>) -> Option<&str> {
    event.get("type").and_then(Value::as_str)
}

fn string_field(event: &Map<String, Value>, key: &str) -> Option<String> {
    event.get(key).and_then(Value::as_str).map(str::to_string)
}
