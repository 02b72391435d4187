//! Parsing of JSON-formatted model replies

use serde::Deserialize;

/// Fields read from a structured reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StructuredReply {
    pub answer: String,
    #[serde(default)]
    pub confidence: Option<String>,
}

/// Parse the first balanced JSON object in `raw`.
///
/// Code fences and surrounding prose are tolerated. Returns `None` when no
/// object with an `answer` field can be read.
pub fn parse_reply(raw: &str) -> Option<StructuredReply> {
    let object = first_object(raw)?;
    serde_json::from_str::<StructuredReply>(object).ok()
}

/// Answer text and confidence for a reply, keeping the raw text on failure
pub fn interpret(raw: &str) -> (String, Option<String>) {
    match parse_reply(raw) {
        Some(reply) => (reply.answer.trim().to_string(), reply.confidence),
        None => {
            tracing::warn!("Model reply was not valid structured JSON, keeping raw text");
            (raw.trim().to_string(), None)
        }
    }
}

fn first_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in raw[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
