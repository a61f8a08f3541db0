//! Provider response parsing.
//!
//! The chat model returns raw text (ideally JSON). This module extracts an
//! [`EntityDraft`] from it, recovering from the usual formatting slips:
//! markdown code fences, prose around the object, trailing commas.

use serde::Deserialize;

use crate::error::GeneratorError;

/// Name and art description written by the chat model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityDraft {
    /// Display name.
    pub name: String,
    /// Art description, also sent to the image model.
    #[serde(alias = "description")]
    pub prompt: String,
}

/// Parse a chat reply into a draft.
///
/// Strategies, in order:
/// 1. Direct `serde_json` deserialization
/// 2. Extract JSON from a markdown code block
/// 3. Take the outermost `{ ... }` span
/// 4. Strip trailing commas from each of the above and retry
///
/// # Errors
///
/// Returns [`GeneratorError::Parse`] if every strategy fails, or the
/// draft's name or prompt is blank.
pub fn parse_entity_reply(raw: &str) -> Result<EntityDraft, GeneratorError> {
    let trimmed = raw.trim();
    let candidates = [
        Some(trimmed),
        extract_json_from_codeblock(trimmed),
        extract_braced(trimmed),
    ];

    let draft = candidates
        .iter()
        .flatten()
        .find_map(|text| try_draft(text))
        .ok_or_else(|| GeneratorError::Parse(format!("no entity JSON in reply: {trimmed}")))?;

    let draft = EntityDraft {
        name: draft.name.trim().to_owned(),
        prompt: draft.prompt.trim().to_owned(),
    };
    if draft.name.is_empty() || draft.prompt.is_empty() {
        return Err(GeneratorError::Parse(
            "reply has an empty name or prompt".to_owned(),
        ));
    }
    Ok(draft)
}

fn try_draft(text: &str) -> Option<EntityDraft> {
    serde_json::from_str(text)
        .ok()
        .or_else(|| serde_json::from_str(&strip_trailing_commas(text)).ok())
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = text.get(fence.checked_add(3)?..)?;
    // Skip the info string (e.g. `json`) up to the end of the line.
    let body_start = after_fence.find('\n')?.checked_add(1)?;
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// The span from the first `{` to the last `}`.
fn extract_braced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ',' {
            let rest: String = chars.clone().skip_while(|n| n.is_whitespace()).take(1).collect();
            if rest == "}" || rest == "]" {
                continue;
            }
        }
        result.push(c);
    }
    result
}
