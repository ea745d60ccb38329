use passk_core::{NormalizePolicy, NormalizedBody};
use regex::Regex;

const START_TAG: &str = "<sol>";
const END_TAG: &str = "</sol>";

/// Extract the text between the first `<sol>`/`</sol>` pair.
///
/// An absent or unmatched pair is a miss, not an error, and so is a matched
/// pair enclosing nothing but whitespace. Edge newlines are trimmed; inner
/// indentation is preserved so the body stays concatenable after a Python
/// signature.
pub fn between_tags(text: &str) -> Option<String> {
    let start = text.find(START_TAG)?;
    let after_start = start + START_TAG.len();
    let end = text[after_start..].find(END_TAG)?;
    let inner = text[after_start..after_start + end].trim_matches('\n');
    if inner.trim().is_empty() {
        return None;
    }
    Some(inner.to_string())
}

/// Content of the last markdown fenced block, if any.
///
/// Models often emit several blocks while reasoning; the final one is taken
/// as the authoritative answer.
pub fn last_fence(text: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```[a-zA-Z0-9_+-]*\s*\n(.*?)```").unwrap();
    re.captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_matches('\n').to_string())
}

/// If the text opens with a fence marker, drop the opening fence line
/// (language tag included) and any trailing backticks.
pub fn strip_fences(text: &str) -> String {
    let mut text = text.trim().to_string();
    if text.starts_with("```") {
        let re = Regex::new(r"^```[a-zA-Z0-9_+-]*\s*").unwrap();
        text = re.replace(&text, "").into_owned();
        text = text.trim_matches('`').to_string();
    }
    text.trim().to_string()
}

/// The v2 chain: tags, else last fence, else fence stripping.
fn standard_chain(text: &str) -> String {
    between_tags(text)
        .or_else(|| last_fence(text))
        .unwrap_or_else(|| strip_fences(text))
}

/// Derive a function body from raw model output under the given policy.
///
/// Never fails: every chain bottoms out in the placeholder body via
/// [`NormalizedBody::new`]. A well-formed tag pair yields exactly the
/// enclosed text under every policy that looks for tags.
pub fn normalize(raw_text: &str, policy: NormalizePolicy) -> NormalizedBody {
    let candidate = match policy {
        NormalizePolicy::V1 => strip_fences(raw_text),
        NormalizePolicy::V2 => standard_chain(raw_text),
        NormalizePolicy::V3 => {
            // A tag or fence hit is final, exactly as under v2. Only a full
            // miss re-runs the standard chain over the raw text, so its
            // fence-stripping fallback gets one more shot.
            match between_tags(raw_text).or_else(|| last_fence(raw_text)) {
                Some(hit) => hit,
                None => standard_chain(raw_text),
            }
        }
    };
    NormalizedBody::new(candidate)
}
