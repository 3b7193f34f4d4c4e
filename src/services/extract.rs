use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    // `json` fences go first so the language tag is stripped along with the backticks.
    FENCE.get_or_init(|| Regex::new(r"```json\n?|```\n?").expect("fence pattern is valid"))
}

/// Remove markdown code-fence markers wherever they appear.
pub(crate) fn strip_code_fences(text: &str) -> String {
    fence_pattern().replace_all(text, "").into_owned()
}

/// Recover a single JSON object from free-form model output.
///
/// The text is first stripped of markdown fences and parsed as a whole. If
/// that does not yield an object, the span from the first `{` to the last `}`
/// is tried instead. Returns `None` when neither attempt produces an object;
/// that is a "no data" signal, not an error.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    if text.trim().is_empty() {
        return None;
    }

    let cleaned = strip_code_fences(text);

    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(&cleaned) {
        return Some(object);
    }

    let first = cleaned.find('{')?;
    let last = cleaned.rfind('}')?;
    if last <= first {
        return None;
    }

    match serde_json::from_str::<Value>(&cleaned[first..=last]) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}
