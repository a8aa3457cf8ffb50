/// JSON export of match results
///
/// `Flags`, `Span` and `Quantifier` derive `Serialize`/`Deserialize`; this
/// module adds the text-aware view of a `Match` that needs the haystack and
/// the group names of the pattern.
use serde_json::{Map, Value as JsonValue, json};

use crate::regex::{Match, Regex, Span};

fn span_to_json(span: Span, haystack: &str) -> JsonValue {
    json!({
        "start": span.start,
        "end": span.end,
        "text": haystack.get(span.range()),
    })
}

/// Convert a match produced by the str helpers of `regex` to a JSON object:
/// `{"match": {start, end, text}, "groups": [...], "named": {...}}`.
/// Unset groups are `null`.
pub fn match_to_json(regex: &Regex, m: &Match, haystack: &str) -> JsonValue {
    let groups: Vec<JsonValue> = (1..=regex.capture_count())
        .map(|index| {
            m.group(index)
                .map_or(JsonValue::Null, |span| span_to_json(span, haystack))
        })
        .collect();

    let mut named = Map::new();
    for (name, index) in regex.capture_names() {
        let value = m
            .group(index)
            .map_or(JsonValue::Null, |span| span_to_json(span, haystack));
        named.insert(name.to_string(), value);
    }

    json!({
        "match": span_to_json(m.span(), haystack),
        "groups": groups,
        "named": named,
    })
}

/// Convert every match of `regex` in `haystack` to a JSON string.
pub fn matches_to_json_string(regex: &Regex, haystack: &str, pretty: bool) -> Result<String, String> {
    let matches: Vec<JsonValue> = regex
        .find_iter(haystack)
        .iter()
        .map(|m| match_to_json(regex, m, haystack))
        .collect();
    let value = JsonValue::Array(matches);

    if pretty {
        serde_json::to_string_pretty(&value).map_err(|e| format!("Failed to serialize to JSON: {}", e))
    } else {
        serde_json::to_string(&value).map_err(|e| format!("Failed to serialize to JSON: {}", e))
    }
}
