use serde_json::{json, Map, Value};

pub(crate) fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

fn non_empty_lines(value: &str) -> impl Iterator<Item = &str> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Builds the `fields` update body for one field given its file rendering.
pub fn field_update_payload(field: &str, value: &str) -> Value {
    let (name, encoded) = match field {
        "assignee" | "reporter" | "creator" | "priority" | "resolution" => {
            (field, json!({ "name": value }))
        }
        "type" | "issuetype" => ("issuetype", json!({ "name": value })),
        "labels" => ("labels", json!(non_empty_lines(value).collect::<Vec<_>>())),
        "components" => (
            "components",
            Value::Array(
                non_empty_lines(value)
                    .map(|name| json!({ "name": name }))
                    .collect(),
            ),
        ),
        other => (other, Value::String(value.to_string())),
    };
    let mut fields = Map::new();
    fields.insert(name.to_string(), encoded);
    json!({ "fields": fields })
}
