//! Conversions between Terraform values and JumpCloud request/response
//! fields, shared by resources and data sources.

use crate::api::ApiError;
use std::collections::HashMap;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Known string attribute; null, unknown and missing read as None
pub fn get_string(value: &DynamicValue, name: &str) -> Option<String> {
    value
        .get(&AttributePath::new(name))
        .and_then(Dynamic::as_str)
        .map(str::to_string)
}

pub fn get_bool(value: &DynamicValue, name: &str) -> Option<bool> {
    value.get(&AttributePath::new(name)).and_then(Dynamic::as_bool)
}

pub fn get_number(value: &DynamicValue, name: &str) -> Option<f64> {
    value.get(&AttributePath::new(name)).and_then(Dynamic::as_number)
}

pub fn get_u64(value: &DynamicValue, name: &str) -> Option<u64> {
    get_number(value, name)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u64)
}

/// String elements of a list or set attribute. A null element is reported
/// against its index instead of being dropped.
pub fn get_string_list(
    value: &DynamicValue,
    name: &str,
) -> Result<Option<Vec<String>>, Diagnostic> {
    let Some(items) = value.get(&AttributePath::new(name)).and_then(Dynamic::as_list) else {
        return Ok(None);
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                Diagnostic::error(
                    "Invalid list element",
                    format!("Element {} of '{}' must be a string", index, name),
                )
                .with_attribute(AttributePath::new(name).index(index as i64))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Elements of a list-of-objects attribute
pub fn get_object_list(value: &DynamicValue, name: &str) -> Vec<HashMap<String, Dynamic>> {
    value
        .get(&AttributePath::new(name))
        .and_then(Dynamic::as_list)
        .map(|items| items.iter().filter_map(Dynamic::as_map).cloned().collect())
        .unwrap_or_default()
}

/// Elements of a list-of-objects attribute with every `keys` field set.
/// The first incomplete entry is reported against its path.
pub fn get_complete_objects(
    value: &DynamicValue,
    name: &str,
    keys: &[&str],
) -> Result<Vec<HashMap<String, Dynamic>>, Diagnostic> {
    match incomplete_entries(value, name, keys, true).into_iter().next() {
        Some(diag) => Err(diag),
        None => Ok(get_object_list(value, name)),
    }
}

/// Entries of a list-of-objects attribute that are null or lack one of
/// `keys`. Unknown values are accepted unless `strict` is set.
pub fn incomplete_entries(
    value: &DynamicValue,
    name: &str,
    keys: &[&str],
    strict: bool,
) -> Vec<Diagnostic> {
    let Some(items) = value.get(&AttributePath::new(name)).and_then(Dynamic::as_list) else {
        return vec![];
    };

    let mut diagnostics = vec![];
    for (index, item) in items.iter().enumerate() {
        let path = AttributePath::new(name).index(index as i64);
        let object = match item {
            Dynamic::Map(object) => object,
            Dynamic::Unknown if !strict => continue,
            _ => {
                diagnostics.push(
                    Diagnostic::error(
                        "Incomplete list entry",
                        format!("Entry {} of '{}' must not be null", index, name),
                    )
                    .with_attribute(path),
                );
                continue;
            }
        };

        for key in keys {
            let missing = match object.get(*key) {
                Some(Dynamic::String(_)) => false,
                Some(Dynamic::Unknown) => strict,
                _ => true,
            };
            if missing {
                diagnostics.push(
                    Diagnostic::error(
                        "Incomplete list entry",
                        format!("Entry {} of '{}' needs '{}'", index, name, key),
                    )
                    .with_attribute(path.clone().attribute(key)),
                );
            }
        }
    }
    diagnostics
}

pub fn object_string(object: &HashMap<String, Dynamic>, key: &str) -> Option<String> {
    object.get(key).and_then(Dynamic::as_str).map(str::to_string)
}

/// Parse a JSON-encoded string attribute
pub fn get_json(value: &DynamicValue, name: &str) -> Result<Option<serde_json::Value>, Diagnostic> {
    match get_string(value, name) {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => parse_json(&text)
            .map(Some)
            .map_err(|e| e.with_attribute(AttributePath::new(name))),
    }
}

pub fn parse_json(text: &str) -> Result<serde_json::Value, Diagnostic> {
    serde_json::from_str(text)
        .map_err(|e| Diagnostic::error("Invalid JSON", format!("Value is not valid JSON: {}", e)))
}

/// Render an API JSON document for state. When the reference string holds
/// the same document the reference text is kept so formatting differences
/// do not show up as drift.
pub fn json_string(reference: Option<String>, value: Option<&serde_json::Value>) -> Dynamic {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Dynamic::Null;
    };

    if let Some(reference) = reference {
        if serde_json::from_str::<serde_json::Value>(&reference).ok().as_ref() == Some(value) {
            return Dynamic::String(reference);
        }
    }

    Dynamic::String(value.to_string())
}

/// Keep the reference timestamp when it names the same instant as the API
/// value, so `Z` against `.000Z` renderings do not show up as drift.
pub fn timestamp_string(reference: Option<String>, value: Option<String>) -> Option<String> {
    let parse = |text: &str| chrono::DateTime::parse_from_rfc3339(text).ok();
    match (reference, value) {
        (Some(reference), Some(value)) => match (parse(&reference), parse(&value)) {
            (Some(a), Some(b)) if a == b => Some(reference),
            _ => Some(value),
        },
        (reference, value) => value.or(reference),
    }
}

pub fn string_list(values: &[String]) -> Dynamic {
    Dynamic::List(values.iter().cloned().map(Dynamic::String).collect())
}

/// JumpCloud answers unset strings with "". Keep such attributes null when
/// the reference state left them null.
pub fn optional_string(value: Option<String>, reference: &DynamicValue, name: &str) -> Dynamic {
    match value {
        Some(v) if v.is_empty() && get_string(reference, name).is_none() => Dynamic::Null,
        other => other.into(),
    }
}

pub fn set(state: &mut DynamicValue, name: &str, value: impl Into<Dynamic>) {
    if let Err(e) = state.set_value(&AttributePath::new(name), value.into()) {
        tracing::warn!("Failed to set {} in state: {}", name, e);
    }
}

pub fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

pub fn missing_id() -> Diagnostic {
    Diagnostic::error(
        "Missing resource ID",
        "The resource state does not contain an id",
    )
    .with_attribute(AttributePath::new("id"))
}

pub fn api_error(summary: &str, err: &ApiError) -> Diagnostic {
    Diagnostic::error(summary, format!("API error: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(json: serde_json::Value) -> DynamicValue {
        DynamicValue::new(Dynamic::from(json))
    }

    #[test]
    fn getters_skip_null_and_unknown() {
        let mut v = value(serde_json::json!({"name": "ops", "count": 3, "flag": true}));
        v.set_null(&AttributePath::new("gone")).unwrap();
        v.mark_unknown(&AttributePath::new("later")).unwrap();

        assert_eq!(get_string(&v, "name").as_deref(), Some("ops"));
        assert_eq!(get_u64(&v, "count"), Some(3));
        assert_eq!(get_bool(&v, "flag"), Some(true));
        assert_eq!(get_string(&v, "gone"), None);
        assert_eq!(get_string(&v, "later"), None);
        assert_eq!(get_string(&v, "missing"), None);
        assert_eq!(get_string(&v, "count"), None);
    }

    #[test]
    fn list_getters() {
        let v = value(serde_json::json!({
            "targets": ["a", "b"],
            "actions": [{"type": "email", "target": "x@example.com"}]
        }));

        assert_eq!(
            get_string_list(&v, "targets").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(get_string_list(&v, "missing").unwrap(), None);

        let actions = get_object_list(&v, "actions");
        assert_eq!(actions.len(), 1);
        assert_eq!(object_string(&actions[0], "type").as_deref(), Some("email"));
    }

    #[test]
    fn null_list_elements_are_reported() {
        let v = value(serde_json::json!({
            "targets": ["a", null],
            "actions": [
                {"type": "email", "target": "x@example.com"},
                {"type": "email", "target": null},
                null
            ]
        }));

        let err = get_string_list(&v, "targets").unwrap_err();
        assert_eq!(err.attribute, Some(AttributePath::new("targets").index(1)));

        let diags = incomplete_entries(&v, "actions", &["type", "target"], false);
        assert_eq!(diags.len(), 2);
        assert_eq!(
            diags[0].attribute,
            Some(AttributePath::new("actions").index(1).attribute("target"))
        );
        assert_eq!(diags[1].attribute, Some(AttributePath::new("actions").index(2)));

        let err = get_complete_objects(&v, "actions", &["type", "target"]).unwrap_err();
        assert_eq!(err.summary, "Incomplete list entry");
    }

    #[test]
    fn unknown_entries_pass_validation_only() {
        let mut v = value(serde_json::json!({"actions": [{"type": "email", "target": "x"}]}));
        v.mark_unknown(&AttributePath::new("actions").index(0).attribute("target"))
            .unwrap();

        assert!(incomplete_entries(&v, "actions", &["type", "target"], false).is_empty());
        assert_eq!(incomplete_entries(&v, "actions", &["type", "target"], true).len(), 1);
    }

    #[test]
    fn equivalent_timestamps_keep_reference_text() {
        let kept = timestamp_string(
            Some("2030-01-01T00:00:00Z".to_string()),
            Some("2030-01-01T00:00:00.000Z".to_string()),
        );
        assert_eq!(kept.as_deref(), Some("2030-01-01T00:00:00Z"));

        let moved = timestamp_string(
            Some("2030-01-01T00:00:00Z".to_string()),
            Some("2031-01-01T00:00:00Z".to_string()),
        );
        assert_eq!(moved.as_deref(), Some("2031-01-01T00:00:00Z"));

        assert_eq!(
            timestamp_string(Some("2030-01-01T00:00:00Z".to_string()), None).as_deref(),
            Some("2030-01-01T00:00:00Z")
        );
    }

    #[test]
    fn json_attribute_parsing() {
        let v = value(serde_json::json!({"doc": "{\"a\": 1}", "bad": "{", "blank": " "}));

        assert_eq!(get_json(&v, "doc").unwrap(), Some(serde_json::json!({"a": 1})));
        assert_eq!(get_json(&v, "blank").unwrap(), None);
        assert_eq!(get_json(&v, "missing").unwrap(), None);

        let err = get_json(&v, "bad").unwrap_err();
        assert_eq!(err.summary, "Invalid JSON");
        assert_eq!(err.attribute, Some(AttributePath::new("bad")));
    }

    #[test]
    fn json_string_keeps_equivalent_reference_text() {
        let api = serde_json::json!({"b": [1, 2], "a": "x"});

        let kept = json_string(Some("{ \"a\": \"x\", \"b\": [1, 2] }".to_string()), Some(&api));
        assert_eq!(kept, Dynamic::String("{ \"a\": \"x\", \"b\": [1, 2] }".to_string()));

        let replaced = json_string(Some("{\"a\":\"y\"}".to_string()), Some(&api));
        let text = replaced.as_str().unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(text).unwrap(), api);

        assert_eq!(json_string(None, None), Dynamic::Null);
        assert_eq!(json_string(None, Some(&serde_json::Value::Null)), Dynamic::Null);
    }

    #[test]
    fn empty_api_strings_stay_null_when_unset() {
        let reference = value(serde_json::json!({"department": null, "title": ""}));

        assert_eq!(
            optional_string(Some(String::new()), &reference, "department"),
            Dynamic::Null
        );
        assert_eq!(
            optional_string(Some(String::new()), &reference, "title"),
            Dynamic::String(String::new())
        );
        assert_eq!(
            optional_string(Some("Ops".to_string()), &reference, "department"),
            Dynamic::String("Ops".to_string())
        );
        assert_eq!(optional_string(None, &reference, "department"), Dynamic::Null);
    }
}
