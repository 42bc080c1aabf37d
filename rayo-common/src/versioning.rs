//! Blog document versioning core
//!
//! Blog documents are semi-structured JSON records. Editable fields (`content`,
//! `title`, `category`, `primary_keyword`, `secondary_keywords`) are append-only
//! arrays where the last element is the current value. Legacy documents hold bare
//! strings in these fields and are migrated to array form on the first write that
//! touches them; reads tolerate both shapes indefinitely.
//!
//! Everything in this module is a pure function over `serde_json::Value` so the
//! rules can be tested without a database.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Version tag for the initial generated value
pub const TAG_GENERATED: &str = "generated";
/// Version tag for user edits
pub const TAG_UPDATED: &str = "updated";

/// Wizard steps in frontend order
pub const STEP_FIELDS: [&str; 6] = [
    "primary_keyword",
    "secondary_keywords",
    "category",
    "title",
    "outline",
    "sources",
];

/// One entry in a document's `content` array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentVersion {
    pub html: String,
    pub saved_at: String,
    pub tag: String,
    pub version: i64,
    pub words_count: i64,
}

/// Whitespace word count over the raw HTML
pub fn word_count(text: &str) -> i64 {
    text.split_whitespace().count() as i64
}

/// Append a content version, migrating legacy string content when present.
///
/// Returns the full new `content` array and the words count of the latest
/// version (mirrored onto the document envelope by callers).
///
/// - stored string: replaced by a two-element array, version 1 from the old
///   string (tag `generated`, saved_at = document created_at) and version 2
///   from the new HTML (tag `updated`)
/// - stored array: new version appended with `version = len + 1`
/// - missing or any other shape: fresh single-element array
pub fn append_content_version(
    existing: Option<&Value>,
    html: &str,
    created_at: &str,
    now: &str,
) -> (Value, i64) {
    let new_words = word_count(html);

    match existing {
        Some(Value::String(old_html)) => {
            let first = ContentVersion {
                html: old_html.clone(),
                saved_at: created_at.to_string(),
                tag: TAG_GENERATED.to_string(),
                version: 1,
                words_count: word_count(old_html),
            };
            let second = ContentVersion {
                html: html.to_string(),
                saved_at: now.to_string(),
                tag: TAG_UPDATED.to_string(),
                version: 2,
                words_count: new_words,
            };
            (json!([first, second]), new_words)
        }
        Some(Value::Array(versions)) => {
            let next = ContentVersion {
                html: html.to_string(),
                saved_at: now.to_string(),
                tag: TAG_UPDATED.to_string(),
                version: versions.len() as i64 + 1,
                words_count: new_words,
            };
            let mut out = versions.clone();
            out.push(serde_json::to_value(&next).expect("content version serializes"));
            (Value::Array(out), new_words)
        }
        _ => {
            let first = ContentVersion {
                html: html.to_string(),
                saved_at: now.to_string(),
                tag: TAG_UPDATED.to_string(),
                version: 1,
                words_count: new_words,
            };
            (json!([first]), new_words)
        }
    }
}

/// Current HTML from a `content` field of either shape
pub fn latest_content_html(value: &Value) -> String {
    match value {
        Value::Array(versions) => match versions.last() {
            Some(Value::Object(v)) => v
                .get("html")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Some(other) => scalar_to_string(other),
            None => String::new(),
        },
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Summary of one content version for the versions listing endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VersionSummary {
    pub version: i64,
    pub tag: String,
    pub words_count: i64,
    pub preview: String,
    pub saved_at: String,
}

/// List content versions oldest first.
///
/// A legacy string value lists as a single `generated` version 1.
pub fn content_versions(value: &Value, created_at: &str) -> Vec<VersionSummary> {
    match value {
        Value::String(html) => vec![VersionSummary {
            version: 1,
            tag: TAG_GENERATED.to_string(),
            words_count: word_count(html),
            preview: preview_of(html),
            saved_at: created_at.to_string(),
        }],
        Value::Array(versions) => versions
            .iter()
            .enumerate()
            .map(|(i, v)| VersionSummary {
                version: v
                    .get("version")
                    .and_then(Value::as_i64)
                    .unwrap_or(i as i64 + 1),
                tag: v
                    .get("tag")
                    .and_then(Value::as_str)
                    .unwrap_or(TAG_UPDATED)
                    .to_string(),
                words_count: v.get("words_count").and_then(Value::as_i64).unwrap_or(0),
                preview: preview_of(v.get("html").and_then(Value::as_str).unwrap_or_default()),
                saved_at: v
                    .get("saved_at")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn preview_of(html: &str) -> String {
    html.chars().take(200).collect()
}

/// Current value of a scalar versioned field (`title`, `category`, `subcategory`)
pub fn latest_scalar(value: &Value) -> String {
    match value {
        Value::Array(items) => items.last().map(scalar_to_string).unwrap_or_default(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Current primary keyword string.
///
/// Array entries are keyword-metric objects; legacy documents store a bare
/// string.
pub fn latest_primary_keyword(value: &Value) -> String {
    match value {
        Value::Array(items) => match items.last() {
            Some(Value::Object(entry)) => entry
                .get("keyword")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Some(other) => scalar_to_string(other),
            None => String::new(),
        },
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Selected secondary keyword strings from the latest version.
///
/// Old format is a bare string array and is returned as-is. New format is an
/// array of `{keywords: [...], tag}` versions; only entries whose `selected`
/// field is the string "true" survive.
pub fn selected_secondary_keywords(value: &Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Vec::new(),
    };

    match &items[0] {
        Value::String(_) => items.iter().map(scalar_to_string).collect(),
        Value::Object(_) => {
            let latest = &items[items.len() - 1];
            latest
                .get("keywords")
                .and_then(Value::as_array)
                .map(|kws| {
                    kws.iter()
                        .filter(|kw| {
                            kw.get("selected").and_then(Value::as_str) == Some("true")
                        })
                        .filter_map(|kw| kw.get("keyword").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Empty `step_tracking` sub-document
pub fn empty_step_tracking() -> Value {
    let mut tracking = serde_json::Map::new();
    tracking.insert("current_step".to_string(), Value::String(String::new()));
    for step in STEP_FIELDS {
        tracking.insert(step.to_string(), Value::Array(Vec::new()));
    }
    Value::Object(tracking)
}

/// Record a completed wizard step.
///
/// Initializes the sub-document when missing or malformed, appends
/// `{step, status, completed_at}` to the step's array and moves
/// `current_step`. Advisory only; no transition is enforced.
pub fn record_step(tracking: &mut Value, step: &str, status: &str, completed_at: &str) {
    if !tracking.is_object() {
        *tracking = empty_step_tracking();
    }
    let obj = tracking.as_object_mut().expect("tracking is an object");

    obj.insert(
        "current_step".to_string(),
        Value::String(step.to_string()),
    );

    let entry = json!({
        "step": step,
        "status": status,
        "completed_at": completed_at,
    });

    match obj.get_mut(step) {
        Some(Value::Array(entries)) => entries.push(entry),
        _ => {
            obj.insert(step.to_string(), json!([entry]));
        }
    }
}

/// Fields stripped from serialized documents (internal processing data)
const EXCLUDED_FIELDS: [&str; 11] = [
    "sources",
    "generation_method",
    "content_processing_method",
    "completion_time",
    "brand_tonality_applied",
    "specialty_info",
    "target_word_count",
    "country",
    "outline",
    "keyword_intent",
    "brand_tonality",
];

/// Serialize a document for API responses.
///
/// Flattens versioned fields to their current value, strips internal fields,
/// and drops empty `metadata` / `tags` containers.
pub fn serialize_document(doc: &Value) -> Value {
    let Some(fields) = doc.as_object() else {
        return doc.clone();
    };

    let mut out = serde_json::Map::new();
    for (key, value) in fields {
        if EXCLUDED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if key == "metadata" && is_empty_container(value) {
            continue;
        }
        if key == "tags" && is_empty_container(value) {
            continue;
        }

        match key.as_str() {
            "title" | "category" | "subcategory" => {
                out.insert(key.clone(), Value::String(latest_scalar(value)));
            }
            "content" => {
                out.insert(key.clone(), Value::String(latest_content_html(value)));
            }
            "primary_keyword" => {
                out.insert(key.clone(), Value::String(latest_primary_keyword(value)));
            }
            "secondary_keywords" => {
                let selected = selected_secondary_keywords(value);
                out.insert(
                    key.clone(),
                    Value::Array(selected.into_iter().map(Value::String).collect()),
                );
            }
            "word_count" => {
                let current = match value {
                    Value::Array(items) => items.last().cloned().unwrap_or(Value::Null),
                    other => other.clone(),
                };
                out.insert(key.clone(), current);
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    Value::Object(out)
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_splits_on_whitespace() {
        assert_eq!(word_count("one two  three\nfour"), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_append_to_missing_content_starts_at_version_one() {
        let (array, words) =
            append_content_version(None, "hello world", "2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
        let versions = array.as_array().unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0]["version"], 1);
        assert_eq!(versions[0]["tag"], TAG_UPDATED);
        assert_eq!(words, 2);
    }

    #[test]
    fn test_string_content_migrates_to_two_versions() {
        let existing = json!("old body text");
        let (array, words) = append_content_version(
            Some(&existing),
            "brand new body",
            "2024-01-01T00:00:00Z",
            "2024-02-01T00:00:00Z",
        );
        let versions = array.as_array().unwrap();
        assert_eq!(versions.len(), 2);

        // Version 1 carries the old string, tagged generated, dated created_at
        assert_eq!(versions[0]["version"], 1);
        assert_eq!(versions[0]["tag"], TAG_GENERATED);
        assert_eq!(versions[0]["html"], "old body text");
        assert_eq!(versions[0]["saved_at"], "2024-01-01T00:00:00Z");
        assert_eq!(versions[0]["words_count"], 3);

        // Version 2 is the incoming edit
        assert_eq!(versions[1]["version"], 2);
        assert_eq!(versions[1]["tag"], TAG_UPDATED);
        assert_eq!(versions[1]["saved_at"], "2024-02-01T00:00:00Z");
        assert_eq!(words, 3);
    }

    #[test]
    fn test_array_content_appends_next_version() {
        let existing = json!([
            {"html": "v1", "saved_at": "t1", "tag": "generated", "version": 1, "words_count": 1}
        ]);
        let (array, _) =
            append_content_version(Some(&existing), "v2 text here", "t0", "t2");
        let versions = array.as_array().unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1]["version"], 2);
        assert_eq!(versions[0]["html"], "v1");
    }

    #[test]
    fn test_latest_content_html_both_shapes() {
        assert_eq!(latest_content_html(&json!("plain")), "plain");
        let arr = json!([
            {"html": "a", "version": 1},
            {"html": "b", "version": 2}
        ]);
        assert_eq!(latest_content_html(&arr), "b");
        assert_eq!(latest_content_html(&json!(null)), "");
    }

    #[test]
    fn test_content_versions_legacy_string() {
        let versions = content_versions(&json!("legacy body"), "2023-05-01T00:00:00Z");
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[0].tag, TAG_GENERATED);
        assert_eq!(versions[0].saved_at, "2023-05-01T00:00:00Z");
    }

    #[test]
    fn test_content_versions_preview_truncates() {
        let long = "x".repeat(500);
        let arr = json!([{"html": long, "version": 1, "tag": "updated", "words_count": 1, "saved_at": "t"}]);
        let versions = content_versions(&arr, "t0");
        assert_eq!(versions[0].preview.len(), 200);
    }

    #[test]
    fn test_latest_scalar() {
        assert_eq!(latest_scalar(&json!("only")), "only");
        assert_eq!(latest_scalar(&json!(["first", "second"])), "second");
        assert_eq!(latest_scalar(&json!(null)), "");
        assert_eq!(latest_scalar(&json!([])), "");
    }

    #[test]
    fn test_latest_primary_keyword() {
        let arr = json!([
            {"keyword": "old kw", "search_volume": 10},
            {"keyword": "new kw", "search_volume": 20}
        ]);
        assert_eq!(latest_primary_keyword(&arr), "new kw");
        assert_eq!(latest_primary_keyword(&json!("bare")), "bare");
    }

    #[test]
    fn test_secondary_keywords_old_format_passthrough() {
        let old = json!(["alpha", "beta"]);
        assert_eq!(selected_secondary_keywords(&old), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_secondary_keywords_new_format_filters_selected() {
        let new = json!([
            {"keywords": [{"keyword": "stale", "selected": "true"}], "tag": "generated"},
            {"keywords": [
                {"keyword": "kept", "selected": "true"},
                {"keyword": "dropped", "selected": "false"},
                {"keyword": "also kept", "selected": "true"}
            ], "tag": "final"}
        ]);
        assert_eq!(
            selected_secondary_keywords(&new),
            vec!["kept", "also kept"]
        );
    }

    #[test]
    fn test_record_step_initializes_and_pushes() {
        let mut tracking = Value::Null;
        record_step(&mut tracking, "primary_keyword", "generated", "t1");
        assert_eq!(tracking["current_step"], "primary_keyword");
        assert_eq!(tracking["primary_keyword"].as_array().unwrap().len(), 1);
        assert_eq!(tracking["secondary_keywords"].as_array().unwrap().len(), 0);

        record_step(&mut tracking, "primary_keyword", "updated", "t2");
        record_step(&mut tracking, "category", "generated", "t3");
        assert_eq!(tracking["current_step"], "category");
        assert_eq!(tracking["primary_keyword"].as_array().unwrap().len(), 2);
        assert_eq!(
            tracking["primary_keyword"][1]["status"],
            "updated"
        );
    }

    #[test]
    fn test_serialize_document_flattens_and_strips() {
        let doc = json!({
            "id": "abc",
            "title": ["First", "Second"],
            "category": "Tech",
            "content": [
                {"html": "v1 body", "version": 1},
                {"html": "v2 body", "version": 2}
            ],
            "primary_keyword": [{"keyword": "seo tools", "search_volume": 100}],
            "secondary_keywords": ["a", "b"],
            "sources": [{"url": "internal"}],
            "outline": "internal outline",
            "metadata": {},
            "tags": [],
            "status": "draft"
        });

        let out = serialize_document(&doc);
        assert_eq!(out["title"], "Second");
        assert_eq!(out["category"], "Tech");
        assert_eq!(out["content"], "v2 body");
        assert_eq!(out["primary_keyword"], "seo tools");
        assert_eq!(out["secondary_keywords"], json!(["a", "b"]));
        assert_eq!(out["status"], "draft");
        assert!(out.get("sources").is_none());
        assert!(out.get("outline").is_none());
        assert!(out.get("metadata").is_none());
        assert!(out.get("tags").is_none());
    }
}
