//! Shared row models
//!
//! Typed representations of the relational entities. The blog document's
//! semi-structured fields stay as `serde_json::Value`; see the versioning
//! module for the rules that govern them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Targeting gender for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    All,
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::All => "all",
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::All,
        }
    }
}

/// A registered website
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub url: String,
    pub brand_name: Option<String>,
    pub business_type: Option<String>,
    pub industries: Vec<String>,
    pub services: Vec<String>,
    pub languages: Vec<String>,
    pub age_groups: Vec<String>,
    pub locations: Vec<String>,
    pub gender: Gender,
    pub visitors: i64,
    pub cms_config: Option<Value>,
    pub internal_linking_enabled: bool,
    pub pinned: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tracked keyword row with SEMrush metrics
#[derive(Debug, Clone, Serialize)]
pub struct Keyword {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub search_volume: i64,
    pub difficulty: i64,
    pub intent: String,
    pub cpc: f64,
    pub competition: f64,
    pub country: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Stored WordPress connection for a project
#[derive(Debug, Clone)]
pub struct WordPressCredentials {
    pub project_id: Uuid,
    pub site_url: String,
    pub username: String,
    pub app_password: String,
    pub created_at: DateTime<Utc>,
}

/// Stored Shopify connection for a project
#[derive(Debug, Clone)]
pub struct ShopifyCredentials {
    pub project_id: Uuid,
    pub shop_domain: String,
    pub access_token: String,
    pub api_version: String,
    pub created_at: DateTime<Utc>,
}

/// Background job lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "running" => TaskStatus::Running,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Pending,
        }
    }
}

/// A persisted background job row
#[derive(Debug, Clone, Serialize)]
pub struct BackgroundTask {
    pub id: Uuid,
    pub kind: String,
    pub project_id: Option<Uuid>,
    pub user_id: Uuid,
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A blog document row: typed envelope plus semi-structured fields
#[derive(Debug, Clone)]
pub struct BlogRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub source: String,
    pub country: Option<String>,
    pub intent: Option<String>,
    pub words_count: i64,
    pub is_active: bool,
    pub error_message: Option<String>,
    /// Versioned document fields (title, content, step_tracking, ...)
    pub fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogRecord {
    /// Merge envelope columns and document fields into one JSON object for
    /// serialization. Timestamps convert to IST on the way out.
    pub fn to_document(&self) -> Value {
        let mut doc = match &self.fields {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };

        doc.insert("id".into(), Value::String(self.id.to_string()));
        doc.insert(
            "project_id".into(),
            Value::String(self.project_id.to_string()),
        );
        doc.insert("user_id".into(), Value::String(self.user_id.to_string()));
        doc.insert("status".into(), Value::String(self.status.clone()));
        doc.insert("source".into(), Value::String(self.source.clone()));
        if let Some(country) = &self.country {
            doc.insert("country".into(), Value::String(country.clone()));
        }
        if let Some(intent) = &self.intent {
            doc.insert("intent".into(), Value::String(intent.clone()));
        }
        if let Some(error) = &self.error_message {
            doc.insert("error_message".into(), Value::String(error.clone()));
        }
        doc.insert("words_count".into(), Value::from(self.words_count));
        doc.insert("is_active".into(), Value::Bool(self.is_active));
        doc.insert(
            "created_at".into(),
            Value::String(crate::time::ist_string(self.created_at)),
        );
        doc.insert(
            "updated_at".into(),
            Value::String(crate::time::ist_string(self.updated_at)),
        );

        Value::Object(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_roundtrip() {
        assert_eq!(Gender::parse("male"), Gender::Male);
        assert_eq!(Gender::parse("unexpected"), Gender::All);
        assert_eq!(Gender::Female.as_str(), "female");
    }

    #[test]
    fn test_task_status_parse() {
        assert_eq!(TaskStatus::parse("completed"), TaskStatus::Completed);
        assert_eq!(TaskStatus::parse("bogus"), TaskStatus::Pending);
    }

    #[test]
    fn test_blog_record_document_merge() {
        let record = BlogRecord {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: "draft".into(),
            source: "rayo".into(),
            country: Some("in".into()),
            intent: None,
            words_count: 42,
            is_active: true,
            error_message: None,
            fields: serde_json::json!({"title": ["One"]}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let doc = record.to_document();
        assert_eq!(doc["status"], "draft");
        assert_eq!(doc["words_count"], 42);
        assert_eq!(doc["title"], serde_json::json!(["One"]));
        assert!(doc["created_at"].as_str().unwrap().ends_with("+05:30"));
    }
}
