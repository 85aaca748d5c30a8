//! Data models for the Hex REST API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Projects
// ============================================================================

/// Owner of a Hex project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOwner {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// A Hex project as returned by the API.
///
/// Fields not modelled here are kept in `extra` so that echoing a project
/// back to the caller does not lose anything the API sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_hex_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ProjectOwner>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cursor information for a page of projects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub after: Option<String>,
    pub before: Option<String>,
}

/// A page of projects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectList {
    pub projects: Vec<Project>,
    pub page_info: PageInfo,
}

/// Raw envelope of `GET /projects`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProjectsEnvelope {
    #[serde(default)]
    pub values: Option<Vec<Project>>,
    #[serde(default)]
    pub pagination: Option<PageInfo>,
}

impl From<ProjectsEnvelope> for ProjectList {
    fn from(envelope: ProjectsEnvelope) -> Self {
        let pagination = envelope.pagination.unwrap_or_default();
        let non_empty = |cursor: Option<String>| cursor.filter(|c| !c.is_empty());
        Self {
            projects: envelope.values.unwrap_or_default(),
            page_info: PageInfo {
                after: non_empty(pagination.after),
                before: non_empty(pagination.before),
            },
        }
    }
}

/// Query parameters for listing projects (cursor pagination)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsParams {
    pub limit: Option<u32>,
    pub after: Option<String>,
    pub statuses: Option<Vec<String>>,
}

// ============================================================================
// Runs
// ============================================================================

/// Lifecycle state of a project run.
///
/// Statuses outside the known set are kept verbatim in `Other`, so a run
/// the API accepted is never reported as a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for RunStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            _ => Self::Other(raw),
        }
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// One execution of a project.
///
/// Every field is optional on the wire; fields not modelled here are kept in
/// `extra` and echoed back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRun {
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub run_url: String,
    #[serde(default)]
    pub run_hex_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time_ms: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /project/{id}/run`.
///
/// Only fields the caller set are serialized; an absent flag is not the same
/// as `false` for the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProjectParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cached_sql_results: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_published_results: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_when_not_pending: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

// ============================================================================
// Inputs
// ============================================================================

/// Kind of a project input parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    String,
    Number,
    Boolean,
    Date,
    Select,
    MultiSelect,
}

/// An input parameter declared by a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// Embeds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmbedViewMode {
    App,
    Edit,
    ReadOnly,
}

impl EmbedViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Edit => "edit",
            Self::ReadOnly => "readOnly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Light,
    Dark,
}

impl ColorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Options for building an embed URL
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedUrlParams {
    pub view_mode: Option<EmbedViewMode>,
    pub borderless: Option<bool>,
    pub color_mode: Option<ColorMode>,
    pub hide_header: Option<bool>,
    pub hide_sidebar: Option<bool>,
    pub inputs: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedUrl {
    pub embed_url: String,
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Last known API quota, as reported by `x-ratelimit-*` headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub remaining: i64,
    pub reset: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_keeps_unknown_fields() {
        let raw = json!({
            "id": "p1",
            "name": "Revenue",
            "projectHexId": "abc123",
            "status": "Blessed",
            "owner": {"id": "u1", "email": "ana@example.com", "name": "Ana"},
            "categories": ["finance"]
        });
        let project: Project = serde_json::from_value(raw).unwrap();
        assert_eq!(project.name, "Revenue");
        assert_eq!(project.owner.as_ref().unwrap().email, "ana@example.com");
        assert_eq!(project.extra["categories"], json!(["finance"]));

        let echoed = serde_json::to_value(&project).unwrap();
        assert_eq!(echoed["categories"], json!(["finance"]));
        assert_eq!(echoed["projectHexId"], "abc123");
        assert!(echoed.get("publicUrl").is_none());
    }

    #[test]
    fn test_envelope_defaults() {
        let envelope: ProjectsEnvelope = serde_json::from_value(json!({})).unwrap();
        let list = ProjectList::from(envelope);
        assert!(list.projects.is_empty());
        assert_eq!(list.page_info, PageInfo::default());
    }

    #[test]
    fn test_envelope_empty_cursor_is_none() {
        let envelope: ProjectsEnvelope = serde_json::from_value(json!({
            "values": [{"id": "p1"}],
            "pagination": {"after": "", "before": "c0"}
        }))
        .unwrap();
        let list = ProjectList::from(envelope);
        assert_eq!(list.projects.len(), 1);
        assert_eq!(list.page_info.after, None);
        assert_eq!(list.page_info.before.as_deref(), Some("c0"));

        let json = serde_json::to_value(&list).unwrap();
        assert!(json["pageInfo"]["after"].is_null());
    }

    #[test]
    fn test_run_params_skip_unset_fields() {
        let params = RunProjectParams {
            dry_run: Some(false),
            ..Default::default()
        };
        let body = serde_json::to_value(&params).unwrap();
        assert_eq!(body, json!({"dryRun": false}));
    }

    #[test]
    fn test_run_status() {
        let run: ProjectRun = serde_json::from_value(json!({
            "runId": "r1",
            "runUrl": "https://app.hex.tech/run/r1",
            "runHexId": "x",
            "projectId": "p1",
            "status": "canceled",
            "elapsedTimeMs": 1200
        }))
        .unwrap();
        assert_eq!(run.status, Some(RunStatus::Canceled));
        assert_eq!(run.elapsed_time_ms, Some(1200));
        assert!(run.extra.is_empty());
    }

    #[test]
    fn test_run_keeps_unlisted_status_and_fields() {
        let body = json!({
            "runId": "r1",
            "status": "ERRORED",
            "runStatusUrl": "https://app.hex.tech/api/v1/project/p1/run/r1",
            "traceId": "t-9"
        });
        let run: ProjectRun = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(run.status, Some(RunStatus::Other("ERRORED".into())));
        assert_eq!(run.extra["traceId"], "t-9");

        let echoed = serde_json::to_value(&run).unwrap();
        assert_eq!(echoed["status"], "ERRORED");
        assert_eq!(echoed["runStatusUrl"], body["runStatusUrl"]);
        assert_eq!(echoed["traceId"], "t-9");
    }

    #[test]
    fn test_run_without_status() {
        let run: ProjectRun = serde_json::from_value(json!({"projectId": "p1"})).unwrap();
        assert_eq!(run.status, None);
        assert_eq!(run.run_id, "");
        let echoed = serde_json::to_value(&run).unwrap();
        assert!(echoed.get("status").is_none());
    }

    #[test]
    fn test_input_type_names() {
        let input: ProjectInput = serde_json::from_value(json!({
            "name": "regions",
            "type": "multi-select",
            "options": ["us", "eu"]
        }))
        .unwrap();
        assert_eq!(input.input_type, InputType::MultiSelect);
        assert!(!input.required);
    }

    #[test]
    fn test_rate_limit_serializes_rfc3339() {
        let info = RateLimitInfo {
            remaining: 12,
            reset: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["remaining"], 12);
        assert_eq!(json["reset"], "2023-11-14T22:13:20Z");
    }
}
