//! MCP Tool handlers
//!
//! Validates tool arguments against the registry and forwards them to the
//! Hex API client.

use super::protocol::{JsonRpcError, ToolCallResult};
use super::schema::{FieldViolation, ToolSpec};
use super::tools::{all_tool_specs, names};
use crate::hex::{EmbedUrlParams, HexApi, ListProjectsParams, Project, RunProjectParams};
use anyhow::anyhow;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default web app root used for view URLs
pub const DEFAULT_APP_URL: &str = "https://app.hex.tech";

/// Why a tool call failed
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid parameters: {}", join_violations(.0))]
    InvalidParams(Vec<FieldViolation>),

    #[error("Tool execution failed: {0:#}")]
    Execution(anyhow::Error),
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ToolError {
    /// Protocol-level fault for this error
    pub fn to_json_rpc(&self) -> JsonRpcError {
        match self {
            ToolError::UnknownTool(_) => JsonRpcError {
                code: super::protocol::error_codes::METHOD_NOT_FOUND,
                message: self.to_string(),
                data: None,
            },
            ToolError::InvalidParams(violations) => JsonRpcError::invalid_params(self.to_string())
                .with_data(json!({ "violations": violations })),
            ToolError::Execution(_) => JsonRpcError::internal_error(self.to_string()),
        }
    }
}

impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        ToolError::Execution(err)
    }
}

// ============================================================================
// Typed arguments (built from validated, defaulted argument maps)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectArgs {
    project_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunArgs {
    project_id: String,
    run_id: String,
}

/// Which page of the web app a view URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectViewMode {
    /// Published app with its latest cached results
    App,
    /// Notebook editor
    Edit,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectUrlArgs {
    project_id: String,
    view_mode: ProjectViewMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunProjectArgs {
    project_id: String,
    #[serde(flatten)]
    params: RunProjectParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbedArgs {
    project_id: String,
    #[serde(flatten)]
    params: EmbedUrlParams,
}

/// URL of a project in the Hex web app
pub fn project_view_url(app_url: &str, project_id: &str, mode: ProjectViewMode) -> String {
    let app_url = app_url.trim_end_matches('/');
    let project_id = urlencoding::encode(project_id);
    match mode {
        ProjectViewMode::App => format!("{}/app/{}/latest", app_url, project_id),
        ProjectViewMode::Edit => format!("{}/project/{}", app_url, project_id),
    }
}

fn parse_args<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| {
        ToolError::InvalidParams(vec![FieldViolation {
            field: "arguments".to_string(),
            reason: e.to_string(),
        }])
    })
}

fn json_result<T: Serialize>(value: &T) -> Result<ToolCallResult, ToolError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ToolError::Execution(anyhow!("Failed to serialize result: {}", e)))?;
    Ok(ToolCallResult::success(text))
}

fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("Unknown")
}

fn dashboard_summary(project: &Project, url: &str) -> String {
    let name = Some(project.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("Untitled Project");
    let owner = project.owner.as_ref().map(|o| o.email.as_str());
    format!(
        "**{}**\n\nView dashboard at: {}\n\n\
         This shows the latest cached/scheduled results without triggering a new run.\n\n\
         Project details:\n- Status: {}\n- Updated: {}\n- Owner: {}",
        name,
        url,
        or_unknown(project.status.as_deref()),
        or_unknown(project.updated_at.as_deref()),
        or_unknown(owner),
    )
}

// ============================================================================
// Handler
// ============================================================================

/// Handles MCP tool calls
pub struct ToolHandler {
    api: Arc<dyn HexApi>,
    app_url: String,
    specs: HashMap<&'static str, ToolSpec>,
}

impl ToolHandler {
    pub fn new(api: Arc<dyn HexApi>, app_url: impl Into<String>) -> Self {
        let specs = all_tool_specs()
            .into_iter()
            .map(|spec| (spec.name, spec))
            .collect();
        Self {
            api,
            app_url: app_url.into(),
            specs,
        }
    }

    /// Validate the arguments of a tool call and run it.
    ///
    /// Unknown tools and invalid arguments are rejected before the API is
    /// touched. Exactly one client operation runs per successful validation.
    pub async fn handle(
        &self,
        name: &str,
        args: Option<Value>,
    ) -> Result<ToolCallResult, ToolError> {
        let spec = self
            .specs
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args = spec
            .validate(args.as_ref())
            .map_err(ToolError::InvalidParams)?;

        debug!(tool = name, ?args, "Validated tool arguments");

        match name {
            // Projects
            names::LIST_PROJECTS => self.list_projects(args).await,
            names::GET_PROJECT => self.get_project(args).await,
            names::GET_PROJECT_URL => self.get_project_url(args),
            names::VIEW_DASHBOARD => self.view_dashboard(args).await,

            // Runs
            names::RUN_PROJECT => self.run_project(args).await,
            names::GET_RUN_STATUS => self.get_run_status(args).await,
            names::CANCEL_RUN => self.cancel_run(args).await,
            names::RATE_LIMIT_STATUS => self.rate_limit_status(),

            // Embeds
            names::CREATE_EMBED_URL => self.create_embed_url(args),

            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }

    // ========================================================================
    // Project Handlers
    // ========================================================================

    async fn list_projects(&self, args: Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let params: ListProjectsParams = parse_args(args)?;
        let projects = self.api.list_projects(&params).await?;
        json_result(&projects)
    }

    async fn get_project(&self, args: Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let args: ProjectArgs = parse_args(args)?;
        let project = self.api.get_project(&args.project_id).await?;
        json_result(&project)
    }

    fn get_project_url(&self, args: Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let args: ProjectUrlArgs = parse_args(args)?;
        let url = project_view_url(&self.app_url, &args.project_id, args.view_mode);
        Ok(ToolCallResult::success(format!(
            "View project at: {}\n\n\
             This URL shows the latest published/cached results without triggering a new run.",
            url
        )))
    }

    /// Never fails on a fetch error: the error is reported as text content
    async fn view_dashboard(&self, args: Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let args: ProjectArgs = parse_args(args)?;
        match self.api.get_project(&args.project_id).await {
            Ok(project) => {
                let url = project_view_url(&self.app_url, &args.project_id, ProjectViewMode::App);
                Ok(ToolCallResult::success(dashboard_summary(&project, &url)))
            }
            Err(e) => {
                warn!(project_id = %args.project_id, "Failed to load dashboard: {:#}", e);
                Ok(ToolCallResult::success(format!(
                    "Error viewing dashboard: {:#}",
                    e
                )))
            }
        }
    }

    // ========================================================================
    // Run Handlers
    // ========================================================================

    async fn run_project(&self, args: Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let args: RunProjectArgs = parse_args(args)?;
        let run = self.api.run_project(&args.project_id, &args.params).await?;
        json_result(&run)
    }

    async fn get_run_status(&self, args: Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let args: RunArgs = parse_args(args)?;
        let run = self
            .api
            .get_run_status(&args.project_id, &args.run_id)
            .await?;
        json_result(&run)
    }

    async fn cancel_run(&self, args: Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let args: RunArgs = parse_args(args)?;
        self.api.cancel_run(&args.project_id, &args.run_id).await?;
        Ok(ToolCallResult::success(format!(
            "Successfully canceled run {} for project {}",
            args.run_id, args.project_id
        )))
    }

    fn rate_limit_status(&self) -> Result<ToolCallResult, ToolError> {
        json_result(&self.api.rate_limit_info())
    }

    // ========================================================================
    // Embed Handlers
    // ========================================================================

    fn create_embed_url(&self, args: Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let args: EmbedArgs = parse_args(args)?;
        json_result(&self.api.create_project_embed_url(&args.project_id, &args.params))
    }
}
