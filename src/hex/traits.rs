//! Trait abstraction for Hex API operations

use super::models::*;
use anyhow::Result;
use async_trait::async_trait;

/// Trait abstracting every operation the MCP tools need from the Hex API.
///
/// `HexClient` is the production implementation. Network-backed methods make
/// exactly one HTTP request and never retry.
#[async_trait]
pub trait HexApi: Send + Sync {
    // ========================================================================
    // Projects
    // ========================================================================

    /// List viewable projects, one page at a time
    async fn list_projects(&self, params: &ListProjectsParams) -> Result<ProjectList>;

    /// Get a single project
    async fn get_project(&self, project_id: &str) -> Result<Project>;

    /// Input parameters declared by a project.
    ///
    /// The Hex API has no endpoint for this, so the result is always empty.
    async fn get_project_inputs(&self, project_id: &str) -> Result<Vec<ProjectInput>>;

    // ========================================================================
    // Runs
    // ========================================================================

    /// Trigger a run of a project
    async fn run_project(&self, project_id: &str, params: &RunProjectParams)
        -> Result<ProjectRun>;

    /// Current state of a run; safe to poll
    async fn get_run_status(&self, project_id: &str, run_id: &str) -> Result<ProjectRun>;

    /// Request cancellation of a run.
    ///
    /// The run may still report `running` for a short while afterwards.
    async fn cancel_run(&self, project_id: &str, run_id: &str) -> Result<()>;

    // ========================================================================
    // Local (no network)
    // ========================================================================

    /// Build an embed URL for a project
    fn create_project_embed_url(&self, project_id: &str, params: &EmbedUrlParams) -> EmbedUrl;

    /// Last rate-limit figures seen in a response
    fn rate_limit_info(&self) -> RateLimitInfo;
}
