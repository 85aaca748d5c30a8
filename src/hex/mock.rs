//! In-memory mock implementation of HexApi for testing without the real API.

use super::error::HexApiError;
use super::models::*;
use super::traits::HexApi;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A call received by the mock, with the arguments it was given
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    ListProjects(ListProjectsParams),
    GetProject(String),
    GetProjectInputs(String),
    RunProject(String, RunProjectParams),
    GetRunStatus(String, String),
    CancelRun(String, String),
    CreateEmbedUrl(String, EmbedUrlParams),
    RateLimitInfo,
}

/// Mock Hex API.
///
/// Projects and runs are served from in-memory maps; unknown ids fail with a
/// 404 `HexApiError`. Every call is recorded in order.
pub struct MockHexApi {
    projects: Mutex<Vec<Project>>,
    runs: Mutex<HashMap<String, ProjectRun>>,
    calls: Mutex<Vec<MockCall>>,
    project_gate: Option<Arc<Notify>>,
}

impl MockHexApi {
    pub fn new() -> Self {
        Self {
            projects: Mutex::new(Vec::new()),
            runs: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            project_gate: None,
        }
    }

    pub fn with_project(self, project: Project) -> Self {
        self.projects.lock().unwrap().push(project);
        self
    }

    pub fn with_run(self, run: ProjectRun) -> Self {
        self.runs.lock().unwrap().insert(run.run_id.clone(), run);
        self
    }

    /// Hold every `get_project` call until the gate is notified
    pub fn with_project_gate(mut self, gate: Arc<Notify>) -> Self {
        self.project_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn find_project(&self, project_id: &str) -> Result<Project> {
        self.projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
            .ok_or_else(|| not_found().into())
    }

    fn find_run(&self, project_id: &str, run_id: &str) -> Result<ProjectRun> {
        self.runs
            .lock()
            .unwrap()
            .get(run_id)
            .filter(|r| r.project_id == project_id)
            .cloned()
            .ok_or_else(|| not_found().into())
    }
}

fn not_found() -> HexApiError {
    HexApiError::from_body(404, "Not Found", r#"{"error":"not found"}"#)
}

#[async_trait]
impl HexApi for MockHexApi {
    async fn list_projects(&self, params: &ListProjectsParams) -> Result<ProjectList> {
        self.record(MockCall::ListProjects(params.clone()));
        let projects = self.projects.lock().unwrap();
        let matching = projects
            .iter()
            .filter(|p| match &params.statuses {
                Some(statuses) if !statuses.is_empty() => p
                    .status
                    .as_ref()
                    .map(|s| statuses.contains(s))
                    .unwrap_or(false),
                _ => true,
            })
            .take(params.limit.unwrap_or(u32::MAX) as usize)
            .cloned()
            .collect();
        Ok(ProjectList {
            projects: matching,
            page_info: PageInfo::default(),
        })
    }

    async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.record(MockCall::GetProject(project_id.to_string()));
        if let Some(gate) = &self.project_gate {
            gate.notified().await;
        }
        self.find_project(project_id)
    }

    async fn get_project_inputs(&self, project_id: &str) -> Result<Vec<ProjectInput>> {
        self.record(MockCall::GetProjectInputs(project_id.to_string()));
        self.find_project(project_id)?;
        Ok(Vec::new())
    }

    async fn run_project(
        &self,
        project_id: &str,
        params: &RunProjectParams,
    ) -> Result<ProjectRun> {
        self.record(MockCall::RunProject(project_id.to_string(), params.clone()));
        self.find_project(project_id)?;
        let mut runs = self.runs.lock().unwrap();
        let run = ProjectRun {
            run_id: format!("run-{}", runs.len() + 1),
            run_url: format!("https://app.hex.tech/app/{}/runs", project_id),
            run_hex_id: String::new(),
            project_id: project_id.to_string(),
            status: Some(RunStatus::Pending),
            ..Default::default()
        };
        runs.insert(run.run_id.clone(), run.clone());
        Ok(run)
    }

    async fn get_run_status(&self, project_id: &str, run_id: &str) -> Result<ProjectRun> {
        self.record(MockCall::GetRunStatus(
            project_id.to_string(),
            run_id.to_string(),
        ));
        self.find_run(project_id, run_id)
    }

    async fn cancel_run(&self, project_id: &str, run_id: &str) -> Result<()> {
        self.record(MockCall::CancelRun(project_id.to_string(), run_id.to_string()));
        self.find_run(project_id, run_id)?;
        if let Some(run) = self.runs.lock().unwrap().get_mut(run_id) {
            run.status = Some(RunStatus::Canceled);
        }
        Ok(())
    }

    fn create_project_embed_url(&self, project_id: &str, params: &EmbedUrlParams) -> EmbedUrl {
        self.record(MockCall::CreateEmbedUrl(
            project_id.to_string(),
            params.clone(),
        ));
        EmbedUrl {
            embed_url: format!("https://mock.hex/project/{}/embed", project_id),
        }
    }

    fn rate_limit_info(&self) -> RateLimitInfo {
        self.record(MockCall::RateLimitInfo);
        RateLimitInfo {
            remaining: 42,
            reset: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_project_is_404() {
        let mock = MockHexApi::new();
        let err = mock.get_project("missing").await.unwrap_err();
        let api_err = err.downcast_ref::<HexApiError>().unwrap();
        assert_eq!(api_err.status_code, 404);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_run_then_cancel() {
        let mock = MockHexApi::new().with_project(Project {
            id: "p1".into(),
            ..Default::default()
        });
        let run = mock
            .run_project("p1", &RunProjectParams::default())
            .await
            .unwrap();
        assert_eq!(run.status, Some(RunStatus::Pending));

        mock.cancel_run("p1", &run.run_id).await.unwrap();
        let status = mock.get_run_status("p1", &run.run_id).await.unwrap();
        assert_eq!(status.status, Some(RunStatus::Canceled));
    }
}
