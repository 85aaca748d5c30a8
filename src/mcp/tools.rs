//! MCP Tool definitions
//!
//! Defines the tools exposed by the MCP server, grouped by resource area.
//! Descriptions steer callers towards the cheap read-only tools before the
//! ones that trigger computation.

use super::protocol::ToolDefinition;
use super::schema::{FieldSpec, ToolSpec};
use serde_json::json;

/// Tool names
pub mod names {
    pub const LIST_PROJECTS: &str = "hex_list_projects";
    pub const GET_PROJECT: &str = "hex_get_project";
    pub const GET_PROJECT_URL: &str = "hex_get_project_url";
    pub const VIEW_DASHBOARD: &str = "hex_view_dashboard";
    pub const RUN_PROJECT: &str = "hex_run_project";
    pub const GET_RUN_STATUS: &str = "hex_get_run_status";
    pub const CANCEL_RUN: &str = "hex_cancel_run";
    pub const RATE_LIMIT_STATUS: &str = "hex_rate_limit_status";
    pub const CREATE_EMBED_URL: &str = "hex_create_embed_url";
}

/// Every tool spec, in the order they are advertised
pub fn all_tool_specs() -> Vec<ToolSpec> {
    let mut tools = Vec::new();
    tools.extend(project_tools());
    tools.extend(run_tools());
    tools.extend(embed_tools());
    tools
}

/// Generate all tool definitions
pub fn all_tools() -> Vec<ToolDefinition> {
    all_tool_specs().iter().map(ToolSpec::definition).collect()
}

// ============================================================================
// Project Tools (4)
// ============================================================================

fn project_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            names::LIST_PROJECTS,
            "List all viewable Hex projects with pagination support",
            vec![
                FieldSpec::integer(
                    "limit",
                    "Maximum number of projects to return (1-100, server default 50)",
                )
                .range(1, 100),
                FieldSpec::string("after", "Pagination cursor from previous response"),
                FieldSpec::string_array(
                    "statuses",
                    "Filter by project status (default: [\"Blessed\"])",
                )
                .default_value(json!(["Blessed"])),
            ],
        ),
        ToolSpec::new(
            names::GET_PROJECT,
            "Get detailed information about a specific Hex project",
            vec![FieldSpec::string("projectId", "The ID of the project to retrieve").required()],
        ),
        ToolSpec::new(
            names::GET_PROJECT_URL,
            "PREFERRED: Get URL to view a Hex project with its latest cached/scheduled results. \
             Use this FIRST before running. Shows dashboards without triggering computation.",
            vec![
                FieldSpec::string("projectId", "The ID of the project").required(),
                FieldSpec::one_of(
                    "viewMode",
                    &["app", "edit"],
                    "View mode: \"app\" for published view, \"edit\" for editor",
                )
                .default_value(json!("app")),
            ],
        ),
        ToolSpec::new(
            names::VIEW_DASHBOARD,
            "View a Hex dashboard/project using cached results. Use this for ANY request to \
             \"see\", \"show\", \"view\", or \"check\" a dashboard. Returns both project info \
             and viewing URL.",
            vec![FieldSpec::string("projectId", "The ID of the project to view").required()],
        ),
    ]
}

// ============================================================================
// Run Tools (4)
// ============================================================================

fn run_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            names::RUN_PROJECT,
            "Execute a Hex project (AVOID unless fresh results needed). This triggers \
             computation! For viewing dashboards, use hex_get_project_url instead. Only use \
             this when: 1) Need fresh data, 2) Different inputs required, 3) User explicitly \
             asks to \"run\".",
            vec![
                FieldSpec::string("projectId", "The ID of the project to run").required(),
                FieldSpec::object("inputs", "Input parameters for the project run"),
                FieldSpec::boolean(
                    "useCachedSqlResults",
                    "Use cached SQL results when available (default: true)",
                )
                .default_value(json!(true)),
                FieldSpec::boolean(
                    "updatePublishedResults",
                    "Update the published app results (default: false)",
                )
                .default_value(json!(false)),
                FieldSpec::boolean(
                    "updateCache",
                    "Whether to update the cache (server default: true)",
                ),
                FieldSpec::boolean(
                    "notifyWhenNotPending",
                    "Send notifications when run is no longer pending",
                ),
                FieldSpec::boolean("dryRun", "Simulate the run without actually executing"),
            ],
        ),
        ToolSpec::new(
            names::GET_RUN_STATUS,
            "Get the status of a project run",
            vec![
                FieldSpec::string("projectId", "The ID of the project").required(),
                FieldSpec::string("runId", "The ID of the run to check").required(),
            ],
        ),
        ToolSpec::new(
            names::CANCEL_RUN,
            "Cancel an active project run",
            vec![
                FieldSpec::string("projectId", "The ID of the project").required(),
                FieldSpec::string("runId", "The ID of the run to cancel").required(),
            ],
        ),
        ToolSpec::new(
            names::RATE_LIMIT_STATUS,
            "Get current API rate limit status",
            vec![],
        ),
    ]
}

// ============================================================================
// Embed Tools (1)
// ============================================================================

fn embed_tools() -> Vec<ToolSpec> {
    vec![ToolSpec::new(
        names::CREATE_EMBED_URL,
        "Generate an embed URL for a Hex project with customization options",
        vec![
            FieldSpec::string("projectId", "The ID of the project to embed").required(),
            FieldSpec::one_of(
                "viewMode",
                &["app", "edit", "readOnly"],
                "The view mode for the embedded project",
            ),
            FieldSpec::boolean("borderless", "Remove borders from the embedded view"),
            FieldSpec::one_of(
                "colorMode",
                &["light", "dark"],
                "Color mode for the embedded view",
            ),
            FieldSpec::boolean("hideHeader", "Hide the header in the embedded view"),
            FieldSpec::boolean("hideSidebar", "Hide the sidebar in the embedded view"),
            FieldSpec::object("inputs", "Pre-filled input values for the embedded project"),
        ],
    )]
}
