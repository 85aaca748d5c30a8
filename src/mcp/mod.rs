//! MCP (Model Context Protocol) server implementation
//!
//! This module provides an MCP server that exposes the Hex API
//! as tools for AI agents and other MCP clients.

pub mod handlers;
pub mod protocol;
pub mod schema;
pub mod server;
pub mod tools;

pub use handlers::{ToolError, ToolHandler};
pub use protocol::*;
pub use server::McpServer;
