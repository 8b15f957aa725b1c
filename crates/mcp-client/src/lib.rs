//! `rc-mcp-client`: MCP (Model Context Protocol) client for research-chat.
//!
//! This crate provides:
//! - JSON-RPC 2.0 protocol types for communicating with MCP servers
//!   (shared with `rc-research-server`).
//! - A stdio transport that spawns child processes and communicates over stdin/stdout.
//! - [`McpServer`], one handshaken session with typed request wrappers.
//! - [`SessionRegistry`] and [`ToolCatalog`], the routing tables built
//!   during discovery.
//! - [`McpManager`], which connects to every configured server, isolates
//!   per-server failures, and owns the registries.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rc_mcp_client::{McpManager, StdioLauncher};
//!
//! let mut manager = McpManager::empty();
//! manager.connect_to_servers(&servers_file.servers, &StdioLauncher).await;
//!
//! if let Some(session) = manager.tool_session("add") {
//!     let result = session.call_tool("add", args).await?;
//! }
//! manager.shutdown().await;
//! ```

pub mod catalog;
pub mod manager;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-exports for convenience.
pub use catalog::ToolCatalog;
pub use manager::{DiscoveryReport, Launcher, McpManager, StdioLauncher};
pub use protocol::{McpPromptDef, McpToolDef, PromptContent};
pub use rc_domain::config::{McpServerConfig, McpServersFile};
pub use registry::SessionRegistry;
pub use server::{McpError, McpServer};
