//! `rc-research-server`: an MCP server for arXiv paper research.
//!
//! Speaks newline-delimited JSON-RPC 2.0 over stdio and exposes:
//! - tools `add`, `get_weather`, `search_papers`, `extract_info`;
//! - resources `papers://folders` and `papers://{topic}`;
//! - the `generate_search_prompt` prompt.
//!
//! Search results are cached on disk under the papers directory, one
//! `papers_info.json` per topic.

pub mod arxiv;
pub mod papers;
pub mod prompts;
pub mod resources;
pub mod server;
pub mod tools;
pub mod types;

pub use arxiv::{ArxivClient, PaperSource};
pub use papers::{Paper, PaperInfo, PaperStore};
pub use server::{ResearchServer, ServerConfig};
pub use tools::{ServerTool, ToolRegistry};
pub use types::{ToolError, ToolResult};
