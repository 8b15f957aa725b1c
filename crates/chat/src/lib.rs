//! `rc-chat`: the research-chat client: the tool-calling loop over MCP
//! sessions plus the interactive command line.

pub mod access;
pub mod bootstrap;
pub mod cli;
pub mod runtime;

pub use access::{PromptOutcome, ResourceOutcome};
pub use runtime::{Chatbot, LoopState, QueryOutcome, ROUND_LIMIT_MESSAGE};
