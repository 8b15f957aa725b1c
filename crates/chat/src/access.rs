//! Resource and prompt access for the interactive CLI.
//!
//! Absence is an outcome, not an error: an unknown URI or prompt name comes
//! back as `NotFound` and leaves no trace in any conversation.

use std::collections::HashMap;

use rc_domain::error::Result;
use rc_mcp_client::McpPromptDef;

use crate::runtime::Chatbot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOutcome {
    Found { uri: String, text: String },
    /// A session owns the URI but returned no text content.
    Empty { uri: String },
    NotFound { uri: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    NotFound { name: String },
    NoMessages { name: String },
    /// Text of the first prompt message, ready to run as a query.
    Ready { name: String, text: String },
}

impl Chatbot {
    /// Read a resource, falling back to any session serving the same
    /// `scheme://` when the exact URI was never listed.
    pub async fn get_resource(&self, uri: &str) -> Result<ResourceOutcome> {
        let Some(session) = self.mcp.resource_session(uri) else {
            tracing::debug!(uri, "no session for resource");
            return Ok(ResourceOutcome::NotFound { uri: uri.to_string() });
        };

        tracing::debug!(uri, server = %session.name(), "reading resource");
        let result = session.read_resource(uri).await?;

        Ok(match result.contents.into_iter().next().and_then(|c| c.text) {
            Some(text) => ResourceOutcome::Found {
                uri: uri.to_string(),
                text,
            },
            None => ResourceOutcome::Empty { uri: uri.to_string() },
        })
    }

    pub fn list_prompts(&self) -> &[McpPromptDef] {
        self.mcp.prompts()
    }

    /// Materialize a prompt into the text of its first message. Nothing is
    /// sent to the model; the caller runs the text with `process_query`.
    pub async fn prepare_prompt(
        &self,
        name: &str,
        args: &HashMap<String, String>,
    ) -> Result<PromptOutcome> {
        let Some(session) = self.mcp.prompt_session(name) else {
            return Ok(PromptOutcome::NotFound { name: name.to_string() });
        };

        let result = session.get_prompt(name, args).await?;
        let Some(first) = result.messages.into_iter().next() else {
            return Ok(PromptOutcome::NoMessages { name: name.to_string() });
        };

        tracing::info!(prompt = name, server = %session.name(), "prompt materialized");
        Ok(PromptOutcome::Ready {
            name: name.to_string(),
            text: first.content.into_text(),
        })
    }
}
