//! MCP manager: holds all MCP server connections and everything discovered
//! from them: the tool catalog, the prompt list, and the routing tables.

use std::sync::Arc;

use rc_domain::config::McpServerConfig;

use crate::catalog::ToolCatalog;
use crate::protocol::McpPromptDef;
use crate::registry::SessionRegistry;
use crate::server::{McpError, McpServer};
use crate::transport::{McpTransport, StdioTransport, TransportError};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Launchers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Opens the transport for one configured server.
pub trait Launcher: Send + Sync {
    fn launch(&self, config: &McpServerConfig) -> Result<Box<dyn McpTransport>, TransportError>;
}

/// Spawns each server as a child process speaking MCP over stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioLauncher;

impl Launcher for StdioLauncher {
    fn launch(&self, config: &McpServerConfig) -> Result<Box<dyn McpTransport>, TransportError> {
        Ok(Box::new(StdioTransport::spawn(config)?))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Discovery report
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outcome of a discovery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    /// Servers that completed the handshake and are kept.
    pub connected: Vec<String>,
    /// Connected servers whose enumeration stopped part-way, with the error.
    /// Whatever was registered before the error stays usable.
    pub partial: Vec<(String, String)>,
    /// Servers that failed to launch or handshake, with the error message.
    pub failed: Vec<(String, String)>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// McpManager
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Owner of every session and routing table. Registration is additive:
/// nothing is ever removed or reconnected.
#[derive(Default)]
pub struct McpManager {
    servers: Vec<Arc<McpServer>>,
    catalog: ToolCatalog,
    tools: SessionRegistry,
    prompts: SessionRegistry,
    resources: SessionRegistry,
    prompt_defs: Vec<McpPromptDef>,
}

impl McpManager {
    /// Create an empty manager (no MCP servers connected).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Connect to every configured server in order.
    ///
    /// Servers that fail to launch or handshake are logged and skipped; one
    /// bad server never prevents discovery of the rest. A server whose
    /// enumeration fails after the handshake stays connected and is also
    /// listed under `partial`.
    pub async fn connect_to_servers(
        &mut self,
        configs: &[McpServerConfig],
        launcher: &dyn Launcher,
    ) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for config in configs {
            tracing::info!(
                server = %config.name,
                command = %config.command,
                "connecting to MCP server"
            );

            let server = match Self::open_session(config, launcher).await {
                Ok(server) => server,
                Err(e) => {
                    tracing::warn!(
                        server = %config.name,
                        error = %e,
                        "failed to connect to MCP server, skipping"
                    );
                    report.failed.push((config.name.clone(), e.to_string()));
                    continue;
                }
            };

            report.connected.push(config.name.clone());
            if let Err(e) = self.add_session(server).await {
                tracing::warn!(
                    server = %config.name,
                    error = %e,
                    "MCP server enumeration incomplete, keeping what was registered"
                );
                report.partial.push((config.name.clone(), e.to_string()));
            }
        }

        tracing::info!(
            connected = report.connected.len(),
            partial = report.partial.len(),
            failed = report.failed.len(),
            tools = self.catalog.len(),
            prompts = self.prompt_defs.len(),
            resources = self.resources.len(),
            "MCP discovery finished"
        );

        report
    }

    /// Launch one server and complete the handshake.
    async fn open_session(
        config: &McpServerConfig,
        launcher: &dyn Launcher,
    ) -> Result<McpServer, McpError> {
        let transport = launcher.launch(config)?;
        McpServer::connect(config.name.clone(), transport).await
    }

    /// Take ownership of a connected session and enumerate its tools,
    /// prompts, and resources (each only when the server advertises the
    /// capability).
    ///
    /// The session is kept even when enumeration fails part-way, so it is
    /// still shut down with the others; anything registered before the
    /// failure stays registered.
    pub async fn add_session(&mut self, server: McpServer) -> Result<(), McpError> {
        let server = Arc::new(server);
        self.servers.push(Arc::clone(&server));
        let name = server.name().to_string();

        if server.capabilities().tools.is_some() {
            let tools = server.list_tools().await?;
            tracing::info!(
                server = %name,
                tools = ?tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
                "registered tools"
            );
            for tool in tools {
                self.tools.register(tool.name.clone(), Arc::clone(&server));
                self.catalog.insert(tool.into());
            }
        }

        if server.capabilities().prompts.is_some() {
            let prompts = server.list_prompts().await?;
            tracing::info!(
                server = %name,
                prompts = ?prompts.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
                "registered prompts"
            );
            for prompt in prompts {
                self.prompts.register(prompt.name.clone(), Arc::clone(&server));
                self.insert_prompt(prompt);
            }
        }

        if server.capabilities().resources.is_some() {
            let resources = server.list_resources().await?;
            tracing::info!(
                server = %name,
                resources = ?resources.iter().map(|r| r.uri.as_str()).collect::<Vec<_>>(),
                "registered resources"
            );
            for resource in resources {
                self.resources.register(resource.uri, Arc::clone(&server));
            }
        }

        Ok(())
    }

    fn insert_prompt(&mut self, prompt: McpPromptDef) {
        match self.prompt_defs.iter_mut().find(|p| p.name == prompt.name) {
            Some(existing) => *existing = prompt,
            None => self.prompt_defs.push(prompt),
        }
    }

    /// Tools exposed to the completion endpoint.
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Prompt descriptors in discovery order.
    pub fn prompts(&self) -> &[McpPromptDef] {
        &self.prompt_defs
    }

    pub fn tool_session(&self, tool_name: &str) -> Option<Arc<McpServer>> {
        self.tools.resolve(tool_name)
    }

    /// Prompts are registered one by one, so lookup is exact only.
    pub fn prompt_session(&self, prompt_name: &str) -> Option<Arc<McpServer>> {
        self.prompts.resolve(prompt_name)
    }

    /// Resource lookup with `scheme://` fallback.
    pub fn resource_session(&self, uri: &str) -> Option<Arc<McpServer>> {
        self.resources.resolve_resource(uri)
    }

    pub fn resource_uris(&self) -> Vec<&str> {
        self.resources.names()
    }

    /// Return the number of connected servers.
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.servers.iter().map(|s| s.name()).collect()
    }

    /// Gracefully shut down all servers concurrently.
    pub async fn shutdown(&self) {
        let futs: Vec<_> = self.servers.iter().map(|s| s.shutdown()).collect();
        futures_util::future::join_all(futs).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JsonRpcError;
    use crate::testing::{method_not_found, MockTransport};
    use serde_json::json;

    /// Launches mocks keyed by server name; unknown names fail to spawn.
    struct MockLauncher;

    impl Launcher for MockLauncher {
        fn launch(&self, config: &McpServerConfig) -> Result<Box<dyn McpTransport>, TransportError> {
            match config.name.as_str() {
                "broken" => Ok(Box::new(MockTransport::raw(|_, _| {
                    Err(JsonRpcError { code: -32603, message: "init failed".into(), data: None })
                }))),
                "research" => Ok(Box::new(research_mock())),
                "half" => Ok(Box::new(MockTransport::new(|method, _| match method {
                    "tools/list" => Ok(json!({ "tools": [{ "name": "lookup" }] })),
                    "prompts/list" => Err(JsonRpcError {
                        code: -32603,
                        message: "prompt store offline".into(),
                        data: None,
                    }),
                    other => Err(method_not_found(other)),
                }))),
                "math" => Ok(Box::new(MockTransport::with_tools(
                    json!([{ "name": "add" }]),
                    |_, _| "4".into(),
                ))),
                _ => Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such command",
                ))),
            }
        }
    }

    fn research_mock() -> MockTransport {
        MockTransport::new(|method, _| match method {
            "tools/list" => Ok(json!({ "tools": [
                { "name": "search_papers", "description": "Search arXiv" },
                { "name": "add" }
            ]})),
            "prompts/list" => Ok(json!({ "prompts": [
                { "name": "generate_search_prompt", "arguments": [{ "name": "topic", "required": true }] }
            ]})),
            "resources/list" => Ok(json!({ "resources": [
                { "uri": "papers://folders", "name": "folders" }
            ]})),
            other => Err(method_not_found(other)),
        })
    }

    fn cfg(name: &str) -> McpServerConfig {
        McpServerConfig {
            name: name.into(),
            command: "unused".into(),
            args: Vec::new(),
            env: Default::default(),
        }
    }

    #[tokio::test]
    async fn failed_server_does_not_block_others() {
        let mut mgr = McpManager::empty();
        let report = mgr
            .connect_to_servers(&[cfg("broken"), cfg("research")], &MockLauncher)
            .await;

        assert_eq!(report.connected, ["research"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");

        assert_eq!(mgr.server_names(), ["research"]);
        assert_eq!(mgr.catalog().names(), ["search_papers", "add"]);
        assert_eq!(mgr.tool_session("search_papers").unwrap().name(), "research");
        assert_eq!(mgr.prompt_session("generate_search_prompt").unwrap().name(), "research");
        assert_eq!(mgr.resource_uris(), ["papers://folders"]);
        assert_eq!(mgr.prompts()[0].arguments[0].name, "topic");
    }

    #[tokio::test]
    async fn spawn_failure_is_isolated() {
        let mut mgr = McpManager::empty();
        let report = mgr
            .connect_to_servers(&[cfg("missing-binary"), cfg("math")], &MockLauncher)
            .await;
        assert_eq!(report.connected, ["math"]);
        assert_eq!(report.failed[0].0, "missing-binary");
        assert!(mgr.tool_session("add").is_some());
    }

    #[tokio::test]
    async fn later_server_wins_tool_name_collision() {
        let mut mgr = McpManager::empty();
        mgr.connect_to_servers(&[cfg("research"), cfg("math")], &MockLauncher).await;
        assert_eq!(mgr.tool_session("add").unwrap().name(), "math");
        assert_eq!(mgr.catalog().len(), 2);
    }

    #[tokio::test]
    async fn rediscovery_overwrites_without_error() {
        let mut mgr = McpManager::empty();
        mgr.connect_to_servers(&[cfg("math")], &MockLauncher).await;
        let report = mgr.connect_to_servers(&[cfg("math")], &MockLauncher).await;
        assert_eq!(report.connected, ["math"]);
        assert_eq!(mgr.catalog().len(), 1);
        assert_eq!(mgr.server_count(), 2);
    }

    #[tokio::test]
    async fn enumeration_failure_keeps_earlier_registrations() {
        let mock = MockTransport::new(|method, _| match method {
            "tools/list" => Ok(json!({ "tools": [{ "name": "add" }] })),
            other => Err(method_not_found(other)),
        });
        let server = McpServer::connect("half", Box::new(mock)).await.unwrap();

        let mut mgr = McpManager::empty();
        assert!(mgr.add_session(server).await.is_err());
        assert!(mgr.tool_session("add").is_some());
        assert!(mgr.prompts().is_empty());
        assert_eq!(mgr.server_count(), 1);
    }

    #[tokio::test]
    async fn partial_enumeration_is_reported_as_connected() {
        let mut mgr = McpManager::empty();
        let report = mgr
            .connect_to_servers(&[cfg("half"), cfg("math")], &MockLauncher)
            .await;

        assert_eq!(report.connected, ["half", "math"]);
        assert!(report.failed.is_empty());
        assert_eq!(report.partial.len(), 1);
        assert_eq!(report.partial[0].0, "half");
        assert_eq!(mgr.tool_session("lookup").unwrap().name(), "half");
        assert_eq!(mgr.catalog().names(), ["lookup", "add"]);
        assert!(mgr.prompts().is_empty());
    }

    #[tokio::test]
    async fn unadvertised_capabilities_are_not_listed() {
        let mock = MockTransport::raw(|method, _| match method {
            "initialize" => Ok(json!({ "capabilities": { "tools": {} } })),
            "tools/list" => Ok(json!({ "tools": [{ "name": "add" }] })),
            other => Err(method_not_found(other)),
        });
        let log = mock.log();
        let server = McpServer::connect("tools-only", Box::new(mock)).await.unwrap();

        let mut mgr = McpManager::empty();
        mgr.add_session(server).await.unwrap();
        assert!(!log.methods().iter().any(|m| m == "prompts/list"));
        assert!(!log.methods().iter().any(|m| m == "resources/list"));
    }

    #[tokio::test]
    async fn shutdown_reaches_every_session() {
        let mock = MockTransport::with_tools(json!([]), |_, _| String::new());
        let log = mock.log();
        let server = McpServer::connect("s", Box::new(mock)).await.unwrap();
        let mut mgr = McpManager::empty();
        mgr.add_session(server).await.unwrap();
        mgr.shutdown().await;
        assert_eq!(log.methods().last().map(String::as_str), Some("shutdown"));
    }
}
