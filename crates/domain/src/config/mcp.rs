//! MCP server launch configuration.
//!
//! The server list lives in its own JSON file (the `mcpServers` layout used
//! by most MCP hosts) rather than in the TOML app config:
//!
//! ```json
//! { "mcpServers": { "research": { "command": "research-server", "args": [] } } }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Contents of the server configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct McpServersFile {
    /// Servers in file order.
    #[serde(rename = "mcpServers", default, deserialize_with = "ordered_servers")]
    pub servers: Vec<McpServerConfig>,
}

/// Configuration for a single MCP server connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpServerConfig {
    /// Server name (the key under `mcpServers`).
    #[serde(skip)]
    pub name: String,

    /// The command to spawn (e.g. `"uv"` or `"research-server"`).
    pub command: String,

    /// Arguments to pass to the command.
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for the spawned process. `null` and a
    /// missing key both mean "inherit only".
    #[serde(default, deserialize_with = "nullable_env")]
    pub env: HashMap<String, String>,
}

impl McpServersFile {
    /// Read and parse the server configuration file.
    ///
    /// A missing or malformed file is a configuration error; callers treat
    /// it as fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let file = Self::parse(&raw).map_err(|e| match e {
            Error::Json(e) => Error::Config(format!("parsing {}: {e}", path.display())),
            other => other,
        })?;
        tracing::debug!(path = %path.display(), servers = file.servers.len(), "loaded server config");
        Ok(file)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

fn nullable_env<'de, D>(de: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(de)?.unwrap_or_default())
}

/// Deserialize the `mcpServers` object into a `Vec`, keeping the key order
/// of the file and copying each key into `McpServerConfig::name`.
fn ordered_servers<'de, D>(de: D) -> std::result::Result<Vec<McpServerConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ServersVisitor;

    impl<'de> Visitor<'de> for ServersVisitor {
        type Value = Vec<McpServerConfig>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of server name to launch specification")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut servers = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, mut cfg)) = map.next_entry::<String, McpServerConfig>()? {
                cfg.name = name;
                servers.push(cfg);
            }
            Ok(servers)
        }
    }

    de.deserialize_map(ServersVisitor)
}
