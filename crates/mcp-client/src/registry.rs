//! Session registry: routes a tool name, prompt name, or resource URI to
//! the server session that serves it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::server::McpServer;

/// Name → session routing table.
///
/// Registration overwrites: the last server to register a name owns it.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    routes: HashMap<String, Arc<McpServer>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `name` to `session`, returning the session it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        session: Arc<McpServer>,
    ) -> Option<Arc<McpServer>> {
        let name = name.into();
        let previous = self.routes.insert(name.clone(), session);
        if let Some(prev) = &previous {
            tracing::debug!(name = %name, previous = %prev.name(), "route overwritten");
        }
        previous
    }

    /// Exact-match lookup.
    pub fn resolve(&self, name: &str) -> Option<Arc<McpServer>> {
        self.routes.get(name).cloned()
    }

    /// Resource lookup: exact match first, then any registered identifier
    /// with the same `scheme://` prefix.
    ///
    /// Per-topic URIs such as `papers://nlp` are never listed up front (only
    /// `papers://folders` is), so they are served by whichever session owns
    /// the scheme. With several candidates the pick follows map iteration
    /// order and is not stable.
    pub fn resolve_resource(&self, uri: &str) -> Option<Arc<McpServer>> {
        if let Some(session) = self.resolve(uri) {
            return Some(session);
        }
        let prefix = scheme_prefix(uri)?;
        self.routes
            .iter()
            .find(|(registered, _)| registered.starts_with(prefix))
            .map(|(_, session)| Arc::clone(session))
    }

    /// Registered names (sorted).
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// `"papers://ml"` → `Some("papers://")`; `None` when there is no scheme.
fn scheme_prefix(uri: &str) -> Option<&str> {
    let idx = uri.find("://")?;
    (idx > 0).then(|| &uri[..idx + 3])
}
