//! arXiv search and cached paper lookup.

use std::sync::Arc;

use rc_mcp_client::protocol::McpToolDef;
use serde_json::{json, Value};

use super::{int_arg, required_str, Args, ServerTool};
use crate::arxiv::PaperSource;
use crate::papers::{topic_dir_name, PaperStore};
use crate::types::{ToolError, ToolResult};

pub const DEFAULT_MAX_RESULTS: i64 = 5;

/// `search_papers`: query the paper source, merge the hits into the
/// topic's cache file and return their short ids.
pub struct SearchPapersTool {
    store: PaperStore,
    source: Arc<dyn PaperSource>,
}

impl SearchPapersTool {
    pub fn new(store: PaperStore, source: Arc<dyn PaperSource>) -> Self {
        Self { store, source }
    }
}

#[async_trait::async_trait]
impl ServerTool for SearchPapersTool {
    fn definition(&self) -> McpToolDef {
        McpToolDef {
            name: "search_papers".into(),
            description: "Search arXiv for papers on a topic and store their information. \
                          Returns the list of paper IDs found."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "topic": { "type": "string", "description": "The topic to search for" },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of results to retrieve",
                        "default": DEFAULT_MAX_RESULTS
                    }
                },
                "required": ["topic"]
            }),
        }
    }

    async fn call(&self, args: Args) -> ToolResult {
        let topic = required_str(&args, "topic")?;
        if topic_dir_name(topic).is_none() {
            return Err(ToolError::InvalidArgs(format!("'topic' is not a usable folder name: {topic:?}")));
        }
        let max_results = int_arg(&args, "max_results")?.unwrap_or(DEFAULT_MAX_RESULTS);
        let max_results = usize::try_from(max_results)
            .map_err(|_| ToolError::InvalidArgs("'max_results' must not be negative".into()))?;

        let papers = self.source.search(topic, max_results).await?;
        let path = self.store.save(topic, &papers)?;
        tracing::info!(topic, found = papers.len(), path = %path.display(), "papers saved");

        Ok(Value::Array(papers.into_iter().map(|p| Value::String(p.id)).collect()))
    }
}

/// `extract_info`: find one paper in any topic's cache.
pub struct ExtractInfoTool {
    store: PaperStore,
}

impl ExtractInfoTool {
    pub fn new(store: PaperStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ServerTool for ExtractInfoTool {
    fn definition(&self) -> McpToolDef {
        McpToolDef {
            name: "extract_info".into(),
            description: "Search for information about a specific paper across all topic directories.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "paper_id": { "type": "string", "description": "The ID of the paper to look for" }
                },
                "required": ["paper_id"]
            }),
        }
    }

    async fn call(&self, args: Args) -> ToolResult {
        let paper_id = required_str(&args, "paper_id")?;
        match self.store.find(paper_id)? {
            Some(info) => Ok(Value::String(serde_json::to_string_pretty(&info)?)),
            None => Ok(Value::String(format!(
                "There's no saved information related to paper {paper_id}."
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::papers::tests::paper;
    use crate::papers::{Paper, TopicLoad};
    use std::sync::Mutex;

    struct FixedSource {
        papers: Vec<Paper>,
        seen: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait::async_trait]
    impl PaperSource for FixedSource {
        async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<Paper>, ToolError> {
            self.seen.lock().unwrap().push((topic.to_string(), max_results));
            Ok(self.papers.iter().take(max_results).cloned().collect())
        }
    }

    fn source(papers: Vec<Paper>) -> Arc<FixedSource> {
        Arc::new(FixedSource {
            papers,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn args(v: Value) -> Args {
        v.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn search_saves_and_returns_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        let src = source(vec![paper("1111.0001v1", "One"), paper("2222.0002v1", "Two")]);
        let tool = SearchPapersTool::new(store.clone(), src.clone());

        let out = tool.call(args(json!({ "topic": "Graph Neural Nets" }))).await.unwrap();
        assert_eq!(out, json!(["1111.0001v1", "2222.0002v1"]));
        assert_eq!(src.seen.lock().unwrap()[0], ("Graph Neural Nets".to_string(), 5));

        let TopicLoad::Papers(map) = store.load_topic("graph neural nets") else {
            panic!("cache not written");
        };
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn search_honours_max_results() {
        let tmp = tempfile::tempdir().unwrap();
        let src = source(vec![paper("1", "a"), paper("2", "b"), paper("3", "c")]);
        let tool = SearchPapersTool::new(PaperStore::new(tmp.path()), src);

        let out = tool.call(args(json!({ "topic": "x", "max_results": "1" }))).await.unwrap();
        assert_eq!(out, json!(["1"]));
        assert!(tool.call(args(json!({ "topic": "x", "max_results": -1 }))).await.is_err());
    }

    #[tokio::test]
    async fn search_refuses_topics_outside_the_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("papers");
        let src = source(vec![paper("1", "a")]);
        let tool = SearchPapersTool::new(PaperStore::new(&root), src.clone());

        for topic in ["../escaped", "/tmp/abs", ".."] {
            let err = tool.call(args(json!({ "topic": topic }))).await.unwrap_err();
            assert!(matches!(err, ToolError::InvalidArgs(_)), "{topic}: {err}");
        }
        assert!(!tmp.path().join("escaped").exists());
        assert!(src.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn extract_info_finds_saved_paper() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        store.save("nlp", &[paper("1810.04805v2", "BERT")]).unwrap();
        let tool = ExtractInfoTool::new(store);

        let out = tool.call(args(json!({ "paper_id": "1810.04805v2" }))).await.unwrap();
        let text = out.as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["title"], "BERT");
        assert!(text.contains("\n  \"title\""));
    }

    #[tokio::test]
    async fn extract_info_reports_unknown_paper() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = ExtractInfoTool::new(PaperStore::new(tmp.path()));
        let out = tool.call(args(json!({ "paper_id": "0000.0000" }))).await.unwrap();
        assert_eq!(out, json!("There's no saved information related to paper 0000.0000."));
    }
}
