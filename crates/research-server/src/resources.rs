//! `papers://` resources rendered as markdown.

use rc_mcp_client::protocol::{McpResourceDef, McpResourceTemplate, ResourceContents};

use crate::papers::{PaperStore, TopicLoad};

pub const FOLDERS_URI: &str = "papers://folders";
pub const TOPIC_TEMPLATE: &str = "papers://{topic}";
const SCHEME: &str = "papers://";
const MARKDOWN: &str = "text/markdown";
const SUMMARY_CHARS: usize = 500;

pub fn list() -> Vec<McpResourceDef> {
    vec![McpResourceDef {
        uri: FOLDERS_URI.into(),
        name: "get_available_folders".into(),
        description: Some("List all available topic folders in the papers directory.".into()),
        mime_type: Some(MARKDOWN.into()),
    }]
}

pub fn templates() -> Vec<McpResourceTemplate> {
    vec![McpResourceTemplate {
        uri_template: TOPIC_TEMPLATE.into(),
        name: "get_topic_papers".into(),
        description: Some("Detailed information about papers on a specific topic.".into()),
        mime_type: Some(MARKDOWN.into()),
    }]
}

/// Render the resource at `uri`, or `None` when no resource matches it.
pub fn read(store: &PaperStore, uri: &str) -> std::io::Result<Option<ResourceContents>> {
    let text = if uri == FOLDERS_URI {
        folders_markdown(&store.folders()?)
    } else {
        match uri.strip_prefix(SCHEME) {
            Some(topic) if !topic.is_empty() && !topic.contains('/') => topic_markdown(store, topic),
            _ => return Ok(None),
        }
    };
    Ok(Some(ResourceContents {
        uri: uri.to_string(),
        mime_type: Some(MARKDOWN.into()),
        text: Some(text),
        blob: None,
    }))
}

pub fn folders_markdown(folders: &[String]) -> String {
    let mut out = String::from("# Available Topics\n\n");
    let Some(last) = folders.last() else {
        out.push_str("No topics found.\n");
        return out;
    };
    for folder in folders {
        out.push_str(&format!("- {folder}\n"));
    }
    out.push_str(&format!("\nUse @{last} to access papers in that topic.\n"));
    out
}

pub fn topic_markdown(store: &PaperStore, topic: &str) -> String {
    let papers = match store.load_topic(topic) {
        TopicLoad::Papers(papers) => papers,
        TopicLoad::Missing => {
            return format!(
                "# No papers found for topic: {topic}\n\nTry searching for papers on this topic first."
            )
        }
        TopicLoad::Corrupt(e) => {
            tracing::warn!(topic, error = %e, "corrupt paper cache");
            return format!(
                "# Error reading papers data for {topic}\n\nThe papers data file is corrupted."
            );
        }
    };

    let mut out = format!("# Papers on {}\n\n", title_case(&topic.replace('_', " ")));
    out.push_str(&format!("Total papers: {}\n\n", papers.len()));
    for (id, info) in &papers {
        let summary: String = info.summary.chars().take(SUMMARY_CHARS).collect();
        out.push_str(&format!("## {}\n", info.title));
        out.push_str(&format!("- **Paper ID**: {id}\n"));
        out.push_str(&format!("- **Authors**: {}\n", info.authors.join(", ")));
        out.push_str(&format!("- **Published**: {}\n", info.published));
        out.push_str(&format!("- **PDF URL**: [{0}]({0})\n\n", info.pdf_url));
        out.push_str(&format!("### Summary\n{summary}...\n\n"));
        out.push_str("---\n\n");
    }
    out
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::papers::tests::paper;

    fn text(store: &PaperStore, uri: &str) -> String {
        read(store, uri).unwrap().unwrap().text.unwrap()
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("machine learning"), "Machine Learning");
        assert_eq!(title_case("GPT-4 models"), "Gpt-4 Models");
    }

    #[test]
    fn folders_listing() {
        assert_eq!(folders_markdown(&[]), "# Available Topics\n\nNo topics found.\n");
        assert_eq!(
            folders_markdown(&["ml".into(), "nlp".into()]),
            "# Available Topics\n\n- ml\n- nlp\n\nUse @nlp to access papers in that topic.\n"
        );
    }

    #[test]
    fn topic_listing_renders_every_paper() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        let mut long = paper("2222.0002v1", "Long");
        long.info.summary = "x".repeat(600);
        store.save("machine learning", &[paper("1111.0001v1", "Short"), long]).unwrap();

        let md = text(&store, "papers://machine_learning");
        assert!(md.starts_with("# Papers on Machine Learning\n\nTotal papers: 2\n\n## Short\n"));
        assert!(md.contains("- **Paper ID**: 1111.0001v1\n"));
        assert!(md.contains("- **Authors**: Ada Lovelace, Alan Turing\n"));
        assert!(md.contains("- **PDF URL**: [http://arxiv.org/pdf/1111.0001v1](http://arxiv.org/pdf/1111.0001v1)\n\n"));
        assert!(md.contains(&format!("### Summary\n{}...\n\n---\n\n", "x".repeat(500))));
        assert!(!md.contains(&"x".repeat(501)));
    }

    #[test]
    fn missing_and_corrupt_topics_render_messages() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        assert_eq!(
            text(&store, "papers://quantum"),
            "# No papers found for topic: quantum\n\nTry searching for papers on this topic first."
        );

        let file = store.topic_file("broken").unwrap();
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "[").unwrap();
        assert_eq!(
            text(&store, "papers://broken"),
            "# Error reading papers data for broken\n\nThe papers data file is corrupted."
        );
    }

    #[test]
    fn foreign_uris_do_not_match() {
        let store = PaperStore::new("/nowhere");
        assert!(read(&store, "file:///etc/passwd").unwrap().is_none());
        assert!(read(&store, "papers://").unwrap().is_none());
        assert!(read(&store, "papers://a/b").unwrap().is_none());
        assert_eq!(text(&store, FOLDERS_URI), "# Available Topics\n\nNo topics found.\n");
    }
}
