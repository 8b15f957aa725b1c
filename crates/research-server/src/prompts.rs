//! Prompt templates served over `prompts/list` and `prompts/get`.

use std::collections::HashMap;

use rc_mcp_client::protocol::{
    ContentItem, GetPromptResult, McpPromptDef, PromptArgument, PromptContent, PromptMessage,
};

pub const SEARCH_PROMPT: &str = "generate_search_prompt";
const DEFAULT_NUM_PAPERS: u32 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("unknown prompt: {0}")]
    NotFound(String),
    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),
    #[error("'{0}' must be an integer")]
    NotAnInteger(&'static str),
}

pub fn list() -> Vec<McpPromptDef> {
    vec![McpPromptDef {
        name: SEARCH_PROMPT.into(),
        description: "Generate a prompt for finding and discussing academic papers on a specific topic.".into(),
        arguments: vec![
            PromptArgument {
                name: "topic".into(),
                description: Some("The research topic".into()),
                required: Some(true),
            },
            PromptArgument {
                name: "num_papers".into(),
                description: Some("How many papers to search for (default 5)".into()),
                required: Some(false),
            },
        ],
    }]
}

/// Materialize a prompt. Argument values arrive as strings.
pub fn get(name: &str, args: &HashMap<String, String>) -> Result<GetPromptResult, PromptError> {
    if name != SEARCH_PROMPT {
        return Err(PromptError::NotFound(name.to_string()));
    }
    let topic = args
        .get("topic")
        .ok_or(PromptError::MissingArgument("topic"))?;
    let num_papers = match args.get("num_papers") {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PromptError::NotAnInteger("num_papers"))?,
        None => DEFAULT_NUM_PAPERS,
    };

    Ok(GetPromptResult {
        description: None,
        messages: vec![PromptMessage {
            role: "user".into(),
            content: PromptContent::Item(ContentItem {
                content_type: "text".into(),
                text: Some(search_prompt(topic, num_papers)),
            }),
        }],
    })
}

pub fn search_prompt(topic: &str, num_papers: u32) -> String {
    format!(
        "Search for {num_papers} academic papers about '{topic}' using the search_papers tool.

Follow these instructions:
1. First, search for papers using search_papers(topic='{topic}', max_results={num_papers})
2. For each paper found, extract and organize the following information:
   - Paper title
   - Authors
   - Publication date
   - Brief summary of the key findings
   - Main contributions or innovations
   - Methodologies used
   - Relevance to the topic '{topic}'

3. Provide a comprehensive summary that includes:
   - Overview of the current state of research in '{topic}'
   - Common themes and trends across the papers
   - Key research gaps or areas for future investigation
   - Most impactful or influential papers in this area

4. Organize your findings in a clear, structured format with headings and bullet points for easy readability.

Please present both detailed information about each paper and a high-level synthesis of the research landscape in {topic}."
    )
}
