//! Resource reads and prompt execution through the chatbot.

mod common;

use std::collections::HashMap;

use common::*;
use rc_chat::{PromptOutcome, ResourceOutcome};
use rc_domain::tool::Role;
use rc_mcp_client::testing::{method_not_found, MockTransport};
use serde_json::json;

/// A research-style server: `papers://folders` is the only listed
/// resource, per-topic URIs are answered on demand.
fn research_server() -> MockTransport {
    MockTransport::new(|method, params| match method {
        "tools/list" => Ok(json!({ "tools": [] })),
        "prompts/list" => Ok(json!({ "prompts": [{
            "name": "generate_search_prompt",
            "description": "Search papers on a topic",
            "arguments": [
                { "name": "topic", "required": true },
                { "name": "num_papers", "required": false }
            ]
        }, {
            "name": "empty_prompt"
        }]})),
        "resources/list" => Ok(json!({ "resources": [
            { "uri": "papers://folders", "name": "folders" }
        ]})),
        "resources/read" => {
            let uri = params.and_then(|p| p["uri"].as_str()).unwrap_or_default();
            match uri {
                "papers://folders" => Ok(json!({ "contents": [
                    { "uri": uri, "mimeType": "text/markdown", "text": "# Available Topics\n\n- ml\n" }
                ]})),
                "papers://blank" => Ok(json!({ "contents": [] })),
                _ => Ok(json!({ "contents": [
                    { "uri": uri, "text": format!("# Papers on {}", uri.trim_start_matches("papers://")) }
                ]})),
            }
        }
        "prompts/get" => {
            let params = params.cloned().unwrap_or_default();
            match params["name"].as_str() {
                Some("generate_search_prompt") => {
                    let topic = params["arguments"]["topic"].as_str().unwrap_or("?").to_string();
                    Ok(json!({ "messages": [{
                        "role": "user",
                        "content": [
                            { "type": "text", "text": "Search for papers about" },
                            { "type": "text", "text": topic }
                        ]
                    }]}))
                }
                _ => Ok(json!({ "messages": [] })),
            }
        }
        other => Err(method_not_found(other)),
    })
}

#[tokio::test]
async fn listed_resource_is_read() {
    let provider = ScriptedProvider::sequence(vec![text("unused")]);
    let bot = chatbot(provider, manager_with(vec![("research", research_server())]).await, 20);

    let outcome = bot.get_resource("papers://folders").await.unwrap();
    assert_eq!(
        outcome,
        ResourceOutcome::Found {
            uri: "papers://folders".into(),
            text: "# Available Topics\n\n- ml\n".into(),
        }
    );
}

#[tokio::test]
async fn topic_uri_falls_back_to_the_scheme_owner() {
    let provider = ScriptedProvider::sequence(vec![text("unused")]);
    let bot = chatbot(provider, manager_with(vec![("research", research_server())]).await, 20);

    match bot.get_resource("papers://quantum").await.unwrap() {
        ResourceOutcome::Found { text, .. } => assert_eq!(text, "# Papers on quantum"),
        other => panic!("expected fallback read, got {other:?}"),
    }
}

#[tokio::test]
async fn resource_without_content_is_empty() {
    let provider = ScriptedProvider::sequence(vec![text("unused")]);
    let bot = chatbot(provider, manager_with(vec![("research", research_server())]).await, 20);

    assert_eq!(
        bot.get_resource("papers://blank").await.unwrap(),
        ResourceOutcome::Empty { uri: "papers://blank".into() }
    );
}

#[tokio::test]
async fn other_scheme_is_not_found() {
    let provider = ScriptedProvider::sequence(vec![text("unused")]);
    let bot = chatbot(provider, manager_with(vec![("research", research_server())]).await, 20);

    assert_eq!(
        bot.get_resource("notes://today").await.unwrap(),
        ResourceOutcome::NotFound { uri: "notes://today".into() }
    );
}

#[tokio::test]
async fn unregistered_prompt_is_not_found_and_sends_nothing() {
    let provider = ScriptedProvider::sequence(vec![text("unused")]);
    let bot = chatbot(provider.clone(), manager_with(vec![("math", math_server())]).await, 20);

    let args = HashMap::from([("topic".to_string(), "transformers".to_string())]);
    let outcome = bot.prepare_prompt("summarize", &args).await.unwrap();

    assert!(matches!(outcome, PromptOutcome::NotFound { ref name } if name == "summarize"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn prompt_is_materialized_before_the_query_runs() {
    let provider = ScriptedProvider::sequence(vec![text("Here are the papers.")]);
    let bot = chatbot(provider.clone(), manager_with(vec![("research", research_server())]).await, 20);

    let args = HashMap::from([("topic".to_string(), "transformers".to_string())]);
    let prepared = bot.prepare_prompt("generate_search_prompt", &args).await.unwrap();

    let PromptOutcome::Ready { name, text: prompt_text } = prepared else {
        panic!("expected a materialized prompt");
    };
    assert_eq!(name, "generate_search_prompt");
    assert_eq!(prompt_text, "Search for papers about transformers");
    assert_eq!(provider.call_count(), 0);

    let outcome = bot.process_query(&prompt_text).await.unwrap();
    assert_eq!(outcome.text, "Here are the papers.");

    let first = &provider.requests()[0].messages[0];
    assert_eq!(first.role, Role::User);
    assert_eq!(first.text(), "Search for papers about transformers");
}

#[tokio::test]
async fn prompt_without_messages_is_reported() {
    let provider = ScriptedProvider::sequence(vec![text("unused")]);
    let bot = chatbot(provider.clone(), manager_with(vec![("research", research_server())]).await, 20);

    let outcome = bot.prepare_prompt("empty_prompt", &HashMap::new()).await.unwrap();
    assert!(matches!(outcome, PromptOutcome::NoMessages { .. }));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn prompts_are_listed_with_arguments() {
    let provider = ScriptedProvider::sequence(vec![text("unused")]);
    let bot = chatbot(provider, manager_with(vec![("research", research_server())]).await, 20);

    let prompts = bot.list_prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].name, "generate_search_prompt");
    let arg_names: Vec<&str> = prompts[0].arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(arg_names, ["topic", "num_papers"]);
}
