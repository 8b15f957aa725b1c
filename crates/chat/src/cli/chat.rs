//! `research-chat chat`: interactive REPL command.
//!
//! Plain lines go to the model. `@folders` and `@<topic>` read paper
//! resources, `/prompts` lists prompt templates and `/prompt` runs one.

use std::collections::HashMap;

use rc_domain::tool::Role;

use crate::access::{PromptOutcome, ResourceOutcome};
use crate::runtime::{Chatbot, QueryOutcome};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Line parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What one line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Empty,
    Quit,
    Resource(String),
    ListPrompts,
    Prompt {
        name: String,
        args: HashMap<String, String>,
    },
    PromptUsage,
    Unknown(String),
    Query(String),
}

pub fn parse_line(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    if line.eq_ignore_ascii_case("quit") {
        return ReplInput::Quit;
    }

    if let Some(topic) = line.strip_prefix('@') {
        let uri = if topic == "folders" {
            "papers://folders".to_string()
        } else {
            format!("papers://{topic}")
        };
        return ReplInput::Resource(uri);
    }

    if line.starts_with('/') {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        return match command.as_str() {
            "/prompts" => ReplInput::ListPrompts,
            "/prompt" => match parts.next() {
                Some(name) => ReplInput::Prompt {
                    name: name.to_string(),
                    args: parts
                        .filter_map(|tok| tok.split_once('='))
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                },
                None => ReplInput::PromptUsage,
            },
            _ => ReplInput::Unknown(command),
        };
    }

    ReplInput::Query(line.to_string())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the interactive chat REPL until `quit` or Ctrl+D.
pub async fn chat(bot: &Chatbot) -> anyhow::Result<()> {
    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".research-chat")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    // Banner goes to stderr; stdout carries answers only.
    eprintln!("research-chat started");
    eprintln!(
        "Connected servers: {}",
        bot.mcp().server_names().join(", ")
    );
    eprintln!("Type your queries or 'quit' to exit.");
    eprintln!("Use @folders to see available topics");
    eprintln!("Use @<topic> to search papers in that topic");
    eprintln!("Use /prompts to list available prompts");
    eprintln!("Use /prompt <name> <arg1=value1> to execute a prompt");
    eprintln!();

    loop {
        match rl.readline("Query: ") {
            Ok(line) => {
                let input = parse_line(&line);
                if input == ReplInput::Empty {
                    continue;
                }
                rl.add_history_entry(line.trim()).ok();
                if input == ReplInput::Quit {
                    break;
                }
                if let Err(e) = handle_input(bot, input).await {
                    eprintln!("\x1B[31merror: {e}\x1B[0m");
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or 'quit' to exit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

async fn handle_input(bot: &Chatbot, input: ReplInput) -> anyhow::Result<()> {
    match input {
        ReplInput::Empty | ReplInput::Quit => {}
        ReplInput::Query(query) => {
            let outcome = bot.process_query(&query).await?;
            print_outcome(&outcome);
        }
        ReplInput::Resource(uri) => match bot.get_resource(&uri).await? {
            ResourceOutcome::Found { uri, text } => {
                println!("Resource: {uri}");
                println!("Content:");
                println!("{text}");
            }
            ResourceOutcome::Empty { .. } => println!("No content available."),
            ResourceOutcome::NotFound { uri } => println!("Resource '{uri}' not found."),
        },
        ReplInput::ListPrompts => print_prompts(bot),
        ReplInput::Prompt { name, args } => {
            match bot.prepare_prompt(&name, &args).await? {
                PromptOutcome::NotFound { name } => println!("Prompt '{name}' not found."),
                PromptOutcome::NoMessages { name } => {
                    println!("Prompt '{name}' returned no messages.")
                }
                PromptOutcome::Ready { name, text } => {
                    eprintln!("Executing prompt '{name}'...");
                    let outcome = bot.process_query(&text).await?;
                    print_outcome(&outcome);
                }
            }
        }
        ReplInput::PromptUsage => {
            println!("Usage: /prompt <name> <arg1=value1> <arg2=value2> ...");
        }
        ReplInput::Unknown(cmd) => println!("Unknown command: {cmd}"),
    }
    Ok(())
}

fn print_prompts(bot: &Chatbot) {
    let prompts = bot.list_prompts();
    if prompts.is_empty() {
        println!("No prompts available.");
        return;
    }
    println!("Available prompts:");
    for prompt in prompts {
        println!("- {}: {}", prompt.name, prompt.description);
        if !prompt.arguments.is_empty() {
            println!("  Arguments:");
            for arg in &prompt.arguments {
                println!("    - {}", arg.name);
            }
        }
    }
}

/// Dimmed tool-call trace on stderr, then the answer on stdout.
pub(crate) fn print_outcome(outcome: &QueryOutcome) {
    for msg in outcome.messages.iter().filter(|m| m.role == Role::Assistant) {
        for call in &msg.tool_calls {
            eprintln!("\x1B[2m[tool: {} {}]\x1B[0m", call.tool_name, call.arguments);
        }
    }
    println!("{}", outcome.text);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_is_case_insensitive() {
        assert_eq!(parse_line("quit"), ReplInput::Quit);
        assert_eq!(parse_line("  QUIT "), ReplInput::Quit);
        assert_eq!(parse_line("quit now"), ReplInput::Query("quit now".into()));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_line("   "), ReplInput::Empty);
    }

    #[test]
    fn at_folders_and_topics_map_to_paper_uris() {
        assert_eq!(parse_line("@folders"), ReplInput::Resource("papers://folders".into()));
        assert_eq!(
            parse_line("@machine_learning"),
            ReplInput::Resource("papers://machine_learning".into())
        );
    }

    #[test]
    fn prompt_arguments_split_on_first_equals() {
        let input = parse_line("/prompt generate_search_prompt topic=transformers num_papers=3 stray q=a=b");
        let ReplInput::Prompt { name, args } = input else {
            panic!("expected prompt, got {input:?}");
        };
        assert_eq!(name, "generate_search_prompt");
        assert_eq!(args.len(), 3);
        assert_eq!(args["topic"], "transformers");
        assert_eq!(args["num_papers"], "3");
        assert_eq!(args["q"], "a=b");
    }

    #[test]
    fn prompt_without_name_asks_for_usage() {
        assert_eq!(parse_line("/prompt"), ReplInput::PromptUsage);
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(parse_line("/PROMPTS"), ReplInput::ListPrompts);
        assert_eq!(parse_line("/Help"), ReplInput::Unknown("/help".into()));
    }

    #[test]
    fn anything_else_is_a_query() {
        assert_eq!(parse_line("what is 2+2"), ReplInput::Query("what is 2+2".into()));
    }
}
