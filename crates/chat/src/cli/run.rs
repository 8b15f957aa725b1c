//! `research-chat run`: one-shot execution command.

use crate::cli::chat::print_outcome;
use crate::runtime::Chatbot;

/// Answer a single message and print the result.
pub async fn run(bot: &Chatbot, message: &str) -> anyhow::Result<()> {
    let outcome = bot.process_query(message).await?;
    print_outcome(&outcome);
    if outcome.hit_round_limit() {
        anyhow::bail!("round limit of {} reached", bot.max_rounds());
    }
    Ok(())
}
