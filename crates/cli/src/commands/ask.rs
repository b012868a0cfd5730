//! Ask command handler.

use clap::Args;

use askdesk_core::{config::AppConfig, AppResult};
use askdesk_retrieval::Answer;

/// Ask a question as a given role
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Role to ask as (e.g. employee, hr, finance, c_level)
    #[arg(short, long, env = "ASKDESK_ROLE", default_value = "employee")]
    pub role: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let engine = super::build_engine(config)?;
        let answer = engine.query(&self.question, &self.role).await;
        print_answer(&answer, self.json)
    }
}

pub(super) fn print_answer(answer: &Answer, json: bool) -> AppResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(answer)?);
        return Ok(());
    }

    println!("{}", answer.answer);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources ({}):", answer.source_count);
        for source in &answer.sources {
            println!(
                "  - {}/{} (relevance: {:.3})",
                source.department, source.source_file, source.relevance_score
            );
        }
    }
    Ok(())
}
