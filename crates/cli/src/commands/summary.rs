//! Department summary command handler.

use clap::Args;

use askdesk_core::{config::AppConfig, AppResult};

/// Summarize one department's documents
#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// Department to summarize (e.g. finance, hr)
    pub department: String,

    /// Role to ask as
    #[arg(short, long, env = "ASKDESK_ROLE", default_value = "employee")]
    pub role: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SummaryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let engine = super::build_engine(config)?;
        let answer = engine
            .department_summary(&self.department, &self.role)
            .await;
        super::ask::print_answer(&answer, self.json)
    }
}
