//! Stats command handler.

use clap::Args;

use askdesk_core::{config::AppConfig, AppResult};

/// Show index and policy statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let engine = super::build_engine(config)?;
        let stats = engine.system_stats()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Index entries:      {}", stats.index.total_entries);
        println!("Departments indexed: {}", stats.index.distinct_departments);
        println!("Source formats:     {}", stats.index.distinct_source_formats);
        println!("Known departments:  {}", stats.department_count);
        println!("Known roles:        {}", stats.role_count);
        Ok(())
    }
}
