//! Rebuild command handler.

use clap::Args;

use askdesk_core::{config::AppConfig, AppResult};

/// Rebuild the document index from the data directory
#[derive(Args, Debug)]
pub struct RebuildCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RebuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let engine = super::build_engine(config)?;
        let report = engine.rebuild_index().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!(
            "Indexed {} chunks from {} departments in {:.2}s",
            report.chunks_indexed,
            report.departments.len(),
            report.duration_secs
        );
        for department in &report.departments {
            println!("  - {department}");
        }
        Ok(())
    }
}
