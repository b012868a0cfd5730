//! Permissions command handler.

use clap::Args;

use askdesk_core::{config::AppConfig, AppResult};

/// Show what a role is allowed to see
#[derive(Args, Debug)]
pub struct PermissionsCommand {
    /// Role to inspect
    #[arg(short, long, env = "ASKDESK_ROLE", default_value = "employee")]
    pub role: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PermissionsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let engine = super::build_engine(config)?;
        let report = engine.permissions(&self.role);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("Role: {} ({})", report.role, report.role_name);
        if !report.role_description.is_empty() {
            println!("{}", report.role_description);
        }
        println!();
        println!("Department access:");
        for (department, level) in &report.grants {
            println!("  {department:<14} {level:?}");
        }
        Ok(())
    }
}
