//! Command handlers for the askdesk CLI.

mod ask;
mod permissions;
mod rebuild;
mod stats;
mod summary;

pub use ask::AskCommand;
pub use permissions::PermissionsCommand;
pub use rebuild::RebuildCommand;
pub use stats::StatsCommand;
pub use summary::SummaryCommand;

use std::sync::Arc;

use askdesk_core::{config::AppConfig, AppResult};
use askdesk_llm::create_client;
use askdesk_policy::PolicyTable;
use askdesk_retrieval::{create_embedder, RagEngine, VectorIndex};

/// Load the policy table from the configured file, falling back to the
/// built-in table.
fn load_policy(config: &AppConfig) -> AppResult<Arc<PolicyTable>> {
    let table = match &config.policy_file {
        Some(path) => PolicyTable::from_file(path)?,
        None => PolicyTable::builtin(),
    };
    table.validate()?;
    Ok(Arc::new(table))
}

/// Wire up the full engine from configuration: policy, embedder, index
/// and generation client.
fn build_engine(config: &AppConfig) -> AppResult<RagEngine> {
    let policy = load_policy(config)?;
    let embedder = create_embedder(
        &config.embedding_provider,
        &config.embedding_model,
        config.embedding_dim,
        config.endpoint.as_deref(),
    )?;
    let index = VectorIndex::open(&config.index_path, &config.collection, embedder)?;
    let llm = create_client(&config.provider, config.endpoint.as_deref())?;
    Ok(RagEngine::new(config.clone(), policy, index, llm))
}
