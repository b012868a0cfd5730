//! Generation provider factory.
//!
//! Resolves a provider name from configuration to a concrete client.

use crate::client::GenerationClient;
use crate::providers::{OllamaClient, ScriptedClient};
use askdesk_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a generation client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "scripted")
/// * `endpoint` - Optional custom endpoint URL
///
/// # Errors
/// Returns an error for unknown providers.
pub fn create_client(provider: &str, endpoint: Option<&str>) -> AppResult<Arc<dyn GenerationClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaClient::with_base_url(base_url);
            Ok(Arc::new(client))
        }
        "scripted" => Ok(Arc::new(ScriptedClient::answering(
            "This is a scripted answer.",
        ))),
        _ => Err(AppError::Generation(format!(
            "Unknown generation provider: '{}'. Supported providers: ollama, scripted",
            provider
        ))),
    }
}
