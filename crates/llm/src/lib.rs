//! Answer generation for the askdesk retrieval service.
//!
//! This crate wraps the external `generate(prompt) -> text` collaborator
//! behind a provider-agnostic trait. The orchestrator treats the call as
//! a blocking external operation that may fail or time out; failures are
//! surfaced as typed errors and converted to user-facing answers at the
//! engine boundary.
//!
//! # Providers
//! - **Ollama**: local LLM runtime (default)
//! - **Scripted**: canned responses for tests

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{GenerationClient, GenerationRequest, GenerationResponse, GenerationUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, ScriptedClient};
