//! Prompt construction for the askdesk retrieval service.
//!
//! Selects a role-specific instructional preamble and renders the fixed
//! question/context template that instructs the model to answer only
//! from the supplied context, state when the context is insufficient,
//! and cite its sources.

pub mod builder;
pub mod preambles;

pub use builder::{build_query_prompt, BuiltPrompt};
pub use preambles::preamble_for_role;
