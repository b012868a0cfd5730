//! Query orchestration: policy resolution, retrieval, prompt assembly
//! and generation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use askdesk_core::{AppConfig, AppError, AppResult};
use askdesk_llm::{GenerationClient, GenerationRequest};
use askdesk_policy::{PermissionLevel, PolicyTable};
use askdesk_prompt::build_query_prompt;
use chrono::Utc;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::index::VectorIndex;
use crate::processor::DocumentProcessor;
use crate::types::{
    Answer, PermissionsReport, RebuildReport, SearchResult, SourceRef, SystemStats,
};

/// Context placeholder when retrieval returns nothing. The model is
/// told explicitly instead of being handed an empty block.
pub const NO_RESULTS_MARKER: &str = "No relevant documents found.";

const SEPARATOR: &str = "--------------------------------------------------";

/// The orchestrator behind every user-facing operation.
///
/// Failures on the query paths never surface as errors; they become
/// apologetic answers with zero sources. Administrative operations
/// (rebuild, stats) return errors normally.
pub struct RagEngine {
    config: AppConfig,
    policy: Arc<PolicyTable>,
    index: VectorIndex,
    llm: Arc<dyn GenerationClient>,
}

impl RagEngine {
    pub fn new(
        config: AppConfig,
        policy: Arc<PolicyTable>,
        index: VectorIndex,
        llm: Arc<dyn GenerationClient>,
    ) -> Self {
        Self {
            config,
            policy,
            index,
            llm,
        }
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Answers a question with retrieval restricted to the role's
    /// accessible departments.
    pub async fn query(&self, question: &str, role: &str) -> Answer {
        let request_id = Uuid::new_v4();
        info!(%request_id, role, "processing query");

        let accessible = self
            .policy
            .accessible_departments(role, PermissionLevel::Read);
        if accessible.is_empty() {
            info!(%request_id, role, "role has no accessible departments");
            return Answer::without_sources(
                "You don't have access to any document collections.",
            );
        }

        let results = match timeout(
            self.deadline(),
            self.index.search(question, &accessible, self.config.top_k),
        )
        .await
        {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                warn!(%request_id, error = %e, "retrieval failed");
                return Answer::without_sources(
                    "I apologize, but I encountered an error while processing your query. \
                     Please try again.",
                );
            }
            Err(_) => {
                warn!(%request_id, "retrieval timed out");
                return Answer::without_sources(
                    "I apologize, but the request took too long to process. Please try again.",
                );
            }
        };

        self.generate_answer(request_id, role, question, &results)
            .await
    }

    /// Summarizes everything a role can see of one department.
    pub async fn department_summary(&self, department: &str, role: &str) -> Answer {
        let request_id = Uuid::new_v4();
        info!(%request_id, role, department, "processing department summary");

        if self.policy.permission(role, department) < PermissionLevel::Read {
            info!(%request_id, role, department, "summary denied by policy");
            return Answer::without_sources(format!(
                "You don't have permission to access {department} department data."
            ));
        }

        let accessible = self
            .policy
            .accessible_departments(role, PermissionLevel::Read);
        let documents = match self.index.department_dump(department, &accessible) {
            Ok(documents) => documents,
            Err(e) => {
                warn!(%request_id, error = %e, "department listing failed");
                return Answer::without_sources(
                    "I apologize, but I encountered an error while generating the department \
                     summary. Please try again.",
                );
            }
        };

        if documents.is_empty() {
            return Answer::without_sources(format!(
                "No documents found for {department} department."
            ));
        }

        let question = format!(
            "Provide a comprehensive summary of the {department} department data, \
             including key insights, trends, and important information."
        );
        self.generate_answer(request_id, role, &question, &documents)
            .await
    }

    /// Shared tail of both query paths: context assembly, prompting and
    /// generation under a deadline.
    async fn generate_answer(
        &self,
        request_id: Uuid,
        role: &str,
        question: &str,
        results: &[SearchResult],
    ) -> Answer {
        let context = format_context(results, self.config.max_context_chars);
        let description = self.policy.role_grants(role).map(|g| g.description.as_str());

        let prompt = match build_query_prompt(role, description, question, &context) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(%request_id, error = %e, "prompt assembly failed");
                return Answer::without_sources(
                    "I apologize, but I encountered an error while processing your query. \
                     Please try again.",
                );
            }
        };

        let request = GenerationRequest::new(prompt.user, &self.config.model)
            .with_system(prompt.system)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let response = match timeout(self.deadline(), self.llm.complete(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(%request_id, error = %e, "generation failed");
                return Answer::without_sources(
                    "I apologize, but I encountered an error while generating a response. \
                     Please try again.",
                );
            }
            Err(_) => {
                warn!(%request_id, "generation timed out");
                return Answer::without_sources(
                    "I apologize, but the request took too long to process. Please try again.",
                );
            }
        };

        info!(%request_id, sources = results.len(), "query answered");
        Answer::new(response.content, sources_from(results))
    }

    /// Resolves a role's permissions against the full department list.
    pub fn permissions(&self, role: &str) -> PermissionsReport {
        let grants = self
            .policy
            .departments
            .iter()
            .map(|d| (d.clone(), self.policy.permission(role, d)))
            .collect();
        let accessible = self
            .policy
            .accessible_departments(role, PermissionLevel::Read)
            .into_iter()
            .collect();

        let (role_name, role_description) = match self.policy.role_grants(role) {
            Some(info) => (info.name.clone(), info.description.clone()),
            None => (role.to_string(), String::new()),
        };

        PermissionsReport {
            role: role.to_string(),
            role_name,
            role_description,
            accessible_departments: accessible,
            grants,
        }
    }

    /// Index and policy counters for operators.
    pub fn system_stats(&self) -> AppResult<SystemStats> {
        Ok(SystemStats {
            index: self.index.stats()?,
            department_count: self.policy.departments.len(),
            role_count: self.policy.roles.len(),
        })
    }

    /// Reprocesses the data directory and atomically replaces the
    /// index contents.
    pub async fn rebuild_index(&self) -> AppResult<RebuildReport> {
        let start = Instant::now();
        let processor = DocumentProcessor::new(self.config.chunk_size, self.config.chunk_overlap);
        let chunks = processor.process_all(&self.config.data_dir, &self.policy.departments);

        if chunks.is_empty() {
            return Err(AppError::Ingestion(format!(
                "no documents found under {}",
                self.config.data_dir.display()
            )));
        }

        self.index.rebuild(&chunks).await?;

        let mut departments: Vec<String> = chunks.iter().map(|c| c.department.clone()).collect();
        departments.sort();
        departments.dedup();

        Ok(RebuildReport {
            chunks_indexed: chunks.len(),
            departments,
            duration_secs: start.elapsed().as_secs_f64(),
            finished_at: Utc::now(),
        })
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }
}

/// Formats search results into the context block handed to the model.
/// Whole entries are dropped once the budget is exceeded; an entry is
/// never truncated mid-text.
fn format_context(results: &[SearchResult], max_chars: usize) -> String {
    if results.is_empty() {
        return NO_RESULTS_MARKER.to_string();
    }

    let mut parts = Vec::new();
    let mut used = 0;
    for (i, result) in results.iter().enumerate() {
        let part = format!(
            "Source {} (Relevance: {:.3}):\nDepartment: {}\nFile: {}\nContent: {}\n{}\n",
            i + 1,
            result.relevance_score,
            result.department,
            result.source_file,
            result.content,
            SEPARATOR,
        );
        if used + part.len() > max_chars && !parts.is_empty() {
            break;
        }
        used += part.len();
        parts.push(part);
    }

    parts.join("\n")
}

fn sources_from(results: &[SearchResult]) -> Vec<SourceRef> {
    results
        .iter()
        .map(|r| SourceRef {
            department: r.department.clone(),
            source_file: r.source_file.clone(),
            relevance_score: r.relevance_score,
        })
        .collect()
}
