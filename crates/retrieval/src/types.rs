//! Shared data types for the retrieval pipeline.

use std::collections::BTreeMap;
use std::fmt;

use askdesk_policy::PermissionLevel;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Format of the file a chunk was extracted from.
///
/// The format decides how the processor turns the file into plain text
/// before chunking, and travels with each chunk into the index so that
/// answers can say what kind of source they cite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Markdown,
    Tabular,
    PlainText,
}

impl SourceFormat {
    /// Maps a file extension to a source format. Extensions outside the
    /// allow-list return `None` and the file is skipped entirely.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" => Some(Self::Markdown),
            "csv" => Some(Self::Tabular),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Tabular => "tabular",
            Self::PlainText => "plaintext",
        }
    }

    /// Inverse of [`as_str`], used when reading rows back from the index.
    ///
    /// [`as_str`]: Self::as_str
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "markdown" => Some(Self::Markdown),
            "tabular" => Some(Self::Tabular),
            "plaintext" => Some(Self::PlainText),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indexable unit of text together with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    /// Department that owns the source file. This is the value the
    /// access filter matches against at search time.
    pub department: String,
    /// File name relative to the department directory.
    pub source_file: String,
    pub source_format: SourceFormat,
    /// Position of the chunk within its source file, starting at zero.
    pub sequence_index: u32,
}

impl DocumentChunk {
    /// Content-derived identifier. Two rebuilds over the same corpus
    /// produce the same ids, which keeps the index stable across runs.
    pub fn stable_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.department.as_bytes());
        hasher.update(b"/");
        hasher.update(self.source_file.as_bytes());
        hasher.update(b"#");
        hasher.update(self.sequence_index.to_le_bytes());
        hasher.update(b":");
        hasher.update(self.content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// A chunk returned from the index, scored against a query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub content: String,
    pub department: String,
    pub source_file: String,
    pub source_format: SourceFormat,
    /// Cosine similarity in `[-1.0, 1.0]`; higher is more relevant.
    pub relevance_score: f32,
    pub sequence_index: u32,
}

/// Citation attached to an answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub department: String,
    pub source_file: String,
    pub relevance_score: f32,
}

/// The envelope every user-facing operation resolves to, including
/// denials and internal failures. Callers never see a raw error for a
/// query; they see an answer explaining what happened, with zero
/// sources when nothing was retrieved.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub source_count: usize,
}

impl Answer {
    pub fn new(answer: String, sources: Vec<SourceRef>) -> Self {
        let source_count = sources.len();
        Self {
            answer,
            sources,
            source_count,
        }
    }

    /// An answer that carries no retrieved material.
    pub fn without_sources(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            source_count: 0,
        }
    }
}

/// Aggregate shape of the index contents.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_entries: u64,
    pub distinct_departments: u64,
    pub distinct_source_formats: u64,
}

/// System-wide counters reported by the stats operation.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub index: IndexStats,
    pub department_count: usize,
    pub role_count: usize,
}

/// What a role can see, resolved against the full department list.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionsReport {
    pub role: String,
    pub role_name: String,
    pub role_description: String,
    pub accessible_departments: Vec<String>,
    /// Permission level for every known department, including the
    /// denied ones.
    pub grants: BTreeMap<String, PermissionLevel>,
}

/// Outcome of a successful index rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub chunks_indexed: usize,
    pub departments: Vec<String>,
    pub duration_secs: f64,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_format_extension_allow_list() {
        assert_eq!(SourceFormat::from_extension("md"), Some(SourceFormat::Markdown));
        assert_eq!(SourceFormat::from_extension("CSV"), Some(SourceFormat::Tabular));
        assert_eq!(SourceFormat::from_extension("txt"), Some(SourceFormat::PlainText));
        assert_eq!(SourceFormat::from_extension("pdf"), None);
        assert_eq!(SourceFormat::from_extension("rs"), None);
    }

    #[test]
    fn source_format_round_trips_through_str() {
        for fmt in [SourceFormat::Markdown, SourceFormat::Tabular, SourceFormat::PlainText] {
            assert_eq!(SourceFormat::parse(fmt.as_str()), Some(fmt));
        }
        assert_eq!(SourceFormat::parse("binary"), None);
    }

    #[test]
    fn stable_id_is_deterministic_and_content_sensitive() {
        let chunk = DocumentChunk {
            content: "Quarterly revenue grew 12%.".to_string(),
            department: "finance".to_string(),
            source_file: "report.md".to_string(),
            source_format: SourceFormat::Markdown,
            sequence_index: 3,
        };
        assert_eq!(chunk.stable_id(), chunk.stable_id());

        let mut other = chunk.clone();
        other.content.push('!');
        assert_ne!(chunk.stable_id(), other.stable_id());

        let mut moved = chunk.clone();
        moved.sequence_index = 4;
        assert_ne!(chunk.stable_id(), moved.stable_id());
    }

    #[test]
    fn answer_source_count_matches_sources() {
        let answer = Answer::new(
            "See the handbook.".to_string(),
            vec![SourceRef {
                department: "hr".to_string(),
                source_file: "handbook.md".to_string(),
                relevance_score: 0.91,
            }],
        );
        assert_eq!(answer.source_count, 1);
        assert_eq!(Answer::without_sources("denied").source_count, 0);
    }
}
