//! Document ingestion: walking department directories, loading files
//! and cutting them into chunks.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use askdesk_core::{AppError, AppResult};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunker::chunk_text;
use crate::tabular::digest_csv;
use crate::types::{DocumentChunk, SourceFormat};

/// Turns the files under a data directory into [`DocumentChunk`]s.
///
/// The data directory holds one subdirectory per department; a chunk
/// inherits the department of the directory it was read from, which is
/// the value access filtering keys on later.
pub struct DocumentProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Processes every listed department in order. A department whose
    /// directory is missing contributes nothing; it is not an error.
    pub fn process_all(&self, data_dir: &Path, departments: &[String]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        for department in departments {
            chunks.extend(self.process_department(data_dir, department));
        }

        let summary = ProcessorSummary::from_chunks(&chunks);
        info!(
            total_chunks = summary.total_chunks,
            departments = ?summary.chunks_per_department,
            formats = ?summary.formats_seen,
            "processed all departments"
        );
        chunks
    }

    /// Processes a single department directory. Files are visited in
    /// name order so repeated runs produce chunks in the same order,
    /// and a file that fails to load is skipped with a warning rather
    /// than aborting the department.
    pub fn process_department(&self, data_dir: &Path, department: &str) -> Vec<DocumentChunk> {
        let dir = data_dir.join(department);
        if !dir.is_dir() {
            warn!(department, dir = %dir.display(), "department directory not found");
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(department, error = %e, "failed to read directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let format = match path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(SourceFormat::from_extension)
            {
                Some(format) => format,
                None => {
                    warn!(file = %path.display(), "skipping unsupported file type");
                    continue;
                }
            };

            match self.process_file(department, path, format) {
                Ok(file_chunks) => {
                    debug!(
                        department,
                        file = %path.display(),
                        chunks = file_chunks.len(),
                        "processed file"
                    );
                    chunks.extend(file_chunks);
                }
                Err(e) => {
                    warn!(department, file = %path.display(), error = %e, "skipping file");
                }
            }
        }

        info!(department, chunks = chunks.len(), "processed department");
        chunks
    }

    fn process_file(
        &self,
        department: &str,
        path: &Path,
        format: SourceFormat,
    ) -> AppResult<Vec<DocumentChunk>> {
        let text = load_document(path, format)?;
        let source_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                AppError::Ingestion(format!("non-UTF-8 file name: {}", path.display()))
            })?
            .to_string();

        let chunks = chunk_text(&text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(i, piece)| DocumentChunk {
                content: piece.text,
                department: department.to_string(),
                source_file: source_file.clone(),
                source_format: format,
                sequence_index: i as u32,
            })
            .collect();

        Ok(chunks)
    }
}

/// Aggregate view of one ingestion run: how many chunks each
/// department contributed and which source formats showed up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSummary {
    pub total_chunks: usize,
    pub chunks_per_department: BTreeMap<String, usize>,
    pub formats_seen: BTreeSet<SourceFormat>,
}

impl ProcessorSummary {
    pub fn from_chunks(chunks: &[DocumentChunk]) -> Self {
        let mut chunks_per_department = BTreeMap::new();
        let mut formats_seen = BTreeSet::new();
        for chunk in chunks {
            *chunks_per_department
                .entry(chunk.department.clone())
                .or_insert(0) += 1;
            formats_seen.insert(chunk.source_format);
        }
        Self {
            total_chunks: chunks.len(),
            chunks_per_department,
            formats_seen,
        }
    }
}

fn load_document(path: &Path, format: SourceFormat) -> AppResult<String> {
    match format {
        SourceFormat::Markdown => Ok(clean_markdown(&std::fs::read_to_string(path)?)),
        SourceFormat::PlainText => Ok(std::fs::read_to_string(path)?),
        SourceFormat::Tabular => digest_csv(path),
    }
}

/// Strips markdown decoration while keeping paragraph structure, so
/// the chunker can still cut at paragraph breaks.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_blank = true;

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Drop horizontal rules and code fences.
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if trimmed.is_empty() {
            if !last_blank {
                result.push('\n');
                last_blank = true;
            }
            continue;
        }

        result.push_str(trimmed);
        result.push('\n');
        last_blank = false;
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn seed_department(root: &Path, department: &str, files: &[(&str, &str)]) {
        let dir = root.join(department);
        fs::create_dir_all(&dir).unwrap();
        for (name, body) in files {
            fs::write(dir.join(name), body).unwrap();
        }
    }

    #[test]
    fn chunks_inherit_department_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        seed_department(
            tmp.path(),
            "hr",
            &[("handbook.md", "# Handbook\n\nBe kind.\n\nTake holidays.")],
        );

        let processor = DocumentProcessor::new(1000, 200);
        let chunks = processor.process_department(tmp.path(), "hr");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].department, "hr");
        assert_eq!(chunks[0].source_file, "handbook.md");
        assert_eq!(chunks[0].source_format, SourceFormat::Markdown);
        assert_eq!(chunks[0].sequence_index, 0);
        assert!(chunks[0].content.contains("Be kind."));
        assert!(!chunks[0].content.contains('#'));
    }

    #[test]
    fn unsupported_files_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        seed_department(
            tmp.path(),
            "engineering",
            &[
                ("notes.txt", "Deploy on Fridays never."),
                ("binary.pdf", "%PDF-1.4 ..."),
                ("script.py", "print('hi')"),
            ],
        );

        let processor = DocumentProcessor::new(1000, 200);
        let chunks = processor.process_department(tmp.path(), "engineering");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_file, "notes.txt");
    }

    #[test]
    fn missing_department_directory_yields_no_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        let processor = DocumentProcessor::new(1000, 200);
        assert!(processor.process_department(tmp.path(), "ghost").is_empty());
    }

    #[test]
    fn files_are_processed_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        seed_department(
            tmp.path(),
            "marketing",
            &[
                ("b_campaign.txt", "Campaign B details."),
                ("a_brand.txt", "Brand guidelines."),
            ],
        );

        let processor = DocumentProcessor::new(1000, 200);
        let chunks = processor.process_department(tmp.path(), "marketing");

        let files: Vec<&str> = chunks.iter().map(|c| c.source_file.as_str()).collect();
        assert_eq!(files, vec!["a_brand.txt", "b_campaign.txt"]);
    }

    #[test]
    fn sequence_indices_restart_per_file() {
        let tmp = tempfile::tempdir().unwrap();
        let long = "A sentence that repeats. ".repeat(100);
        seed_department(
            tmp.path(),
            "finance",
            &[("q1.txt", long.as_str()), ("q2.txt", long.as_str())],
        );

        let processor = DocumentProcessor::new(400, 80);
        let chunks = processor.process_department(tmp.path(), "finance");

        for file in ["q1.txt", "q2.txt"] {
            let indices: Vec<u32> = chunks
                .iter()
                .filter(|c| c.source_file == file)
                .map(|c| c.sequence_index)
                .collect();
            assert!(indices.len() > 1);
            let expected: Vec<u32> = (0..indices.len() as u32).collect();
            assert_eq!(indices, expected);
        }
    }

    #[test]
    fn summary_counts_departments_and_formats() {
        let tmp = tempfile::tempdir().unwrap();
        seed_department(
            tmp.path(),
            "hr",
            &[
                ("handbook.md", "# Handbook\n\nBe kind."),
                ("headcount.csv", "team,count\ncore,4\n"),
            ],
        );
        seed_department(tmp.path(), "general", &[("faq.txt", "Office hours.")]);

        let processor = DocumentProcessor::new(1000, 200);
        let mut chunks = processor.process_department(tmp.path(), "hr");
        chunks.extend(processor.process_department(tmp.path(), "general"));

        let summary = ProcessorSummary::from_chunks(&chunks);
        assert_eq!(summary.total_chunks, chunks.len());
        assert_eq!(summary.chunks_per_department["hr"], 2);
        assert_eq!(summary.chunks_per_department["general"], 1);
        assert_eq!(
            summary.formats_seen.iter().copied().collect::<Vec<_>>(),
            vec![
                SourceFormat::Markdown,
                SourceFormat::Tabular,
                SourceFormat::PlainText,
            ]
        );
    }

    #[test]
    fn unreadable_csv_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        seed_department(
            tmp.path(),
            "hr",
            &[
                ("broken.csv", "a,b\n1,2,3,4\n"),
                ("ok.txt", "Plain note."),
            ],
        );

        let processor = DocumentProcessor::new(1000, 200);
        let chunks = processor.process_department(tmp.path(), "hr");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_file, "ok.txt");
    }
}
