//! SQLite-backed vector index with access filtering built into every
//! read path.
//!
//! Embeddings are stored as little-endian f32 blobs next to the chunk
//! text. Similarity is brute-force cosine over the rows that survive
//! the department filter; the filter is part of the SQL, so rows
//! outside the caller's accessible set are never materialized, let
//! alone scored.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use askdesk_core::{AppError, AppResult};
use rusqlite::{params, params_from_iter, Connection};
use tracing::{debug, info};

use crate::embeddings::EmbeddingProvider;
use crate::types::{DocumentChunk, IndexStats, SearchResult, SourceFormat};

pub struct VectorIndex {
    db_path: PathBuf,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorIndex {
    /// Opens (or creates) the index at `db_path`. Safe to call against
    /// an existing database; the schema is created only when missing.
    pub fn open(
        db_path: &Path,
        collection: &str,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        // The collection name becomes a table name, so keep it to a
        // strict identifier alphabet.
        if collection.is_empty()
            || !collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(AppError::Index(format!(
                "invalid collection name '{collection}'"
            )));
        }

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let index = Self {
            db_path: db_path.to_path_buf(),
            collection: collection.to_string(),
            embedder,
        };

        let conn = index.connect()?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{0}" (
                id TEXT NOT NULL,
                department TEXT NOT NULL,
                source_file TEXT NOT NULL,
                source_format TEXT NOT NULL,
                sequence_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL
            );
            CREATE INDEX IF NOT EXISTS "idx_{0}_department" ON "{0}"(department);
            "#,
            index.collection
        ))
        .map_err(|e| AppError::Index(format!("failed to create schema: {e}")))?;

        Ok(index)
    }

    fn connect(&self) -> AppResult<Connection> {
        let conn = Connection::open(&self.db_path)
            .map_err(|e| AppError::Index(format!("failed to open index database: {e}")))?;
        // WAL lets readers keep working while a rebuild commits. The
        // pragma reports the resulting mode, so read it as a query.
        conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get::<_, String>(0))
            .map_err(|e| AppError::Index(format!("failed to set journal mode: {e}")))?;
        Ok(conn)
    }

    /// Replaces the whole collection with freshly embedded chunks.
    ///
    /// All embeddings are computed before the database is touched, and
    /// the delete-and-insert happens in one transaction. A failure at
    /// any point leaves the previous contents fully intact.
    pub async fn rebuild(&self, chunks: &[DocumentChunk]) -> AppResult<()> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let expected = self.embedder.dimensions();
        for embedding in &embeddings {
            if embedding.len() != expected {
                return Err(AppError::Index(format!(
                    "embedding dimension mismatch: got {}, expected {expected}",
                    embedding.len()
                )));
            }
        }

        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("failed to begin transaction: {e}")))?;

        tx.execute(&format!(r#"DELETE FROM "{}""#, self.collection), [])
            .map_err(|e| AppError::Index(format!("failed to clear collection: {e}")))?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    r#"INSERT INTO "{}"
                       (id, department, source_file, source_format, sequence_index, content, embedding)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                    self.collection
                ))
                .map_err(|e| AppError::Index(format!("failed to prepare insert: {e}")))?;

            for (chunk, embedding) in chunks.iter().zip(&embeddings) {
                stmt.execute(params![
                    chunk.stable_id(),
                    chunk.department,
                    chunk.source_file,
                    chunk.source_format.as_str(),
                    chunk.sequence_index as i64,
                    chunk.content,
                    embedding_to_bytes(embedding),
                ])
                .map_err(|e| AppError::Index(format!("failed to insert chunk: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::Index(format!("failed to commit rebuild: {e}")))?;

        info!(chunks = chunks.len(), collection = %self.collection, "rebuilt index");
        Ok(())
    }

    /// Top-k most similar chunks among the accessible departments.
    ///
    /// The department filter is part of the SQL, never applied after
    /// scoring, and an empty accessible set short-circuits without
    /// touching the database at all. Ties on score break by sequence
    /// index, then by insertion order.
    pub async fn search(
        &self,
        query_text: &str,
        accessible_departments: &BTreeSet<String>,
        top_k: usize,
    ) -> AppResult<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(AppError::Index("top_k must be positive".to_string()));
        }
        if accessible_departments.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query_text).await?;

        let conn = self.connect()?;
        let placeholders = vec!["?"; accessible_departments.len()].join(", ");
        let sql = format!(
            r#"SELECT rowid, department, source_file, source_format, sequence_index, content, embedding
               FROM "{}" WHERE department IN ({placeholders})"#,
            self.collection
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Index(format!("failed to prepare search: {e}")))?;

        let rows = stmt
            .query_map(params_from_iter(accessible_departments.iter()), |row| {
                Ok(RawRow {
                    rowid: row.get(0)?,
                    department: row.get(1)?,
                    source_file: row.get(2)?,
                    source_format: row.get(3)?,
                    sequence_index: row.get::<_, i64>(4)? as u32,
                    content: row.get(5)?,
                    embedding: row.get(6)?,
                })
            })
            .map_err(|e| AppError::Index(format!("failed to run search: {e}")))?;

        let mut scored = Vec::new();
        for row in rows {
            let row = row.map_err(|e| AppError::Index(format!("failed to read row: {e}")))?;
            let embedding = bytes_to_embedding(&row.embedding)?;
            let score = cosine_similarity(&query_embedding, &embedding);
            scored.push((score, row));
        }

        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then(a.1.sequence_index.cmp(&b.1.sequence_index))
                .then(a.1.rowid.cmp(&b.1.rowid))
        });
        scored.truncate(top_k);

        debug!(results = scored.len(), top_k, "search complete");
        scored
            .into_iter()
            .map(|(score, row)| row.into_result(score))
            .collect()
    }

    /// Every chunk of one department, in file-then-sequence order.
    ///
    /// A department outside the accessible set yields an empty listing,
    /// the same observable outcome as a department with no documents.
    pub fn department_dump(
        &self,
        department: &str,
        accessible_departments: &BTreeSet<String>,
    ) -> AppResult<Vec<SearchResult>> {
        if !accessible_departments.contains(department) {
            return Ok(Vec::new());
        }

        let conn = self.connect()?;
        let sql = format!(
            r#"SELECT rowid, department, source_file, source_format, sequence_index, content, embedding
               FROM "{}" WHERE department = ?1 ORDER BY source_file, sequence_index"#,
            self.collection
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Index(format!("failed to prepare listing: {e}")))?;

        let rows = stmt
            .query_map(params![department], |row| {
                Ok(RawRow {
                    rowid: row.get(0)?,
                    department: row.get(1)?,
                    source_file: row.get(2)?,
                    source_format: row.get(3)?,
                    sequence_index: row.get::<_, i64>(4)? as u32,
                    content: row.get(5)?,
                    embedding: row.get(6)?,
                })
            })
            .map_err(|e| AppError::Index(format!("failed to list department: {e}")))?;

        let mut results = Vec::new();
        for row in rows {
            let row = row.map_err(|e| AppError::Index(format!("failed to read row: {e}")))?;
            // Listings are exact membership, not ranked retrieval.
            results.push(row.into_result(1.0)?);
        }
        Ok(results)
    }

    /// Aggregate counts over the whole collection. An empty index
    /// reports all zeros.
    pub fn stats(&self) -> AppResult<IndexStats> {
        let conn = self.connect()?;
        let sql = format!(
            r#"SELECT COUNT(*), COUNT(DISTINCT department), COUNT(DISTINCT source_format)
               FROM "{}""#,
            self.collection
        );
        conn.query_row(&sql, [], |row| {
            Ok(IndexStats {
                total_entries: row.get::<_, i64>(0)? as u64,
                distinct_departments: row.get::<_, i64>(1)? as u64,
                distinct_source_formats: row.get::<_, i64>(2)? as u64,
            })
        })
        .map_err(|e| AppError::Index(format!("failed to read stats: {e}")))
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }
}

struct RawRow {
    rowid: i64,
    department: String,
    source_file: String,
    source_format: String,
    sequence_index: u32,
    content: String,
    embedding: Vec<u8>,
}

impl RawRow {
    fn into_result(self, score: f32) -> AppResult<SearchResult> {
        let source_format = SourceFormat::parse(&self.source_format).ok_or_else(|| {
            AppError::Index(format!("unknown source format '{}'", self.source_format))
        })?;
        Ok(SearchResult {
            content: self.content,
            department: self.department,
            source_file: self.source_file,
            source_format,
            relevance_score: score,
            sequence_index: self.sequence_index,
        })
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "stored embedding has invalid length".to_string(),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity in `[-1.0, 1.0]`; zero for mismatched or zero
/// vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;

    fn chunk(department: &str, file: &str, seq: u32, content: &str) -> DocumentChunk {
        DocumentChunk {
            content: content.to_string(),
            department: department.to_string(),
            source_file: file.to_string(),
            source_format: SourceFormat::PlainText,
            sequence_index: seq,
        }
    }

    fn open_index(dir: &tempfile::TempDir) -> VectorIndex {
        VectorIndex::open(
            &dir.path().join("index.db"),
            "documents",
            Arc::new(HashEmbedder::new(128)),
        )
        .unwrap()
    }

    fn depts(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cosine_similarity_bounds() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let c = vec![-1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &a), 1.0);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&a, &c), -1.0);
        assert_eq!(cosine_similarity(&a, &[]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn embedding_bytes_round_trip() {
        let v = vec![0.25f32, -1.5, 3.75, 0.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&v)).unwrap(), v);
        assert!(bytes_to_embedding(&[1, 2, 3]).is_err());
    }

    #[test]
    fn open_rejects_bad_collection_names() {
        let dir = tempfile::tempdir().unwrap();
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder::new(16));
        assert!(VectorIndex::open(
            &dir.path().join("x.db"),
            "docs; DROP TABLE",
            embedder.clone()
        )
        .is_err());
        assert!(VectorIndex::open(&dir.path().join("x.db"), "", embedder).is_err());
    }

    #[tokio::test]
    async fn search_only_sees_accessible_departments() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir);
        index
            .rebuild(&[
                chunk("finance", "budget.txt", 0, "budget forecast numbers"),
                chunk("hr", "leave.txt", 0, "budget for vacation leave"),
            ])
            .await
            .unwrap();

        let results = index
            .search("budget", &depts(&["hr"]), 10)
            .await
            .unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.department == "hr"));
    }

    #[tokio::test]
    async fn empty_accessible_set_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir);
        index
            .rebuild(&[chunk("finance", "budget.txt", 0, "budget forecast")])
            .await
            .unwrap();

        let results = index.search("budget", &BTreeSet::new(), 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_rejects_zero_top_k() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir);
        assert!(index.search("q", &depts(&["hr"]), 0).await.is_err());
    }

    #[tokio::test]
    async fn results_are_ranked_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir);
        index
            .rebuild(&[
                chunk("hr", "a.txt", 0, "vacation policy vacation days"),
                chunk("hr", "b.txt", 0, "kubernetes deployment checklist"),
                chunk("hr", "c.txt", 0, "vacation request form"),
            ])
            .await
            .unwrap();

        let results = index
            .search("vacation policy", &depts(&["hr"]), 2)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].relevance_score >= results[1].relevance_score);
        assert!(results.iter().all(|r| r.source_file != "b.txt"));
    }

    #[tokio::test]
    async fn equal_scores_order_by_sequence_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir);
        // Identical content embeds to the identical vector, so every
        // row ties on score and only the tie-break decides the order.
        index
            .rebuild(&[
                chunk("hr", "handbook.txt", 2, "identical paragraph text"),
                chunk("hr", "handbook.txt", 0, "identical paragraph text"),
                chunk("hr", "handbook.txt", 1, "identical paragraph text"),
            ])
            .await
            .unwrap();

        let results = index
            .search("identical paragraph text", &depts(&["hr"]), 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results
            .windows(2)
            .all(|pair| pair[0].relevance_score == pair[1].relevance_score));

        let order: Vec<u32> = results.iter().map(|r| r.sequence_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn rebuild_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir);
        index
            .rebuild(&[chunk("hr", "old.txt", 0, "old content")])
            .await
            .unwrap();
        index
            .rebuild(&[chunk("hr", "new.txt", 0, "new content")])
            .await
            .unwrap();

        let stats = index.stats().unwrap();
        assert_eq!(stats.total_entries, 1);
        let dump = index.department_dump("hr", &depts(&["hr"])).unwrap();
        assert_eq!(dump[0].source_file, "new.txt");
    }

    #[tokio::test]
    async fn rebuild_is_idempotent_over_same_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir);
        let corpus = vec![
            chunk("hr", "a.txt", 0, "first"),
            chunk("hr", "a.txt", 1, "second"),
        ];
        index.rebuild(&corpus).await.unwrap();
        let first = index.department_dump("hr", &depts(&["hr"])).unwrap();
        index.rebuild(&corpus).await.unwrap();
        let second = index.department_dump("hr", &depts(&["hr"])).unwrap();

        let ids = |rows: &[SearchResult]| {
            rows.iter()
                .map(|r| (r.source_file.clone(), r.sequence_index))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(index.stats().unwrap().total_entries, 2);
    }

    #[tokio::test]
    async fn department_dump_is_guarded_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir);
        index
            .rebuild(&[
                chunk("finance", "b.txt", 1, "part two"),
                chunk("finance", "b.txt", 0, "part one"),
                chunk("finance", "a.txt", 0, "alpha"),
            ])
            .await
            .unwrap();

        let denied = index.department_dump("finance", &depts(&["hr"])).unwrap();
        assert!(denied.is_empty());

        let dump = index
            .department_dump("finance", &depts(&["finance"]))
            .unwrap();
        let order: Vec<(String, u32)> = dump
            .iter()
            .map(|r| (r.source_file.clone(), r.sequence_index))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.txt".to_string(), 0),
                ("b.txt".to_string(), 0),
                ("b.txt".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn stats_on_empty_index_are_zero() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(&dir);
        let stats = index.stats().unwrap();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.distinct_departments, 0);
        assert_eq!(stats.distinct_source_formats, 0);
    }
}
