//! Configuration management for the askdesk retrieval service.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Built-in defaults
//! - Config file (`.askdesk/config.yaml` or `ASKDESK_CONFIG`)
//! - Environment variables
//! - Command-line flags (applied last, via [`AppConfig::with_overrides`])
//!
//! Role and department tables are loaded separately by `askdesk-policy`;
//! this struct only carries where to find them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .askdesk/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Root directory holding one sub-directory of documents per department
    pub data_dir: PathBuf,

    /// Path to the SQLite vector index database
    pub index_path: PathBuf,

    /// Collection (table) name inside the index database
    pub collection: String,

    /// Optional policy table file (YAML); built-in table when absent
    pub policy_file: Option<PathBuf>,

    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Default number of results to retrieve per query
    pub top_k: usize,

    /// Maximum size of the assembled context in characters
    pub max_context_chars: usize,

    /// Generation provider (e.g., "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Optional custom endpoint for the generation provider
    pub endpoint: Option<String>,

    /// Embedding provider ("hash" for the deterministic local provider,
    /// "ollama" for a real embedding model)
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding vector dimension
    pub embedding_dim: usize,

    /// Deadline for a single embed/generate call, in seconds
    pub request_timeout_secs: u64,

    /// Sampling temperature for generation
    pub temperature: f32,

    /// Maximum tokens to generate per answer
    pub max_tokens: u32,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Config file structure (all sections optional).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    paths: Option<PathsConfig>,
    retrieval: Option<RetrievalConfig>,
    llm: Option<LlmFileConfig>,
    embedding: Option<EmbeddingFileConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PathsConfig {
    data_dir: Option<PathBuf>,
    index_path: Option<PathBuf>,
    collection: Option<String>,
    policy_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RetrievalConfig {
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    top_k: Option<usize>,
    max_context_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LlmFileConfig {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    request_timeout_secs: Option<u64>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmbeddingFileConfig {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            data_dir: workspace.join("resources").join("data"),
            index_path: workspace.join(".askdesk").join("index.sqlite"),
            workspace,
            config_file: None,
            collection: "documents".to_string(),
            policy_file: None,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            max_context_chars: 12_000,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            embedding_provider: "hash".to_string(),
            embedding_model: "trigram-v1".to_string(),
            embedding_dim: 384,
            request_timeout_secs: 60,
            temperature: 0.7,
            max_tokens: 1000,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and the config file.
    ///
    /// Environment variables:
    /// - `ASKDESK_WORKSPACE`: Override workspace path
    /// - `ASKDESK_CONFIG`: Path to config file
    /// - `ASKDESK_DATA_DIR`: Document root directory
    /// - `ASKDESK_PROVIDER`: Generation provider
    /// - `ASKDESK_MODEL`: Generation model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("ASKDESK_WORKSPACE") {
            let workspace = PathBuf::from(workspace);
            config.data_dir = workspace.join("resources").join("data");
            config.index_path = workspace.join(".askdesk").join("index.sqlite");
            config.workspace = workspace;
        }

        if let Ok(config_file) = std::env::var("ASKDESK_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".askdesk/config.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override the config file
        if let Ok(data_dir) = std::env::var("ASKDESK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(provider) = std::env::var("ASKDESK_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("ASKDESK_MODEL") {
            config.model = model;
        }

        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(paths) = config_file.paths {
            if let Some(data_dir) = paths.data_dir {
                result.data_dir = data_dir;
            }
            if let Some(index_path) = paths.index_path {
                result.index_path = index_path;
            }
            if let Some(collection) = paths.collection {
                result.collection = collection;
            }
            if let Some(policy_file) = paths.policy_file {
                result.policy_file = Some(policy_file);
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(chunk_size) = retrieval.chunk_size {
                result.chunk_size = chunk_size;
            }
            if let Some(chunk_overlap) = retrieval.chunk_overlap {
                result.chunk_overlap = chunk_overlap;
            }
            if let Some(top_k) = retrieval.top_k {
                result.top_k = top_k;
            }
            if let Some(max_context_chars) = retrieval.max_context_chars {
                result.max_context_chars = max_context_chars;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(endpoint) = llm.endpoint {
                result.endpoint = Some(endpoint);
            }
            if let Some(timeout) = llm.request_timeout_secs {
                result.request_timeout_secs = timeout;
            }
            if let Some(temperature) = llm.temperature {
                result.temperature = temperature;
            }
            if let Some(max_tokens) = llm.max_tokens {
                result.max_tokens = max_tokens;
            }
        }

        if let Some(embedding) = config_file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                result.embedding_dim = dimensions;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI flag overrides on top of the loaded configuration.
    ///
    /// A `--workspace` flag re-derives the workspace-relative paths and
    /// a `--config` flag merges that file, so the flags behave the same
    /// as their environment-variable counterparts; the remaining flags
    /// are applied last and win over both.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> AppResult<Self> {
        if let Some(workspace) = workspace {
            self.data_dir = workspace.join("resources").join("data");
            self.index_path = workspace.join(".askdesk").join("index.sqlite");
            self.workspace = workspace;
        }
        if let Some(config_file) = config_file {
            self = self.merge_yaml(&config_file)?;
            self.config_file = Some(config_file);
        }
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        if let Some(provider) = provider {
            self.provider = provider;
        }
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }
        if verbose {
            self.verbose = true;
            self.log_level = Some("debug".to_string());
        }
        if no_color {
            self.no_color = true;
        }
        Ok(self)
    }

    /// Reject configurations that would break retrieval invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be positive".to_string()));
        }
        if self.embedding_dim == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Ensure the .askdesk state directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let dir = self.workspace.join(".askdesk");
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            tracing::debug!("Created state directory at {:?}", dir);
        }
        Ok(())
    }

    /// Resolve the document folder for one department.
    pub fn department_dir(&self, department: &str) -> PathBuf {
        self.data_dir.join(department)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.embedding_dim, 384);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap_ge_size() {
        let config = AppConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let config = AppConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        std::fs::write(
            &config_path,
            r#"
retrieval:
  chunk_size: 800
  top_k: 3
llm:
  provider: ollama
  model: mistral
  request_timeout_secs: 20
embedding:
  provider: hash
  dimensions: 128
"#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        let merged = config.merge_yaml(&config_path).unwrap();

        assert_eq!(merged.chunk_size, 800);
        assert_eq!(merged.top_k, 3);
        assert_eq!(merged.model, "mistral");
        assert_eq!(merged.request_timeout_secs, 20);
        assert_eq!(merged.embedding_dim, 128);
        // Untouched fields keep defaults
        assert_eq!(merged.chunk_overlap, 200);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            None,
            None,
            Some(PathBuf::from("/tmp/docs")),
            Some("ollama".to_string()),
            Some("llama3".to_string()),
            None,
            true,
            false,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/docs"));
        assert_eq!(config.model, "llama3");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.verbose);
    }

    #[test]
    fn test_workspace_flag_rederives_paths() {
        let config = AppConfig::default()
            .with_overrides(
                Some(PathBuf::from("/srv/askdesk")),
                None,
                None,
                None,
                None,
                None,
                false,
                false,
            )
            .unwrap();

        assert_eq!(config.workspace, PathBuf::from("/srv/askdesk"));
        assert_eq!(
            config.data_dir,
            PathBuf::from("/srv/askdesk/resources/data")
        );
        assert_eq!(
            config.index_path,
            PathBuf::from("/srv/askdesk/.askdesk/index.sqlite")
        );
    }

    #[test]
    fn test_data_dir_flag_wins_over_workspace_derivation() {
        let config = AppConfig::default()
            .with_overrides(
                Some(PathBuf::from("/srv/askdesk")),
                None,
                Some(PathBuf::from("/mnt/docs")),
                None,
                None,
                None,
                false,
                false,
            )
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/mnt/docs"));
        assert_eq!(
            config.index_path,
            PathBuf::from("/srv/askdesk/.askdesk/index.sqlite")
        );
    }

    #[test]
    fn test_config_flag_merges_the_named_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("flagged.yaml");
        std::fs::write(&config_path, "retrieval:\n  chunk_size: 640\n").unwrap();

        let config = AppConfig::default()
            .with_overrides(
                None,
                Some(config_path.clone()),
                None,
                None,
                None,
                None,
                false,
                false,
            )
            .unwrap();

        assert_eq!(config.chunk_size, 640);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_config_flag_missing_file_is_an_error() {
        let result = AppConfig::default().with_overrides(
            None,
            Some(PathBuf::from("/nonexistent/config.yaml")),
            None,
            None,
            None,
            None,
            false,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_department_dir() {
        let config = AppConfig {
            data_dir: PathBuf::from("/data"),
            ..Default::default()
        };
        assert_eq!(config.department_dir("finance"), PathBuf::from("/data/finance"));
    }
}
