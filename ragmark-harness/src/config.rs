use anyhow::Context;
use ragmark_embeddings::{Embedder, HashingEmbedder, HASHING_EMBEDDING_DIM};
use ragmark_retrieval::RetrievalConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Top-level experiment configuration, loaded from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Run identity and repetition settings
    #[serde(default)]
    pub run: RunConfig,

    /// Input dataset locations
    pub datasets: DatasetConfig,

    /// Retrieval pipeline settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generation backend settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Evaluation settings
    #[serde(default)]
    pub eval: EvalConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl HarnessConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        if self.run.trials_per_prompt == 0 {
            return Err("run.trials_per_prompt must be greater than 0".to_string());
        }
        self.retrieval.validate()?;
        if self.embedding.dimension == Some(0) {
            return Err("embedding.dimension must be greater than 0".to_string());
        }
        if self.embedding.batch_size == 0 {
            return Err("embedding.batch_size must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.eval.similarity_threshold) {
            return Err("eval.similarity_threshold must be between 0.0 and 1.0".to_string());
        }
        if self.generation.temperature < 0.0 {
            return Err("generation.temperature must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err("generation.top_p must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }
}

/// Run identity and repetition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Name of the run; results land under `{out_dir}/{name}/`
    #[serde(default = "default_run_name")]
    pub name: String,

    /// Experiment seed recorded with the run
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// How many times each prompt is asked, to measure variance
    #[serde(default = "default_trials_per_prompt")]
    pub trials_per_prompt: usize,
}

fn default_run_name() -> String {
    "baseline".to_string()
}

fn default_seed() -> u64 {
    42
}

fn default_trials_per_prompt() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: default_run_name(),
            seed: default_seed(),
            trials_per_prompt: default_trials_per_prompt(),
        }
    }
}

/// Input dataset locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// JSON array of knowledge-base articles
    pub knowledge_path: PathBuf,

    /// JSON array of prompt strings
    pub prompts_path: PathBuf,
}

/// Which embedding provider to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic feature-hashing embedder; no model download
    Hash,
    /// Local fastembed model (requires the `fastembed` feature)
    Fastembed,
}

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider to use for both corpus and query embeddings
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProvider,

    /// Embedding dimension; omit to use the provider's default
    #[serde(default)]
    pub dimension: Option<usize>,

    /// Batch size for corpus embedding
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Show model download progress
    #[serde(default)]
    pub show_download_progress: bool,
}

fn default_embedding_provider() -> EmbeddingProvider {
    EmbeddingProvider::Hash
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            dimension: None,
            batch_size: default_batch_size(),
            show_download_progress: false,
        }
    }
}

impl EmbeddingConfig {
    /// Construct the configured embedding provider.
    pub fn build_embedder(&self) -> anyhow::Result<Arc<dyn Embedder>> {
        match self.provider {
            EmbeddingProvider::Hash => {
                let dimension = self.dimension.unwrap_or(HASHING_EMBEDDING_DIM);
                Ok(Arc::new(HashingEmbedder::new(dimension)))
            }
            #[cfg(feature = "fastembed")]
            EmbeddingProvider::Fastembed => {
                let mut config = ragmark_embeddings::FastembedConfig {
                    batch_size: self.batch_size,
                    show_download_progress: self.show_download_progress,
                    ..Default::default()
                };
                if let Some(dimension) = self.dimension {
                    config.dimension = dimension;
                }
                let embedder = ragmark_embeddings::FastembedEmbedder::with_config(config)
                    .context("initialize fastembed model")?;
                Ok(Arc::new(embedder))
            }
            #[cfg(not(feature = "fastembed"))]
            EmbeddingProvider::Fastembed => {
                anyhow::bail!(
                    "embedding.provider = \"fastembed\" requires building with the fastembed feature"
                )
            }
        }
    }
}

/// Which generation backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackendKind {
    /// Canned keyword-matched answers; deterministic and offline
    Dummy,
    /// OpenAI-compatible chat completions endpoint
    Openai,
}

/// Generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Backend to use for answering prompts
    #[serde(default = "default_generation_backend")]
    pub backend: GenerationBackendKind,

    /// Model name sent to the API backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Generation seed, sent to API backends and mixed into dummy responses
    #[serde(default = "default_generation_seed")]
    pub seed: u64,
}

fn default_generation_backend() -> GenerationBackendKind {
    GenerationBackendKind::Dummy
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_top_p() -> f32 {
    1.0
}

fn default_generation_seed() -> u64 {
    1234
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_generation_backend(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            seed: default_generation_seed(),
        }
    }
}

/// Evaluation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Cosine similarity above which two responses count as agreeing
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

fn default_similarity_threshold() -> f32 {
    0.8
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that per-run result folders are created under
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ragmark_retrieval::RetrievalMode;
    use std::io::Write;

    const MINIMAL: &str = r#"
[datasets]
knowledge_path = "datasets/knowledge.json"
prompts_path = "datasets/prompts.json"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: HarnessConfig = toml::from_str(MINIMAL).unwrap();

        assert_eq!(config.run.name, "baseline");
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.run.trials_per_prompt, 1);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.mode, RetrievalMode::Hybrid);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Hash);
        assert_eq!(config.generation.backend, GenerationBackendKind::Dummy);
        assert_eq!(config.eval.similarity_threshold, 0.8);
        assert_eq!(config.output.out_dir, PathBuf::from("results"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config_overrides() {
        let raw = r#"
[run]
name = "mmr-sweep"
seed = 7
trials_per_prompt = 5

[datasets]
knowledge_path = "kb.json"
prompts_path = "prompts.json"

[retrieval]
top_k = 5
mode = "dense"
mmr_enabled = true
mmr_lambda = 0.5

[embedding]
provider = "hash"
dimension = 64

[generation]
backend = "openai"
model = "gpt-4o"
temperature = 0.0

[eval]
similarity_threshold = 0.9

[output]
out_dir = "out"
"#;
        let config: HarnessConfig = toml::from_str(raw).unwrap();

        assert_eq!(config.run.name, "mmr-sweep");
        assert_eq!(config.run.trials_per_prompt, 5);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.mode, RetrievalMode::Dense);
        assert!(config.retrieval.mmr_enabled);
        assert_eq!(config.embedding.dimension, Some(64));
        assert_eq!(config.generation.backend, GenerationBackendKind::Openai);
        assert_eq!(config.generation.model, "gpt-4o");
        assert_eq!(config.eval.similarity_threshold, 0.9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_trials_rejected() {
        let mut config: HarnessConfig = toml::from_str(MINIMAL).unwrap();
        config.run.trials_per_prompt = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_retrieval_section_rejected() {
        let mut config: HarnessConfig = toml::from_str(MINIMAL).unwrap();
        config.retrieval.mmr_lambda = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_embedding_dimension_rejected() {
        let mut config: HarnessConfig = toml::from_str(MINIMAL).unwrap();
        config.embedding.dimension = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config: HarnessConfig = toml::from_str(MINIMAL).unwrap();
        config.embedding.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let raw = r#"
[datasets]
knowledge_path = "kb.json"
prompts_path = "prompts.json"

[embedding]
provider = "quantum"
"#;
        assert!(toml::from_str::<HarnessConfig>(raw).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(config.datasets.prompts_path, PathBuf::from("datasets/prompts.json"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = HarnessConfig::load(Path::new("/no/such/ragmark.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_embedder_dimension_override() {
        let embedding = EmbeddingConfig {
            dimension: Some(16),
            ..Default::default()
        };
        let embedder = embedding.build_embedder().unwrap();
        assert_eq!(embedder.dimension(), 16);
    }
}
