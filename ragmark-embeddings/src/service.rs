use crate::error::EmbeddingError;
use crate::{DEFAULT_EMBEDDING_DIM, Embedder};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use log::{debug, info};

/// Configuration for the fastembed provider
#[derive(Debug, Clone)]
pub struct FastembedConfig {
    /// Model to use for embeddings
    pub model: EmbeddingModelType,

    /// Target embedding dimension (for Matryoshka truncation)
    pub dimension: usize,

    /// Maximum batch size for embedding generation
    pub batch_size: usize,

    /// Show download progress when downloading models
    pub show_download_progress: bool,
}

impl Default for FastembedConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModelType::AllMiniLmL6V2,
            dimension: DEFAULT_EMBEDDING_DIM,
            batch_size: 32,
            show_download_progress: false,
        }
    }
}

/// Supported embedding models
#[derive(Debug, Clone, Copy)]
pub enum EmbeddingModelType {
    /// All-MiniLM-L6-v2 (lightweight, CPU-friendly)
    AllMiniLmL6V2,
    /// Nomic-embed-text-v1.5 (larger, higher quality)
    NomicEmbedTextV15,
}

impl EmbeddingModelType {
    fn to_fastembed_model(self) -> EmbeddingModel {
        match self {
            EmbeddingModelType::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            EmbeddingModelType::NomicEmbedTextV15 => EmbeddingModel::NomicEmbedTextV15,
        }
    }
}

/// Embedding provider backed by a local ONNX model via fastembed
pub struct FastembedEmbedder {
    model: TextEmbedding,
    config: FastembedConfig,
}

impl FastembedEmbedder {
    /// Create a provider with the default configuration
    pub fn new() -> Result<Self, EmbeddingError> {
        Self::with_config(FastembedConfig::default())
    }

    /// Create a provider with a custom configuration
    pub fn with_config(config: FastembedConfig) -> Result<Self, EmbeddingError> {
        info!(
            "Initializing fastembed provider with model {:?}, dimension {}",
            config.model, config.dimension
        );

        let init_options = InitOptions::new(config.model.to_fastembed_model())
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(init_options).map_err(|e| {
            EmbeddingError::ModelInitialization(format!("Failed to initialize model: {e}"))
        })?;

        info!("Fastembed provider initialized successfully");

        Ok(Self { model, config })
    }
}

impl Embedder for FastembedEmbedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in text_refs.chunks(self.config.batch_size) {
            let batch_embeddings = self
                .model
                .embed(chunk.to_vec(), None)
                .map_err(|e| EmbeddingError::EmbeddingGeneration(e.to_string()))?;

            for mut embedding in batch_embeddings {
                // Truncate to target dimension if needed (Matryoshka)
                if embedding.len() > self.config.dimension {
                    embedding.truncate(self.config.dimension);
                }
                all_embeddings.push(embedding);
            }
        }

        debug!("Generated {} embeddings", all_embeddings.len());

        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
