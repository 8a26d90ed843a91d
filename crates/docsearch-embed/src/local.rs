//! Tier 2: in-process sentence-embedding model.
//!
//! The model is loaded on first use, once per tier instance, on the blocking
//! pool. A failed load is remembered and the tier reports `ModelLoad` from
//! then on instead of retrying the load on every call.
use async_trait::async_trait;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokenizers::Tokenizer;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::EmbedError;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;
use crate::EmbedTier;

/// A loaded model that maps one text to one vector. Blocking.
pub trait SentenceModel: Send + Sync + 'static {
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// BERT encoder with mean pooling + L2 normalization
/// (all-MiniLM-L6-v2 layout: `config.json`, `tokenizer.json`, `model.safetensors`).
pub struct EmbeddingModel { model: BertModel, tokenizer: Tokenizer, device: Device, max_tokens: usize }

impl EmbeddingModel {
    pub fn load(model_dir: &Path, max_tokens: usize) -> Result<Self, EmbedError> {
        let load_err = |what: &str, e: &dyn std::fmt::Display| EmbedError::ModelLoad(format!("{}: {}", what, e));
        let device = select_device();
        info!(dir = %model_dir.display(), device = ?device, "loading local embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| load_err(&format!("tokenizer {}", tokenizer_path.display()), &e))?;
        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).map_err(|e| load_err("config.json", &e))?;
        let config: BertConfig = serde_json::from_str(&raw).map_err(|e| load_err("config.json", &e))?;
        let weights_path = model_dir.join("model.safetensors");
        // SAFETY: the weights file is opened read-only and not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device) }
            .map_err(|e| load_err("weights", &e))?;
        let model = BertModel::load(vb, &config).map_err(|e| load_err("model", &e))?;
        info!("local embedding model loaded");
        Ok(Self { model, tokenizer, device, max_tokens })
    }
}

impl SentenceModel for EmbeddingModel {
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_tokens, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let v = pooled.squeeze(0)?.to_dtype(DType::F32)?.to_device(&Device::Cpu)?.to_vec1::<f32>()?;
        if start.elapsed().as_millis() > 100 { debug!(ms = start.elapsed().as_millis() as u64, "slow local embedding"); }
        Ok(v)
    }
}

/// Metal when built with the `metal` feature and a GPU is present, else CPU.
fn select_device() -> Device {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(dev) => return dev,
        Err(e) => debug!(error = %e, "metal unavailable, embedding on cpu"),
    }
    Device::Cpu
}

type Loader<M> = Arc<dyn Fn() -> Result<M, EmbedError> + Send + Sync>;

pub struct LocalModelTier<M: SentenceModel = EmbeddingModel> {
    loader: Loader<M>,
    cell: Arc<OnceCell<Option<Arc<M>>>>,
}

impl LocalModelTier<EmbeddingModel> {
    /// Model directory resolution happens at load time, so a missing model
    /// only costs one logged failure.
    pub fn from_dir(model_dir: Option<PathBuf>, max_tokens: usize) -> Self {
        Self::with_loader(move || {
            let dir = resolve_model_dir(model_dir.as_deref())?;
            EmbeddingModel::load(&dir, max_tokens)
        })
    }
}

impl<M: SentenceModel> LocalModelTier<M> {
    pub fn with_loader(loader: impl Fn() -> Result<M, EmbedError> + Send + Sync + 'static) -> Self {
        Self { loader: Arc::new(loader), cell: Arc::new(OnceCell::new()) }
    }

    pub fn is_initialized(&self) -> bool { self.cell.initialized() }

    /// Loaded model, or `None` if loading failed. Loading runs in its own
    /// task so a caller timing out does not abandon a half-finished load.
    async fn model(&self) -> Option<Arc<M>> {
        if let Some(m) = self.cell.get() { return m.clone(); }
        let cell = Arc::clone(&self.cell);
        let loader = Arc::clone(&self.loader);
        let handle = tokio::spawn(async move {
            cell.get_or_init(|| async move {
                match tokio::task::spawn_blocking(move || (*loader)()).await {
                    Ok(Ok(model)) => Some(Arc::new(model)),
                    Ok(Err(e)) => { warn!(error = %e, "local embedding model unavailable"); None }
                    Err(e) => { warn!(error = %e, "local embedding model loader panicked"); None }
                }
            })
            .await
            .clone()
        });
        handle.await.unwrap_or(None)
    }
}

#[async_trait]
impl<M: SentenceModel> EmbedTier for LocalModelTier<M> {
    fn name(&self) -> &'static str { "local" }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let model = self.model().await.ok_or_else(|| EmbedError::ModelLoad("local model not loaded".to_string()))?;
        let text = text.to_string();
        tokio::task::spawn_blocking(move || model.embed_text(&text))
            .await
            .map_err(|e| EmbedError::Inference(e.to_string()))?
    }
}

fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf, EmbedError> {
    if let Some(p) = configured {
        if p.exists() { return Ok(p.to_path_buf()); }
        return Err(EmbedError::ModelLoad(format!("model dir {} does not exist", p.display())));
    }
    if let Ok(dir) = std::env::var("MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { return Ok(p); } }
    let default = Path::new("models/all-MiniLM-L6-v2");
    if default.exists() { return Ok(default.to_path_buf()); }
    Err(EmbedError::ModelLoad("could not locate a local embedding model directory".to_string()))
}
