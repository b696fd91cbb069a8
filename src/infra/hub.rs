// ============================================================
// Layer 6 — HuggingFace Hub Client
// ============================================================
// Downloads (and caches) everything the pipeline needs from the
// HuggingFace Hub:
//   - model repos:   config.json, tokenizer.json, model.safetensors
//   - dataset repos: the 20 Newsgroups JSONL splits
//
// hf-hub keeps its own content-addressed cache (by default under
// $HF_HOME), so a second run works offline once every file has
// been fetched.
//
// Errors are mapped onto the pipeline taxonomy: dataset files
// that cannot be fetched are DataUnavailable, model files are
// Weights errors.

use std::path::{Path, PathBuf};

use hf_hub::{
    api::sync::{Api, ApiBuilder},
    Repo, RepoType,
};

use crate::domain::error::PipelineError;

/// Architecture and weights of a pretrained checkpoint.
#[derive(Debug, Clone)]
pub struct PretrainedFiles {
    pub config:  PathBuf,
    pub weights: PathBuf,
}

pub struct HubClient {
    api: Api,
}

impl HubClient {
    /// Build a client, optionally with a custom cache directory.
    pub fn new(cache_dir: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = ApiBuilder::new().with_progress(true);
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(dir.to_path_buf());
        }

        let api = builder.build().map_err(|e| {
            PipelineError::data_unavailable(format!("cannot initialise HuggingFace Hub API: {e}"))
        })?;
        Ok(Self { api })
    }

    /// Fetch one file from a dataset repository.
    pub fn dataset_file(&self, repo_id: &str, file: &str) -> Result<PathBuf, PipelineError> {
        tracing::debug!("Fetching dataset file '{file}' from '{repo_id}'");
        self.api
            .repo(Repo::new(repo_id.to_string(), RepoType::Dataset))
            .get(file)
            .map_err(|e| {
                PipelineError::data_unavailable(format!("cannot download '{file}' from dataset '{repo_id}': {e}"))
            })
    }

    /// Fetch one file from a model repository.
    pub fn model_file(&self, repo_id: &str, file: &str) -> Result<PathBuf, PipelineError> {
        tracing::debug!("Fetching model file '{file}' from '{repo_id}'");
        self.api
            .repo(Repo::new(repo_id.to_string(), RepoType::Model))
            .get(file)
            .map_err(|e| PipelineError::Weights(format!("cannot download '{file}' from '{repo_id}': {e}")))
    }

    /// Fetch config and weights of a pretrained model.
    pub fn pretrained_files(&self, model_id: &str) -> Result<PretrainedFiles, PipelineError> {
        let files = PretrainedFiles {
            config:  self.model_file(model_id, "config.json")?,
            weights: self.model_file(model_id, "model.safetensors")?,
        };
        tracing::info!("Pretrained files for '{}' ready in {}", model_id, parent_display(&files.weights));
        Ok(files)
    }
}

fn parent_display(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
