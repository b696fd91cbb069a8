// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `fetch`, and all their
// configurable flags. Running without a subcommand is the same as
// `train` with every default.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{
    fetch_use_case::FetchConfig,
    train_use_case::{DeviceKind, TrainConfig, DEFAULT_MODEL},
};
use crate::data::cleaner::RemoveParts;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune a pretrained classifier on two newsgroups (default)
    Train(TrainArgs),

    /// Download the subset and print class counts and length statistics
    Fetch(FetchArgs),
}

/// Backend selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    /// GPU through wgpu
    Wgpu,
    /// CPU through ndarray
    Cpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Wgpu => DeviceKind::Wgpu,
            DeviceArg::Cpu  => DeviceKind::Cpu,
        }
    }
}

/// Parts of each post to strip before tokenizing
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveArg {
    Headers,
    Footers,
    Quotes,
}

fn remove_parts(parts: &[RemoveArg]) -> RemoveParts {
    RemoveParts {
        headers: parts.contains(&RemoveArg::Headers),
        footers: parts.contains(&RemoveArg::Footers),
        quotes:  parts.contains(&RemoveArg::Quotes),
    }
}

/// Flags shared by every subcommand that reads the corpus.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Newsgroup categories to classify
    #[arg(long, value_delimiter = ',', default_values_t = ["comp.graphics".to_string(), "soc.religion.christian".to_string()])]
    pub categories: Vec<String>,

    /// Seed for shuffling the splits and the training batches
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Extracted 20news-bydate directory to read instead of the Hub
    #[arg(long)]
    pub corpus_dir: Option<PathBuf>,

    /// Strip headers, footers and/or quoted replies from every post
    #[arg(long, value_enum, value_delimiter = ',')]
    pub remove: Vec<RemoveArg>,

    /// HuggingFace cache directory (defaults to $HF_HOME)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for DataArgs {
    fn default() -> Self {
        let cfg = FetchConfig::default();
        Self {
            categories: cfg.categories,
            seed:       cfg.seed,
            corpus_dir: None,
            remove:     Vec::new(),
            cache_dir:  None,
        }
    }
}

impl From<DataArgs> for FetchConfig {
    fn from(a: DataArgs) -> Self {
        FetchConfig {
            categories: a.categories,
            seed:       a.seed,
            corpus_dir: a.corpus_dir,
            remove:     remove_parts(&a.remove),
            cache_dir:  a.cache_dir,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Pretrained model on the HuggingFace Hub
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Tokens per sequence, [CLS] and [SEP] included
    #[arg(long, default_value_t = 64)]
    pub max_len: usize,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Peak learning rate of the one-cycle schedule
    #[arg(long, default_value_t = 8e-5)]
    pub lr: f64,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 2)]
    pub epochs: usize,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,

    /// Start from random weights instead of downloading the pretrained body
    #[arg(long)]
    pub random_init: bool,

    /// Text to classify after training (repeatable)
    #[arg(long)]
    pub predict: Vec<String>,
}

impl Default for TrainArgs {
    fn default() -> Self {
        let cfg = TrainConfig::default();
        Self {
            data:       DataArgs::default(),
            model:      cfg.model_id,
            max_len:    cfg.max_len,
            batch_size: cfg.batch_size,
            lr:         cfg.lr,
            epochs:     cfg.epochs,
            device:     DeviceArg::Wgpu,
            random_init: cfg.random_init,
            predict:    Vec::new(),
        }
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data:       a.data.into(),
            model_id:   a.model,
            max_len:    a.max_len,
            batch_size: a.batch_size,
            lr:         a.lr,
            epochs:     a.epochs,
            device:     a.device.into(),
            random_init: a.random_init,
            predict:    a.predict,
        }
    }
}

/// All arguments for the `fetch` command
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub data: DataArgs,
}
