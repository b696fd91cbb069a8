use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::gelu,
};
use serde::Deserialize;

use crate::domain::error::PipelineError;

const LAYER_NORM_EPS: f64 = 1e-12;

/// DistilBERT body hyperparameters. Defaults are those of
/// `distilbert-base-uncased`.
#[derive(Config, Debug)]
pub struct DistilBertConfig {
    #[config(default = 30522)]
    pub vocab_size: usize,
    #[config(default = 512)]
    pub max_position_embeddings: usize,
    #[config(default = 768)]
    pub dim: usize,
    #[config(default = 6)]
    pub n_layers: usize,
    #[config(default = 12)]
    pub n_heads: usize,
    #[config(default = 3072)]
    pub hidden_dim: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
    #[config(default = 0.1)]
    pub attention_dropout: f64,
    #[config(default = 0.2)]
    pub seq_classif_dropout: f64,
}

/// The subset of a Hub `config.json` this crate understands.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct HubConfig {
    vocab_size:              usize,
    max_position_embeddings: usize,
    dim:                     usize,
    n_layers:                usize,
    n_heads:                 usize,
    hidden_dim:              usize,
    dropout:                 f64,
    attention_dropout:       f64,
    seq_classif_dropout:     f64,
    activation:              String,
    sinusoidal_pos_embds:    bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            vocab_size:              30522,
            max_position_embeddings: 512,
            dim:                     768,
            n_layers:                6,
            n_heads:                 12,
            hidden_dim:              3072,
            dropout:                 0.1,
            attention_dropout:       0.1,
            seq_classif_dropout:     0.2,
            activation:              "gelu".to_string(),
            sinusoidal_pos_embds:    false,
        }
    }
}

impl DistilBertConfig {
    /// Parse a HuggingFace `config.json` of a DistilBERT checkpoint.
    pub fn from_hub_json(json: &str) -> Result<Self, PipelineError> {
        let hub: HubConfig = serde_json::from_str(json)
            .map_err(|e| PipelineError::InvalidConfig(format!("cannot parse model config.json: {e}")))?;

        if hub.activation != "gelu" {
            return Err(PipelineError::InvalidConfig(format!(
                "unsupported activation '{}', only gelu is implemented", hub.activation
            )));
        }
        // Sinusoidal tables are stored in the checkpoint like learned ones,
        // so loading the position embedding weights covers both.
        if hub.sinusoidal_pos_embds {
            tracing::debug!("Checkpoint uses sinusoidal position embeddings");
        }

        Ok(Self::new()
            .with_vocab_size(hub.vocab_size)
            .with_max_position_embeddings(hub.max_position_embeddings)
            .with_dim(hub.dim)
            .with_n_layers(hub.n_layers)
            .with_n_heads(hub.n_heads)
            .with_hidden_dim(hub.hidden_dim)
            .with_dropout(hub.dropout)
            .with_attention_dropout(hub.attention_dropout)
            .with_seq_classif_dropout(hub.seq_classif_dropout))
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.n_heads == 0 || self.dim % self.n_heads != 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "dim ({}) must be divisible by n_heads ({})", self.dim, self.n_heads
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> DistilBert<B> {
        let embeddings = Embeddings {
            word_embeddings:     EmbeddingConfig::new(self.vocab_size, self.dim).init(device),
            position_embeddings: EmbeddingConfig::new(self.max_position_embeddings, self.dim).init(device),
            layer_norm:          LayerNormConfig::new(self.dim).with_epsilon(LAYER_NORM_EPS).init(device),
            dropout:             DropoutConfig::new(self.dropout).init(),
        };
        let layers = (0..self.n_layers).map(|_| self.build_layer(device)).collect();
        DistilBert { embeddings, layers }
    }

    fn build_layer<B: Backend>(&self, device: &B::Device) -> TransformerLayer<B> {
        let linear = |d_in, d_out| LinearConfig::new(d_in, d_out).init(device);
        // Padding scores are filled with -1e4 before softmax, as in transformers
        let attention = MultiHeadAttentionConfig::new(self.dim, self.n_heads)
            .with_dropout(self.attention_dropout)
            .init(device);
        let ffn = FeedForward {
            lin1:    linear(self.dim, self.hidden_dim),
            lin2:    linear(self.hidden_dim, self.dim),
            dropout: DropoutConfig::new(self.dropout).init(),
        };
        TransformerLayer {
            attention,
            sa_layer_norm:     LayerNormConfig::new(self.dim).with_epsilon(LAYER_NORM_EPS).init(device),
            ffn,
            output_layer_norm: LayerNormConfig::new(self.dim).with_epsilon(LAYER_NORM_EPS).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct Embeddings<B: Backend> {
    pub word_embeddings:     Embedding<B>,
    pub position_embeddings: Embedding<B>,
    pub layer_norm:          LayerNorm<B>,
    pub dropout:             Dropout,
}

impl<B: Backend> Embeddings<B> {
    /// input_ids: [batch, seq_len] → [batch, seq_len, dim]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [_, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let words = self.word_embeddings.forward(input_ids);
        // [1, seq_len, dim], broadcast over the batch
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device).reshape([1, seq_len]);
        let positions = self.position_embeddings.forward(positions);

        self.dropout.forward(self.layer_norm.forward(words + positions))
    }
}

#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    pub lin1:    Linear<B>,
    pub lin2:    Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> FeedForward<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.dropout.forward(self.lin2.forward(gelu(self.lin1.forward(x))))
    }
}

/// Post-norm encoder block: attention → add & norm → FFN → add & norm.
#[derive(Module, Debug)]
pub struct TransformerLayer<B: Backend> {
    pub attention:         MultiHeadAttention<B>,
    pub sa_layer_norm:     LayerNorm<B>,
    pub ffn:               FeedForward<B>,
    pub output_layer_norm: LayerNorm<B>,
}

impl<B: Backend> TransformerLayer<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mask_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attended = self
            .attention
            .forward(MhaInput::self_attn(x.clone()).mask_pad(mask_pad))
            .context;
        let x = self.sa_layer_norm.forward(attended + x);
        let ffn_out = self.ffn.forward(x.clone());
        self.output_layer_norm.forward(ffn_out + x)
    }
}

#[derive(Module, Debug)]
pub struct DistilBert<B: Backend> {
    pub embeddings: Embeddings<B>,
    pub layers:     Vec<TransformerLayer<B>>,
}

impl<B: Backend> DistilBert<B> {
    /// input_ids, attention_mask: [batch, seq_len] → hidden states [batch, seq_len, dim]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let mask_pad = attention_mask.equal_elem(0);

        let mut x = self.embeddings.forward(input_ids);
        for layer in &self.layers {
            x = layer.forward(x, mask_pad.clone());
        }
        x
    }

    /// Longest sequence the position embedding table supports
    pub fn max_positions(&self) -> usize {
        self.embeddings.position_embeddings.weight.val().dims()[0]
    }
}

/// A two-layer body small enough for CPU tests.
#[cfg(test)]
pub(crate) fn tiny_config() -> DistilBertConfig {
    DistilBertConfig::new()
        .with_vocab_size(24)
        .with_max_position_embeddings(16)
        .with_dim(16)
        .with_n_layers(2)
        .with_n_heads(2)
        .with_hidden_dim(32)
}
