// Imports a HuggingFace DistilBERT checkpoint (model.safetensors)
// into the burn modules of `distilbert.rs`.
//
// Key layout notes:
//   - base checkpoints use bare names ("embeddings.…"), fine-tuned
//     heads prefix them with "distilbert."
//   - PyTorch Linear stores weight as [out, in]; burn as [in, out]
//   - older checkpoints name LayerNorm params gamma/beta
//
// Every tensor is checked against the shape the config implies, so a
// config/weights mismatch fails loudly instead of silently broadcasting.

use std::{fs, path::Path};

use burn::{
    module::Param,
    nn::{Embedding, LayerNorm, Linear},
    prelude::*,
};
use safetensors::{tensor::TensorView, Dtype, SafeTensors};

use crate::domain::error::PipelineError;
use crate::ml::distilbert::DistilBert;

const BODY_PREFIX: &str = "distilbert.";

pub struct PretrainedWeights {
    buffer: Vec<u8>,
}

impl PretrainedWeights {
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let buffer = fs::read(path).map_err(|e| {
            PipelineError::Weights(format!("cannot read '{}': {e}", path.display()))
        })?;
        Ok(Self::from_bytes(buffer))
    }

    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        Self { buffer }
    }

    /// Overwrite every parameter of `body` with the checkpoint's values.
    pub fn load_into<B: Backend>(&self, mut body: DistilBert<B>, device: &B::Device) -> Result<DistilBert<B>, PipelineError> {
        let tensors = SafeTensors::deserialize(&self.buffer)
            .map_err(|e| PipelineError::Weights(format!("invalid safetensors file: {e:?}")))?;
        let reader = WeightReader::new(&tensors, device);

        let emb = &mut body.embeddings;
        reader.embedding(&mut emb.word_embeddings, "embeddings.word_embeddings")?;
        reader.embedding(&mut emb.position_embeddings, "embeddings.position_embeddings")?;
        reader.layer_norm(&mut emb.layer_norm, "embeddings.LayerNorm")?;

        for (i, layer) in body.layers.iter_mut().enumerate() {
            let base = format!("transformer.layer.{i}");
            reader.linear(&mut layer.attention.query, &format!("{base}.attention.q_lin"))?;
            reader.linear(&mut layer.attention.key, &format!("{base}.attention.k_lin"))?;
            reader.linear(&mut layer.attention.value, &format!("{base}.attention.v_lin"))?;
            reader.linear(&mut layer.attention.output, &format!("{base}.attention.out_lin"))?;
            reader.layer_norm(&mut layer.sa_layer_norm, &format!("{base}.sa_layer_norm"))?;
            reader.linear(&mut layer.ffn.lin1, &format!("{base}.ffn.lin1"))?;
            reader.linear(&mut layer.ffn.lin2, &format!("{base}.ffn.lin2"))?;
            reader.layer_norm(&mut layer.output_layer_norm, &format!("{base}.output_layer_norm"))?;
        }

        tracing::info!("Imported pretrained weights for {} transformer layers", body.layers.len());
        Ok(body)
    }
}

struct WeightReader<'a, B: Backend> {
    tensors: &'a SafeTensors<'a>,
    prefix:  &'static str,
    device:  &'a B::Device,
}

impl<'a, B: Backend> WeightReader<'a, B> {
    fn new(tensors: &'a SafeTensors<'a>, device: &'a B::Device) -> Self {
        let prefixed = tensors.names().iter().any(|n| n.starts_with(BODY_PREFIX));
        Self { tensors, prefix: if prefixed { BODY_PREFIX } else { "" }, device }
    }

    fn has(&self, key: &str) -> bool {
        self.tensors.tensor(&format!("{}{key}", self.prefix)).is_ok()
    }

    fn tensor<const D: usize>(&self, key: &str, expected: [usize; D]) -> Result<Tensor<B, D>, PipelineError> {
        let name = format!("{}{key}", self.prefix);
        let view = self
            .tensors
            .tensor(&name)
            .map_err(|_| PipelineError::Weights(format!("checkpoint has no tensor '{name}'")))?;

        if view.shape() != expected.as_slice() {
            return Err(PipelineError::Weights(format!(
                "tensor '{name}' has shape {:?}, expected {:?}", view.shape(), expected
            )));
        }

        let values = to_f32(&view).map_err(|dtype| {
            PipelineError::Weights(format!("tensor '{name}' has unsupported dtype {dtype:?}"))
        })?;
        Ok(Tensor::from_data(TensorData::new(values, expected), self.device))
    }

    fn embedding(&self, embedding: &mut Embedding<B>, base: &str) -> Result<(), PipelineError> {
        let dims = embedding.weight.val().dims();
        embedding.weight = Param::from_tensor(self.tensor(&format!("{base}.weight"), dims)?);
        Ok(())
    }

    fn linear(&self, linear: &mut Linear<B>, base: &str) -> Result<(), PipelineError> {
        let [d_in, d_out] = linear.weight.val().dims();
        let weight: Tensor<B, 2> = self.tensor(&format!("{base}.weight"), [d_out, d_in])?;
        linear.weight = Param::from_tensor(weight.transpose());
        linear.bias   = Some(Param::from_tensor(self.tensor(&format!("{base}.bias"), [d_out])?));
        Ok(())
    }

    fn layer_norm(&self, norm: &mut LayerNorm<B>, base: &str) -> Result<(), PipelineError> {
        let dims = norm.gamma.val().dims();
        let (scale, shift) = if self.has(&format!("{base}.weight")) {
            ("weight", "bias")
        } else {
            ("gamma", "beta")
        };
        norm.gamma = Param::from_tensor(self.tensor(&format!("{base}.{scale}"), dims)?);
        norm.beta  = Param::from_tensor(self.tensor(&format!("{base}.{shift}"), dims)?);
        Ok(())
    }
}

/// Little-endian f32 or bf16 payload to f32 values.
fn to_f32(view: &TensorView<'_>) -> Result<Vec<f32>, Dtype> {
    let bytes = view.data();
    match view.dtype() {
        Dtype::F32 => Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()),
        Dtype::BF16 => Ok(bytes
            .chunks_exact(2)
            .map(|b| f32::from_bits((u16::from_le_bytes([b[0], b[1]]) as u32) << 16))
            .collect()),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::distilbert::tiny_config;
    use burn::backend::NdArray;
    use std::collections::HashMap;

    type TestBackend = NdArray;

    /// Serialise a body the way transformers lays out a checkpoint.
    fn export_hf(body: &DistilBert<TestBackend>, prefix: &str) -> Vec<u8> {
        fn values<const D: usize>(t: Tensor<TestBackend, D>) -> (Vec<usize>, Vec<u8>) {
            let shape = t.dims().to_vec();
            let data  = t.into_data();
            let bytes = data.iter::<f32>().flat_map(f32::to_le_bytes).collect();
            (shape, bytes)
        }

        type Entries = Vec<(String, (Vec<usize>, Vec<u8>))>;

        let mut out: Entries = Vec::new();
        let push_linear = |name: String, l: &Linear<TestBackend>, out: &mut Entries| {
            out.push((format!("{name}.weight"), values(l.weight.val().transpose())));
            if let Some(b) = &l.bias {
                out.push((format!("{name}.bias"), values(b.val())));
            }
        };
        let push_norm = |name: String, n: &LayerNorm<TestBackend>, out: &mut Entries| {
            out.push((format!("{name}.weight"), values(n.gamma.val())));
            out.push((format!("{name}.bias"), values(n.beta.val())));
        };

        let emb = &body.embeddings;
        out.push(("embeddings.word_embeddings.weight".into(), values(emb.word_embeddings.weight.val())));
        out.push(("embeddings.position_embeddings.weight".into(), values(emb.position_embeddings.weight.val())));
        push_norm("embeddings.LayerNorm".into(), &emb.layer_norm, &mut out);

        for (i, layer) in body.layers.iter().enumerate() {
            let base = format!("transformer.layer.{i}");
            push_linear(format!("{base}.attention.q_lin"), &layer.attention.query, &mut out);
            push_linear(format!("{base}.attention.k_lin"), &layer.attention.key, &mut out);
            push_linear(format!("{base}.attention.v_lin"), &layer.attention.value, &mut out);
            push_linear(format!("{base}.attention.out_lin"), &layer.attention.output, &mut out);
            push_norm(format!("{base}.sa_layer_norm"), &layer.sa_layer_norm, &mut out);
            push_linear(format!("{base}.ffn.lin1"), &layer.ffn.lin1, &mut out);
            push_linear(format!("{base}.ffn.lin2"), &layer.ffn.lin2, &mut out);
            push_norm(format!("{base}.output_layer_norm"), &layer.output_layer_norm, &mut out);
        }

        let views: Vec<(String, TensorView<'_>)> = out
            .iter()
            .map(|(name, (shape, bytes))| {
                let view = TensorView::new(Dtype::F32, shape.clone(), bytes).unwrap();
                (format!("{prefix}{name}"), view)
            })
            .collect();
        safetensors::serialize(views, &None::<HashMap<String, String>>).unwrap()
    }

    fn ids() -> (Tensor<TestBackend, 2, Int>, Tensor<TestBackend, 2, Int>) {
        let device = Default::default();
        let ids  = Tensor::from_data(TensorData::new(vec![2i64, 5, 9, 3, 0, 0], [1, 6]), &device);
        let mask = Tensor::from_data(TensorData::new(vec![1i64, 1, 1, 1, 0, 0], [1, 6]), &device);
        (ids, mask)
    }

    fn max_diff(a: Tensor<TestBackend, 3>, b: Tensor<TestBackend, 3>) -> f32 {
        (a - b).abs().max().into_scalar().elem()
    }

    #[test]
    fn test_loaded_body_reproduces_source() {
        let device = Default::default();
        let source = tiny_config().init::<TestBackend>(&device);
        let weights = PretrainedWeights::from_bytes(export_hf(&source, ""));

        let fresh  = tiny_config().init::<TestBackend>(&device);
        let loaded = weights.load_into(fresh, &device).unwrap();

        let (input_ids, mask) = ids();
        let expected = source.forward(input_ids.clone(), mask.clone());
        let actual   = loaded.forward(input_ids, mask);
        assert!(max_diff(expected, actual) < 1e-5);
    }

    #[test]
    fn test_attention_projections_land_in_mha_fields() {
        let device = Default::default();
        let source = tiny_config().init::<TestBackend>(&device);
        let weights = PretrainedWeights::from_bytes(export_hf(&source, ""));
        let loaded = weights.load_into(tiny_config().init::<TestBackend>(&device), &device).unwrap();

        let (src, dst) = (&source.layers[1].attention, &loaded.layers[1].attention);
        for (a, b) in [(&src.query, &dst.query), (&src.key, &dst.key), (&src.value, &dst.value), (&src.output, &dst.output)] {
            let diff: f32 = (a.weight.val() - b.weight.val()).abs().max().into_scalar().elem();
            assert_eq!(diff, 0.0);
        }
    }

    #[test]
    fn test_prefixed_checkpoint_is_accepted() {
        let device = Default::default();
        let source = tiny_config().init::<TestBackend>(&device);
        let weights = PretrainedWeights::from_bytes(export_hf(&source, BODY_PREFIX));
        assert!(weights.load_into(tiny_config().init::<TestBackend>(&device), &device).is_ok());
    }

    #[test]
    fn test_shape_mismatch_is_weights_error() {
        let device = Default::default();
        let source = tiny_config().init::<TestBackend>(&device);
        let weights = PretrainedWeights::from_bytes(export_hf(&source, ""));

        let wider = tiny_config().with_hidden_dim(48).init::<TestBackend>(&device);
        let err = weights.load_into(wider, &device).err().unwrap();
        assert!(matches!(err, PipelineError::Weights(ref m) if m.contains("ffn.lin1")));
    }

    #[test]
    fn test_missing_tensor_is_weights_error() {
        let device = Default::default();
        let source = tiny_config().init::<TestBackend>(&device);
        let weights = PretrainedWeights::from_bytes(export_hf(&source, ""));

        let deeper = tiny_config().with_n_layers(3).init::<TestBackend>(&device);
        let err = weights.load_into(deeper, &device).err().unwrap();
        assert!(matches!(err, PipelineError::Weights(ref m) if m.contains("transformer.layer.2")));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let device = Default::default();
        let weights = PretrainedWeights::from_bytes(vec![1, 2, 3]);
        let result = weights.load_into(tiny_config().init::<TestBackend>(&device), &device);
        assert!(matches!(result, Err(PipelineError::Weights(_))));
    }
}
