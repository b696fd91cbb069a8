// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the tokenizer that belongs to a pretrained model.
//
// The pretrained vocabulary must be used unchanged: the embedding
// matrix rows are indexed by these ids, so any other vocabulary
// would feed the model meaningless inputs.
//
// Sources:
//   - the HuggingFace Hub (tokenizer.json of the model repo)
//   - a tokenizer.json file already on disk

use std::path::Path;
use tokenizers::Tokenizer;

use crate::domain::error::PipelineError;
use crate::infra::hub::HubClient;

pub struct TokenizerStore<'a> {
    hub: &'a HubClient,
}

impl<'a> TokenizerStore<'a> {
    pub fn new(hub: &'a HubClient) -> Self {
        Self { hub }
    }

    /// Download (or reuse the cached) tokenizer of `model_id`
    pub fn load_pretrained(&self, model_id: &str) -> Result<Tokenizer, PipelineError> {
        let path = self.hub.model_file(model_id, "tokenizer.json")?;
        tracing::info!("Loading tokenizer for '{}'", model_id);
        Self::load_file(&path)
    }

    /// Load a tokenizer.json from disk
    pub fn load_file(path: &Path) -> Result<Tokenizer, PipelineError> {
        Tokenizer::from_file(path).map_err(|e| {
            PipelineError::Tokenizer(format!("cannot load tokenizer from '{}': {e}", path.display()))
        })
    }
}

/// A tiny uncased WordPiece tokenizer with BERT special tokens,
/// enough to exercise preprocessing without any download.
#[cfg(test)]
pub(crate) fn tiny_wordpiece() -> Tokenizer {
    use std::str::FromStr;

    let words = [
        "the", "pixel", "shader", "render", "##s", "polygon", "church", "prayer", "faith", "god",
        "image", "graphics", "bible", "card", "video", "jesus",
    ];

    let mut vocab = serde_json::json!({
        "[PAD]":  0,
        "[UNK]":  1,
        "[CLS]":  2,
        "[SEP]":  3,
        "[MASK]": 4,
    });
    for (i, w) in words.iter().enumerate() {
        vocab[*w] = serde_json::json!(5 + i);
    }

    let special = |id: u32, content: &str| {
        serde_json::json!({
            "id": id, "content": content, "single_word": false, "lstrip": false,
            "rstrip": false, "normalized": false, "special": true
        })
    };

    let tokenizer_json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            special(0, "[PAD]"), special(1, "[UNK]"), special(2, "[CLS]"),
            special(3, "[SEP]"), special(4, "[MASK]")
        ],
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true
        },
        "pre_tokenizer": { "type": "BertPreTokenizer" },
        "post_processor": {
            "type": "TemplateProcessing",
            "single": [
                { "SpecialToken": { "id": "[CLS]", "type_id": 0 } },
                { "Sequence":     { "id": "A",     "type_id": 0 } },
                { "SpecialToken": { "id": "[SEP]", "type_id": 0 } }
            ],
            "pair": [
                { "SpecialToken": { "id": "[CLS]", "type_id": 0 } },
                { "Sequence":     { "id": "A",     "type_id": 0 } },
                { "SpecialToken": { "id": "[SEP]", "type_id": 0 } },
                { "Sequence":     { "id": "B",     "type_id": 1 } },
                { "SpecialToken": { "id": "[SEP]", "type_id": 1 } }
            ],
            "special_tokens": {
                "[CLS]": { "id": "[CLS]", "ids": [2], "tokens": ["[CLS]"] },
                "[SEP]": { "id": "[SEP]", "ids": [3], "tokens": ["[SEP]"] }
            }
        },
        "decoder": null,
        "model": {
            "type": "WordPiece",
            "unk_token": "[UNK]",
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": vocab
        }
    });

    Tokenizer::from_str(&tokenizer_json.to_string()).expect("tiny tokenizer JSON is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiny_wordpiece_splits_subwords() {
        let tok = tiny_wordpiece();
        let enc = tok.encode("The shader renders", true).unwrap();
        assert_eq!(enc.get_tokens(), &["[CLS]", "the", "shader", "render", "##s", "[SEP]"]);
    }

    #[test]
    fn test_missing_file_is_tokenizer_error() {
        let result = TokenizerStore::load_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(PipelineError::Tokenizer(_))));
    }
}
