// ============================================================
// Layer 2 — FetchUseCase
// ============================================================
// Acquires the train and test splits for the requested classes:
//
//   Step 1: Pick the corpus source    (Hub JSONL or local bydate tree)
//   Step 2: Select + label + shuffle  (Layer 4 - data)
//
// Used on its own by `fetch` to inspect the data, and as the
// first stage of TrainUseCase.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    cleaner::RemoveParts,
    loader::BydateDirCorpus,
    newsgroups::{fetch_subset, HubCorpus, SubsetRequest, DEFAULT_SEED},
    preprocessor::SequenceStats,
};
use crate::domain::{
    example::{LabeledSplit, Split},
    traits::CorpusSource,
};
use crate::infra::hub::HubClient;

/// The two classes the default run fine-tunes on.
pub const DEFAULT_CATEGORIES: [&str; 2] = ["comp.graphics", "soc.religion.christian"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub categories: Vec<String>,
    pub seed:       u64,
    /// Read an extracted 20news-bydate tree instead of the Hub
    pub corpus_dir: Option<PathBuf>,
    pub remove:     RemoveParts,
    pub cache_dir:  Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            seed:       DEFAULT_SEED,
            corpus_dir: None,
            remove:     RemoveParts::none(),
            cache_dir:  None,
        }
    }
}

/// Summary of one fetched split, for display.
#[derive(Debug, Clone)]
pub struct SplitSummary {
    pub split:  Split,
    pub counts: Vec<(String, usize)>,
    pub stats:  Option<SequenceStats>,
}

impl SplitSummary {
    pub fn of(split: &LabeledSplit) -> Self {
        Self {
            split:  split.split,
            counts: split.class_names.iter().cloned().zip(split.class_counts()).collect(),
            stats:  SequenceStats::from_texts(&split.texts()),
        }
    }
}

pub struct FetchUseCase {
    config: FetchConfig,
}

impl FetchUseCase {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Fetch both splits and summarise them
    pub fn execute(&self) -> Result<Vec<SplitSummary>> {
        let hub = HubClient::new(self.config.cache_dir.as_deref())?;
        let (train, test) = self.fetch(&hub)?;
        Ok(vec![SplitSummary::of(&train), SplitSummary::of(&test)])
    }

    /// Train and test splits sharing one class-name list
    pub fn fetch(&self, hub: &HubClient) -> Result<(LabeledSplit, LabeledSplit)> {
        let cfg = &self.config;

        let source: Box<dyn CorpusSource + '_> = match &cfg.corpus_dir {
            Some(dir) => {
                tracing::info!("Reading corpus from '{}'", dir.display());
                Box::new(BydateDirCorpus::new(dir.clone()))
            }
            None => Box::new(HubCorpus::new(hub)),
        };

        let request = |split| {
            SubsetRequest::new(&cfg.categories, split)
                .with_seed(cfg.seed)
                .with_remove(cfg.remove)
        };

        let train = fetch_subset(source.as_ref(), &request(Split::Train))
            .context("Failed to fetch the train split")?;
        let test = fetch_subset(source.as_ref(), &request(Split::Test))
            .context("Failed to fetch the test split")?;
        Ok((train, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn bydate_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for split in ["20news-bydate-train", "20news-bydate-test"] {
            for (cat, body) in [("comp.graphics", "pixel shader"), ("soc.religion.christian", "church prayer"), ("sci.space", "orbit")] {
                let dir = tmp.path().join(split).join(cat);
                fs::create_dir_all(&dir).unwrap();
                for i in 0..3 {
                    fs::write(dir.join(format!("{}", 1000 + i)), format!("{body} {i}")).unwrap();
                }
            }
        }
        tmp
    }

    #[test]
    fn test_fetch_from_local_tree() {
        let tmp = bydate_tree();
        let cfg = FetchConfig { corpus_dir: Some(tmp.path().to_path_buf()), ..FetchConfig::default() };
        let hub = HubClient::new(Some(tmp.path())).unwrap();

        let (train, test) = FetchUseCase::new(cfg).fetch(&hub).unwrap();
        assert_eq!(train.len(), 6);
        assert_eq!(test.len(), 6);
        assert_eq!(train.class_names, test.class_names);
        assert_eq!(train.class_names, DEFAULT_CATEGORIES);
    }

    #[test]
    fn test_summary_counts() {
        let tmp = bydate_tree();
        let cfg = FetchConfig { corpus_dir: Some(tmp.path().to_path_buf()), ..FetchConfig::default() };
        let hub = HubClient::new(Some(tmp.path())).unwrap();
        let (train, _) = FetchUseCase::new(cfg).fetch(&hub).unwrap();

        let summary = SplitSummary::of(&train);
        assert_eq!(summary.split, Split::Train);
        assert_eq!(summary.counts, vec![("comp.graphics".to_string(), 3), ("soc.religion.christian".to_string(), 3)]);
        assert_eq!(summary.stats.unwrap().max, 3);
    }
}
