// ============================================================
// Layer 4 — 20 Newsgroups Subset Selection
// ============================================================
// Turns a raw corpus (category, text) stream into a LabeledSplit
// restricted to the requested categories:
//
//   1. Check every requested category exists in the corpus
//   2. class_names = requested categories, sorted and deduplicated
//   3. Keep matching records, label = index into class_names
//   4. Optionally strip headers / footers / quotes
//   5. Shuffle deterministically with the given seed
//
// Sorting the class names means "comp.graphics" is always label 0
// and "soc.religion.christian" label 1, whichever order the caller
// listed them in. Train and test therefore agree on the mapping.
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Deserialize;
use std::fs;

use crate::data::cleaner::{RemoveParts, TextCleaner};
use crate::domain::error::PipelineError;
use crate::domain::example::{Example, LabeledSplit, Split};
use crate::domain::traits::{CorpusSource, RawRecord};
use crate::infra::hub::HubClient;

/// Dataset repository mirroring the bydate 20 Newsgroups splits.
pub const HUB_DATASET_REPO: &str = "SetFit/20_newsgroups";

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 42;

/// The twenty categories, in corpus order.
pub const NEWSGROUP_CATEGORIES: [&str; 20] = [
    "alt.atheism",
    "comp.graphics",
    "comp.os.ms-windows.misc",
    "comp.sys.ibm.pc.hardware",
    "comp.sys.mac.hardware",
    "comp.windows.x",
    "misc.forsale",
    "rec.autos",
    "rec.motorcycles",
    "rec.sport.baseball",
    "rec.sport.hockey",
    "sci.crypt",
    "sci.electronics",
    "sci.med",
    "sci.space",
    "soc.religion.christian",
    "talk.politics.guns",
    "talk.politics.mideast",
    "talk.politics.misc",
    "talk.religion.misc",
];

/// What to fetch: which classes, which split, and how to order it.
#[derive(Debug, Clone)]
pub struct SubsetRequest {
    pub categories: Vec<String>,
    pub split:      Split,
    pub shuffle:    bool,
    pub seed:       u64,
    pub remove:     RemoveParts,
}

impl SubsetRequest {
    pub fn new(categories: &[String], split: Split) -> Self {
        Self {
            categories: categories.to_vec(),
            split,
            shuffle: true,
            seed:    DEFAULT_SEED,
            remove:  RemoveParts::none(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_remove(mut self, remove: RemoveParts) -> Self {
        self.remove = remove;
        self
    }
}

/// Fetch the examples of `request.categories` from one split.
pub fn fetch_subset<S>(source: &S, request: &SubsetRequest) -> Result<LabeledSplit, PipelineError>
where
    S: CorpusSource + ?Sized,
{
    if request.categories.is_empty() {
        return Err(PipelineError::data_unavailable("no categories requested"));
    }

    let known = source.category_names()?;
    if let Some(missing) = request.categories.iter().find(|c| !known.contains(*c)) {
        return Err(PipelineError::data_unavailable(format!(
            "category '{missing}' does not exist in the corpus"
        )));
    }

    let mut class_names = request.categories.clone();
    class_names.sort();
    class_names.dedup();

    let cleaner = TextCleaner::new(request.remove).with_normalize(request.remove.any());

    let mut examples: Vec<Example> = source
        .records(request.split)?
        .into_iter()
        .filter_map(|(category, text)| {
            let label = class_names.iter().position(|c| *c == category)?;
            let text = if cleaner.is_noop() { text } else { cleaner.clean(&text) };
            Some(Example::new(text, label))
        })
        .collect();

    if examples.is_empty() {
        return Err(PipelineError::data_unavailable(format!(
            "no {} documents found for {:?}",
            request.split, class_names
        )));
    }

    if request.shuffle {
        let mut rng = StdRng::seed_from_u64(request.seed);
        examples.shuffle(&mut rng);
    }

    let split = LabeledSplit { split: request.split, examples, class_names };
    tracing::info!(
        "Fetched {} {} documents ({})",
        split.len(),
        request.split,
        split
            .class_names
            .iter()
            .zip(split.class_counts())
            .map(|(name, n)| format!("{name}: {n}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(split)
}

// ─── Hub-backed corpus ────────────────────────────────────────────────────────

/// One line of the Hub JSONL files.
#[derive(Debug, Deserialize)]
struct HubRecord {
    text:       String,
    label_text: String,
}

/// Corpus downloaded from a HuggingFace dataset repository holding
/// `train.jsonl` and `test.jsonl`.
pub struct HubCorpus<'a> {
    hub:  &'a HubClient,
    repo: String,
}

impl<'a> HubCorpus<'a> {
    pub fn new(hub: &'a HubClient) -> Self {
        Self::with_repo(hub, HUB_DATASET_REPO)
    }

    pub fn with_repo(hub: &'a HubClient, repo: impl Into<String>) -> Self {
        Self { hub, repo: repo.into() }
    }
}

impl CorpusSource for HubCorpus<'_> {
    fn category_names(&self) -> Result<Vec<String>, PipelineError> {
        Ok(NEWSGROUP_CATEGORIES.iter().map(|c| c.to_string()).collect())
    }

    fn records(&self, split: Split) -> Result<Vec<RawRecord>, PipelineError> {
        let path = self.hub.dataset_file(&self.repo, &format!("{split}.jsonl"))?;
        let raw = fs::read_to_string(&path).map_err(|e| {
            PipelineError::data_unavailable(format!("cannot read '{}': {e}", path.display()))
        })?;
        parse_jsonl(&raw).map_err(|(line, e)| {
            PipelineError::data_unavailable(format!("{}:{line}: {e}", path.display()))
        })
    }
}

/// Parse JSONL records, reporting the 1-based line of the first bad one.
fn parse_jsonl(raw: &str) -> Result<Vec<RawRecord>, (usize, serde_json::Error)> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<HubRecord>(line)
                .map(|r| (r.label_text, r.text))
                .map_err(|e| (n + 1, e))
        })
        .collect()
}
