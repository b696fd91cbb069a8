// ============================================================
// Layer 4 — Local Corpus Loader
// ============================================================
// Reads an extracted copy of the "bydate" 20 Newsgroups archive:
//
//   <root>/
//     20news-bydate-train/
//       alt.atheism/49960
//       alt.atheism/51060
//       ...
//       comp.graphics/37261
//     20news-bydate-test/
//       ...
//
// One directory per category, one file per post. Directories and
// files are visited in sorted order so the record order is stable
// across machines and runs.
//
// Posts are not valid UTF-8 throughout; every byte is decoded as
// Latin-1, which never fails.
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::PipelineError;
use crate::domain::example::Split;
use crate::domain::traits::{CorpusSource, RawRecord};

/// Corpus backed by a local `20news-bydate-{train,test}` tree.
pub struct BydateDirCorpus {
    root: PathBuf,
}

impl BydateDirCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn split_dir(&self, split: Split) -> PathBuf {
        self.root.join(format!("20news-bydate-{split}"))
    }
}

impl CorpusSource for BydateDirCorpus {
    fn category_names(&self) -> Result<Vec<String>, PipelineError> {
        let dir = self.split_dir(Split::Train);
        Ok(sorted_entries(&dir, true)?
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect())
    }

    fn records(&self, split: Split) -> Result<Vec<RawRecord>, PipelineError> {
        let dir = self.split_dir(split);
        let mut records = Vec::new();

        for category_dir in sorted_entries(&dir, true)? {
            let category = match category_dir.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None       => continue,
            };

            for path in sorted_entries(&category_dir, false)? {
                match fs::read(&path) {
                    Ok(bytes) => records.push((category.clone(), decode_latin1(&bytes))),
                    // One unreadable post should not sink the whole corpus
                    Err(e) => tracing::warn!("Skipping '{}': {}", path.display(), e),
                }
            }
        }

        tracing::debug!("Read {} {} records from '{}'", records.len(), split, dir.display());
        Ok(records)
    }
}

/// Sorted child paths of `dir`, keeping only directories or only files.
fn sorted_entries(dir: &Path, want_dirs: bool) -> Result<Vec<PathBuf>, PipelineError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        PipelineError::data_unavailable(format!("cannot read '{}': {e}", dir.display()))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| PipelineError::data_unavailable(format!("cannot list '{}': {e}", dir.display())))?
            .path();
        if path.is_dir() == want_dirs {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Map every byte to the Unicode code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_post(root: &Path, split: &str, category: &str, name: &str, body: &[u8]) {
        let dir = root.join(format!("20news-bydate-{split}")).join(category);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_reads_categories_and_records_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(tmp.path(), "train", "sci.space", "2", b"orbit");
        write_post(tmp.path(), "train", "comp.graphics", "9", b"pixels");
        write_post(tmp.path(), "train", "comp.graphics", "10", b"shaders");
        write_post(tmp.path(), "test", "sci.space", "5", b"rocket");

        let corpus = BydateDirCorpus::new(tmp.path());
        assert_eq!(corpus.category_names().unwrap(), vec!["comp.graphics", "sci.space"]);

        let train = corpus.records(Split::Train).unwrap();
        let texts: Vec<&str> = train.iter().map(|(_, t)| t.as_str()).collect();
        // File names sort lexicographically: "10" before "9"
        assert_eq!(texts, vec!["shaders", "pixels", "orbit"]);

        let test = corpus.records(Split::Test).unwrap();
        assert_eq!(test, vec![("sci.space".to_string(), "rocket".to_string())]);
    }

    #[test]
    fn test_missing_directory_is_data_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let corpus = BydateDirCorpus::new(tmp.path().join("nowhere"));
        let err = corpus.records(Split::Train).unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
    }

    #[test]
    fn test_latin1_decoding() {
        assert_eq!(decode_latin1(b"caf\xe9"), "café");
    }
}
