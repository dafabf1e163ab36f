use std::collections::HashMap;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use tracing::debug;

/// One entry of the class-index JSON. Both common layouts are accepted:
/// `"0": "tench"` and `"0": ["n01440764", "tench"]` (wnid + label).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelEntry {
    Plain(String),
    Tagged(Vec<String>),
}

impl LabelEntry {
    fn label(self) -> Option<String> {
        match self {
            LabelEntry::Plain(s) => Some(s),
            LabelEntry::Tagged(parts) => parts.into_iter().last(),
        }
    }
}

/// Load a JSON object mapping class-index strings to labels into an
/// index-ordered vector. Missing indices render as a placeholder rather
/// than failing; non-numeric keys are rejected.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open label map {path:?}"))?;
    let raw: HashMap<String, LabelEntry> =
        serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("failed to parse label map {path:?}"))?;
    ensure!(!raw.is_empty(), "label map {path:?} is empty");

    let mut indexed = Vec::with_capacity(raw.len());
    let mut max_index = 0usize;
    for (key, entry) in raw {
        let index: usize = key
            .parse()
            .with_context(|| format!("non-numeric class index `{key}` in {path:?}"))?;
        max_index = max_index.max(index);
        let label = entry
            .label()
            .with_context(|| format!("empty label entry for class {index}"))?;
        indexed.push((index, label));
    }

    let mut labels = vec![String::from("<unknown>"); max_index + 1];
    for (index, label) in indexed {
        labels[index] = label;
    }

    debug!(classes = labels.len(), "loaded label map");
    Ok(labels)
}
