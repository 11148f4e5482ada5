use std::path::PathBuf;

use serde_json::Value;

use crate::error::Result;
use crate::output::write_json;
use crate::selection::merge::{list_batches, merge_batches};
use crate::selection::MergePolicy;

pub const DEFAULT_INPUT_DIR: &str = "./individual_json_files";
pub const DEFAULT_OUTPUT: &str = "pubchem_NSP_search.json";

#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub policy: MergePolicy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT),
            policy: MergePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    pub files: usize,
    pub patterns: usize,
    pub entries: usize,
}

pub fn run(config: &MergeConfig) -> Result<MergeSummary> {
    let batches = list_batches(&config.input_dir)?;
    log::info!(
        "merging {} batch files from {:?} with policy {}",
        batches.len(),
        config.input_dir,
        config.policy
    );

    let merged = merge_batches(&batches, config.policy)?;
    let summary = MergeSummary {
        files: batches.len(),
        patterns: merged.len(),
        entries: merged.values().map(count_entries).sum(),
    };

    write_json(&merged, &config.output)?;
    log::info!(
        "Merged JSON written to {:?}: {} patterns, {} molecule entries",
        config.output,
        summary.patterns,
        summary.entries
    );

    Ok(summary)
}

fn count_entries(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.iter().map(count_entries).sum(),
        Value::Object(map) => map.values().map(count_entries).sum(),
        Value::Null => 0,
        _ => 1,
    }
}
