use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::error::{Result, ScreenError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Objects merged one level deep, later files overwrite bucket keys.
    ShallowOverwrite,
    /// Lists under the same pattern and bucket are concatenated in file order.
    #[default]
    NestedAppend,
    /// Every pattern maps to a list; lists are extended, other values pushed.
    FlatAppend,
}

impl MergePolicy {
    pub const NAMES: [&'static str; 3] = ["shallow-overwrite", "nested-append", "flat-append"];

    pub fn name(&self) -> &'static str {
        match self {
            MergePolicy::ShallowOverwrite => Self::NAMES[0],
            MergePolicy::NestedAppend => Self::NAMES[1],
            MergePolicy::FlatAppend => Self::NAMES[2],
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "shallow-overwrite" => Ok(MergePolicy::ShallowOverwrite),
            "nested-append" => Ok(MergePolicy::NestedAppend),
            "flat-append" => Ok(MergePolicy::FlatAppend),
            other => Err(format!(
                "unknown merge policy '{other}', expected one of {}",
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Folds one batch mapping into `merged`. `source` is only used for error messages.
pub fn merge_into(
    merged: &mut Map<String, Value>,
    batch: Map<String, Value>,
    policy: MergePolicy,
    source: &Path,
) -> Result<()> {
    for (pattern, value) in batch {
        match policy {
            MergePolicy::ShallowOverwrite => match value {
                Value::Object(buckets) => {
                    let slot = merged
                        .entry(pattern.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                    match slot {
                        Value::Object(existing) => existing.extend(buckets),
                        other => *other = Value::Object(buckets),
                    }
                }
                other => {
                    merged.insert(pattern, other);
                }
            },
            MergePolicy::NestedAppend => {
                let Some(existing) = merged.get_mut(&pattern) else {
                    merged.insert(pattern, value);
                    continue;
                };
                match (existing, value) {
                    (Value::Object(existing), Value::Object(buckets)) => {
                        for (bucket, entries) in buckets {
                            append_entries(existing, &pattern, bucket, entries, source)?;
                        }
                    }
                    (Value::Array(existing), Value::Array(entries)) => {
                        existing.extend(entries);
                    }
                    (existing, value) => {
                        return Err(ScreenError::MergeConflict {
                            key: pattern.clone(),
                            path: source.to_path_buf(),
                            details: format!(
                                "cannot append {} to {}",
                                value_kind(&value),
                                value_kind(existing)
                            ),
                        });
                    }
                }
            }
            MergePolicy::FlatAppend => {
                let slot = merged
                    .entry(pattern)
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !slot.is_array() {
                    let previous = slot.take();
                    *slot = Value::Array(vec![previous]);
                }
                if let Value::Array(existing) = slot {
                    match value {
                        Value::Array(entries) => existing.extend(entries),
                        other => existing.push(other),
                    }
                }
            }
        }
    }

    Ok(())
}

fn append_entries(
    existing: &mut Map<String, Value>,
    pattern: &str,
    bucket: String,
    entries: Value,
    source: &Path,
) -> Result<()> {
    let Some(current) = existing.get_mut(&bucket) else {
        existing.insert(bucket, entries);
        return Ok(());
    };
    match (current, entries) {
        (Value::Array(current), Value::Array(entries)) => current.extend(entries),
        (current, entries) => {
            return Err(ScreenError::MergeConflict {
                key: format!("{pattern} / {bucket}"),
                path: source.to_path_buf(),
                details: format!(
                    "cannot append {} to {}",
                    value_kind(&entries),
                    value_kind(current)
                ),
            })
        }
    }
    Ok(())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

pub fn read_batch(path: &Path) -> Result<Map<String, Value>> {
    let contents = std::fs::read_to_string(path).map_err(|e| ScreenError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| ScreenError::json(path, e))
}

/// Every `*.json` file directly inside `dir`, sorted by file name.
pub fn list_batches(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)
        .map_err(|e| ScreenError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()).map_err(|e| ScreenError::io(dir, e)))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
        })
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}

/// Reads the batches in parallel and folds them in the given order.
pub fn merge_batches(paths: &[PathBuf], policy: MergePolicy) -> Result<Map<String, Value>> {
    let batches = paths
        .par_iter()
        .map(|path| read_batch(path))
        .collect::<Result<Vec<_>>>()?;

    let mut merged = Map::new();
    for (path, batch) in paths.iter().zip(batches) {
        log::debug!("merging {:?} ({} patterns)", path, batch.len());
        merge_into(&mut merged, batch, policy, path)?;
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn fold(batches: Vec<Value>, policy: MergePolicy) -> Result<Map<String, Value>> {
        let mut merged = Map::new();
        for batch in batches {
            merge_into(&mut merged, object(batch), policy, Path::new("batch.json"))?;
        }
        Ok(merged)
    }

    #[test]
    fn test_policy_names_round_trip() {
        for name in MergePolicy::NAMES {
            assert_eq!(name.parse::<MergePolicy>().unwrap().name(), name);
        }
        assert!("deep".parse::<MergePolicy>().is_err());
    }

    #[test]
    fn test_shallow_overwrite() {
        let merged = fold(
            vec![
                json!({"[#7]": {"net_abs_charge_0": ["A"], "net_abs_charge_1": ["B"]}}),
                json!({"[#7]": {"net_abs_charge_0": ["C"]}, "[#16]": ["D"]}),
            ],
            MergePolicy::ShallowOverwrite,
        )
        .unwrap();

        assert_eq!(
            Value::Object(merged),
            json!({
                "[#7]": {"net_abs_charge_0": ["C"], "net_abs_charge_1": ["B"]},
                "[#16]": ["D"]
            })
        );
    }

    #[test]
    fn test_nested_append_conflict() {
        let err = fold(
            vec![
                json!({"[#7]": {"net_abs_charge_0": ["A"]}}),
                json!({"[#7]": ["B"]}),
            ],
            MergePolicy::NestedAppend,
        )
        .unwrap_err();
        assert!(matches!(err, ScreenError::MergeConflict { .. }));
    }

    #[test]
    fn test_flat_append() {
        let merged = fold(
            vec![
                json!({"[#7]": ["A"], "[#15]": "lonely"}),
                json!({"[#7]": ["B", "C"], "[#15]": {"net_abs_charge_0": ["D"]}}),
            ],
            MergePolicy::FlatAppend,
        )
        .unwrap();

        assert_eq!(merged["[#7]"], json!(["A", "B", "C"]));
        assert_eq!(
            merged["[#15]"],
            json!(["lonely", {"net_abs_charge_0": ["D"]}])
        );
    }
}
