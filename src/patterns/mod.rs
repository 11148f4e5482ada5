use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::error::{Result, ScreenError};

pub const SMARTS_COLUMN: &str = "SMARTS";
pub const DEFAULT_NITROGEN_TABLE: &str = "nitrogen_summary_updated.csv";
pub const DEFAULT_SULFUR_TABLE: &str = "sulfur_summary_updated.csv";
pub const DEFAULT_PHOSPHORUS_TABLE: &str = "phosphorous_summary_updated.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementCategory {
    Nitrogen,
    Sulfur,
    Phosphorus,
}

impl ElementCategory {
    pub const ALL: [ElementCategory; 3] = [
        ElementCategory::Nitrogen,
        ElementCategory::Sulfur,
        ElementCategory::Phosphorus,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ElementCategory::Nitrogen => "N",
            ElementCategory::Sulfur => "S",
            ElementCategory::Phosphorus => "P",
        }
    }
}

impl fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct PatternTablePaths {
    pub nitrogen: PathBuf,
    pub sulfur: PathBuf,
    pub phosphorus: PathBuf,
}

impl Default for PatternTablePaths {
    fn default() -> Self {
        Self {
            nitrogen: PathBuf::from(DEFAULT_NITROGEN_TABLE),
            sulfur: PathBuf::from(DEFAULT_SULFUR_TABLE),
            phosphorus: PathBuf::from(DEFAULT_PHOSPHORUS_TABLE),
        }
    }
}

/// SMARTS patterns per element category, each in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternLibrary {
    pub nitrogen: Vec<String>,
    pub sulfur: Vec<String>,
    pub phosphorus: Vec<String>,
}

impl PatternLibrary {
    pub fn load(paths: &PatternTablePaths) -> Result<Self> {
        let library = Self {
            nitrogen: read_smarts_column(&paths.nitrogen)?,
            sulfur: read_smarts_column(&paths.sulfur)?,
            phosphorus: read_smarts_column(&paths.phosphorus)?,
        };

        log::info!(
            "loaded SMARTS patterns: {} N, {} S, {} P",
            library.nitrogen.len(),
            library.sulfur.len(),
            library.phosphorus.len()
        );

        Ok(library)
    }

    pub fn category(&self, category: ElementCategory) -> &[String] {
        match category {
            ElementCategory::Nitrogen => &self.nitrogen,
            ElementCategory::Sulfur => &self.sulfur,
            ElementCategory::Phosphorus => &self.phosphorus,
        }
    }

    /// All patterns in screening priority order: P, then S, then N. A pattern
    /// listed in several tables keeps its first position.
    pub fn priority_order(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.phosphorus
            .iter()
            .chain(&self.sulfur)
            .chain(&self.nitrogen)
            .filter(|p| seen.insert(p.as_str()))
            .cloned()
            .collect()
    }
}

pub fn read_smarts_column(path: &Path) -> Result<Vec<String>> {
    let table_error = |details: String| ScreenError::PatternTable {
        path: path.to_path_buf(),
        details,
    };

    let file = File::open(path).map_err(|e| ScreenError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let column = reader
        .headers()
        .map_err(|e| table_error(e.to_string()))?
        .iter()
        .position(|h| h.trim() == SMARTS_COLUMN)
        .ok_or_else(|| table_error(format!("no {SMARTS_COLUMN} column")))?;

    let mut patterns = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| table_error(format!("row {}: {}", row + 1, e)))?;
        match record.get(column).map(str::trim_end) {
            Some(smarts) if !smarts.is_empty() => patterns.push(smarts.to_string()),
            _ => log::warn!("{:?} row {}: empty SMARTS cell, skipped", path, row + 1),
        }
    }

    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let library = PatternLibrary {
            nitrogen: vec!["[NX3]".to_string(), "[#16][#7]".to_string()],
            sulfur: vec!["[SX2]".to_string(), "[#16][#7]".to_string()],
            phosphorus: vec!["[PX4]".to_string()],
        };

        assert_eq!(
            library.priority_order(),
            vec!["[PX4]", "[SX2]", "[#16][#7]", "[NX3]"]
        );
        assert_eq!(library.category(ElementCategory::Sulfur).len(), 2);
    }
}
