//! Greedy per-pattern diversity selection.
//!
//! Molecules are offered one at a time. Each is tested against the active
//! patterns in priority order and lands in the first pattern whose charge
//! bucket has room and holds nothing at or above the similarity threshold.
//! A pattern is retired as soon as its total reaches the per-pattern cap.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::{charge_bucket_key, molecule_entry, SelectionMap};
use crate::toolkit::Fingerprint;

pub const DEFAULT_N_MOLS: usize = 100;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionLimits {
    pub per_pattern: usize,
    pub per_bucket: usize,
    pub similarity_threshold: f64,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            per_pattern: DEFAULT_N_MOLS,
            per_bucket: DEFAULT_N_MOLS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offer {
    /// Canonical form already selected earlier in the run.
    Duplicate,
    /// No active pattern matched.
    NoMatch,
    /// At least one pattern matched, none had room for a dissimilar molecule.
    Rejected,
    Selected { pattern: String, bucket: String },
}

struct Selected {
    entry: String,
    fingerprint: Fingerprint,
}

#[derive(Default)]
struct PatternState {
    buckets: BTreeMap<String, Vec<Selected>>,
    total: usize,
}

/// Similarity between two fingerprints, in [0, 1].
pub type Similarity = fn(&Fingerprint, &Fingerprint) -> f64;

impl PatternState {
    fn accepts(
        &self,
        bucket: &str,
        fingerprint: &Fingerprint,
        limits: &SelectionLimits,
        similarity: Similarity,
    ) -> bool {
        if self.total >= limits.per_pattern {
            return false;
        }

        match self.buckets.get(bucket) {
            None => limits.per_bucket > 0,
            Some(selected) => {
                selected.len() < limits.per_bucket
                    && selected.iter().all(|s| {
                        similarity(&s.fingerprint, fingerprint) < limits.similarity_threshold
                    })
            }
        }
    }
}

/// End-of-run account of pattern coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchReport {
    /// Reached the per-pattern cap and were retired.
    pub filled: Vec<String>,
    /// Selected some molecules but never reached the cap.
    pub partial: Vec<String>,
    /// Never selected anything.
    pub unmatched: Vec<String>,
}

pub struct DiversitySelector {
    limits: SelectionLimits,
    similarity: Similarity,
    patterns: Vec<String>,
    states: Vec<PatternState>,
    active: Vec<usize>,
    selected: HashSet<String>,
}

impl DiversitySelector {
    pub fn new(patterns: Vec<String>, limits: SelectionLimits) -> Self {
        let states = patterns.iter().map(|_| PatternState::default()).collect();
        let active = if limits.per_pattern == 0 {
            Vec::new()
        } else {
            (0..patterns.len()).collect()
        };

        Self {
            limits,
            similarity: Fingerprint::tanimoto,
            patterns,
            states,
            active,
            selected: HashSet::new(),
        }
    }

    /// Replaces the default Tanimoto similarity.
    pub fn with_similarity(mut self, similarity: Similarity) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn num_active(&self) -> usize {
        self.active.len()
    }

    /// Every pattern is full; nothing else can be selected.
    pub fn is_exhausted(&self) -> bool {
        self.active.is_empty()
    }

    pub fn is_selected(&self, smiles: &str) -> bool {
        self.selected.contains(smiles)
    }

    pub fn num_selected(&self) -> usize {
        self.selected.len()
    }

    /// Offers a molecule by canonical SMILES.
    ///
    /// `matches(i)` tests pattern `i` (an index into [`Self::patterns`]).
    /// `describe()` yields net charge and fingerprint; it runs at most once, at
    /// the first matching pattern.
    pub fn offer<M, D>(
        &mut self,
        smiles: &str,
        source_id: &str,
        mut matches: M,
        mut describe: D,
    ) -> Offer
    where
        M: FnMut(usize) -> bool,
        D: FnMut() -> (i32, Fingerprint),
    {
        if self.selected.contains(smiles) {
            return Offer::Duplicate;
        }

        let mut description: Option<(String, Fingerprint)> = None;
        let mut position = 0;
        while position < self.active.len() {
            let idx = self.active[position];
            if !matches(idx) {
                position += 1;
                continue;
            }

            let (bucket, fingerprint) = description.get_or_insert_with(|| {
                let (net_charge, fingerprint) = describe();
                (charge_bucket_key(net_charge), fingerprint)
            });

            let state = &mut self.states[idx];
            if state.accepts(bucket, fingerprint, &self.limits, self.similarity) {
                state
                    .buckets
                    .entry(bucket.clone())
                    .or_default()
                    .push(Selected {
                        entry: molecule_entry(smiles, source_id),
                        fingerprint: fingerprint.clone(),
                    });
                state.total += 1;
                self.selected.insert(smiles.to_string());

                if state.total >= self.limits.per_pattern {
                    log::debug!("pattern {} is full, retiring it", self.patterns[idx]);
                    self.active.remove(position);
                }

                return Offer::Selected {
                    pattern: self.patterns[idx].clone(),
                    bucket: bucket.clone(),
                };
            }

            position += 1;
        }

        if description.is_some() {
            Offer::Rejected
        } else {
            Offer::NoMatch
        }
    }

    pub fn report(&self) -> MatchReport {
        let mut report = MatchReport::default();
        for (pattern, state) in self.patterns.iter().zip(&self.states) {
            if state.total == 0 {
                report.unmatched.push(pattern.clone());
            } else if state.total >= self.limits.per_pattern {
                report.filled.push(pattern.clone());
            } else {
                report.partial.push(pattern.clone());
            }
        }
        report
    }

    /// Patterns with at least one selection, bucketed entries in selection order.
    pub fn selection_map(&self) -> SelectionMap {
        self.patterns
            .iter()
            .zip(&self.states)
            .filter(|(_, state)| state.total > 0)
            .map(|(pattern, state)| {
                let buckets = state
                    .buckets
                    .iter()
                    .map(|(bucket, selected)| {
                        (
                            bucket.clone(),
                            selected.iter().map(|s| s.entry.clone()).collect(),
                        )
                    })
                    .collect();
                (pattern.clone(), buckets)
            })
            .collect()
    }
}
