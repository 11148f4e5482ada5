use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{charge_bucket_key, compare_bucket_keys};

pub const DEFAULT_N_MOLS_SET1: usize = 10;
pub const DEFAULT_N_MOLS_SET2: usize = 10;

/// Round-robin passes over the charge buckets when filling set 2.
pub const SET2_PASSES: usize = 2;

/// A pattern's candidates as found in a merged mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternCandidates {
    Flat(Vec<String>),
    Bucketed(BTreeMap<String, Vec<String>>),
}

impl PatternCandidates {
    /// All entries, buckets visited neutral first.
    pub fn entries(&self) -> Vec<&str> {
        match self {
            PatternCandidates::Flat(entries) => entries.iter().map(String::as_str).collect(),
            PatternCandidates::Bucketed(buckets) => sorted_buckets(buckets)
                .into_iter()
                .flat_map(|(_, entries)| entries.iter().map(String::as_str))
                .collect(),
        }
    }
}

fn sorted_buckets(buckets: &BTreeMap<String, Vec<String>>) -> Vec<(&str, &Vec<String>)> {
    let mut sorted = buckets
        .iter()
        .map(|(key, entries)| (key.as_str(), entries))
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| compare_bucket_keys(a.0, b.0));
    sorted
}

/// Outcome of re-validating one candidate entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted { canonical: String, net_charge: i32 },
    Rejected(String),
    Unparseable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitPolicy {
    /// First `set1` valid molecules in list order, then the next `set2`.
    #[default]
    Simple,
    /// Set 1 favours the neutral bucket, set 2 spreads across charge buckets.
    ChargeAware,
}

impl SplitPolicy {
    pub const NAMES: [&'static str; 2] = ["simple", "charge-aware"];

    pub fn name(&self) -> &'static str {
        match self {
            SplitPolicy::Simple => Self::NAMES[0],
            SplitPolicy::ChargeAware => Self::NAMES[1],
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(SplitPolicy::Simple),
            "charge-aware" => Ok(SplitPolicy::ChargeAware),
            other => Err(format!(
                "unknown split policy '{other}', expected one of {}",
                Self::NAMES.join(", ")
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLimits {
    pub set1: usize,
    pub set2: usize,
}

impl Default for SplitLimits {
    fn default() -> Self {
        Self {
            set1: DEFAULT_N_MOLS_SET1,
            set2: DEFAULT_N_MOLS_SET2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternSplit {
    pub set1: Vec<String>,
    pub set2: Vec<String>,
}

/// Splits patterns one after another, sharing one dedup set so that no
/// molecule lands in two places.
pub struct SetSplitter<'a> {
    policy: SplitPolicy,
    limits: SplitLimits,
    verdicts: &'a HashMap<String, Verdict>,
    used: HashSet<String>,
}

impl<'a> SetSplitter<'a> {
    pub fn new(
        policy: SplitPolicy,
        limits: SplitLimits,
        verdicts: &'a HashMap<String, Verdict>,
    ) -> Self {
        Self {
            policy,
            limits,
            verdicts,
            used: HashSet::new(),
        }
    }

    pub fn num_used(&self) -> usize {
        self.used.len()
    }

    pub fn split(&mut self, candidates: &PatternCandidates) -> PatternSplit {
        match self.policy {
            SplitPolicy::Simple => self.split_simple(candidates),
            SplitPolicy::ChargeAware => self.split_charge_aware(candidates),
        }
    }

    /// Claims `entry` if it validated and its canonical form is still unused.
    fn claim(&mut self, entry: &str) -> bool {
        match self.verdicts.get(entry) {
            Some(Verdict::Accepted { canonical, .. }) => self.used.insert(canonical.clone()),
            _ => false,
        }
    }

    fn is_available(&self, entry: &str) -> bool {
        match self.verdicts.get(entry) {
            Some(Verdict::Accepted { canonical, .. }) => !self.used.contains(canonical),
            _ => false,
        }
    }

    fn split_simple(&mut self, candidates: &PatternCandidates) -> PatternSplit {
        let mut split = PatternSplit::default();
        let total = self.limits.set1 + self.limits.set2;

        for entry in candidates.entries() {
            if split.set1.len() + split.set2.len() == total {
                break;
            }
            if !self.claim(entry) {
                continue;
            }
            if split.set1.len() < self.limits.set1 {
                split.set1.push(entry.to_string());
            } else {
                split.set2.push(entry.to_string());
            }
        }

        split
    }

    fn charge_buckets<'c>(&self, candidates: &'c PatternCandidates) -> Vec<Vec<&'c str>> {
        match candidates {
            PatternCandidates::Bucketed(buckets) => sorted_buckets(buckets)
                .into_iter()
                .map(|(_, entries)| entries.iter().map(String::as_str).collect())
                .collect(),
            PatternCandidates::Flat(entries) => {
                // bucket by the charge found on re-parsing
                let mut buckets: BTreeMap<String, Vec<&'c str>> = BTreeMap::new();
                for entry in entries {
                    if let Some(Verdict::Accepted { net_charge, .. }) = self.verdicts.get(entry) {
                        buckets
                            .entry(charge_bucket_key(*net_charge))
                            .or_default()
                            .push(entry.as_str());
                    }
                }
                let mut sorted = buckets.into_iter().collect::<Vec<_>>();
                sorted.sort_by(|a, b| compare_bucket_keys(&a.0, &b.0));
                sorted.into_iter().map(|(_, entries)| entries).collect()
            }
        }
    }

    fn split_charge_aware(&mut self, candidates: &PatternCandidates) -> PatternSplit {
        let mut split = PatternSplit::default();
        let buckets = self.charge_buckets(candidates);

        'set1: for bucket in &buckets {
            for entry in bucket {
                if split.set1.len() == self.limits.set1 {
                    break 'set1;
                }
                if self.claim(entry) {
                    split.set1.push(entry.to_string());
                }
            }
        }

        'set2: for _ in 0..SET2_PASSES {
            for bucket in &buckets {
                if split.set2.len() == self.limits.set2 {
                    break 'set2;
                }
                if let Some(entry) = bucket.iter().find(|entry| self.is_available(entry)) {
                    self.claim(entry);
                    split.set2.push(entry.to_string());
                }
            }
        }

        split
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(entries: &[&str], net_charge: i32) -> HashMap<String, Verdict> {
        entries
            .iter()
            .map(|e| {
                (
                    e.to_string(),
                    Verdict::Accepted {
                        canonical: e.to_string(),
                        net_charge,
                    },
                )
            })
            .collect()
    }

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn test_untagged_candidates() {
        let flat: PatternCandidates = serde_json::from_str(r#"["A", "B"]"#).unwrap();
        assert_eq!(flat.entries(), vec!["A", "B"]);

        let bucketed: PatternCandidates = serde_json::from_str(
            r#"{"net_abs_charge_1": ["B"], "net_abs_charge_0": ["A"], "net_abs_charge_10": ["C"]}"#,
        )
        .unwrap();
        assert_eq!(bucketed.entries(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_simple_split() {
        let entries = names("M", 25);
        let refs = entries.iter().map(String::as_str).collect::<Vec<_>>();
        let verdicts = accepted(&refs, 0);
        let mut splitter = SetSplitter::new(SplitPolicy::Simple, SplitLimits::default(), &verdicts);

        let split = splitter.split(&PatternCandidates::Flat(entries.clone()));
        assert_eq!(split.set1, entries[..10].to_vec());
        assert_eq!(split.set2, entries[10..20].to_vec());
    }

    #[test]
    fn test_simple_split_skips_invalid_and_used() {
        let mut verdicts = accepted(&["A", "B", "C", "D"], 0);
        verdicts.insert("X".to_string(), Verdict::Unparseable("bad".to_string()));
        verdicts.insert("Y".to_string(), Verdict::Rejected("too big".to_string()));
        let limits = SplitLimits { set1: 2, set2: 1 };
        let mut splitter = SetSplitter::new(SplitPolicy::Simple, limits, &verdicts);

        let first = splitter.split(&PatternCandidates::Flat(
            ["A", "X", "Y", "B"].iter().map(|s| s.to_string()).collect(),
        ));
        assert_eq!(first.set1, vec!["A", "B"]);
        assert!(first.set2.is_empty());

        let second = splitter.split(&PatternCandidates::Flat(
            ["B", "C", "D", "A"].iter().map(|s| s.to_string()).collect(),
        ));
        assert_eq!(second.set1, vec!["C", "D"]);
        assert!(second.set2.is_empty());
        assert_eq!(splitter.num_used(), 4);
    }

    #[test]
    fn test_charge_aware_single_bucket() {
        let entries = names("M", 15);
        let refs = entries.iter().map(String::as_str).collect::<Vec<_>>();
        let verdicts = accepted(&refs, 0);
        let limits = SplitLimits { set1: 10, set2: 20 };
        let mut splitter = SetSplitter::new(SplitPolicy::ChargeAware, limits, &verdicts);

        let candidates =
            PatternCandidates::Bucketed(BTreeMap::from([("net_abs_charge_0".to_string(), entries.clone())]));
        let split = splitter.split(&candidates);
        assert_eq!(split.set1, entries[..10].to_vec());
        assert_eq!(split.set2, entries[10..12].to_vec());
    }

    #[test]
    fn test_charge_aware_prefers_neutral_then_spreads() {
        let neutral = names("N", 6);
        let plus_one = names("P", 4);
        let plus_two = names("Q", 3);
        let mut verdicts = HashMap::new();
        for (entries, charge) in [(&neutral, 0), (&plus_one, 1), (&plus_two, 2)] {
            let refs = entries.iter().map(String::as_str).collect::<Vec<_>>();
            verdicts.extend(accepted(&refs, charge));
        }

        let candidates = PatternCandidates::Bucketed(BTreeMap::from([
            ("net_abs_charge_2".to_string(), plus_two.clone()),
            ("net_abs_charge_0".to_string(), neutral.clone()),
            ("net_abs_charge_1".to_string(), plus_one.clone()),
        ]));

        let limits = SplitLimits { set1: 8, set2: 5 };
        let mut splitter = SetSplitter::new(SplitPolicy::ChargeAware, limits, &verdicts);
        let split = splitter.split(&candidates);

        assert_eq!(split.set1, vec!["N0", "N1", "N2", "N3", "N4", "N5", "P0", "P1"]);
        // pass 1: P2, Q0 (neutral exhausted); pass 2: P3, Q1
        assert_eq!(split.set2, vec!["P2", "Q0", "P3", "Q1"]);
    }

    #[test]
    fn test_charge_aware_flat_input_bucketed_by_charge() {
        let mut verdicts = accepted(&["A", "B", "C"], 0);
        verdicts.extend(accepted(&["D", "E"], -1));

        let candidates = PatternCandidates::Flat(
            ["D", "A", "E", "B", "C"].iter().map(|s| s.to_string()).collect(),
        );
        let limits = SplitLimits { set1: 2, set2: 4 };
        let mut splitter = SetSplitter::new(SplitPolicy::ChargeAware, limits, &verdicts);
        let split = splitter.split(&candidates);

        assert_eq!(split.set1, vec!["A", "B"]);
        assert_eq!(split.set2, vec!["C", "D", "E"]);
    }

    #[test]
    fn test_policy_names() {
        assert_eq!("charge-aware".parse::<SplitPolicy>(), Ok(SplitPolicy::ChargeAware));
        assert!("random".parse::<SplitPolicy>().is_err());
    }
}
