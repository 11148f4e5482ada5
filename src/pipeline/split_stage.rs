use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use rayon::prelude::*;

use crate::error::{Result, ScreenError};
use crate::output::{ensure_dir, write_json, write_smiles};
use crate::patterns::{ElementCategory, PatternLibrary, PatternTablePaths};
use crate::selection::{
    entry_smiles, PatternCandidates, SetSplitter, SplitLimits, SplitPolicy, Verdict,
};
use crate::toolkit::{MolFilter, Toolkit};

pub const DEFAULT_INPUT: &str = "pubchem_NSP_search.json";
pub const DEFAULT_MAX_HEAVY_ATOMS: u32 = 40;
pub const DEFAULT_PREFIX: &str = "pubchem_NSP_search";

#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub input: PathBuf,
    pub patterns: PatternTablePaths,
    pub filter: PathBuf,
    pub output_dir: PathBuf,
    pub policy: SplitPolicy,
    pub limits: SplitLimits,
    pub max_heavy_atoms: Option<u32>,
    pub prefix: String,
}

impl SplitConfig {
    pub fn new(filter: impl Into<PathBuf>) -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            patterns: PatternTablePaths::default(),
            filter: filter.into(),
            output_dir: PathBuf::from("."),
            policy: SplitPolicy::default(),
            limits: SplitLimits::default(),
            max_heavy_atoms: Some(DEFAULT_MAX_HEAVY_ATOMS),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    fn heavy_atom_label(&self) -> String {
        match self.max_heavy_atoms {
            Some(n) => n.to_string(),
            None => "all".to_string(),
        }
    }

    pub fn set_json_path(&self, set: usize, n_mols: usize) -> PathBuf {
        self.output_dir.join(format!(
            "{}_upto_{}_hac_{}_mols_set{}.json",
            self.prefix,
            self.heavy_atom_label(),
            n_mols,
            set
        ))
    }

    pub fn set_smiles_path(&self, set: usize, n_mols: usize) -> PathBuf {
        self.output_dir.join(format!(
            "all_smiles_upto_{}_and_{}mols_set{}.smi",
            self.heavy_atom_label(),
            n_mols,
            set
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitSummary {
    pub patterns: usize,
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub unparseable: usize,
    pub set1: usize,
    pub set2: usize,
}

/// Both sets, pattern → entries, plus the order patterns were processed in.
#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    pub order: Vec<String>,
    pub set1: BTreeMap<String, Vec<String>>,
    pub set2: BTreeMap<String, Vec<String>>,
    pub summary: SplitSummary,
}

impl SplitOutcome {
    /// Entries of `set` for the given patterns, in pattern order.
    pub fn flatten<'a>(
        set: &'a BTreeMap<String, Vec<String>>,
        patterns: impl IntoIterator<Item = &'a String>,
    ) -> Vec<&'a str> {
        patterns
            .into_iter()
            .filter_map(|p| set.get(p))
            .flat_map(|entries| entries.iter().map(String::as_str))
            .collect()
    }
}

pub fn load_candidates(path: &std::path::Path) -> Result<BTreeMap<String, PatternCandidates>> {
    let contents = std::fs::read_to_string(path).map_err(|e| ScreenError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| ScreenError::json(path, e))
}

pub fn run<T: Toolkit + Sync>(toolkit: &T, config: &SplitConfig) -> Result<SplitSummary> {
    let filter = MolFilter::from_file(&config.filter)?.with_max_heavy_atoms(config.max_heavy_atoms);
    let library = PatternLibrary::load(&config.patterns)?;
    let merged = load_candidates(&config.input)?;
    log::info!("loaded {} patterns from {:?}", merged.len(), config.input);

    let outcome = split_candidates(
        toolkit,
        &filter,
        &library,
        &merged,
        config.policy,
        config.limits,
    );

    write_outputs(&outcome, &library, config)?;

    let s = &outcome.summary;
    log::info!(
        "{} patterns, {} distinct candidates: {} accepted, {} rejected, {} unparseable",
        s.patterns,
        s.candidates,
        s.accepted,
        s.rejected,
        s.unparseable
    );
    log::info!("set 1: {} molecules, set 2: {} molecules", s.set1, s.set2);

    Ok(outcome.summary)
}

/// Library patterns first, in priority order, then anything else in the mapping.
pub fn pattern_order(
    library: &PatternLibrary,
    merged: &BTreeMap<String, PatternCandidates>,
) -> Vec<String> {
    let mut order = library
        .priority_order()
        .into_iter()
        .filter(|p| merged.contains_key(p))
        .collect::<Vec<_>>();
    let known = order.iter().cloned().collect::<HashSet<_>>();
    order.extend(merged.keys().filter(|k| !known.contains(*k)).cloned());
    order
}

pub fn validate_entry<T: Toolkit>(toolkit: &T, filter: &MolFilter, entry: &str) -> Verdict {
    let smiles = entry_smiles(entry);
    let mol = match toolkit.mol_from_smiles(smiles) {
        Ok(mol) => mol,
        Err(e) => {
            log::warn!(
                "Skipping SMILES {} due to error during parsing/conversion: {}",
                entry,
                e
            );
            return Verdict::Unparseable(e.to_string());
        }
    };

    let profile = toolkit.profile(&mol);
    match filter.evaluate(&profile) {
        Ok(()) => Verdict::Accepted {
            canonical: toolkit.canonical_smiles(&mol),
            net_charge: profile.net_charge,
        },
        Err(rejection) => {
            log::debug!("{} rejected: {}", entry, rejection);
            Verdict::Rejected(rejection.to_string())
        }
    }
}

/// Validates every distinct entry once, in parallel.
pub fn validate_candidates<T: Toolkit + Sync>(
    toolkit: &T,
    filter: &MolFilter,
    merged: &BTreeMap<String, PatternCandidates>,
) -> HashMap<String, Verdict> {
    let distinct = merged
        .values()
        .flat_map(|candidates| candidates.entries())
        .collect::<HashSet<_>>();

    distinct
        .into_par_iter()
        .map(|entry| (entry.to_string(), validate_entry(toolkit, filter, entry)))
        .collect()
}

pub fn split_candidates<T: Toolkit + Sync>(
    toolkit: &T,
    filter: &MolFilter,
    library: &PatternLibrary,
    merged: &BTreeMap<String, PatternCandidates>,
    policy: SplitPolicy,
    limits: SplitLimits,
) -> SplitOutcome {
    let verdicts = validate_candidates(toolkit, filter, merged);

    let mut summary = SplitSummary {
        candidates: verdicts.len(),
        ..Default::default()
    };
    for verdict in verdicts.values() {
        match verdict {
            Verdict::Accepted { .. } => summary.accepted += 1,
            Verdict::Rejected(_) => summary.rejected += 1,
            Verdict::Unparseable(_) => summary.unparseable += 1,
        }
    }

    let order = pattern_order(library, merged);
    let mut splitter = SetSplitter::new(policy, limits, &verdicts);
    let mut set1 = BTreeMap::new();
    let mut set2 = BTreeMap::new();
    for pattern in &order {
        let Some(candidates) = merged.get(pattern) else {
            continue;
        };
        let split = splitter.split(candidates);
        summary.set1 += split.set1.len();
        summary.set2 += split.set2.len();
        set1.insert(pattern.clone(), split.set1);
        set2.insert(pattern.clone(), split.set2);
    }
    summary.patterns = order.len();

    SplitOutcome {
        order,
        set1,
        set2,
        summary,
    }
}

pub fn write_outputs(
    outcome: &SplitOutcome,
    library: &PatternLibrary,
    config: &SplitConfig,
) -> Result<()> {
    ensure_dir(&config.output_dir)?;

    for (set_no, set) in [(1, &outcome.set1), (2, &outcome.set2)] {
        for category in ElementCategory::ALL {
            let patterns = library.category(category);
            let subset = patterns
                .iter()
                .filter_map(|p| set.get(p).map(|entries| (p.clone(), entries.clone())))
                .collect::<BTreeMap<_, _>>();

            let name = format!("set{}-{}", set_no, category.label());
            write_json(&subset, config.output_dir.join(format!("{name}.json")))?;
            write_smiles(
                &SplitOutcome::flatten(set, patterns),
                config.output_dir.join(format!("{name}-smiles.smi")),
            )?;
        }

        let n_mols = if set_no == 1 {
            config.limits.set1
        } else {
            config.limits.set2
        };
        write_json(set, config.set_json_path(set_no, n_mols))?;
        write_smiles(
            &SplitOutcome::flatten(set, &outcome.order),
            config.set_smiles_path(set_no, n_mols),
        )?;
    }

    log::info!("set files written to {:?}", config.output_dir);
    Ok(())
}
