use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, ScreenError};
use crate::output::{ensure_dir, write_json};
use crate::patterns::{PatternLibrary, PatternTablePaths};
use crate::pubchem::{open_sdf, SdfRecord};
use crate::selection::{DiversitySelector, MatchReport, Offer, SelectionLimits, SelectionMap};
use crate::toolkit::{MolFilter, Toolkit};

use super::recoverable;

pub const DEFAULT_OUTPUT_DIR: &str = "individual_json_files";
pub const DEFAULT_PROGRESS_EVERY: usize = 100_000;
pub const OUTPUT_SUFFIX: &str = "_smarts_dict.json";

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub sdf: PathBuf,
    pub patterns: PatternTablePaths,
    pub filter: PathBuf,
    pub output_dir: PathBuf,
    pub limits: SelectionLimits,
    pub max_heavy_atoms: Option<u32>,
    pub limit: Option<usize>,
    pub progress_every: usize,
    pub report: Option<PathBuf>,
}

impl MatchConfig {
    pub fn new(sdf: impl Into<PathBuf>, filter: impl Into<PathBuf>) -> Self {
        Self {
            sdf: sdf.into(),
            patterns: PatternTablePaths::default(),
            filter: filter.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            limits: SelectionLimits::default(),
            max_heavy_atoms: None,
            limit: None,
            progress_every: DEFAULT_PROGRESS_EVERY,
            report: None,
        }
    }

    /// `<output_dir>/<sdf name without .sdf[.gz]>_smarts_dict.json`
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}{}", batch_stem(&self.sdf), OUTPUT_SUFFIX))
    }
}

pub fn batch_stem(sdf: &Path) -> String {
    let name = sdf
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    [".sdf.gz", ".sdf", ".gz"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name.as_str())
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchStats {
    pub records: usize,
    pub unparseable: usize,
    pub filtered: usize,
    pub duplicates: usize,
    pub no_match: usize,
    pub not_diverse: usize,
    pub selected: usize,
}

pub struct Screening {
    pub selector: DiversitySelector,
    pub stats: MatchStats,
    pub invalid_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub stats: MatchStats,
    pub patterns: MatchReport,
    pub invalid_patterns: Vec<String>,
    pub output: PathBuf,
}

pub fn run<T: Toolkit>(toolkit: &T, config: &MatchConfig) -> Result<MatchSummary> {
    let filter = MolFilter::from_file(&config.filter)?.with_max_heavy_atoms(config.max_heavy_atoms);
    let library = PatternLibrary::load(&config.patterns)?;
    let sdf_path = config.sdf.clone();
    let records = open_sdf(&config.sdf)?.map(move |r| {
        r.map_err(|e| match e.kind() {
            ErrorKind::InvalidData => {
                ScreenError::molecule(sdf_path.display().to_string(), e)
            }
            _ => ScreenError::io(&sdf_path, e),
        })
    });

    let records: Box<dyn Iterator<Item = _>> = if let Some(limit) = config.limit {
        Box::new(records.take(limit))
    } else {
        Box::new(records)
    };

    let screening = screen_records(
        toolkit,
        &filter,
        library.priority_order(),
        records,
        config.limits,
        config.progress_every,
    )?;

    ensure_dir(&config.output_dir)?;
    let output = config.output_path();
    let selection: SelectionMap = screening.selector.selection_map();
    write_json(&selection, &output)?;

    let summary = MatchSummary {
        stats: screening.stats,
        patterns: screening.selector.report(),
        invalid_patterns: screening.invalid_patterns,
        output,
    };
    log_summary(&summary);

    if let Some(report_path) = &config.report {
        write_json(&summary, report_path)?;
    }

    Ok(summary)
}

/// Streams records through the filter and the diversity selector.
pub fn screen_records<T, I>(
    toolkit: &T,
    filter: &MolFilter,
    patterns: Vec<String>,
    records: I,
    limits: SelectionLimits,
    progress_every: usize,
) -> Result<Screening>
where
    T: Toolkit,
    I: Iterator<Item = Result<SdfRecord>>,
{
    let mut invalid_patterns = Vec::new();
    let mut valid_patterns = Vec::with_capacity(patterns.len());
    let mut queries = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        match recoverable(toolkit.compile_query(&pattern))? {
            Some(query) => {
                valid_patterns.push(pattern);
                queries.push(query);
            }
            None => invalid_patterns.push(pattern),
        }
    }

    log::info!(
        "screening against {} patterns ({} could not be compiled)",
        valid_patterns.len(),
        invalid_patterns.len()
    );

    let mut selector =
        DiversitySelector::new(valid_patterns, limits).with_similarity(T::similarity);
    let mut stats = MatchStats::default();

    for record in records {
        stats.records += 1;
        let Some(record) = recoverable(record)? else {
            stats.unparseable += 1;
            continue;
        };

        if progress_every > 0 && stats.records % progress_every == 0 {
            log::info!(
                "{} records read, {} selected, {} patterns still open",
                stats.records,
                stats.selected,
                selector.num_active()
            );
        }

        let Some(mol) = recoverable(toolkit.mol_from_block(&record.mol_block))? else {
            stats.unparseable += 1;
            continue;
        };
        let Some(mol) = recoverable(toolkit.largest_component(&mol))? else {
            stats.unparseable += 1;
            continue;
        };

        if let Err(rejection) = filter.evaluate(&toolkit.profile(&mol)) {
            log::debug!("record {} filtered: {}", record.source_id(), rejection);
            stats.filtered += 1;
            continue;
        }

        let smiles = toolkit.canonical_smiles(&mol);
        let offer = selector.offer(
            &smiles,
            record.source_id(),
            |idx| toolkit.matches(&queries[idx], &mol),
            || (toolkit.net_charge(&mol), toolkit.fingerprint(&mol)),
        );

        match offer {
            Offer::Duplicate => stats.duplicates += 1,
            Offer::NoMatch => stats.no_match += 1,
            Offer::Rejected => stats.not_diverse += 1,
            Offer::Selected { pattern, bucket } => {
                log::debug!("{} -> {} [{}]", smiles, pattern, bucket);
                stats.selected += 1;
            }
        }

        if selector.is_exhausted() {
            log::info!("every pattern is full, stopping after {} records", stats.records);
            break;
        }
    }

    Ok(Screening {
        selector,
        stats,
        invalid_patterns,
    })
}

fn log_summary(summary: &MatchSummary) {
    let stats = &summary.stats;
    log::info!(
        "read {} records: {} unparseable, {} filtered, {} duplicates, {} matched nothing, {} not diverse enough, {} selected",
        stats.records,
        stats.unparseable,
        stats.filtered,
        stats.duplicates,
        stats.no_match,
        stats.not_diverse,
        stats.selected
    );
    log::info!(
        "patterns: {} full, {} partially filled, {} unmatched",
        summary.patterns.filled.len(),
        summary.patterns.partial.len(),
        summary.patterns.unmatched.len()
    );
    if !summary.patterns.unmatched.is_empty() {
        log::info!("unmatched patterns: {:?}", summary.patterns.unmatched);
    }
    log::info!("selection written to {:?}", summary.output);
}
