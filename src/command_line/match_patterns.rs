use std::path::PathBuf;

use super::pattern_table_paths;
use super::prelude::*;
use crate::pipeline::match_stage::{self, MatchConfig, DEFAULT_OUTPUT_DIR, DEFAULT_PROGRESS_EVERY};
use crate::selection::diversity::{DEFAULT_N_MOLS, DEFAULT_SIMILARITY_THRESHOLD};
use crate::selection::SelectionLimits;
use crate::toolkit::RdkitToolkit;

pub const NAME: &str = "match-patterns";

pub fn command() -> Command {
    let command = Command::new(NAME)
        .about("Select diverse molecules per SMARTS pattern from one PubChem SDF batch")
        .arg(Arg::new("sdf").required(true).long("sdf").short('s').num_args(1))
        .arg(
            Arg::new("filter")
                .required(true)
                .long("filter")
                .short('f')
                .num_args(1),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .num_args(1)
                .default_value(DEFAULT_OUTPUT_DIR),
        )
        .arg(Arg::new("n-mols").long("n-mols").short('n').num_args(1))
        .arg(
            Arg::new("n-mols-per-bucket")
                .long("n-mols-per-bucket")
                .num_args(1),
        )
        .arg(Arg::new("similarity").long("similarity").num_args(1))
        .arg(
            Arg::new("max-heavy-atoms")
                .long("max-heavy-atoms")
                .num_args(1),
        )
        .arg(Arg::new("limit").long("limit").num_args(1))
        .arg(Arg::new("progress-every").long("progress-every").num_args(1))
        .arg(Arg::new("report").long("report").num_args(1));

    with_pattern_tables(command)
}

pub fn action(matches: &ArgMatches) -> eyre::Result<()> {
    let mut config = MatchConfig::new(path_arg(matches, "sdf")?, path_arg(matches, "filter")?);
    config.patterns = pattern_table_paths(matches)?;
    config.output_dir = path_arg(matches, "output-dir")?;

    let per_pattern = optional_arg(matches, "n-mols")?.unwrap_or(DEFAULT_N_MOLS);
    config.limits = SelectionLimits {
        per_pattern,
        per_bucket: optional_arg(matches, "n-mols-per-bucket")?.unwrap_or(per_pattern),
        similarity_threshold: optional_arg(matches, "similarity")?
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
    };
    if !(0.0..=1.0).contains(&config.limits.similarity_threshold) {
        return Err(eyre::eyre!(
            "--similarity must lie within [0, 1], got {}",
            config.limits.similarity_threshold
        ));
    }

    config.max_heavy_atoms = optional_arg(matches, "max-heavy-atoms")?;
    config.limit = optional_arg(matches, "limit")?;
    config.progress_every =
        optional_arg(matches, "progress-every")?.unwrap_or(DEFAULT_PROGRESS_EVERY);
    config.report = optional_arg::<String>(matches, "report")?.map(PathBuf::from);

    let toolkit = RdkitToolkit::new();
    let summary = match_stage::run(&toolkit, &config)?;

    log::info!(
        "{} records screened, {} molecules selected into {:?}",
        summary.stats.records,
        summary.stats.selected,
        summary.output
    );

    Ok(())
}
