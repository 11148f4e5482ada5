use super::pattern_table_paths;
use super::prelude::*;
use crate::pipeline::split_stage::{self, SplitConfig, DEFAULT_INPUT, DEFAULT_PREFIX};
use crate::selection::split::{DEFAULT_N_MOLS_SET1, DEFAULT_N_MOLS_SET2};
use crate::selection::{SplitLimits, SplitPolicy};
use crate::toolkit::RdkitToolkit;

pub const NAME: &str = "split-sets";

pub fn command() -> Command {
    let command = Command::new(NAME)
        .about("Re-validate a merged mapping and split it into two disjoint sets")
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .num_args(1)
                .default_value(DEFAULT_INPUT),
        )
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
                .default_value("."),
        )
        .arg(
            Arg::new("policy")
                .long("policy")
                .num_args(1)
                .value_parser(SplitPolicy::NAMES)
                .default_value(SplitPolicy::Simple.name()),
        )
        .arg(Arg::new("n-mols-1").long("n-mols-1").num_args(1))
        .arg(Arg::new("n-mols-2").long("n-mols-2").num_args(1))
        .arg(
            Arg::new("max-heavy-atoms")
                .long("max-heavy-atoms")
                .num_args(1)
                .help("Heavy atom ceiling, or 'all' to keep the filter's own bound"),
        )
        .arg(Arg::new("prefix").long("prefix").num_args(1).default_value(DEFAULT_PREFIX));

    with_pattern_tables(command)
}

pub fn action(matches: &ArgMatches) -> eyre::Result<()> {
    let mut config = SplitConfig::new(path_arg(matches, "filter")?);
    config.input = path_arg(matches, "input")?;
    config.patterns = pattern_table_paths(matches)?;
    config.output_dir = path_arg(matches, "output-dir")?;
    config.policy = parsed_arg(matches, "policy")?;
    config.limits = SplitLimits {
        set1: optional_arg(matches, "n-mols-1")?.unwrap_or(DEFAULT_N_MOLS_SET1),
        set2: optional_arg(matches, "n-mols-2")?.unwrap_or(DEFAULT_N_MOLS_SET2),
    };
    config.prefix = parsed_arg(matches, "prefix")?;

    match matches.get_one::<String>("max-heavy-atoms").map(String::as_str) {
        Some("all") => config.max_heavy_atoms = None,
        Some(_) => config.max_heavy_atoms = optional_arg(matches, "max-heavy-atoms")?,
        None => {}
    }

    let toolkit = RdkitToolkit::new();
    let summary = split_stage::run(&toolkit, &config)?;
    log::info!(
        "{} patterns split: {} molecules in set 1, {} in set 2",
        summary.patterns,
        summary.set1,
        summary.set2
    );

    Ok(())
}
