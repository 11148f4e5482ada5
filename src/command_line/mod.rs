use std::path::PathBuf;
use std::str::FromStr;

use crate::patterns::{
    PatternTablePaths, DEFAULT_NITROGEN_TABLE, DEFAULT_PHOSPHORUS_TABLE, DEFAULT_SULFUR_TABLE,
};

pub mod match_patterns;
pub mod merge_batches;
pub mod split_sets;

pub mod prelude {
    pub use clap::{Arg, ArgMatches, Command};

    pub use super::{optional_arg, parsed_arg, path_arg, with_pattern_tables};
}

use prelude::*;

pub fn with_pattern_tables(command: Command) -> Command {
    command
        .arg(
            Arg::new("nitrogen")
                .long("nitrogen")
                .num_args(1)
                .default_value(DEFAULT_NITROGEN_TABLE),
        )
        .arg(
            Arg::new("sulfur")
                .long("sulfur")
                .num_args(1)
                .default_value(DEFAULT_SULFUR_TABLE),
        )
        .arg(
            Arg::new("phosphorus")
                .long("phosphorus")
                .num_args(1)
                .default_value(DEFAULT_PHOSPHORUS_TABLE),
        )
}

pub fn pattern_table_paths(matches: &ArgMatches) -> eyre::Result<PatternTablePaths> {
    Ok(PatternTablePaths {
        nitrogen: path_arg(matches, "nitrogen")?,
        sulfur: path_arg(matches, "sulfur")?,
        phosphorus: path_arg(matches, "phosphorus")?,
    })
}

pub fn path_arg(matches: &ArgMatches, name: &str) -> eyre::Result<PathBuf> {
    matches
        .get_one::<String>(name)
        .map(PathBuf::from)
        .ok_or(eyre::eyre!("Failed to extract {}", name))
}

pub fn parsed_arg<T>(matches: &ArgMatches, name: &str) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = matches
        .get_one::<String>(name)
        .ok_or(eyre::eyre!("Failed to extract {}", name))?;
    raw.parse::<T>()
        .map_err(|e| eyre::eyre!("invalid value '{}' for --{}: {}", raw, name, e))
}

pub fn optional_arg<T>(matches: &ArgMatches, name: &str) -> eyre::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match matches.get_one::<String>(name) {
        Some(_) => Ok(Some(parsed_arg(matches, name)?)),
        None => Ok(None),
    }
}
