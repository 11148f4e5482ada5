use super::prelude::*;
use crate::pipeline::merge_stage::{self, MergeConfig, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT};
use crate::selection::MergePolicy;

pub const NAME: &str = "merge-batches";

pub fn command() -> Command {
    Command::new(NAME)
        .about("Merge per-batch selection files into one mapping")
        .arg(
            Arg::new("input-dir")
                .long("input-dir")
                .short('i')
                .num_args(1)
                .default_value(DEFAULT_INPUT_DIR),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .num_args(1)
                .default_value(DEFAULT_OUTPUT),
        )
        .arg(
            Arg::new("policy")
                .long("policy")
                .num_args(1)
                .value_parser(MergePolicy::NAMES)
                .default_value(MergePolicy::NestedAppend.name()),
        )
}

pub fn action(matches: &ArgMatches) -> eyre::Result<()> {
    let config = MergeConfig {
        input_dir: path_arg(matches, "input-dir")?,
        output: path_arg(matches, "output")?,
        policy: parsed_arg(matches, "policy")?,
    };

    let summary = merge_stage::run(&config)?;
    log::info!("{} files merged into {:?}", summary.files, config.output);

    Ok(())
}
