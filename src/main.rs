use clap::{Arg, Command};
use smarts_screen::command_line::{match_patterns, merge_batches, split_sets};
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = Command::new("smarts-screen")
        .about("SMARTS screening and diverse subset selection over PubChem compound archives")
        .subcommand_required(true)
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('t')
                .num_args(1)
                .global(true),
        )
        .subcommand(match_patterns::command())
        .subcommand(merge_batches::command())
        .subcommand(split_sets::command());

    let matches = app.get_matches();
    let (name, sub_matches) = matches
        .subcommand()
        .ok_or(eyre::eyre!("no subcommand given"))?;

    // global args are propagated down to the subcommand
    if let Some(threads) = sub_matches.get_one::<String>("threads") {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads.parse()?)
            .build_global()?;
    }

    match name {
        match_patterns::NAME => match_patterns::action(sub_matches),
        merge_batches::NAME => merge_batches::action(sub_matches),
        split_sets::NAME => split_sets::action(sub_matches),
        other => Err(eyre::eyre!("unknown subcommand {}", other)),
    }
}
