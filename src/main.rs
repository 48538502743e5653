use std::process;

use clap::Parser;
use prompt_harness::config::HarnessConfig;
use prompt_harness::error::{EXIT_SCENARIO_FAILED, exit_code};
use prompt_harness::styling::{eprintln, warning_message};

mod cli;
mod commands;

use cli::{Cli, Commands};

/// `RUST_LOG` wins; otherwise warnings, raised to info by `-v` and debug by `-vv`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format_timestamp(None)
        .init();
}

fn load_config() -> anyhow::Result<HarnessConfig> {
    let config = HarnessConfig::load()?;
    for key in config.unknown_keys() {
        eprintln!(
            "{}",
            warning_message(format!("Unknown config key {key:?} is ignored"))
        );
    }
    Ok(config)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config().and_then(|config| match cli.command {
        Commands::Run(args) => commands::handle_run(args, &config).map(|passed| {
            if passed { 0 } else { EXIT_SCENARIO_FAILED }
        }),
        Commands::List => commands::handle_list().map(|()| 0),
        Commands::Shell(args) => commands::handle_shell(args, &config).map(|()| 0),
    });

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(exit_code(&e));
        }
    }
}
