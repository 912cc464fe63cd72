use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches};
use env_logger::Env;
use log::info;

use profcsv::cli::Cli;
use profcsv::config::ProfileConfig;
use profcsv::config_file::ConfigFile;
use profcsv::formatters::create_formatter;
use profcsv::platform::ExitCode;
use profcsv::run_profile;

fn main() {
    let cli = process_args_with_config();

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_filter())).init();

    match run(&cli) {
        Ok(()) => ExitCode::Success.exit(),
        Err(e) => {
            eprintln!("profcsv: Error: {:#}", e);
            ExitCode::for_error(&e).exit();
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = ProfileConfig::from_cli(cli).context("invalid options")?;
    info!(
        "profiling {} with {} workers",
        config.input.source, config.scan.workers
    );

    let report = run_profile(&config)?;

    let formatter = create_formatter(config.output.format);
    println!("{}", formatter.format(&report));

    if config.output.stats {
        eprintln!("{}", report.stats.format_stats());
    }
    Ok(())
}

/// Extract --config-file from raw args, before clap sees them
fn extract_config_file_arg(args: &[String]) -> Option<String> {
    args.windows(2)
        .find(|pair| pair[0] == "--config-file")
        .map(|pair| pair[1].clone())
}

fn process_args_with_config() -> Cli {
    let raw_args: Vec<String> = std::env::args().collect();
    let config_file_path = extract_config_file_arg(&raw_args);
    let ignore_config = raw_args.iter().any(|arg| arg == "--ignore-config");

    let processed_args = if ignore_config {
        raw_args
    } else {
        match ConfigFile::load_with_custom_path(config_file_path.as_deref())
            .and_then(|config_file| config_file.process_args(raw_args))
        {
            Ok(processed) => processed,
            Err(e) => {
                eprintln!("profcsv: Config error: {:#}", e);
                ExitCode::GeneralError.exit();
            }
        }
    };

    // Parse with potentially modified arguments
    let matches = Cli::command().get_matches_from(processed_args);
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_config_file_arg() {
        let args: Vec<String> = ["profcsv", "--config-file", "my.ini", "x.csv"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(extract_config_file_arg(&args).as_deref(), Some("my.ini"));
        assert_eq!(extract_config_file_arg(&args[..2]), None);
    }
}
