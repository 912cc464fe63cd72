// CLI-specific types and structures
// This module contains the command-line interface definitions

use clap::Parser;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsumerKind {
    /// RFC 4180 fields, quotes respected
    #[default]
    Csv,
    /// Separator count plus one, no quoting
    Split,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

// CLI structure - contains all command-line arguments and options
#[derive(Parser, Debug)]
#[command(name = "profcsv")]
#[command(about = "Parallel field-count profiler for delimited record files")]
#[command(
    long_about = "Parallel field-count profiler for delimited record files\n\nThe source is split into contiguous byte ranges that are scanned concurrently.\nRecords cut by range boundaries are stitched back together after all workers\nfinish, so the histogram matches a sequential scan.\n\nCOMMON EXAMPLES:\n  profcsv data.csv\n  profcsv -j 16 --stats big.csv\n  profcsv -F json https://example.com/export.csv\n  profcsv -d ';' --field-separator '\\t' records.tsv"
)]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Local path or http(s) URL of the resource to profile
    pub source: String,

    /// Record delimiter: a single character or one of \n, \t, \r, \0, \xHH
    #[arg(
        short = 'd',
        long = "delimiter",
        default_value = "\\n",
        help_heading = "Input Options"
    )]
    pub delimiter: String,

    /// Field separator, same syntax as --delimiter
    #[arg(long = "field-separator", default_value = ",", help_heading = "Input Options")]
    pub field_separator: String,

    /// How fields are counted
    #[arg(
        long = "consumer",
        value_enum,
        default_value = "csv",
        help_heading = "Input Options"
    )]
    pub consumer: ConsumerKind,

    /// Treat double quotes as ordinary bytes (csv consumer only)
    #[arg(long = "no-quoting", help_heading = "Input Options")]
    pub no_quoting: bool,

    /// Number of chunks scanned in parallel (default: 2x CPU cores)
    #[arg(short = 'j', long = "workers", help_heading = "Performance Options")]
    pub workers: Option<usize>,

    /// Bytes requested per read
    #[arg(long = "buffer-size", default_value_t = 8192, help_heading = "Performance Options")]
    pub buffer_size: usize,

    /// Records buffered per chunk before its reader waits
    #[arg(long = "queue-depth", default_value_t = 1024, help_heading = "Performance Options")]
    pub queue_depth: usize,

    /// Field counts at or above this are dropped with a warning
    #[arg(long = "max-fields", default_value_t = 500, help_heading = "Output Options")]
    pub max_fields: usize,

    /// Output format
    #[arg(
        short = 'F',
        long = "output-format",
        value_enum,
        default_value = "table",
        help_heading = "Output Options"
    )]
    pub output_format: OutputFormat,

    /// Print a processing summary to stderr
    #[arg(short = 's', long = "stats", help_heading = "Display Options")]
    pub stats: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Display Options")]
    pub verbose: u8,

    /// Only log errors
    #[arg(
        short = 'q',
        long = "quiet",
        conflicts_with = "verbose",
        help_heading = "Display Options"
    )]
    pub quiet: bool,

    /// Expand an alias from the configuration file
    #[arg(short = 'a', long = "alias", help_heading = "Configuration Options")]
    pub alias: Vec<String>,

    /// Read configuration from this file instead of the search path
    #[arg(long = "config-file", help_heading = "Configuration Options")]
    pub config_file: Option<String>,

    /// Skip configuration files entirely
    #[arg(long = "ignore-config", help_heading = "Configuration Options")]
    pub ignore_config: bool,
}

impl Cli {
    /// Default log filter for env_logger, overridden by RUST_LOG
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["profcsv", "data.csv"]).unwrap();
        assert_eq!(cli.source, "data.csv");
        assert_eq!(cli.delimiter, "\\n");
        assert_eq!(cli.field_separator, ",");
        assert_eq!(cli.workers, None);
        assert_eq!(cli.buffer_size, 8192);
        assert_eq!(cli.queue_depth, 1024);
        assert_eq!(cli.max_fields, 500);
        assert_eq!(cli.consumer, ConsumerKind::Csv);
        assert_eq!(cli.output_format, OutputFormat::Table);
        assert_eq!(cli.log_filter(), "warn");
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["profcsv", "-vv", "x"]).unwrap();
        assert_eq!(cli.log_filter(), "debug");
        let cli = Cli::try_parse_from(["profcsv", "-q", "x"]).unwrap();
        assert_eq!(cli.log_filter(), "error");
        assert!(Cli::try_parse_from(["profcsv", "-q", "-v", "x"]).is_err());
    }

    #[test]
    fn test_performance_options() {
        let cli = Cli::try_parse_from([
            "profcsv",
            "-j",
            "6",
            "--buffer-size",
            "64",
            "--queue-depth",
            "1",
            "--consumer",
            "split",
            "-F",
            "json",
            "x.csv",
        ])
        .unwrap();
        assert_eq!(cli.workers, Some(6));
        assert_eq!(cli.buffer_size, 64);
        assert_eq!(cli.queue_depth, 1);
        assert_eq!(cli.consumer, ConsumerKind::Split);
        assert_eq!(cli.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["profcsv"]).is_err());
    }
}
