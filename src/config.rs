use crate::cli::{Cli, ConsumerKind, OutputFormat};
use crate::consumer::{CsvConsumer, RecordConsumer, SplitConsumer};
use crate::error::{ProfileError, Result};
use crate::parallel::ScanConfig;

/// Main configuration struct for profcsv
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub input: InputConfig,
    pub scan: ScanConfig,
    pub output: OutputConfig,
}

/// Input configuration
#[derive(Debug, Clone)]
pub struct InputConfig {
    pub source: String,
    pub field_separator: u8,
    pub consumer: ConsumerKind,
    pub quoting: bool,
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub stats: bool,
}

impl ProfileConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let delimiter = parse_byte("delimiter", &cli.delimiter)?;
        let field_separator = parse_byte("field-separator", &cli.field_separator)?;
        if delimiter == field_separator {
            return Err(ProfileError::configuration(
                "field-separator",
                "must differ from the record delimiter",
            ));
        }

        let defaults = ScanConfig::default();
        let scan = ScanConfig {
            workers: cli.workers.unwrap_or(defaults.workers),
            delimiter,
            buffer_size: cli.buffer_size,
            queue_depth: cli.queue_depth,
            max_fields: cli.max_fields,
        };
        scan.validate()?;

        Ok(Self {
            input: InputConfig {
                source: cli.source.clone(),
                field_separator,
                consumer: cli.consumer,
                quoting: !cli.no_quoting,
            },
            scan,
            output: OutputConfig {
                format: cli.output_format,
                stats: cli.stats,
            },
        })
    }

    /// The record consumer selected by the input options
    pub fn build_consumer(&self) -> Box<dyn RecordConsumer> {
        match self.input.consumer {
            ConsumerKind::Csv => Box::new(CsvConsumer::with_quoting(
                self.input.field_separator,
                self.scan.delimiter,
                self.input.quoting,
            )),
            ConsumerKind::Split => Box::new(SplitConsumer::new(
                self.input.field_separator,
                self.scan.delimiter,
            )),
        }
    }
}

/// Parse a single-byte option: a literal ASCII character or an escape
/// (`\n`, `\t`, `\r`, `\0`, `\\`, `\xHH`)
pub fn parse_byte(parameter: &str, value: &str) -> Result<u8> {
    let invalid =
        |reason: &str| ProfileError::configuration(parameter, format!("'{}' {}", value, reason));

    if let Some(escape) = value.strip_prefix('\\') {
        return match escape {
            "n" => Ok(b'\n'),
            "t" => Ok(b'\t'),
            "r" => Ok(b'\r'),
            "0" => Ok(0),
            "\\" => Ok(b'\\'),
            _ => {
                let hex = escape
                    .strip_prefix('x')
                    .filter(|hex| hex.len() == 2)
                    .ok_or_else(|| invalid("is not a known escape"))?;
                u8::from_str_radix(hex, 16).map_err(|_| invalid("has an invalid hex escape"))
            }
        };
    }

    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        [] => Err(invalid("is empty")),
        _ => Err(invalid("must be a single ASCII character")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Result<ProfileConfig> {
        let mut argv = vec!["profcsv"];
        argv.extend_from_slice(args);
        ProfileConfig::from_cli(&Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_parse_byte_literals_and_escapes() {
        assert_eq!(parse_byte("d", ";").unwrap(), b';');
        assert_eq!(parse_byte("d", "\\n").unwrap(), b'\n');
        assert_eq!(parse_byte("d", "\\t").unwrap(), b'\t');
        assert_eq!(parse_byte("d", "\\0").unwrap(), 0);
        assert_eq!(parse_byte("d", "\\x1e").unwrap(), 0x1e);
        assert_eq!(parse_byte("d", "\\\\").unwrap(), b'\\');
    }

    #[test]
    fn test_parse_byte_rejects_bad_values() {
        assert!(parse_byte("d", "").is_err());
        assert!(parse_byte("d", "ab").is_err());
        assert!(parse_byte("d", "é").is_err());
        assert!(parse_byte("d", "\\q").is_err());
        assert!(parse_byte("d", "\\x1").is_err());
        assert!(parse_byte("d", "\\xzz").unwrap_err().is_configuration());
    }

    #[test]
    fn test_from_cli_builds_scan_config() {
        let config = config(&["-j", "3", "-d", ";", "--max-fields", "20", "in.csv"]).unwrap();
        assert_eq!(config.input.source, "in.csv");
        assert_eq!(config.scan.workers, 3);
        assert_eq!(config.scan.delimiter, b';');
        assert_eq!(config.scan.max_fields, 20);
        assert!(config.input.quoting);
        assert!(!config.output.stats);
    }

    #[test]
    fn test_workers_default_to_twice_the_cores() {
        let config = config(&["in.csv"]).unwrap();
        assert_eq!(config.scan.workers, num_cpus::get() * 2);
    }

    #[test]
    fn test_zero_values_are_configuration_errors() {
        assert!(config(&["-j", "0", "in.csv"]).unwrap_err().is_configuration());
        assert!(config(&["--max-fields", "0", "in.csv"])
            .unwrap_err()
            .is_configuration());
        assert!(config(&["--queue-depth", "0", "in.csv"]).is_err());
    }

    #[test]
    fn test_separator_must_differ_from_delimiter() {
        let err = config(&["-d", ",", "in.csv"]).unwrap_err();
        assert!(err.to_string().contains("field-separator"));
    }

    #[test]
    fn test_build_consumer_honours_options() {
        let record = b"\"a,b\"\n";
        let split = config(&["--consumer", "split", "in.csv"]).unwrap();
        assert_eq!(split.build_consumer().field_count(record).unwrap(), Some(2));

        let quoted = config(&["in.csv"]).unwrap();
        assert_eq!(quoted.build_consumer().field_count(record).unwrap(), Some(1));

        let unquoted = config(&["--no-quoting", "in.csv"]).unwrap();
        assert_eq!(unquoted.build_consumer().field_count(record).unwrap(), Some(2));
    }
}
