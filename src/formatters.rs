use crate::cli::OutputFormat;
use crate::parallel::ProfileReport;

/// Render a finished report
pub trait Formatter: Send + Sync {
    fn format(&self, report: &ProfileReport) -> String;
}

pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter::new()),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

// Tab-separated histogram, one line per field count
pub struct TableFormatter;

impl TableFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for TableFormatter {
    fn format(&self, report: &ProfileReport) -> String {
        let mut output = String::from("fields\trecords");
        for (fields, count) in report.histogram.iter() {
            output.push('\n');
            output.push_str(&format!("{}\t{}", fields, count));
        }
        output
    }
}

// JSON formatter
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, report: &ProfileReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }
}
