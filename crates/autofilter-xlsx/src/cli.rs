use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use autofilter_model::ColumnCriteria;

use crate::{read_sheet_criteria, SheetCriteria, WorkbookPackage};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser)]
#[command(about = "Print the AutoFilter criteria of a worksheet in an XLSX/XLSM workbook.")]
pub struct Args {
    /// Workbook to read.
    workbook: PathBuf,

    /// Worksheet name (defaults to the sheet that was active when the workbook was saved).
    #[arg(long, short)]
    sheet: Option<String>,

    /// Print the workbook's sheet names instead of filter criteria.
    #[arg(long, conflicts_with = "sheet")]
    list_sheets: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level for stderr diagnostics. Defaults to `RUST_LOG`, then `warn`.
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    workbook: &'a str,
    sheet: &'a str,
    active: bool,
    columns: &'a [ColumnCriteria],
    criteria: Vec<String>,
}

pub fn run() -> Result<()> {
    let args = parse_args();
    init_logging(args.log_level)?;
    run_with_args(args)
}

/// Parse CLI arguments.
pub fn parse_args() -> Args {
    Args::parse()
}

/// Install a stderr `tracing` subscriber; `log` records from the library are
/// forwarded to it.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}

pub fn run_with_args(args: Args) -> Result<()> {
    let package = WorkbookPackage::open(&args.workbook)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let written = if args.list_sheets {
        let names = package.sheet_names()?;
        write_sheet_names(&mut out, &args, &names)
    } else {
        let criteria = read_sheet_criteria(&package, args.sheet.as_deref())
            .with_context(|| format!("read AutoFilter criteria from {}", args.workbook.display()))?;
        write_criteria(&mut out, &args, &criteria)
    };

    match written {
        // A downstream consumer exiting early (`... | head`) is not a failure.
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.context("write output"),
    }
}

/// Criteria joined with newlines, as shown to the user.
pub fn render_text(criteria: &SheetCriteria) -> String {
    criteria.criteria().join("\n")
}

fn write_criteria(out: &mut impl Write, args: &Args, criteria: &SheetCriteria) -> io::Result<()> {
    match args.format {
        OutputFormat::Text => {
            if criteria.active {
                let text = render_text(criteria);
                if !text.is_empty() {
                    writeln!(out, "{text}")?;
                }
            }
        }
        OutputFormat::Json => {
            let workbook = args.workbook.to_string_lossy();
            let report = JsonReport {
                workbook: &workbook,
                sheet: &criteria.sheet,
                active: criteria.active,
                columns: &criteria.columns,
                criteria: criteria.criteria(),
            };
            serde_json::to_writer(&mut *out, &report)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}

fn write_sheet_names(out: &mut impl Write, args: &Args, names: &[String]) -> io::Result<()> {
    match args.format {
        OutputFormat::Text => {
            for name in names {
                writeln!(out, "{name}")?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, names)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofilter_model::{FilterJoin, FilterMode};
    use pretty_assertions::assert_eq;

    fn sample() -> SheetCriteria {
        SheetCriteria {
            sheet: "Data".into(),
            active: true,
            columns: vec![
                ColumnCriteria {
                    col_id: 0,
                    mode: FilterMode::ValueList,
                    join: FilterJoin::Any,
                    criteria: vec!["Alice".into(), "2023-5".into()],
                },
                ColumnCriteria {
                    col_id: 2,
                    mode: FilterMode::Custom,
                    join: FilterJoin::All,
                    criteria: vec!["greaterThan, 100".into()],
                },
            ],
        }
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["autofilter_criteria", "book.xlsx"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn text_output_is_one_criterion_per_line() {
        let mut out = Vec::new();
        write_criteria(&mut out, &args(&[]), &sample()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Alice\n2023-5\ngreaterThan, 100\n"
        );
    }

    #[test]
    fn inactive_filter_prints_nothing() {
        let criteria = SheetCriteria {
            sheet: "Data".into(),
            active: false,
            columns: Vec::new(),
        };
        let mut out = Vec::new();
        write_criteria(&mut out, &args(&[]), &criteria).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn json_output_includes_columns_and_flat_criteria() {
        let mut out = Vec::new();
        write_criteria(&mut out, &args(&["--format", "json"]), &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "workbook": "book.xlsx",
                "sheet": "Data",
                "active": true,
                "columns": [
                    {
                        "col_id": 0,
                        "mode": "value_list",
                        "join": "any",
                        "criteria": ["Alice", "2023-5"]
                    },
                    {
                        "col_id": 2,
                        "mode": "custom",
                        "join": "all",
                        "criteria": ["greaterThan, 100"]
                    }
                ],
                "criteria": ["Alice", "2023-5", "greaterThan, 100"]
            })
        );
    }

    #[test]
    fn list_sheets_conflicts_with_sheet() {
        let result = Args::try_parse_from([
            "autofilter_criteria",
            "book.xlsx",
            "--list-sheets",
            "--sheet",
            "Data",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn sheet_names_in_json() {
        let mut out = Vec::new();
        let names = vec!["Data".to_string(), "Summary".to_string()];
        write_sheet_names(&mut out, &args(&["--list-sheets", "--format", "json"]), &names).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[\"Data\",\"Summary\"]\n");
    }
}
