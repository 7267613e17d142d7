use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use medati_table::CsvDelimiter;
use tracing_subscriber::EnvFilter;

use crate::config::PipelineConfig;
use crate::pair::pair_up;
use crate::pipeline::run_batch;
use crate::report::BatchReport;
use crate::sink::{DirectorySink, DryRunSink, PairSink};
use crate::source::load_dir;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "medati",
    about = "Normalize CSV tables and reconcile their metadata documents for upload."
)]
pub struct Args {
    /// Directory holding `<key>.csv` tables and `<key>.json` metadata documents.
    #[arg(long, value_name = "DIR", default_value = "meta_data/input")]
    input: PathBuf,

    /// Directory receiving the prepared pairs (created if missing).
    #[arg(long, value_name = "DIR", default_value = "meta_data/output")]
    output: PathBuf,

    /// JSON config file. Flags override the values it sets.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Abort unless exactly this many table/metadata pairs are found.
    #[arg(long)]
    expected_pairs: Option<usize>,

    /// Input CSV delimiter, one character or `tab` (default: detected per file).
    #[arg(long, value_parser = parse_delimiter)]
    delimiter: Option<char>,

    /// Output CSV delimiter, one character or `tab`.
    #[arg(long, value_parser = parse_delimiter)]
    output_delimiter: Option<char>,

    /// Run every step but write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// More log output (repeatable). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let report = run_with_args(&args)?;
    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}

/// A single character, or `tab` / `\t` for a tab.
fn parse_delimiter(value: &str) -> Result<char, String> {
    if value.eq_ignore_ascii_case("tab") || value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("expected a single character or `tab`, got `{value}`")),
    }
}

/// Run one batch and print its report to stdout.
pub fn run_with_args(args: &Args) -> Result<BatchReport> {
    let config = load_config(args)?;

    let inputs = load_dir(&args.input, &config.csv)
        .with_context(|| format!("load inputs from {}", args.input.display()))?;
    let pairs = pair_up(inputs.tables, inputs.documents);

    let mut sink: Box<dyn PairSink> = if args.dry_run {
        Box::new(DryRunSink::default())
    } else {
        Box::new(DirectorySink::new(&args.output, config.write_options())?)
    };
    let mut report = run_batch(pairs, inputs.failed, &config, sink.as_mut())?;
    report.dry_run = args.dry_run;

    match print_report(args, &report) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
        other => other.context("write report")?,
    }
    Ok(report)
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("read config {}", path.display()))?;
            PipelineConfig::from_json_slice(&bytes)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if let Some(expected) = args.expected_pairs {
        config.expected_pairs = Some(expected);
    }
    if let Some(delimiter) = args.delimiter {
        config.csv.delimiter = CsvDelimiter::Fixed(delimiter);
    }
    if let Some(delimiter) = args.output_delimiter {
        config.output_delimiter = delimiter;
    }
    config.validate()?;
    Ok(config)
}

fn print_report(args: &Args, report: &BatchReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match args.format {
        OutputFormat::Text => {
            writeln!(handle, "medati batch report")?;
            writeln!(handle, "  input: {}", args.input.display())?;
            if args.dry_run {
                writeln!(handle, "  output: (dry run)")?;
            } else {
                writeln!(handle, "  output: {}", args.output.display())?;
            }
            writeln!(handle)?;
            write!(handle, "{report}")?;
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut handle, report)?;
            handle.write_all(b"\n")?;
        }
    }
    handle.flush()
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medati.json");
        fs::write(&path, br#"{"expected_pairs": 4, "output_delimiter": ","}"#).unwrap();

        let args = Args::parse_from([
            "medati",
            "--config",
            path.to_str().unwrap(),
            "--expected-pairs",
            "2",
            "--delimiter",
            ";",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.expected_pairs, Some(2));
        assert_eq!(config.csv.delimiter, CsvDelimiter::Fixed(';'));
        assert_eq!(config.output_delimiter, ',');
    }

    #[test]
    fn invalid_output_delimiter_is_rejected() {
        let args = Args::parse_from(["medati", "--output-delimiter", "€"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn tab_can_be_spelled_out() {
        let args = Args::parse_from(["medati", "--delimiter", "tab", "--output-delimiter", "\\t"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.csv.delimiter, CsvDelimiter::Fixed('\t'));
        assert_eq!(config.output_delimiter, '\t');

        let args = Args::parse_from(["medati", "--delimiter", "TAB"]);
        assert_eq!(args.delimiter, Some('\t'));
    }

    #[test]
    fn multi_character_delimiters_are_rejected_by_the_parser() {
        assert!(Args::try_parse_from(["medati", "--delimiter", ";;"]).is_err());
        assert!(Args::try_parse_from(["medati", "--output-delimiter", ""]).is_err());
        assert_eq!(parse_delimiter("|"), Ok('|'));
    }

    #[test]
    fn defaults_point_at_meta_data() {
        let args = Args::parse_from(["medati"]);
        assert_eq!(args.input, PathBuf::from("meta_data/input"));
        assert_eq!(args.output, PathBuf::from("meta_data/output"));
        assert!(!args.dry_run);
    }
}
