//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::report_adapter::ReportFormat;
use crate::domain::comparison::list_operators;
use crate::domain::config_validation::{build_profile_options, validate_data_source, DataSource};
use crate::domain::criteria::{structure_json, unstructure_json, Criteria};
use crate::domain::error::ScreenerError;
use crate::domain::profile::{load_instrument, profile_stockset, ProfileOptions};
use crate::domain::registry::FunctionRegistry;
use crate::domain::rule_eval::evaluate_criteria;
use crate::domain::universe::{Stockset, StocksetContext};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::stockset_port::StocksetPort;

#[derive(Parser, Debug)]
#[command(name = "screener", about = "Declarative stock screening criteria")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the function catalog as JSON
    Functions {
        #[arg(long)]
        grouped: bool,
        /// Describe a single function
        #[arg(long)]
        name: Option<String>,
    },
    /// Print comparison operators as JSON (label -> symbol)
    Operators,
    /// Validate a criteria file and print it normalised
    Validate {
        #[arg(long)]
        criteria: PathBuf,
        /// Keep unsupported functions instead of rejecting them
        #[arg(long)]
        allow_unsupported: bool,
    },
    /// Evaluate criteria against one instrument
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        criteria: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long)]
        exchange: Option<String>,
    },
    /// Profile every instrument in a stockset
    Profile {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        criteria: PathBuf,
        #[arg(long)]
        stockset: String,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = "json")]
        format: ReportFormat,
    },
    /// List the stocksets a config defines
    Stocksets {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        owner: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(command: Command) -> Result<(), ScreenerError> {
    match command {
        Command::Functions { grouped, name } => run_functions(grouped, name.as_deref()),
        Command::Operators => print_json(&list_operators()),
        Command::Validate {
            criteria,
            allow_unsupported,
        } => run_validate(&criteria, allow_unsupported),
        Command::Evaluate {
            config,
            criteria,
            code,
            exchange,
        } => run_evaluate(&config, &criteria, &code, exchange.as_deref()),
        Command::Profile {
            config,
            criteria,
            stockset,
            owner,
            exchange,
            output,
            format,
        } => run_profile(ProfileArgs {
            config: &config,
            criteria: &criteria,
            stockset: &stockset,
            owner: owner.as_deref(),
            exchange: exchange.as_deref(),
            output: output.as_deref(),
            format,
        }),
        Command::Stocksets { config, owner } => run_stocksets(&config, owner.as_deref()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ScreenerError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run_functions(grouped: bool, name: Option<&str>) -> Result<(), ScreenerError> {
    let registry = FunctionRegistry::global();
    match name {
        Some(name) => print_json(&registry.generate_function_schema(name)?),
        None => print_json(&registry.generate_functions_schema(grouped)),
    }
}

pub fn load_criteria(path: &Path, ignore_unsupported_func: bool) -> Result<Criteria, ScreenerError> {
    let text = fs::read_to_string(path)?;
    structure_json(&text, ignore_unsupported_func)
}

fn run_validate(path: &Path, allow_unsupported: bool) -> Result<(), ScreenerError> {
    let criteria = load_criteria(path, allow_unsupported)?;
    for criterion in criteria.iter().filter(|c| !c.is_supported()) {
        warn!(criterion = %criterion, "criterion uses an unsupported function");
    }
    eprintln!("{} criteria valid", criteria.len());
    println!("{}", unstructure_json(&criteria)?);
    Ok(())
}

/// Opens the data source selected by `[data] source`.
pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, ScreenerError> {
    match validate_data_source(config)? {
        DataSource::Csv => {
            let dir = config.get_string("data", "csv_dir").unwrap_or_default();
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir.trim()))))
        }
        #[cfg(feature = "sqlite")]
        DataSource::Sqlite => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        #[cfg(not(feature = "sqlite"))]
        DataSource::Sqlite => Err(ScreenerError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "sqlite feature is not enabled".into(),
        }),
    }
}

fn options_for(config: &dyn ConfigPort, exchange: Option<&str>) -> Result<ProfileOptions, ScreenerError> {
    let mut options = build_profile_options(config)?;
    if let Some(exchange) = exchange {
        options.exchange = exchange.trim().to_uppercase();
    }
    Ok(options)
}

#[derive(Serialize)]
struct EvaluationReport {
    code: String,
    exchange: String,
    date: chrono::NaiveDate,
    criteria: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<u32>,
}

fn run_evaluate(
    config_path: &Path,
    criteria_path: &Path,
    code: &str,
    exchange: Option<&str>,
) -> Result<(), ScreenerError> {
    let config = FileConfigAdapter::from_file(config_path)?;
    let options = options_for(&config, exchange)?;
    let criteria = load_criteria(criteria_path, options.ignore_unsupported_func)?;
    let data = open_data_port(&config)?;

    let code = code.trim().to_uppercase();
    let instrument = load_instrument(data.as_ref(), &code, &options)?;
    let evaluation = evaluate_criteria(&instrument, &criteria, options.ignore_unsupported_func)?;

    let date = instrument
        .latest()
        .map(|bar| bar.date)
        .ok_or_else(|| ScreenerError::NoData {
            code: code.clone(),
            exchange: options.exchange.clone(),
        })?;
    print_json(&EvaluationReport {
        code,
        exchange: options.exchange,
        date,
        criteria: evaluation
            .to_bool_map()
            .into_iter()
            .map(|(label, passed)| (label, serde_json::Value::Bool(passed)))
            .collect(),
        score: evaluation.ranking_score(),
    })
}

struct ProfileArgs<'a> {
    config: &'a Path,
    criteria: &'a Path,
    stockset: &'a str,
    owner: Option<&'a str>,
    exchange: Option<&'a str>,
    output: Option<&'a Path>,
    format: ReportFormat,
}

fn run_profile(args: ProfileArgs<'_>) -> Result<(), ScreenerError> {
    eprintln!("Loading config from {}", args.config.display());
    let config = FileConfigAdapter::from_file(args.config)?;
    let options = options_for(&config, args.exchange)?;
    let criteria = load_criteria(args.criteria, options.ignore_unsupported_func)?;
    let data = open_data_port(&config)?;

    let stockset = Stockset::parse(args.stockset);
    let mut context = StocksetContext::new(options.exchange.clone());
    if let Some(owner) = args.owner {
        context = context.with_owner(owner);
    }

    eprintln!(
        "Profiling {} on {} against {} criteria...",
        stockset,
        options.exchange,
        criteria.len()
    );
    let run = profile_stockset(data.as_ref(), &config, &stockset, &context, &criteria, &options)?;
    for skipped in &run.skipped {
        eprintln!("warning: skipped {} ({})", skipped.code, skipped.reason);
    }
    if run.truncated {
        eprintln!("warning: run cut short, {} profiles returned", run.profiles.len());
    }

    let report = args.format.adapter();
    match args.output {
        Some(path) => {
            report.write_file(&run.profiles, &path.display().to_string())?;
            eprintln!("Wrote {} profiles to {}", run.profiles.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            report.write(&run.profiles, &mut stdout.lock())?;
        }
    }
    Ok(())
}

fn run_stocksets(config_path: &Path, owner: Option<&str>) -> Result<(), ScreenerError> {
    let config = FileConfigAdapter::from_file(config_path)?;
    let mut names = vec![Stockset::All.to_string()];
    names.extend(config.list_stocksets(owner));
    print_json(&names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_profile_arguments() {
        let cli = Cli::try_parse_from([
            "screener",
            "profile",
            "-c",
            "screener.ini",
            "--criteria",
            "rules.json",
            "--stockset",
            "holdings:core",
            "--owner",
            "alice",
            "--format",
            "csv",
        ])
        .unwrap();
        match cli.command {
            Command::Profile {
                stockset,
                owner,
                format,
                output,
                ..
            } => {
                assert_eq!(stockset, "holdings:core");
                assert_eq!(owner.as_deref(), Some("alice"));
                assert_eq!(format, ReportFormat::Csv);
                assert!(output.is_none());
            }
            other => panic!("expected profile command, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from([
            "screener",
            "profile",
            "-c",
            "a.ini",
            "--criteria",
            "b.json",
            "--stockset",
            "ALL",
            "--format",
            "xml",
        ])
        .is_err());
    }

    #[test]
    fn csv_source_needs_directory() {
        let config = FileConfigAdapter::from_string("[data]\nsource = csv\n").unwrap();
        assert!(matches!(
            open_data_port(&config),
            Err(ScreenerError::ConfigMissing { .. })
        ));
        let config = FileConfigAdapter::from_string("[data]\ncsv_dir = /tmp\n").unwrap();
        assert!(open_data_port(&config).is_ok());
    }

    #[test]
    fn exchange_override_is_uppercased() {
        let config = FileConfigAdapter::from_string("[data]\nexchange = ASX\n").unwrap();
        assert_eq!(options_for(&config, Some("nyse")).unwrap().exchange, "NYSE");
        assert_eq!(options_for(&config, None).unwrap().exchange, "ASX");
    }
}
