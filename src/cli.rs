//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_source::CsvSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::log_notifier::LogNotifier;
use crate::adapters::sqlite_store::SqliteStore;
use crate::domain::error::SentryError;
use crate::domain::pipeline::{Orchestrator, PipelineConfig, PipelineRunResult};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::{AlertStore, SymbolStore};

#[derive(Parser, Debug)]
#[command(name = "marketsentry", about = "Daily equity analytics pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the daily pipeline
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Trading day to process, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Comma-separated symbol filter
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Create the schema and seed the default alert rules
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List active symbols
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show alerts recorded for a date
    ShowAlerts {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            date,
            symbols,
        } => run_pipeline(&config, date, symbols.as_deref()),
        Command::InitDb { config } => run_init_db(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::ShowAlerts { config, date } => run_show_alerts(&config, date),
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SentryError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn open_store(adapter: &FileConfigAdapter) -> Result<SqliteStore, ExitCode> {
    SqliteStore::from_config(adapter).map_err(|e| {
        eprintln!("error: {e}");
        (&e).into()
    })
}

fn as_of_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

fn run_pipeline(config_path: &PathBuf, date: Option<NaiveDate>, symbols: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let store = match open_store(&adapter) {
        Ok(s) => s,
        Err(code) => return code,
    };
    if let Err(e) = store.initialize_schema() {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let data_dir = adapter
        .get_string("source", "csv_dir")
        .unwrap_or_else(|| "data".to_string());
    let source = CsvSource::new(PathBuf::from(data_dir));
    let notifier = LogNotifier::new();

    let config = PipelineConfig::from_config(&adapter);
    let symbol_filter: Vec<String> = symbols
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let as_of = as_of_or_today(date);
    let mut orchestrator = Orchestrator::new(config, &source, &store, &notifier);
    let result = orchestrator.run(as_of, &symbol_filter);

    print_result(&result);
    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_result(result: &PipelineRunResult) {
    println!(
        "pipeline {} in {:.2}s",
        if result.success { "succeeded" } else { "failed" },
        result.execution_time
    );
    println!("  stocks processed:  {}", result.stocks_processed);
    println!("  prices loaded:     {}", result.prices_loaded);
    println!("  indicators:        {}", result.indicators_calculated);
    println!("  alerts:            {}", result.alerts_generated);
    println!("  recommendations:   {}", result.recommendations_generated);
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
    for e in &result.errors {
        println!("  error: {e}");
    }
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let store = match open_store(&adapter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let seeded = store
        .initialize_schema()
        .and_then(|_| store.seed_default_rules());
    match seeded {
        Ok(count) => {
            println!("schema ready, {count} default rules seeded");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let store = match open_store(&adapter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match store.get_active_symbols() {
        Ok(symbols) => {
            for record in symbols {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.symbol, record.company_name, record.sector, record.exchange
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_show_alerts(config_path: &PathBuf, date: Option<NaiveDate>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let store = match open_store(&adapter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let as_of = as_of_or_today(date);
    match store.get_alerts_for_date(as_of) {
        Ok(alerts) => {
            if alerts.is_empty() {
                println!("no alerts for {as_of}");
            }
            for alert in alerts {
                println!(
                    "{}\t{}\t{:.2}\t{}",
                    alert.severity.as_str(),
                    alert.symbol,
                    alert.trigger_value,
                    alert.message
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
