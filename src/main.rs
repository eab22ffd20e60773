//! SCI finance engine CLI
//!
//! Reads JSON/CSV inputs, runs the engine and writes JSON (or CSV) results.
//!
//! ```bash
//! sci-finance-engine schedule --input loan.json --annual
//! sci-finance-engine outstanding --loans loans.csv --as-of 2034-01-01
//! sci-finance-engine project --input request.json --csv years.csv
//! sci-finance-engine performance --input performance.json --loans loans.csv
//! sci-finance-engine scenarios --input request.json
//! ```

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use sci_finance_engine::input::{LoanTermsInput, PerformanceRequest, ProjectionRequest};
use sci_finance_engine::loan::{self, schedule, LoanBook};
use sci_finance_engine::money::round_cents;
use sci_finance_engine::{EngineDefaults, PerformanceSummary, ProjectionEngine, ScenarioRunner};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sci-finance-engine")]
#[command(version, about = "Loan, projection and performance engine for property holding companies")]
struct Cli {
    /// Engine defaults as JSON (environment overrides still apply)
    #[arg(long, global = true)]
    defaults: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortization schedule of one loan
    Schedule {
        /// Loan terms as JSON
        #[arg(long)]
        input: PathBuf,
        /// Also write the rows as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print totals per loan year instead of monthly rows
        #[arg(long)]
        annual: bool,
    },

    /// Outstanding principal of every loan in a CSV file
    Outstanding {
        #[arg(long)]
        loans: PathBuf,
        /// Valuation date (YYYY-MM-DD)
        #[arg(long)]
        as_of: NaiveDate,
    },

    /// Multi-year projection with summary
    Project {
        #[arg(long)]
        input: PathBuf,
        /// Loans as CSV, replacing those in the request
        #[arg(long)]
        loans: Option<PathBuf>,
        /// Also write the yearly rows as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Performance ratios of the current portfolio
    Performance {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        loans: Option<PathBuf>,
    },

    /// Run every scenario listed in a projection request
    Scenarios {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        loans: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutstandingLine {
    loan_id: u32,
    label: String,
    outstanding: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutstandingReport {
    as_of: NaiveDate,
    loans: Vec<OutstandingLine>,
    total: f64,
    monthly_debt_service: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let defaults = load_defaults(cli.defaults.as_deref())?;

    match cli.command {
        Commands::Schedule { input, csv, annual } => run_schedule(&input, csv.as_deref(), annual, &defaults),
        Commands::Outstanding { loans, as_of } => run_outstanding(&loans, as_of, &defaults),
        Commands::Project { input, loans, csv } => {
            run_project(&input, loans.as_deref(), csv.as_deref(), &defaults)
        }
        Commands::Performance { input, loans } => run_performance(&input, loans.as_deref(), &defaults),
        Commands::Scenarios { input, loans } => run_scenarios(&input, loans.as_deref(), &defaults),
    }
}

fn load_defaults(path: Option<&Path>) -> Result<EngineDefaults> {
    let defaults = match path {
        Some(path) => EngineDefaults::from_json_path(path)
            .with_context(|| format!("Failed to load defaults from {}", path.display()))?,
        None => EngineDefaults::default(),
    };
    Ok(defaults.with_env_overrides())
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_book(path: &Path, defaults: &EngineDefaults) -> Result<LoanBook> {
    let book = loan::load_loan_book(path, defaults)
        .with_context(|| format!("Failed to load loans from {}", path.display()))?;
    info!("Loaded {} loans from {}", book.len(), path.display());
    Ok(book)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn run_schedule(input: &Path, csv_out: Option<&Path>, annual: bool, defaults: &EngineDefaults) -> Result<()> {
    let raw: LoanTermsInput = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("Invalid loan JSON in {}", input.display()))?;
    let terms = raw.into_terms(defaults)?;
    let rows = schedule::compute(&terms)?;

    if annual {
        let years: Vec<_> = schedule::annual_summary(&rows).iter().map(|y| y.rounded()).collect();
        if let Some(path) = csv_out {
            write_csv(path, &years)?;
        }
        return print_json(&years);
    }

    let rows: Vec<_> = rows.iter().map(|row| row.rounded()).collect();
    if let Some(path) = csv_out {
        write_csv(path, &rows)?;
    }
    print_json(&rows)
}

fn run_outstanding(loans: &Path, as_of: NaiveDate, defaults: &EngineDefaults) -> Result<()> {
    let book = load_book(loans, defaults)?;

    let lines = book
        .iter()
        .map(|loan| OutstandingLine {
            loan_id: loan.loan_id,
            label: loan.label.clone(),
            outstanding: round_cents(loan::outstanding::estimate(&loan.terms, as_of)),
        })
        .collect();

    print_json(&OutstandingReport {
        as_of,
        loans: lines,
        total: round_cents(book.total_outstanding(as_of)),
        monthly_debt_service: round_cents(book.monthly_debt_service(as_of)),
    })
}

fn run_project(
    input: &Path,
    loans: Option<&Path>,
    csv_out: Option<&Path>,
    defaults: &EngineDefaults,
) -> Result<()> {
    let request = ProjectionRequest::from_json(&read_input(input)?)
        .with_context(|| format!("Invalid projection request in {}", input.display()))?;
    let mut case = request.into_case(defaults)?;
    if let Some(path) = loans {
        case.loans = load_book(path, defaults)?;
    }

    let engine = ProjectionEngine::new(defaults.clone());
    let result = engine
        .project_with_summary(
            &case.snapshot,
            &case.hypotheses,
            case.duration_years,
            &case.loans.terms(),
            case.start_date,
        )?
        .rounded();

    if let Some(path) = csv_out {
        write_csv(path, &result.years)?;
    }
    print_json(&result)
}

fn run_performance(input: &Path, loans: Option<&Path>, defaults: &EngineDefaults) -> Result<()> {
    let request = PerformanceRequest::from_json(&read_input(input)?)
        .with_context(|| format!("Invalid performance request in {}", input.display()))?;
    let mut case = request.into_case(defaults)?;
    if let Some(path) = loans {
        case.loans = load_book(path, defaults)?;
    }

    let projection = match &case.projection {
        Some((hypotheses, duration_years)) => Some(ProjectionEngine::new(defaults.clone()).project_with_summary(
            &case.snapshot,
            hypotheses,
            *duration_years,
            &case.loans.terms(),
            case.as_of,
        )?),
        None => None,
    };

    let summary =
        PerformanceSummary::from_portfolio(&case.snapshot, &case.loans, case.as_of, projection.as_ref());
    print_json(&summary.rounded())
}

fn run_scenarios(input: &Path, loans: Option<&Path>, defaults: &EngineDefaults) -> Result<()> {
    let request = ProjectionRequest::from_json(&read_input(input)?)
        .with_context(|| format!("Invalid projection request in {}", input.display()))?;
    let mut case = request.into_case(defaults)?;
    if case.scenarios.is_empty() {
        bail!("{} lists no scenarios", input.display());
    }
    if let Some(path) = loans {
        case.loans = load_book(path, defaults)?;
    }

    let runner = ScenarioRunner::new(defaults.clone());
    let outcomes = runner.run_scenarios(
        &case.snapshot,
        &case.scenarios,
        case.duration_years,
        &case.loans,
        case.start_date,
    )?;
    info!("Ran {} scenarios", outcomes.len());

    let outcomes: Vec<_> = outcomes
        .into_iter()
        .map(|mut outcome| {
            outcome.result = outcome.result.rounded();
            outcome
        })
        .collect();
    print_json(&outcomes)
}
