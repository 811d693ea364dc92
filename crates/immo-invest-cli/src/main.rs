mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::projection::{CashflowArgs, ScheduleArgs};
use commands::InputArgs;

/// Buy-to-let property investment calculations
#[derive(Parser)]
#[command(
    name = "immo",
    version,
    about = "Buy-to-let property investment calculations",
    long_about = "A CLI for evaluating financed rental properties with decimal precision. \
                  Supports monthly cashflow, amortization schedules, break-even equity, \
                  rate/equity sensitivity, scenarios, fair price and personalized scoring."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Policy constants as YAML (or JSON with a .json extension)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log computation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly cashflow and yields of a financed property
    Cashflow(CashflowArgs),
    /// Year-by-year amortization schedule
    Schedule(ScheduleArgs),
    /// Equity needed for a zero monthly cashflow
    BreakEven(InputArgs),
    /// Cashflow matrix over interest rates and equity levels
    Sensitivity(InputArgs),
    /// Market scenarios, rent variations and financing options
    Scenarios(InputArgs),
    /// Years in which repayment and wealth milestones are reached
    Milestones(InputArgs),
    /// Property wealth against an ETF funded with the same money
    Compare(InputArgs),
    /// Weighted fair price and negotiation target
    FairPrice(InputArgs),
    /// Profile-weighted score of an analysed property
    Score(InputArgs),
    /// Leverage, depreciation, quick check and no-go criteria
    Assess(InputArgs),
    /// Run every projection for one property
    Analyze(InputArgs),
    /// Validate raw form fields and print the parsed input
    Parse(InputArgs),
    /// Print version information
    Version,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn run(cli: Cli) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let config = input::config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Cashflow(args) => commands::projection::run_cashflow(args, &config),
        Commands::Schedule(args) => commands::projection::run_schedule(args, &config),
        Commands::BreakEven(args) => commands::projection::run_break_even(args, &config),
        Commands::Sensitivity(args) => commands::projection::run_sensitivity(args, &config),
        Commands::Scenarios(args) => commands::projection::run_scenarios(args, &config),
        Commands::Milestones(args) => commands::projection::run_milestones(args, &config),
        Commands::Compare(args) => commands::projection::run_compare(args, &config),
        Commands::FairPrice(args) => commands::valuation::run_fair_price(args, &config),
        Commands::Score(args) => commands::scoring::run_score(args),
        Commands::Assess(args) => commands::analysis::run_assess(args, &config),
        Commands::Analyze(args) => commands::analysis::run_analyze(args, &config),
        Commands::Parse(args) => commands::analysis::run_parse(args, &config),
        Commands::Version => Ok(serde_json::Value::Null),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if matches!(cli.command, Commands::Version) {
        println!("immo {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let format = cli.output.clone();
    match run(cli) {
        Ok(value) => {
            output::format_output(&format, &value);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "immo",
            "break-even",
            "--input",
            "flat.json",
            "--output",
            "minimal",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.output, OutputFormat::Minimal));
        match cli.command {
            Commands::BreakEven(args) => assert_eq!(args.input.as_deref(), Some("flat.json")),
            _ => panic!("expected break-even"),
        }
    }

    #[test]
    fn test_cashflow_flags_parse_decimals() {
        let cli = Cli::try_parse_from([
            "immo",
            "cashflow",
            "--price",
            "300000",
            "--rent",
            "950",
            "--interest-rate",
            "3.8",
        ])
        .unwrap();
        match cli.command {
            Commands::Cashflow(args) => {
                assert_eq!(args.interest_rate.map(|r| r.to_string()), Some("3.8".into()));
                assert!(args.equity.is_none());
            }
            _ => panic!("expected cashflow"),
        }
    }

    #[test]
    fn test_assess_subcommand() {
        let cli = Cli::try_parse_from(["immo", "assess", "--input", "flat.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Assess(_)));
    }
}
