// carjoin - fuzzy price join from the command line

mod exit_codes;
mod join;
mod source;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use carjoin_recon::SimilarityMetric;
use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "carjoin")]
#[command(about = "Attach reference prices to vehicle records by fuzzy key matching")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a join from a TOML config file
    #[command(after_help = "\
Examples:
  carjoin run tx-kbb.join.toml
  carjoin run tx-kbb.join.toml --output enriched.csv
  carjoin run tx-kbb.join.toml --json > report.json
  carjoin run tx-kbb.join.toml --report report.json --fail-on-empty")]
    Run {
        /// Path to the .join.toml config file
        config: PathBuf,

        /// Print the JSON report to stdout instead of the enriched CSV
        #[arg(long)]
        json: bool,

        /// Write the JSON report to file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write the enriched CSV here (overrides [output].file)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Exit 7 when no target row receives a price
        #[arg(long)]
        fail_on_empty: bool,

        /// Suppress the summary on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate a join config without running
    #[command(after_help = "\
Examples:
  carjoin validate tx-kbb.join.toml")]
    Validate {
        /// Path to the .join.toml config file
        config: PathBuf,
    },

    /// Print the similarity of two keys
    #[command(after_help = "\
Examples:
  carjoin score '2022 TOY CAM' '2022 TOYOTA CAMRY'
  carjoin score '2010 FOR F-1' '2010 FORD F150' --metric levenshtein")]
    Score {
        a: String,
        b: String,

        /// sequence, levenshtein or jaro_winkler
        #[arg(long, default_value = "sequence")]
        metric: SimilarityMetric,

        /// Also report whether the pair clears this cutoff
        #[arg(long)]
        cutoff: Option<f64>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("CARJOIN_GIT_HASH"), ")",
        "\nengine:  carjoin-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("CARJOIN_TARGET"), " (", env!("CARJOIN_PROFILE"), ")",
    )
}

/// `CARJOIN_LOG` takes an env-filter directive; otherwise `default` applies.
fn init_logging(default: &str) {
    let filter = EnvFilter::try_from_env("CARJOIN_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = matches!(cli.command, Commands::Run { quiet: true, .. });
    init_logging(if quiet { "error" } else { "warn" });

    let result = match cli.command {
        Commands::Run { config, json, report, output, fail_on_empty, quiet } => join::cmd_run(
            config,
            join::RunOptions { json, report, output, fail_on_empty, quiet },
        ),
        Commands::Validate { config } => join::cmd_validate(config),
        Commands::Score { a, b, metric, cutoff } => cmd_score(&a, &b, metric, cutoff),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: exit_codes::EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn cmd_score(a: &str, b: &str, metric: SimilarityMetric, cutoff: Option<f64>) -> Result<(), CliError> {
    let score = metric.ratio(a, b);
    match cutoff {
        None => println!("{score:.4}"),
        Some(c) if (0.0..=1.0).contains(&c) => {
            let verdict = if score >= c { "match" } else { "no match" };
            println!("{score:.4}\t{verdict}");
        }
        Some(c) => {
            return Err(CliError::args(format!("--cutoff must be within [0, 1], got {c}"))
                .with_hint("the default join cutoff is 0.6"));
        }
    }
    Ok(())
}
