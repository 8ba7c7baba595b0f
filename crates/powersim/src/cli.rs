//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use powersim_core::TestKind;

#[derive(Parser, Debug)]
#[command(name = "powersim")]
#[command(about = "Monte Carlo power analysis for two-sample comparisons of means")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options shared by every subcommand. Flags override the study file.
#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    /// Study file (YAML); defaults to ~/.powersim/study.yaml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Replicates simulated per power estimate
    #[arg(long, global = true)]
    pub sims: Option<usize>,

    /// Significance threshold
    #[arg(long, global = true)]
    pub alpha: Option<f64>,

    /// t-test variant
    #[arg(long, global = true, value_enum)]
    pub test: Option<TestArg>,

    /// Seed for the random source; a random seed is chosen and logged when omitted
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Report format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Write the report to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Estimate power for one design
    Estimate {
        /// Mean difference between the two unit-variance groups
        #[arg(short, long, allow_hyphen_values = true)]
        effect_size: f64,

        /// Observations per group
        #[arg(short, long)]
        n: usize,
    },
    /// Find the smallest per-group n that reaches a target power
    Search {
        /// Target power in (0, 1]
        #[arg(short, long)]
        target: Option<f64>,

        #[arg(short, long, allow_hyphen_values = true)]
        effect_size: Option<f64>,

        #[arg(long)]
        start_n: Option<usize>,

        /// Give up after this n
        #[arg(long)]
        max_n: Option<usize>,

        /// Give up after this many seconds
        #[arg(long)]
        time_budget_secs: Option<f64>,
    },
    /// Estimate power over a grid of effect sizes and sample sizes
    Sweep {
        /// Comma list (10,20,30) or inclusive range start:stop:step (10:50:5)
        #[arg(long)]
        sample_sizes: Option<String>,

        /// Comma list (0.2,0.5) or inclusive range start:stop:step (0.2:0.9:0.1)
        #[arg(long, allow_hyphen_values = true)]
        effect_sizes: Option<String>,

        /// Power level used for the per-effect minimum n column
        #[arg(short, long)]
        target: Option<f64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestArg {
    Student,
    Welch,
}

impl From<TestArg> for TestKind {
    fn from(arg: TestArg) -> Self {
        match arg {
            TestArg::Student => TestKind::StudentT,
            TestArg::Welch => TestKind::WelchT,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
}
