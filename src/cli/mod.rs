//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RunOverrides;

/// Partitioned, process-isolated test runner
#[derive(Parser, Debug)]
#[command(name = "partest")]
#[command(version)]
#[command(about = "Split test suites into balanced groups and run each group in its own process")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Partition the suites and run every selected group in parallel
    Run(RunArgs),

    /// Show how suites would be grouped without running them
    Plan(PlanArgs),

    /// List discovered suites and their case counts
    List(ListArgs),

    /// Generate placeholder suites
    Generate(GenerateArgs),

    /// View stored run results
    Results(ResultsArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Run one group's suites (used internally by `run`)
    #[command(hide = true)]
    Worker(WorkerArgs),
}

/// Options shared by commands that build a partition
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Number of groups (NUM_PARALLELIZATION)
    #[arg(short = 'g', long = "groups")]
    pub num_groups: Option<usize>,

    /// Comma-separated group indices to run (TEST_GROUP_INDICES)
    #[arg(short = 'i', long = "indices")]
    pub group_indices: Option<String>,

    /// Directory searched for suite files
    #[arg(short = 'd', long = "dir")]
    pub tests_dir: Option<String>,

    /// File name glob for suite files
    #[arg(long)]
    pub pattern: Option<String>,
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output format (text, json, json-pretty, csv)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save results for later inspection
    #[arg(short, long)]
    pub save: bool,

    /// Directory for saved results
    #[arg(long)]
    pub results_dir: Option<String>,

    /// Disable colored status markers
    #[arg(long)]
    pub no_color: bool,

    /// Shell used by workers to run case commands
    #[arg(long)]
    pub shell: Option<String>,
}

impl RunArgs {
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            num_groups: self.selection.num_groups,
            group_indices: self.selection.group_indices.clone(),
            tests_dir: self.selection.tests_dir.clone(),
            pattern: self.selection.pattern.clone(),
            format: self.format.clone(),
            shell: self.shell.clone(),
            save_results: self.save,
            results_dir: self.results_dir.clone(),
        }
    }
}

/// Arguments for plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output format (text, json, json-pretty, csv)
    #[arg(short, long)]
    pub format: Option<String>,

    /// List the suites in each group
    #[arg(long)]
    pub detailed: bool,
}

impl PlanArgs {
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            num_groups: self.selection.num_groups,
            group_indices: self.selection.group_indices.clone(),
            tests_dir: self.selection.tests_dir.clone(),
            pattern: self.selection.pattern.clone(),
            format: self.format.clone(),
            ..Default::default()
        }
    }
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory searched for suite files
    #[arg(short = 'd', long = "dir")]
    pub tests_dir: Option<String>,

    /// File name glob for suite files
    #[arg(long)]
    pub pattern: Option<String>,

    /// Show individual cases
    #[arg(long)]
    pub detailed: bool,
}

/// Arguments for generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Output directory
    #[arg(short = 'd', long = "dir", default_value = "tests")]
    pub dir: PathBuf,

    /// Number of suites to generate
    #[arg(long, default_value = "100")]
    pub classes: usize,

    /// Maximum cases per suite
    #[arg(long, default_value = "20")]
    pub max_cases: usize,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Probability that a generated case fails
    #[arg(long, default_value = "0.0")]
    pub fail_rate: f64,

    /// Suite file format (yaml, json)
    #[arg(short, long, default_value = "yaml")]
    pub format: String,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    #[command(subcommand)]
    pub action: ResultsAction,

    /// Results directory
    #[arg(short, long, global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ResultsAction {
    /// List stored runs
    List,

    /// Show a stored run (latest if no ID given)
    Show {
        /// Run ID
        id: Option<String>,

        /// Output format (text, json, json-pretty, csv)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Delete a stored run
    Delete {
        /// Run ID
        id: String,
    },
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./partest.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Also show environment variables
        #[arg(long)]
        env: bool,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the first one found)
        file: Option<String>,
    },

    /// Describe supported environment variables
    Env,
}

/// Arguments for the worker process
#[derive(Parser, Debug)]
pub struct WorkerArgs {
    /// Index of the group being run
    #[arg(long)]
    pub group: usize,

    /// Shell used to run case commands
    #[arg(long, default_value = "sh")]
    pub shell: String,

    /// Suite files of the group, in order
    #[arg(last = true)]
    pub suites: Vec<PathBuf>,
}
