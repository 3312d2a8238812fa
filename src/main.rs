//! partest - partitioned, process-isolated test runner
//!
//! Discovers test suites, splits them into `k` groups of near-equal total
//! case count with the Longest-Processing-Time heuristic, runs every selected
//! group in its own worker process and reports one OK/NG verdict per group.
//!
//! ## Usage
//!
//! ```bash
//! # Generate 100 placeholder suites under ./tests
//! partest generate --classes 100 --max-cases 20
//!
//! # Run everything in 4 groups
//! partest run
//!
//! # Run groups 0 and 2 of an 8-way split
//! NUM_PARALLELIZATION=8 TEST_GROUP_INDICES=0,2 partest run
//!
//! # Inspect the grouping without running anything
//! partest plan --groups 6 --detailed
//! ```
//!
//! Exit status: 0 when every selected group passed (or nothing was
//! selected), 1 when any group is NG, 2 on fatal errors.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};

mod cli;
mod config;
mod discovery;
mod executor;
mod generator;
mod models;
mod output;
mod partition;
mod results;
mod utils;

use cli::Args;
use config::{ConfigFile, EnvConfig, RunOverrides, RunSettings};
use discovery::SuiteDiscovery;
use executor::{GroupWorker, SelfLauncher, WorkerDispatcher, WorkerLauncher};
use generator::{DummySuiteGenerator, GeneratorConfig};
use models::{Partition, SuiteFile};
use output::{OutputFormat, ReportFormatter};
use results::{ResultAggregator, ResultsStorage, StoredRun};
use utils::logger::{init_logger, resolve_level};

/// Exit code for a run where every selected group passed
const EXIT_OK: u8 = 0;

/// Exit code for a run with at least one NG group
const EXIT_FAILED: u8 = 1;

/// Exit code for errors that prevent a run
const EXIT_FATAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let env = EnvConfig::load();

    let verbose = args.verbose || env.verbose.unwrap_or(false);
    init_logger(resolve_level(args.log_level.as_deref(), verbose));

    ExitCode::from(exit_status(execute(args, env).await))
}

/// Map a command result to the process exit code, logging fatal errors
fn exit_status(result: Result<u8>) -> u8 {
    result.unwrap_or_else(|e| {
        error!("{e:#}");
        EXIT_FATAL
    })
}

async fn execute(args: Args, env: EnvConfig) -> Result<u8> {
    let config_path = args.config.as_deref();

    match args.command {
        cli::Command::Run(run_args) => run_tests(run_args, config_path, &env).await,
        cli::Command::Plan(plan_args) => {
            show_plan(plan_args, config_path, &env)?;
            Ok(EXIT_OK)
        }
        cli::Command::List(list_args) => {
            list_suites(list_args, config_path, &env)?;
            Ok(EXIT_OK)
        }
        cli::Command::Generate(generate_args) => {
            generate_suites(generate_args)?;
            Ok(EXIT_OK)
        }
        cli::Command::Results(results_args) => {
            show_results(results_args)?;
            Ok(EXIT_OK)
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, config_path, &env)?;
            Ok(EXIT_OK)
        }
        cli::Command::Worker(worker_args) => Ok(run_worker(worker_args).await),
    }
}

/// Discover, partition and select according to `settings`
fn build_partition(settings: &RunSettings) -> Result<Partition<SuiteFile>> {
    let suites = SuiteDiscovery::new(&settings.tests_dir, &settings.pattern)?.discover()?;
    if suites.is_empty() {
        warn!("No suites found in {}", settings.tests_dir.display());
    }

    let groups = partition::partition(suites, settings.num_groups)?;
    let selected = partition::select(groups, settings.group_indices.as_deref());

    if let Some(indices) = &settings.group_indices {
        info!("Selected groups {:?} of {}", indices, settings.num_groups);
    }
    Ok(selected)
}

fn resolve_settings(
    overrides: &RunOverrides,
    config_path: Option<&str>,
    env: &EnvConfig,
) -> Result<RunSettings> {
    let app = config::load_app_config(config_path, env)?;
    Ok(RunSettings::resolve(overrides, env, &app))
}

async fn run_tests(
    args: cli::RunArgs,
    config_path: Option<&str>,
    env: &EnvConfig,
) -> Result<u8> {
    let settings = resolve_settings(&args.overrides(), config_path, env)?;
    let colorize = !args.no_color && std::io::stdout().is_terminal();

    let launcher = SelfLauncher::new()?
        .with_shell(&settings.shell)
        .with_stdout_to_stderr(!settings.format.streams_composition());
    execute_run(&settings, launcher, std::io::stdout(), colorize).await
}

/// Partition, dispatch and report one run.
///
/// Returns `EXIT_OK` when every selected group passed or nothing was
/// selected, `EXIT_FAILED` when any group is NG. Errors are fatal.
async fn execute_run<L, W>(
    settings: &RunSettings,
    launcher: L,
    out: W,
    colorize: bool,
) -> Result<u8>
where
    L: WorkerLauncher<SuiteFile>,
    W: Write,
{
    let groups = build_partition(settings)?;

    if groups.is_empty() {
        info!("No groups to run");
        return Ok(EXIT_OK);
    }

    let formatter = ReportFormatter::new(settings.format).with_color(colorize);
    let mut aggregator = ResultAggregator::new(formatter, out);

    let mut stored = StoredRun::new(settings.tests_dir.display().to_string(), settings.num_groups)
        .with_group_indices(settings.group_indices.clone());

    aggregator.announce(&groups)?;
    let outcomes = WorkerDispatcher::new(launcher).dispatch(&groups).await;
    let report = aggregator.finish(&groups, &outcomes)?;
    let success = report.success;

    if settings.save_results {
        let storage = settings
            .results_dir
            .as_ref()
            .map(ResultsStorage::new)
            .unwrap_or_else(ResultsStorage::default_dir);
        stored.complete(report);
        if let Err(e) = storage.save(&stored) {
            warn!("Failed to save results: {e:#}");
        }
    }

    Ok(if success { EXIT_OK } else { EXIT_FAILED })
}

async fn run_worker(args: cli::WorkerArgs) -> u8 {
    let summary = GroupWorker::new(args.group)
        .with_shell(args.shell)
        .run_paths(&args.suites)
        .await;

    if summary.is_all_passed() {
        EXIT_OK
    } else {
        EXIT_FAILED
    }
}

fn show_plan(args: cli::PlanArgs, config_path: Option<&str>, env: &EnvConfig) -> Result<()> {
    let settings = resolve_settings(&args.overrides(), config_path, env)?;
    let groups = build_partition(&settings)?;
    print!("{}", render_plan(settings.format, &groups, args.detailed)?);
    Ok(())
}

/// The plan document in `format`; `detailed` lists suites in text output
fn render_plan(
    format: OutputFormat,
    groups: &[models::TestGroup<SuiteFile>],
    detailed: bool,
) -> Result<String> {
    let formatter = ReportFormatter::new(format);
    let composition = results::composition(groups);

    Ok(match format {
        OutputFormat::Json => serde_json::to_string(&composition)? + "\n",
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&composition)? + "\n",
        OutputFormat::Csv => formatter.format_composition_csv(&composition)?,
        OutputFormat::Text if detailed => formatter.format_plan(groups),
        OutputFormat::Text => formatter.format_composition(&composition),
    })
}

fn list_suites(args: cli::ListArgs, config_path: Option<&str>, env: &EnvConfig) -> Result<()> {
    let overrides = RunOverrides {
        tests_dir: args.tests_dir,
        pattern: args.pattern,
        ..Default::default()
    };
    let settings = resolve_settings(&overrides, config_path, env)?;
    let discovery = SuiteDiscovery::new(&settings.tests_dir, &settings.pattern)?;
    let suites = discovery.discover()?;

    if suites.is_empty() {
        println!("No suites found in {}", discovery.root().display());
        return Ok(());
    }

    let mut total = 0;
    for suite in &suites {
        if let Some(error) = &suite.load_error {
            println!("{:40} unloadable: {}", suite.path.display(), error);
            continue;
        }
        println!(
            "{:40} {:30} {:>4} cases",
            suite.path.display(),
            suite.name,
            suite.case_count()
        );
        if args.detailed {
            for case in &suite.cases {
                println!("    - {:20} {}", case.name, case.run);
            }
        }
        total += suite.case_count();
    }

    println!("\n{} suites, {} cases", suites.len(), total);
    Ok(())
}

fn generate_suites(args: cli::GenerateArgs) -> Result<()> {
    let config = GeneratorConfig {
        classes: args.classes,
        max_cases: args.max_cases,
        fail_rate: args.fail_rate,
        seed: args.seed,
        extension: args.format,
    };

    let paths = DummySuiteGenerator::new(config)?.write_to(&args.dir)?;
    println!("Generated {} suites in {}", paths.len(), args.dir.display());
    Ok(())
}

fn show_results(args: cli::ResultsArgs) -> Result<()> {
    let storage = args
        .dir
        .as_ref()
        .map(ResultsStorage::new)
        .unwrap_or_else(ResultsStorage::default_dir);

    match args.action {
        cli::ResultsAction::List => {
            let runs = storage.list()?;
            if runs.is_empty() {
                println!("No stored results in {}", storage.base_dir().display());
                println!("Save a run with: partest run --save");
                return Ok(());
            }

            println!(
                "{:22} {:20} {:>6} {:>6} {:>6}  Result",
                "ID", "Started", "Groups", "Ran", "Failed"
            );
            for run in runs {
                println!(
                    "{:22} {:20} {:>6} {:>6} {:>6}  {}",
                    run.id,
                    run.started_at.format("%Y-%m-%d %H:%M:%S"),
                    run.num_groups,
                    run.groups_run,
                    run.failed,
                    if run.success { "OK" } else { "NG" }
                );
            }
        }

        cli::ResultsAction::Show { id, format } => {
            let run = match id {
                Some(id) => storage.load(&id)?,
                None => storage
                    .latest()?
                    .context("No stored results; save a run with `partest run --save`")?,
            };

            let format = OutputFormat::from_str(&format)
                .with_context(|| format!("Unknown format: {format}"))?;
            if format == OutputFormat::Text {
                println!("Run:      {}", run.id);
                println!("Started:  {}", run.started_at.to_rfc3339());
                println!("Duration: {}ms", run.duration_ms);
                println!("Tests:    {}", run.tests_dir);
                println!("Groups:   {}", run.num_groups);
                if let Some(indices) = &run.group_indices {
                    println!("Selected: {indices:?}");
                }
                println!();
            }
            print!("{}", ReportFormatter::new(format).format_report(&run.report)?);
            if format != OutputFormat::Text && format != OutputFormat::Csv {
                println!();
            }
        }

        cli::ResultsAction::Delete { id } => {
            if storage.delete(&id)? {
                println!("Deleted run {id}");
            } else {
                anyhow::bail!("No stored run with id {id}");
            }
        }
    }

    Ok(())
}

fn manage_config(
    args: cli::ConfigArgs,
    config_path: Option<&str>,
    env: &EnvConfig,
) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("Configuration file created: {output}");
        }

        cli::ConfigAction::Show { format, env: show_env } => {
            if show_env {
                if env.has_any() {
                    env.print_summary();
                } else {
                    println!("No partest environment variables set");
                }
                println!();
            }

            let config = ConfigFile {
                app: config::load_app_config(config_path, env)?,
                ..ConfigFile::default()
            };
            let output = if format == "json" {
                serde_json::to_string_pretty(&config)?
            } else {
                serde_yaml::to_string(&config)?
            };
            println!("{output}");
        }

        cli::ConfigAction::Validate { file } => {
            let path = match file {
                Some(file) => file,
                None => ConfigFile::find()
                    .map(|p| p.display().to_string())
                    .context("No configuration file found")?,
            };

            ConfigFile::load(&path)
                .with_context(|| format!("Configuration file is invalid: {path}"))?;
            println!("Configuration file is valid: {path}");
        }

        cli::ConfigAction::Env => {
            config::env::print_env_help();
            println!();
            println!(
                "Without configuration, suites are split into {} groups.",
                config::DEFAULT_NUM_GROUPS
            );
        }
    }

    Ok(())
}
