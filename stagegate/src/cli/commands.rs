//! CLI command definitions for stagegate.

use crate::config::PipelineConfig;
use crate::errors::StagegateError;
use crate::events::LoggingEventSink;
use crate::observability::LogFormat;
use crate::pipeline::{standard_pipeline, Pipeline, PipelineRun, PipelineRunner};
use crate::report::{render_plan, render_summary, to_json, write_json_report};
use crate::stages::ProcessExecutor;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

/// Exit code for configuration and usage errors.
pub const USAGE_EXIT_CODE: u8 = 2;

/// Gated build-launch-verify pipeline for the standup service.
#[derive(Parser, Debug)]
#[command(name = "stagegate")]
#[command(about = "Build, launch, and verify the standup service through ordered quality gates")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline and exit with its verdict.
    Run(RunArgs),

    /// Print the stages that would run, without running them.
    Plan(PipelineArgs),

    /// Print the effective configuration as TOML.
    Config(PipelineArgs),
}

/// Flags that shape the pipeline.
#[derive(Parser, Debug, Default, Clone)]
pub struct PipelineArgs {
    /// Configuration file. Defaults to `stagegate.toml` in the project directory.
    #[arg(short, long, env = "STAGEGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the stage commands run in.
    #[arg(short = 'C', long)]
    pub project_dir: Option<PathBuf>,

    /// Container instance name.
    #[arg(long)]
    pub instance: Option<String>,

    /// Image name to build.
    #[arg(long)]
    pub image: Option<String>,

    /// Image tag.
    #[arg(long)]
    pub tag: Option<String>,

    /// Healthcheck attempts before giving up.
    #[arg(long)]
    pub healthcheck_attempts: Option<u32>,

    /// Delay between healthcheck attempts in milliseconds.
    #[arg(long)]
    pub healthcheck_delay_ms: Option<u64>,

    /// Kill any stage command running longer than this.
    #[arg(long)]
    pub stage_timeout_secs: Option<u64>,

    /// Remove the container once the run is over.
    #[arg(long, conflicts_with = "no_teardown")]
    pub teardown: bool,

    /// Keep the container even if the config enables teardown.
    #[arg(long)]
    pub no_teardown: bool,
}

impl PipelineArgs {
    /// Loads the configuration and applies flag overrides.
    pub fn resolve_config(&self) -> Result<PipelineConfig, StagegateError> {
        let base_dir = match &self.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let mut config = PipelineConfig::discover(self.config.as_deref(), &base_dir)?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.project_dir {
            config.project_dir.clone_from(dir);
        }
        if let Some(instance) = &self.instance {
            config.container.instance.clone_from(instance);
        }
        if let Some(image) = &self.image {
            config.container.image.clone_from(image);
        }
        if let Some(tag) = &self.tag {
            config.container.tag.clone_from(tag);
        }
        if let Some(attempts) = self.healthcheck_attempts {
            config.healthcheck.attempts = attempts;
        }
        if let Some(delay_ms) = self.healthcheck_delay_ms {
            config.healthcheck.delay_ms = delay_ms;
        }
        if self.stage_timeout_secs.is_some() {
            config.stage_timeout_secs = self.stage_timeout_secs;
        }
        if self.teardown {
            config.teardown = true;
        } else if self.no_teardown {
            config.teardown = false;
        }
    }

    fn resolve_pipeline(&self) -> Result<Pipeline, StagegateError> {
        let config = self.resolve_config()?;
        Ok(standard_pipeline(&config)?)
    }
}

/// Arguments for `stagegate run`.
#[derive(Parser, Debug, Default, Clone)]
pub struct RunArgs {
    /// Pipeline flags.
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Write a JSON run report to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the run as JSON instead of a summary table.
    #[arg(long)]
    pub json: bool,
}

/// Parses CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the parsed CLI command and returns the process exit code.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Run(args) => run_command(args).await,
        Commands::Plan(args) => plan_command(&args),
        Commands::Config(args) => config_command(&args),
    }
}

async fn run_command(args: RunArgs) -> anyhow::Result<ExitCode> {
    let pipeline = match args.pipeline.resolve_pipeline() {
        Ok(pipeline) => pipeline,
        Err(err) => return Ok(usage_error(&err)),
    };

    let runner = PipelineRunner::new(Arc::new(ProcessExecutor::new()))
        .with_sink(Arc::new(LoggingEventSink::default()));
    let run = runner.run(&pipeline).await?;

    Ok(report_run(&run, &args))
}

/// Prints the run and writes the optional report file.
///
/// The exit code comes from the run alone; a report that cannot be written
/// is logged but never changes it.
fn report_run(run: &PipelineRun, args: &RunArgs) -> ExitCode {
    if args.json {
        match to_json(run) {
            Ok(json) => println!("{json}"),
            Err(err) => error!(error = %err, "Failed to render run as JSON"),
        }
    } else {
        print!("{}", render_summary(run));
    }

    if let Some(path) = &args.report {
        if let Err(err) = write_json_report(run, path) {
            error!(path = %path.display(), error = %err, "Failed to write run report");
            eprintln!("error: failed to write report '{}': {err}", path.display());
        }
    }

    let code = run.exit_code();
    info!(status = %run.status(), exit_code = code, "Pipeline finished");
    ExitCode::from(exit_byte(code))
}

fn plan_command(args: &PipelineArgs) -> anyhow::Result<ExitCode> {
    match args.resolve_pipeline() {
        Ok(pipeline) => {
            print!("{}", render_plan(&pipeline));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(usage_error(&err)),
    }
}

fn config_command(args: &PipelineArgs) -> anyhow::Result<ExitCode> {
    match args.resolve_config() {
        Ok(config) => {
            print!("{}", config.to_toml_string()?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(usage_error(&err)),
    }
}

fn usage_error(err: &StagegateError) -> ExitCode {
    error!(error = %err, "Invalid pipeline configuration");
    eprintln!("error: {err}");
    ExitCode::from(USAGE_EXIT_CODE)
}

/// Narrows a run exit code to a process exit byte.
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
