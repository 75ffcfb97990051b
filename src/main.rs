use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use taskprobe::config::{load_config, SettingsBuilder, SettingsOverrides};
use taskprobe::credential::{CredentialSource, TOKEN_ENV};
use taskprobe::executor::HttpExecutor;
use taskprobe::scenario::{task_api_steps, SUITE_TITLE};
use taskprobe::suite::{write_report, ConsoleReporter, Orchestrator, TestStep};

#[derive(Parser, Debug)]
#[command(
    name = "taskprobe",
    version,
    about = "Sequential conformance checks for the task management API",
    disable_help_subcommand = true
)]
struct Cli {
    /// Base endpoint every request path is appended to
    #[arg(long, env = "TASKPROBE_BASE_URL")]
    base_url: Option<String>,

    /// Token to send in the Authorization header
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Saved `aws cognito-idp initiate-auth` output to read the token from
    #[arg(short, long)]
    auth_file: Option<PathBuf>,

    /// Directory or file containing taskprobe.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Select a profile from taskprobe.json
    #[arg(short = 'P', long)]
    profile: Option<String>,

    /// Env file with values for config placeholders
    #[arg(short, long)]
    env: Option<PathBuf>,

    /// Characters of response body to show for failing steps
    #[arg(short, long)]
    preview: Option<usize>,

    /// Per-request timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// Write a JSON report of the run to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the steps without running them
    #[arg(long)]
    list: bool,

    /// Log requests and captured bindings to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Override base directory used for resolving paths
    #[arg(long)]
    cwd: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    taskprobe::logging::init_cli(cli.verbose);

    let base_dir = match &cli.cwd {
        Some(dir) => resolve_path(dir)?,
        None => std::env::current_dir()?,
    };

    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .unwrap_or_else(|| base_dir.clone());
    let config = load_config(&config_target).context("loading configuration")?;

    let settings = SettingsBuilder::new(
        base_dir.clone(),
        config,
        SettingsOverrides {
            base_url: cli.base_url.clone(),
            auth_file: cli.auth_file.clone(),
            env_file: cli.env.clone(),
            profile: cli.profile.clone(),
            preview_chars: cli.preview,
            timeout_secs: cli.timeout,
        },
    )
    .build()
    .context("resolving settings")?;

    let steps = task_api_steps();

    if cli.list {
        print_plan(&settings.base_url, &steps);
        return Ok(ExitCode::SUCCESS);
    }

    let credential = CredentialSource::select(cli.token.clone(), settings.auth_file.clone())
        .load()
        .await
        .context("loading credential")?;
    println!("\n📋 Token loaded (length: {})", credential.len());

    let executor = HttpExecutor::new(settings.executor_options())?;
    let orchestrator = Orchestrator::new(executor);
    let mut reporter = ConsoleReporter::stdout(SUITE_TITLE, settings.preview_chars);

    let report = orchestrator
        .run(&steps, Some(credential), &mut reporter)
        .await;

    if let Some(path) = &cli.report {
        write_report(
            &resolve_relative(&base_dir, path),
            &report,
            &settings.base_url,
        )?;
    }

    Ok(if report.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_plan(base_url: &str, steps: &[TestStep]) {
    println!("{} {}", "Target:".bold(), base_url.cyan());
    for (index, step) in steps.iter().enumerate() {
        let auth = if step.uses_credential { "" } else { " (no auth)" };
        println!(
            "{:>3}. {} {} {}{}",
            index + 1,
            step.method.as_str().bold(),
            step.path.cyan(),
            format!("expect {}", step.expected_status).dimmed(),
            auth.yellow()
        );
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
