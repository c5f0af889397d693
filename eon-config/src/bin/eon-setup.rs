use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use eon_config::{
    cli::{
        self, ComposeStack, Prompter, ReadyWaitPolicy, ScriptedPrompter,
        SetupOptions, SetupWizard, StatusOptions, TerminalPrompter,
        WizardOutcome, utils::compose_root,
    },
    constants::{DEFAULT_ENV_FILE, DEFAULT_REGISTRY_FILE, DEFAULT_TIGER_CMD},
    default_providers,
    store::ConfigStore,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "eon-setup",
    version,
    about = "Interactive setup for the Tiger Agent stack"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    files: FileArgs,

    #[command(flatten)]
    setup: SetupArgs,
}

#[derive(Args, Clone)]
struct FileArgs {
    /// Variable store read by docker compose
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,
    /// MCP service registry read by the agent
    #[arg(long, global = true, default_value = DEFAULT_REGISTRY_FILE)]
    registry_file: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Run the setup wizard (default)
    Setup,
    /// Show which providers, MCP servers and profiles are configured
    Status,
}

#[derive(Args, Clone)]
struct SetupArgs {
    /// Tiger CLI command line, split on whitespace
    #[arg(long, global = true, env = "TIGER_CMD")]
    tiger_cmd: Option<String>,
    /// How often to poll a new database for readiness
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    ready_interval: Option<Duration>,
    /// Give up waiting for a new database after this long
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    ready_timeout: Option<Duration>,
    /// Never offer to start services at the end
    #[arg(long, global = true)]
    no_start: bool,
    /// Directory to run docker compose in (defaults to the env file's dir)
    #[arg(long, global = true)]
    compose_root: Option<PathBuf>,
    /// Answer prompts from this file, one answer per line
    #[arg(long, global = true, env = "EON_SETUP_SCRIPT")]
    script: Option<PathBuf>,
}

impl SetupArgs {
    fn options(&self, files: &FileArgs) -> SetupOptions {
        let mut opts = SetupOptions::new(
            files.env_file.clone(),
            files.registry_file.clone(),
        );
        opts.tiger_cmd = self
            .tiger_cmd
            .as_deref()
            .map(|cmd| cmd.split_whitespace().map(str::to_string).collect())
            .filter(|parts: &Vec<String>| !parts.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_TIGER_CMD.to_string()]);
        let defaults = ReadyWaitPolicy::default();
        opts.ready_wait = ReadyWaitPolicy {
            interval: self.ready_interval.unwrap_or(defaults.interval),
            timeout: self.ready_timeout.unwrap_or(defaults.timeout),
        };
        opts.start_services = !self.no_start;
        opts.compose_root = self.compose_root.clone();
        opts
    }
}

async fn run_setup(args: SetupArgs, files: &FileArgs) -> Result<()> {
    let opts = args.options(files);
    let prompter: Box<dyn Prompter> = match &args.script {
        Some(path) => {
            Box::new(ScriptedPrompter::from_file(path).with_context(|| {
                format!("failed to load answers from {}", path.display())
            })?)
        }
        None => Box::new(TerminalPrompter::new()),
    };

    let store = ConfigStore::new(&opts.env_path, &opts.registry_path);
    let mut wizard =
        SetupWizard::new(store, prompter.as_ref(), default_providers(&opts));
    if opts.start_services {
        wizard = wizard
            .with_starter(Box::new(ComposeStack::new(compose_root(&opts))));
    }

    match wizard.run().await? {
        WizardOutcome::Cancelled | WizardOutcome::KeptExisting => {}
        WizardOutcome::Completed(summary) => info!(
            configured = summary.configured.len(),
            retained = summary.retained.len(),
            disabled = summary.disabled.len(),
            started = summary.services_started,
            "setup finished"
        ),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Status) => cli::run_status(&StatusOptions {
            env_path: cli.files.env_file.clone(),
            registry_path: cli.files.registry_file.clone(),
        })
        .map(|_| ())
        .map_err(Into::into),
        Some(Command::Setup) | None => run_setup(cli.setup, &cli.files).await,
    };

    if let Err(err) = &result {
        error!("Setup failed: {err:#}");
    }
    result
}
