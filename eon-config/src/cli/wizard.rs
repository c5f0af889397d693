//! End-to-end setup flow: existing-file handling, the provider loop and
//! optional service startup.

use std::fs;

use dialoguer::console::style;
use tracing::{error, info, warn};

use crate::{
    cli::{
        prompt::Prompter,
        stack::ServiceStarter,
        utils::backup_path_now,
    },
    env_writer::EnvironmentVariable,
    error::SetupError,
    providers::Provider,
    store::ConfigStore,
};

/// What to do with a non-empty env file found at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingConfigAction {
    Modify,
    Fresh,
    Keep,
}

impl ExistingConfigAction {
    const ALL: [ExistingConfigAction; 3] = [
        ExistingConfigAction::Modify,
        ExistingConfigAction::Fresh,
        ExistingConfigAction::Keep,
    ];

    fn label(self) -> &'static str {
        match self {
            ExistingConfigAction::Modify => "Modify the existing configuration",
            ExistingConfigAction::Fresh => "Start fresh with new configuration",
            ExistingConfigAction::Keep => {
                "Keep existing configuration and exit"
            }
        }
    }
}

/// Per-provider result of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupSummary {
    /// Collected, validated and written during this run.
    pub configured: Vec<String>,
    /// Already present in the env file and kept as is.
    pub retained: Vec<String>,
    /// Optional providers the user skipped.
    pub disabled: Vec<String>,
    pub services_started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    /// The user declined to continue at the intro.
    Cancelled,
    /// An env file existed and the user chose to leave it alone.
    KeptExisting,
    Completed(SetupSummary),
}

/// Drives the providers in order against one [`ConfigStore`].
pub struct SetupWizard<'a> {
    store: ConfigStore,
    prompter: &'a dyn Prompter,
    providers: Vec<Box<dyn Provider>>,
    starter: Option<Box<dyn ServiceStarter>>,
}

impl std::fmt::Debug for SetupWizard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupWizard")
            .field("store", &self.store)
            .field("providers", &self.providers)
            .field("starter", &self.starter.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> SetupWizard<'a> {
    pub fn new(
        store: ConfigStore,
        prompter: &'a dyn Prompter,
        providers: Vec<Box<dyn Provider>>,
    ) -> Self {
        Self {
            store,
            prompter,
            providers,
            starter: None,
        }
    }

    /// Offer to start services once every provider is persisted.
    pub fn with_starter(mut self, starter: Box<dyn ServiceStarter>) -> Self {
        self.starter = Some(starter);
        self
    }

    pub fn providers(&self) -> &[Box<dyn Provider>] {
        &self.providers
    }

    pub async fn run(&mut self) -> Result<WizardOutcome, SetupError> {
        print_intro();
        if !self
            .prompter
            .confirm("Do you want to continue with the setup?", true)?
        {
            info!("Setup cancelled by user.");
            return Ok(WizardOutcome::Cancelled);
        }

        let Some(existing) = self.check_existing_config()? else {
            info!("Keeping existing configuration. Exiting.");
            return Ok(WizardOutcome::KeptExisting);
        };

        let mut summary = SetupSummary::default();
        for provider in self.providers.iter_mut() {
            configure_provider(
                provider.as_mut(),
                &existing,
                &self.store,
                self.prompter,
                &mut summary,
            )
            .await?;
        }

        summary.services_started = self.start_services().await?;
        print_complete(&summary);
        Ok(WizardOutcome::Completed(summary))
    }

    /// Returns the variables to use for "already configured" detection, or
    /// `None` when the user wants to keep the current file untouched.
    fn check_existing_config(
        &self,
    ) -> Result<Option<Vec<EnvironmentVariable>>, SetupError> {
        let current = self.store.load_env()?;
        if current.is_empty() {
            info!("No .env file, starting with a fresh setup");
            return Ok(Some(current));
        }

        let labels: Vec<String> = ExistingConfigAction::ALL
            .iter()
            .map(|action| action.label().to_string())
            .collect();
        let choice = self.prompter.select(
            "Found existing .env file. What would you like to do?",
            &labels,
            0,
        )?;

        match ExistingConfigAction::ALL
            .get(choice)
            .copied()
            .unwrap_or(ExistingConfigAction::Modify)
        {
            ExistingConfigAction::Modify => Ok(Some(current)),
            ExistingConfigAction::Fresh => {
                let env_path = self.store.env_path();
                let backup = backup_path_now(env_path);
                fs::rename(env_path, &backup)
                    .map_err(|e| SetupError::write(&backup, e))?;
                info!("Backed up existing .env file to {}", backup.display());
                Ok(Some(Vec::new()))
            }
            ExistingConfigAction::Keep => Ok(None),
        }
    }

    async fn start_services(&self) -> Result<bool, SetupError> {
        let Some(starter) = &self.starter else {
            return Ok(false);
        };

        println!("\n{}", style("=== Starting Services ===").bold());

        let missing_password = self
            .store
            .load_env()?
            .iter()
            .any(|var| var.key == "PGPASSWORD" && !var.is_set());
        if missing_password {
            warn!("Database password is missing, skipping service startup.");
            return Ok(false);
        }

        if !self
            .prompter
            .confirm("Do you want to start the selected services now?", true)?
        {
            return Ok(false);
        }

        match starter.start().await {
            Ok(()) => Ok(true),
            Err(err) => {
                error!("Failed to start services: {err:#}");
                println!(
                    "Configuration written successfully, but service startup failed."
                );
                println!(
                    "You can manually start services later by running: {}",
                    starter.manual_command()
                );
                Ok(false)
            }
        }
    }
}

/// One provider's pass through the lifecycle.
async fn configure_provider(
    provider: &mut dyn Provider,
    existing: &[EnvironmentVariable],
    store: &ConfigStore,
    prompter: &dyn Prompter,
    summary: &mut SetupSummary,
) -> Result<(), SetupError> {
    let name = provider.name();
    println!("\n{}", style(format!("{name} Configuration")).cyan().bold());
    println!("{}", style(provider.description()).dim());

    if provider.is_already_configured(existing)
        && prompter.confirm(
            "This is already configured, do you want to keep existing config?",
            true,
        )?
    {
        provider.keep_existing()?;
        summary.retained.push(name.to_string());
        return Ok(());
    }

    if !provider.is_required()
        && !prompter.confirm(
            "This service is optional, do you wish to set this up?",
            true,
        )?
    {
        provider.disable()?;
        provider.persist(store)?;
        info!("Skipped {name}");
        summary.disabled.push(name.to_string());
        return Ok(());
    }

    loop {
        provider.run_collect(prompter).await?;
        let valid = provider.validate().await?;
        provider.record_validation(valid)?;
        if valid {
            break;
        }
        warn!("{name} configuration could not be validated, please try again");
    }

    provider.persist(store)?;
    info!("{name} configuration saved");
    summary.configured.push(name.to_string());
    Ok(())
}

fn print_intro() {
    let rule = "==================================================";
    println!("{rule}");
    println!("     {}", style("Tiger Agent Interactive Setup").bold());
    println!("{rule}");
    println!();
    println!("Hi! I'm eon, a TigerData agent!");
    println!(
        "I'm going to guide you through the setup with the services you need."
    );
    println!();
    println!("The core install includes the following:");
    println!(
        "  - a Slack App for the ingest service that will receive all messages/reactions from public channels"
    );
    println!("  - a Slack App for the agent that will receive @mentions to it");
    println!("  - a TimescaleDB instance to store the above data");
    println!();
    println!("This is the workflow that we will use:");
    println!("1. Choose between using free Tiger Cloud DB or local Docker DB");
    println!("2. Gather Anthropic API token");
    println!("3. Create Slack App for Ingest & gather tokens");
    println!("4. Create Slack App for Agent & gather tokens");
    println!("5. Determine which optional MCP servers to configure");
    println!("6. Gather required variables for optional MCP servers");
    println!("7. Write the .env file");
    println!("8. Optionally, spin up the selected services");
    println!();
}

fn print_complete(summary: &SetupSummary) {
    println!("\n{}\n", style("Tiger Agent setup complete!").green().bold());
    if summary.services_started {
        info!("Started all services");
    } else {
        info!("Skipped service startup.");
    }

    println!("To control service containers, you can:");
    println!("  - Start services: docker compose up -d --build");
    println!("  - Stop services: docker compose down");
    println!("  - Check logs: docker compose logs -f tiger-agent");
    println!("  - View services: docker compose ps");

    if summary.services_started {
        println!("\nYour Tiger Agent is ready to use in Slack!");
    }
}
