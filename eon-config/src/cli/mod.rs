//! CLI-facing pieces shared by the `eon-setup` binary: options, prompts,
//! process specs, the compose starter and the wizard itself.

pub mod options;
pub mod prompt;
pub mod specs;
pub mod stack;
pub mod utils;
pub mod validation;
pub mod wizard;

pub use options::*;
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use stack::{ComposeStack, ServiceStarter};
pub use wizard::{SetupSummary, SetupWizard, WizardOutcome};

use crate::{
    error::SetupError,
    profiles::ProfileSet,
    providers::{Provider, default_providers},
    store::ConfigStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Whether the env file already holds a provider's settings.
pub struct ProviderStatus {
    pub name: String,
    pub required: bool,
    pub configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// MCP registry entry as listed by `status`.
pub struct RegistryStatus {
    pub name: String,
    pub url: Option<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Snapshot of what a previous wizard run left behind.
pub struct StatusReport {
    pub providers: Vec<ProviderStatus>,
    pub registry: Vec<RegistryStatus>,
    pub profiles: ProfileSet,
}

impl StatusReport {
    /// Every required provider has its settings in place.
    pub fn is_complete(&self) -> bool {
        self.providers
            .iter()
            .all(|provider| provider.configured || !provider.required)
    }
}

/// Read both files without prompting or touching the network.
pub fn collect_status(
    opts: &StatusOptions,
    providers: &[Box<dyn Provider>],
) -> Result<StatusReport, SetupError> {
    let store = ConfigStore::new(&opts.env_path, &opts.registry_path);
    let current = store.load_env()?;

    let providers = providers
        .iter()
        .map(|provider| ProviderStatus {
            name: provider.name().to_string(),
            required: provider.is_required(),
            configured: provider.is_already_configured(&current),
        })
        .collect();

    let registry_file = store.load_registry();
    let registry = registry_file
        .names()
        .map(|name| {
            let entry = registry_file.get(name);
            RegistryStatus {
                name: name.to_string(),
                url: entry.as_ref().map(|e| e.url.clone()),
                disabled: entry.map(|e| e.disabled).unwrap_or(false),
            }
        })
        .collect();

    Ok(StatusReport {
        providers,
        registry,
        profiles: store.load_profiles()?,
    })
}

/// `eon-setup status`: print the report for the stock provider list.
pub fn run_status(opts: &StatusOptions) -> Result<StatusReport, SetupError> {
    let setup =
        SetupOptions::new(opts.env_path.clone(), opts.registry_path.clone());
    let report = collect_status(opts, &default_providers(&setup))?;

    println!("Providers ({}):", opts.env_path.display());
    for provider in &report.providers {
        let mark = if provider.configured { "ok" } else { "--" };
        let kind = if provider.required { "required" } else { "optional" };
        println!("  [{mark}] {} ({kind})", provider.name);
    }

    println!("MCP servers ({}):", opts.registry_path.display());
    if report.registry.is_empty() {
        println!("  (none)");
    }
    for entry in &report.registry {
        let state = if entry.disabled { "disabled" } else { "enabled" };
        match &entry.url {
            Some(url) => println!("  {} -> {url} ({state})", entry.name),
            None => println!("  {} (unrecognised entry)", entry.name),
        }
    }

    if report.profiles.is_empty() {
        println!("Compose profiles: (none)");
    } else {
        println!("Compose profiles: {}", report.profiles);
    }

    if report.is_complete() {
        println!("All required providers are configured.");
    } else {
        println!("Some required providers are missing; run `eon-setup setup`.");
    }
    Ok(report)
}
