//! Providers: one per external dependency the stack needs credentials for.
//!
//! A provider collects settings interactively, checks them against the
//! service they belong to and writes them to the variable store, the MCP
//! registry and the compose profile set. The shared lifecycle lives in the
//! provided methods of [`Provider`]; concrete providers only implement
//! collection, the remote check and the list of settings.
//!
//! ```text
//! Uninitialized -> Collecting -> Valid -> Persisted
//!       |              |   ^------'
//!       |              v   |
//!       |           Invalid
//!       '---------> Disabled (from any state but Persisted)
//! ```

mod anthropic;
mod database;
mod github;
mod linear;
mod slack;

pub use anthropic::AnthropicProvider;
pub use database::{DatabaseProvider, DatabaseTarget};
pub use github::GithubProvider;
pub use linear::LinearProvider;
pub use slack::{SlackAppKind, SlackAppSpec, SlackProvider};

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    cli::{options::SetupOptions, prompt::Prompter},
    env_writer::EnvironmentVariable,
    error::SetupError,
    registry::ServiceEntry,
    store::ConfigStore,
    tiger::{ServiceProvisioner, TigerCli},
    validators::RemoteValidator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Uninitialized,
    Collecting,
    Valid,
    Invalid,
    Persisted,
    Disabled,
}

impl ProviderState {
    pub fn can_transition(self, to: ProviderState) -> bool {
        use ProviderState::*;
        matches!(
            (self, to),
            (Uninitialized, Collecting | Disabled | Persisted)
                | (Collecting, Valid | Invalid | Disabled)
                | (Invalid, Collecting | Disabled)
                | (Valid, Persisted | Collecting | Disabled)
                | (Disabled, Collecting | Disabled)
        )
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Compose profile a provider switches on when it is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileToggle {
    pub profile: &'static str,
    pub enabled: bool,
}

/// MCP registry entry a provider owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    pub name: &'static str,
    pub entry: ServiceEntry,
}

/// State shared by every provider.
#[derive(Debug, Clone)]
pub struct ProviderCore {
    name: &'static str,
    description: &'static str,
    required: bool,
    configured: bool,
    state: ProviderState,
    profile: Option<ProfileToggle>,
    registration: Option<ServiceRegistration>,
}

impl ProviderCore {
    pub fn new(
        name: &'static str,
        description: &'static str,
        required: bool,
    ) -> Self {
        Self {
            name,
            description,
            required,
            configured: false,
            state: ProviderState::Uninitialized,
            profile: None,
            registration: None,
        }
    }

    pub fn with_profile(mut self, profile: &'static str) -> Self {
        self.profile = Some(ProfileToggle {
            profile,
            enabled: false,
        });
        self
    }

    pub fn with_registration(
        mut self,
        name: &'static str,
        entry: ServiceEntry,
    ) -> Self {
        self.registration = Some(ServiceRegistration { name, entry });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn configured(&self) -> bool {
        self.configured
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    pub fn profile(&self) -> Option<&ProfileToggle> {
        self.profile.as_ref()
    }

    pub fn registration(&self) -> Option<&ServiceRegistration> {
        self.registration.as_ref()
    }

    /// Called by `collect` implementations once every setting is in hand.
    pub fn mark_configured(&mut self) {
        self.configured = true;
        if let Some(toggle) = self.profile.as_mut() {
            toggle.enabled = true;
        }
    }

    pub fn transition(&mut self, to: ProviderState) -> Result<(), SetupError> {
        if !self.state.can_transition(to) {
            return Err(SetupError::InvalidTransition {
                provider: self.name.to_string(),
                from: self.state,
                to,
            });
        }
        debug!(
            provider = self.name,
            from = %self.state,
            %to,
            "provider state change"
        );
        self.state = to;
        Ok(())
    }

    /// Drop out of the run. Collected values are kept but no longer used.
    pub fn disable(&mut self) -> Result<(), SetupError> {
        self.transition(ProviderState::Disabled)?;
        self.configured = false;
        if let Some(toggle) = self.profile.as_mut() {
            toggle.enabled = false;
        }
        Ok(())
    }

    pub(crate) fn uninitialized(&self) -> SetupError {
        SetupError::Uninitialized {
            provider: self.name.to_string(),
        }
    }
}

#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    fn core(&self) -> &ProviderCore;

    fn core_mut(&mut self) -> &mut ProviderCore;

    /// Prompt for settings. Implementations finish with
    /// [`ProviderCore::mark_configured`].
    async fn collect(
        &mut self,
        prompter: &dyn Prompter,
    ) -> Result<(), SetupError>;

    /// Remote check of the collected settings; only reached when configured.
    async fn check(&self) -> Result<bool, SetupError>;

    /// Settings as collected so far. The key set must not depend on state.
    fn settings(&self) -> Vec<EnvironmentVariable>;

    fn name(&self) -> &'static str {
        self.core().name()
    }

    fn description(&self) -> &'static str {
        self.core().description()
    }

    fn is_required(&self) -> bool {
        self.core().required()
    }

    fn is_configured(&self) -> bool {
        self.core().configured()
    }

    fn state(&self) -> ProviderState {
        self.core().state()
    }

    async fn run_collect(
        &mut self,
        prompter: &dyn Prompter,
    ) -> Result<(), SetupError> {
        self.core_mut().transition(ProviderState::Collecting)?;
        self.collect(prompter).await
    }

    /// Skipping an optional provider is success; skipping a required one
    /// is not.
    async fn validate(&self) -> Result<bool, SetupError> {
        if !self.is_configured() {
            return Ok(!self.is_required());
        }
        self.check().await
    }

    fn record_validation(&mut self, valid: bool) -> Result<(), SetupError> {
        let to = if valid {
            ProviderState::Valid
        } else {
            ProviderState::Invalid
        };
        self.core_mut().transition(to)
    }

    fn disable(&mut self) -> Result<(), SetupError> {
        self.core_mut().disable()
    }

    /// [`Provider::settings`] with values blanked unless configured.
    fn variables(&self) -> Vec<EnvironmentVariable> {
        let configured = self.is_configured();
        self.settings()
            .into_iter()
            .map(|var| {
                if configured {
                    var
                } else {
                    EnvironmentVariable::unset(var.key)
                }
            })
            .collect()
    }

    fn registry_entry(&self) -> Option<(&'static str, ServiceEntry)> {
        self.core().registration().map(|registration| {
            let mut entry = registration.entry.clone();
            entry.disabled = !self.is_configured();
            (registration.name, entry)
        })
    }

    /// Every key this provider writes is present with a non-empty value.
    fn is_already_configured(&self, current: &[EnvironmentVariable]) -> bool {
        self.settings().iter().all(|expected| {
            current
                .iter()
                .any(|var| var.key == expected.key && var.is_set())
        })
    }

    /// Reuse values already in the store without collecting.
    fn keep_existing(&mut self) -> Result<(), SetupError> {
        self.core_mut().transition(ProviderState::Persisted)
    }

    /// Write variables, registry entry and profile membership. Allowed after
    /// a successful validation or after [`Provider::disable`].
    fn persist(&mut self, store: &ConfigStore) -> Result<(), SetupError> {
        let state = self.state();
        if !matches!(state, ProviderState::Valid | ProviderState::Disabled) {
            return Err(SetupError::InvalidTransition {
                provider: self.name().to_string(),
                from: state,
                to: ProviderState::Persisted,
            });
        }

        store.upsert_env(&self.variables())?;
        if let Some((name, entry)) = self.registry_entry() {
            store.upsert_registry(&[(name, &entry)])?;
        }
        if let Some(toggle) = self.core().profile() {
            store.set_profile(
                toggle.profile,
                toggle.enabled && self.is_configured(),
            )?;
        }

        if state == ProviderState::Valid {
            self.core_mut().transition(ProviderState::Persisted)?;
        }
        Ok(())
    }
}

/// The stock provider list, in the order the wizard runs them.
pub fn default_providers(options: &SetupOptions) -> Vec<Box<dyn Provider>> {
    let validator = Arc::new(RemoteValidator::new(options.endpoints.clone()));
    let tiger: Arc<dyn ServiceProvisioner> =
        Arc::new(TigerCli::from_template(&options.tiger_cmd));

    vec![
        Box::new(DatabaseProvider::new(tiger, options.ready_wait)),
        Box::new(AnthropicProvider::new(validator.clone())),
        Box::new(SlackProvider::new(SlackAppSpec::ingest(), validator.clone())),
        Box::new(SlackProvider::new(SlackAppSpec::agent(), validator.clone())),
        Box::new(GithubProvider::new(validator.clone())),
        Box::new(LinearProvider::new(validator)),
    ]
}
