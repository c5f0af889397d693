use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cli::{prompt::Prompter, validation::validate_token_prefix},
    env_writer::EnvironmentVariable,
    error::SetupError,
    util::open_browser,
    validators::RemoteValidator,
};

use super::{Provider, ProviderCore};

const KEYS_URL: &str = "https://console.anthropic.com/settings/keys";

/// API key used by the agent to call Claude.
#[derive(Debug)]
pub struct AnthropicProvider {
    core: ProviderCore,
    validator: Arc<RemoteValidator>,
    api_key: Option<String>,
}

impl AnthropicProvider {
    pub fn new(validator: Arc<RemoteValidator>) -> Self {
        Self {
            core: ProviderCore::new(
                "Anthropic",
                "Configure the Anthropic API key, this is needed for the agent.",
                true,
            ),
            validator,
            api_key: None,
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }

    async fn collect(
        &mut self,
        prompter: &dyn Prompter,
    ) -> Result<(), SetupError> {
        if prompter.confirm("Open Anthropic Console to create API key?", true)?
        {
            open_browser(KEYS_URL);
        }
        println!("Create an Anthropic API key\n");

        let check = |value: &str| validate_token_prefix(value, "sk-ant");
        let api_key =
            prompter.input_validated("ANTHROPIC_API_KEY:", None, &check)?;
        self.api_key = Some(api_key);
        self.core.mark_configured();
        Ok(())
    }

    async fn check(&self) -> Result<bool, SetupError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| self.core.uninitialized())?;
        Ok(self.validator.anthropic_key(api_key).await)
    }

    fn settings(&self) -> Vec<EnvironmentVariable> {
        vec![EnvironmentVariable::from_option(
            "ANTHROPIC_API_KEY",
            self.api_key.as_deref(),
        )]
    }
}
