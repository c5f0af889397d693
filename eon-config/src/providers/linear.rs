use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cli::{prompt::Prompter, validation::validate_non_empty},
    env_writer::EnvironmentVariable,
    error::SetupError,
    registry::ServiceEntry,
    util::open_browser,
    validators::RemoteValidator,
};

use super::{Provider, ProviderCore};

const API_KEYS_URL: &str = "https://linear.app/settings/account/security";

#[derive(Debug)]
pub struct LinearProvider {
    core: ProviderCore,
    validator: Arc<RemoteValidator>,
    api_key: Option<String>,
}

impl LinearProvider {
    pub fn new(validator: Arc<RemoteValidator>) -> Self {
        Self {
            core: ProviderCore::new(
                "Linear",
                "This will configure the Tiger Linear MCP server (https://github.com/timescale/tiger-linear-mcp-server)",
                false,
            )
            .with_registration(
                "linear",
                ServiceEntry::new("http://tiger-linear-mcp-server/mcp"),
            ),
            validator,
            api_key: None,
        }
    }
}

#[async_trait]
impl Provider for LinearProvider {
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
        if prompter.confirm("Open Linear to create API key?", true)? {
            open_browser(API_KEYS_URL);
        }
        println!("Create a Linear API key\n");

        self.api_key = Some(prompter.input_validated(
            "LINEAR_API_KEY:",
            None,
            &validate_non_empty,
        )?);
        self.core.mark_configured();
        Ok(())
    }

    async fn check(&self) -> Result<bool, SetupError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| self.core.uninitialized())?;
        Ok(self.validator.linear_key(api_key).await)
    }

    fn settings(&self) -> Vec<EnvironmentVariable> {
        vec![EnvironmentVariable::from_option(
            "LINEAR_API_KEY",
            self.api_key.as_deref(),
        )]
    }
}
