use std::sync::Arc;

use async_trait::async_trait;
use dialoguer::console::style;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{
    cli::{prompt::Prompter, validation::validate_token_prefix},
    constants::{AGENT_MANIFEST_URL, INGEST_MANIFEST_URL},
    env_writer::EnvironmentVariable,
    error::SetupError,
    util::{copy_to_clipboard, open_browser},
    validators::RemoteValidator,
};

use super::{Provider, ProviderCore};

const SLACK_APPS_URL: &str = "https://api.slack.com/apps/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlackAppKind {
    Ingest,
    Agent,
}

impl SlackAppKind {
    fn provider_name(self) -> &'static str {
        match self {
            SlackAppKind::Ingest => "Slack Ingest App",
            SlackAppKind::Agent => "Slack Agent App",
        }
    }

    fn app_token_key(self) -> &'static str {
        match self {
            SlackAppKind::Ingest => "SLACK_INGEST_APP_TOKEN",
            SlackAppKind::Agent => "SLACK_AGENT_APP_TOKEN",
        }
    }

    fn bot_token_key(self) -> &'static str {
        match self {
            SlackAppKind::Ingest => "SLACK_INGEST_BOT_TOKEN",
            SlackAppKind::Agent => "SLACK_AGENT_BOT_TOKEN",
        }
    }
}

/// Defaults for one of the two Slack apps the stack needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackAppSpec {
    pub kind: SlackAppKind,
    pub name: String,
    pub description: String,
    pub manifest_url: String,
}

impl SlackAppSpec {
    pub fn ingest() -> Self {
        Self {
            kind: SlackAppKind::Ingest,
            name: "tiger-slack-ingest".into(),
            description:
                "Receives all messages/reactions from public channels".into(),
            manifest_url: INGEST_MANIFEST_URL.into(),
        }
    }

    pub fn agent() -> Self {
        Self {
            kind: SlackAppKind::Agent,
            name: "eon".into(),
            description: "TigerData Knowledge Base Agent".into(),
            manifest_url: AGENT_MANIFEST_URL.into(),
        }
    }

    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }
}

#[derive(Debug, Clone)]
struct SlackTokens {
    app: String,
    bot: String,
}

/// Rename the app in a downloaded manifest.
pub(crate) fn customize_manifest(
    manifest: &mut Value,
    name: &str,
    description: &str,
) {
    if !manifest.is_object() {
        *manifest = json!({});
    }
    let display = &mut manifest["display_information"];
    if !display.is_object() {
        *display = json!({});
    }
    display["name"] = json!(name);
    display["description"] = json!(description);

    if let Some(bot_user) = manifest
        .get_mut("features")
        .and_then(|features| features.get_mut("bot_user"))
        .filter(|bot_user| bot_user.is_object())
    {
        bot_user["display_name"] = json!(name);
    }
}

/// Walks the user through creating a Slack app from a manifest and collects
/// its app-level and bot tokens.
#[derive(Debug)]
pub struct SlackProvider {
    core: ProviderCore,
    spec: SlackAppSpec,
    validator: Arc<RemoteValidator>,
    tokens: Option<SlackTokens>,
}

impl SlackProvider {
    pub fn new(spec: SlackAppSpec, validator: Arc<RemoteValidator>) -> Self {
        let description = match spec.kind {
            SlackAppKind::Ingest => {
                "Slack app that receives all messages/reactions from public channels."
            }
            SlackAppKind::Agent => {
                "Slack app that receives @mentions for the agent."
            }
        };
        Self {
            core: ProviderCore::new(
                spec.kind.provider_name(),
                description,
                true,
            ),
            spec,
            validator,
            tokens: None,
        }
    }
}

#[async_trait]
impl Provider for SlackProvider {
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
        let mut manifest = self
            .validator
            .download_json(&self.spec.manifest_url)
            .await?;

        let name = prompter.input(
            &format!("App name (press Enter for '{}'):", self.spec.name),
            Some(self.spec.name.as_str()),
        )?;
        let description = prompter.input(
            &format!(
                "App description (press Enter for '{}'):",
                self.spec.description
            ),
            Some(self.spec.description.as_str()),
        )?;
        customize_manifest(&mut manifest, &name, &description);
        let rendered = serde_json::to_string_pretty(&manifest)
            .unwrap_or_else(|_| manifest.to_string());

        println!("\n{}", style("Slack App Creation Steps:").bold());
        println!(
            "1. Click \"Create New App\" -> \"From a manifest\" -> Choose your workspace"
        );
        if prompter.confirm(&format!("Open {SLACK_APPS_URL}?"), true)? {
            open_browser(SLACK_APPS_URL);
        }
        prompter.pause(
            "Press Enter after selecting your workspace and clicking Next...",
        )?;

        println!(
            "\n2. Copy the manifest below and paste it into the App creation wizard:"
        );
        println!("----------------------------------------");
        println!("{rendered}");
        println!("----------------------------------------");
        if copy_to_clipboard(&rendered) {
            println!("(Copied to clipboard)\n");
        }
        prompter.pause("Press Enter after creating the app...")?;

        println!("\n3. Navigate to: Basic Information -> App-Level Tokens");
        println!(
            "4. Click \"Generate Token and Scopes\" -> Enter a Token Name -> Add \"connections:write\" scope -> Generate\n"
        );
        let app_check = |value: &str| validate_token_prefix(value, "xapp-");
        let app = prompter.input_validated(
            &format!(
                "Please paste your {name} App-Level Token (starts with 'xapp-'):"
            ),
            None,
            &app_check,
        )?;

        println!(
            "\n5. Navigate to: App Home -> Show Tabs -> Enable the Messages tab setting"
        );
        println!(
            "6. Check \"Allow users to send Slash commands and messages from the messages tab\""
        );
        println!(
            "7. Navigate to: Install App -> Click \"Install to [Workspace]\""
        );
        println!("8. After installation, copy the \"Bot User OAuth Token\"\n");
        let bot_check = |value: &str| validate_token_prefix(value, "xoxb-");
        let bot = prompter.input_validated(
            &format!(
                "Please paste your {name} Bot User OAuth Token (starts with 'xoxb-'):"
            ),
            None,
            &bot_check,
        )?;

        self.tokens = Some(SlackTokens { app, bot });
        self.core.mark_configured();
        info!("Collected tokens for {}", self.core.name());
        Ok(())
    }

    async fn check(&self) -> Result<bool, SetupError> {
        let Some(tokens) = &self.tokens else {
            warn!("{} has no tokens to validate", self.core.name());
            return Err(self.core.uninitialized());
        };
        Ok(self.validator.slack_bot_token(&tokens.bot).await)
    }

    fn settings(&self) -> Vec<EnvironmentVariable> {
        let tokens = self.tokens.as_ref();
        vec![
            EnvironmentVariable::from_option(
                self.spec.kind.app_token_key(),
                tokens.map(|t| t.app.as_str()),
            ),
            EnvironmentVariable::from_option(
                self.spec.kind.bot_token_key(),
                tokens.map(|t| t.bot.as_str()),
            ),
        ]
    }
}
