use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cli::{
        prompt::Prompter,
        validation::{ScopeGrant, ScopePolicy, validate_token_prefix},
    },
    env_writer::EnvironmentVariable,
    error::SetupError,
    registry::ServiceEntry,
    util::open_browser,
    validators::RemoteValidator,
};

use super::{Provider, ProviderCore};

/// Pre-filled "new personal access token" page for the given scopes.
pub(crate) fn token_url(scopes: &[&str]) -> String {
    format!(
        "https://github.com/settings/tokens/new?description=Tiger%20Agent&scopes={}",
        scopes.join(",")
    )
}

/// Organization and token for the GitHub MCP server. Enables the `github`
/// compose profile once configured.
#[derive(Debug)]
pub struct GithubProvider {
    core: ProviderCore,
    validator: Arc<RemoteValidator>,
    organization: Option<String>,
    grant: Option<ScopeGrant>,
    token: Option<String>,
}

impl GithubProvider {
    pub fn new(validator: Arc<RemoteValidator>) -> Self {
        Self {
            core: ProviderCore::new(
                "GitHub",
                "This will configure the Tiger GitHub MCP server (https://github.com/timescale/tiger-gh-mcp-server)",
                false,
            )
            .with_profile("github")
            .with_registration(
                "github",
                ServiceEntry::new("http://tiger-gh-mcp-server/mcp"),
            ),
            validator,
            organization: None,
            grant: None,
            token: None,
        }
    }

    /// Scope set the user asked for during the last collection.
    pub fn scope_grant(&self) -> Option<ScopeGrant> {
        self.grant
    }
}

#[async_trait]
impl Provider for GithubProvider {
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
        let organization = prompter.input("GITHUB_ORG:", None)?;

        let grant = if prompter.confirm(
            "Do you want to include access to private repositories?",
            false,
        )? {
            ScopeGrant::Private
        } else {
            ScopeGrant::Public
        };
        let scopes = ScopePolicy::GITHUB.scopes_for(grant);

        if prompter
            .confirm("Open GitHub to create personal access token?", true)?
        {
            open_browser(&token_url(scopes));
        }
        println!(
            "Create a GitHub personal access token with '{}' scopes\n",
            scopes.join(",")
        );

        let check = |value: &str| validate_token_prefix(value, "ghp_");
        let token = prompter.input_validated("GITHUB_TOKEN:", None, &check)?;

        self.organization = Some(organization);
        self.grant = Some(grant);
        self.token = Some(token);
        self.core.mark_configured();
        Ok(())
    }

    async fn check(&self) -> Result<bool, SetupError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| self.core.uninitialized())?;
        Ok(self.validator.github_token(token).await)
    }

    fn settings(&self) -> Vec<EnvironmentVariable> {
        vec![
            EnvironmentVariable::from_option(
                "GITHUB_ORG",
                self.organization.as_deref(),
            ),
            EnvironmentVariable::from_option(
                "GITHUB_TOKEN",
                self.token.as_deref(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_lists_scopes() {
        assert_eq!(
            token_url(ScopePolicy::GITHUB.scopes_for(ScopeGrant::Public)),
            "https://github.com/settings/tokens/new?description=Tiger%20Agent&scopes=repo:status,public_repo"
        );
    }
}
