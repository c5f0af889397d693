//! Remote credential checks.
//!
//! Every check answers `true` or `false`. A rejected credential and an
//! unreachable service look the same to the caller: both are logged and
//! reported as `false` so the provider asks again.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::{
    cli::{
        options::ApiEndpoints,
        validation::{ScopeGrant, ScopePolicy, parse_scope_header},
    },
    constants::{ANTHROPIC_API_VERSION, USER_AGENT},
    error::SetupError,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RemoteValidator {
    client: Client,
    endpoints: ApiEndpoints,
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

impl RemoteValidator {
    pub fn new(endpoints: ApiEndpoints) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                warn!("falling back to default HTTP client: {err}");
                Client::new()
            });
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    async fn send(
        &self,
        what: &str,
        request: reqwest::RequestBuilder,
    ) -> Option<Response> {
        match request.send().await {
            Ok(response) => Some(response),
            Err(err) => {
                warn!("Could not reach {what}: {err}");
                None
            }
        }
    }

    /// `GET /v1/models`; an error-typed body means the key was refused.
    pub async fn anthropic_key(&self, api_key: &str) -> bool {
        let request = self
            .client
            .get(endpoint(&self.endpoints.anthropic, "/v1/models"))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION);
        let Some(response) = self.send("Anthropic API", request).await else {
            return false;
        };

        match response.json::<Value>().await {
            Ok(body)
                if body.get("type").and_then(Value::as_str) == Some("error") =>
            {
                error!("Anthropic API key was rejected");
                false
            }
            Ok(_) => {
                info!("Anthropic API key validated");
                true
            }
            Err(err) => {
                warn!("Unexpected Anthropic API response: {err}");
                false
            }
        }
    }

    /// `auth.test` with the bot token; valid iff the body says `ok: true`.
    pub async fn slack_bot_token(&self, bot_token: &str) -> bool {
        let request = self
            .client
            .get(endpoint(&self.endpoints.slack, "/api/auth.test"))
            .bearer_auth(bot_token);
        let Some(response) = self.send("Slack API", request).await else {
            return false;
        };

        match response.json::<Value>().await {
            Ok(body)
                if body.get("ok").and_then(Value::as_bool) == Some(true) =>
            {
                let team =
                    body.get("team").and_then(Value::as_str).unwrap_or("N/A");
                info!("Slack bot token validated for workspace {team}");
                true
            }
            Ok(body) => {
                let reason = body
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                error!("Slack rejected the bot token: {reason}");
                false
            }
            Err(err) => {
                warn!("Unexpected Slack API response: {err}");
                false
            }
        }
    }

    /// `GET /user`, then check `X-OAuth-Scopes` against
    /// [`ScopePolicy::GITHUB`].
    pub async fn github_token(&self, token: &str) -> bool {
        let request = self
            .client
            .get(endpoint(&self.endpoints.github, "/user"))
            .header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        let Some(response) = self.send("GitHub API", request).await else {
            return false;
        };

        let status = response.status();
        if !status.is_success() {
            error!(%status, "Failed to validate GitHub token");
            return false;
        }

        let scopes = response
            .headers()
            .get("x-oauth-scopes")
            .and_then(|value| value.to_str().ok())
            .map(parse_scope_header)
            .unwrap_or_default();

        match ScopePolicy::GITHUB.evaluate(&scopes) {
            Some(ScopeGrant::Private) => {
                info!("Validated token has private repo scopes");
                true
            }
            Some(ScopeGrant::Public) => {
                info!("Validated token has public repo scopes");
                true
            }
            None => {
                error!(
                    ?scopes,
                    "Invalid GitHub token, missing required scopes"
                );
                false
            }
        }
    }

    /// GraphQL `viewer` query. HTTP failures and response-level `errors`
    /// both count as a rejected key.
    pub async fn linear_key(&self, api_key: &str) -> bool {
        let request = self
            .client
            .post(endpoint(&self.endpoints.linear, "/graphql"))
            .header(reqwest::header::AUTHORIZATION, api_key)
            .json(&json!({ "query": "{ viewer { name email }}" }));
        let Some(response) = self.send("Linear API", request).await else {
            return false;
        };

        let status = response.status();
        let payload = match response.json::<Value>().await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%status, "Unexpected Linear API response: {err}");
                return false;
            }
        };

        let errors: Vec<&str> = payload
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();
        let has_errors = payload
            .get("errors")
            .and_then(Value::as_array)
            .is_some_and(|errors| !errors.is_empty());

        if !status.is_success() || has_errors {
            error!(%status, ?errors, "Failed to validate Linear token");
            return false;
        }

        let viewer = payload.pointer("/data/viewer");
        let field = |name: &str| {
            viewer
                .and_then(|v| v.get(name))
                .and_then(Value::as_str)
                .unwrap_or("N/A")
                .to_string()
        };
        info!(
            "Validated Linear token, belongs to name: {}, email: {}",
            field("name"),
            field("email")
        );
        true
    }

    /// Fetch a JSON document; used for Slack app manifests.
    pub async fn download_json(&self, url: &str) -> Result<Value, SetupError> {
        let to_err = |source| SetupError::Download {
            url: url.to_string(),
            source,
        };
        self.client
            .get(url)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(to_err)?
            .json::<Value>()
            .await
            .map_err(to_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://127.0.0.1:9/", "/v1/models"),
            "http://127.0.0.1:9/v1/models"
        );
        assert_eq!(
            endpoint("https://slack.com", "/api/auth.test"),
            "https://slack.com/api/auth.test"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_invalid_not_error() {
        // port 9 (discard) is closed on test hosts
        let validator =
            RemoteValidator::new(ApiEndpoints::all_at("http://127.0.0.1:9"));
        assert!(!validator.anthropic_key("sk-ant-x").await);
        assert!(!validator.linear_key("lin_api_x").await);
    }
}
