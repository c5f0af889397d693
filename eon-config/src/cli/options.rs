use std::{path::PathBuf, time::Duration};

use crate::constants::{
    ANTHROPIC_API_BASE, DEFAULT_ENV_FILE, DEFAULT_REGISTRY_FILE,
    DEFAULT_TIGER_CMD, GITHUB_API_BASE, LINEAR_API_BASE, SLACK_API_BASE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Base URLs of the services credentials are checked against.
pub struct ApiEndpoints {
    pub anthropic: String,
    pub slack: String,
    pub github: String,
    pub linear: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            anthropic: ANTHROPIC_API_BASE.to_string(),
            slack: SLACK_API_BASE.to_string(),
            github: GITHUB_API_BASE.to_string(),
            linear: LINEAR_API_BASE.to_string(),
        }
    }
}

impl ApiEndpoints {
    /// Point every endpoint at one server (mock servers in tests).
    pub fn all_at(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            anthropic: base.clone(),
            slack: base.clone(),
            github: base.clone(),
            linear: base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Polling cadence and cap for "wait until the database is ready".
pub struct ReadyWaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for ReadyWaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone)]
/// Options for a wizard run (`eon-setup setup`).
pub struct SetupOptions {
    pub env_path: PathBuf,
    pub registry_path: PathBuf,
    /// Directory `docker compose` runs in. Defaults to the env file's
    /// directory.
    pub compose_root: Option<PathBuf>,
    /// Provisioning CLI followed by any leading arguments.
    pub tiger_cmd: Vec<String>,
    pub ready_wait: ReadyWaitPolicy,
    pub endpoints: ApiEndpoints,
    /// Offer to pull and start the compose stack at the end.
    pub start_services: bool,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            env_path: PathBuf::from(DEFAULT_ENV_FILE),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_FILE),
            compose_root: None,
            tiger_cmd: vec![DEFAULT_TIGER_CMD.to_string()],
            ready_wait: ReadyWaitPolicy::default(),
            endpoints: ApiEndpoints::default(),
            start_services: true,
        }
    }
}

impl SetupOptions {
    pub fn new(env_path: PathBuf, registry_path: PathBuf) -> Self {
        Self {
            env_path,
            registry_path,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
/// Options for `eon-setup status`.
pub struct StatusOptions {
    pub env_path: PathBuf,
    pub registry_path: PathBuf,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            env_path: PathBuf::from(DEFAULT_ENV_FILE),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_FILE),
        }
    }
}
