//! File names, keys and endpoints shared by the wizard and the binary.

/// Default variable store consumed by docker compose.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Default MCP service registry read by the agent.
pub const DEFAULT_REGISTRY_FILE: &str = "mcp_config.json";

/// Variable holding the comma separated compose profile set.
pub const COMPOSE_PROFILES_KEY: &str = "COMPOSE_PROFILES";

/// Default location of the Tiger CLI downloaded by the bootstrap script.
pub const DEFAULT_TIGER_CMD: &str = "./download/tiger";

/// Name given to databases created by the wizard.
pub const TIGER_SERVICE_NAME: &str = "tiger-eon";

/// Status reported by `tiger service describe` once a database accepts
/// connections.
pub const SERVICE_READY_STATUS: &str = "READY";

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";
pub const SLACK_API_BASE: &str = "https://slack.com";
pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const LINEAR_API_BASE: &str = "https://api.linear.app";

pub const INGEST_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/timescale/tiger-slack/main/slack-app-manifest.json";
pub const AGENT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/timescale/tiger-agents-for-work/main/slack-manifest.json";

/// User agent sent with validation requests; GitHub rejects anonymous clients.
pub const USER_AGENT: &str = concat!("eon-setup/", env!("CARGO_PKG_VERSION"));
