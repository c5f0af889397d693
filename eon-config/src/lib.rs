//! Setup library for the Tiger Agent stack.
//!
//! This crate walks a user through collecting credentials for the services
//! the stack depends on (database, Anthropic, two Slack apps, and optional
//! GitHub and Linear MCP servers), checks them against the live services and
//! merges the results into three places: the `.env` variable store, the MCP
//! service registry (`mcp_config.json`) and the `COMPOSE_PROFILES` set. The
//! `eon-setup` binary is a thin clap front end over [`cli`].

pub mod cli;
pub mod constants;
pub mod env_writer;
pub mod error;
pub mod profiles;
pub mod providers;
pub mod registry;
pub mod store;
pub mod tiger;
pub mod util;
pub mod validators;

pub use env_writer::EnvironmentVariable;
pub use error::SetupError;
pub use profiles::ProfileSet;
pub use providers::{Provider, ProviderCore, ProviderState, default_providers};
pub use registry::{ServiceEntry, ServiceRegistry};
pub use store::ConfigStore;
pub use tiger::{ServiceProvisioner, TigerCli, TigerService};
pub use validators::RemoteValidator;
