use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::providers::ProviderState;

/// Errors surfaced by the setup library.
///
/// Rejected credentials are not errors: validators report them as `false`.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize service registry")]
    RegistrySerialize(#[source] serde_json::Error),
    #[error(transparent)]
    Prompt(#[from] dialoguer::Error),
    #[error("scripted prompter ran out of answers at prompt '{prompt}'")]
    ScriptExhausted { prompt: String },
    #[error("{provider} is uninitialized, call collect() first")]
    Uninitialized { provider: String },
    #[error("{provider} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        provider: String,
        from: ProviderState,
        to: ProviderState,
    },
    #[error("failed to run {program}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program} {args}` exited with code {code}: {stderr}")]
    ToolFailed {
        program: String,
        args: String,
        code: i32,
        stderr: String,
    },
    #[error("failed to parse {what}: {output}")]
    ToolOutput {
        what: &'static str,
        output: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "You have reached your free service limit. Please delete an existing service or upgrade to a paid plan.\n\n\
         To delete an existing service, run: {program} service delete <service-id>\n\
         To list your services, run: {program} service list"
    )]
    FreeServiceLimit { program: String },
    #[error("invalid connection string format: {0}")]
    InvalidConnectionString(String),
    #[error("failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("service {service_id} was not ready after {waited:?}")]
    ServiceReadyTimeout {
        service_id: String,
        waited: Duration,
    },
}

impl SetupError {
    pub(crate) fn read(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        SetupError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        SetupError::Write {
            path: path.into(),
            source,
        }
    }
}
