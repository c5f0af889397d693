//! Wrapper around the Tiger CLI used to provision managed databases.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::{
    cli::{
        options::ReadyWaitPolicy,
        specs::{
            CommandOutput, CommandSpec, run_spec_inherit, run_spec_with_output,
        },
    },
    constants::{SERVICE_READY_STATUS, TIGER_SERVICE_NAME},
    error::SetupError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceEndpoint {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Service record as printed by `service list` / `service create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TigerService {
    pub service_id: String,
    pub name: Option<String>,
    pub created: Option<String>,
    pub status: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub endpoint: Option<ServiceEndpoint>,
    pub console_url: Option<String>,
    pub database: Option<String>,
    pub role: Option<String>,
    /// Only present in `service create` output.
    pub initial_password: Option<String>,
}

impl TigerService {
    pub fn host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .or_else(|| self.endpoint.as_ref()?.host.as_deref())
    }

    pub fn port(&self) -> Option<u16> {
        self.port.or_else(|| self.endpoint.as_ref()?.port)
    }

    /// Multi-line label used in the service picker.
    pub fn describe(&self) -> String {
        let na = |v: Option<&str>| v.unwrap_or("N/A").to_string();
        format!(
            "Service ID: {}\n  Created: {}\n  Status: {}\n  Name: {}\n  Host: {}\n  Console URL: {}",
            self.service_id,
            na(self.created.as_deref()),
            na(self.status.as_deref()),
            na(self.name.as_deref()),
            na(self.host()),
            na(self.console_url.as_deref()),
        )
    }
}

/// Out-of-process database provisioning.
#[async_trait]
pub trait ServiceProvisioner: Send + Sync {
    async fn check_auth(&self) -> Result<bool, SetupError>;

    async fn login(&self) -> Result<(), SetupError>;

    async fn list_services(&self) -> Result<Vec<TigerService>, SetupError>;

    async fn connection_string(
        &self,
        service_id: &str,
        with_password: bool,
    ) -> Result<String, SetupError>;

    async fn create_service(&self) -> Result<TigerService, SetupError>;

    async fn service_status(
        &self,
        service_id: &str,
    ) -> Result<String, SetupError>;
}

impl std::fmt::Debug for dyn ServiceProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn ServiceProvisioner")
    }
}

/// Runs the Tiger CLI from a command template (`program` plus leading args).
#[derive(Debug, Clone)]
pub struct TigerCli {
    template: CommandSpec,
}

impl TigerCli {
    pub fn new(template: CommandSpec) -> Self {
        Self { template }
    }

    /// Build from `[program, args...]`; an empty template falls back to the
    /// bundled default location.
    pub fn from_template(template: &[String]) -> Self {
        let spec = CommandSpec::from_template(template).unwrap_or_else(|| {
            CommandSpec::new(crate::constants::DEFAULT_TIGER_CMD)
        });
        Self::new(spec)
    }

    /// Command line as a user would type it.
    pub fn command_line(&self) -> String {
        std::iter::once(self.template.program.as_str())
            .chain(self.template.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn spec<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template.clone().args(args)
    }

    async fn captured<I, S>(
        &self,
        args: I,
    ) -> Result<(CommandSpec, CommandOutput), SetupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = self.spec(args);
        let output = run_spec_with_output(&spec).await?;
        debug!(command = %spec, code = output.code(), "tiger command finished");
        Ok((spec, output))
    }

    fn failed(spec: &CommandSpec, output: &CommandOutput) -> SetupError {
        SetupError::ToolFailed {
            program: spec.program.clone(),
            args: spec.args_display(),
            code: output.code(),
            stderr: output.stderr.trim().to_string(),
        }
    }

    /// Run and require exit code 0.
    async fn checked<I, S>(&self, args: I) -> Result<CommandOutput, SetupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (spec, output) = self.captured(args).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(Self::failed(&spec, &output))
        }
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(
    what: &'static str,
    stdout: &str,
) -> Result<T, SetupError> {
    serde_json::from_str(stdout).map_err(|source| SetupError::ToolOutput {
        what,
        output: stdout.trim().to_string(),
        source,
    })
}

#[async_trait]
impl ServiceProvisioner for TigerCli {
    async fn check_auth(&self) -> Result<bool, SetupError> {
        let (_, output) = self.captured(["auth", "status"]).await?;
        Ok(output.success())
    }

    async fn login(&self) -> Result<(), SetupError> {
        println!("Not authenticated with Tiger, starting login...");
        let spec = self.spec(["auth", "login"]);
        let status = run_spec_inherit(&spec).await?;
        if !status.success() {
            return Err(SetupError::ToolFailed {
                program: spec.program.clone(),
                args: spec.args_display(),
                code: status.code().unwrap_or(-1),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<TigerService>, SetupError> {
        let output = self.checked(["service", "list", "-o", "json"]).await?;
        if output.stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_json("service list", &output.stdout)
    }

    async fn connection_string(
        &self,
        service_id: &str,
        with_password: bool,
    ) -> Result<String, SetupError> {
        let mut args = vec!["db", "connection-string", service_id];
        if with_password {
            args.push("--with-password");
        }
        let output = self.checked(args).await?;
        Ok(output.stdout.trim().to_string())
    }

    async fn create_service(&self) -> Result<TigerService, SetupError> {
        let (spec, output) = self
            .captured([
                "service",
                "create",
                "--no-wait",
                "--name",
                TIGER_SERVICE_NAME,
                "--with-password",
                "-o",
                "json",
            ])
            .await?;
        if !output.success() {
            if output.stderr.to_lowercase().contains("free service limit") {
                return Err(SetupError::FreeServiceLimit {
                    program: self.command_line(),
                });
            }
            return Err(Self::failed(&spec, &output));
        }
        parse_json("service creation response", &output.stdout)
    }

    async fn service_status(
        &self,
        service_id: &str,
    ) -> Result<String, SetupError> {
        let output = self
            .checked(["service", "describe", "-o", "json", service_id])
            .await?;
        let service: Value = parse_json("service status", &output.stdout)?;
        Ok(service
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

/// Poll `service_status` until it reports ready. A failing status check is
/// fatal; running past `policy.timeout` is [`SetupError::ServiceReadyTimeout`].
/// A timeout too large to represent as an instant never expires.
pub async fn wait_for_service_ready(
    provisioner: &dyn ServiceProvisioner,
    service_id: &str,
    policy: ReadyWaitPolicy,
) -> Result<(), SetupError> {
    info!("Waiting for Tiger database to be ready...");
    let started = Instant::now();
    let deadline = started.checked_add(policy.timeout);

    loop {
        let status = provisioner.service_status(service_id).await?;
        if status == SERVICE_READY_STATUS {
            info!("Tiger database is ready");
            return Ok(());
        }
        debug!(service_id, %status, "service not ready yet");

        let now = Instant::now();
        let pause = match deadline {
            Some(deadline) if now >= deadline => {
                return Err(SetupError::ServiceReadyTimeout {
                    service_id: service_id.to_string(),
                    waited: now.duration_since(started),
                });
            }
            Some(deadline) => policy.interval.min(deadline - now),
            None => policy.interval,
        };
        sleep(pause.max(Duration::from_millis(1))).await;
    }
}
