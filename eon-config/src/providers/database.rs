use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    cli::{options::ReadyWaitPolicy, prompt::Prompter},
    env_writer::EnvironmentVariable,
    error::SetupError,
    tiger::{ServiceProvisioner, TigerService, wait_for_service_ready},
    util::parse_connection_string,
};

use super::{Provider, ProviderCore};

/// Where the stack's TimescaleDB lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    /// Set for managed services, which must be polled until ready.
    pub service_id: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl DatabaseTarget {
    /// The `db` service from the bundled compose file.
    pub fn local() -> Self {
        Self {
            service_id: None,
            host: "db".into(),
            port: 5432,
            database: "tsdb".into(),
            user: "tsdbadmin".into(),
            password: "password".into(),
        }
    }

    fn from_connection_string(
        service_id: &str,
        raw: &str,
    ) -> Result<Self, SetupError> {
        let params = parse_connection_string(raw)?;
        Ok(Self {
            service_id: Some(service_id.to_string()),
            host: params.host,
            port: params.port,
            database: params.database,
            user: params.user,
            password: params.password.unwrap_or_default(),
        })
    }

    fn from_created(service: TigerService) -> Self {
        if service.host().is_none() {
            warn!(
                service_id = %service.service_id,
                "service creation response did not include a host"
            );
        }
        Self {
            host: service.host().unwrap_or_default().to_string(),
            port: service.port().unwrap_or(5432),
            database: service.database.clone().unwrap_or_else(|| "tsdb".into()),
            user: service.role.clone().unwrap_or_else(|| "tsdbadmin".into()),
            password: service.initial_password.clone().unwrap_or_default(),
            service_id: Some(service.service_id),
        }
    }
}

/// The tool reports a missing stored password through its stderr.
fn is_missing_password(err: &SetupError) -> bool {
    match err {
        SetupError::ToolFailed { stderr, .. } => {
            let stderr = stderr.to_lowercase();
            stderr.contains("keyring") || stderr.contains("password")
        }
        _ => false,
    }
}

/// TimescaleDB connection settings, either the local compose database or a
/// Tiger Cloud service found or created through the Tiger CLI.
#[derive(Debug)]
pub struct DatabaseProvider {
    core: ProviderCore,
    tiger: Arc<dyn ServiceProvisioner>,
    ready_wait: ReadyWaitPolicy,
    target: Option<DatabaseTarget>,
}

impl DatabaseProvider {
    pub fn new(
        tiger: Arc<dyn ServiceProvisioner>,
        ready_wait: ReadyWaitPolicy,
    ) -> Self {
        Self {
            core: ProviderCore::new(
                "Database",
                "Configure a TimescaleDB instance, where Slack messages + agent events are stored.",
                true,
            ),
            tiger,
            ready_wait,
            target: None,
        }
    }

    pub fn target(&self) -> Option<&DatabaseTarget> {
        self.target.as_ref()
    }

    async fn select_existing(
        &self,
        service: &TigerService,
        prompter: &dyn Prompter,
    ) -> Result<DatabaseTarget, SetupError> {
        let service_id = service.service_id.as_str();
        info!("Selected service: {service_id}");
        info!("Fetching connection string with password...");

        match self.tiger.connection_string(service_id, true).await {
            Ok(raw) => DatabaseTarget::from_connection_string(service_id, &raw),
            Err(err) if is_missing_password(&err) => {
                warn!(
                    "Password not found in keyring, fetching connection string without password..."
                );
                warn!(
                    "Database password is required for proper functionality."
                );
                warn!(
                    "If no password is provided, services will not be started at the end of setup."
                );

                let raw =
                    self.tiger.connection_string(service_id, false).await?;
                let mut target =
                    DatabaseTarget::from_connection_string(service_id, &raw)?;
                target.password = prompter.password(
                    "Enter database password (or press Enter to skip):",
                )?;
                if target.password.is_empty() {
                    warn!(
                        "No password provided. Database connection will not work."
                    );
                    warn!(
                        "You can manually set the password later in the .env file."
                    );
                }
                Ok(target)
            }
            Err(err) => Err(err),
        }
    }

    async fn create_new(&self) -> Result<DatabaseTarget, SetupError> {
        info!("Creating new Tiger database...");
        let service = self.tiger.create_service().await?;
        info!(
            "Tiger database created with service ID: {}",
            service.service_id
        );
        Ok(DatabaseTarget::from_created(service))
    }
}

#[async_trait]
impl Provider for DatabaseProvider {
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
        if !prompter
            .confirm("Do you want to use a hosted Tiger Cloud Database?", true)?
        {
            info!("Will use local docker-compose database");
            self.target = Some(DatabaseTarget::local());
            self.core.mark_configured();
            return Ok(());
        }

        info!(
            "Will use Tiger Cloud Database. Note: will use free services if you are on a free plan"
        );
        if !self.tiger.check_auth().await? {
            self.tiger.login().await?;
        }

        let services = self.tiger.list_services().await?;
        let use_existing = !services.is_empty()
            && prompter.confirm(
                "Do you want to use an existing Tiger Cloud instance?",
                false,
            )?;

        let target = if use_existing {
            let mut items: Vec<String> =
                services.iter().map(TigerService::describe).collect();
            items.push("Create a new service".to_string());
            let choice = prompter.select("Select option:", &items, 0)?;
            match services.get(choice) {
                Some(service) => self.select_existing(service, prompter).await?,
                None => self.create_new().await?,
            }
        } else {
            info!("No existing service selected. Creating a new service...");
            self.create_new().await?
        };

        self.target = Some(target);
        self.core.mark_configured();
        Ok(())
    }

    /// Managed services are polled until ready; the local database is
    /// started later by compose and is not checked.
    async fn check(&self) -> Result<bool, SetupError> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| self.core.uninitialized())?;
        if let Some(service_id) = &target.service_id {
            wait_for_service_ready(
                self.tiger.as_ref(),
                service_id,
                self.ready_wait,
            )
            .await?;
        }
        Ok(true)
    }

    fn settings(&self) -> Vec<EnvironmentVariable> {
        let target = self.target.as_ref();
        vec![
            EnvironmentVariable::from_option(
                "PGHOST",
                target.map(|t| t.host.as_str()),
            ),
            EnvironmentVariable::new(
                "PGPORT",
                target.map(|t| t.port.to_string()).unwrap_or_default(),
            ),
            EnvironmentVariable::from_option(
                "PGDATABASE",
                target.map(|t| t.database.as_str()),
            ),
            EnvironmentVariable::from_option(
                "PGUSER",
                target.map(|t| t.user.as_str()),
            ),
            EnvironmentVariable::from_option(
                "PGPASSWORD",
                target.map(|t| t.password.as_str()),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_password_failures_fall_back() {
        let failed = |stderr: &str| SetupError::ToolFailed {
            program: "tiger".into(),
            args: "db connection-string svc --with-password".into(),
            code: 1,
            stderr: stderr.into(),
        };
        assert!(is_missing_password(&failed("Error: no password in Keyring")));
        assert!(!is_missing_password(&failed("service not found")));
        assert!(!is_missing_password(&SetupError::InvalidConnectionString(
            "x".into()
        )));
    }

    #[test]
    fn created_service_uses_endpoint_fallbacks() {
        let service: TigerService = serde_json::from_str(
            r#"{"service_id":"svc1","endpoint":{"host":"svc1.tsdb.cloud","port":33333},"database":"tsdb","role":"tsdbadmin","initial_password":"pw"}"#,
        )
        .unwrap();
        assert_eq!(
            DatabaseTarget::from_created(service),
            DatabaseTarget {
                service_id: Some("svc1".into()),
                host: "svc1.tsdb.cloud".into(),
                port: 33333,
                database: "tsdb".into(),
                user: "tsdbadmin".into(),
                password: "pw".into(),
            }
        );
    }
}
