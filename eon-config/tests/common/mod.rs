#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use eon_config::{
    ConfigStore, SetupError, TigerService,
    cli::ServiceStarter,
    tiger::ServiceProvisioner,
};
use tempfile::TempDir;

/// Temp directory holding a `.env` and an `mcp_config.json`.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn env_path(&self) -> PathBuf {
        self.path().join(".env")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.path().join("mcp_config.json")
    }

    pub fn store(&self) -> ConfigStore {
        ConfigStore::new(self.env_path(), self.registry_path())
    }

    pub fn write_env(&self, contents: &str) {
        fs::write(self.env_path(), contents).expect("write .env");
    }

    pub fn read_env(&self) -> String {
        fs::read_to_string(self.env_path()).expect("read .env")
    }

    pub fn registry_json(&self) -> serde_json::Value {
        let raw =
            fs::read_to_string(self.registry_path()).expect("read registry");
        serde_json::from_str(&raw).expect("registry is JSON")
    }

    /// Files whose name starts with `.env.backup.`.
    pub fn backups(&self) -> Vec<PathBuf> {
        fs::read_dir(self.path())
            .expect("read_dir")
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(".env.backup."))
            })
            .collect()
    }
}

/// Value of `key` in a serialized env file.
pub fn env_value<'a>(contents: &'a str, key: &str) -> Option<&'a str> {
    contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// In-memory stand-in for the Tiger CLI.
#[derive(Default)]
pub struct FakeProvisioner {
    pub authenticated: bool,
    pub services: Vec<TigerService>,
    pub connection: String,
    pub password_missing: bool,
    pub created: Option<TigerService>,
    pub logins: AtomicUsize,
    pub creates: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl FakeProvisioner {
    pub fn service(id: &str, host: &str) -> TigerService {
        TigerService {
            service_id: id.to_string(),
            name: Some(format!("{id}-name")),
            status: Some("READY".into()),
            host: Some(host.to_string()),
            port: Some(30000),
            ..TigerService::default()
        }
    }
}

#[async_trait]
impl ServiceProvisioner for FakeProvisioner {
    async fn check_auth(&self) -> Result<bool, SetupError> {
        Ok(self.authenticated)
    }

    async fn login(&self) -> Result<(), SetupError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<TigerService>, SetupError> {
        Ok(self.services.clone())
    }

    async fn connection_string(
        &self,
        _service_id: &str,
        with_password: bool,
    ) -> Result<String, SetupError> {
        if with_password && self.password_missing {
            return Err(SetupError::ToolFailed {
                program: "tiger".into(),
                args: "db connection-string --with-password".into(),
                code: 1,
                stderr: "Error: password not found in keyring".into(),
            });
        }
        Ok(self.connection.clone())
    }

    async fn create_service(&self) -> Result<TigerService, SetupError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.created
            .clone()
            .ok_or_else(|| SetupError::FreeServiceLimit {
                program: "tiger".into(),
            })
    }

    async fn service_status(
        &self,
        _service_id: &str,
    ) -> Result<String, SetupError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok("READY".into())
    }
}

/// Records whether the wizard tried to start services.
#[derive(Clone, Default)]
pub struct RecordingStarter {
    pub started: Arc<AtomicBool>,
    pub fail: bool,
    pub log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ServiceStarter for RecordingStarter {
    async fn start(&self) -> anyhow::Result<()> {
        self.started.store(true, Ordering::SeqCst);
        self.log.lock().unwrap().push("start".into());
        if self.fail {
            anyhow::bail!("docker compose exited with 1");
        }
        Ok(())
    }

    fn manual_command(&self) -> String {
        "docker compose up -d --build".into()
    }
}
