//! The two backing files a provider writes to, plus the profile editor.
//!
//! Every operation is a read-modify-write of the whole file. Nothing is
//! cached between calls, so hand edits made while the wizard runs are picked
//! up by the next write.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    constants::COMPOSE_PROFILES_KEY,
    env_writer::{EnvironmentVariable, read_env_file, upsert_env_file},
    error::SetupError,
    profiles::ProfileSet,
    registry::{ServiceEntry, ServiceRegistry},
};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    env_path: PathBuf,
    registry_path: PathBuf,
}

impl ConfigStore {
    pub fn new(
        env_path: impl Into<PathBuf>,
        registry_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            env_path: env_path.into(),
            registry_path: registry_path.into(),
        }
    }

    pub fn env_path(&self) -> &Path {
        &self.env_path
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn load_env(&self) -> Result<Vec<EnvironmentVariable>, SetupError> {
        read_env_file(&self.env_path)
    }

    pub fn upsert_env(
        &self,
        updates: &[EnvironmentVariable],
    ) -> Result<(), SetupError> {
        if updates.is_empty() {
            return Ok(());
        }
        upsert_env_file(&self.env_path, updates)
    }

    pub fn load_registry(&self) -> ServiceRegistry {
        ServiceRegistry::load(&self.registry_path)
    }

    pub fn upsert_registry(
        &self,
        updates: &[(&str, &ServiceEntry)],
    ) -> Result<(), SetupError> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut registry = self.load_registry();
        registry.upsert(updates.iter().copied())?;
        registry.save(&self.registry_path)
    }

    pub fn load_profiles(&self) -> Result<ProfileSet, SetupError> {
        Ok(self
            .load_env()?
            .into_iter()
            .find(|var| var.key == COMPOSE_PROFILES_KEY)
            .map(|var| ProfileSet::parse(&var.value))
            .unwrap_or_default())
    }

    /// Add or remove `profile` from `COMPOSE_PROFILES`. The file is only
    /// rewritten when membership actually changes; returns whether it was.
    pub fn set_profile(
        &self,
        profile: &str,
        enabled: bool,
    ) -> Result<bool, SetupError> {
        let mut profiles = self.load_profiles()?;
        let changed = if enabled {
            profiles.insert(profile)
        } else {
            profiles.remove(profile)
        };
        if !changed {
            debug!(profile, enabled, "compose profile already in place");
            return Ok(false);
        }
        self.upsert_env(&[EnvironmentVariable::new(
            COMPOSE_PROFILES_KEY,
            profiles.to_string(),
        )])?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn store_in(dir: &Path) -> ConfigStore {
        ConfigStore::new(dir.join(".env"), dir.join("mcp_config.json"))
    }

    #[test]
    fn disabling_profile_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.env_path(), "COMPOSE_PROFILES=db,github").unwrap();

        assert!(store.set_profile("github", false).unwrap());
        assert_eq!(
            fs::read_to_string(store.env_path()).unwrap(),
            "COMPOSE_PROFILES=db"
        );
        assert!(!store.set_profile("github", false).unwrap());
    }

    #[test]
    fn enabling_profile_creates_variable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.env_path(), "PGHOST=db").unwrap();

        assert!(store.set_profile("github", true).unwrap());
        assert!(!store.set_profile("github", true).unwrap());
        assert_eq!(
            fs::read_to_string(store.env_path()).unwrap(),
            "PGHOST=db\nCOMPOSE_PROFILES=github"
        );
    }

    #[test]
    fn no_op_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(!store.set_profile("github", false).unwrap());
        assert!(!store.env_path().exists());
    }

    #[test]
    fn registry_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let entry = ServiceEntry::new("http://tiger-gh-mcp-server/mcp");
        store.upsert_registry(&[("github", &entry)]).unwrap();
        assert_eq!(store.load_registry().get("github"), Some(entry));
    }
}
