use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::cli::options::SetupOptions;

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Directory docker compose runs in: explicit option, else the env file's dir.
pub fn compose_root(opts: &SetupOptions) -> PathBuf {
    opts.compose_root
        .clone()
        .unwrap_or_else(|| parent_dir(&opts.env_path))
}

/// `<env file>.backup.<unix millis>` next to the env file.
pub fn backup_path(env_path: &Path, millis: i64) -> PathBuf {
    let file_name = env_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(".env");
    parent_dir(env_path).join(format!("{file_name}.backup.{millis}"))
}

pub fn backup_path_now(env_path: &Path) -> PathBuf {
    backup_path(env_path, Utc::now().timestamp_millis())
}
