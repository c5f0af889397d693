//! Line-oriented `KEY=value` store backing the `.env` file.
//!
//! Parsing keeps only assignments: blank lines and `#` comments are dropped,
//! so a rewrite loses comments. When a key appears more than once the first
//! occurrence wins, both for its value and its position; later duplicates are
//! ignored with a warning.

use std::{
    collections::HashSet,
    fs,
    io::{ErrorKind, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::SetupError;

/// One `KEY=value` assignment. An empty value means "declared but unset".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentVariable {
    pub key: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Declared key without a value; serialized as `KEY=`.
    pub fn unset(key: impl Into<String>) -> Self {
        Self::new(key, String::new())
    }

    pub fn from_option(key: impl Into<String>, value: Option<&str>) -> Self {
        Self::new(key, value.unwrap_or_default())
    }

    pub fn is_set(&self) -> bool {
        !self.value.is_empty()
    }
}

/// Parse store contents into ordered assignments.
pub fn parse_env(contents: &str) -> Vec<EnvironmentVariable> {
    let mut seen = HashSet::new();
    let mut vars = Vec::new();

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        if !seen.insert(key.to_string()) {
            warn!(key, "ignoring duplicate assignment in env file");
            continue;
        }
        vars.push(EnvironmentVariable::new(key, value.trim()));
    }

    vars
}

/// Apply `updates` to `existing`: known keys are replaced in place, unknown
/// keys are appended in update order.
pub fn upsert_variables(
    existing: &[EnvironmentVariable],
    updates: &[EnvironmentVariable],
) -> Vec<EnvironmentVariable> {
    let mut merged = existing.to_vec();
    for update in updates {
        match merged.iter_mut().find(|var| var.key == update.key) {
            Some(slot) => slot.value = update.value.clone(),
            None => merged.push(update.clone()),
        }
    }
    merged
}

/// Render assignments as `KEY=value` lines without a trailing newline.
pub fn serialize_env(vars: &[EnvironmentVariable]) -> String {
    vars.iter()
        .map(|var| format!("{}={}", var.key, var.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load the store; a missing file is an empty store.
pub fn read_env_file(
    path: &Path,
) -> Result<Vec<EnvironmentVariable>, SetupError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_env(&contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(SetupError::read(path, err)),
    }
}

/// Merge `updates` into the store at `path` and write it back.
pub fn upsert_env_file(
    path: &Path,
    updates: &[EnvironmentVariable],
) -> Result<(), SetupError> {
    let existing = read_env_file(path)?;
    let merged = upsert_variables(&existing, updates);
    write_atomically(path, &serialize_env(&merged))
}

/// Replace `path` with `contents` via a temp file in the same directory.
pub fn write_atomically(path: &Path, contents: &str) -> Result<(), SetupError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|e| SetupError::write(path, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| SetupError::write(path, e))?;
    tmp.persist(path)
        .map_err(|e| SetupError::write(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<EnvironmentVariable> {
        pairs
            .iter()
            .map(|(k, v)| EnvironmentVariable::new(*k, *v))
            .collect()
    }

    #[test]
    fn parse_skips_comments_blank_lines_and_bare_words() {
        let contents = "
# This is a comment
DATABASE_URL=postgres://localhost:5432/db
INVALID_LINE_WITHOUT_EQUALS
   API_KEY = sk-1234567890abcdef

# Another comment
LOG_LEVEL=info
";
        assert_eq!(
            parse_env(contents),
            vars(&[
                ("DATABASE_URL", "postgres://localhost:5432/db"),
                ("API_KEY", "sk-1234567890abcdef"),
                ("LOG_LEVEL", "info"),
            ])
        );
    }

    #[test]
    fn parse_splits_on_first_equals_only() {
        let parsed = parse_env(
            "CONNECTION_STRING=user=admin;password=secret123;host=localhost",
        );
        assert_eq!(
            parsed,
            vars(&[(
                "CONNECTION_STRING",
                "user=admin;password=secret123;host=localhost"
            )])
        );
    }

    #[test]
    fn parse_keeps_declared_but_empty_keys() {
        assert_eq!(parse_env("API_KEY="), vars(&[("API_KEY", "")]));
        assert!(parse_env("=value").is_empty());
    }

    #[test]
    fn parse_duplicate_keys_first_occurrence_wins() {
        let parsed = parse_env("A=1\nB=2\nA=3");
        assert_eq!(parsed, vars(&[("A", "1"), ("B", "2")]));
    }

    #[test]
    fn upsert_replaces_in_place_and_appends_new_keys() {
        let existing = parse_env("API_KEY=old\nLOG_LEVEL=debug");
        let merged = upsert_variables(
            &existing,
            &vars(&[("API_KEY", "new"), ("DATABASE_URL", "x")]),
        );
        assert_eq!(
            serialize_env(&merged),
            "API_KEY=new\nLOG_LEVEL=debug\nDATABASE_URL=x"
        );
    }

    #[test]
    fn upsert_writes_unset_values_explicitly() {
        let merged =
            upsert_variables(&[], &[EnvironmentVariable::unset("API_KEY")]);
        assert_eq!(serialize_env(&merged), "API_KEY=");

        let existing = parse_env("API_KEY=old-key\nLOG_LEVEL=debug");
        let merged = upsert_variables(
            &existing,
            &[EnvironmentVariable::unset("API_KEY")],
        );
        assert_eq!(serialize_env(&merged), "API_KEY=\nLOG_LEVEL=debug");
    }

    #[test]
    fn upsert_is_idempotent() {
        let existing = parse_env("A=1\nB=2");
        let updates = vars(&[("B", "20"), ("C", "3"), ("A", "")]);
        let once = upsert_variables(&existing, &updates);
        let twice = upsert_variables(&once, &updates);
        assert_eq!(once, twice);
    }

    #[test]
    fn updated_keys_keep_their_position() {
        let existing = parse_env("A=1\nB=2\nC=3");
        let merged =
            upsert_variables(&existing, &vars(&[("D", "4"), ("B", "two")]));
        let keys: Vec<_> = merged.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, ["A", "B", "C", "D"]);
    }

    #[test]
    fn serialize_then_parse_round_trips() {
        let original = vars(&[
            ("PGHOST", "db"),
            ("PGPASSWORD", ""),
            ("URL", "postgres://u:p@h:5432/d?sslmode=require"),
        ]);
        assert_eq!(parse_env(&serialize_env(&original)), original);
    }

    #[test]
    fn missing_file_reads_as_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vars = read_env_file(&dir.path().join(".env")).expect("read");
        assert!(vars.is_empty());
    }

    #[test]
    fn upsert_env_file_creates_and_updates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");

        upsert_env_file(&path, &vars(&[("API_KEY", "test-key")]))
            .expect("create");
        upsert_env_file(
            &path,
            &vars(&[("DATABASE_URL", "postgres://localhost:5432/db")]),
        )
        .expect("update");

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "API_KEY=test-key\nDATABASE_URL=postgres://localhost:5432/db"
        );
    }

    #[test]
    fn write_failure_propagates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join(".env");
        let err = upsert_env_file(&path, &vars(&[("A", "1")]))
            .expect_err("write into missing directory");
        assert!(matches!(err, SetupError::Write { .. }));
    }
}
