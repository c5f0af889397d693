//! JSON registry of auxiliary MCP services, keyed by service name.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{env_writer::write_atomically, error::SetupError};

/// One registered service. `tool_prefix` is preserved when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub url: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_prefix: Option<String>,
}

impl ServiceEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            disabled: false,
            tool_prefix: None,
        }
    }

    pub fn with_tool_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tool_prefix = Some(prefix.into());
        self
    }
}

/// Ordered `name -> entry` mapping. Entries written by hand that do not match
/// [`ServiceEntry`] are kept as raw JSON so a merge never drops them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceRegistry {
    entries: Map<String, Value>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse registry text. Anything that is not a JSON object is an empty
    /// registry.
    pub fn parse(contents: &str) -> Self {
        match serde_json::from_str::<Value>(contents) {
            Ok(Value::Object(entries)) => Self { entries },
            Ok(_) => {
                debug!("service registry is not a JSON object, starting empty");
                Self::default()
            }
            Err(err) => {
                debug!(
                    "service registry is not valid JSON ({err}), starting empty"
                );
                Self::default()
            }
        }
    }

    /// Load from disk; missing or unreadable files are an empty registry.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(err) => {
                debug!(
                    path = %path.display(),
                    "no service registry loaded: {err}"
                );
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Typed view of an entry; `None` if absent or not entry-shaped.
    pub fn get(&self, name: &str) -> Option<ServiceEntry> {
        self.entries
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Replace each named entry wholesale; other entries are untouched.
    pub fn upsert<'a, I>(&mut self, updates: I) -> Result<(), SetupError>
    where
        I: IntoIterator<Item = (&'a str, &'a ServiceEntry)>,
    {
        for (name, entry) in updates {
            let value = serde_json::to_value(entry)
                .map_err(SetupError::RegistrySerialize)?;
            self.entries.insert(name.to_string(), value);
            if entry.disabled {
                info!("Disabled `{name}`");
            } else {
                info!("Enabled `{name}`");
            }
        }
        Ok(())
    }

    /// Pretty JSON with two-space indentation, in insertion order.
    pub fn to_json_string(&self) -> Result<String, SetupError> {
        serde_json::to_string_pretty(&self.entries)
            .map_err(SetupError::RegistrySerialize)
    }

    pub fn save(&self, path: &Path) -> Result<(), SetupError> {
        write_atomically(path, &self.to_json_string()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_keeps_unrelated_entries() {
        let mut registry = ServiceRegistry::parse(
            r#"{"slack": {"url": "u1", "disabled": true}}"#,
        );
        let github = ServiceEntry::new("u2");
        registry.upsert([("github", &github)]).unwrap();

        assert_eq!(
            registry.to_json_string().unwrap(),
            "{\n  \"slack\": {\n    \"url\": \"u1\",\n    \"disabled\": true\n  },\n  \"github\": {\n    \"url\": \"u2\",\n    \"disabled\": false\n  }\n}"
        );
    }

    #[test]
    fn upsert_replaces_whole_entry() {
        let mut registry = ServiceRegistry::new();
        let first = ServiceEntry::new("http://a").with_tool_prefix("gh");
        registry.upsert([("github", &first)]).unwrap();

        let mut second = ServiceEntry::new("http://b");
        second.disabled = true;
        registry.upsert([("github", &second)]).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("github"), Some(second));
    }

    #[test]
    fn malformed_json_is_empty() {
        assert!(ServiceRegistry::parse("{ not json").is_empty());
        assert!(ServiceRegistry::parse("[1, 2]").is_empty());
        assert!(ServiceRegistry::parse("").is_empty());
    }

    #[test]
    fn unknown_entry_shapes_survive_a_merge() {
        let mut registry =
            ServiceRegistry::parse(r#"{"custom": {"command": "npx foo"}}"#);
        registry
            .upsert([("linear", &ServiceEntry::new("http://l"))])
            .unwrap();
        let json = registry.to_json_string().unwrap();
        assert!(json.contains("\"command\": \"npx foo\""));
        assert_eq!(registry.get("custom"), None);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["custom", "linear"]);
    }
}
