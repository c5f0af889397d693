mod common;

use std::fs;

use eon_config::{EnvironmentVariable, ServiceEntry};
use serde_json::json;

use common::Workspace;

#[test]
fn repeated_upsert_leaves_file_unchanged() {
    let workspace = Workspace::new();
    workspace
        .write_env("# managed by eon-setup\nAPI_KEY=old\n\nLOG_LEVEL=debug\n");
    let store = workspace.store();
    let updates = [
        EnvironmentVariable::new("API_KEY", "new"),
        EnvironmentVariable::new("DATABASE_URL", "x"),
    ];

    store.upsert_env(&updates).unwrap();
    let first = workspace.read_env();
    store.upsert_env(&updates).unwrap();

    // comments and blank lines do not survive a rewrite
    assert_eq!(first, "API_KEY=new\nLOG_LEVEL=debug\nDATABASE_URL=x");
    assert_eq!(workspace.read_env(), first);
}

#[test]
fn unset_variable_creates_file_with_empty_value() {
    let workspace = Workspace::new();
    workspace
        .store()
        .upsert_env(&[EnvironmentVariable::unset("API_KEY")])
        .unwrap();
    assert_eq!(workspace.read_env(), "API_KEY=");
}

#[test]
fn duplicate_keys_keep_first_value() {
    let workspace = Workspace::new();
    workspace.write_env("TOKEN=first\nTOKEN=second\nOTHER=1");
    let vars = workspace.store().load_env().unwrap();
    assert_eq!(
        vars,
        vec![
            EnvironmentVariable::new("TOKEN", "first"),
            EnvironmentVariable::new("OTHER", "1"),
        ]
    );
}

#[test]
fn registry_entries_are_replaced_whole() {
    let workspace = Workspace::new();
    fs::write(
        workspace.registry_path(),
        r#"{"slack": {"url": "u1", "disabled": true}}"#,
    )
    .unwrap();
    let store = workspace.store();

    let first = ServiceEntry::new("u2").with_tool_prefix("gh");
    store.upsert_registry(&[("github", &first)]).unwrap();
    assert_eq!(
        workspace.registry_json(),
        json!({
            "slack": {"url": "u1", "disabled": true},
            "github": {"url": "u2", "disabled": false, "tool_prefix": "gh"}
        })
    );

    let mut second = ServiceEntry::new("u3");
    second.disabled = true;
    store.upsert_registry(&[("github", &second)]).unwrap();
    assert_eq!(
        workspace.registry_json()["github"],
        json!({"url": "u3", "disabled": true})
    );

    let raw = fs::read_to_string(workspace.registry_path()).unwrap();
    assert!(raw.starts_with("{\n  \"slack\""), "{raw}");
}

#[test]
fn malformed_registry_is_treated_as_empty() {
    let workspace = Workspace::new();
    fs::write(workspace.registry_path(), "{ not json").unwrap();
    let store = workspace.store();
    assert!(store.load_registry().is_empty());

    store
        .upsert_registry(&[(
            "linear",
            &ServiceEntry::new("http://tiger-linear-mcp-server/mcp"),
        )])
        .unwrap();
    assert_eq!(store.load_registry().len(), 1);
}

#[test]
fn profile_edits_preserve_other_lines() {
    let workspace = Workspace::new();
    workspace
        .write_env("PGHOST=db\nCOMPOSE_PROFILES=db,github\nLINEAR_API_KEY=");
    let store = workspace.store();

    assert!(store.set_profile("github", false).unwrap());
    assert!(!store.set_profile("github", false).unwrap());
    assert!(store.set_profile("linear", true).unwrap());
    assert_eq!(
        workspace.read_env(),
        "PGHOST=db\nCOMPOSE_PROFILES=db,linear\nLINEAR_API_KEY="
    );
}
