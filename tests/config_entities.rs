//! Config entity round-trips against a scratch config directory.
//!
//! All assertions live in one test: the config directory is selected via an
//! environment variable, and parallel tests must not race on it.

use deckhand::{project, server, ErrorCode};

#[test]
fn entity_crud_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::env::set_var("DECKHAND_CONFIG_DIR", dir.path());

    // --- servers ---------------------------------------------------------

    let created = server::create(
        r#"{"id": "prod", "host": "example.org", "user": "deploy", "port": 22}"#,
    )
    .expect("create server");
    assert_eq!(created.host, "example.org");

    let loaded = server::load("prod").expect("load server");
    assert_eq!(loaded.user, "deploy");
    assert_eq!(loaded.port, 22);

    // duplicate IDs are rejected
    let err = server::create(r#"{"id": "prod", "host": "other.org", "user": "deploy"}"#)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationInvalidArgument);

    // invalid servers are rejected up front
    let err = server::create(r#"{"id": "empty", "host": "", "user": ""}"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::SshServerInvalid);

    // --- projects --------------------------------------------------------

    let created = project::create(
        r#"{
            "id": "site",
            "projectName": "site",
            "environment": "staging",
            "serverId": "prod",
            "virtualenvRoot": "/envs",
            "codeRoot": "/srv/site/code"
        }"#,
    )
    .expect("create project");
    assert_eq!(created.project_name, "site");

    let loaded = project::load("site").expect("load project");
    assert_eq!(loaded.require_code_root().unwrap(), "/srv/site/code");
    assert_eq!(
        loaded.activation_command().unwrap(),
        "source /envs/site/bin/activate"
    );

    // unset keys fail fast with the key name in the error
    let err = loaded.require_apache_config_path().unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigMissingKey);

    // merge patches persist
    let updated = project::merge("site", r#"{"branch": "release", "serverPort": 8000}"#)
        .expect("merge project");
    assert!(updated.contains(&"branch".to_string()));

    let loaded = project::load("site").expect("reload project");
    assert_eq!(loaded.branch(), "release");
    assert_eq!(loaded.require_server_port().unwrap(), 8000);

    // null removes a key
    project::merge("site", r#"{"branch": null}"#).expect("remove branch");
    let loaded = project::load("site").expect("reload project");
    assert_eq!(loaded.branch(), "master");

    // --- not-found suggestions ------------------------------------------

    let err = project::load("sit").unwrap_err();
    assert_eq!(err.code, ErrorCode::ProjectNotFound);
    let suggestions = err
        .details
        .get("suggestions")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert!(suggestions.iter().any(|s| s == "site"));

    // --- listing and deletion -------------------------------------------

    assert_eq!(server::list().expect("list servers").len(), 1);
    project::delete("site").expect("delete project");
    assert!(!project::exists("site"));
}
