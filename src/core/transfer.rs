//! Remote file transfer operations.

use crate::error::{Error, Result};
use crate::project;
use crate::session::Session;
use crate::shell;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutResult {
    pub local_path: String,
    pub remote_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResult {
    pub remote_path: String,
    pub local_path: String,
}

/// Upload a local file to the project's host. scp runs with `-p`, so the
/// source file's mode carries over; `mode` chmods the destination afterwards
/// when an explicit mode is wanted instead.
pub fn put(
    project_id: &str,
    local_path: &str,
    remote_path: &str,
    mode: Option<&str>,
) -> Result<PutResult> {
    let proj = project::load(project_id)?;
    let session = Session::for_project(&proj)?;
    put_with_session(&session, local_path, remote_path, mode)?;

    Ok(PutResult {
        local_path: local_path.to_string(),
        remote_path: remote_path.to_string(),
        mode: mode.map(str::to_string),
    })
}

/// Fetch a file from the project's host.
pub fn get(project_id: &str, remote_path: &str, local_path: &str) -> Result<GetResult> {
    let proj = project::load(project_id)?;
    let session = Session::for_project(&proj)?;
    session.get(remote_path, local_path)?;

    Ok(GetResult {
        remote_path: remote_path.to_string(),
        local_path: local_path.to_string(),
    })
}

/// Session-level upload with optional explicit mode, shared by the Apache
/// config installer.
pub fn put_with_session(
    session: &Session,
    local_path: &str,
    remote_path: &str,
    mode: Option<&str>,
) -> Result<()> {
    if !Path::new(local_path).exists() {
        return Err(Error::validation_invalid_argument(
            "localPath",
            format!("Local file does not exist: {}", local_path),
            None,
        ));
    }

    session.put(local_path, remote_path)?;

    if let Some(mode) = mode {
        session.run(&format!(
            "chmod {} {}",
            shell::quote_arg(mode),
            shell::quote_path(remote_path)
        ))?;
    }

    Ok(())
}
