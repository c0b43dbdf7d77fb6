//! Django management-command dispatch.
//!
//! Development projects run `./manage.py` on the invoking machine; staging
//! and production run it on the remote host inside the project virtualenv
//! with `codeRoot` as the working directory. The settings module
//! `{projectName}.settings_{environment}` is appended to every invocation.

use crate::error::Result;
use crate::project::Project;
use crate::session::{CommandResult, LocalExec, Session};
use crate::ssh;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageResult {
    pub project_id: String,
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

fn manage_command(project: &Project, cmd: &str) -> String {
    format!("./manage.py {} --settings={}", cmd, project.settings_module())
}

/// Run a Django management command for the project.
pub fn manage(session: &Session, project: &Project, cmd: &str) -> Result<CommandResult> {
    let command = manage_command(project, cmd);

    if !project.environment.is_remote() {
        return session.local(&command);
    }

    let _env = session.virtualenv(project)?;
    let _dir = session.cd(project.require_code_root()?);
    session.run(&command)
}

/// Run a management command with stdio attached (e.g. `shell`, `runserver`).
/// Only meaningful for development projects; remote projects go through
/// `manage` so output is captured.
pub fn manage_interactive(project: &Project, cmd: &str) -> i32 {
    ssh::execute_local_command_interactive(&manage_command(project, cmd))
}

pub fn syncdb(session: &Session, project: &Project) -> Result<CommandResult> {
    log_status!("django", "Syncing {} database", project.project_name);
    manage(session, project, "syncdb")
}

pub fn migrate(session: &Session, project: &Project) -> Result<CommandResult> {
    log_status!("django", "Migrating apps");
    manage(session, project, "migrate --all")
}

pub fn collectstatic(session: &Session, project: &Project) -> Result<CommandResult> {
    log_status!("django", "Collecting static files");
    manage(session, project, "collectstatic --noinput")
}

/// Entry point for the `manage` CLI command. Tolerant: the caller gets the
/// captured output and exit code either way, like running manage.py by hand.
pub fn run_manage(project_id: &str, cmd: &str) -> Result<ManageResult> {
    let proj = crate::project::load(project_id)?;
    let session = Session::for_project(&proj)?;

    let result = {
        let _tolerant = session.tolerate_failures();
        manage(&session, &proj, cmd)?
    };

    Ok(ManageResult {
        project_id: proj.id,
        command: cmd.to_string(),
        stdout: result.stdout,
        stderr: result.stderr,
        exit_code: result.exit_code,
        success: result.success,
    })
}

/// Development server bound to all interfaces on the configured port.
pub fn runserver(project: &Project) -> Result<i32> {
    let port = project.require_server_port()?;
    log_status!(
        "django",
        "Running development server. Access at http://127.0.0.1:{}",
        port
    );
    Ok(manage_interactive(
        project,
        &format!("runserver 0.0.0.0:{}", port),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{DatabaseConfig, Environment};

    fn project() -> Project {
        Project {
            id: "site".to_string(),
            project_name: "site".to_string(),
            environment: Environment::Production,
            server_id: None,
            repo: None,
            branch: None,
            home: None,
            site_root: None,
            code_root: Some("/srv/site/code".to_string()),
            virtualenv_root: Some("/envs".to_string()),
            server_name: None,
            apache_config_path: None,
            server_port: None,
            database: DatabaseConfig::default(),
        }
    }

    #[test]
    fn manage_command_appends_settings_module() {
        let p = project();
        assert_eq!(
            manage_command(&p, "migrate --all"),
            "./manage.py migrate --all --settings=site.settings_production"
        );
    }
}
