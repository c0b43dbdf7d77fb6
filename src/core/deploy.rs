//! Top-level deployment operations.
//!
//! Every operation is a strict ordered sequence of remote commands; the first
//! unrecovered failure aborts the remainder and propagates. Required
//! configuration keys are resolved before the first command is issued, so a
//! misconfigured project never gets a half-executed sequence.
//!
//! Known risk surface: `deploy`, `rollback`, and `load-new-data` raise the
//! maintenance page first. If a later step fails, the sequence stops and the
//! host deliberately stays in maintenance mode — rerun the operation (or
//! `apache maintenance-down`) after fixing the cause.

use crate::apache;
use crate::db;
use crate::django;
use crate::error::Result;
use crate::git;
use crate::project::{self, Project};
use crate::provision;
use crate::session::Session;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReport {
    pub project_id: String,
    pub operation: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub steps: Vec<String>,
}

struct Runner {
    report: OperationReport,
}

impl Runner {
    fn new(project: &Project, session: &Session, operation: &str) -> Self {
        Self {
            report: OperationReport {
                project_id: project.id.clone(),
                operation: operation.to_string(),
                environment: project.environment.to_string(),
                host: session.host().map(str::to_string),
                steps: Vec::new(),
            },
        }
    }

    fn step(&mut self, name: &str, result: Result<()>) -> Result<()> {
        result?;
        self.report.steps.push(name.to_string());
        Ok(())
    }

    fn finish(self) -> OperationReport {
        self.report
    }
}

/// GZip pre-rendered assets via the repository's helper script.
fn gzip_assets(session: &Session, project: &Project) -> Result<()> {
    let code_root = project.require_code_root()?;
    log_status!("deploy", "Gzipping assets");
    let _dir = session.cd(code_root);
    session.run("python gzip_assets.py")?;
    Ok(())
}

// ============================================================================
// setup
// ============================================================================

fn validate_setup_keys(project: &Project) -> Result<()> {
    project.require_server_id()?;
    project.require_site_root()?;
    project.require_home()?;
    project.require_virtualenv_root()?;
    project.require_repo()?;
    project.require_code_root()?;
    project.require_db_name()?;
    project.require_db_user()?;
    project.require_db_password()?;
    project.require_server_name()?;
    project.require_apache_config_path()?;
    Ok(())
}

/// Set up a fresh host: directories, virtualenv, clone, database, Apache.
///
/// Does NOT perform the functions of `deploy`.
pub fn setup(project_id: &str) -> Result<OperationReport> {
    let proj = project::load(project_id)?;
    proj.require_remote_environment()?;
    validate_setup_keys(&proj)?;

    let session = Session::for_project(&proj)?;
    let mut runner = Runner::new(&proj, &session, "setup");

    runner.step("directories", provision::setup_directories(&session, &proj))?;
    runner.step("virtualenv", provision::setup_virtualenv(&session, &proj))?;
    runner.step("clone", git::clone_repo(&session, &proj))?;
    runner.step("checkout", git::checkout_latest(&session, &proj))?;
    runner.step("db-destroy", db::destroy_database(&session, &proj))?;
    runner.step("db-create", db::create_database(&session, &proj))?;
    runner.step(
        "requirements",
        provision::install_requirements(&session, &proj),
    )?;
    runner.step("apache", apache::setup(&session, &proj))?;
    runner.step("syncdb", django::syncdb(&session, &proj).map(|_| ()))?;
    runner.step("migrate", django::migrate(&session, &proj).map(|_| ()))?;

    Ok(runner.finish())
}

// ============================================================================
// deploy
// ============================================================================

fn validate_deploy_keys(project: &Project) -> Result<()> {
    project.require_server_id()?;
    project.require_code_root()?;
    project.require_virtualenv_root()?;
    project.require_server_name()?;
    project.require_apache_config_path()?;
    Ok(())
}

/// Deploy the latest version of the site and restart Apache.
///
/// Does not perform the functions of `load-new-data`.
pub fn deploy(project_id: &str) -> Result<OperationReport> {
    let proj = project::load(project_id)?;
    proj.require_remote_environment()?;
    validate_deploy_keys(&proj)?;

    let session = Session::for_project(&proj)?;
    let mut runner = Runner::new(&proj, &session, "deploy");

    // Maintenance-up is tolerant: a first deploy has no conf installed yet.
    {
        let _tolerant = session.tolerate_failures();
        runner.step("maintenance-up", apache::maintenance_up(&session, &proj))?;
    }

    runner.step("checkout", git::checkout_latest(&session, &proj))?;
    runner.step("migrate", django::migrate(&session, &proj).map(|_| ()))?;
    runner.step(
        "collectstatic",
        django::collectstatic(&session, &proj).map(|_| ()),
    )?;
    runner.step("gzip-assets", gzip_assets(&session, &proj))?;
    runner.step(
        "maintenance-down",
        apache::maintenance_down(&session, &proj),
    )?;

    Ok(runner.finish())
}

// ============================================================================
// rollback
// ============================================================================

/// Roll back to a specific git commit hash or tag.
///
/// There is NO guarantee a valid dataset exists for an arbitrary commit.
pub fn rollback(project_id: &str, commit_id: &str) -> Result<OperationReport> {
    let proj = project::load(project_id)?;
    proj.require_remote_environment()?;
    validate_deploy_keys(&proj)?;

    let session = Session::for_project(&proj)?;
    let mut runner = Runner::new(&proj, &session, "rollback");

    runner.step("maintenance-up", apache::maintenance_up(&session, &proj))?;
    runner.step("checkout", git::checkout_latest(&session, &proj))?;
    runner.step("reset", git::reset(&session, &proj, commit_id))?;
    runner.step("gzip-assets", gzip_assets(&session, &proj))?;
    runner.step(
        "maintenance-down",
        apache::maintenance_down(&session, &proj),
    )?;

    Ok(runner.finish())
}

// ============================================================================
// load-new-data
// ============================================================================

fn validate_data_keys(project: &Project) -> Result<()> {
    project.require_server_id()?;
    project.require_code_root()?;
    project.require_server_name()?;
    project.require_apache_config_path()?;
    project.require_db_name()?;
    project.require_db_user()?;
    project.require_db_password()?;
    project.require_db_backup_path()?;
    Ok(())
}

/// Erase the current database and load new data from the SQL dump file.
pub fn load_new_data(project_id: &str) -> Result<OperationReport> {
    let proj = project::load(project_id)?;
    proj.require_remote_environment()?;
    validate_data_keys(&proj)?;

    let session = Session::for_project(&proj)?;
    let mut runner = Runner::new(&proj, &session, "load-new-data");

    runner.step("maintenance-up", apache::maintenance_up(&session, &proj))?;
    runner.step("db-destroy", db::destroy_database(&session, &proj))?;
    runner.step("db-create", db::create_database(&session, &proj))?;
    runner.step("db-load", db::load_data(&session, &proj))?;
    runner.step(
        "maintenance-down",
        apache::maintenance_down(&session, &proj),
    )?;

    Ok(runner.finish())
}

// ============================================================================
// destroy
// ============================================================================

/// Remove all directories, databases, etc. associated with the application.
pub fn destroy(project_id: &str) -> Result<OperationReport> {
    let proj = project::load(project_id)?;
    proj.require_remote_environment()?;
    let code_root = proj.require_code_root()?.to_string();
    let venv_dir = proj.virtualenv_dir()?;
    proj.require_db_name()?;

    let session = Session::for_project(&proj)?;
    let mut runner = Runner::new(&proj, &session, "destroy");

    let _tolerant = session.tolerate_failures();
    runner.step(
        "remove-code",
        session
            .run(&format!("rm -Rf {}", crate::shell::quote_path(&code_root)))
            .map(|_| ()),
    )?;
    runner.step(
        "remove-virtualenv",
        session
            .run(&format!("rm -Rf {}", crate::shell::quote_path(&venv_dir)))
            .map(|_| ()),
    )?;
    runner.step("db-destroy", db::destroy_database(&session, &proj))?;
    runner.step("apache-reload", apache::reload(&session))?;

    Ok(runner.finish())
}
