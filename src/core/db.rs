//! MySQL database lifecycle for a project.
//!
//! SQL is piped through the `mysql` client on the target host. Statements are
//! assembled from configuration; identifiers come from the project config and
//! string values are escaped for the single-quoted SQL context.

use crate::error::Result;
use crate::project::{self, Project};
use crate::session::Session;
use crate::shell;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbResult {
    pub project_id: String,
    pub database: String,
    pub action: String,
    pub exit_code: i32,
    pub success: bool,
}

fn db_result(project: &Project, action: &str, exit_code: i32, success: bool) -> Result<DbResult> {
    Ok(DbResult {
        project_id: project.id.clone(),
        database: project.require_db_name()?.to_string(),
        action: action.to_string(),
        exit_code,
        success,
    })
}

fn escape_sql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "''")
}

/// Run a SQL string through the mysql root account on the target.
fn run_sql_as_root(session: &Session, sql: &str) -> Result<crate::session::CommandResult> {
    session.run(&format!(
        "echo {} | mysql -uroot",
        shell::escape_command_for_shell(sql)
    ))
}

/// Create the database and grant the project user full privileges on it.
pub fn create_database(session: &Session, project: &Project) -> Result<()> {
    let db = project.require_db_name()?;
    let user = project.require_db_user()?;
    let password = project.require_db_password()?;

    log_status!("db", "Creating database {}", db);

    let sql = format!(
        "create database {db}; grant all privileges on {db}.* to '{user}'@'%' identified by '{password}';",
        db = db,
        user = escape_sql(user),
        password = escape_sql(password),
    );
    run_sql_as_root(session, &sql)?;
    Ok(())
}

/// Drop the project database. Tolerant: a missing database is not an error.
pub fn destroy_database(session: &Session, project: &Project) -> Result<()> {
    let db = project.require_db_name()?;

    log_status!("db", "Dropping database {}", db);

    let _tolerant = session.tolerate_failures();
    run_sql_as_root(session, &format!("drop database if exists {};", db))?;
    Ok(())
}

/// Default dump path when the project doesn't configure one.
fn backup_path(project: &Project) -> Result<String> {
    if let Some(path) = project
        .database
        .backup_path
        .as_deref()
        .filter(|p| !p.is_empty())
    {
        return Ok(path.to_string());
    }

    let home = project.require_home()?;
    let db = project.require_db_name()?;
    Ok(format!(
        "{}/{}-{}.sql",
        home.trim_end_matches('/'),
        db,
        Utc::now().format("%Y%m%d%H%M%S")
    ))
}

/// Dump the database to the backup path on the target host.
pub fn dump_data(session: &Session, project: &Project) -> Result<String> {
    let db = project.require_db_name()?;
    let user = project.require_db_user()?;
    let password = project.require_db_password()?;
    let backup = backup_path(project)?;

    log_status!("db", "Dumping {} to {}", db, backup);

    session.run(&format!(
        "mysqldump -u{} -p{} {} > {}",
        shell::quote_arg(user),
        shell::quote_arg(password),
        db,
        shell::quote_path(&backup)
    ))?;
    Ok(backup)
}

/// Load the SQL dump into the database. Tolerant: partial dumps emit
/// warnings rather than aborting, matching the original workflow.
pub fn load_data(session: &Session, project: &Project) -> Result<()> {
    let db = project.require_db_name()?;
    let user = project.require_db_user()?;
    let password = project.require_db_password()?;
    let backup = project.require_db_backup_path()?;

    log_status!("db", "Loading {} into {}", backup, db);

    let _tolerant = session.tolerate_failures();
    session.run(&format!(
        "mysql -u{} -p{} {} < {}",
        shell::quote_arg(user),
        shell::quote_arg(password),
        db,
        shell::quote_path(backup)
    ))?;
    Ok(())
}

// ============================================================================
// Entry points (load project, resolve session)
// ============================================================================

pub fn create(project_id: &str) -> Result<DbResult> {
    let proj = project::load(project_id)?;
    let session = Session::for_project(&proj)?;
    create_database(&session, &proj)?;
    db_result(&proj, "create", 0, true)
}

pub fn destroy(project_id: &str) -> Result<DbResult> {
    let proj = project::load(project_id)?;
    let session = Session::for_project(&proj)?;
    destroy_database(&session, &proj)?;
    db_result(&proj, "destroy", 0, true)
}

pub fn dump(project_id: &str) -> Result<DbResult> {
    let proj = project::load(project_id)?;
    let session = Session::for_project(&proj)?;
    dump_data(&session, &proj)?;
    db_result(&proj, "dump", 0, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_sql_doubles_quotes() {
        assert_eq!(escape_sql("pa'ss"), "pa''ss");
        assert_eq!(escape_sql(r"back\slash"), r"back\\slash");
    }
}
