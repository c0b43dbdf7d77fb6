use crate::config::{self, ConfigEntity};
use crate::error::{Error, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Target environment a project deploys to.
///
/// `development` runs everything locally; the other two run over SSH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, Environment::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Remote path of the SQL dump used by `db dump` / `db load`.
    #[serde(default)]
    pub backup_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(skip_deserializing, default)]
    pub id: String,
    /// Django project package name (the `<project>` in `<project>.settings_<env>`).
    pub project_name: String,
    pub environment: Environment,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub site_root: Option<String>,
    #[serde(default)]
    pub code_root: Option<String>,
    #[serde(default)]
    pub virtualenv_root: Option<String>,
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub apache_config_path: Option<String>,
    #[serde(default)]
    pub server_port: Option<u16>,
    #[serde(default)]
    pub database: DatabaseConfig,
}

const DEFAULT_BRANCH: &str = "master";

impl Project {
    /// Branch to deploy; defaults to master when unset.
    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Settings module passed to every manage.py invocation.
    pub fn settings_module(&self) -> String {
        format!("{}.settings_{}", self.project_name, self.environment)
    }

    /// Shell command that activates the project's virtualenv.
    ///
    /// Derived purely from `virtualenvRoot` and `projectName`, so repeated
    /// calls always yield the same command.
    pub fn activation_command(&self) -> Result<String> {
        let root = self.require_virtualenv_root()?;
        Ok(format!(
            "source {}/{}/bin/activate",
            root.trim_end_matches('/'),
            self.project_name
        ))
    }

    /// Path of the virtualenv directory itself.
    pub fn virtualenv_dir(&self) -> Result<String> {
        let root = self.require_virtualenv_root()?;
        Ok(format!(
            "{}/{}",
            root.trim_end_matches('/'),
            self.project_name
        ))
    }

    // ------------------------------------------------------------------
    // Fail-fast accessors: every operation resolves the keys it needs
    // through these before issuing any remote command.
    // ------------------------------------------------------------------

    fn require_key<'a>(&'a self, key: &str, value: &'a Option<String>) -> Result<&'a str> {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config_missing_key(key, Some(self.id.clone())))
    }

    pub fn require_server_id(&self) -> Result<&str> {
        self.require_key("project.serverId", &self.server_id)
    }

    pub fn require_repo(&self) -> Result<&str> {
        self.require_key("project.repo", &self.repo)
    }

    pub fn require_home(&self) -> Result<&str> {
        self.require_key("project.home", &self.home)
    }

    pub fn require_site_root(&self) -> Result<&str> {
        self.require_key("project.siteRoot", &self.site_root)
    }

    pub fn require_code_root(&self) -> Result<&str> {
        self.require_key("project.codeRoot", &self.code_root)
    }

    pub fn require_virtualenv_root(&self) -> Result<&str> {
        self.require_key("project.virtualenvRoot", &self.virtualenv_root)
    }

    pub fn require_server_name(&self) -> Result<&str> {
        self.require_key("project.serverName", &self.server_name)
    }

    pub fn require_apache_config_path(&self) -> Result<&str> {
        self.require_key("project.apacheConfigPath", &self.apache_config_path)
    }

    pub fn require_server_port(&self) -> Result<u16> {
        self.server_port
            .ok_or_else(|| Error::config_missing_key("project.serverPort", Some(self.id.clone())))
    }

    pub fn require_db_name(&self) -> Result<&str> {
        self.require_key("project.database.name", &self.database.name)
    }

    pub fn require_db_user(&self) -> Result<&str> {
        self.require_key("project.database.user", &self.database.user)
    }

    pub fn require_db_password(&self) -> Result<&str> {
        self.require_key("project.database.password", &self.database.password)
    }

    pub fn require_db_backup_path(&self) -> Result<&str> {
        self.require_key("project.database.backupPath", &self.database.backup_path)
    }

    /// Refuse remote-only operations against a development project.
    pub fn require_remote_environment(&self) -> Result<()> {
        if !self.environment.is_remote() {
            return Err(Error::config_invalid_value(
                "project.environment",
                Some(self.environment.to_string()),
                "This operation only applies to staging or production projects",
            ));
        }
        Ok(())
    }
}

impl ConfigEntity for Project {
    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn config_path(id: &str) -> Result<PathBuf> {
        paths::project(id)
    }
    fn config_dir() -> Result<PathBuf> {
        paths::projects()
    }
    fn not_found_error(id: String, suggestions: Vec<String>) -> Error {
        Error::project_not_found(id, suggestions)
    }
    fn entity_type() -> &'static str {
        "project"
    }

    fn validate(&self) -> Result<()> {
        if self.project_name.is_empty() {
            return Err(Error::config_invalid_value(
                "project.projectName",
                None,
                "projectName cannot be empty",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Core CRUD - Thin wrappers around config module
// ============================================================================

pub fn load(id: &str) -> Result<Project> {
    config::load::<Project>(id)
}

pub fn list() -> Result<Vec<Project>> {
    config::list::<Project>()
}

pub fn save(project: &Project) -> Result<()> {
    config::save(project)
}

pub fn delete(id: &str) -> Result<()> {
    config::delete::<Project>(id)
}

pub fn exists(id: &str) -> bool {
    config::exists::<Project>(id)
}

pub fn create(json_spec: &str) -> Result<Project> {
    config::create::<Project>(json_spec)
}

pub fn merge(id: &str, json_spec: &str) -> Result<Vec<String>> {
    Ok(config::merge::<Project>(id, json_spec)?.updated_fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            id: "site".to_string(),
            project_name: "site".to_string(),
            environment: Environment::Staging,
            server_id: None,
            repo: None,
            branch: None,
            home: None,
            site_root: None,
            code_root: None,
            virtualenv_root: Some("/envs".to_string()),
            server_name: None,
            apache_config_path: None,
            server_port: None,
            database: DatabaseConfig::default(),
        }
    }

    #[test]
    fn activation_command_derivation() {
        let p = project();
        assert_eq!(
            p.activation_command().unwrap(),
            "source /envs/site/bin/activate"
        );
    }

    #[test]
    fn activation_command_is_idempotent() {
        let p = project();
        assert_eq!(
            p.activation_command().unwrap(),
            p.activation_command().unwrap()
        );
    }

    #[test]
    fn activation_command_trims_trailing_slash() {
        let mut p = project();
        p.virtualenv_root = Some("/envs/".to_string());
        assert_eq!(
            p.activation_command().unwrap(),
            "source /envs/site/bin/activate"
        );
    }

    #[test]
    fn missing_key_fails_fast() {
        let p = project();
        let err = p.require_code_root().unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigMissingKey);
    }

    #[test]
    fn settings_module_follows_environment() {
        let p = project();
        assert_eq!(p.settings_module(), "site.settings_staging");
    }

    #[test]
    fn branch_defaults_to_master() {
        let mut p = project();
        assert_eq!(p.branch(), "master");
        p.branch = Some("release".to_string());
        assert_eq!(p.branch(), "release");
    }

    #[test]
    fn development_environment_refused_for_remote_ops() {
        let mut p = project();
        p.environment = Environment::Development;
        assert!(p.require_remote_environment().is_err());
    }
}
