//! Apache configuration management.
//!
//! The site repository ships placeholder templates under
//! `{codeRoot}/deploy/apache/`; deckhand fetches them from the target host,
//! renders them against the project configuration, uploads the results, and
//! installs the active conf into `{apacheConfigPath}/sites/`.
//!
//! Maintenance mode swaps the installed site conf for the repository's
//! static maintenance conf; `maintenance_down` reinstalls the rendered
//! normal conf. A deploy that fails mid-sequence leaves maintenance mode
//! up on purpose — see the deploy module.

use crate::error::{Error, Result};
use crate::project::{self, Project};
use crate::session::Session;
use crate::shell;
use crate::template::{self, TemplateVars};
use crate::transfer;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApacheResult {
    pub project_id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_conf: Option<String>,
}

/// Directory in the checkout holding templates and rendered files.
fn deploy_dir(project: &Project) -> Result<String> {
    Ok(format!(
        "{}/deploy/apache",
        project.require_code_root()?.trim_end_matches('/')
    ))
}

/// Installed site conf path under the Apache config root.
fn installed_conf_path(project: &Project) -> Result<String> {
    Ok(format!(
        "{}/sites/{}.conf",
        project.require_apache_config_path()?.trim_end_matches('/'),
        project.require_server_name()?
    ))
}

fn render_vars(project: &Project) -> Result<HashMap<String, String>> {
    let apache_config = project.require_apache_config_path()?;
    let mut vars = HashMap::new();
    vars.insert(
        TemplateVars::PROJECT.to_string(),
        project.project_name.clone(),
    );
    vars.insert(
        TemplateVars::ENVIRONMENT.to_string(),
        project.environment.to_string(),
    );
    vars.insert(
        TemplateVars::SERVER_NAME.to_string(),
        project.require_server_name()?.to_string(),
    );
    vars.insert(
        TemplateVars::HOME.to_string(),
        project.require_home()?.to_string(),
    );
    vars.insert(
        TemplateVars::CERTIFICATE_FILE.to_string(),
        format!(
            "{}/ssl-certificate.conf",
            apache_config.trim_end_matches('/')
        ),
    );
    Ok(vars)
}

/// Fetch one template from the target, render it, and upload the result
/// next to the template as `{environment}.{ext}`.
fn render_template(
    session: &Session,
    project: &Project,
    vars: &HashMap<String, String>,
    ext: &str,
) -> Result<String> {
    let dir = deploy_dir(project)?;
    let remote_template = format!("{}/template.{}", dir, ext);
    let rendered_remote = format!("{}/{}.{}", dir, project.environment, ext);

    let scratch = std::env::temp_dir().join(format!(
        "deckhand-{}-{}.{}",
        project.id,
        std::process::id(),
        ext
    ));
    let scratch_str = scratch.to_string_lossy().to_string();

    session.get(&remote_template, &scratch_str)?;

    let content = std::fs::read_to_string(&scratch)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", scratch_str))))?;
    if ext == "conf" && !template::is_present(&content, TemplateVars::SERVER_NAME) {
        log_status!(
            "apache",
            "Warning: {} has no <servername> marker",
            remote_template
        );
    }
    let rendered = template::render_map(&content, vars);
    std::fs::write(&scratch, rendered)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("write {}", scratch_str))))?;

    log_status!(
        "apache",
        "Rendering {} as {}",
        remote_template,
        rendered_remote
    );
    transfer::put_with_session(session, &scratch_str, &rendered_remote, Some("0755"))?;

    let _ = std::fs::remove_file(&scratch);
    Ok(rendered_remote)
}

/// Render conf and wsgi files from the repository templates.
pub fn create_conf_files(session: &Session, project: &Project) -> Result<()> {
    log_status!("apache", "Creating apache conf files from templates");
    let vars = render_vars(project)?;
    render_template(session, project, &vars, "conf")?;
    render_template(session, project, &vars, "wsgi")?;
    Ok(())
}

/// Install the rendered conf and wsgi into their live locations.
pub fn install_conf(session: &Session, project: &Project) -> Result<String> {
    let code_root = project.require_code_root()?.trim_end_matches('/');
    let dir = deploy_dir(project)?;
    let conf = format!("{}/{}.conf", dir, project.environment);
    let wsgi = format!("{}/{}.wsgi", dir, project.environment);
    let wsgi_dest = format!("{}/apache/{}.wsgi", code_root, project.environment);
    let conf_dest = installed_conf_path(project)?;

    log_status!("apache", "Installing site configuration");
    session.run(&format!("mkdir -p {}", shell::quote_path(&format!("{}/apache", code_root))))?;
    session.run(&format!(
        "cp {} {}",
        shell::quote_path(&wsgi),
        shell::quote_path(&wsgi_dest)
    ))?;
    session.sudo(
        &format!(
            "cp {} {}",
            shell::quote_path(&conf),
            shell::quote_path(&conf_dest)
        ),
        None,
    )?;

    Ok(conf_dest)
}

/// Test the Apache configuration on the target.
pub fn configtest(session: &Session) -> Result<()> {
    session.run("apachectl configtest")?;
    Ok(())
}

/// Restart Apache on the target.
pub fn reload(session: &Session) -> Result<()> {
    log_status!("apache", "Reloading apache");
    session.sudo("apachectl restart", None)?;
    Ok(())
}

/// Swap in the maintenance page configuration.
pub fn maintenance_up(session: &Session, project: &Project) -> Result<()> {
    let maintenance = format!("{}/maintenance.conf", deploy_dir(project)?);
    let conf_dest = installed_conf_path(project)?;

    log_status!("apache", "Putting up the maintenance page");
    session.sudo(
        &format!(
            "cp {} {}",
            shell::quote_path(&maintenance),
            shell::quote_path(&conf_dest)
        ),
        None,
    )?;
    reload(session)
}

/// Reinstall the normal site configuration.
pub fn maintenance_down(session: &Session, project: &Project) -> Result<()> {
    log_status!("apache", "Restoring the site configuration");
    install_conf(session, project)?;
    reload(session)
}

/// Full apache setup: render templates and install.
pub fn setup(session: &Session, project: &Project) -> Result<()> {
    log_status!("apache", "Updating apache settings");
    create_conf_files(session, project)?;
    install_conf(session, project)?;
    reload(session)
}

// ============================================================================
// Entry points (load project, resolve session)
// ============================================================================

fn entry(project_id: &str) -> Result<(Project, Session)> {
    let proj = project::load(project_id)?;
    proj.require_remote_environment()?;
    let session = Session::for_project(&proj)?;
    Ok((proj, session))
}

pub fn run_configtest(project_id: &str) -> Result<ApacheResult> {
    let (proj, session) = entry(project_id)?;
    configtest(&session)?;
    Ok(ApacheResult {
        project_id: proj.id,
        action: "configtest".to_string(),
        installed_conf: None,
    })
}

pub fn run_reload(project_id: &str) -> Result<ApacheResult> {
    let (proj, session) = entry(project_id)?;
    reload(&session)?;
    Ok(ApacheResult {
        project_id: proj.id,
        action: "reload".to_string(),
        installed_conf: None,
    })
}

pub fn run_install(project_id: &str) -> Result<ApacheResult> {
    let (proj, session) = entry(project_id)?;
    setup(&session, &proj)?;
    let installed = installed_conf_path(&proj)?;
    Ok(ApacheResult {
        project_id: proj.id,
        action: "install".to_string(),
        installed_conf: Some(installed),
    })
}

pub fn run_maintenance_up(project_id: &str) -> Result<ApacheResult> {
    let (proj, session) = entry(project_id)?;
    maintenance_up(&session, &proj)?;
    Ok(ApacheResult {
        project_id: proj.id,
        action: "maintenance-up".to_string(),
        installed_conf: None,
    })
}

pub fn run_maintenance_down(project_id: &str) -> Result<ApacheResult> {
    let (proj, session) = entry(project_id)?;
    maintenance_down(&session, &proj)?;
    Ok(ApacheResult {
        project_id: proj.id,
        action: "maintenance-down".to_string(),
        installed_conf: None,
    })
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
            home: Some("/home/deploy".to_string()),
            site_root: None,
            code_root: Some("/srv/site/code".to_string()),
            virtualenv_root: None,
            server_name: Some("example.org".to_string()),
            apache_config_path: Some("/etc/apache2".to_string()),
            server_port: None,
            database: DatabaseConfig::default(),
        }
    }

    #[test]
    fn installed_conf_path_uses_server_name() {
        let p = project();
        assert_eq!(
            installed_conf_path(&p).unwrap(),
            "/etc/apache2/sites/example.org.conf"
        );
    }

    #[test]
    fn render_vars_includes_certificate_file() {
        let p = project();
        let vars = render_vars(&p).unwrap();
        assert_eq!(
            vars.get(TemplateVars::CERTIFICATE_FILE).unwrap(),
            "/etc/apache2/ssl-certificate.conf"
        );
        assert_eq!(vars.get(TemplateVars::SERVER_NAME).unwrap(), "example.org");
    }

    #[test]
    fn missing_apache_config_fails_before_any_command() {
        let mut p = project();
        p.apache_config_path = None;
        let err = render_vars(&p).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigMissingKey);
    }
}
