//! First-time host provisioning: directories, virtualenv, dependencies.

use crate::error::{Error, Result};
use crate::project::Project;
use crate::session::Session;
use crate::shell;

/// Create the directories deployment expects.
pub fn setup_directories(session: &Session, project: &Project) -> Result<()> {
    let site_root = project.require_site_root()?;
    let home = project.require_home()?;

    log_status!("setup", "Creating project directories");
    session.run(&format!("mkdir -p {}", shell::quote_path(site_root)))?;
    session.run(&format!(
        "mkdir -p {}",
        shell::quote_path(&format!("{}/www/log", home.trim_end_matches('/')))
    ))?;
    Ok(())
}

/// Create the project virtualenv via virtualenvwrapper.
pub fn setup_virtualenv(session: &Session, project: &Project) -> Result<()> {
    let venv_root = project.require_virtualenv_root()?;

    log_status!("setup", "Creating a virtual environment in {}", venv_root);
    session.sudo(
        &format!(
            "WORKON_HOME={} && source /usr/local/bin/virtualenvwrapper.sh && mkvirtualenv --no-site-packages {}",
            shell::quote_arg(venv_root),
            shell::quote_arg(&project.project_name)
        ),
        None,
    )?;
    Ok(())
}

/// Install pip requirements from the environment's requirements file.
///
/// The file is fetched from the checkout and installed line by line inside
/// the virtualenv — requirements files carry no ordering guarantee, and a
/// single `pip install -r` can resolve them in the wrong order for packages
/// that need their build dependencies present first.
pub fn install_requirements(session: &Session, project: &Project) -> Result<()> {
    let code_root = project.require_code_root()?.trim_end_matches('/');
    let remote_requirements =
        format!("{}/requirements/{}.txt", code_root, project.environment);

    log_status!(
        "setup",
        "Installing dependencies - this may take some time, please be patient"
    );

    let scratch = std::env::temp_dir().join(format!(
        "deckhand-requirements-{}-{}.txt",
        project.id,
        std::process::id()
    ));
    let scratch_str = scratch.to_string_lossy().to_string();
    session.get(&remote_requirements, &scratch_str)?;

    let content = std::fs::read_to_string(&scratch)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", scratch_str))))?;
    let _ = std::fs::remove_file(&scratch);

    let _env = session.virtualenv(project)?;
    for requirement in requirement_lines(&content) {
        session.run(&format!("pip install {}", shell::quote_arg(&requirement)))?;
    }

    Ok(())
}

/// Installable lines of a requirements file: comments and blanks skipped.
fn requirement_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirement_lines_skip_comments_and_blanks() {
        let content = "# pinned for prod\nDjango==1.4\n\nSouth==0.7.6\n  # trailing comment\n";
        assert_eq!(
            requirement_lines(content),
            vec!["Django==1.4".to_string(), "South==0.7.6".to_string()]
        );
    }
}
