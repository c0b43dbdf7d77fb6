//! Git operations on the deployed checkout.

use crate::error::Result;
use crate::project::Project;
use crate::session::Session;
use crate::shell;

/// Initial clone of the project repository into `codeRoot`.
pub fn clone_repo(session: &Session, project: &Project) -> Result<()> {
    let repo = project.require_repo()?;
    let code_root = project.require_code_root()?;

    log_status!("git", "Cloning {} into {}", repo, code_root);
    session.run(&format!(
        "git clone {} {}",
        shell::quote_arg(repo),
        shell::quote_path(code_root)
    ))?;
    Ok(())
}

/// Pull the latest code on the configured branch.
pub fn checkout_latest(session: &Session, project: &Project) -> Result<()> {
    let code_root = project.require_code_root()?;
    let branch = project.branch();

    log_status!("git", "Checking out {}", branch);
    let _dir = session.cd(code_root);
    session.run(&format!(
        "git checkout {} && git pull origin {}",
        shell::quote_arg(branch),
        shell::quote_arg(branch)
    ))?;
    Ok(())
}

/// Reset the checkout to an arbitrary commit hash or tag.
pub fn reset(session: &Session, project: &Project, commit_id: &str) -> Result<()> {
    let code_root = project.require_code_root()?;

    log_status!("git", "Resetting to {}", commit_id);
    let _dir = session.cd(code_root);
    session.run(&format!(
        "git reset --hard {}",
        shell::quote_arg(commit_id)
    ))?;
    Ok(())
}
