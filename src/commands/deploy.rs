use clap::Args;
use deckhand::deploy::{self, OperationReport};

use super::CmdResult;

#[derive(Args)]
pub struct SetupArgs {
    /// Project ID
    pub project_id: String,
}

#[derive(Args)]
pub struct DeployArgs {
    /// Project ID
    pub project_id: String,
}

#[derive(Args)]
pub struct RollbackArgs {
    /// Project ID
    pub project_id: String,

    /// Git commit hash or tag to reset to
    pub commit_id: String,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Project ID
    pub project_id: String,

    /// Required confirmation flag; this removes code, virtualenv and database
    #[arg(long)]
    pub yes: bool,
}

pub fn run_setup(args: SetupArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<OperationReport> {
    let report = deploy::setup(&args.project_id)?;
    Ok((report, 0))
}

pub fn run_deploy(
    args: DeployArgs,
    _global: &crate::commands::GlobalArgs,
) -> CmdResult<OperationReport> {
    let report = deploy::deploy(&args.project_id).map_err(|e| {
        if e.code == deckhand::ErrorCode::RemoteCommandFailed {
            e.with_hint(
                "The host may still be in maintenance mode. Fix the cause and rerun \
                 'deckhand deploy', or run 'deckhand apache <project> maintenance-down'",
            )
        } else {
            e
        }
    })?;
    Ok((report, 0))
}

pub fn run_rollback(
    args: RollbackArgs,
    _global: &crate::commands::GlobalArgs,
) -> CmdResult<OperationReport> {
    let report = deploy::rollback(&args.project_id, &args.commit_id)?;
    Ok((report, 0))
}

pub fn run_destroy(
    args: DestroyArgs,
    _global: &crate::commands::GlobalArgs,
) -> CmdResult<OperationReport> {
    if !args.yes {
        return Err(deckhand::Error::validation_missing_argument(vec![
            "--yes".to_string(),
        ])
        .with_hint("destroy removes the checkout, the virtualenv and the database"));
    }

    let report = deploy::destroy(&args.project_id)?;
    Ok((report, 0))
}
