use clap::Args;
use deckhand::django::{self, ManageResult};
use deckhand::project;
use deckhand::shell;
use serde::Serialize;

use super::CmdResult;

#[derive(Args)]
pub struct ManageArgs {
    /// Project ID
    pub project_id: String,

    /// Management command and its arguments, e.g. `deckhand manage site migrate --all`
    #[arg(num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct RunserverArgs {
    /// Project ID
    pub project_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunserverOutput {
    pub project_id: String,
    pub exit_code: i32,
    pub success: bool,
}

pub fn run(args: ManageArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ManageResult> {
    if args.command.is_empty() {
        return Err(deckhand::Error::validation_missing_argument(vec![
            "command".to_string(),
        ]));
    }

    let cmd = if args.command.len() == 1 {
        args.command[0].clone()
    } else {
        // First word is the management command; the rest are quoted args.
        format!(
            "{} {}",
            args.command[0],
            shell::quote_args(&args.command[1..])
        )
    };

    let result = django::run_manage(&args.project_id, &cmd)?;
    let exit_code = if result.success { 0 } else { 1 };

    Ok((result, exit_code))
}

/// Development server with stdio attached. Refused for remote projects:
/// a production host should never run the Django dev server.
pub fn run_runserver(
    args: RunserverArgs,
    _global: &crate::commands::GlobalArgs,
) -> CmdResult<RunserverOutput> {
    let proj = project::load(&args.project_id)?;

    if proj.environment.is_remote() {
        return Err(deckhand::Error::config_invalid_value(
            "project.environment",
            Some(proj.environment.to_string()),
            "runserver is only available for development projects",
        ));
    }

    let exit_code = django::runserver(&proj)?;

    Ok((
        RunserverOutput {
            project_id: proj.id,
            exit_code,
            success: exit_code == 0,
        },
        exit_code,
    ))
}
