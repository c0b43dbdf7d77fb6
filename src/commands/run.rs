use clap::Args;
use deckhand::project;
use deckhand::server;
use deckhand::session::Session;
use deckhand::shell;
use deckhand::ssh::SshClient;
use serde::Serialize;

use super::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Target ID (project or server; project wins when ambiguous)
    pub target: String,

    /// Command to execute.
    ///
    /// If you need shell operators (&&, |, redirects), pass a single quoted
    /// string: `deckhand run my-site "cd /srv && ls | head"`
    #[arg(num_args = 0.., trailing_var_arg = true)]
    pub command: Vec<String>,

    /// Run with sudo on the target
    #[arg(long)]
    pub sudo: bool,

    /// User to impersonate with sudo
    #[arg(long, requires = "sudo")]
    pub user: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    pub exit_code: i32,
    pub success: bool,
}

/// Resolve a target ID to a session: try project first, then bare server.
fn resolve_session(target: &str) -> deckhand::Result<(Session, Option<String>)> {
    if project::exists(target) {
        let proj = project::load(target)?;
        let session = Session::for_project(&proj)?;
        return Ok((session, Some(proj.id)));
    }

    let srv = server::load(target)?;
    let client = SshClient::from_server(&srv, target)?;
    Ok((Session::remote(client, target), None))
}

pub fn run(args: RunArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RunOutput> {
    let (session, project_id) = resolve_session(&args.target)?;

    if args.command.is_empty() {
        return Err(deckhand::Error::validation_missing_argument(vec![
            "command".to_string(),
        ])
        .with_hint("Pass the command to execute, e.g. deckhand run my-site uptime"));
    }

    let command = if args.command.len() == 1 {
        // A single string is treated as a raw shell command.
        args.command[0].clone()
    } else {
        // Multi-arg form: quote args safely. Does NOT support shell
        // operators; pass a single string for that.
        shell::quote_args(&args.command)
    };

    // Tolerant: the point of `run` is to surface whatever the command did.
    let result = {
        let _tolerant = session.tolerate_failures();
        if args.sudo {
            session.sudo(&command, args.user.as_deref())?
        } else {
            session.run(&command)?
        }
    };

    let exit_code = if result.success { 0 } else { 1 };

    Ok((
        RunOutput {
            target: args.target,
            project_id,
            command: Some(command),
            stdout: Some(result.stdout),
            stderr: Some(result.stderr),
            exit_code: result.exit_code,
            success: result.success,
        },
        exit_code,
    ))
}
