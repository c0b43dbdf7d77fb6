//! Remote session orchestration.
//!
//! A [`Session`] runs ordered command sequences against one target, wrapping
//! each command in the active execution context (working directory changes and
//! environment activations) and honoring the active failure-tolerance scope.
//!
//! Context scopes are guard objects: entering a scope pushes a modifier onto
//! the session's context stack, and the guard pops it on drop, so modifiers
//! never leak past their scope on any exit path. Composition folds the stack
//! from outermost to innermost; a command run under `cd(p1)` then `cd(p2)`
//! goes over the wire as `cd p1 && (cd p2 && (<command>))`.
//!
//! Failure rules:
//! - transport failures (host unreachable) are always fatal, tolerance or not
//! - a non-zero exit status is fatal unless a tolerance scope is active, in
//!   which case the failing result is returned for inspection instead

use crate::error::{Error, RemoteCommandFailedDetails, Result, TargetDetails};
use crate::project::Project;
use crate::server;
use crate::shell;
use crate::ssh::{self, SshClient};
use std::cell::{Cell, RefCell};

/// Result of one executed command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl From<ssh::CommandOutput> for CommandResult {
    fn from(output: ssh::CommandOutput) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.success,
            exit_code: output.exit_code,
        }
    }
}

enum ContextModifier {
    WorkingDirectory(String),
    EnvironmentActivation(String),
}

enum Target {
    Remote(SshClient),
    Local,
}

pub struct Session {
    target: Target,
    project_id: Option<String>,
    server_id: Option<String>,
    context: RefCell<Vec<ContextModifier>>,
    tolerance_depth: Cell<u32>,
}

impl Session {
    /// Session against a configured server.
    pub fn remote(client: SshClient, server_id: &str) -> Self {
        Self {
            target: Target::Remote(client),
            project_id: None,
            server_id: Some(server_id.to_string()),
            context: RefCell::new(Vec::new()),
            tolerance_depth: Cell::new(0),
        }
    }

    /// Session that executes on the invoking machine (no transport).
    pub fn local() -> Self {
        Self {
            target: Target::Local,
            project_id: None,
            server_id: None,
            context: RefCell::new(Vec::new()),
            tolerance_depth: Cell::new(0),
        }
    }

    /// Build a session for a project: local for development projects,
    /// SSH to the configured server otherwise.
    pub fn for_project(project: &Project) -> Result<Self> {
        let mut session = if project.environment.is_remote() {
            let server_id = project.require_server_id()?;
            let srv = server::load(server_id)?;
            let client = SshClient::from_server(&srv, server_id)?;
            Session::remote(client, server_id)
        } else {
            Session::local()
        };
        session.project_id = Some(project.id.clone());
        Ok(session)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.target, Target::Remote(_))
    }

    pub fn host(&self) -> Option<&str> {
        match &self.target {
            Target::Remote(client) => Some(&client.host),
            Target::Local => None,
        }
    }

    // ------------------------------------------------------------------
    // Scoped acquisitions
    // ------------------------------------------------------------------

    /// Push a working-directory modifier; popped when the guard drops.
    pub fn cd(&self, path: &str) -> ScopeGuard<'_> {
        self.context
            .borrow_mut()
            .push(ContextModifier::WorkingDirectory(path.to_string()));
        ScopeGuard { session: self }
    }

    /// Push an environment-activation modifier; popped when the guard drops.
    pub fn prefix(&self, activation_command: &str) -> ScopeGuard<'_> {
        self.context
            .borrow_mut()
            .push(ContextModifier::EnvironmentActivation(
                activation_command.to_string(),
            ));
        ScopeGuard { session: self }
    }

    /// Activate the project's virtualenv for the duration of the guard.
    pub fn virtualenv(&self, project: &Project) -> Result<ScopeGuard<'_>> {
        Ok(self.prefix(&project.activation_command()?))
    }

    /// While the guard lives, command failures are reported in the returned
    /// `CommandResult` instead of aborting the sequence. Transport failures
    /// remain fatal.
    pub fn tolerate_failures(&self) -> ToleranceGuard<'_> {
        self.tolerance_depth.set(self.tolerance_depth.get() + 1);
        ToleranceGuard { session: self }
    }

    fn is_tolerant(&self) -> bool {
        self.tolerance_depth.get() > 0
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Compose a command with the active context stack, outermost first.
    ///
    /// Each layer wraps the remainder as a compound command, so directory
    /// and activation effects stay local to the scope that requested them.
    pub fn compose(&self, command: &str) -> String {
        let context = self.context.borrow();
        let mut composed = command.to_string();

        for modifier in context.iter().rev() {
            composed = match modifier {
                ContextModifier::WorkingDirectory(path) => {
                    format!("cd {} && ({})", shell::quote_arg(path), composed)
                }
                ContextModifier::EnvironmentActivation(activation) => {
                    format!("{} && ({})", activation, composed)
                }
            };
        }

        composed
    }

    /// Run a command on the session's target.
    pub fn run(&self, command: &str) -> Result<CommandResult> {
        let composed = self.compose(command);
        let output = self.transport(&composed)?;
        self.resolve(command, output)
    }

    /// Run a command with elevated privileges, optionally as another user.
    /// The composed command is wrapped whole so context modifiers apply
    /// inside the elevated shell.
    pub fn sudo(&self, command: &str, as_user: Option<&str>) -> Result<CommandResult> {
        let composed = self.compose(command);
        let elevated = match as_user {
            Some(user) => format!(
                "sudo -u {} sh -c {}",
                shell::quote_arg(user),
                shell::escape_command_for_shell(&composed)
            ),
            None => format!("sudo sh -c {}", shell::escape_command_for_shell(&composed)),
        };
        let output = self.transport(&elevated)?;
        self.resolve(command, output)
    }

    fn transport(&self, composed: &str) -> Result<ssh::CommandOutput> {
        match &self.target {
            Target::Remote(client) => client.execute(composed),
            Target::Local => Ok(ssh::execute_local_command(composed)),
        }
    }

    /// Apply the failure-tolerance rule to a completed command.
    fn resolve(&self, command: &str, output: ssh::CommandOutput) -> Result<CommandResult> {
        let result = CommandResult::from(output);

        if result.success {
            return Ok(result);
        }

        if self.is_tolerant() {
            log_status!(
                "session",
                "Command failed (exit {}), continuing: {}",
                result.exit_code,
                command
            );
            return Ok(result);
        }

        Err(Error::remote_command_failed(RemoteCommandFailedDetails {
            command: command.to_string(),
            exit_code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
            target: TargetDetails {
                project_id: self.project_id.clone(),
                server_id: self.server_id.clone(),
                host: self.host().map(str::to_string),
            },
        }))
    }

    // ------------------------------------------------------------------
    // File transfer
    // ------------------------------------------------------------------

    /// Copy a local file to the target, preserving mode. Falls back to `cp -p`
    /// for local sessions.
    pub fn put(&self, local_path: &str, remote_path: &str) -> Result<()> {
        match &self.target {
            Target::Remote(client) => client.upload(local_path, remote_path),
            Target::Local => {
                let output = ssh::execute_local_command(&format!(
                    "cp -p {} {}",
                    shell::quote_path(local_path),
                    shell::quote_path(remote_path)
                ));
                if !output.success {
                    return Err(Error::transfer_upload_failed(
                        local_path,
                        remote_path,
                        output.stderr.trim().to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Fetch a file from the target to a local path, preserving mode.
    pub fn get(&self, remote_path: &str, local_path: &str) -> Result<()> {
        match &self.target {
            Target::Remote(client) => client.download(remote_path, local_path),
            Target::Local => {
                let output = ssh::execute_local_command(&format!(
                    "cp -p {} {}",
                    shell::quote_path(remote_path),
                    shell::quote_path(local_path)
                ));
                if !output.success {
                    return Err(Error::transfer_download_failed(
                        remote_path,
                        local_path,
                        output.stderr.trim().to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Local (no-transport) execution on a session, regardless of its target.
pub trait LocalExec {
    /// Run a command on the invoking machine regardless of the session
    /// target. Context and tolerance rules apply as for `run`.
    fn local(&self, command: &str) -> Result<CommandResult>;
}

impl LocalExec for Session {
    fn local(&self, command: &str) -> Result<CommandResult> {
        let composed = self.compose(command);
        let output = ssh::execute_local_command(&composed);
        self.resolve(command, output)
    }
}

/// Pops one context modifier when dropped.
pub struct ScopeGuard<'a> {
    session: &'a Session,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.session.context.borrow_mut().pop();
    }
}

/// Restores the previous tolerance depth when dropped.
pub struct ToleranceGuard<'a> {
    session: &'a Session,
}

impl Drop for ToleranceGuard<'_> {
    fn drop(&mut self) {
        let depth = self.session.tolerance_depth.get();
        self.session.tolerance_depth.set(depth.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_bare_command() {
        let session = Session::local();
        assert_eq!(session.compose("ls"), "ls");
    }

    #[test]
    fn compose_single_working_directory() {
        let session = Session::local();
        let _guard = session.cd("/srv/app");
        assert_eq!(session.compose("ls"), "cd /srv/app && (ls)");
    }

    #[test]
    fn compose_nested_working_directories() {
        let session = Session::local();
        let _outer = session.cd("p1");
        let _inner = session.cd("p2");
        assert_eq!(session.compose("ls"), "cd p1 && (cd p2 && (ls))");
    }

    #[test]
    fn scopes_release_on_drop() {
        let session = Session::local();
        {
            let _outer = session.cd("p1");
            {
                let _inner = session.cd("p2");
                assert_eq!(session.compose("ls"), "cd p1 && (cd p2 && (ls))");
            }
            assert_eq!(session.compose("ls"), "cd p1 && (ls)");
        }
        assert_eq!(session.compose("ls"), "ls");
    }

    #[test]
    fn compose_mixed_activation_and_directory() {
        let session = Session::local();
        let _env = session.prefix("source /envs/site/bin/activate");
        let _dir = session.cd("/srv/app/code");
        assert_eq!(
            session.compose("./manage.py migrate"),
            "source /envs/site/bin/activate && (cd /srv/app/code && (./manage.py migrate))"
        );
    }

    #[test]
    fn compose_quotes_paths_with_metacharacters() {
        let session = Session::local();
        let _guard = session.cd("/srv/my app");
        assert_eq!(session.compose("ls"), "cd '/srv/my app' && (ls)");
    }

    #[test]
    fn failing_command_errors_outside_tolerance() {
        let session = Session::local();
        let err = session.run("exit 3").unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::RemoteCommandFailed);
    }

    #[test]
    fn failing_command_returns_result_inside_tolerance() {
        let session = Session::local();
        let _tolerant = session.tolerate_failures();
        let result = session.run("exit 3").unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
    }

    #[test]
    fn tolerance_restored_after_guard_drops() {
        let session = Session::local();
        {
            let _tolerant = session.tolerate_failures();
            assert!(session.run("false").is_ok());
        }
        assert!(session.run("false").is_err());
    }

    #[test]
    fn nested_tolerance_scopes() {
        let session = Session::local();
        let _outer = session.tolerate_failures();
        {
            let _inner = session.tolerate_failures();
            assert!(session.run("false").is_ok());
        }
        // outer scope still active
        assert!(session.run("false").is_ok());
    }

    #[test]
    fn run_captures_output() {
        let session = Session::local();
        let result = session.run("echo composed").unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "composed");
    }

    #[test]
    fn run_applies_working_directory() {
        let session = Session::local();
        let _guard = session.cd("/");
        let result = session.run("pwd").unwrap();
        assert_eq!(result.stdout.trim(), "/");
    }
}
