//! SSH transport.
//!
//! Shells out to the system `ssh`/`scp` binaries, one round-trip per command.
//! Transport failures (cannot reach the host) are distinguished from remote
//! command failures: ssh reserves exit status 255 for its own errors, and the
//! connection-class stderr patterns below catch the rest.

use crate::error::{Error, Result};
use crate::server::Server;
use crate::shell;
use std::process::{Command, Stdio};

pub struct SshClient {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub identity_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl SshClient {
    pub fn from_server(server: &Server, server_id: &str) -> Result<Self> {
        if !server.is_valid() {
            return Err(Error::ssh_server_invalid(
                server_id.to_string(),
                server.missing_fields(),
            ));
        }

        let identity_file = match &server.identity_file {
            Some(path) if !path.is_empty() => {
                let expanded = shellexpand::tilde(path).to_string();
                if !std::path::Path::new(&expanded).exists() {
                    return Err(Error::ssh_identity_file_not_found(
                        server_id.to_string(),
                        expanded,
                    ));
                }
                Some(expanded)
            }
            _ => None,
        };

        Ok(Self {
            host: server.host.clone(),
            user: server.user.clone(),
            port: server.port,
            identity_file,
        })
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(identity_file) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity_file.clone());
        }

        if self.port != 22 {
            args.push("-p".to_string());
            args.push(self.port.to_string());
        }

        // Timeout and keepalive options prevent hangs on stalled connections
        // or unexpected prompts.
        args.extend([
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
            "-o".to_string(),
            "ServerAliveInterval=15".to_string(),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
        ]);

        args.push(format!("{}@{}", self.user, self.host));
        args.push(command.to_string());

        args
    }

    /// Run a command on the remote host.
    ///
    /// Returns Err only for transport-level failures; a remote command that
    /// ran and exited non-zero comes back as Ok with that exit code.
    pub fn execute(&self, command: &str) -> Result<CommandOutput> {
        let args = self.build_ssh_args(command);

        let output = Command::new("ssh").args(&args).output().map_err(|e| {
            Error::ssh_connect_failed(Some(self.host.clone()), format!("failed to spawn ssh: {}", e))
        })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if is_connectivity_failure(&result) {
            return Err(Error::ssh_connect_failed(
                Some(self.host.clone()),
                result.stderr.trim().to_string(),
            ));
        }

        Ok(result)
    }

    fn scp_target(&self, remote_path: &str) -> String {
        format!(
            "{}@{}:{}",
            self.user,
            self.host,
            shell::quote_path(remote_path)
        )
    }

    fn scp_args(&self) -> Vec<String> {
        // -p preserves modification times and modes on both directions.
        let mut args = vec!["-p".to_string(), "-q".to_string()];

        if let Some(identity_file) = &self.identity_file {
            args.extend(["-i".to_string(), identity_file.clone()]);
        }

        if self.port != 22 {
            args.extend(["-P".to_string(), self.port.to_string()]);
        }

        args
    }

    /// Copy a local file to a remote path, preserving file mode.
    pub fn upload(&self, local_path: &str, remote_path: &str) -> Result<()> {
        let mut args = self.scp_args();
        args.push(local_path.to_string());
        args.push(self.scp_target(remote_path));

        let output = Command::new("scp").args(&args).output().map_err(|e| {
            Error::ssh_connect_failed(Some(self.host.clone()), format!("failed to spawn scp: {}", e))
        })?;

        if !output.status.success() {
            return Err(Error::transfer_upload_failed(
                local_path,
                remote_path,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }

    /// Fetch a remote file to a local path, preserving file mode.
    pub fn download(&self, remote_path: &str, local_path: &str) -> Result<()> {
        let mut args = self.scp_args();
        args.push(self.scp_target(remote_path));
        args.push(local_path.to_string());

        let output = Command::new("scp").args(&args).output().map_err(|e| {
            Error::ssh_connect_failed(Some(self.host.clone()), format!("failed to spawn scp: {}", e))
        })?;

        if !output.status.success() {
            return Err(Error::transfer_download_failed(
                remote_path,
                local_path,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}

/// Execute a command on the invoking machine via `sh -c`.
pub fn execute_local_command(command: &str) -> CommandOutput {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };

    match cmd.output() {
        Ok(out) => CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        },
        Err(e) => CommandOutput {
            stdout: String::new(),
            stderr: format!("Command error: {}", e),
            success: false,
            exit_code: -1,
        },
    }
}

/// Execute a local command with stdio inherited (e.g. `manage.py shell`).
/// Returns the exit code.
pub fn execute_local_command_interactive(command: &str) -> i32 {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };

    let status = cmd
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status();

    match status {
        Ok(s) => s.code().unwrap_or(-1),
        Err(_) => -1,
    }
}

/// Check whether an ssh invocation failed at the transport layer rather than
/// in the remote command. SSH exit code 255 means ssh itself errored; the
/// stderr patterns cover resolver and routing failures that surface earlier.
pub fn is_connectivity_failure(output: &CommandOutput) -> bool {
    if output.success {
        return false;
    }

    let stderr = output.stderr.to_lowercase();
    let connection_patterns = [
        "connection refused",
        "connection reset",
        "connection timed out",
        "no route to host",
        "network is unreachable",
        "temporary failure in name resolution",
        "could not resolve hostname",
        "ssh_exchange_identification",
        "connection closed by remote host",
        "permission denied (publickey",
    ];

    output.exit_code == 255 || connection_patterns.iter().any(|p| stderr.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(exit_code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            success: exit_code == 0,
            exit_code,
        }
    }

    #[test]
    fn exit_255_is_connectivity_failure() {
        assert!(is_connectivity_failure(&output(
            255,
            "ssh: connect to host example.org port 22: Connection refused"
        )));
    }

    #[test]
    fn resolver_failure_is_connectivity_failure() {
        assert!(is_connectivity_failure(&output(
            1,
            "ssh: Could not resolve hostname nope.invalid"
        )));
    }

    #[test]
    fn remote_command_failure_is_not_connectivity() {
        assert!(!is_connectivity_failure(&output(
            2,
            "ls: cannot access '/nope': No such file or directory"
        )));
    }

    #[test]
    fn success_is_not_connectivity_failure() {
        assert!(!is_connectivity_failure(&output(0, "")));
    }

    #[test]
    fn nonstandard_port_adds_flag() {
        let client = SshClient {
            host: "example.org".to_string(),
            user: "deploy".to_string(),
            port: 2222,
            identity_file: None,
        };
        let args = client.build_ssh_args("ls");
        assert!(args.contains(&"-p".to_string()));
        assert!(args.contains(&"2222".to_string()));
        assert!(args.contains(&"deploy@example.org".to_string()));
    }
}
