//! # Archivetar Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process.rs
//!
//! ## Overview
//!
//! Every heavy operation (walking, compressing, removing) is done by an external
//! program. This module runs those programs synchronously and turns failures into
//! `ArchivetarError` values:
//!
//! - A program that cannot be started because it does not exist becomes
//!   `ArchivetarError::Config`, since it means the tool settings are wrong.
//! - A program that exits non-zero becomes `ArchivetarError::ExternalCommand`
//!   with the command line, exit status and captured stderr.
//!
//! Stdout of the child is inherited so progress output from `mpirun` reaches the
//! operator's terminal.
//!
use crate::core::error::{ArchivetarError, Result};
use anyhow::Context;
use std::io::{ErrorKind, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Renders a command as a shell-like string for logs and errors.
pub fn describe(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(command.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Maps a spawn failure onto the error taxonomy.
pub fn spawn_error(command: &Command, err: std::io::Error) -> anyhow::Error {
    let cmd = describe(command);
    if err.kind() == ErrorKind::NotFound {
        ArchivetarError::Config(format!(
            "Program '{}' not found",
            command.get_program().to_string_lossy()
        ))
        .into()
    } else {
        anyhow::Error::new(err).context(format!("Failed to start '{}'", cmd))
    }
}

/// Fails with `ExternalCommand` unless `status` is a success.
pub fn check_status(cmd: &str, status: ExitStatus, stderr: &[u8]) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    let output = String::from_utf8_lossy(stderr).trim().to_string();
    error!("'{}' failed with {}", cmd, status);
    Err(ArchivetarError::ExternalCommand {
        cmd: cmd.to_string(),
        status: status.to_string(),
        output,
    }
    .into())
}

/// Runs `command` to completion. Stdout is inherited; stderr is captured and
/// echoed into the error on failure.
pub fn run_command(command: &mut Command) -> Result<()> {
    let cmd = describe(command);
    info!("Running: {}", cmd);
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| spawn_error(command, e))?;
    debug!("'{}' exited with {}", cmd, output.status);
    check_status(&cmd, output.status, &output.stderr)
}

/// Reads a child's piped stderr to the end on a separate thread.
///
/// Must be started before feeding the child's stdin: a child that fills the
/// stderr pipe while nobody reads it stops consuming its input.
pub fn drain_stderr(child: &mut Child) -> Option<JoinHandle<Vec<u8>>> {
    child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = stderr.read_to_end(&mut buf) {
                debug!("Stopped reading child stderr: {}", e);
            }
            buf
        })
    })
}

/// Waits for a child and checks its exit status, using the stderr collected by
/// [`drain_stderr`] in the error.
pub fn wait_checked(
    mut child: Child,
    stderr: Option<JoinHandle<Vec<u8>>>,
    cmd: &str,
) -> Result<()> {
    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for '{}'", cmd))?;
    let stderr = stderr
        .map(|handle| handle.join().unwrap_or_default())
        .unwrap_or_default();
    debug!("'{}' exited with {}", cmd, status);
    check_status(cmd, status, &stderr)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let mut command = Command::new("mpirun");
        command.args(["-np", "4", "drm", "--dryrun"]);
        assert_eq!(describe(&command), "mpirun -np 4 drm --dryrun");
    }

    #[test]
    fn test_missing_program_is_config_error() {
        let err = run_command(&mut Command::new("archivetar_missing_tool_98765")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArchivetarError>(),
            Some(ArchivetarError::Config(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_checked_reports_drained_stderr() {
        let mut command = Command::new("sh");
        command
            .args(["-c", "echo first >&2; echo second >&2; exit 4"])
            .stderr(Stdio::piped());
        let mut child = command.spawn().unwrap();
        let stderr = drain_stderr(&mut child);
        let err = wait_checked(child, stderr, &describe(&command)).unwrap_err();
        match err.downcast_ref::<ArchivetarError>() {
            Some(ArchivetarError::ExternalCommand { output, .. }) => {
                assert_eq!(output, "first\nsecond")
            }
            other => panic!("expected external command error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_success_and_failure() {
        run_command(Command::new("sh").args(["-c", "exit 0"])).unwrap();

        let err = run_command(Command::new("sh").args(["-c", "echo boom >&2; exit 3"])).unwrap_err();
        match err.downcast_ref::<ArchivetarError>() {
            Some(ArchivetarError::ExternalCommand { cmd, output, .. }) => {
                assert!(cmd.starts_with("sh -c"));
                assert_eq!(output, "boom");
            }
            other => panic!("expected external command error, got {:?}", other),
        }
    }
}
