//! Blocking subprocess execution helpers.
//!
//! Every external call captures status, stdout, and stderr whole so failures
//! can be attached verbatim to tracker comments.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use downport_core::capabilities::{CapabilityError, CommandOutput};

fn describe(program: &str, args: &[&str]) -> String {
    let mut s = String::from(program);
    for arg in args {
        s.push(' ');
        s.push_str(arg);
    }
    s
}

/// Run `program args…` in `workdir`, capturing output. A nonzero exit is not
/// an error here; callers that require success use [`run_checked`].
pub(crate) fn run(
    program: &str,
    args: &[&str],
    workdir: &Path,
) -> Result<CommandOutput, CapabilityError> {
    let output = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .output()
        .map_err(|source| CapabilityError::Spawn {
            program: describe(program, args),
            source,
        })?;
    Ok(CommandOutput {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run and require exit 0, returning stdout.
pub(crate) fn run_checked(
    program: &str,
    args: &[&str],
    workdir: &Path,
) -> Result<String, CapabilityError> {
    let output = run(program, args, workdir)?;
    if !output.success() {
        return Err(CapabilityError::Command {
            program: describe(program, args),
            status: output.status,
            stderr: output.stderr,
        });
    }
    Ok(output.stdout)
}

/// Run with `input` piped to stdin, capturing output. Used for patch
/// application, where the patch text travels on stdin.
pub(crate) fn run_with_stdin(
    program: &str,
    args: &[&str],
    workdir: &Path,
    input: &str,
) -> Result<CommandOutput, CapabilityError> {
    let label = describe(program, args);
    let mut child = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CapabilityError::Spawn {
            program: label.clone(),
            source,
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(|source| CapabilityError::Spawn {
                program: label.clone(),
                source,
            })?;
        // Drop closes the pipe so the child sees EOF.
    }

    let output = child
        .wait_with_output()
        .map_err(|source| CapabilityError::Spawn {
            program: label,
            source,
        })?;
    Ok(CommandOutput {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = run("downport-no-such-binary", &[], dir.path()).expect_err("must fail");
        assert!(matches!(err, CapabilityError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_status() {
        let dir = TempDir::new().expect("tempdir");
        let output = run("sh", &["-c", "echo hello; exit 3"], dir.path()).expect("run");
        assert_eq!(output.status, 3);
        assert_eq!(output.stdout, "hello\n");
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn run_with_stdin_feeds_input() {
        let dir = TempDir::new().expect("tempdir");
        let output = run_with_stdin("sh", &["-c", "cat"], dir.path(), "piped\n").expect("run");
        assert_eq!(output.stdout, "piped\n");
        assert!(output.success());
    }
}
