use crate::error::{Result, UnipkgError};
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Run a command to completion, killing it once `timeout` elapses.
pub(super) fn run_command_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output> {
    let command = format!("{:?}", cmd);
    let failed = |reason: String| UnipkgError::SystemCommandFailed {
        command: command.clone(),
        reason,
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| failed(e.to_string()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| failed("Failed to capture stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| failed("Failed to capture stderr".to_string()))?;

    // Drain both pipes so a chatty installer never blocks on a full buffer.
    let stdout_thread = thread::spawn(move || drain(stdout));
    let stderr_thread = thread::spawn(move || drain(stderr));

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if start.elapsed() > timeout => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stdout_thread.join();
                let _ = stderr_thread.join();
                return Err(failed(format!(
                    "Command timed out after {} seconds",
                    timeout.as_secs()
                )));
            }
            Ok(None) => thread::sleep(Duration::from_millis(50)),
            Err(e) => return Err(failed(e.to_string())),
        }
    };

    Ok(Output {
        status,
        stdout: stdout_thread.join().unwrap_or_default(),
        stderr: stderr_thread.join().unwrap_or_default(),
    })
}

/// Start a command without waiting for it (used for launching apps).
pub(super) fn spawn_detached(cmd: &mut Command) -> Result<()> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
        .map_err(|e| UnipkgError::SystemCommandFailed {
            command: format!("{:?}", cmd),
            reason: e.to_string(),
        })
}

fn drain(mut reader: impl Read) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf);
    buf
}
