use crate::domain::TestgenError;
use std::io::{BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const OUTPUT_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct CommandRunResult {
    pub status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl CommandRunResult {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.status.is_some_and(|status| status.success())
    }

    /// Short human description of why the run did not succeed.
    pub fn failure_summary(&self, timeout: Duration) -> String {
        if self.timed_out {
            return format!("timed out after {} s", timeout.as_secs());
        }
        let status = match self.status {
            Some(status) => status.code().map_or_else(
                || "terminated by signal".to_string(),
                |code| format!("exit code {}", code),
            ),
            None => "exit status unavailable".to_string(),
        };
        match last_line(&self.stderr) {
            Some(line) => format!("{}: {}", status, line),
            None => status,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("failed to capture {stream} of '{program}'")]
    Capture {
        program: String,
        stream: &'static str,
    },
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}

impl From<ProcessError> for TestgenError {
    fn from(error: ProcessError) -> Self {
        let placeholder = match &error {
            ProcessError::Spawn { .. } => "TOOL.SPAWN",
            ProcessError::Capture { .. } => "TOOL.CAPTURE",
            ProcessError::Wait { .. } => "TOOL.WAIT",
        };
        TestgenError::external_tool(placeholder, error.to_string())
    }
}

/// Runs `command` to completion, killing it once `timeout` elapses.
///
/// Output pipes are drained on helper threads so a chatty child cannot block
/// on a full pipe while we poll for its exit. On unix the child leads its own
/// process group, and a timeout kills the whole group so wrapper commands
/// such as `cargo run` do not leave the real tool running.
pub fn run_command_with_timeout(
    command: &mut Command,
    timeout: Duration,
) -> Result<CommandRunResult, ProcessError> {
    let program = command.get_program().to_string_lossy().into_owned();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;

    let stdout = child.stdout.take().ok_or_else(|| ProcessError::Capture {
        program: program.clone(),
        stream: "stdout",
    })?;
    let stderr = child.stderr.take().ok_or_else(|| ProcessError::Capture {
        program: program.clone(),
        stream: "stderr",
    })?;

    let (sender, receiver) = mpsc::channel();
    spawn_drain(stdout, OutputStream::Stdout, sender.clone());
    spawn_drain(stderr, OutputStream::Stderr, sender);

    let start = Instant::now();
    let mut timed_out = false;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    timed_out = true;
                    terminate(&mut child);
                    break child.wait().ok();
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                terminate(&mut child);
                return Err(ProcessError::Wait { program, source });
            }
        }
    };
    let elapsed = start.elapsed();

    let (stdout_bytes, stderr_bytes) = collect_output(&receiver, OUTPUT_GRACE);

    Ok(CommandRunResult {
        status,
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        timed_out,
        elapsed,
    })
}

#[derive(Debug, Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

fn spawn_drain(
    stream: impl Read + Send + 'static,
    kind: OutputStream,
    sender: Sender<(OutputStream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let mut reader = BufReader::new(stream);
        let _ = reader.read_to_end(&mut buf);
        let _ = sender.send((kind, buf));
    });
}

/// Waits at most `grace` for both drain threads. A descendant that outlives
/// the child and still holds a pipe only costs us its output.
fn collect_output(
    receiver: &Receiver<(OutputStream, Vec<u8>)>,
    grace: Duration,
) -> (Vec<u8>, Vec<u8>) {
    let deadline = Instant::now() + grace;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    for _ in 0..2 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(remaining) {
            Ok((OutputStream::Stdout, bytes)) => stdout = bytes,
            Ok((OutputStream::Stderr, bytes)) => stderr = bytes,
            Err(_) => break,
        }
    }
    (stdout, stderr)
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    // The child leads its group, so its pid is the group id.
    let _ = Command::new("kill")
        .arg("-KILL")
        .arg("--")
        .arg(format!("-{}", child.id()))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    let _ = child.kill();
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|line| !line.is_empty())
}
