//! Runs scripts through `osascript` and launches applications with `open`.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors from the script host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to spawn {program}: {source}")]
    SpawnFailed {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write script: {0}")]
    WriteError(std::io::Error),
    #[error("failed to wait for child process: {0}")]
    WaitError(std::io::Error),
    #[error("child process did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("script failed ({code:?}): {message}")]
    ScriptError { code: Option<i32>, message: String },
}

/// Locations of the helper tools.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub osascript: PathBuf,
    pub open: PathBuf,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            osascript: PathBuf::from("/usr/bin/osascript"),
            open: PathBuf::from("/usr/bin/open"),
        }
    }
}

/// One child process per script; the child is killed at the deadline.
#[derive(Debug, Clone, Default)]
pub struct ScriptHost {
    config: HostConfig,
}

struct Finished {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl ScriptHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Compiles and runs `source`, returning the result in source form.
    pub fn run(&self, source: &str, timeout: Duration) -> Result<String, HostError> {
        let mut child = Command::new(&self.config.osascript)
            .args(["-s", "s"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HostError::SpawnFailed {
                program: self.config.osascript.clone(),
                source,
            })?;

        let writer = child
            .stdin
            .take()
            .map(|stdin| feed(stdin, source.as_bytes().to_vec()));
        let finished = wait_with_deadline(child, timeout);
        let written = writer.map_or(Ok(()), |handle| {
            handle
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("script writer panicked")))
        });

        let finished = finished?;
        if !finished.status.success() {
            return Err(script_error(&finished.stderr));
        }
        written.map_err(HostError::WriteError)?;
        Ok(finished.stdout)
    }

    /// Launches the application with `bundle_id` in the background.
    pub fn launch(&self, bundle_id: &str, timeout: Duration) -> Result<(), HostError> {
        let child = Command::new(&self.config.open)
            .args(["-g", "-j", "-b", bundle_id])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HostError::SpawnFailed {
                program: self.config.open.clone(),
                source,
            })?;
        let finished = wait_with_deadline(child, timeout)?;
        if finished.status.success() {
            Ok(())
        } else {
            Err(HostError::ScriptError {
                code: None,
                message: finished.stderr.trim().to_owned(),
            })
        }
    }
}

fn wait_with_deadline(mut child: Child, timeout: Duration) -> Result<Finished, HostError> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait().map_err(HostError::WaitError)? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                tracing::warn!(pid = child.id(), ?timeout, "killing child process at deadline");
                let _ = child.kill();
                let _ = child.wait();
                return Err(HostError::TimedOut(timeout));
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };
    Ok(Finished {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

/// Writes on its own thread so a child that never reads stdin still hits the
/// deadline. Killing the child unblocks the write.
fn feed(mut stdin: impl Write + Send + 'static, script: Vec<u8>) -> JoinHandle<std::io::Result<()>> {
    thread::spawn(move || stdin.write_all(&script))
}

fn drain(mut pipe: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        buffer
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// `0:8: execution error: Jukebox got an error: Can’t get window 9. (-1728)`
fn script_error(stderr: &str) -> HostError {
    let line = stderr.trim();
    let body = line
        .split_once("execution error: ")
        .map_or(line, |(_, body)| body);
    let parsed = body.strip_suffix(')').and_then(|rest| {
        let (message, code) = rest.rsplit_once(" (")?;
        Some((message, code.parse::<i32>().ok()?))
    });
    match parsed {
        Some((message, code)) => HostError::ScriptError {
            code: Some(code),
            message: message.trim().to_owned(),
        },
        None => HostError::ScriptError {
            code: None,
            message: body.to_owned(),
        },
    }
}

/// Executable shell script standing in for `osascript`.
#[cfg(all(test, unix))]
pub(crate) fn fake_tool(body: &str) -> tempfile::TempPath {
    use std::os::unix::fs::PermissionsExt;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "#!/bin/sh\n{body}").unwrap();
    file.flush().unwrap();
    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
    file.into_temp_path()
}
