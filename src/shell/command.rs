//! Shell command execution.

use crate::error::{HostprepError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// How often the output loop wakes up to check the timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How often to check for the shell's exit once its pipes have closed.
const REAP_INTERVAL: Duration = Duration::from_millis(5);

/// How long to keep draining output after the shell exited.
const EXIT_GRACE: Duration = Duration::from_millis(250);

/// How long to wait for a timed-out command to die after it was killed.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or timed out).
    pub exit_code: Option<i32>,

    /// Signal that terminated the command, if any.
    pub signal: Option<i32>,

    /// Whether the command was killed for exceeding its timeout.
    pub timed_out: bool,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    fn from_status(status: ExitStatus, timed_out: bool, duration: Duration) -> Self {
        Self {
            exit_code: status.code(),
            signal: exit_signal(&status),
            timed_out,
            duration,
            success: status.success() && !timed_out,
        }
    }

    /// Failure code in shell conventions.
    ///
    /// `124` for a timeout, `128 + n` for death by signal `n`, the exit code
    /// otherwise. Always `0` on success.
    pub fn failure_code(&self) -> i32 {
        if self.success {
            0
        } else if self.timed_out {
            124
        } else if let Some(code) = self.exit_code {
            code
        } else if let Some(signal) = self.signal {
            128 + signal
        } else {
            1
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Shell used to interpret the command (None = platform default).
    pub shell: Option<PathBuf>,

    /// Kill the command after this long (None = no timeout).
    pub timeout: Option<Duration>,
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Execute a command, handing each output line to `on_line` as it arrives.
///
/// stdout and stderr are read on separate threads and funneled through a
/// channel, so `on_line` runs on the calling thread in arrival order. If
/// `on_line` fails, the command is killed and the error returned.
///
/// The command is finished when the shell itself exits. Background children
/// (`dockerd &`) inherit the pipes and may hold them open indefinitely, so
/// output is drained for a short grace period after the shell exits and then
/// left behind. The timeout only applies while the shell is still running.
pub fn execute_streaming<F>(
    command: &str,
    options: &CommandOptions,
    mut on_line: F,
) -> Result<CommandResult>
where
    F: FnMut(OutputLine) -> Result<()>,
{
    let start = Instant::now();

    let mut child = spawn(command, options)?;
    let wait_failed = || HostprepError::CommandFailed {
        command: command.to_string(),
        code: None,
    };

    let (tx, rx) = mpsc::channel();
    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, tx.clone(), OutputLine::Stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, tx.clone(), OutputLine::Stderr);
    }
    drop(tx);

    let deadline = options.timeout.map(|t| start + t);
    let mut streams_open = true;
    let mut exited: Option<(ExitStatus, Instant)> = None;
    let mut killed_at: Option<Instant> = None;

    loop {
        if streams_open {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    if let Err(e) = on_line(line) {
                        kill_tree(&mut child);
                        let _ = child.wait();
                        return Err(e);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => streams_open = false,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }

        let now = Instant::now();
        if exited.is_none() {
            if let Some(status) = child.try_wait().map_err(|_| wait_failed())? {
                exited = Some((status, now));
            }
        }

        match (exited, killed_at) {
            (Some(_), _) if !streams_open => break,
            (Some((_, at)), _) if now.duration_since(at) >= EXIT_GRACE => {
                tracing::debug!("Background processes still hold output of: {}", command);
                break;
            }
            (Some(_), _) => {}
            (None, None) => {
                if deadline.is_some_and(|d| now >= d) {
                    tracing::warn!("Command timed out, killing: {}", command);
                    kill_tree(&mut child);
                    killed_at = Some(now);
                }
            }
            (None, Some(at)) if now.duration_since(at) >= KILL_GRACE => {
                tracing::warn!("Killed command did not exit: {}", command);
                break;
            }
            (None, Some(_)) => {}
        }

        if !streams_open {
            thread::sleep(REAP_INTERVAL);
        }
    }

    let status = match exited {
        Some((status, _)) => status,
        None => child.wait().map_err(|_| wait_failed())?,
    };

    Ok(CommandResult::from_status(
        status,
        killed_at.is_some(),
        start.elapsed(),
    ))
}

/// Execute a command silently and return whether it succeeded.
pub fn execute_check(command: &str, options: &CommandOptions) -> bool {
    execute_streaming(command, options, |_| Ok(()))
        .map(|r| r.success)
        .unwrap_or(false)
}

fn spawn(command: &str, options: &CommandOptions) -> Result<Child> {
    let shell = options
        .shell
        .clone()
        .unwrap_or_else(|| PathBuf::from(super::default_shell()));

    let mut cmd = Command::new(&shell);
    cmd.arg(shell_flag());
    cmd.arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    // Steps never read from the operator's terminal.
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group so a timeout can kill the whole tree.
        cmd.process_group(0);
    }

    cmd.spawn().map_err(|e| {
        tracing::debug!("Failed to spawn {}: {}", shell.display(), e);
        HostprepError::CommandFailed {
            command: command.to_string(),
            code: None,
        }
    })
}

fn forward_lines<R>(reader: R, tx: Sender<OutputLine>, wrap: fn(String) -> OutputLine)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    // Keep draining after the caller stopped listening so a
                    // background child never blocks on a full pipe.
                    let _ = tx.send(wrap(line));
                }
            }
        }
    });
}

fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        // SAFETY: kill(2) with a negative pid signals the process group we
        // created in `spawn`; it has no memory-safety preconditions.
        let rc = unsafe { libc::kill(-(child.id() as libc::pid_t), libc::SIGKILL) };
        if rc == 0 {
            return;
        }
    }
    let _ = child.kill();
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Get the flag to pass commands to the shell.
///
/// Provisioning steps run non-interactively, so no login or interactive
/// flags: profile scripts on a fresh host are not trusted to be quiet.
fn shell_flag() -> &'static str {
    if cfg!(target_os = "windows") {
        "/C"
    } else {
        "-c"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn collect(command: &str, options: &CommandOptions) -> (CommandResult, Vec<OutputLine>) {
        let mut lines = Vec::new();
        let result = execute_streaming(command, options, |line| {
            lines.push(line);
            Ok(())
        })
        .unwrap();
        (result, lines)
    }

    #[test]
    fn execute_successful_command() {
        let (result, lines) = collect("echo hello", &CommandOptions::default());

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.failure_code(), 0);
        assert_eq!(lines, vec![OutputLine::Stdout("hello".to_string())]);
    }

    #[test]
    fn execute_failing_command() {
        let (result, _) = collect("exit 3", &CommandOptions::default());

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.failure_code(), 3);
    }

    #[test]
    fn captures_stderr_separately() {
        let (_, lines) = collect("echo out; echo err >&2", &CommandOptions::default());

        assert!(lines.contains(&OutputLine::Stdout("out".to_string())));
        assert!(lines.contains(&OutputLine::Stderr("err".to_string())));
    }

    #[test]
    fn execute_with_env_and_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        options
            .env
            .insert("MY_VAR".to_string(), "my_value".to_string());

        let (result, lines) = collect("echo $MY_VAR; pwd", &options);

        assert!(result.success);
        assert_eq!(lines[0], OutputLine::Stdout("my_value".to_string()));
    }

    #[test]
    fn timeout_kills_command() {
        let options = CommandOptions {
            timeout: Some(Duration::from_millis(300)),
            ..Default::default()
        };

        let (result, _) = collect("sleep 30", &options);

        assert!(!result.success);
        assert!(result.timed_out);
        assert_eq!(result.failure_code(), 124);
        assert!(result.duration < Duration::from_secs(10));
    }

    #[test]
    fn background_child_does_not_hold_command_open() {
        let (result, lines) = collect(
            "sleep 5 & echo started; exit 0",
            &CommandOptions::default(),
        );

        assert!(result.success);
        assert_eq!(lines, vec![OutputLine::Stdout("started".to_string())]);
        assert!(result.duration < Duration::from_secs(3));
    }

    #[test]
    fn background_child_does_not_trip_timeout() {
        let options = CommandOptions {
            timeout: Some(Duration::from_secs(2)),
            ..Default::default()
        };

        let (result, _) = collect("sleep 5 & exit 0", &options);

        assert!(result.success);
        assert!(!result.timed_out);
        assert_eq!(result.failure_code(), 0);
        assert!(result.duration < Duration::from_secs(2));
    }

    #[test]
    fn background_child_keeps_shell_exit_code() {
        let (result, _) = collect("sleep 5 & exit 4", &CommandOptions::default());

        assert_eq!(result.exit_code, Some(4));
        assert!(result.duration < Duration::from_secs(3));
    }

    #[test]
    fn timeout_applies_while_shell_runs_after_closing_pipes() {
        let options = CommandOptions {
            timeout: Some(Duration::from_millis(300)),
            ..Default::default()
        };

        let (result, _) = collect("exec >/dev/null 2>&1; sleep 30", &options);

        assert!(result.timed_out);
        assert_eq!(result.failure_code(), 124);
    }

    #[test]
    fn signal_death_maps_to_128_plus_signal() {
        let (result, _) = collect("kill -9 $$", &CommandOptions::default());

        assert!(!result.success);
        assert_eq!(result.signal, Some(9));
        assert_eq!(result.failure_code(), 137);
    }

    #[test]
    fn callback_error_aborts_command() {
        let result = execute_streaming("echo a; sleep 30", &CommandOptions::default(), |_| {
            Err(HostprepError::ConfigValidationError {
                message: "stop".into(),
            })
        });

        assert!(result.is_err());
    }

    #[test]
    fn missing_shell_is_an_error() {
        let options = CommandOptions {
            shell: Some(PathBuf::from("/nonexistent/shell")),
            ..Default::default()
        };

        let result = execute_streaming("true", &options, |_| Ok(()));
        assert!(matches!(result, Err(HostprepError::CommandFailed { .. })));
    }

    #[test]
    fn execute_check_returns_bool() {
        let options = CommandOptions::default();
        assert!(execute_check("exit 0", &options));
        assert!(!execute_check("exit 1", &options));
    }
}
