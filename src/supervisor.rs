//! Supervision of the single background watcher process.
//!
//! State lives behind one mutex so check-then-spawn and check-then-signal are
//! each a single critical section. The spawned [`Child`] is owned by a monitor
//! task that drains its output, reaps it, and is the only place that moves the
//! state back to `NotRunning`.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::models::{WatcherState, WatcherStatus};

/// How long a stopping watcher gets before it is killed.
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// The command the supervisor runs as the watcher.
#[derive(Debug, Clone)]
pub struct WatchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl WatchCommand {
    /// This executable's `watch` subcommand, run in `root`.
    pub fn current_exe(root: impl Into<PathBuf>) -> Result<Self> {
        let program = std::env::current_exe().map_err(Error::SpawnFailed)?;
        Ok(Self {
            program,
            args: vec!["watch".to_string()],
            cwd: root.into(),
        })
    }
}

#[derive(Debug)]
enum Slot {
    Idle,
    Active {
        generation: u64,
        pid: u32,
        started_at: DateTime<Utc>,
        stopping: bool,
        arm_kill: Option<oneshot::Sender<()>>,
    },
}

#[derive(Debug)]
struct Inner {
    slot: Slot,
    next_generation: u64,
}

#[derive(Debug, Clone)]
pub struct WatcherSupervisor {
    command: WatchCommand,
    grace: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl WatcherSupervisor {
    pub fn new(command: WatchCommand) -> Self {
        Self::with_grace_period(command, GRACE_PERIOD)
    }

    pub fn with_grace_period(command: WatchCommand, grace: Duration) -> Self {
        Self {
            command,
            grace,
            inner: Arc::new(Mutex::new(Inner {
                slot: Slot::Idle,
                next_generation: 0,
            })),
        }
    }

    pub fn status(&self) -> WatcherStatus {
        let inner = self.inner.lock().expect("supervisor lock poisoned");
        match &inner.slot {
            Slot::Idle => WatcherStatus::not_running(),
            Slot::Active {
                pid,
                started_at,
                stopping,
                ..
            } => WatcherStatus {
                state: if *stopping {
                    WatcherState::Stopping
                } else {
                    WatcherState::Running
                },
                pid: Some(*pid),
                started_at: Some(*started_at),
            },
        }
    }

    /// Spawn the watcher. Fails with `AlreadyRunning` while one is tracked,
    /// including one that is still stopping.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Result<u32> {
        let mut inner = self.inner.lock().expect("supervisor lock poisoned");
        if let Slot::Active { pid, .. } = &inner.slot {
            return Err(Error::AlreadyRunning { pid: *pid });
        }

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .current_dir(&self.command.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(Error::SpawnFailed)?;

        let Some(pid) = child.id() else {
            return Err(Error::SpawnFailed(std::io::Error::other(
                "watcher exited before its pid was known",
            )));
        };

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(drain(stdout, pid, false));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain(stderr, pid, true));
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;
        let (arm_tx, arm_rx) = oneshot::channel();
        inner.slot = Slot::Active {
            generation,
            pid,
            started_at: Utc::now(),
            stopping: false,
            arm_kill: Some(arm_tx),
        };
        drop(inner);

        tokio::spawn(monitor(
            self.inner.clone(),
            child,
            generation,
            arm_rx,
            self.grace,
        ));

        tracing::info!(pid, "Watcher started");
        Ok(pid)
    }

    /// Ask the watcher to stop and return without waiting for it to exit.
    ///
    /// Sends a graceful termination signal now; the monitor kills the process
    /// if it is still alive once the grace period has elapsed.
    pub fn stop(&self) -> Result<u32> {
        let mut inner = self.inner.lock().expect("supervisor lock poisoned");
        let Slot::Active {
            pid,
            stopping,
            arm_kill,
            ..
        } = &mut inner.slot
        else {
            return Err(Error::NotRunning);
        };

        let pid = *pid;
        if !*stopping {
            *stopping = true;
            if let Err(e) = terminate_gracefully(pid) {
                tracing::warn!(pid, "Failed to signal watcher: {}", e);
            }
            if let Some(arm) = arm_kill.take() {
                let _ = arm.send(());
            }
            tracing::info!(pid, "Watcher stopping");
        }
        Ok(pid)
    }
}

enum Wake {
    Exited(std::io::Result<ExitStatus>),
    StopRequested,
    Detached,
}

/// Owns the child until it is reaped. Clears the slot if it still belongs to
/// this child.
async fn monitor(
    inner: Arc<Mutex<Inner>>,
    mut child: Child,
    generation: u64,
    mut arm_kill: oneshot::Receiver<()>,
    grace: Duration,
) {
    let wake = tokio::select! {
        status = child.wait() => Wake::Exited(status),
        armed = &mut arm_kill => match armed {
            Ok(()) => Wake::StopRequested,
            Err(_) => Wake::Detached,
        },
    };

    let status = match wake {
        Wake::Exited(status) => status,
        Wake::Detached => child.wait().await,
        Wake::StopRequested => match tokio::time::timeout(grace, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                tracing::warn!(
                    pid = child.id(),
                    "Watcher did not exit within {:?}, killing it",
                    grace
                );
                match child.kill().await {
                    Ok(()) => child.wait().await,
                    Err(e) => Err(e),
                }
            }
        },
    };

    match status {
        Ok(status) => tracing::info!("Watcher exited: {}", status),
        Err(e) => tracing::error!("Failed to reap watcher: {}", e),
    }

    let mut inner = inner.lock().expect("supervisor lock poisoned");
    if matches!(inner.slot, Slot::Active { generation: g, .. } if g == generation) {
        inner.slot = Slot::Idle;
    }
}

async fn drain<R>(stream: R, pid: u32, is_stderr: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if is_stderr => tracing::warn!(pid, "watcher: {}", line),
            Ok(Some(line)) => tracing::info!(pid, "watcher: {}", line),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(pid, "Stopped reading watcher output: {}", e);
                break;
            }
        }
    }
}

#[cfg(unix)]
fn terminate_gracefully(pid: u32) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = i32::try_from(pid).map_err(std::io::Error::other)?;
    kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(std::io::Error::from)
}

/// No graceful signal off Unix; the monitor kills after the grace period.
#[cfg(not(unix))]
fn terminate_gracefully(_pid: u32) -> std::io::Result<()> {
    Ok(())
}
