/*
 * process.rs
 *
 * Spawn the command and own it until it's reaped.
 *
 * Foreground: the child inherits our stdio and stays in our process
 * group, so it can read the TTY and get TTY signals.
 * Otherwise: own process group (so a timeout kills the whole tree) and
 * piped stdout/stderr relayed by io.rs. stdin is inherited either way.
 *
 * Exit code 126 vs 127 comes from the errno exec reports back, see
 * SpawnFailure::classify.
 */

use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{Result, SpawnFailure, TimeoutError};
use crate::io::{DRAIN_IDLE, Relay};
use crate::kill::Target;

/// The supervised child. Exactly one per run.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    group: bool,
    relay: Option<Relay>,
}

impl ChildProcess {
    /// Get the process ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Where timeout signals go: the process group unless in foreground mode.
    #[must_use]
    pub fn target(&self) -> Target {
        Target {
            pid: self.child.id(),
            group: self.group,
        }
    }

    /// Block until the child exits and reap it, then drain relayed output.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.wait().map_err(TimeoutError::Wait)?;
        if let Some(relay) = self.relay.take() {
            relay.drain(DRAIN_IDLE);
        }
        debug!(pid = self.child.id(), ?status, "reaped command");
        Ok(status)
    }
}

/// Spawn a command, searching PATH when it has no slash.
///
/// # Arguments
/// * `command` - The command to run
/// * `args` - Arguments to pass (not including argv[0])
/// * `foreground` - Share our terminal and process group instead of relaying
pub fn spawn_command(command: &str, args: &[String], foreground: bool) -> Result<ChildProcess> {
    let mut cmd = Command::new(command);
    cmd.args(args);

    if !foreground {
        cmd.process_group(0)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
    }

    let mut child = cmd.spawn().map_err(|source| TimeoutError::Spawn {
        command: command.to_string(),
        kind: SpawnFailure::classify(&source),
        source,
    })?;

    let relay = (!foreground).then(|| Relay::attach(&mut child));
    debug!(pid = child.id(), command, foreground, "spawned command");

    Ok(ChildProcess {
        child,
        group: !foreground,
        relay,
    })
}

/* exit status to 8-bit code, POSIX style: killed by N = 128 + N */
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn status_to_exit_code(status: &ExitStatus) -> u8 {
    if let Some(sig) = status.signal() {
        return ((128 + sig) & 0xFF) as u8;
    }

    (status.code().unwrap_or(1) & 0xFF) as u8
}
