/*
 * wait.rs
 *
 * "Wake me when the child exits or the deadline passes, whichever is first."
 *
 * A watcher thread blocks in waitid(WEXITED | WNOWAIT) and posts on a
 * channel. WNOWAIT matters: the child becomes a zombie but is not reaped,
 * so its pid can't be recycled while we still might signal it. The real
 * reap happens later in ChildProcess::wait.
 *
 * The supervisor races that channel against a deadline with
 * recv_timeout. Whichever side loses simply stops existing: an expired
 * recv_timeout leaves nothing behind, and an exit before the deadline
 * means the timer never fires at all. No sleeping threads to cancel.
 *
 * Forwarded signals arrive on the same channel (see forward.rs) so one
 * blocking call sees all three sources.
 */

use std::collections::VecDeque;
use std::io;
use std::mem;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{trace, warn};

use crate::error::{Result, TimeoutError};
use crate::forward::Route;
use crate::signal::Signal;

/* what the watcher channel carries */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatchEvent {
    Exited,
    Forward(Signal),
}

/// Outcome of one race step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The child terminated (not yet reaped).
    Exited,
    /// The deadline passed with the child still running.
    Elapsed,
    /// We received a signal meant for the child.
    Forward(Signal),
}

/// Exit notification for one child.
#[derive(Debug)]
pub struct ExitWatch {
    rx: Receiver<WatchEvent>,
    exited: bool,
    pending: VecDeque<Signal>,
    watcher: Option<JoinHandle<()>>,
    _route: Route,
}

impl ExitWatch {
    /// Start watching `pid`. The caller must not reap it before `Exited` is seen.
    pub fn spawn(pid: u32) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let route = Route::register(tx.clone());

        let watcher = thread::Builder::new()
            .name("exit-watch".into())
            .spawn(move || {
                wait_exited(pid);
                trace!(pid, "exit observed");
                let _ = tx.send(WatchEvent::Exited);
            })
            .map_err(|e| TimeoutError::Internal(format!("failed to start exit watcher: {e}")))?;

        Ok(Self {
            rx,
            exited: false,
            pending: VecDeque::new(),
            watcher: Some(watcher),
            _route: route,
        })
    }

    /// Block until something happens. `None` waits without a deadline.
    pub fn next(&mut self, deadline: Option<Instant>) -> Event {
        if let Some(sig) = self.pending.pop_front() {
            return Event::Forward(sig);
        }
        if self.exited {
            return Event::Exited;
        }

        let received = match deadline {
            None => self.rx.recv().ok(),
            Some(at) => match self.rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) => return Event::Elapsed,
                Err(RecvTimeoutError::Disconnected) => None,
            },
        };

        match received {
            Some(WatchEvent::Forward(sig)) => Event::Forward(sig),
            /* a dead watcher can't tell us anything more, treat as exited */
            Some(WatchEvent::Exited) | None => {
                self.exited = true;
                Event::Exited
            }
        }
    }

    /// Non-blocking liveness check. Forwarded signals seen on the way are
    /// kept for the next call to [`ExitWatch::next`].
    pub fn has_exited(&mut self) -> bool {
        while !self.exited {
            match self.rx.try_recv() {
                Ok(WatchEvent::Exited) | Err(TryRecvError::Disconnected) => self.exited = true,
                Ok(WatchEvent::Forward(sig)) => self.pending.push_back(sig),
                Err(TryRecvError::Empty) => break,
            }
        }
        self.exited
    }
}

impl Drop for ExitWatch {
    fn drop(&mut self) {
        /* the watcher is done once it reported; otherwise leave it detached */
        if !self.exited {
            return;
        }
        if let Some(watcher) = self.watcher.take() {
            let _ = watcher.join();
        }
    }
}

/* block until pid is a zombie, without reaping it */
fn wait_exited(pid: u32) {
    let Ok(id) = libc::id_t::try_from(pid) else {
        return;
    };

    loop {
        // SAFETY: siginfo_t is plain old data, all-zero is a valid value
        let mut info: libc::siginfo_t = unsafe { mem::zeroed() };
        // SAFETY: info is a valid writable siginfo_t for the duration of the call
        let ret = unsafe {
            libc::waitid(
                libc::P_PID,
                id,
                &raw mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if ret == 0 {
            return;
        }

        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            continue;
        }
        /* ECHILD: someone else reaped it, it's gone either way */
        warn!(pid, error = %err, "waitid failed");
        return;
    }
}
