/*
 * kill.rs
 *
 * Signal delivery behind a small capability trait.
 *
 * The supervisor only ever asks two things: "send this signal" and
 * "end it, no arguing". UnixSender answers with kill/killpg. Tests plug
 * in recorders that count what went out.
 *
 * Process groups: when you time out a shell script that spawns children
 * you want all of them gone, not just the shell. killpg handles that.
 * ESRCH means the target is already gone, which is what we wanted.
 */

use std::io;

use tracing::debug;

use crate::error::{Result, TimeoutError};
use crate::signal::Signal;

/// Who a signal goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub pid: u32,
    /// Signal the whole process group led by `pid`.
    pub group: bool,
}

/// Platform capability for signaling the supervised child.
pub trait SignalSender {
    /// Deliver `signal` to the target. A target that already exited is not an error.
    fn deliver(&self, target: Target, signal: Signal) -> Result<()>;

    /// Terminate unconditionally; the target cannot catch or ignore this.
    fn force_terminate(&self, target: Target) -> Result<()> {
        self.deliver(target, Signal::KILL)
    }
}

impl<S: SignalSender + ?Sized> SignalSender for &S {
    fn deliver(&self, target: Target, signal: Signal) -> Result<()> {
        (**self).deliver(target, signal)
    }

    fn force_terminate(&self, target: Target) -> Result<()> {
        (**self).force_terminate(target)
    }
}

/// kill(2)/killpg(2) delivery.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixSender;

impl SignalSender for UnixSender {
    fn deliver(&self, target: Target, signal: Signal) -> Result<()> {
        send_signal(target, signal).map_err(|source| TimeoutError::SignalDelivery {
            signal,
            pid: target.pid,
            source,
        })
    }
}

fn send_signal(target: Target, signal: Signal) -> io::Result<()> {
    /* no process can have a pid outside pid_t */
    let Ok(pid) = libc::pid_t::try_from(target.pid) else {
        return Ok(());
    };
    let sig = signal.as_raw();
    debug!(pid, %signal, group = target.group, "delivering signal");

    if target.group {
        /*
         * try process group first. if ESRCH, fall back to just the process.
         * a leader that escaped its group is still worth a shot.
         */
        // SAFETY: killpg() is safe with any pid/signal combo, returns -1 on error
        if unsafe { libc::killpg(pid, sig) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }

    // SAFETY: kill() is safe with any pid/signal combo, returns -1 on error
    if unsafe { libc::kill(pid, sig) } == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        return Ok(()); // already dead, that's fine
    }
    Err(err)
}
