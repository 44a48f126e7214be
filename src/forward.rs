/*
 * forward.rs
 *
 * If timeout gets SIGTERM (docker stop, system shutdown) or Ctrl-C while
 * the child sits in its own process group, we pass it on. Otherwise you
 * get orphans.
 *
 * Self-pipe trick: signal handlers can only do async-signal-safe things,
 * so the handler writes the signal number as one byte into a pipe. A
 * reader thread turns bytes into channel events for whichever run is
 * active (its ExitWatch registered a Route). No active run means nobody
 * to forward to, so the signal gets its default action and we die the
 * way the sender intended.
 */

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::FromRawFd;
use std::ptr;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};
use std::thread;

use tracing::{debug, trace};

use crate::signal::Signal;
use crate::wait::WatchEvent;

/// Signals relayed to the child.
pub const FORWARDED: [Signal; 6] = [
    Signal::TERM,
    Signal::INT,
    Signal::HUP,
    Signal::QUIT,
    Signal::USR1,
    Signal::USR2,
];

/* write end of the signal pipe, -1 if forwarding is off */
static SIGNAL_WRITE_FD: AtomicI32 = AtomicI32::new(-1);

static ROUTES: Registry = Registry::new();

/* the run currently accepting forwarded signals, tagged by registration id */
struct Registry {
    slot: Mutex<Option<(u64, Sender<WatchEvent>)>>,
    next_id: AtomicU64,
}

impl Registry {
    const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    fn register(&self, tx: Sender<WatchEvent>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some((id, tx));
        id
    }

    fn unregister(&self, id: u64) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        /* a newer run may have taken over, leave it alone */
        if slot.as_ref().is_some_and(|(current, _)| *current == id) {
            *slot = None;
        }
    }

    /* false when nobody is listening */
    fn dispatch(&self, sig: Signal) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|(_, tx)| tx.send(WatchEvent::Forward(sig)).is_ok())
    }
}

/// Registration of one run as the forwarding target. Unregisters on drop.
#[derive(Debug)]
pub struct Route {
    id: u64,
}

impl Route {
    pub(crate) fn register(tx: Sender<WatchEvent>) -> Self {
        Self {
            id: ROUTES.register(tx),
        }
    }
}

impl Drop for Route {
    fn drop(&mut self) {
        ROUTES.unregister(self.id);
    }
}

/// Install handlers that forward TERM, INT, HUP, QUIT, USR1 and USR2 to the child.
///
/// Call before spawning. Calling again while installed is a no-op. Library
/// users running many commands should pair it with
/// [`cleanup_signal_forwarding`].
pub fn setup_signal_forwarding() -> io::Result<()> {
    if SIGNAL_WRITE_FD.load(Ordering::SeqCst) >= 0 {
        return Ok(());
    }

    let mut fds = [0i32; 2];
    // SAFETY: fds is a valid 2-element array, pipe() writes exactly 2 fds
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let [read_fd, write_fd] = fds;

    // SAFETY: read_fd and write_fd are valid fds just returned by pipe().
    // fcntl with F_GETFL/F_SETFL/F_SETFD is safe on valid fds.
    // All calls share the same invariant (fd validity).
    #[allow(clippy::multiple_unsafe_ops_per_block)]
    unsafe {
        /* the child must not inherit our pipe */
        libc::fcntl(read_fd, libc::F_SETFD, libc::FD_CLOEXEC);
        libc::fcntl(write_fd, libc::F_SETFD, libc::FD_CLOEXEC);
        /* handler must never block on a full pipe */
        let flags = libc::fcntl(write_fd, libc::F_GETFL);
        if flags >= 0 {
            libc::fcntl(write_fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
        }
    }

    if SIGNAL_WRITE_FD
        .compare_exchange(-1, write_fd, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        /* lost a setup race, the winner's pipe is in place */
        close_pair(read_fd, write_fd);
        return Ok(());
    }

    // SAFETY: read_fd is an open pipe end owned by nobody else from here on
    let pipe = unsafe { File::from_raw_fd(read_fd) };
    if let Err(e) = thread::Builder::new()
        .name("signal-forward".into())
        .spawn(move || read_forwarded(pipe))
    {
        SIGNAL_WRITE_FD.store(-1, Ordering::SeqCst);
        // SAFETY: write_fd is our pipe end, never published to a handler
        unsafe {
            libc::close(write_fd);
        }
        return Err(e);
    }

    // SAFETY: sigaction struct is zeroed then initialized field by field.
    // on_signal is an extern "C" fn with the handler signature.
    // All ops share the invariant of setting up handlers for valid signals.
    #[allow(clippy::multiple_unsafe_ops_per_block)]
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        for sig in FORWARDED {
            libc::sigaction(sig.as_raw(), &raw const sa, ptr::null_mut());
        }
    }

    debug!("signal forwarding installed");
    Ok(())
}

/// Restore default handlers and stop the reader thread.
pub fn cleanup_signal_forwarding() {
    for sig in FORWARDED {
        // SAFETY: resetting a valid signal to SIG_DFL has no preconditions
        unsafe {
            libc::signal(sig.as_raw(), libc::SIG_DFL);
        }
    }

    let fd = SIGNAL_WRITE_FD.swap(-1, Ordering::SeqCst);
    if fd >= 0 {
        /* reader sees EOF and exits, dropping the read end */
        // SAFETY: fd is our pipe write end and no longer visible to handlers
        unsafe {
            libc::close(fd);
        }
    }
}

extern "C" fn on_signal(sig: libc::c_int) {
    let fd = SIGNAL_WRITE_FD.load(Ordering::Relaxed);
    if fd < 0 {
        return;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let byte = sig as u8;
    // SAFETY: write() is async-signal-safe; byte lives on this stack frame
    unsafe {
        libc::write(fd, (&raw const byte).cast(), 1);
    }
}

fn read_forwarded(mut pipe: File) {
    let mut buf = [0u8; 16];
    loop {
        let n = match pipe.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return,
        };
        for &byte in &buf[..n] {
            if let Some(sig) = Signal::try_from_raw(i32::from(byte)) {
                route(sig);
            }
        }
    }
}

fn route(sig: Signal) {
    if ROUTES.dispatch(sig) {
        trace!(%sig, "routed forwarded signal");
        return;
    }

    debug!(%sig, "no child to forward to, taking default action");
    // SAFETY: restoring the default disposition then raising a valid signal
    #[allow(clippy::multiple_unsafe_ops_per_block)]
    unsafe {
        libc::signal(sig.as_raw(), libc::SIG_DFL);
        libc::raise(sig.as_raw());
    }
}

fn close_pair(a: i32, b: i32) {
    // SAFETY: both fds came from pipe() and are owned by the caller
    #[allow(clippy::multiple_unsafe_ops_per_block)]
    unsafe {
        libc::close(a);
        libc::close(b);
    }
}
