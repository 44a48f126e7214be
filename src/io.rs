/*
 * io.rs
 *
 * Stream relay for non-foreground mode.
 *
 * The child gets pipes instead of our stdio. One thread per direction
 * copies bytes across. Every chunk is written under the std lock and
 * flushed so our own diagnostics never interleave mid-line with the
 * child's output.
 *
 * stdin is not relayed. The child inherits it, so whatever the child
 * doesn't read is still there for the next reader. stdout/stderr get
 * drained after the child is reaped, but only while bytes keep moving.
 * A grandchild that holds the pipe open must not keep us alive.
 */

use std::io::{self, Read, Write};
use std::process::Child;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace, warn};

const CHUNK: usize = 8 * 1024;

/// How long the drain waits without progress before giving up.
pub const DRAIN_IDLE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
enum Sink {
    Stdout,
    Stderr,
}

impl Sink {
    fn write_chunk(self, buf: &[u8]) -> io::Result<()> {
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(buf)?;
                out.flush()
            }
            Self::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(buf)?;
                err.flush()
            }
        }
    }

    const fn thread_name(self) -> &'static str {
        match self {
            Self::Stdout => "relay-stdout",
            Self::Stderr => "relay-stderr",
        }
    }
}

/// Relay threads attached to one child.
#[derive(Debug)]
pub struct Relay {
    done: Receiver<()>,
    pending: usize,
    moved: Arc<AtomicU64>,
}

impl Relay {
    /// Take the child's piped streams and start copying them.
    ///
    /// Streams that were not piped are skipped.
    pub fn attach(child: &mut Child) -> Self {
        let (tx, done) = mpsc::channel();
        let moved = Arc::new(AtomicU64::new(0));
        let mut pending = 0;

        if let Some(out) = child.stdout.take() {
            pending += usize::from(spawn_output(out, Sink::Stdout, tx.clone(), &moved));
        }
        if let Some(err) = child.stderr.take() {
            pending += usize::from(spawn_output(err, Sink::Stderr, tx.clone(), &moved));
        }

        Self {
            done,
            pending,
            moved,
        }
    }

    /// Wait for output relays to hit EOF, giving up after `idle` without progress.
    pub fn drain(mut self, idle: Duration) {
        let mut seen = self.moved.load(Ordering::Relaxed);
        while self.pending > 0 {
            match self.done.recv_timeout(idle) {
                Ok(()) => self.pending -= 1,
                Err(RecvTimeoutError::Timeout) => {
                    let now = self.moved.load(Ordering::Relaxed);
                    if now == seen {
                        debug!(pending = self.pending, "relay idle, pipe still held open");
                        return;
                    }
                    seen = now;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

/* returns whether a thread is now running */
fn spawn_output<R>(from: R, sink: Sink, done: Sender<()>, moved: &Arc<AtomicU64>) -> bool
where
    R: Read + Send + 'static,
{
    let moved = Arc::clone(moved);
    let spawned = thread::Builder::new()
        .name(sink.thread_name().into())
        .spawn(move || {
            pump_output(from, sink, &moved);
            let _ = done.send(());
        });

    match spawned {
        Ok(_) => true,
        Err(e) => {
            /* closure dropped, pipe closed, child sees EPIPE */
            warn!(error = %e, stream = sink.thread_name(), "failed to start relay");
            false
        }
    }
}

fn pump_output<R: Read>(mut from: R, sink: Sink, moved: &AtomicU64) {
    let mut buf = [0u8; CHUNK];
    loop {
        let n = match from.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                trace!(error = %e, "relay read failed");
                return;
            }
        };
        if let Err(e) = sink.write_chunk(&buf[..n]) {
            /* returning drops the read end so the child gets EPIPE */
            trace!(error = %e, "relay write failed");
            return;
        }
        moved.fetch_add(n as u64, Ordering::Relaxed);
    }
}
