/*
 * runner.rs
 *
 * The supervisor. Spawn, race exit against the clock, signal, maybe
 * escalate, reap, report.
 *
 *   Starting -> Running -> Exited
 *                       -> TimedOut -> Exited
 *                                   -> Escalating -> Exited | ForciblyKilled
 *   Starting -> SpawnFailed(kind)
 *
 * Every wait goes through ExitWatch::next, which returns on exit, on
 * deadline, or on a signal we should forward. Timers are just deadlines
 * passed to that call, so a timer that lost the race is simply never
 * looked at again.
 *
 * Race at the deadline: the child might exit at the same instant the
 * timer fires. We re-check liveness after Elapsed and treat a dead child
 * as a natural exit. Since the watcher never reaps, a signal that does go
 * out can only hit a zombie, never a recycled pid.
 */

use std::process::ExitStatus;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::args::Args;
use crate::duration::{is_no_timeout, parse_duration};
use crate::error::{Result, SpawnFailure, TimeoutError, exit_codes};
use crate::kill::{SignalSender, UnixSender};
use crate::process::{ChildProcess, spawn_command, status_to_exit_code};
use crate::signal::{Signal, parse_signal};
use crate::sync::Latch;
use crate::wait::{Event, ExitWatch};

/* runtime config built from CLI args */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub timeout: Duration,            /* how long before we send the signal, 0 = forever */
    pub signal: Signal,               /* what to send (default: TERM) */
    pub kill_after: Option<Duration>, /* if set, KILL after this grace period */
    pub foreground: bool,             /* share our tty and process group */
    pub verbose: bool,                /* print signal diagnostics */
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            signal: Signal::TERM,
            kill_after: None,
            foreground: false,
            verbose: false,
        }
    }
}

impl RunConfig {
    /* build config from CLI args. fails if duration/signal is bogus. */
    pub fn from_args(args: &Args, duration_str: &str) -> Result<Self> {
        let timeout = parse_duration(duration_str)?;
        let signal = parse_signal(&args.signal)?;

        /* -k 0 means no escalation, same as GNU */
        let kill_after = args
            .kill_after
            .as_deref()
            .map(parse_duration)
            .transpose()?
            .filter(|grace| !grace.is_zero());

        Ok(Self {
            timeout,
            signal,
            kill_after,
            foreground: args.foreground,
            verbose: args.verbose,
        })
    }
}

/// What happened to the command.
#[derive(Debug)]
pub enum RunResult {
    /// Exited on its own before the deadline.
    Completed { status: ExitStatus },
    /// Deadline passed and we sent `signal`.
    TimedOut {
        signal: Signal,
        killed: bool, /* true if we had to escalate to KILL */
        status: ExitStatus,
    },
    /// Exited before the deadline after we relayed a signal sent to us.
    SignalForwarded { signal: Signal, status: ExitStatus },
}

impl RunResult {
    /* what exit code to return per GNU convention */
    #[must_use]
    pub fn exit_code(&self, preserve_status: bool) -> u8 {
        /* timed out: 124 whatever the child ended with, unless preserving */
        if self.timed_out() && !preserve_status {
            return exit_codes::TIMEOUT;
        }
        status_to_exit_code(self.status())
    }

    /// The command's final wait status.
    #[must_use]
    pub const fn status(&self) -> &ExitStatus {
        match self {
            Self::Completed { status }
            | Self::TimedOut { status, .. }
            | Self::SignalForwarded { status, .. } => status,
        }
    }

    #[must_use]
    pub const fn timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Final exit code for a run, errors included.
///
/// Spawn failures map to 127/126/125 and ignore `preserve_status`.
#[must_use]
pub fn exit_code_for(result: &Result<RunResult>, preserve_status: bool) -> u8 {
    match result {
        Ok(outcome) => outcome.exit_code(preserve_status),
        Err(e) => e.exit_code(),
    }
}

/// Supervisor lifecycle, logged at debug level on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Starting,
    Running,
    TimedOut,
    Escalating,
    Exited,
    ForciblyKilled,
    SpawnFailed(SpawnFailure),
}

struct Supervisor<'a, S: SignalSender> {
    config: &'a RunConfig,
    sender: S,
    child: ChildProcess,
    watch: ExitWatch,
    fired: Latch,
    state: State,
    forwarded: Option<Signal>,
}

impl<'a, S: SignalSender> Supervisor<'a, S> {
    fn start(child: ChildProcess, config: &'a RunConfig, sender: S) -> Result<Self> {
        let watch = match ExitWatch::spawn(child.id()) {
            Ok(watch) => watch,
            Err(e) => {
                /* can't supervise it, don't leave it running unsupervised */
                let mut child = child;
                if let Err(kill_err) = sender.force_terminate(child.target()) {
                    warn!(error = %kill_err, "failed to kill unsupervised child");
                }
                let _ = child.wait();
                return Err(e);
            }
        };

        Ok(Self {
            config,
            sender,
            child,
            watch,
            fired: Latch::new(),
            state: State::Starting,
            forwarded: None,
        })
    }

    fn transition(&mut self, next: State) {
        debug!(pid = self.child.id(), from = ?self.state, to = ?next, "state");
        self.state = next;
    }

    fn run(mut self) -> Result<RunResult> {
        self.transition(State::Running);

        /* zero = no timer. a deadline past Instant's range is the same thing */
        let deadline = if is_no_timeout(&self.config.timeout) {
            None
        } else {
            Instant::now().checked_add(self.config.timeout)
        };

        let event = self.race_until(deadline);
        /* timer fired as the child exited: the exit wins. fire() decides once */
        if event == Event::Elapsed && !self.watch.has_exited() && self.fired.fire() {
            self.time_out()
        } else {
            self.finish_exited()
        }
    }

    /* wait until exit or deadline, relaying any signal that comes in between */
    fn race_until(&mut self, deadline: Option<Instant>) -> Event {
        loop {
            match self.watch.next(deadline) {
                Event::Forward(signal) => self.forward(signal),
                event => return event,
            }
        }
    }

    fn finish_exited(mut self) -> Result<RunResult> {
        let status = self.child.wait()?;
        self.transition(State::Exited);

        Ok(match self.forwarded {
            Some(signal) => RunResult::SignalForwarded { signal, status },
            None => RunResult::Completed { status },
        })
    }

    fn time_out(mut self) -> Result<RunResult> {
        self.transition(State::TimedOut);
        let signal = self.config.signal;
        self.deliver(signal);

        let mut killed = false;
        /* no escalation timer for a child that's already gone */
        let grace = self.config.kill_after.filter(|_| !self.watch.has_exited());
        if let Some(grace) = grace {
            self.transition(State::Escalating);
            let deadline = Instant::now().checked_add(grace);
            /* re-check at expiry, it may have died just now */
            if self.race_until(deadline) == Event::Elapsed && !self.watch.has_exited() {
                self.force_kill();
                killed = true;
            }
        }

        self.race_until(None);
        let status = self.child.wait()?;
        self.transition(if killed {
            State::ForciblyKilled
        } else {
            State::Exited
        });

        Ok(RunResult::TimedOut {
            signal,
            killed,
            status,
        })
    }

    fn deliver(&self, signal: Signal) {
        if self.config.verbose {
            eprintln!(
                "timeout: sending signal {signal} to process {}",
                self.child.id()
            );
        }
        self.report(self.sender.deliver(self.child.target(), signal));
    }

    fn force_kill(&self) {
        if self.config.verbose {
            eprintln!(
                "timeout: sending signal {} to process {}",
                Signal::KILL,
                self.child.id()
            );
        }
        self.report(self.sender.force_terminate(self.child.target()));
    }

    fn forward(&mut self, signal: Signal) {
        /* a forward after the deadline doesn't change the outcome */
        if !self.fired.has_fired() {
            self.forwarded = Some(signal);
        }
        if self.config.verbose {
            eprintln!(
                "timeout: forwarding signal {signal} to process {}",
                self.child.id()
            );
        }
        self.report(self.sender.deliver(self.child.target(), signal));
    }

    /* delivery failures are not fatal, supervision carries on */
    fn report(&self, outcome: Result<()>) {
        if let Err(e) = outcome {
            warn!(error = %e, "signal delivery failed");
            if self.config.verbose {
                eprintln!("timeout: {e}");
            }
        }
    }
}

/// Spawn command and enforce timeout.
///
/// Errors: command not found, permission denied, spawn failed, reap failed.
/// Signal delivery failures are not errors.
pub fn run_command(command: &str, args: &[String], config: &RunConfig) -> Result<RunResult> {
    run_with_sender(command, args, config, UnixSender)
}

/// Like [`run_command`], with signals going through `sender`.
pub fn run_with_sender<S: SignalSender>(
    command: &str,
    args: &[String],
    config: &RunConfig,
    sender: S,
) -> Result<RunResult> {
    debug!(state = ?State::Starting, command, ?config, "starting");

    let child = spawn_command(command, args, config.foreground).inspect_err(|e| {
        if let TimeoutError::Spawn { kind, .. } = e {
            debug!(state = ?State::SpawnFailed(*kind), "spawn failed");
        }
    })?;

    Supervisor::start(child, config, sender)?.run()
}
