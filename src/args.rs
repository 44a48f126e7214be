/*
 * args.rs
 *
 * Clap derive macros handle parsing. Life's too short to do this by hand.
 *
 * GNU compatible: scripts written for GNU timeout should just work.
 *
 * trailing_var_arg grabs everything after COMMAND so `timeout 5s grep -r`
 * doesn't try to parse grep's flags.
 */

use clap::Parser;

use crate::error::{Result, TimeoutError};

#[derive(Parser, Debug)]
#[command(
    name = "timeout",
    version,
    about = "Run a command with a time limit",
    long_about = "Start COMMAND, and kill it if still running after DURATION.\n\n\
                  DURATION is a floating-point number with optional suffix:\n\
                  's' for seconds (default), 'ms' for milliseconds, 'm' for minutes,\n\
                  'h' for hours, 'd' for days.\n\n\
                  Examples:\n\
                    timeout 30 cmd        # 30 seconds\n\
                    timeout 1.5m cmd      # 1.5 minutes (90 seconds)\n\
                    timeout 250ms cmd     # a quarter second\n\n\
                  A duration of 0 disables the timeout.\n\n\
                  If the command times out, and --preserve-status is not set, exit with status 124.\n\
                  Otherwise, exit with the status of COMMAND.\n\n\
                  If no signal is specified, TERM is sent. Use --kill-after to send KILL\n\
                  if the command is still running after a grace period.",
    after_help = "Exit status:\n\
                  124 if COMMAND times out, and --preserve-status is not specified\n\
                  125 if the timeout command itself fails\n\
                  126 if COMMAND is found but cannot be invoked\n\
                  127 if COMMAND cannot be found\n\
                  137 if COMMAND (or timeout itself) is sent KILL (128+9)\n\
                  the exit status of COMMAND otherwise\n\n\
                  Set TIMEOUT_LOG=debug to trace the supervisor on stderr."
)]
pub struct Args {
    /// Specify the signal to be sent on timeout.
    ///
    /// SIGNAL may be a name like 'TERM', 'HUP', or 'KILL', or a number.
    /// Falls back to TIMEOUT_SIGNAL environment variable.
    #[arg(
        short = 's',
        long = "signal",
        default_value = "TERM",
        value_name = "SIGNAL",
        env = "TIMEOUT_SIGNAL"
    )]
    pub signal: String,

    /// Also send a KILL signal if COMMAND is still running this long
    /// after the initial signal was sent.
    ///
    /// A value of 0 disables escalation.
    /// Falls back to TIMEOUT_KILL_AFTER environment variable.
    #[arg(
        short = 'k',
        long = "kill-after",
        value_name = "DURATION",
        env = "TIMEOUT_KILL_AFTER"
    )]
    pub kill_after: Option<String>,

    /// Exit with the same status as COMMAND, even when the command times out.
    #[arg(short = 'p', long = "preserve-status")]
    pub preserve_status: bool,

    /// Allow COMMAND to read from the TTY and get TTY signals.
    ///
    /// In this mode, children of COMMAND will not be timed out.
    /// Without this option, the command runs in a separate process group.
    #[arg(short = 'f', long = "foreground")]
    pub foreground: bool,

    /// Diagnose to stderr any signal sent upon timeout.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Duration before sending signal.
    #[arg(value_name = "DURATION")]
    pub duration: Option<String>,

    /// Command to run, followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl Args {
    /// Split positionals into (duration, command, command args).
    pub fn operands(&self) -> Result<(&str, &str, &[String])> {
        let Some(duration) = self.duration.as_deref() else {
            return Err(TimeoutError::Usage("missing operand".to_string()));
        };
        let Some((command, rest)) = self.command.split_first() else {
            return Err(TimeoutError::Usage(format!(
                "missing operand after '{duration}'"
            )));
        };
        Ok((duration, command, rest))
    }
}

/* clap's multi-line report squashed to our one-line format */
#[must_use]
pub fn usage_error(err: &clap::Error) -> TimeoutError {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default().trim();
    let message = first.strip_prefix("error: ").unwrap_or(first);
    TimeoutError::Usage(message.to_string())
}
