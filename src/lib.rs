/*
 * lib.rs
 *
 * Exists mostly for testing. Integration tests need our types, doc tests
 * need a lib. You could use this as a library but honestly just shell out.
 */

//! # unix-timeout
//!
//! A GNU-compatible `timeout` for Unix: run a command with a time limit,
//! signal it when the limit passes, optionally escalate to KILL.
//!
//! ## Quick Start
//!
//! ```rust
//! use unix_timeout::{RunConfig, exit_code_for, parse_duration, parse_signal, run_command};
//! use unix_timeout::signal::Signal;
//! use std::time::Duration;
//!
//! // Parse duration strings
//! let dur = parse_duration("30s").unwrap();
//! assert_eq!(dur, Duration::from_secs(30));
//!
//! // Parse signal names and numbers
//! let sig = parse_signal("TERM").unwrap();
//! assert_eq!(sig, Signal::TERM);
//!
//! // Run something under a limit
//! let config = RunConfig {
//!     timeout: Duration::from_secs(5),
//!     ..RunConfig::default()
//! };
//! let result = run_command("true", &[], &config);
//! assert_eq!(exit_code_for(&result, false), 0);
//! ```

#[cfg(not(unix))]
compile_error!("unix-timeout only supports Unix targets");

pub mod args;
pub mod duration;
pub mod error;
pub mod forward;
pub mod io;
pub mod kill;
pub mod logging;
pub mod process;
pub mod runner;
pub mod signal;
pub mod sync;
pub mod wait;

pub use args::Args;
pub use duration::{is_no_timeout, parse_duration};
pub use error::{Result, SpawnFailure, TimeoutError, exit_codes};
pub use forward::{cleanup_signal_forwarding, setup_signal_forwarding};
pub use kill::{SignalSender, Target, UnixSender};
pub use runner::{RunConfig, RunResult, exit_code_for, run_command, run_with_sender};
pub use signal::{parse_signal, signal_name};
