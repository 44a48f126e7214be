/*
 * error.rs
 *
 * Exit codes match GNU coreutils. Scripts depend on these.
 * 124 = timed out, 125 = our fault, 126 = not executable, 127 = not found
 *
 * Don't change them. You'll break CI pipelines.
 */

use std::io;

use crate::signal::Signal;

/// exit codes per GNU coreutils convention. don't change these.
pub mod exit_codes {
    /// Command ran too long (timed out)
    pub const TIMEOUT: u8 = 124;
    /// timeout itself failed (internal error)
    pub const INTERNAL_ERROR: u8 = 125;
    /// Command found but couldn't be executed (permissions)
    pub const CANNOT_INVOKE: u8 = 126;
    /// Command not found
    pub const NOT_FOUND: u8 = 127;
}

/// Why the child never started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnFailure {
    NotFound,
    NotExecutable,
    Other,
}

impl SpawnFailure {
    /* errno from exec decides 126 vs 127, same split as GNU */
    #[must_use]
    pub fn classify(err: &io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ENOENT) => Self::NotFound,
            Some(
                libc::EACCES
                | libc::EPERM
                | libc::ENOEXEC
                | libc::EISDIR
                | libc::ENOTDIR
                | libc::ETXTBSY,
            ) => Self::NotExecutable,
            Some(_) => Self::Other,
            None => match err.kind() {
                io::ErrorKind::NotFound => Self::NotFound,
                io::ErrorKind::PermissionDenied => Self::NotExecutable,
                _ => Self::Other,
            },
        }
    }

    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::NotFound => exit_codes::NOT_FOUND,
            Self::NotExecutable => exit_codes::CANNOT_INVOKE,
            Self::Other => exit_codes::INTERNAL_ERROR,
        }
    }
}

/* everything that can go wrong */
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    #[error("{0}")]
    Usage(String),

    #[error("invalid time interval '{0}'")]
    InvalidDuration(String),

    #[error("time interval '{0}' is too large")]
    DurationOverflow(String),

    #[error("invalid signal '{0}'")]
    InvalidSignal(String),

    #[error("failed to run command '{command}': {source}")]
    Spawn {
        command: String,
        kind: SpawnFailure,
        #[source]
        source: io::Error,
    },

    #[error("failed to send signal {signal} to process {pid}: {source}")]
    SignalDelivery {
        signal: Signal,
        pid: u32,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for command: {0}")]
    Wait(#[source] io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TimeoutError {
    /* map errors to exit codes. 126 vs 127 matters to scripts. */
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Spawn { kind, .. } => kind.exit_code(),
            Self::Usage(_)
            | Self::InvalidDuration(_)
            | Self::DurationOverflow(_)
            | Self::InvalidSignal(_)
            | Self::SignalDelivery { .. }
            | Self::Wait(_)
            | Self::Internal(_) => exit_codes::INTERNAL_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, TimeoutError>;
