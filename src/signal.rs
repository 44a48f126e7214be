/*
 * signal.rs
 *
 * Parse "TERM", "SIGTERM", "term", "15". Reject "SIGFOO", "0", "999".
 *
 * Names cover the signals people actually send on timeout. Anything
 * more exotic goes by number. Signal is a plain i32 newtype so raw
 * numbers (realtime signals included) round-trip without a giant enum.
 */

use std::fmt;

use crate::error::{Result, TimeoutError};

/* highest deliverable signal number on this host */
#[cfg(any(target_os = "linux", target_os = "android"))]
const MAX_SIGNAL: i32 = 64;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const MAX_SIGNAL: i32 = 31;

/// A signal number known to be deliverable on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal(i32);

impl Signal {
    pub const HUP: Self = Self(libc::SIGHUP);
    pub const INT: Self = Self(libc::SIGINT);
    pub const QUIT: Self = Self(libc::SIGQUIT);
    pub const KILL: Self = Self(libc::SIGKILL);
    pub const USR1: Self = Self(libc::SIGUSR1);
    pub const USR2: Self = Self(libc::SIGUSR2);
    pub const TERM: Self = Self(libc::SIGTERM);

    /* convert from raw signal number, 0 is a liveness probe not a signal */
    #[must_use]
    pub const fn try_from_raw(num: i32) -> Option<Self> {
        if num >= 1 && num <= MAX_SIGNAL {
            Some(Self(num))
        } else {
            None
        }
    }

    /* get raw signal number */
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::TERM
    }
}

/* "TERM" for named signals, the number otherwise */
impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match signal_name(*self) {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Parse "TERM", "SIGKILL", "9", "hup" - all the ways to specify a signal.
///
/// # Examples
///
/// ```
/// use unix_timeout::signal::{parse_signal, Signal};
///
/// assert_eq!(parse_signal("TERM").unwrap(), Signal::TERM);
/// assert_eq!(parse_signal("SIGTERM").unwrap(), Signal::TERM);
/// assert_eq!(parse_signal("term").unwrap(), Signal::TERM);
/// assert_eq!(parse_signal("9").unwrap(), Signal::KILL);
/// ```
pub fn parse_signal(input: &str) -> Result<Signal> {
    let trimmed = input.trim();
    let invalid = || TimeoutError::InvalidSignal(input.to_string());

    /* try as number first */
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed
            .parse::<i32>()
            .ok()
            .and_then(Signal::try_from_raw)
            .ok_or_else(invalid);
    }

    /* strip optional SIG prefix, any case */
    let name = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("SIG") => &trimmed[3..],
        _ => trimmed,
    };

    /* TERM and KILL first, that's 99% of usage */
    const NAMED: [(&str, Signal); 6] = [
        ("TERM", Signal::TERM),
        ("KILL", Signal::KILL),
        ("INT", Signal::INT),
        ("HUP", Signal::HUP),
        ("USR1", Signal::USR1),
        ("USR2", Signal::USR2),
    ];

    NAMED
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, sig)| sig)
        .ok_or_else(invalid)
}

/* short name for diagnostics, None for signals we only know by number */
#[must_use]
pub const fn signal_name(signal: Signal) -> Option<&'static str> {
    match signal.0 {
        libc::SIGHUP => Some("HUP"),
        libc::SIGINT => Some("INT"),
        libc::SIGQUIT => Some("QUIT"),
        libc::SIGKILL => Some("KILL"),
        libc::SIGUSR1 => Some("USR1"),
        libc::SIGUSR2 => Some("USR2"),
        libc::SIGTERM => Some("TERM"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_name() {
        assert_eq!(parse_signal("TERM").unwrap(), Signal::TERM);
        assert_eq!(parse_signal("KILL").unwrap(), Signal::KILL);
        assert_eq!(parse_signal("HUP").unwrap(), Signal::HUP);
        assert_eq!(parse_signal("INT").unwrap(), Signal::INT);
        assert_eq!(parse_signal("USR1").unwrap(), Signal::USR1);
        assert_eq!(parse_signal("USR2").unwrap(), Signal::USR2);
    }

    #[test]
    fn test_parse_with_sig_prefix() {
        assert_eq!(parse_signal("SIGTERM").unwrap(), Signal::TERM);
        assert_eq!(parse_signal("SIGKILL").unwrap(), Signal::KILL);
        assert_eq!(parse_signal("sigusr2").unwrap(), Signal::USR2);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(parse_signal("term").unwrap(), Signal::TERM);
        assert_eq!(parse_signal("Term").unwrap(), Signal::TERM);
        assert_eq!(parse_signal("SigTerm").unwrap(), Signal::TERM);
    }

    #[test]
    fn test_parse_by_number() {
        assert_eq!(parse_signal("15").unwrap(), Signal::TERM);
        assert_eq!(parse_signal("9").unwrap(), Signal::KILL);
        assert_eq!(parse_signal("1").unwrap(), Signal::HUP);
        assert_eq!(parse_signal(" 2 ").unwrap().as_raw(), libc::SIGINT);
    }

    #[test]
    fn test_raw_number_without_name() {
        /* SIGALRM is valid by number even though we don't name it */
        let sig = parse_signal(&libc::SIGALRM.to_string()).unwrap();
        assert_eq!(sig.as_raw(), libc::SIGALRM);
        assert_eq!(signal_name(sig), None);
        assert_eq!(sig.to_string(), libc::SIGALRM.to_string());
    }

    #[test]
    fn test_invalid_name() {
        for input in ["INVALID", "SIGFOO", "QUITT", "", "SIG", "TERM9"] {
            assert!(
                matches!(parse_signal(input), Err(TimeoutError::InvalidSignal(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_unlisted_names_rejected() {
        /* only the six documented names resolve, others go by number */
        assert!(parse_signal("QUIT").is_err());
        assert!(parse_signal("ALRM").is_err());
    }

    #[test]
    fn test_invalid_number() {
        assert!(parse_signal("0").is_err());
        assert!(parse_signal("999").is_err());
        assert!(parse_signal("-1").is_err());
        assert!(parse_signal("99999999999999").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Signal::TERM.to_string(), "TERM");
        assert_eq!(Signal::KILL.to_string(), "KILL");
        assert_eq!(Signal::default(), Signal::TERM);
    }

    #[test]
    fn test_as_raw() {
        assert_eq!(Signal::TERM.as_raw(), 15);
        assert_eq!(Signal::KILL.as_raw(), 9);
        assert_eq!(Signal::HUP.as_raw(), 1);
    }
}
