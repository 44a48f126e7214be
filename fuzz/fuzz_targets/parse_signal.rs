/*
 * fuzz_targets/parse_signal.rs
 *
 * parse_signal must never panic, and whatever it accepts must be a real
 * signal number we can print in a diagnostic.
 *
 * edge cases: "SIGFOO", "999", "-1", "0", "term", "  TERM  ", "SIG", ""
 */

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = core::str::from_utf8(data) {
        if let Ok(sig) = unix_timeout::signal::parse_signal(s) {
            assert!(sig.as_raw() >= 1);
            let _ = sig.to_string();
        }
    }
});
