/*
 * fuzz_targets/parse_duration.rs
 *
 * parse_duration must never panic, only return Ok or Err. An Ok value
 * must also survive being added to "now" the way the supervisor does it.
 *
 * edge cases: "", "999999999999999999999d", "-1", "1.2.3s", "1e9", unicode
 */

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = core::str::from_utf8(data) {
        if let Ok(d) = unix_timeout::duration::parse_duration(s) {
            let _ = std::time::Instant::now().checked_add(d);
        }
    }
});
