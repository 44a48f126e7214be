/*
 * fuzz_targets/parse_args.rs
 *
 * command line -> operands -> RunConfig must never panic. Every rejection
 * has to come back as an error carrying exit code 125.
 *
 * edge cases: "-pfv", "--unknown", "-s" (missing value), "-sTERM",
 * "--kill-after=", options after COMMAND, "--" in odd places
 */

#![no_main]

use clap::Parser;
use libfuzzer_sys::fuzz_target;
use unix_timeout::args::{Args, usage_error};
use unix_timeout::runner::RunConfig;

fuzz_target!(|data: &[u8]| {
    /* split input on null bytes to simulate multiple arguments */
    let argv: Vec<String> = std::iter::once("timeout".to_string())
        .chain(
            data.split(|&b| b == 0)
                .filter_map(|chunk| core::str::from_utf8(chunk).ok())
                .map(String::from),
        )
        .collect();

    /* try_parse_from never exits, help/version come back as errors too */
    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) => {
            assert_eq!(usage_error(&e).exit_code(), 125);
            return;
        }
    };

    let Ok((duration, _command, _rest)) = args.operands() else {
        return;
    };
    if let Err(e) = RunConfig::from_args(&args, duration) {
        assert_eq!(e.exit_code(), 125);
    }
});
