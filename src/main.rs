/*
 * main.rs
 *
 * Parse args, call runner, map the outcome to an exit code. Boring on
 * purpose. The interesting stuff is in runner.rs.
 */

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::warn;

use unix_timeout::args::{Args, usage_error};
use unix_timeout::error::exit_codes;
use unix_timeout::runner::{RunConfig, exit_code_for, run_command};
use unix_timeout::{logging, setup_signal_forwarding};

fn main() -> ExitCode {
    ExitCode::from(run_main())
}

fn run_main() -> u8 {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return 0;
        }
        Err(e) => {
            eprintln!("timeout: {}", usage_error(&e));
            return exit_codes::INTERNAL_ERROR;
        }
    };

    logging::init();

    let (duration, command, command_args) = match args.operands() {
        Ok(operands) => operands,
        Err(e) => {
            eprintln!("timeout: {e}");
            return e.exit_code();
        }
    };

    let config = match RunConfig::from_args(&args, duration) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("timeout: {e}");
            return e.exit_code();
        }
    };

    /* without forwarding, a Ctrl-C would orphan the child's process group */
    if let Err(e) = setup_signal_forwarding() {
        warn!(error = %e, "signal forwarding unavailable");
    }

    let result = run_command(command, command_args, &config);
    if let Err(e) = &result {
        eprintln!("timeout: {e}");
    }

    exit_code_for(&result, args.preserve_status)
}
