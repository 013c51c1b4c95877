//! `x402-verify`: check an x402 payment from the command line.
//!
//! Commands:
//! - `verify --payment FILE --requirements FILE` prints the verdict as JSON
//! - `sample` prints a freshly signed `{payment, requirements}` pair
//!
//! Exit status is 0 for a valid payment, 2 for an invalid one, and 1 for any
//! I/O or configuration error.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `X402_CONFIG` names the verifier configuration file unless `--config` is given
//! - `X402_LOG` sets the log filter

mod args;
mod run;

use std::process::ExitCode;

fn main() -> ExitCode {
    match run::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
    }
}
