//! Main entry point for the `difflint` CLI.

use difflint::cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_user_error() {
                eprintln!("Run `difflint --help` for usage.");
            }
            ExitCode::FAILURE
        }
    }
}
