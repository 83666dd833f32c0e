//! CLI entrypoint for the pi bridge client.
//!
//! The binary delegates to [`pi_bridge_cli::run`], which parses arguments,
//! sends one request to the bridge serving the working directory, and echoes
//! the response line.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    pi_bridge_cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
