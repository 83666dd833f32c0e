use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match pi_bridged::run_bridge(std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "pi-bridged::process", %error, "bridge exited with an error");
            let _ = writeln!(io::stderr(), "pi-bridged: {error}");
            ExitCode::FAILURE
        }
    }
}
