//! Command-line client for the pi bridge.
//!
//! The client derives the socket path for a working directory exactly as the
//! bridge does, sends one request line, and echoes the single response line.
//! IO streams are injected so tests can drive the runtime without a terminal.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use pi_bridge_config::Config;

mod cli;
mod errors;
mod transport;

use cli::{Cli, CliCommand, SnippetArgs};
use errors::AppError;
use transport::{connect, exchange};

/// Wire form of a bridge request.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct BridgeRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
}

impl BridgeRequest {
    fn from_command<R: Read>(command: CliCommand, stdin: &mut R) -> Result<Self, AppError> {
        match command {
            CliCommand::Health => Ok(Self {
                kind: "health",
                ..Self::default()
            }),
            CliCommand::Context(snippet) => Self::with_snippet("context", snippet, stdin),
            CliCommand::Prompt { prompt, snippet } => Ok(Self {
                prompt,
                ..Self::with_snippet("prompt", snippet, stdin)?
            }),
        }
    }

    fn with_snippet<R: Read>(
        kind: &'static str,
        snippet: SnippetArgs,
        stdin: &mut R,
    ) -> Result<Self, AppError> {
        let text = match snippet.text {
            Some(text) => text,
            None => {
                let mut text = String::new();
                stdin
                    .read_to_string(&mut text)
                    .map_err(AppError::ReadInput)?;
                text
            }
        };
        Ok(Self {
            kind,
            text: Some(text),
            file: snippet.file,
            filetype: snippet.filetype,
            prompt: None,
        })
    }
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// Exits with failure when the bridge cannot be reached or answers with an
/// `error` key; the response line is printed to `stdout` either way.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    match execute(args, stdin, stdout) {
        Ok(exit_code) => exit_code,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "pi-bridge: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<I, R, W>(args: I, stdin: &mut R, stdout: &mut W) -> Result<ExitCode, AppError>
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
{
    let cli = Cli::try_parse_from(args).map_err(AppError::CliUsage)?;
    let config = Config {
        socket_dir: cli.socket_dir,
        working_dir: cli.cwd,
        ..Config::default()
    };
    let working_dir = config.working_dir()?;
    let address = config.socket_address(working_dir.as_str());

    let request = BridgeRequest::from_command(cli.command, stdin)?;
    let payload = serde_json::to_vec(&request).map_err(AppError::SerialiseRequest)?;

    let stream = connect(&address)?;
    let line = exchange(stream, &payload)?;
    let response: serde_json::Value =
        serde_json::from_str(&line).map_err(AppError::ParseResponse)?;

    writeln!(stdout, "{line}").map_err(AppError::ForwardResponse)?;
    if response.get("error").is_some() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
