//! CLI argument definitions for the bridge client.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Command-line interface for sending requests to a running bridge.
#[derive(Parser, Debug)]
#[command(name = "pi-bridge", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Working directory whose bridge should be contacted.
    ///
    /// Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub(crate) cwd: Option<Utf8PathBuf>,
    /// Directory holding bridge sockets.
    #[arg(long, value_name = "DIR")]
    pub(crate) socket_dir: Option<Utf8PathBuf>,
    /// Request to send.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Requests understood by the bridge.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Checks that a bridge is serving the working directory.
    Health,
    /// Queues a snippet as context for the agent's next turn.
    Context(SnippetArgs),
    /// Sends a snippet with an instruction as a follow-up message.
    Prompt {
        /// Instruction placed before the snippet.
        #[arg(long)]
        prompt: Option<String>,
        #[command(flatten)]
        snippet: SnippetArgs,
    },
}

/// Snippet fields shared by `context` and `prompt`.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct SnippetArgs {
    /// Source file name shown in the header.
    #[arg(long)]
    pub(crate) file: Option<String>,
    /// Language tag for the code fence.
    #[arg(long)]
    pub(crate) filetype: Option<String>,
    /// Snippet text; read from stdin when omitted.
    #[arg(long)]
    pub(crate) text: Option<String>,
}
