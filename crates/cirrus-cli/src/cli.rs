use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "cirrus")]
#[command(version, about = "Cirrus - chat with your Google Drive and OneDrive files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (defaults to ~/.config/cirrus/config.toml)
    #[arg(long, global = true, env = "CIRRUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Interactive chat (default)
    Chat,

    /// Ask one question in the current chat and print the answer
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// List archived chats, newest first
    History,

    /// List built-in guides
    Guides {
        /// Filter by title or keyword
        query: Option<String>,
    },

    /// Show configuration status
    Status,
}
