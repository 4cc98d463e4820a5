//! Command-line interface: argument parsing, the interactive chat loop, and
//! the standalone `speak` subcommand.

mod repl;
mod speak;

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;

#[derive(Parser)]
#[command(name = "mathmate")]
#[command(about = "A terminal math assistant with typeset answers and spoken replies")]
#[command(
    long_about = "Mathmate sends free-form math questions (optionally with image or \
document attachments) to a reasoning model, renders the LaTeX-flavored answer as \
structured text, and can read answers aloud.\n\n\
Configuration lives in config.toml; the API key may also come from the \
GEMINI_API_KEY environment variable.\n\n\
Chat commands:\n\
  /new              Start a new session\n\
  /sessions         List sessions\n\
  /open <n>         Switch to session n\n\
  /delete <n>       Delete session n\n\
  /attach <path>    Attach a file to the next message\n\
  /theme [name]     Show or set the theme preference\n\
  /speak            Read the last answer aloud (writes a WAV file)\n\
  /quit             Exit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Reasoning model to use for answers
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize speech for a piece of text and write it to a WAV file
    Speak {
        /// Text to read aloud
        text: String,

        /// Output path
        #[arg(short = 'o', long, default_value = "mathmate.wav")]
        output: std::path::PathBuf,
    },
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load()?;
    if let Some(model) = args.model {
        config.model = Some(model);
    }

    match args.command {
        Some(Commands::Speak { text, output }) => speak::run(&config, &text, &output).await,
        None => repl::run(&config).await,
    }
}

pub(crate) fn require_api_key(config: &Config) -> Result<String, Box<dyn Error>> {
    config.resolve_api_key().ok_or_else(|| {
        "no API key configured; set api_key in config.toml or the GEMINI_API_KEY variable".into()
    })
}
