//! Command-line interface for sotto

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Offline voice dictation toolkit
#[derive(Parser, Debug)]
#[command(name = "sotto", version, about = "Offline voice dictation toolkit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: settings.json in the data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Verbose logging (-v: debug, -vv: trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage speech recognition models
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// Clean up dictated text with a language model
    Polish(PolishArgs),
}

#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List catalog models and their install state
    List,

    /// Download, verify and install a model
    Download {
        /// Model id as shown by `models list`
        model_id: String,
    },

    /// Remove an installed model
    Delete { model_id: String },

    /// Install the bundled default model without network access
    ExtractDefault {
        /// Directory holding the bundled model files
        #[arg(long, value_name = "DIR")]
        resources: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Ollama,
    Anthropic,
}

impl ProviderArg {
    /// Parse the `llm.provider` setting
    pub fn from_setting(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

#[derive(clap::Args, Debug)]
pub struct PolishArgs {
    /// LLM provider (default: llm.provider setting, else ollama)
    #[arg(long, short = 'p', value_enum)]
    pub provider: Option<ProviderArg>,

    #[arg(long, short = 'm', value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of the provider API
    #[arg(long, short = 'b', value_name = "URL")]
    pub base_url: Option<String>,

    /// Anthropic API key (default: ANTHROPIC_API_KEY)
    #[arg(long, short = 'k', value_name = "KEY")]
    pub api_key: Option<String>,

    /// Dictation language, ISO 639-1 (default: director.language setting)
    #[arg(long, short = 'l', value_name = "LANG")]
    pub language: Option<String>,

    /// Send the text as-is instead of wrapping it in the polishing prompt
    #[arg(long)]
    pub raw: bool,

    /// Text to polish (multiple words allowed, no quotes needed)
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}
