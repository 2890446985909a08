use clap::{Parser, Subcommand};
use docrag::Result;
use docrag::commands::{ask, chat, init_config, list_models, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docrag")]
#[command(about = "Local retrieval-augmented chat over your own documents using Ollama")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or initialize the configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
    /// Ask a single question, optionally grounded in documents
    Ask {
        /// The question to answer
        question: String,
        /// Plain-text documents to ingest before answering
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,
        /// Number of context chunks to retrieve
        #[arg(long, default_value_t = 3)]
        top_k: usize,
        /// Skip retrieval and send the question as-is
        #[arg(long)]
        no_rag: bool,
        /// Print the retrieved context chunks with their distances
        #[arg(long)]
        show_context: bool,
    },
    /// Start an interactive chat session
    Chat {
        /// Plain-text documents to ingest into the knowledge base
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,
        /// Number of context chunks to retrieve per message
        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },
    /// List models available on the Ollama server
    Models,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { init } => {
            if init {
                init_config()?;
            } else {
                show_config()?;
            }
        }
        Commands::Ask {
            question,
            files,
            top_k,
            no_rag,
            show_context,
        } => {
            ask(&files, &question, top_k, no_rag, show_context)?;
        }
        Commands::Chat { files, top_k } => {
            chat(&files, top_k)?;
        }
        Commands::Models => {
            list_models()?;
        }
    }

    Ok(())
}
