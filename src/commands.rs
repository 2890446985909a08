use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chat::{ChatMessage, OllamaChatEngine, augment_with_context};
use crate::config::{Config, default_config_dir};
use crate::embeddings::OllamaClient;
use crate::extract::PlainTextExtractor;
use crate::store::RetrievalStore;
use crate::{RagError, Result};

fn load_config() -> Result<Config> {
    let config_dir = default_config_dir().map_err(|e| RagError::Config(e.to_string()))?;
    Config::load(config_dir)
}

/// Print the active configuration as TOML.
#[inline]
pub fn show_config() -> Result<()> {
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| RagError::Config(format!("Failed to render config: {}", e)))?;

    println!(
        "{} {}",
        style("Configuration file:").bold(),
        config.config_file_path().display()
    );
    println!("{rendered}");
    Ok(())
}

/// Write the default configuration file if none exists yet.
#[inline]
pub fn init_config() -> Result<()> {
    let config = load_config()?;
    let path = config.config_file_path();

    if path.exists() {
        println!(
            "{} {}",
            style("Config already exists at").yellow(),
            path.display()
        );
        return Ok(());
    }

    config.save()?;
    println!("{} {}", style("Wrote default config to").green(), path.display());
    Ok(())
}

/// List models available on the configured Ollama server.
#[inline]
pub fn list_models() -> Result<()> {
    let config = load_config()?;
    let client = OllamaClient::new(&config.ollama)?;

    let models = client.list_models()?;
    if models.is_empty() {
        println!("{}", style("No models installed").yellow());
        return Ok(());
    }

    println!("{}", style("Available models:").bold());
    for model in models {
        match model.size {
            Some(size) => println!("  {} ({:.1} GB)", model.name, size as f64 / 1e9),
            None => println!("  {}", model.name),
        }
    }
    Ok(())
}

fn ingest_files(store: &RetrievalStore, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }

    let extractor = PlainTextExtractor::new();
    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .map_err(|e| RagError::Other(e.into()))?,
    );

    for path in files {
        bar.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let added = store.add_document(path, &extractor)?;
        info!("Ingested {} ({} chunks)", path.display(), added);
        bar.inc(1);
    }

    bar.finish_and_clear();
    println!(
        "{} {} chunks from {} file(s)",
        style("Knowledge base:").bold(),
        store.chunk_count()?,
        files.len()
    );
    Ok(())
}

fn retrieve_context(
    store: &RetrievalStore,
    question: &str,
    top_k: usize,
    show_context: bool,
) -> Result<String> {
    if store.is_empty()? {
        return Ok(question.to_string());
    }

    let context = store.query(question, top_k)?;
    if show_context {
        for (i, chunk) in context.iter().enumerate() {
            println!(
                "{} (distance: {:.2})",
                style(format!("Chunk {}", i + 1)).cyan().bold(),
                chunk.distance
            );
            let preview: String = chunk.text.chars().take(300).collect();
            if preview.len() < chunk.text.len() {
                println!("{preview}...");
            } else {
                println!("{preview}");
            }
        }
    }

    Ok(augment_with_context(question, &context))
}

fn stream_reply(
    engine: &OllamaChatEngine,
    prompt: &str,
    history: &[ChatMessage],
) -> Result<String> {
    let mut reply = String::new();
    let mut stdout = std::io::stdout();

    for fragment in engine.chat_stream(prompt, history)? {
        let fragment = fragment?;
        print!("{fragment}");
        stdout.flush()?;
        reply.push_str(&fragment);
    }
    println!();

    Ok(reply)
}

/// Answer a single question, optionally grounded in the given documents.
#[inline]
pub fn ask(
    files: &[PathBuf],
    question: &str,
    top_k: usize,
    no_rag: bool,
    show_context: bool,
) -> Result<()> {
    let config = load_config()?;
    let client = OllamaClient::new(&config.ollama)?;
    let engine = OllamaChatEngine::new(&config.ollama, &config.chat)?;
    let store = RetrievalStore::new(Arc::new(client), config.chunking.clone());

    if !no_rag {
        ingest_files(&store, files)?;
    }

    let prompt = if no_rag {
        question.to_string()
    } else {
        retrieve_context(&store, question, top_k, show_context)?
    };

    stream_reply(&engine, &prompt, &[])?;
    Ok(())
}

/// Interactive chat session over an in-memory knowledge base.
///
/// The knowledge base lives only as long as the process; `/reset` empties
/// it, `/clear` drops the conversation history.
#[inline]
pub fn chat(files: &[PathBuf], top_k: usize) -> Result<()> {
    let config = load_config()?;
    let client = OllamaClient::new(&config.ollama)?;
    let engine = OllamaChatEngine::new(&config.ollama, &config.chat)?;
    let store = RetrievalStore::new(Arc::new(client), config.chunking.clone());

    ingest_files(&store, files)?;

    println!(
        "{} (model: {}; /clear resets history, /reset empties the knowledge base, /quit exits)",
        style("Chat session started").green().bold(),
        engine.model()
    );

    let stdin = std::io::stdin();
    let mut history: Vec<ChatMessage> = Vec::new();

    loop {
        print!("{} ", style(">").bold());
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "" => {}
            "/quit" | "/exit" => break,
            "/clear" => {
                history.clear();
                println!("{}", style("History cleared").yellow());
            }
            "/reset" => {
                store.reset()?;
                println!("{}", style("Knowledge base cleared").yellow());
            }
            "/status" => {
                println!(
                    "{} chunks indexed, {} messages in history",
                    store.chunk_count()?,
                    history.len()
                );
            }
            question => {
                let prompt = retrieve_context(&store, question, top_k, false)?;

                // History keeps the raw question; only the outgoing prompt
                // carries the retrieved context
                match stream_reply(&engine, &prompt, &history) {
                    Ok(reply) => {
                        history.push(ChatMessage::user(question));
                        history.push(ChatMessage::assistant(reply));
                    }
                    Err(e) => {
                        warn!("Chat request failed: {}", e);
                        println!("{} {}", style("Error:").red().bold(), e);
                    }
                }
            }
        }
    }

    Ok(())
}
