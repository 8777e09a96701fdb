use anyhow::Result;
use clap::{Parser, Subcommand};
use medirag::chat::Composer;
use medirag::config::Config;
use medirag::gemini::GeminiClient;
use medirag::history::{ChatMessage, HistoryStore, JsonHistoryStore};
use medirag::index::lifecycle::IndexManager;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "medirag", about = "Retrieval-augmented medical reference chatbot", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the vector index from the source PDFs
    Build,
    /// Ask a single question
    Ask {
        question: String,
        /// Append retrieved passages as a sources block
        #[arg(long)]
        sources: bool,
    },
    /// Interactive chat session
    Chat {
        /// Append retrieved passages as a sources block
        #[arg(long)]
        sources: bool,
        /// Username for history persistence
        #[arg(long, default_value = "default")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up GOOGLE_API_KEY from a .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::new()?;

    let client = Arc::new(GeminiClient::from_env(
        config.embedding.clone(),
        config.generation.clone(),
    )?);
    let manager = Arc::new(IndexManager::new(&config, client.clone()));

    match cli.command {
        Command::Build => {
            manager.rebuild().await?;
            println!(
                "Index built with {} entries",
                manager.len().await.unwrap_or(0)
            );
        }
        Command::Ask { question, sources } => {
            manager.ensure_loaded().await?;
            let composer = Composer::new(client, manager, &config);
            let reply = composer.answer(&question, &[], sources).await;
            println!("{}", reply.merged);
        }
        Command::Chat { sources, user } => {
            manager.ensure_loaded().await?;
            let composer = Composer::new(client, manager, &config);
            let store = JsonHistoryStore::new(&config.chat.history_dir);
            run_chat_loop(&composer, &store, &user, sources).await?;
        }
    }

    Ok(())
}

async fn run_chat_loop(
    composer: &Composer,
    store: &JsonHistoryStore,
    user: &str,
    sources: bool,
) -> Result<()> {
    let mut history = store.load(user)?;
    if !history.is_empty() {
        println!("(restored {} messages)", history.len());
    }
    println!("Ask me any medical question. Type 'exit' to quit.");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        let reply = composer.answer(question, &history, sources).await;
        println!("{}\n", reply.merged);

        history.push(ChatMessage::user(question));
        history.push(ChatMessage::assistant(reply.merged));
        store.save(user, &history)?;
    }

    Ok(())
}
