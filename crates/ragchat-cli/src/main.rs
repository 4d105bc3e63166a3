mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::RagchatConfig;
use ragchat_agent::{ConversationalRetrievalChain, LlmClient, RetrievalQa};
use ragchat_core::{CancellationToken, RagError};
use ragchat_memory::{
    cosine_similarity, DirectoryLoader, Document, DocumentSource, EmbeddingProvider,
    LocalEmbedding, TextFileLoader, VectorIndex, VectorStoreRetriever,
};
use ragchat_session::InMemoryConversationMemory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragchat", about = "Ragchat: chat with your documents")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "ragchat.toml")]
    config: PathBuf,

    /// Chunk size in characters (overrides config)
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Chunk overlap in characters (overrides config)
    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,

    /// Glob-lite pattern to skip while walking a directory (repeatable)
    #[arg(long = "ignore", global = true)]
    ignore: Vec<String>,

    /// Only read the top level of a directory
    #[arg(long, global = true)]
    no_recursive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file or directory and print the chunks as JSON lines
    Split { path: PathBuf },
    /// Cosine similarity between two embedded texts
    Similarity { a: String, b: String },
    /// Index a file or directory, then print the closest chunks to a query
    Search {
        path: PathBuf,
        query: String,
        /// Number of results (overrides config)
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Index a file or directory and answer one question
    Ask { path: PathBuf, question: String },
    /// Index a file or directory and start a conversation on stdin
    Chat {
        path: PathBuf,
        /// Conversation id
        #[arg(short, long, default_value = "default")]
        session: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = RagchatConfig::load(&cli.config)
        .await
        .with_context(|| format!("Failed to load config file '{}'", cli.config.display()))?;
    if let Some(size) = cli.chunk_size {
        config.splitter.chunk_size = size;
    }
    if let Some(overlap) = cli.chunk_overlap {
        config.splitter.chunk_overlap = overlap;
    }
    if !cli.ignore.is_empty() {
        config.loader.ignore_paths.extend(cli.ignore.iter().cloned());
    }
    if cli.no_recursive {
        config.loader.recursive = false;
    }
    config.validate()?;

    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(LocalEmbedding::new(config.embedding.dimension));

    match cli.command {
        Commands::Split { path } => {
            let documents = load_documents(&path, &config).await?;
            let chunks = config.splitter()?.split_documents(&documents);
            let mut stdout = tokio::io::stdout();
            for chunk in &chunks {
                let line = serde_json::to_string(chunk)?;
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            stdout.flush().await?;
            info!(documents = documents.len(), chunks = chunks.len(), "split complete");
        }
        Commands::Similarity { a, b } => {
            let va = embedder.embed(&a).await?;
            let vb = embedder.embed(&b).await?;
            println!("{:.6}", cosine_similarity(&va, &vb));
        }
        Commands::Search { path, query, k } => {
            let k = k.unwrap_or(config.retrieval.top_k);
            let store = build_store(&path, &config, embedder).await?;
            for hit in store.similarity_search(&query, k).await? {
                let line = serde_json::json!({
                    "id": hit.record.id,
                    "score": hit.score,
                    "text": hit.record.text,
                });
                println!("{line}");
            }
        }
        Commands::Ask { path, question } => {
            let store = build_store(&path, &config, embedder).await?;
            let generator = Arc::new(LlmClient::new(&config.generation)?);
            let qa = RetrievalQa::new(
                store.embedder().clone(),
                store.index().clone(),
                generator,
                config.retrieval.clone(),
            )?;
            let answer = with_interrupt(|token| async move {
                qa.ask_with_cancel(&question, &token).await
            })
            .await?;
            println!("{answer}");
        }
        Commands::Chat { path, session } => {
            let store = build_store(&path, &config, embedder).await?;
            let chain = ConversationalRetrievalChain::builder()
                .embedder(store.embedder().clone())
                .retriever(store.index().clone())
                .generator(Arc::new(LlmClient::new(&config.generation)?))
                .memory(Arc::new(InMemoryConversationMemory::new()))
                .config(config.retrieval.clone())
                .build()?;
            chat_loop(&chain, &session).await?;
        }
    }

    Ok(())
}

async fn load_documents(path: &Path, config: &RagchatConfig) -> anyhow::Result<Vec<Document>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let documents = if metadata.is_dir() {
        DirectoryLoader::new(path)
            .recursive(config.loader.recursive)
            .ignore_paths(config.loader.ignore_paths.iter())?
            .load()
            .await?
    } else {
        TextFileLoader::new(path).load().await?
    };
    Ok(documents)
}

async fn build_store(
    path: &Path,
    config: &RagchatConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> anyhow::Result<VectorStoreRetriever> {
    let documents = load_documents(path, config).await?;
    let store =
        VectorStoreRetriever::new(config.splitter()?, embedder, Arc::new(VectorIndex::new()));
    let inserted = store.add_documents(&documents).await?;
    info!(
        documents = documents.len(),
        chunks = inserted,
        path = %path.display(),
        "index built"
    );
    Ok(store)
}

/// Run one request, cancelling it on Ctrl-C.
async fn with_interrupt<F, Fut, T>(run: F) -> Result<T, RagError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: std::future::Future<Output = Result<T, RagError>>,
{
    let token = CancellationToken::new();
    let trigger = token.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    let result = run(token).await;
    watcher.abort();
    result
}

async fn chat_loop(chain: &ConversationalRetrievalChain, session: &str) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        let outcome = with_interrupt(|token| async move {
            chain.invoke_traced(session, question, &token).await
        })
        .await;
        match outcome {
            Ok(turn) => {
                stdout.write_all(turn.answer.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Err(e @ RagError::Cancelled { .. }) => {
                tracing::warn!(session_id = session, error = %e, "turn cancelled");
            }
            Err(e) if e.is_upstream() => {
                // The session is untouched, so the user can simply retry.
                tracing::error!(session_id = session, error = %e, "turn failed");
                stdout.write_all(format!("error: {e}\n").as_bytes()).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
