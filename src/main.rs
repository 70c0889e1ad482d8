//! stylerag - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use stylerag::{
    cli::{Args, Commands, RetrieveArgs},
    config::Config,
    corpus::InMemoryCorpus,
    embedding::{create_client, EmbeddingClient},
    rag::{ExampleBlockBuilder, RetrievalEngine},
    telemetry::init_tracing,
    vector_db::{InMemoryVectorIndex, QdrantIndex, VectorIndex},
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity());

    let config = load_config(&args)?;

    match &args.command {
        Commands::Retrieve(retrieve) => run_retrieve(&config, retrieve).await?,
        Commands::Config => show_config(&config)?,
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

async fn run_retrieve(config: &Config, args: &RetrieveArgs) -> Result<()> {
    let corpus = Arc::new(
        InMemoryCorpus::from_jsonl(&args.corpus)
            .with_context(|| format!("Failed to load corpus {}", args.corpus.display()))?,
    );

    let mut engine = RetrievalEngine::with_config(corpus.clone(), config.retrieval.clone());
    if let Some((embedder, index)) = vector_signal(config, args, &corpus).await? {
        engine = engine.with_vector_signal(embedder, index);
    }

    let request = args.to_request();
    let result = engine.retrieve(&request).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to serialize result")?
    );

    if args.prompt_block {
        let block = ExampleBlockBuilder::new().build(&result.items);
        if !block.is_empty() {
            println!("\n{}", block.text);
        }
    }

    Ok(())
}

/// Embedder and index for the vector signal, or `None` for lexical-only
async fn vector_signal(
    config: &Config,
    args: &RetrieveArgs,
    corpus: &InMemoryCorpus,
) -> Result<Option<(Arc<dyn EmbeddingClient>, Arc<dyn VectorIndex>)>> {
    if !args.local_index && !config.vector_store.enabled {
        return Ok(None);
    }

    let embedder = create_client(&config.embedding)
        .await
        .context("Failed to initialize embedding backend")?;

    let index: Arc<dyn VectorIndex> = if args.local_index {
        let index = InMemoryVectorIndex::build(
            config.retrieval.collection.clone(),
            corpus.entries(),
            embedder.as_ref(),
        )
        .await
        .context("Failed to build local vector index")?;
        Arc::new(index)
    } else {
        match QdrantIndex::connect(&config.vector_store) {
            Ok(index) => {
                info!(url = index.url(), "using Qdrant vector index");
                Arc::new(index)
            }
            Err(e) => {
                warn!(error = %e, "Qdrant unavailable, ranking lexically");
                return Ok(None);
            }
        }
    };

    Ok(Some((embedder, index)))
}

fn show_config(config: &Config) -> Result<()> {
    let path = Config::config_path()?;
    println!("# {}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(config).context("Failed to serialize config")?
    );
    Ok(())
}
