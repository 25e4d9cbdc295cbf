//! Gyeyak CLI - contract risk analysis from the terminal.

mod cli;
mod config;
mod output;

use clap::Parser;
use cli::{Cli, Command};
use config::AppConfig;
use gyeyak_domain::{DocumentId, EngineConfig, IssueCategory, SituationRequest};
use gyeyak_engine::{ChatRequest, Engine};
use gyeyak_extract::FileFormat;
use gyeyak_llm::OllamaClient;
use gyeyak_store::{Embedder, HttpEmbedder, InMemoryVectorStore, RemoteVectorStore, VectorStore};
use output::Formatter;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let formatter = Formatter::new(!cli.no_color);

    let engine = build_engine(&config)?;
    engine.startup_check().await?;

    match cli.command {
        Command::Analyze(args) => {
            let format_hint = args.format.as_deref().map(parse_format);
            let report = engine
                .analyze_file(&args.file, format_hint, args.description.as_deref())
                .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", formatter.format_report(&report));
            }
        }
        Command::Situation(args) => {
            let request = SituationRequest {
                text: args.text,
                category_hint: args.category.as_deref().map(IssueCategory::parse),
                employment_type: args.employment_type,
                tenure_months: args.tenure_months,
                weekly_hours: args.weekly_hours,
            };
            let diagnosis = engine.analyze_situation(&request).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&diagnosis)?);
            } else {
                println!("{}", formatter.format_diagnosis(&diagnosis));
            }
        }
        Command::Chat(args) => {
            let mut request = ChatRequest::new(args.query);
            if let Some(raw) = args.document.as_deref() {
                request.document_ids = vec![DocumentId::from_string(raw)
                    .map_err(|e| anyhow::anyhow!("invalid --document: {}", e))?];
            }
            let answer = engine.chat(&request).await?;
            println!("{}", answer);
        }
    }

    Ok(())
}

fn build_engine(config: &AppConfig) -> anyhow::Result<Engine> {
    let engine_config: EngineConfig = config.engine.clone();
    let backends = &config.backends;

    let embedder: Arc<dyn Embedder> = Arc::new(
        HttpEmbedder::new(
            &backends.ollama_url,
            &backends.embed_model,
            backends.embed_dimension,
            engine_config.vector_timeout(),
        )
        .map_err(|e| anyhow::anyhow!("embedding backend: {}", e))?,
    );

    let store: Arc<dyn VectorStore> = match backends.vector_url.as_deref() {
        Some(url) => Arc::new(
            RemoteVectorStore::new(url, backends.embed_dimension, engine_config.vector_timeout())
                .map_err(|e| anyhow::anyhow!("vector store: {}", e))?,
        ),
        None => Arc::new(InMemoryVectorStore::new()),
    };

    let llm = Arc::new(
        OllamaClient::new(
            &backends.ollama_url,
            &backends.llm_model,
            engine_config.llm_timeout(),
        )
        .map_err(|e| anyhow::anyhow!("llm backend: {}", e))?,
    );

    Ok(Engine::new(engine_config, embedder, store, llm))
}

fn parse_format(raw: &str) -> FileFormat {
    match raw {
        "pdf" => FileFormat::Pdf,
        "hwpx" => FileFormat::Hwpx,
        "html" => FileFormat::Html,
        _ => FileFormat::Txt,
    }
}
