//! Policy analysis server binary
//!
//! Run with: cargo run -p policy-qa --bin policy-qa-server

use policy_qa::{config::AppConfig, server::PolicyServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policy_qa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║               Insurance Policy Analyzer                   ║
║        Question answering over policy documents           ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = AppConfig::load(None)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Default strategy: {}", config.pipeline.strategy);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Chunk size: {}", config.chunking.max_chunk_chars);

    let server = PolicyServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /analyze - Answer questions about a policy document");
    println!("  POST /test    - Run the sample analysis");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
