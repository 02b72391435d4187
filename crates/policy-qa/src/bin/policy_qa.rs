//! Command-line policy analysis and service diagnostics
//!
//! Run with: cargo run -p policy-qa --bin policy-qa -- analyze --document policy.pdf

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use policy_qa::{
    config::AppConfig,
    providers::{GenerationRequest, PineconeIndex, ServiceHealth, Services},
    report,
    types::{
        AnswerOutcome, AnswerStrategy, Locator, OverviewMode, SAMPLE_DOCUMENT_URL,
        SAMPLE_QUESTIONS,
    },
    Pipeline,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "policy-qa",
    version,
    about = "Answer questions about insurance policy documents"
)]
struct Cli {
    /// TOML configuration file (falls back to POLICY_QA_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one document
    Analyze {
        /// Document URL or local path
        #[arg(long, default_value = SAMPLE_DOCUMENT_URL)]
        document: String,

        /// Question to ask; repeatable
        #[arg(long = "question")]
        questions: Vec<String>,

        /// File with one question per line
        #[arg(long)]
        questions_file: Option<PathBuf>,

        /// rule_based, direct_context, retrieval, hybrid or comprehensive
        #[arg(long)]
        strategy: Option<AnswerStrategy>,

        /// Directory for the JSON and text reports
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Skip writing reports
        #[arg(long, default_value_t = false)]
        no_report: bool,
    },
    /// Analyze whole documents without questions
    Describe {
        /// Document URL or local path; repeatable
        #[arg(long = "document", default_value = SAMPLE_DOCUMENT_URL)]
        documents: Vec<String>,

        /// comprehensive, summary or key_points
        #[arg(long, default_value = "comprehensive")]
        mode: OverviewMode,

        /// Directory for the JSON analyses
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Skip writing the JSON analyses
        #[arg(long, default_value_t = false)]
        no_report: bool,
    },
    /// Check credentials and connectivity of the hosted services
    Check,
    /// List the vector indexes visible to the configured key
    Indexes,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policy_qa=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Analyze {
            document,
            questions,
            questions_file,
            strategy,
            output_dir,
            no_report,
        } => {
            let questions = collect_questions(questions, questions_file.as_deref())?;
            analyze(config, &document, questions, strategy, output_dir, no_report).await
        }
        Command::Describe {
            documents,
            mode,
            output_dir,
            no_report,
        } => describe_documents(config, &documents, mode, output_dir, no_report).await,
        Command::Check => check(config).await,
        Command::Indexes => list_indexes(config).await,
    }
}

fn collect_questions(mut questions: Vec<String>, file: Option<&std::path::Path>) -> Result<Vec<String>> {
    if let Some(path) = file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read questions from {}", path.display()))?;
        questions.extend(
            raw.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }
    if questions.is_empty() {
        questions = SAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect();
    }
    Ok(questions)
}

async fn analyze(
    config: AppConfig,
    document: &str,
    questions: Vec<String>,
    strategy: Option<AnswerStrategy>,
    output_dir: Option<PathBuf>,
    no_report: bool,
) -> Result<()> {
    let strategy = strategy.unwrap_or(config.pipeline.strategy);
    let output_dir = output_dir.unwrap_or_else(|| config.output.output_dir.clone());

    let services = Services::from_config(&config)?;
    let pipeline = Pipeline::new(config, services)?;
    let result = pipeline
        .analyze(&Locator::parse(document), &questions, strategy)
        .await?;

    println!("\nANALYSIS RESULTS ({})", result.strategy);
    println!("{}", "=".repeat(60));
    for (i, answer) in result.results.iter().enumerate() {
        println!("\n## Question {}: {}", i + 1, answer.question);
        println!("**Answer:** {}", answer.answer);
        if answer.outcome == AnswerOutcome::Failed {
            println!("(failed)");
        }
        println!("{}", "-".repeat(50));
    }
    println!("\n{}", result.summary());
    println!("Elapsed: {:.1}s", result.elapsed_ms as f64 / 1000.0);

    if !no_report {
        let paths = report::write_reports(&result, &output_dir)?;
        println!("\nSaved {} and {}", paths.json.display(), paths.text.display());
    }

    if !result.is_completed() {
        bail!("no text content could be extracted from {}", document);
    }
    Ok(())
}

async fn describe_documents(
    config: AppConfig,
    documents: &[String],
    mode: OverviewMode,
    output_dir: Option<PathBuf>,
    no_report: bool,
) -> Result<()> {
    let output_dir = output_dir.unwrap_or_else(|| config.output.output_dir.clone());
    let locators: Vec<Locator> = documents.iter().map(|d| Locator::parse(d)).collect();

    let services = Services::from_config(&config)?;
    let pipeline = Pipeline::new(config, services)?;
    let results = pipeline.overview_all(&locators, mode).await;

    let mut failures = 0;
    for (locator, result) in locators.iter().zip(results) {
        println!("\n{}", "=".repeat(60));
        println!("{} ({})", locator, mode);
        println!("{}", "=".repeat(60));
        match result {
            Ok(overview) => {
                println!("{}", overview.analysis);
                if !no_report {
                    let path = report::write_overview(&overview, &output_dir)?;
                    println!("\nSaved {}", path.display());
                }
            }
            Err(e) => {
                failures += 1;
                println!("Analysis failed: {}", e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} documents could not be analyzed", failures, locators.len());
    }
    Ok(())
}

async fn check(config: AppConfig) -> Result<()> {
    println!("Gemini API key: {}", presence(config.llm.is_configured()));
    println!("Pinecone API key and index: {}", presence(config.vector_index.is_configured()));

    let services = Services::from_config(&config)?;
    let health = services.health().await;
    println!("\nLLM ({}): {}", services.llm.model(), describe(health.llm));
    println!("Embeddings ({}): {}", services.embedder.name(), describe(health.embeddings));
    println!("Vector index ({}): {}", services.index.name(), describe(health.vector_index));

    if !services.llm_mock {
        let request = GenerationRequest::new("Reply with the single word: ready", &config.llm);
        match services.llm.generate(&request).await {
            Ok(reply) => println!("\nModel round trip: {}", reply.trim()),
            Err(e) if e.is_quota() => println!("\nModel round trip: quota exceeded ({})", e),
            Err(e) => println!("\nModel round trip failed: {}", e),
        }
    }

    if !services.index_mock {
        match services.index.stats().await {
            Ok(stats) => println!(
                "Index stats: {} vectors, dimension {}",
                stats.total_vectors,
                stats
                    .dimension
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ),
            Err(e) => println!("Index stats unavailable: {}", e),
        }
    }

    if !health.all_available() {
        bail!("one or more services are unhealthy");
    }
    Ok(())
}

async fn list_indexes(config: AppConfig) -> Result<()> {
    let mut vector_index = config.vector_index.clone();
    // Listing goes through the control plane only
    vector_index
        .index_name
        .get_or_insert_with(|| "unused".to_string());

    let pinecone = PineconeIndex::new(&vector_index)?;
    let indexes = pinecone.list_indexes().await?;
    if indexes.is_empty() {
        println!("No indexes found");
        return Ok(());
    }

    for index in indexes {
        let ready = index
            .status
            .as_ref()
            .map(|s| if s.ready { "ready" } else { "not ready" })
            .unwrap_or("unknown");
        println!(
            "{}  dimension={}  metric={}  host={}  ({})",
            index.name,
            index.dimension.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            index.metric.as_deref().unwrap_or("-"),
            index.host.as_deref().unwrap_or("-"),
            ready
        );
    }
    Ok(())
}

fn presence(configured: bool) -> &'static str {
    if configured {
        "configured"
    } else {
        "missing (mock mode)"
    }
}

fn describe(health: ServiceHealth) -> &'static str {
    match health {
        ServiceHealth::Healthy => "healthy",
        ServiceHealth::Unhealthy => "unhealthy",
        ServiceHealth::MockMode => "mock mode",
    }
}
