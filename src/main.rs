use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use inbox_triage::config::{SmtpConfig, TriageConfig};
use inbox_triage::dispatch::{DisabledGateway, DispatchGateway, SmtpGateway};
use inbox_triage::export;
use inbox_triage::llm::{LlmConfig, LlmRole, create_provider};
use inbox_triage::pipeline::{BatchOrchestrator, DirectorySource, MessageSource};
use inbox_triage::review::{ReviewBoard, run_console};

/// Batch-triage a mail directory, then review the drafts.
#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of `.eml` / `.txt` messages to triage
    incoming: PathBuf,

    /// Move processed messages into this directory
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Write `triage.csv` and per-entry records into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Skip the interactive review console
    #[arg(long)]
    no_review: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = TriageConfig::from_env();
    let llm_config = LlmConfig::from_env().context("LLM configuration")?;

    eprintln!("📬 Inbox Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   Incoming: {}", args.incoming.display());
    eprintln!(
        "   Batch: up to {} messages, concurrency {}",
        config.max_messages, config.concurrency
    );

    let classifier = create_provider(&llm_config, LlmRole::Classifier)?;
    let drafter = create_provider(&llm_config, LlmRole::Drafter)?;

    let gateway: Arc<dyn DispatchGateway> = match SmtpConfig::from_env() {
        Some(smtp) => {
            eprintln!("   SMTP: {}:{}", smtp.smtp_host, smtp.smtp_port);
            Arc::new(SmtpGateway::new(smtp, config.dispatch_timeout))
        }
        None => {
            eprintln!("   SMTP: disabled (set EMAIL_SMTP_HOST to send replies)");
            Arc::new(DisabledGateway)
        }
    };

    let mut source = DirectorySource::new(&args.incoming);
    if let Some(archive) = &args.archive {
        eprintln!("   Archive: {}", archive.display());
        source = source.with_archive(archive);
    }
    eprintln!();

    // ── Batch ────────────────────────────────────────────────────────────
    let board = ReviewBoard::new();
    let orchestrator = BatchOrchestrator::new(classifier, drafter, config.clone());
    let report = orchestrator
        .run(&source, &board)
        .await
        .with_context(|| format!("reading {}", args.incoming.display()))?;

    println!("{}", report.result.render());

    let completed = report.completed_ids();
    if let Err(e) = source.acknowledge(&completed).await {
        tracing::warn!(error = %e, "Failed to archive processed messages");
    }

    // ── Review ───────────────────────────────────────────────────────────
    if !args.no_review && !board.is_empty().await {
        run_console(Arc::clone(&board), Arc::clone(&gateway), config.dispatch_timeout).await;
    }

    if let Some(dir) = &args.export {
        let entries = board.entries().await;
        export::write_csv(&dir.join("triage.csv"), &entries).await?;
        let records = export::write_records(dir, &entries).await?;
        eprintln!(
            "Exported {} rows and {} draft records to {}",
            entries.len(),
            records.len(),
            dir.display()
        );
    }

    if !args.no_review {
        println!("{}", board.summary().await.render());
    }

    Ok(())
}
