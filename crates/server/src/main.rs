//! Simple test harness for the recommendation orchestrator.
//!
//! Loads a catalog file, requests one set of recommendations with in-memory
//! state, and sends a click for the top item.
//!
//! Usage: `server [catalog.json]` (defaults to `data/catalog.json`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bandit::InMemoryArmStore;
use catalog::TraitCatalog;
use ledger::{EventType, InMemoryEventLedger};
use server::{FeedbackRequest, RankingConfig, RecommendationOrchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,pipeline=debug")),
        )
        .init();

    info!("Starting MindMatch orchestrator test harness");

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/catalog.json"));
    let catalog = TraitCatalog::from_json_file(&path)
        .with_context(|| format!("Failed to load catalog from {:?}", path))?;
    info!("Catalog loaded: {} entries", catalog.len());

    let orchestrator = RecommendationOrchestrator::new(
        Arc::new(catalog),
        Arc::new(InMemoryEventLedger::new()),
        Arc::new(InMemoryArmStore::new()),
        RankingConfig::default(),
    );

    let answers = [0.8, 0.3, 0.6, 0.7, 0.4, 0.5, 0.6, 0.2, 0.9];
    let response = orchestrator.recommend(&answers, Some("harness")).await?;

    info!(
        "{}: {}",
        response.profile.summary.archetype, response.profile.summary.text
    );
    for (i, rec) in response.recommendations.iter().enumerate() {
        info!(
            "{}. {} ({}) - Score: {:.3}",
            i + 1,
            rec.title,
            rec.year.map(|y| y.to_string()).unwrap_or_else(|| "????".to_string()),
            rec.score.unwrap_or_default()
        );
    }
    info!("Shown events: {}", response.shown_recorded);

    if let Some(top) = response.recommendations.first() {
        let feedback = orchestrator
            .record_feedback(FeedbackRequest::new(
                Some("harness"),
                top.id.clone(),
                EventType::Click,
            ))
            .await?;
        info!(
            "Click on {} recorded: event {}, bandit {}",
            top.title, feedback.recorded, feedback.bandit
        );
    }

    Ok(())
}
