use anyhow::{Context, Result};
use bandit::{ArmStore, FileArmStore, InMemoryArmStore};
use catalog::{CatalogRetriever, TraitCatalog};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use ledger::{EventLedger, EventType, InMemoryEventLedger, JsonlEventLedger};
use server::{
    FeedbackRequest, RankingConfig, RecommendResponse, RecommendationOrchestrator, StepOutcome,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use taste::{answers_to_traits, parse_answers, summarize, Trait};
use tokio::sync::Semaphore;
use tracing::info;

/// MindMatch - quiz-driven movie ranking
#[derive(Parser)]
#[command(name = "mindmatch")]
#[command(about = "Personality-driven movie recommendations with MMR and LinUCB", long_about = None)]
struct Cli {
    /// Path to the JSON catalog file
    #[arg(long, default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// Directory for persistent state (events.jsonl, arms.json); in-memory when omitted
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Ranking config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank movies for a set of quiz answers
    Recommend {
        /// Nine comma-separated answers (0-1, 1-5 or 0-100 scale)
        #[arg(long)]
        answers: String,

        #[arg(long)]
        session: Option<String>,

        /// Number of recommendations
        #[arg(long)]
        k: Option<usize>,

        /// Relevance/diversity trade-off
        #[arg(long)]
        lambda: Option<f64>,

        /// Jitter seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record feedback on a recommended item
    Feedback {
        #[arg(long)]
        session: Option<String>,

        #[arg(long)]
        item: String,

        /// click, save, finish or dismiss
        #[arg(long)]
        event: EventType,

        /// Explicit reward in [-1, 1]; defaults by event type
        #[arg(long, allow_hyphen_values = true)]
        reward: Option<f64>,
    },

    /// Show the trait profile for a set of quiz answers
    Profile {
        #[arg(long)]
        answers: String,
    },

    /// Run concurrent recommend requests and report latency
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of requests in flight at once
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recommend {
            ref answers,
            ref session,
            k,
            lambda,
            seed,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(k) = k {
                config.k = k;
            }
            if let Some(lambda) = lambda {
                config.mmr_lambda = lambda;
            }
            if seed.is_some() {
                config.jitter_seed = seed;
            }
            config.validate().context("Invalid ranking options")?;

            let catalog = load_catalog(&cli.catalog)?;
            let orchestrator = build_orchestrator(catalog, cli.state_dir.as_deref(), config)?;
            handle_recommend(&orchestrator, answers, session.as_deref(), json).await?
        }
        Commands::Feedback {
            ref session,
            ref item,
            event,
            reward,
        } => {
            let config = load_config(cli.config.as_deref())?;
            // Feedback never retrieves, so an empty catalog is enough
            let catalog = Arc::new(TraitCatalog::from_entries(Vec::new()));
            let orchestrator = build_orchestrator(catalog, cli.state_dir.as_deref(), config)?;
            handle_feedback(&orchestrator, session.as_deref(), item, event, reward).await?
        }
        Commands::Profile { ref answers } => handle_profile(answers)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let catalog = load_catalog(&cli.catalog)?;
            let orchestrator = build_orchestrator(catalog, cli.state_dir.as_deref(), config)?;
            handle_benchmark(orchestrator, requests, concurrent).await?
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RankingConfig> {
    match path {
        Some(path) => RankingConfig::from_file(path),
        None => Ok(RankingConfig::default()),
    }
}

fn load_catalog(path: &Path) -> Result<Arc<TraitCatalog>> {
    println!("Loading catalog from {}...", path.display());
    let start = Instant::now();
    let catalog = TraitCatalog::from_json_file(path).context("Failed to load catalog")?;
    println!(
        "{} Loaded {} titles in {:?}",
        "✓".green(),
        catalog.len(),
        start.elapsed()
    );
    Ok(Arc::new(catalog))
}

/// Wire the orchestrator to file-backed state under `state_dir`, or to
/// in-memory state when no directory is given
fn build_orchestrator(
    catalog: Arc<dyn CatalogRetriever>,
    state_dir: Option<&Path>,
    config: RankingConfig,
) -> Result<RecommendationOrchestrator> {
    let (ledger, arms): (Arc<dyn EventLedger>, Arc<dyn ArmStore>) = match state_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory {:?}", dir))?;
            let ledger = JsonlEventLedger::open(dir.join("events.jsonl"))
                .context("Failed to open event ledger")?;
            let arms =
                FileArmStore::open(dir.join("arms.json")).context("Failed to open arm store")?;
            info!("Using persistent state in {:?}", dir);
            (Arc::new(ledger), Arc::new(arms))
        }
        None => (
            Arc::new(InMemoryEventLedger::new()),
            Arc::new(InMemoryArmStore::new()),
        ),
    };

    Ok(RecommendationOrchestrator::new(catalog, ledger, arms, config))
}

/// Handle the 'recommend' command
async fn handle_recommend(
    orchestrator: &RecommendationOrchestrator,
    answers: &str,
    session: Option<&str>,
    json: bool,
) -> Result<()> {
    let answers = parse_answers(answers)?;
    let response = orchestrator.recommend(&answers, session).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_recommendations(&response);
    }
    Ok(())
}

/// Handle the 'feedback' command
async fn handle_feedback(
    orchestrator: &RecommendationOrchestrator,
    session: Option<&str>,
    item: &str,
    event: EventType,
    reward: Option<f64>,
) -> Result<()> {
    let mut request = FeedbackRequest::new(session, item, event);
    if let Some(reward) = reward {
        request = request.with_reward(reward);
    }

    let response = orchestrator.record_feedback(request).await?;

    println!(
        "{} {} on {} (session {}, reward {:+.2})",
        "✓".green(),
        event,
        item.bold(),
        response.session_id,
        response.reward
    );
    println!("  {} Event:  {}", step_marker(&response.recorded), response.recorded);
    println!("  {} Bandit: {}", step_marker(&response.bandit), response.bandit);
    Ok(())
}

fn step_marker(outcome: &StepOutcome) -> ColoredString {
    if outcome.is_success() {
        "•".green()
    } else if outcome.is_failure() {
        "•".red()
    } else {
        "•".yellow()
    }
}

/// Handle the 'profile' command
fn handle_profile(answers: &str) -> Result<()> {
    let traits = answers_to_traits(&parse_answers(answers)?)?;
    let summary = summarize(&traits);

    println!("{}", summary.archetype.bold().blue());
    println!("{}\n", summary.text);
    for t in Trait::ALL {
        let value = traits.get(t);
        let bar = "█".repeat((value * 20.0).round() as usize);
        println!("{:>10} {:.2} {}", t.name(), value, bar.green());
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    orchestrator: RecommendationOrchestrator,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    anyhow::ensure!(requests > 0, "requests must be positive");
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));

    let wall = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for i in 0..requests {
        // Random quiz answers per request
        let answers: Vec<f64> = (0..taste::DIMENSIONS).map(|_| rand::random::<f64>()).collect();
        let session = format!("bench-{i}");
        let orchestrator = orchestrator.clone();
        let permits = permits.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            orchestrator.recommend(&answers, Some(session.as_str())).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall.elapsed();

    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Nearest-rank percentile of sorted, non-empty timings
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let rank = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

fn print_recommendations(response: &RecommendResponse) {
    let summary = &response.profile.summary;
    println!("{}", summary.archetype.bold().blue());
    println!("{}\n", summary.text);

    println!("{}", "Recommendations:".bold().blue());
    for (i, movie) in response.recommendations.iter().enumerate() {
        println!(
            "{}. {} ({}) [{}] - Match: {:.2}",
            (i + 1).to_string().green(),
            movie.title,
            movie.year.map(|y| y.to_string()).unwrap_or_else(|| "????".to_string()),
            movie.metadata.genres.join(", "),
            movie.score.unwrap_or_default()
        );
        if !movie.metadata.providers.is_empty() {
            println!("   Watch on: {}", movie.metadata.providers.join(", "));
        }
    }

    println!(
        "\nSession {} | {} shown events {}",
        response.session_id.bold(),
        step_marker(&response.shown_recorded),
        response.shown_recorded
    );
}
