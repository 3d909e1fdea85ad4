//! # Recommendation Orchestrator
//!
//! This module coordinates the recommend and feedback flows:
//! 1. Derive the user trait vector and profile summary from quiz answers
//! 2. Retrieve a raw candidate pool (with a timeout and one degraded retry)
//! 3. Normalize, deduplicate and bound the pool
//! 4. Look up the session's recently seen items
//! 5. Optionally fold the bandit's UCB score into relevance
//! 6. Rerank with MMR on the blocking pool
//! 7. Enrich items missing display metadata
//! 8. Record one `shown` event per returned item
//!
//! Feedback appends an event and updates the bandit arm of the item, using
//! the feature context of the item's latest `shown` event when the client
//! sends none.
//!
//! All collaborators live in the orchestrator, which is built once at
//! startup and cloned cheaply into each request.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use bandit::{ArmStore, LinUcb};
use catalog::{needs_enrichment, Candidate, CatalogRetriever, Enricher, ItemId, RawCandidate};
use ledger::{Event, EventLedger, EventType, FeatureContext};
use pipeline::filters::{DedupFilter, PoolLimitFilter};
use pipeline::{context_vector, context_vectors, normalize, FilterPipeline, MmrReranker, RankContext};
use taste::{answers_to_traits, summarize, ProfileSummary, TraitVector};

use crate::config::RankingConfig;
use crate::error::RecommendError;
use crate::outcome::StepOutcome;

/// Algorithm tag reported with every recommendation response
pub const ALGORITHM: &str = "trait_cosine_mmr_v2";

/// Session id used when the client sends none
pub const ANONYMOUS_SESSION: &str = "anon";

/// The user's derived profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub traits: TraitVector,
    pub summary: ProfileSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub profile: Profile,
    pub recommendations: Vec<Candidate>,
    pub session_id: String,
    pub algorithm: String,
    pub enrichment: StepOutcome,
    pub shown_recorded: StepOutcome,
}

/// One feedback action from a client
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub item_id: ItemId,
    pub event_type: EventType,
    /// Explicit reward; the event type's default is used when absent
    #[serde(default)]
    pub reward: Option<f64>,
    #[serde(default)]
    pub context: Option<FeatureContext>,
}

impl FeedbackRequest {
    pub fn new(session_id: Option<&str>, item_id: impl Into<ItemId>, event_type: EventType) -> Self {
        Self {
            session_id: session_id.map(str::to_string),
            item_id: item_id.into(),
            event_type,
            reward: None,
            context: None,
        }
    }

    pub fn with_reward(mut self, reward: f64) -> Self {
        self.reward = Some(reward);
        self
    }

    pub fn with_context(mut self, context: FeatureContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Acknowledgement of a feedback action
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackResponse {
    pub event_id: Uuid,
    pub session_id: String,
    pub reward: f64,
    pub recorded: StepOutcome,
    pub bandit: StepOutcome,
}

/// Main orchestrator that coordinates the ranking pipeline
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<dyn CatalogRetriever>,
    enricher: Option<Arc<dyn Enricher>>,
    ledger: Arc<dyn EventLedger>,
    bandit: Arc<LinUcb>,
    filter_pipeline: Arc<FilterPipeline>,
    config: RankingConfig,
}

fn resolve_session(session_id: Option<&str>) -> String {
    session_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS_SESSION)
        .to_string()
}

impl RecommendationOrchestrator {
    /// Create an orchestrator with all components initialized
    ///
    /// # Arguments
    /// * `catalog` - Retrieval collaborator producing the raw pool
    /// * `ledger` - Event log for shown and feedback events
    /// * `arm_store` - Persistence for bandit arms
    /// * `config` - Ranking parameters
    pub fn new(
        catalog: Arc<dyn CatalogRetriever>,
        ledger: Arc<dyn EventLedger>,
        arm_store: Arc<dyn ArmStore>,
        config: RankingConfig,
    ) -> Self {
        let bandit = LinUcb::new(arm_store)
            .with_alpha(config.bandit_alpha)
            .with_max_retries(config.update_max_retries);
        let filter_pipeline = FilterPipeline::new()
            .add_filter(DedupFilter)
            .add_filter(PoolLimitFilter::new(config.pool_limit));

        Self {
            catalog,
            enricher: None,
            ledger,
            bandit: Arc::new(bandit),
            filter_pipeline: Arc::new(filter_pipeline),
            config,
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn bandit(&self) -> &LinUcb {
        &self.bandit
    }

    /// Main entry point: recommendations for one set of quiz answers
    ///
    /// # Arguments
    /// * `answers` - Nine quiz answers, unit, 1-5 or percentage scale
    /// * `session_id` - Client session; `"anon"` when absent
    ///
    /// # Errors
    /// `InvalidInput` for malformed answers, `CatalogUnavailable` when no
    /// candidate pool could be retrieved
    #[instrument(skip(self, answers))]
    pub async fn recommend(
        &self,
        answers: &[f64],
        session_id: Option<&str>,
    ) -> Result<RecommendResponse, RecommendError> {
        let start_time = Instant::now();

        let user = answers_to_traits(answers)?;
        let session_id = resolve_session(session_id);
        let summary = summarize(&user);

        let raw = self.retrieve(user).await?;
        info!("Retrieved {} raw candidates", raw.len());

        let seen = self.recently_seen(&session_id).await;
        let context = RankContext::new(user).with_seen(seen);

        let candidates: Vec<Candidate> = normalize(raw).collect();
        let mut pool = self.filter_pipeline.apply(candidates, &context)?;
        info!("Candidate pool after filters: {}", pool.len());

        if self.config.bandit_weight > 0.0 {
            self.fuse_bandit_scores(&mut pool, &user).await;
        }

        let selected = self.rerank(pool, context).await?;
        let (recommendations, enrichment) = self.enrich(selected).await;
        let shown_recorded = self.record_shown(&session_id, &user, &recommendations).await;

        info!(
            "Recommended {} items for session {} in {:.2?}",
            recommendations.len(),
            session_id,
            start_time.elapsed()
        );

        Ok(RecommendResponse {
            profile: Profile {
                traits: user,
                summary,
            },
            recommendations,
            session_id,
            algorithm: ALGORITHM.to_string(),
            enrichment,
            shown_recorded,
        })
    }

    /// Record a feedback event and update the item's bandit arm
    ///
    /// The event is appended even when the bandit update is skipped or fails.
    #[instrument(skip(self, request), fields(item_id = %request.item_id))]
    pub async fn record_feedback(
        &self,
        request: FeedbackRequest,
    ) -> Result<FeedbackResponse, RecommendError> {
        if request.item_id.as_str().trim().is_empty() {
            return Err(RecommendError::InvalidInput("item id is empty".to_string()));
        }
        if request.reward.is_some_and(|r| !r.is_finite()) {
            return Err(RecommendError::InvalidInput("reward is not a finite number".to_string()));
        }

        let session_id = resolve_session(request.session_id.as_deref());
        let context = match request.context {
            Some(context) => Some(context),
            None => self.shown_context(&session_id, &request.item_id).await,
        };

        let mut event = Event::new(&session_id, request.item_id.clone(), request.event_type);
        if let Some(reward) = request.reward {
            event = event.with_reward(reward);
        }
        if let Some(context) = context {
            event = event.with_context(context);
        }
        let (event_id, reward) = (event.id, event.reward);

        let recorded = match self.ledger.append(event).await {
            Ok(()) => StepOutcome::Succeeded,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Failed to record feedback event");
                StepOutcome::failed(e)
            }
        };

        let bandit = match context {
            None => StepOutcome::skipped("no feature context for this item in the session"),
            Some(context) => {
                let x = context_vector(&context.user, &context.item);
                match self.bandit.update(&request.item_id, &x, reward).await {
                    Ok(update) => {
                        debug!(version = update.version, retries = update.retries, "Bandit arm updated");
                        StepOutcome::Succeeded
                    }
                    Err(e) => {
                        warn!(error = %e, "Bandit update failed");
                        StepOutcome::failed(e)
                    }
                }
            }
        };

        info!(
            "Feedback {} for item {} (reward {:.2}): event {}, bandit {}",
            request.event_type, request.item_id, reward, recorded, bandit
        );

        Ok(FeedbackResponse {
            event_id,
            session_id,
            reward,
            recorded,
            bandit,
        })
    }

    /// Fetch the raw pool, retrying once with a narrower scan on timeout or error
    async fn retrieve(&self, user: TraitVector) -> Result<Vec<RawCandidate>, RecommendError> {
        let timeout = self.config.retrieval_timeout();
        let limit = self.config.pool_limit;

        let first = tokio::time::timeout(
            timeout,
            self.catalog.top_matches(user, limit, self.config.prefilter),
        )
        .await;
        match first {
            Ok(Ok(raw)) => return Ok(raw),
            Ok(Err(e)) => warn!(catalog = self.catalog.name(), error = %e, "Retrieval failed"),
            Err(_) => warn!(catalog = self.catalog.name(), ?timeout, "Retrieval timed out"),
        }

        let reduced = (self.config.prefilter / 4).max(limit);
        info!("Retrying retrieval with prefilter {}", reduced);
        match tokio::time::timeout(timeout, self.catalog.top_matches(user, limit, reduced)).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) => Err(RecommendError::CatalogUnavailable(e.to_string())),
            Err(_) => Err(RecommendError::CatalogUnavailable(format!(
                "retrieval timed out after {timeout:?}"
            ))),
        }
    }

    async fn recently_seen(&self, session_id: &str) -> HashSet<ItemId> {
        match self
            .ledger
            .recent_item_ids(session_id, self.config.seen_lookback())
            .await
        {
            Ok(ids) => {
                debug!("Session {} has {} recently seen items", session_id, ids.len());
                ids
            }
            Err(e) => {
                warn!(session_id, error = %e, "Seen lookup failed, ranking without penalty");
                HashSet::new()
            }
        }
    }

    /// Blend relevance with the bandit's UCB score.
    ///
    /// A failed score read contributes no exploration bonus.
    async fn fuse_bandit_scores(&self, pool: &mut [Candidate], user: &TraitVector) {
        let weight = self.config.bandit_weight;
        let contexts = context_vectors(user, pool);

        for (candidate, (item_id, x)) in pool.iter_mut().zip(contexts) {
            let relevance = candidate
                .score
                .unwrap_or_else(|| user.similarity(&candidate.traits));
            let ucb = match self.bandit.score(&item_id, &x).await {
                Ok(ucb) => ucb,
                Err(e) => {
                    warn!(item_id = %item_id, error = %e, "Bandit score unavailable");
                    0.0
                }
            };
            candidate.score = Some((1.0 - weight) * relevance + weight * ucb);
        }
        debug!("Fused bandit scores into {} candidates (weight {})", pool.len(), weight);
    }

    /// Run MMR on the blocking pool; it is CPU-only and quadratic in pool size
    async fn rerank(
        &self,
        pool: Vec<Candidate>,
        context: RankContext,
    ) -> Result<Vec<Candidate>, RecommendError> {
        let mut reranker = MmrReranker::new(self.config.k, self.config.mmr_lambda)
            .with_seen_penalty(self.config.seen_penalty)
            .with_jitter(self.config.jitter);
        if let Some(seed) = self.config.jitter_seed {
            reranker = reranker.with_seed(seed);
        }

        tokio::task::spawn_blocking(move || reranker.select(pool, &context))
            .await
            .map_err(|e| RecommendError::Internal(anyhow!("Reranking task failed: {e}")))
    }

    async fn enrich(&self, selected: Vec<Candidate>) -> (Vec<Candidate>, StepOutcome) {
        let Some(enricher) = &self.enricher else {
            return (selected, StepOutcome::skipped("no enricher configured"));
        };

        let mut attempted = 0;
        let mut failures = Vec::new();
        let mut enriched = Vec::with_capacity(selected.len());

        for candidate in selected {
            if !needs_enrichment(&candidate) {
                enriched.push(candidate);
                continue;
            }
            attempted += 1;
            match enricher.enrich(&candidate).await {
                Ok(mut filled) => {
                    // Ranking output is not the enricher's to change
                    filled.id = candidate.id;
                    filled.score = candidate.score;
                    enriched.push(filled);
                }
                Err(e) => {
                    warn!(item_id = %candidate.id, error = %e, "Enrichment failed, keeping original");
                    failures.push(format!("{}: {}", candidate.id, e));
                    enriched.push(candidate);
                }
            }
        }

        let outcome = if attempted == 0 {
            StepOutcome::skipped("all items have display metadata")
        } else if failures.is_empty() {
            StepOutcome::Succeeded
        } else {
            StepOutcome::failed(failures.join("; "))
        };
        (enriched, outcome)
    }

    async fn record_shown(
        &self,
        session_id: &str,
        user: &TraitVector,
        items: &[Candidate],
    ) -> StepOutcome {
        if items.is_empty() {
            return StepOutcome::skipped("nothing was shown");
        }

        let events: Vec<Event> = items
            .iter()
            .map(|c| {
                Event::shown(
                    session_id,
                    c.id.clone(),
                    FeatureContext {
                        user: *user,
                        item: c.traits,
                    },
                )
            })
            .collect();

        match self.ledger.append_all(events).await {
            Ok(count) => {
                debug!("Recorded {} shown events for session {}", count, session_id);
                StepOutcome::Succeeded
            }
            Err(e) => {
                warn!(session_id, error = %e, "Failed to record shown events");
                StepOutcome::failed(e)
            }
        }
    }

    async fn shown_context(&self, session_id: &str, item: &ItemId) -> Option<FeatureContext> {
        match self.ledger.latest_context(session_id, item).await {
            Ok(context) => context,
            Err(e) => {
                warn!(session_id, item_id = %item, error = %e, "Context lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bandit::{ArmRecord, InMemoryArmStore, StoreError, StoreResult, SwapOutcome, VersionedRecord};
    use catalog::{CatalogError, PosterTable, RawId};
    use chrono::{DateTime, Utc};
    use ledger::{InMemoryEventLedger, LedgerError};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    const ANSWERS: [f64; 9] = [0.8, 0.3, 0.6, 0.7, 0.4, 0.5, 0.6, 0.2, 0.9];

    // Mock catalog for testing
    struct MockCatalog {
        pool: Vec<RawCandidate>,
        slow_prefilter: Option<usize>,
        fail: bool,
        prefilters: Mutex<Vec<usize>>,
    }

    impl MockCatalog {
        fn new(size: usize) -> Self {
            Self {
                pool: create_test_pool(size),
                slow_prefilter: None,
                fail: false,
                prefilters: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<usize> {
            self.prefilters.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogRetriever for MockCatalog {
        async fn top_matches(
            &self,
            _user: TraitVector,
            limit: usize,
            prefilter: usize,
        ) -> catalog::Result<Vec<RawCandidate>> {
            self.prefilters.lock().unwrap().push(prefilter);
            if self.fail {
                return Err(CatalogError::Unavailable("index offline".to_string()));
            }
            if self.slow_prefilter == Some(prefilter) {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Ok(self.pool.iter().take(limit).cloned().collect())
        }

        fn name(&self) -> &str {
            "MockCatalog"
        }
    }

    struct FailingLedger;

    fn offline() -> LedgerError {
        LedgerError::Io {
            path: PathBuf::from("/unavailable/events.jsonl"),
            source: std::io::Error::other("ledger offline"),
        }
    }

    #[async_trait]
    impl EventLedger for FailingLedger {
        async fn append(&self, _event: Event) -> ledger::Result<()> {
            Err(offline())
        }

        async fn session_events(
            &self,
            _session_id: &str,
            _since: DateTime<Utc>,
        ) -> ledger::Result<Vec<Event>> {
            Err(offline())
        }

        fn name(&self) -> &str {
            "FailingLedger"
        }
    }

    struct FailingArmStore;

    #[async_trait]
    impl ArmStore for FailingArmStore {
        async fn load(&self, _item: &ItemId) -> StoreResult<Option<VersionedRecord>> {
            Err(StoreError::Unavailable("arm store offline".to_string()))
        }

        async fn compare_and_swap(
            &self,
            _item: &ItemId,
            _expected: Option<u64>,
            _record: ArmRecord,
        ) -> StoreResult<SwapOutcome> {
            Err(StoreError::Unavailable("arm store offline".to_string()))
        }

        fn name(&self) -> &str {
            "FailingArmStore"
        }
    }

    struct FailingEnricher;

    #[async_trait]
    impl Enricher for FailingEnricher {
        async fn enrich(&self, _candidate: &Candidate) -> catalog::Result<Candidate> {
            Err(CatalogError::Unavailable("poster service down".to_string()))
        }

        fn name(&self) -> &str {
            "FailingEnricher"
        }
    }

    fn create_test_pool(size: usize) -> Vec<RawCandidate> {
        (0..size)
            .map(|i| {
                let values: Vec<f64> = (0..9).map(|d| ((i * 7 + d * 3) % 11) as f64 / 10.0).collect();
                RawCandidate {
                    id: Some(RawId::Number(1000 + i as u64)),
                    title: Some(format!("Movie {i}")),
                    year: Some(1980 + (i % 40) as i32),
                    traits: Some(TraitVector::from_slice(&values)),
                    match_score: Some(0.95 - i as f64 * 0.005),
                    ..Default::default()
                }
            })
            .collect()
    }

    fn test_config() -> RankingConfig {
        RankingConfig {
            jitter: 0.0,
            jitter_seed: Some(1),
            retrieval_timeout_ms: 100,
            ..Default::default()
        }
    }

    fn create_orchestrator(
        catalog: Arc<MockCatalog>,
        ledger: Arc<dyn EventLedger>,
        config: RankingConfig,
    ) -> RecommendationOrchestrator {
        RecommendationOrchestrator::new(catalog, ledger, Arc::new(InMemoryArmStore::new()), config)
    }

    #[tokio::test]
    async fn test_recommend_end_to_end() {
        let ledger = Arc::new(InMemoryEventLedger::new());
        let orchestrator =
            create_orchestrator(Arc::new(MockCatalog::new(120)), ledger.clone(), test_config());

        let response = orchestrator.recommend(&ANSWERS, None).await.unwrap();

        assert_eq!(response.session_id, ANONYMOUS_SESSION);
        assert_eq!(response.algorithm, ALGORITHM);
        assert_eq!(response.recommendations.len(), 6);
        let unique: HashSet<_> = response.recommendations.iter().map(|c| c.id.clone()).collect();
        assert_eq!(unique.len(), 6);
        for c in &response.recommendations {
            let score = c.score.unwrap();
            assert!((0.0..=1.0).contains(&score));
        }

        assert!(!response.profile.summary.text.is_empty());
        assert_eq!(response.shown_recorded, StepOutcome::Succeeded);
        assert!(matches!(response.enrichment, StepOutcome::Skipped { .. }));
        assert_eq!(ledger.len().await, 6);
    }

    #[tokio::test]
    async fn test_invalid_answers_rejected_before_retrieval() {
        let catalog = Arc::new(MockCatalog::new(10));
        let orchestrator = create_orchestrator(
            catalog.clone(),
            Arc::new(InMemoryEventLedger::new()),
            test_config(),
        );

        let result = orchestrator.recommend(&[0.5, 0.5, 0.5], Some("s1")).await;
        assert!(matches!(result, Err(RecommendError::InvalidInput(_))));
        assert!(catalog.calls().is_empty());
    }

    #[tokio::test]
    async fn test_repeat_request_demotes_shown_items() {
        let orchestrator = create_orchestrator(
            Arc::new(MockCatalog::new(80)),
            Arc::new(InMemoryEventLedger::new()),
            test_config(),
        );

        let first = orchestrator.recommend(&ANSWERS, Some("s1")).await.unwrap();
        let shown: HashSet<_> = first.recommendations.iter().map(|c| c.id.clone()).collect();

        let second = orchestrator.recommend(&ANSWERS, Some("s1")).await.unwrap();
        assert!(!shown.contains(&second.recommendations[0].id));

        // Another session is unaffected
        let other = orchestrator.recommend(&ANSWERS, Some("s2")).await.unwrap();
        assert_eq!(other.recommendations[0].id, first.recommendations[0].id);
    }

    #[tokio::test]
    async fn test_retrieval_timeout_retries_with_smaller_prefilter() {
        let mut catalog = MockCatalog::new(80);
        catalog.slow_prefilter = Some(3000);
        let catalog = Arc::new(catalog);
        let orchestrator = create_orchestrator(
            catalog.clone(),
            Arc::new(InMemoryEventLedger::new()),
            test_config(),
        );

        let response = orchestrator.recommend(&ANSWERS, None).await.unwrap();
        assert_eq!(response.recommendations.len(), 6);
        assert_eq!(catalog.calls(), vec![3000, 750]);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_reported() {
        let mut catalog = MockCatalog::new(80);
        catalog.fail = true;
        let catalog = Arc::new(catalog);
        let orchestrator = create_orchestrator(
            catalog.clone(),
            Arc::new(InMemoryEventLedger::new()),
            test_config(),
        );

        let result = orchestrator.recommend(&ANSWERS, None).await;
        assert!(matches!(result, Err(RecommendError::CatalogUnavailable(_))));
        assert_eq!(catalog.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_ledger_outage_does_not_fail_request() {
        let orchestrator = create_orchestrator(
            Arc::new(MockCatalog::new(80)),
            Arc::new(FailingLedger),
            test_config(),
        );

        let response = orchestrator.recommend(&ANSWERS, Some("s1")).await.unwrap();
        assert_eq!(response.recommendations.len(), 6);
        assert!(response.shown_recorded.is_failure());

        let feedback = orchestrator
            .record_feedback(FeedbackRequest::new(Some("s1"), "1000", EventType::Click))
            .await
            .unwrap();
        assert!(feedback.recorded.is_failure());
        assert!(matches!(feedback.bandit, StepOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_enrichment_fills_missing_posters() {
        let table = (0..80).fold(PosterTable::new(), |table, i| {
            table.with_poster((1000 + i).to_string(), format!("https://img/{i}.jpg"))
        });
        let orchestrator = create_orchestrator(
            Arc::new(MockCatalog::new(80)),
            Arc::new(InMemoryEventLedger::new()),
            test_config(),
        )
        .with_enricher(Arc::new(table));

        let response = orchestrator.recommend(&ANSWERS, None).await.unwrap();
        assert_eq!(response.enrichment, StepOutcome::Succeeded);
        for c in &response.recommendations {
            assert!(c.metadata.poster_url.is_some());
        }
    }

    #[tokio::test]
    async fn test_enrichment_failure_keeps_original_items() {
        let orchestrator = create_orchestrator(
            Arc::new(MockCatalog::new(80)),
            Arc::new(InMemoryEventLedger::new()),
            test_config(),
        )
        .with_enricher(Arc::new(FailingEnricher));

        let response = orchestrator.recommend(&ANSWERS, None).await.unwrap();
        assert!(response.enrichment.is_failure());
        assert_eq!(response.recommendations.len(), 6);
        assert!(response.recommendations.iter().all(|c| c.metadata.poster_url.is_none()));
    }

    #[tokio::test]
    async fn test_feedback_uses_shown_context() {
        let orchestrator = create_orchestrator(
            Arc::new(MockCatalog::new(80)),
            Arc::new(InMemoryEventLedger::new()),
            test_config(),
        );

        let response = orchestrator.recommend(&ANSWERS, Some("s1")).await.unwrap();
        let item = response.recommendations[0].id.clone();

        let feedback = orchestrator
            .record_feedback(FeedbackRequest::new(Some("s1"), item.clone(), EventType::Save))
            .await
            .unwrap();

        assert_eq!(feedback.session_id, "s1");
        assert_eq!(feedback.reward, 0.6);
        assert_eq!(feedback.recorded, StepOutcome::Succeeded);
        assert_eq!(feedback.bandit, StepOutcome::Succeeded);

        let arm = orchestrator.bandit().state(&item).await.unwrap();
        assert!(arm.b().iter().any(|v| *v > 0.0));
    }

    #[tokio::test]
    async fn test_feedback_without_context_skips_bandit() {
        let ledger = Arc::new(InMemoryEventLedger::new());
        let orchestrator =
            create_orchestrator(Arc::new(MockCatalog::new(10)), ledger.clone(), test_config());

        let feedback = orchestrator
            .record_feedback(FeedbackRequest::new(None, "999", EventType::Click))
            .await
            .unwrap();

        assert_eq!(feedback.session_id, ANONYMOUS_SESSION);
        assert_eq!(feedback.reward, 0.2);
        assert_eq!(feedback.recorded, StepOutcome::Succeeded);
        assert!(matches!(feedback.bandit, StepOutcome::Skipped { .. }));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_feedback_with_explicit_context_and_reward() {
        let orchestrator = create_orchestrator(
            Arc::new(MockCatalog::new(10)),
            Arc::new(InMemoryEventLedger::new()),
            test_config(),
        );
        let context = FeatureContext {
            user: TraitVector::neutral(),
            item: TraitVector::neutral(),
        };

        let feedback = orchestrator
            .record_feedback(
                FeedbackRequest::new(Some("s1"), "42", EventType::Finish)
                    .with_reward(3.0)
                    .with_context(context),
            )
            .await
            .unwrap();

        // Rewards are clamped to [-1, 1]
        assert_eq!(feedback.reward, 1.0);
        assert_eq!(feedback.bandit, StepOutcome::Succeeded);
    }

    #[tokio::test]
    async fn test_feedback_rejects_bad_input() {
        let orchestrator = create_orchestrator(
            Arc::new(MockCatalog::new(10)),
            Arc::new(InMemoryEventLedger::new()),
            test_config(),
        );

        let empty = orchestrator
            .record_feedback(FeedbackRequest::new(None, "  ", EventType::Click))
            .await;
        assert!(matches!(empty, Err(RecommendError::InvalidInput(_))));

        let nan = orchestrator
            .record_feedback(FeedbackRequest::new(None, "1", EventType::Click).with_reward(f64::NAN))
            .await;
        assert!(matches!(nan, Err(RecommendError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_bandit_weight_scores_every_candidate() {
        let store = Arc::new(InMemoryArmStore::new());
        let config = RankingConfig {
            bandit_weight: 0.3,
            ..test_config()
        };
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(MockCatalog::new(80)),
            Arc::new(InMemoryEventLedger::new()),
            store.clone(),
            config,
        );

        let response = orchestrator.recommend(&ANSWERS, None).await.unwrap();
        assert_eq!(response.recommendations.len(), 6);
        for c in &response.recommendations {
            assert!((0.0..=1.0).contains(&c.score.unwrap()));
        }
        // Every pooled item got an arm on first scoring
        assert_eq!(store.len().await, 80);
    }

    #[tokio::test]
    async fn test_arm_store_outage_ranks_without_exploration_bonus() {
        let config = RankingConfig {
            bandit_weight: 0.5,
            ..test_config()
        };
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(MockCatalog::new(80)),
            Arc::new(InMemoryEventLedger::new()),
            Arc::new(FailingArmStore),
            config,
        );

        let response = orchestrator.recommend(&ANSWERS, None).await.unwrap();
        assert_eq!(response.recommendations.len(), 6);

        // UCB counts as 0, so the top item is the most relevant at half weight
        let top = &response.recommendations[0];
        assert_eq!(top.id, ItemId::new("1000"));
        assert!((top.score.unwrap() - 0.5 * 0.95).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_arm_store_outage_fails_only_the_bandit_step() {
        let ledger = Arc::new(InMemoryEventLedger::new());
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(MockCatalog::new(10)),
            ledger.clone(),
            Arc::new(FailingArmStore),
            test_config(),
        );
        let context = FeatureContext {
            user: TraitVector::neutral(),
            item: TraitVector::neutral(),
        };

        let feedback = orchestrator
            .record_feedback(
                FeedbackRequest::new(Some("s1"), "42", EventType::Click).with_context(context),
            )
            .await
            .unwrap();

        assert_eq!(feedback.recorded, StepOutcome::Succeeded);
        assert!(feedback.bandit.is_failure());
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_oversized_lookback_does_not_fail_request() {
        let config = RankingConfig {
            seen_lookback_days: 100_000_000,
            ..test_config()
        };
        let orchestrator = create_orchestrator(
            Arc::new(MockCatalog::new(80)),
            Arc::new(InMemoryEventLedger::new()),
            config,
        );

        let first = orchestrator.recommend(&[0.5; 9], Some("s")).await.unwrap();
        let second = orchestrator.recommend(&[0.5; 9], Some("s")).await.unwrap();
        assert_eq!(second.recommendations.len(), 6);
        assert_ne!(second.recommendations[0].id, first.recommendations[0].id);
    }
}
