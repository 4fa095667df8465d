//! Matching engine façade
//!
//! Wires the taxonomy snapshot, embedding provider, vector index, gap
//! analyzer, scorer, and ranking cache over read-only data sources. Both
//! public operations are pure with respect to caller-visible state: profiles
//! and roles are never mutated, every call returns fresh values.

use crate::cache::{CacheKey, RankingCache};
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, ResilientEmbedder, RetryPolicy};
use crate::error::Result;
use crate::index::VectorIndex;
use crate::matching::gap::GapAnalyzer;
use crate::matching::profile::{
    CompatibilityScore, Fingerprint, GapReport, JobId, Profile, ProfileId, RawProfile,
};
use crate::matching::scorer::CompatibilityScorer;
use crate::source::{ProfileSource, RoleSource};
use crate::taxonomy::TaxonomySnapshot;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct MatchEngine {
    taxonomy: Arc<TaxonomySnapshot>,
    embedder: ResilientEmbedder,
    index: VectorIndex,
    analyzer: GapAnalyzer,
    scorer: CompatibilityScorer,
    cache: RankingCache,
    profiles: Arc<dyn ProfileSource>,
    roles: Arc<dyn RoleSource>,
    /// Profile embeddings keyed by fingerprint; a content change lands on a
    /// new fingerprint, so stale embeddings are never reused.
    profile_embeddings: Mutex<HashMap<Fingerprint, Arc<Vec<f32>>>>,
    last_purged_version: AtomicU64,
}

impl MatchEngine {
    /// Construct the engine. All configuration problems (unknown metric,
    /// weights not summing to 1.0, zero dimensions) are rejected here.
    pub fn new(
        config: &Config,
        taxonomy: Arc<TaxonomySnapshot>,
        provider: Arc<dyn EmbeddingProvider>,
        profiles: Arc<dyn ProfileSource>,
        roles: Arc<dyn RoleSource>,
    ) -> Result<Self> {
        config.validate()?;

        let metric = config.metric()?;
        let scorer = CompatibilityScorer::new(
            config.scorer_weights(),
            config.scoring.experience_decay_per_year,
            config.scoring.experience_floor,
        )?;
        let policy = RetryPolicy {
            max_attempts: config.provider.max_retries,
            base_backoff: config.provider_backoff(),
            timeout: config.provider_timeout(),
        };

        Ok(Self {
            taxonomy,
            embedder: ResilientEmbedder::new(provider, policy),
            index: VectorIndex::new(metric, config.index.exact_search_limit),
            analyzer: GapAnalyzer::new(config.taxonomy.max_level_scale),
            scorer,
            cache: RankingCache::new(config.cache_ttl()),
            profiles,
            roles,
            profile_embeddings: Mutex::new(HashMap::new()),
            last_purged_version: AtomicU64::new(0),
        })
    }

    pub fn taxonomy(&self) -> &TaxonomySnapshot {
        &self.taxonomy
    }

    /// Resolve a caller-supplied raw profile against the engine's taxonomy.
    pub fn resolve_profile(&self, raw: &RawProfile) -> Profile {
        raw.resolve(&self.taxonomy)
    }

    /// Embed every role in the corpus into the vector index. Call after
    /// corpus changes; already-indexed roles are re-embedded and replaced.
    pub async fn sync_jobs(&self) -> Result<usize> {
        let ids = self.roles.list_role_ids().await?;
        for id in &ids {
            let role = self.roles.fetch_role(id).await?;
            role.validate()?;
            let vector = self
                .embedder
                .embed(&role.embedding_text(&self.taxonomy))
                .await?;
            self.index.upsert(id.0.clone(), vector)?;
        }
        info!(
            "indexed {} roles at corpus version {}",
            ids.len(),
            self.roles.corpus_version()
        );
        Ok(ids.len())
    }

    pub fn remove_job(&self, id: &JobId) -> bool {
        self.index.remove(&id.0)
    }

    /// Skill-gap report for one (profile, role) pair.
    pub async fn compute_gap_report(
        &self,
        profile_id: &ProfileId,
        role_id: &JobId,
    ) -> Result<GapReport> {
        let profile = self.profiles.fetch_profile(profile_id).await?;
        profile.validate()?;
        let role = self.roles.fetch_role(role_id).await?;
        role.validate()?;
        Ok(self.analyzer.analyze(&profile, &role))
    }

    /// Rank the k most compatible jobs for a profile, descending by score;
    /// equal scores order by ascending job identifier. Results are cached
    /// per (fingerprint, corpus version, k) with single-flight computation.
    pub async fn rank_jobs(
        &self,
        profile_id: &ProfileId,
        k: usize,
    ) -> Result<Vec<CompatibilityScore>> {
        let profile = self.profiles.fetch_profile(profile_id).await?;
        profile.validate()?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let corpus_version = self.roles.corpus_version();
        self.maybe_purge(corpus_version);

        let key = CacheKey {
            fingerprint: profile.fingerprint(),
            corpus_version,
            k,
        };
        let ranking = self
            .cache
            .get_or_compute(key, || self.compute_ranking(&profile, k))
            .await?;
        Ok(ranking.as_ref().clone())
    }

    async fn compute_ranking(
        &self,
        profile: &Profile,
        k: usize,
    ) -> Result<Vec<CompatibilityScore>> {
        let embedding = self.profile_embedding(profile).await?;
        let neighbors = self.index.query(&embedding, k)?;
        debug!(
            "profile {} matched {} candidates",
            profile.id,
            neighbors.len()
        );

        let mut scores = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            let job_id = JobId(neighbor.id.clone());
            let role = self.roles.fetch_role(&job_id).await?;
            let gap_report = self.analyzer.analyze(profile, &role);
            let normalized = self.index.metric().normalize(neighbor.distance);
            scores.push(self.scorer.score(
                &job_id,
                normalized,
                &gap_report,
                profile.years_experience,
                &role.seniority,
            ));
        }

        scores.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.job.cmp(&b.job))
        });
        Ok(scores)
    }

    async fn profile_embedding(&self, profile: &Profile) -> Result<Arc<Vec<f32>>> {
        let fingerprint = profile.fingerprint();
        if let Some(cached) = self.profile_embeddings.lock().get(&fingerprint) {
            return Ok(Arc::clone(cached));
        }

        let vector = Arc::new(
            self.embedder
                .embed(&profile.embedding_text(&self.taxonomy))
                .await?,
        );
        self.profile_embeddings
            .lock()
            .insert(fingerprint, Arc::clone(&vector));
        Ok(vector)
    }

    fn maybe_purge(&self, corpus_version: u64) {
        let seen = self.last_purged_version.swap(corpus_version, Ordering::SeqCst);
        if seen != corpus_version {
            self.cache.purge_stale(corpus_version);
        }
    }

    pub fn cached_rankings(&self) -> usize {
        self.cache.len()
    }
}
