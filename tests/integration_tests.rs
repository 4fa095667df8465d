//! Integration tests for the matching engine

use async_trait::async_trait;
use career_match::config::Config;
use career_match::embedding::{EmbeddingProvider, HashEmbedder, ProviderError};
use career_match::matching::profile::{
    JobId, ProfileId, RawProfile, RawSkillMention, Role, SeniorityBand, SkillRequirement,
};
use career_match::matching::MatchEngine;
use career_match::source::{InMemorySource, ProfileSource};
use career_match::taxonomy::{SkillId, TaxonomySnapshot};
use career_match::EngineError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingProvider {
    inner: HashEmbedder,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new(dimension: usize) -> Self {
        Self {
            inner: HashEmbedder::new(dimension),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn version(&self) -> &str {
        "counting-1"
    }
}

fn raw_profile(id: &str, skills: &[(&str, u8, f32)], years: f32, goal: &str) -> RawProfile {
    RawProfile {
        id: ProfileId(id.to_string()),
        skills: skills
            .iter()
            .map(|(text, level, skill_years)| RawSkillMention {
                text: text.to_string(),
                level: *level,
                years: *skill_years,
            })
            .collect(),
        years_experience: years,
        goal: goal.to_string(),
    }
}

fn role(id: &str, title: &str, requirements: &[(&str, u8, f32)]) -> Role {
    Role {
        id: JobId(id.to_string()),
        title: title.to_string(),
        requirements: requirements
            .iter()
            .map(|(skill, level, weight)| SkillRequirement {
                skill: SkillId::new(*skill),
                min_level: *level,
                weight: *weight,
            })
            .collect(),
        seniority: SeniorityBand {
            min_years: 2.0,
            max_years: 6.0,
        },
        location: None,
    }
}

struct Fixture {
    engine: MatchEngine,
    source: Arc<InMemorySource>,
    provider: Arc<CountingProvider>,
}

async fn fixture_with_roles(roles: Vec<Role>) -> Fixture {
    let config = Config::default();
    let taxonomy = TaxonomySnapshot::with_default_catalog(0.8).unwrap();
    let source = Arc::new(InMemorySource::new());
    let provider = Arc::new(CountingProvider::new(config.provider.dimension));

    source.insert_profile(
        raw_profile(
            "dev-1",
            &[("Python", 4, 4.0), ("SQL", 3, 2.0)],
            4.0,
            "grow as a backend engineer working with python and databases",
        )
        .resolve(&taxonomy),
    );
    for r in roles {
        source.insert_role(r);
    }

    let engine = MatchEngine::new(
        &config,
        taxonomy,
        Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
        Arc::clone(&source) as Arc<dyn career_match::source::ProfileSource>,
        Arc::clone(&source) as Arc<dyn career_match::source::RoleSource>,
    )
    .unwrap();
    engine.sync_jobs().await.unwrap();

    Fixture {
        engine,
        source,
        provider,
    }
}

fn standard_roles() -> Vec<Role> {
    vec![
        role(
            "job-backend",
            "Backend Engineer",
            &[("python", 5, 0.6), ("sql", 3, 0.4)],
        ),
        role(
            "job-frontend",
            "Frontend Engineer",
            &[("javascript", 4, 0.7), ("react", 3, 0.5)],
        ),
        role(
            "job-data",
            "Data Engineer",
            &[("python", 3, 0.5), ("machine-learning", 4, 0.6)],
        ),
    ]
}

#[tokio::test]
async fn gap_report_matches_the_worked_example() {
    // Profile {Python: level 4, SQL: level 3} vs role requiring
    // {Python: 5 @ 0.6, SQL: 3 @ 0.4}: Python severity 0.6×(5−4)/5 = 0.12,
    // SQL satisfied, ordering [Python, SQL].
    let fixture = fixture_with_roles(standard_roles()).await;
    let report = fixture
        .engine
        .compute_gap_report(
            &ProfileId("dev-1".to_string()),
            &JobId("job-backend".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].skill, SkillId::new("python"));
    assert!((report.entries[0].severity - 0.12).abs() < 1e-6);
    assert_eq!(report.entries[1].skill, SkillId::new("sql"));
    assert_eq!(report.entries[1].severity, 0.0);

    for entry in &report.entries {
        assert!((0.0..=1.0).contains(&entry.severity));
    }
    assert!(report
        .entries
        .windows(2)
        .all(|w| w[0].severity >= w[1].severity));
}

#[tokio::test]
async fn empty_requirements_yield_an_empty_report() {
    let mut roles = standard_roles();
    roles.push(role("job-open", "Generalist", &[]));
    let fixture = fixture_with_roles(roles).await;

    let report = fixture
        .engine
        .compute_gap_report(
            &ProfileId("dev-1".to_string()),
            &JobId("job-open".to_string()),
        )
        .await
        .unwrap();
    assert!(report.entries.is_empty());
}

#[tokio::test]
async fn ranking_is_ordered_bounded_and_prefers_matching_roles() {
    let fixture = fixture_with_roles(standard_roles()).await;
    let ranking = fixture
        .engine
        .rank_jobs(&ProfileId("dev-1".to_string()), 10)
        .await
        .unwrap();

    assert_eq!(ranking.len(), 3);
    assert_eq!(ranking[0].job, JobId("job-backend".to_string()));
    assert!(ranking
        .windows(2)
        .all(|w| w[0].score >= w[1].score));
    for scored in &ranking {
        assert!((0.0..=1.0).contains(&scored.score));
        assert!((0.0..=1.0).contains(&scored.breakdown.similarity));
        assert!((0.0..=1.0).contains(&scored.breakdown.gap_penalty));
        assert!((0.0..=1.0).contains(&scored.breakdown.experience_alignment));
    }
}

#[tokio::test]
async fn ranking_is_deterministic_across_engines() {
    let first = fixture_with_roles(standard_roles()).await;
    let second = fixture_with_roles(standard_roles()).await;

    let a = first
        .engine
        .rank_jobs(&ProfileId("dev-1".to_string()), 10)
        .await
        .unwrap();
    let b = second
        .engine
        .rank_jobs(&ProfileId("dev-1".to_string()), 10)
        .await
        .unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn concurrent_rankings_share_one_computation() {
    let fixture = fixture_with_roles(standard_roles()).await;
    let engine = Arc::new(fixture.engine);
    let calls_after_sync = fixture.provider.calls();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.rank_jobs(&ProfileId("dev-1".to_string()), 10).await
        }));
    }
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    // The only embedding after corpus sync is the single profile embedding:
    // one computation served every concurrent caller.
    assert_eq!(fixture.provider.calls(), calls_after_sync + 1);
    for result in &results {
        assert_eq!(result, &results[0]);
    }
    assert_eq!(engine.cached_rankings(), 1);
}

#[tokio::test]
async fn corpus_version_bump_invalidates_cached_rankings() {
    let fixture = fixture_with_roles(standard_roles()).await;

    let before = fixture
        .engine
        .rank_jobs(&ProfileId("dev-1".to_string()), 10)
        .await
        .unwrap();
    assert_eq!(before.len(), 3);
    assert_eq!(fixture.engine.cached_rankings(), 1);

    fixture.source.insert_role(role(
        "job-platform",
        "Platform Engineer",
        &[("python", 4, 0.5), ("docker", 3, 0.5)],
    ));
    fixture.engine.sync_jobs().await.unwrap();

    let after = fixture
        .engine
        .rank_jobs(&ProfileId("dev-1".to_string()), 10)
        .await
        .unwrap();
    assert_eq!(after.len(), 4);
    assert!(after
        .iter()
        .any(|s| s.job == JobId("job-platform".to_string())));
    // The superseded entry was purged; only the fresh ranking remains.
    assert_eq!(fixture.engine.cached_rankings(), 1);
}

#[tokio::test]
async fn empty_corpus_ranks_to_an_empty_sequence() {
    let fixture = fixture_with_roles(Vec::new()).await;
    let ranking = fixture
        .engine
        .rank_jobs(&ProfileId("dev-1".to_string()), 10)
        .await
        .unwrap();
    assert!(ranking.is_empty());
}

#[tokio::test]
async fn misweighted_scorer_fails_at_construction() {
    let mut config = Config::default();
    config.scoring.gap_weight = 0.7;

    let taxonomy = TaxonomySnapshot::with_default_catalog(0.8).unwrap();
    let source = Arc::new(InMemorySource::new());
    let provider = Arc::new(HashEmbedder::new(config.provider.dimension));

    let result = MatchEngine::new(
        &config,
        taxonomy,
        provider,
        Arc::clone(&source) as Arc<dyn career_match::source::ProfileSource>,
        source as Arc<dyn career_match::source::RoleSource>,
    );
    assert!(matches!(result, Err(EngineError::Configuration(_))));
}

#[tokio::test]
async fn empty_profile_is_rejected_before_computation() {
    let fixture = fixture_with_roles(standard_roles()).await;
    let taxonomy = TaxonomySnapshot::with_default_catalog(0.8).unwrap();
    fixture
        .source
        .insert_profile(raw_profile("empty", &[], 0.0, "").resolve(&taxonomy));

    assert!(matches!(
        fixture
            .engine
            .rank_jobs(&ProfileId("empty".to_string()), 10)
            .await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        fixture
            .engine
            .rank_jobs(&ProfileId("missing".to_string()), 10)
            .await,
        Err(EngineError::UnknownProfile(_))
    ));
}

#[tokio::test]
async fn unresolved_mentions_degrade_gracefully() {
    let fixture = fixture_with_roles(standard_roles()).await;
    let taxonomy = TaxonomySnapshot::with_default_catalog(0.8).unwrap();
    fixture.source.insert_profile(
        raw_profile(
            "dev-2",
            &[("Python", 4, 4.0), ("Underwater Basketweaving", 5, 9.0)],
            4.0,
            "backend work",
        )
        .resolve(&taxonomy),
    );

    let report = fixture
        .engine
        .compute_gap_report(
            &ProfileId("dev-2".to_string()),
            &JobId("job-backend".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(
        report.unresolved_mentions,
        vec!["Underwater Basketweaving".to_string()]
    );
    // The unresolved mention is absent from claims, so SQL counts from zero.
    let sql = report
        .entries
        .iter()
        .find(|e| e.skill == SkillId::new("sql"))
        .unwrap();
    assert_eq!(sql.current_level, None);

    let ranking = fixture
        .engine
        .rank_jobs(&ProfileId("dev-2".to_string()), 5)
        .await
        .unwrap();
    assert!(!ranking.is_empty());
}

#[tokio::test]
async fn profiles_with_identical_resolved_content_share_a_fingerprint() {
    let taxonomy = TaxonomySnapshot::with_default_catalog(0.8).unwrap();
    let a = raw_profile("u1", &[("JS", 3, 2.0), ("Python", 4, 4.0)], 4.0, "backend")
        .resolve(&taxonomy);
    let b = raw_profile("u2", &[("python", 4, 4.0), ("Javascript", 3, 2.0)], 4.0, "backend")
        .resolve(&taxonomy);
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[tokio::test]
async fn json_fixtures_drive_the_engine_end_to_end() {
    let config = Config::default();
    let taxonomy = TaxonomySnapshot::with_default_catalog(0.8).unwrap();
    let source = Arc::new(InMemorySource::new());
    source
        .load_profiles_json("tests/fixtures/sample_profiles.json", &taxonomy)
        .unwrap();
    source
        .load_roles_json("tests/fixtures/sample_roles.json")
        .unwrap();

    // The misspelled "Typescrpt" mention resolves fuzzily instead of
    // degrading to an unresolved entry.
    let frontend_dev = source
        .fetch_profile(&ProfileId("jordan-m".to_string()))
        .await
        .unwrap();
    assert!(frontend_dev.unresolved.is_empty());
    assert!(frontend_dev
        .claims
        .iter()
        .any(|c| c.skill == SkillId::new("typescript")));

    let engine = MatchEngine::new(
        &config,
        taxonomy,
        Arc::new(HashEmbedder::new(config.provider.dimension)),
        Arc::clone(&source) as Arc<dyn career_match::source::ProfileSource>,
        Arc::clone(&source) as Arc<dyn career_match::source::RoleSource>,
    )
    .unwrap();
    engine.sync_jobs().await.unwrap();

    let ranking = engine
        .rank_jobs(&ProfileId("jordan-m".to_string()), 3)
        .await
        .unwrap();
    assert_eq!(ranking.len(), 3);
    assert_eq!(ranking[0].job, JobId("acme-frontend-eng".to_string()));

    let report = engine
        .compute_gap_report(
            &ProfileId("casey-r".to_string()),
            &JobId("acme-backend-eng".to_string()),
        )
        .await
        .unwrap();
    // Python 0.6×(5−4)/5 = 0.12 tops the report; SQL and Docker are met.
    assert_eq!(report.entries[0].skill, SkillId::new("python"));
    assert!((report.entries[0].severity - 0.12).abs() < 1e-6);
    assert!(report.entries[1..].iter().all(|e| e.severity == 0.0));
}

#[tokio::test]
async fn requested_k_caps_the_ranking_length() {
    let fixture = fixture_with_roles(standard_roles()).await;
    let ranking = fixture
        .engine
        .rank_jobs(&ProfileId("dev-1".to_string()), 2)
        .await
        .unwrap();
    assert_eq!(ranking.len(), 2);

    let none = fixture
        .engine
        .rank_jobs(&ProfileId("dev-1".to_string()), 0)
        .await
        .unwrap();
    assert!(none.is_empty());
}
