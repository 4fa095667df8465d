//! Gap analysis, compatibility scoring, and the matching engine façade

pub mod engine;
pub mod gap;
pub mod profile;
pub mod scorer;

pub use engine::MatchEngine;
pub use gap::GapAnalyzer;
pub use profile::{
    CompatibilityScore, Fingerprint, GapEntry, GapReport, JobId, Profile, ProfileId,
    RawProfile, RawSkillMention, Role, ScoreBreakdown, SeniorityBand, SkillClaim,
    SkillRequirement,
};
pub use scorer::{CompatibilityScorer, ScorerWeights};
