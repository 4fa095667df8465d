//! Profile, role, and report value types
//!
//! The engine consumes profiles and roles read-only and produces reports as
//! fresh values; nothing here mutates its inputs.

use crate::error::{EngineError, Result};
use crate::taxonomy::{SkillId, TaxonomySnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved skill the profile claims, with proficiency and tenure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillClaim {
    pub skill: SkillId,
    pub level: u8,
    pub years: f32,
}

/// A profile after taxonomy resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub claims: Vec<SkillClaim>,
    pub years_experience: f32,
    pub goal: String,
    /// Mentions that cleared no resolution threshold. Carried for
    /// explainability; they degrade to absent skills, never to errors.
    #[serde(default)]
    pub unresolved: Vec<String>,
}

impl Profile {
    /// Reject profiles with nothing to match on.
    pub fn validate(&self) -> Result<()> {
        if self.claims.is_empty() && self.goal.trim().is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "profile '{}' has no resolvable skills and no goal text",
                self.id
            )));
        }
        if self.years_experience < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "profile '{}' has negative experience",
                self.id
            )));
        }
        Ok(())
    }

    pub fn claim_for(&self, skill: &SkillId) -> Option<&SkillClaim> {
        self.claims.iter().find(|c| &c.skill == skill)
    }

    /// Deterministic hash of the resolved content. Covers claim identifiers,
    /// levels, years, overall experience, and goal text, so any change that
    /// can move a score changes the fingerprint. Claims are hashed in
    /// identifier order: two profiles listing the same claims differently
    /// ordered share a fingerprint.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut claims: Vec<&SkillClaim> = self.claims.iter().collect();
        claims.sort_by(|a, b| a.skill.cmp(&b.skill));

        let mut hasher = Sha256::new();
        for claim in claims {
            hasher.update(claim.skill.as_str().as_bytes());
            hasher.update([claim.level]);
            hasher.update(claim.years.to_le_bytes());
            hasher.update([0u8]);
        }
        hasher.update(self.years_experience.to_le_bytes());
        hasher.update([0u8]);
        hasher.update(self.goal.as_bytes());

        let digest = hasher.finalize();
        Fingerprint(format!("{:x}", digest))
    }

    /// Text the embedding provider sees for this profile.
    pub fn embedding_text(&self, taxonomy: &TaxonomySnapshot) -> String {
        let mut parts: Vec<String> = Vec::new();
        for claim in &self.claims {
            match taxonomy.get(&claim.skill) {
                Some(skill) => parts.push(skill.name.clone()),
                None => parts.push(claim.skill.to_string()),
            }
        }
        parts.sort();
        if !self.goal.trim().is_empty() {
            parts.push(self.goal.trim().to_string());
        }
        parts.join(". ")
    }
}

/// Cache key derived from resolved profile content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A free-text skill mention as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSkillMention {
    pub text: String,
    pub level: u8,
    #[serde(default)]
    pub years: f32,
}

/// Caller-supplied profile before taxonomy resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProfile {
    pub id: ProfileId,
    pub skills: Vec<RawSkillMention>,
    #[serde(default)]
    pub years_experience: f32,
    #[serde(default)]
    pub goal: String,
}

impl RawProfile {
    /// Resolve mentions against the taxonomy. Unresolved mentions land in
    /// `Profile::unresolved` rather than failing the profile; a duplicate
    /// resolution keeps the higher claimed level.
    pub fn resolve(&self, taxonomy: &TaxonomySnapshot) -> Profile {
        let mut claims: Vec<SkillClaim> = Vec::new();
        let mut unresolved = Vec::new();

        for mention in &self.skills {
            match taxonomy.resolve(&mention.text).resolved() {
                Some(id) => {
                    if let Some(existing) =
                        claims.iter_mut().find(|c| &c.skill == id)
                    {
                        if mention.level > existing.level {
                            existing.level = mention.level;
                            existing.years = mention.years;
                        }
                    } else {
                        claims.push(SkillClaim {
                            skill: id.clone(),
                            level: mention.level,
                            years: mention.years,
                        });
                    }
                }
                None => unresolved.push(mention.text.clone()),
            }
        }

        Profile {
            id: self.id.clone(),
            claims,
            years_experience: self.years_experience,
            goal: self.goal.clone(),
            unresolved,
        }
    }
}

/// Experience range a role is pitched at, in years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeniorityBand {
    pub min_years: f32,
    pub max_years: f32,
}

impl SeniorityBand {
    pub fn contains(&self, years: f32) -> bool {
        years >= self.min_years && years <= self.max_years
    }

    /// Distance in years from the band edge; zero inside the band.
    pub fn distance(&self, years: f32) -> f32 {
        if years < self.min_years {
            self.min_years - years
        } else if years > self.max_years {
            years - self.max_years
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: SkillId,
    pub min_level: u8,
    /// Importance in [0, 1]; requirement weights need not sum to 1.
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: JobId,
    pub title: String,
    pub requirements: Vec<SkillRequirement>,
    pub seniority: SeniorityBand,
    /// Opaque to the engine; carried for callers.
    #[serde(default)]
    pub location: Option<String>,
}

impl Role {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "role '{}' has an empty title",
                self.id
            )));
        }
        for requirement in &self.requirements {
            if !(0.0..=1.0).contains(&requirement.weight) {
                return Err(EngineError::InvalidInput(format!(
                    "role '{}' weights skill '{}' at {}, expected [0, 1]",
                    self.id, requirement.skill, requirement.weight
                )));
            }
        }
        if self.seniority.min_years > self.seniority.max_years
            || self.seniority.min_years < 0.0
        {
            return Err(EngineError::InvalidInput(format!(
                "role '{}' has an inverted seniority band",
                self.id
            )));
        }
        Ok(())
    }

    /// Text the embedding provider sees for this role.
    pub fn embedding_text(&self, taxonomy: &TaxonomySnapshot) -> String {
        let mut parts = vec![self.title.clone()];
        let mut skill_names: Vec<String> = self
            .requirements
            .iter()
            .map(|r| match taxonomy.get(&r.skill) {
                Some(skill) => skill.name.clone(),
                None => r.skill.to_string(),
            })
            .collect();
        skill_names.sort();
        parts.extend(skill_names);
        parts.join(". ")
    }
}

/// One row of a gap report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapEntry {
    pub skill: SkillId,
    pub required_level: u8,
    /// `None` when the profile does not claim the skill at all.
    pub current_level: Option<u8>,
    pub weight: f32,
    /// Normalized shortfall in [0, 1]; zero means satisfied.
    pub severity: f32,
}

/// Immutable skill-gap report for one (profile, role) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub profile: ProfileId,
    pub role: JobId,
    pub entries: Vec<GapEntry>,
    pub unresolved_mentions: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl GapReport {
    /// Mean severity weighted by requirement importance. An empty report
    /// has no gap, so the mean is zero.
    pub fn mean_weighted_severity(&self) -> f32 {
        let total_weight: f32 = self.entries.iter().map(|e| e.weight).sum();
        if total_weight <= 0.0 {
            return 0.0;
        }
        let weighted: f32 = self.entries.iter().map(|e| e.weight * e.severity).sum();
        (weighted / total_weight).clamp(0.0, 1.0)
    }
}

/// Component terms behind a compatibility score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub similarity: f32,
    pub gap_penalty: f32,
    pub experience_alignment: f32,
}

/// Bounded compatibility of one (profile, job) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityScore {
    pub job: JobId,
    pub score: f32,
    pub breakdown: ScoreBreakdown,
}
