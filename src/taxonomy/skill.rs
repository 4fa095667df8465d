//! Canonical skill records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable canonical identifier for a skill, e.g. `"python"` or `"node-js"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(String);

impl SkillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SkillId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillCategory {
    Technical,
    Soft,
    RoleSpecific,
    Domain,
}

/// A canonical skill with its synonyms and proficiency scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub synonyms: Vec<String>,
    pub category: SkillCategory,
    /// Upper bound of the ordinal proficiency scale (levels run 1..=max_level).
    pub max_level: u8,
}

impl Skill {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: SkillCategory,
    ) -> Self {
        Self {
            id: SkillId::new(id),
            name: name.into(),
            synonyms: Vec::new(),
            category,
            max_level: 5,
        }
    }

    pub fn with_synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| s.to_string()).collect();
        self
    }
}
