//! Skill-gap analysis

use crate::matching::profile::{GapEntry, GapReport, Profile, Role};
use chrono::Utc;

/// Computes per-skill shortfall between a profile and a role.
#[derive(Debug, Clone)]
pub struct GapAnalyzer {
    max_level_scale: u8,
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self { max_level_scale: 5 }
    }
}

impl GapAnalyzer {
    pub fn new(max_level_scale: u8) -> Self {
        Self {
            max_level_scale: max_level_scale.max(1),
        }
    }

    /// Build a gap report for every skill the role requires.
    ///
    /// severity = weight × max(0, required − current) / scale, in [0, 1].
    /// Satisfied skills appear with severity 0 so the report is complete.
    /// Entries order by severity descending, then requirement weight
    /// descending, then skill identifier ascending. A role with no
    /// requirements yields an empty report.
    pub fn analyze(&self, profile: &Profile, role: &Role) -> GapReport {
        let scale = self.max_level_scale as f32;

        let mut entries: Vec<GapEntry> = role
            .requirements
            .iter()
            .map(|requirement| {
                let required = requirement.min_level.min(self.max_level_scale);
                let claim = profile.claim_for(&requirement.skill);
                let current = claim.map(|c| c.level.min(self.max_level_scale));
                let shortfall = required.saturating_sub(current.unwrap_or(0)) as f32;
                let severity = (requirement.weight * shortfall / scale).clamp(0.0, 1.0);

                GapEntry {
                    skill: requirement.skill.clone(),
                    required_level: required,
                    current_level: current,
                    weight: requirement.weight,
                    severity,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.severity
                .total_cmp(&a.severity)
                .then_with(|| b.weight.total_cmp(&a.weight))
                .then_with(|| a.skill.cmp(&b.skill))
        });

        GapReport {
            profile: profile.id.clone(),
            role: role.id.clone(),
            entries,
            unresolved_mentions: profile.unresolved.clone(),
            generated_at: Utc::now(),
        }
    }
}
