//! Skill taxonomy: canonical skills, synonyms, and free-text resolution

pub mod skill;
pub mod store;

pub use skill::{Skill, SkillCategory, SkillId};
pub use store::{Resolution, TaxonomySnapshot};
