//! Immutable taxonomy snapshots and free-text skill resolution

use crate::error::{EngineError, Result};
use crate::taxonomy::skill::{Skill, SkillCategory, SkillId};
use aho_corasick::AhoCorasick;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use strsim::{jaro_winkler, levenshtein};

/// Outcome of resolving a free-text mention against the taxonomy.
///
/// Resolution never guesses silently: a mention that clears no threshold is
/// `Unresolved` and it is the caller's decision how to degrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(SkillId),
    Unresolved,
}

impl Resolution {
    pub fn resolved(&self) -> Option<&SkillId> {
        match self {
            Resolution::Resolved(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }
}

/// Read-only snapshot of the skill taxonomy.
///
/// A snapshot is built once and shared behind an `Arc`; administrative
/// updates produce a new snapshot with a bumped version instead of mutating
/// in place, so concurrent resolutions never observe a half-updated table.
pub struct TaxonomySnapshot {
    version: u64,
    skills: BTreeMap<SkillId, Skill>,
    by_name: HashMap<String, SkillId>,
    by_synonym: HashMap<String, SkillId>,
    scanner: AhoCorasick,
    scanner_targets: Vec<SkillId>,
    fuzzy_threshold: f32,
}

const FUZZY_TIE_EPSILON: f32 = 1e-6;

impl TaxonomySnapshot {
    /// Build a snapshot from a skill catalog.
    ///
    /// Duplicate skill identifiers are a configuration error. A synonym
    /// claimed by more than one skill resolves to exactly one of them: the
    /// skill with the longer canonical name wins, ties by lexicographically
    /// smaller identifier.
    pub fn build(version: u64, skills: Vec<Skill>, fuzzy_threshold: f32) -> Result<Arc<Self>> {
        if !(0.0..=1.0).contains(&fuzzy_threshold) {
            return Err(EngineError::Configuration(format!(
                "fuzzy threshold must be in [0, 1], got {}",
                fuzzy_threshold
            )));
        }

        let mut catalog: BTreeMap<SkillId, Skill> = BTreeMap::new();
        for skill in skills {
            if skill.max_level == 0 {
                return Err(EngineError::Configuration(format!(
                    "skill '{}' has a zero proficiency scale",
                    skill.id
                )));
            }
            let id = skill.id.clone();
            if catalog.insert(id.clone(), skill).is_some() {
                return Err(EngineError::Configuration(format!(
                    "duplicate skill identifier '{}'",
                    id
                )));
            }
        }

        let mut by_name = HashMap::new();
        for skill in catalog.values() {
            by_name.insert(skill.name.to_lowercase(), skill.id.clone());
        }

        let mut by_synonym: HashMap<String, SkillId> = HashMap::new();
        for skill in catalog.values() {
            for synonym in &skill.synonyms {
                let key = synonym.to_lowercase();
                let claim = match by_synonym.get(&key) {
                    None => true,
                    Some(existing) => Self::synonym_wins(skill, &catalog[existing]),
                };
                if claim {
                    by_synonym.insert(key, skill.id.clone());
                }
            }
        }

        // Scanner patterns cover canonical names and synonyms; longest match
        // wins so "machine learning" is never shadowed by "machine".
        let mut patterns = Vec::new();
        let mut scanner_targets = Vec::new();
        for skill in catalog.values() {
            patterns.push(skill.name.clone());
            scanner_targets.push(skill.id.clone());
            for synonym in &skill.synonyms {
                patterns.push(synonym.clone());
                scanner_targets.push(skill.id.clone());
            }
        }
        let scanner = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(aho_corasick::MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| {
                EngineError::Configuration(format!("failed to build taxonomy scanner: {}", e))
            })?;

        Ok(Arc::new(Self {
            version,
            skills: catalog,
            by_name,
            by_synonym,
            scanner,
            scanner_targets,
            fuzzy_threshold,
        }))
    }

    fn synonym_wins(challenger: &Skill, incumbent: &Skill) -> bool {
        match challenger.name.len().cmp(&incumbent.name.len()) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => challenger.id < incumbent.id,
        }
    }

    /// Administrative update: build the successor snapshot with a bumped
    /// version. The current snapshot stays valid for in-flight readers.
    pub fn rebuild(&self, skills: Vec<Skill>) -> Result<Arc<Self>> {
        Self::build(self.version + 1, skills, self.fuzzy_threshold)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn get(&self, id: &SkillId) -> Option<&Skill> {
        self.skills.get(id)
    }

    pub fn skills(&self) -> impl Iterator<Item = &Skill> {
        self.skills.values()
    }

    pub fn fuzzy_threshold(&self) -> f32 {
        self.fuzzy_threshold
    }

    /// Resolve a free-text mention to a canonical skill.
    pub fn resolve(&self, text: &str) -> Resolution {
        self.resolve_in_context(text, None)
    }

    /// Resolve a mention that the caller requires to exist, surfacing the
    /// offending text on failure.
    pub fn resolve_strict(&self, text: &str) -> Result<SkillId> {
        match self.resolve(text) {
            Resolution::Resolved(id) => Ok(id),
            Resolution::Unresolved => Err(EngineError::UnresolvedSkill(text.to_string())),
        }
    }

    /// Resolve a free-text mention, preferring `context` on fuzzy ties.
    ///
    /// Resolution order: exact canonical name, exact synonym, fuzzy match.
    /// Fuzzy candidates must clear the threshold; equally good candidates
    /// break ties by context category match, then smallest identifier.
    pub fn resolve_in_context(
        &self,
        text: &str,
        context: Option<SkillCategory>,
    ) -> Resolution {
        let query = text.trim().to_lowercase();
        if query.is_empty() {
            return Resolution::Unresolved;
        }

        if let Some(id) = self.by_name.get(&query) {
            return Resolution::Resolved(id.clone());
        }
        if let Some(id) = self.by_synonym.get(&query) {
            return Resolution::Resolved(id.clone());
        }

        self.resolve_fuzzy(&query, context)
    }

    fn resolve_fuzzy(&self, query: &str, context: Option<SkillCategory>) -> Resolution {
        let mut best_score = 0.0f32;
        let mut candidates: Vec<&Skill> = Vec::new();

        for skill in self.skills.values() {
            let score = self.skill_similarity(query, skill);
            if score < self.fuzzy_threshold {
                continue;
            }
            if score > best_score + FUZZY_TIE_EPSILON {
                best_score = score;
                candidates.clear();
                candidates.push(skill);
            } else if (score - best_score).abs() <= FUZZY_TIE_EPSILON {
                candidates.push(skill);
            }
        }

        if candidates.is_empty() {
            return Resolution::Unresolved;
        }
        if candidates.len() > 1 {
            if let Some(category) = context {
                let in_category: Vec<&Skill> = candidates
                    .iter()
                    .copied()
                    .filter(|s| s.category == category)
                    .collect();
                if !in_category.is_empty() {
                    candidates = in_category;
                }
            }
        }

        let winner = candidates
            .into_iter()
            .min_by(|a, b| a.id.cmp(&b.id))
            .expect("candidates is non-empty");
        Resolution::Resolved(winner.id.clone())
    }

    /// Best similarity between the query and any of the skill's surface forms.
    fn skill_similarity(&self, query: &str, skill: &Skill) -> f32 {
        let mut best = 0.0f32;
        let mut consider = |candidate: &str| {
            let candidate = candidate.to_lowercase();
            let jw = jaro_winkler(query, &candidate) as f32;
            if jw > best {
                best = jw;
            }
            // Levenshtein ratio catches short-token typos Jaro-Winkler
            // under-scores, same as the keyword matcher this grew from.
            if query.len() <= 8 && candidate.len() <= 8 {
                let distance = levenshtein(query, &candidate);
                let max_len = query.len().max(candidate.len());
                if max_len > 0 {
                    let ratio = 1.0 - (distance as f32 / max_len as f32);
                    if ratio > best {
                        best = ratio;
                    }
                }
            }
        };

        consider(&skill.name);
        for synonym in &skill.synonyms {
            consider(synonym);
        }
        best
    }

    /// Scan running text for known skill mentions.
    ///
    /// Returns distinct skills in order of first appearance. Used for goal
    /// text and other prose where mentions are embedded rather than listed.
    pub fn scan(&self, text: &str) -> Vec<SkillId> {
        let mut seen = Vec::new();
        for mat in self.scanner.find_iter(text) {
            let id = &self.scanner_targets[mat.pattern().as_usize()];
            if !seen.contains(id) {
                seen.push(id.clone());
            }
        }
        seen
    }

    /// Snapshot over the built-in catalog of common software skills.
    pub fn with_default_catalog(fuzzy_threshold: f32) -> Result<Arc<Self>> {
        Self::build(1, Self::default_catalog(), fuzzy_threshold)
    }

    /// Built-in catalog covering the skills the engine is most often asked
    /// about. Callers with their own taxonomy pass it to `build` instead.
    pub fn default_catalog() -> Vec<Skill> {
        use SkillCategory::*;
        vec![
            Skill::new("python", "Python", Technical).with_synonyms(&["py"]),
            Skill::new("sql", "SQL", Technical),
            Skill::new("javascript", "JavaScript", Technical)
                .with_synonyms(&["JS", "ECMAScript"]),
            Skill::new("typescript", "TypeScript", Technical).with_synonyms(&["TS"]),
            Skill::new("java", "Java", Technical),
            Skill::new("rust", "Rust", Technical),
            Skill::new("go", "Go", Technical).with_synonyms(&["Golang"]),
            Skill::new("cpp", "C++", Technical),
            Skill::new("react", "React", Technical).with_synonyms(&["ReactJS", "React.js"]),
            Skill::new("node-js", "Node.js", Technical).with_synonyms(&["NodeJS", "Node"]),
            Skill::new("docker", "Docker", Technical),
            Skill::new("kubernetes", "Kubernetes", Technical).with_synonyms(&["k8s"]),
            Skill::new("aws", "AWS", Technical).with_synonyms(&["Amazon Web Services"]),
            Skill::new("terraform", "Terraform", Technical),
            Skill::new("postgresql", "PostgreSQL", Technical).with_synonyms(&["Postgres"]),
            Skill::new("mongodb", "MongoDB", Technical).with_synonyms(&["Mongo"]),
            Skill::new("redis", "Redis", Technical),
            Skill::new("machine-learning", "Machine Learning", Technical)
                .with_synonyms(&["ML"]),
            Skill::new("tensorflow", "TensorFlow", Technical),
            Skill::new("pytorch", "PyTorch", Technical),
            Skill::new("pandas", "Pandas", Technical),
            Skill::new("git", "Git", Technical),
            Skill::new("linux", "Linux", Technical),
            Skill::new("ci-cd", "CI/CD", Technical)
                .with_synonyms(&["CICD", "Continuous Integration"]),
            Skill::new("graphql", "GraphQL", Technical),
            Skill::new("rest-api", "REST API", Technical).with_synonyms(&["REST"]),
            Skill::new("leadership", "Leadership", Soft),
            Skill::new("communication", "Communication", Soft),
            Skill::new("project-management", "Project Management", Soft),
            Skill::new("agile", "Agile", Soft).with_synonyms(&["Scrum"]),
            Skill::new("backend", "Backend Development", RoleSpecific)
                .with_synonyms(&["Backend"]),
            Skill::new("frontend", "Frontend Development", RoleSpecific)
                .with_synonyms(&["Frontend", "Front-end"]),
            Skill::new("data-engineering", "Data Engineering", Domain),
            Skill::new("security", "Security", Domain).with_synonyms(&["InfoSec"]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Arc<TaxonomySnapshot> {
        TaxonomySnapshot::with_default_catalog(0.8).unwrap()
    }

    #[test]
    fn exact_name_resolution() {
        let tax = snapshot();
        assert_eq!(
            tax.resolve("Python"),
            Resolution::Resolved(SkillId::new("python"))
        );
    }

    #[test]
    fn synonym_and_name_resolve_to_same_skill() {
        let tax = snapshot();
        let via_synonym = tax.resolve("JS");
        let via_name = tax.resolve("Javascript");
        assert_eq!(via_synonym, Resolution::Resolved(SkillId::new("javascript")));
        assert_eq!(via_synonym, via_name);
    }

    #[test]
    fn fuzzy_resolution_catches_typos() {
        let tax = snapshot();
        assert_eq!(
            tax.resolve("Pyton"),
            Resolution::Resolved(SkillId::new("python"))
        );
        assert_eq!(
            tax.resolve("Kubernets"),
            Resolution::Resolved(SkillId::new("kubernetes"))
        );
    }

    #[test]
    fn nonsense_is_unresolved() {
        let tax = snapshot();
        assert_eq!(tax.resolve("zqxwvut"), Resolution::Unresolved);
        assert_eq!(tax.resolve("   "), Resolution::Unresolved);
    }

    #[test]
    fn strict_resolution_names_the_offender() {
        let tax = snapshot();
        assert!(tax.resolve_strict("Rust").is_ok());
        match tax.resolve_strict("zqxwvut") {
            Err(EngineError::UnresolvedSkill(text)) => assert_eq!(text, "zqxwvut"),
            other => panic!("expected UnresolvedSkill, got {:?}", other),
        }
    }

    #[test]
    fn fuzzy_tie_prefers_context_category() {
        let skills = vec![
            Skill::new("alpha-tech", "Flow", SkillCategory::Technical),
            Skill::new("beta-soft", "Flow", SkillCategory::Soft),
        ];
        // Same surface form, so fuzzy scores tie exactly; the name lookup is
        // bypassed by querying a near-miss spelling.
        let tax = TaxonomySnapshot::build(1, skills, 0.8).unwrap();
        match tax.resolve_in_context("Flows", Some(SkillCategory::Soft)) {
            Resolution::Resolved(id) => assert_eq!(id, SkillId::new("beta-soft")),
            Resolution::Unresolved => panic!("expected a fuzzy match"),
        }
        // Without context the smaller identifier wins.
        match tax.resolve("Flows") {
            Resolution::Resolved(id) => assert_eq!(id, SkillId::new("alpha-tech")),
            Resolution::Unresolved => panic!("expected a fuzzy match"),
        }
    }

    #[test]
    fn duplicate_identifier_is_configuration_error() {
        let skills = vec![
            Skill::new("python", "Python", SkillCategory::Technical),
            Skill::new("python", "Python 3", SkillCategory::Technical),
        ];
        assert!(matches!(
            TaxonomySnapshot::build(1, skills, 0.8),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn synonym_collision_resolves_to_longest_name() {
        let skills = vec![
            Skill::new("js", "JS", SkillCategory::Technical).with_synonyms(&["script"]),
            Skill::new("javascript", "JavaScript", SkillCategory::Technical)
                .with_synonyms(&["script"]),
        ];
        let tax = TaxonomySnapshot::build(1, skills, 0.8).unwrap();
        assert_eq!(
            tax.resolve("script"),
            Resolution::Resolved(SkillId::new("javascript"))
        );
    }

    #[test]
    fn scan_finds_mentions_in_prose() {
        let tax = snapshot();
        let found =
            tax.scan("Looking to move from Python scripting into Kubernetes and AWS work");
        assert!(found.contains(&SkillId::new("python")));
        assert!(found.contains(&SkillId::new("kubernetes")));
        assert!(found.contains(&SkillId::new("aws")));
    }

    #[test]
    fn rebuild_bumps_version() {
        let tax = snapshot();
        let next = tax.rebuild(TaxonomySnapshot::default_catalog()).unwrap();
        assert_eq!(next.version(), tax.version() + 1);
    }
}
