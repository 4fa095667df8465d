//! In-memory data source backed by JSON fixtures

use crate::error::{EngineError, Result};
use crate::matching::profile::{JobId, Profile, ProfileId, RawProfile, Role};
use crate::source::{ProfileSource, RoleSource};
use crate::taxonomy::TaxonomySnapshot;
use async_trait::async_trait;
use log::info;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Profile and role store for tests and the CLI demo. Role mutations bump
/// the corpus version; profile mutations do not (profile changes surface
/// through the fingerprint instead).
#[derive(Default)]
pub struct InMemorySource {
    profiles: RwLock<HashMap<ProfileId, Profile>>,
    roles: RwLock<HashMap<JobId, Role>>,
    version: AtomicU64,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.profiles.write().insert(profile.id.clone(), profile);
    }

    pub fn insert_role(&self, role: Role) {
        self.roles.write().insert(role.id.clone(), role);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    pub fn remove_role(&self, id: &JobId) -> bool {
        let removed = self.roles.write().remove(id).is_some();
        if removed {
            self.version.fetch_add(1, Ordering::SeqCst);
        }
        removed
    }

    /// Load raw profiles from a JSON array, resolving mentions against the
    /// taxonomy. Returns the number of profiles loaded.
    pub fn load_profiles_json(
        &self,
        path: impl AsRef<Path>,
        taxonomy: &TaxonomySnapshot,
    ) -> Result<usize> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let raw: Vec<RawProfile> = serde_json::from_str(&content)?;
        let count = raw.len();
        let mut profiles = self.profiles.write();
        for raw_profile in raw {
            let profile = raw_profile.resolve(taxonomy);
            profiles.insert(profile.id.clone(), profile);
        }
        info!("loaded {} profiles from {}", count, path.as_ref().display());
        Ok(count)
    }

    /// Load roles from a JSON array. Each role is validated; the corpus
    /// version bumps once per role so downstream caches invalidate.
    pub fn load_roles_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let roles: Vec<Role> = serde_json::from_str(&content)?;
        let count = roles.len();
        for role in roles {
            role.validate()?;
            self.insert_role(role);
        }
        info!("loaded {} roles from {}", count, path.as_ref().display());
        Ok(count)
    }
}

#[async_trait]
impl ProfileSource for InMemorySource {
    async fn fetch_profile(&self, id: &ProfileId) -> Result<Profile> {
        self.profiles
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownProfile(id.to_string()))
    }
}

#[async_trait]
impl RoleSource for InMemorySource {
    async fn fetch_role(&self, id: &JobId) -> Result<Role> {
        self.roles
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownRole(id.to_string()))
    }

    async fn list_role_ids(&self) -> Result<Vec<JobId>> {
        let mut ids: Vec<JobId> = self.roles.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn corpus_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}
