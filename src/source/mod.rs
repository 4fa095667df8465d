//! Read-only profile and role data sources

pub mod memory;

use crate::error::Result;
use crate::matching::profile::{JobId, Profile, ProfileId, Role};
use async_trait::async_trait;

/// Read-only access to profile records by identifier.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, id: &ProfileId) -> Result<Profile>;
}

/// Read-only access to the job corpus.
#[async_trait]
pub trait RoleSource: Send + Sync {
    async fn fetch_role(&self, id: &JobId) -> Result<Role>;

    async fn list_role_ids(&self) -> Result<Vec<JobId>>;

    /// Monotonically increasing token bumped on every corpus change.
    /// Consumed solely for cache invalidation.
    fn corpus_version(&self) -> u64;
}

pub use memory::InMemorySource;
