//! Vector index with snapshot-isolated reads
//!
//! Exact (brute-force) nearest-neighbor search over an immutable snapshot.
//! Writers clone-and-swap the snapshot under a lock, so queries pin the
//! pre-mutation state for their whole duration and `upsert` never blocks a
//! reader mid-scan. Exact search has full recall at any corpus size; the
//! configurable corpus limit marks where an approximate structure would be
//! worth the recall trade, and crossing it only logs.

use crate::error::{EngineError, Result};
use log::warn;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Euclidean,
}

impl DistanceMetric {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            other => Err(EngineError::Configuration(format!(
                "unknown distance metric '{}', expected cosine or euclidean",
                other
            ))),
        }
    }

    /// Raw distance between two equal-length vectors. Cosine distance is
    /// 1 − cos θ (range [0, 2]); Euclidean is the L2 norm of the difference.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => {
                let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (norm_a * norm_b)
                }
            }
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }

    /// Map a raw distance into [0, 1] for score blending.
    pub fn normalize(&self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => (distance / 2.0).clamp(0.0, 1.0),
            DistanceMetric::Euclidean => distance / (1.0 + distance),
        }
    }
}

/// One query hit, ascending by distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: String,
    pub distance: f32,
}

struct IndexSnapshot {
    entries: HashMap<String, Arc<Vec<f32>>>,
    dimension: Option<usize>,
}

pub struct VectorIndex {
    metric: DistanceMetric,
    exact_search_limit: usize,
    snapshot: RwLock<Arc<IndexSnapshot>>,
}

impl VectorIndex {
    pub fn new(metric: DistanceMetric, exact_search_limit: usize) -> Self {
        Self {
            metric,
            exact_search_limit,
            snapshot: RwLock::new(Arc::new(IndexSnapshot {
                entries: HashMap::new(),
                dimension: None,
            })),
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.read().entries.is_empty()
    }

    /// Insert or replace a vector. The first upsert fixes the index
    /// dimension; later mismatches are rejected.
    pub fn upsert(&self, id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let id = id.into();
        if vector.is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "empty vector for index entry '{}'",
                id
            )));
        }

        let mut guard = self.snapshot.write();
        if let Some(dimension) = guard.dimension {
            if vector.len() != dimension {
                return Err(EngineError::InvalidInput(format!(
                    "vector for '{}' has {} dimensions, index holds {}",
                    id,
                    vector.len(),
                    dimension
                )));
            }
        }

        let mut entries = guard.entries.clone();
        let dimension = Some(vector.len());
        entries.insert(id, Arc::new(vector));
        if entries.len() == self.exact_search_limit + 1 {
            warn!(
                "vector index grew past {} entries; exact search stays correct but a sublinear index is due",
                self.exact_search_limit
            );
        }
        *guard = Arc::new(IndexSnapshot { entries, dimension });
        Ok(())
    }

    /// Remove an id from future queries. Results already returned from a
    /// pinned snapshot are not retroactively invalidated.
    pub fn remove(&self, id: &str) -> bool {
        let mut guard = self.snapshot.write();
        if !guard.entries.contains_key(id) {
            return false;
        }
        let mut entries = guard.entries.clone();
        entries.remove(id);
        *guard = Arc::new(IndexSnapshot {
            entries,
            dimension: guard.dimension,
        });
        true
    }

    /// Top-k nearest neighbors, ascending by distance. An empty index
    /// returns an empty result, not an error.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.query_filtered(vector, k, |_| true)
    }

    /// Top-k nearest neighbors among ids accepted by the filter.
    pub fn query_filtered<F>(&self, vector: &[f32], k: usize, filter: F) -> Result<Vec<Neighbor>>
    where
        F: Fn(&str) -> bool,
    {
        // Pin the snapshot; concurrent upserts swap a new Arc without
        // touching the one this query walks.
        let snapshot = Arc::clone(&self.snapshot.read());

        if snapshot.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if let Some(dimension) = snapshot.dimension {
            if vector.len() != dimension {
                return Err(EngineError::IndexUnavailable(format!(
                    "query vector has {} dimensions, index holds {}",
                    vector.len(),
                    dimension
                )));
            }
        }

        let mut neighbors: Vec<Neighbor> = snapshot
            .entries
            .iter()
            .filter(|(id, _)| filter(id))
            .map(|(id, stored)| Neighbor {
                id: id.clone(),
                distance: self.metric.distance(vector, stored),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}
