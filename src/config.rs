//! Configuration management for the matching engine

use crate::error::{EngineError, Result};
use crate::index::DistanceMetric;
use crate::matching::scorer::ScorerWeights;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub taxonomy: TaxonomyConfig,
    pub index: IndexConfig,
    pub provider: ProviderConfig,
    pub scoring: ScoringConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Minimum similarity a fuzzy skill match must clear.
    pub fuzzy_threshold: f32,
    /// Upper bound of the proficiency scale (levels run 1..=scale).
    pub max_level_scale: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Distance metric, fixed for the index lifetime: "cosine" or "euclidean".
    pub metric: String,
    /// Corpus size up to which exact search is the intended implementation.
    pub exact_search_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Embedding width expected from the provider.
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub similarity_weight: f32,
    pub gap_weight: f32,
    pub experience_weight: f32,
    /// Linear decay applied per year outside the seniority band.
    pub experience_decay_per_year: f32,
    /// Lowest experience-alignment value the decay can reach.
    pub experience_floor: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            taxonomy: TaxonomyConfig {
                fuzzy_threshold: 0.8,
                max_level_scale: 5,
            },
            index: IndexConfig {
                metric: "cosine".to_string(),
                exact_search_limit: 10_000,
            },
            provider: ProviderConfig {
                timeout_ms: 5_000,
                max_retries: 3,
                backoff_base_ms: 100,
                dimension: 256,
            },
            scoring: ScoringConfig {
                similarity_weight: 0.4,
                gap_weight: 0.4,
                experience_weight: 0.2,
                experience_decay_per_year: 0.2,
                experience_floor: 0.2,
            },
            cache: CacheConfig { ttl_secs: 300 },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content).map_err(|e| {
                EngineError::Configuration(format!("failed to parse config: {}", e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            EngineError::Configuration(format!("failed to serialize config: {}", e))
        })?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("career-match")
            .join("config.toml")
    }

    /// Startup validation. Every constraint the engine relies on is checked
    /// here so misconfiguration never surfaces at request time.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.taxonomy.fuzzy_threshold) {
            return Err(EngineError::Configuration(format!(
                "fuzzy threshold {} outside [0, 1]",
                self.taxonomy.fuzzy_threshold
            )));
        }
        if self.taxonomy.max_level_scale == 0 {
            return Err(EngineError::Configuration(
                "proficiency scale must be at least 1".to_string(),
            ));
        }
        self.metric()?;
        self.scorer_weights().validate()?;
        if self.provider.dimension == 0 {
            return Err(EngineError::Configuration(
                "embedding dimension must be non-zero".to_string(),
            ));
        }
        if self.provider.max_retries == 0 {
            return Err(EngineError::Configuration(
                "provider retry cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn metric(&self) -> Result<DistanceMetric> {
        DistanceMetric::parse(&self.index.metric)
    }

    pub fn scorer_weights(&self) -> ScorerWeights {
        ScorerWeights {
            similarity: self.scoring.similarity_weight,
            gap: self.scoring.gap_weight,
            experience: self.scoring.experience_weight,
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider.timeout_ms)
    }

    pub fn provider_backoff(&self) -> Duration {
        Duration::from_millis(self.provider.backoff_base_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
