use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::{Result, TopicModelError}, model::{cluster::{KMeans, DEFAULT_MAX_ITERATIONS}, evaluate::similarity::DEFAULT_NEIGHBOR_LIMIT, reduce::DEFAULT_RANK}};

/// Pipeline settings
/// every field has a default, a JSON file only needs the fields it changes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// number of latent dimensions k
    pub rank: usize,
    /// neighbors returned by similarity / analogy queries
    pub neighbor_limit: usize,
    pub kmeans: KMeansConfig,
}

/// k-means settings shared by document and word clustering
/// the cluster count itself is always passed explicitly
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KMeansConfig {
    pub max_iterations: usize,
    /// seed of the centroid initialization
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            rank: DEFAULT_RANK,
            neighbor_limit: DEFAULT_NEIGHBOR_LIMIT,
            kmeans: KMeansConfig::default(),
        }
    }
}

impl Default for KMeansConfig {
    fn default() -> Self {
        KMeansConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: 0,
        }
    }
}

impl KMeansConfig {
    /// k-means engine for `k` clusters with these settings
    pub fn engine(&self, k: usize) -> KMeans {
        KMeans::new(k)
            .with_max_iterations(self.max_iterations)
            .with_seed(self.seed)
    }
}

impl ModelConfig {
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.kmeans.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rank == 0 {
            return Err(TopicModelError::invalid("config: rank must be at least 1"));
        }
        if self.neighbor_limit == 0 {
            return Err(TopicModelError::invalid("config: neighbor_limit must be at least 1"));
        }
        if self.kmeans.max_iterations == 0 {
            return Err(TopicModelError::invalid("config: kmeans.max_iterations must be at least 1"));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ModelConfig = serde_json::from_str(json)
            .map_err(|e| TopicModelError::invalid(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// `Io` if the file cannot be read, `InvalidInput` if its content is not a valid config
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
