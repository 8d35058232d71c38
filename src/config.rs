//! Harness configuration loaded from JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::combinators::DEFAULT_MINIMUM_VOTES;
use crate::pivot::{PivotSelection, PivotSpec};
use crate::rerank::RerankOptions;
use crate::text::TextToolkit;

pub const CACHE_PATH_ENV: &str = "AXIOM_HARNESS_CACHE_PATH";
pub const DEFAULT_CACHE_FILE: &str = ".axiom_preference_cache.sqlite";
pub const DEFAULT_MARGIN_FRACTION: f64 = 0.1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid vote selector {0:?}: expected majority, consensus, plurality or a fraction in [0, 1]")]
    InvalidVote(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    #[serde(default = "default_k1")]
    pub k1: f64,
    #[serde(default = "default_b")]
    pub b: f64,
}

fn default_k1() -> f64 {
    1.2
}

fn default_b() -> f64 {
    0.75
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Relative margin for length equality and approximate comparisons.
    #[serde(default = "default_margin_fraction")]
    pub margin_fraction: f64,
    /// Worker count for parallel evaluation; `None` uses all cores. Values
    /// above `MAX_PARALLELISM` are clamped when the pool is built.
    #[serde(default)]
    pub parallelism: Option<usize>,
    #[serde(default)]
    pub pivot: PivotSpec,
    /// `majority`, `consensus`, `plurality` or a numeric fraction.
    #[serde(default = "default_vote")]
    pub vote: String,
    #[serde(default)]
    pub precompute_matrix: bool,
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default)]
    pub bm25: Bm25Params,
}

fn default_margin_fraction() -> f64 {
    DEFAULT_MARGIN_FRACTION
}

fn default_vote() -> String {
    "majority".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            margin_fraction: default_margin_fraction(),
            parallelism: None,
            pivot: PivotSpec::default(),
            vote: default_vote(),
            precompute_matrix: false,
            cache_path: None,
            bm25: Bm25Params::default(),
        }
    }
}

impl HarnessConfig {
    /// Read and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.margin_fraction.is_nan() || self.margin_fraction < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "margin_fraction must be non-negative, got {}",
                self.margin_fraction
            )));
        }
        if let Some(parallelism) = self.parallelism {
            if parallelism == 0 {
                return Err(ConfigError::Invalid("parallelism must be at least 1".to_string()));
            }
        }
        if self.bm25.k1.is_nan() || self.bm25.k1 < 0.0 || !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(ConfigError::Invalid(format!(
                "bm25 parameters out of range: k1={}, b={}",
                self.bm25.k1, self.bm25.b
            )));
        }
        self.minimum_votes()?;
        Ok(())
    }

    /// Vote threshold selected by `vote`.
    pub fn minimum_votes(&self) -> Result<f64, ConfigError> {
        parse_vote(&self.vote)
    }

    pub fn pivot_selection<I, O>(&self) -> Box<dyn PivotSelection<I, O>> {
        self.pivot.build()
    }

    pub fn rerank_options(&self) -> RerankOptions {
        RerankOptions {
            pivot: self.pivot,
            precompute_matrix: self.precompute_matrix,
        }
    }

    /// Default text toolkit using this config's margin.
    pub fn text_toolkit(&self) -> TextToolkit {
        TextToolkit::default().with_margin_fraction(self.margin_fraction)
    }

    /// `AXIOM_HARNESS_CACHE_PATH`, then `cache_path`, then the default file name.
    pub fn default_cache_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var(CACHE_PATH_ENV) {
            return PathBuf::from(path);
        }
        self.cache_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE))
    }
}

/// Parse a vote selector into a minimum-votes fraction.
pub fn parse_vote(selector: &str) -> Result<f64, ConfigError> {
    match selector.trim().to_ascii_lowercase().as_str() {
        "majority" => Ok(DEFAULT_MINIMUM_VOTES),
        "consensus" => Ok(1.0),
        "plurality" => Ok(0.0),
        other => match other.parse::<f64>() {
            Ok(fraction) if (0.0..=1.0).contains(&fraction) => Ok(fraction),
            _ => Err(ConfigError::InvalidVote(selector.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = HarnessConfig::from_json("{}").unwrap();
        assert_eq!(config.margin_fraction, 0.1);
        assert_eq!(config.pivot, PivotSpec::Random { seed: 0 });
        assert_eq!(config.minimum_votes().unwrap(), 0.5);
        assert_eq!(config.bm25, Bm25Params { k1: 1.2, b: 0.75 });
    }

    #[test]
    fn test_vote_selectors() {
        assert_eq!(parse_vote("consensus").unwrap(), 1.0);
        assert_eq!(parse_vote("Plurality").unwrap(), 0.0);
        assert_eq!(parse_vote("0.75").unwrap(), 0.75);
        assert!(matches!(parse_vote("1.5"), Err(ConfigError::InvalidVote(_))));
        assert!(matches!(parse_vote("borda"), Err(ConfigError::InvalidVote(_))));
    }

    #[test]
    fn test_invalid_values_rejected_at_load() {
        assert!(matches!(
            HarnessConfig::from_json(r#"{"vote":"ranked"}"#),
            Err(ConfigError::InvalidVote(_))
        ));
        assert!(matches!(
            HarnessConfig::from_json(r#"{"margin_fraction":-0.5}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            HarnessConfig::from_json(r#"{"parallelism":0}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_pivot_from_json() {
        let config = HarnessConfig::from_json(r#"{"pivot":{"type":"middle"},"precompute_matrix":true}"#).unwrap();
        let options = config.rerank_options();
        assert_eq!(options.pivot, PivotSpec::Middle);
        assert!(options.precompute_matrix);
    }
}
