use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::core::regularization::L2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    Random,
    BestIjk,
    BestIjkAbc,
}

/// Elementwise transform applied to the pair coupling tensor before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairTransform {
    #[default]
    Identity,
    Abs,
    Square,
}

impl PairTransform {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            PairTransform::Identity => value,
            PairTransform::Abs => value.abs(),
            PairTransform::Square => value * value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionConfig {
    pub strategy: SelectionStrategy,
    pub transform: PairTransform,
    pub count: usize,
    pub min_separation: usize,
    pub expand: bool,
}

#[derive(Default)]
pub struct SelectionConfigBuilder {
    strategy: Option<SelectionStrategy>,
    transform: Option<PairTransform>,
    count: Option<usize>,
    min_separation: Option<usize>,
    expand: Option<bool>,
}

impl SelectionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
    pub fn transform(mut self, transform: PairTransform) -> Self {
        self.transform = Some(transform);
        self
    }
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
    pub fn min_separation(mut self, separation: usize) -> Self {
        self.min_separation = Some(separation);
        self
    }
    pub fn expand(mut self, expand: bool) -> Self {
        self.expand = Some(expand);
        self
    }

    pub fn build(self) -> Result<SelectionConfig, ConfigError> {
        let strategy = self
            .strategy
            .ok_or(ConfigError::MissingParameter("strategy"))?;
        let count = self.count.ok_or(ConfigError::MissingParameter("count"))?;
        if count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "count",
                reason: "must be at least 1".to_string(),
            });
        }
        let min_separation = self.min_separation.unwrap_or(5);
        if min_separation == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "min_separation",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(SelectionConfig {
            strategy,
            transform: self.transform.unwrap_or_default(),
            count,
            min_separation,
            expand: self.expand.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegularizationProfile {
    pub lambda_single: f64,
    pub lambda_pair: f64,
    #[serde(default)]
    pub lambda_triplet: Option<f64>,
}

/// Fitting parameters loaded from a TOML profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FitProfile {
    pub regularization: RegularizationProfile,
    #[serde(default)]
    pub threads: Option<usize>,
}

impl FitProfile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn regularizer(&self) -> L2 {
        let reg = L2::new(
            self.regularization.lambda_single,
            self.regularization.lambda_pair,
        );
        match self.regularization.lambda_triplet {
            Some(lambda) => reg.with_triplet(lambda),
            None => reg,
        }
    }
}
