//! Organization configuration loaded from TOML and environment variables.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. A TOML file (e.g. `cosca.toml`)
//! 3. Environment variables with the `COSCA_` prefix
//!
//! ```toml
//! [succession]
//! orphan_policy = "reject"
//!
//! [queries]
//! big_boss_threshold = 6
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// What to do when a jailed member's remaining reports have nobody to take
/// them over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Leave them recorded under the jailed member until it is released.
    #[default]
    Tolerate,
    /// Refuse the incarceration.
    Reject,
}

impl std::str::FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tolerate" => Ok(OrphanPolicy::Tolerate),
            "reject" => Ok(OrphanPolicy::Reject),
            other => Err(format!("unknown orphan policy: {other}")),
        }
    }
}

/// Top-level organization configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Succession behaviour.
    #[serde(default)]
    pub succession: SuccessionConfig,
    /// Query defaults.
    #[serde(default)]
    pub queries: QueryConfig,
}

/// Succession configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessionConfig {
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
}

/// Query configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Minimum descendant count used by `Organization::big_bosses`.
    #[serde(default = "default_big_boss_threshold")]
    pub big_boss_threshold: usize,
}

fn default_big_boss_threshold() -> usize {
    cosca_protocol::DEFAULT_BIG_BOSS_THRESHOLD
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            big_boss_threshold: default_big_boss_threshold(),
        }
    }
}

impl OrganizationConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: OrganizationConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from an optional TOML file, then apply
    /// environment overrides.
    ///
    /// A missing file falls back to defaults with a warning.
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "Config file not found, using defaults"
                );
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Apply `COSCA_*` overrides from the given variable lookup.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("COSCA_ORPHAN_POLICY") {
            match val.parse() {
                Ok(policy) => self.succession.orphan_policy = policy,
                Err(error) => tracing::warn!(%error, "Ignoring COSCA_ORPHAN_POLICY"),
            }
        }
        if let Some(val) = lookup("COSCA_BIG_BOSS_THRESHOLD") {
            match val.trim().parse() {
                Ok(threshold) => self.queries.big_boss_threshold = threshold,
                Err(error) => tracing::warn!(%error, value = %val, "Ignoring COSCA_BIG_BOSS_THRESHOLD"),
            }
        }
    }
}
