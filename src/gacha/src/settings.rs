//! Draw settings, loaded from TOML

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::item::Rarity;

/// Accepted range for [`Boost::Multiply`] factors
pub const BOOST_FACTOR_RANGE: std::ops::RangeInclusive<f64> = 1.0..=10.0;

/// How pickup items are boosted in a derived table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Boost {
    /// `base_weight + amount`
    Additive { amount: u32 },
    /// `round(base_weight * factor)`
    Multiply { factor: f64 },
}

impl Boost {
    /// Weight of a pickup item whose catalog weight is `base`
    pub fn apply(&self, base: u32) -> i64 {
        match *self {
            Self::Additive { amount } => i64::from(base) + i64::from(amount),
            Self::Multiply { factor } => (f64::from(base) * factor).round() as i64,
        }
    }
}

impl Default for Boost {
    fn default() -> Self {
        Self::Additive { amount: 100 }
    }
}

/// Which registered pools each draw kind uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolNames {
    pub normal: String,
    pub normal_confirm: String,
    pub pickup: String,
    pub pickup_confirm: String,
}

impl Default for PoolNames {
    fn default() -> Self {
        Self {
            normal: "normal".into(),
            normal_confirm: "confirm".into(),
            pickup: "pickup".into(),
            pickup_confirm: "pickup-confirm".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GachaSettings {
    /// Slots per draw; the last one comes from the confirm pool
    pub pull_count: usize,
    /// Exact number of pickup items a pickup draw must name
    pub pickup_count: usize,
    /// Minimum rarity of the confirm pools, and the rarity pickup items must have
    pub guaranteed_rarity: Rarity,
    /// Upper bound for a single box draw
    pub max_box_draw: usize,
    pub boost: Boost,
    pub pools: PoolNames,
}

impl Default for GachaSettings {
    fn default() -> Self {
        Self {
            pull_count: 10,
            pickup_count: 3,
            guaranteed_rarity: Rarity::SSR,
            max_box_draw: 100,
            boost: Boost::default(),
            pools: PoolNames::default(),
        }
    }
}

impl GachaSettings {
    /// Load settings from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let contents = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = toml::from_str(&contents).map_err(|source| DataError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, DataError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.pull_count == 0 {
            return Err(DataError::InvalidSettings("pull_count must be at least 1".into()));
        }
        if self.pickup_count == 0 {
            return Err(DataError::InvalidSettings(
                "pickup_count must be at least 1".into(),
            ));
        }
        if self.max_box_draw == 0 {
            return Err(DataError::InvalidSettings(
                "max_box_draw must be at least 1".into(),
            ));
        }
        if let Boost::Multiply { factor } = self.boost {
            if !BOOST_FACTOR_RANGE.contains(&factor) {
                return Err(DataError::InvalidSettings(format!(
                    "boost factor must be between {} and {}, got {factor}",
                    BOOST_FACTOR_RANGE.start(),
                    BOOST_FACTOR_RANGE.end()
                )));
            }
        }
        Ok(())
    }
}
