//! Catalog records and rarity tiers.

use serde::{Deserialize, Serialize};

/// Rarity tier, ordered from most common to rarest
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    N,
    R,
    SR,
    SSR,
}

impl Rarity {
    /// All tiers in ascending order
    pub const ALL: [Rarity; 4] = [Rarity::N, Rarity::R, Rarity::SR, Rarity::SSR];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::R => "R",
            Self::SR => "SR",
            Self::SSR => "SSR",
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Rarity {
    type Err = UnknownRarity;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "N" => Ok(Self::N),
            "R" => Ok(Self::R),
            "SR" => Ok(Self::SR),
            "SSR" => Ok(Self::SSR),
            _ => Err(UnknownRarity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rarity: {0}")]
pub struct UnknownRarity(pub String);

/// One catalog entry. Ids are unique within a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub rarity: Rarity,
    pub base_weight: u32,
}
