//! Error types for sampling, catalog loading and draw validation.

use std::path::PathBuf;

use crate::item::Rarity;

/// Top-level error for gacha operations
#[derive(Debug, thiserror::Error)]
pub enum GachaError {
    /// Caller input broke a draw rule; safe to report back verbatim.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown pool: {0}")]
    UnknownPool(String),

    /// Catalog or settings could not be loaded. Fatal at startup.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Sampling from a table with no positive-weight entries.
    #[error("Cannot sample from an empty table")]
    EmptyTable,
}

/// Rule violations in caller-supplied draw requests
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Expected exactly {expected} pickup items, got {actual}")]
    PickupCount { expected: usize, actual: usize },

    #[error("Pickup item {0} was listed more than once")]
    DuplicatePickup(u32),

    #[error("Item {id} does not exist in pool '{pool}'")]
    UnknownItem { pool: String, id: u32 },

    #[error("Item {id} has rarity {rarity}, pickup items must be {required}")]
    RarityMismatch {
        id: u32,
        rarity: Rarity,
        required: Rarity,
    },

    #[error("Box draw count must be between 1 and {max}, got {count}")]
    BoxCount { count: usize, max: usize },

    #[error("Pool '{pool}' has only {available} items left, cannot draw {count}")]
    BoxExhausted {
        pool: String,
        count: usize,
        available: usize,
    },
}

/// Startup failures: bad catalogs or bad settings
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed settings {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No catalog files found in {0}")]
    NoCatalogs(PathBuf),

    #[error("Catalog for pool '{0}' is empty")]
    EmptyCatalog(String),

    #[error("Pool '{0}' has no item with a positive weight")]
    NoPositiveWeight(String),

    #[error("Pool '{0}' is registered twice")]
    DuplicatePool(String),

    #[error("Pool '{pool}' lists item id {id} more than once")]
    DuplicateItem { pool: String, id: u32 },

    #[error("Confirm pool '{pool}' holds item {id} of rarity {rarity}, below {required}")]
    ConfirmBelowTier {
        pool: String,
        id: u32,
        rarity: Rarity,
        required: Rarity,
    },

    #[error("Configured pool '{0}' is not registered")]
    MissingPool(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for gacha operations
pub type GachaResult<T> = Result<T, GachaError>;
