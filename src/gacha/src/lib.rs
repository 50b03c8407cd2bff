//! # gacha
//!
//! Weighted sampling engine and draw orchestration for a gacha simulator.
//!
//! This library provides:
//! - Cumulative-weight tables with O(log n) sampling, with and without replacement
//! - Catalog loading from `gacha-items-<pool>.json` files
//! - An immutable pool registry built once at startup
//! - Fixed-length draws with a rarity-guaranteed last slot and pickup boosting
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalogs = gacha::catalog::load_dir(Path::new("data"))?;
//! let registry = gacha::PoolRegistry::from_catalogs(catalogs)?;
//! let gacha = gacha::DrawOrchestrator::new(registry, gacha::GachaSettings::default())?;
//!
//! let mut rng = rand::thread_rng();
//! let result = gacha.draw_pickup(&[101, 102, 103], &mut rng)?;
//! for entry in &result.entries {
//!     println!("{} [{}]{}", entry.name, entry.rarity, if entry.is_pickup_hit { " *" } else { "" });
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod draw;
pub mod error;
pub mod item;
pub mod registry;
pub mod settings;
pub mod stats;
pub mod weighted;

#[doc(inline)]
pub use draw::{
    DrawEntry, DrawKind, DrawOrchestrator, DrawResult, ItemRate, RarityRate, RateTable,
};
#[doc(inline)]
pub use error::{DataError, GachaError, GachaResult, ValidationError};
#[doc(inline)]
pub use item::{Item, Rarity};
#[doc(inline)]
pub use registry::{Pool, PoolRegistry};
#[doc(inline)]
pub use settings::{Boost, GachaSettings, PoolNames};
#[doc(inline)]
pub use stats::DrawStatistics;
#[doc(inline)]
pub use weighted::{Advance, EntryView, Extractor, WeightedTable};
