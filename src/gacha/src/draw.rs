//! Draw sequences
//!
//! A draw is `pull_count` slots. Every slot but the last samples the main
//! pool; the last samples the confirm pool, whose catalog only holds items
//! at or above the guaranteed rarity. Pickup draws sample tables rebuilt for
//! the call with the chosen items boosted; the registry itself is never
//! touched.

use std::borrow::Borrow;
use std::cmp::Reverse;
use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;

use crate::error::{DataError, GachaResult, ValidationError};
use crate::item::{Item, Rarity};
use crate::registry::{Pool, PoolRegistry};
use crate::settings::GachaSettings;
use crate::weighted::WeightedTable;

/// Which kind of draw produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawKind {
    Normal,
    Pickup,
    Box,
}

/// One slot of a draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawEntry {
    pub id: u32,
    pub name: String,
    pub rarity: Rarity,
    pub is_pickup_hit: bool,
}

impl DrawEntry {
    fn new(item: &Item, is_pickup_hit: bool) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            rarity: item.rarity,
            is_pickup_hit,
        }
    }
}

/// Draw slots in draw order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawResult {
    pub kind: DrawKind,
    pub entries: Vec<DrawEntry>,
}

impl DrawResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pickup_hits(&self) -> usize {
        self.entries.iter().filter(|e| e.is_pickup_hit).count()
    }
}

/// Share of the total weight held by one rarity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RarityRate {
    pub rarity: Rarity,
    pub weight: i64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRate {
    pub id: u32,
    pub name: String,
    pub rarity: Rarity,
    pub is_pickup: bool,
    pub base_weight: u32,
    /// Weight after pickup boosting; equals `base_weight` otherwise
    pub weight: i64,
    pub probability: f64,
}

/// Per-rarity and per-item draw probabilities of one pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    pub pool: String,
    pub total_weight: i64,
    /// Rarest first
    pub by_rarity: Vec<RarityRate>,
    /// Pickup items first, then rarest first
    pub items: Vec<ItemRate>,
}

/// Runs draws against an owned registry
#[derive(Debug)]
pub struct DrawOrchestrator {
    registry: PoolRegistry,
    settings: GachaSettings,
}

impl DrawOrchestrator {
    /// Check that every configured pool exists and that the confirm pools
    /// only hold items at or above the guaranteed rarity.
    pub fn new(registry: PoolRegistry, settings: GachaSettings) -> Result<Self, DataError> {
        settings.validate()?;

        let pools = &settings.pools;
        for name in [
            &pools.normal,
            &pools.normal_confirm,
            &pools.pickup,
            &pools.pickup_confirm,
        ] {
            if registry.get(name).is_none() {
                return Err(DataError::MissingPool(name.clone()));
            }
        }

        let required = settings.guaranteed_rarity;
        for name in [&pools.normal_confirm, &pools.pickup_confirm] {
            let below = registry
                .get(name)
                .and_then(|pool| pool.items().iter().find(|item| item.rarity < required));
            if let Some(item) = below {
                return Err(DataError::ConfirmBelowTier {
                    pool: name.clone(),
                    id: item.id,
                    rarity: item.rarity,
                    required,
                });
            }
        }

        Ok(Self { registry, settings })
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &GachaSettings {
        &self.settings
    }

    /// Registered pool names
    pub fn list_pools(&self) -> Vec<&str> {
        self.registry.pool_names()
    }

    /// Plain draw straight from the base tables
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> GachaResult<DrawResult> {
        let pools = &self.settings.pools;
        let main = self.registry.table(&pools.normal)?;
        let confirm = self.registry.table(&pools.normal_confirm)?;

        let entries = self.run_slots(main, confirm, &HashSet::new(), rng)?;
        tracing::debug!(pulls = entries.len(), "Normal draw");
        Ok(DrawResult {
            kind: DrawKind::Normal,
            entries,
        })
    }

    /// Draw with `pickup_ids` boosted. Fails before sampling if the ids break
    /// any pickup rule.
    pub fn draw_pickup<R: Rng + ?Sized>(
        &self,
        pickup_ids: &[u32],
        rng: &mut R,
    ) -> GachaResult<DrawResult> {
        let pickup = self.validate_pickup(pickup_ids)?;
        let pools = &self.settings.pools;
        let main = self.boosted_table(self.registry.pool(&pools.pickup)?, &pickup);
        let confirm = self.boosted_table(self.registry.pool(&pools.pickup_confirm)?, &pickup);

        let entries = self.run_slots(&main, &confirm, &pickup, rng)?;
        let result = DrawResult {
            kind: DrawKind::Pickup,
            entries,
        };
        tracing::debug!(
            pulls = result.len(),
            hits = result.pickup_hits(),
            ?pickup_ids,
            "Pickup draw"
        );
        Ok(result)
    }

    /// Draw `count` distinct items from one pool, skipping `exclude_ids`.
    /// Unknown exclude ids are ignored.
    pub fn draw_box<R: Rng + ?Sized>(
        &self,
        pool: &str,
        count: usize,
        exclude_ids: &[u32],
        rng: &mut R,
    ) -> GachaResult<DrawResult> {
        let max = self.settings.max_box_draw;
        if count == 0 || count > max {
            return Err(ValidationError::BoxCount { count, max }.into());
        }

        let mut extractor = self.registry.table(pool)?.extractor();
        extractor.exclude(exclude_ids, |item: &Item, id: &&u32| item.id == **id);
        if count > extractor.len() {
            return Err(ValidationError::BoxExhausted {
                pool: pool.to_string(),
                count,
                available: extractor.len(),
            }
            .into());
        }

        let entries = (0..count)
            .map(|_| extractor.sample(rng).map(|item| DrawEntry::new(&item, false)))
            .collect::<GachaResult<Vec<_>>>()?;
        tracing::debug!(pool, pulls = entries.len(), "Box draw");
        Ok(DrawResult {
            kind: DrawKind::Box,
            entries,
        })
    }

    /// Base rates of a pool
    pub fn rates(&self, pool: &str) -> GachaResult<RateTable> {
        let pool = self.registry.pool(pool)?;
        Ok(self.rate_table(pool, &HashSet::new()))
    }

    /// Rates of the pickup pool with `pickup_ids` boosted. Same rules as
    /// [`draw_pickup`](Self::draw_pickup).
    pub fn pickup_rates(&self, pickup_ids: &[u32]) -> GachaResult<RateTable> {
        let pickup = self.validate_pickup(pickup_ids)?;
        let pool = self.registry.pool(&self.settings.pools.pickup)?;
        Ok(self.rate_table(pool, &pickup))
    }

    fn validate_pickup(&self, pickup_ids: &[u32]) -> GachaResult<HashSet<u32>> {
        let expected = self.settings.pickup_count;
        if pickup_ids.len() != expected {
            return Err(ValidationError::PickupCount {
                expected,
                actual: pickup_ids.len(),
            }
            .into());
        }

        let pool = self.registry.pool(&self.settings.pools.pickup)?;
        let required = self.settings.guaranteed_rarity;
        let mut pickup = HashSet::with_capacity(pickup_ids.len());
        for &id in pickup_ids {
            if !pickup.insert(id) {
                return Err(ValidationError::DuplicatePickup(id).into());
            }
            let item = pool.item(id).ok_or_else(|| ValidationError::UnknownItem {
                pool: pool.name().to_string(),
                id,
            })?;
            if item.rarity != required {
                return Err(ValidationError::RarityMismatch {
                    id,
                    rarity: item.rarity,
                    required,
                }
                .into());
            }
        }
        Ok(pickup)
    }

    fn weight_of(&self, item: &Item, pickup: &HashSet<u32>) -> i64 {
        if pickup.contains(&item.id) {
            self.settings.boost.apply(item.base_weight)
        } else {
            i64::from(item.base_weight)
        }
    }

    fn boosted_table<'a>(&self, pool: &'a Pool, pickup: &HashSet<u32>) -> WeightedTable<&'a Item> {
        pool.items()
            .iter()
            .map(|item| (self.weight_of(item, pickup), item))
            .collect()
    }

    fn run_slots<T, R>(
        &self,
        main: &WeightedTable<T>,
        confirm: &WeightedTable<T>,
        pickup: &HashSet<u32>,
        rng: &mut R,
    ) -> GachaResult<Vec<DrawEntry>>
    where
        T: Borrow<Item>,
        R: Rng + ?Sized,
    {
        let slots = self.settings.pull_count;
        (0..slots)
            .map(|slot| -> GachaResult<DrawEntry> {
                let table = if slot + 1 == slots { confirm } else { main };
                let item = Borrow::<Item>::borrow(table.sample(rng)?);
                Ok(DrawEntry::new(item, pickup.contains(&item.id)))
            })
            .collect()
    }

    fn rate_table(&self, pool: &Pool, pickup: &HashSet<u32>) -> RateTable {
        let weights: Vec<(&Item, i64)> = pool
            .items()
            .iter()
            .map(|item| (item, self.weight_of(item, pickup).max(0)))
            .collect();
        let total_weight = weights.iter().fold(0i64, |acc, (_, w)| acc.saturating_add(*w));
        let probability = |weight: i64| {
            if total_weight > 0 {
                weight as f64 / total_weight as f64
            } else {
                0.0
            }
        };

        let by_rarity = Rarity::ALL
            .iter()
            .rev()
            .filter_map(|&rarity| {
                let mut members = weights.iter().filter(|(item, _)| item.rarity == rarity).peekable();
                members.peek()?;
                let weight = members.fold(0i64, |acc, (_, w)| acc.saturating_add(*w));
                Some(RarityRate {
                    rarity,
                    weight,
                    probability: probability(weight),
                })
            })
            .collect();

        let mut items: Vec<ItemRate> = weights
            .iter()
            .map(|&(item, weight)| ItemRate {
                id: item.id,
                name: item.name.clone(),
                rarity: item.rarity,
                is_pickup: pickup.contains(&item.id),
                base_weight: item.base_weight,
                weight,
                probability: probability(weight),
            })
            .collect();
        items.sort_by_key(|rate| (Reverse(rate.is_pickup), Reverse(rate.rarity)));

        RateTable {
            pool: pool.name().to_string(),
            total_weight,
            by_rarity,
            items,
        }
    }
}
