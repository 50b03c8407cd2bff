//! In-memory draw statistics. Lives as long as the process.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::draw::{DrawKind, DrawResult};
use crate::item::Rarity;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrawStatistics {
    pub total_draws: u64,
    pub total_pulls: u64,
    pub normal_draws: u64,
    pub pickup_draws: u64,
    pub box_draws: u64,
    pub pickup_hits: u64,
    pub by_rarity: BTreeMap<Rarity, u64>,
}

impl DrawStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &DrawResult) {
        self.total_draws += 1;
        match result.kind {
            DrawKind::Normal => self.normal_draws += 1,
            DrawKind::Pickup => self.pickup_draws += 1,
            DrawKind::Box => self.box_draws += 1,
        }
        for entry in &result.entries {
            self.total_pulls += 1;
            if entry.is_pickup_hit {
                self.pickup_hits += 1;
            }
            *self.by_rarity.entry(entry.rarity).or_default() += 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fraction of pulls that landed on `rarity`
    pub fn rarity_share(&self, rarity: Rarity) -> f64 {
        if self.total_pulls == 0 {
            return 0.0;
        }
        self.by_rarity.get(&rarity).copied().unwrap_or(0) as f64 / self.total_pulls as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::DrawEntry;

    fn entry(id: u32, rarity: Rarity, is_pickup_hit: bool) -> DrawEntry {
        DrawEntry {
            id,
            name: format!("Item {id}"),
            rarity,
            is_pickup_hit,
        }
    }

    #[test]
    fn test_record_and_reset() {
        let mut stats = DrawStatistics::new();
        stats.record(&DrawResult {
            kind: DrawKind::Pickup,
            entries: vec![
                entry(1, Rarity::N, false),
                entry(1, Rarity::N, false),
                entry(10, Rarity::SSR, true),
            ],
        });
        stats.record(&DrawResult {
            kind: DrawKind::Normal,
            entries: vec![entry(11, Rarity::SSR, false)],
        });

        assert_eq!(stats.total_draws, 2);
        assert_eq!(stats.total_pulls, 4);
        assert_eq!(stats.pickup_draws, 1);
        assert_eq!(stats.normal_draws, 1);
        assert_eq!(stats.pickup_hits, 1);
        assert_eq!(stats.by_rarity.get(&Rarity::SSR), Some(&2));
        assert!((stats.rarity_share(Rarity::N) - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.rarity_share(Rarity::R), 0.0);

        stats.reset();
        assert_eq!(stats, DrawStatistics::default());
        assert_eq!(stats.rarity_share(Rarity::N), 0.0);
    }
}
