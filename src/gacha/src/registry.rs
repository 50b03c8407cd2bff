//! Read-only pool registry
//!
//! Built once from catalogs before any draw is served. Pools are never
//! mutated afterwards, so the registry can be shared across threads freely.

use std::collections::{BTreeMap, HashSet};

use crate::catalog::Catalogs;
use crate::error::{DataError, GachaError, GachaResult};
use crate::item::Item;
use crate::weighted::WeightedTable;

/// A named item list and the weighted table derived from it
#[derive(Debug, Clone)]
pub struct Pool {
    name: String,
    items: Vec<Item>,
    table: WeightedTable<Item>,
}

impl Pool {
    /// Build a pool, rejecting empty catalogs, duplicate ids and catalogs
    /// where nothing can ever be drawn.
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Result<Self, DataError> {
        let name = name.into();
        if items.is_empty() {
            return Err(DataError::EmptyCatalog(name));
        }

        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id) {
                return Err(DataError::DuplicateItem {
                    pool: name,
                    id: item.id,
                });
            }
        }

        let table: WeightedTable<Item> = items
            .iter()
            .map(|item| (i64::from(item.base_weight), item.clone()))
            .collect();
        if table.is_empty() {
            return Err(DataError::NoPositiveWeight(name));
        }

        Ok(Self { name, items, table })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Items in catalog order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn table(&self) -> &WeightedTable<Item> {
        &self.table
    }

    pub fn item(&self, id: u32) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools: BTreeMap<String, Pool>,
}

impl PoolRegistry {
    /// Empty registry; fill it with [`register`](Self::register)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with one pool per catalog
    pub fn from_catalogs(catalogs: Catalogs) -> Result<Self, DataError> {
        let mut registry = Self::new();
        for (name, items) in catalogs {
            registry.register(name, items)?;
        }
        tracing::info!(pools = registry.pools.len(), "Pool registry built");
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, items: Vec<Item>) -> Result<(), DataError> {
        let name = name.into();
        if self.pools.contains_key(&name) {
            return Err(DataError::DuplicatePool(name));
        }
        let pool = Pool::new(name.clone(), items)?;
        tracing::debug!(
            pool = %name,
            items = pool.items.len(),
            total_weight = pool.table.total(),
            "Registered pool"
        );
        self.pools.insert(name, pool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Pool> {
        self.pools.get(name)
    }

    pub fn pool(&self, name: &str) -> GachaResult<&Pool> {
        self.get(name)
            .ok_or_else(|| GachaError::UnknownPool(name.to_string()))
    }

    pub fn table(&self, name: &str) -> GachaResult<&WeightedTable<Item>> {
        self.pool(name).map(Pool::table)
    }

    /// Registered pool names, sorted
    pub fn pool_names(&self) -> Vec<&str> {
        self.pools.keys().map(String::as_str).collect()
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Rarity;

    fn item(id: u32, rarity: Rarity, base_weight: u32) -> Item {
        Item {
            id,
            name: format!("Item {id}"),
            rarity,
            base_weight,
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = PoolRegistry::new();
        registry
            .register("normal", vec![item(1, Rarity::N, 90), item(2, Rarity::SSR, 10)])
            .unwrap();
        registry
            .register("confirm", vec![item(2, Rarity::SSR, 10)])
            .unwrap();

        assert_eq!(registry.pool_names(), vec!["confirm", "normal"]);
        let normal = registry.pool("normal").unwrap();
        assert_eq!(normal.items().len(), 2);
        assert_eq!(normal.item(2).map(|i| i.rarity), Some(Rarity::SSR));
        assert!(normal.item(3).is_none());
        assert_eq!(registry.table("normal").unwrap().total(), 100);
    }

    #[test]
    fn test_unknown_pool() {
        let registry = PoolRegistry::new();
        assert!(matches!(
            registry.pool("limited"),
            Err(GachaError::UnknownPool(name)) if name == "limited"
        ));
        assert!(matches!(
            registry.table("limited"),
            Err(GachaError::UnknownPool(_))
        ));
    }

    #[test]
    fn test_duplicate_pool_rejected() {
        let mut registry = PoolRegistry::new();
        registry.register("normal", vec![item(1, Rarity::N, 1)]).unwrap();
        assert!(matches!(
            registry.register("normal", vec![item(2, Rarity::N, 1)]),
            Err(DataError::DuplicatePool(_))
        ));
        // The first registration is kept
        assert_eq!(registry.pool("normal").unwrap().items()[0].id, 1);
    }

    #[test]
    fn test_invalid_catalogs_rejected() {
        assert!(matches!(
            Pool::new("empty", vec![]),
            Err(DataError::EmptyCatalog(_))
        ));
        assert!(matches!(
            Pool::new("dupes", vec![item(1, Rarity::N, 1), item(1, Rarity::R, 1)]),
            Err(DataError::DuplicateItem { id: 1, .. })
        ));
        assert!(matches!(
            Pool::new("weightless", vec![item(1, Rarity::N, 0)]),
            Err(DataError::NoPositiveWeight(_))
        ));
    }

    #[test]
    fn test_zero_weight_items_listed_but_never_drawn() {
        let pool = Pool::new("normal", vec![item(1, Rarity::N, 0), item(2, Rarity::R, 5)]).unwrap();
        assert_eq!(pool.items().len(), 2);
        assert_eq!(pool.table().len(), 1);
        assert_eq!(pool.table().get(0).map(|i| i.id), Some(2));
    }

    #[test]
    fn test_from_catalogs() {
        let mut catalogs = Catalogs::new();
        catalogs.insert("normal".into(), vec![item(1, Rarity::N, 3)]);
        catalogs.insert("pickup".into(), vec![item(1, Rarity::N, 3)]);
        let registry = PoolRegistry::from_catalogs(catalogs).unwrap();
        assert!(registry.get("pickup").is_some());
        assert_eq!(registry.pools().count(), 2);
    }
}
