//! Catalog files
//!
//! Each pool lives in its own JSON file named `gacha-items-<pool>.json`,
//! holding an array of [`Item`] records. The pool name is the file stem with
//! the prefix removed, so `gacha-items-pickup-confirm.json` becomes
//! `pickup-confirm`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DataError;
use crate::item::Item;

/// File name prefix shared by all catalog files
pub const CATALOG_PREFIX: &str = "gacha-items-";

/// Pool name to item list, in pool-name order
pub type Catalogs = BTreeMap<String, Vec<Item>>;

/// Pool name for a catalog file, or `None` if the file is not a catalog
pub fn pool_name(path: &Path) -> Option<&str> {
    if path.extension()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(CATALOG_PREFIX).filter(|name| !name.is_empty())
}

/// Parse one catalog. An empty array is rejected.
pub fn parse_catalog(pool: &str, path: &Path, json: &str) -> Result<Vec<Item>, DataError> {
    let items: Vec<Item> = serde_json::from_str(json).map_err(|source| DataError::Catalog {
        path: path.to_path_buf(),
        source,
    })?;
    if items.is_empty() {
        return Err(DataError::EmptyCatalog(pool.to_string()));
    }
    Ok(items)
}

/// Load every catalog file in `dir`
pub fn load_dir(dir: &Path) -> Result<Catalogs, DataError> {
    let io_err = |source| DataError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(io_err)?;
    paths.sort();

    let mut catalogs = Catalogs::new();
    for path in paths {
        let Some(pool) = pool_name(&path) else {
            continue;
        };
        let json = fs::read_to_string(&path).map_err(|source| DataError::Io {
            path: path.clone(),
            source,
        })?;
        let items = parse_catalog(pool, &path, &json)?;
        tracing::debug!(pool, items = items.len(), path = %path.display(), "Loaded catalog");
        catalogs.insert(pool.to_string(), items);
    }

    if catalogs.is_empty() {
        return Err(DataError::NoCatalogs(dir.to_path_buf()));
    }
    Ok(catalogs)
}
