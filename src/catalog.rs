//! The zone catalog: fuzzy names in, parsed zones out.

use std::sync::OnceLock;

use tzfind_provider::{CompressedZoneTable, TableError};

use crate::{
    error::LookupError,
    matcher::{self, Match},
    zone::Tzif,
};

/// A zone found for a query.
#[derive(Debug, Clone)]
pub struct ResolvedZone {
    /// The display name that matched the query, possibly an alias.
    pub name: String,
    /// The canonical key the data is stored under.
    pub key: String,
    /// Weighted edit distance between the query and `name`.
    pub distance: u32,
    pub zone: Tzif,
}

/// A read-only view over a [`CompressedZoneTable`] with a per-zone parse cache.
///
/// Every method takes `&self`; a catalog can be shared freely between
/// threads.
#[derive(Debug)]
pub struct ZoneCatalog<'data> {
    table: CompressedZoneTable<'data>,
    names: Vec<&'data str>,
    // Parallel to `table.zones`.
    cache: Box<[OnceLock<Tzif>]>,
}

impl<'data> ZoneCatalog<'data> {
    pub fn new(table: CompressedZoneTable<'data>) -> Self {
        let mut names: Vec<&'data str> = table.keys().collect();
        names.sort_unstable();
        names.dedup();
        let cache = table.zones.iter().map(|_| OnceLock::new()).collect();
        Self {
            table,
            names,
            cache,
        }
    }

    pub fn table(&self) -> &CompressedZoneTable<'data> {
        &self.table
    }

    /// The TZDB version the table was packaged from.
    pub fn version(&self) -> &'data str {
        self.table.version
    }

    /// Every display name in lexicographic order: canonical keys and aliases.
    pub fn location_names(&self) -> &[&'data str] {
        &self.names
    }

    /// Follows aliases from `key` to its canonical key.
    pub fn resolve(&self, key: &str) -> Result<&'data str, TableError> {
        self.table.resolve(key)
    }

    /// Returns the display name closest to `query`.
    pub fn find(&self, query: &str) -> Result<Match<'data>, LookupError> {
        let found = matcher::best_match(query, self.names.iter().copied())
            .ok_or_else(|| LookupError::NotFound(query.into()))?;
        log::debug!("{query:?} matched {} at distance {}", found.name, found.distance);
        Ok(found)
    }

    /// Loads the zone stored under `key` or the key it aliases.
    ///
    /// The parsed zone is cached per canonical key; later loads of that key
    /// or any of its aliases clone the cached value.
    pub fn load_zone(&self, key: &str) -> Result<Tzif, LookupError> {
        let canonical = self.table.resolve(key)?;
        let idx = self
            .table
            .zone_index(canonical)
            .ok_or_else(|| TableError::UnknownKey(canonical.into()))?;

        if let Some(zone) = self.cache.get(idx).and_then(OnceLock::get) {
            return Ok(zone.clone());
        }

        let zone = self.parse_zone(idx)?;
        // Another thread may have stored the same zone first; either value is the same.
        match self.cache.get(idx) {
            Some(slot) => Ok(slot.get_or_init(|| zone).clone()),
            None => Ok(zone),
        }
    }

    /// Parses and caches every canonical zone.
    pub fn preload(&self) -> Result<(), LookupError> {
        for (idx, slot) in self.cache.iter().enumerate() {
            if slot.get().is_none() {
                let zone = self.parse_zone(idx)?;
                let _ = slot.set(zone);
            }
        }
        log::info!("preloaded {} zones", self.cache.len());
        Ok(())
    }

    /// Finds the closest name to `query` and loads its zone.
    pub fn lookup(&self, query: &str) -> Result<ResolvedZone, LookupError> {
        let Match { name, distance } = self.find(query)?;
        let key = self.table.resolve(name)?;
        let zone = self.load_zone(key)?;
        Ok(ResolvedZone {
            name: name.into(),
            key: key.into(),
            distance,
            zone,
        })
    }

    fn parse_zone(&self, idx: usize) -> Result<Tzif, LookupError> {
        let Some(zone) = self.table.zones.get(idx) else {
            return Err(TableError::UnknownKey(idx.to_string()).into());
        };
        let bytes = self.table.decompress(zone.key)?;
        Ok(Tzif::from_bytes(zone.key, &bytes)?)
    }
}

#[cfg(feature = "compiled_data")]
mod compiled {
    use std::sync::LazyLock;

    use super::ZoneCatalog;

    tzfind_provider::compressed_zone_table!();

    static GLOBAL_CATALOG: LazyLock<ZoneCatalog<'static>> =
        LazyLock::new(|| ZoneCatalog::new(*COMPRESSED_ZONE_TABLE));

    impl ZoneCatalog<'static> {
        /// The catalog over the table compiled into this crate.
        pub fn global() -> &'static ZoneCatalog<'static> {
            &GLOBAL_CATALOG
        }
    }
}
