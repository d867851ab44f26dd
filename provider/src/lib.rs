//! Data provider for embedded time zone rules
//!
//! This crate holds compressed TZif data as a static table. Each canonical
//! zone is stored once, gzip compressed, and every byte-identical zone is
//! recorded as an alias to it.
//!
//! With the `compiled_data` feature, the table generated by the `bakeddata`
//! tool is available through the [`compressed_zone_table`] macro. With the
//! `datagen` feature, the [`datagen`] module provides the scanner, the
//! deduplicating compressor and the emitter that produce that table.
//!

#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod table;

#[cfg(feature = "datagen")]
pub mod datagen;

pub use table::{CompressedZone, CompressedZoneTable, TableError, ZoneAlias, MAGIC};

#[cfg(feature = "compiled_data")]
include!("./data/mod.rs");

#[cfg(all(test, feature = "compiled_data"))]
mod tests {
    use crate as tzfind_provider;

    compressed_zone_table!();

    #[test]
    fn compiled_table_is_sorted() {
        let zones = COMPRESSED_ZONE_TABLE.zones;
        assert!(zones.windows(2).all(|w| w[0].key < w[1].key));
        let aliases = COMPRESSED_ZONE_TABLE.aliases;
        assert!(aliases.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn compiled_aliases_are_flat() {
        for alias in COMPRESSED_ZONE_TABLE.aliases {
            assert!(
                COMPRESSED_ZONE_TABLE.payload(alias.target).is_some(),
                "{} -> {} does not point at a stored zone",
                alias.key,
                alias.target
            );
        }
    }

    #[test]
    fn compiled_new_york() {
        let key = COMPRESSED_ZONE_TABLE.resolve("America/New_York").unwrap();
        let data = COMPRESSED_ZONE_TABLE.decompress(key).unwrap();
        assert_eq!(&data[..4], tzfind_provider::MAGIC);
    }
}
