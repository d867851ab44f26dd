//! The compressed zone table

use std::{fmt, io, io::Read};

use flate2::read::GzDecoder;

/// The magic marker that opens every TZif file.
pub const MAGIC: &[u8; 4] = b"TZif";

const READ_CHUNK_SIZE: usize = 4096;

/// A canonical zone and its gzip compressed TZif data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedZone<'data> {
    /// The canonical key, e.g. `America/New_York`.
    pub key: &'data str,
    /// The gzip compressed TZif bytes.
    pub payload: &'data [u8],
}

/// An alias key pointing at the key that holds its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneAlias<'data> {
    pub key: &'data str,
    pub target: &'data str,
}

/// A table of compressed zones and aliases.
///
/// Both `zones` and `aliases` must be sorted by key. The generated table
/// and [`crate::datagen::ZoneTableData`] always are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedZoneTable<'data> {
    /// TZDB version the table was built from.
    pub version: &'data str,
    pub zones: &'data [CompressedZone<'data>],
    pub aliases: &'data [ZoneAlias<'data>],
}

#[derive(Debug)]
pub enum TableError {
    /// The key is neither a canonical zone nor an alias.
    UnknownKey(String),
    /// Following aliases from the key never reached a canonical zone.
    AliasCycle(String),
    /// The stored payload could not be decompressed.
    Decompression(io::Error),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey(key) => write!(f, "unknown timezone: {key}"),
            Self::AliasCycle(key) => write!(f, "alias cycle while resolving {key}"),
            Self::Decompression(err) => write!(f, "corrupt zone data: {err}"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decompression(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TableError {
    fn from(value: io::Error) -> Self {
        Self::Decompression(value)
    }
}

impl<'data> CompressedZoneTable<'data> {
    /// Returns the compressed payload stored under a canonical key.
    pub fn payload(&self, key: &str) -> Option<&'data [u8]> {
        self.zones
            .binary_search_by(|zone| zone.key.cmp(key))
            .ok()
            .map(|idx| self.zones[idx].payload)
    }

    /// Returns the direct alias target of `key`, if `key` is an alias.
    pub fn alias_target(&self, key: &str) -> Option<&'data str> {
        self.aliases
            .binary_search_by(|alias| alias.key.cmp(key))
            .ok()
            .map(|idx| self.aliases[idx].target)
    }

    /// Returns the position of a canonical key in `zones`.
    pub fn zone_index(&self, key: &str) -> Option<usize> {
        self.zones.binary_search_by(|zone| zone.key.cmp(key)).ok()
    }

    /// Follows alias edges from `key` until a canonical key is reached.
    ///
    /// The walk is bounded by the number of keys in the table, so corrupt
    /// data with a cycle yields [`TableError::AliasCycle`] instead of
    /// looping forever.
    pub fn resolve(&self, key: &str) -> Result<&'data str, TableError> {
        let mut current = match self.zone_index(key) {
            Some(idx) => return Ok(self.zones[idx].key),
            None => self
                .alias_target(key)
                .ok_or_else(|| TableError::UnknownKey(key.into()))?,
        };
        log::debug!("{key}->{current}");

        for _ in 0..=self.key_count() {
            if let Some(idx) = self.zone_index(current) {
                return Ok(self.zones[idx].key);
            }
            let Some(next) = self.alias_target(current) else {
                return Err(TableError::UnknownKey(current.into()));
            };
            log::debug!("{current}->{next}");
            current = next;
        }
        Err(TableError::AliasCycle(key.into()))
    }

    /// Resolves `key` and returns the decompressed TZif bytes.
    pub fn decompress(&self, key: &str) -> Result<Vec<u8>, TableError> {
        let canonical = self.resolve(key)?;
        let payload = self
            .payload(canonical)
            .ok_or_else(|| TableError::UnknownKey(canonical.into()))?;
        Ok(gunzip(payload)?)
    }

    /// Iterates over every display name: canonical keys then alias keys.
    pub fn keys(&self) -> impl Iterator<Item = &'data str> + 'data {
        let zones = self.zones;
        let aliases = self.aliases;
        zones
            .iter()
            .map(|zone| zone.key)
            .chain(aliases.iter().map(|alias| alias.key))
    }

    pub fn key_count(&self) -> usize {
        self.zones.len() + self.aliases.len()
    }
}

/// Decompresses a gzip payload completely.
///
/// The decoder may report the end of a stream either with a clean end of
/// stream or with `UnexpectedEof`, depending on how the compressed length
/// lines up with its internal buffering. Both end the read.
pub(crate) fn gunzip(payload: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(payload);
    let mut out = Vec::with_capacity(payload.len() * 4);
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        match decoder.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    use super::*;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn resolve_follows_chains() {
        let payload = gzip(b"TZif-chicago");
        let zones = [CompressedZone {
            key: "America/Chicago",
            payload: &payload,
        }];
        let aliases = [
            ZoneAlias {
                key: "CST6CDT",
                target: "US/Central",
            },
            ZoneAlias {
                key: "US/Central",
                target: "America/Chicago",
            },
        ];
        let table = CompressedZoneTable {
            version: "test",
            zones: &zones,
            aliases: &aliases,
        };

        assert_eq!(table.resolve("America/Chicago").unwrap(), "America/Chicago");
        assert_eq!(table.resolve("US/Central").unwrap(), "America/Chicago");
        assert_eq!(table.resolve("CST6CDT").unwrap(), "America/Chicago");
        assert_eq!(table.decompress("CST6CDT").unwrap(), b"TZif-chicago");
    }

    #[test]
    fn resolve_unknown_and_dangling() {
        let aliases = [ZoneAlias {
            key: "Mars/Olympus",
            target: "Mars/Base",
        }];
        let table = CompressedZoneTable {
            version: "test",
            zones: &[],
            aliases: &aliases,
        };
        assert!(matches!(
            table.resolve("Nowhere"),
            Err(TableError::UnknownKey(key)) if key == "Nowhere"
        ));
        assert!(matches!(
            table.resolve("Mars/Olympus"),
            Err(TableError::UnknownKey(key)) if key == "Mars/Base"
        ));
    }

    #[test]
    fn resolve_detects_cycles() {
        let aliases = [
            ZoneAlias { key: "A", target: "B" },
            ZoneAlias { key: "B", target: "C" },
            ZoneAlias { key: "C", target: "A" },
        ];
        let table = CompressedZoneTable {
            version: "test",
            zones: &[],
            aliases: &aliases,
        };
        assert!(matches!(table.resolve("A"), Err(TableError::AliasCycle(_))));
    }

    #[test]
    fn gunzip_truncated_stream_ends_cleanly() {
        let data: Vec<u8> = (0..10_000u32).flat_map(u32::to_le_bytes).collect();
        let compressed = gzip(&data);
        assert_eq!(gunzip(&compressed).unwrap(), data);

        // Missing trailer: the decoder runs out of input mid-stream.
        let truncated = &compressed[..compressed.len() - 8];
        let partial = gunzip(truncated).unwrap();
        assert!(data.starts_with(&partial));
    }

    #[test]
    fn gunzip_rejects_garbage() {
        assert!(gunzip(b"definitely not gzip").is_err());
    }
}
