//! Building the compressed zone table from a zoneinfo directory
//!
//! The pipeline is a full rebuild on every run:
//!
//!   - [`scan`] collects every TZif file under a root directory.
//!   - [`ZoneTableBuilder`] compresses each unique file once and records
//!     byte-identical files as aliases.
//!   - [`emit`] turns the result into the `compressed_zones.rs.data` source
//!     file that `compiled_data` includes.
//!

use std::{
    collections::BTreeMap,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use crate::{CompressedZone, CompressedZoneTable, ZoneAlias};

mod builder;
mod emit;
mod scan;

pub use builder::{FileIdentity, Packed, RuleFile, ZoneTableBuilder};
pub use emit::{emit, write_debug, write_table, GENERATED_FILE};
pub use scan::scan;

#[derive(Debug)]
pub enum DatagenError {
    Io { path: PathBuf, source: io::Error },
    /// An alias chain loops back on itself.
    AliasCycle(String),
    /// An alias points at a key that was never packaged.
    DanglingAlias { alias: String, target: String },
}

impl DatagenError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for DatagenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::AliasCycle(key) => write!(f, "alias cycle through {key}"),
            Self::DanglingAlias { alias, target } => {
                write!(f, "alias {alias} points at missing zone {target}")
            }
        }
    }
}

impl std::error::Error for DatagenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DatagenError> for io::Error {
    fn from(value: DatagenError) -> Self {
        match value {
            DatagenError::Io { source, .. } => source,
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

/// The owned result of a packaging run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneTableData {
    pub version: String,
    /// Canonical key to gzip compressed TZif bytes.
    pub zones: BTreeMap<String, Vec<u8>>,
    /// Alias key to canonical key.
    pub aliases: BTreeMap<String, String>,
    /// Uncompressed size of every canonical zone, kept for debug output.
    pub raw_sizes: BTreeMap<String, u64>,
}

impl ZoneTableData {
    /// Scans `tzdata_path` and packages every TZif file found.
    pub fn build(tzdata_path: &Path) -> Result<Self, DatagenError> {
        let files = scan(tzdata_path)?;
        let mut builder = ZoneTableBuilder::new(read_version(tzdata_path));
        for (key, path) in &files {
            builder.add(key, path)?;
        }
        builder.build()
    }

    /// Borrows this data as the runtime table type.
    ///
    /// The returned view owns the slices the table points into.
    pub fn view(&self) -> ZoneTableView<'_> {
        ZoneTableView {
            version: &self.version,
            zones: self
                .zones
                .iter()
                .map(|(key, payload)| CompressedZone { key, payload })
                .collect(),
            aliases: self
                .aliases
                .iter()
                .map(|(key, target)| ZoneAlias { key, target })
                .collect(),
        }
    }
}

/// Backing storage for a [`CompressedZoneTable`] borrowed from
/// [`ZoneTableData`].
#[derive(Debug, Clone)]
pub struct ZoneTableView<'data> {
    version: &'data str,
    zones: Vec<CompressedZone<'data>>,
    aliases: Vec<ZoneAlias<'data>>,
}

impl ZoneTableView<'_> {
    pub fn table(&self) -> CompressedZoneTable<'_> {
        CompressedZoneTable {
            version: self.version,
            zones: &self.zones,
            aliases: &self.aliases,
        }
    }
}

/// Reads the TZDB version shipped alongside compiled zoneinfo.
///
/// Looks for a `version` file first, then for the `# version` header of
/// `tzdata.zi`.
pub fn read_version(tzdata_path: &Path) -> String {
    if let Ok(version) = fs::read_to_string(tzdata_path.join("version")) {
        return version.trim().to_owned();
    }
    fs::read_to_string(tzdata_path.join("tzdata.zi"))
        .ok()
        .and_then(|zi| {
            zi.lines()
                .next()
                .and_then(|line| line.strip_prefix("# version "))
                .map(|version| version.trim().to_owned())
        })
        .unwrap_or_else(|| "unknown".to_owned())
}
