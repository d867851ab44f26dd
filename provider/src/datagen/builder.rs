//! Deduplicating compression of TZif files

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use flate2::{write::GzEncoder, Compression};
use rustc_hash::FxHashMap;

use super::{DatagenError, ZoneTableData};

const COMPRESS_CHUNK_SIZE: usize = 4096;

/// What identifies a file as a copy of another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    /// Device and inode, when the platform exposes them.
    pub device_inode: Option<(u64, u64)>,
}

impl FileIdentity {
    #[cfg(unix)]
    fn from_metadata(metadata: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            device_inode: Some((metadata.dev(), metadata.ino())),
        }
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &fs::Metadata) -> Self {
        Self { device_inode: None }
    }
}

/// A TZif file read from disk, before compression.
#[derive(Debug, Clone)]
pub struct RuleFile {
    pub key: String,
    pub path: PathBuf,
    pub len: u64,
    pub identity: FileIdentity,
    pub contents: Vec<u8>,
}

impl RuleFile {
    pub fn read(key: &str, path: &Path) -> Result<Self, DatagenError> {
        // `fs::metadata` follows symlinks, so links share their target's identity.
        let metadata = fs::metadata(path).map_err(|e| DatagenError::io(path, e))?;
        let mut contents = Vec::with_capacity(metadata.len() as usize);
        File::open(path)
            .and_then(|mut file| file.read_to_end(&mut contents))
            .map_err(|e| DatagenError::io(path, e))?;
        Ok(Self {
            key: key.to_owned(),
            path: path.to_path_buf(),
            len: metadata.len(),
            identity: FileIdentity::from_metadata(&metadata),
            contents,
        })
    }
}

/// The outcome of adding one file to a [`ZoneTableBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packed {
    /// The file was compressed and stored under its own key.
    Zone { compressed_len: usize },
    /// The file duplicates `target` and was recorded as an alias.
    Alias { target: String },
}

/// Accumulates compressed zones and aliases for one packaging run.
///
/// The first file seen with given contents becomes canonical. Feed keys in
/// sorted order (as [`super::scan`] returns them) for a stable result.
#[derive(Debug, Default)]
pub struct ZoneTableBuilder {
    version: String,
    zones: BTreeMap<String, Vec<u8>>,
    aliases: BTreeMap<String, String>,
    raw_sizes: BTreeMap<String, u64>,
    by_identity: FxHashMap<(u64, u64), String>,
    by_contents: FxHashMap<Vec<u8>, String>,
}

impl ZoneTableBuilder {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Reads and packages the file at `path` under `key`.
    pub fn add(&mut self, key: &str, path: &Path) -> Result<Packed, DatagenError> {
        let file = RuleFile::read(key, path)?;
        self.add_file(file)
    }

    pub fn add_file(&mut self, file: RuleFile) -> Result<Packed, DatagenError> {
        if let Some(target) = self.duplicate_of(&file) {
            log::info!("added alias: {target} = {}", file.key);
            self.aliases.insert(file.key, target.clone());
            return Ok(Packed::Alias { target });
        }

        let compressed = compress(&file.contents).map_err(|e| DatagenError::io(&file.path, e))?;
        let compressed_len = compressed.len();
        log::info!(
            "added file: {} ({}, {} -> {compressed_len} bytes)",
            file.key,
            file.path.display(),
            file.len
        );

        if let Some(device_inode) = file.identity.device_inode {
            self.by_identity.insert(device_inode, file.key.clone());
        }
        self.by_contents.insert(file.contents, file.key.clone());
        self.raw_sizes.insert(file.key.clone(), file.len);
        self.zones.insert(file.key, compressed);
        Ok(Packed::Zone { compressed_len })
    }

    /// Records an alias edge that did not come from file identity, e.g. a
    /// link listed in a backward file.
    pub fn add_alias(&mut self, key: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(key.into(), target.into());
    }

    fn duplicate_of(&self, file: &RuleFile) -> Option<String> {
        file.identity
            .device_inode
            .and_then(|device_inode| self.by_identity.get(&device_inode))
            .or_else(|| self.by_contents.get(&file.contents))
            .cloned()
    }

    /// Finishes the run.
    ///
    /// Every alias is rewritten to point directly at a stored zone. A cycle
    /// or an alias to a missing key fails the whole build, since a partial
    /// table would silently drop zones.
    pub fn build(self) -> Result<ZoneTableData, DatagenError> {
        let bound = self.zones.len() + self.aliases.len();
        let mut flattened = BTreeMap::new();
        for (alias, target) in &self.aliases {
            let mut current = target;
            let mut steps = 0;
            while !self.zones.contains_key(current) {
                current = self
                    .aliases
                    .get(current)
                    .ok_or_else(|| DatagenError::DanglingAlias {
                        alias: alias.clone(),
                        target: current.clone(),
                    })?;
                steps += 1;
                if steps > bound {
                    return Err(DatagenError::AliasCycle(alias.clone()));
                }
            }
            flattened.insert(alias.clone(), current.clone());
        }

        Ok(ZoneTableData {
            version: self.version,
            zones: self.zones,
            aliases: flattened,
            raw_sizes: self.raw_sizes,
        })
    }
}

/// Gzip compresses `data`, feeding the encoder in fixed-size chunks.
pub(crate) fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    for chunk in data.chunks(COMPRESS_CHUNK_SIZE) {
        encoder.write_all(chunk)?;
    }
    encoder.finish()
}
