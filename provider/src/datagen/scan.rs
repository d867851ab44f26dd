//! Discovering TZif files in a zoneinfo tree

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, Read},
    path::{Component, Path, PathBuf},
};

use walkdir::{DirEntry, WalkDir};

use super::DatagenError;
use crate::MAGIC;

/// Directories holding alternate builds of the same zones.
const VARIANT_DIRECTORIES: [&str; 2] = ["posix", "right"];

/// Collects every TZif file under `root`, keyed by its `/` separated path
/// relative to `root`.
///
/// Files are skipped, not rejected, when they are implementation files
/// (lowercase first letter, e.g. `zone.tab` or `tzdata.zi`), when they live
/// in a `posix` or `right` variant directory, or when they do not start with
/// the TZif magic.
pub fn scan(root: &Path) -> Result<BTreeMap<String, PathBuf>, DatagenError> {
    // Fail up front on a missing or unreadable root.
    std::fs::read_dir(root).map_err(|e| DatagenError::io(root, e))?;

    let mut files = BTreeMap::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let skip = is_variant_directory(entry);
            if skip {
                log::debug!("skipping directory: {}", entry.path().display());
            }
            !skip
        });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Some installs link `posix` back to the root.
            Err(e) if e.loop_ancestor().is_some() => {
                log::debug!("skipping directory loop: {e}");
                continue;
            }
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                return Err(DatagenError::Io {
                    path,
                    source: e.into(),
                });
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };

        if is_implementation_file(relative) {
            log::debug!("skipping file: {}", path.display());
            continue;
        }

        let Some(key) = key_for(relative) else {
            log::debug!("skipping non-utf8 path: {}", path.display());
            continue;
        };

        if !has_magic(path).map_err(|e| DatagenError::io(path, e))? {
            log::debug!("skipping non-tz file: {}", path.display());
            continue;
        }

        log::info!("found tzdata path: {}", path.display());
        files.insert(key, path.to_path_buf());
    }
    Ok(files)
}

fn is_implementation_file(relative: &Path) -> bool {
    relative
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.chars().next())
        .is_some_and(|c| c.is_ascii_lowercase())
}

fn is_variant_directory(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| VARIANT_DIRECTORIES.contains(&name))
}

fn key_for(relative: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            _ => return None,
        }
    }
    Some(segments.join("/"))
}

fn has_magic(path: &Path) -> io::Result<bool> {
    let mut header = [0u8; 4];
    match File::open(path)?.read_exact(&mut header) {
        Ok(()) => Ok(&header == MAGIC),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn scan_filters_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "America/New_York", b"TZif2...");
        write(root, "America/Argentina/Buenos_Aires", b"TZif2...");
        write(root, "UTC", b"TZif2...");
        write(root, "zone.tab", b"TZif looks like one but is lowercase");
        write(root, "posix/America/New_York", b"TZif2...");
        write(root, "right/UTC", b"TZif2...");
        write(root, "README", b"not a zone");
        write(root, "Empty", b"");

        let files = scan(root).unwrap();
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["America/Argentina/Buenos_Aires", "America/New_York", "UTC"]
        );
        assert_eq!(files["UTC"], root.join("UTC"));
    }

    #[test]
    fn scan_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(scan(&missing), Err(DatagenError::Io { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn scan_skips_linked_variant_trees() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "Europe/Paris", b"TZif2...");
        write(root, "Etc/right/UTC", b"TZif2...");
        // Debian style `posix -> .` link.
        std::os::unix::fs::symlink(".", root.join("posix")).unwrap();

        let files = scan(root).unwrap();
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Europe/Paris"]);
    }
}
