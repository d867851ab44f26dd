//! Emitting the compressed zone table as Rust source

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use databake::{quote, Bake, CrateEnv};
use proc_macro2::{Literal, TokenStream};

use super::{DatagenError, ZoneTableData};

/// Name of the generated file inside the data directory.
pub const GENERATED_FILE: &str = "compressed_zones.rs.data";

impl Bake for ZoneTableData {
    fn bake(&self, env: &CrateEnv) -> TokenStream {
        env.insert("tzfind_provider");
        let version = self.version.as_str();
        let zones = self.zones.iter().map(|(key, payload)| {
            let key = key.as_str();
            let payload = Literal::byte_string(payload);
            quote! {
                tzfind_provider::CompressedZone { key: #key, payload: #payload }
            }
        });
        let aliases = self.aliases.iter().map(|(key, target)| {
            let key = key.as_str();
            let target = target.as_str();
            quote! {
                tzfind_provider::ZoneAlias { key: #key, target: #target }
            }
        });
        quote! {
            tzfind_provider::CompressedZoneTable {
                version: #version,
                zones: &[#(#zones),*],
                aliases: &[#(#aliases),*],
            }
        }
    }
}

/// Renders `data` as the `compressed_zone_table!` macro source.
pub fn emit(data: &ZoneTableData) -> Result<String, syn::Error> {
    let baked = data.bake(&Default::default());
    let baked_macro = quote! {
        #[macro_export]
        macro_rules! compressed_zone_table {
            () => {
                pub const COMPRESSED_ZONE_TABLE: &'static tzfind_provider::CompressedZoneTable<'static> = &#baked;
            }
        }
    };
    let file = syn::parse_file(&baked_macro.to_string())?;
    let formatted = prettyplease::unparse(&file);
    Ok(format!(
        "//@generated\n// (by `bakeddata` binary in tzfind, using `databake`)\n\n{formatted}"
    ))
}

/// Writes the generated table into `data_path`.
///
/// The source is rendered completely before the file is created, so a
/// failed run never leaves a partial table behind.
pub fn write_table(data: &ZoneTableData, data_path: &Path) -> Result<(), DatagenError> {
    let source = emit(data).map_err(|e| {
        DatagenError::io(
            data_path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;
    fs::create_dir_all(data_path).map_err(|e| DatagenError::io(data_path, e))?;
    let generated_file = data_path.join(GENERATED_FILE);
    fs::write(&generated_file, source).map_err(|e| DatagenError::io(&generated_file, e))?;
    log::info!(
        "wrote {} zones and {} aliases to {}",
        data.zones.len(),
        data.aliases.len(),
        generated_file.display()
    );
    Ok(())
}

#[derive(serde::Serialize)]
struct DebugZone<'a> {
    raw_size: u64,
    compressed_size: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<&'a str>,
}

#[derive(serde::Serialize)]
struct DebugTable<'a> {
    version: &'a str,
    zones: BTreeMap<&'a str, DebugZone<'a>>,
}

/// Writes `compressed_zones.json` into `debug_path`, listing every zone with
/// its sizes and the aliases that point at it.
pub fn write_debug(data: &ZoneTableData, debug_path: &Path) -> Result<(), DatagenError> {
    let mut zones: BTreeMap<&str, DebugZone<'_>> = data
        .zones
        .iter()
        .map(|(key, payload)| {
            let zone = DebugZone {
                raw_size: data.raw_sizes.get(key).copied().unwrap_or_default(),
                compressed_size: payload.len(),
                aliases: Vec::new(),
            };
            (key.as_str(), zone)
        })
        .collect();
    for (alias, target) in &data.aliases {
        if let Some(zone) = zones.get_mut(target.as_str()) {
            zone.aliases.push(alias);
        }
    }
    let table = DebugTable {
        version: &data.version,
        zones,
    };

    fs::create_dir_all(debug_path).map_err(|e| DatagenError::io(debug_path, e))?;
    let debug_file = debug_path.join("compressed_zones.json");
    let file = File::create(&debug_file).map_err(|e| DatagenError::io(&debug_file, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &table)
        .map_err(|e| DatagenError::io(&debug_file, e.into()))?;
    writer
        .flush()
        .map_err(|e| DatagenError::io(&debug_file, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ZoneTableData {
        ZoneTableData {
            version: "2025a".into(),
            zones: [("America/Chicago".to_owned(), vec![0x1f, 0x8b, 0, b'"'])].into(),
            aliases: [("US/Central".to_owned(), "America/Chicago".to_owned())].into(),
            raw_sizes: [("America/Chicago".to_owned(), 1754)].into(),
        }
    }

    #[test]
    fn emitted_source_defines_singleton() {
        let source = emit(&table()).unwrap();
        assert!(source.starts_with("//@generated"));
        assert!(source.contains("macro_rules! compressed_zone_table"));
        assert!(source.contains("COMPRESSED_ZONE_TABLE"));
        assert!(source.contains("\"America/Chicago\""));
        assert!(source.contains("\"US/Central\""));
        assert!(source.contains("\"2025a\""));
        assert!(source.contains("b\""));
        syn::parse_file(&source).unwrap();
    }

    #[test]
    fn write_table_and_debug() {
        let dir = tempfile::tempdir().unwrap();
        write_table(&table(), dir.path()).unwrap();
        let written = fs::read_to_string(dir.path().join(GENERATED_FILE)).unwrap();
        assert_eq!(written, emit(&table()).unwrap());

        write_debug(&table(), &dir.path().join("debug")).unwrap();
        let json: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("debug/compressed_zones.json")).unwrap(),
        )
        .unwrap();
        let chicago = &json["zones"]["America/Chicago"];
        assert_eq!(chicago["raw_size"], 1754);
        assert_eq!(chicago["compressed_size"], 4);
        assert_eq!(chicago["aliases"][0], "US/Central");
        assert_eq!(json["version"], "2025a");
    }
}
