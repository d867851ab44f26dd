use std::{io, path::Path};

use tzfind_provider::datagen::{write_debug, write_table, ZoneTableData};

fn write_data_file_with_debug(data_path: &Path, data: &ZoneTableData) -> io::Result<()> {
    let debug_path = data_path.join("debug");
    write_debug(data, &debug_path)?;
    write_table(data, data_path)?;
    Ok(())
}

fn main() -> io::Result<()> {
    env_logger::init();

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let workspace_dir = manifest_dir
        .parent()
        .and_then(Path::parent)
        .ok_or_else(|| io::Error::other("bakeddata must live in <workspace>/tools/bakeddata"))?;

    // An absolute TZDATA_DIR (e.g. /usr/share/zoneinfo) replaces the join.
    let tzdata_input = std::env::var("TZDATA_DIR").unwrap_or("tzdata".into());
    let tzdata_dir = workspace_dir.join(tzdata_input);
    log::info!("packaging zoneinfo from {}", tzdata_dir.display());

    let data = ZoneTableData::build(&tzdata_dir)?;
    log::info!(
        "tzdata {}: {} zones, {} aliases",
        data.version,
        data.zones.len(),
        data.aliases.len()
    );

    write_data_file_with_debug(&workspace_dir.join("provider/src/data"), &data)
}
