use std::{fs, path::Path};

use tzfind_provider::{
    datagen::{emit, scan, ZoneTableData},
    TableError,
};

fn tzif(name: &str) -> &'static [u8] {
    jiff_tzdb::get(name).unwrap().1
}

fn write(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn zoneinfo_fixture(root: &Path) {
    write(root, "America/New_York", tzif("America/New_York"));
    write(root, "America/Chicago", tzif("America/Chicago"));
    write(root, "Europe/Paris", tzif("Europe/Paris"));
    // A byte-identical copy, as older tzdata installs ship them.
    write(root, "US/Eastern", tzif("America/New_York"));
    write(root, "posix/America/New_York", tzif("America/New_York"));
    write(root, "right/Europe/Paris", tzif("Europe/Paris"));
    write(root, "zone1970.tab", b"#country-\ncodes\n");
    write(root, "Factory.txt", b"not a TZif file");
    fs::write(root.join("version"), "2025b\n").unwrap();
}

#[test]
fn package_zoneinfo_directory() {
    let dir = tempfile::tempdir().unwrap();
    zoneinfo_fixture(dir.path());

    let data = ZoneTableData::build(dir.path()).unwrap();
    assert_eq!(data.version, "2025b");
    assert_eq!(
        data.zones.keys().collect::<Vec<_>>(),
        ["America/Chicago", "America/New_York", "Europe/Paris"]
    );
    assert_eq!(data.aliases.len(), 1);
    assert_eq!(data.aliases["US/Eastern"], "America/New_York");

    let view = data.view();
    let table = view.table();
    for key in ["America/Chicago", "America/New_York", "Europe/Paris"] {
        assert_eq!(table.resolve(key).unwrap(), key);
        assert_eq!(table.decompress(key).unwrap(), tzif(key));
    }
    assert_eq!(
        table.decompress("US/Eastern").unwrap(),
        table.decompress("America/New_York").unwrap()
    );

    let names: Vec<&str> = table.keys().collect();
    assert!(!names.contains(&"Factory.txt"));
    assert!(!names.contains(&"zone1970.tab"));
    assert!(matches!(
        table.resolve("Factory.txt"),
        Err(TableError::UnknownKey(_))
    ));
}

#[cfg(unix)]
#[test]
fn package_links() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "Etc/UTC", tzif("Etc/UTC"));
    fs::hard_link(root.join("Etc/UTC"), root.join("UTC")).unwrap();
    fs::create_dir_all(root.join("Etc")).unwrap();
    std::os::unix::fs::symlink(root.join("Etc/UTC"), root.join("Etc/Zulu")).unwrap();

    let files = scan(root).unwrap();
    assert_eq!(files.len(), 3);

    let data = ZoneTableData::build(root).unwrap();
    assert_eq!(data.zones.keys().collect::<Vec<_>>(), ["Etc/UTC"]);
    assert_eq!(data.aliases["UTC"], "Etc/UTC");
    assert_eq!(data.aliases["Etc/Zulu"], "Etc/UTC");
}

#[test]
fn emitted_table_is_valid_rust() {
    let dir = tempfile::tempdir().unwrap();
    zoneinfo_fixture(dir.path());
    let data = ZoneTableData::build(dir.path()).unwrap();
    let source = emit(&data).unwrap();
    let file = syn::parse_file(&source);
    assert!(file.is_ok(), "{source}");
}
