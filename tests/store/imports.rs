use tilth_catalog::Variant;
use tilth_store::{ObjectStore, OpenFlags};

use crate::common::catalog;

#[test]
fn xml_export_reimports_losslessly() {
    let mut store = ObjectStore::new(catalog());
    let id = store
        .open("managements\\corn", OpenFlags::default())
        .unwrap();
    store.set_root_size(id, "OP_DATE", 2).unwrap();
    store
        .set_value(id, "OP_DATE", "", Some(0), "4/15/1")
        .unwrap();
    store
        .set_value(id, "OP_DATE", "", Some(1), "10/20/1")
        .unwrap();
    let xml = store.export_xml(id).unwrap();
    store.release(id).unwrap();

    let copy = store
        .open(&format!("#XML:{xml}"), OpenFlags::default())
        .unwrap();
    assert_eq!(store.attr_size(copy, "OP_DATE").unwrap(), 2);
    assert_eq!(
        store
            .get_value(copy, "OP_DATE", "", Some(1), Variant::Interval)
            .unwrap(),
        "10/20/1"
    );
}

#[test]
fn xml_file_opens_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ObjectStore::new(catalog());
    let id = store.open("soils\\Default", OpenFlags::default()).unwrap();
    store.set_value(id, "CLAY", "", Some(0), "18").unwrap();
    let xml = store.export_xml(id).unwrap();
    store.release(id).unwrap();

    let path = dir.path().join("soil.xml");
    std::fs::write(&path, xml).unwrap();
    let copy = store
        .open(&format!("#XMLFILE:{}", path.display()), OpenFlags::default())
        .unwrap();
    assert_eq!(
        store
            .get_value(copy, "CLAY", "", Some(0), Variant::Interval)
            .unwrap(),
        "18"
    );
}

#[test]
fn skeleton_objects_start_at_defaults() {
    let mut store = ObjectStore::new(catalog());
    let id = store
        .open(
            "#SKEL:object: MANAGEMENT\npath: managements\\bare\nattr: IRRIGATED\n",
            OpenFlags::default(),
        )
        .unwrap();
    assert_eq!(
        store
            .get_value(id, "IRRIGATED", "", Some(0), Variant::Interval)
            .unwrap(),
        "NaN"
    );
}

#[test]
fn fileset_round_trips_several_objects() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("farm.tfs");
    let mut store = ObjectStore::new(catalog());
    let a = store.open("soils\\A", OpenFlags::default()).unwrap();
    store.set_value(a, "CLAY", "", Some(0), "10").unwrap();
    let b = store.open("soils\\B", OpenFlags::default()).unwrap();
    store.set_value(b, "CLAY", "", Some(0), "20").unwrap();
    store.export_fileset(&archive, &[a, b]).unwrap();
    store.release(a).unwrap();
    store.release(b).unwrap();

    let first = store
        .open(&format!("#FILESET:{}", archive.display()), OpenFlags::default())
        .unwrap();
    assert_eq!(
        store
            .get_value(first, "CLAY", "", Some(0), Variant::Interval)
            .unwrap(),
        "10"
    );
    // Both archive members are open afterwards
    assert_eq!(store.open_count(), 2);
}

#[test]
fn bad_source_text_is_rejected() {
    let mut store = ObjectStore::new(catalog());
    assert!(store.open("#XML:<broken", OpenFlags::default()).is_err());
    assert!(store
        .open("#SKEL:no keys here", OpenFlags::default())
        .is_err());
}
