use tilth_catalog::Variant;
use tilth_store::{ObjectStore, OpenFlags, ReadOnly};

use crate::common::catalog;

#[test]
fn save_close_reopen_preserves_values_and_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("farm.tdb");
    {
        let mut store = ObjectStore::new(catalog());
        store.open_database(&path, ReadOnly::Writable).unwrap();
        let id = store
            .open("managements\\corn", OpenFlags::default())
            .unwrap();
        store.set_root_size(id, "OP_DATE", 3).unwrap();
        for (i, d) in ["4/15/1", "5/1/1", "10/20/1"].iter().enumerate() {
            store.set_value(id, "OP_DATE", "", Some(i), d).unwrap();
        }
        store.save_object(id).unwrap();
        store.release(id).unwrap();
        store.close_database().unwrap();
    }
    let mut store = ObjectStore::new(catalog());
    store.open_database(&path, ReadOnly::Writable).unwrap();
    let id = store
        .open("managements\\corn", OpenFlags::default())
        .unwrap();
    assert_eq!(store.attr_size(id, "OP_DATE").unwrap(), 3);
    assert_eq!(
        store
            .get_value(id, "OP_DATE", "", Some(2), Variant::Interval)
            .unwrap(),
        "10/20/1"
    );
}

#[test]
fn close_fails_while_objects_are_open() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ObjectStore::new(catalog());
    store
        .open_database(dir.path().join("t.tdb"), ReadOnly::Writable)
        .unwrap();
    let id = store.open("soils\\Default", OpenFlags::default()).unwrap();

    let err = store.close_database().unwrap_err();
    assert!(err.to_string().contains("soils\\Default"));
    // The database is still usable after the failed close
    assert!(store.read_only().is_ok());

    store.release(id).unwrap();
    store.close_database().unwrap();
    assert!(store.read_only().is_err());
}

#[test]
fn protected_database_blocks_save_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.tdb");
    {
        let mut store = ObjectStore::new(catalog());
        store.open_database(&path, ReadOnly::Writable).unwrap();
        let id = store.open("soils\\Default", OpenFlags::default()).unwrap();
        store.save_object(id).unwrap();
        store.release(id).unwrap();
        store.close_database().unwrap();
    }
    let mut store = ObjectStore::new(catalog());
    store.open_database(&path, ReadOnly::Protected).unwrap();
    let id = store.open("soils\\Default", OpenFlags::default()).unwrap();
    assert!(store.save_object(id).is_err());
    assert!(store.delete_record("soils\\Default").is_err());
}

#[test]
fn delete_record_removes_the_persisted_copy() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ObjectStore::new(catalog());
    store
        .open_database(dir.path().join("t.tdb"), ReadOnly::Writable)
        .unwrap();
    let id = store.open("soils\\Default", OpenFlags::default()).unwrap();
    store.save_object(id).unwrap();
    store.release(id).unwrap();

    store.delete_record("SOILS\\default").unwrap();
    assert!(store.delete_record("soils\\Default").is_err());
    let flags = OpenFlags {
        must_exist: true,
        ..OpenFlags::default()
    };
    assert!(store.open("soils\\Default", flags).is_err());
}
