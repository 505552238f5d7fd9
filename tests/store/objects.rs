use tilth_foundation::ObjectPath;
use tilth_store::{ObjectStore, OpenFlags};

use crate::common::catalog;

#[test]
fn refcount_never_goes_negative() {
    let mut store = ObjectStore::new(catalog());
    let id = store.open("soils\\Default", OpenFlags::default()).unwrap();
    assert_eq!(store.get(id).unwrap().refs(), 1);
    assert_eq!(store.release(id).unwrap(), 0);
    // The handle is stale now; further releases fail rather than
    // producing a negative count
    assert!(store.release(id).is_err());
}

#[test]
fn open_by_equivalent_spellings_shares_the_object() {
    let mut store = ObjectStore::new(catalog());
    let a = store.open("soils\\Default", OpenFlags::default()).unwrap();
    let b = store.open("soils/default", OpenFlags::default()).unwrap();
    assert_eq!(a, b);
    assert_eq!(store.get(a).unwrap().refs(), 2);
}

#[test]
fn release_at_one_closes_and_invalidates_handles() {
    let mut store = ObjectStore::new(catalog());
    let id = store.open("soils\\Default", OpenFlags::default()).unwrap();
    store.addref(id).unwrap();
    assert_eq!(store.release(id).unwrap(), 1);
    assert!(store.get(id).is_ok());
    assert_eq!(store.release(id).unwrap(), 0);
    assert!(store.get(id).is_err());
    let path = ObjectPath::parse("soils\\Default").unwrap();
    assert!(store.find_open(&path).is_none());
}

#[test]
fn slot_reuse_does_not_resurrect_old_handles() {
    let mut store = ObjectStore::new(catalog());
    let first = store.open("soils\\A", OpenFlags::default()).unwrap();
    store.release(first).unwrap();
    let second = store.open("soils\\B", OpenFlags::default()).unwrap();
    assert_eq!(first.index, second.index);
    assert_ne!(first, second);
    assert!(store.get(first).is_err());
    assert_eq!(store.get(second).unwrap().path().full(), "soils\\B");
}

#[test]
fn unknown_table_cannot_open_fresh() {
    let mut store = ObjectStore::new(catalog());
    let err = store
        .open("mystery\\thing", OpenFlags::default())
        .unwrap_err();
    assert!(err.to_string().contains("mystery"));
}
