use tilth_catalog::Variant;
use tilth_store::{ObjectStore, OpenFlags, SetOutcome, TOKEN_DELETE, TOKEN_INSERT};

use crate::common::catalog;

fn management(store: &mut ObjectStore) -> tilth_foundation::ObjectId {
    store
        .open("managements\\corn", OpenFlags::default())
        .unwrap()
}

#[test]
fn typed_round_trips_preserve_protocol_text() {
    let mut store = ObjectStore::new(catalog());
    let id = management(&mut store);

    store.set_value(id, "IRRIGATED", "", Some(0), "yes").unwrap();
    assert_eq!(
        store
            .get_value(id, "IRRIGATED", "", Some(0), Variant::Interval)
            .unwrap(),
        "yes"
    );

    store
        .set_value(id, "TILLAGE_TYPE", "", Some(0), "no-till")
        .unwrap();
    assert_eq!(
        store
            .get_value(id, "TILLAGE_TYPE", "", Some(0), Variant::Interval)
            .unwrap(),
        "no-till"
    );

    store
        .set_value(id, "OP_DATE", "", Some(0), "11/1/1")
        .unwrap();
    assert_eq!(
        store
            .get_value(id, "OP_DATE", "", Some(0), Variant::Interval)
            .unwrap(),
        "11/1/1"
    );
}

#[test]
fn pointer_set_then_get_returns_the_exact_path() {
    let mut store = ObjectStore::new(catalog());
    let id = store.open("soils\\Default", OpenFlags::default()).unwrap();
    store
        .set_value(
            id,
            "CLIMATE_PTR",
            "",
            Some(0),
            "climates\\USA\\Wisconsin\\Dane County",
        )
        .unwrap();
    assert_eq!(
        store
            .get_value(id, "CLIMATE_PTR", "", Some(0), Variant::Interval)
            .unwrap(),
        "climates\\USA\\Wisconsin\\Dane County"
    );
}

#[test]
fn rejected_values_leave_the_cell_untouched() {
    let mut store = ObjectStore::new(catalog());
    let id = management(&mut store);
    store
        .set_value(id, "TILLAGE_TYPE", "", Some(0), "no-till")
        .unwrap();
    assert!(store
        .set_value(id, "TILLAGE_TYPE", "", Some(0), "moldboard")
        .is_err());
    assert_eq!(
        store
            .get_value(id, "TILLAGE_TYPE", "", Some(0), Variant::Interval)
            .unwrap(),
        "no-till"
    );
}

#[test]
fn insert_then_set_at_the_new_row() {
    let mut store = ObjectStore::new(catalog());
    let id = management(&mut store);
    assert_eq!(store.attr_size(id, "OP_DATE").unwrap(), 1);
    assert_eq!(
        store
            .set_value(id, "OP_DATE", "", Some(1), TOKEN_INSERT)
            .unwrap(),
        SetOutcome::Changed
    );
    assert_eq!(store.attr_size(id, "OP_DATE").unwrap(), 2);
    store
        .set_value(id, "OP_DATE", "", Some(1), "11/1/1")
        .unwrap();
    assert_eq!(
        store
            .get_value(id, "OP_DATE", "", Some(1), Variant::Interval)
            .unwrap(),
        "11/1/1"
    );
}

#[test]
fn resize_cascades_to_every_attr_on_the_axis() {
    let mut store = ObjectStore::new(catalog());
    let id = management(&mut store);
    store.set_root_size(id, "OP_DEPTH", 4).unwrap();
    assert_eq!(store.attr_size(id, "OP_DATE").unwrap(), 4);
    assert_eq!(store.attr_size(id, "OP_DEPTH").unwrap(), 4);

    for (i, v) in ["1", "2", "3", "4"].iter().enumerate() {
        store.set_value(id, "OP_DEPTH", "", Some(i), v).unwrap();
    }
    store
        .set_value(id, "OP_DEPTH", "", Some(1), TOKEN_DELETE)
        .unwrap();
    // Later rows shift down by one
    assert_eq!(
        store
            .get_value(id, "OP_DEPTH", "", Some(1), Variant::Interval)
            .unwrap(),
        "3"
    );
    assert_eq!(store.attr_size(id, "OP_DATE").unwrap(), 3);
}

#[test]
fn no_resize_attrs_reject_the_tokens() {
    let mut store = ObjectStore::new(catalog());
    let id = management(&mut store);
    assert!(store
        .set_value(id, "FIXED_ROWS", "", Some(0), TOKEN_INSERT)
        .is_err());
    assert!(store
        .set_value(id, "FIXED_ROWS", "", Some(0), TOKEN_DELETE)
        .is_err());
}

#[test]
fn shrink_is_stepwise_from_the_tail() {
    let mut store = ObjectStore::new(catalog());
    let id = management(&mut store);
    store.set_root_size(id, "OP_DEPTH", 5).unwrap();
    for (i, v) in ["1", "2", "3", "4", "5"].iter().enumerate() {
        store.set_value(id, "OP_DEPTH", "", Some(i), v).unwrap();
    }
    store.set_root_size(id, "OP_DEPTH", 2).unwrap();
    assert_eq!(store.attr_size(id, "OP_DEPTH").unwrap(), 2);
    // Head rows survive a tail shrink
    assert_eq!(
        store
            .get_value(id, "OP_DEPTH", "", Some(0), Variant::Interval)
            .unwrap(),
        "1"
    );
    assert_eq!(
        store
            .get_value(id, "OP_DEPTH", "", Some(1), Variant::Interval)
            .unwrap(),
        "2"
    );
}

#[test]
fn cumulative_reads_sum_through_the_index() {
    let mut store = ObjectStore::new(catalog());
    let id = management(&mut store);
    store.set_root_size(id, "OP_DEPTH", 3).unwrap();
    for (i, v) in ["1.5", "2", "3"].iter().enumerate() {
        store.set_value(id, "OP_DEPTH", "", Some(i), v).unwrap();
    }
    assert_eq!(
        store
            .get_value(id, "OP_DEPTH", "", Some(2), Variant::Cumulative)
            .unwrap(),
        "6.5"
    );
    // A missing cell poisons the running sum
    store
        .set_value(id, "OP_DEPTH", "", Some(1), "NaN")
        .unwrap();
    assert_eq!(
        store
            .get_value(id, "OP_DEPTH", "", Some(2), Variant::Cumulative)
            .unwrap(),
        "NaN"
    );
}

#[test]
fn unit_round_trip_through_both_directions() {
    let mut store = ObjectStore::new(catalog());
    let id = store
        .open("climates\\USA\\Default", OpenFlags::default())
        .unwrap();
    store.set_value(id, "PRECIP", "mm", Some(0), "762").unwrap();
    let inches: f64 = store
        .get_value(id, "PRECIP", "in", Some(0), Variant::Interval)
        .unwrap()
        .parse()
        .unwrap();
    assert!((inches - 30.0).abs() < 0.01);
}
