use tilth_runtime::RX_FAILURE;
use tilth_store::{TOKEN_DELETE, TOKEN_INSERT};

use crate::common::session;

#[test]
fn unit_conversion_round_trip() {
    let mut s = session();
    let id = s.open_object("climates\\USA\\Default");
    assert_eq!(s.set_value(id, "PRECIP", "mm", 0, "762"), 1);
    let inches: f64 = s.get_value(id, "PRECIP", "in", 0).unwrap().parse().unwrap();
    assert!((inches - 30.0).abs() < 0.01);
}

#[test]
fn unknown_attr_names_the_parameter() {
    let mut s = session();
    let id = s.open_object("soils\\Default");
    assert!(s.get_value(id, "NO_SUCH_PARAM", "", 0).is_none());
    assert!(s.last_error().contains("NO_SUCH_PARAM"));
    assert_eq!(s.set_value(id, "NO_SUCH_PARAM", "", 0, "1"), RX_FAILURE);
}

#[test]
fn insert_token_grows_then_accepts_the_new_row() {
    let mut s = session();
    let id = s.open_object("managements\\corn");
    assert_eq!(s.get_size(id, "OP_DATE"), 1);
    assert_eq!(s.set_value(id, "OP_DATE", "", 1, TOKEN_INSERT), 1);
    assert_eq!(s.get_size(id, "OP_DATE"), 2);
    assert_eq!(s.set_value(id, "OP_DATE", "", 1, "11/1/1"), 1);
    assert_eq!(s.get_value(id, "OP_DATE", "", 1).unwrap(), "11/1/1");
}

#[test]
fn delete_token_shifts_later_rows() {
    let mut s = session();
    let id = s.open_object("managements\\corn");
    assert_eq!(s.set_size(id, "OP_DEPTH", 3), 1);
    for (i, v) in ["1", "2", "3"].iter().enumerate() {
        s.set_value(id, "OP_DEPTH", "", i as i32, v);
    }
    assert_eq!(s.set_value(id, "OP_DEPTH", "", 0, TOKEN_DELETE), 1);
    assert_eq!(s.get_size(id, "OP_DEPTH"), 2);
    assert_eq!(s.get_value(id, "OP_DEPTH", "", 0).unwrap(), "2");
    // The sibling attr on the axis shrank too
    assert_eq!(s.get_size(id, "OP_DATE"), 2);
}

#[test]
fn cursor_follows_the_last_external_write() {
    let mut s = session();
    let id = s.open_object("managements\\corn");
    s.set_size(id, "OP_DEPTH", 3);
    s.set_value(id, "OP_DEPTH", "", 2, "9");
    assert_eq!(s.get_cursor(id, "OP_DEPTH"), 2);
    // Index -1 is the cursor query form of the same fact
    assert_eq!(s.get_value(id, "OP_DEPTH", "", -1).unwrap(), "2");
}

#[test]
fn pointer_values_keep_the_exact_path() {
    let mut s = session();
    let id = s.open_object("soils\\Default");
    assert_eq!(
        s.set_value(id, "CLIMATE_PTR", "", 0, "climates\\USA\\Wisconsin\\Dane County"),
        1
    );
    assert_eq!(
        s.get_value(id, "CLIMATE_PTR", "", 0).unwrap(),
        "climates\\USA\\Wisconsin\\Dane County"
    );
}

#[test]
fn list_values_must_match_a_choice() {
    let mut s = session();
    let id = s.open_object("managements\\corn");
    assert_eq!(s.set_value(id, "TILLAGE_TYPE", "", 0, "no-till"), 1);
    assert_eq!(s.set_value(id, "TILLAGE_TYPE", "", 0, "no-till"), 0);
    assert_eq!(s.set_value(id, "TILLAGE_TYPE", "", 0, "moldboard"), RX_FAILURE);
    assert!(s.last_error().contains("moldboard"));
    assert_eq!(s.get_value(id, "TILLAGE_TYPE", "", 0).unwrap(), "no-till");
}

#[test]
fn protected_attrs_reject_user_writes() {
    let mut s = session();
    let id = s.open_object("soils\\Default");
    assert_eq!(s.set_value(id, "READ_ONLY_ATTR", "", 0, "5"), RX_FAILURE);
    assert!(s.get_value(id, "READ_ONLY_ATTR", "", 0).is_some());
}

#[test]
fn negative_size_is_rejected() {
    let mut s = session();
    let id = s.open_object("managements\\corn");
    assert_eq!(s.set_size(id, "OP_DEPTH", -3), RX_FAILURE);
}

#[test]
fn set_size_resolves_the_attribute_to_its_axis() {
    let mut s = session();
    let id = s.open_object("managements\\corn");
    assert_eq!(s.set_size(id, "OP_DATE", 3), 1);
    assert_eq!(s.get_size(id, "OP_DATE"), 3);
    // Sibling attrs on the axis grew too
    assert_eq!(s.get_size(id, "OP_DEPTH"), 3);
    // Already at the target
    assert_eq!(s.set_size(id, "OP_DATE", 3), 0);

    // A scalar has no axis, and an axis label is not an attribute
    assert_eq!(s.set_size(id, "TILLAGE_TYPE", 2), RX_FAILURE);
    assert_eq!(s.set_size(id, "OP_DIM", 2), RX_FAILURE);
    assert!(s.last_error().contains("OP_DIM"));
}
