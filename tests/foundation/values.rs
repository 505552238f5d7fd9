use std::collections::HashSet;

use tilth_foundation::{EntrySentinel, Value};

#[test]
fn values_work_as_hash_keys() {
    let mut seen = HashSet::new();
    assert!(seen.insert(Value::Float(1.5)));
    assert!(!seen.insert(Value::Float(1.5)));
    assert!(seen.insert(Value::Int(1)));
    // NaN is a usable key thanks to bit equality
    assert!(seen.insert(Value::Float(f64::NAN)));
    assert!(!seen.insert(Value::Float(f64::NAN)));
}

#[test]
fn typed_accessors_reject_other_types() {
    let v = Value::from("tillage");
    assert_eq!(v.as_str(), Some("tillage"));
    assert_eq!(v.as_int(), None);
    assert_eq!(v.as_number(), None);
    assert_eq!(Value::Int(3).as_number(), Some(3.0));
}

#[test]
fn sentinel_tokens_are_case_insensitive() {
    assert_eq!(
        EntrySentinel::from_token("#entry_default"),
        Some(EntrySentinel::Default)
    );
    assert_eq!(EntrySentinel::from_token("#ENTRY_WHAT"), None);
    assert_eq!(EntrySentinel::Custom.token(), "#ENTRY_CUSTOM");
}
