use tilth_foundation::{ObjectPath, RemotePath};

#[test]
fn path_identity_ignores_case_and_separator() {
    let a = ObjectPath::parse("Climates/USA/Dane County").unwrap();
    let b = ObjectPath::parse("climates\\usa\\dane county").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.full(), "Climates\\USA\\Dane County");
}

#[test]
fn projections_cover_every_find_field_shape() {
    let p = ObjectPath::parse("climates\\USA\\Wisconsin\\Dane County").unwrap();
    assert_eq!(p.table(), "climates");
    assert_eq!(p.name(), "Dane County");
    assert_eq!(p.folder(), "USA\\Wisconsin");
    assert_eq!(p.right(), "USA\\Wisconsin\\Dane County");
    assert_eq!(p.left(), "climates\\USA\\Wisconsin");
    assert_eq!(p.outer(), "climates\\Dane County");
    assert_eq!(p.depth(), 4);
}

#[test]
fn table_strip_and_reattach_round_trip() {
    let p = ObjectPath::parse("climates\\USA\\Default").unwrap();
    let stripped = p.strip_table("climates").unwrap();
    let back = ObjectPath::with_table("climates", &stripped).unwrap();
    assert_eq!(p, back);
}

mod properties {
    use proptest::prelude::*;
    use tilth_foundation::ObjectPath;

    fn component() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9 ]{0,12}"
    }

    proptest! {
        #[test]
        fn reparsing_the_full_text_is_lossless(
            parts in prop::collection::vec(component(), 1..5)
        ) {
            let text = parts.join("\\");
            let p = ObjectPath::parse(&text).unwrap();
            let again = ObjectPath::parse(p.full()).unwrap();
            prop_assert_eq!(&p, &again);
            prop_assert_eq!(p.depth(), parts.len());
        }

        #[test]
        fn keys_are_case_insensitive(
            parts in prop::collection::vec(component(), 1..5)
        ) {
            let text = parts.join("\\");
            let upper = ObjectPath::parse(&text.to_ascii_uppercase()).unwrap();
            let lower = ObjectPath::parse(&text.to_ascii_lowercase()).unwrap();
            prop_assert_eq!(upper.key(), lower.key());
        }
    }
}

#[test]
fn remote_names_parse_into_hops() {
    let r = RemotePath::parse("#RD:PROFILE_PTR:SOIL_PTR:CLAY")
        .unwrap()
        .unwrap();
    assert_eq!(r.hops, vec!["PROFILE_PTR", "SOIL_PTR"]);
    assert_eq!(r.attr, "CLAY");
    assert!(RemotePath::parse("CLAY").unwrap().is_none());
    assert!(RemotePath::parse("#RD:BROKEN").is_err());
}
