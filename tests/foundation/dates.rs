use tilth_foundation::SimDate;

#[test]
fn dates_parse_and_display_in_protocol_form() {
    let d: SimDate = "11/1/1".parse().unwrap();
    assert_eq!(d.to_string(), "11/1/1");
    let d: SimDate = "4/15/2".parse().unwrap();
    assert_eq!((d.month, d.day, d.year), (4, 15, 2));
}

#[test]
fn out_of_range_components_are_rejected() {
    assert!("13/1/1".parse::<SimDate>().is_err());
    assert!("0/1/1".parse::<SimDate>().is_err());
    assert!("1/32/1".parse::<SimDate>().is_err());
    assert!("1/1/0".parse::<SimDate>().is_err());
    assert!("not a date".parse::<SimDate>().is_err());
}

#[test]
fn ordinals_order_within_the_rotation() {
    let early: SimDate = "4/15/1".parse().unwrap();
    let late: SimDate = "10/20/1".parse().unwrap();
    let next_year: SimDate = "1/1/2".parse().unwrap();
    assert!(early.ordinal() < late.ordinal());
    assert!(late.ordinal() < next_year.ordinal());
}
