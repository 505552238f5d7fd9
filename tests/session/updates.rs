use tilth_engine::CalcSpec;
use tilth_foundation::Value;
use tilth_runtime::RX_FAILURE;

use crate::common::session;

fn erodibility() -> CalcSpec {
    CalcSpec::new("ERODIBILITY", ["CLAY"], |ctx| {
        let clay = ctx.input("CLAY")?.as_number().unwrap_or(0.0);
        Ok(Value::Float(clay / 100.0))
    })
}

#[test]
fn derived_attrs_settle_before_a_read() {
    let mut s = session();
    s.register_calc(erodibility()).unwrap();
    let id = s.open_object("soils\\Default");

    assert_eq!(s.set_value(id, "CLAY", "", 0, "40"), 1);
    assert_eq!(s.get_value(id, "ERODIBILITY", "", 0).unwrap(), "0.4");

    // A fresh input write settles again at the next boundary read
    s.set_autorun(false);
    s.set_value(id, "CLAY", "", 0, "50");
    assert_eq!(s.get_value(id, "ERODIBILITY", "", 0).unwrap(), "0.5");
}

#[test]
fn pointer_chained_inputs_recompute_through_the_boundary() {
    let mut s = session();
    s.register_calc(CalcSpec::new(
        "ERODIBILITY",
        ["#RD:CLIMATE_PTR:PRECIP"],
        |ctx| {
            let p = ctx
                .input("#RD:CLIMATE_PTR:PRECIP")?
                .as_number()
                .unwrap_or(0.0);
            Ok(Value::Float(p / 100.0))
        },
    ))
    .unwrap();
    let soil = s.open_object("soils\\Default");
    let climate = s.open_object("climates\\USA\\Default");
    assert_eq!(
        s.set_value(soil, "CLIMATE_PTR", "", 0, "climates\\USA\\Default"),
        1
    );

    // A write on the climate reaches the soil's derived attr
    assert_eq!(s.set_value(climate, "PRECIP", "", 0, "40"), 1);
    assert_eq!(s.get_value(soil, "ERODIBILITY", "", 0).unwrap(), "0.4");

    assert_eq!(s.set_value(climate, "PRECIP", "", 0, "70"), 1);
    assert_eq!(s.get_value(soil, "ERODIBILITY", "", 0).unwrap(), "0.7");
}

#[test]
fn finish_updates_is_idempotent() {
    let mut s = session();
    s.register_calc(erodibility()).unwrap();
    let id = s.open_object("soils\\Default");
    s.set_value(id, "CLAY", "", 0, "30");
    assert_eq!(s.finish_updates(), 1);
    assert_eq!(s.finish_updates(), 1);
    assert_eq!(s.get_value(id, "ERODIBILITY", "", 0).unwrap(), "0.3");
}

#[test]
fn lock_nesting_across_the_boundary() {
    let mut s = session();
    assert_eq!(s.lock_update(), 1);
    assert_eq!(s.lock_update(), 2);
    assert_eq!(s.run_updates(), 0);
    assert_eq!(s.unlock_update(), 1);
    assert_eq!(s.unlock_update(), 0);
    assert_eq!(s.run_updates(), 1);
    assert_eq!(s.unlock_update(), RX_FAILURE);
}

#[test]
fn set_autorun_reports_the_previous_setting() {
    let mut s = session();
    assert_eq!(s.set_autorun(false), 1);
    assert_eq!(s.set_autorun(true), 0);
}

#[test]
fn duplicate_calc_registration_fails() {
    let mut s = session();
    s.register_calc(erodibility()).unwrap();
    assert!(s.register_calc(erodibility()).is_err());
}
