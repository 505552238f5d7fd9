use tilth_engine::CalcSpec;
use tilth_foundation::Value;
use tilth_store::OpenFlags;

use crate::common::setup;

fn seg_ls() -> CalcSpec {
    CalcSpec::new("SEG_LS", ["SEG_LENGTH", "SEG_STEEPNESS"], |ctx| {
        let l = ctx.input("SEG_LENGTH")?.as_number().unwrap_or(0.0);
        let s = ctx.input("SEG_STEEPNESS")?.as_number().unwrap_or(0.0);
        Ok(Value::Float(l * s))
    })
}

#[test]
fn dimensioned_output_recomputes_every_row() {
    let (mut engine, mut store, id) = setup();
    engine.register(seg_ls()).unwrap();

    store.set_root_size(id, "SEG_LENGTH", 3).unwrap();
    for (i, (l, s)) in [("100", "0.1"), ("150", "0.2"), ("80", "0.05")]
        .iter()
        .enumerate()
    {
        store.set_value(id, "SEG_LENGTH", "", Some(i), l).unwrap();
        store.set_value(id, "SEG_STEEPNESS", "", Some(i), s).unwrap();
    }
    engine
        .note_external_write(&mut store, id, "SEG_STEEPNESS")
        .unwrap();

    let expected = [10.0, 30.0, 4.0];
    for (i, want) in expected.iter().enumerate() {
        assert_eq!(store.cell(id, "SEG_LS", i).unwrap().as_float(), Some(*want));
    }
}

#[test]
fn aggregate_calc_pulls_derived_rows() {
    let (mut engine, mut store, id) = setup();
    engine.register(seg_ls()).unwrap();
    engine
        .register(CalcSpec::new("TOTAL_LS", ["SEG_LS"], |ctx| {
            let mut total = 0.0;
            for i in 0..ctx.input_size("SEG_LS")? {
                total += ctx.input_at("SEG_LS", i)?.as_number().unwrap_or(0.0);
            }
            Ok(Value::Float(total))
        }))
        .unwrap();

    store.set_root_size(id, "SEG_LENGTH", 2).unwrap();
    store.set_value(id, "SEG_LENGTH", "", Some(0), "100").unwrap();
    store
        .set_value(id, "SEG_STEEPNESS", "", Some(0), "0.1")
        .unwrap();
    store.set_value(id, "SEG_LENGTH", "", Some(1), "50").unwrap();
    store
        .set_value(id, "SEG_STEEPNESS", "", Some(1), "0.2")
        .unwrap();

    let total = engine.evaluate(&mut store, id, "TOTAL_LS", 0).unwrap();
    assert_eq!(total.as_float(), Some(20.0));
}

#[test]
fn grown_axis_gets_its_new_rows_computed() {
    let (mut engine, mut store, id) = setup();
    engine.register(seg_ls()).unwrap();

    store.set_root_size(id, "SEG_LENGTH", 2).unwrap();
    store.set_value(id, "SEG_LENGTH", "", Some(0), "100").unwrap();
    store
        .set_value(id, "SEG_STEEPNESS", "", Some(0), "0.1")
        .unwrap();
    engine
        .note_external_write(&mut store, id, "SEG_LENGTH")
        .unwrap();

    store.set_root_size(id, "SEG_LENGTH", 3).unwrap();
    store.set_value(id, "SEG_LENGTH", "", Some(2), "40").unwrap();
    store
        .set_value(id, "SEG_STEEPNESS", "", Some(2), "0.5")
        .unwrap();
    engine
        .note_external_write(&mut store, id, "SEG_STEEPNESS")
        .unwrap();

    assert_eq!(store.cell(id, "SEG_LS", 2).unwrap().as_float(), Some(20.0));
}

#[test]
fn remote_inputs_recompute_across_objects() {
    let (mut engine, mut store, id) = setup();
    let climate = store
        .open("climates\\default", OpenFlags::default())
        .unwrap();
    engine
        .register(CalcSpec::new(
            "TOTAL_LS",
            ["#RD:CLIMATE_PTR:RAIN"],
            |ctx| {
                let r = ctx.input("#RD:CLIMATE_PTR:RAIN")?.as_number().unwrap_or(0.0);
                Ok(Value::Float(r * 0.5))
            },
        ))
        .unwrap();

    store
        .set_value(id, "CLIMATE_PTR", "", Some(0), "climates\\default")
        .unwrap();
    store.set_value(climate, "RAIN", "", Some(0), "40").unwrap();
    // The write lands on the climate; the profile's output follows
    engine
        .note_external_write(&mut store, climate, "RAIN")
        .unwrap();
    assert_eq!(store.cell(id, "TOTAL_LS", 0).unwrap().as_float(), Some(20.0));

    // Retargeting the hop pointer requeues the output too
    let other = store.open("climates\\dry", OpenFlags::default()).unwrap();
    store.set_value(other, "RAIN", "", Some(0), "10").unwrap();
    store
        .set_value(id, "CLIMATE_PTR", "", Some(0), "climates\\dry")
        .unwrap();
    engine
        .note_external_write(&mut store, id, "CLIMATE_PTR")
        .unwrap();
    assert_eq!(store.cell(id, "TOTAL_LS", 0).unwrap().as_float(), Some(5.0));
}

#[test]
fn outputs_invalid_for_the_object_type_are_not_queued() {
    let (mut engine, mut store, id) = setup();
    engine
        .register(CalcSpec::new("R_FACTOR", ["RAIN"], |ctx| {
            ctx.input("RAIN")
        }))
        .unwrap();
    engine.set_autorun(false);

    // RAIN is legal everywhere but R_FACTOR only exists on climates,
    // so a profile write queues nothing.
    store.set_value(id, "RAIN", "", Some(0), "45").unwrap();
    engine.note_external_write(&mut store, id, "RAIN").unwrap();
    assert_eq!(engine.pending_len(), 0);
}

#[test]
fn failing_calc_surfaces_its_output_name() {
    let (mut engine, mut store, id) = setup();
    engine
        .register(CalcSpec::new("TOTAL_LS", ["SEG_LENGTH"], |_| {
            Err(tilth_foundation::Error::validation("segment data missing"))
        }))
        .unwrap();

    let err = engine.evaluate(&mut store, id, "TOTAL_LS", 0).unwrap_err();
    assert!(err.to_string().contains("TOTAL_LS"));
    assert!(err.to_string().contains("segment data missing"));
}
