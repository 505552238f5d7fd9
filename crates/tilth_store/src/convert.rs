//! The string value protocol: parsing raw text into typed cells and
//! formatting cells back out, with unit conversion.
//!
//! All boundary reads and writes pass through here. Numeric cells are
//! stored in the entry's base unit; the caller resolves the request
//! unit to a to-base factor first.

use tilth_catalog::{CatalogEntry, ParamType};
use tilth_foundation::{
    Error, PointerValue, Result, SimDate, Value, MAX_VALUE_LEN,
};

/// Token representing a missing numeric value in the protocol.
pub(crate) const NAN_TOKEN: &str = "NaN";

/// Resolves a request unit to a to-base conversion factor.
///
/// The empty token and `#U_TEMPLATE` resolve to the attribute's
/// current unit (or the base unit when none is set).
pub(crate) fn resolve_factor(
    entry: &CatalogEntry,
    unit: &str,
    attr_unit: Option<&str>,
) -> Result<f64> {
    if unit.is_empty() || unit.eq_ignore_ascii_case("#U_TEMPLATE") {
        return match attr_unit {
            Some(u) => entry.unit_factor(u).ok_or_else(|| {
                Error::internal(format!(
                    "attr '{}' carries unknown unit '{u}'",
                    entry.name
                ))
            }),
            None => Ok(1.0),
        };
    }
    entry.unit_factor(unit).ok_or_else(|| {
        Error::invalid_argument(format!(
            "unit '{unit}' is not valid for attr '{}'",
            entry.name
        ))
    })
}

/// Parses raw protocol text into a typed cell value.
///
/// `factor` is the to-base conversion applied to float input.
pub(crate) fn parse_raw(entry: &CatalogEntry, factor: f64, raw: &str) -> Result<Value> {
    if raw.len() > MAX_VALUE_LEN {
        return Err(Error::size_limit(raw.len(), MAX_VALUE_LEN));
    }
    match entry.param_type {
        ParamType::Bool => parse_bool(entry, raw),
        ParamType::Int => parse_int(entry, raw),
        ParamType::Float => parse_float(entry, factor, raw),
        ParamType::Date => parse_date(entry, raw),
        ParamType::List => parse_list(entry, raw),
        ParamType::Str => Ok(if raw.is_empty() {
            Value::Nil
        } else {
            Value::from(raw)
        }),
        ParamType::Pointer => parse_pointer(entry, raw),
        ParamType::SubObject => Err(Error::invalid_argument(format!(
            "attr '{}' is a subobject and has no string value",
            entry.name
        ))),
    }
}

fn parse_bool(entry: &CatalogEntry, raw: &str) -> Result<Value> {
    if raw.eq_ignore_ascii_case(NAN_TOKEN) {
        return Ok(Value::Nil);
    }
    let b = match raw.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => true,
        "no" | "false" | "0" => false,
        _ => {
            return Err(Error::validation(format!(
                "'{raw}' is not a boolean value for attr '{}'",
                entry.name
            )));
        }
    };
    Ok(Value::Bool(b))
}

#[allow(clippy::cast_possible_truncation)]
fn parse_int(entry: &CatalogEntry, raw: &str) -> Result<Value> {
    if raw.eq_ignore_ascii_case(NAN_TOKEN) {
        return Ok(Value::Nil);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Value::Int(n));
    }
    // Accept exactly integral float text such as "3.0"
    if let Ok(f) = raw.parse::<f64>() {
        if f.fract() == 0.0 && f.is_finite() && f.abs() < 9.0e18 {
            return Ok(Value::Int(f as i64));
        }
    }
    Err(Error::validation(format!(
        "'{raw}' is not an integer value for attr '{}'",
        entry.name
    )))
}

fn parse_float(entry: &CatalogEntry, factor: f64, raw: &str) -> Result<Value> {
    if raw.eq_ignore_ascii_case(NAN_TOKEN) {
        return Ok(Value::Nil);
    }
    let v: f64 = raw.parse().map_err(|_| {
        Error::validation(format!(
            "'{raw}' is not a number for attr '{}'",
            entry.name
        ))
    })?;
    if v.is_nan() {
        return Ok(Value::Nil);
    }
    let mut base = v * factor;
    if entry.flags.integral_float {
        base = base.round();
    }
    Ok(Value::Float(base))
}

fn parse_date(entry: &CatalogEntry, raw: &str) -> Result<Value> {
    if raw.is_empty() || raw.eq_ignore_ascii_case(NAN_TOKEN) {
        return Ok(Value::Nil);
    }
    let date: SimDate = raw.parse().map_err(|e: Error| {
        e.with_context(format!("attr '{}'", entry.name))
    })?;
    Ok(Value::Date(date))
}

fn parse_list(entry: &CatalogEntry, raw: &str) -> Result<Value> {
    if raw.is_empty() {
        return Ok(Value::Nil);
    }
    // Choice tokens match exactly, including case
    if entry.choices.iter().any(|c| c == raw) {
        return Ok(Value::from(raw));
    }
    Err(Error::validation(format!(
        "'{raw}' is not a choice of attr '{}'",
        entry.name
    )))
}

fn parse_pointer(entry: &CatalogEntry, raw: &str) -> Result<Value> {
    if raw.is_empty() {
        return Ok(Value::Nil);
    }
    if let Some(sentinel) = tilth_foundation::EntrySentinel::from_token(raw) {
        use tilth_foundation::EntrySentinel as S;
        let legal = match sentinel {
            S::Default | S::Model => true,
            S::Custom => entry.flags.allow_custom,
            S::None => entry.flags.allow_none,
            S::Null => entry.flags.allow_null,
        };
        if !legal {
            return Err(Error::validation(format!(
                "{} is not allowed for attr '{}'",
                sentinel.token(),
                entry.name
            )));
        }
        return Ok(Value::Ref(PointerValue::Sentinel(sentinel)));
    }
    let path = tilth_foundation::ObjectPath::parse(raw)
        .map_err(|e| e.with_context(format!("attr '{}'", entry.name)))?;
    // Stored pointers carry the full path. Input may arrive with the
    // root table stripped; reattach it.
    let path = match &entry.root_table {
        Some(table) if !path.table().eq_ignore_ascii_case(table) => {
            tilth_foundation::ObjectPath::with_table(table, path.full())?
        }
        _ => path,
    };
    Ok(Value::Ref(PointerValue::Path(path)))
}

/// Formats a cell value back into protocol text.
///
/// `factor` is the to-base factor of the request unit; float output is
/// divided by it.
pub(crate) fn format_value(entry: &CatalogEntry, factor: f64, value: &Value) -> String {
    match value {
        Value::Nil => match entry.param_type {
            ParamType::Bool
            | ParamType::Int
            | ParamType::Float
            | ParamType::Date => NAN_TOKEN.to_string(),
            _ => String::new(),
        },
        Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(v) => {
            if v.is_nan() {
                NAN_TOKEN.to_string()
            } else {
                format!("{}", v / factor)
            }
        }
        Value::Date(d) => d.to_string(),
        Value::Str(s) => s.to_string(),
        Value::Ref(PointerValue::Path(p)) => p.full().to_string(),
        Value::Ref(PointerValue::Sentinel(s)) => s.token().to_string(),
    }
}

/// Reads a cumulative cell: the sum of numeric values through `index`.
///
/// Any missing value in the range poisons the sum to `Nil`.
pub(crate) fn cumulative(cells: &[Value], index: usize) -> Value {
    let mut sum = 0.0;
    for cell in cells.iter().take(index + 1) {
        match cell.as_number() {
            Some(v) => sum += v,
            None => return Value::Nil,
        }
    }
    Value::Float(sum)
}
