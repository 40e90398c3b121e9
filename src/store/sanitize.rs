use serde_json::{Number, Value};

use crate::models::quotes::Quote;

/// Turns untyped records into quotes, dropping anything that isn't an object with a
/// non-blank `text` and `category`. Order is kept and duplicates are left alone.
pub fn sanitize(raw: &[Value]) -> Vec<Quote> {
    raw.iter().filter_map(sanitize_one).collect()
}

fn sanitize_one(item: &Value) -> Option<Quote> {
    let record = item.as_object()?;

    let text = coerce(record.get("text"));
    let category = coerce(record.get("category"));

    if text.is_empty() || category.is_empty() {
        return None;
    }

    Some(Quote { text, category })
}

fn coerce(field: Option<&Value>) -> String {
    field.map(to_text).unwrap_or_default().trim().to_string()
}

// arrays join their elements with commas and objects collapse to a fixed marker.
fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Whole floats print without a fractional part, so `1.0` reads as `1`.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}
