//! Canonical Encoding
//!
//! Byte encoding used for every hashed item. Values go through
//! `serde_json::Value` and are written compactly with object keys sorted,
//! independent of how the map type (or serde_json's `preserve_order`
//! feature) orders them. Numbers use serde_json's formatting: integers
//! verbatim, floats as the shortest round-tripping decimal.

use serde::Serialize;
use serde_json::Value;

/// Encode a value to its canonical byte form.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    let mut out = Vec::with_capacity(64);
    write_value(&value, &mut out)?;
    Ok(out)
}

/// Encode a value to its canonical string form.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = to_canonical_bytes(value)?;
    // serde_json only writes valid UTF-8, so this never substitutes.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), serde_json::Error> {
    match value {
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_value(item, out)?;
            }
            out.push(b'}');
        }
        scalar => serde_json::to_writer(&mut *out, scalar)?,
    }
    Ok(())
}
