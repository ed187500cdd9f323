//! Text rendering of single values.
//!
//! Floats use Rust's shortest round-trip representation of their own width,
//! so an `f32` sample is never widened to `f64` digits.

use std::fmt::Write;

use crate::tdms::Values;

/// Append the text of `values[row]` to `out`; nothing when `row` is past the end
pub fn format_cell(values: &Values, row: usize, out: &mut String) {
    if row >= values.len() {
        return;
    }
    // Writing into a String cannot fail
    let _ = match values {
        Values::I8(v) => write!(out, "{}", v[row]),
        Values::I16(v) => write!(out, "{}", v[row]),
        Values::I32(v) => write!(out, "{}", v[row]),
        Values::I64(v) => write!(out, "{}", v[row]),
        Values::U8(v) => write!(out, "{}", v[row]),
        Values::U16(v) => write!(out, "{}", v[row]),
        Values::U32(v) => write!(out, "{}", v[row]),
        Values::U64(v) => write!(out, "{}", v[row]),
        Values::F32(v) => write!(out, "{:?}", v[row]),
        Values::F64(v) => write!(out, "{:?}", v[row]),
        Values::Bool(v) => write!(out, "{}", v[row]),
        Values::String(v) => {
            out.push_str(&v[row]);
            Ok(())
        }
        Values::Timestamp(v) => write!(out, "{}", v[row]),
        Values::ComplexF32(v) => write!(out, "{:?}{:+?}j", v[row].0, v[row].1),
        Values::ComplexF64(v) => write!(out, "{:?}{:+?}j", v[row].0, v[row].1),
    };
}
