use byteorder::{BigEndian, ByteOrder};
use chrono::{Datelike, Timelike};
use std::borrow::Cow;

use crate::error::{IonHashError, Result};
use crate::types::{Decimal, IonType, Timestamp, TimestampPrecision, Value};

/// Byte markers framing every serialized value.
pub struct Markers;
impl Markers {
    /// single byte begin marker
    pub const B: u8 = 0x0B;
    /// single byte end marker
    pub const E: u8 = 0x0E;
    /// single byte escape
    pub const ESC: u8 = 0x0C;
}

/// TQ of the annotation wrapper.
pub const ANNOTATION_TQ: u8 = 0xE0;

const NULL_QUALIFIER: u8 = 0x0F;

// Ion binary encodes floats as 64-bit; every NaN hashes the same way.
const CANONICAL_NAN: u64 = 0x7FF8_0000_0000_0000;

/// type_code returns the Ion binary type code that forms the high nibble of a TQ.
pub fn type_code(ion_type: IonType) -> u8 {
    match ion_type {
        IonType::Null => 0x0,
        IonType::Bool => 0x1,
        IonType::Int => 0x2,
        IonType::Float => 0x4,
        IonType::Decimal => 0x5,
        IonType::Timestamp => 0x6,
        IonType::Symbol => 0x7,
        IonType::String => 0x8,
        IonType::Clob => 0x9,
        IonType::Blob => 0xA,
        IonType::List => 0xB,
        IonType::SExp => 0xC,
        IonType::Struct => 0xD,
    }
}

/// container_tq returns the TQ written after the begin marker of a non-null container.
pub fn container_tq(ion_type: IonType) -> u8 {
    type_code(ion_type) << 4
}

/// scalar_parts splits a non-container value (or a typed null of any
/// type) into its TQ byte and its unescaped representation.
pub fn scalar_parts(value: &Value) -> Result<(u8, Vec<u8>)> {
    let mut repr = Vec::new();
    let tq = match value {
        Value::Null(t) => type_code(*t) << 4 | NULL_QUALIFIER,
        Value::Bool(b) => type_code(IonType::Bool) << 4 | *b as u8,
        Value::Int(i) => {
            repr.extend_from_slice(i.magnitude());
            if i.is_negative() {
                0x30
            } else {
                0x20
            }
        }
        Value::Float(f) => {
            write_float(&mut repr, *f);
            type_code(IonType::Float) << 4
        }
        Value::Decimal(d) => {
            write_decimal(&mut repr, d);
            type_code(IonType::Decimal) << 4
        }
        Value::Timestamp(ts) => {
            write_timestamp(&mut repr, ts);
            type_code(IonType::Timestamp) << 4
        }
        Value::Symbol(s) => match s.text() {
            Some(text) => {
                repr.extend_from_slice(text.as_bytes());
                type_code(IonType::Symbol) << 4
            }
            None => type_code(IonType::Symbol) << 4 | 0x01,
        },
        Value::String(s) => {
            repr.extend_from_slice(s.as_bytes());
            type_code(IonType::String) << 4
        }
        Value::Clob(bytes) => {
            repr.extend_from_slice(bytes);
            type_code(IonType::Clob) << 4
        }
        Value::Blob(bytes) => {
            repr.extend_from_slice(bytes);
            type_code(IonType::Blob) << 4
        }
        Value::List(_) | Value::SExp(_) | Value::Struct(_) => {
            return Err(IonHashError::invalid_operation(
                "representation",
                "scalar_parts",
                format!("{} is a container, not a scalar", value.ion_type()),
            ))
        }
    };
    Ok((tq, repr))
}

/// escape prefixes every marker byte with ESC. Input without markers is
/// returned as-is.
pub fn escape(bytes: &[u8]) -> Cow<'_, [u8]> {
    let is_marker = |b: &u8| matches!(*b, Markers::B | Markers::E | Markers::ESC);
    if !bytes.iter().any(is_marker) {
        return Cow::Borrowed(bytes);
    }

    let mut escaped = Vec::with_capacity(bytes.len() + 4);
    for b in bytes {
        if is_marker(b) {
            escaped.push(Markers::ESC);
        }
        escaped.push(*b);
    }
    Cow::Owned(escaped)
}

fn write_float(out: &mut Vec<u8>, f: f64) {
    if f == 0.0 && f.is_sign_positive() {
        return;
    }
    let bits = if f.is_nan() { CANONICAL_NAN } else { f.to_bits() };
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, bits);
    out.extend_from_slice(&buf);
}

fn write_decimal(out: &mut Vec<u8>, d: &Decimal) {
    let negative = d.is_coefficient_negative();
    if d.exponent() == 0 && d.coefficient().is_zero() && !negative {
        return;
    }
    write_var_int(out, d.exponent());
    // A positive zero coefficient is left out entirely.
    if !d.coefficient().is_zero() || negative {
        write_int(out, negative, d.coefficient().magnitude());
    }
}

fn write_timestamp(out: &mut Vec<u8>, ts: &Timestamp) {
    match ts.offset_minutes() {
        Some(minutes) => write_var_int(out, minutes as i64),
        None => write_var_int_parts(out, true, 0),
    }

    let utc = ts.utc();
    write_var_uint(out, utc.year() as u64);
    let precision = ts.precision();
    if precision >= TimestampPrecision::Month {
        write_var_uint(out, utc.month() as u64);
    }
    if precision >= TimestampPrecision::Day {
        write_var_uint(out, utc.day() as u64);
    }
    if precision >= TimestampPrecision::Minute {
        write_var_uint(out, utc.hour() as u64);
        write_var_uint(out, utc.minute() as u64);
    }
    if precision >= TimestampPrecision::Second {
        write_var_uint(out, utc.second() as u64);
        if let Some(fraction) = ts.fractional_seconds() {
            write_var_int(out, fraction.exponent());
            if !fraction.coefficient().is_zero() {
                write_int(out, false, fraction.coefficient().magnitude());
            }
        }
    }
}

/// write_var_uint writes 7 bits per byte, big-endian, with the high bit
/// set on the final byte.
pub fn write_var_uint(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = [0u8; 10];
    let mut i = groups.len();
    loop {
        i -= 1;
        groups[i] = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    groups[groups.len() - 1] |= 0x80;
    out.extend_from_slice(&groups[i..]);
}

/// write_var_int is write_var_uint with a sign bit in the first byte,
/// which leaves only 6 magnitude bits there.
pub fn write_var_int(out: &mut Vec<u8>, value: i64) {
    write_var_int_parts(out, value < 0, value.unsigned_abs())
}

fn write_var_int_parts(out: &mut Vec<u8>, negative: bool, mut magnitude: u64) {
    let mut groups = [0u8; 11];
    let mut i = groups.len();
    loop {
        i -= 1;
        groups[i] = (magnitude & 0x7F) as u8;
        magnitude >>= 7;
        if magnitude == 0 {
            break;
        }
    }
    if groups[i] & 0x40 != 0 {
        i -= 1;
    }
    if negative {
        groups[i] |= 0x40;
    }
    groups[groups.len() - 1] |= 0x80;
    out.extend_from_slice(&groups[i..]);
}

/// write_int writes a sign-and-magnitude integer whose sign is the high
/// bit of the first byte. An empty magnitude writes nothing unless negative.
pub fn write_int(out: &mut Vec<u8>, negative: bool, magnitude: &[u8]) {
    let sign = if negative { 0x80 } else { 0x00 };
    match magnitude.split_first() {
        None => {
            if negative {
                out.push(sign);
            }
        }
        Some((first, _)) if first & 0x80 != 0 => {
            out.push(sign);
            out.extend_from_slice(magnitude);
        }
        Some((first, rest)) => {
            out.push(first | sign);
            out.extend_from_slice(rest);
        }
    }
}
