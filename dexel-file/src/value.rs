//! The tagged, variable-width value encoding used for static initializers
//! and annotation values.
//!
//! A value starts with one tag byte: the low 5 bits select the kind, the
//! high 3 bits carry `byte_count - 1` for the sized kinds (booleans store
//! their value there instead). Payloads are little-endian and minimal
//! width: signed kinds are sign-extended on decode, `char` is
//! zero-extended, and floating-point payloads hold the most significant
//! bytes of the bit pattern (right-zero-extended).

use dexel_isa::{ConstantPool, FieldRef, MethodRef, TypeRef};

use crate::error::{Error, Result};
use crate::ids::PoolIndexes;
use crate::leb128::{decode_uleb128, encode_uleb128};

const TAG_BYTE: u8 = 0x00;
const TAG_SHORT: u8 = 0x02;
const TAG_CHAR: u8 = 0x03;
const TAG_INT: u8 = 0x04;
const TAG_LONG: u8 = 0x06;
const TAG_FLOAT: u8 = 0x10;
const TAG_DOUBLE: u8 = 0x11;
const TAG_STRING: u8 = 0x17;
const TAG_TYPE: u8 = 0x18;
const TAG_FIELD: u8 = 0x19;
const TAG_METHOD: u8 = 0x1a;
const TAG_ENUM: u8 = 0x1b;
const TAG_ARRAY: u8 = 0x1c;
const TAG_ANNOTATION: u8 = 0x1d;
const TAG_NULL: u8 = 0x1e;
const TAG_BOOLEAN: u8 = 0x1f;

/// A decoded constant or annotation value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Null,
    String(String),
    Type(TypeRef),
    Field(FieldRef),
    /// An enum constant, referenced as the static field holding it.
    Enum(FieldRef),
    Method(MethodRef),
    Array(Vec<Value>),
    Annotation {
        ty: TypeRef,
        elements: Vec<(String, Value)>,
    },
}

impl Value {
    /// The zero/default value for a field of the given type descriptor.
    pub fn default_for(descriptor: &str) -> Value {
        match descriptor.as_bytes().first() {
            Some(b'B') => Value::Byte(0),
            Some(b'S') => Value::Short(0),
            Some(b'C') => Value::Char(0),
            Some(b'I') => Value::Int(0),
            Some(b'J') => Value::Long(0),
            Some(b'F') => Value::Float(0.0),
            Some(b'D') => Value::Double(0.0),
            Some(b'Z') => Value::Bool(false),
            _ => Value::Null,
        }
    }

    /// Whether this value is its type's default (zero bit pattern or null).
    pub fn is_default(&self) -> bool {
        match self {
            Value::Byte(v) => *v == 0,
            Value::Short(v) => *v == 0,
            Value::Char(v) => *v == 0,
            Value::Int(v) => *v == 0,
            Value::Long(v) => *v == 0,
            Value::Float(v) => v.to_bits() == 0,
            Value::Double(v) => v.to_bits() == 0,
            Value::Bool(v) => !*v,
            Value::Null => true,
            _ => false,
        }
    }
}

/// Decode one value from `data` starting at `offset`.
/// Returns (value, bytes_consumed).
pub fn decode_value(
    data: &[u8],
    offset: usize,
    pool: &impl ConstantPool,
) -> Result<(Value, usize)> {
    let tag = *data
        .get(offset)
        .ok_or(Error::OffsetOutOfBounds(offset, data.len()))?;
    let kind = tag & 0x1f;
    let arg = (tag >> 5) as usize;
    let payload = offset + 1;

    let check_width = |max: usize| -> Result<usize> {
        let width = arg + 1;
        if width > max {
            return Err(Error::InvalidValueWidth { tag, width, offset });
        }
        Ok(width)
    };

    match kind {
        TAG_BYTE => {
            let width = check_width(1)?;
            let v = read_signed(data, payload, width)?;
            Ok((Value::Byte(v as i8), 1 + width))
        }
        TAG_SHORT => {
            let width = check_width(2)?;
            let v = read_signed(data, payload, width)?;
            Ok((Value::Short(v as i16), 1 + width))
        }
        TAG_CHAR => {
            let width = check_width(2)?;
            let v = read_unsigned(data, payload, width)?;
            Ok((Value::Char(v as u16), 1 + width))
        }
        TAG_INT => {
            let width = check_width(4)?;
            let v = read_signed(data, payload, width)?;
            Ok((Value::Int(v as i32), 1 + width))
        }
        TAG_LONG => {
            let width = check_width(8)?;
            let v = read_signed(data, payload, width)?;
            Ok((Value::Long(v), 1 + width))
        }
        TAG_FLOAT => {
            let width = check_width(4)?;
            let acc = read_unsigned(data, payload, width)?;
            let bits = (acc as u32) << (8 * (4 - width));
            Ok((Value::Float(f32::from_bits(bits)), 1 + width))
        }
        TAG_DOUBLE => {
            let width = check_width(8)?;
            let acc = read_unsigned(data, payload, width)?;
            let bits = acc << (8 * (8 - width));
            Ok((Value::Double(f64::from_bits(bits)), 1 + width))
        }
        TAG_STRING => {
            let width = check_width(4)?;
            let index = read_unsigned(data, payload, width)? as u32;
            Ok((Value::String(pool.string(index)?), 1 + width))
        }
        TAG_TYPE => {
            let width = check_width(4)?;
            let index = read_unsigned(data, payload, width)? as u32;
            Ok((Value::Type(pool.type_ref(index)?), 1 + width))
        }
        TAG_FIELD => {
            let width = check_width(4)?;
            let index = read_unsigned(data, payload, width)? as u32;
            Ok((Value::Field(pool.field(index)?), 1 + width))
        }
        TAG_METHOD => {
            let width = check_width(4)?;
            let index = read_unsigned(data, payload, width)? as u32;
            Ok((Value::Method(pool.method(index)?), 1 + width))
        }
        TAG_ENUM => {
            let width = check_width(4)?;
            let index = read_unsigned(data, payload, width)? as u32;
            Ok((Value::Enum(pool.field(index)?), 1 + width))
        }
        TAG_ARRAY => {
            if arg != 0 {
                return Err(Error::InvalidTag(tag, offset));
            }
            let (count, count_size) = decode_uleb128(data, payload)?;
            let mut pos = payload + count_size;
            // The count is attacker-controlled; allocation grows with the
            // elements actually decoded, never with the claim.
            let mut values = Vec::new();
            for _ in 0..count {
                let (value, size) = decode_value(data, pos, pool)?;
                values.push(value);
                pos += size;
            }
            Ok((Value::Array(values), pos - offset))
        }
        TAG_ANNOTATION => {
            if arg != 0 {
                return Err(Error::InvalidTag(tag, offset));
            }
            let (type_idx, type_size) = decode_uleb128(data, payload)?;
            let ty = pool.type_ref(type_idx)?;
            let mut pos = payload + type_size;
            let (count, count_size) = decode_uleb128(data, pos)?;
            pos += count_size;
            let mut elements = Vec::new();
            for _ in 0..count {
                let (name_idx, name_size) = decode_uleb128(data, pos)?;
                pos += name_size;
                let name = pool.string(name_idx)?;
                let (value, size) = decode_value(data, pos, pool)?;
                pos += size;
                elements.push((name, value));
            }
            Ok((Value::Annotation { ty, elements }, pos - offset))
        }
        TAG_NULL => {
            if arg != 0 {
                return Err(Error::InvalidTag(tag, offset));
            }
            Ok((Value::Null, 1))
        }
        TAG_BOOLEAN => match arg {
            0 => Ok((Value::Bool(false), 1)),
            1 => Ok((Value::Bool(true), 1)),
            _ => Err(Error::InvalidTag(tag, offset)),
        },
        _ => Err(Error::InvalidTag(tag, offset)),
    }
}

/// Append the encoding of `value` to `out`, resolving references to their
/// pool indexes through `idx`. Structural mirror of [`decode_value`].
pub fn encode_value(value: &Value, out: &mut Vec<u8>, idx: &impl PoolIndexes) -> Result<()> {
    match value {
        Value::Byte(v) => emit_signed(TAG_BYTE, *v as i64, out),
        Value::Short(v) => emit_signed(TAG_SHORT, *v as i64, out),
        Value::Char(v) => emit_unsigned(TAG_CHAR, *v as u64, out),
        Value::Int(v) => emit_signed(TAG_INT, *v as i64, out),
        Value::Long(v) => emit_signed(TAG_LONG, *v, out),
        Value::Float(v) => emit_right_zero(TAG_FLOAT, (v.to_bits() as u64) << 32, out),
        Value::Double(v) => emit_right_zero(TAG_DOUBLE, v.to_bits(), out),
        Value::Bool(v) => out.push(TAG_BOOLEAN | ((*v as u8) << 5)),
        Value::Null => out.push(TAG_NULL),
        Value::String(s) => emit_unsigned(TAG_STRING, idx.string_index(s)? as u64, out),
        Value::Type(ty) => emit_unsigned(TAG_TYPE, idx.type_index(ty)? as u64, out),
        Value::Field(field) => emit_unsigned(TAG_FIELD, idx.field_index(field)? as u64, out),
        Value::Enum(field) => emit_unsigned(TAG_ENUM, idx.field_index(field)? as u64, out),
        Value::Method(method) => emit_unsigned(TAG_METHOD, idx.method_index(method)? as u64, out),
        Value::Array(values) => {
            out.push(TAG_ARRAY);
            encode_uleb128(values.len() as u32, out);
            for v in values {
                encode_value(v, out, idx)?;
            }
        }
        Value::Annotation { ty, elements } => {
            out.push(TAG_ANNOTATION);
            encode_uleb128(idx.type_index(ty)?, out);
            encode_uleb128(elements.len() as u32, out);
            for (name, v) in elements {
                encode_uleb128(idx.string_index(name)?, out);
                encode_value(v, out, idx)?;
            }
        }
    }
    Ok(())
}

fn read_unsigned(data: &[u8], offset: usize, width: usize) -> Result<u64> {
    let bytes = data
        .get(offset..offset + width)
        .ok_or(Error::OffsetOutOfBounds(offset, data.len()))?;
    let mut acc = 0u64;
    for (i, byte) in bytes.iter().enumerate() {
        acc |= (*byte as u64) << (8 * i);
    }
    Ok(acc)
}

fn read_signed(data: &[u8], offset: usize, width: usize) -> Result<i64> {
    let acc = read_unsigned(data, offset, width)?;
    let shift = 64 - 8 * width as u32;
    Ok(((acc << shift) as i64) >> shift)
}

/// Tag plus minimal-width little-endian two's-complement payload. Width is
/// the smallest byte count from which sign extension recovers the value.
fn emit_signed(tag: u8, value: i64, out: &mut Vec<u8>) {
    let mut width = 1u32;
    while width < 8 {
        let shift = 64 - 8 * width;
        if ((value << shift) >> shift) == value {
            break;
        }
        width += 1;
    }
    push_tagged_le(tag, value as u64, width, out);
}

fn emit_unsigned(tag: u8, value: u64, out: &mut Vec<u8>) {
    let mut width = 1u32;
    while width < 8 && value >> (8 * width) != 0 {
        width += 1;
    }
    push_tagged_le(tag, value, width, out);
}

/// Floating-point payloads keep the high bytes of the bit pattern; trailing
/// zero bytes at the low end are trimmed off.
fn emit_right_zero(tag: u8, mut bits: u64, out: &mut Vec<u8>) {
    let mut width = 8u32;
    while width > 1 && bits & 0xff == 0 {
        bits >>= 8;
        width -= 1;
    }
    push_tagged_le(tag, bits, width, out);
}

fn push_tagged_le(tag: u8, value: u64, width: u32, out: &mut Vec<u8>) {
    out.push(tag | (((width - 1) as u8) << 5));
    for i in 0..width {
        out.push((value >> (8 * i)) as u8);
    }
}
