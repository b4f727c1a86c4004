mod common;

use common::Tables;
use dexel_file::error::Error;
use dexel_file::{Value, decode_value, encode_value};
use dexel_isa::TypeRef;

const TAG_INT: u8 = 0x04;
const TAG_FLOAT: u8 = 0x10;
const TAG_DOUBLE: u8 = 0x11;
const TAG_STRING: u8 = 0x17;

fn roundtrip(value: &Value, tables: &Tables) -> Value {
    let mut out = Vec::new();
    encode_value(value, &mut out, tables).unwrap();
    let (decoded, consumed) = decode_value(&out, 0, tables).unwrap();
    assert_eq!(consumed, out.len(), "decode must consume the whole encoding");
    decoded
}

#[test]
fn signed_one_byte_sign_extends() {
    let tables = Tables::sample();
    let (v, size) = decode_value(&[TAG_INT, 0xff], 0, &tables).unwrap();
    assert_eq!((v, size), (Value::Int(-1), 2));
    let (v, _) = decode_value(&[TAG_INT, 0x7f], 0, &tables).unwrap();
    assert_eq!(v, Value::Int(127));
}

#[test]
fn signed_two_byte_sign_extends() {
    let tables = Tables::sample();
    let tag = TAG_INT | (1 << 5);
    let (v, size) = decode_value(&[tag, 0xff, 0xff], 0, &tables).unwrap();
    assert_eq!((v, size), (Value::Int(-1), 3));
    let (v, _) = decode_value(&[tag, 0x00, 0x80], 0, &tables).unwrap();
    assert_eq!(v, Value::Int(-32768));
}

#[test]
fn positive_high_bit_clear_needs_no_extension() {
    let tables = Tables::sample();
    let tag = TAG_INT | (1 << 5);
    let (v, _) = decode_value(&[tag, 0x34, 0x12], 0, &tables).unwrap();
    assert_eq!(v, Value::Int(0x1234));
}

#[test]
fn float_payload_is_right_zero_extended() {
    let tables = Tables::sample();
    // 1.0f32 = 0x3f80_0000 encodes in two bytes.
    let (v, size) = decode_value(&[TAG_FLOAT | (1 << 5), 0x80, 0x3f], 0, &tables).unwrap();
    assert_eq!((v, size), (Value::Float(1.0), 3));
    // 2.0f64 = 0x4000_...: a single byte.
    let (v, _) = decode_value(&[TAG_DOUBLE, 0x40], 0, &tables).unwrap();
    assert_eq!(v, Value::Double(2.0));
}

#[test]
fn booleans_live_in_the_tag() {
    let tables = Tables::sample();
    assert_eq!(decode_value(&[0x1f], 0, &tables).unwrap(), (Value::Bool(false), 1));
    assert_eq!(decode_value(&[0x3f], 0, &tables).unwrap(), (Value::Bool(true), 1));
    // arg > 1 is not a boolean
    assert_eq!(decode_value(&[0x5f], 0, &tables), Err(Error::InvalidTag(0x5f, 0)));
}

#[test]
fn null_requires_zero_arg() {
    let tables = Tables::sample();
    assert_eq!(decode_value(&[0x1e], 0, &tables).unwrap(), (Value::Null, 1));
    assert_eq!(decode_value(&[0x3e], 0, &tables), Err(Error::InvalidTag(0x3e, 0)));
}

#[test]
fn unknown_tag_names_the_byte() {
    let tables = Tables::sample();
    assert_eq!(decode_value(&[0x05], 0, &tables), Err(Error::InvalidTag(0x05, 0)));
    assert_eq!(decode_value(&[0x0f], 0, &tables), Err(Error::InvalidTag(0x0f, 0)));
}

#[test]
fn overlong_width_is_rejected() {
    let tables = Tables::sample();
    // A byte value declaring two payload bytes.
    assert_eq!(
        decode_value(&[0x20, 0x01, 0x02], 0, &tables),
        Err(Error::InvalidValueWidth {
            tag: 0x20,
            width: 2,
            offset: 0,
        })
    );
    // An int declaring five.
    assert_eq!(
        decode_value(&[TAG_INT | (4 << 5), 0, 0, 0, 0, 0], 0, &tables),
        Err(Error::InvalidValueWidth {
            tag: TAG_INT | (4 << 5),
            width: 5,
            offset: 0,
        })
    );
}

#[test]
fn truncated_payload_is_rejected() {
    let tables = Tables::sample();
    assert_eq!(
        decode_value(&[TAG_INT | (3 << 5), 0x01, 0x02], 0, &tables),
        Err(Error::OffsetOutOfBounds(1, 3))
    );
    assert_eq!(decode_value(&[], 0, &tables), Err(Error::OffsetOutOfBounds(0, 0)));
}

#[test]
fn reference_kinds_resolve_through_the_pool() {
    let tables = Tables::sample();
    let (v, _) = decode_value(&[TAG_STRING, 1], 0, &tables).unwrap();
    assert_eq!(v, Value::String("hello".into()));

    let (v, _) = decode_value(&[0x18, 1], 0, &tables).unwrap();
    assert_eq!(v, Value::Type(TypeRef::new("Ljava/lang/String;")));

    let (v, _) = decode_value(&[0x19, 2], 0, &tables).unwrap();
    assert_eq!(v, Value::Field(tables.fields[2].clone()));

    let (v, _) = decode_value(&[0x1b, 4], 0, &tables).unwrap();
    assert_eq!(v, Value::Enum(tables.fields[4].clone()));

    let (v, _) = decode_value(&[0x1a, 0], 0, &tables).unwrap();
    assert_eq!(v, Value::Method(tables.methods[0].clone()));
}

#[test]
fn unresolvable_reference_fails() {
    let tables = Tables::sample();
    assert!(matches!(
        decode_value(&[TAG_STRING, 99], 0, &tables),
        Err(Error::Isa(dexel_isa::Error::Pool(_)))
    ));
}

#[test]
fn scalar_roundtrips() {
    let tables = Tables::sample();
    let values = [
        Value::Byte(-128),
        Value::Short(300),
        Value::Char('A' as u16),
        Value::Int(-1),
        Value::Int(0x1234_5678),
        Value::Long(i64::MIN),
        Value::Float(3.5),
        Value::Double(-0.125),
        Value::Bool(true),
        Value::Null,
        Value::String("hello".into()),
    ];
    for value in &values {
        assert_eq!(&roundtrip(value, &tables), value, "{value:?}");
    }
}

#[test]
fn array_roundtrips() {
    let tables = Tables::sample();
    let value = Value::Array(vec![
        Value::Int(7),
        Value::String("x".into()),
        Value::Array(vec![Value::Bool(false), Value::Null]),
    ]);
    assert_eq!(roundtrip(&value, &tables), value);
}

#[test]
fn annotation_roundtrips() {
    let tables = Tables::sample();
    let value = Value::Annotation {
        ty: TypeRef::new("Lcom/example/Widget;"),
        elements: vec![
            ("count".into(), Value::Int(3)),
            ("x".into(), Value::Array(vec![Value::Enum(tables.fields[4].clone())])),
        ],
    };
    assert_eq!(roundtrip(&value, &tables), value);
}

#[test]
fn huge_array_count_fails_without_allocating() {
    let tables = Tables::sample();
    // Six bytes claiming u32::MAX elements; decoding must run out of input,
    // not out of memory.
    let data = [0x1c, 0xff, 0xff, 0xff, 0xff, 0x0f];
    assert_eq!(
        decode_value(&data, 0, &tables),
        Err(Error::OffsetOutOfBounds(6, 6))
    );
}

#[test]
fn huge_annotation_count_fails_without_allocating() {
    let tables = Tables::sample();
    // type index 0, then a pair count of u32::MAX.
    let data = [0x1d, 0x00, 0xff, 0xff, 0xff, 0xff, 0x0f];
    assert_eq!(
        decode_value(&data, 0, &tables),
        Err(Error::InvalidLeb128(7))
    );
}

#[test]
fn values_decode_mid_buffer() {
    let tables = Tables::sample();
    let mut data = vec![0xaa, 0xbb];
    let start = data.len();
    encode_value(&Value::Int(-2), &mut data, &tables).unwrap();
    let (v, size) = decode_value(&data, start, &tables).unwrap();
    assert_eq!((v, size), (Value::Int(-2), 2));
}
