//! The per-class member stream: canonical, delta-encoded lists of a
//! class's fields and methods, plus the derived static-initializer values.

use dexel_isa::{CodeBody, ConstantPool, FieldRef, MethodRef};

use crate::error::{Error, Result};
use crate::ids::PoolIndexes;
use crate::leb128::{decode_uleb128, encode_uleb128};
use crate::modifiers::AccessFlags;
use crate::value::Value;

/// A field as it appears in the class-data stream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EncodedField {
    pub field: FieldRef,
    pub access_flags: AccessFlags,
}

/// A method as it appears in the class-data stream. `code` is absent for
/// abstract and native methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMethod {
    pub method: MethodRef,
    pub access_flags: AccessFlags,
    pub code: Option<CodeBody>,
}

/// Supplies the absolute code-item offset for a method body at encode time.
/// Only consulted for methods that have a body; bodiless methods encode
/// offset 0.
pub trait CodeLayout {
    fn code_offset(&self, method: &MethodRef) -> Result<u32>;
}

/// Decodes the code item at an absolute offset at decode time.
pub trait CodeSource {
    fn code_at(&self, offset: u32) -> Result<CodeBody>;
}

/// A class's member set.
///
/// Starts out open for additions in any order. The first request for the
/// derived static-values array (or an explicit [`freeze`](Self::freeze),
/// which encoding performs) sorts all four lists into canonical order and
/// rejects further additions.
#[derive(Debug, Clone, Default)]
pub struct ClassData {
    static_fields: Vec<(EncodedField, Option<Value>)>,
    instance_fields: Vec<EncodedField>,
    direct_methods: Vec<EncodedMethod>,
    virtual_methods: Vec<EncodedMethod>,
    frozen: bool,
    static_values: Option<Option<Vec<Value>>>,
}

impl ClassData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static field, optionally with an explicit initial value.
    pub fn add_static_field(
        &mut self,
        field: FieldRef,
        access_flags: AccessFlags,
        value: Option<Value>,
    ) -> Result<()> {
        self.check_open()?;
        self.static_fields
            .push((EncodedField { field, access_flags }, value));
        Ok(())
    }

    pub fn add_instance_field(&mut self, field: FieldRef, access_flags: AccessFlags) -> Result<()> {
        self.check_open()?;
        self.instance_fields.push(EncodedField { field, access_flags });
        Ok(())
    }

    /// Add a direct (static, private, or constructor) method.
    pub fn add_direct_method(
        &mut self,
        method: MethodRef,
        access_flags: AccessFlags,
        code: Option<CodeBody>,
    ) -> Result<()> {
        self.check_open()?;
        self.direct_methods.push(EncodedMethod {
            method,
            access_flags,
            code,
        });
        Ok(())
    }

    pub fn add_virtual_method(
        &mut self,
        method: MethodRef,
        access_flags: AccessFlags,
        code: Option<CodeBody>,
    ) -> Result<()> {
        self.check_open()?;
        self.virtual_methods.push(EncodedMethod {
            method,
            access_flags,
            code,
        });
        Ok(())
    }

    pub fn static_fields(&self) -> &[(EncodedField, Option<Value>)] {
        &self.static_fields
    }

    pub fn instance_fields(&self) -> &[EncodedField] {
        &self.instance_fields
    }

    pub fn direct_methods(&self) -> &[EncodedMethod] {
        &self.direct_methods
    }

    pub fn virtual_methods(&self) -> &[EncodedMethod] {
        &self.virtual_methods
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_open(&self) -> Result<()> {
        if self.frozen { Err(Error::Frozen) } else { Ok(()) }
    }

    /// Sort all four lists into canonical order and close the set.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        log::trace!(
            "freezing class data: {}+{} fields, {}+{} methods",
            self.static_fields.len(),
            self.instance_fields.len(),
            self.direct_methods.len(),
            self.virtual_methods.len()
        );
        self.static_fields.sort_by(|a, b| a.0.cmp(&b.0));
        self.instance_fields.sort();
        sort_methods(&mut self.direct_methods);
        sort_methods(&mut self.virtual_methods);
        self.frozen = true;
    }

    /// The derived static-initializer array, or `None` when every static
    /// field holds its default value. Freezes the set on first call; the
    /// result is memoized.
    pub fn static_values(&mut self) -> Option<&[Value]> {
        self.freeze();
        if self.static_values.is_none() {
            self.static_values = Some(self.derive_static_values());
        }
        self.static_values.as_ref().and_then(|v| v.as_deref())
    }

    /// Walk the sorted static fields from the end, dropping trailing
    /// defaults; fields without an explicit value inside the kept prefix
    /// get their type's zero literal.
    fn derive_static_values(&self) -> Option<Vec<Value>> {
        let mut len = self.static_fields.len();
        while len > 0 {
            match &self.static_fields[len - 1].1 {
                Some(v) if !v.is_default() => break,
                _ => len -= 1,
            }
        }
        if len == 0 {
            return None;
        }
        Some(
            self.static_fields[..len]
                .iter()
                .map(|(f, v)| {
                    v.clone()
                        .unwrap_or_else(|| Value::default_for(&f.field.type_desc))
                })
                .collect(),
        )
    }

    /// Append the class-data stream to `out`: four ULEB128 counts, then the
    /// four lists as delta-encoded tuples. Freezes the set first.
    pub fn encode(
        &mut self,
        out: &mut Vec<u8>,
        pool: &impl PoolIndexes,
        layout: &impl CodeLayout,
    ) -> Result<()> {
        self.freeze();
        encode_uleb128(self.static_fields.len() as u32, out);
        encode_uleb128(self.instance_fields.len() as u32, out);
        encode_uleb128(self.direct_methods.len() as u32, out);
        encode_uleb128(self.virtual_methods.len() as u32, out);

        let mut prev = 0u32;
        for (field, _) in &self.static_fields {
            prev = encode_field(field, prev, out, pool)?;
        }
        prev = 0;
        for field in &self.instance_fields {
            prev = encode_field(field, prev, out, pool)?;
        }
        prev = 0;
        for method in &self.direct_methods {
            prev = encode_method(method, prev, out, pool, layout)?;
        }
        prev = 0;
        for method in &self.virtual_methods {
            prev = encode_method(method, prev, out, pool, layout)?;
        }
        Ok(())
    }

    /// Decode a class-data stream from `data` starting at `offset`.
    /// Returns the set and the number of bytes consumed. The decoded set is
    /// open; the stream is already sorted, so freezing it again is a no-op
    /// in effect.
    pub fn decode(
        data: &[u8],
        offset: usize,
        pool: &impl ConstantPool,
        code: &impl CodeSource,
    ) -> Result<(ClassData, usize)> {
        let mut pos = offset;
        let (static_count, size) = decode_uleb128(data, pos)?;
        pos += size;
        let (instance_count, size) = decode_uleb128(data, pos)?;
        pos += size;
        let (direct_count, size) = decode_uleb128(data, pos)?;
        pos += size;
        let (virtual_count, size) = decode_uleb128(data, pos)?;
        pos += size;
        log::trace!(
            "class data at {offset:#x}: {static_count}+{instance_count} fields, {direct_count}+{virtual_count} methods"
        );

        let mut out = ClassData::new();
        let mut prev = 0u32;
        for _ in 0..static_count {
            let (field, index) = decode_field(data, &mut pos, prev, pool)?;
            prev = index;
            out.static_fields.push((field, None));
        }
        prev = 0;
        for _ in 0..instance_count {
            let (field, index) = decode_field(data, &mut pos, prev, pool)?;
            prev = index;
            out.instance_fields.push(field);
        }
        prev = 0;
        for _ in 0..direct_count {
            let (method, index) = decode_method(data, &mut pos, prev, pool, code)?;
            prev = index;
            out.direct_methods.push(method);
        }
        prev = 0;
        for _ in 0..virtual_count {
            let (method, index) = decode_method(data, &mut pos, prev, pool, code)?;
            prev = index;
            out.virtual_methods.push(method);
        }
        Ok((out, pos - offset))
    }
}

fn sort_methods(methods: &mut [EncodedMethod]) {
    // EncodedMethod carries a code body, which has no meaningful order, so
    // the sort key is spelled out instead of derived.
    methods.sort_by(|a, b| (&a.method, a.access_flags).cmp(&(&b.method, b.access_flags)));
}

fn delta_from(index: u32, prev: u32) -> Result<u32> {
    index
        .checked_sub(prev)
        .ok_or(Error::NonMonotonicIndex { index, previous: prev })
}

fn running_index(prev: u32, delta: u32) -> Result<u32> {
    prev.checked_add(delta)
        .ok_or(Error::MemberIndexOverflow { previous: prev, delta })
}

fn encode_field(
    field: &EncodedField,
    prev: u32,
    out: &mut Vec<u8>,
    pool: &impl PoolIndexes,
) -> Result<u32> {
    let index = pool.field_index(&field.field)?;
    encode_uleb128(delta_from(index, prev)?, out);
    encode_uleb128(field.access_flags.bits(), out);
    Ok(index)
}

fn encode_method(
    method: &EncodedMethod,
    prev: u32,
    out: &mut Vec<u8>,
    pool: &impl PoolIndexes,
    layout: &impl CodeLayout,
) -> Result<u32> {
    let index = pool.method_index(&method.method)?;
    encode_uleb128(delta_from(index, prev)?, out);
    encode_uleb128(method.access_flags.bits(), out);
    let code_offset = match method.code {
        Some(_) => layout.code_offset(&method.method)?,
        None => 0,
    };
    encode_uleb128(code_offset, out);
    Ok(index)
}

fn decode_field(
    data: &[u8],
    pos: &mut usize,
    prev: u32,
    pool: &impl ConstantPool,
) -> Result<(EncodedField, u32)> {
    let (delta, size) = decode_uleb128(data, *pos)?;
    *pos += size;
    let (flags, size) = decode_uleb128(data, *pos)?;
    *pos += size;
    let index = running_index(prev, delta)?;
    Ok((
        EncodedField {
            field: pool.field(index)?,
            access_flags: AccessFlags::from_bits_retain(flags),
        },
        index,
    ))
}

fn decode_method(
    data: &[u8],
    pos: &mut usize,
    prev: u32,
    pool: &impl ConstantPool,
    code: &impl CodeSource,
) -> Result<(EncodedMethod, u32)> {
    let (delta, size) = decode_uleb128(data, *pos)?;
    *pos += size;
    let (flags, size) = decode_uleb128(data, *pos)?;
    *pos += size;
    let (code_offset, size) = decode_uleb128(data, *pos)?;
    *pos += size;
    let index = running_index(prev, delta)?;
    let body = if code_offset != 0 {
        Some(code.code_at(code_offset)?)
    } else {
        None
    };
    Ok((
        EncodedMethod {
            method: pool.method(index)?,
            access_flags: AccessFlags::from_bits_retain(flags),
            code: body,
        },
        index,
    ))
}
