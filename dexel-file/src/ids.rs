//! Resolution of field and method pool indexes through the container's
//! header-located id tables.
//!
//! The header stores the absolute base offset of each id table at a fixed
//! byte position. Records have a fixed stride: the defining type's index, a
//! type index (fields) or prototype index (methods), and a name index, each
//! resolved through a collaborator table.

use std::cell::RefCell;
use std::collections::HashMap;

use dexel_isa::{ConstantPool, FieldRef, MethodRef, TypeRef};

use crate::error::{Error, Result};

/// Header word holding the field id table's base offset.
pub const FIELD_IDS_OFF: usize = 0x54;
/// Header word holding the method id table's base offset.
pub const METHOD_IDS_OFF: usize = 0x5c;
/// Byte stride of one id record: u16 definer, u16 type/proto, u32 name.
pub const ID_RECORD_SIZE: usize = 8;

/// Resolves a string table index.
pub trait StringSource {
    fn string(&self, index: u32) -> Result<String>;
}

/// Resolves a type table index.
pub trait TypeSource {
    fn type_ref(&self, index: u32) -> Result<TypeRef>;
}

/// Resolves a prototype table index to a method descriptor.
pub trait ProtoSource {
    fn proto(&self, index: u32) -> Result<String>;
}

/// Maps references back to their pool indexes when encoding.
pub trait PoolIndexes {
    fn string_index(&self, s: &str) -> Result<u32>;
    fn type_index(&self, ty: &TypeRef) -> Result<u32>;
    fn field_index(&self, field: &FieldRef) -> Result<u32>;
    fn method_index(&self, method: &MethodRef) -> Result<u32>;
}

/// Reads id records out of a container buffer and resolves their parts
/// through string/type/prototype collaborators.
///
/// Side-effect free: every lookup re-reads the same bytes, so callers may
/// resolve the same index repeatedly (or wrap the resolver in a
/// [`CachedPool`]).
pub struct IdResolver<'a, T> {
    data: &'a [u8],
    tables: &'a T,
}

impl<'a, T> IdResolver<'a, T>
where
    T: StringSource + TypeSource + ProtoSource,
{
    pub fn new(data: &'a [u8], tables: &'a T) -> Self {
        Self { data, tables }
    }

    /// Resolve a field id table index into a full field reference.
    pub fn field(&self, index: u32) -> Result<FieldRef> {
        let record = self.id_record(FIELD_IDS_OFF, index)?;
        Ok(FieldRef {
            definer: self.tables.type_ref(record.definer_idx)?,
            name: self.tables.string(record.name_idx)?,
            type_desc: self.tables.type_ref(record.second_idx)?.descriptor,
        })
    }

    /// Resolve a method id table index into a full method reference.
    pub fn method(&self, index: u32) -> Result<MethodRef> {
        let record = self.id_record(METHOD_IDS_OFF, index)?;
        Ok(MethodRef {
            definer: self.tables.type_ref(record.definer_idx)?,
            name: self.tables.string(record.name_idx)?,
            proto: self.tables.proto(record.second_idx)?,
        })
    }

    fn id_record(&self, header_off: usize, index: u32) -> Result<IdRecord> {
        let base = self.read_u32(header_off)? as usize;
        let off = base + index as usize * ID_RECORD_SIZE;
        Ok(IdRecord {
            definer_idx: self.read_u16(off)? as u32,
            second_idx: self.read_u16(off + 2)? as u32,
            name_idx: self.read_u32(off + 4)?,
        })
    }

    fn read_u16(&self, offset: usize) -> Result<u16> {
        let bytes = self
            .data
            .get(offset..offset + 2)
            .ok_or(Error::OffsetOutOfBounds(offset, self.data.len()))?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&self, offset: usize) -> Result<u32> {
        let bytes = self
            .data
            .get(offset..offset + 4)
            .ok_or(Error::OffsetOutOfBounds(offset, self.data.len()))?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

struct IdRecord {
    definer_idx: u32,
    second_idx: u32,
    name_idx: u32,
}

fn pool_err(err: Error) -> dexel_isa::Error {
    dexel_isa::Error::Pool(err.to_string())
}

impl<T> ConstantPool for IdResolver<'_, T>
where
    T: StringSource + TypeSource + ProtoSource,
{
    fn string(&self, index: u32) -> dexel_isa::error::Result<String> {
        self.tables.string(index).map_err(pool_err)
    }

    fn type_ref(&self, index: u32) -> dexel_isa::error::Result<TypeRef> {
        self.tables.type_ref(index).map_err(pool_err)
    }

    fn field(&self, index: u32) -> dexel_isa::error::Result<FieldRef> {
        IdResolver::field(self, index).map_err(pool_err)
    }

    fn method(&self, index: u32) -> dexel_isa::error::Result<MethodRef> {
        IdResolver::method(self, index).map_err(pool_err)
    }
}

/// Read-through cache over any [`ConstantPool`], keyed by pool index.
///
/// Lookups are pure with respect to the container bytes, so caching them is
/// a performance refinement with no observable difference. Interior
/// mutability keeps the `ConstantPool` surface `&self`; the cache is not
/// for sharing across threads.
pub struct CachedPool<P> {
    inner: P,
    strings: RefCell<HashMap<u32, String>>,
    types: RefCell<HashMap<u32, TypeRef>>,
    fields: RefCell<HashMap<u32, FieldRef>>,
    methods: RefCell<HashMap<u32, MethodRef>>,
}

impl<P: ConstantPool> CachedPool<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            strings: RefCell::new(HashMap::new()),
            types: RefCell::new(HashMap::new()),
            fields: RefCell::new(HashMap::new()),
            methods: RefCell::new(HashMap::new()),
        }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: ConstantPool> ConstantPool for CachedPool<P> {
    fn string(&self, index: u32) -> dexel_isa::error::Result<String> {
        if let Some(s) = self.strings.borrow().get(&index) {
            return Ok(s.clone());
        }
        let s = self.inner.string(index)?;
        self.strings.borrow_mut().insert(index, s.clone());
        Ok(s)
    }

    fn type_ref(&self, index: u32) -> dexel_isa::error::Result<TypeRef> {
        if let Some(ty) = self.types.borrow().get(&index) {
            return Ok(ty.clone());
        }
        let ty = self.inner.type_ref(index)?;
        self.types.borrow_mut().insert(index, ty.clone());
        Ok(ty)
    }

    fn field(&self, index: u32) -> dexel_isa::error::Result<FieldRef> {
        if let Some(field) = self.fields.borrow().get(&index) {
            return Ok(field.clone());
        }
        let field = self.inner.field(index)?;
        self.fields.borrow_mut().insert(index, field.clone());
        Ok(field)
    }

    fn method(&self, index: u32) -> dexel_isa::error::Result<MethodRef> {
        if let Some(method) = self.methods.borrow().get(&index) {
            return Ok(method.clone());
        }
        let method = self.inner.method(index)?;
        self.methods.borrow_mut().insert(index, method.clone());
        Ok(method)
    }
}
