use std::collections::HashMap;

use dexel_file::error::{Error, Result};
use dexel_file::{CodeLayout, CodeSource, PoolIndexes, ProtoSource, StringSource, TypeSource};
use dexel_isa::{CodeBody, ConstantPool, FieldRef, MethodRef, TypeRef};

/// Route `log` output into the test harness.
#[allow(dead_code)]
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory interned tables standing in for the container's pools, in
/// both directions: index → reference and reference → index.
pub struct Tables {
    pub strings: Vec<String>,
    pub types: Vec<String>,
    pub protos: Vec<String>,
    pub fields: Vec<FieldRef>,
    pub methods: Vec<MethodRef>,
}

#[allow(dead_code)]
pub fn widget() -> TypeRef {
    TypeRef::new("Lcom/example/Widget;")
}

impl Tables {
    pub fn sample() -> Self {
        let widget = widget();
        let fields = vec![
            FieldRef {
                definer: widget.clone(),
                name: "a".into(),
                type_desc: "I".into(),
            },
            FieldRef {
                definer: widget.clone(),
                name: "b".into(),
                type_desc: "I".into(),
            },
            FieldRef {
                definer: widget.clone(),
                name: "c".into(),
                type_desc: "Ljava/lang/String;".into(),
            },
            FieldRef {
                definer: widget.clone(),
                name: "d".into(),
                type_desc: "J".into(),
            },
            FieldRef {
                definer: widget.clone(),
                name: "e".into(),
                type_desc: "Z".into(),
            },
        ];
        let methods = vec![
            MethodRef {
                definer: widget.clone(),
                name: "<clinit>".into(),
                proto: "()V".into(),
            },
            MethodRef {
                definer: widget.clone(),
                name: "<init>".into(),
                proto: "()V".into(),
            },
            MethodRef {
                definer: widget.clone(),
                name: "render".into(),
                proto: "()V".into(),
            },
        ];
        Self {
            strings: vec!["".into(), "hello".into(), "x".into(), "count".into()],
            types: vec![
                "Lcom/example/Widget;".into(),
                "Ljava/lang/String;".into(),
                "I".into(),
            ],
            protos: vec!["()V".into(), "(I)V".into()],
            fields,
            methods,
        }
    }
}

impl StringSource for Tables {
    fn string(&self, index: u32) -> Result<String> {
        self.strings
            .get(index as usize)
            .cloned()
            .ok_or(Error::OffsetOutOfBounds(index as usize, self.strings.len()))
    }
}

impl TypeSource for Tables {
    fn type_ref(&self, index: u32) -> Result<TypeRef> {
        self.types
            .get(index as usize)
            .map(|d| TypeRef::new(d.as_str()))
            .ok_or(Error::OffsetOutOfBounds(index as usize, self.types.len()))
    }
}

impl ProtoSource for Tables {
    fn proto(&self, index: u32) -> Result<String> {
        self.protos
            .get(index as usize)
            .cloned()
            .ok_or(Error::OffsetOutOfBounds(index as usize, self.protos.len()))
    }
}

impl ConstantPool for Tables {
    fn string(&self, index: u32) -> dexel_isa::error::Result<String> {
        self.strings
            .get(index as usize)
            .cloned()
            .ok_or_else(|| dexel_isa::Error::Pool(format!("no string at index {index}")))
    }

    fn type_ref(&self, index: u32) -> dexel_isa::error::Result<TypeRef> {
        self.types
            .get(index as usize)
            .map(|d| TypeRef::new(d.as_str()))
            .ok_or_else(|| dexel_isa::Error::Pool(format!("no type at index {index}")))
    }

    fn field(&self, index: u32) -> dexel_isa::error::Result<FieldRef> {
        self.fields
            .get(index as usize)
            .cloned()
            .ok_or_else(|| dexel_isa::Error::Pool(format!("no field at index {index}")))
    }

    fn method(&self, index: u32) -> dexel_isa::error::Result<MethodRef> {
        self.methods
            .get(index as usize)
            .cloned()
            .ok_or_else(|| dexel_isa::Error::Pool(format!("no method at index {index}")))
    }
}

impl PoolIndexes for Tables {
    fn string_index(&self, s: &str) -> Result<u32> {
        position(self.strings.iter().map(String::as_str), s, "string")
    }

    fn type_index(&self, ty: &TypeRef) -> Result<u32> {
        position(self.types.iter().map(String::as_str), &ty.descriptor, "type")
    }

    fn field_index(&self, field: &FieldRef) -> Result<u32> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|i| i as u32)
            .ok_or_else(|| Error::NotInterned {
                kind: "field",
                name: field.to_string(),
            })
    }

    fn method_index(&self, method: &MethodRef) -> Result<u32> {
        self.methods
            .iter()
            .position(|m| m == method)
            .map(|i| i as u32)
            .ok_or_else(|| Error::NotInterned {
                kind: "method",
                name: method.to_string(),
            })
    }
}

fn position<'a>(
    mut iter: impl Iterator<Item = &'a str>,
    wanted: &str,
    kind: &'static str,
) -> Result<u32> {
    iter.position(|item| item == wanted)
        .map(|i| i as u32)
        .ok_or_else(|| Error::NotInterned {
            kind,
            name: wanted.to_string(),
        })
}

/// Code-item layout and content for a test: offsets by method on the way
/// out, encoded bytes by offset on the way back in.
#[allow(dead_code)]
pub struct CodeStore<'a> {
    pub tables: &'a Tables,
    pub offsets: HashMap<MethodRef, u32>,
    pub bytes: HashMap<u32, Vec<u8>>,
}

#[allow(dead_code)]
impl<'a> CodeStore<'a> {
    pub fn new(tables: &'a Tables) -> Self {
        Self {
            tables,
            offsets: HashMap::new(),
            bytes: HashMap::new(),
        }
    }

    pub fn place(&mut self, method: MethodRef, offset: u32, body: &CodeBody) -> Result<()> {
        self.offsets.insert(method, offset);
        self.bytes.insert(offset, body.encode()?);
        Ok(())
    }
}

impl CodeLayout for CodeStore<'_> {
    fn code_offset(&self, method: &MethodRef) -> Result<u32> {
        self.offsets.get(method).copied().ok_or_else(|| Error::NotInterned {
            kind: "code item",
            name: method.to_string(),
        })
    }
}

impl CodeSource for CodeStore<'_> {
    fn code_at(&self, offset: u32) -> Result<CodeBody> {
        let bytes = self.bytes.get(&offset).ok_or_else(|| Error::NotInterned {
            kind: "code item",
            name: format!("{offset:#x}"),
        })?;
        Ok(CodeBody::decode(bytes, self.tables)?)
    }
}
