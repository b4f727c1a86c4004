use dexel_isa::{
    ConstantPool, Error, FieldRef, Format, Instruction, MethodRef, Opcode, TypeRef, code,
};

/// Route `log` output into the test harness.
#[allow(dead_code)]
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory stand-in for the container's interned tables.
pub struct MockPool {
    pub strings: Vec<&'static str>,
    pub types: Vec<&'static str>,
    pub fields: Vec<FieldRef>,
    pub methods: Vec<MethodRef>,
}

impl MockPool {
    pub fn sample() -> Self {
        let object = TypeRef::new("Ljava/lang/Object;");
        let widget = TypeRef::new("Lcom/example/Widget;");
        Self {
            strings: vec!["", "hello", "world"],
            types: vec!["Ljava/lang/Object;", "Lcom/example/Widget;", "I"],
            fields: vec![
                FieldRef {
                    definer: widget.clone(),
                    name: "count".into(),
                    type_desc: "I".into(),
                },
                FieldRef {
                    definer: widget.clone(),
                    name: "label".into(),
                    type_desc: "Ljava/lang/String;".into(),
                },
            ],
            methods: vec![MethodRef {
                definer: object,
                name: "toString".into(),
                proto: "()Ljava/lang/String;".into(),
            }],
        }
    }
}

impl ConstantPool for MockPool {
    fn string(&self, index: u32) -> Result<String, Error> {
        self.strings
            .get(index as usize)
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Pool(format!("no string at index {index}")))
    }

    fn type_ref(&self, index: u32) -> Result<TypeRef, Error> {
        self.types
            .get(index as usize)
            .map(|d| TypeRef::new(*d))
            .ok_or_else(|| Error::Pool(format!("no type at index {index}")))
    }

    fn field(&self, index: u32) -> Result<FieldRef, Error> {
        self.fields
            .get(index as usize)
            .cloned()
            .ok_or_else(|| Error::Pool(format!("no field at index {index}")))
    }

    fn method(&self, index: u32) -> Result<MethodRef, Error> {
        self.methods
            .get(index as usize)
            .cloned()
            .ok_or_else(|| Error::Pool(format!("no method at index {index}")))
    }
}

/// Write `insn` in `fmt`, parse it back, and assert exact equality.
#[allow(dead_code)]
pub fn assert_format_roundtrip(fmt: Format, insn: &Instruction, pool: &MockPool) {
    assert!(fmt.compatible(insn), "instruction must fit {fmt:?}");
    let mut out = Vec::new();
    fmt.write(insn, &mut out);
    assert_eq!(out.len(), fmt.size(), "format emits its fixed size");
    let opcode = Opcode::from_u8(out[0]).unwrap();
    let (parsed, consumed) = fmt.parse(&out, 0, opcode, pool).unwrap();
    assert_eq!(consumed, fmt.size(), "parse consumes the fixed size");
    assert_eq!(&parsed, insn);
}

/// Encode a program, decode it, and assert the decoded instructions match.
#[allow(dead_code)]
pub fn assert_stream_roundtrip(program: &[Instruction], pool: &MockPool) {
    let (bytes, offsets) = code::encode(program).unwrap();
    let decoded = code::decode(&bytes, pool).unwrap();
    assert_eq!(decoded.len(), program.len(), "length mismatch");
    for (i, ((insn, off), expected)) in decoded.iter().zip(program).enumerate() {
        assert_eq!(*off, offsets[i], "offset mismatch at {i}");
        assert_eq!(insn, expected, "mismatch at {i}");
    }
}
