//! Instruction-stream encoding and decoding.

use crate::error::{Error, Result};
use crate::format::Format;
use crate::insn::{Instruction, Opcode};
use crate::pool::ConstantPool;

/// Encode a sequence of instructions into bytes.
///
/// Each instruction goes through format selection, so every one is emitted in
/// the smallest encoding that fits (escalating the opcode to its family
/// sibling where needed).
///
/// Returns `(bytes, offsets)` where `offsets[i]` is the byte offset of
/// instruction `i` within `bytes`; callers that reference instructions by
/// byte offset (branch fixup, try-block metadata) need those.
pub fn encode(instructions: &[Instruction]) -> Result<(Vec<u8>, Vec<u32>)> {
    let mut out = Vec::new();
    let mut offsets = Vec::with_capacity(instructions.len());
    for insn in instructions {
        let fmt = Format::select(insn)?;
        offsets.push(out.len() as u32);
        fmt.write(insn, &mut out);
    }
    Ok((out, offsets))
}

/// Decode a byte slice into `(instruction, byte_offset)` pairs.
///
/// Pooled constant operands are resolved through `pool` as they are parsed.
/// The slice must contain whole instructions; a trailing fragment is a
/// truncation error.
pub fn decode(bytes: &[u8], pool: &impl ConstantPool) -> Result<Vec<(Instruction, u32)>> {
    log::trace!("decoding {} bytes of code", bytes.len());
    let mut out = Vec::new();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let byte = bytes[offset];
        let opcode = Opcode::from_u8(byte).ok_or(Error::InvalidOpcode(byte, offset))?;
        let (insn, size) = opcode.format().parse(bytes, offset, opcode, pool)?;
        out.push((insn, offset as u32));
        offset += size;
    }
    Ok(out)
}

/// A method's code body: an ordered instruction sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeBody {
    pub insns: Vec<Instruction>,
}

impl CodeBody {
    pub fn new(insns: Vec<Instruction>) -> Self {
        Self { insns }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let (bytes, _) = encode(&self.insns)?;
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8], pool: &impl ConstantPool) -> Result<Self> {
        let insns = decode(bytes, pool)?
            .into_iter()
            .map(|(insn, _)| insn)
            .collect();
        Ok(Self { insns })
    }
}
