//! The closed catalog of fixed-width instruction formats.
//!
//! Formats are stateless enum values. Each one knows its size in 16-bit code
//! units, whether a given instruction fits it, how to pack the instruction
//! into code units, and how to parse it back. Formats that share an operand
//! shape are linked into an escalation chain ([`Format::next_up`]) so
//! [`Format::select`] can always find the smallest fitting encoding.

use crate::error::{Error, Result};
use crate::insn::{Constant, Family, Instruction, Opcode, Reg};
use crate::pool::ConstantPool;

/// One fixed-width physical encoding. Naming follows the Dalvik format
/// convention: `<units><operand-pattern><kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// 2 units: one 8-bit register, 16-bit pool index (type/field/string).
    F21c,
    /// 2 units: one 8-bit register, signed 16-bit literal.
    F21s,
    /// 3 units: one 8-bit register, 32-bit literal.
    F31i,
    /// 2 units: one 8-bit register, signed 16-bit branch offset.
    F21t,
    /// 2 units: two 4-bit registers, signed 16-bit branch offset.
    F22t,
    /// 3 units: two 16-bit registers, no other operand.
    F32x,
}

impl Format {
    /// Fixed size in 16-bit code units.
    pub fn code_units(self) -> usize {
        match self {
            Self::F21c | Self::F21s | Self::F21t | Self::F22t => 2,
            Self::F31i | Self::F32x => 3,
        }
    }

    /// Fixed size in bytes.
    pub fn size(self) -> usize {
        self.code_units() * 2
    }

    /// The next larger format carrying the same operand shape, if any.
    pub fn next_up(self) -> Option<Format> {
        match self {
            Self::F21s => Some(Self::F31i),
            _ => None,
        }
    }

    /// Whether `insn` can be encoded in exactly this format. A pure
    /// predicate: all range checks happen here, never at write time.
    pub fn compatible(self, insn: &Instruction) -> bool {
        match self {
            Self::F21c => {
                let Instruction::Const { regs, constant, .. } = insn else {
                    return false;
                };
                // Exactly one register: the packing has a single register
                // field, so anything else could not survive a round trip.
                let [reg] = regs[..] else { return false };
                if !unsigned_fits_in_byte(reg.0) {
                    return false;
                }
                match constant.index() {
                    Some(index) => unsigned_fits_in_short(index),
                    None => false,
                }
            }
            Self::F21s => {
                let Instruction::Const { regs, constant, .. } = insn else {
                    return false;
                };
                let [reg] = regs[..] else { return false };
                let Constant::Literal(v) = constant else {
                    return false;
                };
                unsigned_fits_in_byte(reg.0) && signed_fits_in_short(*v)
            }
            Self::F31i => {
                let Instruction::Const { regs, constant, .. } = insn else {
                    return false;
                };
                let [reg] = regs[..] else { return false };
                let Constant::Literal(v) = constant else {
                    return false;
                };
                unsigned_fits_in_byte(reg.0) && *v == (*v as i32) as i64
            }
            Self::F21t => {
                let Instruction::Branch { regs, target, .. } = insn else {
                    return false;
                };
                let [reg] = regs[..] else { return false };
                unsigned_fits_in_byte(reg.0) && branch_fits_in_short(*target)
            }
            Self::F22t => {
                let Instruction::Branch { regs, target, .. } = insn else {
                    return false;
                };
                let [a, b] = regs[..] else { return false };
                unsigned_fits_in_nibble(a.0)
                    && unsigned_fits_in_nibble(b.0)
                    && branch_fits_in_short(*target)
            }
            Self::F32x => {
                let Instruction::Plain { regs, .. } = insn else {
                    return false;
                };
                let [a, b] = regs[..] else { return false };
                unsigned_fits_in_short(a.0) && unsigned_fits_in_short(b.0)
            }
        }
    }

    /// Find the smallest format that can encode `insn`, starting at the home
    /// format of its opcode and walking the escalation chain strictly upward.
    pub fn select(insn: &Instruction) -> Result<Format> {
        let mut fmt = insn.opcode().format();
        loop {
            if fmt.compatible(insn) {
                return Ok(fmt);
            }
            match fmt.next_up() {
                Some(next) => fmt = next,
                None => return Err(Error::FormatExhausted(insn.opcode())),
            }
        }
    }

    /// Append the encoded code units of `insn` to `out`.
    ///
    /// Only valid when [`Format::compatible`] holds; passing an incompatible
    /// instruction is a caller contract violation. The emitted opcode byte is
    /// the family sibling for this format, so escalated instructions stay
    /// stream-decodable.
    pub fn write(self, insn: &Instruction, out: &mut Vec<u8>) {
        debug_assert!(
            self.compatible(insn),
            "write requires a compatible instruction"
        );
        let op = insn.opcode().for_format(self);
        match (self, insn) {
            (Self::F21c, Instruction::Const { regs, constant, .. }) => {
                let index = match constant.index() {
                    Some(index) => index,
                    None => unreachable!("F21c carries only pooled constants"),
                };
                push_unit(out, opcode_unit(op, regs[0].0 as u8));
                push_unit(out, index as u16);
            }
            (Self::F21s, Instruction::Const { regs, constant, .. }) => {
                let Constant::Literal(v) = constant else {
                    unreachable!("F21s carries only literals");
                };
                push_unit(out, opcode_unit(op, regs[0].0 as u8));
                push_unit(out, *v as i16 as u16);
            }
            (Self::F31i, Instruction::Const { regs, constant, .. }) => {
                let Constant::Literal(v) = constant else {
                    unreachable!("F31i carries only literals");
                };
                let bits = *v as i32 as u32;
                push_unit(out, opcode_unit(op, regs[0].0 as u8));
                push_unit(out, bits as u16);
                push_unit(out, (bits >> 16) as u16);
            }
            (Self::F21t, Instruction::Branch { regs, target, .. }) => {
                push_unit(out, opcode_unit(op, regs[0].0 as u8));
                push_unit(out, *target as i16 as u16);
            }
            (Self::F22t, Instruction::Branch { regs, target, .. }) => {
                let arg = (regs[0].0 as u8) | ((regs[1].0 as u8) << 4);
                push_unit(out, opcode_unit(op, arg));
                push_unit(out, *target as i16 as u16);
            }
            (Self::F32x, Instruction::Plain { regs, .. }) => {
                push_unit(out, opcode_unit(op, 0));
                push_unit(out, regs[0].0 as u16);
                push_unit(out, regs[1].0 as u16);
            }
            _ => unreachable!("write called with an incompatible instruction"),
        }
    }

    /// Parse one instruction of this format from `data` at `offset` (which
    /// points at the opcode unit). Returns the instruction and the number of
    /// bytes consumed, always equal to [`Format::size`].
    pub fn parse(
        self,
        data: &[u8],
        offset: usize,
        opcode: Opcode,
        pool: &impl ConstantPool,
    ) -> Result<(Instruction, usize)> {
        let size = self.size();
        if offset + size > data.len() {
            return Err(Error::Truncated(offset));
        }
        let unit = |i: usize| -> u16 {
            u16::from_le_bytes([data[offset + 2 * i], data[offset + 2 * i + 1]])
        };

        let insn = match self {
            Self::F21c => {
                let reg = Reg((unit(0) >> 8) as u32);
                let index = unit(1) as u32;
                let constant = match opcode.family() {
                    Family::String => Constant::String {
                        index,
                        value: pool.string(index)?,
                    },
                    Family::Type => Constant::Type {
                        index,
                        value: pool.type_ref(index)?,
                    },
                    Family::Field => Constant::Field {
                        index,
                        value: pool.field(index)?,
                    },
                    _ => {
                        return Err(Error::UnexpectedOperand {
                            opcode,
                            format: self,
                        });
                    }
                };
                Instruction::Const {
                    opcode,
                    regs: vec![reg],
                    constant,
                }
            }
            Self::F21s => {
                if opcode.family() != Family::Literal {
                    return Err(Error::UnexpectedOperand {
                        opcode,
                        format: self,
                    });
                }
                Instruction::Const {
                    opcode,
                    regs: vec![Reg((unit(0) >> 8) as u32)],
                    constant: Constant::Literal(unit(1) as i16 as i64),
                }
            }
            Self::F31i => {
                if opcode.family() != Family::Literal {
                    return Err(Error::UnexpectedOperand {
                        opcode,
                        format: self,
                    });
                }
                let bits = unit(1) as u32 | ((unit(2) as u32) << 16);
                Instruction::Const {
                    opcode,
                    regs: vec![Reg((unit(0) >> 8) as u32)],
                    constant: Constant::Literal(bits as i32 as i64),
                }
            }
            Self::F21t => Instruction::Branch {
                opcode,
                regs: vec![Reg((unit(0) >> 8) as u32)],
                target: unit(1) as i16 as i32,
            },
            Self::F22t => {
                let arg = (unit(0) >> 8) as u8;
                Instruction::Branch {
                    opcode,
                    regs: vec![Reg((arg & 0xf) as u32), Reg((arg >> 4) as u32)],
                    target: unit(1) as i16 as i32,
                }
            }
            Self::F32x => Instruction::Plain {
                opcode,
                regs: vec![Reg(unit(1) as u32), Reg(unit(2) as u32)],
            },
        };

        Ok((insn, size))
    }
}

fn push_unit(out: &mut Vec<u8>, unit: u16) {
    out.extend_from_slice(&unit.to_le_bytes());
}

fn opcode_unit(op: Opcode, arg: u8) -> u16 {
    (op.as_u8() as u16) | ((arg as u16) << 8)
}

fn unsigned_fits_in_nibble(v: u32) -> bool {
    v <= 0xf
}

fn unsigned_fits_in_byte(v: u32) -> bool {
    v <= 0xff
}

fn unsigned_fits_in_short(v: u32) -> bool {
    v <= 0xffff
}

fn signed_fits_in_short(v: i64) -> bool {
    v == (v as i16) as i64
}

/// A zero offset would fit any width, but it is unencodable by definition:
/// branch formats force the caller to avoid no-op branches.
fn branch_fits_in_short(offset: i32) -> bool {
    offset != 0 && offset == (offset as i16) as i32
}
