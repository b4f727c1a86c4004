//! The instruction model: opcodes, register operands, and constant operands.

use std::fmt;

use crate::cst::{FieldRef, TypeRef};
use crate::format::Format;

/// Operand family of an opcode. The family fixes the operand shape an
/// instruction must have and, for pooled constants, which table resolves the
/// operand during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// One register plus a string-pool reference.
    String,
    /// One register plus a type-pool reference.
    Type,
    /// One register plus a field-pool reference (static field access).
    Field,
    /// One register plus a literal bit pattern.
    Literal,
    /// Register(s) plus a signed branch target in code units.
    Branch,
    /// Registers only.
    Plain,
}

/// Opcode values from the Dalvik bytecode specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Move16 = 0x03,
    MoveWide16 = 0x06,
    MoveObject16 = 0x09,
    Const16 = 0x13,
    Const = 0x14,
    ConstString = 0x1a,
    ConstClass = 0x1c,
    CheckCast = 0x1f,
    NewInstance = 0x22,
    IfEq = 0x32,
    IfNe = 0x33,
    IfLt = 0x34,
    IfGe = 0x35,
    IfGt = 0x36,
    IfLe = 0x37,
    IfEqz = 0x38,
    IfNez = 0x39,
    IfLtz = 0x3a,
    IfGez = 0x3b,
    IfGtz = 0x3c,
    IfLez = 0x3d,
    Sget = 0x60,
    Sput = 0x67,
}

impl Opcode {
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0x03 => Some(Self::Move16),
            0x06 => Some(Self::MoveWide16),
            0x09 => Some(Self::MoveObject16),
            0x13 => Some(Self::Const16),
            0x14 => Some(Self::Const),
            0x1a => Some(Self::ConstString),
            0x1c => Some(Self::ConstClass),
            0x1f => Some(Self::CheckCast),
            0x22 => Some(Self::NewInstance),
            0x32 => Some(Self::IfEq),
            0x33 => Some(Self::IfNe),
            0x34 => Some(Self::IfLt),
            0x35 => Some(Self::IfGe),
            0x36 => Some(Self::IfGt),
            0x37 => Some(Self::IfLe),
            0x38 => Some(Self::IfEqz),
            0x39 => Some(Self::IfNez),
            0x3a => Some(Self::IfLtz),
            0x3b => Some(Self::IfGez),
            0x3c => Some(Self::IfGtz),
            0x3d => Some(Self::IfLez),
            0x60 => Some(Self::Sget),
            0x67 => Some(Self::Sput),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn family(self) -> Family {
        match self {
            Self::Move16 | Self::MoveWide16 | Self::MoveObject16 => Family::Plain,
            Self::Const16 | Self::Const => Family::Literal,
            Self::ConstString => Family::String,
            Self::ConstClass | Self::CheckCast | Self::NewInstance => Family::Type,
            Self::IfEq
            | Self::IfNe
            | Self::IfLt
            | Self::IfGe
            | Self::IfGt
            | Self::IfLe
            | Self::IfEqz
            | Self::IfNez
            | Self::IfLtz
            | Self::IfGez
            | Self::IfGtz
            | Self::IfLez => Family::Branch,
            Self::Sget | Self::Sput => Family::Field,
        }
    }

    /// The format this opcode byte is encoded in. Every opcode has exactly
    /// one format, so a decoded stream is never ambiguous; escalation swaps
    /// the opcode for a family sibling instead (see [`Opcode::for_format`]).
    pub fn format(self) -> Format {
        match self {
            Self::Move16 | Self::MoveWide16 | Self::MoveObject16 => Format::F32x,
            Self::Const16 => Format::F21s,
            Self::Const => Format::F31i,
            Self::ConstString
            | Self::ConstClass
            | Self::CheckCast
            | Self::NewInstance
            | Self::Sget
            | Self::Sput => Format::F21c,
            Self::IfEq | Self::IfNe | Self::IfLt | Self::IfGe | Self::IfGt | Self::IfLe => {
                Format::F22t
            }
            Self::IfEqz
            | Self::IfNez
            | Self::IfLtz
            | Self::IfGez
            | Self::IfGtz
            | Self::IfLez => Format::F21t,
        }
    }

    /// The sibling opcode of the same family that is encoded in `fmt`.
    /// Identity for opcodes whose family has a single member per format.
    pub fn for_format(self, fmt: Format) -> Self {
        match (self.family(), fmt) {
            (Family::Literal, Format::F21s) => Self::Const16,
            (Family::Literal, Format::F31i) => Self::Const,
            _ => self,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A register operand: a bare non-negative index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(pub u32);

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A constant operand. Pooled kinds carry both the pool index (what the wire
/// format stores) and the resolved reference, so writing needs no reverse
/// lookup and parsing loses nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    String { index: u32, value: String },
    Type { index: u32, value: TypeRef },
    Field { index: u32, value: FieldRef },
    /// A literal bit pattern, sign-carried as i64.
    Literal(i64),
}

impl Constant {
    /// Pool index for pooled kinds; `None` for literals.
    pub fn index(&self) -> Option<u32> {
        match self {
            Self::String { index, .. } | Self::Type { index, .. } | Self::Field { index, .. } => {
                Some(*index)
            }
            Self::Literal(_) => None,
        }
    }
}

/// A single instruction. The variant is fixed by the opcode's family;
/// format selection only ever changes the physical width, never the shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Register(s) plus a pooled constant or literal.
    Const {
        opcode: Opcode,
        regs: Vec<Reg>,
        constant: Constant,
    },
    /// Register(s) plus a signed branch target, in code units. A target of
    /// zero is unencodable in every branch format.
    Branch {
        opcode: Opcode,
        regs: Vec<Reg>,
        target: i32,
    },
    /// Registers only.
    Plain { opcode: Opcode, regs: Vec<Reg> },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Const { opcode, .. } | Self::Branch { opcode, .. } | Self::Plain { opcode, .. } => {
                *opcode
            }
        }
    }

    pub fn regs(&self) -> &[Reg] {
        match self {
            Self::Const { regs, .. } | Self::Branch { regs, .. } | Self::Plain { regs, .. } => regs,
        }
    }
}
