//! Fixed-width instruction encodings for a Dalvik-style register machine.
//!
//! Instructions are measured in 16-bit code units. Each instruction shape
//! (registers plus at most one constant or branch operand) has a chain of
//! physical encodings of increasing width; [`Format::select`] finds the
//! smallest one that fits, [`Format::write`] packs it, and [`Format::parse`]
//! reconstructs the instruction, resolving pooled operands through a
//! [`ConstantPool`] collaborator.

pub mod code;
pub mod cst;
pub mod error;
pub mod format;
pub mod insn;
pub mod pool;

pub use code::CodeBody;
pub use cst::{FieldRef, MethodRef, TypeRef};
pub use error::Error;
pub use format::Format;
pub use insn::{Constant, Family, Instruction, Opcode, Reg};
pub use pool::ConstantPool;
