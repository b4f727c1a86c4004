use thiserror::Error;

use crate::format::Format;
use crate::insn::Opcode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Unknown opcode byte at the given byte offset.
    #[error("invalid opcode {0:#04x} at offset {1}")]
    InvalidOpcode(u8, usize),

    /// Instruction stream ends before the format's fixed size.
    #[error("truncated instruction at offset {0}")]
    Truncated(usize),

    /// The escalation chain ran out without a compatible format. Every
    /// legally constructed instruction has at least one fitting format, so
    /// this is a bug in the caller, not bad input.
    #[error("no format can encode this {0:?} instruction")]
    FormatExhausted(Opcode),

    /// An opcode's operand family reached a format that cannot carry it
    /// (e.g. a literal-family opcode parsed as a pool-reference format).
    #[error("operand family of {opcode:?} is not representable in {format:?}")]
    UnexpectedOperand { opcode: Opcode, format: Format },

    /// A pool collaborator failed to resolve an index.
    #[error("pool lookup failed: {0}")]
    Pool(String),
}

pub type Result<T> = std::result::Result<T, Error>;
