use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("offset {0:#x} out of bounds (buffer size: {1:#x})")]
    OffsetOutOfBounds(usize, usize),

    #[error("invalid ULEB128 encoding at offset {0:#x}")]
    InvalidLeb128(usize),

    /// Unknown encoded-value tag byte at the given offset.
    #[error("invalid value tag {0:#04x} at offset {1:#x}")]
    InvalidTag(u8, usize),

    /// A tag declared more payload bytes than its kind allows.
    #[error("value tag {tag:#04x} at offset {offset:#x} declares {width} payload bytes")]
    InvalidValueWidth { tag: u8, width: usize, offset: usize },

    /// A member was added after the set was canonicalized.
    #[error("class data is frozen; members can no longer be added")]
    Frozen,

    /// A sorted member list produced a decreasing pool index, which would
    /// need a negative delta on the wire.
    #[error("member index {index} is below the previous index {previous}")]
    NonMonotonicIndex { index: u32, previous: u32 },

    /// A decoded delta pushed the running member index past the index space.
    #[error("member index delta {delta} overflows previous index {previous}")]
    MemberIndexOverflow { previous: u32, delta: u32 },

    /// Encoding asked the pool for something it never interned.
    #[error("no interned {kind}: {name}")]
    NotInterned { kind: &'static str, name: String },

    #[error(transparent)]
    Isa(#[from] dexel_isa::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
