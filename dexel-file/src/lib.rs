//! Container-side codecs for a Dalvik-style bytecode container.
//!
//! Three wire formats live here, each matching the container byte for
//! byte: the delta-encoded per-class member stream ([`ClassData`]), the
//! tagged variable-width constant encoding ([`value`]), and the
//! header-located id tables ([`ids::IdResolver`]). Instruction bodies
//! embedded in methods go through the `dexel-isa` format catalog; pool and
//! layout concerns stay behind traits, so this crate never owns string or
//! type interning.

pub mod class_data;
pub mod error;
pub mod ids;
pub mod leb128;
pub mod modifiers;
pub mod value;

pub use class_data::{ClassData, CodeLayout, CodeSource, EncodedField, EncodedMethod};
pub use error::Error;
pub use ids::{CachedPool, IdResolver, PoolIndexes, ProtoSource, StringSource, TypeSource};
pub use modifiers::AccessFlags;
pub use value::{Value, decode_value, encode_value};
