//! The seam to the container's interned tables.

use crate::cst::{FieldRef, MethodRef, TypeRef};
use crate::error::Result;

/// Resolves pool indexes read off the wire into full references.
///
/// Implementations are expected to be pure with respect to the container
/// bytes; callers may invoke them repeatedly for the same index, so a
/// read-through cache behind this trait is a valid refinement.
pub trait ConstantPool {
    fn string(&self, index: u32) -> Result<String>;
    fn type_ref(&self, index: u32) -> Result<TypeRef>;
    fn field(&self, index: u32) -> Result<FieldRef>;
    fn method(&self, index: u32) -> Result<MethodRef>;
}
