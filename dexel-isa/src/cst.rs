//! Resolved pool references: types, fields, and methods.
//!
//! The derived ordering (defining type, then name, then descriptor) is the
//! canonical member order the class-data codec sorts by; id tables in a
//! well-formed container are sorted the same way.

use std::fmt;

/// A type reference, held as its descriptor string (e.g. `Ljava/lang/String;`,
/// `I`, `[B`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeRef {
    pub descriptor: String,
}

impl TypeRef {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
        }
    }

    /// Whether this type is a reference type (class or array) as opposed to
    /// a primitive.
    pub fn is_reference(&self) -> bool {
        matches!(self.descriptor.as_bytes().first(), Some(b'L') | Some(b'['))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor)
    }
}

/// A fully-qualified field reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldRef {
    /// The class the field is defined on.
    pub definer: TypeRef,
    pub name: String,
    /// Descriptor of the field's type.
    pub type_desc: String,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.definer, self.name, self.type_desc)
    }
}

/// A fully-qualified method reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodRef {
    /// The class the method is defined on.
    pub definer: TypeRef,
    pub name: String,
    /// Prototype (shorty/descriptor) string, e.g. `(I)V`.
    pub proto: String,
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}{}", self.definer, self.name, self.proto)
    }
}
