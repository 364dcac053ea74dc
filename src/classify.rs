//! Type classification: decides how a value type is shaped before resolution.

use crate::types::{RecordType, TypeDescriptor};

/// Shape of a (possibly optional-wrapped) type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    /// Scalar, temporal or enumerated value.
    Scalar(&'a TypeDescriptor),
    Record(&'a RecordType),
    Array(&'a TypeDescriptor),
    /// Array with unique items.
    Set(&'a TypeDescriptor),
    /// String-keyed map carrying the value type.
    Map(&'a TypeDescriptor),
    /// Unrecognized; described as an untyped object.
    Opaque(&'a TypeDescriptor),
}

/// Result of classifying a type descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification<'a> {
    /// Whether one level of optional wrapping was removed.
    pub optional: bool,
    pub shape: Shape<'a>,
}

impl<'a> Classification<'a> {
    pub fn is_collection(&self) -> bool {
        matches!(
            self.shape,
            Shape::Array(_) | Shape::Set(_) | Shape::Map(_)
        )
    }

    /// Element type of a collection, or `None` for non-collections.
    pub fn element(&self) -> Option<&'a TypeDescriptor> {
        match self.shape {
            Shape::Array(e) | Shape::Set(e) | Shape::Map(e) => Some(e),
            _ => None,
        }
    }

    /// The record this type is, or holds as its collection element.
    pub fn record(&self) -> Option<&'a RecordType> {
        match self.shape {
            Shape::Record(record) => Some(record),
            _ => self
                .element()
                .and_then(|element| classify(element).record_only()),
        }
    }

    fn record_only(&self) -> Option<&'a RecordType> {
        match self.shape {
            Shape::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// Classify a type, seeing through exactly one level of optional wrapping.
///
/// Never fails: doubly wrapped optionals and opaque types classify as
/// [`Shape::Opaque`].
pub fn classify(ty: &TypeDescriptor) -> Classification<'_> {
    let (optional, inner) = match ty {
        TypeDescriptor::Optional(inner) => (true, inner.as_ref()),
        other => (false, other),
    };

    let shape = match inner {
        TypeDescriptor::Scalar(_) | TypeDescriptor::Temporal(_) | TypeDescriptor::Enum(_) => {
            Shape::Scalar(inner)
        }
        TypeDescriptor::Record(record) => Shape::Record(record),
        TypeDescriptor::Array(element) => Shape::Array(element),
        TypeDescriptor::Set(element) => Shape::Set(element),
        TypeDescriptor::Map(value) => Shape::Map(value),
        TypeDescriptor::Optional(_) | TypeDescriptor::Opaque(_) => Shape::Opaque(inner),
    };

    Classification { optional, shape }
}
