//! Runtime visible annotations of a class file.
//!
//! Annotations store every value as an index into the constant pool. Scalar elements
//! carry a one-byte tag naming the kind of constant they refer to; arrays and nested
//! annotations hold further element values.

use crate::classfile::constant_pool::ConstantPool;
use crate::Result;

/// `const_value_index` tag of an `int` element
pub const TAG_INT: u8 = b'I';
/// `const_value_index` tag of a `String` element
pub const TAG_STRING: u8 = b's';
/// Tag of an enum constant element
pub const TAG_ENUM: u8 = b'e';
/// Tag of a class literal element
pub const TAG_CLASS: u8 = b'c';
/// Tag of a nested annotation element
pub const TAG_ANNOTATION: u8 = b'@';
/// Tag of an array element
pub const TAG_ARRAY: u8 = b'[';

/// The value of an annotation element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// A constant, `tag` names its kind (`I`, `s`, `J`, ...)
    Const {
        /// Element tag
        tag: u8,
        /// Index of the constant
        const_value_index: u16,
    },
    /// An enum constant
    Enum {
        /// Index of the enum type descriptor
        type_name_index: u16,
        /// Index of the constant's simple name
        const_name_index: u16,
    },
    /// A class literal
    Class {
        /// Index of the return descriptor
        class_info_index: u16,
    },
    /// A nested annotation
    Annotation(Annotation),
    /// An array of values
    Array(Vec<ElementValue>),
}

impl ElementValue {
    /// Returns the element tag
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            ElementValue::Const { tag, .. } => *tag,
            ElementValue::Enum { .. } => TAG_ENUM,
            ElementValue::Class { .. } => TAG_CLASS,
            ElementValue::Annotation(_) => TAG_ANNOTATION,
            ElementValue::Array(_) => TAG_ARRAY,
        }
    }

    /// Returns true for a single `int` constant
    #[must_use]
    pub fn is_int(&self) -> bool {
        matches!(self, ElementValue::Const { tag: TAG_INT, .. })
    }

    /// Returns true for a single string constant
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, ElementValue::Const { tag: TAG_STRING, .. })
    }

    /// Returns true if this is an array whose elements all satisfy `predicate`
    pub fn is_array_of(&self, predicate: impl Fn(&ElementValue) -> bool) -> bool {
        match self {
            ElementValue::Array(values) => values.iter().all(predicate),
            _ => false,
        }
    }

    /// Visits every constant pool index held by this value, mutably
    pub(crate) fn for_each_index_mut(&mut self, f: &mut dyn FnMut(&mut u16)) {
        match self {
            ElementValue::Const {
                const_value_index, ..
            } => f(const_value_index),
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => {
                f(type_name_index);
                f(const_name_index);
            }
            ElementValue::Class { class_info_index } => f(class_info_index),
            ElementValue::Annotation(annotation) => annotation.for_each_index_mut(f),
            ElementValue::Array(values) => {
                for value in values {
                    value.for_each_index_mut(f);
                }
            }
        }
    }
}

/// A named element of an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValuePair {
    /// Index of the element name
    pub name_index: u16,
    /// The element value
    pub value: ElementValue,
}

/// One annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Index of the annotation type descriptor (`Lkotlin/Metadata;`)
    pub type_index: u16,
    /// Elements, in class file order
    pub elements: Vec<ElementValuePair>,
}

impl Annotation {
    /// Creates an annotation without elements
    #[must_use]
    pub fn new(type_index: u16) -> Self {
        Annotation {
            type_index,
            elements: Vec::new(),
        }
    }

    /// Resolves the type descriptor of this annotation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConstantIndex`] if the type index is not a
    /// `CONSTANT_Utf8` entry of `pool`.
    pub fn type_descriptor<'p>(&self, pool: &'p ConstantPool) -> Result<&'p str> {
        pool.utf8(self.type_index)
    }

    /// Resolves the element names of this annotation, in class file order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConstantIndex`] if a name index is not a
    /// `CONSTANT_Utf8` entry of `pool`.
    pub fn element_names<'p>(&self, pool: &'p ConstantPool) -> Result<Vec<&'p str>> {
        self.elements
            .iter()
            .map(|element| pool.utf8(element.name_index))
            .collect()
    }

    /// Visits every constant pool index held by this annotation, mutably
    pub(crate) fn for_each_index_mut(&mut self, f: &mut dyn FnMut(&mut u16)) {
        f(&mut self.type_index);
        for element in &mut self.elements {
            f(&mut element.name_index);
            element.value.for_each_index_mut(f);
        }
    }
}
