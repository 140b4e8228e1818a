//! The wire tuple.
//!
//! [`MetadataHeader`] is the complete serialized form of one class file's metadata:
//! the eight values stored in the elements of the `kotlin.Metadata` annotation.

use strum::{AsRefStr, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// Element names of the `kotlin.Metadata` annotation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, EnumString, AsRefStr, IntoStaticStr,
)]
pub enum MetadataField {
    /// `k`, the metadata kind
    #[strum(serialize = "k")]
    Kind,
    /// `mv`, the metadata version
    #[strum(serialize = "mv")]
    MetadataVersion,
    /// `bv`, the bytecode version
    #[strum(serialize = "bv")]
    BytecodeVersion,
    /// `d1`, the encoded payload
    #[strum(serialize = "d1")]
    Data1,
    /// `d2`, the string table
    #[strum(serialize = "d2")]
    Data2,
    /// `xi`, extra flags
    #[strum(serialize = "xi")]
    ExtraInt,
    /// `xs`, extra string
    #[strum(serialize = "xs")]
    ExtraString,
    /// `pn`, the JVM package name
    #[strum(serialize = "pn")]
    PackageName,
}

/// Shape of the value an element holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A single `int` constant
    Int,
    /// A single string constant
    String,
    /// An array of `int` constants
    IntArray,
    /// An array of string constants
    StringArray,
}

impl MetadataField {
    /// Returns the element name
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Returns the shape of the element's value
    #[must_use]
    pub fn shape(self) -> FieldShape {
        match self {
            MetadataField::Kind | MetadataField::ExtraInt => FieldShape::Int,
            MetadataField::MetadataVersion | MetadataField::BytecodeVersion => {
                FieldShape::IntArray
            }
            MetadataField::Data1 | MetadataField::Data2 => FieldShape::StringArray,
            MetadataField::ExtraString | MetadataField::PackageName => FieldShape::String,
        }
    }
}

/// A value of one holder element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue<'a> {
    /// A single `int`
    Int(i32),
    /// A single string
    String(&'a str),
    /// An `int` array
    IntArray(&'a [i32]),
    /// A string array
    StringArray(&'a [String]),
}

/// The eight values of a `kotlin.Metadata` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataHeader {
    /// `k`
    pub kind: i32,
    /// `mv`
    pub metadata_version: Vec<i32>,
    /// `bv`
    pub bytecode_version: Vec<i32>,
    /// `d1`
    pub data1: Vec<String>,
    /// `d2`
    pub data2: Vec<String>,
    /// `xi`
    pub extra_int: i32,
    /// `xs`
    pub extra_string: String,
    /// `pn`
    pub package_name: String,
}

impl Default for MetadataHeader {
    /// The annotation defaults: elements a compiler may omit from the holder
    fn default() -> Self {
        MetadataHeader {
            kind: 1,
            metadata_version: Vec::new(),
            bytecode_version: vec![1, 0, 3],
            data1: Vec::new(),
            data2: Vec::new(),
            extra_int: 0,
            extra_string: String::new(),
            package_name: String::new(),
        }
    }
}

impl MetadataHeader {
    /// Returns the value of the given element
    #[must_use]
    pub fn value(&self, field: MetadataField) -> HeaderValue<'_> {
        match field {
            MetadataField::Kind => HeaderValue::Int(self.kind),
            MetadataField::MetadataVersion => HeaderValue::IntArray(&self.metadata_version),
            MetadataField::BytecodeVersion => HeaderValue::IntArray(&self.bytecode_version),
            MetadataField::Data1 => HeaderValue::StringArray(&self.data1),
            MetadataField::Data2 => HeaderValue::StringArray(&self.data2),
            MetadataField::ExtraInt => HeaderValue::Int(self.extra_int),
            MetadataField::ExtraString => HeaderValue::String(&self.extra_string),
            MetadataField::PackageName => HeaderValue::String(&self.package_name),
        }
    }

    /// Returns true if the element holds its annotation default
    #[must_use]
    pub fn is_default(&self, field: MetadataField) -> bool {
        let defaults = MetadataHeader::default();
        self.value(field) == defaults.value(field)
    }
}
