//! Annotation types carried through the metadata.
//!
//! Annotations attached to types, type parameters and type aliases are stored inside
//! the metadata itself rather than in class file attributes. The writer treats them as
//! opaque values and transcribes them unchanged; in particular, annotation class names
//! are not subjected to the nesting separator substitution.

/// An annotation applied to a type, type parameter or type alias
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Class name of the annotation, e.g. `kotlin/Deprecated`
    pub class_name: String,
    /// Named arguments, in declaration order
    pub arguments: Vec<AnnotationNamedArgument>,
}

impl Annotation {
    /// Creates an annotation without arguments
    pub fn new(class_name: impl Into<String>) -> Self {
        Annotation {
            class_name: class_name.into(),
            arguments: Vec::new(),
        }
    }

    /// Appends a named argument
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: AnnotationArgument) -> Self {
        self.arguments.push(AnnotationNamedArgument {
            name: name.into(),
            value,
        });
        self
    }
}

/// A named argument of an annotation
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationNamedArgument {
    /// Name of the annotation parameter
    pub name: String,
    /// Value of the argument
    pub value: AnnotationArgument,
}

/// Represents a single annotation argument value
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationArgument {
    /// Signed 8-bit integer
    Byte(i8),
    /// UTF-16 code unit
    Char(u16),
    /// Signed 16-bit integer
    Short(i16),
    /// Signed 32-bit integer
    Int(i32),
    /// Signed 64-bit integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Boolean value
    Boolean(bool),
    /// Unsigned 8-bit integer
    UByte(u8),
    /// Unsigned 16-bit integer
    UShort(u16),
    /// Unsigned 32-bit integer
    UInt(u32),
    /// Unsigned 64-bit integer
    ULong(u64),
    /// String value
    String(String),
    /// Class literal (`Foo::class`, `Array<Foo>::class` with dimensions)
    KClass {
        /// Class name of the literal
        class_name: String,
        /// Number of array dimensions wrapped around the class
        array_dimensions: u32,
    },
    /// Enum entry reference
    Enum {
        /// Class name of the enum
        class_name: String,
        /// Name of the entry
        entry_name: String,
    },
    /// Nested annotation
    Annotation(Annotation),
    /// Array of arguments
    Array(Vec<AnnotationArgument>),
}

/// Wire tags of [`AnnotationArgument`] variants
#[allow(non_snake_case, missing_docs)]
pub mod ARGUMENT_TYPE {
    pub const BYTE: u32 = 0;
    pub const CHAR: u32 = 1;
    pub const SHORT: u32 = 2;
    pub const INT: u32 = 3;
    pub const LONG: u32 = 4;
    pub const FLOAT: u32 = 5;
    pub const DOUBLE: u32 = 6;
    pub const BOOLEAN: u32 = 7;
    pub const STRING: u32 = 8;
    pub const CLASS: u32 = 9;
    pub const ENUM: u32 = 10;
    pub const ANNOTATION: u32 = 11;
    pub const ARRAY: u32 = 12;
    pub const UBYTE: u32 = 13;
    pub const USHORT: u32 = 14;
    pub const UINT: u32 = 15;
    pub const ULONG: u32 = 16;
}

impl AnnotationArgument {
    /// Returns the wire tag of this argument
    #[must_use]
    pub fn type_tag(&self) -> u32 {
        match self {
            AnnotationArgument::Byte(_) => ARGUMENT_TYPE::BYTE,
            AnnotationArgument::Char(_) => ARGUMENT_TYPE::CHAR,
            AnnotationArgument::Short(_) => ARGUMENT_TYPE::SHORT,
            AnnotationArgument::Int(_) => ARGUMENT_TYPE::INT,
            AnnotationArgument::Long(_) => ARGUMENT_TYPE::LONG,
            AnnotationArgument::Float(_) => ARGUMENT_TYPE::FLOAT,
            AnnotationArgument::Double(_) => ARGUMENT_TYPE::DOUBLE,
            AnnotationArgument::Boolean(_) => ARGUMENT_TYPE::BOOLEAN,
            AnnotationArgument::UByte(_) => ARGUMENT_TYPE::UBYTE,
            AnnotationArgument::UShort(_) => ARGUMENT_TYPE::USHORT,
            AnnotationArgument::UInt(_) => ARGUMENT_TYPE::UINT,
            AnnotationArgument::ULong(_) => ARGUMENT_TYPE::ULONG,
            AnnotationArgument::String(_) => ARGUMENT_TYPE::STRING,
            AnnotationArgument::KClass { .. } => ARGUMENT_TYPE::CLASS,
            AnnotationArgument::Enum { .. } => ARGUMENT_TYPE::ENUM,
            AnnotationArgument::Annotation(_) => ARGUMENT_TYPE::ANNOTATION,
            AnnotationArgument::Array(_) => ARGUMENT_TYPE::ARRAY,
        }
    }

    /// Returns the integral payload of scalar arguments, as stored on the wire.
    ///
    /// Unsigned values are reinterpreted bit for bit; floating point values are carried
    /// as their IEEE-754 bit patterns.
    #[must_use]
    pub fn integral_value(&self) -> Option<i64> {
        match self {
            AnnotationArgument::Byte(v) => Some(i64::from(*v)),
            AnnotationArgument::Char(v) => Some(i64::from(*v)),
            AnnotationArgument::Short(v) => Some(i64::from(*v)),
            AnnotationArgument::Int(v) => Some(i64::from(*v)),
            AnnotationArgument::Long(v) => Some(*v),
            AnnotationArgument::Float(v) => Some(i64::from(v.to_bits())),
            AnnotationArgument::Double(v) => Some(v.to_bits() as i64),
            AnnotationArgument::Boolean(v) => Some(i64::from(*v)),
            AnnotationArgument::UByte(v) => Some(i64::from(*v)),
            AnnotationArgument::UShort(v) => Some(i64::from(*v)),
            AnnotationArgument::UInt(v) => Some(i64::from(*v)),
            AnnotationArgument::ULong(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Rebuilds a scalar argument from its wire tag and integral payload.
    ///
    /// Returns `None` for tags that do not denote a scalar.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_integral(tag: u32, value: i64) -> Option<Self> {
        Some(match tag {
            ARGUMENT_TYPE::BYTE => AnnotationArgument::Byte(value as i8),
            ARGUMENT_TYPE::CHAR => AnnotationArgument::Char(value as u16),
            ARGUMENT_TYPE::SHORT => AnnotationArgument::Short(value as i16),
            ARGUMENT_TYPE::INT => AnnotationArgument::Int(value as i32),
            ARGUMENT_TYPE::LONG => AnnotationArgument::Long(value),
            ARGUMENT_TYPE::FLOAT => AnnotationArgument::Float(f32::from_bits(value as u32)),
            ARGUMENT_TYPE::DOUBLE => AnnotationArgument::Double(f64::from_bits(value as u64)),
            ARGUMENT_TYPE::BOOLEAN => AnnotationArgument::Boolean(value != 0),
            ARGUMENT_TYPE::UBYTE => AnnotationArgument::UByte(value as u8),
            ARGUMENT_TYPE::USHORT => AnnotationArgument::UShort(value as u16),
            ARGUMENT_TYPE::UINT => AnnotationArgument::UInt(value as u32),
            ARGUMENT_TYPE::ULONG => AnnotationArgument::ULong(value as u64),
            _ => return None,
        })
    }
}
