//! Top-level metadata of a single class file.
//!
//! Every class file compiled by Kotlin carries one [`KotlinMetadata`] value. Its
//! [`Declaration`] is one of five mutually exclusive shapes, selected by
//! [`MetadataKind`]. The shape is fixed once the value is constructed: it is a plain
//! enum and the shared header fields live next to it.

use bitflags::bitflags;
use strum::{EnumCount, EnumIter, FromRepr};

use crate::model::{
    declarations::{Constructor, DeclarationContainer, Function},
    flags::ClassFlags,
    names::NameFunction,
    types::{KotlinType, TypeParameter},
    version::{MetadataVersion, VersionRequirement},
};

/// The five metadata shapes, with their `k` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, FromRepr)]
#[repr(i32)]
pub enum MetadataKind {
    /// A class, interface, object or enum
    Class = 1,
    /// Top-level declarations of a single source file
    FileFacade = 2,
    /// A compiler generated class, e.g. a lambda
    SyntheticClass = 3,
    /// Facade of a `@JvmMultifileClass`
    MultiFileFacade = 4,
    /// One part of a `@JvmMultifileClass`
    MultiFilePart = 5,
}

impl MetadataKind {
    /// Returns the `k` value of this kind
    #[must_use]
    pub fn as_int(self) -> i32 {
        self as i32
    }

    /// Looks up the kind for a `k` value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for values outside `1..=5`.
    pub fn from_int(value: i32) -> crate::Result<Self> {
        MetadataKind::from_repr(value)
            .ok_or_else(|| malformed_error!("Unknown Kotlin metadata kind - {}", value))
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Flags stored in the `xi` field of the holder
    pub struct HeaderFlags: i32 {
        /// Multi-file class parts inherit from the facade
        const MULTI_FILE_PARTS_INHERIT = 1 << 0;
        /// Compiled by a pre-release compiler
        const PRE_RELEASE = 1 << 1;
        /// Readers must reject unknown minor metadata versions
        const STRICT_SEMANTICS = 1 << 3;
        /// Compiled by the K2 compiler front end
        const COMPILED_BY_K2 = 1 << 4;
    }
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    /// Class flags
    pub flags: ClassFlags,
    /// Internal name of the class, e.g. `com/example/Outer$Inner`
    pub name: String,
    /// Type parameters, in declaration order
    pub type_parameters: Vec<TypeParameter>,
    /// Direct supertypes
    pub supertypes: Vec<KotlinType>,
    /// Constructors, in declaration order
    pub constructors: Vec<Constructor>,
    /// Member declarations
    pub declarations: DeclarationContainer,
    /// Simple name of the companion object
    pub companion_object_name: Option<String>,
    /// Names of nested classes
    pub nested_class_names: Vec<String>,
    /// Names of enum entries
    pub enum_entry_names: Vec<String>,
    /// Internal names of permitted sealed subclasses
    pub sealed_subclass_names: Vec<String>,
    /// Version requirement, if any
    pub version_requirement: Option<VersionRequirement>,
    /// Name of the Kotlin module the class belongs to
    pub module_name: Option<String>,
    /// For anonymous objects, the name of the class they were copied from
    pub anonymous_object_origin_name: Option<String>,
}

impl Class {
    /// Creates an empty public final class
    pub fn new(name: impl Into<String>) -> Self {
        Class {
            flags: ClassFlags::default(),
            name: name.into(),
            type_parameters: Vec::new(),
            supertypes: Vec::new(),
            constructors: Vec::new(),
            declarations: DeclarationContainer::default(),
            companion_object_name: None,
            nested_class_names: Vec::new(),
            enum_entry_names: Vec::new(),
            sealed_subclass_names: Vec::new(),
            version_requirement: None,
            module_name: None,
            anonymous_object_origin_name: None,
        }
    }
}

/// The top-level declarations of a file facade or multi-file part.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Package {
    /// The declarations
    pub declarations: DeclarationContainer,
    /// Name of the Kotlin module the file belongs to
    pub module_name: Option<String>,
}

/// A compiler generated class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntheticClass {
    /// Functions compiled into the class; lambdas carry exactly one
    pub functions: Vec<Function>,
}

/// Facade class of a multi-file class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiFileFacade {
    /// Internal names of the parts
    pub part_class_names: Vec<String>,
}

/// One part of a multi-file class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiFilePart {
    /// Internal name of the facade class (`xs`)
    pub facade_class_name: String,
    /// Declarations of the part
    pub package: Package,
}

/// Shape specific payload of [`KotlinMetadata`].
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `k = 1`
    Class(Box<Class>),
    /// `k = 2`
    FileFacade(Package),
    /// `k = 3`
    SyntheticClass(SyntheticClass),
    /// `k = 4`
    MultiFileFacade(MultiFileFacade),
    /// `k = 5`
    MultiFilePart(MultiFilePart),
}

/// Kotlin metadata of one class file.
#[derive(Debug, Clone, PartialEq)]
pub struct KotlinMetadata {
    /// Metadata format version (`mv`)
    pub version: MetadataVersion,
    /// Bytecode version (`bv`), carried through unchanged
    pub bytecode_version: Vec<i32>,
    /// Header flags (`xi`)
    pub flags: HeaderFlags,
    /// JVM package name (`pn`) when it differs from the Kotlin package, empty otherwise
    pub package_name: String,
    /// The shape specific payload
    pub declaration: Declaration,
}

impl KotlinMetadata {
    /// Default bytecode version written by Kotlin compilers
    pub const DEFAULT_BYTECODE_VERSION: [i32; 3] = [1, 0, 3];

    /// Wraps a declaration with default header fields
    #[must_use]
    pub fn new(declaration: Declaration) -> Self {
        KotlinMetadata {
            version: MetadataVersion::default(),
            bytecode_version: Self::DEFAULT_BYTECODE_VERSION.to_vec(),
            flags: HeaderFlags::empty(),
            package_name: String::new(),
            declaration,
        }
    }

    /// Creates metadata for a class
    #[must_use]
    pub fn class(class: Class) -> Self {
        Self::new(Declaration::Class(Box::new(class)))
    }

    /// Creates metadata for a file facade
    #[must_use]
    pub fn file_facade(package: Package) -> Self {
        Self::new(Declaration::FileFacade(package))
    }

    /// Returns the shape of this metadata
    #[must_use]
    pub fn kind(&self) -> MetadataKind {
        match &self.declaration {
            Declaration::Class(_) => MetadataKind::Class,
            Declaration::FileFacade(_) => MetadataKind::FileFacade,
            Declaration::SyntheticClass(_) => MetadataKind::SyntheticClass,
            Declaration::MultiFileFacade(_) => MetadataKind::MultiFileFacade,
            Declaration::MultiFilePart(_) => MetadataKind::MultiFilePart,
        }
    }

    /// Applies `f` to every class name the writer converts between name forms.
    ///
    /// This covers the class name, nested and sealed subclass names, and every class
    /// reference inside a type. Enum entries, alias names, origin names, annotation
    /// class names and multi-file part names are left alone.
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        match &mut self.declaration {
            Declaration::Class(class) => {
                class.name = f.transform(&class.name);
                for name in class
                    .nested_class_names
                    .iter_mut()
                    .chain(&mut class.sealed_subclass_names)
                {
                    *name = f.transform(name);
                }
                for type_parameter in &mut class.type_parameters {
                    type_parameter.map_class_names(f);
                }
                for supertype in &mut class.supertypes {
                    supertype.map_class_names(f);
                }
                for constructor in &mut class.constructors {
                    constructor.map_class_names(f);
                }
                class.declarations.map_class_names(f);
            }
            Declaration::FileFacade(package) => package.declarations.map_class_names(f),
            Declaration::MultiFilePart(part) => part.package.declarations.map_class_names(f),
            Declaration::SyntheticClass(synthetic) => {
                for function in &mut synthetic.functions {
                    function.map_class_names(f);
                }
            }
            Declaration::MultiFileFacade(_) => {}
        }
    }
}
