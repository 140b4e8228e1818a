//! The in-memory model of Kotlin metadata.
//!
//! The model is a single tree per class file, rooted at [`KotlinMetadata`]. Nodes own
//! their children; the only cross references are the integer ids that types use to
//! refer to type parameters declared in an enclosing scope.
//!
//! Class names in the model use the class file form (`com/example/Outer$Inner`). The
//! writer converts them to the metadata form on the way out, see [`names`].
//!
//! # Key Components
//!
//! - [`container`] - [`KotlinMetadata`] and the five declaration shapes
//! - [`declarations`] - Functions, properties, constructors, type aliases
//! - [`types`] - Types, type arguments and type parameters
//! - [`contract`] - Contracts, effects and effect expressions
//! - [`annotation`] - Annotations carried inside the metadata
//! - [`version`] - Version requirements and the metadata version
//! - [`flags`] - Flag sets of all declarations
//! - [`signatures`] - JVM method and field signatures
//! - [`names`] - Conversion between class file and metadata name forms

pub mod annotation;
pub mod container;
pub mod contract;
pub mod declarations;
pub mod flags;
pub mod names;
pub mod signatures;
pub mod types;
pub mod version;

pub use annotation::{Annotation, AnnotationArgument, AnnotationNamedArgument};
pub use container::{
    Class, Declaration, HeaderFlags, KotlinMetadata, MetadataKind, MultiFileFacade,
    MultiFilePart, Package, SyntheticClass,
};
pub use contract::{ConstantValue, Contract, Effect, EffectExpression, EffectType, InvocationKind};
pub use declarations::{
    Constructor, DeclarationContainer, Function, Property, TypeAlias, ValueParameter,
};
pub use signatures::{FieldSignature, MethodSignature};
pub use types::{Classifier, FlexibleUpperBound, KotlinType, TypeParameter, TypeProjection, Variance};
pub use version::{MetadataVersion, Version, VersionKind, VersionLevel, VersionRequirement};
