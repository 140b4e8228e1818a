//! # kmetadata Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the kmetadata library. Import this module to get quick access to the essential
//! types for writing Kotlin metadata into class files.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all kmetadata operations
pub use crate::Error;

/// The result type used throughout kmetadata
pub use crate::Result;

/// Writer configuration
pub use crate::config::WriterConfig;

/// Diagnostics collected for skipped containers
pub use crate::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Per-container entry point and its outcomes
pub use crate::embed::{KotlinMetadataWriter, WriteOutcome};

/// Holder annotation access
pub use crate::embed::holder::{attach_metadata_holder, read_metadata_holder};

/// Transcription of a model tree into a wire tuple
pub use crate::writer::{MetadataWriter, WireOutput};

/// The wire tuple and its decoder
pub use crate::wire::{decode, MetadataField, MetadataHeader};

// ================================================================================================
// Class Files
// ================================================================================================

/// Class file types touched by embedding
pub use crate::classfile::{ClassVisitor, ConstantPool, ProgramClass};

// ================================================================================================
// Node Model
// ================================================================================================

/// Top-level shapes
pub use crate::model::{
    Class, Declaration, HeaderFlags, KotlinMetadata, MetadataKind, MultiFileFacade,
    MultiFilePart, Package, SyntheticClass,
};

/// Declarations
pub use crate::model::{
    Constructor, DeclarationContainer, Function, Property, TypeAlias, ValueParameter,
};

/// Types
pub use crate::model::{KotlinType, TypeParameter, TypeProjection, Variance};

/// Flags
pub use crate::model::flags::{
    AccessorFlags, ClassFlags, ClassKind, ConstructorFlags, FunctionFlags, MemberKind, Modality,
    PropertyFlags, TypeAliasFlags, TypeFlags, TypeParameterFlags, ValueParameterFlags, Visibility,
};

/// Name conversions between class file and metadata form
pub use crate::model::names::{NameFunction, ToContainerName, ToMetadataName};
