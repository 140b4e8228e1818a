//! Transcription of the node model into the wire tuple.
//!
//! [`MetadataWriter`] walks one [`KotlinMetadata`] tree depth-first and drives the
//! nested builders of [`crate::wire::builder`], producing a [`MetadataHeader`]. The
//! walk is a pure function of the tree: the header is returned as a value and no state
//! survives between calls, so one writer may serve any number of class files and
//! threads.
//!
//! # Traversal
//!
//! Within every declaration scope the type parameters come first, so a type never
//! refers to a type parameter id before it has been declared. A class is written as
//!
//! 1. flags and name, then the companion object name
//! 2. type parameters
//! 3. properties, functions and type aliases, each in model order
//! 4. enum entry, nested class and sealed subclass names
//! 5. constructors
//! 6. supertypes and the version requirement
//! 7. the extension block: module name, local delegated properties and the
//!    anonymous object origin name
//!
//! File facades and multi-file parts use steps 3 and 7 only; synthetic classes hold
//! one function message per function.
//!
//! # Examples
//!
//! ```rust
//! use kmetadata::{
//!     config::WriterConfig,
//!     model::{KotlinMetadata, KotlinType, Package, Property},
//!     writer::MetadataWriter,
//! };
//!
//! let mut package = Package::default();
//! package
//!     .declarations
//!     .properties
//!     .push(Property::new("x", KotlinType::class("kotlin/String")));
//!
//! let writer = MetadataWriter::new(WriterConfig::default());
//! let output = writer.write(&KotlinMetadata::file_facade(package))?;
//! assert_eq!(output.header.kind, 2);
//! assert!(output.header.data2.contains(&"kotlin/String".to_string()));
//! # Ok::<(), kmetadata::Error>(())
//! ```

mod annotation;
mod contract;
mod declarations;
mod types;

pub use types::TypeSlot;

use tracing::debug;

use crate::{
    config::WriterConfig,
    model::{
        container::{Class, Declaration, HeaderFlags, KotlinMetadata, Package, SyntheticClass},
        names::to_metadata_name,
        version::MetadataVersion,
    },
    wire::{
        builder::{BuilderEvent, EncodedPayload, MessageBuilder, RootBuilder},
        header::MetadataHeader,
        schema::{NodeKind, CLASS, CLASS_EXTENSION, LAMBDA, PACKAGE, PACKAGE_EXTENSION},
    },
    Error, Result,
};

use declarations::{write_version_requirement, MemberFields};

/// Result of writing one class file's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireOutput {
    /// The wire tuple to embed
    pub header: MetadataHeader,
    /// Builder events, empty unless [`WriterConfig::record_journal`] is set
    pub journal: Vec<BuilderEvent>,
}

/// Writes [`KotlinMetadata`] trees into wire tuples.
#[derive(Debug, Clone, Default)]
pub struct MetadataWriter {
    config: WriterConfig,
}

impl MetadataWriter {
    /// Creates a writer with the given configuration
    #[must_use]
    pub fn new(config: WriterConfig) -> Self {
        MetadataWriter { config }
    }

    /// Returns the configuration of this writer
    #[must_use]
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Transcribes `metadata` into its wire tuple.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ModelInvariant`] if the tree cannot be expressed on the
    /// wire, for example a type parameter id declared twice in one scope or a metadata
    /// version readers do not support, and
    /// [`crate::Error::RecursionLimit`] if types or effect expressions nest deeper than
    /// [`WriterConfig::max_type_depth`].
    pub fn write(&self, metadata: &KotlinMetadata) -> Result<WireOutput> {
        let strict = metadata.flags.contains(HeaderFlags::STRICT_SEMANTICS);
        if !metadata.version.is_compatible(strict) {
            return Err(Error::ModelInvariant(format!(
                "metadata version {} is not supported, readers accept {}.x up to {}",
                metadata.version,
                MetadataVersion::LATEST.0.major,
                MetadataVersion::LATEST
            )));
        }
        let metadata_version = metadata.version.to_array()?;

        let transcriber = Transcriber {
            max_type_depth: self.config.max_type_depth,
        };
        let journal = self.config.record_journal;

        let (payload, extra_string, package_name) = match &metadata.declaration {
            Declaration::Class(class) => {
                let mut root = RootBuilder::class(journal);
                transcriber.write_class(&mut root.root(), class)?;
                (self.finish(root), String::new(), String::new())
            }
            Declaration::FileFacade(package) => {
                let mut root = RootBuilder::package(journal);
                transcriber.write_package(&mut root.root(), package)?;
                (self.finish(root), String::new(), metadata.package_name.clone())
            }
            Declaration::SyntheticClass(synthetic) => {
                let mut root = RootBuilder::lambda(journal);
                transcriber.write_lambda(&mut root.root(), synthetic)?;
                (self.finish(root), String::new(), metadata.package_name.clone())
            }
            Declaration::MultiFileFacade(facade) => {
                let payload = EncodedPayload {
                    data1: facade.part_class_names.clone(),
                    data2: Vec::new(),
                    journal: Vec::new(),
                };
                (payload, String::new(), metadata.package_name.clone())
            }
            Declaration::MultiFilePart(part) => {
                let mut root = RootBuilder::package(journal);
                transcriber.write_package(&mut root.root(), &part.package)?;
                (
                    self.finish(root),
                    part.facade_class_name.clone(),
                    metadata.package_name.clone(),
                )
            }
        };

        debug!(
            kind = ?metadata.kind(),
            chunks = payload.data1.len(),
            strings = payload.data2.len(),
            "transcribed metadata"
        );

        Ok(WireOutput {
            header: MetadataHeader {
                kind: metadata.kind().as_int(),
                metadata_version,
                bytecode_version: metadata.bytecode_version.clone(),
                data1: payload.data1,
                data2: payload.data2,
                extra_int: metadata.flags.bits(),
                extra_string,
                package_name,
            },
            journal: payload.journal,
        })
    }

    fn finish(&self, root: RootBuilder) -> EncodedPayload {
        root.finish(self.config.string_chunk_limit())
    }
}

/// Per-call transcription state.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Transcriber {
    pub(crate) max_type_depth: usize,
}

impl Transcriber {
    fn write_class(&self, builder: &mut MessageBuilder<'_>, class: &Class) -> Result<()> {
        builder.uint(CLASS::FLAGS, class.flags.as_int());
        builder.string(CLASS::FQ_NAME, &to_metadata_name(&class.name));
        if let Some(companion) = &class.companion_object_name {
            builder.string(CLASS::COMPANION_OBJECT_NAME, companion);
        }

        self.write_type_parameters(builder, CLASS::TYPE_PARAMETER, &class.type_parameters)?;
        self.write_members(
            builder,
            MemberFields {
                function: CLASS::FUNCTION,
                property: CLASS::PROPERTY,
                type_alias: CLASS::TYPE_ALIAS,
            },
            &class.declarations,
        )?;

        for entry in &class.enum_entry_names {
            builder.string(CLASS::ENUM_ENTRY, entry);
        }
        for nested in &class.nested_class_names {
            builder.string(CLASS::NESTED_CLASS_NAME, &to_metadata_name(nested));
        }
        for subclass in &class.sealed_subclass_names {
            builder.string(CLASS::SEALED_SUBCLASS_NAME, &to_metadata_name(subclass));
        }

        for constructor in &class.constructors {
            self.write_constructor(builder, CLASS::CONSTRUCTOR, constructor)?;
        }
        for supertype in &class.supertypes {
            self.write_type(builder, TypeSlot::Supertype, supertype, 1)?;
        }
        if let Some(requirement) = &class.version_requirement {
            write_version_requirement(builder, CLASS::VERSION_REQUIREMENT, requirement)?;
        }

        let mut extension = builder.child(CLASS::EXTENSIONS, NodeKind::ClassExtension)?;
        if let Some(module) = &class.module_name {
            extension.string(CLASS_EXTENSION::MODULE_NAME, module);
        }
        for property in &class.declarations.local_delegated_properties {
            self.write_property(
                &mut extension,
                CLASS_EXTENSION::LOCAL_DELEGATED_PROPERTY,
                property,
            )?;
        }
        if let Some(origin) = &class.anonymous_object_origin_name {
            extension.string(CLASS_EXTENSION::ANONYMOUS_OBJECT_ORIGIN_NAME, origin);
        }
        extension.close();

        Ok(())
    }

    fn write_package(&self, builder: &mut MessageBuilder<'_>, package: &Package) -> Result<()> {
        self.write_members(
            builder,
            MemberFields {
                function: PACKAGE::FUNCTION,
                property: PACKAGE::PROPERTY,
                type_alias: PACKAGE::TYPE_ALIAS,
            },
            &package.declarations,
        )?;

        let mut extension = builder.child(PACKAGE::EXTENSIONS, NodeKind::PackageExtension)?;
        if let Some(module) = &package.module_name {
            extension.string(PACKAGE_EXTENSION::MODULE_NAME, module);
        }
        for property in &package.declarations.local_delegated_properties {
            self.write_property(
                &mut extension,
                PACKAGE_EXTENSION::LOCAL_DELEGATED_PROPERTY,
                property,
            )?;
        }
        extension.close();

        Ok(())
    }

    fn write_lambda(
        &self,
        builder: &mut MessageBuilder<'_>,
        synthetic: &SyntheticClass,
    ) -> Result<()> {
        for function in &synthetic.functions {
            self.write_function(builder, LAMBDA::FUNCTION, function)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{
            container::{MultiFileFacade, MultiFilePart},
            declarations::{Constructor, Function, Property, ValueParameter},
            signatures::MethodSignature,
            types::{KotlinType, TypeParameter},
        },
        wire::reader::decode,
        Error,
    };

    fn writer() -> MetadataWriter {
        MetadataWriter::new(WriterConfig::debug())
    }

    #[test]
    fn class_header_fields() {
        let mut class = Class::new("com/example/Outer$Inner");
        class.supertypes.push(KotlinType::class("kotlin/Any"));
        let mut metadata = KotlinMetadata::class(class);
        metadata.package_name = "ignored/for/classes".into();

        let output = writer().write(&metadata).unwrap();
        assert_eq!(output.header.kind, 1);
        assert_eq!(output.header.metadata_version, vec![1, 9, 0]);
        assert_eq!(output.header.bytecode_version, vec![1, 0, 3]);
        assert!(output.header.package_name.is_empty());
        assert!(output.header.extra_string.is_empty());
        assert!(output
            .header
            .data2
            .contains(&"com/example/Outer.Inner".to_string()));
    }

    #[test]
    fn multi_file_facade_lists_parts_verbatim() {
        let metadata = KotlinMetadata::new(Declaration::MultiFileFacade(MultiFileFacade {
            part_class_names: vec!["a/Util__AKt".into(), "a/Util__BKt".into()],
        }));
        let header = writer().write(&metadata).unwrap().header;
        assert_eq!(header.kind, 4);
        assert_eq!(header.data1, vec!["a/Util__AKt", "a/Util__BKt"]);
        assert!(header.data2.is_empty());
    }

    #[test]
    fn multi_file_part_carries_facade_name() {
        let metadata = KotlinMetadata::new(Declaration::MultiFilePart(MultiFilePart {
            facade_class_name: "a/UtilKt".into(),
            package: Package::default(),
        }));
        let header = writer().write(&metadata).unwrap().header;
        assert_eq!(header.kind, 5);
        assert_eq!(header.extra_string, "a/UtilKt");
    }

    #[test]
    fn empty_synthetic_class() {
        let metadata = KotlinMetadata::new(Declaration::SyntheticClass(SyntheticClass::default()));
        let header = writer().write(&metadata).unwrap().header;
        assert_eq!(header.kind, 3);
        assert!(header.data1.is_empty());
        assert!(header.data2.is_empty());
    }

    #[test]
    fn constructor_extension_only_with_signature() {
        let mut class = Class::new("a/A");
        class.constructors.push(Constructor::new());
        let mut signed = Constructor::new();
        signed.signature = Some(MethodSignature::new("<init>", "()V"));
        class.constructors.push(signed);

        let journal = writer().write(&KotlinMetadata::class(class)).unwrap().journal;
        let extensions = journal
            .iter()
            .filter(|e| **e == BuilderEvent::Open(NodeKind::ConstructorExtension))
            .count();
        assert_eq!(extensions, 1);
    }

    #[test]
    fn lambda_functions_round_trip() {
        let mut function = Function::new("invoke", KotlinType::class("kotlin/Unit"));
        function
            .value_parameters
            .push(ValueParameter::new("it", KotlinType::class("kotlin/Int")));
        let metadata = KotlinMetadata::new(Declaration::SyntheticClass(SyntheticClass {
            functions: vec![function],
        }));

        let header = writer().write(&metadata).unwrap().header;
        assert_eq!(decode(&header).unwrap(), metadata);
    }

    #[test]
    fn duplicate_class_type_parameter_is_an_invariant_violation() {
        let mut class = Class::new("a/A");
        class.type_parameters.push(TypeParameter::new(0, "T"));
        class.type_parameters.push(TypeParameter::new(0, "U"));
        assert!(matches!(
            writer().write(&KotlinMetadata::class(class)),
            Err(Error::ModelInvariant(_))
        ));
    }

    #[test]
    fn journal_is_balanced() {
        let mut package = Package::default();
        let mut property = Property::new("x", KotlinType::class("kotlin/String"));
        property.getter_signature = Some(MethodSignature::new("getX", "()Ljava/lang/String;"));
        package.declarations.properties.push(property);
        package.module_name = Some("main".into());

        let journal = writer()
            .write(&KotlinMetadata::file_facade(package))
            .unwrap()
            .journal;
        let mut open = Vec::new();
        for event in journal {
            match event {
                BuilderEvent::Open(kind) => open.push(kind),
                BuilderEvent::Close(kind) => assert_eq!(open.pop(), Some(kind)),
                _ => {}
            }
        }
        assert!(open.is_empty());
    }

    #[test]
    fn journal_is_empty_by_default() {
        let output = MetadataWriter::default()
            .write(&KotlinMetadata::file_facade(Package::default()))
            .unwrap();
        assert!(output.journal.is_empty());
    }
}
