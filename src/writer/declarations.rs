//! Transcription of functions, properties, constructors and type aliases.
//!
//! Each declaration writes its type parameters first, then the remaining children in
//! a fixed order, and finally its extension block with the JVM signatures.

use crate::{
    model::{
        declarations::{
            Constructor, DeclarationContainer, Function, Property, TypeAlias, ValueParameter,
        },
        signatures::{FieldSignature, MethodSignature},
        version::VersionRequirement,
    },
    wire::{
        builder::MessageBuilder,
        schema::{
            NodeKind, CONSTRUCTOR, CONSTRUCTOR_EXTENSION, FUNCTION, FUNCTION_EXTENSION, PROPERTY,
            PROPERTY_EXTENSION, SIGNATURE, TYPE_ALIAS, VALUE_PARAMETER, VERSION_REQUIREMENT,
        },
    },
    Error, Result,
};

use super::{annotation::write_annotation, types::TypeSlot, Transcriber};

/// Field numbers of the declaration lists of a container message.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MemberFields {
    pub function: u32,
    pub property: u32,
    pub type_alias: u32,
}

impl Transcriber {
    /// Writes properties, functions and type aliases of `declarations`, in that order.
    ///
    /// Local delegated properties belong to the extension block and are not written
    /// here.
    pub(crate) fn write_members(
        &self,
        parent: &mut MessageBuilder<'_>,
        fields: MemberFields,
        declarations: &DeclarationContainer,
    ) -> Result<()> {
        for property in &declarations.properties {
            self.write_property(parent, fields.property, property)?;
        }
        for function in &declarations.functions {
            self.write_function(parent, fields.function, function)?;
        }
        for alias in &declarations.type_aliases {
            self.write_type_alias(parent, fields.type_alias, alias)?;
        }
        Ok(())
    }

    /// Writes `function` as a child of `parent` at `field`.
    pub(crate) fn write_function(
        &self,
        parent: &mut MessageBuilder<'_>,
        field: u32,
        function: &Function,
    ) -> Result<()> {
        let mut builder = parent.child(field, NodeKind::Function)?;
        builder.uint(FUNCTION::FLAGS, function.flags.as_int());
        builder.string(FUNCTION::NAME, &function.name);

        self.write_type_parameters(
            &mut builder,
            FUNCTION::TYPE_PARAMETER,
            &function.type_parameters,
        )?;
        for parameter in &function.value_parameters {
            self.write_value_parameter(&mut builder, FUNCTION::VALUE_PARAMETER, parameter)?;
        }
        self.write_type(
            &mut builder,
            TypeSlot::FunctionReturn,
            &function.return_type,
            1,
        )?;
        if let Some(receiver) = &function.receiver_type {
            self.write_type(&mut builder, TypeSlot::FunctionReceiver, receiver, 1)?;
        }
        if let Some(requirement) = &function.version_requirement {
            write_version_requirement(&mut builder, FUNCTION::VERSION_REQUIREMENT, requirement)?;
        }
        if let Some(contract) = &function.contract {
            self.write_contract(&mut builder, contract)?;
        }

        let mut extension = builder.child(FUNCTION::EXTENSIONS, NodeKind::FunctionExtension)?;
        if let Some(signature) = &function.signature {
            write_method_signature(&mut extension, FUNCTION_EXTENSION::SIGNATURE, signature)?;
        }
        if let Some(origin) = &function.lambda_class_origin_name {
            extension.string(FUNCTION_EXTENSION::LAMBDA_CLASS_ORIGIN_NAME, origin);
        }
        extension.close();

        builder.close();
        Ok(())
    }

    /// Writes `property` as a child of `parent` at `field`.
    pub(crate) fn write_property(
        &self,
        parent: &mut MessageBuilder<'_>,
        field: u32,
        property: &Property,
    ) -> Result<()> {
        let mut builder = parent.child(field, NodeKind::Property)?;
        builder.uint(PROPERTY::FLAGS, property.flags.as_int());
        builder.string(PROPERTY::NAME, &property.name);
        builder.uint(PROPERTY::GETTER_FLAGS, property.getter_flags.as_int());
        builder.uint(PROPERTY::SETTER_FLAGS, property.setter_flags.as_int());

        self.write_type_parameters(
            &mut builder,
            PROPERTY::TYPE_PARAMETER,
            &property.type_parameters,
        )?;
        self.write_type(
            &mut builder,
            TypeSlot::PropertyReturn,
            &property.return_type,
            1,
        )?;
        if let Some(receiver) = &property.receiver_type {
            self.write_type(&mut builder, TypeSlot::PropertyReceiver, receiver, 1)?;
        }
        if let Some(setter) = &property.setter_parameter {
            self.write_value_parameter(&mut builder, PROPERTY::SETTER_PARAMETER, setter)?;
        }
        if let Some(requirement) = &property.version_requirement {
            write_version_requirement(&mut builder, PROPERTY::VERSION_REQUIREMENT, requirement)?;
        }

        let mut extension = builder.child(PROPERTY::EXTENSIONS, NodeKind::PropertyExtension)?;
        extension.uint(PROPERTY_EXTENSION::JVM_FLAGS, property.jvm_flags.bits());
        if let Some(signature) = &property.field_signature {
            write_field_signature(&mut extension, PROPERTY_EXTENSION::FIELD_SIGNATURE, signature)?;
        }
        let methods = [
            (PROPERTY_EXTENSION::GETTER_SIGNATURE, &property.getter_signature),
            (PROPERTY_EXTENSION::SETTER_SIGNATURE, &property.setter_signature),
            (
                PROPERTY_EXTENSION::SYNTHETIC_METHOD_FOR_ANNOTATIONS,
                &property.synthetic_method_for_annotations,
            ),
            (
                PROPERTY_EXTENSION::SYNTHETIC_METHOD_FOR_DELEGATE,
                &property.synthetic_method_for_delegate,
            ),
        ];
        for (slot, signature) in methods {
            if let Some(signature) = signature {
                write_method_signature(&mut extension, slot, signature)?;
            }
        }
        extension.close();

        builder.close();
        Ok(())
    }

    /// Writes `constructor` as a child of a class builder.
    ///
    /// The extension block is left out entirely when the constructor has no JVM
    /// signature.
    pub(crate) fn write_constructor(
        &self,
        parent: &mut MessageBuilder<'_>,
        field: u32,
        constructor: &Constructor,
    ) -> Result<()> {
        let mut builder = parent.child(field, NodeKind::Constructor)?;
        builder.uint(CONSTRUCTOR::FLAGS, constructor.flags.as_int());

        for parameter in &constructor.value_parameters {
            self.write_value_parameter(&mut builder, CONSTRUCTOR::VALUE_PARAMETER, parameter)?;
        }
        if let Some(requirement) = &constructor.version_requirement {
            write_version_requirement(
                &mut builder,
                CONSTRUCTOR::VERSION_REQUIREMENT,
                requirement,
            )?;
        }

        if let Some(signature) = &constructor.signature {
            let mut extension =
                builder.child(CONSTRUCTOR::EXTENSIONS, NodeKind::ConstructorExtension)?;
            write_method_signature(&mut extension, CONSTRUCTOR_EXTENSION::SIGNATURE, signature)?;
            extension.close();
        }

        builder.close();
        Ok(())
    }

    /// Writes `alias` as a child of `parent` at `field`.
    pub(crate) fn write_type_alias(
        &self,
        parent: &mut MessageBuilder<'_>,
        field: u32,
        alias: &TypeAlias,
    ) -> Result<()> {
        let mut builder = parent.child(field, NodeKind::TypeAlias)?;
        builder.uint(TYPE_ALIAS::FLAGS, alias.flags.as_int());
        builder.string(TYPE_ALIAS::NAME, &alias.name);

        self.write_type_parameters(
            &mut builder,
            TYPE_ALIAS::TYPE_PARAMETER,
            &alias.type_parameters,
        )?;
        self.write_type(
            &mut builder,
            TypeSlot::AliasUnderlying,
            &alias.underlying_type,
            1,
        )?;
        self.write_type(&mut builder, TypeSlot::AliasExpanded, &alias.expanded_type, 1)?;
        if let Some(requirement) = &alias.version_requirement {
            write_version_requirement(&mut builder, TYPE_ALIAS::VERSION_REQUIREMENT, requirement)?;
        }
        for annotation in &alias.annotations {
            write_annotation(&mut builder, TYPE_ALIAS::ANNOTATION, annotation, 0)?;
        }

        builder.close();
        Ok(())
    }

    /// Writes a value parameter. The type goes into the vararg element slot for
    /// vararg parameters and into the declared type slot otherwise, never both.
    fn write_value_parameter(
        &self,
        parent: &mut MessageBuilder<'_>,
        field: u32,
        parameter: &ValueParameter,
    ) -> Result<()> {
        let mut builder = parent.child(field, NodeKind::ValueParameter)?;
        builder.uint(VALUE_PARAMETER::FLAGS, parameter.flags.as_int());
        builder.string(VALUE_PARAMETER::NAME, &parameter.name);

        let slot = if parameter.flags.is_vararg {
            TypeSlot::VarargElement
        } else {
            TypeSlot::ParameterType
        };
        self.write_type(&mut builder, slot, &parameter.ty, 1)?;

        builder.close();
        Ok(())
    }
}

/// Writes a version requirement, packing the version into the compact form when it
/// fits and into the full form otherwise.
///
/// # Errors
///
/// Returns [`Error::ModelInvariant`] if the version does not fit the full form either.
pub(crate) fn write_version_requirement(
    parent: &mut MessageBuilder<'_>,
    field: u32,
    requirement: &VersionRequirement,
) -> Result<()> {
    let version = requirement.version;
    let (version_field, packed) = match (version.pack_compact(), version.pack_full()) {
        (Some(packed), _) => (VERSION_REQUIREMENT::VERSION, packed),
        (None, Some(packed)) => (VERSION_REQUIREMENT::VERSION_FULL, packed),
        (None, None) => {
            return Err(Error::ModelInvariant(format!(
                "Version requirement {version} does not fit the full version form"
            )))
        }
    };

    let mut builder = parent.child(field, NodeKind::VersionRequirement)?;
    builder.uint(VERSION_REQUIREMENT::KIND, requirement.kind as u32);
    builder.uint(VERSION_REQUIREMENT::LEVEL, requirement.level as u32);
    if let Some(code) = requirement.error_code {
        builder.sint(VERSION_REQUIREMENT::ERROR_CODE, i64::from(code));
    }
    if let Some(message) = &requirement.message {
        builder.string(VERSION_REQUIREMENT::MESSAGE, message);
    }
    builder.uint(version_field, packed);
    builder.close();
    Ok(())
}

fn write_method_signature(
    parent: &mut MessageBuilder<'_>,
    field: u32,
    signature: &MethodSignature,
) -> Result<()> {
    let kind = NodeKind::MethodSignature;
    write_signature(parent, field, kind, &signature.name, &signature.descriptor)
}

fn write_field_signature(
    parent: &mut MessageBuilder<'_>,
    field: u32,
    signature: &FieldSignature,
) -> Result<()> {
    let kind = NodeKind::FieldSignature;
    write_signature(parent, field, kind, &signature.name, &signature.descriptor)
}

fn write_signature(
    parent: &mut MessageBuilder<'_>,
    field: u32,
    kind: NodeKind,
    name: &str,
    descriptor: &str,
) -> Result<()> {
    let mut builder = parent.child(field, kind)?;
    builder.string(SIGNATURE::NAME, name);
    builder.string(SIGNATURE::DESCRIPTOR, descriptor);
    builder.close();
    Ok(())
}
