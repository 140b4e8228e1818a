//! Transcription of types and type parameters.
//!
//! A type can appear under many parents. Rather than one helper per parent, the
//! caller names the slot the type goes into with a [`TypeSlot`], which fixes both the
//! parent message kind and the field number. Passing a slot that does not belong to
//! the parent builder is a model invariant violation.

use std::collections::HashSet;

use crate::{
    model::{
        annotation::Annotation,
        names::to_metadata_name,
        types::{Classifier, KotlinType, TypeParameter, TypeProjection, STAR_PROJECTION},
    },
    wire::{
        builder::{BuilderEvent, MessageBuilder},
        schema::{
            NodeKind, CLASS, EFFECT_EXPRESSION, FLEXIBLE_UPPER_BOUND, FUNCTION, PROPERTY, TYPE,
            TYPE_ALIAS, TYPE_ARGUMENT, TYPE_EXTENSION, TYPE_PARAMETER, TYPE_PARAMETER_EXTENSION,
            VALUE_PARAMETER,
        },
    },
    Error, Result,
};

use super::{annotation::write_annotation, Transcriber};

/// The places a type can be written to, one per legal parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSlot {
    /// A supertype of a class
    Supertype,
    /// The receiver of an extension function
    FunctionReceiver,
    /// The return type of a function
    FunctionReturn,
    /// The receiver of an extension property
    PropertyReceiver,
    /// The type of a property
    PropertyReturn,
    /// The declared type of a value parameter
    ParameterType,
    /// The element type of a vararg value parameter
    VarargElement,
    /// An upper bound of a type parameter
    UpperBound,
    /// The right hand side of a type alias
    AliasUnderlying,
    /// The fully expanded right hand side of a type alias
    AliasExpanded,
    /// The alias a type was written as
    Abbreviation,
    /// The type of the outer class of an inner class
    OuterType,
    /// A type argument
    Argument,
    /// The upper bound of a flexible type
    FlexibleUpperBound,
    /// The type checked by an `is` effect expression
    IsInstance,
}

impl TypeSlot {
    /// Message kind of the parent holding this slot
    #[must_use]
    pub fn parent(self) -> NodeKind {
        match self {
            TypeSlot::Supertype => NodeKind::Class,
            TypeSlot::FunctionReceiver | TypeSlot::FunctionReturn => NodeKind::Function,
            TypeSlot::PropertyReceiver | TypeSlot::PropertyReturn => NodeKind::Property,
            TypeSlot::ParameterType | TypeSlot::VarargElement => NodeKind::ValueParameter,
            TypeSlot::UpperBound => NodeKind::TypeParameter,
            TypeSlot::AliasUnderlying | TypeSlot::AliasExpanded => NodeKind::TypeAlias,
            TypeSlot::Abbreviation | TypeSlot::OuterType => NodeKind::Type,
            TypeSlot::Argument => NodeKind::TypeArgument,
            TypeSlot::FlexibleUpperBound => NodeKind::FlexibleUpperBound,
            TypeSlot::IsInstance => NodeKind::EffectExpression,
        }
    }

    /// Field number of this slot inside its parent
    #[must_use]
    pub fn field(self) -> u32 {
        match self {
            TypeSlot::Supertype => CLASS::SUPERTYPE,
            TypeSlot::FunctionReceiver => FUNCTION::RECEIVER_TYPE,
            TypeSlot::FunctionReturn => FUNCTION::RETURN_TYPE,
            TypeSlot::PropertyReceiver => PROPERTY::RECEIVER_TYPE,
            TypeSlot::PropertyReturn => PROPERTY::RETURN_TYPE,
            TypeSlot::ParameterType => VALUE_PARAMETER::TYPE,
            TypeSlot::VarargElement => VALUE_PARAMETER::VARARG_ELEMENT_TYPE,
            TypeSlot::UpperBound => TYPE_PARAMETER::UPPER_BOUND,
            TypeSlot::AliasUnderlying => TYPE_ALIAS::UNDERLYING_TYPE,
            TypeSlot::AliasExpanded => TYPE_ALIAS::EXPANDED_TYPE,
            TypeSlot::Abbreviation => TYPE::ABBREVIATED_TYPE,
            TypeSlot::OuterType => TYPE::OUTER_TYPE,
            TypeSlot::Argument => TYPE_ARGUMENT::TYPE,
            TypeSlot::FlexibleUpperBound => FLEXIBLE_UPPER_BOUND::TYPE,
            TypeSlot::IsInstance => EFFECT_EXPRESSION::IS_INSTANCE_TYPE,
        }
    }
}

impl Transcriber {
    /// Writes `ty` into `slot` of `parent`.
    ///
    /// `depth` is the nesting level of `ty`, starting at 1 for a type directly below a
    /// declaration.
    pub(crate) fn write_type(
        &self,
        parent: &mut MessageBuilder<'_>,
        slot: TypeSlot,
        ty: &KotlinType,
        depth: usize,
    ) -> Result<()> {
        if parent.kind() != slot.parent() {
            return Err(Error::ModelInvariant(format!(
                "{:?} cannot be written below {:?}",
                slot,
                parent.kind()
            )));
        }
        if depth > self.max_type_depth {
            return Err(Error::RecursionLimit(self.max_type_depth));
        }

        let mut builder = parent.child(slot.field(), NodeKind::Type)?;
        builder.uint(TYPE::FLAGS, ty.flags.bits());

        match &ty.classifier {
            Classifier::Class(name) => builder.string(TYPE::CLASS_NAME, &to_metadata_name(name)),
            Classifier::TypeParameter(id) => {
                builder.uint(TYPE::TYPE_PARAMETER, *id);
                builder.note(BuilderEvent::ReferenceTypeParameter(*id));
            }
            Classifier::TypeAlias(name) => builder.string(TYPE::TYPE_ALIAS_NAME, name),
        }

        if let Some(abbreviation) = &ty.abbreviation {
            self.write_type(&mut builder, TypeSlot::Abbreviation, abbreviation, depth + 1)?;
        }
        if let Some(outer) = &ty.outer_type {
            self.write_type(&mut builder, TypeSlot::OuterType, outer, depth + 1)?;
        }

        for argument in &ty.arguments {
            let mut arg = builder.child(TYPE::ARGUMENT, NodeKind::TypeArgument)?;
            match argument {
                TypeProjection::Star => arg.uint(TYPE_ARGUMENT::PROJECTION, STAR_PROJECTION),
                TypeProjection::Projection { variance, ty } => {
                    arg.uint(TYPE_ARGUMENT::PROJECTION, *variance as u32);
                    self.write_type(&mut arg, TypeSlot::Argument, ty, depth + 1)?;
                }
            }
            arg.close();
        }

        if let Some(bound) = &ty.flexible_upper_bound {
            let mut flexible =
                builder.child(TYPE::FLEXIBLE_UPPER_BOUND, NodeKind::FlexibleUpperBound)?;
            if let Some(id) = &bound.flexibility_id {
                flexible.string(FLEXIBLE_UPPER_BOUND::FLEXIBILITY_ID, id);
            }
            self.write_type(&mut flexible, TypeSlot::FlexibleUpperBound, &bound.ty, depth + 1)?;
            flexible.close();
        }

        let mut extension = builder.child(TYPE::EXTENSIONS, NodeKind::TypeExtension)?;
        if ty.is_raw {
            extension.bool(TYPE_EXTENSION::IS_RAW, true);
        }
        for annotation in &ty.annotations {
            write_annotation(&mut extension, TYPE_EXTENSION::ANNOTATION, annotation, 0)?;
        }
        extension.close();

        builder.close();
        Ok(())
    }

    /// Writes the type parameters of one declaration scope.
    ///
    /// Every id of the scope is declared before the first parameter is written, so an
    /// upper bound may refer to a parameter later in the same list.
    pub(crate) fn write_type_parameters(
        &self,
        parent: &mut MessageBuilder<'_>,
        field: u32,
        type_parameters: &[TypeParameter],
    ) -> Result<()> {
        let mut seen = HashSet::with_capacity(type_parameters.len());
        for type_parameter in type_parameters {
            if !seen.insert(type_parameter.id) {
                return Err(Error::ModelInvariant(format!(
                    "Type parameter id {} declared twice in one scope",
                    type_parameter.id
                )));
            }
            parent.note(BuilderEvent::DeclareTypeParameter(type_parameter.id));
        }

        for type_parameter in type_parameters {
            let mut builder = parent.child(field, NodeKind::TypeParameter)?;
            builder.uint(TYPE_PARAMETER::ID, type_parameter.id);
            builder.uint(TYPE_PARAMETER::FLAGS, type_parameter.flags.bits());
            builder.string(TYPE_PARAMETER::NAME, &type_parameter.name);
            builder.uint(TYPE_PARAMETER::VARIANCE, type_parameter.variance as u32);

            for bound in &type_parameter.upper_bounds {
                self.write_type(&mut builder, TypeSlot::UpperBound, bound, 1)?;
            }

            let mut extension =
                builder.child(TYPE_PARAMETER::EXTENSIONS, NodeKind::TypeParameterExtension)?;
            write_annotations(
                &mut extension,
                TYPE_PARAMETER_EXTENSION::ANNOTATION,
                &type_parameter.annotations,
            )?;
            extension.close();

            builder.close();
        }

        Ok(())
    }
}

fn write_annotations(
    parent: &mut MessageBuilder<'_>,
    field: u32,
    annotations: &[Annotation],
) -> Result<()> {
    for annotation in annotations {
        write_annotation(parent, field, annotation, 0)?;
    }
    Ok(())
}
