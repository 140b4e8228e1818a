//! Transcription of annotations carried inside the metadata.
//!
//! Annotation class names and arguments are passed through verbatim.

use crate::{
    model::annotation::{Annotation, AnnotationArgument},
    wire::{
        builder::MessageBuilder,
        reader::MAX_DECODE_DEPTH,
        schema::{NodeKind, ANNOTATION, ANNOTATION_ARGUMENT, ANNOTATION_VALUE},
    },
    Error, Result,
};

/// Writes `annotation` as a child of `parent` at `field`.
pub(crate) fn write_annotation(
    parent: &mut MessageBuilder<'_>,
    field: u32,
    annotation: &Annotation,
    depth: usize,
) -> Result<()> {
    if depth > MAX_DECODE_DEPTH {
        return Err(Error::RecursionLimit(MAX_DECODE_DEPTH));
    }

    let mut builder = parent.child(field, NodeKind::Annotation)?;
    builder.string(ANNOTATION::CLASS_NAME, &annotation.class_name);

    for argument in &annotation.arguments {
        let mut named = builder.child(ANNOTATION::ARGUMENT, NodeKind::AnnotationArgument)?;
        named.string(ANNOTATION_ARGUMENT::NAME, &argument.name);
        write_value(&mut named, ANNOTATION_ARGUMENT::VALUE, &argument.value, depth + 1)?;
        named.close();
    }

    builder.close();
    Ok(())
}

fn write_value(
    parent: &mut MessageBuilder<'_>,
    field: u32,
    value: &AnnotationArgument,
    depth: usize,
) -> Result<()> {
    if depth > MAX_DECODE_DEPTH {
        return Err(Error::RecursionLimit(MAX_DECODE_DEPTH));
    }

    let mut builder = parent.child(field, NodeKind::AnnotationValue)?;
    builder.uint(ANNOTATION_VALUE::TYPE, value.type_tag());

    if let Some(scalar) = value.integral_value() {
        builder.sint(ANNOTATION_VALUE::INT_VALUE, scalar);
    }

    match value {
        AnnotationArgument::String(text) => builder.string(ANNOTATION_VALUE::STRING_VALUE, text),
        AnnotationArgument::KClass {
            class_name,
            array_dimensions,
        } => {
            builder.string(ANNOTATION_VALUE::CLASS_NAME, class_name);
            if *array_dimensions > 0 {
                builder.uint(ANNOTATION_VALUE::ARRAY_DIMENSION_COUNT, *array_dimensions);
            }
        }
        AnnotationArgument::Enum {
            class_name,
            entry_name,
        } => {
            builder.string(ANNOTATION_VALUE::CLASS_NAME, class_name);
            builder.string(ANNOTATION_VALUE::ENUM_VALUE_NAME, entry_name);
        }
        AnnotationArgument::Annotation(nested) => {
            write_annotation(&mut builder, ANNOTATION_VALUE::ANNOTATION, nested, depth + 1)?;
        }
        AnnotationArgument::Array(elements) => {
            for element in elements {
                write_value(&mut builder, ANNOTATION_VALUE::ARRAY_ELEMENT, element, depth + 1)?;
            }
        }
        _ => {}
    }

    builder.close();
    Ok(())
}
