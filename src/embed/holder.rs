//! The `kotlin.Metadata` holder annotation.
//!
//! A holder is a runtime visible annotation of type `Lkotlin/Metadata;` whose elements
//! are named after the fields of the wire tuple (`k`, `mv`, `bv`, `d1`, `d2`, `xi`,
//! `xs`, `pn`). Compilers leave out elements that hold the annotation default, so a
//! holder may have any subset of the eight names, but never an unknown name, a name
//! twice, or a value of the wrong shape.

use std::{collections::HashMap, str::FromStr};

use strum::IntoEnumIterator;

use crate::{
    classfile::{
        annotation::{Annotation, ElementValue, ElementValuePair, TAG_INT, TAG_STRING},
        class::{AnnotationLocation, ProgramClass},
        constant_pool::ConstantPool,
    },
    wire::header::{FieldShape, HeaderValue, MetadataField, MetadataHeader},
    Error, Result,
};

/// Type descriptor of the holder annotation
pub const METADATA_DESCRIPTOR: &str = "Lkotlin/Metadata;";

/// Positions of the known elements within a holder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolderLayout {
    slots: HashMap<MetadataField, usize>,
}

impl HolderLayout {
    /// Returns the element index holding `field`, if present
    #[must_use]
    pub fn element(&self, field: MetadataField) -> Option<usize> {
        self.slots.get(&field).copied()
    }

    /// Number of elements present
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the holder has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Checks the element names and shapes of a holder.
///
/// # Errors
///
/// Returns [`crate::Error::HolderMismatch`] if an element name is unknown, repeated,
/// unresolvable, or names a field whose value has the wrong shape.
pub fn validate_holder(annotation: &Annotation, pool: &ConstantPool) -> Result<HolderLayout> {
    let mut layout = HolderLayout::default();

    for (position, element) in annotation.elements.iter().enumerate() {
        let name = pool.utf8(element.name_index).map_err(|_| {
            Error::HolderMismatch(format!(
                "element {} has an unresolvable name (#{})",
                position, element.name_index
            ))
        })?;
        let field = MetadataField::from_str(name)
            .map_err(|_| Error::HolderMismatch(format!("unknown element '{name}'")))?;
        if !has_shape(&element.value, field.shape()) {
            return Err(Error::HolderMismatch(format!(
                "element '{name}' does not hold {:?}",
                field.shape()
            )));
        }
        if layout.slots.insert(field, position).is_some() {
            return Err(Error::HolderMismatch(format!("element '{name}' appears twice")));
        }
    }

    Ok(layout)
}

fn has_shape(value: &ElementValue, shape: FieldShape) -> bool {
    match shape {
        FieldShape::Int => value.is_int(),
        FieldShape::String => value.is_string(),
        FieldShape::IntArray => value.is_array_of(ElementValue::is_int),
        FieldShape::StringArray => value.is_array_of(ElementValue::is_string),
    }
}

/// Allocates fresh constants for `value`.
fn element_value(pool: &mut ConstantPool, value: HeaderValue<'_>) -> Result<ElementValue> {
    let int = |pool: &mut ConstantPool, v: i32| -> Result<ElementValue> {
        Ok(ElementValue::Const {
            tag: TAG_INT,
            const_value_index: pool.add_integer_constant(v)?,
        })
    };
    let string = |pool: &mut ConstantPool, v: &str| -> Result<ElementValue> {
        Ok(ElementValue::Const {
            tag: TAG_STRING,
            const_value_index: pool.add_utf8_constant(v)?,
        })
    };

    Ok(match value {
        HeaderValue::Int(v) => int(pool, v)?,
        HeaderValue::String(v) => string(pool, v)?,
        HeaderValue::IntArray(values) => ElementValue::Array(
            values
                .iter()
                .map(|v| int(pool, *v))
                .collect::<Result<_>>()?,
        ),
        HeaderValue::StringArray(values) => ElementValue::Array(
            values
                .iter()
                .map(|v| string(pool, v.as_str()))
                .collect::<Result<_>>()?,
        ),
    })
}

/// Writes `header` into `annotation`, allocating every constant fresh from `pool`.
///
/// Elements present in `layout` are replaced in place. Fields missing from the holder
/// are appended, unless the new value is the annotation default.
///
/// # Errors
///
/// Returns [`crate::Error::ConstantPoolOverflow`] if the pool runs out of indices.
/// `pool` and `annotation` are then partially updated; callers work on copies.
pub fn write_holder(
    pool: &mut ConstantPool,
    annotation: &mut Annotation,
    layout: &HolderLayout,
    header: &MetadataHeader,
) -> Result<()> {
    for field in MetadataField::iter() {
        match layout.element(field) {
            Some(position) => {
                let value = element_value(pool, header.value(field))?;
                if let Some(element) = annotation.elements.get_mut(position) {
                    element.value = value;
                }
            }
            None if !header.is_default(field) => {
                let name_index = pool.add_utf8_constant(field.name())?;
                let value = element_value(pool, header.value(field))?;
                annotation
                    .elements
                    .push(ElementValuePair { name_index, value });
            }
            None => {}
        }
    }
    Ok(())
}

/// Adds a new holder carrying `header` to a class that has none.
///
/// Only fields with non-default values are written. The class is unchanged if the
/// constant pool overflows.
///
/// # Errors
///
/// Returns [`crate::Error::HolderMismatch`] if the class already carries a holder and
/// [`crate::Error::ConstantPoolOverflow`] if the pool runs out of indices.
pub fn attach_metadata_holder(
    class: &mut ProgramClass,
    header: &MetadataHeader,
) -> Result<AnnotationLocation> {
    if class.find_annotation(METADATA_DESCRIPTOR).is_some() {
        return Err(Error::HolderMismatch(
            "class already carries a kotlin.Metadata annotation".to_string(),
        ));
    }

    let mut staged = class.clone();
    let type_index = staged.constant_pool.add_utf8_constant(METADATA_DESCRIPTOR)?;
    let mut annotation = Annotation::new(type_index);
    write_holder(
        &mut staged.constant_pool,
        &mut annotation,
        &HolderLayout::default(),
        header,
    )?;
    let location = staged.add_annotation(annotation)?;

    *class = staged;
    Ok(location)
}

/// Reads the wire tuple stored in the holder of `class`.
///
/// Elements missing from the holder take their annotation defaults. Returns `None`
/// if the class carries no holder.
///
/// # Errors
///
/// Returns [`crate::Error::HolderMismatch`] if the holder fails validation and
/// [`crate::Error::InvalidConstantIndex`] if an element refers to a missing constant.
pub fn read_metadata_holder(class: &ProgramClass) -> Result<Option<MetadataHeader>> {
    let Some(location) = class.find_annotation(METADATA_DESCRIPTOR) else {
        return Ok(None);
    };
    let Some(annotation) = class.annotation(location) else {
        return Ok(None);
    };

    read_holder(annotation, &class.constant_pool).map(Some)
}

/// Reads the wire tuple stored in `annotation`, a holder whose constants live in
/// `pool`.
///
/// # Errors
///
/// Same as [`read_metadata_holder`].
pub fn read_holder(annotation: &Annotation, pool: &ConstantPool) -> Result<MetadataHeader> {
    let layout = validate_holder(annotation, pool)?;
    let mut header = MetadataHeader::default();

    for field in MetadataField::iter() {
        let Some(element) = layout
            .element(field)
            .and_then(|position| annotation.elements.get(position))
        else {
            continue;
        };
        let value = &element.value;
        match field {
            MetadataField::Kind => header.kind = read_int(pool, value)?,
            MetadataField::MetadataVersion => header.metadata_version = read_ints(pool, value)?,
            MetadataField::BytecodeVersion => header.bytecode_version = read_ints(pool, value)?,
            MetadataField::Data1 => header.data1 = read_strings(pool, value)?,
            MetadataField::Data2 => header.data2 = read_strings(pool, value)?,
            MetadataField::ExtraInt => header.extra_int = read_int(pool, value)?,
            MetadataField::ExtraString => header.extra_string = read_string(pool, value)?,
            MetadataField::PackageName => header.package_name = read_string(pool, value)?,
        }
    }

    Ok(header)
}

fn const_index(value: &ElementValue) -> Result<u16> {
    match value {
        ElementValue::Const {
            const_value_index, ..
        } => Ok(*const_value_index),
        other => Err(Error::HolderMismatch(format!(
            "expected a constant, found tag '{}'",
            char::from(other.tag())
        ))),
    }
}

fn array(value: &ElementValue) -> Result<&[ElementValue]> {
    match value {
        ElementValue::Array(values) => Ok(values),
        other => Err(Error::HolderMismatch(format!(
            "expected an array, found tag '{}'",
            char::from(other.tag())
        ))),
    }
}

fn read_int(pool: &ConstantPool, value: &ElementValue) -> Result<i32> {
    pool.integer(const_index(value)?)
}

fn read_string(pool: &ConstantPool, value: &ElementValue) -> Result<String> {
    Ok(pool.utf8(const_index(value)?)?.to_string())
}

fn read_ints(pool: &ConstantPool, value: &ElementValue) -> Result<Vec<i32>> {
    array(value)?.iter().map(|v| read_int(pool, v)).collect()
}

fn read_strings(pool: &ConstantPool, value: &ElementValue) -> Result<Vec<String>> {
    array(value)?.iter().map(|v| read_string(pool, v)).collect()
}
