//! In-memory class files.
//!
//! [`ProgramClass`] holds the parts of a class file the metadata writer reads and
//! rewrites: the constant pool, the class references and the class attributes. The
//! attribute set is closed, so every constant pool index the class holds is known and
//! compaction can rewrite all of them.

use crate::{
    classfile::{annotation::Annotation, constant_pool::ConstantPool},
    Result,
};

/// Name of the attribute holding runtime visible annotations
pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";

/// A class attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// `RuntimeVisibleAnnotations`
    RuntimeVisibleAnnotations {
        /// Index of the attribute name
        name_index: u16,
        /// The annotations
        annotations: Vec<Annotation>,
    },
    /// `SourceFile`
    SourceFile {
        /// Index of the attribute name
        name_index: u16,
        /// Index of the source file name
        sourcefile_index: u16,
    },
}

/// Position of an annotation within the attributes of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationLocation {
    /// Index into [`ProgramClass::attributes`]
    pub attribute: usize,
    /// Index into the annotations of that attribute
    pub annotation: usize,
}

/// A class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramClass {
    /// Index of the `CONSTANT_Class` entry of this class
    pub this_class: u16,
    /// Index of the `CONSTANT_Class` entry of the superclass, `None` for
    /// `java/lang/Object`
    pub super_class: Option<u16>,
    /// Indices of the `CONSTANT_Class` entries of the implemented interfaces
    pub interfaces: Vec<u16>,
    /// The constant pool
    pub constant_pool: ConstantPool,
    /// Class attributes
    pub attributes: Vec<Attribute>,
}

impl ProgramClass {
    /// Creates a class named `name` extending `java/lang/Object`, without attributes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the pool cannot take the
    /// class constants, which does not happen for an empty pool.
    pub fn new(name: &str) -> Result<Self> {
        let mut constant_pool = ConstantPool::new();
        let this_class = constant_pool.add_class_constant(name)?;
        let super_class = constant_pool.add_class_constant("java/lang/Object")?;
        Ok(ProgramClass {
            this_class,
            super_class: Some(super_class),
            interfaces: Vec::new(),
            constant_pool,
            attributes: Vec::new(),
        })
    }

    /// Returns the internal name of this class.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConstantIndex`] if `this_class` does not name a
    /// class.
    pub fn name(&self) -> Result<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Returns the annotation at `location`, if it exists
    #[must_use]
    pub fn annotation(&self, location: AnnotationLocation) -> Option<&Annotation> {
        match self.attributes.get(location.attribute)? {
            Attribute::RuntimeVisibleAnnotations { annotations, .. } => {
                annotations.get(location.annotation)
            }
            Attribute::SourceFile { .. } => None,
        }
    }

    /// Returns the annotation at `location` mutably, if it exists
    pub fn annotation_mut(&mut self, location: AnnotationLocation) -> Option<&mut Annotation> {
        match self.attributes.get_mut(location.attribute)? {
            Attribute::RuntimeVisibleAnnotations { annotations, .. } => {
                annotations.get_mut(location.annotation)
            }
            Attribute::SourceFile { .. } => None,
        }
    }

    /// Calls `f` once for every runtime visible annotation of type `descriptor`.
    ///
    /// Annotations whose type index does not resolve are skipped.
    pub fn for_each_annotation_of_type(
        &self,
        descriptor: &str,
        mut f: impl FnMut(AnnotationLocation, &Annotation),
    ) {
        for (attribute, entry) in self.attributes.iter().enumerate() {
            let Attribute::RuntimeVisibleAnnotations { annotations, .. } = entry else {
                continue;
            };
            for (annotation, value) in annotations.iter().enumerate() {
                if value.type_descriptor(&self.constant_pool).ok() == Some(descriptor) {
                    f(
                        AnnotationLocation {
                            attribute,
                            annotation,
                        },
                        value,
                    );
                }
            }
        }
    }

    /// Returns the location of the first annotation of type `descriptor`
    #[must_use]
    pub fn find_annotation(&self, descriptor: &str) -> Option<AnnotationLocation> {
        let mut found = None;
        self.for_each_annotation_of_type(descriptor, |location, _| {
            found.get_or_insert(location);
        });
        found
    }

    /// Adds `annotation` to the runtime visible annotations, creating the attribute
    /// if the class has none.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the attribute name cannot be
    /// added to the pool.
    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<AnnotationLocation> {
        let existing = self
            .attributes
            .iter()
            .position(|a| matches!(a, Attribute::RuntimeVisibleAnnotations { .. }));

        let attribute = match existing {
            Some(index) => index,
            None => {
                let name_index = self
                    .constant_pool
                    .add_utf8_constant(RUNTIME_VISIBLE_ANNOTATIONS)?;
                self.attributes.push(Attribute::RuntimeVisibleAnnotations {
                    name_index,
                    annotations: Vec::new(),
                });
                self.attributes.len() - 1
            }
        };

        let mut location = AnnotationLocation {
            attribute,
            annotation: 0,
        };
        if let Some(Attribute::RuntimeVisibleAnnotations { annotations, .. }) =
            self.attributes.get_mut(attribute)
        {
            annotations.push(annotation);
            location.annotation = annotations.len() - 1;
        }
        Ok(location)
    }

    /// Visits every constant pool index held outside the pool, mutably
    pub(crate) fn for_each_index_mut(&mut self, f: &mut dyn FnMut(&mut u16)) {
        f(&mut self.this_class);
        if let Some(super_class) = &mut self.super_class {
            f(super_class);
        }
        for interface in &mut self.interfaces {
            f(interface);
        }
        for attribute in &mut self.attributes {
            match attribute {
                Attribute::RuntimeVisibleAnnotations {
                    name_index,
                    annotations,
                } => {
                    f(name_index);
                    for annotation in annotations {
                        annotation.for_each_index_mut(f);
                    }
                }
                Attribute::SourceFile {
                    name_index,
                    sourcefile_index,
                } => {
                    f(name_index);
                    f(sourcefile_index);
                }
            }
        }
    }
}

/// A visitor applied to a class after its metadata was rewritten.
pub trait ClassVisitor {
    /// Visits `class`
    fn visit_program_class(&self, class: &mut ProgramClass);
}

impl<F> ClassVisitor for F
where
    F: Fn(&mut ProgramClass),
{
    fn visit_program_class(&self, class: &mut ProgramClass) {
        self(class);
    }
}
