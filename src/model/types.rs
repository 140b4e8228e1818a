//! Types and type parameters.
//!
//! A [`KotlinType`] is a recursive node: it refers to exactly one classifier, carries
//! type arguments which are types again, and may point at an abbreviation, an outer
//! type and a flexible upper bound. Type parameters are declared per scope with a
//! stable integer id that types refer back to through [`Classifier::TypeParameter`].

use strum::{EnumIter, FromRepr};

use crate::model::{
    annotation::Annotation,
    flags::{TypeFlags, TypeParameterFlags},
    names::NameFunction,
};

/// The declaration a type refers to.
///
/// The three reference kinds are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classifier {
    /// A class, by name
    Class(String),
    /// A type parameter, by id
    TypeParameter(u32),
    /// A type alias, by name
    TypeAlias(String),
}

/// Declaration site or use site variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, FromRepr)]
#[repr(u8)]
pub enum Variance {
    /// Contravariant (`in`)
    In = 0,
    /// Covariant (`out`)
    Out = 1,
    /// No variance
    #[default]
    Invariant = 2,
}

/// Wire value of a star projection in a type argument's variance slot
pub const STAR_PROJECTION: u32 = 3;

/// A type argument.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeProjection {
    /// `*`, no constraint on the argument
    Star,
    /// A regular argument with its use site variance
    Projection {
        /// Use site variance
        variance: Variance,
        /// The argument type
        ty: KotlinType,
    },
}

/// Upper bound of a flexible (platform) type.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexibleUpperBound {
    /// Identifier of the flexibility kind, if any
    pub flexibility_id: Option<String>,
    /// The upper bound type
    pub ty: KotlinType,
}

/// A usage of a type.
#[derive(Debug, Clone, PartialEq)]
pub struct KotlinType {
    /// Type flags
    pub flags: TypeFlags,
    /// The referenced declaration
    pub classifier: Classifier,
    /// Type arguments, in declaration order
    pub arguments: Vec<TypeProjection>,
    /// The alias this type was written as, if any
    pub abbreviation: Option<Box<KotlinType>>,
    /// Type of the outer class, for inner classes
    pub outer_type: Option<Box<KotlinType>>,
    /// Upper bound, if this is the lower bound of a flexible type
    pub flexible_upper_bound: Option<Box<FlexibleUpperBound>>,
    /// Raw Java type
    pub is_raw: bool,
    /// Annotations on the type usage
    pub annotations: Vec<Annotation>,
}

impl KotlinType {
    /// Creates a type without arguments referring to the given classifier
    #[must_use]
    pub fn new(classifier: Classifier) -> Self {
        KotlinType {
            flags: TypeFlags::empty(),
            classifier,
            arguments: Vec::new(),
            abbreviation: None,
            outer_type: None,
            flexible_upper_bound: None,
            is_raw: false,
            annotations: Vec::new(),
        }
    }

    /// Creates a reference to a class
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(Classifier::Class(name.into()))
    }

    /// Creates a reference to a type parameter
    #[must_use]
    pub fn type_parameter(id: u32) -> Self {
        Self::new(Classifier::TypeParameter(id))
    }

    /// Creates a reference to a type alias
    pub fn type_alias(name: impl Into<String>) -> Self {
        Self::new(Classifier::TypeAlias(name.into()))
    }

    /// Marks the type as nullable
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.flags |= TypeFlags::NULLABLE;
        self
    }

    /// Appends an invariant type argument
    #[must_use]
    pub fn with_argument(mut self, ty: KotlinType) -> Self {
        self.arguments.push(TypeProjection::Projection {
            variance: Variance::Invariant,
            ty,
        });
        self
    }

    /// Number of nested type levels below and including this one
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        for argument in &self.arguments {
            if let TypeProjection::Projection { ty, .. } = argument {
                deepest = deepest.max(ty.depth());
            }
        }
        for nested in [&self.abbreviation, &self.outer_type].into_iter().flatten() {
            deepest = deepest.max(nested.depth());
        }
        if let Some(bound) = &self.flexible_upper_bound {
            deepest = deepest.max(bound.ty.depth());
        }
        deepest + 1
    }

    /// Applies `f` to every class reference in this type, recursively
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        if let Classifier::Class(name) = &mut self.classifier {
            *name = f.transform(name);
        }
        for argument in &mut self.arguments {
            if let TypeProjection::Projection { ty, .. } = argument {
                ty.map_class_names(f);
            }
        }
        if let Some(abbreviation) = &mut self.abbreviation {
            abbreviation.map_class_names(f);
        }
        if let Some(outer) = &mut self.outer_type {
            outer.map_class_names(f);
        }
        if let Some(bound) = &mut self.flexible_upper_bound {
            bound.ty.map_class_names(f);
        }
    }
}

/// A type parameter declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    /// Id referenced by [`Classifier::TypeParameter`], unique within its scope chain
    pub id: u32,
    /// Name of the parameter
    pub name: String,
    /// Type parameter flags
    pub flags: TypeParameterFlags,
    /// Declaration site variance
    pub variance: Variance,
    /// Upper bounds, in declaration order
    pub upper_bounds: Vec<KotlinType>,
    /// Annotations on the type parameter
    pub annotations: Vec<Annotation>,
}

impl TypeParameter {
    /// Creates an invariant type parameter without bounds
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        TypeParameter {
            id,
            name: name.into(),
            flags: TypeParameterFlags::empty(),
            variance: Variance::Invariant,
            upper_bounds: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Applies `f` to every class reference in the bounds
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        for bound in &mut self.upper_bounds {
            bound.map_class_names(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::names::ToMetadataName;

    #[test]
    fn depth_counts_the_deepest_branch() {
        let leaf = KotlinType::class("kotlin/Int");
        assert_eq!(leaf.depth(), 1);

        let list = KotlinType::class("kotlin/collections/List").with_argument(leaf.clone());
        let map = KotlinType::class("kotlin/collections/Map")
            .with_argument(leaf)
            .with_argument(list);
        assert_eq!(map.depth(), 3);
    }

    #[test]
    fn class_names_are_mapped_recursively() {
        let mut ty = KotlinType::class("a/Outer$Inner").with_argument(KotlinType::class("b/X$Y"));
        ty.outer_type = Some(Box::new(KotlinType::class("a/Outer")));
        ty.map_class_names(&ToMetadataName);

        assert_eq!(ty.classifier, Classifier::Class("a/Outer.Inner".into()));
        match &ty.arguments[0] {
            TypeProjection::Projection { ty, .. } => {
                assert_eq!(ty.classifier, Classifier::Class("b/X.Y".into()))
            }
            TypeProjection::Star => panic!("expected a projection"),
        }
    }

    #[test]
    fn aliases_are_not_mapped() {
        let mut ty = KotlinType::type_alias("a/Alias$Name");
        ty.map_class_names(&ToMetadataName);
        assert_eq!(ty.classifier, Classifier::TypeAlias("a/Alias$Name".into()));
    }
}
