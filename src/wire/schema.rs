//! Message schema of the metadata payload.
//!
//! Every node of the model maps onto one message kind ([`NodeKind`]). The field
//! number constants below define where each value lives inside its message, and
//! [`child_kind`] states which nested message kind a parent accepts at a given field.
//! The builder consults [`child_kind`] before opening a child, so asking for a child
//! at a field that does not hold one, or of the wrong kind, is reported as a model
//! invariant violation instead of producing a payload no reader understands.
//!
//! Scalar fields are varints. Strings are varint indices into the `d2` string table.

use strum::{EnumCount, EnumIter};

/// The message kinds of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum NodeKind {
    /// Root of a class (`k = 1`)
    Class,
    /// Root of a file facade or multi-file part (`k = 2`, `k = 5`)
    Package,
    /// Root of a synthetic class (`k = 3`)
    Lambda,
    /// A function
    Function,
    /// A property
    Property,
    /// A constructor
    Constructor,
    /// A type alias
    TypeAlias,
    /// A value parameter
    ValueParameter,
    /// A type parameter
    TypeParameter,
    /// A type usage
    Type,
    /// A type argument
    TypeArgument,
    /// The upper bound of a flexible type
    FlexibleUpperBound,
    /// A version requirement
    VersionRequirement,
    /// A contract
    Contract,
    /// An effect of a contract
    Effect,
    /// An effect expression
    EffectExpression,
    /// An annotation
    Annotation,
    /// A named annotation argument
    AnnotationArgument,
    /// The value of an annotation argument
    AnnotationValue,
    /// JVM extension block of a class
    ClassExtension,
    /// JVM extension block of a package
    PackageExtension,
    /// JVM extension block of a function
    FunctionExtension,
    /// JVM extension block of a property
    PropertyExtension,
    /// JVM extension block of a constructor
    ConstructorExtension,
    /// JVM extension block of a type
    TypeExtension,
    /// JVM extension block of a type parameter
    TypeParameterExtension,
    /// A JVM method signature
    MethodSignature,
    /// A JVM field signature
    FieldSignature,
}

#[allow(non_snake_case, missing_docs)]
pub mod CLASS {
    pub const FLAGS: u32 = 1;
    pub const FQ_NAME: u32 = 2;
    pub const COMPANION_OBJECT_NAME: u32 = 3;
    pub const TYPE_PARAMETER: u32 = 4;
    pub const SUPERTYPE: u32 = 5;
    pub const NESTED_CLASS_NAME: u32 = 6;
    pub const CONSTRUCTOR: u32 = 7;
    pub const FUNCTION: u32 = 8;
    pub const PROPERTY: u32 = 9;
    pub const TYPE_ALIAS: u32 = 10;
    pub const ENUM_ENTRY: u32 = 11;
    pub const SEALED_SUBCLASS_NAME: u32 = 12;
    pub const VERSION_REQUIREMENT: u32 = 13;
    pub const EXTENSIONS: u32 = 14;
}

#[allow(non_snake_case, missing_docs)]
pub mod PACKAGE {
    pub const FUNCTION: u32 = 1;
    pub const PROPERTY: u32 = 2;
    pub const TYPE_ALIAS: u32 = 3;
    pub const EXTENSIONS: u32 = 4;
}

#[allow(non_snake_case, missing_docs)]
pub mod LAMBDA {
    pub const FUNCTION: u32 = 1;
}

#[allow(non_snake_case, missing_docs)]
pub mod FUNCTION {
    pub const FLAGS: u32 = 1;
    pub const NAME: u32 = 2;
    pub const TYPE_PARAMETER: u32 = 3;
    pub const RECEIVER_TYPE: u32 = 4;
    pub const VALUE_PARAMETER: u32 = 5;
    pub const RETURN_TYPE: u32 = 6;
    pub const VERSION_REQUIREMENT: u32 = 7;
    pub const CONTRACT: u32 = 8;
    pub const EXTENSIONS: u32 = 9;
}

#[allow(non_snake_case, missing_docs)]
pub mod PROPERTY {
    pub const FLAGS: u32 = 1;
    pub const NAME: u32 = 2;
    pub const TYPE_PARAMETER: u32 = 3;
    pub const RECEIVER_TYPE: u32 = 4;
    pub const RETURN_TYPE: u32 = 5;
    pub const SETTER_PARAMETER: u32 = 6;
    pub const GETTER_FLAGS: u32 = 7;
    pub const SETTER_FLAGS: u32 = 8;
    pub const VERSION_REQUIREMENT: u32 = 9;
    pub const EXTENSIONS: u32 = 10;
}

#[allow(non_snake_case, missing_docs)]
pub mod CONSTRUCTOR {
    pub const FLAGS: u32 = 1;
    pub const VALUE_PARAMETER: u32 = 2;
    pub const VERSION_REQUIREMENT: u32 = 3;
    pub const EXTENSIONS: u32 = 4;
}

#[allow(non_snake_case, missing_docs)]
pub mod TYPE_ALIAS {
    pub const FLAGS: u32 = 1;
    pub const NAME: u32 = 2;
    pub const TYPE_PARAMETER: u32 = 3;
    pub const UNDERLYING_TYPE: u32 = 4;
    pub const EXPANDED_TYPE: u32 = 5;
    pub const VERSION_REQUIREMENT: u32 = 6;
    pub const ANNOTATION: u32 = 7;
}

#[allow(non_snake_case, missing_docs)]
pub mod VALUE_PARAMETER {
    pub const FLAGS: u32 = 1;
    pub const NAME: u32 = 2;
    pub const TYPE: u32 = 3;
    pub const VARARG_ELEMENT_TYPE: u32 = 4;
}

#[allow(non_snake_case, missing_docs)]
pub mod TYPE_PARAMETER {
    pub const ID: u32 = 1;
    pub const FLAGS: u32 = 2;
    pub const NAME: u32 = 3;
    pub const VARIANCE: u32 = 4;
    pub const UPPER_BOUND: u32 = 5;
    pub const EXTENSIONS: u32 = 6;
}

#[allow(non_snake_case, missing_docs)]
pub mod TYPE {
    pub const FLAGS: u32 = 1;
    pub const CLASS_NAME: u32 = 2;
    pub const TYPE_PARAMETER: u32 = 3;
    pub const TYPE_ALIAS_NAME: u32 = 4;
    pub const ABBREVIATED_TYPE: u32 = 5;
    pub const OUTER_TYPE: u32 = 6;
    pub const ARGUMENT: u32 = 7;
    pub const FLEXIBLE_UPPER_BOUND: u32 = 8;
    pub const EXTENSIONS: u32 = 9;
}

#[allow(non_snake_case, missing_docs)]
pub mod TYPE_ARGUMENT {
    /// Variance, or `STAR_PROJECTION`
    pub const PROJECTION: u32 = 1;
    pub const TYPE: u32 = 2;
}

#[allow(non_snake_case, missing_docs)]
pub mod FLEXIBLE_UPPER_BOUND {
    pub const FLEXIBILITY_ID: u32 = 1;
    pub const TYPE: u32 = 2;
}

#[allow(non_snake_case, missing_docs)]
pub mod VERSION_REQUIREMENT {
    pub const KIND: u32 = 1;
    pub const LEVEL: u32 = 2;
    /// zig-zag encoded
    pub const ERROR_CODE: u32 = 3;
    pub const MESSAGE: u32 = 4;
    pub const VERSION: u32 = 5;
    pub const VERSION_FULL: u32 = 6;
}

#[allow(non_snake_case, missing_docs)]
pub mod CONTRACT {
    pub const EFFECT: u32 = 1;
}

#[allow(non_snake_case, missing_docs)]
pub mod EFFECT {
    pub const EFFECT_TYPE: u32 = 1;
    pub const INVOCATION_KIND: u32 = 2;
    pub const CONCLUSION: u32 = 3;
    pub const CONSTRUCTOR_ARGUMENT: u32 = 4;
}

#[allow(non_snake_case, missing_docs)]
pub mod EFFECT_EXPRESSION {
    pub const FLAGS: u32 = 1;
    pub const PARAMETER_INDEX: u32 = 2;
    pub const CONSTANT_VALUE: u32 = 3;
    pub const AND_ARGUMENT: u32 = 4;
    pub const OR_ARGUMENT: u32 = 5;
    pub const IS_INSTANCE_TYPE: u32 = 6;
}

#[allow(non_snake_case, missing_docs)]
pub mod ANNOTATION {
    pub const CLASS_NAME: u32 = 1;
    pub const ARGUMENT: u32 = 2;
}

#[allow(non_snake_case, missing_docs)]
pub mod ANNOTATION_ARGUMENT {
    pub const NAME: u32 = 1;
    pub const VALUE: u32 = 2;
}

#[allow(non_snake_case, missing_docs)]
pub mod ANNOTATION_VALUE {
    pub const TYPE: u32 = 1;
    /// zig-zag encoded; floating point values as their bit patterns
    pub const INT_VALUE: u32 = 2;
    pub const STRING_VALUE: u32 = 3;
    pub const CLASS_NAME: u32 = 4;
    pub const ENUM_VALUE_NAME: u32 = 5;
    pub const ANNOTATION: u32 = 6;
    pub const ARRAY_ELEMENT: u32 = 7;
    pub const ARRAY_DIMENSION_COUNT: u32 = 8;
}

#[allow(non_snake_case, missing_docs)]
pub mod CLASS_EXTENSION {
    pub const MODULE_NAME: u32 = 1;
    pub const LOCAL_DELEGATED_PROPERTY: u32 = 2;
    pub const ANONYMOUS_OBJECT_ORIGIN_NAME: u32 = 3;
}

#[allow(non_snake_case, missing_docs)]
pub mod PACKAGE_EXTENSION {
    pub const MODULE_NAME: u32 = 1;
    pub const LOCAL_DELEGATED_PROPERTY: u32 = 2;
}

#[allow(non_snake_case, missing_docs)]
pub mod FUNCTION_EXTENSION {
    pub const SIGNATURE: u32 = 1;
    pub const LAMBDA_CLASS_ORIGIN_NAME: u32 = 2;
}

#[allow(non_snake_case, missing_docs)]
pub mod PROPERTY_EXTENSION {
    pub const JVM_FLAGS: u32 = 1;
    pub const FIELD_SIGNATURE: u32 = 2;
    pub const GETTER_SIGNATURE: u32 = 3;
    pub const SETTER_SIGNATURE: u32 = 4;
    pub const SYNTHETIC_METHOD_FOR_ANNOTATIONS: u32 = 5;
    pub const SYNTHETIC_METHOD_FOR_DELEGATE: u32 = 6;
}

#[allow(non_snake_case, missing_docs)]
pub mod CONSTRUCTOR_EXTENSION {
    pub const SIGNATURE: u32 = 1;
}

#[allow(non_snake_case, missing_docs)]
pub mod TYPE_EXTENSION {
    pub const IS_RAW: u32 = 1;
    pub const ANNOTATION: u32 = 2;
}

#[allow(non_snake_case, missing_docs)]
pub mod TYPE_PARAMETER_EXTENSION {
    pub const ANNOTATION: u32 = 1;
}

#[allow(non_snake_case, missing_docs)]
pub mod SIGNATURE {
    pub const NAME: u32 = 1;
    pub const DESCRIPTOR: u32 = 2;
}

/// Returns the message kind `parent` holds at `field`, or `None` if `field` is not a
/// nested message of `parent`.
#[must_use]
pub fn child_kind(parent: NodeKind, field: u32) -> Option<NodeKind> {
    use NodeKind as K;

    let kind = match (parent, field) {
        (K::Class, CLASS::TYPE_PARAMETER) => K::TypeParameter,
        (K::Class, CLASS::SUPERTYPE) => K::Type,
        (K::Class, CLASS::CONSTRUCTOR) => K::Constructor,
        (K::Class, CLASS::FUNCTION) => K::Function,
        (K::Class, CLASS::PROPERTY) => K::Property,
        (K::Class, CLASS::TYPE_ALIAS) => K::TypeAlias,
        (K::Class, CLASS::VERSION_REQUIREMENT) => K::VersionRequirement,
        (K::Class, CLASS::EXTENSIONS) => K::ClassExtension,

        (K::Package, PACKAGE::FUNCTION) => K::Function,
        (K::Package, PACKAGE::PROPERTY) => K::Property,
        (K::Package, PACKAGE::TYPE_ALIAS) => K::TypeAlias,
        (K::Package, PACKAGE::EXTENSIONS) => K::PackageExtension,

        (K::Lambda, LAMBDA::FUNCTION) => K::Function,

        (K::Function, FUNCTION::TYPE_PARAMETER) => K::TypeParameter,
        (K::Function, FUNCTION::RECEIVER_TYPE | FUNCTION::RETURN_TYPE) => K::Type,
        (K::Function, FUNCTION::VALUE_PARAMETER) => K::ValueParameter,
        (K::Function, FUNCTION::VERSION_REQUIREMENT) => K::VersionRequirement,
        (K::Function, FUNCTION::CONTRACT) => K::Contract,
        (K::Function, FUNCTION::EXTENSIONS) => K::FunctionExtension,

        (K::Property, PROPERTY::TYPE_PARAMETER) => K::TypeParameter,
        (K::Property, PROPERTY::RECEIVER_TYPE | PROPERTY::RETURN_TYPE) => K::Type,
        (K::Property, PROPERTY::SETTER_PARAMETER) => K::ValueParameter,
        (K::Property, PROPERTY::VERSION_REQUIREMENT) => K::VersionRequirement,
        (K::Property, PROPERTY::EXTENSIONS) => K::PropertyExtension,

        (K::Constructor, CONSTRUCTOR::VALUE_PARAMETER) => K::ValueParameter,
        (K::Constructor, CONSTRUCTOR::VERSION_REQUIREMENT) => K::VersionRequirement,
        (K::Constructor, CONSTRUCTOR::EXTENSIONS) => K::ConstructorExtension,

        (K::TypeAlias, TYPE_ALIAS::TYPE_PARAMETER) => K::TypeParameter,
        (K::TypeAlias, TYPE_ALIAS::UNDERLYING_TYPE | TYPE_ALIAS::EXPANDED_TYPE) => K::Type,
        (K::TypeAlias, TYPE_ALIAS::VERSION_REQUIREMENT) => K::VersionRequirement,
        (K::TypeAlias, TYPE_ALIAS::ANNOTATION) => K::Annotation,

        (K::ValueParameter, VALUE_PARAMETER::TYPE | VALUE_PARAMETER::VARARG_ELEMENT_TYPE) => {
            K::Type
        }

        (K::TypeParameter, TYPE_PARAMETER::UPPER_BOUND) => K::Type,
        (K::TypeParameter, TYPE_PARAMETER::EXTENSIONS) => K::TypeParameterExtension,

        (K::Type, TYPE::ABBREVIATED_TYPE | TYPE::OUTER_TYPE) => K::Type,
        (K::Type, TYPE::ARGUMENT) => K::TypeArgument,
        (K::Type, TYPE::FLEXIBLE_UPPER_BOUND) => K::FlexibleUpperBound,
        (K::Type, TYPE::EXTENSIONS) => K::TypeExtension,

        (K::TypeArgument, TYPE_ARGUMENT::TYPE) => K::Type,
        (K::FlexibleUpperBound, FLEXIBLE_UPPER_BOUND::TYPE) => K::Type,

        (K::Contract, CONTRACT::EFFECT) => K::Effect,
        (K::Effect, EFFECT::CONCLUSION | EFFECT::CONSTRUCTOR_ARGUMENT) => K::EffectExpression,
        (
            K::EffectExpression,
            EFFECT_EXPRESSION::AND_ARGUMENT | EFFECT_EXPRESSION::OR_ARGUMENT,
        ) => K::EffectExpression,
        (K::EffectExpression, EFFECT_EXPRESSION::IS_INSTANCE_TYPE) => K::Type,

        (K::Annotation, ANNOTATION::ARGUMENT) => K::AnnotationArgument,
        (K::AnnotationArgument, ANNOTATION_ARGUMENT::VALUE) => K::AnnotationValue,
        (K::AnnotationValue, ANNOTATION_VALUE::ANNOTATION) => K::Annotation,
        (K::AnnotationValue, ANNOTATION_VALUE::ARRAY_ELEMENT) => K::AnnotationValue,

        (K::ClassExtension, CLASS_EXTENSION::LOCAL_DELEGATED_PROPERTY) => K::Property,
        (K::PackageExtension, PACKAGE_EXTENSION::LOCAL_DELEGATED_PROPERTY) => K::Property,
        (K::FunctionExtension, FUNCTION_EXTENSION::SIGNATURE) => K::MethodSignature,
        (K::PropertyExtension, PROPERTY_EXTENSION::FIELD_SIGNATURE) => K::FieldSignature,
        (
            K::PropertyExtension,
            PROPERTY_EXTENSION::GETTER_SIGNATURE
            | PROPERTY_EXTENSION::SETTER_SIGNATURE
            | PROPERTY_EXTENSION::SYNTHETIC_METHOD_FOR_ANNOTATIONS
            | PROPERTY_EXTENSION::SYNTHETIC_METHOD_FOR_DELEGATE,
        ) => K::MethodSignature,
        (K::ConstructorExtension, CONSTRUCTOR_EXTENSION::SIGNATURE) => K::MethodSignature,
        (K::TypeExtension, TYPE_EXTENSION::ANNOTATION) => K::Annotation,
        (K::TypeParameterExtension, TYPE_PARAMETER_EXTENSION::ANNOTATION) => K::Annotation,

        _ => return None,
    };

    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn scalar_fields_are_not_messages() {
        assert_eq!(child_kind(NodeKind::Class, CLASS::FLAGS), None);
        assert_eq!(child_kind(NodeKind::Type, TYPE::CLASS_NAME), None);
        assert_eq!(child_kind(NodeKind::Function, FUNCTION::NAME), None);
    }

    #[test]
    fn every_kind_except_roots_has_a_parent() {
        let roots = [NodeKind::Class, NodeKind::Package, NodeKind::Lambda];
        for kind in NodeKind::iter().filter(|k| !roots.contains(k)) {
            let reachable = NodeKind::iter()
                .any(|parent| (1..=16).any(|field| child_kind(parent, field) == Some(kind)));
            assert!(reachable, "{kind:?} cannot be nested anywhere");
        }
    }

    #[test]
    fn types_nest_under_every_type_slot() {
        assert_eq!(
            child_kind(NodeKind::ValueParameter, VALUE_PARAMETER::VARARG_ELEMENT_TYPE),
            Some(NodeKind::Type)
        );
        assert_eq!(
            child_kind(NodeKind::EffectExpression, EFFECT_EXPRESSION::IS_INSTANCE_TYPE),
            Some(NodeKind::Type)
        );
    }
}
