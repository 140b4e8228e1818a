//! Property tests: round-trip idempotence over random node models and the name
//! substitution.

use proptest::prelude::*;

use kmetadata::{
    model::{
        flags::EffectExpressionFlags,
        names::{to_container_name, to_metadata_name},
        Annotation, AnnotationArgument, ConstantValue, Contract, Effect, EffectExpression,
        EffectType, FieldSignature, FlexibleUpperBound, InvocationKind, MethodSignature,
        TypeAlias, TypeProjection, Version, VersionKind, VersionLevel, VersionRequirement,
    },
    prelude::*,
};

fn class_name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}(/[a-z]{1,6}){0,2}/[A-Z][a-zA-Z0-9]{0,6}(\\$[A-Z][a-zA-Z0-9]{0,6}){0,2}"
}

fn simple_name() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9_]{0,8}"
}

fn visibility() -> impl Strategy<Value = Visibility> {
    prop_oneof![
        Just(Visibility::Public),
        Just(Visibility::Internal),
        Just(Visibility::Private),
        Just(Visibility::Protected),
    ]
}

fn modality() -> impl Strategy<Value = Modality> {
    prop_oneof![
        Just(Modality::Final),
        Just(Modality::Open),
        Just(Modality::Abstract),
    ]
}

fn variance() -> impl Strategy<Value = Variance> {
    prop_oneof![
        Just(Variance::Invariant),
        Just(Variance::In),
        Just(Variance::Out),
    ]
}

fn method_signature() -> impl Strategy<Value = MethodSignature> {
    (simple_name(), "\\([IJZ]{0,3}\\)[IV]")
        .prop_map(|(name, descriptor)| MethodSignature::new(name, descriptor))
}

fn field_signature() -> impl Strategy<Value = FieldSignature> {
    (simple_name(), "[IJZ]").prop_map(|(name, descriptor)| FieldSignature::new(name, descriptor))
}

// ============================================================================
// Version requirements
// ============================================================================

fn version() -> impl Strategy<Value = Version> {
    prop_oneof![
        // compact form
        (0u32..8, 0u32..16, 0u32..128).prop_map(|(major, minor, patch)| Version::new(
            major, minor, patch
        )),
        // full form
        (0u32..256, 0u32..256, 0u32..65536).prop_map(|(major, minor, patch)| Version::new(
            major, minor, patch
        )),
    ]
}

fn version_requirement() -> impl Strategy<Value = VersionRequirement> {
    (
        0u8..3,
        0u8..3,
        prop::option::of(any::<i32>()),
        prop::option::of("[ -~]{0,12}"),
        version(),
    )
        .prop_map(|(kind, level, error_code, message, version)| VersionRequirement {
            kind: VersionKind::from_repr(kind).unwrap_or_default(),
            level: VersionLevel::from_repr(level).unwrap_or_default(),
            error_code,
            message,
            version,
        })
}

// ============================================================================
// Annotations
// ============================================================================

fn numeric_argument() -> impl Strategy<Value = AnnotationArgument> {
    prop_oneof![
        any::<i8>().prop_map(AnnotationArgument::Byte),
        any::<u16>().prop_map(AnnotationArgument::Char),
        any::<i16>().prop_map(AnnotationArgument::Short),
        any::<i32>().prop_map(AnnotationArgument::Int),
        any::<i64>().prop_map(AnnotationArgument::Long),
        (-1.0e6f32..1.0e6f32).prop_map(AnnotationArgument::Float),
        (-1.0e12f64..1.0e12f64).prop_map(AnnotationArgument::Double),
        any::<bool>().prop_map(AnnotationArgument::Boolean),
    ]
}

fn other_argument() -> impl Strategy<Value = AnnotationArgument> {
    prop_oneof![
        any::<u8>().prop_map(AnnotationArgument::UByte),
        any::<u16>().prop_map(AnnotationArgument::UShort),
        any::<u32>().prop_map(AnnotationArgument::UInt),
        any::<u64>().prop_map(AnnotationArgument::ULong),
        "[ -~]{0,12}".prop_map(AnnotationArgument::String),
        (class_name(), 0u32..3).prop_map(|(class_name, array_dimensions)| {
            AnnotationArgument::KClass {
                class_name,
                array_dimensions,
            }
        }),
        (class_name(), "[A-Z][A-Z_]{0,6}").prop_map(|(class_name, entry_name)| {
            AnnotationArgument::Enum {
                class_name,
                entry_name,
            }
        }),
    ]
}

fn with_arguments(class_name: String, arguments: Vec<(String, AnnotationArgument)>) -> Annotation {
    arguments
        .into_iter()
        .fold(Annotation::new(class_name), |annotation, (name, value)| {
            annotation.with_argument(name, value)
        })
}

fn annotation() -> impl Strategy<Value = Annotation> {
    let argument = prop_oneof![numeric_argument(), other_argument()].prop_recursive(
        2,
        8,
        3,
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(AnnotationArgument::Array),
                (
                    class_name(),
                    prop::collection::vec((simple_name(), inner), 0..2)
                )
                    .prop_map(|(name, arguments)| {
                        AnnotationArgument::Annotation(with_arguments(name, arguments))
                    }),
            ]
        },
    );
    (
        class_name(),
        prop::collection::vec((simple_name(), argument), 0..3),
    )
        .prop_map(|(name, arguments)| with_arguments(name, arguments))
}

fn annotations() -> impl Strategy<Value = Vec<Annotation>> {
    prop::collection::vec(annotation(), 0..2)
}

// ============================================================================
// Types
// ============================================================================

fn leaf_type() -> impl Strategy<Value = KotlinType> {
    prop_oneof![
        class_name().prop_map(KotlinType::class),
        (0u32..4).prop_map(KotlinType::type_parameter),
        simple_name().prop_map(KotlinType::type_alias),
    ]
}

fn projection(ty: BoxedStrategy<KotlinType>) -> impl Strategy<Value = TypeProjection> {
    prop_oneof![
        1 => Just(TypeProjection::Star),
        3 => (variance(), ty).prop_map(|(variance, ty)| TypeProjection::Projection { variance, ty }),
    ]
}

fn kotlin_type() -> impl Strategy<Value = KotlinType> {
    leaf_type().prop_recursive(3, 16, 3, |inner| {
        (
            leaf_type(),
            prop::collection::vec(projection(inner.clone()), 0..3),
            prop::option::of(inner.clone()),
            prop::option::of(inner.clone()),
            prop::option::of((prop::option::of(simple_name()), inner)),
            any::<bool>(),
            any::<bool>(),
            annotations(),
        )
            .prop_map(
                |(base, arguments, outer, abbreviation, flexible, nullable, is_raw, annotations)| {
                    let mut ty = base;
                    ty.arguments = arguments;
                    ty.outer_type = outer.map(Box::new);
                    ty.abbreviation = abbreviation.map(Box::new);
                    ty.flexible_upper_bound = flexible.map(|(flexibility_id, ty)| {
                        Box::new(FlexibleUpperBound { flexibility_id, ty })
                    });
                    ty.is_raw = is_raw;
                    ty.annotations = annotations;
                    if nullable {
                        ty = ty.nullable();
                    }
                    ty
                },
            )
    })
}

fn type_parameters(first_id: u32) -> impl Strategy<Value = Vec<TypeParameter>> {
    prop::collection::vec(
        (
            simple_name(),
            variance(),
            prop::collection::vec(kotlin_type(), 0..2),
            annotations(),
        ),
        0..3,
    )
    .prop_map(move |entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(offset, (name, variance, upper_bounds, annotations))| {
                let mut parameter = TypeParameter::new(first_id + offset as u32, name);
                parameter.variance = variance;
                parameter.upper_bounds = upper_bounds;
                parameter.annotations = annotations;
                parameter
            })
            .collect()
    })
}

// ============================================================================
// Contracts
// ============================================================================

fn effect_expression() -> impl Strategy<Value = EffectExpression> {
    let leaf = (
        prop::option::of(0u32..4),
        prop::option::of(0u8..3),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(parameter_index, constant, negated, null_check)| {
            let mut flags = EffectExpressionFlags::empty();
            flags.set(EffectExpressionFlags::NEGATED, negated);
            flags.set(EffectExpressionFlags::NULL_CHECK_PREDICATE, null_check);
            EffectExpression {
                flags,
                parameter_index,
                constant_value: constant.and_then(ConstantValue::from_repr),
                ..EffectExpression::default()
            }
        });

    leaf.prop_recursive(3, 12, 2, |inner| {
        (
            inner.clone(),
            prop::collection::vec(inner.clone(), 0..2),
            prop::collection::vec(inner, 0..2),
            prop::option::of(leaf_type()),
        )
            .prop_map(|(mut expression, and_arguments, or_arguments, is_instance_type)| {
                expression.and_arguments = and_arguments;
                expression.or_arguments = or_arguments;
                expression.is_instance_type = is_instance_type;
                expression
            })
    })
}

fn contract() -> impl Strategy<Value = Contract> {
    let effect = (
        0u8..3,
        prop::option::of(0u8..3),
        prop::option::of(effect_expression()),
        prop::collection::vec(effect_expression(), 0..2),
    )
        .prop_map(
            |(effect_type, invocation_kind, conclusion, constructor_arguments)| Effect {
                effect_type: EffectType::from_repr(effect_type).unwrap_or_default(),
                invocation_kind: invocation_kind.and_then(InvocationKind::from_repr),
                constructor_arguments,
                conclusion,
            },
        );
    prop::collection::vec(effect, 0..3).prop_map(|effects| Contract { effects })
}

// ============================================================================
// Declarations
// ============================================================================

fn value_parameter() -> impl Strategy<Value = ValueParameter> {
    (simple_name(), kotlin_type(), any::<bool>()).prop_map(|(name, ty, vararg)| {
        if vararg {
            ValueParameter::vararg(name, ty)
        } else {
            ValueParameter::new(name, ty)
        }
    })
}

fn function() -> impl Strategy<Value = Function> {
    (
        (
            simple_name(),
            kotlin_type(),
            prop::option::of(kotlin_type()),
            prop::collection::vec(value_parameter(), 0..3),
            type_parameters(10),
        ),
        (
            visibility(),
            modality(),
            prop::option::of(version_requirement()),
            prop::option::of(contract()),
            prop::option::of(method_signature()),
            prop::option::of(class_name()),
        ),
    )
        .prop_map(
            |(
                (name, return_type, receiver, parameters, type_parameters),
                (visibility, modality, requirement, contract, signature, origin),
            )| {
                let mut function = Function::new(name, return_type);
                function.receiver_type = receiver;
                function.value_parameters = parameters;
                function.type_parameters = type_parameters;
                function.flags.visibility = visibility;
                function.flags.modality = modality;
                function.version_requirement = requirement;
                function.contract = contract;
                function.signature = signature;
                function.lambda_class_origin_name = origin;
                function
            },
        )
}

fn property() -> impl Strategy<Value = Property> {
    (
        (
            simple_name(),
            kotlin_type(),
            prop::option::of(kotlin_type()),
            prop::option::of(value_parameter()),
            type_parameters(20),
        ),
        (
            visibility(),
            prop::option::of(version_requirement()),
            prop::option::of(field_signature()),
            prop::option::of(method_signature()),
            prop::option::of(method_signature()),
        ),
    )
        .prop_map(
            |(
                (name, ty, receiver, setter, type_parameters),
                (visibility, requirement, field, getter, setter_signature),
            )| {
                let mut property = Property::new(name, ty);
                property.receiver_type = receiver;
                property.setter_parameter = setter;
                property.type_parameters = type_parameters;
                property.flags.visibility = visibility;
                property.version_requirement = requirement;
                property.field_signature = field;
                property.getter_signature = getter;
                property.setter_signature = setter_signature;
                property
            },
        )
}

fn constructor() -> impl Strategy<Value = Constructor> {
    (
        prop::collection::vec(value_parameter(), 0..3),
        visibility(),
        prop::option::of(version_requirement()),
        prop::option::of(method_signature()),
    )
        .prop_map(|(value_parameters, visibility, requirement, signature)| {
            let mut constructor = Constructor::new();
            constructor.value_parameters = value_parameters;
            constructor.flags.visibility = visibility;
            constructor.version_requirement = requirement;
            constructor.signature = signature;
            constructor
        })
}

fn type_alias() -> impl Strategy<Value = TypeAlias> {
    (
        simple_name(),
        type_parameters(30),
        kotlin_type(),
        kotlin_type(),
        annotations(),
        prop::option::of(version_requirement()),
        visibility(),
    )
        .prop_map(
            |(name, type_parameters, underlying, expanded, annotations, requirement, visibility)| {
                let mut alias = TypeAlias::new(name, underlying);
                alias.expanded_type = expanded;
                alias.type_parameters = type_parameters;
                alias.annotations = annotations;
                alias.version_requirement = requirement;
                alias.flags.visibility = visibility;
                alias
            },
        )
}

fn declarations() -> impl Strategy<Value = DeclarationContainer> {
    (
        prop::collection::vec(function(), 0..3),
        prop::collection::vec(property(), 0..3),
        prop::collection::vec(type_alias(), 0..2),
        prop::collection::vec(property(), 0..2),
    )
        .prop_map(
            |(functions, properties, type_aliases, local_delegated_properties)| {
                DeclarationContainer {
                    functions,
                    properties,
                    type_aliases,
                    local_delegated_properties,
                }
            },
        )
}

fn package() -> impl Strategy<Value = Package> {
    (declarations(), prop::option::of(simple_name())).prop_map(|(declarations, module_name)| {
        Package {
            declarations,
            module_name,
        }
    })
}

// ============================================================================
// Containers
// ============================================================================

fn class() -> impl Strategy<Value = KotlinMetadata> {
    (
        (
            class_name(),
            type_parameters(0),
            prop::collection::vec(kotlin_type(), 0..3),
            prop::collection::vec(constructor(), 0..2),
            declarations(),
        ),
        (
            prop::collection::vec(class_name(), 0..3),
            prop::collection::vec(class_name(), 0..3),
            prop::collection::vec("[A-Z][A-Z_]{0,6}", 0..3),
            prop::option::of(simple_name()),
            prop::option::of(version_requirement()),
            prop::option::of(simple_name()),
            prop::option::of(class_name()),
        ),
    )
        .prop_map(
            |(
                (name, type_parameters, supertypes, constructors, declarations),
                (nested, sealed, enum_entries, companion, requirement, module, origin),
            )| {
                let mut class = Class::new(name);
                class.type_parameters = type_parameters;
                class.supertypes = supertypes;
                class.constructors = constructors;
                class.declarations = declarations;
                class.nested_class_names = nested;
                class.sealed_subclass_names = sealed;
                class.enum_entry_names = enum_entries;
                class.companion_object_name = companion;
                class.version_requirement = requirement;
                class.module_name = module;
                class.anonymous_object_origin_name = origin;
                KotlinMetadata::class(class)
            },
        )
}

fn file_facade() -> impl Strategy<Value = KotlinMetadata> {
    (package(), "([a-z]{1,6}(\\.[a-z]{1,6}){0,2})?").prop_map(|(package, package_name)| {
        let mut metadata = KotlinMetadata::file_facade(package);
        metadata.package_name = package_name;
        metadata
    })
}

fn lambda() -> impl Strategy<Value = KotlinMetadata> {
    prop::collection::vec(function(), 0..2).prop_map(|functions| {
        KotlinMetadata::new(Declaration::SyntheticClass(SyntheticClass { functions }))
    })
}

fn multi_file_facade() -> impl Strategy<Value = KotlinMetadata> {
    prop::collection::vec(class_name(), 0..4).prop_map(|part_class_names| {
        KotlinMetadata::new(Declaration::MultiFileFacade(MultiFileFacade {
            part_class_names,
        }))
    })
}

fn multi_file_part() -> impl Strategy<Value = KotlinMetadata> {
    (class_name(), package()).prop_map(|(facade_class_name, package)| {
        KotlinMetadata::new(Declaration::MultiFilePart(MultiFilePart {
            facade_class_name,
            package,
        }))
    })
}

fn any_container() -> impl Strategy<Value = KotlinMetadata> {
    prop_oneof![
        class(),
        file_facade(),
        lambda(),
        multi_file_facade(),
        multi_file_part(),
    ]
}

proptest! {
    #[test]
    fn decode_inverts_write(metadata in any_container()) {
        let output = MetadataWriter::default().write(&metadata).unwrap();
        let decoded = decode(&output.header).unwrap();

        let mut expected = metadata.clone();
        expected.map_class_names(&ToMetadataName);
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn writing_is_deterministic(metadata in any_container()) {
        let writer = MetadataWriter::default();
        prop_assert_eq!(writer.write(&metadata).unwrap(), writer.write(&metadata).unwrap());
    }

    #[test]
    fn version_requirements_survive_packing(requirement in version_requirement()) {
        let mut package = Package::default();
        let mut function = Function::new("f", KotlinType::class("kotlin/Unit"));
        function.version_requirement = Some(requirement);
        package.declarations.functions.push(function);
        let metadata = KotlinMetadata::file_facade(package);

        let output = MetadataWriter::default().write(&metadata).unwrap();
        prop_assert_eq!(decode(&output.header).unwrap(), metadata);
    }

    #[test]
    fn name_substitution_is_invertible(name in "[a-z]{1,5}(/[a-z]{1,5}){0,3}/[A-Z][a-z]{0,5}(\\$[A-Z][a-z0-9]{0,5}){0,3}") {
        let metadata_name = to_metadata_name(&name);
        prop_assert!(!metadata_name.contains('$'));
        prop_assert_eq!(to_container_name(&metadata_name), name);
    }

    #[test]
    fn arbitrary_headers_never_panic(
        kind in 0i32..7,
        minor in 0i32..12,
        data1 in prop::collection::vec("\\PC{0,16}", 0..3),
        data2 in prop::collection::vec("[a-z]{0,8}", 0..4),
    ) {
        let header = MetadataHeader {
            kind,
            metadata_version: vec![1, minor, 0],
            data1,
            data2,
            ..MetadataHeader::default()
        };
        let _ = decode(&header);
    }
}
