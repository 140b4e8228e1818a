//! Decoder for the wire tuple.
//!
//! [`decode`] turns a [`MetadataHeader`] back into the node model. It is the inverse
//! of the writer and backs the round-trip guard: every freshly written header is
//! decoded before anything in the class file is touched.
//!
//! The decoder is strict about structure (truncated fields, dangling string indices,
//! missing required fields, conflicting classifiers) and lenient about content it
//! does not know: unknown fields are skipped, and unknown flag bits are ignored.
//!
//! Names come back in metadata form (`Outer.Inner`); the inverse of the writer's name
//! substitution is left to the caller, see [`crate::model::names`].

use crate::{
    model::{
        annotation::{Annotation, AnnotationArgument, AnnotationNamedArgument, ARGUMENT_TYPE},
        container::{
            Class, Declaration, HeaderFlags, KotlinMetadata, MetadataKind, MultiFileFacade,
            MultiFilePart, Package, SyntheticClass,
        },
        contract::{ConstantValue, Contract, Effect, EffectExpression, EffectType, InvocationKind},
        declarations::{Constructor, Function, Property, TypeAlias, ValueParameter},
        flags::{
            AccessorFlags, ClassFlags, ConstructorFlags, EffectExpressionFlags, FunctionFlags,
            PropertyFlags, PropertyJvmFlags, TypeAliasFlags, TypeFlags, TypeParameterFlags,
            ValueParameterFlags,
        },
        signatures::{FieldSignature, MethodSignature},
        types::{
            Classifier, FlexibleUpperBound, KotlinType, TypeParameter, TypeProjection, Variance,
            STAR_PROJECTION,
        },
        version::{MetadataVersion, Version, VersionKind, VersionLevel, VersionRequirement},
    },
    wire::{
        bitencoding::decode_bytes,
        header::MetadataHeader,
        parser::{Field, Parser},
        proto::zigzag_decode,
        schema::{
            ANNOTATION, ANNOTATION_ARGUMENT, ANNOTATION_VALUE, CLASS, CLASS_EXTENSION,
            CONSTRUCTOR, CONSTRUCTOR_EXTENSION, CONTRACT, EFFECT, EFFECT_EXPRESSION,
            FLEXIBLE_UPPER_BOUND, FUNCTION, FUNCTION_EXTENSION, LAMBDA, PACKAGE,
            PACKAGE_EXTENSION, PROPERTY, PROPERTY_EXTENSION, SIGNATURE, TYPE, TYPE_ALIAS,
            TYPE_ARGUMENT, TYPE_EXTENSION, TYPE_PARAMETER, TYPE_PARAMETER_EXTENSION,
            VALUE_PARAMETER, VERSION_REQUIREMENT,
        },
        strings::Strings,
    },
    Error, Result,
};

/// Nesting limit for recursive messages while decoding
pub const MAX_DECODE_DEPTH: usize = 256;

/// Decodes a wire tuple into the node model.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if the tuple is
/// not valid metadata, and [`crate::Error::RecursionLimit`] if messages nest deeper than
/// [`MAX_DECODE_DEPTH`].
///
/// # Examples
///
/// ```rust
/// use kmetadata::wire::{reader::decode, MetadataHeader};
///
/// let header = MetadataHeader {
///     kind: 4,
///     metadata_version: vec![1, 9, 0],
///     data1: vec!["a/Facade__PartA".to_string()],
///     ..MetadataHeader::default()
/// };
/// let metadata = decode(&header)?;
/// assert_eq!(metadata.kind(), kmetadata::model::MetadataKind::MultiFileFacade);
/// # Ok::<(), kmetadata::Error>(())
/// ```
pub fn decode(header: &MetadataHeader) -> Result<KotlinMetadata> {
    let kind = MetadataKind::from_int(header.kind)?;
    let version = MetadataVersion::from_array(&header.metadata_version)?;
    let flags = HeaderFlags::from_bits_retain(header.extra_int);

    if !version.is_compatible(flags.contains(HeaderFlags::STRICT_SEMANTICS)) {
        return Err(malformed_error!(
            "Incompatible metadata version {} (supported: {})",
            version,
            MetadataVersion::LATEST
        ));
    }

    let decoder = Decoder {
        strings: Strings::new(&header.data2),
    };
    let declaration = match kind {
        MetadataKind::Class => {
            Declaration::Class(Box::new(decoder.class(&decode_bytes(&header.data1)?)?))
        }
        MetadataKind::FileFacade => {
            Declaration::FileFacade(decoder.package(&decode_bytes(&header.data1)?)?)
        }
        MetadataKind::SyntheticClass => {
            Declaration::SyntheticClass(decoder.lambda(&decode_bytes(&header.data1)?)?)
        }
        MetadataKind::MultiFileFacade => Declaration::MultiFileFacade(MultiFileFacade {
            part_class_names: header.data1.clone(),
        }),
        MetadataKind::MultiFilePart => Declaration::MultiFilePart(MultiFilePart {
            facade_class_name: header.extra_string.clone(),
            package: decoder.package(&decode_bytes(&header.data1)?)?,
        }),
    };

    Ok(KotlinMetadata {
        version,
        bytecode_version: header.bytecode_version.clone(),
        flags,
        package_name: header.package_name.clone(),
        declaration,
    })
}

/// Decodes the messages of one payload against its string table.
struct Decoder<'a> {
    strings: Strings<'a>,
}

/// Runs `f` for every field of the message in `data`.
fn for_each_field<'a>(data: &'a [u8], mut f: impl FnMut(Field<'a>) -> Result<()>) -> Result<()> {
    let mut parser = Parser::new(data);
    while parser.has_more_data() {
        f(parser.read_field()?)?;
    }
    Ok(())
}

fn required<T>(value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| malformed_error!("Missing {}", what))
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DECODE_DEPTH {
        return Err(Error::RecursionLimit(MAX_DECODE_DEPTH));
    }
    Ok(())
}

impl<'a> Decoder<'a> {
    fn string(&self, field: &Field<'_>) -> Result<String> {
        Ok(self.strings.get(field.varint()?)?.to_string())
    }

    fn class(&self, data: &[u8]) -> Result<Class> {
        let mut flags = 0;
        let mut name = None;
        let mut class = Class::new(String::new());

        for_each_field(data, |field| {
            match field.number {
                CLASS::FLAGS => flags = field.varint_u32()?,
                CLASS::FQ_NAME => name = Some(self.string(&field)?),
                CLASS::COMPANION_OBJECT_NAME => {
                    class.companion_object_name = Some(self.string(&field)?);
                }
                CLASS::TYPE_PARAMETER => class
                    .type_parameters
                    .push(self.type_parameter(field.bytes()?, 0)?),
                CLASS::SUPERTYPE => class.supertypes.push(self.ty(field.bytes()?, 0)?),
                CLASS::NESTED_CLASS_NAME => class.nested_class_names.push(self.string(&field)?),
                CLASS::CONSTRUCTOR => class.constructors.push(self.constructor(field.bytes()?)?),
                CLASS::FUNCTION => class
                    .declarations
                    .functions
                    .push(self.function(field.bytes()?)?),
                CLASS::PROPERTY => class
                    .declarations
                    .properties
                    .push(self.property(field.bytes()?)?),
                CLASS::TYPE_ALIAS => class
                    .declarations
                    .type_aliases
                    .push(self.type_alias(field.bytes()?)?),
                CLASS::ENUM_ENTRY => class.enum_entry_names.push(self.string(&field)?),
                CLASS::SEALED_SUBCLASS_NAME => {
                    class.sealed_subclass_names.push(self.string(&field)?);
                }
                CLASS::VERSION_REQUIREMENT => {
                    class.version_requirement = Some(self.version_requirement(field.bytes()?)?);
                }
                CLASS::EXTENSIONS => self.class_extension(field.bytes()?, &mut class)?,
                _ => {}
            }
            Ok(())
        })?;

        class.flags = ClassFlags::from_int(flags);
        class.name = required(name, "class name")?;
        Ok(class)
    }

    fn class_extension(&self, data: &[u8], class: &mut Class) -> Result<()> {
        for_each_field(data, |field| {
            match field.number {
                CLASS_EXTENSION::MODULE_NAME => class.module_name = Some(self.string(&field)?),
                CLASS_EXTENSION::LOCAL_DELEGATED_PROPERTY => class
                    .declarations
                    .local_delegated_properties
                    .push(self.property(field.bytes()?)?),
                CLASS_EXTENSION::ANONYMOUS_OBJECT_ORIGIN_NAME => {
                    class.anonymous_object_origin_name = Some(self.string(&field)?);
                }
                _ => {}
            }
            Ok(())
        })
    }

    fn package(&self, data: &[u8]) -> Result<Package> {
        let mut package = Package::default();

        for_each_field(data, |field| {
            match field.number {
                PACKAGE::FUNCTION => package
                    .declarations
                    .functions
                    .push(self.function(field.bytes()?)?),
                PACKAGE::PROPERTY => package
                    .declarations
                    .properties
                    .push(self.property(field.bytes()?)?),
                PACKAGE::TYPE_ALIAS => package
                    .declarations
                    .type_aliases
                    .push(self.type_alias(field.bytes()?)?),
                PACKAGE::EXTENSIONS => {
                    for_each_field(field.bytes()?, |ext| {
                        match ext.number {
                            PACKAGE_EXTENSION::MODULE_NAME => {
                                package.module_name = Some(self.string(&ext)?);
                            }
                            PACKAGE_EXTENSION::LOCAL_DELEGATED_PROPERTY => package
                                .declarations
                                .local_delegated_properties
                                .push(self.property(ext.bytes()?)?),
                            _ => {}
                        }
                        Ok(())
                    })?;
                }
                _ => {}
            }
            Ok(())
        })?;

        Ok(package)
    }

    fn lambda(&self, data: &[u8]) -> Result<SyntheticClass> {
        let mut synthetic = SyntheticClass::default();
        for_each_field(data, |field| {
            if field.number == LAMBDA::FUNCTION {
                synthetic.functions.push(self.function(field.bytes()?)?);
            }
            Ok(())
        })?;
        Ok(synthetic)
    }

    fn function(&self, data: &[u8]) -> Result<Function> {
        let mut flags = 0;
        let mut name = None;
        let mut return_type = None;
        let mut type_parameters = Vec::new();
        let mut receiver_type = None;
        let mut value_parameters = Vec::new();
        let mut version_requirement = None;
        let mut contract = None;
        let mut signature = None;
        let mut lambda_class_origin_name = None;

        for_each_field(data, |field| {
            match field.number {
                FUNCTION::FLAGS => flags = field.varint_u32()?,
                FUNCTION::NAME => name = Some(self.string(&field)?),
                FUNCTION::TYPE_PARAMETER => {
                    type_parameters.push(self.type_parameter(field.bytes()?, 0)?);
                }
                FUNCTION::RECEIVER_TYPE => receiver_type = Some(self.ty(field.bytes()?, 0)?),
                FUNCTION::VALUE_PARAMETER => {
                    value_parameters.push(self.value_parameter(field.bytes()?)?);
                }
                FUNCTION::RETURN_TYPE => return_type = Some(self.ty(field.bytes()?, 0)?),
                FUNCTION::VERSION_REQUIREMENT => {
                    version_requirement = Some(self.version_requirement(field.bytes()?)?);
                }
                FUNCTION::CONTRACT => contract = Some(self.contract(field.bytes()?)?),
                FUNCTION::EXTENSIONS => for_each_field(field.bytes()?, |ext| {
                    match ext.number {
                        FUNCTION_EXTENSION::SIGNATURE => {
                            signature = Some(self.method_signature(ext.bytes()?)?);
                        }
                        FUNCTION_EXTENSION::LAMBDA_CLASS_ORIGIN_NAME => {
                            lambda_class_origin_name = Some(self.string(&ext)?);
                        }
                        _ => {}
                    }
                    Ok(())
                })?,
                _ => {}
            }
            Ok(())
        })?;

        Ok(Function {
            flags: FunctionFlags::from_int(flags),
            name: required(name, "function name")?,
            type_parameters,
            receiver_type,
            value_parameters,
            return_type: required(return_type, "function return type")?,
            version_requirement,
            contract,
            signature,
            lambda_class_origin_name,
        })
    }

    fn property(&self, data: &[u8]) -> Result<Property> {
        let mut flags = 0;
        let mut getter_flags = 0;
        let mut setter_flags = 0;
        let mut name = None;
        let mut return_type = None;
        let mut property = Property::new(String::new(), KotlinType::class(String::new()));

        for_each_field(data, |field| {
            match field.number {
                PROPERTY::FLAGS => flags = field.varint_u32()?,
                PROPERTY::NAME => name = Some(self.string(&field)?),
                PROPERTY::TYPE_PARAMETER => property
                    .type_parameters
                    .push(self.type_parameter(field.bytes()?, 0)?),
                PROPERTY::RECEIVER_TYPE => {
                    property.receiver_type = Some(self.ty(field.bytes()?, 0)?);
                }
                PROPERTY::RETURN_TYPE => return_type = Some(self.ty(field.bytes()?, 0)?),
                PROPERTY::SETTER_PARAMETER => {
                    property.setter_parameter = Some(self.value_parameter(field.bytes()?)?);
                }
                PROPERTY::GETTER_FLAGS => getter_flags = field.varint_u32()?,
                PROPERTY::SETTER_FLAGS => setter_flags = field.varint_u32()?,
                PROPERTY::VERSION_REQUIREMENT => {
                    property.version_requirement =
                        Some(self.version_requirement(field.bytes()?)?);
                }
                PROPERTY::EXTENSIONS => self.property_extension(field.bytes()?, &mut property)?,
                _ => {}
            }
            Ok(())
        })?;

        property.flags = PropertyFlags::from_int(flags);
        property.getter_flags = AccessorFlags::from_int(getter_flags);
        property.setter_flags = AccessorFlags::from_int(setter_flags);
        property.name = required(name, "property name")?;
        property.return_type = required(return_type, "property type")?;
        Ok(property)
    }

    fn property_extension(&self, data: &[u8], property: &mut Property) -> Result<()> {
        for_each_field(data, |field| {
            match field.number {
                PROPERTY_EXTENSION::JVM_FLAGS => {
                    property.jvm_flags = PropertyJvmFlags::from_bits_truncate(field.varint_u32()?);
                }
                PROPERTY_EXTENSION::FIELD_SIGNATURE => {
                    property.field_signature = Some(self.field_signature(field.bytes()?)?);
                }
                PROPERTY_EXTENSION::GETTER_SIGNATURE => {
                    property.getter_signature = Some(self.method_signature(field.bytes()?)?);
                }
                PROPERTY_EXTENSION::SETTER_SIGNATURE => {
                    property.setter_signature = Some(self.method_signature(field.bytes()?)?);
                }
                PROPERTY_EXTENSION::SYNTHETIC_METHOD_FOR_ANNOTATIONS => {
                    property.synthetic_method_for_annotations =
                        Some(self.method_signature(field.bytes()?)?);
                }
                PROPERTY_EXTENSION::SYNTHETIC_METHOD_FOR_DELEGATE => {
                    property.synthetic_method_for_delegate =
                        Some(self.method_signature(field.bytes()?)?);
                }
                _ => {}
            }
            Ok(())
        })
    }

    fn constructor(&self, data: &[u8]) -> Result<Constructor> {
        let mut flags = 0;
        let mut constructor = Constructor::new();

        for_each_field(data, |field| {
            match field.number {
                CONSTRUCTOR::FLAGS => flags = field.varint_u32()?,
                CONSTRUCTOR::VALUE_PARAMETER => constructor
                    .value_parameters
                    .push(self.value_parameter(field.bytes()?)?),
                CONSTRUCTOR::VERSION_REQUIREMENT => {
                    constructor.version_requirement =
                        Some(self.version_requirement(field.bytes()?)?);
                }
                CONSTRUCTOR::EXTENSIONS => for_each_field(field.bytes()?, |ext| {
                    if ext.number == CONSTRUCTOR_EXTENSION::SIGNATURE {
                        constructor.signature = Some(self.method_signature(ext.bytes()?)?);
                    }
                    Ok(())
                })?,
                _ => {}
            }
            Ok(())
        })?;

        constructor.flags = ConstructorFlags::from_int(flags);
        Ok(constructor)
    }

    fn type_alias(&self, data: &[u8]) -> Result<TypeAlias> {
        let mut flags = 0;
        let mut name = None;
        let mut type_parameters = Vec::new();
        let mut underlying_type = None;
        let mut expanded_type = None;
        let mut annotations = Vec::new();
        let mut version_requirement = None;

        for_each_field(data, |field| {
            match field.number {
                TYPE_ALIAS::FLAGS => flags = field.varint_u32()?,
                TYPE_ALIAS::NAME => name = Some(self.string(&field)?),
                TYPE_ALIAS::TYPE_PARAMETER => {
                    type_parameters.push(self.type_parameter(field.bytes()?, 0)?);
                }
                TYPE_ALIAS::UNDERLYING_TYPE => underlying_type = Some(self.ty(field.bytes()?, 0)?),
                TYPE_ALIAS::EXPANDED_TYPE => expanded_type = Some(self.ty(field.bytes()?, 0)?),
                TYPE_ALIAS::VERSION_REQUIREMENT => {
                    version_requirement = Some(self.version_requirement(field.bytes()?)?);
                }
                TYPE_ALIAS::ANNOTATION => annotations.push(self.annotation(field.bytes()?, 0)?),
                _ => {}
            }
            Ok(())
        })?;

        Ok(TypeAlias {
            flags: TypeAliasFlags::from_int(flags),
            name: required(name, "type alias name")?,
            type_parameters,
            underlying_type: required(underlying_type, "type alias underlying type")?,
            expanded_type: required(expanded_type, "type alias expanded type")?,
            annotations,
            version_requirement,
        })
    }

    fn value_parameter(&self, data: &[u8]) -> Result<ValueParameter> {
        let mut flags = 0;
        let mut name = None;
        let mut declared = None;
        let mut vararg_element = None;

        for_each_field(data, |field| {
            match field.number {
                VALUE_PARAMETER::FLAGS => flags = field.varint_u32()?,
                VALUE_PARAMETER::NAME => name = Some(self.string(&field)?),
                VALUE_PARAMETER::TYPE => declared = Some(self.ty(field.bytes()?, 0)?),
                VALUE_PARAMETER::VARARG_ELEMENT_TYPE => {
                    vararg_element = Some(self.ty(field.bytes()?, 0)?);
                }
                _ => {}
            }
            Ok(())
        })?;

        let (ty, is_vararg) = match (declared, vararg_element) {
            (Some(ty), None) => (ty, false),
            (None, Some(ty)) => (ty, true),
            (Some(_), Some(_)) => {
                return Err(malformed_error!(
                    "Value parameter carries both a declared and a vararg element type"
                ))
            }
            (None, None) => return Err(malformed_error!("Missing value parameter type")),
        };

        Ok(ValueParameter {
            flags: ValueParameterFlags::from_int(flags, is_vararg),
            name: required(name, "value parameter name")?,
            ty,
        })
    }

    fn type_parameter(&self, data: &[u8], depth: usize) -> Result<TypeParameter> {
        let mut id = None;
        let mut flags = 0;
        let mut name = None;
        let mut variance = Variance::Invariant;
        let mut upper_bounds = Vec::new();
        let mut annotations = Vec::new();

        for_each_field(data, |field| {
            match field.number {
                TYPE_PARAMETER::ID => id = Some(field.varint_u32()?),
                TYPE_PARAMETER::FLAGS => flags = field.varint_u32()?,
                TYPE_PARAMETER::NAME => name = Some(self.string(&field)?),
                TYPE_PARAMETER::VARIANCE => variance = self.variance(&field)?,
                TYPE_PARAMETER::UPPER_BOUND => upper_bounds.push(self.ty(field.bytes()?, depth)?),
                TYPE_PARAMETER::EXTENSIONS => for_each_field(field.bytes()?, |ext| {
                    if ext.number == TYPE_PARAMETER_EXTENSION::ANNOTATION {
                        annotations.push(self.annotation(ext.bytes()?, depth)?);
                    }
                    Ok(())
                })?,
                _ => {}
            }
            Ok(())
        })?;

        Ok(TypeParameter {
            id: required(id, "type parameter id")?,
            name: required(name, "type parameter name")?,
            flags: TypeParameterFlags::from_bits_truncate(flags),
            variance,
            upper_bounds,
            annotations,
        })
    }

    fn variance(&self, field: &Field<'_>) -> Result<Variance> {
        let value = field.varint()?;
        u8::try_from(value)
            .ok()
            .and_then(Variance::from_repr)
            .ok_or_else(|| malformed_error!("Invalid variance - {}", value))
    }

    fn ty(&self, data: &[u8], depth: usize) -> Result<KotlinType> {
        check_depth(depth)?;

        let mut flags = 0;
        let mut classifiers = Vec::with_capacity(1);
        let mut arguments = Vec::new();
        let mut abbreviation = None;
        let mut outer_type = None;
        let mut flexible_upper_bound = None;
        let mut is_raw = false;
        let mut annotations = Vec::new();

        for_each_field(data, |field| {
            match field.number {
                TYPE::FLAGS => flags = field.varint_u32()?,
                TYPE::CLASS_NAME => classifiers.push(Classifier::Class(self.string(&field)?)),
                TYPE::TYPE_PARAMETER => {
                    classifiers.push(Classifier::TypeParameter(field.varint_u32()?));
                }
                TYPE::TYPE_ALIAS_NAME => {
                    classifiers.push(Classifier::TypeAlias(self.string(&field)?));
                }
                TYPE::ABBREVIATED_TYPE => {
                    abbreviation = Some(Box::new(self.ty(field.bytes()?, depth + 1)?));
                }
                TYPE::OUTER_TYPE => {
                    outer_type = Some(Box::new(self.ty(field.bytes()?, depth + 1)?));
                }
                TYPE::ARGUMENT => arguments.push(self.type_argument(field.bytes()?, depth + 1)?),
                TYPE::FLEXIBLE_UPPER_BOUND => {
                    flexible_upper_bound =
                        Some(Box::new(self.flexible_upper_bound(field.bytes()?, depth + 1)?));
                }
                TYPE::EXTENSIONS => for_each_field(field.bytes()?, |ext| {
                    match ext.number {
                        TYPE_EXTENSION::IS_RAW => is_raw = ext.varint()? != 0,
                        TYPE_EXTENSION::ANNOTATION => {
                            annotations.push(self.annotation(ext.bytes()?, depth + 1)?);
                        }
                        _ => {}
                    }
                    Ok(())
                })?,
                _ => {}
            }
            Ok(())
        })?;

        if classifiers.len() != 1 {
            return Err(malformed_error!(
                "Type must reference exactly one classifier, found {}",
                classifiers.len()
            ));
        }

        Ok(KotlinType {
            flags: TypeFlags::from_bits_truncate(flags),
            classifier: classifiers.remove(0),
            arguments,
            abbreviation,
            outer_type,
            flexible_upper_bound,
            is_raw,
            annotations,
        })
    }

    fn type_argument(&self, data: &[u8], depth: usize) -> Result<TypeProjection> {
        let mut projection = None;
        let mut ty = None;

        for_each_field(data, |field| {
            match field.number {
                TYPE_ARGUMENT::PROJECTION => projection = Some(field.varint()?),
                TYPE_ARGUMENT::TYPE => ty = Some(self.ty(field.bytes()?, depth)?),
                _ => {}
            }
            Ok(())
        })?;

        match (projection, ty) {
            (Some(value), None) if value == u64::from(STAR_PROJECTION) => Ok(TypeProjection::Star),
            (Some(value), Some(ty)) => {
                let variance = u8::try_from(value)
                    .ok()
                    .and_then(Variance::from_repr)
                    .ok_or_else(|| malformed_error!("Invalid type argument variance - {}", value))?;
                Ok(TypeProjection::Projection { variance, ty })
            }
            _ => Err(malformed_error!("Incomplete type argument")),
        }
    }

    fn flexible_upper_bound(&self, data: &[u8], depth: usize) -> Result<FlexibleUpperBound> {
        let mut flexibility_id = None;
        let mut ty = None;

        for_each_field(data, |field| {
            match field.number {
                FLEXIBLE_UPPER_BOUND::FLEXIBILITY_ID => {
                    flexibility_id = Some(self.string(&field)?);
                }
                FLEXIBLE_UPPER_BOUND::TYPE => ty = Some(self.ty(field.bytes()?, depth)?),
                _ => {}
            }
            Ok(())
        })?;

        Ok(FlexibleUpperBound {
            flexibility_id,
            ty: required(ty, "flexible upper bound type")?,
        })
    }

    fn version_requirement(&self, data: &[u8]) -> Result<VersionRequirement> {
        let mut kind = VersionKind::LanguageVersion;
        let mut level = VersionLevel::Error;
        let mut error_code = None;
        let mut message = None;
        let mut version = None;

        for_each_field(data, |field| {
            match field.number {
                VERSION_REQUIREMENT::KIND => {
                    let value = field.varint()?;
                    kind = u8::try_from(value)
                        .ok()
                        .and_then(VersionKind::from_repr)
                        .ok_or_else(|| malformed_error!("Invalid version kind - {}", value))?;
                }
                VERSION_REQUIREMENT::LEVEL => {
                    let value = field.varint()?;
                    level = u8::try_from(value)
                        .ok()
                        .and_then(VersionLevel::from_repr)
                        .ok_or_else(|| malformed_error!("Invalid version level - {}", value))?;
                }
                VERSION_REQUIREMENT::ERROR_CODE => {
                    let value = zigzag_decode(field.varint()?);
                    error_code = Some(i32::try_from(value).map_err(|_| {
                        malformed_error!("Version requirement error code out of range - {}", value)
                    })?);
                }
                VERSION_REQUIREMENT::MESSAGE => message = Some(self.string(&field)?),
                VERSION_REQUIREMENT::VERSION => {
                    version = Some(Version::unpack_compact(field.varint_u32()?));
                }
                VERSION_REQUIREMENT::VERSION_FULL => {
                    version = Some(Version::unpack_full(field.varint_u32()?));
                }
                _ => {}
            }
            Ok(())
        })?;

        Ok(VersionRequirement {
            kind,
            level,
            error_code,
            message,
            version: required(version, "required version")?,
        })
    }

    fn contract(&self, data: &[u8]) -> Result<Contract> {
        let mut contract = Contract::default();
        for_each_field(data, |field| {
            if field.number == CONTRACT::EFFECT {
                contract.effects.push(self.effect(field.bytes()?)?);
            }
            Ok(())
        })?;
        Ok(contract)
    }

    fn effect(&self, data: &[u8]) -> Result<Effect> {
        let mut effect = Effect::new(EffectType::ReturnsConstant);

        for_each_field(data, |field| {
            match field.number {
                EFFECT::EFFECT_TYPE => {
                    let value = field.varint()?;
                    effect.effect_type = u8::try_from(value)
                        .ok()
                        .and_then(EffectType::from_repr)
                        .ok_or_else(|| malformed_error!("Invalid effect type - {}", value))?;
                }
                EFFECT::INVOCATION_KIND => {
                    let value = field.varint()?;
                    effect.invocation_kind = Some(
                        u8::try_from(value)
                            .ok()
                            .and_then(InvocationKind::from_repr)
                            .ok_or_else(|| malformed_error!("Invalid invocation kind - {}", value))?,
                    );
                }
                EFFECT::CONCLUSION => {
                    effect.conclusion = Some(self.effect_expression(field.bytes()?, 0)?);
                }
                EFFECT::CONSTRUCTOR_ARGUMENT => effect
                    .constructor_arguments
                    .push(self.effect_expression(field.bytes()?, 0)?),
                _ => {}
            }
            Ok(())
        })?;

        Ok(effect)
    }

    fn effect_expression(&self, data: &[u8], depth: usize) -> Result<EffectExpression> {
        check_depth(depth)?;

        let mut expression = EffectExpression::default();
        for_each_field(data, |field| {
            match field.number {
                EFFECT_EXPRESSION::FLAGS => {
                    expression.flags = EffectExpressionFlags::from_bits_truncate(field.varint_u32()?);
                }
                EFFECT_EXPRESSION::PARAMETER_INDEX => {
                    expression.parameter_index = Some(field.varint_u32()?);
                }
                EFFECT_EXPRESSION::CONSTANT_VALUE => {
                    let value = field.varint()?;
                    expression.constant_value = Some(
                        u8::try_from(value)
                            .ok()
                            .and_then(ConstantValue::from_repr)
                            .ok_or_else(|| malformed_error!("Invalid constant value - {}", value))?,
                    );
                }
                EFFECT_EXPRESSION::AND_ARGUMENT => expression
                    .and_arguments
                    .push(self.effect_expression(field.bytes()?, depth + 1)?),
                EFFECT_EXPRESSION::OR_ARGUMENT => expression
                    .or_arguments
                    .push(self.effect_expression(field.bytes()?, depth + 1)?),
                EFFECT_EXPRESSION::IS_INSTANCE_TYPE => {
                    expression.is_instance_type = Some(self.ty(field.bytes()?, depth + 1)?);
                }
                _ => {}
            }
            Ok(())
        })?;

        Ok(expression)
    }

    fn annotation(&self, data: &[u8], depth: usize) -> Result<Annotation> {
        check_depth(depth)?;

        let mut class_name = None;
        let mut arguments = Vec::new();

        for_each_field(data, |field| {
            match field.number {
                ANNOTATION::CLASS_NAME => class_name = Some(self.string(&field)?),
                ANNOTATION::ARGUMENT => {
                    let mut name = None;
                    let mut value = None;
                    for_each_field(field.bytes()?, |arg| {
                        match arg.number {
                            ANNOTATION_ARGUMENT::NAME => name = Some(self.string(&arg)?),
                            ANNOTATION_ARGUMENT::VALUE => {
                                value = Some(self.annotation_value(arg.bytes()?, depth + 1)?);
                            }
                            _ => {}
                        }
                        Ok(())
                    })?;
                    arguments.push(AnnotationNamedArgument {
                        name: required(name, "annotation argument name")?,
                        value: required(value, "annotation argument value")?,
                    });
                }
                _ => {}
            }
            Ok(())
        })?;

        Ok(Annotation {
            class_name: required(class_name, "annotation class name")?,
            arguments,
        })
    }

    fn annotation_value(&self, data: &[u8], depth: usize) -> Result<AnnotationArgument> {
        check_depth(depth)?;

        let mut tag = None;
        let mut int_value = 0i64;
        let mut string_value = None;
        let mut class_name = None;
        let mut enum_value_name = None;
        let mut annotation = None;
        let mut elements = Vec::new();
        let mut array_dimensions = 0u32;

        for_each_field(data, |field| {
            match field.number {
                ANNOTATION_VALUE::TYPE => tag = Some(field.varint_u32()?),
                ANNOTATION_VALUE::INT_VALUE => int_value = zigzag_decode(field.varint()?),
                ANNOTATION_VALUE::STRING_VALUE => string_value = Some(self.string(&field)?),
                ANNOTATION_VALUE::CLASS_NAME => class_name = Some(self.string(&field)?),
                ANNOTATION_VALUE::ENUM_VALUE_NAME => enum_value_name = Some(self.string(&field)?),
                ANNOTATION_VALUE::ANNOTATION => {
                    annotation = Some(self.annotation(field.bytes()?, depth + 1)?);
                }
                ANNOTATION_VALUE::ARRAY_ELEMENT => {
                    elements.push(self.annotation_value(field.bytes()?, depth + 1)?);
                }
                ANNOTATION_VALUE::ARRAY_DIMENSION_COUNT => array_dimensions = field.varint_u32()?,
                _ => {}
            }
            Ok(())
        })?;

        let tag = required(tag, "annotation argument type")?;
        if let Some(scalar) = AnnotationArgument::from_integral(tag, int_value) {
            return Ok(scalar);
        }

        Ok(match tag {
            ARGUMENT_TYPE::STRING => {
                AnnotationArgument::String(required(string_value, "annotation string value")?)
            }
            ARGUMENT_TYPE::CLASS => AnnotationArgument::KClass {
                class_name: required(class_name, "annotation class literal")?,
                array_dimensions,
            },
            ARGUMENT_TYPE::ENUM => AnnotationArgument::Enum {
                class_name: required(class_name, "annotation enum class")?,
                entry_name: required(enum_value_name, "annotation enum entry")?,
            },
            ARGUMENT_TYPE::ANNOTATION => {
                AnnotationArgument::Annotation(required(annotation, "nested annotation")?)
            }
            ARGUMENT_TYPE::ARRAY => AnnotationArgument::Array(elements),
            other => return Err(malformed_error!("Unknown annotation argument type - {}", other)),
        })
    }

    fn method_signature(&self, data: &[u8]) -> Result<MethodSignature> {
        let (name, descriptor) = self.signature(data)?;
        Ok(MethodSignature { name, descriptor })
    }

    fn field_signature(&self, data: &[u8]) -> Result<FieldSignature> {
        let (name, descriptor) = self.signature(data)?;
        Ok(FieldSignature { name, descriptor })
    }

    fn signature(&self, data: &[u8]) -> Result<(String, String)> {
        let mut name = None;
        let mut descriptor = None;

        for_each_field(data, |field| {
            match field.number {
                SIGNATURE::NAME => name = Some(self.string(&field)?),
                SIGNATURE::DESCRIPTOR => descriptor = Some(self.string(&field)?),
                _ => {}
            }
            Ok(())
        })?;

        Ok((
            required(name, "signature name")?,
            required(descriptor, "signature descriptor")?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::bitencoding::encode_bytes;

    fn header(kind: i32, payload: &[u8], strings: &[&str]) -> MetadataHeader {
        MetadataHeader {
            kind,
            metadata_version: vec![1, 9, 0],
            data1: encode_bytes(payload, 65535),
            data2: strings.iter().map(|s| s.to_string()).collect(),
            ..MetadataHeader::default()
        }
    }

    #[test]
    fn empty_package() {
        let metadata = decode(&header(2, &[], &[])).unwrap();
        assert_eq!(metadata.declaration, Declaration::FileFacade(Package::default()));
    }

    #[test]
    fn unknown_kind_is_malformed() {
        assert!(matches!(
            decode(&header(9, &[], &[])),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn version_checks() {
        let mut h = header(2, &[], &[]);
        h.metadata_version = vec![2, 0, 0];
        assert!(decode(&h).is_err());

        h.metadata_version = vec![1, 20, 0];
        assert!(decode(&h).is_ok());
        h.extra_int = HeaderFlags::STRICT_SEMANTICS.bits();
        assert!(decode(&h).is_err());

        assert!(decode(&MetadataHeader::default()).is_err());
    }

    #[test]
    fn class_requires_a_name() {
        // flags only
        assert!(decode(&header(1, &[0x08, 0x06], &[])).is_err());
        // flags + name 0
        let metadata = decode(&header(1, &[0x08, 0x06, 0x10, 0x00], &["a/B"])).unwrap();
        let Declaration::Class(class) = metadata.declaration else {
            panic!("expected a class");
        };
        assert_eq!(class.name, "a/B");
    }

    #[test]
    fn dangling_string_index() {
        assert!(decode(&header(1, &[0x10, 0x05], &["a/B"])).is_err());
    }

    #[test]
    fn truncated_payload() {
        // package function field claims 5 bytes, has 1
        assert!(matches!(
            decode(&header(2, &[0x0A, 0x05, 0x08], &[])),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn conflicting_classifiers_are_rejected() {
        // package > function(name 0, return type {class 0, type parameter 1})
        let ty = [0x10, 0x00, 0x18, 0x01];
        let mut function = vec![0x10, 0x00, 0x32, ty.len() as u8];
        function.extend_from_slice(&ty);
        let mut payload = vec![0x0A, function.len() as u8];
        payload.extend_from_slice(&function);
        assert!(decode(&header(2, &payload, &["f"])).is_err());
    }

    #[test]
    fn deeply_nested_types_hit_the_limit() {
        // type > outer type > outer type > ... built from the inside out
        let mut ty = vec![0x10, 0x00];
        for _ in 0..(MAX_DECODE_DEPTH + 2) {
            let mut outer = vec![0x10, 0x00, 0x32];
            let mut length = Vec::new();
            crate::wire::proto::write_varint(&mut length, ty.len() as u64);
            outer.extend_from_slice(&length);
            outer.extend_from_slice(&ty);
            ty = outer;
        }
        let mut function = vec![0x10, 0x00, 0x32];
        crate::wire::proto::write_varint(&mut function, ty.len() as u64);
        function.extend_from_slice(&ty);
        let mut payload = vec![0x0A];
        crate::wire::proto::write_varint(&mut payload, function.len() as u64);
        payload.extend_from_slice(&function);

        assert!(matches!(
            decode(&header(2, &payload, &["f"])),
            Err(Error::RecursionLimit(_))
        ));
    }

    #[test]
    fn multi_file_part_takes_facade_from_xs() {
        let mut h = header(5, &[], &[]);
        h.extra_string = "a/Facade".into();
        let metadata = decode(&h).unwrap();
        let Declaration::MultiFilePart(part) = metadata.declaration else {
            panic!("expected a multi-file part");
        };
        assert_eq!(part.facade_class_name, "a/Facade");
    }
}
