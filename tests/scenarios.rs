//! End-to-end transcription scenarios.
//!
//! Each test builds a small node model, writes it, and checks what the decoder reads
//! back from the resulting wire tuple, plus the raw payload where the slot a value
//! lands in matters.

use kmetadata::{
    model::{
        Contract, Effect, EffectExpression, EffectType, InvocationKind, MethodSignature, Version,
        VersionKind, VersionRequirement,
    },
    prelude::*,
    wire::{
        bitencoding::decode_bytes,
        parser::{Field, Parser},
        schema::{FUNCTION, PACKAGE, VALUE_PARAMETER},
    },
    Result,
};

fn roundtrip(metadata: &KotlinMetadata) -> Result<KotlinMetadata> {
    let output = MetadataWriter::new(WriterConfig::default()).write(metadata)?;
    decode(&output.header)
}

fn fields(data: &[u8]) -> Result<Vec<Field<'_>>> {
    let mut parser = Parser::new(data);
    let mut fields = Vec::new();
    while parser.has_more_data() {
        fields.push(parser.read_field()?);
    }
    Ok(fields)
}

fn facade(package: Package) -> KotlinMetadata {
    KotlinMetadata::file_facade(package)
}

/// A single public property `x: kotlin.String` survives the round trip unchanged.
#[test]
fn single_property() -> Result<()> {
    let mut property = Property::new("x", KotlinType::class("kotlin/String"));
    property.flags.visibility = Visibility::Public;

    let mut package = Package::default();
    package.declarations.properties.push(property.clone());

    let decoded = roundtrip(&facade(package))?;
    let Declaration::FileFacade(package) = &decoded.declaration else {
        panic!("expected a file facade, got {:?}", decoded.kind());
    };

    assert_eq!(package.declarations.properties.len(), 1);
    let decoded_property = &package.declarations.properties[0];
    assert_eq!(decoded_property.name, "x");
    assert_eq!(decoded_property.return_type, KotlinType::class("kotlin/String"));
    assert_eq!(decoded_property.flags, property.flags);
    assert!(decoded_property.receiver_type.is_none());
    assert!(decoded_property.setter_parameter.is_none());
    assert!(package.declarations.functions.is_empty());
    Ok(())
}

/// Nested class names use `.` between segments in the metadata.
#[test]
fn nested_class_names() -> Result<()> {
    let mut class = Class::new("Outer");
    class.nested_class_names = vec!["Outer$Inner1".into(), "Outer$Inner2".into()];

    let decoded = roundtrip(&KotlinMetadata::class(class))?;
    let Declaration::Class(class) = &decoded.declaration else {
        panic!("expected a class");
    };
    assert_eq!(class.nested_class_names, ["Outer.Inner1", "Outer.Inner2"]);
    Ok(())
}

/// A vararg parameter keeps its element type in the vararg slot only.
#[test]
fn vararg_parameter() -> Result<()> {
    let mut function = Function::new("sum", KotlinType::class("kotlin/Int"));
    function
        .value_parameters
        .push(ValueParameter::vararg("values", KotlinType::class("kotlin/Int")));

    let mut package = Package::default();
    package.declarations.functions.push(function.clone());
    let metadata = facade(package);

    let decoded = roundtrip(&metadata)?;
    let Declaration::FileFacade(package) = &decoded.declaration else {
        panic!("expected a file facade");
    };
    let parameter = &package.declarations.functions[0].value_parameters[0];
    assert!(parameter.flags.is_vararg);
    assert_eq!(parameter.ty, KotlinType::class("kotlin/Int"));

    // only the vararg-element slot is present in the payload
    let output = MetadataWriter::default().write(&metadata)?;
    let payload = decode_bytes(&output.header.data1)?;
    let root = fields(&payload)?;
    let function = root
        .iter()
        .find(|f| f.number == PACKAGE::FUNCTION)
        .expect("function message");
    let function_fields = fields(function.bytes()?)?;
    let parameter = function_fields
        .iter()
        .find(|f| f.number == FUNCTION::VALUE_PARAMETER)
        .expect("value parameter message");
    let slots: Vec<u32> = fields(parameter.bytes()?)?
        .iter()
        .map(|f| f.number)
        .collect();
    assert!(slots.contains(&VALUE_PARAMETER::VARARG_ELEMENT_TYPE));
    assert!(!slots.contains(&VALUE_PARAMETER::TYPE));
    Ok(())
}

#[test]
fn generic_class_with_members() -> Result<()> {
    let mut class = Class::new("com/example/Box$Holder");
    class.flags.modality = Modality::Open;
    let mut t = TypeParameter::new(0, "T");
    t.upper_bounds.push(KotlinType::class("kotlin/Any").nullable());
    class.type_parameters.push(t);
    class
        .supertypes
        .push(KotlinType::class("com/example/Base").with_argument(KotlinType::type_parameter(0)));
    class.companion_object_name = Some("Companion".into());
    class.sealed_subclass_names.push("com/example/Box$Holder$Sub".into());
    class.enum_entry_names.push("A$B".into());
    class.module_name = Some("app".into());
    class.version_requirement = Some(VersionRequirement::new(
        VersionKind::LanguageVersion,
        Version::new(1, 4, 0),
    ));

    let mut constructor = Constructor::new();
    constructor
        .value_parameters
        .push(ValueParameter::new("value", KotlinType::type_parameter(0)));
    constructor.signature = Some(MethodSignature::new("<init>", "(Ljava/lang/Object;)V"));
    class.constructors.push(constructor);

    let mut get = Function::new("get", KotlinType::type_parameter(0));
    get.flags = FunctionFlags {
        modality: Modality::Open,
        ..FunctionFlags::default()
    };
    get.signature = Some(MethodSignature::new("get", "()Ljava/lang/Object;"));
    class.declarations.functions.push(get);
    class
        .declarations
        .type_aliases
        .push(TypeAlias::new("Alias", KotlinType::class("kotlin/collections/List")));

    let metadata = KotlinMetadata::class(class);
    let decoded = roundtrip(&metadata)?;

    let mut expected = metadata.clone();
    expected.map_class_names(&ToMetadataName);
    assert_eq!(decoded, expected);

    let Declaration::Class(class) = &decoded.declaration else {
        panic!("expected a class");
    };
    assert_eq!(class.name, "com/example/Box.Holder");
    assert_eq!(class.enum_entry_names, ["A$B"]);
    Ok(())
}

#[test]
fn contract_effects() -> Result<()> {
    let mut function = Function::new("require", KotlinType::class("kotlin/Unit"));
    let mut returns = Effect::new(EffectType::ReturnsConstant);
    returns.conclusion = Some(EffectExpression::parameter(0));
    let mut calls = Effect::new(EffectType::Calls);
    calls.invocation_kind = Some(InvocationKind::ExactlyOnce);
    calls.constructor_arguments.push(EffectExpression::parameter(1));
    function.contract = Some(Contract {
        effects: vec![returns, calls],
    });

    let mut package = Package::default();
    package.declarations.functions.push(function);
    let metadata = facade(package);

    assert_eq!(roundtrip(&metadata)?, metadata);
    Ok(())
}

#[test]
fn synthetic_lambda() -> Result<()> {
    let mut lambda = Function::new("<anonymous>", KotlinType::class("kotlin/Unit"));
    lambda.lambda_class_origin_name = Some("a/MainKt$main$1".into());
    let metadata = KotlinMetadata::new(Declaration::SyntheticClass(SyntheticClass {
        functions: vec![lambda],
    }));

    let output = MetadataWriter::default().write(&metadata)?;
    assert_eq!(output.header.kind, 3);
    assert_eq!(decode(&output.header)?, metadata);
    Ok(())
}

#[test]
fn multi_file_class() -> Result<()> {
    let facade = KotlinMetadata::new(Declaration::MultiFileFacade(MultiFileFacade {
        part_class_names: vec!["a/Utils__AKt".into(), "a/Utils__BKt".into()],
    }));
    let output = MetadataWriter::default().write(&facade)?;
    assert_eq!(output.header.data1, ["a/Utils__AKt", "a/Utils__BKt"]);
    assert!(output.header.data2.is_empty());
    assert_eq!(decode(&output.header)?, facade);

    let mut package = Package::default();
    package
        .declarations
        .functions
        .push(Function::new("a", KotlinType::class("kotlin/Int")));
    let part = KotlinMetadata::new(Declaration::MultiFilePart(MultiFilePart {
        facade_class_name: "a/Utils".into(),
        package,
    }));
    let output = MetadataWriter::default().write(&part)?;
    assert_eq!(output.header.kind, 5);
    assert_eq!(output.header.extra_string, "a/Utils");
    assert_eq!(decode(&output.header)?, part);
    Ok(())
}

#[test]
fn deep_types_hit_the_configured_limit() {
    let mut ty = KotlinType::class("kotlin/Int");
    for _ in 0..10 {
        ty = KotlinType::class("kotlin/collections/List").with_argument(ty);
    }
    let mut package = Package::default();
    package.declarations.properties.push(Property::new("deep", ty));
    let metadata = facade(package);

    let writer = MetadataWriter::new(WriterConfig::default().with_max_type_depth(5));
    assert!(matches!(writer.write(&metadata), Err(Error::RecursionLimit(5))));
    assert!(MetadataWriter::default().write(&metadata).is_ok());
}

#[test]
fn long_payloads_are_chunked() -> Result<()> {
    let mut package = Package::default();
    for i in 0..200 {
        package
            .declarations
            .properties
            .push(Property::new(format!("p{i}"), KotlinType::class("kotlin/Int")));
    }
    let metadata = facade(package);

    let writer = MetadataWriter::new(WriterConfig::default().with_max_string_chunk(64));
    let output = writer.write(&metadata)?;
    assert!(output.header.data1.len() > 1);
    assert!(output.header.data1.iter().all(|chunk| chunk.len() <= 64));
    assert_eq!(decode(&output.header)?, metadata);
    Ok(())
}

#[test]
fn full_form_version_requirements() -> Result<()> {
    let mut function = Function::new("modern", KotlinType::class("kotlin/Unit"));
    function.version_requirement = Some(VersionRequirement::new(
        VersionKind::CompilerVersion,
        Version::new(255, 200, 65535),
    ));
    let mut package = Package::default();
    package.declarations.functions.push(function);
    let metadata = facade(package);

    assert_eq!(roundtrip(&metadata)?, metadata);
    Ok(())
}

#[test]
fn oversized_version_requirement_is_rejected() {
    let mut function = Function::new("future", KotlinType::class("kotlin/Unit"));
    function.version_requirement = Some(VersionRequirement::new(
        VersionKind::CompilerVersion,
        Version::new(300, 1, 70000),
    ));
    let mut package = Package::default();
    package.declarations.functions.push(function);
    let metadata = facade(package);

    assert!(matches!(
        MetadataWriter::default().write(&metadata),
        Err(Error::ModelInvariant(_))
    ));

    let diagnostics = std::sync::Arc::new(Diagnostics::new());
    let writer = KotlinMetadataWriter::new(WriterConfig::default(), diagnostics.clone());
    let mut class = ProgramClass::new("a/FutureKt").unwrap();
    attach_metadata_holder(&mut class, &MetadataHeader::default()).unwrap();
    let before = class.clone();

    let outcome = writer.process_container(&mut class, &metadata);
    assert!(matches!(outcome, WriteOutcome::ModelInvariantViolation(_)));
    assert_eq!(class, before);
    assert!(diagnostics.has_errors());
}
