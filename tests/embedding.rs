//! Integration tests for embedding wire tuples into class files.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use kmetadata::{
    classfile::{
        annotation::{Annotation, ElementValue, ElementValuePair, TAG_INT, TAG_STRING},
        shrinker,
    },
    embed::holder::{read_holder, METADATA_DESCRIPTOR},
    model::{MetadataVersion, Version},
    prelude::*,
};

fn metadata() -> KotlinMetadata {
    let mut package = Package::default();
    package
        .declarations
        .properties
        .push(Property::new("x", KotlinType::class("kotlin/String")));
    package
        .declarations
        .functions
        .push(Function::new("main", KotlinType::class("kotlin/Unit")));
    let mut metadata = KotlinMetadata::file_facade(package);
    metadata.package_name = "com.example".into();
    metadata
}

/// A class as a compiler emits it: a full holder with one element per field.
fn compiled_class(name: &str) -> ProgramClass {
    let mut class = ProgramClass::new(name).unwrap();
    let header = MetadataHeader {
        kind: 2,
        metadata_version: vec![1, 9, 0],
        data1: vec!["\u{1}".into()],
        data2: vec!["stale".into()],
        extra_int: 16,
        ..MetadataHeader::default()
    };
    attach_metadata_holder(&mut class, &header).unwrap();
    class
}

/// A holder whose element names were replaced by `names`.
fn renamed_holder(names: &[&str]) -> ProgramClass {
    let mut class = ProgramClass::new("a/Renamed").unwrap();
    let type_index = class
        .constant_pool
        .add_utf8_constant(METADATA_DESCRIPTOR)
        .unwrap();
    let int = class.constant_pool.add_integer_constant(2).unwrap();
    let string = class.constant_pool.add_utf8_constant("").unwrap();

    let mut annotation = Annotation::new(type_index);
    for name in names {
        let name_index = class.constant_pool.add_utf8_constant(name).unwrap();
        let value = if name.len() == 1 {
            ElementValue::Const {
                tag: TAG_INT,
                const_value_index: int,
            }
        } else {
            ElementValue::Const {
                tag: TAG_STRING,
                const_value_index: string,
            }
        };
        annotation.elements.push(ElementValuePair { name_index, value });
    }
    class.add_annotation(annotation).unwrap();
    class
}

fn writer(config: WriterConfig) -> (KotlinMetadataWriter, Arc<Diagnostics>) {
    let diagnostics = Arc::new(Diagnostics::new());
    (
        KotlinMetadataWriter::new(config, diagnostics.clone()),
        diagnostics,
    )
}

#[test]
fn written_holder_decodes_to_the_model() -> Result<()> {
    let (writer, diagnostics) = writer(WriterConfig::default());
    let mut class = compiled_class("com/example/MainKt");
    let metadata = metadata();

    assert!(writer.process_container(&mut class, &metadata).is_written());
    assert!(!diagnostics.has_any());

    let header = read_metadata_holder(&class)?.expect("holder");
    assert_eq!(header.kind, 2);
    assert_eq!(header.package_name, "com.example");
    assert_eq!(header.extra_int, 0);
    assert_eq!(decode(&header)?, metadata);

    // previous values are gone after compaction
    assert!(class.constant_pool.find_utf8("stale").is_none());
    Ok(())
}

#[test]
fn renamed_elements_leave_the_class_untouched() {
    for names in [
        vec!["a", "b", "c"],
        vec!["k", "mv", "d1", "d2", "zz"],
        vec!["k", "k"],
    ] {
        let (writer, diagnostics) = writer(WriterConfig::default());
        let mut class = renamed_holder(&names);
        let before = class.clone();

        let outcome = writer.process_container(&mut class, &metadata());
        assert_eq!(outcome, WriteOutcome::SkippedHolderMismatch, "{names:?}");
        assert_eq!(class, before, "{names:?}");
        assert_eq!(diagnostics.count(), 1, "{names:?}");
        assert_eq!(diagnostics.by_container("a/Renamed").len(), 1);
    }
}

#[test]
fn misshapen_known_element_is_a_mismatch() {
    // `mv` must hold an int array, not a single string
    let (writer, diagnostics) = writer(WriterConfig::default());
    let mut class = renamed_holder(&["mv"]);
    let before = class.clone();

    assert_eq!(
        writer.process_container(&mut class, &metadata()),
        WriteOutcome::SkippedHolderMismatch
    );
    assert_eq!(class, before);
    assert_eq!(
        diagnostics
            .by_category(DiagnosticCategory::Holder)
            .len(),
        1
    );
}

#[test]
fn corrupt_tuple_is_skipped() {
    // the writer allows deeper types than the decoder, so the guard rejects this one
    let mut ty = KotlinType::class("kotlin/Int");
    for _ in 0..200 {
        ty = KotlinType::class("kotlin/collections/List").with_argument(ty);
    }
    let mut package = Package::default();
    package.declarations.properties.push(Property::new("deep", ty));
    let metadata = KotlinMetadata::file_facade(package);

    let (writer, diagnostics) = writer(WriterConfig::default().with_max_type_depth(1000));
    let mut class = compiled_class("a/Deep");
    let before = class.clone();

    assert_eq!(
        writer.process_container(&mut class, &metadata),
        WriteOutcome::SkippedCorrupt
    );
    assert_eq!(class, before);
    assert_eq!(diagnostics.by_category(DiagnosticCategory::Metadata).len(), 1);
}

#[test]
fn unsupported_metadata_version_is_a_model_error() {
    let (writer, diagnostics) = writer(WriterConfig::default());
    let mut class = compiled_class("a/Next");
    let before = class.clone();

    let mut metadata = metadata();
    metadata.version = MetadataVersion(Version::new(2, 0, 0));

    let outcome = writer.process_container(&mut class, &metadata);
    let WriteOutcome::ModelInvariantViolation(message) = &outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert!(message.contains("2.0.0"), "{message}");
    assert_eq!(class, before);
    assert_eq!(diagnostics.by_category(DiagnosticCategory::Model).len(), 1);
}

#[test]
fn oversized_strings_leave_the_class_untouched() {
    // a name longer than one UTF-8 constant lands in d2 as a single string
    let mut package = Package::default();
    package
        .declarations
        .functions
        .push(Function::new("f".repeat(70_000), KotlinType::class("kotlin/Unit")));
    let metadata = KotlinMetadata::file_facade(package);

    let (writer, diagnostics) = writer(WriterConfig::default());
    let mut class = compiled_class("a/Long");
    let before = class.clone();

    assert_eq!(
        writer.process_container(&mut class, &metadata),
        WriteOutcome::SkippedPoolOverflow
    );
    assert_eq!(class, before);
    assert_eq!(
        diagnostics.by_category(DiagnosticCategory::ConstantPool).len(),
        1
    );
}

#[test]
fn every_holder_is_rewritten() -> Result<()> {
    let mut class = compiled_class("a/Twice");
    let first = class.find_annotation(METADATA_DESCRIPTOR).expect("holder");
    let copy = class.annotation(first).expect("holder").clone();
    class.add_annotation(copy)?;

    let (writer, _) = writer(WriterConfig::default());
    let metadata = metadata();
    assert!(writer.process_container(&mut class, &metadata).is_written());
    let mut headers = Vec::new();
    class.for_each_annotation_of_type(METADATA_DESCRIPTOR, |_, annotation| {
        headers.push(read_holder(annotation, &class.constant_pool));
    });
    assert_eq!(headers.len(), 2);
    for header in headers {
        assert_eq!(decode(&header?)?, metadata);
    }
    Ok(())
}

#[test]
fn one_bad_holder_blocks_all_of_them() {
    let mut class = compiled_class("a/Mixed");
    let type_index = class
        .constant_pool
        .add_utf8_constant(METADATA_DESCRIPTOR)
        .unwrap();
    let name_index = class.constant_pool.add_utf8_constant("zz").unwrap();
    let value_index = class.constant_pool.add_integer_constant(1).unwrap();
    let mut renamed = Annotation::new(type_index);
    renamed.elements.push(ElementValuePair {
        name_index,
        value: ElementValue::Const {
            tag: TAG_INT,
            const_value_index: value_index,
        },
    });
    class.add_annotation(renamed).unwrap();
    let before = class.clone();

    let (writer, diagnostics) = writer(WriterConfig::default());
    assert_eq!(
        writer.process_container(&mut class, &metadata()),
        WriteOutcome::SkippedHolderMismatch
    );
    assert_eq!(class, before);
    assert_eq!(diagnostics.count(), 1);
}

#[test]
fn compaction_is_optional() -> Result<()> {
    let metadata = metadata();

    let (compacting, _) = writer(WriterConfig::default());
    let mut compacted = compiled_class("a/A");
    compacting.process_container(&mut compacted, &metadata);

    let (keeping, _) = writer(WriterConfig::minimal());
    let mut kept = compiled_class("a/A");
    keeping.process_container(&mut kept, &metadata);

    assert!(kept.constant_pool.len() > compacted.constant_pool.len());
    assert_eq!(read_metadata_holder(&kept)?, read_metadata_holder(&compacted)?);

    // compacting afterwards reaches the same pool
    shrinker::compact(&mut kept)?;
    assert_eq!(kept.constant_pool, compacted.constant_pool);
    Ok(())
}

#[test]
fn auxiliary_visitor_sees_the_written_class() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let (writer, _) = writer(WriterConfig::default());
    let writer = writer.with_auxiliary_visitor(move |class: &mut ProgramClass| {
        if read_metadata_holder(class).ok().flatten().is_some() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    let mut class = compiled_class("a/A");
    writer.process_container(&mut class, &metadata());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn parallel_batch() {
    let (writer, diagnostics) = writer(WriterConfig::default());
    let mut batch: Vec<(ProgramClass, KotlinMetadata)> = (0..64)
        .map(|i| {
            let class = if i % 8 == 7 {
                renamed_holder(&["x"])
            } else {
                compiled_class(&format!("a/C{i}"))
            };
            (class, metadata())
        })
        .collect();
    let sequential: Vec<ProgramClass> = batch.iter().map(|(class, _)| class.clone()).collect();

    let outcomes = writer.process_parallel(&mut batch);

    let skipped = outcomes
        .iter()
        .filter(|o| **o == WriteOutcome::SkippedHolderMismatch)
        .count();
    assert_eq!(skipped, 8);
    assert_eq!(diagnostics.warning_count(), 8);

    // same result as processing each container alone
    let (single, _) = self::writer(WriterConfig::default());
    for ((class, metadata), mut original) in batch.iter().zip(sequential) {
        single.process_container(&mut original, metadata);
        assert_eq!(*class, original);
    }
}
