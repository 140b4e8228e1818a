#![no_main]

use libfuzzer_sys::fuzz_target;
use kmetadata::wire::{decode, MetadataHeader};

fuzz_target!(|data: &[u8]| {
    let Some((&kind, rest)) = data.split_first() else {
        return;
    };

    // first byte selects the kind, the rest is split into d1 chunks and d2 strings
    let text = String::from_utf8_lossy(rest);
    let (data1, data2) = text.split_once('\u{0}').unwrap_or((text.as_ref(), ""));
    let header = MetadataHeader {
        kind: i32::from(kind % 8),
        metadata_version: vec![1, 9, 0],
        data1: data1.split('\n').map(str::to_string).collect(),
        data2: data2.split('\n').map(str::to_string).collect(),
        ..MetadataHeader::default()
    };
    let _ = decode(&header);
});
