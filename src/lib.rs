// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # kmetadata
//!
//! Writes Kotlin declaration metadata back into JVM class files.
//!
//! Kotlin compilers describe every class file's declarations (properties, functions,
//! constructors, type parameters, nullability, contracts and more) in a
//! `kotlin.Metadata` annotation. Tools that rewrite class files (shrinkers,
//! obfuscators, optimizers) keep an in-memory model of that description, change it,
//! and must serialize it again before the class is written out. `kmetadata` is that
//! serializer: it turns a [`model::KotlinMetadata`] tree into the annotation's eight
//! values and embeds them into the class's constant pool.
//!
//! ## Features
//!
//! - **Complete model** - All five metadata shapes (class, file facade, synthetic
//!   class, multi-file facade and part) with every declaration kind
//! - **Checked output** - Every wire tuple is decoded again before it touches the
//!   class file
//! - **No partial writes** - A container is either fully rewritten or left exactly
//!   as it was
//! - **Parallel batches** - Containers share no state and can be written on the
//!   rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use kmetadata::prelude::*;
//! use std::sync::Arc;
//!
//! // A class file carrying an (outdated) kotlin.Metadata annotation
//! let mut class = ProgramClass::new("com/example/MainKt")?;
//! attach_metadata_holder(&mut class, &MetadataHeader::default())?;
//!
//! // The metadata to write
//! let mut package = Package::default();
//! package
//!     .declarations
//!     .properties
//!     .push(Property::new("answer", KotlinType::class("kotlin/Int")));
//! let metadata = KotlinMetadata::file_facade(package);
//!
//! let diagnostics = Arc::new(Diagnostics::new());
//! let writer = KotlinMetadataWriter::new(WriterConfig::default(), diagnostics.clone());
//! assert_eq!(writer.process_container(&mut class, &metadata), WriteOutcome::Written);
//!
//! // Read the values back and decode them
//! let header = read_metadata_holder(&class)?.expect("holder present");
//! assert_eq!(decode(&header)?, metadata);
//! # Ok::<(), kmetadata::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`model`] - The node model: declarations, types, contracts and annotations
//! - [`writer`] - Transcription of a model tree into a [`wire::MetadataHeader`]
//! - [`wire`] - The wire format: nested message builders, string table, `d1`
//!   encoding and the decoder used by the round-trip guard
//! - [`classfile`] - Constant pool, annotations and constant pool compaction
//! - [`embed`] - The per-container entry point and the `kotlin.Metadata` holder
//! - [`diagnostics`] - Per-container reports for skipped classes
//! - [`config`] - Writer configuration
//!
//! ## Error Handling
//!
//! Fallible operations return [`Result<T, Error>`](Result).
//! [`embed::KotlinMetadataWriter::process_container`] never fails: it reports a
//! [`embed::WriteOutcome`] and records a diagnostic for every skipped container.
//!
//! ```rust
//! use kmetadata::{Error, wire::{decode, MetadataHeader}};
//!
//! let header = MetadataHeader { kind: 9, ..MetadataHeader::default() };
//! match decode(&header) {
//!     Ok(_) => println!("decoded"),
//!     Err(Error::Malformed { message, .. }) => println!("corrupt metadata: {}", message),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//!
//! # Fuzz the decoder
//! cargo +nightly fuzz run decode --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use kmetadata::prelude::*;
///
/// let writer = MetadataWriter::new(WriterConfig::default());
/// let output = writer.write(&KotlinMetadata::file_facade(Package::default()))?;
/// assert_eq!(output.header.kind, 2);
/// # Ok::<(), kmetadata::Error>(())
/// ```
pub mod prelude;

/// The class file side of embedding: constant pool, annotations, compaction.
pub mod classfile;

/// Writer configuration
pub mod config;

/// Diagnostics for skipped containers.
pub mod diagnostics;

/// The per-container entry point.
///
/// See [`embed::KotlinMetadataWriter`] for the processing steps and
/// [`embed::holder`] for the layout of the `kotlin.Metadata` annotation.
pub mod embed;

/// The Kotlin metadata node model.
///
/// The model is a plain tree of owned values. Its shape is fixed by
/// [`model::Declaration`]; there are no unresolved references and no shared nodes.
pub mod model;

/// Wire format of the `kotlin.Metadata` annotation
pub mod wire;

/// Transcription of the node model into the wire tuple.
pub mod writer;

/// `kmetadata` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `kmetadata` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;
