//! The serialized form of Kotlin metadata.
//!
//! Metadata travels as a tuple of eight values ([`MetadataHeader`]) stored in the
//! elements of the `kotlin.Metadata` annotation. Most of the information lives in a
//! binary payload of nested messages, packed into strings (`d1`), plus a string table
//! the messages index into (`d2`).
//!
//! # Key Components
//!
//! - [`header`] - The wire tuple and its element names
//! - [`schema`] - Message kinds and field numbers of the payload
//! - [`builder`] - Nested message builders used by the writer
//! - [`reader`] - Decoding of the wire tuple back into the model
//! - [`parser`] - Field cursor over an encoded payload
//! - [`strings`] - The interned string table
//! - [`bitencoding`] - Packing of payload bytes into `d1` strings
//! - [`proto`] - Varint, key and zig-zag primitives

pub mod bitencoding;
pub mod builder;
pub mod header;
pub mod parser;
pub mod proto;
pub mod reader;
pub mod schema;
pub mod strings;

pub use crate::model::MetadataKind;
pub use header::{FieldShape, HeaderValue, MetadataField, MetadataHeader};
pub use reader::decode;
