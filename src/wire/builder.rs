//! Nested message builders.
//!
//! The payload is produced by a tree of [`MessageBuilder`]s. A builder is opened by
//! its parent through [`MessageBuilder::child`], receives scalar fields and children
//! of its own, and is finally closed, which appends the finished message to the
//! parent as a length-delimited field.
//!
//! The lifecycle is enforced by ownership rather than checked at run time:
//!
//! - a child mutably borrows its parent, so the parent cannot receive anything else,
//!   open a second child, or close while the child is alive;
//! - [`MessageBuilder::close`] consumes the builder, so a closed builder cannot be used
//!   again;
//! - a builder that goes out of scope without an explicit `close` is closed by its
//!   `Drop` implementation, so every opened builder is closed exactly once.
//!
//! Which child kinds a builder accepts is governed by [`schema::child_kind`]; a
//! mismatch is reported as [`crate::Error::ModelInvariant`].
//!
//! # Examples
//!
//! ```rust
//! use kmetadata::wire::builder::RootBuilder;
//! use kmetadata::wire::schema::{NodeKind, PACKAGE, FUNCTION};
//!
//! let mut root = RootBuilder::package(false);
//! {
//!     let mut package = root.root();
//!     let mut function = package.child(PACKAGE::FUNCTION, NodeKind::Function)?;
//!     function.uint(FUNCTION::FLAGS, 6);
//!     function.string(FUNCTION::NAME, "main");
//!     function.close();
//!     package.close();
//! }
//! let payload = root.finish(65535);
//! assert_eq!(payload.data2, vec!["main".to_string()]);
//! # Ok::<(), kmetadata::Error>(())
//! ```

use tracing::trace;

use crate::{
    wire::{
        bitencoding::encode_bytes,
        proto::{write_key, write_varint, zigzag_encode, WIRE_LENGTH_DELIMITED, WIRE_VARINT},
        schema::{self, NodeKind},
        strings::StringTable,
    },
    Error, Result,
};

/// Field number used for the root message, which is written without framing
const ROOT_FIELD: u32 = 0;

/// An entry of the builder journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderEvent {
    /// A builder of the given kind was opened
    Open(NodeKind),
    /// A builder of the given kind was closed
    Close(NodeKind),
    /// A type parameter with the given id was written
    DeclareTypeParameter(u32),
    /// A type referring to the type parameter with the given id was written
    ReferenceTypeParameter(u32),
}

/// State shared by all builders of one payload.
#[derive(Debug, Default)]
pub struct EncodeContext {
    strings: StringTable,
    journal: Option<Vec<BuilderEvent>>,
}

impl EncodeContext {
    fn new(record_journal: bool) -> Self {
        EncodeContext {
            strings: StringTable::new(),
            journal: record_journal.then(Vec::new),
        }
    }

    fn record(&mut self, event: BuilderEvent) {
        if let Some(journal) = &mut self.journal {
            trace!(?event, "builder");
            journal.push(event);
        }
    }
}

/// The finished payload, ready to be stored in `d1` and `d2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// The packed payload chunks
    pub data1: Vec<String>,
    /// The string table
    pub data2: Vec<String>,
    /// Recorded builder events, empty unless recording was requested
    pub journal: Vec<BuilderEvent>,
}

/// Owner of a payload under construction.
///
/// One root builder exists per written class file, created for the root message
/// kind of the metadata shape.
#[derive(Debug)]
pub struct RootBuilder {
    ctx: EncodeContext,
    kind: NodeKind,
    payload: Vec<u8>,
}

impl RootBuilder {
    fn new(kind: NodeKind, record_journal: bool) -> Self {
        RootBuilder {
            ctx: EncodeContext::new(record_journal),
            kind,
            payload: Vec::new(),
        }
    }

    /// Creates the builder for a class payload
    #[must_use]
    pub fn class(record_journal: bool) -> Self {
        Self::new(NodeKind::Class, record_journal)
    }

    /// Creates the builder for a file facade or multi-file part payload
    #[must_use]
    pub fn package(record_journal: bool) -> Self {
        Self::new(NodeKind::Package, record_journal)
    }

    /// Creates the builder for a synthetic class payload
    #[must_use]
    pub fn lambda(record_journal: bool) -> Self {
        Self::new(NodeKind::Lambda, record_journal)
    }

    /// Opens the root message
    pub fn root(&mut self) -> MessageBuilder<'_> {
        self.ctx.record(BuilderEvent::Open(self.kind));
        MessageBuilder {
            ctx: &mut self.ctx,
            parent: &mut self.payload,
            field: ROOT_FIELD,
            kind: self.kind,
            buf: Vec::new(),
            closed: false,
        }
    }

    /// Packs the payload into `d1` chunks of at most `max_chunk` characters
    #[must_use]
    pub fn finish(self, max_chunk: usize) -> EncodedPayload {
        EncodedPayload {
            data1: encode_bytes(&self.payload, max_chunk),
            data2: self.ctx.strings.into_strings(),
            journal: self.ctx.journal.unwrap_or_default(),
        }
    }
}

/// Builder of a single message.
#[must_use = "a message builder writes its message when closed"]
pub struct MessageBuilder<'a> {
    ctx: &'a mut EncodeContext,
    parent: &'a mut Vec<u8>,
    field: u32,
    kind: NodeKind,
    buf: Vec<u8>,
    closed: bool,
}

impl MessageBuilder<'_> {
    /// Returns the kind of message being built
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Opens a nested message of `kind` at `field`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ModelInvariant`] if this message does not hold a `kind`
    /// message at `field`.
    pub fn child(&mut self, field: u32, kind: NodeKind) -> Result<MessageBuilder<'_>> {
        if schema::child_kind(self.kind, field) != Some(kind) {
            return Err(Error::ModelInvariant(format!(
                "{:?} does not hold a {:?} at field {}",
                self.kind, kind, field
            )));
        }

        self.ctx.record(BuilderEvent::Open(kind));
        Ok(MessageBuilder {
            ctx: &mut *self.ctx,
            parent: &mut self.buf,
            field,
            kind,
            buf: Vec::new(),
            closed: false,
        })
    }

    /// Writes an unsigned varint field
    pub fn varint(&mut self, field: u32, value: u64) {
        write_key(&mut self.buf, field, WIRE_VARINT);
        write_varint(&mut self.buf, value);
    }

    /// Writes a 32-bit unsigned field, such as a flag word
    pub fn uint(&mut self, field: u32, value: u32) {
        self.varint(field, u64::from(value));
    }

    /// Writes a zig-zag encoded signed field
    pub fn sint(&mut self, field: u32, value: i64) {
        self.varint(field, zigzag_encode(value));
    }

    /// Writes a boolean field
    pub fn bool(&mut self, field: u32, value: bool) {
        self.varint(field, u64::from(value));
    }

    /// Interns `value` and writes its string table index
    pub fn string(&mut self, field: u32, value: &str) {
        let index = self.ctx.strings.intern(value);
        self.uint(field, index);
    }

    /// Adds an entry to the journal, if recording
    pub fn note(&mut self, event: BuilderEvent) {
        self.ctx.record(event);
    }

    /// Finishes the message and appends it to the parent
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let buf = std::mem::take(&mut self.buf);
        if self.field == ROOT_FIELD {
            self.parent.extend_from_slice(&buf);
        } else {
            write_key(self.parent, self.field, WIRE_LENGTH_DELIMITED);
            write_varint(self.parent, buf.len() as u64);
            self.parent.extend_from_slice(&buf);
        }
        self.ctx.record(BuilderEvent::Close(self.kind));
    }
}

impl Drop for MessageBuilder<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{
        bitencoding::decode_bytes,
        parser::Parser,
        schema::{CLASS, FUNCTION, PACKAGE, TYPE},
    };

    #[test]
    fn nested_messages_are_length_prefixed() {
        let mut root = RootBuilder::package(false);
        {
            let mut package = root.root();
            let mut function = package.child(PACKAGE::FUNCTION, NodeKind::Function).unwrap();
            function.uint(FUNCTION::FLAGS, 6);
            function.close();
            package.close();
        }
        let payload = root.finish(100);
        let bytes = decode_bytes(&payload.data1).unwrap();
        assert_eq!(bytes, vec![0x0A, 0x02, 0x08, 0x06]);
    }

    #[test]
    fn wrong_child_kind_is_an_invariant_violation() {
        let mut root = RootBuilder::class(false);
        let mut class = root.root();
        assert!(matches!(
            class.child(CLASS::FUNCTION, NodeKind::Property),
            Err(Error::ModelInvariant(_))
        ));
        assert!(class.child(CLASS::FLAGS, NodeKind::Type).is_err());
    }

    #[test]
    fn journal_pairs_every_open_with_a_close() {
        let mut root = RootBuilder::class(true);
        {
            let mut class = root.root();
            {
                let mut supertype = class.child(CLASS::SUPERTYPE, NodeKind::Type).unwrap();
                supertype.string(TYPE::CLASS_NAME, "kotlin/Any");
                // closed by scope exit
            }
            class.close();
        }
        let payload = root.finish(100);
        assert_eq!(
            payload.journal,
            vec![
                BuilderEvent::Open(NodeKind::Class),
                BuilderEvent::Open(NodeKind::Type),
                BuilderEvent::Close(NodeKind::Type),
                BuilderEvent::Close(NodeKind::Class),
            ]
        );
    }

    #[test]
    fn strings_are_shared_across_messages() {
        let mut root = RootBuilder::class(false);
        {
            let mut class = root.root();
            class.string(CLASS::FQ_NAME, "a/A");
            let mut supertype = class.child(CLASS::SUPERTYPE, NodeKind::Type).unwrap();
            supertype.string(TYPE::CLASS_NAME, "a/A");
            supertype.close();
            class.close();
        }
        let payload = root.finish(100);
        assert_eq!(payload.data2, vec!["a/A".to_string()]);

        let bytes = decode_bytes(&payload.data1).unwrap();
        let mut parser = Parser::new(&bytes);
        assert_eq!(parser.read_field().unwrap().varint().unwrap(), 0);
        let nested = parser.read_field().unwrap().bytes().unwrap();
        assert_eq!(nested, &[0x10, 0x00]);
    }

    #[test]
    fn empty_payload_produces_no_chunks() {
        let mut root = RootBuilder::lambda(false);
        root.root().close();
        let payload = root.finish(100);
        assert!(payload.data1.is_empty());
        assert!(payload.data2.is_empty());
    }
}
