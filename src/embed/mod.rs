//! Writing metadata back into class files.
//!
//! [`KotlinMetadataWriter`] is the per-container entry point. For one class and its
//! [`KotlinMetadata`] it
//!
//! 1. transcribes the metadata into a wire tuple with [`MetadataWriter`]
//! 2. decodes that tuple again and skips the container if decoding fails
//! 3. locates and validates every `kotlin.Metadata` holder
//! 4. writes the tuple into a staged copy of the constant pool and holders, then
//!    commits the copy
//! 5. compacts the constant pool and runs the auxiliary visitor, if any
//!
//! Nothing is written until every check has passed, so a skipped container keeps its
//! original metadata byte for byte. Every skip records exactly one diagnostic naming
//! the container.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use kmetadata::{
//!     classfile::ProgramClass,
//!     config::WriterConfig,
//!     diagnostics::Diagnostics,
//!     embed::{holder::attach_metadata_holder, KotlinMetadataWriter, WriteOutcome},
//!     model::{KotlinMetadata, Package},
//!     wire::MetadataHeader,
//! };
//!
//! let mut class = ProgramClass::new("a/MainKt")?;
//! attach_metadata_holder(&mut class, &MetadataHeader::default())?;
//!
//! let diagnostics = Arc::new(Diagnostics::new());
//! let writer = KotlinMetadataWriter::new(WriterConfig::default(), diagnostics.clone());
//! let outcome = writer.process_container(&mut class, &KotlinMetadata::file_facade(Package::default()));
//!
//! assert_eq!(outcome, WriteOutcome::Written);
//! assert_eq!(diagnostics.count(), 0);
//! # Ok::<(), kmetadata::Error>(())
//! ```

pub mod holder;

use std::{fmt, sync::Arc};

use rayon::prelude::*;
use tracing::{debug, debug_span, error, warn};

use crate::{
    classfile::{shrinker, ClassVisitor, ProgramClass},
    config::WriterConfig,
    diagnostics::{DiagnosticCategory, Diagnostics},
    model::KotlinMetadata,
    wire::decode,
    writer::MetadataWriter,
    Error,
};

use holder::{validate_holder, write_holder, METADATA_DESCRIPTOR};

/// What happened to one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The metadata was written
    Written,
    /// The freshly written wire tuple did not decode
    SkippedCorrupt,
    /// The holder has unknown, repeated or misshapen elements
    SkippedHolderMismatch,
    /// The class carries no `kotlin.Metadata` annotation
    SkippedNoHolder,
    /// The constant pool cannot take the new constants
    SkippedPoolOverflow,
    /// The node model cannot be written; the message names the violation
    ModelInvariantViolation(String),
}

impl WriteOutcome {
    /// Returns true if the metadata was written
    #[must_use]
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written)
    }

    /// Returns true if the outcome points at a bug in the producer of the model
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, WriteOutcome::ModelInvariantViolation(_))
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOutcome::Written => write!(f, "written"),
            WriteOutcome::SkippedCorrupt => write!(f, "skipped, corrupt metadata"),
            WriteOutcome::SkippedHolderMismatch => write!(f, "skipped, holder mismatch"),
            WriteOutcome::SkippedNoHolder => write!(f, "skipped, no holder"),
            WriteOutcome::SkippedPoolOverflow => write!(f, "skipped, constant pool overflow"),
            WriteOutcome::ModelInvariantViolation(message) => {
                write!(f, "model invariant violated: {message}")
            }
        }
    }
}

/// Writes Kotlin metadata into class files, one container at a time.
///
/// The writer keeps no state between containers. Clones share the diagnostics sink
/// and the auxiliary visitor.
#[derive(Clone)]
pub struct KotlinMetadataWriter {
    writer: MetadataWriter,
    diagnostics: Arc<Diagnostics>,
    auxiliary: Option<Arc<dyn ClassVisitor + Send + Sync>>,
}

impl fmt::Debug for KotlinMetadataWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KotlinMetadataWriter")
            .field("writer", &self.writer)
            .field("diagnostics", &self.diagnostics.count())
            .field("auxiliary", &self.auxiliary.is_some())
            .finish()
    }
}

impl KotlinMetadataWriter {
    /// Creates a writer reporting into `diagnostics`
    #[must_use]
    pub fn new(config: WriterConfig, diagnostics: Arc<Diagnostics>) -> Self {
        KotlinMetadataWriter {
            writer: MetadataWriter::new(config),
            diagnostics,
            auxiliary: None,
        }
    }

    /// Sets a visitor run on every class whose metadata was written
    #[must_use]
    pub fn with_auxiliary_visitor(
        mut self,
        visitor: impl ClassVisitor + Send + Sync + 'static,
    ) -> Self {
        self.auxiliary = Some(Arc::new(visitor));
        self
    }

    /// Returns the diagnostics sink
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Returns the configuration
    #[must_use]
    pub fn config(&self) -> &WriterConfig {
        self.writer.config()
    }

    /// Writes `metadata` into every `kotlin.Metadata` holder of `class`.
    ///
    /// All holders are validated first and staged together, so either every holder
    /// is rewritten or none is.
    ///
    /// Never fails: problems are reported through the returned outcome and one
    /// diagnostic, and leave `class` unchanged.
    pub fn process_container(
        &self,
        class: &mut ProgramClass,
        metadata: &KotlinMetadata,
    ) -> WriteOutcome {
        let container = class
            .name()
            .map_or_else(|_| format!("#{}", class.this_class), str::to_string);
        let span = debug_span!("process_container", container = %container);
        let _enter = span.enter();

        let output = match self.writer.write(metadata) {
            Ok(output) => output,
            Err(e) => {
                let message = e.to_string();
                error!(%message, "metadata model cannot be written");
                self.diagnostics
                    .error_for(DiagnosticCategory::Model, &container, message.clone());
                return WriteOutcome::ModelInvariantViolation(message);
            }
        };

        if let Err(e) = decode(&output.header) {
            return self.skip(
                &container,
                DiagnosticCategory::Metadata,
                format!("written metadata does not decode: {e}"),
                WriteOutcome::SkippedCorrupt,
            );
        }

        let mut holders = Vec::new();
        class.for_each_annotation_of_type(METADATA_DESCRIPTOR, |location, annotation| {
            holders.push((location, annotation.clone()));
        });
        if holders.is_empty() {
            return self.skip(
                &container,
                DiagnosticCategory::Holder,
                "no kotlin.Metadata annotation".to_string(),
                WriteOutcome::SkippedNoHolder,
            );
        }

        // every holder is checked before any of them is staged
        let mut layouts = Vec::with_capacity(holders.len());
        for (_, annotation) in &holders {
            match validate_holder(annotation, &class.constant_pool) {
                Ok(layout) => layouts.push(layout),
                Err(e) => {
                    return self.skip(
                        &container,
                        DiagnosticCategory::Holder,
                        e.to_string(),
                        WriteOutcome::SkippedHolderMismatch,
                    )
                }
            }
        }

        let mut pool = class.constant_pool.clone();
        for ((_, staged), layout) in holders.iter_mut().zip(&layouts) {
            if let Err(e) = write_holder(&mut pool, staged, layout, &output.header) {
                let outcome = match e {
                    Error::ConstantPoolOverflow | Error::ConstantTooLong(_) => {
                        WriteOutcome::SkippedPoolOverflow
                    }
                    _ => WriteOutcome::SkippedHolderMismatch,
                };
                return self.skip(
                    &container,
                    DiagnosticCategory::ConstantPool,
                    e.to_string(),
                    outcome,
                );
            }
        }

        class.constant_pool = pool;
        let holder_count = holders.len();
        for (location, staged) in holders {
            if let Some(annotation) = class.annotation_mut(location) {
                *annotation = staged;
            }
        }
        debug!(
            kind = output.header.kind,
            holders = holder_count,
            constants = class.constant_pool.len(),
            "metadata written"
        );

        if self.writer.config().compact_constant_pool {
            match shrinker::compact(class) {
                Ok(removed) => debug!(removed, "constant pool compacted"),
                Err(e) => {
                    warn!(error = %e, "constant pool left uncompacted");
                    self.diagnostics.info(
                        DiagnosticCategory::ConstantPool,
                        format!("{container}: constant pool left uncompacted: {e}"),
                    );
                }
            }
        }

        if let Some(visitor) = &self.auxiliary {
            visitor.visit_program_class(class);
        }

        WriteOutcome::Written
    }

    /// Processes containers one after another, in order.
    pub fn process_all<'a, I>(&self, containers: I) -> Vec<WriteOutcome>
    where
        I: IntoIterator<Item = (&'a mut ProgramClass, &'a KotlinMetadata)>,
    {
        containers
            .into_iter()
            .map(|(class, metadata)| self.process_container(class, metadata))
            .collect()
    }

    /// Processes containers on the rayon thread pool.
    ///
    /// Every worker uses its own writer; all of them report into the shared
    /// diagnostics sink. Outcomes are returned in input order.
    pub fn process_parallel(
        &self,
        containers: &mut [(ProgramClass, KotlinMetadata)],
    ) -> Vec<WriteOutcome> {
        containers
            .par_iter_mut()
            .map_init(
                || self.clone(),
                |writer, (class, metadata)| writer.process_container(class, metadata),
            )
            .collect()
    }

    fn skip(
        &self,
        container: &str,
        category: DiagnosticCategory,
        message: String,
        outcome: WriteOutcome,
    ) -> WriteOutcome {
        warn!(%message, "{}", outcome);
        self.diagnostics.warning_for(category, container, message);
        outcome
    }
}
