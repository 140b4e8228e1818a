//! Writer configuration
//!
//! This module provides the options that steer how Kotlin metadata is transcribed
//! and embedded into class files.

use crate::classfile::constant_pool::MAX_UTF8_LENGTH;

/// Smallest usable `d1` chunk, one `U+0000` in class file UTF-8
const MIN_STRING_CHUNK: usize = 2;

/// Configuration for writing Kotlin metadata
///
/// The round-trip guard and the holder validation always run and cannot be
/// disabled here; the options only control the optional post-processing, the
/// limits applied to recursive nodes, and inspection aids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Remove constant pool entries that are no longer referenced after a write
    pub compact_constant_pool: bool,

    /// Maximum nesting depth for recursive types and effect expressions (default: 64)
    pub max_type_depth: usize,

    /// Maximum size of a `d1` string chunk in class file UTF-8 bytes (default: 65535)
    ///
    /// A class file UTF-8 constant cannot hold more than 65535 bytes.
    pub max_string_chunk: usize,

    /// Record builder lifecycle events while transcribing
    pub record_journal: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compact_constant_pool: true,
            max_type_depth: 64,
            max_string_chunk: 65535,
            record_journal: false,
        }
    }
}

impl WriterConfig {
    /// Creates a configuration that writes the metadata and nothing else
    ///
    /// Stale constant pool entries are left in place.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            compact_constant_pool: false,
            ..Self::default()
        }
    }

    /// Creates a configuration that records the builder journal
    ///
    /// Intended for tests and for tracking down malformed node models.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            record_journal: true,
            ..Self::default()
        }
    }

    /// Sets whether the constant pool is compacted after a successful write
    #[must_use]
    pub fn with_compaction(mut self, enabled: bool) -> Self {
        self.compact_constant_pool = enabled;
        self
    }

    /// Sets the nesting limit for recursive nodes
    #[must_use]
    pub fn with_max_type_depth(mut self, depth: usize) -> Self {
        self.max_type_depth = depth;
        self
    }

    /// Sets the maximum length of a `d1` chunk, see [`WriterConfig::string_chunk_limit`]
    #[must_use]
    pub fn with_max_string_chunk(mut self, chunk: usize) -> Self {
        self.max_string_chunk = Self::clamp_string_chunk(chunk);
        self
    }

    /// Returns the effective `d1` chunk limit.
    ///
    /// The configured value is clamped to `2..=65535`: a chunk must hold at least one
    /// `U+0000`, which takes two bytes, and must fit a single UTF-8 constant.
    #[must_use]
    pub fn string_chunk_limit(&self) -> usize {
        Self::clamp_string_chunk(self.max_string_chunk)
    }

    fn clamp_string_chunk(chunk: usize) -> usize {
        chunk.clamp(MIN_STRING_CHUNK, MAX_UTF8_LENGTH)
    }

    /// Sets whether builder lifecycle events are recorded
    #[must_use]
    pub fn with_journal(mut self, enabled: bool) -> Self {
        self.record_journal = enabled;
        self
    }
}
