//! The constant pool of a class file.
//!
//! Entries are addressed by 1-based 16-bit indices; index 0 is never valid. The pool
//! only ever grows while metadata is embedded: every call to
//! [`ConstantPool::add_integer_constant`] or [`ConstantPool::add_utf8_constant`]
//! appends a fresh entry, even if an equal constant already exists. Entries that lose
//! their last reference are dropped later by [`crate::classfile::shrinker::compact`].
//!
//! # Examples
//!
//! ```rust
//! use kmetadata::classfile::ConstantPool;
//!
//! let mut pool = ConstantPool::new();
//! let a = pool.add_utf8_constant("kotlin/Metadata")?;
//! let b = pool.add_utf8_constant("kotlin/Metadata")?;
//! assert_ne!(a, b);
//! assert_eq!(pool.utf8(a)?, "kotlin/Metadata");
//! # Ok::<(), kmetadata::Error>(())
//! ```

use crate::{Error, Result};

/// Highest valid constant pool index, `constant_pool_count` is a `u16`
pub const MAX_CONSTANT_INDEX: u16 = u16::MAX - 1;

/// Maximum length of a `CONSTANT_Utf8` entry in class file UTF-8 bytes
pub const MAX_UTF8_LENGTH: usize = u16::MAX as usize;

/// Returns the length of `value` in the modified UTF-8 form class files use.
///
/// `U+0000` takes two bytes and characters outside the BMP are stored as two
/// three-byte surrogates.
#[must_use]
pub fn modified_utf8_len(value: &str) -> usize {
    value
        .chars()
        .map(|ch| match u32::from(ch) {
            0 => 2,
            0x01..=0x7F => 1,
            0x80..=0x7FF => 2,
            0x800..=0xFFFF => 3,
            _ => 6,
        })
        .sum()
}

/// A single constant pool entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// `CONSTANT_Utf8`
    Utf8(String),
    /// `CONSTANT_Integer`
    Integer(i32),
    /// `CONSTANT_Class`, naming a class through a UTF-8 entry
    Class {
        /// Index of the class name
        name_index: u16,
    },
    /// `CONSTANT_String`, a string literal through a UTF-8 entry
    String {
        /// Index of the string value
        string_index: u16,
    },
}

impl Constant {
    /// Indices of other entries this entry refers to
    #[must_use]
    pub fn references(&self) -> Option<u16> {
        match self {
            Constant::Class { name_index } => Some(*name_index),
            Constant::String { string_index } => Some(*string_index),
            Constant::Utf8(_) | Constant::Integer(_) => None,
        }
    }
}

/// The constant pool of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    /// Slot 0 is always `None`
    entries: Vec<Option<Constant>>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    /// Creates an empty pool
    #[must_use]
    pub fn new() -> Self {
        ConstantPool {
            entries: vec![None],
        }
    }

    /// Returns the `constant_pool_count` value, one more than the highest index
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    /// Returns true if the pool holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entry at `index`, if any
    #[must_use]
    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.entries.get(usize::from(index)).and_then(Option::as_ref)
    }

    /// Returns the string at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConstantIndex`] if `index` does not refer to a
    /// `CONSTANT_Utf8` entry.
    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index) {
            Some(Constant::Utf8(value)) => Ok(value),
            _ => Err(Error::InvalidConstantIndex(index)),
        }
    }

    /// Returns the integer at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConstantIndex`] if `index` does not refer to a
    /// `CONSTANT_Integer` entry.
    pub fn integer(&self, index: u16) -> Result<i32> {
        match self.get(index) {
            Some(Constant::Integer(value)) => Ok(*value),
            _ => Err(Error::InvalidConstantIndex(index)),
        }
    }

    /// Returns the class name behind the `CONSTANT_Class` entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConstantIndex`] if `index` or the name it refers
    /// to has the wrong kind.
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(Error::InvalidConstantIndex(index)),
        }
    }

    /// Returns the index of the first `CONSTANT_Utf8` entry equal to `value`
    #[must_use]
    pub fn find_utf8(&self, value: &str) -> Option<u16> {
        self.iter().find_map(|(index, constant)| match constant {
            Constant::Utf8(existing) if existing == value => Some(index),
            _ => None,
        })
    }

    /// Appends a `CONSTANT_Integer` entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the pool is full.
    pub fn add_integer_constant(&mut self, value: i32) -> Result<u16> {
        self.push(Constant::Integer(value))
    }

    /// Appends a `CONSTANT_Utf8` entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConstantTooLong`] if `value` takes more than
    /// [`MAX_UTF8_LENGTH`] bytes in class file form, or
    /// [`crate::Error::ConstantPoolOverflow`] if the pool is full.
    pub fn add_utf8_constant(&mut self, value: &str) -> Result<u16> {
        let length = modified_utf8_len(value);
        if length > MAX_UTF8_LENGTH {
            return Err(Error::ConstantTooLong(length));
        }
        self.push(Constant::Utf8(value.to_string()))
    }

    /// Appends a `CONSTANT_Class` entry together with its name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the pool is full.
    pub fn add_class_constant(&mut self, name: &str) -> Result<u16> {
        let name_index = self.add_utf8_constant(name)?;
        self.push(Constant::Class { name_index })
    }

    /// Appends `constant` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the pool is full.
    pub fn push(&mut self, constant: Constant) -> Result<u16> {
        let index = u16::try_from(self.entries.len()).map_err(|_| Error::ConstantPoolOverflow)?;
        if index > MAX_CONSTANT_INDEX {
            return Err(Error::ConstantPoolOverflow);
        }
        self.entries.push(Some(constant));
        Ok(index)
    }

    /// Iterates over all entries with their indices
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let constant = entry.as_ref()?;
                Some((u16::try_from(index).ok()?, constant))
            })
    }

    /// Replaces the entries of this pool, used when compacting
    pub(crate) fn replace_entries(&mut self, entries: Vec<Option<Constant>>) {
        self.entries = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_zero_is_invalid() {
        let pool = ConstantPool::new();
        assert!(pool.get(0).is_none());
        assert!(matches!(pool.utf8(0), Err(Error::InvalidConstantIndex(0))));
        assert!(pool.is_empty());
        assert_eq!(pool.count(), 1);
    }

    #[test]
    fn kinds_are_checked() {
        let mut pool = ConstantPool::new();
        let number = pool.add_integer_constant(7).unwrap();
        let class = pool.add_class_constant("a/B").unwrap();
        assert_eq!(pool.integer(number).unwrap(), 7);
        assert!(pool.utf8(number).is_err());
        assert_eq!(pool.class_name(class).unwrap(), "a/B");
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn constants_are_never_shared() {
        let mut pool = ConstantPool::new();
        let first = pool.add_integer_constant(1).unwrap();
        let second = pool.add_integer_constant(1).unwrap();
        assert_eq!((first, second), (1, 2));
        assert_eq!(pool.find_utf8("x"), None);
    }

    #[test]
    fn overflow() {
        let mut pool = ConstantPool::new();
        for i in 0..i32::from(MAX_CONSTANT_INDEX) {
            pool.add_integer_constant(i).unwrap();
        }
        assert_eq!(pool.len(), usize::from(MAX_CONSTANT_INDEX));
        assert!(matches!(
            pool.add_integer_constant(0),
            Err(Error::ConstantPoolOverflow)
        ));
    }

    #[test]
    fn modified_utf8_lengths() {
        assert_eq!(modified_utf8_len("abc"), 3);
        assert_eq!(modified_utf8_len("\u{0}"), 2);
        assert_eq!(modified_utf8_len("\u{e9}"), 2);
        assert_eq!(modified_utf8_len("\u{20ac}"), 3);
        assert_eq!(modified_utf8_len("\u{1f600}"), 6);
    }

    #[test]
    fn oversized_strings_are_rejected() {
        let mut pool = ConstantPool::new();
        let fits = "a".repeat(MAX_UTF8_LENGTH);
        assert!(pool.add_utf8_constant(&fits).is_ok());

        // each NUL takes two bytes, so half the characters already fill the limit
        let nuls = "\u{0}".repeat(MAX_UTF8_LENGTH / 2 + 1);
        assert!(matches!(
            pool.add_utf8_constant(&nuls),
            Err(Error::ConstantTooLong(65536))
        ));
        assert!(matches!(
            pool.add_utf8_constant(&"b".repeat(MAX_UTF8_LENGTH + 1)),
            Err(Error::ConstantTooLong(_))
        ));
        assert_eq!(pool.len(), 1);
    }
}
