//! The string table stored in `d2`.
//!
//! The payload never embeds text directly. Every name, signature or message is
//! interned once in a [`StringTable`] and referred to by its index; the final table
//! becomes the `d2` array of the holder. Interning deduplicates, so a name used many
//! times costs a single `d2` entry.

use std::collections::HashMap;

use crate::Result;

/// Append-only string table used while encoding.
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringTable {
    /// Creates an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `value`, appending it if it is not yet present
    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(&existing) = self.index.get(value) {
            return existing;
        }

        let next = u32::try_from(self.strings.len()).unwrap_or(u32::MAX);
        self.strings.push(value.to_string());
        self.index.insert(value.to_string(), next);
        next
    }

    /// Number of distinct strings
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if nothing has been interned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Consumes the table, returning the strings in index order
    #[must_use]
    pub fn into_strings(self) -> Vec<String> {
        self.strings
    }
}

/// Read access to a decoded string table.
#[derive(Debug, Clone, Copy)]
pub struct Strings<'a> {
    strings: &'a [String],
}

impl<'a> Strings<'a> {
    /// Wraps the `d2` array of a holder
    #[must_use]
    pub fn new(strings: &'a [String]) -> Self {
        Strings { strings }
    }

    /// Looks up the string at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the index is past the end of the table.
    pub fn get(&self, index: u64) -> Result<&'a str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.strings.get(i))
            .map(String::as_str)
            .ok_or_else(|| {
                malformed_error!(
                    "String table index {} out of range ({} entries)",
                    index,
                    self.strings.len()
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut table = StringTable::new();
        assert_eq!(table.intern("kotlin/String"), 0);
        assert_eq!(table.intern("x"), 1);
        assert_eq!(table.intern("kotlin/String"), 0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.into_strings(), vec!["kotlin/String", "x"]);
    }

    #[test]
    fn lookup_checks_bounds() {
        let strings = vec!["a".to_string()];
        let view = Strings::new(&strings);
        assert_eq!(view.get(0).unwrap(), "a");
        assert!(view.get(1).is_err());
        assert!(view.get(u64::MAX).is_err());
    }
}
