//! Constant pool compaction.
//!
//! Embedding always allocates fresh constants, so after a rewrite the pool holds the
//! entries of the previous metadata that nothing refers to any longer. [`compact`]
//! removes every unreferenced entry and renumbers the rest, preserving their relative
//! order, then rewrites all indices held by the class.
//!
//! Compaction works in three passes:
//!
//! 1. mark every entry referenced from the class, then entries referenced by marked
//!    entries
//! 2. assign new indices to marked entries in pool order
//! 3. rewrite indices inside the pool and throughout the class
//!
//! A class holding an index that does not resolve is rejected before anything is
//! changed.

use std::collections::HashMap;

use crate::{
    classfile::{
        class::ProgramClass,
        constant_pool::{Constant, ConstantPool},
    },
    Error, Result,
};

/// Maps old constant pool indices to new ones.
#[derive(Debug, Clone, Default)]
pub struct IndexRemapper {
    map: HashMap<u16, u16>,
}

impl IndexRemapper {
    /// Returns the new index of the entry formerly at `index`, `None` if it was removed
    #[must_use]
    pub fn map_index(&self, index: u16) -> Option<u16> {
        self.map.get(&index).copied()
    }

    /// Number of entries that were kept
    #[must_use]
    pub fn kept(&self) -> usize {
        self.map.len()
    }
}

/// Removes unreferenced entries from the constant pool of `class`.
///
/// Returns the number of removed entries.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidConstantIndex`] if the class holds an index that
/// does not refer to a pool entry; the class is left unchanged in that case.
pub fn compact(class: &mut ProgramClass) -> Result<usize> {
    let live = mark(class)?;
    let remapper = build_remapper(&class.constant_pool, &live);
    let removed = class.constant_pool.len() - remapper.kept();
    if removed == 0 {
        return Ok(0);
    }

    let mut entries = vec![None; remapper.kept() + 1];
    for (index, constant) in class.constant_pool.iter() {
        let Some(new_index) = remapper.map_index(index) else {
            continue;
        };
        let mut constant = constant.clone();
        match &mut constant {
            Constant::Class { name_index } => *name_index = remap(&remapper, *name_index),
            Constant::String { string_index } => *string_index = remap(&remapper, *string_index),
            Constant::Utf8(_) | Constant::Integer(_) => {}
        }
        entries[usize::from(new_index)] = Some(constant);
    }
    class.constant_pool.replace_entries(entries);
    class.for_each_index_mut(&mut |index| *index = remap(&remapper, *index));

    Ok(removed)
}

fn mark(class: &mut ProgramClass) -> Result<Vec<bool>> {
    let mut live = vec![false; class.constant_pool.count()];
    let mut invalid = None;

    let pool = class.constant_pool.clone();
    class.for_each_index_mut(&mut |index| {
        if pool.get(*index).is_some() {
            live[usize::from(*index)] = true;
        } else {
            invalid.get_or_insert(*index);
        }
    });
    if let Some(index) = invalid {
        return Err(Error::InvalidConstantIndex(index));
    }

    // Class and String entries only refer to Utf8 entries, one pass reaches them all
    for (index, constant) in pool.iter() {
        if !live[usize::from(index)] {
            continue;
        }
        if let Some(target) = constant.references() {
            if pool.get(target).is_none() {
                return Err(Error::InvalidConstantIndex(target));
            }
            live[usize::from(target)] = true;
        }
    }

    Ok(live)
}

fn build_remapper(pool: &ConstantPool, live: &[bool]) -> IndexRemapper {
    let mut remapper = IndexRemapper::default();
    let mut next = 1u16;
    for (index, _) in pool.iter() {
        if live[usize::from(index)] {
            remapper.map.insert(index, next);
            next += 1;
        }
    }
    remapper
}

fn remap(remapper: &IndexRemapper, index: u16) -> u16 {
    // marked entries are always mapped
    remapper.map_index(index).unwrap_or(index)
}
