use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

// Labels — Named integer metadata
//
// Labels describe what each row (or column) of a value array means.
// They are a small 2-D table of i32 values with one name per column:
//
//   names:  ["system", "atom"]
//   values: [[0, 0],
//            [0, 1],
//            [1, 0]]
//
// Each row is one entry; entries must be unique so they can serve as keys.
// A tensor map uses Labels three ways:
//
//   1. keys       — which block corresponds to which entry
//   2. samples    — what each row of a block's values describes
//   3. properties — what each column of a block's values describes
//
// Labels are immutable after construction. The entry table is shared via
// Arc, so cloning Labels is cheap and blocks can reuse the same metadata.

/// A set of named, unique integer tuples used as tensor-map metadata.
///
/// Construction validates that dimension names and entries are unique.
/// Entries can be looked up by position (`entry`) or by value (`position`).
#[derive(Debug, Clone)]
pub struct Labels {
    /// One name per dimension (column) of the entry table.
    names: Arc<Vec<String>>,
    /// Row-major entry table, `count() * size()` values.
    values: Arc<Vec<i32>>,
    /// Entry tuple → row index, for O(1) `position` lookups.
    positions: Arc<HashMap<Vec<i32>, usize>>,
}

impl Labels {
    /// Create labels from dimension names and a row-major value table.
    ///
    /// Fails with `InvalidParameter` if a dimension name repeats, if the
    /// value count is not a multiple of the dimension count, or if two
    /// entries are identical.
    pub fn new(
        names: impl IntoIterator<Item = impl Into<String>>,
        values: Vec<i32>,
    ) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(Error::invalid_parameter(format!(
                    "duplicate dimension name in labels: '{name}'"
                )));
            }
        }

        if names.is_empty() {
            if !values.is_empty() {
                return Err(Error::invalid_parameter(
                    "labels without dimensions can not have entries",
                ));
            }
            return Ok(Labels {
                names: Arc::new(names),
                values: Arc::new(values),
                positions: Arc::new(HashMap::new()),
            });
        }

        if values.len() % names.len() != 0 {
            return Err(Error::invalid_parameter(format!(
                "labels value count ({}) is not a multiple of the dimension count ({})",
                values.len(),
                names.len()
            )));
        }

        let mut positions = HashMap::new();
        for (i, entry) in values.chunks_exact(names.len()).enumerate() {
            if positions.insert(entry.to_vec(), i).is_some() {
                return Err(Error::invalid_parameter(format!(
                    "duplicate labels entry: {entry:?}"
                )));
            }
        }

        Ok(Labels {
            names: Arc::new(names),
            values: Arc::new(values),
            positions: Arc::new(positions),
        })
    }

    /// Labels with the given dimension names and no entries.
    pub fn empty(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        Labels::new(names, Vec::new())
    }

    /// Labels with a single dimension `"_"` and a single entry `[0]`.
    ///
    /// Used as the key set of a tensor map with exactly one block.
    pub fn single() -> Self {
        let mut positions = HashMap::new();
        positions.insert(vec![0], 0);
        Labels {
            names: Arc::new(vec!["_".to_string()]),
            values: Arc::new(vec![0]),
            positions: Arc::new(positions),
        }
    }

    /// Number of entries (rows).
    pub fn count(&self) -> usize {
        if self.names.is_empty() {
            0
        } else {
            self.values.len() / self.names.len()
        }
    }

    /// Number of dimensions (columns).
    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// The dimension names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The full row-major value table.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Borrowed view of the entry at `index`.
    pub fn entry(&self, index: usize) -> Result<LabelsEntry<'_>> {
        if index >= self.count() {
            return Err(Error::EntryOutOfRange {
                index,
                count: self.count(),
            });
        }
        let size = self.size();
        Ok(LabelsEntry {
            names: &self.names,
            values: &self.values[index * size..(index + 1) * size],
        })
    }

    /// Row index of the entry with the given values, if present.
    ///
    /// Returns `None` when the entry is absent or `entry` has the wrong
    /// number of values.
    pub fn position(&self, entry: &[i32]) -> Option<usize> {
        if entry.len() != self.size() {
            return None;
        }
        self.positions.get(entry).copied()
    }

    /// Whether the given entry is present.
    pub fn contains(&self, entry: &[i32]) -> bool {
        self.position(entry).is_some()
    }

    /// Iterate over all entries in order.
    pub fn iter(&self) -> impl Iterator<Item = LabelsEntry<'_>> {
        let size = self.size();
        self.values
            .chunks_exact(size.max(1))
            .take(self.count())
            .map(move |values| LabelsEntry {
                names: &self.names,
                values,
            })
    }
}

impl PartialEq for Labels {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names && self.values == other.values
    }
}

impl Eq for Labels {}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Labels[{}] with {} entries",
            self.names.join(", "),
            self.count()
        )
    }
}

/// Borrowed view of a single labels entry (one row of the table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelsEntry<'a> {
    names: &'a [String],
    values: &'a [i32],
}

impl<'a> LabelsEntry<'a> {
    /// The entry values, one per dimension.
    pub fn values(&self) -> &'a [i32] {
        self.values
    }

    /// The value for the dimension with the given name, if present.
    pub fn value(&self, name: &str) -> Option<i32> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }
}

impl fmt::Display for LabelsEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (name, value)) in self.names.iter().zip(self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let labels = Labels::new(["system", "atom"], vec![0, 0, 0, 1, 1, 0]).unwrap();
        assert_eq!(labels.count(), 3);
        assert_eq!(labels.size(), 2);
        assert_eq!(labels.names(), &["system", "atom"]);
        assert_eq!(labels.entry(1).unwrap().values(), &[0, 1]);
        assert_eq!(labels.entry(1).unwrap().value("atom"), Some(1));
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let result = Labels::new(["a"], vec![1, 2, 1]);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = Labels::new(["a", "a"], vec![0, 0]);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_position_lookup() {
        let labels = Labels::new(["key"], vec![3, 7, 11]).unwrap();
        assert_eq!(labels.position(&[7]), Some(1));
        assert_eq!(labels.position(&[5]), None);
        // wrong arity never matches
        assert_eq!(labels.position(&[7, 0]), None);
        assert!(labels.contains(&[11]));
    }

    #[test]
    fn test_empty_and_single() {
        let empty = Labels::empty(["sample"]).unwrap();
        assert_eq!(empty.count(), 0);
        assert_eq!(empty.size(), 1);

        let single = Labels::single();
        assert_eq!(single.count(), 1);
        assert_eq!(single.entry(0).unwrap().values(), &[0]);
    }

    #[test]
    fn test_entry_out_of_range() {
        let labels = Labels::new(["key"], vec![0]).unwrap();
        assert!(matches!(
            labels.entry(1),
            Err(Error::EntryOutOfRange { index: 1, count: 1 })
        ));
    }
}
