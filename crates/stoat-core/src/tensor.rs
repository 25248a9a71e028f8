use std::fmt;

use crate::block::TensorBlock;
use crate::error::{Error, Result};
use crate::labels::{Labels, LabelsEntry};

// TensorMap — The top-level data structure
//
// A TensorMap is a set of TensorBlocks indexed by a key set: one block per
// key entry, in the same order. Keys typically encode sparsity (e.g. which
// pair of chemical species a block describes), so operations can skip work
// for absent keys entirely.
//
// The map itself is a thin container: all numeric data lives in the blocks.
// Like the rest of the data model it is immutable after construction;
// operations return new maps sharing block storage where possible.

/// A set of labeled blocks indexed by a key set.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorMap {
    keys: Labels,
    blocks: Vec<TensorBlock>,
}

impl TensorMap {
    /// Create a tensor map from keys and one block per key entry.
    pub fn new(keys: Labels, blocks: Vec<TensorBlock>) -> Result<Self> {
        if keys.count() != blocks.len() {
            return Err(Error::BlockCountMismatch {
                keys: keys.count(),
                blocks: blocks.len(),
            });
        }
        Ok(TensorMap { keys, blocks })
    }

    /// The key set.
    pub fn keys(&self) -> &Labels {
        &self.keys
    }

    /// All blocks, in key order.
    pub fn blocks(&self) -> &[TensorBlock] {
        &self.blocks
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The block at the given index.
    pub fn block_by_id(&self, index: usize) -> Result<&TensorBlock> {
        self.blocks.get(index).ok_or(Error::BlockOutOfRange {
            index,
            count: self.blocks.len(),
        })
    }

    /// The block for the given key entry, if present.
    pub fn block_by_key(&self, key: &[i32]) -> Option<&TensorBlock> {
        self.keys.position(key).map(|i| &self.blocks[i])
    }

    /// Iterate over (key entry, block) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (LabelsEntry<'_>, &TensorBlock)> {
        self.keys.iter().zip(self.blocks.iter())
    }

    // Gradient tracking

    /// A map whose every block (and gradient block) has the tracking flag
    /// set to `flag`. Keys, labels and value storage are shared.
    pub fn tracked(&self, flag: bool) -> Self {
        TensorMap {
            keys: self.keys.clone(),
            blocks: self.blocks.iter().map(|b| b.tracked(flag)).collect(),
        }
    }

    /// A detached map: same data, no gradient tracking anywhere.
    pub fn detach(&self) -> Self {
        self.tracked(false)
    }
}

impl fmt::Display for TensorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TensorMap with {} blocks, keys: {}",
            self.blocks.len(),
            self.keys
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DenseArray;

    fn simple_block(fill: f64) -> TensorBlock {
        let values = DenseArray::from_vec(vec![fill; 6], vec![2, 3]).unwrap();
        let samples = Labels::new(["sample"], vec![0, 1]).unwrap();
        let properties = Labels::new(["property"], vec![0, 1, 2]).unwrap();
        TensorBlock::new(values, samples, vec![], properties).unwrap()
    }

    #[test]
    fn test_block_count_checked() {
        let keys = Labels::new(["key"], vec![0, 1]).unwrap();
        let result = TensorMap::new(keys, vec![simple_block(1.0)]);
        assert!(matches!(
            result,
            Err(Error::BlockCountMismatch { keys: 2, blocks: 1 })
        ));
    }

    #[test]
    fn test_lookup() {
        let keys = Labels::new(["key"], vec![3, 7]).unwrap();
        let map = TensorMap::new(keys, vec![simple_block(1.0), simple_block(2.0)]).unwrap();

        assert_eq!(map.block_count(), 2);
        assert_eq!(map.block_by_key(&[7]).unwrap().values().data()[0], 2.0);
        assert!(map.block_by_key(&[4]).is_none());
        assert!(matches!(
            map.block_by_id(2),
            Err(Error::BlockOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_iter_pairs_keys_with_blocks() {
        let keys = Labels::new(["key"], vec![0, 1]).unwrap();
        let map = TensorMap::new(keys, vec![simple_block(1.0), simple_block(2.0)]).unwrap();

        let collected: Vec<_> = map
            .iter()
            .map(|(key, block)| (key.values()[0], block.values().data()[0]))
            .collect();
        assert_eq!(collected, vec![(0, 1.0), (1, 2.0)]);
    }

    #[test]
    fn test_tracked_applies_to_all_blocks() {
        let keys = Labels::new(["key"], vec![0, 1]).unwrap();
        let map = TensorMap::new(keys, vec![simple_block(1.0), simple_block(2.0)]).unwrap();

        let tracked = map.tracked(true);
        assert!(tracked.blocks().iter().all(|b| b.values().requires_grad()));

        let detached = tracked.detach();
        assert!(detached.blocks().iter().all(|b| !b.values().requires_grad()));
    }
}
