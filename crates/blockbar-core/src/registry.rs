//! Ordered block registry
//!
//! Blocks live in an arena and are addressed by [`BlockId`]. The first
//! slot always holds the textless head block created with the bar, so
//! the registry is never empty.

use crate::attrs::AttributeMap;
use crate::block::Block;

/// Stable index of a block in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct BlockRegistry {
    blocks: Vec<Block>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Creates a registry holding only the head block.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::default()],
        }
    }

    /// Appends a block built from one configuration section.
    pub fn append(&mut self, config: AttributeMap) -> BlockId {
        self.blocks.push(Block::new(config));
        BlockId(self.blocks.len() - 1)
    }

    /// Finds the first block whose `(name, instance)` pair matches exactly.
    ///
    /// Missing attributes compare as empty strings, so several anonymous
    /// blocks share one identity and only the first of them is found.
    pub fn find(&self, name: &str, instance: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|block| block.name() == name && block.instance() == instance)
            .map(BlockId)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.0)
    }

    /// Iterates blocks in display order, head first.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId)
    }

    /// Number of blocks, head included. Never zero.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
