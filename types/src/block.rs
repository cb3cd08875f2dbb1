use im::{HashMap, OrdMap, Vector};
use serde::{Deserialize, Serialize};

use crate::primitives::{ChainName, Digest, Number};

/// A validated block as seen by the chain graph.
///
/// Direct parents are blocks on other chains that this block has been confirmed by.
/// They are kept in ascending order of their block numbers, so the first one is the earliest.
/// Every direct parent has an entry in `parent_block_numbers`.
///
/// Blocks are never modified in place. Methods that change parents return a new [`Block`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(from = "BlockParts", into = "BlockParts")]
pub struct Block {
    block_hash: Digest,
    next_difficulty: Digest,
    direct_parents: Vector<Digest>,
    parent_block_numbers: HashMap<Digest, Number>,
    child_block_confirmations: OrdMap<ChainName, Digest>,
}

impl Block {
    #[must_use]
    pub fn new(
        block_hash: Digest,
        next_difficulty: Digest,
        parents: impl IntoIterator<Item = (Digest, Number)>,
        child_block_confirmations: impl IntoIterator<Item = (ChainName, Digest)>,
    ) -> Self {
        let mut block = Self {
            block_hash,
            next_difficulty,
            direct_parents: Vector::new(),
            parent_block_numbers: HashMap::new(),
            child_block_confirmations: child_block_confirmations.into_iter().collect(),
        };

        for (parent, parent_block_number) in parents {
            block.insert_parent(parent, parent_block_number);
        }

        block
    }

    #[must_use]
    pub const fn block_hash(&self) -> Digest {
        self.block_hash
    }

    /// Difficulty target the next block on this chain has to meet.
    #[must_use]
    pub const fn next_difficulty(&self) -> Digest {
        self.next_difficulty
    }

    #[must_use]
    pub const fn direct_parents(&self) -> &Vector<Digest> {
        &self.direct_parents
    }

    #[must_use]
    pub const fn parent_block_numbers(&self) -> &HashMap<Digest, Number> {
        &self.parent_block_numbers
    }

    #[must_use]
    pub fn parent_block_number(&self, parent: Digest) -> Option<Number> {
        self.parent_block_numbers.get(&parent).copied()
    }

    #[must_use]
    pub const fn child_block_confirmations(&self) -> &OrdMap<ChainName, Digest> {
        &self.child_block_confirmations
    }

    /// Direct parents paired with their block numbers, earliest first.
    pub fn parents(&self) -> impl Iterator<Item = (Digest, Number)> + '_ {
        self.direct_parents
            .iter()
            .map(|parent| (*parent, self.parent_block_numbers[parent]))
    }

    pub fn child_confirmations(&self) -> impl Iterator<Item = (&ChainName, Digest)> {
        self.child_block_confirmations
            .iter()
            .map(|(chain_name, child_hash)| (chain_name, *child_hash))
    }

    #[must_use]
    pub fn earliest_parent(&self) -> Option<Number> {
        let first_parent = self.direct_parents.front()?;
        self.parent_block_number(*first_parent)
    }

    #[must_use]
    pub fn total_parents(&self) -> usize {
        self.direct_parents.len()
    }

    #[must_use]
    pub fn add_parent(&self, parent: Digest, parent_block_number: Number) -> Self {
        let mut block = self.clone();
        block.insert_parent(parent, parent_block_number);
        block
    }

    #[must_use]
    pub fn with_parent_confirmations(
        &self,
        parents: impl IntoIterator<Item = (Digest, Number)>,
    ) -> Self {
        let mut block = self.clone();

        for (parent, parent_block_number) in parents {
            block.insert_parent(parent, parent_block_number);
        }

        block
    }

    /// Returns `None` if `parent` is not a direct parent of this block.
    #[must_use]
    pub fn remove_parent(&self, parent: Digest) -> Option<Self> {
        let index = self.direct_parents.index_of(&parent)?;
        let mut block = self.clone();

        block.direct_parents.remove(index);
        block.parent_block_numbers.remove(&parent);

        Some(block)
    }

    // A new parent goes before the first existing one whose number is not smaller.
    // Parents with equal numbers therefore end up newest first.
    fn insert_parent(&mut self, parent: Digest, parent_block_number: Number) {
        if self
            .parent_block_numbers
            .insert(parent, parent_block_number)
            .is_some()
        {
            self.direct_parents.retain(|existing| *existing != parent);
        }

        let index = self
            .direct_parents
            .iter()
            .position(|existing| self.parent_block_numbers[existing] >= parent_block_number)
            .unwrap_or(self.direct_parents.len());

        self.direct_parents.insert(index, parent);
    }
}

// Serialized blocks carry parents as pairs so that decoding cannot break the ordering invariant.
#[derive(Clone, Serialize, Deserialize)]
struct BlockParts {
    block_hash: Digest,
    next_difficulty: Digest,
    parents: Vec<(Digest, Number)>,
    child_block_confirmations: OrdMap<ChainName, Digest>,
}

impl From<BlockParts> for Block {
    fn from(parts: BlockParts) -> Self {
        let BlockParts {
            block_hash,
            next_difficulty,
            parents,
            child_block_confirmations,
        } = parts;

        Self::new(block_hash, next_difficulty, parents, child_block_confirmations)
    }
}

impl From<Block> for BlockParts {
    fn from(block: Block) -> Self {
        Self {
            block_hash: block.block_hash,
            next_difficulty: block.next_difficulty,
            parents: block.parents().collect(),
            child_block_confirmations: block.child_block_confirmations,
        }
    }
}
