use std::collections::{BTreeMap, HashMap};

use im::OrdMap;
use types::{
    block::Block,
    primitives::{ChainName, Digest, Number, SegmentId},
};

/// Parent edges keyed by the child block they belong to.
///
/// Maps child block hash to parent block hash to parent block number.
pub type ParentConfirmations = HashMap<Digest, HashMap<Digest, Number>>;

/// [`ParentConfirmations`] grouped by the child chain the child blocks belong to.
pub type ChainConfirmations = BTreeMap<ChainName, ParentConfirmations>;

/// A batch of parent edges to add to or remove from blocks of a single chain.
///
/// Removals are applied before additions.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ConfirmationChanges {
    pub additions: ParentConfirmations,
    pub removals: ParentConfirmations,
}

impl ConfirmationChanges {
    #[must_use]
    pub fn additions(additions: ParentConfirmations) -> Self {
        Self {
            additions,
            removals: ParentConfirmations::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Number of individual parent edges in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        [&self.additions, &self.removals]
            .into_iter()
            .flat_map(HashMap::values)
            .map(HashMap::len)
            .sum()
    }

    pub fn block_hashes(&self) -> impl Iterator<Item = Digest> + '_ {
        self.removals
            .keys()
            .chain(self.additions.keys())
            .copied()
    }

    // Splits per-chain additions and removals into per-chain batches.
    pub(crate) fn partition(
        additions: ChainConfirmations,
        removals: ChainConfirmations,
    ) -> BTreeMap<ChainName, Self> {
        let mut changes = BTreeMap::<_, Self>::new();

        for (chain_name, confirmations) in additions {
            changes.entry(chain_name).or_default().additions = confirmations;
        }

        for (chain_name, confirmations) in removals {
            changes.entry(chain_name).or_default().removals = confirmations;
        }

        changes
    }
}

/// Locations of blocks that a batch of confirmation changes applies to.
///
/// The trie mirrors the segment tree, so changes can be applied to every affected segment in a
/// single descent.
#[derive(PartialEq, Eq, Default, Debug)]
pub struct ConfirmationRoutes {
    pub(crate) blocks: BTreeMap<Digest, Number>,
    pub(crate) descendants: BTreeMap<SegmentId, ConfirmationRoutes>,
}

impl ConfirmationRoutes {
    /// Adds a route to a block.
    ///
    /// `path` lists the segments leading to the segment that contains the block, starting with a
    /// child of the segment the routes will be applied to.
    pub fn insert(&mut self, path: &[SegmentId], block_hash: Digest, block_number: Number) {
        match path.split_first() {
            Some((child_id, rest)) => self
                .descendants
                .entry(*child_id)
                .or_default()
                .insert(rest, block_hash, block_number),
            None => {
                self.blocks.insert(block_hash, block_number);
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.descendants.is_empty()
    }
}

/// Index updates produced by splicing a segment into a segment tree.
#[derive(Default, Debug)]
pub struct LocationChanges {
    /// New owning segment for every block that moved.
    pub block_locations: HashMap<Digest, SegmentId>,
    /// New parent for every segment that was created or moved.
    pub segment_parents: HashMap<SegmentId, SegmentId>,
}

/// A block together with blocks of descendant chains that should be inserted along with it.
///
/// Descendant chain blocks are inserted first so that confirmations carried by `block` can be
/// attached to them immediately.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ChainInsertion {
    pub block: Block,
    pub block_number: Number,
    pub previous_block_fingerprint: Digest,
    pub descendants: OrdMap<ChainName, ChainInsertion>,
}

impl ChainInsertion {
    #[must_use]
    pub fn new(block: Block, block_number: Number, previous_block_fingerprint: Digest) -> Self {
        Self {
            block,
            block_number,
            previous_block_fingerprint,
            descendants: OrdMap::new(),
        }
    }

    #[must_use]
    pub fn with_descendant(mut self, chain_name: ChainName, descendant: Self) -> Self {
        self.descendants.insert(chain_name, descendant);
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InsertOutcome {
    Ignored(IgnoreReason),
    /// The block was stored, but it does not connect to the anchored part of the graph yet.
    Orphaned,
    /// The tip moved forward along the chain it was already on.
    CanonicalChainExtended,
    /// The block was stored on a branch that does not contain the tip.
    AlternateChainExtended,
    Reorganized {
        old_tip: Digest,
    },
}

impl InsertOutcome {
    #[must_use]
    pub const fn is_ignored(self) -> bool {
        matches!(self, Self::Ignored(_))
    }

    #[must_use]
    pub const fn changed_tip(self) -> bool {
        matches!(
            self,
            Self::CanonicalChainExtended | Self::Reorganized { .. },
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IgnoreReason {
    Duplicate,
    /// The block is numbered below the retention threshold.
    Stale,
    /// The block number does not follow the number of the block it builds on.
    InconsistentNumber,
}
