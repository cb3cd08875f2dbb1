use std::collections::BTreeMap;

use arithmetic::NumberExt as _;
use im::{HashMap, OrdMap, OrdSet, Vector};
use itertools::Itertools as _;
use log::{debug, info, warn};
use tap::Tap as _;
use types::{
    block::Block,
    primitives::{ChainName, Digest, Number, SegmentId},
};

use crate::{
    graph_config::GraphConfig,
    misc::{
        ChainConfirmations, ChainInsertion, ConfirmationChanges, ConfirmationRoutes,
        IgnoreReason, InsertOutcome, LocationChanges,
    },
    segment::Segment,
};

/// The state of a single chain.
///
/// A forest of segment trees. Exactly one root is the anchor the chain grew from. The others are
/// either orphans waiting for a missing block or, after trimming, branches that used to hang off
/// a trimmed segment.
///
/// The anchor does not record the block it builds on. If that block arrives later, it is kept as
/// an orphan waiting for its own predecessor and never joins the anchor.
///
/// Child chains are stored by value. Whenever the tip of this chain changes, confirmations made
/// by blocks that left or joined the canonical chain are pushed down to them.
#[derive(Clone, Default, Debug)]
pub struct Graph {
    config: GraphConfig,
    root_segments: OrdMap<SegmentId, Segment>,
    // Orphan root segments keyed by the missing block they build on.
    orphans: HashMap<Digest, OrdSet<SegmentId>>,
    // The reverse of `orphans`.
    orphan_roots: HashMap<SegmentId, Digest>,
    // Absent for root segments.
    segment_parents: HashMap<SegmentId, SegmentId>,
    blocks: HashMap<Digest, SegmentId>,
    block_numbers: HashMap<Digest, Number>,
    // Confirmations of blocks this chain has not received yet.
    pending_parent_confirmations: HashMap<Digest, PendingConfirmations>,
    child_chains: OrdMap<ChainName, Graph>,
    tip: Option<Digest>,
}

#[derive(Clone, Default, Debug)]
struct PendingConfirmations {
    parents: HashMap<Digest, Number>,
    // Tip number when confirmations were last added. Trimmed along with blocks of that age.
    recorded_at: Number,
}

// A segment on the path to some tip along with the last of its blocks that precedes the tip.
#[derive(Clone, Copy)]
struct ChainRange<'graph> {
    segment_id: SegmentId,
    segment: &'graph Segment,
    last_included: Number,
}

impl Graph {
    #[must_use]
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn create_new(max_length: Option<u64>) -> Self {
        Self::new(GraphConfig::with_max_length(max_length))
    }

    #[must_use]
    pub const fn config(&self) -> GraphConfig {
        self.config
    }

    #[must_use]
    pub const fn tip(&self) -> Option<Digest> {
        self.tip
    }

    #[must_use]
    pub fn tip_number(&self) -> Option<Number> {
        self.block_number(self.tip?)
    }

    #[must_use]
    pub fn contains_block(&self, block_hash: Digest) -> bool {
        self.blocks.contains_key(&block_hash)
    }

    #[must_use]
    pub fn block_number(&self, block_hash: Digest) -> Option<Number> {
        self.block_numbers.get(&block_hash).copied()
    }

    #[must_use]
    pub fn block(&self, block_hash: Digest) -> Option<&Block> {
        let segment_id = self.blocks.get(&block_hash)?;
        let block_number = self.block_numbers.get(&block_hash)?;
        self.segment(*segment_id)?.block(*block_number)
    }

    #[must_use]
    pub const fn root_segments(&self) -> &OrdMap<SegmentId, Segment> {
        &self.root_segments
    }

    #[must_use]
    pub fn segment(&self, segment_id: SegmentId) -> Option<&Segment> {
        let path = self.segment_path(segment_id);
        let (root_id, descendants) = path.split_first()?;
        self.root_segments.get(root_id)?.descendant(descendants)
    }

    /// Number of orphan root segments waiting for a missing block.
    #[must_use]
    pub fn orphan_count(&self) -> usize {
        self.orphan_roots.len()
    }

    #[must_use]
    pub fn child_chain(&self, chain_name: &ChainName) -> Option<&Self> {
        self.child_chains.get(chain_name)
    }

    #[must_use]
    pub fn child_chain_mut(&mut self, chain_name: &ChainName) -> Option<&mut Self> {
        self.child_chains.get_mut(chain_name)
    }

    #[must_use]
    pub const fn child_chains(&self) -> &OrdMap<ChainName, Self> {
        &self.child_chains
    }

    /// IDs of the segments from the one that owns the block up to its root.
    ///
    /// Empty if the block is unknown.
    #[must_use]
    pub fn parent_segments(&self, block_hash: Digest) -> Vec<SegmentId> {
        self.blocks
            .get(&block_hash)
            .map(|segment_id| self.segment_path(*segment_id).tap_mut(|path| path.reverse()))
            .unwrap_or_default()
    }

    /// IDs of the segments on the canonical chain, starting with the one that owns the tip.
    #[must_use]
    pub fn chain_segments(&self) -> Vec<SegmentId> {
        self.tip
            .map(|tip| self.parent_segments(tip))
            .unwrap_or_default()
    }

    /// Whether the block is the tip or one of its ancestors.
    #[must_use]
    pub fn in_chain(&self, block_hash: Digest) -> bool {
        self.blocks
            .get(&block_hash)
            .is_some_and(|segment_id| self.chain_segments().contains(segment_id))
    }

    /// Returns the blocks among `block_hashes` that are on the canonical chain, in order.
    pub fn in_chain_filter(&self, block_hashes: impl IntoIterator<Item = Digest>) -> Vec<Digest> {
        let chain_segments = self.chain_segments();

        block_hashes
            .into_iter()
            .filter(|block_hash| {
                self.blocks
                    .get(block_hash)
                    .is_some_and(|segment_id| chain_segments.contains(segment_id))
            })
            .collect()
    }

    /// Blocks of the canonical chain paired with their numbers, starting with the tip.
    pub fn canonical_chain(&self) -> impl Iterator<Item = (Number, &Block)> {
        self.tip
            .map(|tip| self.chain_ranges(tip))
            .unwrap_or_default()
            .into_iter()
            .rev()
            .flat_map(|range| {
                (range.segment.first_block_number()..=range.last_included)
                    .rev()
                    .map(move |block_number| {
                        let block = range
                            .segment
                            .block(block_number)
                            .expect("chain ranges only cover blocks owned by their segments");

                        (block_number, block)
                    })
            })
    }

    #[must_use]
    pub fn insert(
        &self,
        block: Block,
        block_number: Number,
        previous_block_fingerprint: Digest,
    ) -> Self {
        self.clone().tap_mut(|graph| {
            graph.apply_block(block, block_number, previous_block_fingerprint);
        })
    }

    /// Inserts a block along with blocks of descendant chains.
    #[must_use]
    pub fn insert_batch(&self, insertion: &ChainInsertion) -> Self {
        self.clone().tap_mut(|graph| {
            graph.apply_batch(insertion);
        })
    }

    /// Inserts a block into the chain at `path` relative to this one.
    ///
    /// Unknown chains are ignored.
    #[must_use]
    pub fn insert_at(
        &self,
        path: &[ChainName],
        block: Block,
        block_number: Number,
        previous_block_fingerprint: Digest,
    ) -> Self {
        self.clone().tap_mut(|graph| {
            graph.apply_block_at(path, block, block_number, previous_block_fingerprint);
        })
    }

    #[must_use]
    pub fn change_parent_confirmations(&self, changes: &ConfirmationChanges) -> Self {
        self.clone().tap_mut(|graph| {
            graph.apply_parent_confirmations(changes);
        })
    }

    /// Registers a child chain.
    ///
    /// The child receives the confirmations already made by the canonical chain of this one.
    #[must_use]
    pub fn with_child_chain(&self, chain_name: ChainName, child: Self) -> Self {
        self.clone().tap_mut(|graph| {
            graph.add_child_chain(chain_name, child);
        })
    }

    pub fn add_child_chain(&mut self, chain_name: ChainName, mut child: Self) -> Option<Self> {
        if let Some(tip) = self.tip {
            let mut confirmations = ChainConfirmations::new();

            for range in self.chain_ranges(tip) {
                range.segment.collect_confirmations(
                    range.segment.first_block_number()..=range.last_included,
                    &mut confirmations,
                );
            }

            if let Some(additions) = confirmations.remove(&chain_name) {
                child.apply_parent_confirmations(&ConfirmationChanges::additions(additions));
            }
        }

        self.child_chains.insert(chain_name, child)
    }

    pub fn apply_block_at(
        &mut self,
        path: &[ChainName],
        block: Block,
        block_number: Number,
        previous_block_fingerprint: Digest,
    ) -> Option<InsertOutcome> {
        let Some((chain_name, rest)) = path.split_first() else {
            return Some(self.apply_block(block, block_number, previous_block_fingerprint));
        };

        let Some(child) = self.child_chains.get_mut(chain_name) else {
            debug!("ignoring block {:?} for unknown chain {chain_name}", block.block_hash());
            return None;
        };

        child.apply_block_at(rest, block, block_number, previous_block_fingerprint)
    }

    pub fn apply_batch(&mut self, insertion: &ChainInsertion) -> InsertOutcome {
        let ChainInsertion {
            block,
            block_number,
            previous_block_fingerprint,
            descendants,
        } = insertion;

        for (chain_name, descendant) in descendants {
            match self.child_chains.get_mut(chain_name) {
                Some(child) => {
                    child.apply_batch(descendant);
                }
                None => debug!(
                    "ignoring block {:?} for unknown chain {chain_name}",
                    descendant.block.block_hash(),
                ),
            }
        }

        self.apply_block(block.clone(), *block_number, *previous_block_fingerprint)
    }

    pub fn apply_block(
        &mut self,
        block: Block,
        block_number: Number,
        previous_block_fingerprint: Digest,
    ) -> InsertOutcome {
        let block_hash = block.block_hash();

        if self.contains_block(block_hash) {
            debug!("ignoring duplicate block {block_hash:?}");
            return InsertOutcome::Ignored(IgnoreReason::Duplicate);
        }

        // Dropped even if the block is rejected. A block with the same hash is the same block.
        let pending = self.pending_parent_confirmations.remove(&block_hash);

        if self.is_stale(block_number) {
            debug!("ignoring stale block {block_hash:?} (number: {block_number})");
            return InsertOutcome::Ignored(IgnoreReason::Stale);
        }

        let previous_number = self.block_number(previous_block_fingerprint);

        if previous_number.is_some_and(|number| number.checked_add(1) != Some(block_number)) {
            debug!(
                "ignoring block {block_hash:?} numbered {block_number} \
                 built on block {previous_block_fingerprint:?} numbered {previous_number:?}",
            );
            return InsertOutcome::Ignored(IgnoreReason::InconsistentNumber);
        }

        let anchors_graph = self.blocks.is_empty();

        let block = match pending {
            Some(pending) => block.with_parent_confirmations(pending.parents),
            None => block,
        };

        let (segment_id, segment) = self.merge_waiting_orphans(block, block_number);

        self.blocks.insert(block_hash, segment_id);
        self.block_numbers.insert(block_hash, block_number);

        let outcome = if previous_number.is_some() {
            self.insert_segment(segment_id, segment, previous_block_fingerprint)
        } else if anchors_graph {
            self.root_segments.insert(segment_id, segment);
            self.reorganize()
        } else {
            features::log!(
                DebugChainGraph,
                "block {block_hash:?} is waiting for block {previous_block_fingerprint:?}",
            );

            self.orphans
                .entry(previous_block_fingerprint)
                .or_insert_with(OrdSet::new)
                .insert(segment_id);

            self.orphan_roots
                .insert(segment_id, previous_block_fingerprint);

            self.root_segments.insert(segment_id, segment);

            InsertOutcome::Orphaned
        };

        self.trim();

        outcome
    }

    /// Applies parent confirmation changes made by a reorganization of the parent chain.
    ///
    /// Confirmations of blocks that have not arrived yet are kept until they do.
    /// Returns `true` if the tip changed.
    pub fn apply_parent_confirmations(&mut self, changes: &ConfirmationChanges) -> bool {
        features::log!(
            LogConfirmationChanges,
            "applying {} confirmation changes to {} blocks",
            changes.len(),
            changes.block_hashes().unique().count(),
        );

        let mut routes = BTreeMap::<SegmentId, ConfirmationRoutes>::new();

        for (block_hash, parents) in &changes.removals {
            if self.add_route(*block_hash, &mut routes) {
                continue;
            }

            if let Some(pending) = self.pending_parent_confirmations.get_mut(block_hash) {
                for parent in parents.keys() {
                    pending.parents.remove(parent);
                }

                if pending.parents.is_empty() {
                    self.pending_parent_confirmations.remove(block_hash);
                }
            }
        }

        let recorded_at = self.tip_number().unwrap_or_default();

        for (block_hash, parents) in &changes.additions {
            if self.add_route(*block_hash, &mut routes) {
                continue;
            }

            let pending = self
                .pending_parent_confirmations
                .entry(*block_hash)
                .or_insert_with(PendingConfirmations::default);

            pending.recorded_at = recorded_at;
            pending
                .parents
                .extend(parents.iter().map(|(parent, number)| (*parent, *number)));
        }

        for (root_id, root_routes) in routes {
            let root =
                self.root_segments[&root_id].change_parent_confirmations(&root_routes, changes);
            self.root_segments.insert(root_id, root);
        }

        self.reorganize().changed_tip()
    }

    fn add_route(
        &self,
        block_hash: Digest,
        routes: &mut BTreeMap<SegmentId, ConfirmationRoutes>,
    ) -> bool {
        let Some(block_number) = self.block_number(block_hash) else {
            return false;
        };

        let path = self.segment_path(self.blocks[&block_hash]);

        let (root_id, descendants) = path
            .split_first()
            .expect("every known block is owned by a segment");

        routes
            .entry(*root_id)
            .or_default()
            .insert(descendants, block_hash, block_number);

        true
    }

    // Removes orphan segments waiting for the block and joins them into one segment.
    fn merge_waiting_orphans(
        &mut self,
        block: Block,
        block_number: Number,
    ) -> (SegmentId, Segment) {
        let block_hash = block.block_hash();
        let waiting = self.orphans.remove(&block_hash).unwrap_or_default();
        let mut waiting_segments = vec![];

        for orphan_id in waiting {
            self.orphan_roots.remove(&orphan_id);

            let orphan = self
                .root_segments
                .remove(&orphan_id)
                .expect("every orphan is a root segment");

            if block_number.checked_add(1) == Some(orphan.first_block_number()) {
                waiting_segments.push((orphan_id, orphan));
            } else {
                warn!(
                    "discarding orphan segment {orphan_id} starting at block {} \
                     because it was built on block {block_hash:?} numbered {block_number}",
                    orphan.first_block_number(),
                );

                self.forget_subtree(&orphan);
            }
        }

        let mut waiting_segments = waiting_segments.into_iter();

        let Some((merged_id, first)) = waiting_segments.next() else {
            return (SegmentId::random(), Segment::with_single_block(block, block_number));
        };

        let mut merged = first.add_to_start(block, block_number);

        for (orphan_id, orphan) in waiting_segments {
            let (updated, changes) = merged.insert(merged_id, &[], orphan, orphan_id, block_hash);
            merged = updated;
            self.apply_location_changes(changes);
        }

        features::log!(
            DebugChainGraph,
            "block {block_hash:?} joined orphan segments into {merged_id}",
        );

        (merged_id, merged)
    }

    fn insert_segment(
        &mut self,
        segment_id: SegmentId,
        segment: Segment,
        previous_block_fingerprint: Digest,
    ) -> InsertOutcome {
        let path = self.segment_path(self.blocks[&previous_block_fingerprint]);

        let (root_id, descendants) = path
            .split_first()
            .expect("every known block is owned by a segment");

        let extends_tip = self.tip == Some(previous_block_fingerprint);
        let new_tip = segment.tip_hash();

        let additions = if extends_tip {
            segment.dominant_confirmations()
        } else {
            ChainConfirmations::new()
        };

        let (root, changes) = self.root_segments[root_id].insert(
            *root_id,
            descendants,
            segment,
            segment_id,
            previous_block_fingerprint,
        );

        self.root_segments.insert(*root_id, root);
        self.apply_location_changes(changes);

        if self.orphan_roots.contains_key(root_id) {
            return InsertOutcome::Orphaned;
        }

        if !extends_tip {
            return self.reorganize();
        }

        features::log!(
            LogReorganizations,
            "tip extended from {previous_block_fingerprint:?} to {new_tip:?}",
        );

        self.tip = Some(new_tip);
        self.propagate(ConfirmationChanges::partition(
            additions,
            ChainConfirmations::new(),
        ));

        InsertOutcome::CanonicalChainExtended
    }

    // Recomputes the tip and pushes confirmation changes down to child chains.
    fn reorganize(&mut self) -> InsertOutcome {
        let old_tip = self.tip;

        let new_tip = self
            .root_segments
            .iter()
            .filter(|(segment_id, _)| !self.orphan_roots.contains_key(*segment_id))
            .map(|(_, root)| root)
            .max_by_key(|root| root.score())
            .map(Segment::tip_hash);

        if new_tip == old_tip {
            return InsertOutcome::AlternateChainExtended;
        }

        let changes = {
            let old_chain = old_tip.map(|tip| self.chain_ranges(tip)).unwrap_or_default();
            let new_chain = new_tip.map(|tip| self.chain_ranges(tip)).unwrap_or_default();
            Self::confirmation_delta(&old_chain, &new_chain)
        };

        self.tip = new_tip;

        let outcome = match old_tip {
            Some(old_tip) if !self.in_chain(old_tip) => {
                info!("chain reorganized from {old_tip:?} to {new_tip:?}");
                InsertOutcome::Reorganized { old_tip }
            }
            _ => InsertOutcome::CanonicalChainExtended,
        };

        features::log!(
            LogReorganizations,
            "tip moved from {old_tip:?} to {new_tip:?} ({} child chains affected)",
            changes.len(),
        );

        self.propagate(changes);

        outcome
    }

    fn propagate(&mut self, changes: BTreeMap<ChainName, ConfirmationChanges>) {
        for (chain_name, changes) in changes {
            if changes.is_empty() {
                continue;
            }

            match self.child_chains.get_mut(&chain_name) {
                Some(child) => {
                    child.apply_parent_confirmations(&changes);
                }
                None => debug!(
                    "ignoring {} confirmation changes for unknown chain {chain_name}",
                    changes.len(),
                ),
            }
        }
    }

    // Confirmations made only by blocks on one of the two chains.
    // Blocks shared by both chains cancel out.
    fn confirmation_delta(
        old_chain: &[ChainRange<'_>],
        new_chain: &[ChainRange<'_>],
    ) -> BTreeMap<ChainName, ConfirmationChanges> {
        let common = old_chain
            .iter()
            .zip(new_chain)
            .take_while(|(old, new)| old.segment_id == new.segment_id)
            .count();

        let mut additions = ChainConfirmations::new();
        let mut removals = ChainConfirmations::new();

        if let Some(last_common) = common.checked_sub(1) {
            let old = old_chain[last_common];
            let new = new_chain[last_common];

            if old.last_included > new.last_included {
                old.segment.collect_confirmations(
                    new.last_included.successor()..=old.last_included,
                    &mut removals,
                );
            } else if new.last_included > old.last_included {
                new.segment.collect_confirmations(
                    old.last_included.successor()..=new.last_included,
                    &mut additions,
                );
            }
        }

        for range in &old_chain[common..] {
            range.segment.collect_confirmations(
                range.segment.first_block_number()..=range.last_included,
                &mut removals,
            );
        }

        for range in &new_chain[common..] {
            range.segment.collect_confirmations(
                range.segment.first_block_number()..=range.last_included,
                &mut additions,
            );
        }

        ConfirmationChanges::partition(additions, removals)
    }

    fn chain_ranges(&self, tip: Digest) -> Vec<ChainRange<'_>> {
        let tip_number = self.block_numbers[&tip];
        let mut parent = None::<&Segment>;

        self.segment_path(self.blocks[&tip])
            .into_iter()
            .map(|segment_id| {
                let segment = match parent {
                    Some(parent) => &parent.child_segments()[&segment_id],
                    None => &self.root_segments[&segment_id],
                };

                parent = Some(segment);

                ChainRange {
                    segment_id,
                    segment,
                    last_included: segment.latest_block().min(tip_number),
                }
            })
            .collect()
    }

    // Starts with the root.
    fn segment_path(&self, segment_id: SegmentId) -> Vec<SegmentId> {
        core::iter::successors(Some(segment_id), |segment_id| {
            self.segment_parents.get(segment_id).copied()
        })
        .collect_vec()
        .tap_mut(|path| path.reverse())
    }

    fn apply_location_changes(&mut self, changes: LocationChanges) {
        let LocationChanges {
            block_locations,
            segment_parents,
        } = changes;

        self.blocks.extend(block_locations);
        self.segment_parents.extend(segment_parents);
    }

    fn retention_threshold(&self) -> Option<Number> {
        let max_length = self.config.max_length?;
        Some(self.tip_number()?.retention_threshold(max_length))
    }

    fn is_stale(&self, block_number: Number) -> bool {
        self.retention_threshold()
            .is_some_and(|threshold| block_number < threshold)
    }

    // Removes root segments that end below the retention threshold and promotes their children.
    // Orphans that are waiting for a block below the threshold can never be resolved.
    // Neither can confirmations that have been pending since the tip was below the threshold.
    fn trim(&mut self) {
        let Some(threshold) = self.retention_threshold() else {
            return;
        };

        let pending_before = self.pending_parent_confirmations.len();

        self.pending_parent_confirmations
            .retain(|_, pending| pending.recorded_at >= threshold);

        let pending_dropped = pending_before - self.pending_parent_confirmations.len();

        if pending_dropped > 0 {
            features::log!(
                LogTrimming,
                "dropped {pending_dropped} pending confirmations \
                 recorded before block {threshold}",
            );
        }

        let mut candidates = self.root_segments.keys().copied().collect_vec();

        while let Some(segment_id) = candidates.pop() {
            let segment = &self.root_segments[&segment_id];

            if self.orphan_roots.contains_key(&segment_id) {
                if segment.first_block_number() <= threshold {
                    features::log!(
                        LogTrimming,
                        "dropping orphan segment {segment_id} starting at block {}",
                        segment.first_block_number(),
                    );

                    self.discard_orphan(segment_id);
                }

                continue;
            }

            if segment.latest_block() >= threshold {
                continue;
            }

            features::log!(
                LogTrimming,
                "trimming segment {segment_id} (blocks {}..={}, threshold: {threshold})",
                segment.first_block_number(),
                segment.latest_block(),
            );

            let (blocks, child_segments) = self
                .root_segments
                .remove(&segment_id)
                .expect("segment_id was obtained from self.root_segments")
                .into_parts();

            self.forget_blocks(&blocks);

            for (child_id, child) in child_segments {
                self.segment_parents.remove(&child_id);
                self.root_segments.insert(child_id, child);
                candidates.push(child_id);
            }
        }
    }

    fn discard_orphan(&mut self, segment_id: SegmentId) {
        if let Some(missing_block) = self.orphan_roots.remove(&segment_id) {
            if let Some(waiting) = self.orphans.get_mut(&missing_block) {
                waiting.remove(&segment_id);

                if waiting.is_empty() {
                    self.orphans.remove(&missing_block);
                }
            }
        }

        if let Some(orphan) = self.root_segments.remove(&segment_id) {
            self.forget_subtree(&orphan);
        }
    }

    fn forget_subtree(&mut self, segment: &Segment) {
        self.forget_blocks(segment.blocks());

        for (child_id, child) in segment.child_segments() {
            self.segment_parents.remove(child_id);
            self.forget_subtree(child);
        }
    }

    fn forget_blocks(&mut self, blocks: &Vector<Block>) {
        for block in blocks {
            self.blocks.remove(&block.block_hash());
            self.block_numbers.remove(&block.block_hash());
        }
    }
}

#[cfg(test)]
mod tests {
    use core::{num::NonZeroU64, ops::RangeInclusive};
    use std::collections::HashSet;

    use types::primitives::H256;

    use super::*;

    const MAIN: u64 = 0;
    const FORK: u64 = 1;
    const OTHER: u64 = 2;
    // Offset between parent chain branches and the child chain blocks they confirm.
    const CONFIRMED: u64 = 100;

    fn hash(branch: u64, block_number: Number) -> Digest {
        H256::from_low_u64_be(((branch + 1) << 32) | block_number)
    }

    // Ties between branches of equal length go to the branch with the lowest number.
    fn difficulty(branch: u64) -> Digest {
        H256::from_low_u64_be(0x100 + branch)
    }

    fn previous(branch: u64, block_number: Number) -> Digest {
        block_number
            .predecessor()
            .map_or_else(H256::zero, |previous| hash(branch, previous))
    }

    fn block(branch: u64, block_number: Number) -> Block {
        Block::new(hash(branch, block_number), difficulty(branch), [], [])
    }

    fn confirming(
        branch: u64,
        block_number: Number,
        chain_name: &ChainName,
        child: Digest,
    ) -> Block {
        Block::new(
            hash(branch, block_number),
            difficulty(branch),
            [],
            [(chain_name.clone(), child)],
        )
    }

    fn child_name() -> ChainName {
        ChainName::from("Child")
    }

    fn extend(
        graph: &mut Graph,
        branch: u64,
        block_numbers: RangeInclusive<Number>,
        mut previous_block_fingerprint: Digest,
    ) -> Vec<InsertOutcome> {
        block_numbers
            .map(|block_number| {
                let outcome = graph.apply_block(
                    block(branch, block_number),
                    block_number,
                    previous_block_fingerprint,
                );
                previous_block_fingerprint = hash(branch, block_number);
                outcome
            })
            .collect()
    }

    fn main_chain(config: GraphConfig, last: Number) -> Graph {
        let mut graph = Graph::new(config);
        extend(&mut graph, MAIN, 0..=last, H256::zero());
        graph
    }

    fn child_tip(graph: &Graph) -> Option<Digest> {
        graph.child_chain(&child_name()).and_then(Graph::tip)
    }

    fn pending_blocks(graph: &Graph) -> HashSet<Digest> {
        graph
            .child_chain(&child_name())
            .map(|child| child.pending_parent_confirmations.keys().copied().collect())
            .unwrap_or_default()
    }

    #[test]
    fn new_graph_is_empty() {
        let graph = Graph::create_new(None);

        assert_eq!(graph.tip(), None);
        assert_eq!(graph.tip_number(), None);
        assert!(graph.chain_segments().is_empty());
        assert!(!graph.in_chain(hash(MAIN, 0)));
        assert_eq!(graph.canonical_chain().count(), 0);
        assert_eq!(graph.config(), GraphConfig::default());
        assert_eq!(
            Graph::create_new(Some(5)).config().max_length.map(NonZeroU64::get),
            Some(5),
        );
    }

    #[test]
    fn first_block_anchors_graph_even_though_previous_block_is_unknown() {
        let mut graph = Graph::default();

        let outcome = graph.apply_block(block(MAIN, 5), 5, hash(MAIN, 4));

        assert_eq!(outcome, InsertOutcome::CanonicalChainExtended);
        assert_eq!(graph.tip(), Some(hash(MAIN, 5)));
        assert_eq!(graph.tip_number(), Some(5));
        assert_eq!(graph.orphan_count(), 0);
    }

    #[test]
    fn late_predecessor_of_anchor_stays_orphaned() {
        let mut graph = Graph::default();

        graph.apply_block(block(MAIN, 5), 5, hash(MAIN, 4));

        let outcome = graph.apply_block(block(MAIN, 4), 4, hash(MAIN, 3));

        assert_eq!(outcome, InsertOutcome::Orphaned);
        assert_eq!(graph.tip(), Some(hash(MAIN, 5)));
        assert_eq!(graph.orphan_count(), 1);
        assert!(graph.contains_block(hash(MAIN, 4)));
        assert!(!graph.in_chain(hash(MAIN, 4)));
    }

    #[test]
    fn blocks_may_be_numbered_up_to_the_highest_number() {
        let mut graph = Graph::default().with_child_chain(child_name(), Graph::default());

        let outcome = graph.apply_block(
            confirming(MAIN, 0, &child_name(), hash(CONFIRMED, 0)),
            Number::MAX,
            H256::zero(),
        );

        assert_eq!(outcome, InsertOutcome::CanonicalChainExtended);
        assert_eq!(graph.tip_number(), Some(Number::MAX));
        assert_eq!(pending_blocks(&graph), HashSet::from([hash(CONFIRMED, 0)]));
        itertools::assert_equal(
            graph
                .canonical_chain()
                .map(|(block_number, block)| (block_number, block.block_hash())),
            [(Number::MAX, hash(MAIN, 0))],
        );

        assert_eq!(
            graph.apply_block(block(MAIN, 1), 0, hash(MAIN, 0)),
            InsertOutcome::Ignored(IgnoreReason::InconsistentNumber),
        );
        assert_eq!(graph.tip(), Some(hash(MAIN, 0)));

        // An orphan cannot continue a block numbered `Number::MAX`.
        assert_eq!(graph.apply_block(block(FORK, 1), 0, hash(FORK, 0)), InsertOutcome::Orphaned);
        assert_eq!(
            graph.apply_block(block(FORK, 0), Number::MAX, hash(OTHER, 0)),
            InsertOutcome::Orphaned,
        );
        assert!(!graph.contains_block(hash(FORK, 1)));
        assert_eq!(graph.orphan_count(), 1);
    }

    #[test]
    fn linear_chain_stays_in_one_segment() {
        let mut graph = Graph::default();
        let outcomes = extend(&mut graph, MAIN, 0..=5, H256::zero());

        assert!(outcomes
            .into_iter()
            .all(|outcome| outcome == InsertOutcome::CanonicalChainExtended));

        assert_eq!(graph.tip(), Some(hash(MAIN, 5)));
        assert_eq!(graph.chain_segments().len(), 1);
        assert_eq!(graph.parent_segments(hash(MAIN, 3)), graph.chain_segments());
        assert_eq!(graph.block_number(hash(MAIN, 3)), Some(3));

        itertools::assert_equal(
            graph
                .canonical_chain()
                .map(|(block_number, block)| (block_number, block.block_hash())),
            (0..=5).rev().map(|block_number| (block_number, hash(MAIN, block_number))),
        );
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut graph = main_chain(GraphConfig::default(), 3);
        let segments_before = graph.chain_segments();

        let outcome = graph.apply_block(block(MAIN, 2), 2, hash(MAIN, 1));

        assert_eq!(outcome, InsertOutcome::Ignored(IgnoreReason::Duplicate));
        assert!(outcome.is_ignored());
        assert_eq!(graph.tip(), Some(hash(MAIN, 3)));
        assert_eq!(graph.chain_segments(), segments_before);

        let reinserted = graph.insert(block(MAIN, 3), 3, hash(MAIN, 2));

        assert_eq!(reinserted.tip(), graph.tip());
        assert_eq!(reinserted.root_segments().len(), 1);
        assert_eq!(reinserted.chain_segments(), segments_before);
    }

    #[test]
    fn block_with_inconsistent_number_is_ignored() {
        let mut graph = main_chain(GraphConfig::default(), 2);

        let outcome = graph.apply_block(block(FORK, 7), 7, hash(MAIN, 2));

        assert_eq!(outcome, InsertOutcome::Ignored(IgnoreReason::InconsistentNumber));
        assert!(!graph.contains_block(hash(FORK, 7)));
    }

    #[test]
    fn insert_leaves_original_graph_untouched() {
        let graph = main_chain(GraphConfig::default(), 2);
        let extended = graph.insert(block(MAIN, 3), 3, hash(MAIN, 2));

        assert_eq!(graph.tip(), Some(hash(MAIN, 2)));
        assert!(!graph.contains_block(hash(MAIN, 3)));
        assert_eq!(extended.tip(), Some(hash(MAIN, 3)));
    }

    #[test]
    fn longer_fork_reorganizes_chain() {
        let mut graph = main_chain(GraphConfig::default(), 3);

        let outcomes = extend(&mut graph, FORK, 2..=4, hash(MAIN, 1));

        assert_eq!(
            outcomes,
            [
                InsertOutcome::AlternateChainExtended,
                InsertOutcome::AlternateChainExtended,
                InsertOutcome::Reorganized {
                    old_tip: hash(MAIN, 3),
                },
            ],
        );

        assert_eq!(graph.tip(), Some(hash(FORK, 4)));
        assert_eq!(graph.chain_segments().len(), 2);
        assert!(graph.in_chain(hash(MAIN, 1)));
        assert!(graph.in_chain(hash(FORK, 2)));
        assert!(!graph.in_chain(hash(MAIN, 3)));
        assert_eq!(
            graph.in_chain_filter([hash(MAIN, 2), hash(FORK, 2), hash(MAIN, 1)]),
            [hash(FORK, 2), hash(MAIN, 1)],
        );
    }

    #[test]
    fn segments_along_chain_are_contiguous() {
        let mut graph = main_chain(GraphConfig::default(), 6);

        extend(&mut graph, FORK, 3..=9, hash(MAIN, 2));
        extend(&mut graph, OTHER, 5..=5, hash(FORK, 4));

        let mut expected_first = 0;

        for segment_id in graph.chain_segments().into_iter().rev() {
            let segment = graph
                .segment(segment_id)
                .expect("chain segments are in the graph");

            assert_eq!(segment.first_block_number(), expected_first);
            expected_first = segment.latest_block() + 1;
        }

        assert_eq!(expected_first, 10);
        assert_eq!(graph.canonical_chain().count(), 10);
    }

    #[test]
    fn orphans_resolve_when_missing_block_arrives() {
        let mut graph = main_chain(GraphConfig::default(), 0);

        assert_eq!(graph.apply_block(block(MAIN, 2), 2, hash(MAIN, 1)), InsertOutcome::Orphaned);
        assert_eq!(graph.apply_block(block(MAIN, 3), 3, hash(MAIN, 2)), InsertOutcome::Orphaned);
        assert_eq!(graph.orphan_count(), 1);
        assert_eq!(graph.tip(), Some(hash(MAIN, 0)));
        assert!(graph.contains_block(hash(MAIN, 3)));
        assert!(!graph.in_chain(hash(MAIN, 3)));

        let outcome = graph.apply_block(block(MAIN, 1), 1, hash(MAIN, 0));

        assert_eq!(outcome, InsertOutcome::CanonicalChainExtended);
        assert_eq!(graph.tip(), Some(hash(MAIN, 3)));
        assert_eq!(graph.orphan_count(), 0);
        assert_eq!(graph.chain_segments().len(), 1);
        assert!(graph.in_chain(hash(MAIN, 2)));
    }

    #[test]
    fn orphan_chain_grows_backwards() {
        let mut graph = main_chain(GraphConfig::default(), 0);

        assert_eq!(graph.apply_block(block(MAIN, 3), 3, hash(MAIN, 2)), InsertOutcome::Orphaned);
        assert_eq!(graph.apply_block(block(MAIN, 2), 2, hash(MAIN, 1)), InsertOutcome::Orphaned);
        assert_eq!(graph.orphan_count(), 1);
        assert_eq!(graph.parent_segments(hash(MAIN, 2)), graph.parent_segments(hash(MAIN, 3)));

        graph.apply_block(block(MAIN, 1), 1, hash(MAIN, 0));

        assert_eq!(graph.tip(), Some(hash(MAIN, 3)));
        assert_eq!(graph.orphan_count(), 0);
    }

    #[test]
    fn multiple_orphans_can_wait_for_the_same_block() {
        let mut graph = main_chain(GraphConfig::default(), 0);

        graph.apply_block(block(MAIN, 2), 2, hash(MAIN, 1));
        graph.apply_block(block(FORK, 2), 2, hash(MAIN, 1));

        assert_eq!(graph.orphan_count(), 2);

        graph.apply_block(block(MAIN, 1), 1, hash(MAIN, 0));

        assert_eq!(graph.orphan_count(), 0);
        assert_eq!(graph.tip(), Some(hash(MAIN, 2)));
        assert!(graph.contains_block(hash(FORK, 2)));
        assert!(!graph.in_chain(hash(FORK, 2)));
        assert_eq!(graph.root_segments().len(), 1);

        let outcome = graph.apply_block(block(FORK, 3), 3, hash(FORK, 2));

        assert_eq!(
            outcome,
            InsertOutcome::Reorganized {
                old_tip: hash(MAIN, 2),
            },
        );
    }

    #[test]
    fn orphan_with_inconsistent_number_is_discarded_on_resolution() {
        let mut graph = main_chain(GraphConfig::default(), 0);

        graph.apply_block(block(MAIN, 5), 5, hash(MAIN, 1));
        graph.apply_block(block(MAIN, 1), 1, hash(MAIN, 0));

        assert!(!graph.contains_block(hash(MAIN, 5)));
        assert_eq!(graph.orphan_count(), 0);
        assert_eq!(graph.tip(), Some(hash(MAIN, 1)));
    }

    #[test]
    fn retention_trims_old_segments_and_rejects_stale_blocks() {
        let config = GraphConfig::with_max_length(Some(3));
        let mut graph = main_chain(config, 5);

        assert_eq!(
            graph.apply_block(block(FORK, 3), 3, hash(MAIN, 2)),
            InsertOutcome::AlternateChainExtended,
        );

        extend(&mut graph, MAIN, 6..=10, hash(MAIN, 5));

        assert_eq!(graph.tip_number(), Some(10));
        assert_eq!(graph.root_segments().len(), 1);
        assert!(graph
            .root_segments()
            .values()
            .all(|segment| segment.latest_block() >= 7));
        assert!(!graph.contains_block(hash(MAIN, 2)));
        assert!(!graph.contains_block(hash(FORK, 3)));
        assert_eq!(graph.block_number(hash(MAIN, 0)), None);
        assert!(graph.in_chain(hash(MAIN, 3)));
        assert_eq!(graph.parent_segments(hash(MAIN, 3)), graph.chain_segments());
        assert_eq!(graph.chain_segments().len(), 1);

        assert_eq!(
            graph.apply_block(block(OTHER, 6), 6, hash(MAIN, 5)),
            InsertOutcome::Ignored(IgnoreReason::Stale),
        );

        assert_eq!(
            graph.apply_block(block(OTHER, 9), 9, hash(OTHER, 8)),
            InsertOutcome::Orphaned,
        );

        extend(&mut graph, MAIN, 11..=11, hash(MAIN, 10));

        assert_eq!(graph.orphan_count(), 1);

        extend(&mut graph, MAIN, 12..=12, hash(MAIN, 11));

        assert_eq!(graph.orphan_count(), 0);
        assert!(!graph.contains_block(hash(OTHER, 9)));
    }

    #[test]
    fn child_chain_follows_parent_confirmations() {
        let mut child = main_chain(GraphConfig::default(), 3);
        extend(&mut child, FORK, 1..=2, hash(MAIN, 0));

        assert_eq!(child.tip(), Some(hash(MAIN, 3)));

        let parent_main = CONFIRMED;
        let parent_fork = CONFIRMED + 1;
        let mut parent = Graph::default().with_child_chain(child_name(), child);

        parent.apply_block(block(parent_main, 0), 0, H256::zero());
        parent.apply_block(
            confirming(parent_main, 1, &child_name(), hash(FORK, 2)),
            1,
            hash(parent_main, 0),
        );

        assert_eq!(child_tip(&parent), Some(hash(FORK, 2)));
        assert_eq!(
            parent
                .child_chain(&child_name())
                .and_then(|child| child.block(hash(FORK, 2)))
                .and_then(Block::earliest_parent),
            Some(1),
        );

        let outcomes = extend(&mut parent, parent_fork, 1..=2, hash(parent_main, 0));

        assert_eq!(
            outcomes,
            [
                InsertOutcome::AlternateChainExtended,
                InsertOutcome::Reorganized {
                    old_tip: hash(parent_main, 1),
                },
            ],
        );

        assert_eq!(child_tip(&parent), Some(hash(MAIN, 3)));
        assert_eq!(
            parent
                .child_chain(&child_name())
                .and_then(|child| child.block(hash(FORK, 2)))
                .map(Block::total_parents),
            Some(0),
        );
    }

    #[test]
    fn confirmations_of_missing_blocks_wait_until_they_arrive() {
        let mut parent = Graph::default().with_child_chain(child_name(), Graph::default());

        parent.apply_block(
            confirming(CONFIRMED, 0, &child_name(), hash(MAIN, 1)),
            0,
            H256::zero(),
        );

        assert_eq!(pending_blocks(&parent), HashSet::from([hash(MAIN, 1)]));

        let path = [child_name()];

        for block_number in 0..=1 {
            let outcome = parent.apply_block_at(
                &path,
                block(MAIN, block_number),
                block_number,
                previous(MAIN, block_number),
            );

            assert_eq!(outcome, Some(InsertOutcome::CanonicalChainExtended));
        }

        assert!(pending_blocks(&parent).is_empty());
        assert_eq!(
            parent
                .child_chain(&child_name())
                .and_then(|child| child.block(hash(MAIN, 1)))
                .and_then(|block| block.parent_block_number(hash(CONFIRMED, 0))),
            Some(0),
        );
    }

    #[test]
    fn pending_confirmations_are_dropped_when_parent_reorganizes() {
        let mut parent = Graph::default().with_child_chain(child_name(), Graph::default());

        extend(&mut parent, CONFIRMED, 0..=0, H256::zero());
        parent.apply_block(
            confirming(CONFIRMED, 1, &child_name(), hash(MAIN, 7)),
            1,
            hash(CONFIRMED, 0),
        );

        assert_eq!(pending_blocks(&parent), HashSet::from([hash(MAIN, 7)]));

        extend(&mut parent, CONFIRMED + 1, 1..=2, hash(CONFIRMED, 0));

        assert!(pending_blocks(&parent).is_empty());
    }

    #[test]
    fn stale_block_discards_its_pending_confirmations() {
        let child = main_chain(GraphConfig::with_max_length(Some(2)), 10);
        let mut parent = Graph::default().with_child_chain(child_name(), child);

        parent.apply_block(
            confirming(CONFIRMED, 0, &child_name(), hash(OTHER, 3)),
            0,
            H256::zero(),
        );

        assert_eq!(pending_blocks(&parent), HashSet::from([hash(OTHER, 3)]));

        let outcome = parent.apply_block_at(&[child_name()], block(OTHER, 3), 3, hash(OTHER, 2));

        assert_eq!(outcome, Some(InsertOutcome::Ignored(IgnoreReason::Stale)));
        assert!(pending_blocks(&parent).is_empty());
    }

    #[test]
    fn pending_confirmations_are_trimmed_with_old_blocks() {
        let child = main_chain(GraphConfig::with_max_length(Some(2)), 10);
        let mut parent = Graph::default().with_child_chain(child_name(), child);

        parent.apply_block(
            confirming(CONFIRMED, 0, &child_name(), hash(OTHER, 11)),
            0,
            H256::zero(),
        );

        for block_number in 11..=12 {
            parent.apply_block_at(
                &[child_name()],
                block(MAIN, block_number),
                block_number,
                hash(MAIN, block_number - 1),
            );

            assert_eq!(pending_blocks(&parent), HashSet::from([hash(OTHER, 11)]));
        }

        parent.apply_block_at(&[child_name()], block(MAIN, 13), 13, hash(MAIN, 12));

        assert_eq!(
            parent.child_chain(&child_name()).and_then(Graph::tip_number),
            Some(13),
        );
        assert!(pending_blocks(&parent).is_empty());
    }

    #[test]
    fn reorganization_propagates_through_grandchild_chains() {
        let grandchild_name = ChainName::from("Grandchild");

        let mut grandchild = main_chain(GraphConfig::default(), 3);
        extend(&mut grandchild, FORK, 1..=2, hash(MAIN, 0));

        let mut child = Graph::default().with_child_chain(grandchild_name.clone(), grandchild);
        extend(&mut child, 10, 0..=3, H256::zero());
        child.apply_block(block(11, 1), 1, hash(10, 0));
        child.apply_block(
            confirming(11, 2, &grandchild_name, hash(FORK, 2)),
            2,
            hash(11, 1),
        );

        assert_eq!(child.tip(), Some(hash(10, 3)));

        let mut parent = Graph::default().with_child_chain(child_name(), child);

        let grandchild_tip = |parent: &Graph| {
            parent
                .child_chain(&child_name())
                .and_then(|child| child.child_chain(&grandchild_name))
                .and_then(Graph::tip)
        };

        parent.apply_block(block(CONFIRMED, 0), 0, H256::zero());
        parent.apply_block(
            confirming(CONFIRMED, 1, &child_name(), hash(11, 2)),
            1,
            hash(CONFIRMED, 0),
        );

        assert_eq!(child_tip(&parent), Some(hash(11, 2)));
        assert_eq!(grandchild_tip(&parent), Some(hash(FORK, 2)));

        extend(&mut parent, CONFIRMED + 1, 1..=2, hash(CONFIRMED, 0));

        assert_eq!(parent.tip(), Some(hash(CONFIRMED + 1, 2)));
        assert_eq!(child_tip(&parent), Some(hash(10, 3)));
        assert_eq!(grandchild_tip(&parent), Some(hash(MAIN, 3)));
    }

    #[test]
    fn reorganization_only_touches_divergent_suffix() {
        let child = child_name();
        let confirming_own = |branch: u64, block_number: Number| {
            confirming(branch, block_number, &child, hash(branch + CONFIRMED, block_number))
        };

        let mut graph = Graph::default().with_child_chain(child.clone(), Graph::default());

        for block_number in 0..=4 {
            graph.apply_block(
                confirming_own(MAIN, block_number),
                block_number,
                previous(MAIN, block_number),
            );
        }

        graph.apply_block(confirming_own(FORK, 3), 3, hash(MAIN, 2));
        graph.apply_block(confirming_own(OTHER, 2), 2, hash(MAIN, 1));
        graph.apply_block(confirming_own(FORK, 4), 4, hash(FORK, 3));

        assert_eq!(graph.tip(), Some(hash(MAIN, 4)));

        let outcome = graph.apply_block(confirming_own(FORK, 5), 5, hash(FORK, 4));

        assert_eq!(
            outcome,
            InsertOutcome::Reorganized {
                old_tip: hash(MAIN, 4),
            },
        );

        let old_chain = graph.chain_ranges(hash(MAIN, 4));
        let new_chain = graph.chain_ranges(hash(FORK, 5));

        assert_eq!(old_chain.len(), 3);
        assert_eq!(new_chain.len(), 3);
        itertools::assert_equal(
            old_chain[..2].iter().map(|range| range.segment_id),
            new_chain[..2].iter().map(|range| range.segment_id),
        );

        let changes = Graph::confirmation_delta(&old_chain, &new_chain);
        let changes = &changes[&child];

        let confirmed = |branch: u64, block_numbers: RangeInclusive<Number>| {
            block_numbers
                .map(|block_number| hash(branch + CONFIRMED, block_number))
                .collect::<HashSet<_>>()
        };

        assert_eq!(
            changes.removals.keys().copied().collect::<HashSet<_>>(),
            confirmed(MAIN, 3..=4),
        );
        assert_eq!(
            changes.additions.keys().copied().collect::<HashSet<_>>(),
            confirmed(FORK, 3..=5),
        );
        assert_eq!(
            changes.additions[&hash(FORK + CONFIRMED, 5)],
            std::collections::HashMap::from([(hash(FORK, 5), 5)]),
        );

        let expected_pending = confirmed(MAIN, 0..=2)
            .into_iter()
            .chain(confirmed(FORK, 3..=5))
            .collect::<HashSet<_>>();

        assert_eq!(pending_blocks(&graph), expected_pending);
    }

    #[test]
    fn child_chain_added_later_receives_existing_confirmations() {
        let child = child_name();
        let mut graph = Graph::default();

        for block_number in 0..=2 {
            graph.apply_block(
                confirming(MAIN, block_number, &child, hash(CONFIRMED, block_number)),
                block_number,
                previous(MAIN, block_number),
            );
        }

        let graph = graph.with_child_chain(child, Graph::default());

        assert_eq!(
            pending_blocks(&graph),
            (0..=2)
                .map(|block_number| hash(CONFIRMED, block_number))
                .collect(),
        );
    }

    #[test]
    fn batched_insertion_inserts_descendants_first() {
        let graph = Graph::default().with_child_chain(child_name(), Graph::default());

        let insertion = ChainInsertion::new(
            confirming(CONFIRMED, 0, &child_name(), hash(MAIN, 0)),
            0,
            H256::zero(),
        )
        .with_descendant(
            child_name(),
            ChainInsertion::new(block(MAIN, 0), 0, H256::zero()),
        );

        let graph = graph.insert_batch(&insertion);

        assert_eq!(graph.tip(), Some(hash(CONFIRMED, 0)));
        assert_eq!(child_tip(&graph), Some(hash(MAIN, 0)));
        assert!(pending_blocks(&graph).is_empty());
        assert_eq!(
            graph
                .child_chain(&child_name())
                .and_then(|child| child.block(hash(MAIN, 0)))
                .and_then(Block::earliest_parent),
            Some(0),
        );
    }

    #[test]
    fn insert_at_ignores_unknown_chains() {
        let graph = Graph::default().with_child_chain(child_name(), Graph::default());
        let unknown = [ChainName::from("Unknown")];

        let unchanged = graph.insert_at(&unknown, block(MAIN, 0), 0, H256::zero());

        assert_eq!(unchanged.tip(), None);
        assert_eq!(child_tip(&unchanged), None);

        let inserted = graph.insert_at(&[child_name()], block(MAIN, 0), 0, H256::zero());

        assert_eq!(inserted.tip(), None);
        assert_eq!(child_tip(&inserted), Some(hash(MAIN, 0)));
    }
}
