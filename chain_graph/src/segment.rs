use core::{cmp::Reverse, ops::RangeInclusive};
use std::collections::HashMap;

use arithmetic::NumberExt as _;
use im::{OrdMap, Vector};
use types::{
    block::Block,
    primitives::{Digest, Number, SegmentId, H256},
};
use unwrap_none::UnwrapNone as _;

use crate::misc::{ChainConfirmations, ConfirmationChanges, ConfirmationRoutes, LocationChanges};

/// How strongly a segment subtree competes for the tip.
///
/// Greater scores dominate. Fields are compared in declaration order:
/// - A subtree confirmed by a parent chain beats one that is not. Between two confirmed subtrees
///   the one with the earlier confirmation wins.
/// - A higher tip number wins.
/// - A smaller difficulty target wins.
/// - The greater tip hash wins. This only matters for forks that are otherwise identical.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Score {
    pub earliest_parent: Option<Number>,
    pub tip_number: Number,
    pub difficulty_target: Digest,
    pub tip_hash: Digest,
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        // `None < Some(_)`, so wrapping numbers in `Reverse` makes any confirmation beat none.
        self.earliest_parent
            .map(Reverse)
            .cmp(&other.earliest_parent.map(Reverse))
            .then_with(|| self.tip_number.cmp(&other.tip_number))
            .then_with(|| other.difficulty_target.cmp(&self.difficulty_target))
            .then_with(|| self.tip_hash.cmp(&other.tip_hash))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A run of consecutive blocks together with the forks that branch off its last block.
///
/// Segments form a tree. Every child segment starts at the block number right after the last
/// block of its parent. Each segment caches a summary of its whole subtree:
/// - `tip_number`, `tip_hash` and `latest_block_difficulty_target` describe the tip of the
///   dominant branch (see [`Score`]).
/// - `earliest_parent` is the earliest parent chain confirmation of any block in the subtree.
/// - `total_parents` is the number of parent chain confirmations in the subtree.
///
/// Segments are persistent. Operations return updated copies that share structure with the
/// original.
#[derive(Clone, Debug)]
pub struct Segment {
    first_block_number: Number,
    // This is never empty. A segment always contains at least one block.
    blocks: Vector<Block>,
    child_segments: OrdMap<SegmentId, Segment>,
    tip_number: Number,
    tip_hash: Digest,
    latest_block_difficulty_target: Digest,
    earliest_parent: Option<Number>,
    total_parents: usize,
    // Like `earliest_parent` and `total_parents`, but only over blocks owned by this segment.
    own_earliest_parent: Option<Number>,
    own_total_parents: usize,
}

impl Segment {
    #[must_use]
    pub fn with_single_block(block: Block, block_number: Number) -> Self {
        Self::from_blocks(block_number, Vector::unit(block), OrdMap::new())
    }

    fn from_blocks(
        first_block_number: Number,
        blocks: Vector<Block>,
        child_segments: OrdMap<SegmentId, Self>,
    ) -> Self {
        assert!(!blocks.is_empty(), "every segment contains at least one block");

        let mut segment = Self {
            first_block_number,
            blocks,
            child_segments,
            tip_number: first_block_number,
            tip_hash: H256::zero(),
            latest_block_difficulty_target: H256::zero(),
            earliest_parent: None,
            total_parents: 0,
            own_earliest_parent: None,
            own_total_parents: 0,
        };

        segment.rescan_own_blocks();
        segment.refresh();
        segment
    }

    #[must_use]
    pub const fn first_block_number(&self) -> Number {
        self.first_block_number
    }

    /// Number of the last block owned by this segment.
    #[must_use]
    pub fn latest_block(&self) -> Number {
        let offset = Number::try_from(self.blocks.len() - 1)
            .expect("segment length should fit in a block number");

        self.first_block_number + offset
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub const fn tip_number(&self) -> Number {
        self.tip_number
    }

    #[must_use]
    pub const fn tip_hash(&self) -> Digest {
        self.tip_hash
    }

    #[must_use]
    pub const fn latest_block_difficulty_target(&self) -> Digest {
        self.latest_block_difficulty_target
    }

    #[must_use]
    pub const fn earliest_parent(&self) -> Option<Number> {
        self.earliest_parent
    }

    #[must_use]
    pub const fn total_parents(&self) -> usize {
        self.total_parents
    }

    #[must_use]
    pub const fn score(&self) -> Score {
        Score {
            earliest_parent: self.earliest_parent,
            tip_number: self.tip_number,
            difficulty_target: self.latest_block_difficulty_target,
            tip_hash: self.tip_hash,
        }
    }

    #[must_use]
    pub const fn blocks(&self) -> &Vector<Block> {
        &self.blocks
    }

    #[must_use]
    pub fn first_block(&self) -> &Block {
        self.blocks
            .front()
            .expect("every segment contains at least one block")
    }

    #[must_use]
    pub fn last_block(&self) -> &Block {
        self.blocks
            .back()
            .expect("every segment contains at least one block")
    }

    #[must_use]
    pub fn block(&self, block_number: Number) -> Option<&Block> {
        self.blocks.get(self.index_of(block_number)?)
    }

    /// Blocks owned by this segment paired with their numbers.
    pub fn numbered_blocks(&self) -> impl Iterator<Item = (Number, &Block)> {
        (self.first_block_number..=self.latest_block()).zip(&self.blocks)
    }

    #[must_use]
    pub const fn child_segments(&self) -> &OrdMap<SegmentId, Self> {
        &self.child_segments
    }

    /// Looks up a segment in the subtree.
    ///
    /// `path` starts with a child of this segment. An empty path refers to this segment.
    #[must_use]
    pub fn descendant(&self, path: &[SegmentId]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |segment, child_id| segment.child_segments.get(child_id))
    }

    /// IDs of the segments along the dominant branch, starting with a child of this segment.
    #[must_use]
    pub fn dominant_path(&self) -> Vec<SegmentId> {
        core::iter::successors(self.dominant_child(), |(_, child)| child.dominant_child())
            .map(|(child_id, _)| *child_id)
            .collect()
    }

    fn dominant_child(&self) -> Option<(&SegmentId, &Self)> {
        self.child_segments
            .iter()
            .max_by_key(|(_, child)| child.score())
    }

    #[must_use]
    pub fn add_to_start(&self, block: Block, block_number: Number) -> Self {
        assert_eq!(
            block_number.successor(),
            self.first_block_number,
            "prepended block must immediately precede the first block of the segment",
        );

        let mut segment = self.clone();

        segment.own_earliest_parent = lower(segment.own_earliest_parent, block.earliest_parent());
        segment.own_total_parents += block.total_parents();
        segment.blocks.push_front(block);
        segment.first_block_number = block_number;
        segment.refresh();
        segment
    }

    /// Appends the blocks of `segment` to this one, which must not have any children.
    ///
    /// The children of `segment` become children of the result.
    #[must_use]
    pub fn add_to_end(&self, segment: Self) -> Self {
        let mut extended = self.clone();
        extended.extend(segment);
        extended
    }

    /// Adds `segment` as a fork branching off the last block of this segment.
    #[must_use]
    pub fn add_as_child(&self, segment_id: SegmentId, segment: Self) -> Self {
        let mut parent = self.clone();
        parent.adopt(segment_id, segment);
        parent
    }

    /// Attaches `segment` to the block `previous_block_fingerprint` somewhere in this subtree.
    ///
    /// `path` leads from this segment to the segment that contains `previous_block_fingerprint`.
    /// The block number of the attachment point is derived from the first block of `segment`.
    ///
    /// Depending on where the attachment point is, `segment` is either appended to a leaf,
    /// added as a new child, or the segment containing the attachment point is split in two and
    /// `segment` becomes a sibling of the second half.
    ///
    /// Returns the updated subtree along with the index updates the caller has to apply.
    #[must_use]
    pub fn insert(
        &self,
        current_segment_id: SegmentId,
        path: &[SegmentId],
        segment: Self,
        segment_id: SegmentId,
        previous_block_fingerprint: Digest,
    ) -> (Self, LocationChanges) {
        let mut updated = self.clone();
        let mut changes = LocationChanges::default();

        updated.splice(
            current_segment_id,
            path,
            segment,
            segment_id,
            previous_block_fingerprint,
            &mut changes,
        );

        (updated, changes)
    }

    fn splice(
        &mut self,
        current_segment_id: SegmentId,
        path: &[SegmentId],
        segment: Self,
        segment_id: SegmentId,
        previous_block_fingerprint: Digest,
        changes: &mut LocationChanges,
    ) {
        if let Some((child_id, rest)) = path.split_first() {
            self.child_segments
                .get_mut(child_id)
                .expect("path should only contain descendants of the current segment")
                .splice(
                    *child_id,
                    rest,
                    segment,
                    segment_id,
                    previous_block_fingerprint,
                    changes,
                );

            self.refresh();
            return;
        }

        let attachment_number = segment
            .first_block_number
            .predecessor()
            .expect("a segment that builds on another block cannot start at block 0");

        assert_eq!(
            self.block(attachment_number).map(Block::block_hash),
            Some(previous_block_fingerprint),
            "segment should be attached to the block it builds on",
        );

        if attachment_number == self.latest_block() && self.child_segments.is_empty() {
            for block in &segment.blocks {
                changes
                    .block_locations
                    .insert(block.block_hash(), current_segment_id);
            }

            for grandchild_id in segment.child_segments.keys() {
                changes
                    .segment_parents
                    .insert(*grandchild_id, current_segment_id);
            }

            self.extend(segment);
            return;
        }

        if attachment_number < self.latest_block() {
            self.split_after(current_segment_id, attachment_number, changes);
        }

        for block in &segment.blocks {
            changes.block_locations.insert(block.block_hash(), segment_id);
        }

        changes
            .segment_parents
            .insert(segment_id, current_segment_id);

        self.adopt(segment_id, segment);
    }

    fn extend(&mut self, segment: Self) {
        assert!(
            self.child_segments.is_empty(),
            "only segments without children can be extended",
        );

        assert_eq!(
            segment.first_block_number,
            self.latest_block().successor(),
            "appended segment must continue where the current one ends",
        );

        let Self {
            blocks,
            child_segments,
            own_earliest_parent,
            own_total_parents,
            ..
        } = segment;

        self.blocks.append(blocks);
        self.own_earliest_parent = lower(self.own_earliest_parent, own_earliest_parent);
        self.own_total_parents += own_total_parents;
        self.child_segments = child_segments;
        self.refresh();
    }

    fn adopt(&mut self, segment_id: SegmentId, segment: Self) {
        assert_eq!(
            segment.first_block_number,
            self.latest_block().successor(),
            "child segment must start right after the last block of its parent",
        );

        self.child_segments
            .insert(segment_id, segment)
            .expect_none("segment IDs are random and should never collide");

        self.refresh();
    }

    // Moves the blocks after `block_number` and all children into a new child segment.
    fn split_after(
        &mut self,
        current_segment_id: SegmentId,
        block_number: Number,
        changes: &mut LocationChanges,
    ) {
        let back_id = SegmentId::random();
        let last_moved = self.latest_block();
        let back_blocks = self.blocks.split_off(self.resolve(block_number) + 1);
        let back_children = core::mem::take(&mut self.child_segments);

        for block in &back_blocks {
            changes.block_locations.insert(block.block_hash(), back_id);
        }

        for child_id in back_children.keys() {
            changes.segment_parents.insert(*child_id, back_id);
        }

        changes.segment_parents.insert(back_id, current_segment_id);

        features::log!(
            DebugChainGraph,
            "split segment {current_segment_id} after block {block_number} \
             (blocks {}..={last_moved} moved to {back_id})",
            block_number.successor(),
        );

        let back = Self::from_blocks(block_number.successor(), back_blocks, back_children);

        self.child_segments = OrdMap::unit(back_id, back);
        self.rescan_own_blocks();
        self.refresh();
    }

    /// Applies a batch of parent confirmation changes to the blocks `routes` lead to.
    #[must_use]
    pub fn change_parent_confirmations(
        &self,
        routes: &ConfirmationRoutes,
        changes: &ConfirmationChanges,
    ) -> Self {
        let mut updated = self.clone();
        updated.apply_parent_confirmations(routes, changes);
        updated
    }

    fn apply_parent_confirmations(
        &mut self,
        routes: &ConfirmationRoutes,
        changes: &ConfirmationChanges,
    ) {
        for (child_id, child_routes) in &routes.descendants {
            self.child_segments
                .get_mut(child_id)
                .expect("confirmation routes should only lead through existing segments")
                .apply_parent_confirmations(child_routes, changes);
        }

        for (block_hash, block_number) in &routes.blocks {
            let removals = changes.removals.get(block_hash);
            let additions = changes.additions.get(block_hash);

            self.update_block(*block_number, *block_hash, |block| {
                let without_removed = removals
                    .into_iter()
                    .flat_map(HashMap::keys)
                    .fold(block.clone(), |block, parent| {
                        block.remove_parent(*parent).unwrap_or(block)
                    });

                match additions {
                    Some(additions) => without_removed.with_parent_confirmations(
                        additions
                            .iter()
                            .map(|(parent, parent_number)| (*parent, *parent_number)),
                    ),
                    None => without_removed,
                }
            });
        }

        self.refresh();
    }

    /// Adds a parent chain confirmation to a block owned by this segment.
    #[must_use]
    pub fn add_parent(
        &self,
        block_number: Number,
        parent: Digest,
        parent_block_number: Number,
    ) -> Self {
        let mut segment = self.clone();
        let block_hash = segment.resolve_block(block_number).block_hash();

        segment.update_block(block_number, block_hash, |block| {
            block.add_parent(parent, parent_block_number)
        });

        segment.refresh();
        segment
    }

    /// Removes a parent chain confirmation from a block owned by this segment.
    ///
    /// Confirmations the block does not have are ignored.
    #[must_use]
    pub fn remove_parent(&self, block_number: Number, parent: Digest) -> Self {
        let mut segment = self.clone();
        let block_hash = segment.resolve_block(block_number).block_hash();

        segment.update_block(block_number, block_hash, |block| {
            block.remove_parent(parent).unwrap_or_else(|| block.clone())
        });

        segment.refresh();
        segment
    }

    // Replaces an owned block and updates the summary of owned blocks.
    // The caller is responsible for refreshing the subtree summary.
    fn update_block(
        &mut self,
        block_number: Number,
        block_hash: Digest,
        update: impl FnOnce(&Block) -> Block,
    ) {
        let index = self.resolve(block_number);
        let old_block = &self.blocks[index];

        assert_eq!(
            old_block.block_hash(),
            block_hash,
            "block {block_number} should have the expected hash",
        );

        let old_earliest = old_block.earliest_parent();
        let old_total = old_block.total_parents();
        let new_block = update(old_block);
        let new_earliest = new_block.earliest_parent();

        self.own_total_parents = self.own_total_parents - old_total + new_block.total_parents();
        self.blocks.set(index, new_block);

        let raised = match (old_earliest, new_earliest) {
            (Some(old), Some(new)) => new > old,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if raised && old_earliest == self.own_earliest_parent {
            self.own_earliest_parent = self.blocks.iter().filter_map(Block::earliest_parent).min();
        } else {
            self.own_earliest_parent = lower(self.own_earliest_parent, new_earliest);
        }
    }

    /// Collects the child chain confirmations made by blocks in this segment and the segments
    /// along `path`.
    #[must_use]
    pub fn child_confirmations(&self, path: &[SegmentId]) -> ChainConfirmations {
        let mut confirmations = ChainConfirmations::new();
        let mut segment = self;

        segment.collect_confirmations(segment.block_numbers(), &mut confirmations);

        for child_id in path {
            segment = segment
                .child_segments
                .get(child_id)
                .expect("path should only contain descendants of the current segment");

            segment.collect_confirmations(segment.block_numbers(), &mut confirmations);
        }

        confirmations
    }

    /// Child chain confirmations along the dominant branch of this subtree.
    #[must_use]
    pub fn dominant_confirmations(&self) -> ChainConfirmations {
        self.child_confirmations(&self.dominant_path())
    }

    pub(crate) fn collect_confirmations(
        &self,
        block_numbers: RangeInclusive<Number>,
        confirmations: &mut ChainConfirmations,
    ) {
        let (first, last) = block_numbers.into_inner();
        let start = self.resolve(first);
        let end = self.resolve(last);

        let blocks = self.blocks.iter().skip(start).take(end + 1 - start);

        for (block_number, block) in (first..=last).zip(blocks) {
            for (chain_name, child_hash) in block.child_confirmations() {
                confirmations
                    .entry(chain_name.clone())
                    .or_default()
                    .entry(child_hash)
                    .or_default()
                    .insert(block.block_hash(), block_number);
            }
        }
    }

    pub(crate) fn into_parts(self) -> (Vector<Block>, OrdMap<SegmentId, Self>) {
        (self.blocks, self.child_segments)
    }

    fn block_numbers(&self) -> RangeInclusive<Number> {
        self.first_block_number..=self.latest_block()
    }

    fn index_of(&self, block_number: Number) -> Option<usize> {
        block_number
            .checked_sub(self.first_block_number)
            .and_then(|offset| usize::try_from(offset).ok())
            .filter(|index| *index < self.blocks.len())
    }

    fn resolve(&self, block_number: Number) -> usize {
        self.index_of(block_number).unwrap_or_else(|| {
            panic!(
                "block {block_number} is outside of segment covering {}..={}",
                self.first_block_number,
                self.latest_block(),
            )
        })
    }

    fn resolve_block(&self, block_number: Number) -> &Block {
        &self.blocks[self.resolve(block_number)]
    }

    fn rescan_own_blocks(&mut self) {
        self.own_earliest_parent = self.blocks.iter().filter_map(Block::earliest_parent).min();
        self.own_total_parents = self.blocks.iter().map(Block::total_parents).sum();
    }

    fn refresh(&mut self) {
        let (tip_number, tip_hash, difficulty_target) = match self.dominant_child() {
            Some((_, dominant)) => (
                dominant.tip_number,
                dominant.tip_hash,
                dominant.latest_block_difficulty_target,
            ),
            None => {
                let last_block = self.last_block();
                let last_number = self.latest_block();
                (last_number, last_block.block_hash(), last_block.next_difficulty())
            }
        };

        self.tip_number = tip_number;
        self.tip_hash = tip_hash;
        self.latest_block_difficulty_target = difficulty_target;

        self.earliest_parent = self
            .child_segments
            .values()
            .filter_map(|child| child.earliest_parent)
            .chain(self.own_earliest_parent)
            .min();

        self.total_parents = self.own_total_parents
            + self
                .child_segments
                .values()
                .map(|child| child.total_parents)
                .sum::<usize>();
    }
}

fn lower(left: Option<Number>, right: Option<Number>) -> Option<Number> {
    left.into_iter().chain(right).min()
}
