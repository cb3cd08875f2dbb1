use std::sync::Arc;

use anyhow::Result;
use arc_swap::{ArcSwap, Guard};
use chain_graph::{ChainInsertion, GraphConfig, InsertOutcome};
use log::debug;
use parking_lot::Mutex;
use types::{
    block::Block,
    chain_path::ChainPath,
    primitives::{ChainName, Digest, Number},
};

use crate::lattice::Lattice;

/// Shares a [`Lattice`] between threads.
///
/// Reads never block. Writes are serialized and take effect atomically: a write that fails
/// leaves the shared [`Lattice`] as it was.
pub struct Controller {
    // Only updated while `writer` is locked.
    snapshot: ArcSwap<Lattice>,
    writer: Mutex<Lattice>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(Lattice::default())
    }
}

impl Controller {
    #[must_use]
    pub fn new(lattice: Lattice) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(lattice.clone()),
            writer: Mutex::new(lattice),
        }
    }

    pub fn snapshot(&self) -> Guard<Arc<Lattice>> {
        self.snapshot.load()
    }

    #[must_use]
    pub fn owned_snapshot(&self) -> Arc<Lattice> {
        self.snapshot.load_full()
    }

    #[must_use]
    pub fn tip(&self, path: &ChainPath) -> Option<Digest> {
        self.snapshot().tip(path)
    }

    pub fn add_chain(&self, path: &ChainPath, config: GraphConfig) -> Result<()> {
        self.update(|lattice| lattice.register_chain(path, config))
    }

    pub fn insert(
        &self,
        path: &ChainPath,
        block: Block,
        block_number: Number,
        previous_block_fingerprint: Digest,
    ) -> Result<InsertOutcome> {
        self.update(|lattice| {
            lattice.apply_block(path, block, block_number, previous_block_fingerprint)
        })
    }

    pub fn insert_batch(
        &self,
        root: &ChainName,
        insertion: &ChainInsertion,
    ) -> Result<InsertOutcome> {
        self.update(|lattice| lattice.apply_batch(root, insertion))
    }

    fn update<T>(&self, mutate: impl FnOnce(&mut Lattice) -> Result<T>) -> Result<T> {
        let mut current = self.writer.lock();
        let mut next = current.clone();
        let output = mutate(&mut next)?;

        *current = next;

        // `ArcSwap::rcu` is not necessary here because `writer` admits one thread at a time.
        self.snapshot.store(Arc::new(current.clone()));

        debug!("published lattice with {} root chains", current.root_chains().len());

        Ok(output)
    }
}
