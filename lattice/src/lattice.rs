use anyhow::{bail, ensure, Result};
use chain_graph::{ChainInsertion, Graph, GraphConfig, InsertOutcome};
use im::OrdMap;
use log::info;
use static_assertions::assert_impl_all;
use types::{
    block::Block,
    chain_path::ChainPath,
    primitives::{ChainName, Digest, Number},
};

use crate::error::Error;

#[derive(Clone, Default, Debug)]
pub struct Lattice {
    root_chains: OrdMap<ChainName, Graph>,
}

// Snapshots are read from any thread while a writer builds the next version.
assert_impl_all!(Lattice: Send, Sync);

impl Lattice {
    #[must_use]
    pub const fn root_chains(&self) -> &OrdMap<ChainName, Graph> {
        &self.root_chains
    }

    #[must_use]
    pub fn chain(&self, path: &[ChainName]) -> Option<&Graph> {
        let (root, descendants) = path.split_first()?;

        descendants
            .iter()
            .try_fold(self.root_chains.get(root)?, |graph, chain_name| {
                graph.child_chain(chain_name)
            })
    }

    fn chain_mut(&mut self, path: &[ChainName]) -> Option<&mut Graph> {
        let (root, descendants) = path.split_first()?;

        descendants
            .iter()
            .try_fold(self.root_chains.get_mut(root)?, |graph, chain_name| {
                graph.child_chain_mut(chain_name)
            })
    }

    #[must_use]
    pub fn tip(&self, path: &[ChainName]) -> Option<Digest> {
        self.chain(path)?.tip()
    }

    /// Registers a new chain.
    ///
    /// The last name in `path` is the name of the new chain. The rest must lead to a registered
    /// chain, which becomes its parent.
    pub fn add_chain(&self, path: &ChainPath, config: GraphConfig) -> Result<Self> {
        let mut lattice = self.clone();
        lattice.register_chain(path, config)?;
        Ok(lattice)
    }

    pub fn register_chain(&mut self, path: &ChainPath, config: GraphConfig) -> Result<()> {
        let Some((chain_name, parent_path)) = path.split_last() else {
            bail!(Error::EmptyPath);
        };

        ensure!(
            self.chain(path).is_none(),
            Error::ChainAlreadyRegistered { path: path.clone() },
        );

        if parent_path.is_empty() {
            self.root_chains
                .insert(chain_name.clone(), Graph::new(config));
        } else {
            let Some(parent) = self.chain_mut(parent_path) else {
                bail!(Error::ChainNotFound {
                    path: parent_path.iter().cloned().collect(),
                });
            };

            parent.add_child_chain(chain_name.clone(), Graph::new(config));
        }

        info!("registered chain {path} (max length: {:?})", config.max_length);

        Ok(())
    }

    pub fn insert(
        &self,
        path: &ChainPath,
        block: Block,
        block_number: Number,
        previous_block_fingerprint: Digest,
    ) -> Result<Self> {
        let mut lattice = self.clone();
        lattice.apply_block(path, block, block_number, previous_block_fingerprint)?;
        Ok(lattice)
    }

    pub fn apply_block(
        &mut self,
        path: &ChainPath,
        block: Block,
        block_number: Number,
        previous_block_fingerprint: Digest,
    ) -> Result<InsertOutcome> {
        let Some(graph) = self.chain_mut(path) else {
            bail!(Error::ChainNotFound { path: path.clone() });
        };

        Ok(graph.apply_block(block, block_number, previous_block_fingerprint))
    }

    /// Inserts a block into a root chain along with blocks of its descendant chains.
    pub fn insert_batch(&self, root: &ChainName, insertion: &ChainInsertion) -> Result<Self> {
        let mut lattice = self.clone();
        lattice.apply_batch(root, insertion)?;
        Ok(lattice)
    }

    pub fn apply_batch(
        &mut self,
        root: &ChainName,
        insertion: &ChainInsertion,
    ) -> Result<InsertOutcome> {
        let Some(graph) = self.root_chains.get_mut(root) else {
            bail!(Error::ChainNotFound {
                path: ChainPath::from(vec![root.clone()]),
            });
        };

        Ok(graph.apply_batch(insertion))
    }
}
