//! The tree of chains.
//!
//! [`Lattice`] maps names of root chains to their [`Graph`]s and routes blocks to chains by
//! [`ChainPath`]. Descendant chains are owned by the [`Graph`] of their parent.
//!
//! [`Controller`] shares a [`Lattice`] between threads. Readers work with snapshots while a single
//! writer at a time computes the next version.
//!
//! [`Graph`]:     chain_graph::Graph
//! [`ChainPath`]: types::chain_path::ChainPath

// Proving `Lattice: Send + Sync` walks nested `im` nodes of recursive segment trees.
#![recursion_limit = "256"]

pub use crate::{controller::Controller, error::Error, lattice::Lattice};

mod controller;
mod error;
mod lattice;
