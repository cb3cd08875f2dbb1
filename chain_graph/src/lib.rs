//! The in-memory state of a lattice of chains.
//!
//! Each chain is a [`Graph`]: a forest of [`Segment`] trees. A segment is a run of consecutive
//! blocks together with the forks that branch off its last block. In the ideal case a chain is a
//! single segment. Forks are created by splitting a segment in two at the block the fork builds
//! on.
//!
//! Blocks on one chain may confirm blocks on its child chains. A confirmation becomes a parent
//! edge on the confirmed block. Confirmations take precedence over chain length when choosing the
//! tip (see [`Score`]), so a reorganization of a parent chain can move the tips of its children.
//! Only confirmations made by blocks on the canonical chain count. Whenever the tip of a chain
//! moves, the confirmations made by blocks that left or joined the canonical chain are pushed
//! down to child chains as a single batch.
//!
//! Blocks whose previous block is unknown are kept as orphan segments until the missing block
//! arrives. Orphans do not take part in tip selection.
//!
//! All collections are persistent. Cloning a [`Graph`] is cheap, which lets readers keep using a
//! snapshot while the next one is being computed.

pub use crate::{
    graph::Graph,
    graph_config::GraphConfig,
    misc::{
        ChainConfirmations, ChainInsertion, ConfirmationChanges, ConfirmationRoutes,
        IgnoreReason, InsertOutcome, LocationChanges, ParentConfirmations,
    },
    segment::{Score, Segment},
};

mod graph;
mod graph_config;
mod misc;
mod segment;
