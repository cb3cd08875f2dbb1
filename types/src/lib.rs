//! Value types shared by every chain in a lattice.
//!
//! Digests, block numbers and chain names are opaque to the chain graph. It only compares,
//! hashes and orders them. Blocks reaching these types have already been validated.

pub mod block;
pub mod chain_path;
pub mod primitives;
