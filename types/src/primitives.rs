use std::sync::Arc;

use derive_more::{Debug, Display};
use serde::{Deserialize, Serialize};

pub use ethereum_types::H256;

/// Block hashes and difficulty targets.
///
/// Difficulty targets are compared as big-endian 256-bit numbers.
/// A smaller target requires more work.
pub type Digest = H256;

pub type Number = u64;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, Serialize, Deserialize)]
#[debug("{_0:?}")]
#[serde(transparent)]
pub struct ChainName(Arc<str>);

impl From<&str> for ChainName {
    fn from(name: &str) -> Self {
        Self(name.into())
    }
}

impl From<String> for ChainName {
    fn from(name: String) -> Self {
        Self(name.into())
    }
}

impl AsRef<str> for ChainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifies a segment within a single chain.
///
/// Segment IDs are drawn at random rather than assigned sequentially. Branches may be created
/// while resolving orphans or splitting segments deep inside a tree, where there is no cheap way
/// to find the lowest unused ID.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display)]
#[debug("{_0:?}")]
pub struct SegmentId(H256);

impl SegmentId {
    // `ThreadRng` is a CSPRNG, so IDs of branches created concurrently will not collide.
    #[must_use]
    pub fn random() -> Self {
        Self(H256(rand::random()))
    }
}
