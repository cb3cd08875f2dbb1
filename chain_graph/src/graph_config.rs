use core::num::NonZeroU64;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    /// Number of blocks below the tip to retain.
    ///
    /// Blocks numbered below `tip_number - max_length` are rejected on insertion and trimmed from
    /// the graph. `None` keeps every block forever.
    #[serde(default)]
    pub max_length: Option<NonZeroU64>,
}

impl GraphConfig {
    /// Interprets a maximum length of 0 as unlimited retention.
    #[must_use]
    pub fn with_max_length(max_length: Option<u64>) -> Self {
        Self {
            max_length: max_length.and_then(NonZeroU64::new),
        }
    }
}
