use core::num::NonZeroU64;

use easy_ext::ext;

// Block numbers are plain `u64`s. `advanced` and `successor` panic on overflow. Numbers taken from
// incoming blocks must be compared with `checked_add` before they reach them.
#[ext(NumberExt)]
pub impl u64 {
    #[inline]
    #[must_use]
    fn advanced(self, delta: i64) -> Self {
        self.checked_add_signed(delta)
            .expect("block number advanced out of the representable range")
    }

    #[inline]
    #[must_use]
    fn predecessor(self) -> Option<u64> {
        self.checked_sub(1)
    }

    #[inline]
    #[must_use]
    fn successor(self) -> Self {
        self.advanced(1)
    }

    /// Lowest block number still retained when the tip is at `self`.
    ///
    /// Blocks numbered below the threshold are considered stale.
    #[inline]
    #[must_use]
    fn retention_threshold(self, max_length: NonZeroU64) -> Self {
        self.saturating_sub(max_length.get())
    }
}
