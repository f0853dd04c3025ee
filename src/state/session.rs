// SPDX-License-Identifier: MPL-2.0

use std::sync::atomic::{AtomicU64, Ordering};

/// Generation number of a feed session, captured before an await and
/// compared after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Monotonic generation counter for a feed session.
///
/// Anything that suspends (a page fetch, a like call) captures the current
/// generation first and checks [`SessionEpoch::is_current`] before writing
/// back. Tearing the session down advances the counter, so late results
/// from a disposed session are dropped instead of applied.
#[derive(Debug, Default)]
pub struct SessionEpoch {
    generation: AtomicU64,
}

impl SessionEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Invalidate every previously captured generation.
    pub fn advance(&self) -> Generation {
        Generation(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }
}
