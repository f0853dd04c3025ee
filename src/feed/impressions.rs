// SPDX-License-Identifier: MPL-2.0

use crate::model::ItemId;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

static SHARED: Lazy<ImpressionTracker> = Lazy::new(ImpressionTracker::new);

/// Set of ads already reported as viewed during this process.
///
/// Never persisted. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct ImpressionTracker {
    seen: Arc<Mutex<HashSet<ItemId>>>,
}

impl ImpressionTracker {
    /// A tracker with its own empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide tracker, shared by every feed session.
    pub fn shared() -> Self {
        SHARED.clone()
    }

    /// True only the first time `ad` is seen; records it.
    pub fn mark_viewed_if_new(&self, ad: ItemId) -> bool {
        self.seen.lock().expect("impression lock poisoned").insert(ad)
    }

    pub fn has_viewed(&self, ad: &ItemId) -> bool {
        self.seen
            .lock()
            .expect("impression lock poisoned")
            .contains(ad)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().expect("impression lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
