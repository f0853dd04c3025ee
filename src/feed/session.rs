// SPDX-License-Identifier: MPL-2.0

use crate::feed::{FeedAggregator, FeedError, PaginationController};
use crate::model::{FeedItem, ProfileId};
use crate::remote::FeedBackend;
use crate::state::{Generation, SessionEpoch};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Everything a feed session owns. Only touched under [`SessionCore`]'s lock.
#[derive(Debug, Default)]
pub(crate) struct FeedState {
    pub aggregator: FeedAggregator,
    pub pagination: PaginationController,
    /// Viewer the current items were loaded for.
    pub viewer: Option<ProfileId>,
    /// Newer head items found by a new-items check, not yet shown.
    pub pending_new: Vec<FeedItem>,
    pub checking_new: bool,
    /// Bumped whenever the head page is replaced.
    pub head_revision: u64,
}

impl FeedState {
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.aggregator.snapshot().to_vec(),
            is_loading_initial: self.pagination.is_loading_initial(),
            is_loading_more: self.pagination.is_loading_more(),
            has_more: self.pagination.has_more(),
            last_error: self.pagination.last_error().cloned(),
            pending_new_count: self.pending_new.len(),
        }
    }
}

/// Read-only view of a feed session, published after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<FeedItem>,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    pub last_error: Option<FeedError>,
    pub pending_new_count: usize,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        FeedState::default().snapshot()
    }
}

/// Single owner of a session's state.
///
/// All writes go through one mutex and are never held across an await, so
/// state transitions are serialized while network calls run concurrently.
pub(crate) struct SessionCore {
    state: Mutex<FeedState>,
    epoch: SessionEpoch,
    backend: Arc<dyn FeedBackend>,
    snapshots: watch::Sender<FeedSnapshot>,
}

impl SessionCore {
    pub fn new(backend: Arc<dyn FeedBackend>) -> Arc<Self> {
        let (snapshots, _) = watch::channel(FeedSnapshot::default());
        Arc::new(Self {
            state: Mutex::new(FeedState::default()),
            epoch: SessionEpoch::new(),
            backend,
            snapshots,
        })
    }

    pub fn backend(&self) -> Arc<dyn FeedBackend> {
        Arc::clone(&self.backend)
    }

    pub fn generation(&self) -> Generation {
        self.epoch.current()
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.epoch.is_current(generation)
    }

    pub fn read<R>(&self, f: impl FnOnce(&FeedState) -> R) -> R {
        let state = self.state.lock().expect("feed state lock poisoned");
        f(&state)
    }

    /// Apply `f` and publish the resulting snapshot.
    pub fn update<R>(&self, f: impl FnOnce(&mut FeedState) -> R) -> R {
        let mut state = self.state.lock().expect("feed state lock poisoned");
        let result = f(&mut state);
        self.publish(&state);
        result
    }

    /// Like [`update`](Self::update), but only while `generation` is still
    /// the live one. Returns `None` for a disposed session.
    pub fn update_if_current<R>(
        &self,
        generation: Generation,
        f: impl FnOnce(&mut FeedState) -> R,
    ) -> Option<R> {
        let mut state = self.state.lock().expect("feed state lock poisoned");
        if !self.epoch.is_current(generation) {
            return None;
        }
        let result = f(&mut state);
        self.publish(&state);
        Some(result)
    }

    /// Notify subscribers, unless nothing they can see has changed.
    fn publish(&self, state: &FeedState) {
        let next = state.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.read(FeedState::snapshot)
    }

    /// Dispose of the session: drop its items and invalidate every
    /// generation captured so far.
    pub fn close(&self) {
        let mut state = self.state.lock().expect("feed state lock poisoned");
        self.epoch.advance();
        *state = FeedState::default();
        self.publish(&state);
    }
}
