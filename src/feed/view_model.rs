// SPDX-License-Identifier: MPL-2.0

use crate::feed::session::{FeedState, SessionCore};
use crate::feed::{
    FeedError, FeedSnapshot, ImpressionTracker, OptimisticMutationEngine, PendingMutation,
};
use crate::model::{FeedItem, ItemId, ItemKind, ProfileId};
use crate::remote::FeedBackend;
use crate::runtime;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What a load call ended up doing. Page failures are reported here and in
/// the snapshot's `last_error`, never as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing to do: a load was in flight, the feed is at its end, or the
    /// items are already there.
    Skipped,
    /// The page arrived; carries how many items became visible.
    Loaded(usize),
    /// The fetch failed; previously shown items are untouched.
    Failed(FeedError),
    /// The session was closed while the fetch was in flight.
    Discarded,
}

/// Entry point for the presentation layer: one instance per feed screen.
///
/// Every operation takes the viewer's profile id explicitly. Dropping the
/// view model (or calling [`close`](Self::close)) disposes of the session;
/// results still in flight are then thrown away.
pub struct FeedViewModel {
    core: Arc<SessionCore>,
    mutations: OptimisticMutationEngine,
    impressions: ImpressionTracker,
}

impl FeedViewModel {
    /// A session over `backend` using the process-wide impression set.
    pub fn new(backend: Arc<dyn FeedBackend>) -> Self {
        Self::with_impressions(backend, ImpressionTracker::shared())
    }

    pub fn with_impressions(backend: Arc<dyn FeedBackend>, impressions: ImpressionTracker) -> Self {
        let core = SessionCore::new(backend);
        Self {
            mutations: OptimisticMutationEngine::new(Arc::clone(&core)),
            core,
            impressions,
        }
    }

    /// Load the first page, unless a load is running or this viewer's items
    /// are already on screen.
    pub async fn load_initial(&self, viewer: ProfileId) -> LoadOutcome {
        let generation = self.core.generation();
        let started = self.core.update(|state| {
            if state.pagination.is_loading() {
                return false;
            }
            if state.viewer == Some(viewer) && !state.aggregator.is_empty() {
                return false;
            }
            state.pagination.begin_initial_load().is_ok()
        });
        if !started {
            debug!(viewer, "initial load skipped");
            return LoadOutcome::Skipped;
        }

        let result = self.core.backend().fetch_feed_page(viewer, None).await;

        let outcome = match result {
            Ok(page) => self.mutations.commit(generation, |state, queued| {
                let mut items = page.items;
                queued.overlay(&mut items);
                state.aggregator.replace(items);
                state.viewer = Some(viewer);
                state.pending_new.clear();
                state.head_revision += 1;
                state.pagination.complete_page(page.next_cursor, page.has_more);
                info!(viewer, items = state.aggregator.len(), has_more = page.has_more, "initial page loaded");
                LoadOutcome::Loaded(state.aggregator.len())
            }),
            Err(error) => self.core.update_if_current(generation, |state| {
                warn!(viewer, error = %error, "initial load failed");
                state.pagination.fail_page(error.clone());
                LoadOutcome::Failed(error)
            }),
        };
        outcome.unwrap_or(LoadOutcome::Discarded)
    }

    /// Fetch and append the page after the current cursor. A no-op at the
    /// end of the feed, while any load is in flight, or before the first
    /// page has arrived.
    pub async fn load_more(&self, viewer: ProfileId) -> LoadOutcome {
        let generation = self.core.generation();
        let cursor = self.core.update(|state| {
            if state.viewer != Some(viewer) {
                return None;
            }
            state.pagination.begin_load_more(state.aggregator.len())
        });
        let Some(cursor) = cursor else {
            return LoadOutcome::Skipped;
        };

        let result = self
            .core
            .backend()
            .fetch_feed_page(viewer, cursor.as_ref())
            .await;

        let outcome = match result {
            Ok(page) => self.mutations.commit(generation, |state, queued| {
                let mut items = page.items;
                items.retain(|item| !state.aggregator.contains(&item.id()));
                queued.overlay(&mut items);
                let added = state.aggregator.append(items);
                state.pagination.complete_page(page.next_cursor, page.has_more);
                info!(viewer, added, has_more = page.has_more, "next page loaded");
                LoadOutcome::Loaded(added)
            }),
            Err(error) => self.core.update_if_current(generation, |state| {
                warn!(viewer, error = %error, "load more failed");
                state.pagination.fail_page(error.clone());
                LoadOutcome::Failed(error)
            }),
        };
        outcome.unwrap_or(LoadOutcome::Discarded)
    }

    /// Pull-to-refresh: fetch the head page and swap it in. If the fetch
    /// fails the current items and cursor stay exactly as they were.
    pub async fn refresh(&self, viewer: ProfileId) -> LoadOutcome {
        let generation = self.core.generation();
        let checkpoint = self.core.update(|state| {
            if state.pagination.is_loading() {
                return None;
            }
            let checkpoint = state.pagination.checkpoint();
            state.pagination.reset();
            state.pagination.begin_initial_load().ok().map(|()| checkpoint)
        });
        let Some(checkpoint) = checkpoint else {
            debug!(viewer, "refresh skipped, load in flight");
            return LoadOutcome::Skipped;
        };

        let result = self.core.backend().fetch_feed_page(viewer, None).await;

        let outcome = match result {
            // Toggles still waiting on the server stay visible over the
            // fresh items.
            Ok(page) => self.mutations.commit(generation, |state, queued| {
                let mut items = page.items;
                queued.overlay(&mut items);
                state.aggregator.replace(items);
                state.viewer = Some(viewer);
                state.pending_new.clear();
                state.head_revision += 1;
                state.pagination.complete_page(page.next_cursor, page.has_more);
                info!(viewer, items = state.aggregator.len(), "feed refreshed");
                LoadOutcome::Loaded(state.aggregator.len())
            }),
            Err(error) => self.core.update_if_current(generation, |state| {
                warn!(viewer, error = %error, "refresh failed, keeping current items");
                state.pagination.restore(checkpoint);
                state.pagination.fail_page(error.clone());
                LoadOutcome::Failed(error)
            }),
        };
        outcome.unwrap_or(LoadOutcome::Discarded)
    }

    /// Look for items newer than the head of the feed without disturbing
    /// it. Found items are staged until [`reveal_new_items`](Self::reveal_new_items).
    pub async fn check_for_new_items(&self, viewer: ProfileId) -> LoadOutcome {
        let generation = self.core.generation();
        let revision = self.core.update(|state| {
            if state.checking_new
                || state.viewer != Some(viewer)
                || state.aggregator.is_empty()
            {
                return None;
            }
            state.checking_new = true;
            Some(state.head_revision)
        });
        let Some(revision) = revision else {
            return LoadOutcome::Skipped;
        };

        let result = self.core.backend().fetch_feed_page(viewer, None).await;

        self.core
            .update_if_current(generation, |state| {
                state.checking_new = false;
                match result {
                    // A refresh landed meanwhile and already shows the head.
                    Ok(_) if state.head_revision != revision => LoadOutcome::Skipped,
                    Ok(page) => {
                        let fresh: Vec<FeedItem> = page
                            .items
                            .into_iter()
                            .take_while(|item| !state.aggregator.contains(&item.id()))
                            .collect();
                        debug!(viewer, new_items = fresh.len(), "checked for new items");
                        let found = fresh.len();
                        state.pending_new = fresh;
                        LoadOutcome::Loaded(found)
                    }
                    Err(error) => {
                        debug!(viewer, error = %error, "new items check failed");
                        LoadOutcome::Failed(error)
                    }
                }
            })
            .unwrap_or(LoadOutcome::Discarded)
    }

    /// Move staged new items to the top of the feed. Returns how many were
    /// inserted.
    pub fn reveal_new_items(&self) -> usize {
        self.prepend_with(|state| std::mem::take(&mut state.pending_new))
    }

    /// Put locally created items (e.g. the viewer's fresh publication) at
    /// the top of the feed.
    pub fn prepend_local(&self, items: Vec<FeedItem>) -> usize {
        self.prepend_with(|_| items)
    }

    fn prepend_with(&self, take: impl FnOnce(&mut FeedState) -> Vec<FeedItem>) -> usize {
        self.mutations
            .commit(self.core.generation(), |state, queued| {
                let mut items = take(state);
                items.retain(|item| !state.aggregator.contains(&item.id()));
                queued.overlay(&mut items);
                state.aggregator.prepend(items)
            })
            .unwrap_or(0)
    }

    pub fn toggle_like(&self, item: ItemId, viewer: ProfileId) -> Result<PendingMutation, FeedError> {
        self.mutations.toggle_like(item, viewer)
    }

    pub fn toggle_save(&self, item: ItemId, viewer: ProfileId) -> Result<PendingMutation, FeedError> {
        self.mutations.toggle_save(item, viewer)
    }

    /// Report an ad as seen, at most once per ad per process. Returns true
    /// when this call triggered the report.
    pub fn mark_ad_viewed(&self, ad: ItemId, viewer: ProfileId) -> bool {
        if ad.kind() != ItemKind::Advertisement {
            return false;
        }
        if !self.impressions.mark_viewed_if_new(ad) {
            return false;
        }

        let backend = self.core.backend();
        runtime::spawn(async move {
            if let Err(error) = backend.report_impression(ad, viewer).await {
                warn!(ad = %ad, error = %error, "impression report failed");
            }
        });
        true
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.core.snapshot()
    }

    /// Receive a new [`FeedSnapshot`] whenever visible state changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.core.subscribe()
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.core.read(|state| state.aggregator.snapshot().to_vec())
    }

    pub fn item(&self, id: &ItemId) -> Option<FeedItem> {
        self.core.read(|state| state.aggregator.get(id).cloned())
    }

    pub fn is_loading_initial(&self) -> bool {
        self.core.read(|state| state.pagination.is_loading_initial())
    }

    pub fn is_loading_more(&self) -> bool {
        self.core.read(|state| state.pagination.is_loading_more())
    }

    pub fn has_more(&self) -> bool {
        self.core.read(|state| state.pagination.has_more())
    }

    pub fn last_error(&self) -> Option<FeedError> {
        self.core.read(|state| state.pagination.last_error().cloned())
    }

    pub fn mutations(&self) -> &OptimisticMutationEngine {
        &self.mutations
    }

    pub fn impressions(&self) -> &ImpressionTracker {
        &self.impressions
    }

    /// Dispose of the session. In-flight fetches and toggles finish on
    /// their own but no longer write anything.
    pub fn close(&self) {
        debug!("feed session closed");
        self.core.close();
    }
}

impl Drop for FeedViewModel {
    fn drop(&mut self) {
        self.core.close();
    }
}
