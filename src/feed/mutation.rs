// SPDX-License-Identifier: MPL-2.0

//! Optimistic like/save toggles.
//!
//! A toggle flips the item locally before anything goes over the network,
//! then queues the remote call on a per-item lane. Lanes are drained by one
//! worker each, so calls for the same item reach the server in the order
//! they were requested while different items proceed in parallel.

use crate::feed::FeedError;
use crate::feed::session::{FeedState, SessionCore};
use crate::model::{FeedItem, ItemId, ProfileId};
use crate::runtime;
use crate::state::Generation;
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Like,
    Save,
}

/// The part of an item a toggle touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Like { liked: bool, count: u32 },
    Saved(bool),
}

impl Field {
    fn read(toggle: Toggle, item: &FeedItem) -> Option<Self> {
        match toggle {
            Toggle::Like => item.as_publication().map(|p| Field::Like {
                liked: p.viewer_has_liked,
                count: p.like_count,
            }),
            Toggle::Save => Some(Field::Saved(item.is_saved())),
        }
    }

    fn flipped(self) -> Self {
        match self {
            Field::Like { liked, count } => Field::Like {
                liked: !liked,
                count: if liked {
                    count.saturating_sub(1)
                } else {
                    count.saturating_add(1)
                },
            },
            Field::Saved(saved) => Field::Saved(!saved),
        }
    }

    fn write(self, item: &mut FeedItem) {
        match self {
            Field::Like { liked, count } => {
                if let Some(p) = item.as_publication_mut() {
                    p.viewer_has_liked = liked;
                    p.like_count = count;
                }
            }
            Field::Saved(saved) => item.set_saved(saved),
        }
    }

    /// Same requested state, recounted on top of `base`.
    fn rebased_on(self, base: Field) -> Self {
        match (self, base) {
            (Field::Like { liked, .. }, Field::Like { liked: was, count }) => Field::Like {
                liked,
                count: match (was, liked) {
                    (false, true) => count.saturating_add(1),
                    (true, false) => count.saturating_sub(1),
                    _ => count,
                },
            },
            (applied, _) => applied,
        }
    }

    fn shift_count(&mut self, delta: i64) {
        if let Field::Like { count, .. } = self {
            *count = shifted(*count, delta);
        }
    }
}

fn shifted(count: u32, delta: i64) -> u32 {
    (i64::from(count) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

/// Confirmed state of one toggle after the server accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Liked { liked: bool, like_count: u32 },
    Saved { saved: bool },
}

type Reply = oneshot::Sender<Result<MutationOutcome, FeedError>>;

struct QueuedToggle {
    toggle: Toggle,
    viewer: ProfileId,
    generation: Generation,
    /// Item state before this toggle's optimistic flip; restored on failure.
    before: Field,
    /// Item state right after the flip; the value sent to the server.
    applied: Field,
    reply: Reply,
}

type Lane = VecDeque<QueuedToggle>;
type Lanes = Arc<Mutex<HashMap<ItemId, Lane>>>;

/// Move a lane's restore points onto fresh server values and show the
/// newest requested state on `item`.
fn rebase(lane: &mut Lane, item: &mut FeedItem) {
    for toggle in [Toggle::Like, Toggle::Save] {
        let Some(mut current) = Field::read(toggle, item) else {
            continue;
        };
        let mut queued = false;
        for op in lane.iter_mut().filter(|op| op.toggle == toggle) {
            op.before = current;
            op.applied = op.applied.rebased_on(current);
            current = op.applied;
            queued = true;
        }
        if queued {
            current.write(item);
        }
    }
}

/// Queued toggles, borrowed while fetched items are committed.
pub(crate) struct QueuedToggles<'a> {
    lanes: &'a mut HashMap<ItemId, Lane>,
}

impl QueuedToggles<'_> {
    /// Lay queued toggles over items about to become visible. Only the
    /// first occurrence of an id counts, matching the aggregator.
    pub(crate) fn overlay(&mut self, items: &mut [FeedItem]) {
        if self.lanes.is_empty() {
            return;
        }
        let mut seen = HashSet::new();
        for item in items.iter_mut() {
            let id = item.id();
            if !seen.insert(id) {
                continue;
            }
            if let Some(lane) = self.lanes.get_mut(&id) {
                debug!(item = %id, queued = lane.len(), "rebasing queued toggles on fresh item");
                rebase(lane, item);
            }
        }
    }
}

/// Handle to a toggle that has been applied locally and queued remotely.
///
/// Await it for the server's verdict. Dropping it does not cancel the call.
#[must_use = "the toggle is applied either way; await to learn whether it stuck"]
pub struct PendingMutation {
    item: ItemId,
    rx: oneshot::Receiver<Result<MutationOutcome, FeedError>>,
}

impl PendingMutation {
    pub fn item(&self) -> ItemId {
        self.item
    }
}

impl IntoFuture for PendingMutation {
    type Output = Result<MutationOutcome, FeedError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.rx.await.unwrap_or(Err(FeedError::SessionClosed)) })
    }
}

/// Local-first like/save with per-item serialization and rollback.
#[derive(Clone)]
pub struct OptimisticMutationEngine {
    core: Arc<SessionCore>,
    lanes: Lanes,
}

impl OptimisticMutationEngine {
    pub(crate) fn new(core: Arc<SessionCore>) -> Self {
        Self {
            core,
            lanes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Flip the viewer's like on a publication owned by someone else.
    ///
    /// Fails with `InvalidOperation` without touching anything if the item
    /// is missing, is an ad, or belongs to the viewer.
    pub fn toggle_like(
        &self,
        item: ItemId,
        viewer: ProfileId,
    ) -> Result<PendingMutation, FeedError> {
        self.enqueue(Toggle::Like, item, viewer)
    }

    /// Flip the viewer's saved flag. Works on any item, including the
    /// viewer's own.
    pub fn toggle_save(
        &self,
        item: ItemId,
        viewer: ProfileId,
    ) -> Result<PendingMutation, FeedError> {
        self.enqueue(Toggle::Save, item, viewer)
    }

    /// Apply `f` to the session state while no toggle can be queued or
    /// settled, for commits that bring in items from the server.
    pub(crate) fn commit<R>(
        &self,
        generation: Generation,
        f: impl FnOnce(&mut FeedState, &mut QueuedToggles<'_>) -> R,
    ) -> Option<R> {
        let mut lanes = self.lanes.lock().expect("mutation lanes lock poisoned");
        let mut queued = QueuedToggles { lanes: &mut *lanes };
        self.core
            .update_if_current(generation, |state| f(state, &mut queued))
    }

    /// Number of toggles queued or in flight for `item`.
    pub fn pending(&self, item: &ItemId) -> usize {
        self.lanes
            .lock()
            .expect("mutation lanes lock poisoned")
            .get(item)
            .map_or(0, VecDeque::len)
    }

    fn enqueue(
        &self,
        toggle: Toggle,
        id: ItemId,
        viewer: ProfileId,
    ) -> Result<PendingMutation, FeedError> {
        // Lanes before state, everywhere, so flips and queue order agree.
        let mut lanes = self.lanes.lock().expect("mutation lanes lock poisoned");
        let generation = self.core.generation();

        let (before, applied) = self.core.update(|state| {
            let item = state
                .aggregator
                .get(&id)
                .ok_or_else(|| FeedError::InvalidOperation(format!("{id} is not in the feed")))?;
            if toggle == Toggle::Like {
                if item.as_publication().is_none() {
                    return Err(FeedError::InvalidOperation(format!(
                        "{id} is not a publication"
                    )));
                }
                if item.profile_id() == viewer {
                    return Err(FeedError::InvalidOperation(
                        "cannot like your own publication".into(),
                    ));
                }
            }
            let before = Field::read(toggle, item)
                .ok_or_else(|| FeedError::InvalidOperation(format!("{id} cannot be toggled")))?;
            let applied = before.flipped();
            state.aggregator.mutate(&id, |item| applied.write(item));
            Ok((before, applied))
        })?;

        let (reply, rx) = oneshot::channel();
        let start_worker = !lanes.contains_key(&id);
        let lane = lanes.entry(id).or_default();
        lane.push_back(QueuedToggle {
            toggle,
            viewer,
            generation,
            before,
            applied,
            reply,
        });
        debug!(item = %id, ?toggle, queued = lane.len(), "toggle applied locally");
        drop(lanes);

        if start_worker {
            runtime::spawn(drain_lane(
                Arc::clone(&self.core),
                Arc::clone(&self.lanes),
                id,
            ));
        }

        Ok(PendingMutation { item: id, rx })
    }
}

/// Issue queued remote calls for one item, oldest first, until the lane
/// is empty.
async fn drain_lane(core: Arc<SessionCore>, lanes: Lanes, id: ItemId) {
    loop {
        let head = {
            let mut lanes = lanes.lock().expect("mutation lanes lock poisoned");
            let head = lanes
                .get(&id)
                .and_then(VecDeque::front)
                .map(|op| (op.viewer, op.generation, op.applied));
            if head.is_none() {
                // Removing the lane under the same lock hands the next
                // toggle for this item a fresh worker.
                lanes.remove(&id);
            }
            head
        };
        let Some((viewer, generation, applied)) = head else {
            return;
        };

        let result = if !core.is_current(generation) {
            Err(FeedError::SessionClosed)
        } else {
            let backend = core.backend();
            match applied {
                Field::Like { liked, .. } => backend
                    .set_like(id, viewer, liked)
                    .await
                    .map(|ack| ack.like_count),
                Field::Saved(saved) => backend.set_saved(id, viewer, saved).await.map(|()| None),
            }
        };

        if !settle(&core, &lanes, id, result) {
            return;
        }
    }
}

/// Reconcile the head of the lane with its remote result. Returns false
/// when the lane has been torn down.
fn settle(
    core: &SessionCore,
    lanes: &Lanes,
    id: ItemId,
    result: Result<Option<u32>, FeedError>,
) -> bool {
    let mut lanes = lanes.lock().expect("mutation lanes lock poisoned");
    let Some(lane) = lanes.get_mut(&id) else {
        return false;
    };
    let Some(head) = lane.pop_front() else {
        return true;
    };
    if !core.is_current(head.generation) {
        let _ = head.reply.send(Err(FeedError::SessionClosed));
        return true;
    }

    match result {
        Ok(server_count) => {
            let outcome = match (head.applied, server_count) {
                (Field::Like { liked, count }, Some(server)) => {
                    // Later likes were counted on top of this one.
                    let delta = i64::from(server) - i64::from(count);
                    let mut shown = Field::Like {
                        liked,
                        count: server,
                    };
                    for later in lane.iter_mut().filter(|op| op.toggle == Toggle::Like) {
                        later.before.shift_count(delta);
                        later.applied.shift_count(delta);
                        shown = later.applied;
                    }
                    core.update_if_current(head.generation, |state| {
                        state.aggregator.mutate(&id, |item| shown.write(item))
                    });
                    MutationOutcome::Liked {
                        liked,
                        like_count: server,
                    }
                }
                (Field::Like { liked, count }, None) => MutationOutcome::Liked {
                    liked,
                    like_count: count,
                },
                (Field::Saved(saved), _) => MutationOutcome::Saved { saved },
            };
            debug!(item = %id, ?outcome, "toggle confirmed");
            let _ = head.reply.send(Ok(outcome));
            true
        }
        Err(FeedError::NotFound(message)) => {
            warn!(item = %id, %message, "item gone on server, dropping it from the feed");
            core.update_if_current(head.generation, |state| {
                state.aggregator.remove(&id);
            });
            let _ = head.reply.send(Err(FeedError::NotFound(message.clone())));
            for op in lanes.remove(&id).into_iter().flatten() {
                let _ = op.reply.send(Err(FeedError::NotFound(message.clone())));
            }
            false
        }
        Err(error) => {
            // A later toggle of the same kind already shows the newest
            // requested state; it inherits the restore point instead.
            match lane.iter_mut().find(|op| op.toggle == head.toggle) {
                Some(later) => later.before = head.before,
                None => {
                    core.update_if_current(head.generation, |state| {
                        state.aggregator.mutate(&id, |item| head.before.write(item))
                    });
                }
            }
            warn!(item = %id, toggle = ?head.toggle, error = %error, "toggle rolled back");
            let _ = head.reply.send(Err(error));
            true
        }
    }
}
