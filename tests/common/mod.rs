// SPDX-License-Identifier: MPL-2.0
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tablon::model::{Advertisement, Envelope, Publication};
use tablon::{Cursor, FeedBackend, FeedError, FeedItem, FeedPage, ItemId, LikeAck, ProfileId};
use tokio::sync::Semaphore;

pub const VIEWER: ProfileId = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(Option<Cursor>),
    Like(ItemId, bool),
    Save(ItemId, bool),
    Impression(ItemId),
}

/// In-memory backend answering from scripted queues and logging every call.
#[derive(Default)]
pub struct ScriptedBackend {
    pages: Mutex<VecDeque<Result<FeedPage, FeedError>>>,
    likes: Mutex<VecDeque<Result<LikeAck, FeedError>>>,
    saves: Mutex<VecDeque<Result<(), FeedError>>>,
    impression_error: Mutex<Option<FeedError>>,
    calls: Mutex<Vec<Call>>,
    fetch_gate: Mutex<Option<Arc<Semaphore>>>,
    mutation_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_page(&self, page: Result<FeedPage, FeedError>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn push_like(&self, result: Result<LikeAck, FeedError>) {
        self.likes.lock().unwrap().push_back(result);
    }

    pub fn push_save(&self, result: Result<(), FeedError>) {
        self.saves.lock().unwrap().push_back(result);
    }

    pub fn fail_impressions(&self, error: FeedError) {
        *self.impression_error.lock().unwrap() = Some(error);
    }

    /// From now on every fetch waits for [`release_fetches`](Self::release_fetches).
    pub fn hold_fetches(&self) {
        *self.fetch_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_fetches(&self, n: usize) {
        if let Some(gate) = self.fetch_gate.lock().unwrap().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Stop gating new fetches. Fetches already waiting stay held until
    /// permits are added to the returned gate.
    pub fn take_fetch_gate(&self) -> Option<Arc<Semaphore>> {
        self.fetch_gate.lock().unwrap().take()
    }

    /// From now on every like/save call waits for [`release_mutations`](Self::release_mutations).
    pub fn hold_mutations(&self) {
        *self.mutation_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_mutations(&self, n: usize) {
        if let Some(gate) = self.mutation_gate.lock().unwrap().as_ref() {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Fetch(_)))
            .count()
    }

    pub fn mutation_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Like(..) | Call::Save(..)))
            .collect()
    }

    pub fn impression_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Impression(_)))
            .collect()
    }

    /// Poll until `predicate` holds on the call log, or fail after two seconds.
    pub async fn wait_until(&self, predicate: impl Fn(&[Call]) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if predicate(&self.calls()) {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("timed out waiting for backend calls: {:?}", self.calls());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl FeedBackend for ScriptedBackend {
    async fn fetch_feed_page(
        &self,
        _viewer: ProfileId,
        cursor: Option<&Cursor>,
    ) -> Result<FeedPage, FeedError> {
        self.record(Call::Fetch(cursor.cloned()));
        Self::pass(&self.fetch_gate).await;
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FeedError::Network("no scripted page".into())))
    }

    async fn set_like(
        &self,
        item: ItemId,
        _viewer: ProfileId,
        liked: bool,
    ) -> Result<LikeAck, FeedError> {
        self.record(Call::Like(item, liked));
        Self::pass(&self.mutation_gate).await;
        self.likes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(LikeAck::default()))
    }

    async fn set_saved(
        &self,
        item: ItemId,
        _viewer: ProfileId,
        saved: bool,
    ) -> Result<(), FeedError> {
        self.record(Call::Save(item, saved));
        Self::pass(&self.mutation_gate).await;
        self.saves.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn report_impression(&self, ad: ItemId, _viewer: ProfileId) -> Result<(), FeedError> {
        self.record(Call::Impression(ad));
        match self.impression_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn envelope(profile_id: ProfileId) -> Envelope {
    Envelope {
        profile_id,
        display_name: format!("profile {profile_id}"),
        avatar_url: None,
        is_company_profile: false,
        is_premium_profile: false,
        is_followed_by_viewer: false,
        is_favorited_by_viewer: false,
        is_featured: false,
        published_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        title: None,
        body: "body".into(),
        media: Vec::new(),
    }
}

pub fn publication(id: u64, owner: ProfileId, like_count: u32, liked: bool) -> FeedItem {
    FeedItem::publication(
        id,
        envelope(owner),
        Publication {
            like_count,
            viewer_has_liked: liked,
            comment_count: 0,
            is_saved_by_viewer: false,
        },
    )
}

pub fn ad(id: u64) -> FeedItem {
    let mut envelope = envelope(500);
    envelope.is_company_profile = true;
    FeedItem::advertisement(
        id,
        envelope,
        Advertisement {
            campaign_start: None,
            campaign_end: None,
            impression_count: Some(0),
            is_saved_by_viewer: false,
        },
    )
}

pub fn page(items: Vec<FeedItem>, next: Option<&str>, has_more: bool) -> FeedPage {
    FeedPage {
        items,
        next_cursor: next.map(Cursor::new),
        has_more,
    }
}

pub fn ids(items: &[FeedItem]) -> Vec<String> {
    items.iter().map(|item| item.id().to_string()).collect()
}
