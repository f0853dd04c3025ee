// SPDX-License-Identifier: MPL-2.0

mod client;
mod wire;

pub use client::HttpBackend;

use crate::feed::FeedError;
use crate::model::{Cursor, FeedPage, ItemId, LikeAck, ProfileId};
use async_trait::async_trait;

/// The remote feed service as seen by the engine.
///
/// Implementations do their own transport, auth and timeouts; the engine
/// only sees pages, acknowledgements and [`FeedError`]s.
#[async_trait]
pub trait FeedBackend: Send + Sync {
    /// Fetch one ranked page of mixed items. `cursor == None` is the head.
    async fn fetch_feed_page(
        &self,
        viewer: ProfileId,
        cursor: Option<&Cursor>,
    ) -> Result<FeedPage, FeedError>;

    /// Set the viewer's like on a publication to `liked`.
    async fn set_like(
        &self,
        item: ItemId,
        viewer: ProfileId,
        liked: bool,
    ) -> Result<LikeAck, FeedError>;

    /// Set the viewer's saved flag on a publication or ad.
    async fn set_saved(&self, item: ItemId, viewer: ProfileId, saved: bool)
    -> Result<(), FeedError>;

    /// Record that the viewer saw an ad. Best effort.
    async fn report_impression(&self, ad: ItemId, viewer: ProfileId) -> Result<(), FeedError>;
}
