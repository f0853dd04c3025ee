// SPDX-License-Identifier: MPL-2.0

//! JSON shapes exchanged with the feed service.
//!
//! Kept apart from the model so the service can rename fields without the
//! rest of the crate noticing.

use crate::model::{
    Advertisement, Cursor, Envelope, FeedItem, FeedPage, MediaResource, ProfileId, Publication,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub items: Vec<WireItem>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl From<PageResponse> for FeedPage {
    fn from(page: PageResponse) -> Self {
        Self {
            items: page.items.into_iter().map(FeedItem::from).collect(),
            next_cursor: page.next_cursor.map(Cursor::new),
            has_more: page.has_more,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireEnvelope {
    pub profile_id: ProfileId,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_company: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub followed_by_viewer: bool,
    #[serde(default)]
    pub favorited_by_viewer: bool,
    #[serde(default)]
    pub featured: bool,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub media: Vec<MediaResource>,
}

impl From<WireEnvelope> for Envelope {
    fn from(w: WireEnvelope) -> Self {
        Self {
            profile_id: w.profile_id,
            display_name: w.display_name,
            avatar_url: w.avatar_url,
            is_company_profile: w.is_company,
            is_premium_profile: w.is_premium,
            is_followed_by_viewer: w.followed_by_viewer,
            is_favorited_by_viewer: w.favorited_by_viewer,
            is_featured: w.featured,
            published_at: w.published_at,
            title: w.title,
            body: w.body,
            media: w.media,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireItem {
    Publication {
        id: u64,
        #[serde(flatten)]
        envelope: WireEnvelope,
        #[serde(default)]
        like_count: u32,
        #[serde(default)]
        liked_by_viewer: bool,
        #[serde(default)]
        comment_count: u32,
        #[serde(default)]
        saved_by_viewer: bool,
    },
    Advertisement {
        id: u64,
        #[serde(flatten)]
        envelope: WireEnvelope,
        #[serde(default)]
        campaign_start: Option<DateTime<Utc>>,
        #[serde(default)]
        campaign_end: Option<DateTime<Utc>>,
        #[serde(default)]
        impression_count: Option<u32>,
        #[serde(default)]
        saved_by_viewer: bool,
    },
}

impl From<WireItem> for FeedItem {
    fn from(item: WireItem) -> Self {
        match item {
            WireItem::Publication {
                id,
                envelope,
                like_count,
                liked_by_viewer,
                comment_count,
                saved_by_viewer,
            } => FeedItem::publication(
                id,
                envelope.into(),
                Publication {
                    like_count,
                    viewer_has_liked: liked_by_viewer,
                    comment_count,
                    is_saved_by_viewer: saved_by_viewer,
                },
            ),
            WireItem::Advertisement {
                id,
                envelope,
                campaign_start,
                campaign_end,
                impression_count,
                saved_by_viewer,
            } => FeedItem::advertisement(
                id,
                envelope.into(),
                Advertisement {
                    campaign_start,
                    campaign_end,
                    impression_count,
                    is_saved_by_viewer: saved_by_viewer,
                },
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LikeRequest {
    pub profile_id: ProfileId,
    pub liked: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LikeResponse {
    #[serde(default)]
    pub like_count: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SaveRequest {
    pub profile_id: ProfileId,
    pub saved: bool,
}

#[derive(Debug, Serialize)]
pub struct ImpressionRequest {
    pub profile_id: ProfileId,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}
