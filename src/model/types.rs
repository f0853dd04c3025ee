// SPDX-License-Identifier: MPL-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ProfileId = i64;

/// Which stream an item came from. Also the namespace of its [`ItemId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Publication,
    Advertisement,
}

impl ItemKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Publication => "pub",
            Self::Advertisement => "ad",
        }
    }
}

/// Feed-wide identity of an item.
///
/// Publication and ad ids come from separate server tables and can collide
/// numerically, so the identity is the pair. Renders as `pub:42` / `ad:42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId {
    kind: ItemKind,
    raw: u64,
}

impl ItemId {
    pub fn publication(raw: u64) -> Self {
        Self {
            kind: ItemKind::Publication,
            raw,
        }
    }

    pub fn advertisement(raw: u64) -> Self {
        Self {
            kind: ItemKind::Advertisement,
            raw,
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// The server-side numeric id, without namespace.
    pub fn raw(&self) -> u64 {
        self.raw
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid item id: {0}")]
pub struct ParseItemIdError(String);

impl FromStr for ItemId {
    type Err = ParseItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, raw) = s
            .split_once(':')
            .ok_or_else(|| ParseItemIdError(s.to_string()))?;
        let raw: u64 = raw.parse().map_err(|_| ParseItemIdError(s.to_string()))?;
        match prefix {
            "pub" => Ok(Self::publication(raw)),
            "ad" => Ok(Self::advertisement(raw)),
            _ => Err(ParseItemIdError(s.to_string())),
        }
    }
}

impl Serialize for ItemId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Document,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResource {
    pub url: String,
    pub kind: MediaKind,
}

/// Fields shared by publications and ads: who posted it and what it says.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub profile_id: ProfileId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub is_company_profile: bool,
    pub is_premium_profile: bool,
    pub is_followed_by_viewer: bool,
    pub is_favorited_by_viewer: bool,
    pub is_featured: bool,
    pub published_at: DateTime<Utc>,
    pub title: Option<String>,
    pub body: String,
    pub media: Vec<MediaResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub like_count: u32,
    pub viewer_has_liked: bool,
    pub comment_count: u32,
    pub is_saved_by_viewer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advertisement {
    pub campaign_start: Option<DateTime<Utc>>,
    pub campaign_end: Option<DateTime<Utc>>,
    pub impression_count: Option<u32>,
    pub is_saved_by_viewer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedContent {
    Publication(Publication),
    Advertisement(Advertisement),
}

/// One unit of feed content.
///
/// The id is fixed at construction; everything else may be rewritten in
/// place by the aggregator's `mutate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    id: ItemId,
    #[serde(flatten)]
    pub envelope: Envelope,
    pub content: FeedContent,
}

impl FeedItem {
    pub fn publication(raw_id: u64, envelope: Envelope, publication: Publication) -> Self {
        Self {
            id: ItemId::publication(raw_id),
            envelope,
            content: FeedContent::Publication(publication),
        }
    }

    pub fn advertisement(raw_id: u64, envelope: Envelope, ad: Advertisement) -> Self {
        Self {
            id: ItemId::advertisement(raw_id),
            envelope,
            content: FeedContent::Advertisement(ad),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn profile_id(&self) -> ProfileId {
        self.envelope.profile_id
    }

    pub fn is_ad(&self) -> bool {
        matches!(self.content, FeedContent::Advertisement(_))
    }

    pub fn as_publication(&self) -> Option<&Publication> {
        match &self.content {
            FeedContent::Publication(p) => Some(p),
            FeedContent::Advertisement(_) => None,
        }
    }

    pub fn as_publication_mut(&mut self) -> Option<&mut Publication> {
        match &mut self.content {
            FeedContent::Publication(p) => Some(p),
            FeedContent::Advertisement(_) => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        match &self.content {
            FeedContent::Publication(p) => p.is_saved_by_viewer,
            FeedContent::Advertisement(a) => a.is_saved_by_viewer,
        }
    }

    pub fn set_saved(&mut self, saved: bool) {
        match &mut self.content {
            FeedContent::Publication(p) => p.is_saved_by_viewer = saved,
            FeedContent::Advertisement(a) => a.is_saved_by_viewer = saved,
        }
    }
}

/// Opaque pagination token handed out by the feed service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of mixed items as returned by the feed service, in ranked order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

/// Result of a like toggle. `like_count` is the server's authoritative
/// total when the service reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeAck {
    pub like_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_ids_are_namespaced() {
        let publication = ItemId::publication(42);
        let ad = ItemId::advertisement(42);
        assert_ne!(publication, ad);
        assert_eq!(publication.to_string(), "pub:42");
        assert_eq!(ad.to_string(), "ad:42");
    }

    #[test]
    fn item_id_parses_its_display_form() {
        assert_eq!("ad:7".parse::<ItemId>(), Ok(ItemId::advertisement(7)));
        assert_eq!("pub:9".parse::<ItemId>(), Ok(ItemId::publication(9)));
        assert!("post:9".parse::<ItemId>().is_err());
        assert!("pub:x".parse::<ItemId>().is_err());
        assert!("42".parse::<ItemId>().is_err());
    }
}
