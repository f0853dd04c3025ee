// SPDX-License-Identifier: MPL-2.0

mod types;

pub use types::{
    Advertisement, Cursor, Envelope, FeedContent, FeedItem, FeedPage, ItemId, ItemKind, LikeAck,
    MediaKind, MediaResource, ParseItemIdError, ProfileId, Publication,
};
