// SPDX-License-Identifier: MPL-2.0

//! Feed aggregation engine.
//!
//! Merges publications and sponsored ads from a paginated remote source
//! into one ordered, duplicate-free feed, with optimistic like/save toggles
//! and once-per-process ad impression reporting. [`FeedViewModel`] is the
//! entry point; everything else is exposed for composition and testing.

pub mod config;
pub mod feed;
pub mod model;
pub mod remote;
pub mod runtime;
pub mod state;

pub use feed::{
    ErrorKind, FeedAggregator, FeedError, FeedSnapshot, FeedViewModel, ImpressionTracker,
    LoadOutcome, MutationOutcome, PaginationController, PendingMutation,
};
pub use model::{Cursor, FeedItem, FeedPage, ItemId, LikeAck, ProfileId};
pub use remote::{FeedBackend, HttpBackend};
pub use state::FeedSettings;
