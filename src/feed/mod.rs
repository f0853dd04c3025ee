// SPDX-License-Identifier: MPL-2.0

mod aggregator;
mod impressions;
mod mutation;
mod pagination;
mod session;
mod view_model;

pub use aggregator::FeedAggregator;
pub use impressions::ImpressionTracker;
pub use mutation::{MutationOutcome, OptimisticMutationEngine, PendingMutation};
pub use pagination::{LoadPhase, PaginationCheckpoint, PaginationController};
pub use session::FeedSnapshot;
pub use view_model::{FeedViewModel, LoadOutcome};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    /// The item no longer exists on the server.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("a feed load is already in flight")]
    AlreadyLoading,
    #[error("feed session closed")]
    SessionClosed,
}

/// Coarse classification of [`FeedError`] for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Auth,
    Server,
    InvalidOperation,
    Conflict,
    Cancelled,
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Server { .. } | Self::InvalidResponse(_) => ErrorKind::Server,
            Self::InvalidOperation(_) | Self::AlreadyLoading => ErrorKind::InvalidOperation,
            Self::Conflict(_) | Self::NotFound(_) => ErrorKind::Conflict,
            Self::SessionClosed => ErrorKind::Cancelled,
        }
    }

    /// Transient failures worth offering a retry for.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Server { .. } | Self::InvalidResponse(_)
        )
    }
}
