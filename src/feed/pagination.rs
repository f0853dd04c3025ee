// SPDX-License-Identifier: MPL-2.0

use crate::feed::FeedError;
use crate::model::Cursor;
use tracing::debug;

/// Which load, if any, is in flight. Initial and load-more are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    LoadingInitial,
    LoadingMore,
}

/// Cursor position, saved by [`PaginationController::checkpoint`] so a
/// failed refresh can put it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCheckpoint {
    cursor: Option<Cursor>,
    has_more: bool,
}

/// Cursor bookkeeping and the load state machine.
#[derive(Debug, Clone)]
pub struct PaginationController {
    /// Cursor for the next page; `None` means the start of the feed.
    cursor: Option<Cursor>,
    has_more: bool,
    phase: LoadPhase,
    last_error: Option<FeedError>,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self {
            cursor: None,
            has_more: true,
            phase: LoadPhase::Idle,
            last_error: None,
        }
    }
}

impl PaginationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase != LoadPhase::Idle
    }

    pub fn is_loading_initial(&self) -> bool {
        self.phase == LoadPhase::LoadingInitial
    }

    pub fn is_loading_more(&self) -> bool {
        self.phase == LoadPhase::LoadingMore
    }

    pub fn last_error(&self) -> Option<&FeedError> {
        self.last_error.as_ref()
    }

    /// Start loading the first page. Rejected while any load is in flight.
    pub fn begin_initial_load(&mut self) -> Result<(), FeedError> {
        if self.is_loading() {
            return Err(FeedError::AlreadyLoading);
        }
        self.phase = LoadPhase::LoadingInitial;
        self.last_error = None;
        debug!("initial load started");
        Ok(())
    }

    /// Start loading the page after the current cursor.
    ///
    /// Returns `None` without changing anything when there is nothing more
    /// to load, a load is in flight, or the feed is still empty. Otherwise
    /// returns the cursor to fetch with.
    pub fn begin_load_more(&mut self, loaded_items: usize) -> Option<Option<Cursor>> {
        if !self.has_more || self.is_loading() || loaded_items == 0 {
            return None;
        }
        self.phase = LoadPhase::LoadingMore;
        self.last_error = None;
        debug!(cursor = ?self.cursor, "load more started");
        Some(self.cursor.clone())
    }

    /// Record a successfully fetched page and return to idle.
    pub fn complete_page(&mut self, next_cursor: Option<Cursor>, has_more: bool) {
        self.cursor = next_cursor;
        self.has_more = has_more;
        self.phase = LoadPhase::Idle;
    }

    /// Record a failed fetch. The cursor stays put so a retry asks for the
    /// same page again.
    pub fn fail_page(&mut self, error: FeedError) {
        self.phase = LoadPhase::Idle;
        self.last_error = Some(error);
    }

    /// Back to the start of the feed. Leaves the load phase alone.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.has_more = true;
    }

    pub fn checkpoint(&self) -> PaginationCheckpoint {
        PaginationCheckpoint {
            cursor: self.cursor.clone(),
            has_more: self.has_more,
        }
    }

    pub fn restore(&mut self, checkpoint: PaginationCheckpoint) {
        self.cursor = checkpoint.cursor;
        self.has_more = checkpoint.has_more;
    }
}
