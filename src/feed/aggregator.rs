// SPDX-License-Identifier: MPL-2.0

use crate::model::{FeedItem, ItemId};
use std::collections::HashSet;

/// Ordered, duplicate-free collection of feed items.
///
/// Items keep the order they arrived in: pages in fetch order, and within a
/// page the order the server ranked them. Nothing here re-sorts.
#[derive(Debug, Default, Clone)]
pub struct FeedAggregator {
    items: Vec<FeedItem>,
    ids: HashSet<ItemId>,
}

impl FeedAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the whole collection for a freshly loaded first page.
    /// Duplicates inside the page keep their first occurrence.
    pub fn replace(&mut self, items: Vec<FeedItem>) {
        self.items.clear();
        self.ids.clear();
        self.append(items);
    }

    /// Add a page at the end, dropping items already present.
    /// Returns how many items were actually added.
    pub fn append(&mut self, items: Vec<FeedItem>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.ids.insert(item.id()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    /// Insert items at the head, preserving their relative order and
    /// dropping items already present. Returns how many were inserted.
    pub fn prepend(&mut self, items: Vec<FeedItem>) -> usize {
        let fresh: Vec<FeedItem> = items
            .into_iter()
            .filter(|item| self.ids.insert(item.id()))
            .collect();
        let added = fresh.len();
        if added > 0 {
            self.items.splice(0..0, fresh);
        }
        added
    }

    /// Apply `transform` to the item with `id`. Returns false (and does
    /// nothing) when the item is not in the feed.
    pub fn mutate<F>(&mut self, id: &ItemId, transform: F) -> bool
    where
        F: FnOnce(&mut FeedItem),
    {
        match self.items.iter_mut().find(|item| item.id() == *id) {
            Some(item) => {
                transform(item);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<FeedItem> {
        if !self.ids.remove(id) {
            return None;
        }
        let index = self.items.iter().position(|item| item.id() == *id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: &ItemId) -> Option<&FeedItem> {
        if !self.ids.contains(id) {
            return None;
        }
        self.items.iter().find(|item| item.id() == *id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    /// Current items in display order.
    pub fn snapshot(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.ids.clear();
    }
}
