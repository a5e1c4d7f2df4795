//! Core domain types for the movie catalog and the ratings table.
//!
//! The catalog keeps items in load order: the row index is the stable
//! secondary key used when two items score the same. The ratings table keeps
//! per-user and per-item indices so the collaborative recommender never scans
//! the full rating list.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user in the ratings table
pub type UserId = u32;

/// Unique identifier for an item (movie) in the catalog
pub type ItemId = u32;

/// Lowest rating the dataset allows
pub const MIN_RATING: f32 = 0.5;

/// Highest rating the dataset allows
pub const MAX_RATING: f32 = 5.0;

// =============================================================================
// Catalog Types
// =============================================================================

/// One movie in the content catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    /// Cleaned overview: genres, cast, director and plot keywords in one string
    pub overview: String,
    pub genres: Vec<String>,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>, overview: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            overview: overview.into(),
            genres: Vec::new(),
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of resolving a title against the catalog.
///
/// "Not found" and "shared by several rows" are distinct outcomes; callers
/// decide what an ambiguous title means for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleMatch {
    NotFound,
    Unique(usize),
    /// Row indices in ascending order
    Ambiguous(Vec<usize>),
}

impl TitleMatch {
    /// All catalog rows carrying the title (empty when not found)
    pub fn rows(&self) -> &[usize] {
        match self {
            TitleMatch::NotFound => &[],
            TitleMatch::Unique(row) => std::slice::from_ref(row),
            TitleMatch::Ambiguous(rows) => rows,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, TitleMatch::NotFound)
    }
}

/// Ordered, read-only collection of items with id and title indices.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    pub(crate) items: Vec<Item>,
    pub(crate) id_index: HashMap<ItemId, usize>,
    pub(crate) title_index: HashMap<String, Vec<usize>>,
}

impl Catalog {
    /// Creates a new, empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from items, keeping their order
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Result<Self> {
        let mut catalog = Self::new();
        for item in items {
            catalog.insert_item(item)?;
        }
        Ok(catalog)
    }

    /// Append an item; its row index is the current length
    pub fn insert_item(&mut self, item: Item) -> Result<()> {
        if self.id_index.contains_key(&item.id) {
            return Err(DataLoadError::DuplicateItem { id: item.id });
        }
        let row = self.items.len();
        self.id_index.insert(item.id, row);
        self.title_index
            .entry(item.title.clone())
            .or_default()
            .push(row);
        self.items.push(item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in catalog order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Get an item by its row index
    pub fn get(&self, row: usize) -> Option<&Item> {
        self.items.get(row)
    }

    /// Get an item by its identifier
    pub fn get_by_id(&self, id: ItemId) -> Option<&Item> {
        self.row_of(id).and_then(|row| self.items.get(row))
    }

    /// Row index of an item identifier
    pub fn row_of(&self, id: ItemId) -> Option<usize> {
        self.id_index.get(&id).copied()
    }

    /// Resolve an exact title to its catalog rows
    pub fn lookup_title(&self, title: &str) -> TitleMatch {
        match self.title_index.get(title).map(Vec::as_slice) {
            None | Some([]) => TitleMatch::NotFound,
            Some([row]) => TitleMatch::Unique(*row),
            Some(rows) => TitleMatch::Ambiguous(rows.to_vec()),
        }
    }

    /// Items whose title contains every word of `title` and whose genres
    /// contain every word of `genre`, case-insensitively, in catalog order
    ///
    /// An empty query matches every item.
    pub fn filter(&self, title: &str, genre: &str) -> Vec<&Item> {
        let title_words = query_words(title);
        let genre_words = query_words(genre);

        self.items
            .iter()
            .filter(|item| {
                let item_title = item.title.to_lowercase();
                let item_genres = item.genres.join(" ").to_lowercase();
                title_words.iter().all(|word| item_title.contains(word.as_str()))
                    && genre_words.iter().all(|word| item_genres.contains(word.as_str()))
            })
            .collect()
    }

    /// Overview texts in catalog order (the vectorizer input)
    pub fn overviews(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.overview.as_str()).collect()
    }
}

fn query_words(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

// =============================================================================
// Rating Types
// =============================================================================

/// A single historical rating from a user for an item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// Rating value from 0.5 to 5.0
    pub rating: f32,
}

/// Precomputed statistics for an item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemStats {
    pub avg_rating: f32,
    pub rating_count: u32,
}

/// All ratings plus per-user and per-item indices.
///
/// Ratings inside each index keep insertion order, so every query over the
/// table is deterministic.
#[derive(Debug, Default, Clone)]
pub struct RatingsTable {
    pub(crate) ratings: Vec<Rating>,
    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each item
    pub(crate) item_ratings: HashMap<ItemId, Vec<Rating>>,
    pub(crate) item_stats: HashMap<ItemId, ItemStats>,
}

impl RatingsTable {
    /// Creates a new, empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from ratings and compute item statistics
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let mut table = Self::new();
        for rating in ratings {
            table.insert_rating(rating);
        }
        table.compute_item_stats();
        table
    }

    /// Insert a rating and update indices
    ///
    /// Statistics are not refreshed; call `compute_item_stats` after a batch.
    pub fn insert_rating(&mut self, rating: Rating) {
        self.ratings.push(rating);
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);
        self.item_ratings
            .entry(rating.item_id)
            .or_default()
            .push(rating);
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// All ratings in insertion order
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// Get all ratings made by a user
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all ratings received by an item
    pub fn get_item_ratings(&self, item_id: ItemId) -> &[Rating] {
        self.item_ratings
            .get(&item_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get precomputed statistics for an item
    pub fn get_item_stats(&self, item_id: ItemId) -> Option<&ItemStats> {
        self.item_stats.get(&item_id)
    }

    /// Distinct user ids, ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Mean of every rating, `None` for an empty table
    pub fn global_mean(&self) -> Option<f32> {
        if self.ratings.is_empty() {
            return None;
        }
        let total: f64 = self.ratings.iter().map(|r| r.rating as f64).sum();
        Some((total / self.ratings.len() as f64) as f32)
    }

    /// (users, items, ratings) counts for logging
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.user_ratings.len(),
            self.item_ratings.len(),
            self.ratings.len(),
        )
    }
}
