//! Resolving the user's chosen titles against the catalog.
//!
//! Titles that are not in the catalog are dropped. A title shared by several
//! rows selects all of them, so none of them can be recommended back.

use data_loader::{Catalog, ItemId, TitleMatch};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// The catalog rows a request was built from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Resolved catalog rows, ascending and without duplicates
    pub rows: BTreeSet<usize>,
    /// Titles that matched nothing, in request order
    pub unresolved: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> Vec<usize> {
        self.rows.iter().copied().collect()
    }

    /// Item identifiers of the resolved rows, ascending
    pub fn item_ids(&self, catalog: &Catalog) -> BTreeSet<ItemId> {
        self.rows
            .iter()
            .filter_map(|&row| catalog.get(row))
            .map(|item| item.id)
            .collect()
    }
}

/// Resolve exact titles to catalog rows
pub fn resolve_titles(catalog: &Catalog, titles: &[String]) -> Selection {
    let mut selection = Selection::default();

    for title in titles {
        let found = catalog.lookup_title(title);
        match &found {
            TitleMatch::NotFound => {
                debug!("Title not in catalog: {:?}", title);
                if !selection.unresolved.contains(title) {
                    selection.unresolved.push(title.clone());
                }
            }
            TitleMatch::Ambiguous(rows) => {
                warn!("Title {:?} matches {} catalog rows, using all", title, rows.len());
            }
            TitleMatch::Unique(_) => {}
        }
        selection.rows.extend(found.rows());
    }

    selection
}
