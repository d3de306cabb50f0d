//! # Query Engine
//!
//! Filters a flattened unit and serves fixed-size pages of the result.
//! Input order is display order; nothing here re-sorts.

use crate::domain::classification::{ClassId, ClassificationRegistry, GroupFilter};
use crate::domain::entities::ItemView;
use serde::{Deserialize, Serialize};

/// Fallback page size: a 9x4 native container grid.
pub const DEFAULT_PAGE_SIZE: usize = 36;

/// Filter parameters of a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    /// Case-insensitive substring of the display name. Blank disables.
    pub search_text: String,
    pub group: GroupFilter,
    /// Exact class id. `None` disables. Applied on its own, also under
    /// `GroupFilter::All`; a class outside the selected group matches
    /// nothing.
    pub sub_class: Option<ClassId>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<GroupFilter>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_sub_class(mut self, class: ClassId) -> Self {
        self.sub_class = Some(class);
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.group == GroupFilter::All && self.sub_class.is_none() && self.search_text.trim().is_empty()
    }
}

/// Group, then exact class, then display-name text.
pub fn apply_filter(
    items: Vec<ItemView>,
    query: &ItemQuery,
    registry: &ClassificationRegistry,
) -> Vec<ItemView> {
    if query.is_unfiltered() {
        return items;
    }

    let needle = query.search_text.trim().to_lowercase();

    items
        .into_iter()
        .filter(|item| registry.is_in_group(item.class_id(), query.group))
        .filter(|item| query.sub_class.map_or(true, |class| item.class_id() == class))
        .filter(|item| needle.is_empty() || item.display_name().to_lowercase().contains(&needle))
        .collect()
}

fn effective_size(page_size: usize) -> usize {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}

/// Page count, never below 1.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(effective_size(page_size)).max(1)
}

/// Clamp a requested page into `[0, total_pages - 1]`.
pub fn clamp_page_index(count: usize, page_index: usize, page_size: usize) -> usize {
    page_index.min(total_pages(count, page_size) - 1)
}

/// Slice of one page after clamping the index.
pub fn page<T>(items: &[T], page_index: usize, page_size: usize) -> &[T] {
    let size = effective_size(page_size);
    let index = clamp_page_index(items.len(), page_index, size);
    let start = index * size;
    let end = (start + size).min(items.len());
    &items[start.min(end)..end]
}

/// One served page of a filtered view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPage {
    pub items: Vec<ItemView>,
    /// Index actually served, after clamping.
    pub page_index: usize,
    /// Size of the whole filtered set.
    pub total_count: usize,
    pub total_pages: usize,
}

impl QueryPage {
    /// Cut a page out of an already filtered set.
    pub fn from_filtered(filtered: &[ItemView], page_index: usize, page_size: usize) -> Self {
        let size = effective_size(page_size);
        Self {
            items: page(filtered, page_index, size).to_vec(),
            page_index: clamp_page_index(filtered.len(), page_index, size),
            total_count: filtered.len(),
            total_pages: total_pages(filtered.len(), size),
        }
    }
}
