//! 1-based pagination.

use serde::Serialize;

/// Rows shown per dashboard page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The requested page (1-based).
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// 1-based position of the first item, 0 for an empty page.
    pub fn first_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1) * self.page_size + 1
        }
    }

    /// 1-based position of the last item, 0 for an empty page.
    pub fn last_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_index() + self.items.len() - 1
        }
    }
}

/// `ceil(total_items / page_size)`; a zero page size has no pages.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    }
}

/// Slices out `page` (1-based). Page 0 and pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total_pages = total_pages(items.len(), page_size);
    let slice: &[T] = match page.checked_sub(1) {
        Some(index) if page <= total_pages => {
            let start = index * page_size;
            let end = (start + page_size).min(items.len());
            &items[start..end]
        }
        _ => &[],
    };
    Page {
        items: slice.to_vec(),
        page,
        page_size,
        total_items: items.len(),
        total_pages,
    }
}

/// Keeps a requested page within `1..=total_pages` (1 when there are none).
pub fn clamp_page(requested: usize, total_pages: usize) -> usize {
    requested.clamp(1, total_pages.max(1))
}
