use serde::Serialize;

/// Most page links shown at once.
pub const MAX_PAGE_LINKS: usize = 10;

/// Page window for a paginated list view.
///
/// Shows at most [`MAX_PAGE_LINKS`] page numbers. Near the start the window is
/// pinned to page 1, near the end to the last page, and elsewhere it keeps
/// five pages before the current one and four after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub total_items: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub start_page: usize,
    pub end_page: usize,
    /// Zero-based index of the first item on the current page.
    pub start_index: usize,
    /// Zero-based index of the last item on the current page.
    pub end_index: usize,
    pub pages: Vec<usize>,
}

impl Pager {
    pub fn new(total_items: usize, current_page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size);
        let current_page = current_page.clamp(1, total_pages.max(1));

        let (start_page, end_page) = if total_pages <= MAX_PAGE_LINKS {
            (1, total_pages)
        } else if current_page <= 6 {
            (1, MAX_PAGE_LINKS)
        } else if current_page + 4 >= total_pages {
            (total_pages - (MAX_PAGE_LINKS - 1), total_pages)
        } else {
            (current_page - 5, current_page + 4)
        };

        let start_index = (current_page - 1) * page_size;
        let end_index = (start_index + page_size - 1).min(total_items.saturating_sub(1));

        Self {
            total_items,
            current_page,
            page_size,
            total_pages,
            start_page,
            end_page,
            start_index,
            end_index,
            pages: (start_page..=end_page).collect(),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// `(limit, offset)` for requesting the current page.
    pub fn limit_offset(&self) -> (usize, usize) {
        (self.page_size, self.start_index)
    }
}
