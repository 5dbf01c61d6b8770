//! Page arithmetic shared by every entity table.

/// Page sizes offered by the table footer selector.
pub const PAGE_SIZE_CHOICES: [usize; 4] = [5, 10, 20, 50];

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page window over a collection of `total` rows.
///
/// Pages are 1-based. A requested page beyond the last one is clamped to the
/// last page, and page 0 is treated as page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

impl Pager {
    #[must_use]
    pub fn new(total: usize, page: Option<usize>, page_size: Option<usize>, default_size: usize) -> Self {
        let page_size = page_size
            .filter(|size| PAGE_SIZE_CHOICES.contains(size))
            .unwrap_or(default_size)
            .max(1);
        let total_pages = total.div_ceil(page_size);
        let page = page.unwrap_or(1).clamp(1, total_pages.max(1));

        Self {
            page,
            page_size,
            total,
        }
    }

    /// `ceil(total / page_size)`; zero for an empty collection.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Index of the first row on this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    /// The rows belonging to this page: at most `page_size`, and exactly
    /// `total - offset` on the last page.
    #[must_use]
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let start = self.offset().min(rows.len());
        let end = (start + self.page_size).min(rows.len());
        rows.get(start..end).unwrap_or_default()
    }
}
