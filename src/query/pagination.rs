//! Page/offset arithmetic shared by every paginated endpoint.

use serde::Serialize;

pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 500;

/// Where the caller asked the window to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStart {
    /// 1-based page number; 0 is treated as page 1.
    Page(u64),
    Offset(u64),
}

impl Default for PageStart {
    fn default() -> Self {
        PageStart::Offset(0)
    }
}

/// Normalized pagination controls. `limit` is already bounded by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationRequest {
    pub limit: u64,
    pub start: PageStart,
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            start: PageStart::default(),
        }
    }
}

impl PaginationRequest {
    pub fn new(limit: u64, start: PageStart) -> Self {
        Self {
            limit: limit.max(1),
            start,
        }
    }

    pub fn page(limit: u64, page: u64) -> Self {
        Self::new(limit, PageStart::Page(page))
    }

    pub fn offset(limit: u64, offset: u64) -> Self {
        Self::new(limit, PageStart::Offset(offset))
    }
}

/// Pagination metadata, serialised flat into the endpoint envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub limit: u64,
    #[serde(rename = "offset")]
    pub effective_offset: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Row window to fetch from a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    /// Slice an already-ordered collection.
    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset)
            .unwrap_or(usize::MAX)
            .min(items.len());
        let len = usize::try_from(self.limit).unwrap_or(usize::MAX);
        let end = start.saturating_add(len).min(items.len());
        &items[start..end]
    }
}

impl PaginationResult {
    pub fn window(&self) -> Window {
        Window {
            offset: self.effective_offset,
            limit: self.page_size,
        }
    }
}

/// Reconcile a requested page or offset against the number of matching rows.
///
/// A page past the end clamps to the last page, and the offset is pulled back
/// so the last page is full whenever `total >= limit`.
pub fn paginate(total: u64, request: &PaginationRequest) -> PaginationResult {
    let limit = request.limit.max(1);

    if total == 0 {
        return PaginationResult {
            total: 0,
            page: 0,
            page_size: limit,
            total_pages: 0,
            limit,
            effective_offset: 0,
            has_next: false,
            has_previous: false,
        };
    }

    let total_pages = total.div_ceil(limit);
    let requested_page = match request.start {
        PageStart::Page(page) => page,
        PageStart::Offset(offset) => offset / limit + 1,
    };
    let page = requested_page.clamp(1, total_pages.max(1));
    let effective_offset = ((page - 1) * limit).min(total.saturating_sub(limit));

    PaginationResult {
        total,
        page,
        page_size: limit,
        total_pages,
        limit,
        effective_offset,
        has_next: page < total_pages,
        has_previous: page > 1,
    }
}
