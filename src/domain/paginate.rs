//! Page slicing for orphan lists.

/// One page of rows plus the total page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub rows: &'a [T],
    pub total_pages: usize,
}

/// Slice `items` into 1-indexed pages of `page_size`.
///
/// Pages past the end, page `0` and a zero page size yield an empty slice
/// rather than an error; callers clamp the requested page.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    if page_size == 0 {
        return Page {
            rows: &[],
            total_pages: 0,
        };
    }
    let total_pages = items.len().div_ceil(page_size);
    let rows = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(page_size))
        .filter(|&start| start < items.len())
        .map(|start| {
            let end = start.saturating_add(page_size).min(items.len());
            &items[start..end]
        })
        .unwrap_or(&[]);
    Page { rows, total_pages }
}
