use serde::Serialize;

/// A page of results plus the numbers needed to render navigation.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    pub count: u64,
    pub page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, count: u64, page: u32, per_page: u32) -> Self {
        let total_pages = total_pages(count, per_page);
        Self {
            results,
            count,
            page,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Keeps the page numbers but swaps in `results`.
    pub fn with_results<U>(self, results: Vec<U>) -> Paginated<U> {
        Paginated {
            results,
            count: self.count,
            page: self.page,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// Always at least one page, even when there are no results.
pub fn total_pages(count: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    let pages = count.div_ceil(per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Parses a requested page number; malformed values fall back to page 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Clamps a page number into `1..=total_pages`.
pub fn clamp_page(page: u32, count: u64, per_page: u32) -> u32 {
    page.clamp(1, total_pages(count, per_page))
}

pub fn offset(page: u32, per_page: u32) -> u32 {
    page.saturating_sub(1).saturating_mul(per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 12), 1);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
    }

    #[test]
    fn test_clamp_and_offset() {
        assert_eq!(clamp_page(9, 25, 12), 3);
        assert_eq!(clamp_page(2, 0, 12), 1);
        assert_eq!(offset(1, 12), 0);
        assert_eq!(offset(3, 12), 24);
    }

    #[test]
    fn test_navigation_flags() {
        let page = Paginated::new(vec![1, 2], 14, 2, 12);
        assert!(!page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.with_results(vec!["a"]).total_pages, 2);
    }
}
