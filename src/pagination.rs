//! Splits an ordered result set into fixed-size pages.
//!
//! Page lookup is forgiving: a missing or malformed `page` parameter shows the
//! first page, and an out-of-range number shows the last one.

/// Page geometry for a result set of `total` rows.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: i64,
    per_page: u32,
}

/// The slice of rows one page covers, as SQL `LIMIT` / `OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub limit: i64,
    pub offset: i64,
}

impl Paginator {
    pub fn new(total: i64, per_page: u32) -> Self {
        Self {
            total: total.max(0),
            per_page: per_page.max(1),
        }
    }

    /// Number of pages; an empty result set still has one (empty) page.
    pub fn num_pages(&self) -> u32 {
        let per_page = i64::from(self.per_page);
        let pages = (self.total + per_page - 1) / per_page;
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    pub fn get_page(&self, raw: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages();
        let number = match raw.map(str::trim) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if (1..=i64::from(num_pages)).contains(&n) => n as u32,
                Ok(_) => num_pages,
                // An integer too long for i64 is still out of range.
                Err(_) if is_integer(raw) => num_pages,
                Err(_) => 1,
            },
        };
        let limit = i64::from(self.per_page);
        PageWindow {
            number,
            num_pages,
            limit,
            offset: i64::from(number - 1) * limit,
        }
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw
        .strip_prefix('-')
        .or_else(|| raw.strip_prefix('+'))
        .unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// A numbered link in the page navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

/// One rendered page of items plus the navigation state templates need.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    /// Extra query string carried into page links, e.g. `q=rust`.
    query: String,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            query: String::new(),
        }
    }

    pub fn with_query(mut self, pairs: &[(&str, &str)]) -> Self {
        self.query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn href(&self, number: u32) -> String {
        if self.query.is_empty() {
            format!("?page={}", number)
        } else {
            format!("?{}&page={}", self.query, number)
        }
    }

    pub fn previous_href(&self) -> Option<String> {
        self.has_previous().then(|| self.href(self.number - 1))
    }

    pub fn next_href(&self) -> Option<String> {
        self.has_next().then(|| self.href(self.number + 1))
    }

    pub fn links(&self) -> Vec<PageLink> {
        (1..=self.num_pages)
            .map(|number| PageLink {
                number,
                href: self.href(number),
                current: number == self.number,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_items_split_ten_and_three() {
        let paginator = Paginator::new(13, 10);
        assert_eq!(paginator.num_pages(), 2);

        let first = paginator.get_page(None);
        assert_eq!((first.number, first.limit, first.offset), (1, 10, 0));

        let second = paginator.get_page(Some("2"));
        assert_eq!((second.number, second.offset), (2, 10));
    }

    #[test]
    fn empty_result_has_one_page() {
        let paginator = Paginator::new(0, 10);
        assert_eq!(paginator.num_pages(), 1);
        assert_eq!(paginator.get_page(Some("1")).number, 1);
    }

    #[test]
    fn malformed_page_falls_back_to_first() {
        let paginator = Paginator::new(35, 10);
        assert_eq!(paginator.get_page(Some("abc")).number, 1);
        assert_eq!(paginator.get_page(Some("")).number, 1);
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let paginator = Paginator::new(35, 10);
        assert_eq!(paginator.get_page(Some("99")).number, 4);
        assert_eq!(paginator.get_page(Some("0")).number, 4);
        assert_eq!(paginator.get_page(Some("-3")).number, 4);
    }

    #[test]
    fn integers_too_long_for_i64_are_out_of_range() {
        let paginator = Paginator::new(35, 10);
        assert_eq!(paginator.get_page(Some("99999999999999999999")).number, 4);
        assert_eq!(paginator.get_page(Some(" -99999999999999999999 ")).number, 4);
        assert_eq!(paginator.get_page(Some("9999999999999999999x")).number, 1);
        assert_eq!(paginator.get_page(Some("-")).number, 1);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        assert_eq!(Paginator::new(20, 10).num_pages(), 2);
        assert_eq!(Paginator::new(21, 10).num_pages(), 3);
    }

    #[test]
    fn page_links_keep_extra_query() {
        let window = Paginator::new(25, 10).get_page(Some("2"));
        let page = Page::new(vec![1, 2, 3], window).with_query(&[("q", "rust lang")]);
        assert_eq!(page.previous_href().as_deref(), Some("?q=rust+lang&page=1"));
        assert_eq!(page.next_href().as_deref(), Some("?q=rust+lang&page=3"));
        let links = page.links();
        assert_eq!(links.len(), 3);
        assert!(links[1].current);
        assert_eq!(links[2].href, "?q=rust+lang&page=3");
    }

    #[test]
    fn first_page_has_no_previous_link() {
        let window = Paginator::new(5, 10).get_page(None);
        let page = Page::new(vec!["a"], window);
        assert!(page.previous_href().is_none());
        assert!(page.next_href().is_none());
        assert!(!page.has_other_pages());
    }
}
