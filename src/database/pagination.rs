use serde::{Deserialize, Serialize};

use crate::{constants::MAX_PAGE_SIZE, error::ApiError};

/// Page-number pagination as requested by the caller (`page` is 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// An unparsable or non-positive `page` is an invalid page; a bad `limit` falls back to
    /// `default_size`.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        default_size: i64,
    ) -> Result<Self, ApiError> {
        let page = match page {
            None => 1,
            Some(value) => match value.trim().parse::<i64>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(invalid_page()),
            },
        };

        let page_size = limit
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|size| *size >= 1)
            .map(|size| size.min(MAX_PAGE_SIZE))
            .unwrap_or(default_size);

        // Pages whose offset does not fit an i64 cannot exist.
        if (page - 1).checked_mul(page_size).is_none() {
            return Err(invalid_page());
        }

        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

pub fn invalid_page() -> ApiError {
    ApiError::NotFound(String::from("Invalid page."))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
    #[serde(skip)]
    next_page: Option<i64>,
    #[serde(skip)]
    previous_page: Option<i64>,
}

impl<T> PageContext<T> {
    /// Builds the page for `rows`, which must already be the slice selected by `request`.
    /// An empty slice past the first page is an invalid page.
    pub fn from_rows(rows: Vec<T>, total_rows: i64, request: PageRequest) -> Result<Self, ApiError> {
        if rows.is_empty() {
            if request.page > 1 {
                return Err(invalid_page());
            }
            return Ok(Self::no_rows());
        }

        let last_page = (total_rows + request.page_size - 1) / request.page_size;
        let next_page = (request.page < last_page).then_some(request.page + 1);
        let previous_page = (request.page > 1).then_some(request.page - 1);

        Ok(Self {
            count: total_rows,
            next: None,
            previous: None,
            results: rows,
            next_page,
            previous_page,
        })
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
            next_page: None,
            previous_page: None,
        }
    }

    /// Fills `next`/`previous` with links to `path`, keeping every query parameter of
    /// `raw_query` except `page`.
    pub fn with_links(mut self, path: &str, raw_query: &str) -> Self {
        let kept: Vec<&str> = raw_query
            .split('&')
            .filter(|pair| !pair.is_empty() && *pair != "page" && !pair.starts_with("page="))
            .collect();

        let link = |page: i64| {
            let mut parts = kept.clone();
            let page = format!("page={page}");
            parts.push(&page);
            format!("{path}?{}", parts.join("&"))
        };

        self.next = self.next_page.map(&link);
        self.previous = self.previous_page.map(&link);
        self
    }

    pub fn with_results<U>(self, results: Vec<U>) -> PageContext<U> {
        PageContext {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results,
            next_page: self.next_page,
            previous_page: self.previous_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageContext<U> {
        PageContext {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
            next_page: self.next_page,
            previous_page: self.previous_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_first_page() {
        let request = PageRequest::parse(None, None, 6).unwrap();
        assert_eq!(request, PageRequest { page: 1, page_size: 6 });
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn limit_is_capped_and_bad_limits_fall_back() {
        assert_eq!(PageRequest::parse(None, Some("1000"), 6).unwrap().page_size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::parse(None, Some("abc"), 6).unwrap().page_size, 6);
        assert_eq!(PageRequest::parse(None, Some("0"), 6).unwrap().page_size, 6);
        assert_eq!(PageRequest::parse(Some("3"), Some("2"), 6).unwrap().offset(), 4);
    }

    #[test]
    fn garbage_page_is_invalid() {
        assert!(matches!(
            PageRequest::parse(Some("zero"), None, 6),
            Err(ApiError::NotFound(_))
        ));
        assert!(PageRequest::parse(Some("0"), None, 6).is_err());
    }

    #[test]
    fn page_with_unrepresentable_offset_is_invalid() {
        assert!(matches!(
            PageRequest::parse(Some("9223372036854775807"), None, 6),
            Err(ApiError::NotFound(_))
        ));
        assert!(PageRequest::parse(Some("9223372036854775807"), Some("1"), 6).is_ok());
        let huge = PageRequest { page: i64::MAX, page_size: 100 };
        assert_eq!(huge.offset(), i64::MAX);
    }

    #[test]
    fn middle_page_links_both_ways() {
        let request = PageRequest::parse(Some("2"), Some("2"), 6).unwrap();
        let page = PageContext::from_rows(vec![3, 4], 5, request)
            .unwrap()
            .with_links("/api/recipes", "limit=2&page=2&tags=lunch");

        assert_eq!(page.count, 5);
        assert_eq!(page.next.as_deref(), Some("/api/recipes?limit=2&tags=lunch&page=3"));
        assert_eq!(page.previous.as_deref(), Some("/api/recipes?limit=2&tags=lunch&page=1"));
    }

    #[test]
    fn last_page_has_no_next() {
        let request = PageRequest::parse(Some("3"), Some("2"), 6).unwrap();
        let page = PageContext::from_rows(vec![5], 5, request)
            .unwrap()
            .with_links("/api/users", "");
        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("/api/users?page=2"));
    }

    #[test]
    fn empty_first_page_is_fine_but_empty_later_page_is_not() {
        let first = PageRequest::parse(None, None, 6).unwrap();
        let page = PageContext::<i32>::from_rows(vec![], 0, first).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());

        let later = PageRequest::parse(Some("4"), None, 6).unwrap();
        assert!(PageContext::<i32>::from_rows(vec![], 0, later).is_err());
    }
}
