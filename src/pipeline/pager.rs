use std::{future::Future, marker::PhantomData};

use crate::{
    error::Result,
    types::{Cursor, Page},
};

/// Lazy, cursor-driven walk over a paginated listing.
///
/// Each call to [`next_page`](Self::next_page) issues exactly one fetch and
/// hands back that page's items, so at most one page is held at a time. The
/// walk ends after a page without a continuation cursor, or right after the
/// first error, which is returned to the caller.
///
/// The fetcher never retries by itself. Callers that want resilience wrap
/// the fetch closure's body in a [`RetryExecutor`](super::RetryExecutor).
pub struct PageFetcher<T, F> {
    fetch: F,
    cursor: Option<Cursor>,
    finished: bool,
    requests: u32,
    _items: PhantomData<fn() -> T>,
}

impl<T, F, Fut> PageFetcher<T, F>
where
    F: FnMut(Option<Cursor>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            cursor: None,
            finished: false,
            requests: 0,
            _items: PhantomData,
        }
    }

    /// Fetches the next page.
    ///
    /// - `Ok(Some(items))` - the items of the page just fetched
    /// - `Ok(None)` - the listing is exhausted
    /// - `Err(...)` - the fetch failed; the walk is over
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.finished {
            return Ok(None);
        }

        self.requests += 1;
        match (self.fetch)(self.cursor.take()).await {
            Ok(page) => {
                self.cursor = page.next;
                self.finished = self.cursor.is_none();
                Ok(Some(page.items))
            }
            Err(err) => {
                self.finished = true;
                Err(err)
            }
        }
    }

    /// Drains every remaining page into one vector, preserving listing order.
    pub async fn collect_all(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(batch) = self.next_page().await? {
            items.extend(batch);
        }
        Ok(items)
    }

    /// Number of page requests issued so far.
    pub fn requests_made(&self) -> u32 {
        self.requests
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn numbered_listing(
        total: usize,
        page_size: usize,
    ) -> impl FnMut(Option<Cursor>) -> std::future::Ready<Result<Page<usize>>> {
        move |cursor| {
            let start = cursor.map(|c| c.0.parse::<usize>().unwrap()).unwrap_or(0);
            let end = (start + page_size).min(total);
            let next = (end < total).then(|| Cursor(end.to_string()));
            std::future::ready(Ok(Page {
                items: (start..end).collect(),
                next,
            }))
        }
    }

    #[tokio::test]
    async fn test_walks_pages_in_order() {
        let mut pages = PageFetcher::new(numbered_listing(250, 100));

        assert_eq!(pages.next_page().await.unwrap().map(|p| p.len()), Some(100));
        assert_eq!(pages.next_page().await.unwrap().map(|p| p.len()), Some(100));
        assert_eq!(pages.next_page().await.unwrap().map(|p| p.len()), Some(50));
        assert!(pages.is_finished());
        assert!(pages.next_page().await.unwrap().is_none());
        assert_eq!(pages.requests_made(), 3);
    }

    #[tokio::test]
    async fn test_collect_all_keeps_listing_order() {
        let mut pages = PageFetcher::new(numbered_listing(250, 100));

        let items = pages.collect_all().await.unwrap();

        assert_eq!(items, (0..250).collect::<Vec<_>>());
        assert_eq!(pages.requests_made(), 3);
    }

    #[tokio::test]
    async fn test_empty_listing_is_one_request() {
        let mut pages = PageFetcher::new(numbered_listing(0, 100));

        assert!(pages.collect_all().await.unwrap().is_empty());
        assert_eq!(pages.requests_made(), 1);
    }

    #[tokio::test]
    async fn test_error_ends_the_walk() {
        let mut calls = 0;
        let mut pages = PageFetcher::new(|cursor: Option<Cursor>| {
            calls += 1;
            let result = match cursor {
                None => Ok(Page {
                    items: vec![1],
                    next: Some(Cursor("2".into())),
                }),
                Some(_) => Err(Error::non_retryable(Some(403), "forbidden")),
            };
            std::future::ready(result)
        });

        assert_eq!(pages.next_page().await.unwrap(), Some(vec![1]));
        assert!(pages.next_page().await.is_err());
        assert!(pages.next_page().await.unwrap().is_none());
        drop(pages);
        assert_eq!(calls, 2);
    }
}
