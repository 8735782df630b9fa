//! Paginated stream for lazy iteration over cursor-threaded API results
//!
//! The data API paginates with an opaque `next_page_token` cursor: each
//! response carries the token for the next page, and an absent token means
//! the result set is exhausted. [`PageStream`] implements the `Stream` trait
//! over such endpoints, fetching the next page only when the current one is
//! drained, so a caller that stops early never pays for pages it did not
//! read.

use crate::error::RestResult;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;

/// Page size ceiling for market data endpoints
pub const MAX_PAGE_SIZE: usize = 10_000;

/// Page size ceiling for the news endpoint
pub const MAX_NEWS_PAGE_SIZE: usize = 50;

/// One page of results plus the cursor for the next one
#[derive(Debug)]
pub struct Page<T> {
    /// Items in this page
    pub items: Vec<T>,
    /// Cursor for the next page; `None` means exhausted
    pub next_page_token: Option<String>,
}

/// Type alias for a boxed future used internally
type PageFuture<T> = Pin<Box<dyn std::future::Future<Output = RestResult<Page<T>>> + Send>>;

/// A stream that lazily fetches cursor-threaded pages
///
/// Each fetch receives the current cursor (`None` on the first request) and
/// the page size to ask for, which is the smaller of the remaining item
/// budget and the endpoint's ceiling. The stream ends when the caller's
/// limit is reached or the server stops returning a cursor; an error ends
/// the stream after being yielded, and items already yielded stay valid.
pub struct PageStream<T> {
    /// Fetch one page given (cursor, page size)
    fetch_page: Box<dyn Fn(Option<String>, usize) -> PageFuture<T> + Send + Sync>,
    /// Items of the current page still to be yielded
    current: VecDeque<T>,
    /// Cursor for the next fetch
    next_token: Option<String>,
    /// Items still owed to the caller; `None` means unlimited
    remaining: Option<usize>,
    /// Largest page size the endpoint accepts
    ceiling: usize,
    /// Server signalled no further pages
    exhausted: bool,
    /// Terminal: limit reached, server exhausted or errored
    finished: bool,
    /// Current in-flight fetch
    pending: Option<PageFuture<T>>,
}

impl<T> PageStream<T> {
    /// Create a stream with the given item limit and page size ceiling
    pub fn new<F>(limit: Option<usize>, ceiling: usize, fetch_page: F) -> Self
    where
        F: Fn(Option<String>, usize) -> PageFuture<T> + Send + Sync + 'static,
    {
        Self {
            fetch_page: Box::new(fetch_page),
            current: VecDeque::new(),
            next_token: None,
            remaining: limit,
            ceiling,
            exhausted: false,
            finished: limit == Some(0),
            pending: None,
        }
    }

    /// Page size for the next request
    fn next_page_size(&self) -> usize {
        match self.remaining {
            Some(remaining) => remaining.min(self.ceiling),
            None => self.ceiling,
        }
    }
}

impl<T: Unpin> Stream for PageStream<T> {
    type Item = RestResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            // Yield from the current page first
            if let Some(item) = this.current.pop_front() {
                if let Some(remaining) = this.remaining.as_mut() {
                    *remaining -= 1;
                    if *remaining == 0 {
                        this.finished = true;
                        this.current.clear();
                    }
                }
                return Poll::Ready(Some(Ok(item)));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            // Drive the in-flight fetch if there is one
            if let Some(fut) = this.pending.as_mut() {
                match fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        this.pending = None;
                        this.next_token = page.next_page_token;
                        if this.next_token.is_none() {
                            this.exhausted = true;
                        }

                        let mut items = page.items;
                        if let Some(remaining) = this.remaining {
                            items.truncate(remaining);
                        }
                        this.current = items.into();

                        if this.current.is_empty() {
                            this.finished = true;
                            return Poll::Ready(None);
                        }
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        this.pending = None;
                        this.finished = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }

            if this.exhausted {
                this.finished = true;
                return Poll::Ready(None);
            }

            // Start the next fetch
            let size = this.next_page_size();
            let token = this.next_token.clone();
            this.pending = Some((this.fetch_page)(token, size));
        }
    }
}

impl<T> Unpin for PageStream<T> {}
