//! Change feed — paginated, delta-aware directory query.
//!
//! A run opens the feed once (full or resumed), then follows `Next` links
//! until a page reports `End`. Only the terminal page carries the cursor for
//! the next run, so [`PageWalker::into_final_cursor`] yields `None` until the walk
//! reached `End`.

use provision_core::{ChangeRecord, Cursor};

use crate::error::RemoteError;

/// What follows a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Another page is available at this link.
    Next(String),
    /// Terminal page. The feed may or may not hand out a new cursor.
    End { cursor: Option<Cursor> },
}

/// One page of delta records.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub records: Vec<ChangeRecord>,
    pub continuation: Continuation,
}

impl FeedPage {
    pub fn next(records: Vec<ChangeRecord>, link: impl Into<String>) -> Self {
        Self {
            records,
            continuation: Continuation::Next(link.into()),
        }
    }

    pub fn last(records: Vec<ChangeRecord>, cursor: Option<Cursor>) -> Self {
        Self {
            records,
            continuation: Continuation::End { cursor },
        }
    }
}

/// Directory delta query.
#[cfg_attr(test, mockall::automock)]
pub trait ChangeFeed {
    /// First page of a full sync.
    fn start_full(&self) -> Result<FeedPage, RemoteError>;
    /// First page of changes since `cursor`.
    fn resume_from(&self, cursor: &Cursor) -> Result<FeedPage, RemoteError>;
    /// Follow a `Continuation::Next` link.
    fn next_page(&self, link: &str) -> Result<FeedPage, RemoteError>;
}

enum PageRequest {
    Full,
    Resume(Cursor),
    Link(String),
}

/// Forward-only, single-pass iterator over the pages of one feed walk.
///
/// Yields each page's records. After an error the walker is exhausted and
/// never reports a final cursor.
pub struct PageWalker<'a> {
    feed: &'a dyn ChangeFeed,
    pending: Option<PageRequest>,
    pages: usize,
    reached_end: bool,
    final_cursor: Option<Cursor>,
}

impl<'a> PageWalker<'a> {
    /// Walk from `cursor`, or from scratch when `cursor` is `None`.
    pub fn new(feed: &'a dyn ChangeFeed, cursor: Option<Cursor>) -> Self {
        let first = match cursor {
            Some(cursor) => PageRequest::Resume(cursor),
            None => PageRequest::Full,
        };
        Self {
            feed,
            pending: Some(first),
            pages: 0,
            reached_end: false,
            final_cursor: None,
        }
    }

    /// Pages fetched so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    #[cfg(test)]
    fn reached_end(&self) -> bool {
        self.reached_end
    }

    #[cfg(test)]
    fn final_cursor(&self) -> Option<&Cursor> {
        if self.reached_end {
            self.final_cursor.as_ref()
        } else {
            None
        }
    }

    /// The cursor from the terminal page; `None` before `End` or if the feed
    /// supplied none.
    pub fn into_final_cursor(self) -> Option<Cursor> {
        if self.reached_end {
            self.final_cursor
        } else {
            None
        }
    }
}

impl Iterator for PageWalker<'_> {
    type Item = Result<Vec<ChangeRecord>, RemoteError>;

    fn next(&mut self) -> Option<Self::Item> {
        let request = self.pending.take()?;
        let fetched = match &request {
            PageRequest::Full => self.feed.start_full(),
            PageRequest::Resume(cursor) => self.feed.resume_from(cursor),
            PageRequest::Link(link) => self.feed.next_page(link),
        };
        self.pages += 1;

        let page = match fetched {
            Ok(page) => page,
            Err(err) => return Some(Err(err)),
        };
        match page.continuation {
            Continuation::Next(link) => self.pending = Some(PageRequest::Link(link)),
            Continuation::End { cursor } => {
                self.reached_end = true;
                self.final_cursor = cursor;
            }
        }
        Some(Ok(page.records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn full_sync_when_no_cursor() {
        let mut feed = MockChangeFeed::new();
        feed.expect_start_full()
            .times(1)
            .returning(|| Ok(FeedPage::last(vec![], Some(Cursor::new("T0")))));
        feed.expect_resume_from().never();

        let mut walker = PageWalker::new(&feed, None);
        assert_eq!(walker.next().map(|r| r.unwrap().len()), Some(0));
        assert!(walker.next().is_none());
        assert_eq!(walker.final_cursor(), Some(&Cursor::new("T0")));
    }

    #[test]
    fn resumes_and_follows_links() {
        let mut feed = MockChangeFeed::new();
        feed.expect_resume_from()
            .times(1)
            .returning(|_| Ok(FeedPage::next(vec![ChangeRecord::removed("u1")], "p2")));
        feed.expect_next_page()
            .with(eq("p2"))
            .times(1)
            .returning(|_| Ok(FeedPage::last(vec![], Some(Cursor::new("T2")))));

        let mut walker = PageWalker::new(&feed, Some(Cursor::new("T1")));
        assert!(walker.next().is_some());
        assert_eq!(walker.final_cursor(), None, "not terminal yet");
        assert!(walker.next().is_some());
        assert!(walker.next().is_none());
        assert_eq!(walker.pages(), 2);
        assert_eq!(walker.into_final_cursor(), Some(Cursor::new("T2")));
    }

    #[test]
    fn error_exhausts_walker_without_cursor() {
        let mut feed = MockChangeFeed::new();
        feed.expect_start_full()
            .returning(|| Ok(FeedPage::next(vec![], "p2")));
        feed.expect_next_page()
            .times(1)
            .returning(|_| Err(RemoteError::transport("connection reset")));

        let mut walker = PageWalker::new(&feed, None);
        assert!(walker.next().unwrap().is_ok());
        assert!(walker.next().unwrap().is_err());
        assert!(walker.next().is_none(), "walker is fused after an error");
        assert!(!walker.reached_end());
        assert_eq!(walker.into_final_cursor(), None);
    }

    #[test]
    fn terminal_page_without_cursor() {
        let mut feed = MockChangeFeed::new();
        feed.expect_start_full()
            .returning(|| Ok(FeedPage::last(vec![], None)));

        let mut walker = PageWalker::new(&feed, None);
        walker.next();
        assert!(walker.reached_end());
        assert_eq!(walker.final_cursor(), None);
    }
}
