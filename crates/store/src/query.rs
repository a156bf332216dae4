//! Query types for listing and aggregating orders.

use chrono::{DateTime, Utc};
use common::UserId;
use domain::OrderStatus;

/// An optional half-open or closed creation-time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates a range bounded on both ends.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Creates a range bounded only from below.
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Returns true if the instant falls within the range (bounds inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if let Some(start) = self.start
            && instant < start
        {
            return false;
        }
        if let Some(end) = self.end
            && instant > end
        {
            return false;
        }
        true
    }
}

/// Filter and pagination for order listings.
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub user_id: UserId,
    pub status: Option<OrderStatus>,
    pub range: Option<TimeRange>,
    /// 1-based page index; values below 1 are treated as 1.
    pub page: u32,
    pub page_size: u32,
}

impl OrderFilter {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    /// Creates a filter matching all of a user's orders, first page.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            status: None,
            range: None,
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Returns the number of records to skip for the requested page.
    pub fn offset(&self) -> usize {
        let page = self.page.max(1) as usize;
        let size = if self.page_size == 0 {
            Self::DEFAULT_PAGE_SIZE as usize
        } else {
            self.page_size as usize
        };
        (page - 1) * size
    }

    /// Returns the effective page size.
    pub fn limit(&self) -> usize {
        if self.page_size == 0 {
            Self::DEFAULT_PAGE_SIZE as usize
        } else {
            self.page_size as usize
        }
    }
}
