//! # Listing Queries
//!
//! Filter types passed to the listing repositories.
//!
//! Queries are plain data; each adapter evaluates them with the `matches`
//! helpers below so every backend agrees on what a filter means. Results are
//! ordered newest first before the window is applied.

use crate::domain::entities::group::Group;
use crate::domain::entities::group_request::GroupRequest;
use crate::domain::entities::request::Request;
use crate::domain::value_objects::{GroupRequestStatus, Price, RequestStatus, Timestamp, UserId};
use rust_decimal::Decimal;

/// Free-text and price filters shared by every listing search.
///
/// Text filters are case-insensitive substring matches. Price bounds are
/// inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Substring of the item name.
    pub item: Option<String>,
    /// Substring of the location.
    pub location: Option<String>,
    /// Lowest desired price.
    pub min_price: Option<Decimal>,
    /// Highest desired price.
    pub max_price: Option<Decimal>,
}

impl ListingFilter {
    /// Creates an empty filter that matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to items containing `item`.
    #[must_use]
    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Restricts to locations containing `location`.
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Restricts to desired prices within `[min, max]`.
    #[must_use]
    pub fn price_between(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// Returns true if a listing with these fields passes the filter.
    #[must_use]
    pub fn matches(&self, item: &str, location: &str, price: Price) -> bool {
        if let Some(needle) = &self.item
            && !contains_ignore_case(item, needle)
        {
            return false;
        }
        if let Some(needle) = &self.location
            && !contains_ignore_case(location, needle)
        {
            return false;
        }
        if let Some(min) = self.min_price
            && price.value() < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && price.value() > max
        {
            return false;
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

/// Offset and limit applied after filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Number of matches to skip.
    pub offset: usize,
    /// Maximum number of matches to return.
    pub limit: usize,
}

impl Window {
    /// Creates a window.
    #[must_use]
    pub const fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Applies the window to an already sorted list.
    #[must_use]
    pub fn apply<T>(self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

/// Which deadline condition a listing query enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Only listings whose `expires_at` is still ahead of the instant.
    LiveAt(Timestamp),
    /// Only listings whose `expires_at` is at or before the instant.
    PassedAt(Timestamp),
}

impl Deadline {
    fn admits(self, expires_at: Timestamp) -> bool {
        match self {
            Self::LiveAt(now) => !expires_at.has_passed(now),
            Self::PassedAt(now) => expires_at.has_passed(now),
        }
    }
}

/// Query over requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestQuery {
    /// Only requests posted by this vendor.
    pub owner: Option<UserId>,
    /// Only requests in this status.
    pub status: Option<RequestStatus>,
    /// Deadline condition.
    pub deadline: Option<Deadline>,
    /// Text and price filters.
    pub filter: ListingFilter,
    /// Paging window.
    pub window: Option<Window>,
}

impl RequestQuery {
    /// Open requests whose deadline has not passed at `now`.
    #[must_use]
    pub fn open_at(now: Timestamp) -> Self {
        Self {
            status: Some(RequestStatus::Open),
            deadline: Some(Deadline::LiveAt(now)),
            ..Self::default()
        }
    }

    /// Requests still marked open whose deadline has passed at `now`.
    #[must_use]
    pub fn overdue_at(now: Timestamp) -> Self {
        Self {
            status: Some(RequestStatus::Open),
            deadline: Some(Deadline::PassedAt(now)),
            ..Self::default()
        }
    }

    /// Every request posted by `owner`.
    #[must_use]
    pub fn owned_by(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    /// Restricts to `status`.
    #[must_use]
    pub fn with_status(mut self, status: Option<RequestStatus>) -> Self {
        self.status = status;
        self
    }

    /// Sets the text and price filters.
    #[must_use]
    pub fn with_filter(mut self, filter: ListingFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the paging window.
    #[must_use]
    pub fn paged(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    /// Returns true if `request` satisfies every condition except the window.
    #[must_use]
    pub fn matches(&self, request: &Request) -> bool {
        if let Some(owner) = &self.owner
            && request.owner_id() != owner
        {
            return false;
        }
        if let Some(status) = self.status
            && request.status() != status
        {
            return false;
        }
        if let Some(deadline) = self.deadline
            && !deadline.admits(request.expires_at())
        {
            return false;
        }
        self.filter
            .matches(request.item(), request.location(), request.desired_price())
    }
}

/// Query over group requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRequestQuery {
    /// Only group requests in this status.
    pub status: Option<GroupRequestStatus>,
    /// Deadline condition.
    pub deadline: Option<Deadline>,
    /// Text and price filters.
    pub filter: ListingFilter,
    /// Paging window.
    pub window: Option<Window>,
}

impl GroupRequestQuery {
    /// Active group requests whose deadline has not passed at `now`.
    #[must_use]
    pub fn active_at(now: Timestamp) -> Self {
        Self {
            status: Some(GroupRequestStatus::Active),
            deadline: Some(Deadline::LiveAt(now)),
            ..Self::default()
        }
    }

    /// Group requests still active whose deadline has passed at `now`.
    #[must_use]
    pub fn overdue_at(now: Timestamp) -> Self {
        Self {
            status: Some(GroupRequestStatus::Active),
            deadline: Some(Deadline::PassedAt(now)),
            ..Self::default()
        }
    }

    /// Sets the text and price filters.
    #[must_use]
    pub fn with_filter(mut self, filter: ListingFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the paging window.
    #[must_use]
    pub fn paged(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    /// Returns true if `request` satisfies every condition except the window.
    #[must_use]
    pub fn matches(&self, request: &GroupRequest) -> bool {
        if let Some(status) = self.status
            && request.status() != status
        {
            return false;
        }
        if let Some(deadline) = self.deadline
            && !deadline.admits(request.expires_at())
        {
            return false;
        }
        self.filter
            .matches(request.item(), request.location(), request.desired_price())
    }
}

/// Returns true if `group` passes `filter`.
#[must_use]
pub fn group_matches(group: &Group, filter: &ListingFilter) -> bool {
    filter.matches(group.item(), group.location(), group.desired_price())
}
