//! Support ticket read models.
//!
//! Everything here is shaped for the admin console and the end-user help
//! center alike. Which rows a caller may see is decided by [`TicketScope`],
//! which every store operation receives explicitly.

pub mod labels;
pub mod query;
pub mod service;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use labels::{LabelRow, LabelSet, TicketLabel, group_labels};
pub use query::{
    NO_FILTER, OrderSpec, PageRequest, SortColumn, SortDirection, TicketFilter, TicketListQuery,
    TicketListRequest, TicketOrder, clamp_page, last_page, sentinel_filter,
};
pub use service::SupportDesk;

/// Visibility capability for a support query.
///
/// `Owner` is a hard restriction: rows whose `user_id` differs from the
/// actor are invisible, and lookups for them report not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketScope {
    Admin,
    Owner { user_id: i64 },
}

impl TicketScope {
    pub fn owner(user_id: i64) -> Self {
        Self::Owner { user_id }
    }

    /// Actor id the query must be restricted to, if any.
    pub fn owner_id(self) -> Option<i64> {
        match self {
            Self::Admin => None,
            Self::Owner { user_id } => Some(user_id),
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner { .. } => "owner",
        }
    }
}

/// Account that opened a ticket. Absent when the user row no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketOwner {
    pub id: i64,
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
}

/// One row of the ticket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    pub id: i64,
    #[serde(rename = "id_secure")]
    pub secure_id: String,
    pub title: String,
    pub content: String,
    pub status: i64,
    pub pin: bool,
    pub user_read: bool,
    pub admin_read: bool,
    pub open_by: i64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub changed: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub type_name: Option<String>,
    pub type_color: Option<String>,
    pub type_icon: Option<String>,
    pub owner: Option<TicketOwner>,
    pub labels: LabelSet,
}

/// A page of the ticket listing.
///
/// `records_total` mirrors `records_filtered`; no separate unfiltered count
/// is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketListPage {
    #[serde(rename = "recordsTotal")]
    pub records_total: i64,
    #[serde(rename = "recordsFiltered")]
    pub records_filtered: i64,
    pub current_page: i64,
    pub per_page: i64,
    pub data: Vec<TicketSummary>,
}

impl TicketListPage {
    pub fn new(total: i64, page: PageRequest, data: Vec<TicketSummary>) -> Self {
        Self {
            records_total: total,
            records_filtered: total,
            current_page: page.page,
            per_page: page.per_page,
            data,
        }
    }
}

/// Full ticket view used by the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDetail {
    pub id: i64,
    #[serde(rename = "id_secure")]
    pub secure_id: String,
    pub user_id: i64,
    pub cate_id: Option<i64>,
    pub type_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub status: i64,
    pub pin: bool,
    pub user_read: bool,
    pub admin_read: bool,
    pub open_by: i64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub changed: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub type_name: Option<String>,
    pub type_color: Option<String>,
    pub type_icon: Option<String>,
    pub user_fullname: Option<String>,
    pub user_avatar: Option<String>,
    pub labels: LabelSet,
    pub total_comment: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketComment {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub comment: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub changed: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
    pub user_avatar: Option<String>,
    pub user_fullname: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub last_page: i64,
}

/// One page of a ticket's conversation, oldest comment first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentPage {
    pub comments: Vec<TicketComment>,
    pub pagination: PaginationInfo,
}

impl CommentPage {
    pub fn empty(per_page: i64) -> Self {
        Self {
            comments: Vec::new(),
            pagination: PaginationInfo {
                total: 0,
                per_page,
                current_page: 1,
                last_page: 1,
            },
        }
    }

    /// Build a page from a batch fetched newest-first, re-ordering it
    /// oldest-first for display.
    pub fn from_newest_first(
        mut batch: Vec<TicketComment>,
        total: i64,
        per_page: i64,
        current_page: i64,
    ) -> Self {
        batch.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Self {
            comments: batch,
            pagination: PaginationInfo {
                total,
                per_page,
                current_page,
                last_page: last_page(total, per_page),
            },
        }
    }
}

/// Sidebar entry for the "recent tickets" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentTicket {
    pub id: i64,
    #[serde(rename = "id_secure")]
    pub secure_id: String,
    pub title: String,
    pub status: i64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub total_comment: i64,
}
