//! Listing parameters: filters, ordering and explicit page requests.

use serde::{Deserialize, Serialize};

/// Reserved filter value meaning "do not filter on this dimension".
pub const NO_FILTER: i64 = -1;

/// Convert a raw filter value into an optional constraint.
pub fn sentinel_filter(raw: Option<i64>) -> Option<i64> {
    raw.filter(|value| *value != NO_FILTER)
}

/// Number of pages needed for `total` rows; never less than one.
pub fn last_page(total: i64, per_page: i64) -> i64 {
    if per_page <= 0 || total <= 0 {
        return 1;
    }
    (total / per_page + i64::from(total % per_page != 0)).max(1)
}

/// Clamp a requested 1-based page into `1..=last_page`.
pub fn clamp_page(requested: i64, last_page: i64) -> i64 {
    requested.max(1).min(last_page.max(1))
}

/// A 1-based page of fixed size. Carried explicitly through every call;
/// there is no ambient "current page".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Page containing row offset `start`. The resulting offset is aligned
    /// to the page boundary, so `start = 15, length = 10` reads rows 10..20.
    /// Arithmetic saturates at `i64::MAX`.
    pub fn from_start(start: i64, per_page: i64) -> Self {
        let start = start.max(0);
        let per_page = per_page.max(1);
        Self {
            page: (start / per_page).saturating_add(1),
            per_page,
        }
    }

    pub fn offset(self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Only an exact `"desc"` sorts descending.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sortable listing columns. `Subject` is the ticket title for admins and
/// the ticket body for owners, matching what each console displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Id,
    SecureId,
    Subject,
    Category,
}

impl SortColumn {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::SecureId),
            1 => Some(Self::Subject),
            2 => Some(Self::Category),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TicketOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for TicketOrder {
    fn default() -> Self {
        Self {
            column: SortColumn::Id,
            direction: SortDirection::Desc,
        }
    }
}

impl TicketOrder {
    /// Resolve the first order entry against the column allow-list.
    /// Unknown columns fall back to the default `id DESC`.
    pub fn from_specs(specs: &[OrderSpec]) -> Self {
        let Some(spec) = specs.first() else {
            return Self::default();
        };
        match SortColumn::from_index(spec.column.unwrap_or(0)) {
            Some(column) => Self {
                column,
                direction: SortDirection::from_param(spec.dir.as_deref()),
            },
            None => Self::default(),
        }
    }
}

/// One `order[]` entry as sent by a data-table client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    #[serde(default)]
    pub column: Option<i64>,
    #[serde(default)]
    pub dir: Option<String>,
}

/// Raw listing parameters as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketListQuery {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub length: Option<i64>,
    #[serde(default)]
    pub order: Vec<OrderSpec>,
    #[serde(default)]
    pub cate_id: Option<i64>,
    #[serde(default)]
    pub label_id: Option<i64>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Validated filter set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TicketFilter {
    pub category_id: Option<i64>,
    pub label_id: Option<i64>,
    pub status: Option<i64>,
    /// Trimmed, non-empty search needle.
    pub search: Option<String>,
}

/// Normalized listing request handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketListRequest {
    pub page: PageRequest,
    pub order: TicketOrder,
    pub filter: TicketFilter,
}

impl TicketListQuery {
    /// Apply defaults and sentinels. Missing or non-positive `length` uses
    /// `default_length`.
    pub fn normalize(&self, default_length: i64) -> TicketListRequest {
        let length = self
            .length
            .filter(|length| *length > 0)
            .unwrap_or(default_length);
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_string);

        TicketListRequest {
            page: PageRequest::from_start(self.start.unwrap_or(0), length),
            order: TicketOrder::from_specs(&self.order),
            filter: TicketFilter {
                category_id: sentinel_filter(self.cate_id),
                label_id: sentinel_filter(self.label_id),
                status: sentinel_filter(self.status),
                search,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_page_is_floor_of_start_over_length_plus_one() {
        for (start, length, expected) in [(0, 10, 1), (9, 10, 1), (10, 10, 2), (25, 10, 3)] {
            assert_eq!(PageRequest::from_start(start, length).page, expected);
        }
    }

    #[test]
    fn offset_is_page_aligned() {
        let page = PageRequest::from_start(15, 10);
        assert_eq!(page.offset(), 10);
    }

    #[test]
    fn negative_start_reads_first_page() {
        assert_eq!(PageRequest::from_start(-5, 10).page, 1);
    }

    #[test]
    fn extreme_start_saturates_instead_of_overflowing() {
        let page = PageRequest::from_start(i64::MAX, 1);
        assert_eq!(page.page, i64::MAX);
        assert_eq!(page.offset(), i64::MAX - 1);

        let page = PageRequest::from_start(i64::MAX, i64::MAX);
        assert_eq!(page.page, 2);
        assert_eq!(page.offset(), i64::MAX);

        let page = PageRequest {
            page: i64::MAX,
            per_page: 1000,
        };
        assert_eq!(page.offset(), i64::MAX);
    }

    #[test]
    fn extreme_query_normalizes_to_positive_page() {
        let request = TicketListQuery {
            start: Some(i64::MAX),
            length: Some(i64::MIN),
            ..TicketListQuery::default()
        }
        .normalize(10);
        assert_eq!(request.page.per_page, 10);
        assert_eq!(request.page.page, i64::MAX / 10 + 1);
        assert!(request.page.offset() > 0);
    }

    #[test]
    fn sentinel_means_no_filter() {
        assert_eq!(sentinel_filter(Some(NO_FILTER)), None);
        assert_eq!(sentinel_filter(None), None);
        assert_eq!(sentinel_filter(Some(0)), Some(0));
        assert_eq!(sentinel_filter(Some(4)), Some(4));
    }

    #[test]
    fn order_defaults_to_id_desc() {
        assert_eq!(TicketOrder::from_specs(&[]), TicketOrder::default());
        let unknown = OrderSpec {
            column: Some(9),
            dir: Some("asc".to_string()),
        };
        assert_eq!(
            TicketOrder::from_specs(&[unknown]),
            TicketOrder {
                column: SortColumn::Id,
                direction: SortDirection::Desc,
            }
        );
    }

    #[test]
    fn order_uses_first_entry_only() {
        let specs = vec![
            OrderSpec {
                column: Some(2),
                dir: Some("desc".to_string()),
            },
            OrderSpec {
                column: Some(0),
                dir: Some("asc".to_string()),
            },
        ];
        let order = TicketOrder::from_specs(&specs);
        assert_eq!(order.column, SortColumn::Category);
        assert_eq!(order.direction, SortDirection::Desc);
    }

    #[test]
    fn anything_but_desc_sorts_ascending() {
        assert_eq!(SortDirection::from_param(Some("DESC")), SortDirection::Asc);
        assert_eq!(SortDirection::from_param(None), SortDirection::Asc);
    }

    #[test]
    fn last_page_is_at_least_one() {
        assert_eq!(last_page(0, 50), 1);
        assert_eq!(last_page(50, 50), 1);
        assert_eq!(last_page(51, 50), 2);
        assert_eq!(last_page(120, 50), 3);
        assert_eq!(last_page(i64::MAX, 1000), i64::MAX / 1000 + 1);
    }

    #[test]
    fn clamp_keeps_page_in_range() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(-2, 3), 1);
        assert_eq!(clamp_page(2, 3), 2);
        assert_eq!(clamp_page(9, 3), 3);
    }

    #[test]
    fn normalize_trims_search_and_applies_defaults() {
        let query = TicketListQuery {
            length: Some(0),
            search: Some("   ".to_string()),
            cate_id: Some(NO_FILTER),
            status: Some(2),
            ..TicketListQuery::default()
        };
        let request = query.normalize(10);
        assert_eq!(request.page.per_page, 10);
        assert_eq!(request.page.page, 1);
        assert_eq!(request.filter.search, None);
        assert_eq!(request.filter.category_id, None);
        assert_eq!(request.filter.status, Some(2));

        let query = TicketListQuery {
            search: Some("  printer ".to_string()),
            ..TicketListQuery::default()
        };
        assert_eq!(
            query.normalize(10).filter.search.as_deref(),
            Some("printer")
        );
    }

    #[test]
    fn query_deserializes_from_data_table_payload() {
        let query: TicketListQuery = serde_json::from_value(serde_json::json!({
            "start": 20,
            "length": 10,
            "order": [{"column": 1, "dir": "desc"}],
            "label_id": -1
        }))
        .expect("deserialize");
        let request = query.normalize(25);
        assert_eq!(request.page.page, 3);
        assert_eq!(request.order.column, SortColumn::Subject);
        assert_eq!(request.filter.label_id, None);
    }
}
