//! Entry point used by the CLI and embedding applications.

use std::sync::Arc;

use crate::config::SupportConfig;
use crate::db::Database;
use crate::error::DatabaseError;
use crate::support::{
    CommentPage, RecentTicket, TicketDetail, TicketListPage, TicketListQuery, TicketScope,
};

/// Read-only support ticket queries over a shared store.
#[derive(Clone)]
pub struct SupportDesk {
    store: Arc<dyn Database>,
    config: SupportConfig,
}

impl SupportDesk {
    pub fn new(store: Arc<dyn Database>, config: SupportConfig) -> Self {
        Self { store, config }
    }

    /// List tickets visible to `scope`, filtered, ordered and paged.
    pub async fn list_tickets(
        &self,
        scope: TicketScope,
        query: &TicketListQuery,
    ) -> Result<TicketListPage, DatabaseError> {
        let request = query.normalize(self.config.page_length);
        if query.length.is_some_and(|length| length <= 0) {
            tracing::warn!(
                length = ?query.length,
                default_length = self.config.page_length,
                "Non-positive page length, using default"
            );
        }

        let page = self.store.list_tickets(scope, &request).await?;
        tracing::debug!(
            scope = scope.as_str(),
            page = page.current_page,
            per_page = page.per_page,
            filtered = page.records_filtered,
            returned = page.data.len(),
            "Listed support tickets"
        );
        Ok(page)
    }

    /// Look up one ticket by secure id. Blank ids never reach the store.
    pub async fn ticket_detail(
        &self,
        scope: TicketScope,
        secure_id: &str,
    ) -> Result<Option<TicketDetail>, DatabaseError> {
        let secure_id = secure_id.trim();
        if secure_id.is_empty() {
            tracing::debug!(scope = scope.as_str(), "Blank ticket id, skipping lookup");
            return Ok(None);
        }

        let detail = self.store.get_ticket_detail(scope, secure_id).await?;
        tracing::debug!(
            scope = scope.as_str(),
            found = detail.is_some(),
            "Fetched support ticket detail"
        );
        Ok(detail)
    }

    /// One page of a ticket's comments, oldest first.
    pub async fn comments(
        &self,
        scope: TicketScope,
        ticket_id: i64,
        page: i64,
    ) -> Result<CommentPage, DatabaseError> {
        if page < 1 {
            tracing::warn!(ticket_id, page, "Comment page below 1, clamping");
        }

        let result = self
            .store
            .list_ticket_comments(scope, ticket_id, page.max(1), self.config.comments_per_page)
            .await?;
        if result.pagination.current_page < page {
            tracing::warn!(
                ticket_id,
                page,
                last_page = result.pagination.last_page,
                "Comment page beyond last page, clamped"
            );
        }
        tracing::debug!(
            scope = scope.as_str(),
            ticket_id,
            total = result.pagination.total,
            returned = result.comments.len(),
            "Listed ticket comments"
        );
        Ok(result)
    }

    /// Most recent tickets for the sidebar, excluding the one on screen.
    pub async fn recent_tickets(
        &self,
        scope: TicketScope,
        exclude_secure_id: &str,
    ) -> Result<Vec<RecentTicket>, DatabaseError> {
        let tickets = self
            .store
            .list_recent_tickets(scope, exclude_secure_id.trim(), self.config.recent_limit)
            .await?;
        tracing::debug!(
            scope = scope.as_str(),
            returned = tickets.len(),
            "Listed recent tickets"
        );
        Ok(tickets)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::db::SupportTicketStore;
    use crate::support::{PaginationInfo, TicketListRequest};

    /// Records every call so tests can check what reached the store.
    #[derive(Default)]
    struct RecordingStore {
        detail_lookups: Mutex<Vec<String>>,
        list_requests: Mutex<Vec<TicketListRequest>>,
        comment_calls: Mutex<Vec<(i64, i64, i64)>>,
        recent_calls: Mutex<Vec<(String, i64)>>,
    }

    #[async_trait]
    impl SupportTicketStore for RecordingStore {
        async fn list_tickets(
            &self,
            _scope: TicketScope,
            request: &TicketListRequest,
        ) -> Result<TicketListPage, DatabaseError> {
            self.list_requests.lock().unwrap().push(request.clone());
            Ok(TicketListPage::new(0, request.page, Vec::new()))
        }

        async fn get_ticket_detail(
            &self,
            _scope: TicketScope,
            secure_id: &str,
        ) -> Result<Option<TicketDetail>, DatabaseError> {
            self.detail_lookups
                .lock()
                .unwrap()
                .push(secure_id.to_string());
            Ok(None)
        }

        async fn list_ticket_comments(
            &self,
            _scope: TicketScope,
            ticket_id: i64,
            page: i64,
            per_page: i64,
        ) -> Result<CommentPage, DatabaseError> {
            self.comment_calls
                .lock()
                .unwrap()
                .push((ticket_id, page, per_page));
            Ok(CommentPage {
                comments: Vec::new(),
                pagination: PaginationInfo {
                    total: 0,
                    per_page,
                    current_page: 1,
                    last_page: 1,
                },
            })
        }

        async fn list_recent_tickets(
            &self,
            _scope: TicketScope,
            exclude_secure_id: &str,
            limit: i64,
        ) -> Result<Vec<RecentTicket>, DatabaseError> {
            self.recent_calls
                .lock()
                .unwrap()
                .push((exclude_secure_id.to_string(), limit));
            Ok(vec![RecentTicket {
                id: 9,
                secure_id: "secure-Z".to_string(),
                title: "Latest".to_string(),
                status: 1,
                created: Utc.timestamp_opt(900, 0).unwrap(),
                category_name: None,
                category_color: None,
                total_comment: 0,
            }])
        }
    }

    #[async_trait]
    impl Database for RecordingStore {
        async fn run_migrations(&self) -> Result<(), DatabaseError> {
            Ok(())
        }
    }

    fn desk(store: Arc<RecordingStore>) -> SupportDesk {
        SupportDesk::new(
            store,
            SupportConfig {
                page_length: 25,
                comments_per_page: 5,
                recent_limit: 3,
            },
        )
    }

    #[tokio::test]
    async fn blank_secure_id_never_reaches_store() {
        let store = Arc::new(RecordingStore::default());
        let desk = desk(Arc::clone(&store));

        assert!(desk.ticket_detail(TicketScope::Admin, "").await.unwrap().is_none());
        assert!(desk.ticket_detail(TicketScope::owner(1), "   ").await.unwrap().is_none());
        assert!(store.detail_lookups.lock().unwrap().is_empty());

        desk.ticket_detail(TicketScope::Admin, " secure-A ").await.unwrap();
        assert_eq!(*store.detail_lookups.lock().unwrap(), vec!["secure-A".to_string()]);
    }

    #[tokio::test]
    async fn listing_uses_configured_default_length() {
        let store = Arc::new(RecordingStore::default());
        let desk = desk(Arc::clone(&store));

        let page = desk
            .list_tickets(
                TicketScope::Admin,
                &TicketListQuery {
                    start: Some(50),
                    length: Some(0),
                    ..TicketListQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.per_page, 25);
        assert_eq!(page.current_page, 3);

        let requests = store.list_requests.lock().unwrap();
        assert_eq!(requests[0].page.per_page, 25);
    }

    #[tokio::test]
    async fn comments_use_configured_page_size_and_floor_page() {
        let store = Arc::new(RecordingStore::default());
        let desk = desk(Arc::clone(&store));

        desk.comments(TicketScope::owner(2), 7, -3).await.unwrap();
        assert_eq!(*store.comment_calls.lock().unwrap(), vec![(7, 1, 5)]);
    }

    #[tokio::test]
    async fn recent_tickets_use_configured_limit() {
        let store = Arc::new(RecordingStore::default());
        let desk = desk(Arc::clone(&store));

        let recent = desk.recent_tickets(TicketScope::Admin, "secure-A").await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(
            *store.recent_calls.lock().unwrap(),
            vec![("secure-A".to_string(), 3)]
        );
    }
}
