//! End-to-end checks of `SupportDesk` over an embedded libSQL database.

#![cfg(feature = "libsql")]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use supportdesk::config::SupportConfig;
use supportdesk::db::Database;
use supportdesk::db::libsql::LibSqlBackend;
use supportdesk::support::TicketListQuery;
use supportdesk::{SupportDesk, TicketScope};

struct Harness {
    desk: SupportDesk,
    _tmpdir: tempfile::TempDir,
}

/// secure-A belongs to user 1 (created t=100, 7 comments), secure-B to
/// user 2 (created t=200, no comments).
async fn harness(config: SupportConfig) -> Harness {
    let tmpdir = tempfile::tempdir().expect("tempdir");
    let backend = LibSqlBackend::new_local(&tmpdir.path().join("desk.db"))
        .await
        .expect("open backend");
    backend.run_migrations().await.expect("migrations");

    let conn = backend.connect().await.expect("connect");
    conn.execute_batch(
        "INSERT INTO users (id, username, fullname, avatar, email) VALUES \
           (1, 'ana', 'Ana Lima', 'ana.png', 'ana@example.com'), \
           (2, 'bo', 'Bo Chen', 'bo.png', 'bo@example.com'); \
         INSERT INTO support_categories (id, name, color) VALUES (1, 'Billing', 'green'); \
         INSERT INTO support_labels (id, name, color, icon) VALUES \
           (1, 'urgent', 'red', 'flame'), (2, 'waiting, customer', 'grey', 'clock'); \
         INSERT INTO support_tickets \
           (id, id_secure, cate_id, user_id, title, content, status, changed, created) VALUES \
           (1, 'secure-A', 1, 1, 'Invoice charged twice', 'Card billed twice', 1, 100, 100), \
           (2, 'secure-B', 1, 2, 'Printer offline', 'Tray 2 jams', 1, 200, 200); \
         INSERT INTO support_map_labels (ticket_id, label_id) VALUES (1, 1), (1, 2); \
         INSERT INTO support_comments (ticket_id, user_id, comment, changed, created) VALUES \
           (1, 1, 'c1', 1001, 1001), (1, 2, 'c2', 1002, 1002), (1, 1, 'c3', 1003, 1003), \
           (1, 2, 'c4', 1004, 1004), (1, 1, 'c5', 1005, 1005), (1, 2, 'c6', 1006, 1006), \
           (1, 1, 'c7', 1007, 1007);",
    )
    .await
    .expect("seed");

    Harness {
        desk: SupportDesk::new(Arc::new(backend), config),
        _tmpdir: tmpdir,
    }
}

fn small_pages() -> SupportConfig {
    SupportConfig {
        page_length: 10,
        comments_per_page: 3,
        recent_limit: 10,
    }
}

#[tokio::test]
async fn foreign_ticket_detail_is_not_found() {
    let h = harness(small_pages()).await;

    let hidden = h
        .desk
        .ticket_detail(TicketScope::owner(2), "secure-A")
        .await
        .expect("detail");
    assert!(hidden.is_none());

    let own = h
        .desk
        .ticket_detail(TicketScope::owner(1), "secure-A")
        .await
        .expect("detail")
        .expect("owner sees own ticket");
    assert_eq!(own.total_comment, 7);
    assert_eq!(own.user_fullname.as_deref(), Some("Ana Lima"));
    assert_eq!(own.labels.names(), vec!["urgent", "waiting, customer"]);
}

#[tokio::test]
async fn comment_pages_cover_every_comment_once() {
    let h = harness(small_pages()).await;
    let scope = TicketScope::owner(1);

    let first = h.desk.comments(scope, 1, 1).await.expect("page 1");
    assert_eq!(first.pagination.last_page, 3);
    let texts: Vec<_> = first.comments.iter().map(|c| c.comment.as_str()).collect();
    assert_eq!(texts, vec!["c5", "c6", "c7"]);

    let last = h.desk.comments(scope, 1, 3).await.expect("page 3");
    assert_eq!(last.comments.len(), 1);
    assert_eq!(last.comments[0].comment, "c1");

    let clamped = h.desk.comments(scope, 1, 99).await.expect("clamped");
    assert_eq!(clamped.pagination.current_page, 3);
    assert_eq!(clamped.comments, last.comments);
}

#[tokio::test]
async fn owner_listing_and_sidebar_stay_in_scope() {
    let h = harness(small_pages()).await;

    let page = h
        .desk
        .list_tickets(TicketScope::owner(2), &TicketListQuery::default())
        .await
        .expect("list");
    assert_eq!(page.records_filtered, 1);
    assert_eq!(page.data[0].secure_id, "secure-B");

    let recent = h
        .desk
        .recent_tickets(TicketScope::Admin, "secure-B")
        .await
        .expect("recent");
    let ids: Vec<_> = recent.iter().map(|t| t.secure_id.as_str()).collect();
    assert_eq!(ids, vec!["secure-A"]);
    assert_eq!(recent[0].total_comment, 7);
}

#[tokio::test]
async fn listing_serializes_data_table_shape() {
    let h = harness(small_pages()).await;

    let page = h
        .desk
        .list_tickets(
            TicketScope::Admin,
            &TicketListQuery {
                search: Some("invoice".to_string()),
                ..TicketListQuery::default()
            },
        )
        .await
        .expect("list");
    let json = serde_json::to_value(&page).expect("serialize");

    assert_eq!(json["recordsTotal"], 1);
    assert_eq!(json["recordsFiltered"], 1);
    assert_eq!(json["data"][0]["id_secure"], "secure-A");
    assert_eq!(json["data"][0]["created"], 100);
    assert_eq!(json["data"][0]["labels"][1]["name"], "waiting, customer");
}
