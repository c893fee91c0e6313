use std::collections::HashMap;

use libsql::Connection;

use crate::db::SupportTicketStore;
use crate::db::support_sql::{self, SqlDialect};
use crate::error::DatabaseError;
use crate::support::{
    CommentPage, LabelRow, LabelSet, RecentTicket, TicketComment, TicketDetail, TicketLabel,
    TicketListPage, TicketListRequest, TicketOwner, TicketScope, TicketSummary, clamp_page,
    group_labels, last_page,
};

use super::{
    LibSqlBackend, bind_params, get_flag, get_i64, get_opt_i64, get_opt_text, get_text,
    get_timestamp,
};

const DIALECT: SqlDialect = SqlDialect::Sqlite;

fn row_to_ticket_summary(row: &libsql::Row) -> Result<TicketSummary, DatabaseError> {
    let owner = get_opt_i64(row, 16).map(|id| TicketOwner {
        id,
        username: get_opt_text(row, 17),
        fullname: get_opt_text(row, 18),
        avatar: get_opt_text(row, 19),
        email: get_opt_text(row, 20),
    });
    Ok(TicketSummary {
        id: get_i64(row, 0),
        secure_id: get_text(row, 1),
        title: get_text(row, 2),
        content: get_text(row, 3),
        status: get_i64(row, 4),
        pin: get_flag(row, 5),
        user_read: get_flag(row, 6),
        admin_read: get_flag(row, 7),
        open_by: get_i64(row, 8),
        changed: get_timestamp(row, 9, "support_tickets.changed")?,
        created: get_timestamp(row, 10, "support_tickets.created")?,
        category_name: get_opt_text(row, 11),
        category_color: get_opt_text(row, 12),
        type_name: get_opt_text(row, 13),
        type_color: get_opt_text(row, 14),
        type_icon: get_opt_text(row, 15),
        owner,
        labels: LabelSet::default(),
    })
}

fn row_to_ticket_detail(row: &libsql::Row) -> Result<TicketDetail, DatabaseError> {
    Ok(TicketDetail {
        id: get_i64(row, 0),
        secure_id: get_text(row, 1),
        user_id: get_i64(row, 2),
        cate_id: get_opt_i64(row, 3),
        type_id: get_opt_i64(row, 4),
        title: get_text(row, 5),
        content: get_text(row, 6),
        status: get_i64(row, 7),
        pin: get_flag(row, 8),
        user_read: get_flag(row, 9),
        admin_read: get_flag(row, 10),
        open_by: get_i64(row, 11),
        changed: get_timestamp(row, 12, "support_tickets.changed")?,
        created: get_timestamp(row, 13, "support_tickets.created")?,
        category_name: get_opt_text(row, 14),
        category_color: get_opt_text(row, 15),
        type_name: get_opt_text(row, 16),
        type_color: get_opt_text(row, 17),
        type_icon: get_opt_text(row, 18),
        user_fullname: get_opt_text(row, 19),
        user_avatar: get_opt_text(row, 20),
        labels: LabelSet::default(),
        total_comment: get_i64(row, 21),
    })
}

fn row_to_comment(row: &libsql::Row) -> Result<TicketComment, DatabaseError> {
    Ok(TicketComment {
        id: get_i64(row, 0),
        ticket_id: get_i64(row, 1),
        user_id: get_i64(row, 2),
        comment: get_text(row, 3),
        changed: get_timestamp(row, 4, "support_comments.changed")?,
        created: get_timestamp(row, 5, "support_comments.created")?,
        user_avatar: get_opt_text(row, 6),
        user_fullname: get_opt_text(row, 7),
    })
}

fn row_to_recent_ticket(row: &libsql::Row) -> Result<RecentTicket, DatabaseError> {
    Ok(RecentTicket {
        id: get_i64(row, 0),
        secure_id: get_text(row, 1),
        title: get_text(row, 2),
        status: get_i64(row, 3),
        created: get_timestamp(row, 4, "support_tickets.created")?,
        category_name: get_opt_text(row, 5),
        category_color: get_opt_text(row, 6),
        total_comment: get_i64(row, 7),
    })
}

fn row_to_label_row(row: &libsql::Row) -> LabelRow {
    LabelRow {
        ticket_id: get_i64(row, 0),
        label: TicketLabel {
            id: get_i64(row, 1),
            name: get_text(row, 2),
            color: get_text(row, 3),
            icon: get_text(row, 4),
        },
    }
}

async fn load_labels(
    conn: &Connection,
    ticket_ids: &[i64],
) -> Result<HashMap<i64, LabelSet>, DatabaseError> {
    if ticket_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let query = support_sql::ticket_labels(DIALECT, ticket_ids);
    let mut rows = conn.query(&query.sql, bind_params(query.params)).await?;
    let mut label_rows = Vec::new();
    while let Some(row) = rows.next().await? {
        label_rows.push(row_to_label_row(&row));
    }
    Ok(group_labels(label_rows))
}

async fn query_count(
    conn: &Connection,
    query: support_sql::SqlQuery,
) -> Result<Option<i64>, DatabaseError> {
    let row = conn
        .query(&query.sql, bind_params(query.params))
        .await?
        .next()
        .await?;
    Ok(row.map(|row| get_i64(&row, 0)))
}

#[async_trait::async_trait]
impl SupportTicketStore for LibSqlBackend {
    async fn list_tickets(
        &self,
        scope: TicketScope,
        request: &TicketListRequest,
    ) -> Result<TicketListPage, DatabaseError> {
        let conn = self.connect().await?;
        let tx = conn.transaction().await?;

        let total = query_count(&tx, support_sql::ticket_list_count(DIALECT, scope, request))
            .await?
            .unwrap_or(0);

        let query = support_sql::ticket_list_page(DIALECT, scope, request);
        let mut rows = tx.query(&query.sql, bind_params(query.params)).await?;
        let mut tickets = Vec::new();
        while let Some(row) = rows.next().await? {
            tickets.push(row_to_ticket_summary(&row)?);
        }

        let ids: Vec<i64> = tickets.iter().map(|ticket| ticket.id).collect();
        let mut labels = load_labels(&tx, &ids).await?;
        for ticket in &mut tickets {
            if let Some(set) = labels.remove(&ticket.id) {
                ticket.labels = set;
            }
        }
        tx.commit().await?;

        Ok(TicketListPage::new(total, request.page, tickets))
    }

    async fn get_ticket_detail(
        &self,
        scope: TicketScope,
        secure_id: &str,
    ) -> Result<Option<TicketDetail>, DatabaseError> {
        let conn = self.connect().await?;
        let tx = conn.transaction().await?;

        let query = support_sql::ticket_detail(DIALECT, scope, secure_id);
        let row = tx
            .query(&query.sql, bind_params(query.params))
            .await?
            .next()
            .await?;
        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };
        let mut ticket = row_to_ticket_detail(&row)?;
        if let Some(set) = load_labels(&tx, &[ticket.id]).await?.remove(&ticket.id) {
            ticket.labels = set;
        }
        tx.commit().await?;

        Ok(Some(ticket))
    }

    async fn list_ticket_comments(
        &self,
        scope: TicketScope,
        ticket_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<CommentPage, DatabaseError> {
        let conn = self.connect().await?;
        let tx = conn.transaction().await?;

        let Some(total) =
            query_count(&tx, support_sql::comment_count(DIALECT, scope, ticket_id)).await?
        else {
            tx.commit().await?;
            return Ok(CommentPage::empty(per_page));
        };
        let current_page = clamp_page(page, last_page(total, per_page));

        let query = support_sql::comment_batch(
            DIALECT,
            scope,
            ticket_id,
            per_page,
            (current_page - 1) * per_page,
        );
        let mut rows = tx.query(&query.sql, bind_params(query.params)).await?;
        let mut batch = Vec::new();
        while let Some(row) = rows.next().await? {
            batch.push(row_to_comment(&row)?);
        }
        tx.commit().await?;

        Ok(CommentPage::from_newest_first(
            batch,
            total,
            per_page,
            current_page,
        ))
    }

    async fn list_recent_tickets(
        &self,
        scope: TicketScope,
        exclude_secure_id: &str,
        limit: i64,
    ) -> Result<Vec<RecentTicket>, DatabaseError> {
        let conn = self.connect().await?;
        let query = support_sql::recent_tickets(DIALECT, scope, exclude_secure_id, limit);
        let mut rows = conn.query(&query.sql, bind_params(query.params)).await?;
        let mut tickets = Vec::new();
        while let Some(row) = rows.next().await? {
            tickets.push(row_to_recent_ticket(&row)?);
        }
        Ok(tickets)
    }
}
