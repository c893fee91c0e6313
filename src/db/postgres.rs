//! PostgreSQL backend for the Database trait.
//!
//! Runs the shared support statements in `$N` dialect over a
//! `deadpool-postgres` pool. Multi-statement operations use one read-only
//! transaction so counts and pages agree.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{GenericClient, Manager, ManagerConfig, Pool, RecyclingMethod};
use secrecy::ExposeSecret as _;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

use crate::config::DatabaseConfig;
use crate::db::support_sql::{self, SqlDialect, SqlParam, SqlQuery};
use crate::db::{Database, SupportTicketStore};
use crate::error::DatabaseError;
use crate::support::{
    CommentPage, LabelRow, LabelSet, RecentTicket, TicketComment, TicketDetail, TicketLabel,
    TicketListPage, TicketListRequest, TicketOwner, TicketScope, TicketSummary, clamp_page,
    group_labels, last_page,
};

mod embedded {
    refinery::embed_migrations!("migrations");
}

const DIALECT: SqlDialect = SqlDialect::Postgres;

/// PostgreSQL database backend.
pub struct PgBackend {
    pool: Pool,
}

impl PgBackend {
    /// Create a new PostgreSQL backend from configuration.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config.url.as_ref().ok_or_else(|| {
            DatabaseError::Pool("DATABASE_URL is required for the postgres backend".to_string())
        })?;
        let pg_config: tokio_postgres::Config = url
            .expose_secret()
            .parse()
            .map_err(|e| DatabaseError::Pool(format!("invalid DATABASE_URL: {}", e)))?;

        let manager = Manager::from_config(
            pg_config,
            tokio_postgres::NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(config.pool_size)
            .build()
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        // Fail fast on unreachable servers instead of on the first query.
        let _ = pool.get().await?;
        tracing::debug!("PostgreSQL pool ready (max_size={})", config.pool_size);
        Ok(Self { pool })
    }

    /// Get a clone of the connection pool.
    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }
}

fn sql_params(params: &[SqlParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|param| match param {
            SqlParam::Int(value) => value as &(dyn ToSql + Sync),
            SqlParam::Text(value) => value as &(dyn ToSql + Sync),
        })
        .collect()
}

async fn run_query<C>(conn: &C, query: &SqlQuery) -> Result<Vec<Row>, DatabaseError>
where
    C: GenericClient + Sync,
{
    Ok(conn
        .query(query.sql.as_str(), &sql_params(&query.params))
        .await?)
}

fn timestamp(secs: i64, field: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid {} timestamp {}", field, secs))
    })
}

fn text(row: &Row, idx: usize) -> String {
    row.get::<_, Option<String>>(idx).unwrap_or_default()
}

fn flag(row: &Row, idx: usize) -> bool {
    row.get::<_, Option<i64>>(idx).unwrap_or_default() != 0
}

fn row_to_ticket_summary(row: &Row) -> Result<TicketSummary, DatabaseError> {
    let owner = row.get::<_, Option<i64>>(16).map(|id| TicketOwner {
        id,
        username: row.get(17),
        fullname: row.get(18),
        avatar: row.get(19),
        email: row.get(20),
    });
    Ok(TicketSummary {
        id: row.get(0),
        secure_id: row.get(1),
        title: text(row, 2),
        content: text(row, 3),
        status: row.get(4),
        pin: flag(row, 5),
        user_read: flag(row, 6),
        admin_read: flag(row, 7),
        open_by: row.get(8),
        changed: timestamp(row.get(9), "support_tickets.changed")?,
        created: timestamp(row.get(10), "support_tickets.created")?,
        category_name: row.get(11),
        category_color: row.get(12),
        type_name: row.get(13),
        type_color: row.get(14),
        type_icon: row.get(15),
        owner,
        labels: LabelSet::default(),
    })
}

fn row_to_ticket_detail(row: &Row) -> Result<TicketDetail, DatabaseError> {
    Ok(TicketDetail {
        id: row.get(0),
        secure_id: row.get(1),
        user_id: row.get(2),
        cate_id: row.get(3),
        type_id: row.get(4),
        title: text(row, 5),
        content: text(row, 6),
        status: row.get(7),
        pin: flag(row, 8),
        user_read: flag(row, 9),
        admin_read: flag(row, 10),
        open_by: row.get(11),
        changed: timestamp(row.get(12), "support_tickets.changed")?,
        created: timestamp(row.get(13), "support_tickets.created")?,
        category_name: row.get(14),
        category_color: row.get(15),
        type_name: row.get(16),
        type_color: row.get(17),
        type_icon: row.get(18),
        user_fullname: row.get(19),
        user_avatar: row.get(20),
        labels: LabelSet::default(),
        total_comment: row.get(21),
    })
}

fn row_to_comment(row: &Row) -> Result<TicketComment, DatabaseError> {
    Ok(TicketComment {
        id: row.get(0),
        ticket_id: row.get(1),
        user_id: row.get(2),
        comment: text(row, 3),
        changed: timestamp(row.get(4), "support_comments.changed")?,
        created: timestamp(row.get(5), "support_comments.created")?,
        user_avatar: row.get(6),
        user_fullname: row.get(7),
    })
}

fn row_to_recent_ticket(row: &Row) -> Result<RecentTicket, DatabaseError> {
    Ok(RecentTicket {
        id: row.get(0),
        secure_id: row.get(1),
        title: text(row, 2),
        status: row.get(3),
        created: timestamp(row.get(4), "support_tickets.created")?,
        category_name: row.get(5),
        category_color: row.get(6),
        total_comment: row.get(7),
    })
}

async fn load_labels<C>(
    conn: &C,
    ticket_ids: &[i64],
) -> Result<HashMap<i64, LabelSet>, DatabaseError>
where
    C: GenericClient + Sync,
{
    if ticket_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = run_query(conn, &support_sql::ticket_labels(DIALECT, ticket_ids)).await?;
    Ok(group_labels(rows.iter().map(|row| LabelRow {
        ticket_id: row.get(0),
        label: TicketLabel {
            id: row.get(1),
            name: text(row, 2),
            color: text(row, 3),
            icon: text(row, 4),
        },
    })))
}

#[async_trait]
impl Database for PgBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let mut client = self.pool.get().await?;
        embedded::migrations::runner()
            .run_async(&mut **client)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SupportTicketStore for PgBackend {
    async fn list_tickets(
        &self,
        scope: TicketScope,
        request: &TicketListRequest,
    ) -> Result<TicketListPage, DatabaseError> {
        let mut client = self.pool.get().await?;
        let tx = client.build_transaction().read_only(true).start().await?;

        let total = run_query(&tx, &support_sql::ticket_list_count(DIALECT, scope, request))
            .await?
            .first()
            .map(|row| row.get::<_, i64>(0))
            .unwrap_or(0);

        let rows = run_query(&tx, &support_sql::ticket_list_page(DIALECT, scope, request)).await?;
        let mut tickets = rows
            .iter()
            .map(row_to_ticket_summary)
            .collect::<Result<Vec<_>, _>>()?;

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
        let mut client = self.pool.get().await?;
        let tx = client.build_transaction().read_only(true).start().await?;

        let rows = run_query(&tx, &support_sql::ticket_detail(DIALECT, scope, secure_id)).await?;
        let Some(row) = rows.first() else {
            tx.commit().await?;
            return Ok(None);
        };
        let mut ticket = row_to_ticket_detail(row)?;
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
        let mut client = self.pool.get().await?;
        let tx = client.build_transaction().read_only(true).start().await?;

        let Some(total) = run_query(&tx, &support_sql::comment_count(DIALECT, scope, ticket_id))
            .await?
            .first()
            .map(|row| row.get::<_, i64>(0))
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
        let batch = run_query(&tx, &query)
            .await?
            .iter()
            .map(row_to_comment)
            .collect::<Result<Vec<_>, _>>()?;
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
        let client = self.pool.get().await?;
        let query = support_sql::recent_tickets(DIALECT, scope, exclude_secure_id, limit);
        run_query(&client, &query)
            .await?
            .iter()
            .map(row_to_recent_ticket)
            .collect()
    }
}
