//! Database abstraction layer.
//!
//! Provides a backend-agnostic `Database` trait for the support ticket
//! queries. Two implementations exist behind feature flags:
//!
//! - `postgres` (default): Uses `deadpool-postgres` + `tokio-postgres`
//! - `libsql`: Uses libSQL (Turso's SQLite fork) for embedded/edge deployment
//!
//! Both backends take their SQL from [`support_sql`], so the two dialects
//! cannot drift apart in filtering or scoping.

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "libsql")]
pub mod libsql;

#[cfg(feature = "libsql")]
pub mod libsql_migrations;

pub mod support_sql;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::support::{
    CommentPage, RecentTicket, TicketDetail, TicketListPage, TicketListRequest, TicketScope,
};

/// Create a database backend from configuration and return it.
///
/// Migrations are not run here; the support schema is owned by the
/// application that writes tickets. Use `supportdesk migrate` to bootstrap
/// a local database.
pub async fn connect_from_config(
    config: &crate::config::DatabaseConfig,
) -> Result<Arc<dyn Database>, DatabaseError> {
    match config.backend {
        #[cfg(feature = "libsql")]
        crate::config::DatabaseBackend::LibSql => {
            use secrecy::ExposeSecret as _;

            let default_path = crate::config::default_libsql_path();
            let db_path = config.libsql_path.as_deref().unwrap_or(&default_path);

            let backend = if let Some(ref url) = config.libsql_url {
                let token = config.libsql_auth_token.as_ref().ok_or_else(|| {
                    DatabaseError::Pool(
                        "LIBSQL_AUTH_TOKEN required when LIBSQL_URL is set".to_string(),
                    )
                })?;
                libsql::LibSqlBackend::new_remote_replica(db_path, url, token.expose_secret())
                    .await?
            } else {
                libsql::LibSqlBackend::new_local(db_path).await?
            };
            Ok(Arc::new(backend))
        }
        #[cfg(feature = "postgres")]
        crate::config::DatabaseBackend::Postgres => {
            let pg = postgres::PgBackend::new(config).await?;
            Ok(Arc::new(pg))
        }
        #[allow(unreachable_patterns)]
        other => Err(DatabaseError::Pool(format!(
            "database backend '{}' is not compiled in; enable the matching cargo feature",
            other.as_str()
        ))),
    }
}

/// Read-only support ticket queries.
///
/// Every method takes the caller's [`TicketScope`]. Owner scope restricts
/// all rows to the actor's tickets; rows outside the scope are reported as
/// absent, never as an error.
#[async_trait]
pub trait SupportTicketStore: Send + Sync {
    /// One page of tickets with labels attached, plus the filtered count.
    async fn list_tickets(
        &self,
        scope: TicketScope,
        request: &TicketListRequest,
    ) -> Result<TicketListPage, DatabaseError>;

    /// Ticket by secure id, or `None` if missing or outside the scope.
    async fn get_ticket_detail(
        &self,
        scope: TicketScope,
        secure_id: &str,
    ) -> Result<Option<TicketDetail>, DatabaseError>;

    /// One page of a ticket's comments, oldest first within the page.
    ///
    /// Pages are cut newest-first: page 1 holds the latest `per_page`
    /// comments. `page` is clamped into `1..=last_page`. A ticket that is
    /// missing or outside the scope yields an empty page.
    async fn list_ticket_comments(
        &self,
        scope: TicketScope,
        ticket_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<CommentPage, DatabaseError>;

    /// Most recently created tickets, excluding `exclude_secure_id`.
    async fn list_recent_tickets(
        &self,
        scope: TicketScope,
        exclude_secure_id: &str,
        limit: i64,
    ) -> Result<Vec<RecentTicket>, DatabaseError>;
}

/// Backend-agnostic database supertrait.
#[async_trait]
pub trait Database: SupportTicketStore + Send + Sync {
    /// Create the support tables if they do not exist yet.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;
}
