//! SQL text for the support ticket queries.
//!
//! Both backends run the same statements; only placeholder syntax and the
//! case-insensitive match operator differ, which [`SqlDialect`] captures.
//! Column positions in each projection are fixed and decoded by index in
//! the backends.

use crate::support::{SortColumn, TicketFilter, TicketListRequest, TicketScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// libSQL / SQLite: `?N` placeholders, `LOWER(..) LIKE LOWER(..)`.
    ///
    /// SQLite's `LOWER` folds ASCII letters only, so search here ignores
    /// case for `A-Z` but not for accented letters (`É` does not match
    /// `é`). PostgreSQL's `ILIKE` folds those too.
    Sqlite,
    /// PostgreSQL: `$N` placeholders, `ILIKE`.
    Postgres,
}

impl SqlDialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Self::Sqlite => format!("?{index}"),
            Self::Postgres => format!("${index}"),
        }
    }

    fn contains(self, column: &str, placeholder: &str) -> String {
        match self {
            Self::Sqlite => format!("LOWER({column}) LIKE LOWER({placeholder}) ESCAPE '\\'"),
            Self::Postgres => format!("{column} ILIKE {placeholder} ESCAPE '\\'"),
        }
    }
}

/// Bound value for a composed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

/// A statement plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

struct Binder {
    dialect: SqlDialect,
    params: Vec<SqlParam>,
}

impl Binder {
    fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        self.dialect.placeholder(self.params.len())
    }

    fn finish(self, sql: String) -> SqlQuery {
        SqlQuery {
            sql,
            params: self.params,
        }
    }
}

/// Escape LIKE wildcards so the needle matches literally, then wrap it for
/// a substring match.
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

const TICKET_REFERENCE_JOINS: &str = "\
    FROM support_tickets t \
    LEFT JOIN support_categories c ON c.id = t.cate_id \
    LEFT JOIN support_types s ON s.id = t.type_id \
    LEFT JOIN users u ON u.id = t.user_id";

const COMMENT_TOTALS: &str = "\
    LEFT JOIN (SELECT ticket_id, COUNT(*) AS total_comment \
               FROM support_comments GROUP BY ticket_id) com ON com.ticket_id = t.id";

/// Listing projection:
/// 0 id, 1 id_secure, 2 title, 3 content, 4 status, 5 pin, 6 user_read,
/// 7 admin_read, 8 open_by, 9 changed, 10 created, 11 category name,
/// 12 category color, 13 type name, 14 type color, 15 type icon,
/// 16 user id, 17 username, 18 fullname, 19 avatar, 20 email.
const TICKET_SUMMARY_COLUMNS: &str = "\
    t.id, t.id_secure, t.title, t.content, t.status, t.pin, t.user_read, \
    t.admin_read, t.open_by, t.changed, t.created, c.name, c.color, \
    s.name, s.color, s.icon, u.id, u.username, u.fullname, u.avatar, u.email";

/// Detail projection:
/// 0 id, 1 id_secure, 2 user_id, 3 cate_id, 4 type_id, 5 title, 6 content,
/// 7 status, 8 pin, 9 user_read, 10 admin_read, 11 open_by, 12 changed,
/// 13 created, 14 category name, 15 category color, 16 type name,
/// 17 type color, 18 type icon, 19 fullname, 20 avatar, 21 total_comment.
const TICKET_DETAIL_COLUMNS: &str = "\
    t.id, t.id_secure, t.user_id, t.cate_id, t.type_id, t.title, t.content, \
    t.status, t.pin, t.user_read, t.admin_read, t.open_by, t.changed, t.created, \
    c.name, c.color, s.name, s.color, s.icon, u.fullname, u.avatar, \
    COALESCE(com.total_comment, 0)";

/// Comment projection:
/// 0 id, 1 ticket_id, 2 user_id, 3 comment, 4 changed, 5 created,
/// 6 avatar, 7 fullname.
const COMMENT_COLUMNS: &str =
    "cm.id, cm.ticket_id, cm.user_id, cm.comment, cm.changed, cm.created, u.avatar, u.fullname";

/// Recent-ticket projection:
/// 0 id, 1 id_secure, 2 title, 3 status, 4 created, 5 category name,
/// 6 category color, 7 total_comment.
const RECENT_COLUMNS: &str = "\
    t.id, t.id_secure, t.title, t.status, t.created, c.name, c.color, \
    COALESCE(com.total_comment, 0)";

fn scope_clause(binder: &mut Binder, scope: TicketScope, clauses: &mut Vec<String>) {
    if let Some(user_id) = scope.owner_id() {
        let p = binder.bind(SqlParam::Int(user_id));
        clauses.push(format!("t.user_id = {p}"));
    }
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

fn filter_clauses(
    binder: &mut Binder,
    scope: TicketScope,
    filter: &TicketFilter,
) -> Vec<String> {
    let mut clauses = Vec::new();
    scope_clause(binder, scope, &mut clauses);

    if let Some(category_id) = filter.category_id {
        let p = binder.bind(SqlParam::Int(category_id));
        clauses.push(format!("t.cate_id = {p}"));
    }
    if let Some(label_id) = filter.label_id {
        let p = binder.bind(SqlParam::Int(label_id));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM support_map_labels ml \
             WHERE ml.ticket_id = t.id AND ml.label_id = {p})"
        ));
    }
    if let Some(status) = filter.status {
        let p = binder.bind(SqlParam::Int(status));
        clauses.push(format!("t.status = {p}"));
    }
    if let Some(needle) = filter.search.as_deref() {
        let p = binder.bind(SqlParam::Text(like_pattern(needle)));
        let mut columns = vec!["t.content", "t.title", "c.name"];
        if scope.is_admin() {
            columns.extend(["u.username", "u.fullname", "u.email"]);
        }
        let any = columns
            .iter()
            .map(|column| binder.dialect.contains(column, &p))
            .collect::<Vec<_>>()
            .join(" OR ");
        clauses.push(format!("({any})"));
    }
    clauses
}

fn order_sql(request: &TicketListRequest, scope: TicketScope) -> String {
    let direction = request.order.direction.as_sql();
    let column = match request.order.column {
        SortColumn::Id => return format!("t.id {direction}"),
        SortColumn::SecureId => "t.id_secure",
        SortColumn::Subject if scope.is_admin() => "t.title",
        SortColumn::Subject => "t.content",
        SortColumn::Category => "c.name",
    };
    format!("{column} {direction}, t.id DESC")
}

/// Number of tickets matching the listing filters.
pub fn ticket_list_count(
    dialect: SqlDialect,
    scope: TicketScope,
    request: &TicketListRequest,
) -> SqlQuery {
    let mut binder = Binder::new(dialect);
    let clauses = filter_clauses(&mut binder, scope, &request.filter);
    let sql = format!(
        "SELECT COUNT(*) {TICKET_REFERENCE_JOINS}{}",
        where_sql(&clauses)
    );
    binder.finish(sql)
}

/// One page of listing rows (see [`TICKET_SUMMARY_COLUMNS`]).
pub fn ticket_list_page(
    dialect: SqlDialect,
    scope: TicketScope,
    request: &TicketListRequest,
) -> SqlQuery {
    let mut binder = Binder::new(dialect);
    let clauses = filter_clauses(&mut binder, scope, &request.filter);
    let limit = binder.bind(SqlParam::Int(request.page.per_page));
    let offset = binder.bind(SqlParam::Int(request.page.offset()));
    let sql = format!(
        "SELECT {TICKET_SUMMARY_COLUMNS} {TICKET_REFERENCE_JOINS}{} \
         ORDER BY {} LIMIT {limit} OFFSET {offset}",
        where_sql(&clauses),
        order_sql(request, scope),
    );
    binder.finish(sql)
}

/// Label rows for a set of tickets:
/// 0 ticket_id, 1 label id, 2 name, 3 color, 4 icon.
pub fn ticket_labels(dialect: SqlDialect, ticket_ids: &[i64]) -> SqlQuery {
    let mut binder = Binder::new(dialect);
    let placeholders = ticket_ids
        .iter()
        .map(|id| binder.bind(SqlParam::Int(*id)))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT DISTINCT ml.ticket_id, l.id, l.name, l.color, l.icon \
         FROM support_map_labels ml \
         JOIN support_labels l ON l.id = ml.label_id \
         WHERE ml.ticket_id IN ({placeholders}) \
         ORDER BY ml.ticket_id, l.name, l.id"
    );
    binder.finish(sql)
}

/// Single ticket by secure id (see [`TICKET_DETAIL_COLUMNS`]).
pub fn ticket_detail(dialect: SqlDialect, scope: TicketScope, secure_id: &str) -> SqlQuery {
    let mut binder = Binder::new(dialect);
    let p = binder.bind(SqlParam::Text(secure_id.to_string()));
    let mut clauses = vec![format!("t.id_secure = {p}")];
    scope_clause(&mut binder, scope, &mut clauses);
    let sql = format!(
        "SELECT {TICKET_DETAIL_COLUMNS} {TICKET_REFERENCE_JOINS} {COMMENT_TOTALS}{} LIMIT 1",
        where_sql(&clauses)
    );
    binder.finish(sql)
}

/// Comment count for a visible ticket. Yields no row when the ticket does
/// not exist or is outside the scope.
pub fn comment_count(dialect: SqlDialect, scope: TicketScope, ticket_id: i64) -> SqlQuery {
    let mut binder = Binder::new(dialect);
    let p = binder.bind(SqlParam::Int(ticket_id));
    let mut clauses = vec![format!("t.id = {p}")];
    scope_clause(&mut binder, scope, &mut clauses);
    let sql = format!(
        "SELECT COUNT(cm.id) FROM support_tickets t \
         LEFT JOIN support_comments cm ON cm.ticket_id = t.id{} \
         GROUP BY t.id",
        where_sql(&clauses)
    );
    binder.finish(sql)
}

/// Newest-first batch of comments (see [`COMMENT_COLUMNS`]).
pub fn comment_batch(
    dialect: SqlDialect,
    scope: TicketScope,
    ticket_id: i64,
    limit: i64,
    offset: i64,
) -> SqlQuery {
    let mut binder = Binder::new(dialect);
    let p = binder.bind(SqlParam::Int(ticket_id));
    let mut clauses = vec![format!("cm.ticket_id = {p}")];
    scope_clause(&mut binder, scope, &mut clauses);
    let limit = binder.bind(SqlParam::Int(limit));
    let offset = binder.bind(SqlParam::Int(offset));
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM support_comments cm \
         JOIN support_tickets t ON t.id = cm.ticket_id \
         LEFT JOIN users u ON u.id = cm.user_id{} \
         ORDER BY cm.created DESC, cm.id DESC LIMIT {limit} OFFSET {offset}",
        where_sql(&clauses)
    );
    binder.finish(sql)
}

/// Latest tickets other than `exclude_secure_id` (see [`RECENT_COLUMNS`]).
pub fn recent_tickets(
    dialect: SqlDialect,
    scope: TicketScope,
    exclude_secure_id: &str,
    limit: i64,
) -> SqlQuery {
    let mut binder = Binder::new(dialect);
    let p = binder.bind(SqlParam::Text(exclude_secure_id.to_string()));
    let mut clauses = vec![format!("t.id_secure <> {p}")];
    scope_clause(&mut binder, scope, &mut clauses);
    let limit = binder.bind(SqlParam::Int(limit));
    let sql = format!(
        "SELECT {RECENT_COLUMNS} FROM support_tickets t \
         LEFT JOIN support_categories c ON c.id = t.cate_id \
         {COMMENT_TOTALS}{} \
         ORDER BY t.created DESC, t.id DESC LIMIT {limit}",
        where_sql(&clauses)
    );
    binder.finish(sql)
}
