//! SQLite-dialect schema for the libSQL backend.
//!
//! Mirrors the tables the support application writes. Only used to
//! bootstrap local databases and test fixtures; every statement is
//! idempotent.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT,
    fullname TEXT,
    avatar TEXT,
    email TEXT
);

CREATE TABLE IF NOT EXISTS support_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    color TEXT
);

CREATE TABLE IF NOT EXISTS support_types (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    color TEXT,
    icon TEXT
);

CREATE TABLE IF NOT EXISTS support_labels (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    color TEXT,
    icon TEXT
);

CREATE TABLE IF NOT EXISTS support_tickets (
    id INTEGER PRIMARY KEY,
    id_secure TEXT NOT NULL UNIQUE,
    cate_id INTEGER,
    type_id INTEGER,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    status INTEGER NOT NULL DEFAULT 1,
    pin INTEGER NOT NULL DEFAULT 0,
    user_read INTEGER NOT NULL DEFAULT 0,
    admin_read INTEGER NOT NULL DEFAULT 0,
    open_by INTEGER NOT NULL DEFAULT 1,
    changed INTEGER NOT NULL,
    created INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_support_tickets_user ON support_tickets(user_id);
CREATE INDEX IF NOT EXISTS idx_support_tickets_created ON support_tickets(created);

CREATE TABLE IF NOT EXISTS support_map_labels (
    id INTEGER PRIMARY KEY,
    ticket_id INTEGER NOT NULL,
    label_id INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_support_map_labels_ticket ON support_map_labels(ticket_id);
CREATE INDEX IF NOT EXISTS idx_support_map_labels_label ON support_map_labels(label_id);

CREATE TABLE IF NOT EXISTS support_comments (
    id INTEGER PRIMARY KEY,
    ticket_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    comment TEXT NOT NULL DEFAULT '',
    changed INTEGER NOT NULL,
    created INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_support_comments_ticket ON support_comments(ticket_id, created);
"#;
