//! Read-only support ticket queries.
//!
//! Lists, shows and pages support tickets for two audiences: administrators
//! who see everything, and ticket owners who only see their own rows. The
//! visibility rule travels with every call as a [`support::TicketScope`].

pub mod config;
pub mod db;
pub mod error;
pub mod settings;
pub mod support;

pub use config::Config;
pub use error::{ConfigError, DatabaseError};
pub use support::{SupportDesk, TicketScope};
