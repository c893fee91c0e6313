//! `supportdesk` command line: query support tickets as JSON.

use std::io::Write as _;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use supportdesk::support::{OrderSpec, TicketListQuery};
use supportdesk::{Config, SupportDesk, TicketScope};

#[derive(Debug, Parser)]
#[command(name = "supportdesk", about = "Read-only support ticket queries", version)]
struct Cli {
    /// Query as this user (owner scope). Without it, queries run as admin.
    #[arg(long = "as-user", value_name = "ID", global = true)]
    as_user: Option<i64>,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ticket queries.
    #[command(subcommand)]
    Tickets(TicketsCommand),
    /// Create the support tables on the configured backend.
    Migrate,
}

#[derive(Debug, Subcommand)]
enum TicketsCommand {
    /// List tickets with filters, ordering and paging.
    List(ListArgs),
    /// Show one ticket by secure id.
    Show {
        #[arg(value_name = "SECURE_ID")]
        secure_id: String,
    },
    /// Page through a ticket's comments.
    Comments {
        #[arg(value_name = "TICKET_ID")]
        ticket_id: i64,
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
    /// Most recent tickets, excluding the given one.
    Recent {
        #[arg(value_name = "EXCLUDE_SECURE_ID", default_value = "")]
        exclude: String,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(long)]
    start: Option<i64>,
    #[arg(long)]
    length: Option<i64>,
    /// 0 = secure id, 1 = subject, 2 = category name.
    #[arg(long = "order-column")]
    order_column: Option<i64>,
    #[arg(long = "order-dir", value_parser = ["asc", "desc"])]
    order_dir: Option<String>,
    /// Category id, -1 for any.
    #[arg(long = "category", allow_hyphen_values = true)]
    category: Option<i64>,
    /// Label id, -1 for any.
    #[arg(long = "label", allow_hyphen_values = true)]
    label: Option<i64>,
    /// Status code, -1 for any.
    #[arg(long = "status", allow_hyphen_values = true)]
    status: Option<i64>,
    #[arg(long)]
    search: Option<String>,
}

impl ListArgs {
    fn into_query(self) -> TicketListQuery {
        let order = if self.order_column.is_some() || self.order_dir.is_some() {
            vec![OrderSpec {
                column: self.order_column,
                dir: self.order_dir,
            }]
        } else {
            Vec::new()
        };
        TicketListQuery {
            start: self.start,
            length: self.length,
            order,
            cate_id: self.category,
            label_id: self.label,
            status: self.status,
            search: self.search,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // RUST_LOG may come from .env.
    let _ = dotenvy::dotenv();
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    let store = supportdesk::db::connect_from_config(&config.database)
        .await
        .context("failed to open database")?;
    tracing::info!(backend = config.database.backend.as_str(), "Database ready");

    let scope = match cli.as_user {
        Some(user_id) => TicketScope::owner(user_id),
        None => TicketScope::Admin,
    };

    match cli.command {
        Command::Migrate => {
            store.run_migrations().await.context("migration failed")?;
            tracing::info!("Support schema is up to date");
        }
        Command::Tickets(command) => {
            let desk = SupportDesk::new(store, config.support);
            match command {
                TicketsCommand::List(args) => {
                    let page = desk.list_tickets(scope, &args.into_query()).await?;
                    print_json(&page, cli.pretty)?;
                }
                TicketsCommand::Show { secure_id } => {
                    let detail = desk.ticket_detail(scope, &secure_id).await?;
                    print_json(&detail, cli.pretty)?;
                }
                TicketsCommand::Comments { ticket_id, page } => {
                    let comments = desk.comments(scope, ticket_id, page).await?;
                    print_json(&comments, cli.pretty)?;
                }
                TicketsCommand::Recent { exclude } => {
                    let recent = desk.recent_tickets(scope, &exclude).await?;
                    print_json(&recent, cli.pretty)?;
                }
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "supportdesk=info".into());
    let json = json_log_format(std::env::var("SUPPORTDESK_LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn json_log_format(raw: Option<&str>) -> bool {
    raw.is_some_and(|format| format.trim().eq_ignore_ascii_case("json"))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_flags_map_to_query() {
        let cli = Cli::try_parse_from([
            "supportdesk",
            "--as-user",
            "4",
            "tickets",
            "list",
            "--order-column",
            "2",
            "--order-dir",
            "asc",
            "--label",
            "-1",
            "--search",
            "printer",
        ])
        .expect("parse");
        assert_eq!(cli.as_user, Some(4));

        let Command::Tickets(TicketsCommand::List(args)) = cli.command else {
            panic!("expected tickets list");
        };
        let query = args.into_query();
        assert_eq!(
            query.order,
            vec![OrderSpec {
                column: Some(2),
                dir: Some("asc".to_string()),
            }]
        );
        assert_eq!(query.label_id, Some(-1));
        assert_eq!(query.search.as_deref(), Some("printer"));
    }

    #[test]
    fn comments_page_defaults_to_one() {
        let cli = Cli::try_parse_from(["supportdesk", "tickets", "comments", "12"]).expect("parse");
        let Command::Tickets(TicketsCommand::Comments { ticket_id, page }) = cli.command else {
            panic!("expected tickets comments");
        };
        assert_eq!((ticket_id, page), (12, 1));
    }

    #[test]
    fn log_format_switch_accepts_json_only() {
        assert!(json_log_format(Some("json")));
        assert!(json_log_format(Some(" JSON ")));
        assert!(!json_log_format(Some("pretty")));
        assert!(!json_log_format(None));
    }

    #[test]
    fn unknown_order_dir_is_rejected() {
        let result =
            Cli::try_parse_from(["supportdesk", "tickets", "list", "--order-dir", "sideways"]);
        assert!(result.is_err());
    }
}
