//! `sysconsole` command-line entry point.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use sysconsole_auth::Permission;
use sysconsole_client::api::PageQuery;
use sysconsole_client::{ClientConfig, ConsoleContext, SessionToken, TokenStore, TracingNotifier};
use sysconsole_observability::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "sysconsole", about = "Admin console client", version)]
struct Cli {
    /// Log output format (json or pretty).
    #[arg(long, env = "SYSCONSOLE_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Resource {
    Users,
    Roles,
    Depts,
    Menus,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a session token obtained from the login page.
    Login {
        #[arg(long)]
        token: String,
    },
    /// Clear the session and the stored token.
    Logout,
    /// Show the signed-in user and their permissions.
    Whoami,
    /// Check a permission code against the current session.
    Can { code: String },
    /// Run navigations through the route guard.
    Visit {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List a resource.
    List {
        resource: Resource,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format: LogFormat = cli
        .log_format
        .parse()
        .map_err(anyhow::Error::msg)
        .context("invalid --log-format")?;
    sysconsole_observability::init_with(format);

    let config = ClientConfig::from_env().context("failed to read configuration")?;
    tracing::debug!(api_url = %config.api_url, token_file = ?config.token_file, "configuration loaded");

    let ctx = ConsoleContext::from_config(&config, Arc::new(TracingNotifier))
        .context("failed to initialize console")?;

    match cli.command {
        Command::Login { token } => {
            let Some(token) = SessionToken::new(token) else {
                bail!("token must not be blank");
            };
            ctx.session.tokens().save(&token)?;
            if !ctx.session.fetch_user_info().await {
                bail!("token was rejected by the server");
            }
            println!("logged in");
        }
        Command::Logout => {
            ctx.session.clear_auth();
            println!("logged out");
        }
        Command::Whoami => {
            if !ctx.session.fetch_user_info().await {
                bail!("not logged in");
            }
            let snapshot = ctx.session.snapshot();
            print_json(&serde_json::json!({
                "user": snapshot.user,
                "permissions": snapshot.permissions.sorted(),
            }))?;
        }
        Command::Can { code } => {
            let code = Permission::parse(&code).context("invalid permission code")?;
            if !ctx.session.fetch_user_info().await {
                bail!("not logged in");
            }
            let decision = ctx.session.explain(Some(code.as_str()));
            println!("{code}: {} ({})", decision.is_granted(), decision.reason());
        }
        Command::Visit { paths } => {
            for path in paths {
                let outcome = ctx.router.navigate(&path).await;
                print_json(&serde_json::json!({
                    "requested": path,
                    "result": outcome,
                    "location": ctx.location.current(),
                }))?;
            }
        }
        Command::List { resource, page, size } => {
            let query = PageQuery::page(page, size);
            match resource {
                Resource::Users => print_json(&ctx.user_api().page(&query).await?)?,
                Resource::Roles => print_json(&ctx.role_api().page(&query).await?)?,
                Resource::Depts => print_json(&ctx.dept_api().tree().await?)?,
                Resource::Menus => print_json(&ctx.menu_api().tree().await?)?,
            }
        }
    }

    Ok(())
}
