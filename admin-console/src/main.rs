//! `recalliq-console`: drives the admin session layer from a terminal.

use admin_console::models::{BatchAction, Id, LogFilter, LoginCredentials, RecipientQuery};
use admin_console::{load_console_config, ApiError, AuthPhase, ConsoleApp};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recalliq-console")]
#[command(about = "Command-line client for the RecallIQ admin API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session locally
    Login {
        email: String,

        #[arg(long, env = "RECALLIQ_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List contact groups
    Groups {
        #[arg(long)]
        page: Option<u32>,
    },

    /// List or search recipients
    Recipients {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        group: Option<Id>,

        #[arg(long)]
        page: Option<u32>,
    },

    /// List batches, or run a lifecycle action on one
    Batches {
        id: Option<Id>,

        #[arg(long, value_enum, requires = "id")]
        action: Option<BatchCommand>,
    },

    /// List email templates
    Templates {
        #[arg(long)]
        page: Option<u32>,
    },

    /// List email delivery logs
    Logs {
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        batch: Option<Id>,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(long)]
        page: Option<u32>,
    },

    /// Show delivery analytics
    Analytics {
        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Print a diagnostic report for support
    Diagnostics,
}

#[derive(Clone, Copy, ValueEnum)]
enum BatchCommand {
    Start,
    Pause,
    Resume,
    Cancel,
}

impl From<BatchCommand> for BatchAction {
    fn from(value: BatchCommand) -> Self {
        match value {
            BatchCommand::Start => BatchAction::Start,
            BatchCommand::Pause => BatchAction::Pause,
            BatchCommand::Resume => BatchAction::Resume,
            BatchCommand::Cancel => BatchAction::Cancel,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_console_config().context("Failed to load console configuration")?;
    let app = ConsoleApp::from_config(&config).context("Failed to initialise API client")?;

    let outcome = run(&app, cli.command).await;
    if let Err(err) = &outcome {
        if matches!(err.downcast_ref::<ApiError>(), Some(ApiError::SessionExpired)) {
            app.session().handle_session_expired();
        }
        app.diagnostics().record_app_error("command", &**err);
        error!(error = %err, "command failed");
    }
    outcome
}

async fn run(app: &ConsoleApp, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            let user = app
                .session()
                .login(&LoginCredentials { email, password })
                .await?;
            info!(user = %user.display_name(), role = %user.role, "signed in");
            println!("{}", app.session().post_login_destination(None));
        }
        Commands::Logout => app.session().logout(),
        Commands::Whoami => {
            require_session(app).await?;
            print_json(&app.session().user())?;
        }
        Commands::Groups { page } => {
            require_session(app).await?;
            print_json(&app.groups().list(page).await?)?;
        }
        Commands::Recipients {
            search,
            group,
            page,
        } => {
            require_session(app).await?;
            let query = RecipientQuery {
                search,
                group,
                page,
                page_size: None,
            };
            print_json(&app.recipients().list(&query).await?)?;
        }
        Commands::Batches { id, action } => {
            require_session(app).await?;
            match (id, action) {
                (Some(id), Some(action)) => {
                    print_json(&app.batches().perform(id, action.into()).await?)?
                }
                (Some(id), None) => print_json(&app.batches().get(id).await?)?,
                (None, _) => print_json(&app.batches().list(None).await?)?,
            }
        }
        Commands::Templates { page } => {
            require_session(app).await?;
            print_json(&app.templates().list(page).await?)?;
        }
        Commands::Logs {
            status,
            batch,
            from,
            to,
            page,
        } => {
            require_session(app).await?;
            let filter = LogFilter {
                status,
                batch,
                date_from: from,
                date_to: to,
                page,
            };
            print_json(&app.logs().list(&filter).await?)?;
        }
        Commands::Analytics { from, to } => {
            require_session(app).await?;
            let analytics = app.logs().analytics(from, to).await?;
            if let Some(rate) = analytics.delivery_rate() {
                info!(delivery_rate = rate, "analytics loaded");
            }
            print_json(&analytics)?;
        }
        Commands::Diagnostics => {
            let report = app.diagnostic_report();
            println!("{}", report.to_json()?);
        }
    }
    Ok(())
}

async fn require_session(app: &ConsoleApp) -> Result<()> {
    let state = app.session().restore().await;
    if state.phase != AuthPhase::Authenticated {
        bail!("Not signed in. Run `recalliq-console login <email>` first.");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
