pub mod commands;
pub mod table;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::config::config;
use crate::error::ApiError;
use crate::inventory::{Category, Product, StockIn, StockOut};
use crate::reports::ReportPeriod;
use crate::users::ManagedUser;

#[derive(Parser)]
#[command(name = "simig")]
#[command(about = "SIMIG CLI - warehouse inventory from the command line")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "API base URL (overrides SIMIG_API_URL)")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in, register, sign out")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Screens available to the signed-in role")]
    Menu,

    #[command(about = "Warehouse totals and recent movements")]
    Dashboard,

    #[command(about = "Products and their remaining stock")]
    Product {
        #[command(subcommand)]
        cmd: commands::resource::ResourceCommands,
    },

    #[command(about = "Product categories (admin)")]
    Category {
        #[command(subcommand)]
        cmd: commands::resource::ResourceCommands,
    },

    #[command(about = "Inbound stock transactions (admin)")]
    StockIn {
        #[command(subcommand)]
        cmd: commands::resource::LedgerCommands,
    },

    #[command(about = "Outbound stock transactions (admin)")]
    StockOut {
        #[command(subcommand)]
        cmd: commands::resource::LedgerCommands,
    },

    #[command(about = "User accounts (admin)")]
    User {
        #[command(subcommand)]
        cmd: commands::resource::ResourceCommands,
    },

    #[command(about = "Stock movement report")]
    Report {
        #[arg(long, value_enum, default_value_t = ReportPeriod::Monthly)]
        period: ReportPeriod,
    },

    #[command(about = "Your profile, password and picture")]
    Profile {
        #[command(subcommand)]
        cmd: commands::profile::ProfileCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let mut app_config = config().clone();
    if let Some(url) = cli.api_url.filter(|url| !url.trim().is_empty()) {
        app_config = app_config.with_base_url(url.trim());
    }
    let app = App::open(app_config)?;

    let result = dispatch(cli.command, &app, output_format.clone()).await;
    if let (Err(e), OutputFormat::Json) = (&result, &output_format) {
        let code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<ApiError>())
            .map(ApiError::error_code);
        utils::output_error(&output_format, &e.to_string(), code)?;
    }
    result
}

async fn dispatch(command: Commands, app: &App, output_format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, app, output_format).await,
        Commands::Menu => {
            let screens: Vec<&str> = app.menu().iter().map(|s| s.as_str()).collect();
            if screens.is_empty() {
                return utils::output_empty_collection(&output_format, "screens", "Not signed in");
            }
            let titles: Vec<&str> = app.menu().iter().map(|s| s.title()).collect();
            utils::output_value(&output_format, &serde_json::json!({ "screens": screens }), || {
                titles.join("\n")
            })
        }
        Commands::Dashboard => commands::dashboard::handle(app, output_format).await,
        Commands::Product { cmd } => commands::resource::handle::<Product>(cmd, app, output_format).await,
        Commands::Category { cmd } => commands::resource::handle::<Category>(cmd, app, output_format).await,
        Commands::StockIn { cmd } => commands::resource::handle_ledger::<StockIn>(cmd, app, output_format).await,
        Commands::StockOut { cmd } => commands::resource::handle_ledger::<StockOut>(cmd, app, output_format).await,
        Commands::User { cmd } => commands::resource::handle::<ManagedUser>(cmd, app, output_format).await,
        Commands::Report { period } => commands::report::handle(period, app, output_format).await,
        Commands::Profile { cmd } => commands::profile::handle(cmd, app, output_format).await,
    }
}
