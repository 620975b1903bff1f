pub mod commands;
pub mod utils;

use std::sync::Arc;

use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::backend::{PostgrestBackend, RegistrationBackend};
use crate::config::AppConfig;
use crate::dashboard::Dashboard;
use crate::datetime;

#[derive(Parser)]
#[command(name = "brainlit")]
#[command(about = "BrainLit admin CLI - registrations and webinar settings")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        allow_hyphen_values = true,
        help = "Viewer offset in minutes east of UTC (default from DASHBOARD_TZ_OFFSET_MINUTES)"
    )]
    pub offset: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List registrations, newest first")]
    List,

    #[command(about = "Export registrations to a CSV file")]
    Export {
        #[arg(long, short, help = "Output file path (default brainlit-registrations-<date>.csv)")]
        output: Option<String>,
    },

    #[command(about = "Next webinar date")]
    Settings {
        #[command(subcommand)]
        cmd: commands::settings::SettingsCommands,
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

/// Everything a command needs: a dashboard and the viewer offset
pub struct CliContext {
    pub dashboard: Dashboard,
    pub offset: FixedOffset,
    pub output_format: OutputFormat,
}

impl CliContext {
    pub fn new(
        config: &AppConfig,
        backend: Arc<dyn RegistrationBackend>,
        offset: Option<&str>,
        output_format: OutputFormat,
    ) -> anyhow::Result<Self> {
        let offset = match offset {
            Some(raw) => datetime::offset_from_minutes(raw)?,
            None => config.default_offset(),
        };
        Ok(Self {
            dashboard: Dashboard::new(backend, config.dashboard.export_prefix.clone()),
            offset,
            output_format,
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::config::config();
    let backend: Arc<dyn RegistrationBackend> = Arc::new(PostgrestBackend::new(&config.backend)?);
    let ctx = CliContext::new(config, backend, cli.offset.as_deref(), OutputFormat::from_cli(&cli))?;

    run_with(cli.command, &ctx).await
}

pub async fn run_with(command: Commands, ctx: &CliContext) -> anyhow::Result<()> {
    match command {
        Commands::List => commands::registrations::list(ctx).await,
        Commands::Export { output } => commands::registrations::export(ctx, output).await,
        Commands::Settings { cmd } => commands::settings::handle(cmd, ctx).await,
    }
}
