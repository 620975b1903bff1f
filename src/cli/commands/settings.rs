use anyhow::bail;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::{CliContext, OutputFormat};
use crate::datetime;

#[derive(Subcommand)]
pub enum SettingsCommands {
    #[command(about = "Show the next webinar date in the viewer's wall clock")]
    Show,

    #[command(about = "Set the next webinar date")]
    Set {
        #[arg(help = "Local date and time, YYYY-MM-DDTHH:MM")]
        value: String,
    },
}

pub async fn handle(cmd: SettingsCommands, ctx: &CliContext) -> anyhow::Result<()> {
    ctx.dashboard.mount(ctx.offset).await;

    match cmd {
        SettingsCommands::Show => {
            let current = ctx.dashboard.settings().await;
            match ctx.output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "webinar_date": current.webinar_date,
                            "webinar_date_display": datetime::display_long(&current.webinar_date),
                        }))?
                    );
                }
                OutputFormat::Text => match datetime::display_long(&current.webinar_date) {
                    Some(display) => println!("Next webinar: {}", display),
                    None => println!("No webinar date set"),
                },
            }
            Ok(())
        }
        SettingsCommands::Set { value } => {
            match ctx.dashboard.save_settings(Some(value), ctx.offset).await {
                Ok(outcome) => {
                    let current = ctx.dashboard.settings().await;
                    output_success(
                        &ctx.output_format,
                        crate::dashboard::settings::SAVED_MESSAGE,
                        Some(json!({
                            "webinar_date": current.webinar_date,
                            "outcome": format!("{:?}", outcome),
                        })),
                    )
                }
                Err(e) => {
                    output_error(&ctx.output_format, &e.to_string())?;
                    bail!(e)
                }
            }
        }
    }
}
