use std::path::PathBuf;

use anyhow::bail;
use chrono::Utc;
use serde_json::json;

use crate::cli::utils::{first_error, output_error, output_success, print_notices};
use crate::cli::{CliContext, OutputFormat};

/// `brainlit list`
pub async fn list(ctx: &CliContext) -> anyhow::Result<()> {
    ctx.dashboard.mount(ctx.offset).await;
    let snapshot = ctx.dashboard.snapshot(ctx.offset).await;

    if let Some(err) = first_error(&snapshot.notices) {
        output_error(&ctx.output_format, &err.message)?;
        bail!("{}", err.message);
    }

    match ctx.output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "total": snapshot.total,
                    "registrations": snapshot.registrations,
                }))?
            );
        }
        OutputFormat::Text => {
            print_notices(&ctx.output_format, &snapshot.notices);
            for row in &snapshot.registrations {
                let reg = &row.registration;
                println!(
                    "{:>6}  {:<24}  {:<16}  {:<32}  {:<20}  {}",
                    reg.id, reg.parent_name, reg.whatsapp, reg.email, reg.location, row.registered_at_display
                );
            }
            println!("{} total", snapshot.total);
        }
    }
    Ok(())
}

/// `brainlit export [--output PATH]`
pub async fn export(ctx: &CliContext, output: Option<String>) -> anyhow::Result<()> {
    ctx.dashboard.mount(ctx.offset).await;
    let notices = ctx.dashboard.snapshot(ctx.offset).await.notices;

    // Unlike the web dashboard there is no earlier list to fall back on
    if let Some(err) = first_error(&notices) {
        output_error(&ctx.output_format, &err.message)?;
        bail!("{}", err.message);
    }

    let export = ctx.dashboard.export_csv(Utc::now()).await?;
    let path = PathBuf::from(output.unwrap_or_else(|| export.filename.clone()));
    std::fs::write(&path, export.content.as_bytes())?;

    let rows = export.content.lines().count().saturating_sub(1);
    output_success(
        &ctx.output_format,
        &format!("Exported {} registrations to {}", rows, path.display()),
        Some(json!({ "path": path.display().to_string(), "rows": rows })),
    )
}
