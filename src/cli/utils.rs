use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::dashboard::{Notice, NoticeLevel};

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(obj)) = (data, response.as_object_mut()) {
                obj.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": false,
                    "error": message
                }))?
            );
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// First error notice, if any action reported one
pub fn first_error(notices: &[Notice]) -> Option<&Notice> {
    notices.iter().find(|n| n.level == NoticeLevel::Error)
}

/// Print informational notices in text mode; JSON output carries them inline
pub fn print_notices(output_format: &OutputFormat, notices: &[Notice]) {
    if let OutputFormat::Text = output_format {
        for notice in notices.iter().filter(|n| n.level == NoticeLevel::Info) {
            println!("{}", notice.message);
        }
    }
}
