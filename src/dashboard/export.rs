use chrono::{DateTime, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use crate::backend::Registration;

pub const CSV_HEADERS: [&str; 6] = [
    "ID",
    "Parent Name",
    "WhatsApp",
    "Email",
    "Location",
    "Registered At",
];

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A downloadable registrations file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

impl CsvExport {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// `<prefix>-YYYY-MM-DD.csv`, dated in UTC
pub fn export_filename(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}.csv", prefix, now.format("%Y-%m-%d"))
}

/// Header line followed by one fully quoted line per registration, joined
/// by `\n` without a trailing newline.
pub fn registrations_csv(registrations: &[Registration]) -> Result<String, ExportError> {
    let mut content = CSV_HEADERS.join(",");
    if registrations.is_empty() {
        return Ok(content);
    }

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for reg in registrations {
        writer.write_record([
            reg.id.as_str(),
            reg.parent_name.as_str(),
            reg.whatsapp.as_str(),
            reg.email.as_str(),
            reg.location.as_str(),
            reg.registered_at.as_str(),
        ])?;
    }

    let body = writer.into_inner().map_err(|e| e.into_error())?;
    let body = String::from_utf8(body)?;

    content.push('\n');
    content.push_str(body.strip_suffix('\n').unwrap_or(&body));
    Ok(content)
}
