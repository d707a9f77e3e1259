use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::turns::TurnRow;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unsupported export format {0:?}: use \"json\" or \"csv\"")]
    UnsupportedFormat(String),
    #[error("no conversations to export")]
    Empty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Column titles of a CSV export, one per [`crate::FIELDNAMES`] entry.
pub const EXPORT_HEADERS: [&str; 8] = [
    "ID",
    "Request",
    "Response",
    "Rating",
    "Rating Comment",
    "Request Time",
    "Response Time",
    "Rating Time",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    exported_at: String,
    total_conversations: usize,
    conversations: Vec<ExportedConversation<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedConversation<'a> {
    id: &'a str,
    request: &'a str,
    response: &'a str,
    rating: Option<i64>,
    rating_comment: Option<&'a str>,
    request_time: &'a str,
    response_time: &'a str,
    rating_time: &'a str,
}

impl<'a> From<&'a TurnRow> for ExportedConversation<'a> {
    fn from(row: &'a TurnRow) -> Self {
        Self {
            id: &row.id,
            request: &row.request,
            response: &row.response,
            rating: leading_int(&row.star),
            rating_comment: Some(row.star_desc.as_str()).filter(|c| !c.is_empty()),
            request_time: &row.request_dtm,
            response_time: &row.response_dtm,
            rating_time: &row.star_dtm,
        }
    }
}

/// Integer prefix of `s` after leading whitespace (`"4.5"` → 4, `"x"` → none).
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// `2024-01-15T10:30:00.123Z`
fn exported_at(now: OffsetDateTime) -> anyhow::Result<String> {
    Ok(now.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ))?)
}

fn encode_json(rows: &[TurnRow], now: OffsetDateTime) -> anyhow::Result<Vec<u8>> {
    let doc = ExportDocument {
        exported_at: exported_at(now)?,
        total_conversations: rows.len(),
        conversations: rows.iter().map(ExportedConversation::from).collect(),
    };
    Ok(serde_json::to_vec_pretty(&doc)?)
}

fn encode_csv(rows: &[TurnRow]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;
    for row in rows {
        writer.write_record([
            &row.id,
            &row.request,
            &row.response,
            &row.star,
            &row.star_desc,
            &row.request_dtm,
            &row.response_dtm,
            &row.star_dtm,
        ])?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Write `rows` to `output` in the chosen format. Refuses an empty log.
///
/// JSON wraps the turns in `{exportedAt, totalConversations, conversations}`
/// with camelCase keys, a numeric `rating` and a null `ratingComment` when
/// unset. CSV uses the titled [`EXPORT_HEADERS`].
pub fn export_rows(rows: &[TurnRow], format: ExportFormat, output: &Path) -> anyhow::Result<()> {
    if rows.is_empty() {
        return Err(ExportError::Empty.into());
    }
    let data = match format {
        ExportFormat::Csv => encode_csv(rows)?,
        ExportFormat::Json => encode_json(rows, OffsetDateTime::now_utc())?,
    };
    crate::write_atomic(output, &data)?;
    tracing::debug!(path = %output.display(), rows = rows.len(), %format, "exported turns");
    Ok(())
}
