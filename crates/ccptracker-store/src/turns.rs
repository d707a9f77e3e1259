use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Column order of the backing CSV. Matches the field order of [`TurnRow`].
pub const FIELDNAMES: [&str; 8] = [
    "id",
    "request",
    "response",
    "star",
    "star_desc",
    "request_dtm",
    "response_dtm",
    "star_dtm",
];

/// One conversation turn. Every column is kept as text, exactly as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnRow {
    pub id: String,
    pub request: String,
    pub response: String,
    pub star: String,
    pub star_desc: String,
    pub request_dtm: String,
    pub response_dtm: String,
    pub star_dtm: String,
}

impl TurnRow {
    /// Build a row by header name. Unknown columns are ignored, missing ones
    /// stay empty.
    fn from_record(headers: &csv::StringRecord, record: &csv::StringRecord) -> Self {
        let mut row = Self::default();
        for (name, value) in headers.iter().zip(record.iter()) {
            let slot = match name {
                "id" => &mut row.id,
                "request" => &mut row.request,
                "response" => &mut row.response,
                "star" => &mut row.star,
                "star_desc" => &mut row.star_desc,
                "request_dtm" => &mut row.request_dtm,
                "response_dtm" => &mut row.response_dtm,
                "star_dtm" => &mut row.star_dtm,
                _ => continue,
            };
            *slot = value.to_string();
        }
        row
    }
}

/// `YYYY-MM-DD HH:MM:SS` → `YYYYMMDDHHMMSS`; empty string if it does not parse.
///
/// Fields after the year may omit their leading zero (`2024-1-5 9:3:0`).
pub fn format_row_id(timestamp: &str) -> String {
    match PrimitiveDateTime::parse(
        timestamp,
        format_description!(
            "[year]-[month padding:none]-[day padding:none] [hour padding:none]:[minute padding:none]:[second padding:none]"
        ),
    ) {
        Ok(dt) => format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ),
        Err(_) => String::new(),
    }
}

/// Current local wall-clock time as `YYYY-MM-DD HH:MM:SS`.
///
/// Falls back to UTC when the local offset cannot be determined.
pub fn now_dtm() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// The CSV turn log. Only the last row is ever modified; every mutation
/// rewrites the whole file.
#[derive(Debug, Clone)]
pub struct TurnLog {
    path: PathBuf,
}

impl TurnLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all rows. A missing file is an empty log.
    pub fn read_rows(&self) -> anyhow::Result<Vec<TurnRow>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("opening {}", self.path.display()));
            }
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = reader
            .headers()
            .with_context(|| format!("reading {}", self.path.display()))?
            .clone();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("reading {}", self.path.display()))?;
            rows.push(TurnRow::from_record(&headers, &record));
        }
        tracing::debug!(path = %self.path.display(), rows = rows.len(), "read turn log");
        Ok(rows)
    }

    /// Rewrite the whole file. An empty row list writes nothing.
    pub fn write_rows(&self, rows: &[TurnRow]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let data = encode_rows(rows)?;
        crate::write_atomic(&self.path, &data)
            .with_context(|| format!("writing {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), rows = rows.len(), "wrote turn log");
        Ok(())
    }

    /// Append a new turn for a submitted prompt.
    pub fn append(&self, timestamp: &str, prompt: &str) -> anyhow::Result<TurnRow> {
        let mut rows = self.read_rows()?;
        let row = TurnRow {
            id: format_row_id(timestamp),
            request: prompt.to_string(),
            request_dtm: timestamp.to_string(),
            ..TurnRow::default()
        };
        rows.push(row.clone());
        self.write_rows(&rows)?;
        Ok(row)
    }

    /// Record the assistant response on the last row. `None` if the log is empty.
    pub fn update_response(
        &self,
        response: &str,
        response_dtm: &str,
    ) -> anyhow::Result<Option<TurnRow>> {
        self.update_last(|row| {
            row.response = response.to_string();
            row.response_dtm = response_dtm.to_string();
        })
    }

    /// Record a satisfaction rating on the last row. `None` if the log is empty.
    pub fn update_satisfaction(
        &self,
        score: i64,
        comment: &str,
        star_dtm: &str,
    ) -> anyhow::Result<Option<TurnRow>> {
        self.update_last(|row| {
            row.star = score.to_string();
            row.star_desc = comment.to_string();
            row.star_dtm = star_dtm.to_string();
        })
    }

    pub fn latest(&self) -> anyhow::Result<Option<TurnRow>> {
        Ok(self.read_rows()?.pop())
    }

    fn update_last(&self, apply: impl FnOnce(&mut TurnRow)) -> anyhow::Result<Option<TurnRow>> {
        let mut rows = self.read_rows()?;
        let Some(last) = rows.last_mut() else {
            return Ok(None);
        };
        apply(last);
        let updated = last.clone();
        self.write_rows(&rows)?;
        Ok(Some(updated))
    }
}

/// Encode rows as CSV with a header line, quoting only where needed.
fn encode_rows(rows: &[TurnRow]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let data = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(data)
}
