mod extract;
mod json;

pub use extract::{
    extract_summary, summarize, TranscriptSummary, MAX_RESPONSE_CHARS, TRUNCATION_MARKER,
};
pub use json::to_json_line;
