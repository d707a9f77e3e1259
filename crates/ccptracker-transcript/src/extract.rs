use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Longest response (in characters) kept before truncation.
pub const MAX_RESPONSE_CHARS: usize = 10_000;

/// Appended to a response cut at [`MAX_RESPONSE_CHARS`].
pub const TRUNCATION_MARKER: &str = "...(truncated)";

const EMPTY_SUMMARY_JSON: &str = r#"{"response": "", "tools_used": "", "tools_count": 0}"#;

/// What the Stop hook records about the last assistant turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSummary {
    /// Text of the last assistant message that had any, segments joined by a space.
    pub response: String,
    /// Distinct tool names across the whole transcript, sorted, comma-joined.
    pub tools_used: String,
    pub tools_count: usize,
}

impl TranscriptSummary {
    /// Render as one spaced JSON line. Non-ASCII characters are written verbatim.
    pub fn to_json_line(&self) -> String {
        crate::json::to_json_line(self).unwrap_or_else(|_| EMPTY_SUMMARY_JSON.to_string())
    }
}

/// Summarize a Claude Code transcript JSONL file.
///
/// Never fails: a missing path, an unreadable file, or a read error part way
/// through all produce [`TranscriptSummary::default`].
///
/// Expected format per line:
/// ```json
/// {"type":"assistant","message":{"role":"assistant","content":[{"type":"text","text":"..."},{"type":"tool_use","name":"Bash"}]}}
/// ```
pub fn extract_summary(transcript_path: Option<&Path>) -> TranscriptSummary {
    let Some(path) = transcript_path.filter(|p| !p.as_os_str().is_empty()) else {
        return TranscriptSummary::default();
    };

    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "transcript not readable");
            return TranscriptSummary::default();
        }
    };

    summarize(BufReader::new(file)).unwrap_or_else(|e| {
        tracing::debug!(path = %path.display(), error = %e, "transcript read failed");
        TranscriptSummary::default()
    })
}

/// Scan transcript lines from any reader.
///
/// Lines that are not valid JSON are skipped. Only I/O errors (including
/// invalid UTF-8) are returned.
pub fn summarize<R: BufRead>(reader: R) -> std::io::Result<TranscriptSummary> {
    let mut tools: BTreeSet<String> = BTreeSet::new();
    let mut response_texts: Vec<String> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;

        let record: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => {
                tracing::trace!(line = idx + 1, "skipping non-JSON transcript line");
                continue;
            }
        };

        let Some(message) = record.get("message") else {
            continue;
        };
        if message.get("role").and_then(Value::as_str) != Some("assistant") {
            continue;
        }

        // A tool-only message keeps the previous response.
        let texts = collect_assistant_message(message, &mut tools);
        if !texts.is_empty() {
            response_texts = texts;
        }
    }

    let response = truncate_response(response_texts.join(" "));
    let tools_count = tools.len();
    let tools_used = tools.into_iter().collect::<Vec<_>>().join(",");

    Ok(TranscriptSummary {
        response,
        tools_used,
        tools_count,
    })
}

/// Collect trimmed non-empty text segments of one assistant message and record
/// its tool names into `tools`.
///
/// A `text` or `name` field holding a non-string value abandons the message:
/// tools seen before it stay recorded, its text is discarded.
fn collect_assistant_message(message: &Value, tools: &mut BTreeSet<String>) -> Vec<String> {
    let Some(items) = message.get("content").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut texts = Vec::new();
    for item in items {
        match item.get("type").and_then(Value::as_str) {
            Some("text") => match item.get("text") {
                None => {}
                Some(Value::String(text)) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        texts.push(text.to_string());
                    }
                }
                Some(_) => return Vec::new(),
            },
            Some("tool_use") => match item.get("name") {
                None => {
                    tools.insert(String::new());
                }
                Some(Value::String(name)) => {
                    tools.insert(name.clone());
                }
                Some(_) => return Vec::new(),
            },
            _ => {}
        }
    }
    texts
}

fn truncate_response(response: String) -> String {
    match response.char_indices().nth(MAX_RESPONSE_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &response[..cut]),
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_transcript(dir: &Path, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.join("transcript.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        path
    }

    fn summarize_lines(lines: &[&str]) -> TranscriptSummary {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_transcript(tmp.path(), lines);
        extract_summary(Some(&path))
    }

    #[test]
    fn no_assistant_messages_yields_empty_summary() {
        let summary = summarize_lines(&[
            r#"{"type":"user","message":{"role":"user","content":"hello"}}"#,
            r#"{"type":"user","message":{"role":"user","content":[{"type":"text","text":"again"}]}}"#,
        ]);
        assert_eq!(summary, TranscriptSummary::default());
        assert_eq!(
            summary.to_json_line(),
            r#"{"response": "", "tools_used": "", "tools_count": 0}"#
        );
    }

    #[test]
    fn tool_only_message_keeps_previous_response() {
        let summary = summarize_lines(&[
            r#"{"message":{"role":"assistant","content":[{"type":"text","text":"a b"}]}}"#,
            r#"{"message":{"role":"assistant","content":[{"type":"tool_use","id":"tu1","name":"X"}]}}"#,
        ]);
        assert_eq!(summary.response, "a b");
        assert_eq!(summary.tools_used, "X");
        assert_eq!(summary.tools_count, 1);
    }

    #[test]
    fn last_assistant_text_wins_and_segments_join_with_space() {
        let summary = summarize_lines(&[
            r#"{"message":{"role":"assistant","content":[{"type":"text","text":"first"}]}}"#,
            r#"{"message":{"role":"user","content":"more"}}"#,
            r#"{"message":{"role":"assistant","content":[{"type":"text","text":"  second  "},{"type":"tool_use","name":"Read"},{"type":"text","text":"third\n"}]}}"#,
        ]);
        assert_eq!(summary.response, "second third");
    }

    #[test]
    fn whitespace_only_text_does_not_replace_response() {
        let summary = summarize_lines(&[
            r#"{"message":{"role":"assistant","content":[{"type":"text","text":"kept"}]}}"#,
            r#"{"message":{"role":"assistant","content":[{"type":"text","text":"   \n\t"}]}}"#,
        ]);
        assert_eq!(summary.response, "kept");
    }

    #[test]
    fn tools_are_deduplicated_sorted_and_case_sensitive() {
        let summary = summarize_lines(&[
            r#"{"message":{"role":"assistant","content":[{"type":"tool_use","name":"Read"},{"type":"tool_use","name":"Bash"}]}}"#,
            r#"{"message":{"role":"assistant","content":[{"type":"tool_use","name":"Read"},{"type":"tool_use","name":"bash"}]}}"#,
        ]);
        assert_eq!(summary.tools_used, "Bash,Read,bash");
        assert_eq!(summary.tools_count, 3);
    }

    #[test]
    fn nameless_tool_counts_as_empty_name() {
        let summary = summarize_lines(&[
            r#"{"message":{"role":"assistant","content":[{"type":"tool_use"},{"type":"tool_use","name":"Edit"}]}}"#,
        ]);
        assert_eq!(summary.tools_used, ",Edit");
        assert_eq!(summary.tools_count, 2);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let summary = summarize_lines(&[
            r#"{"message":{"role":"assistant","content":[{"type":"text","text":"before"}]}}"#,
            "not json at all",
            "",
            r#"{"message":{"role":"assistant","content":[{"type":"text","text":"after"}]"#,
            r#"[1,2,3]"#,
        ]);
        assert_eq!(summary.response, "before");
    }

    #[test]
    fn non_string_text_abandons_message_but_keeps_tools() {
        let summary = summarize_lines(&[
            r#"{"message":{"role":"assistant","content":[{"type":"text","text":"good"}]}}"#,
            r#"{"message":{"role":"assistant","content":[{"type":"tool_use","name":"Grep"},{"type":"text","text":"lost"},{"type":"text","text":null}]}}"#,
        ]);
        assert_eq!(summary.response, "good");
        assert_eq!(summary.tools_used, "Grep");
    }

    #[test]
    fn long_response_is_truncated_with_marker() {
        let long_text = "a".repeat(10_050);
        let line = format!(
            r#"{{"message":{{"role":"assistant","content":[{{"type":"text","text":"{long_text}"}}]}}}}"#
        );
        let summary = summarize_lines(&[&line]);
        assert_eq!(summary.response.chars().count(), 10_000 + 14);
        assert!(summary.response.ends_with(TRUNCATION_MARKER));
        assert!(summary.response.starts_with(&"a".repeat(10_000)));
    }

    #[test]
    fn response_at_limit_is_not_truncated() {
        let text = "é".repeat(MAX_RESPONSE_CHARS);
        assert_eq!(truncate_response(text.clone()), text);
    }

    #[test]
    fn json_line_keeps_non_ascii_unescaped() {
        let summary = summarize_lines(&[
            r#"{"message":{"role":"assistant","content":[{"type":"text","text":"안녕하세요 ✅"}]}}"#,
        ]);
        let line = summary.to_json_line();
        assert!(line.contains("안녕하세요 ✅"));
        assert!(!line.contains("\\u"));
        assert!(line.ends_with(r#""tools_used": "", "tools_count": 0}"#));
    }

    #[test]
    fn missing_path_or_file_yields_empty_summary() {
        assert_eq!(extract_summary(None), TranscriptSummary::default());
        assert_eq!(
            extract_summary(Some(Path::new(""))),
            TranscriptSummary::default()
        );
        assert_eq!(
            extract_summary(Some(Path::new("/nonexistent/transcript.jsonl"))),
            TranscriptSummary::default()
        );
    }

    #[test]
    fn invalid_utf8_yields_empty_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.jsonl");
        let mut bytes =
            br#"{"message":{"role":"assistant","content":[{"type":"text","text":"x"}]}}"#.to_vec();
        bytes.extend_from_slice(b"\n\xff\xfe\n");
        std::fs::write(&path, bytes).unwrap();
        assert_eq!(extract_summary(Some(&path)), TranscriptSummary::default());
    }

    #[test]
    fn summarize_reads_from_memory() {
        let input = b"{\"message\":{\"role\":\"assistant\",\"content\":[{\"type\":\"text\",\"text\":\"hi\"}]}}\r\n";
        let summary = summarize(&input[..]).unwrap();
        assert_eq!(summary.response, "hi");
    }
}
