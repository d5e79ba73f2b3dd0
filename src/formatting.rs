// src/formatting.rs

use crate::config::OutputFormat;
use crate::core::CheckedItem;
use serde::Serialize;

/// A trait for rendering one checked item as one output line.
pub trait ResultFormatter: Send + Sync {
    /// Returns the line without its terminating newline.
    fn format_line(&self, result: &CheckedItem) -> String;
}

/// `domain,status,unix_seconds,order_id`
pub struct PlainTextFormatter;

impl ResultFormatter for PlainTextFormatter {
    fn format_line(&self, result: &CheckedItem) -> String {
        format!(
            "{},{},{},{}",
            result.item.domain,
            result.status(),
            result.checked_at.timestamp(),
            result.item.order_id
        )
    }
}

/// One JSON object per line, carrying the error text as well.
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonLine<'a> {
    domain: &'a str,
    status: &'static str,
    timestamp: i64,
    checked_at: String,
    order_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ResultFormatter for JsonFormatter {
    fn format_line(&self, result: &CheckedItem) -> String {
        let line = JsonLine {
            domain: &result.item.domain,
            status: result.status().as_str(),
            timestamp: result.checked_at.timestamp(),
            checked_at: result.checked_at.to_rfc3339(),
            order_id: &result.item.order_id,
            error: result.error.as_ref().map(ToString::to_string),
        };
        // Only strings and integers go in, so serialization cannot fail.
        serde_json::to_string(&line).unwrap_or_default()
    }
}

pub fn formatter_for(format: OutputFormat) -> Box<dyn ResultFormatter> {
    match format {
        OutputFormat::PlainText => Box::new(PlainTextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorkItem;
    use crate::dns::DnsError;
    use chrono::{TimeZone, Utc};

    fn checked(order_id: Option<&str>, outcome: Result<bool, DnsError>) -> CheckedItem {
        let at = Utc.with_ymd_and_hms(2014, 6, 3, 12, 0, 0).unwrap();
        WorkItem::new("example.com", "aaa111", "bbb222", order_id).into_checked(at, outcome)
    }

    #[test]
    fn plain_text_line() {
        let line = PlainTextFormatter.format_line(&checked(None, Ok(true)));
        assert_eq!(line, "example.com,OK,1401796800,na");

        let line = PlainTextFormatter.format_line(&checked(Some("1234"), Ok(false)));
        assert_eq!(line, "example.com,BAD,1401796800,1234");
    }

    #[test]
    fn plain_text_errors_do_not_leak_the_message() {
        let line = PlainTextFormatter.format_line(&checked(None, Err(DnsError::Timeout(2000))));
        assert_eq!(line, "example.com,ERROR,1401796800,na");
    }

    #[test]
    fn json_line_includes_error_text() {
        let line = JsonFormatter.format_line(&checked(
            Some("77"),
            Err(DnsError::UnexpectedResponse {
                rcode: "NXDOMAIN".to_string(),
                answers: 0,
            }),
        ));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["domain"], "example.com");
        assert_eq!(value["status"], "ERROR");
        assert_eq!(value["timestamp"], 1401796800);
        assert_eq!(value["checked_at"], "2014-06-03T12:00:00+00:00");
        assert_eq!(value["order_id"], "77");
        assert_eq!(value["error"], "DNS Rcode: NXDOMAIN, Answers: 0");
    }

    #[test]
    fn json_line_omits_error_when_absent() {
        let line = JsonFormatter.format_line(&checked(None, Ok(true)));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["status"], "OK");
        assert!(value.get("error").is_none());
    }
}
