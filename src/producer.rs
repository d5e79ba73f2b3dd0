//! Turns input lines into work items.

use crate::core::{DiagnosticSink, WorkItem};
use async_channel::Sender;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Field separator for input records.
const FIELD_DELIMITER: char = ',';

/// What a single input line turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Empty or whitespace-only; skipped silently.
    Blank,
    Item(WorkItem),
    /// Fewer than three fields.
    Malformed,
}

/// Parses `domain,md5,sha1[,order_id]`. Fields past the fourth are ignored.
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    if line.is_empty() {
        return ParsedLine::Blank;
    }

    let fields: Vec<&str> = line.split(FIELD_DELIMITER).map(str::trim).collect();
    match fields.as_slice() {
        [domain, md5, sha1] => ParsedLine::Item(WorkItem::new(domain, md5, sha1, None)),
        [domain, md5, sha1, order_id, ..] => {
            ParsedLine::Item(WorkItem::new(domain, md5, sha1, Some(*order_id)))
        }
        _ => ParsedLine::Malformed,
    }
}

/// Counts of what the producer did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// Reads records until the source is exhausted, sending one item per
/// well-formed line.
///
/// Lines are split on `\n` and decoded lossily, so invalid UTF-8 affects only
/// the record it appears in. The input queue is closed before this returns,
/// whether the source ended or failed. That is the only signal workers get
/// that no more work is coming.
pub async fn run_producer<R>(
    reader: R,
    work_tx: Sender<WorkItem>,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> ProducerReport
where
    R: AsyncBufRead + Unpin,
{
    let mut report = ProducerReport::default();
    let mut reader = reader;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                diagnostics.report(&format!("Error reading input: {}", e));
                break;
            }
        }
        // Bytes that are not UTF-8 stay part of their own record.
        let decoded = String::from_utf8_lossy(&buf);
        let line = decoded.trim_end_matches(['\r', '\n']);

        match parse_line(line) {
            ParsedLine::Blank => continue,
            ParsedLine::Malformed => {
                report.rejected += 1;
                debug!(line = %line, "Rejected malformed input line");
                diagnostics.report(&format!("Bad input line {}", line));
            }
            ParsedLine::Item(item) => {
                if work_tx.send(item).await.is_err() {
                    // Every worker is gone, so nothing else would be checked.
                    warn!("Work queue closed before input was exhausted");
                    break;
                }
                report.accepted += 1;
            }
        }
    }

    work_tx.close();
    info!(
        accepted = report.accepted,
        rejected = report.rejected,
        "Input exhausted, work queue closed"
    );
    report
}
