//! Core domain types and service traits for dcvcheck
//!
//! This module defines the work item that flows through the validation
//! pipeline and the trait contracts the pipeline stages talk through.

use crate::dns::{CnameResponse, DnsError};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hickory_resolver::proto::rr::Name;
use std::fmt;

/// Order identifier used when an input record does not carry one.
pub const DEFAULT_ORDER_ID: &str = "na";

/// A domain-control check waiting to be performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// The domain whose control is being asserted
    pub domain: String,
    /// First magic token, prefixed to the domain to form the lookup name
    pub md5: String,
    /// Second magic token, expected as the leftmost label of the CNAME target
    pub sha1: String,
    /// The order this check belongs to
    pub order_id: String,
}

impl WorkItem {
    pub fn new(domain: &str, md5: &str, sha1: &str, order_id: Option<&str>) -> Self {
        Self {
            domain: domain.to_string(),
            md5: md5.to_string(),
            sha1: sha1.to_string(),
            order_id: order_id.unwrap_or(DEFAULT_ORDER_ID).to_string(),
        }
    }

    /// Consumes the pending item and attaches the outcome of its check.
    pub fn into_checked(
        self,
        checked_at: DateTime<Utc>,
        outcome: Result<bool, DnsError>,
    ) -> CheckedItem {
        let (valid, error) = match outcome {
            Ok(valid) => (valid, None),
            Err(e) => (false, Some(e)),
        };
        CheckedItem {
            item: self,
            valid,
            error,
            checked_at,
        }
    }
}

/// A work item whose check has been performed.
///
/// Only [`WorkItem::into_checked`] builds one, so every field below is written
/// exactly once, by the worker that owned the pending item.
#[derive(Debug, Clone)]
pub struct CheckedItem {
    pub item: WorkItem,
    /// True when the published record matched the expected target
    pub valid: bool,
    /// Set when the DNS exchange failed or returned an unexpected shape
    pub error: Option<DnsError>,
    /// When the check was started
    pub checked_at: DateTime<Utc>,
}

impl CheckedItem {
    pub fn status(&self) -> Status {
        match (&self.error, self.valid) {
            (Some(_), _) => Status::Error,
            (None, true) => Status::Ok,
            (None, false) => Status::Bad,
        }
    }
}

/// The verdict reported for a checked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The record matched.
    Ok,
    /// The lookup succeeded but the record did not match.
    Bad,
    /// The lookup itself failed; the outcome is unknown.
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Bad => "BAD",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Issues CNAME queries against a single configured resolver
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Queries the CNAME record set for `name`
    ///
    /// # Returns
    /// * `Ok(CnameResponse)` whenever a response was received, whatever its
    ///   response code
    /// * `Err` for transport failures, timeouts and undecodable responses
    async fn query_cname(&self, name: &Name) -> Result<CnameResponse, DnsError>;
}

/// Receives checked items from the collector
#[async_trait]
pub trait Output: Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Writes one result. Called once per checked item, as soon as it is ready.
    async fn write_result(&self, result: &CheckedItem) -> Result<()>;

    /// Flushes anything still buffered. Called once after the last result.
    async fn flush(&self) -> Result<()>;
}

/// Receives diagnostics about input that could not be turned into work.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Writes diagnostics to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDiagnostics;

impl DiagnosticSink for StderrDiagnostics {
    fn report(&self, message: &str) {
        use std::io::Write;
        let mut stderr = std::io::stderr().lock();
        // Nothing sensible can be done if stderr itself is gone.
        let _ = writeln!(stderr, "{}", message);
    }
}
