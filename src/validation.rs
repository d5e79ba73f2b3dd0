//! The domain-control check itself.
//!
//! A domain passes when `<md5>.<domain>.` has exactly one CNAME record and it
//! points at `<sha1>.<suffix>.`. Responses with any other response code, or
//! with zero or several answers, are errors rather than mismatches: they tell
//! us nothing about what the owner published.

use crate::{
    core::{CheckedItem, DnsResolver, WorkItem},
    dns::{rcode_mnemonic, CnameResponse, DnsError},
};
use chrono::Utc;
use hickory_resolver::proto::{
    op::ResponseCode,
    rr::{Name, RData},
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Domain under which the expected CNAME targets live.
pub const DEFAULT_CNAME_SUFFIX: &str = "comodoca.com";

/// Builds the fully-qualified name whose CNAME carries the proof.
///
/// Internationalized domains are IDNA-encoded, so `bücher.de` is queried as
/// `xn--bcher-kva.de`.
pub fn lookup_name(md5: &str, domain: &str) -> Result<Name, DnsError> {
    let raw = format!("{}.{}.", md5, domain.trim_end_matches('.'));
    Name::from_utf8(&raw).map_err(|e| DnsError::InvalidName {
        name: raw.clone(),
        reason: e.to_string(),
    })
}

/// The CNAME target a correctly-configured domain points at, with trailing dot.
pub fn expected_target(sha1: &str, suffix: &str) -> String {
    format!("{}.{}.", sha1, suffix.trim_matches('.'))
}

/// Applies the single-answer policy to a response.
pub fn classify(response: &CnameResponse, expected: &str) -> Result<bool, DnsError> {
    if response.response_code != ResponseCode::NoError || response.answers.len() != 1 {
        return Err(DnsError::UnexpectedResponse {
            rcode: rcode_mnemonic(response.response_code),
            answers: response.answers.len(),
        });
    }

    match response.answers[0].data() {
        RData::CNAME(cname) => Ok(same_name(&cname.0.to_ascii(), expected)),
        _ => Ok(false),
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Performs checks against one resolver. Shared by every worker in a run.
pub struct Checker {
    resolver: Arc<dyn DnsResolver>,
    cname_suffix: String,
}

impl Checker {
    pub fn new(resolver: Arc<dyn DnsResolver>, cname_suffix: impl Into<String>) -> Self {
        Self {
            resolver,
            cname_suffix: cname_suffix.into(),
        }
    }

    /// Checks one item. Never fails: problems end up on the returned item.
    #[instrument(skip_all, fields(domain = %item.domain))]
    pub async fn check(&self, item: WorkItem) -> CheckedItem {
        let checked_at = Utc::now();
        let outcome = self.evaluate(&item).await;
        match &outcome {
            Ok(valid) => debug!(valid, "Check completed"),
            Err(e) => debug!(error = %e, "Check failed"),
        }
        item.into_checked(checked_at, outcome)
    }

    async fn evaluate(&self, item: &WorkItem) -> Result<bool, DnsError> {
        let name = lookup_name(&item.md5, &item.domain)?;
        let response = self.resolver.query_cname(&name).await?;
        classify(&response, &expected_target(&item.sha1, &self.cname_suffix))
    }
}
