use crate::dns::{CnameResponse, DnsError, DnsResolver};
use async_trait::async_trait;
use hickory_resolver::proto::{
    op::ResponseCode,
    rr::{rdata::CNAME, Name, RData, Record},
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fake DNS resolver for testing
///
/// Responses are keyed by the lookup name without its trailing dot, so
/// `aaa111.example.com` matches a query for `aaa111.example.com.`.
#[derive(Clone, Default)]
pub struct FakeDnsResolver {
    responses: Arc<Mutex<HashMap<String, Result<CnameResponse, DnsError>>>>,
    call_count: Arc<Mutex<HashMap<String, u32>>>,
    delay: Option<Duration>,
}

impl FakeDnsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer, to keep several queries in flight at once.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configures the response returned for a lookup name
    pub fn add_response(&self, name: &str, response: Result<CnameResponse, DnsError>) {
        self.responses
            .lock()
            .unwrap()
            .insert(normalize(name), response);
    }

    /// Answers `name` with a single CNAME pointing at `target`
    pub fn add_cname(&self, name: &str, target: &str) {
        let record = cname_record(name, target);
        self.add_response(name, Ok(CnameResponse::new(ResponseCode::NoError, vec![record])));
    }

    /// Answers `name` with the given response code and no records
    pub fn add_rcode(&self, name: &str, code: ResponseCode) {
        self.add_response(name, Ok(CnameResponse::new(code, vec![])));
    }

    /// Fails the exchange for `name`
    pub fn add_error(&self, name: &str, error: DnsError) {
        self.add_response(name, Err(error));
    }

    /// Get the number of times a name was queried
    pub fn get_call_count(&self, name: &str) -> u32 {
        let call_count = self.call_count.lock().unwrap();
        call_count.get(&normalize(name)).copied().unwrap_or(0)
    }

    /// Total number of queries across all names
    pub fn total_calls(&self) -> u32 {
        self.call_count.lock().unwrap().values().sum()
    }
}

/// Builds a CNAME record from `name` to `target`.
pub fn cname_record(name: &str, target: &str) -> Record {
    let owner = Name::from_str(name).unwrap();
    let target = Name::from_str(target).unwrap();
    Record::from_rdata(owner, 300, RData::CNAME(CNAME(target)))
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

#[async_trait]
impl DnsResolver for FakeDnsResolver {
    async fn query_cname(&self, name: &Name) -> Result<CnameResponse, DnsError> {
        let key = normalize(&name.to_ascii());
        {
            let mut call_count = self.call_count.lock().unwrap();
            *call_count.entry(key.clone()).or_insert(0) += 1;
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let responses = self.responses.lock().unwrap();
        responses.get(&key).cloned().unwrap_or_else(|| {
            Ok(CnameResponse::new(ResponseCode::NXDomain, vec![]))
        })
    }
}
