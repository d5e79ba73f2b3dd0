#![allow(dead_code)]
//! A resolver that records how many queries were in flight at once.

use async_trait::async_trait;
use dcvcheck::{
    core::DnsResolver,
    dns::{test_utils::FakeDnsResolver, CnameResponse, DnsError},
};
use hickory_resolver::proto::rr::Name;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

#[derive(Clone)]
pub struct ConcurrencyTrackingResolver {
    inner: FakeDnsResolver,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl ConcurrencyTrackingResolver {
    pub fn new(inner: FakeDnsResolver, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsResolver for ConcurrencyTrackingResolver {
    async fn query_cname(&self, name: &Name) -> Result<CnameResponse, DnsError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let response = self.inner.query_cname(name).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
