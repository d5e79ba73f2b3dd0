#![allow(dead_code)]
use async_trait::async_trait;
use dcvcheck::core::{CheckedItem, DiagnosticSink, Output, Status};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// A mock Output that keeps every result it receives.
#[derive(Clone, Debug, Default)]
pub struct CollectingOutput {
    pub results: Arc<Mutex<Vec<CheckedItem>>>,
    pub flushes: Arc<AtomicUsize>,
}

impl CollectingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    /// Status per domain. Panics if a domain was reported twice.
    pub fn statuses(&self) -> HashMap<String, Status> {
        let mut statuses = HashMap::new();
        for result in self.results.lock().unwrap().iter() {
            let previous = statuses.insert(result.item.domain.clone(), result.status());
            assert!(
                previous.is_none(),
                "domain '{}' was reported more than once",
                result.item.domain
            );
        }
        statuses
    }

    pub fn result_for(&self, domain: &str) -> Option<CheckedItem> {
        self.results
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.item.domain == domain)
            .cloned()
    }
}

#[async_trait]
impl Output for CollectingOutput {
    fn name(&self) -> &str {
        "collecting_mock"
    }

    async fn write_result(&self, result: &CheckedItem) -> anyhow::Result<()> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A mock Output whose writes always fail.
#[derive(Clone, Debug, Default)]
pub struct FailingOutput {
    pub attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl Output for FailingOutput {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn write_result(&self, _result: &CheckedItem) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("simulated output failure")
    }

    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Collects diagnostics instead of printing them.
#[derive(Clone, Debug, Default)]
pub struct CollectingDiagnostics {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingDiagnostics {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
