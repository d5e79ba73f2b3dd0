#![allow(dead_code)]
//! Test helpers for running a whole validation pool.

use super::mock_output::{CollectingDiagnostics, CollectingOutput};
use anyhow::Result;
use dcvcheck::{config::Config, core::DnsResolver, RunSummary, ValidationPool};
use std::{io::Cursor, sync::Arc, time::Duration};
use tokio::time::timeout;

/// The outcome of one pool run, plus everything the pool wrote.
pub struct TestRun {
    pub summary: RunSummary,
    pub output: CollectingOutput,
    pub diagnostics: CollectingDiagnostics,
}

pub struct TestPoolBuilder {
    pub config: Config,
    resolver: Arc<dyn DnsResolver>,
}

impl TestPoolBuilder {
    pub fn new(resolver: Arc<dyn DnsResolver>) -> Self {
        let mut config = Config::default();
        // Never talk to a real resolver from tests.
        config.dns.resolver = "127.0.0.1:1".to_string();
        Self { config, resolver }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn with_config_modifier<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut Config),
    {
        modifier(&mut self.config);
        self
    }

    /// Runs the pool over `input`, failing the test if it does not finish
    /// within ten seconds.
    pub async fn run(self, input: &str) -> Result<TestRun> {
        let output = CollectingOutput::new();
        let diagnostics = CollectingDiagnostics::default();
        let pool = ValidationPool::builder(self.config)
            .dns_resolver_override(self.resolver)
            .output_override(Arc::new(output.clone()))
            .diagnostics_override(Arc::new(diagnostics.clone()))
            .build()
            .await?;

        let summary = timeout(
            Duration::from_secs(10),
            pool.run(Cursor::new(input.to_string())),
        )
        .await
        .map_err(|_| anyhow::anyhow!("pool did not terminate within the timeout"))??;

        Ok(TestRun {
            summary,
            output,
            diagnostics,
        })
    }
}
