//! The validation pool: one producer, N workers and the collector loop.

use crate::{
    config::Config,
    core::{CheckedItem, DiagnosticSink, DnsResolver, Output, Status, StderrDiagnostics},
    dns::UdpDnsClient,
    outputs::StdoutOutput,
    producer::{run_producer, ProducerReport},
    task_manager::TaskManager,
    validation::Checker,
    worker::run_worker,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tracing::{debug, error, info, instrument, warn};

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines turned into work items
    pub accepted: usize,
    /// Lines rejected as malformed
    pub rejected: usize,
    pub ok: usize,
    pub bad: usize,
    pub error: usize,
    /// Tasks that panicked instead of finishing
    pub panicked_tasks: usize,
}

impl RunSummary {
    /// Number of results written.
    pub fn checked(&self) -> usize {
        self.ok + self.bad + self.error
    }

    fn record(&mut self, status: Status) {
        match status {
            Status::Ok => self.ok += 1,
            Status::Bad => self.bad += 1,
            Status::Error => self.error += 1,
        }
    }
}

/// A configured pool, ready to check batches of records.
pub struct ValidationPool {
    config: Config,
    resolver: Arc<dyn DnsResolver>,
    output: Arc<dyn Output>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ValidationPool {
    /// Creates a new `ValidationPoolBuilder` to construct a `ValidationPool`.
    pub fn builder(config: Config) -> ValidationPoolBuilder {
        ValidationPoolBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks every record `reader` yields and returns once the last worker
    /// has finished.
    ///
    /// Results are written in completion order, not input order.
    #[instrument(skip_all, fields(workers = self.config.workers))]
    pub async fn run<R>(&self, reader: R) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let workers = self.config.workers;
        let (work_tx, work_rx) = async_channel::bounded(self.config.performance.queue_capacity);
        let (results_tx, results_rx) = async_channel::unbounded::<CheckedItem>();
        let (done_tx, done_rx) = async_channel::unbounded();

        let checker = Arc::new(Checker::new(
            self.resolver.clone(),
            self.config.validation.cname_suffix.clone(),
        ));

        let task_manager = TaskManager::new();
        info!("Spawning {} worker tasks...", workers);
        for worker_id in 0..workers {
            task_manager.spawn(
                "DnsWorker",
                run_worker(
                    worker_id,
                    checker.clone(),
                    work_rx.clone(),
                    results_tx.clone(),
                    done_tx.clone(),
                ),
            );
        }
        // Workers now own every remaining handle, so the queues close with them.
        drop(work_rx);
        drop(results_tx);
        drop(done_tx);

        let producer = tokio::spawn(run_producer(reader, work_tx, self.diagnostics.clone()));

        let mut summary = RunSummary::default();
        let mut alive = workers;
        while alive > 0 {
            tokio::select! {
                Ok(result) = results_rx.recv() => {
                    self.emit(&result, &mut summary).await;
                }
                Ok(worker_id) = done_rx.recv() => {
                    alive -= 1;
                    debug!(worker_id, alive, "Worker signalled completion");
                }
                else => {
                    // Only reachable if a completion signal was lost.
                    warn!(alive, "All queues closed before every worker signalled completion");
                    break;
                }
            }
        }

        // A worker's last result can be picked up after its completion signal
        // when both were waiting at once. Every worker is done, so this drain
        // sees the final contents of the queue.
        while let Ok(result) = results_rx.try_recv() {
            self.emit(&result, &mut summary).await;
        }

        let report = match producer.await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Producer task panicked");
                summary.panicked_tasks += 1;
                ProducerReport::default()
            }
        };
        summary.accepted = report.accepted;
        summary.rejected = report.rejected;
        summary.panicked_tasks += task_manager.join_all().await;

        if let Err(e) = self.output.flush().await {
            error!(output = self.output.name(), error = %e, "Failed to flush output");
        }

        if summary.checked() != summary.accepted {
            warn!(
                accepted = summary.accepted,
                checked = summary.checked(),
                "Number of results does not match number of accepted records"
            );
        }
        info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            ok = summary.ok,
            bad = summary.bad,
            error = summary.error,
            "Validation run finished"
        );
        Ok(summary)
    }

    async fn emit(&self, result: &CheckedItem, summary: &mut RunSummary) {
        summary.record(result.status());
        if let Some(e) = &result.error {
            debug!(domain = %result.item.domain, error = %e, "Check ended in error");
        }
        if let Err(e) = self.output.write_result(result).await {
            error!(
                output = self.output.name(),
                domain = %result.item.domain,
                error = %e,
                "Failed to write result"
            );
        }
    }
}

/// Builder for the validation pool.
///
/// Everything not overridden is built from the configuration: a UDP client
/// for the configured resolver, standard output and standard error.
pub struct ValidationPoolBuilder {
    config: Config,
    dns_resolver_override: Option<Arc<dyn DnsResolver>>,
    output_override: Option<Arc<dyn Output>>,
    diagnostics_override: Option<Arc<dyn DiagnosticSink>>,
}

impl ValidationPoolBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dns_resolver_override: None,
            output_override: None,
            diagnostics_override: None,
        }
    }

    /// Overrides the DNS resolver for testing.
    pub fn dns_resolver_override(mut self, resolver: Arc<dyn DnsResolver>) -> Self {
        self.dns_resolver_override = Some(resolver);
        self
    }

    /// Overrides the result sink.
    pub fn output_override(mut self, output: Arc<dyn Output>) -> Self {
        self.output_override = Some(output);
        self
    }

    /// Overrides where malformed-input diagnostics go.
    pub fn diagnostics_override(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics_override = Some(diagnostics);
        self
    }

    pub async fn build(self) -> Result<ValidationPool> {
        let config = self.config;
        config.validate()?;

        let resolver = match self.dns_resolver_override {
            Some(resolver) => resolver,
            None => {
                let client = UdpDnsClient::from_config(&config.dns).await?;
                info!(server = %client.server(), "Using DNS resolver");
                Arc::new(client) as Arc<dyn DnsResolver>
            }
        };

        let output = match self.output_override {
            Some(output) => output,
            None => {
                debug!(format = %config.output.format, "Initializing StdoutOutput");
                Arc::new(StdoutOutput::stdout(config.output.format)) as Arc<dyn Output>
            }
        };

        let diagnostics = self
            .diagnostics_override
            .unwrap_or_else(|| Arc::new(StderrDiagnostics) as Arc<dyn DiagnosticSink>);

        Ok(ValidationPool {
            config,
            resolver,
            output,
            diagnostics,
        })
    }
}
