//! Result sinks.
//!
//! Each result is written and flushed as soon as the collector hands it over,
//! so a long batch streams its output instead of buffering it.

use crate::config::OutputFormat;
use crate::core::{CheckedItem, Output};
use crate::formatting::{formatter_for, ResultFormatter};
use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

/// Writes formatted lines to any async writer.
pub struct WriterOutput<W> {
    name: &'static str,
    writer: Mutex<W>,
    formatter: Box<dyn ResultFormatter>,
}

/// Writes formatted lines to standard output.
pub type StdoutOutput = WriterOutput<Stdout>;

impl StdoutOutput {
    pub fn stdout(format: OutputFormat) -> Self {
        WriterOutput::new("stdout", tokio::io::stdout(), format)
    }
}

impl<W> WriterOutput<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(name: &'static str, writer: W, format: OutputFormat) -> Self {
        Self {
            name,
            writer: Mutex::new(writer),
            formatter: formatter_for(format),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> Output for WriterOutput<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        self.name
    }

    async fn write_result(&self, result: &CheckedItem) -> Result<()> {
        let mut line = self.formatter.format_line(result);
        line.push('\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}
