//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. Flags that were given override the configuration file and
//! environment variables; flags that were not given leave them untouched.

use clap::Parser;
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Batch checker for DNS CNAME domain-control validation records.
///
/// Reads `domain,token_a,token_b[,order_id]` records, one per line, and prints
/// `domain,status,timestamp,order_id` for each as soon as its check completes.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read records from FILE instead of standard input.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Number of workers to run.
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Address host or host:port of DNS resolver, or `system`.
    #[arg(short, long, value_name = "ADDR")]
    pub resolver: Option<String>,

    /// Timeout for each DNS query in milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Print results as JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Log level filter (e.g. `warn`, `debug`, `dcvcheck=trace`).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

/// Inserts `value` at a dotted `path`, creating intermediate tables.
fn insert_nested(dict: &mut Dict, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            dict.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = dict
                .entry(head.to_string())
                .or_insert_with(|| Value::Dict(Tag::Default, Dict::new()));
            if let Value::Dict(_, inner) = entry {
                insert_nested(inner, rest, value);
            }
        }
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(workers) = self.workers {
            insert_nested(&mut dict, "workers", Value::from(workers as u64));
        }
        if let Some(input) = &self.input {
            insert_nested(
                &mut dict,
                "input",
                Value::from(input.to_string_lossy().into_owned()),
            );
        }
        if let Some(resolver) = &self.resolver {
            insert_nested(&mut dict, "dns.resolver", Value::from(resolver.clone()));
        }
        if let Some(timeout) = self.timeout_ms {
            insert_nested(&mut dict, "dns.timeout_ms", Value::from(timeout));
        }
        // Only an explicit --json overrides the configured format.
        if self.json {
            insert_nested(&mut dict, "output.format", Value::from("Json"));
        }
        if let Some(level) = &self.log_level {
            insert_nested(&mut dict, "log_level", Value::from(level.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
