/// dcvcheck - batch checker for DNS-based domain-control validation
///
/// Reads `domain,token_a,token_b[,order_id]` records, looks up the CNAME of
/// `token_a.domain` on a configured resolver with a fixed pool of workers,
/// and reports whether each one points at `token_b.comodoca.com`.
pub mod cli;
pub mod config;
pub mod core;
pub mod dns;
pub mod formatting;
pub mod outputs;
pub mod pool;
pub mod producer;
pub mod task_manager;
pub mod validation;
pub mod worker;

// Re-export core types for convenience
pub use core::*;
pub use pool::{RunSummary, ValidationPool, ValidationPoolBuilder};
