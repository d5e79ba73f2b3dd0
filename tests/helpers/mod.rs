#![allow(dead_code)]

pub mod dns_server;
pub mod mock_dns;
pub mod mock_output;
pub mod pool;
