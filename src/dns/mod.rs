pub mod address;
pub mod client;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use hickory_resolver::proto::{op::ResponseCode, rr::Record};
use thiserror::Error;

pub use address::{AddressError, ResolverAddress, DEFAULT_DNS_PORT};
pub use client::UdpDnsClient;
pub use crate::core::DnsResolver;

/// The parts of a DNS response that the validation policy inspects.
#[derive(Debug, Clone, PartialEq)]
pub struct CnameResponse {
    pub response_code: ResponseCode,
    pub answers: Vec<Record>,
}

impl CnameResponse {
    pub fn new(response_code: ResponseCode, answers: Vec<Record>) -> Self {
        Self {
            response_code,
            answers,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DnsError {
    #[error("invalid lookup name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("DNS exchange failed: {0}")]
    Transport(String),

    #[error("DNS exchange timed out after {0}ms")]
    Timeout(u64),

    #[error("malformed DNS response: {0}")]
    Malformed(String),

    #[error("DNS Rcode: {rcode}, Answers: {answers}")]
    UnexpectedResponse { rcode: String, answers: usize },
}

/// Returns the conventional upper-case mnemonic for a response code.
pub fn rcode_mnemonic(code: ResponseCode) -> String {
    match code {
        ResponseCode::NoError => "NOERROR".to_string(),
        ResponseCode::FormErr => "FORMERR".to_string(),
        ResponseCode::ServFail => "SERVFAIL".to_string(),
        ResponseCode::NXDomain => "NXDOMAIN".to_string(),
        ResponseCode::NotImp => "NOTIMP".to_string(),
        ResponseCode::Refused => "REFUSED".to_string(),
        ResponseCode::YXDomain => "YXDOMAIN".to_string(),
        ResponseCode::YXRRSet => "YXRRSET".to_string(),
        ResponseCode::NXRRSet => "NXRRSET".to_string(),
        ResponseCode::NotAuth => "NOTAUTH".to_string(),
        ResponseCode::NotZone => "NOTZONE".to_string(),
        other => format!("RCODE{}", u16::from(other)),
    }
}
