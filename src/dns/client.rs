use crate::{
    config::DnsConfig,
    core::DnsResolver,
    dns::{rcode_mnemonic, CnameResponse, DnsError, ResolverAddress},
};
use anyhow::Result;
use async_trait::async_trait;
use hickory_resolver::proto::{
    op::{Message, MessageType, OpCode, Query},
    rr::{Name, RecordType},
};
use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};
use tokio::{net::UdpSocket, time::Instant};
use tracing::{debug, trace};

/// Large enough for any UDP response, with or without EDNS.
const RECV_BUFFER_SIZE: usize = 4096;

/// CNAME client that performs one plain UDP exchange per query.
///
/// Every query binds its own socket, so checks share nothing but the
/// server address and the timeout.
#[derive(Debug, Clone)]
pub struct UdpDnsClient {
    server: SocketAddr,
    timeout: Duration,
}

impl UdpDnsClient {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    /// Creates a client from the application's DNS configuration, resolving
    /// the configured address once.
    pub async fn from_config(config: &DnsConfig) -> Result<Self> {
        let address: ResolverAddress = config.resolver.parse()?;
        let server = address.resolve().await?;
        debug!(%address, %server, "DNS resolver selected");
        Ok(Self::new(server, Duration::from_millis(config.timeout_ms)))
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    fn build_query(name: &Name) -> Result<(u16, Vec<u8>), DnsError> {
        let id: u16 = rand::random();
        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_query(Query::query(name.clone(), RecordType::CNAME));

        let bytes = message
            .to_vec()
            .map_err(|e| DnsError::Malformed(format!("failed to encode query: {}", e)))?;
        Ok((id, bytes))
    }

    async fn exchange(&self, id: u16, query: &[u8]) -> Result<Message, DnsError> {
        let local: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| DnsError::Transport(e.to_string()))?;
        socket
            .connect(self.server)
            .await
            .map_err(|e| DnsError::Transport(e.to_string()))?;
        socket
            .send(query)
            .await
            .map_err(|e| DnsError::Transport(e.to_string()))?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        loop {
            let len = tokio::time::timeout_at(deadline, socket.recv(&mut buf))
                .await
                .map_err(|_| DnsError::Timeout(self.timeout.as_millis() as u64))?
                .map_err(|e| DnsError::Transport(e.to_string()))?;

            let message = Message::from_vec(&buf[..len])
                .map_err(|e| DnsError::Malformed(e.to_string()))?;
            if message.id() != id || message.message_type() != MessageType::Response {
                trace!(expected = id, got = message.id(), "Ignoring unrelated datagram");
                continue;
            }
            return Ok(message);
        }
    }
}

#[async_trait]
impl DnsResolver for UdpDnsClient {
    async fn query_cname(&self, name: &Name) -> Result<CnameResponse, DnsError> {
        let start_time = std::time::Instant::now();
        let (id, query) = Self::build_query(name)?;
        let result = self.exchange(id, &query).await;
        let elapsed = start_time.elapsed();

        match result {
            Ok(message) => {
                debug!(
                    %name,
                    rcode = %rcode_mnemonic(message.response_code()),
                    answers = message.answers().len(),
                    ?elapsed,
                    "CNAME query answered"
                );
                Ok(CnameResponse::new(
                    message.response_code(),
                    message.answers().to_vec(),
                ))
            }
            Err(e) => {
                debug!(%name, error = %e, ?elapsed, "CNAME query failed");
                Err(e)
            }
        }
    }
}
