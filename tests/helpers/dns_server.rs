#![allow(dead_code)]
//! A minimal in-process DNS responder on a loopback UDP socket.

use hickory_resolver::proto::{
    op::{Message, MessageType, OpCode, ResponseCode},
    rr::{Name, Record},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// What the responder does for one query name.
#[derive(Clone)]
pub enum Reply {
    Answer(ResponseCode, Vec<Record>),
    /// Send a response with the wrong id first, then the real one.
    AnswerAfterStray(ResponseCode, Vec<Record>),
    /// Never answer.
    Silent,
}

pub struct TestDnsServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestDnsServer {
    /// Starts a responder; `reply` decides what to send for each query name.
    pub async fn start<F>(reply: F) -> Self
    where
        F: Fn(&Name) -> Reply + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let reply = Arc::new(reply);

        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                let Ok(request) = Message::from_vec(&buf[..len]) else {
                    continue;
                };
                let Some(query) = request.queries().first().cloned() else {
                    continue;
                };

                let (code, answers, stray) = match reply(query.name()) {
                    Reply::Silent => continue,
                    Reply::Answer(code, answers) => (code, answers, false),
                    Reply::AnswerAfterStray(code, answers) => (code, answers, true),
                };

                if stray {
                    let bogus = response(request.id().wrapping_add(1), &query, code, &answers);
                    let _ = socket.send_to(&bogus, peer).await;
                }
                let bytes = response(request.id(), &query, code, &answers);
                let _ = socket.send_to(&bytes, peer).await;
            }
        });

        Self { addr, handle }
    }
}

impl Drop for TestDnsServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn response(
    id: u16,
    query: &hickory_resolver::proto::op::Query,
    code: ResponseCode,
    answers: &[Record],
) -> Vec<u8> {
    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .set_recursion_available(true)
        .set_response_code(code)
        .add_query(query.clone());
    for answer in answers {
        message.add_answer(answer.clone());
    }
    message.to_vec().unwrap()
}
