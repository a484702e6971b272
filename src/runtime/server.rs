use std::{net::SocketAddr, sync::Arc};

use hickory_resolver::proto::{
    op::{Message, MessageType, ResponseCode},
    rr::{RData, Record, RecordType, rdata::TXT},
};
use tokio::net::UdpSocket;

use crate::{
    error::SpfMacroError,
    net::{cache::SubnetCache, extract::find_address},
};

use super::sync::ShutdownSignal;

pub const DEFAULT_ACCEPT_RECORD: &str = "v=spf1 -all";
pub const DEFAULT_ANSWER_TTL: u32 = 30;

const MAX_UDP_PAYLOAD: usize = 4096;

/// Answers SPF macro lookups such as `203.0.113.5._spf.example.com TXT`
pub struct SpfMacroHandler {
    cache: Arc<SubnetCache>,
    accept_record: String,
    ttl: u32,
}

impl SpfMacroHandler {
    pub fn new(cache: Arc<SubnetCache>, accept_record: impl Into<String>, ttl: u32) -> Self {
        Self {
            cache,
            accept_record: accept_record.into(),
            ttl,
        }
    }

    /// Build the response to `request`
    ///
    /// A TXT question from an IPv4 client whose name embeds an authorized address
    /// gets the accept record. Anything else is answered NXDOMAIN.
    pub fn answer(&self, request: &Message, client: SocketAddr) -> Message {
        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(request.op_code())
            .set_recursion_desired(request.recursion_desired())
            .set_authoritative(true);

        let Some(query) = request.queries().first() else {
            response.set_response_code(ResponseCode::FormErr);
            return response;
        };
        response.add_query(query.clone());

        let name = query.name().to_string();
        let authorized = query.query_type() == RecordType::TXT
            && client.is_ipv4()
            && find_address(&name).is_some_and(|ip| self.cache.contains(ip));
        log::debug!(
            "Query {name} {} from {client}: authorized={authorized}",
            query.query_type()
        );

        if authorized {
            let mut record = Record::from_rdata(
                query.name().clone(),
                self.ttl,
                RData::TXT(TXT::new(vec![self.accept_record.clone()])),
            );
            record.set_dns_class(query.query_class());
            response
                .set_response_code(ResponseCode::NoError)
                .add_answer(record);
        } else {
            response.set_response_code(ResponseCode::NXDomain);
        }

        response
    }
}

/// Serve `handler` on `socket` until shutdown is signaled
pub async fn serve(
    socket: UdpSocket,
    handler: SpfMacroHandler,
    shutdown_signal: Arc<ShutdownSignal>,
) -> Result<(), SpfMacroError> {
    let mut buf = vec![0u8; MAX_UDP_PAYLOAD];

    loop {
        let (len, client) = tokio::select! {
            biased;
            _ = shutdown_signal.wait() => return Ok(()),
            received = socket.recv_from(&mut buf) => received?,
        };

        let request = match Message::from_vec(&buf[..len]) {
            Ok(request) => request,
            Err(err) => {
                log::warn!("Dropping malformed packet from {client}: {err}");
                continue;
            }
        };

        let response = handler.answer(&request, client);
        match response.to_vec() {
            Ok(bytes) => {
                if let Err(err) = socket.send_to(&bytes, client).await {
                    log::warn!("Failed to reply to {client}: {err}");
                }
            }
            Err(err) => log::error!("Failed to encode response for {client}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::proto::{
        op::Query,
        rr::{DNSClass, Name},
    };
    use std::{str::FromStr, time::Duration};

    fn handler() -> SpfMacroHandler {
        let cache = Arc::new(SubnetCache::new(vec![]));
        cache.replace_subnets(vec!["203.0.113.0/28".parse().unwrap()]);
        SpfMacroHandler::new(cache, DEFAULT_ACCEPT_RECORD, DEFAULT_ANSWER_TTL)
    }

    fn request(name: &str, record_type: RecordType) -> Message {
        let mut message = Message::new();
        message
            .set_id(4242)
            .set_recursion_desired(true)
            .add_query(Query::query(Name::from_str(name).unwrap(), record_type));
        message
    }

    fn v4_client() -> SocketAddr {
        "192.0.2.53:40000".parse().unwrap()
    }

    fn txt_strings(response: &Message) -> Vec<String> {
        response
            .answers()
            .iter()
            .filter(|record| record.record_type() == RecordType::TXT)
            .map(|record| record.to_string())
            .collect()
    }

    #[test]
    fn authorized_ip_gets_accept_record() {
        let req = request("203.0.113.5._spf.example.com.", RecordType::TXT);
        let response = handler().answer(&req, v4_client());

        assert_eq!(response.id(), 4242);
        assert_eq!(response.message_type(), MessageType::Response);
        assert!(response.authoritative());
        assert_eq!(response.response_code(), ResponseCode::NoError);
        assert_eq!(response.queries().len(), 1);
        assert_eq!(response.answers().len(), 1);
        assert_eq!(response.answers()[0].ttl(), DEFAULT_ANSWER_TTL);
        assert_eq!(response.answers()[0].dns_class(), DNSClass::IN);
        let answers = txt_strings(&response);
        assert_eq!(answers.len(), 1);
        assert!(answers[0].contains(DEFAULT_ACCEPT_RECORD));
    }

    #[test]
    fn unknown_ip_is_nxdomain() {
        let req = request("203.0.113.99._spf.example.com.", RecordType::TXT);
        let response = handler().answer(&req, v4_client());

        assert_eq!(response.response_code(), ResponseCode::NXDomain);
        assert!(response.answers().is_empty());
    }

    #[test]
    fn non_txt_question_is_nxdomain() {
        let req = request("203.0.113.5._spf.example.com.", RecordType::A);
        let response = handler().answer(&req, v4_client());

        assert_eq!(response.response_code(), ResponseCode::NXDomain);
        assert!(response.answers().is_empty());
    }

    #[test]
    fn name_without_address_is_nxdomain() {
        let req = request("_spf.example.com.", RecordType::TXT);
        let response = handler().answer(&req, v4_client());

        assert_eq!(response.response_code(), ResponseCode::NXDomain);
    }

    #[test]
    fn ipv6_client_is_not_answered() {
        let req = request("203.0.113.5._spf.example.com.", RecordType::TXT);
        let client: SocketAddr = "[2001:db8::53]:40000".parse().unwrap();
        let response = handler().answer(&req, client);

        assert_eq!(response.response_code(), ResponseCode::NXDomain);
    }

    #[test]
    fn missing_question_is_formerr() {
        let response = handler().answer(&Message::new(), v4_client());

        assert_eq!(response.response_code(), ResponseCode::FormErr);
    }

    #[tokio::test]
    async fn serve_answers_over_udp() {
        let server_socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server_socket.local_addr().unwrap();
        let shutdown_signal = ShutdownSignal::new();
        let server = tokio::spawn(serve(
            server_socket,
            handler(),
            Arc::clone(&shutdown_signal),
        ));

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let req = request("203.0.113.1._spf.example.com.", RecordType::TXT);
        client
            .send_to(&req.to_vec().unwrap(), server_addr)
            .await
            .unwrap();

        let mut buf = vec![0u8; MAX_UDP_PAYLOAD];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .expect("response received")
            .unwrap();
        let response = Message::from_vec(&buf[..len]).unwrap();

        assert_eq!(response.id(), 4242);
        let answers = txt_strings(&response);
        assert_eq!(answers.len(), 1);
        assert!(answers[0].contains(DEFAULT_ACCEPT_RECORD));

        shutdown_signal.shutdown();
        server.await.unwrap().unwrap();
    }
}
