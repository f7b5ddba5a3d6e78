#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use doq::codec::{Codec, DnsCodec};
use doq::error::{Error, Result};
use doq::frame;
use doq::transport::{Connection, Transport};
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use quinn::crypto::rustls::QuicServerConfig;
use rustls::RootCertStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

const CA_CERT: &[u8] = include_bytes!("../data/ca.crt");
const SERVER_CERT: &[u8] = include_bytes!("../data/server.crt");
const SERVER_KEY: &[u8] = include_bytes!("../data/server.key");

/// In-memory stream buffer size, small enough for writes to block
pub const STREAM_CAPACITY: usize = 16 * 1024;

// Mock transport

/// How the mock remote treats each stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    /// Echo the request payload back
    #[default]
    Echo,
    /// Never read the request, never answer
    Stall,
    /// Answer with a frame cut short
    Truncate,
    /// Answer with a complete frame of bytes no codec understands
    Garbage,
    /// Refuse to open streams
    RefuseStreams,
    /// Never finish opening streams
    HoldStreams,
}

#[derive(Default)]
struct MockState {
    dials: AtomicUsize,
    requests: AtomicUsize,
    dial_delay_ms: AtomicU64,
    response_delay_ms: AtomicU64,
    fail_dials: AtomicBool,
    behavior: Mutex<Behavior>,
    connections: Mutex<Vec<Arc<AtomicBool>>>,
}

/// Transport whose connections are in-memory duplex pipes
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dial attempts made so far, including failed and abandoned ones
    pub fn dials(&self) -> usize {
        self.state.dials.load(Ordering::SeqCst)
    }

    /// Requests fully received by the remote
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn set_dial_delay(&self, delay: Duration) {
        self.state
            .dial_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_response_delay(&self, delay: Duration) {
        self.state
            .response_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_fail_dials(&self, fail: bool) {
        self.state.fail_dials.store(fail, Ordering::SeqCst);
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.state.behavior.lock().unwrap() = behavior;
    }

    /// Mark every connection handed out so far as unhealthy
    pub fn break_connections(&self) {
        for healthy in self.state.connections.lock().unwrap().iter() {
            healthy.store(false, Ordering::SeqCst);
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    type Connection = MockConnection;

    async fn dial(&self, _addr: &str, _tls: Arc<rustls::ClientConfig>) -> Result<MockConnection> {
        self.state.dials.fetch_add(1, Ordering::SeqCst);

        let delay = self.state.dial_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.state.fail_dials.load(Ordering::SeqCst) {
            return Err(Error::Connect("connection refused".into()));
        }

        let healthy = Arc::new(AtomicBool::new(true));
        self.state
            .connections
            .lock()
            .unwrap()
            .push(Arc::clone(&healthy));
        Ok(MockConnection {
            healthy,
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Clone)]
pub struct MockConnection {
    healthy: Arc<AtomicBool>,
    state: Arc<MockState>,
}

#[async_trait::async_trait]
impl Connection for MockConnection {
    type SendStream = WriteHalf<DuplexStream>;
    type RecvStream = ReadHalf<DuplexStream>;

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn open_stream(&self) -> Result<(Self::SendStream, Self::RecvStream)> {
        let behavior = *self.state.behavior.lock().unwrap();
        match behavior {
            Behavior::RefuseStreams => return Err(Error::Stream("stream limit reached".into())),
            Behavior::HoldStreams => std::future::pending::<()>().await,
            _ => {}
        }

        let (local, remote) = tokio::io::duplex(STREAM_CAPACITY);
        tokio::spawn(serve_mock_stream(remote, Arc::clone(&self.state)));
        let (recv, send) = tokio::io::split(local);
        Ok((send, recv))
    }
}

async fn serve_mock_stream(mut stream: DuplexStream, state: Arc<MockState>) {
    let behavior = *state.behavior.lock().unwrap();
    if behavior == Behavior::Stall {
        tokio::time::sleep(Duration::from_secs(60)).await;
        return;
    }

    let Ok(request) = frame::read_frame(&mut stream).await else {
        return;
    };
    // only answer once the request side is closed
    let mut rest = Vec::new();
    if stream.read_to_end(&mut rest).await.is_err() || !rest.is_empty() {
        return;
    }
    state.requests.fetch_add(1, Ordering::SeqCst);

    let delay = state.response_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    match behavior {
        Behavior::Echo => {
            let _ = frame::write_frame(&mut stream, &request).await;
        }
        Behavior::Truncate => {
            let _ = stream.write_all(&[0x00, 0x0A, 1, 2, 3]).await;
        }
        Behavior::Garbage => {
            let _ = frame::write_frame(&mut stream, &[0xFF; 3]).await;
        }
        Behavior::Stall | Behavior::RefuseStreams | Behavior::HoldStreams => unreachable!(),
    }
}

// DNS over QUIC test server

#[derive(Debug, Clone, Copy, Default)]
pub struct ServerOptions {
    pub response_delay: Duration,
}

/// QUIC server answering every query with one A record
pub struct DoqServer {
    pub addr: SocketAddr,
    endpoint: quinn::Endpoint,
    accepted: Arc<AtomicUsize>,
    connections: Arc<Mutex<Vec<quinn::Connection>>>,
}

impl DoqServer {
    pub fn start(options: ServerOptions) -> Self {
        let endpoint =
            quinn::Endpoint::server(server_config(), "127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = endpoint.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let connections = Arc::new(Mutex::new(Vec::new()));

        let listener = endpoint.clone();
        let counter = Arc::clone(&accepted);
        let live = Arc::clone(&connections);
        tokio::spawn(async move {
            while let Some(incoming) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let live = Arc::clone(&live);
                tokio::spawn(async move {
                    let Ok(connection) = incoming.await else {
                        return;
                    };
                    live.lock().unwrap().push(connection.clone());
                    while let Ok((send, recv)) = connection.accept_bi().await {
                        tokio::spawn(answer(send, recv, options.response_delay));
                    }
                });
            }
        });

        Self {
            addr,
            endpoint,
            accepted,
            connections,
        }
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Close every live connection while keeping the endpoint up
    pub fn disconnect_all(&self) {
        for connection in self.connections.lock().unwrap().drain(..) {
            connection.close(0u32.into(), b"bye");
        }
    }

    pub fn stop(&self) {
        self.endpoint.close(0u32.into(), b"stop");
    }
}

impl Drop for DoqServer {
    fn drop(&mut self) {
        self.stop();
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn answer(
    mut send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    delay: Duration,
) -> std::result::Result<(), BoxError> {
    let request = recv
        .read_to_end(frame::PREFIX_LEN + frame::MAX_PAYLOAD_LEN)
        .await?;
    let payload = request.get(frame::PREFIX_LEN..).ok_or("short request")?;
    let mut response = DnsCodec.decode(payload)?;

    tokio::time::sleep(delay).await;

    response
        .set_message_type(MessageType::Response)
        .set_response_code(ResponseCode::NoError)
        .add_answer(a_record());
    let bytes = DnsCodec.encode(&response)?;

    send.write_all(&frame::encode(&bytes)?).await?;
    send.finish()?;
    Ok(())
}

fn server_config() -> quinn::ServerConfig {
    let certs = rustls_pemfile::certs(&mut &SERVER_CERT[..])
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap();
    let key = rustls_pemfile::private_key(&mut &SERVER_KEY[..])
        .unwrap()
        .unwrap();

    let mut crypto =
        rustls::ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_protocol_versions(&[&rustls::version::TLS13])
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .unwrap();
    crypto.alpn_protocols = vec![b"doq".to_vec()];

    quinn::ServerConfig::with_crypto(Arc::new(QuicServerConfig::try_from(crypto).unwrap()))
}

/// Client TLS configuration trusting the test CA
pub fn client_tls() -> rustls::ClientConfig {
    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut &CA_CERT[..]) {
        roots.add(cert.unwrap()).unwrap();
    }

    rustls::ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_protocol_versions(&[&rustls::version::TLS13])
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth()
}

pub fn a_query() -> Message {
    let mut query = Message::new();
    query.set_id(4242).set_recursion_desired(true).add_query(Query::query(
        Name::from_ascii("example.org.").unwrap(),
        RecordType::A,
    ));
    query
}

pub fn a_record() -> Record {
    Record::from_rdata(
        Name::from_ascii("example.org.").unwrap(),
        10,
        RData::A(A::new(127, 0, 0, 1)),
    )
}
