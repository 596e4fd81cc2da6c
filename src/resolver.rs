use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio_rustls::TlsConnector;

use crate::dns::{build_query, parse_response, DnsResponse, QueryType};
use crate::error::LookupError;
use crate::transport::{parse_upstream, Endpoint, Upstream};

/// Performs one DNS lookup and reports how long it took.
#[async_trait]
pub trait Resolve: Send + Sync {
	async fn resolve(&self, domain: &str, server: &str) -> Result<Duration, LookupError>;
}

/// Resolver that talks to real DNS servers over UDP, TCP, DoT, or DoH.
///
/// Every lookup sets up its own socket or connection, so the measured
/// latency includes connection setup for the stream transports.
pub struct NetworkResolver {
	query_type: QueryType,
	timeout: Duration,
	tls: Arc<rustls::ClientConfig>,
}

impl NetworkResolver {
	pub fn new(query_type: QueryType, timeout: Duration) -> Result<Self, LookupError> {
		let mut roots = rustls::RootCertStore::empty();
		roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
		let provider = Arc::new(rustls::crypto::ring::default_provider());
		let tls = rustls::ClientConfig::builder_with_provider(provider)
			.with_safe_default_protocol_versions()
			.map_err(|e| LookupError::Tls(e.to_string()))?
			.with_root_certificates(roots)
			.with_no_client_auth();

		Ok(NetworkResolver {
			query_type,
			timeout,
			tls: Arc::new(tls),
		})
	}

	async fn exchange(&self, upstream: &Upstream, query: &[u8], txid: u16) -> Result<DnsResponse, LookupError> {
		match upstream {
			Upstream::Udp(endpoint) => {
				let addr = lookup_endpoint(endpoint).await?;
				send_udp_query(addr, query, txid).await
			}
			Upstream::Tcp(endpoint) => {
				let addr = lookup_endpoint(endpoint).await?;
				let mut stream = TcpStream::connect(addr).await?;
				let reply = exchange_stream(&mut stream, query).await?;
				parse_response(&reply, txid)
			}
			Upstream::Tls(endpoint) => {
				let addr = lookup_endpoint(endpoint).await?;
				let server_name = ServerName::try_from(endpoint.host.clone())
					.map_err(|e| LookupError::Tls(e.to_string()))?;
				let tcp = TcpStream::connect(addr).await?;
				let connector = TlsConnector::from(self.tls.clone());
				let mut stream = connector.connect(server_name, tcp).await?;
				let reply = exchange_stream(&mut stream, query).await?;
				parse_response(&reply, txid)
			}
			Upstream::Https(url) => {
				// Fresh client per lookup, matching the per-sample connection setup
				// of the other stream transports
				let client = reqwest::Client::builder()
					.timeout(self.timeout)
					.build()?;
				let response = client.post(url)
					.header("content-type", "application/dns-message")
					.header("accept", "application/dns-message")
					.body(query.to_vec())
					.send()
					.await?
					.error_for_status()?;
				let reply = response.bytes().await?;
				parse_response(&reply, txid)
			}
		}
	}
}

#[async_trait]
impl Resolve for NetworkResolver {
	async fn resolve(&self, domain: &str, server: &str) -> Result<Duration, LookupError> {
		let upstream = parse_upstream(server)?;
		let txid: u16 = rand::random();
		let query = build_query(domain, self.query_type, txid)?;

		let start = Instant::now();
		let response = tokio::time::timeout(self.timeout, self.exchange(&upstream, &query, txid))
			.await
			.map_err(|_| LookupError::Timeout(self.timeout))??;
		let latency = start.elapsed();

		debug!(
			"domain: {} dns: {} rcode: {} answers: {}",
			domain, server, response.rcode, response.answer_count,
		);
		Ok(latency)
	}
}

/// Resolve an endpoint host to the first socket address.
async fn lookup_endpoint(endpoint: &Endpoint) -> Result<SocketAddr, LookupError> {
	let mut addrs = tokio::net::lookup_host((endpoint.host.as_str(), endpoint.port)).await?;
	addrs.next()
		.ok_or_else(|| LookupError::UnresolvedHost(endpoint.host.clone()))
}

/// Send a single DNS query over UDP and wait for the matching reply.
///
/// Uses a dedicated socket per query so concurrent workers never steal each
/// other's responses. Replies with a foreign txid are ignored; the overall
/// lookup timeout bounds the wait.
async fn send_udp_query(resolver: SocketAddr, query: &[u8], txid: u16) -> Result<DnsResponse, LookupError> {
	let bind_addr = if resolver.is_ipv4() {
		"0.0.0.0:0"
	} else {
		"[::]:0"
	};
	let socket = UdpSocket::bind(bind_addr).await?;
	socket.connect(resolver).await?;
	socket.send(query).await?;

	// 4096-byte buffer handles EDNS-extended responses
	let mut buf = vec![0u8; 4096];
	loop {
		let len = socket.recv(&mut buf).await?;
		match parse_response(&buf[..len], txid) {
			Ok(response) => return Ok(response),
			Err(LookupError::TxidMismatch { .. }) => continue,
			Err(e) => return Err(e),
		}
	}
}

/// Exchange one message over a stream transport using 2-byte length framing
/// (RFC 1035 section 4.2.2).
async fn exchange_stream<S>(stream: &mut S, query: &[u8]) -> Result<Vec<u8>, LookupError>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	let len = u16::try_from(query.len())
		.map_err(|_| LookupError::Malformed("query too large for TCP framing".to_string()))?;
	let mut framed = Vec::with_capacity(query.len() + 2);
	framed.extend_from_slice(&len.to_be_bytes());
	framed.extend_from_slice(query);
	stream.write_all(&framed).await?;
	stream.flush().await?;

	let mut len_buf = [0u8; 2];
	stream.read_exact(&mut len_buf).await?;
	let mut reply = vec![0u8; u16::from_be_bytes(len_buf) as usize];
	stream.read_exact(&mut reply).await?;
	Ok(reply)
}
