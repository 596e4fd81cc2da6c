use std::fmt;
use std::net::Ipv6Addr;

use crate::error::LookupError;

/// Default port for plain DNS over UDP and TCP
pub const DNS_PORT: u16 = 53;

/// Default port for DNS-over-TLS (RFC 7858)
pub const DOT_PORT: u16 = 853;

/// Host and port of a DNS server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub host: String,
	pub port: u16,
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.host.contains(':') {
			write!(f, "[{}]:{}", self.host, self.port)
		} else {
			write!(f, "{}:{}", self.host, self.port)
		}
	}
}

/// How a configured DNS server is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upstream {
	Udp(Endpoint),
	Tcp(Endpoint),
	Tls(Endpoint),
	/// Full DoH endpoint URL (RFC 8484)
	Https(String),
}

/// Parse a DNS server address string into an Upstream.
///
/// Supports formats:
///   "8.8.8.8"                      -- UDP, default port 53
///   "8.8.8.8:5353"                 -- UDP with explicit port
///   "2606:4700::1111"              -- bare IPv6, default port 53
///   "[2606:4700::1111]:53"         -- bracketed IPv6 with port
///   "udp://dns.google"             -- explicit UDP, hostnames allowed
///   "tcp://1.1.1.1"                -- TCP, default port 53
///   "tls://dns.google"             -- DNS-over-TLS, default port 853
///   "https://dns.google/dns-query" -- DNS-over-HTTPS
///
/// DNS-over-QUIC ("quic://") and DNS stamps ("sdns://") are recognized but
/// rejected as unsupported.
pub fn parse_upstream(input: &str) -> Result<Upstream, LookupError> {
	let trimmed = input.trim();
	if trimmed.is_empty() {
		return Err(LookupError::InvalidServer(input.to_string()));
	}

	let (scheme, rest) = match trimmed.split_once("://") {
		Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
		None => ("udp".to_string(), trimmed),
	};

	match scheme.as_str() {
		"udp" => Ok(Upstream::Udp(parse_endpoint(rest, DNS_PORT, trimmed)?)),
		"tcp" => Ok(Upstream::Tcp(parse_endpoint(rest, DNS_PORT, trimmed)?)),
		"tls" => Ok(Upstream::Tls(parse_endpoint(rest, DOT_PORT, trimmed)?)),
		"https" => {
			if rest.is_empty() || rest.starts_with('/') {
				return Err(LookupError::InvalidServer(trimmed.to_string()));
			}
			Ok(Upstream::Https(trimmed.to_string()))
		}
		"quic" | "sdns" => Err(LookupError::UnsupportedTransport {
			scheme: scheme.clone(),
			server: trimmed.to_string(),
		}),
		_ => Err(LookupError::InvalidServer(trimmed.to_string())),
	}
}

/// Split "host[:port]" into an Endpoint, handling IPv6 forms.
fn parse_endpoint(rest: &str, default_port: u16, original: &str) -> Result<Endpoint, LookupError> {
	let invalid = || LookupError::InvalidServer(original.to_string());
	if rest.is_empty() || rest.contains('/') || rest.chars().any(char::is_whitespace) {
		return Err(invalid());
	}

	if let Some(inner) = rest.strip_prefix('[') {
		// Bracketed IPv6, with or without port: [::1] or [::1]:53
		let (host, after) = inner.split_once(']').ok_or_else(invalid)?;
		let ip: Ipv6Addr = host.parse().map_err(|_| invalid())?;
		let port = match after {
			"" => default_port,
			p => p.strip_prefix(':')
				.ok_or_else(invalid)?
				.parse()
				.map_err(|_| invalid())?,
		};
		return Ok(Endpoint { host: ip.to_string(), port });
	}

	if rest.matches(':').count() > 1 {
		// Bare IPv6 address without port
		let ip: Ipv6Addr = rest.parse().map_err(|_| invalid())?;
		return Ok(Endpoint { host: ip.to_string(), port: default_port });
	}

	match rest.split_once(':') {
		Some((host, port)) => {
			if host.is_empty() {
				return Err(invalid());
			}
			let port = port.parse().map_err(|_| invalid())?;
			Ok(Endpoint { host: host.to_string(), port })
		}
		None => Ok(Endpoint { host: rest.to_string(), port: default_port }),
	}
}
