use std::time::Duration;

use thiserror::Error;

/// Problems found while loading or validating the configuration.
///
/// These are the only failures that stop the program; they are raised before
/// the first round starts.
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("failed to read configuration file '{path}': {source}")]
	Read {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse configuration file '{path}': {source}")]
	Parse {
		path: String,
		#[source]
		source: serde_yaml::Error,
	},

	#[error("no domains configured")]
	NoDomains,

	#[error("no DNS servers configured")]
	NoServers,

	#[error("concurrency must be at least 1")]
	ZeroConcurrency,

	#[error("test_rounds must be at least 1")]
	ZeroRounds,

	#[error("timeout must be greater than zero")]
	ZeroTimeout,

	#[error("invalid DNS server '{server}': {source}")]
	Server {
		server: String,
		#[source]
		source: LookupError,
	},
}

/// Why a single lookup (one sample) failed.
#[derive(Error, Debug)]
pub enum LookupError {
	#[error("invalid server address '{0}'")]
	InvalidServer(String),

	#[error("unsupported transport '{scheme}' in server address '{server}' (use udp, tcp, tls or https)")]
	UnsupportedTransport { scheme: String, server: String },

	#[error("invalid domain name '{domain}': {reason}")]
	InvalidDomain { domain: String, reason: String },

	#[error("could not resolve server host '{0}'")]
	UnresolvedHost(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("lookup timed out after {0:?}")]
	Timeout(Duration),

	#[error("TLS error: {0}")]
	Tls(String),

	#[error("HTTP error: {0}")]
	Http(String),

	#[error("malformed response: {0}")]
	Malformed(String),

	#[error("txid mismatch: expected {expected}, got {actual}")]
	TxidMismatch { expected: u16, actual: u16 },
}

impl From<reqwest::Error> for LookupError {
	fn from(err: reqwest::Error) -> Self {
		LookupError::Http(err.to_string())
	}
}

/// Failure to persist one record.
#[derive(Error, Debug)]
pub enum SinkError {
	#[error("CSV write failed: {0}")]
	Csv(#[from] csv::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
