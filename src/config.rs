use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{de, Deserialize, Deserializer};

use crate::cli::Cli;
use crate::dns::QueryType;
use crate::error::ConfigError;
use crate::transport::parse_upstream;

/// Benchmark configuration, read once and shared read-only by every round
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub domains: Vec<String>,

	#[serde(default, rename = "dns_servers")]
	pub servers: Vec<String>,

	/// Lookups per (domain, server) pair
	#[serde(default = "default_test_count")]
	pub test_count: u32,

	/// Pause between successful samples of the same pair
	#[serde(default, deserialize_with = "deserialize_duration")]
	pub query_interval: Duration,

	/// Number of concurrent workers
	#[serde(default = "default_concurrency")]
	pub concurrency: usize,

	#[serde(default)]
	pub log_to_file: bool,

	#[serde(default)]
	pub save_csv: bool,

	#[serde(default = "default_test_rounds")]
	pub test_rounds: u32,

	/// Upper bound on a single lookup
	#[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
	pub timeout: Duration,

	#[serde(default)]
	pub record_type: QueryType,

	#[serde(default = "default_log_file")]
	pub log_file: PathBuf,

	#[serde(default = "default_csv_dir")]
	pub csv_dir: PathBuf,
}

fn default_test_count() -> u32 {
	5
}

fn default_concurrency() -> usize {
	4
}

fn default_test_rounds() -> u32 {
	1
}

fn default_timeout() -> Duration {
	Duration::from_secs(5)
}

fn default_log_file() -> PathBuf {
	PathBuf::from("dns_test.log")
}

fn default_csv_dir() -> PathBuf {
	PathBuf::from("./dns_test_results")
}

impl Config {
	/// Read and parse the YAML configuration file at `path`.
	pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let path = path.as_ref();
		let label = path.display().to_string();
		let raw = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: label.clone(), source })?;
		Config::from_yaml(&raw, &label)
	}

	/// Parse configuration from YAML text; `origin` names the source in errors.
	pub fn from_yaml(raw: &str, origin: &str) -> Result<Config, ConfigError> {
		serde_yaml::from_str(raw)
			.map_err(|source| ConfigError::Parse { path: origin.to_string(), source })
	}

	/// Apply command-line overrides on top of the file values.
	pub fn apply_cli(&mut self, cli: &Cli) {
		if let Some(rounds) = cli.rounds {
			self.test_rounds = rounds;
		}
		if let Some(concurrency) = cli.concurrency {
			self.concurrency = concurrency;
		}
		if let Some(count) = cli.count {
			self.test_count = count;
		}
		if cli.no_csv {
			self.save_csv = false;
		}
		if cli.no_log_file {
			self.log_to_file = false;
		}
	}

	/// Reject configurations that cannot run a benchmark.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.domains.is_empty() {
			return Err(ConfigError::NoDomains);
		}
		if self.servers.is_empty() {
			return Err(ConfigError::NoServers);
		}
		if self.concurrency == 0 {
			return Err(ConfigError::ZeroConcurrency);
		}
		if self.test_rounds == 0 {
			return Err(ConfigError::ZeroRounds);
		}
		if self.timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}
		for server in &self.servers {
			parse_upstream(server).map_err(|source| ConfigError::Server {
				server: server.clone(),
				source,
			})?;
		}
		Ok(())
	}
}

/// Durations may be written as "1.5s" / "1m30s" / "200ms" or as a bare
/// integer number of nanoseconds.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawDuration {
		Nanos(u64),
		Text(String),
	}

	match RawDuration::deserialize(deserializer)? {
		RawDuration::Nanos(nanos) => Ok(Duration::from_nanos(nanos)),
		RawDuration::Text(text) => parse_duration(&text).map_err(de::Error::custom),
	}
}

/// Parse a duration string made of number+unit segments, e.g. "1h2m3.5s".
///
/// Units: ns, us (or µs), ms, s, m, h. A lone "0" is accepted.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
	let s = input.trim();
	if s == "0" {
		return Ok(Duration::ZERO);
	}
	if s.is_empty() {
		return Err("empty duration".to_string());
	}

	let invalid = || format!("invalid duration '{}'", input);
	let mut nanos = 0f64;
	let mut rest = s;
	while !rest.is_empty() {
		let num_len = rest
			.find(|c: char| !(c.is_ascii_digit() || c == '.'))
			.unwrap_or(rest.len());
		if num_len == 0 {
			return Err(invalid());
		}
		let value: f64 = rest[..num_len].parse().map_err(|_| invalid())?;
		rest = &rest[num_len..];

		let unit_len = rest
			.find(|c: char| c.is_ascii_digit() || c == '.')
			.unwrap_or(rest.len());
		let scale = match &rest[..unit_len] {
			"ns" => 1.0,
			"us" | "µs" | "μs" => 1e3,
			"ms" => 1e6,
			"s" => 1e9,
			"m" => 60e9,
			"h" => 3600e9,
			"" => return Err(format!("missing unit in duration '{}'", input)),
			unit => return Err(format!("unknown unit '{}' in duration '{}'", unit, input)),
		};
		nanos += value * scale;
		rest = &rest[unit_len..];
	}
	Ok(Duration::from_nanos(nanos.round() as u64))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::LookupError;
	use clap::Parser;
	use std::io::Write;

	const SAMPLE: &str = r#"
domains:
  - example.com
  - example.org
dns_servers:
  - 8.8.8.8
  - tls://dns.google
  - https://dns.google/dns-query
test_count: 3
query_interval: 500ms
concurrency: 2
log_to_file: true
save_csv: true
test_rounds: 2
"#;

	#[test]
	fn test_parse_original_keys() {
		let config = Config::from_yaml(SAMPLE, "inline").unwrap();
		assert_eq!(config.domains, vec!["example.com", "example.org"]);
		assert_eq!(config.servers.len(), 3);
		assert_eq!(config.test_count, 3);
		assert_eq!(config.query_interval, Duration::from_millis(500));
		assert_eq!(config.concurrency, 2);
		assert!(config.log_to_file);
		assert!(config.save_csv);
		assert_eq!(config.test_rounds, 2);
		// Defaults for keys the file leaves out
		assert_eq!(config.timeout, Duration::from_secs(5));
		assert_eq!(config.record_type, QueryType::A);
		assert_eq!(config.log_file, PathBuf::from("dns_test.log"));
		assert_eq!(config.csv_dir, PathBuf::from("./dns_test_results"));
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_parse_extended_keys() {
		let raw = "domains: [a.com]\ndns_servers: [1.1.1.1]\nquery_interval: 1000000\ntimeout: 2s\nrecord_type: AAAA\ncsv_dir: out\n";
		let config = Config::from_yaml(raw, "inline").unwrap();
		assert_eq!(config.query_interval, Duration::from_millis(1));
		assert_eq!(config.timeout, Duration::from_secs(2));
		assert_eq!(config.record_type, QueryType::AAAA);
		assert_eq!(config.csv_dir, PathBuf::from("out"));
	}

	#[test]
	fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(SAMPLE.as_bytes()).unwrap();
		let config = Config::load(file.path()).unwrap();
		assert_eq!(config.test_rounds, 2);
	}

	#[test]
	fn test_load_missing_file() {
		let result = Config::load("/nonexistent/dns-bench/config.yaml");
		assert!(matches!(result, Err(ConfigError::Read { .. })));
	}

	#[test]
	fn test_bad_duration_is_parse_error() {
		let raw = "domains: [a.com]\ndns_servers: [1.1.1.1]\nquery_interval: 5 parsecs\n";
		assert!(matches!(Config::from_yaml(raw, "inline"), Err(ConfigError::Parse { .. })));
	}

	#[test]
	fn test_validation_errors() {
		let base = Config::from_yaml(SAMPLE, "inline").unwrap();

		let mut config = base.clone();
		config.domains.clear();
		assert!(matches!(config.validate(), Err(ConfigError::NoDomains)));

		let mut config = base.clone();
		config.servers.clear();
		assert!(matches!(config.validate(), Err(ConfigError::NoServers)));

		let mut config = base.clone();
		config.concurrency = 0;
		assert!(matches!(config.validate(), Err(ConfigError::ZeroConcurrency)));

		let mut config = base.clone();
		config.test_rounds = 0;
		assert!(matches!(config.validate(), Err(ConfigError::ZeroRounds)));

		let mut config = base.clone();
		config.timeout = Duration::ZERO;
		assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));

		let mut config = base;
		config.servers.push("sdns://abc".to_string());
		assert!(matches!(
			config.validate(),
			Err(ConfigError::Server { source: LookupError::UnsupportedTransport { .. }, .. })
		));
	}

	#[test]
	fn test_zero_samples_is_valid() {
		let mut config = Config::from_yaml(SAMPLE, "inline").unwrap();
		config.test_count = 0;
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_cli_overrides() {
		let mut config = Config::from_yaml(SAMPLE, "inline").unwrap();
		let cli = Cli::parse_from([
			"dns-latency-bench", "--rounds", "7", "-j", "16", "--count", "0", "--no-csv",
		]);
		config.apply_cli(&cli);
		assert_eq!(config.test_rounds, 7);
		assert_eq!(config.concurrency, 16);
		assert_eq!(config.test_count, 0);
		assert!(!config.save_csv);
		assert!(config.log_to_file);
	}

	#[test]
	fn test_parse_duration_forms() {
		assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
		assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
		assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
		assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
		assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
		assert_eq!(parse_duration("10us"), Ok(Duration::from_micros(10)));
		assert_eq!(parse_duration("10µs"), Ok(Duration::from_micros(10)));
		assert_eq!(parse_duration("7ns"), Ok(Duration::from_nanos(7)));
	}

	#[test]
	fn test_parse_duration_rejects() {
		assert!(parse_duration("").is_err());
		assert!(parse_duration("10").is_err());
		assert!(parse_duration("ms").is_err());
		assert!(parse_duration("-1s").is_err());
		assert!(parse_duration("3d").is_err());
		assert!(parse_duration("1..2s").is_err());
	}
}
