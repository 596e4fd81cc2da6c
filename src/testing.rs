//! Scripted collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::bench::BenchContext;
use crate::config::Config;
use crate::dns::QueryType;
use crate::error::{LookupError, SinkError};
use crate::resolver::Resolve;
use crate::sink::{RecordSink, SinkProvider};
use crate::work::SampleResult;

pub fn ms(value: u64) -> Duration {
	Duration::from_millis(value)
}

/// Resolver that replays a script of outcomes (`None` is a failure) and
/// then keeps answering with `fallback`.
pub struct ScriptedResolver {
	script: Mutex<VecDeque<Option<Duration>>>,
	fallback: Duration,
	delay: Duration,
	seen: Mutex<Vec<(String, String)>>,
	pub calls: AtomicUsize,
}

impl ScriptedResolver {
	pub fn new(script: Vec<Option<Duration>>) -> Self {
		ScriptedResolver {
			script: Mutex::new(script.into()),
			fallback: ms(1),
			delay: Duration::ZERO,
			seen: Mutex::new(Vec::new()),
			calls: AtomicUsize::new(0),
		}
	}

	/// Make every lookup take `delay` of wall-clock time.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	pub fn seen(&self) -> Vec<(String, String)> {
		self.seen.lock().unwrap().clone()
	}
}

#[async_trait]
impl Resolve for ScriptedResolver {
	async fn resolve(&self, domain: &str, server: &str) -> Result<Duration, LookupError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.seen.lock().unwrap().push((domain.to_string(), server.to_string()));
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
		let next = self.script.lock().unwrap().pop_front();
		match next {
			Some(Some(latency)) => Ok(latency),
			Some(None) => Err(LookupError::Timeout(ms(5000))),
			None => Ok(self.fallback),
		}
	}
}

/// Sink that keeps every record in memory and notes what happened around
/// `finish`.
#[derive(Default)]
pub struct RecordingSink {
	pub records: Mutex<Vec<SampleResult>>,
	pub finished: Mutex<bool>,
	pub late_writes: AtomicUsize,
	/// Resolver call count observed when the round finished
	pub calls_at_finish: Mutex<Option<usize>>,
	probe: Option<Arc<ScriptedResolver>>,
	fail_writes: bool,
}

impl RecordingSink {
	pub fn latencies(&self) -> Vec<Duration> {
		self.records.lock().unwrap().iter().map(|r| r.latency).collect()
	}
}

impl RecordSink for RecordingSink {
	fn write(&self, sample: &SampleResult) -> Result<(), SinkError> {
		if *self.finished.lock().unwrap() {
			self.late_writes.fetch_add(1, Ordering::SeqCst);
		}
		if self.fail_writes {
			return Err(SinkError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")));
		}
		self.records.lock().unwrap().push(sample.clone());
		Ok(())
	}

	fn finish(&self) -> Result<(), SinkError> {
		*self.finished.lock().unwrap() = true;
		if let Some(probe) = &self.probe {
			*self.calls_at_finish.lock().unwrap() = Some(probe.calls.load(Ordering::SeqCst));
		}
		Ok(())
	}
}

/// Hands out one RecordingSink per round and keeps them for inspection.
#[derive(Clone, Default)]
pub struct RecordingProvider {
	pub sinks: Arc<Mutex<Vec<Arc<RecordingSink>>>>,
	probe: Option<Arc<ScriptedResolver>>,
	fail_writes: bool,
}

impl RecordingProvider {
	pub fn probing(resolver: Arc<ScriptedResolver>) -> Self {
		RecordingProvider {
			probe: Some(resolver),
			..Default::default()
		}
	}

	pub fn failing() -> Self {
		RecordingProvider {
			fail_writes: true,
			..Default::default()
		}
	}

	pub fn round(&self, index: usize) -> Arc<RecordingSink> {
		self.sinks.lock().unwrap()[index].clone()
	}
}

impl SinkProvider for RecordingProvider {
	fn open(&mut self, _round: u32) -> Result<Option<Arc<dyn RecordSink>>, SinkError> {
		let sink = Arc::new(RecordingSink {
			probe: self.probe.clone(),
			fail_writes: self.fail_writes,
			..Default::default()
		});
		self.sinks.lock().unwrap().push(sink.clone());
		let sink: Arc<dyn RecordSink> = sink;
		Ok(Some(sink))
	}
}

/// Build a context over an in-memory configuration.
pub fn context(
	domains: &[&str],
	servers: &[&str],
	test_count: u32,
	concurrency: usize,
	test_rounds: u32,
	resolver: Arc<dyn Resolve>,
) -> Arc<BenchContext> {
	let config = Config {
		domains: domains.iter().map(|s| s.to_string()).collect(),
		servers: servers.iter().map(|s| s.to_string()).collect(),
		test_count,
		query_interval: Duration::ZERO,
		concurrency,
		log_to_file: false,
		save_csv: true,
		test_rounds,
		timeout: Duration::from_secs(5),
		record_type: QueryType::A,
		log_file: PathBuf::from("dns_test.log"),
		csv_dir: PathBuf::from("./dns_test_results"),
	};
	BenchContext::new(config, resolver)
}
