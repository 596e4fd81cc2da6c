use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Local, SecondsFormat};
use log::info;

use crate::error::SinkError;
use crate::work::SampleResult;

/// Column names of the per-sample CSV files
pub const CSV_HEADER: [&str; 4] = ["domain", "dns_server", "timestamp", "latency_ms"];

/// Append-only destination for successful samples.
///
/// Implementations are shared by all workers of a round and must keep each
/// record write atomic with respect to the others.
pub trait RecordSink: Send + Sync {
	fn write(&self, sample: &SampleResult) -> Result<(), SinkError>;

	/// Flush buffered records. Called once per round after every worker
	/// has returned.
	fn finish(&self) -> Result<(), SinkError>;
}

/// Opens the record sink for each round.
pub trait SinkProvider: Send {
	/// Returns None when persistence is disabled.
	fn open(&mut self, round: u32) -> Result<Option<Arc<dyn RecordSink>>, SinkError>;
}

/// Format a latency as decimal milliseconds using the shortest exact form
/// ("10", "20.5", "0.123456").
pub fn format_latency_ms(latency: Duration) -> String {
	let ms = latency.as_nanos() as f64 / 1_000_000.0;
	format!("{}", ms)
}

/// Render one sample as a CSV row.
pub fn sample_record(sample: &SampleResult) -> [String; 4] {
	[
		sample.domain.clone(),
		sample.server.clone(),
		sample.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
		format_latency_ms(sample.latency),
	]
}

/// CSV record sink; a mutex around the writer serializes concurrent rows
pub struct CsvSink<W: Write> {
	writer: Mutex<csv::Writer<W>>,
}

impl<W: Write> CsvSink<W> {
	/// Wrap `inner` and write the header row.
	pub fn new(inner: W) -> Result<Self, SinkError> {
		let mut writer = csv::Writer::from_writer(inner);
		writer.write_record(CSV_HEADER)?;
		Ok(CsvSink {
			writer: Mutex::new(writer),
		})
	}
}

impl<W: Write + Send> RecordSink for CsvSink<W> {
	fn write(&self, sample: &SampleResult) -> Result<(), SinkError> {
		let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
		writer.write_record(sample_record(sample))?;
		Ok(())
	}

	fn finish(&self) -> Result<(), SinkError> {
		let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
		writer.flush()?;
		Ok(())
	}
}

/// Creates a fresh timestamped CSV file in `dir` for every round
pub struct CsvSinkProvider {
	dir: PathBuf,
}

impl CsvSinkProvider {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		CsvSinkProvider { dir: dir.into() }
	}
}

impl SinkProvider for CsvSinkProvider {
	fn open(&mut self, round: u32) -> Result<Option<Arc<dyn RecordSink>>, SinkError> {
		fs::create_dir_all(&self.dir)?;
		let name = format!(
			"dns_test_{}_round{}.csv",
			Local::now().format("%Y-%m-%d_%H-%M-%S"),
			round,
		);
		let path = self.dir.join(name);
		let file = File::create(&path)?;
		info!("round {} samples will be written to {}", round, path.display());
		let sink: Arc<dyn RecordSink> = Arc::new(CsvSink::new(file)?);
		Ok(Some(sink))
	}
}

/// Provider used when CSV persistence is turned off
pub struct NullSinkProvider;

impl SinkProvider for NullSinkProvider {
	fn open(&mut self, _round: u32) -> Result<Option<Arc<dyn RecordSink>>, SinkError> {
		Ok(None)
	}
}
