use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, Mutex};

use crate::bench::BenchContext;
use crate::sampler::SampleRunner;
use crate::sink::RecordSink;
use crate::work::{AggregateResult, PairSummary, WorkItem};

/// Bounded, close-once queue of one round's work items.
///
/// The queue is filled completely and its sending side dropped before any
/// worker starts, so a worker that sees `None` knows the round's work is
/// exhausted. Dequeue goes through a mutex so each item reaches exactly
/// one worker.
pub struct WorkQueue {
	rx: Mutex<mpsc::Receiver<WorkItem>>,
	len: usize,
}

impl WorkQueue {
	pub async fn populate(items: Vec<WorkItem>) -> Self {
		let len = items.len();
		let (tx, rx) = mpsc::channel(len.max(1));
		for item in items {
			// Capacity covers every item and rx is alive, so this neither
			// waits nor fails
			if tx.send(item).await.is_err() {
				break;
			}
		}
		WorkQueue {
			rx: Mutex::new(rx),
			len,
		}
	}

	/// Next item, or None once the queue is drained.
	pub async fn next(&self) -> Option<WorkItem> {
		self.rx.lock().await.recv().await
	}

	pub fn len(&self) -> usize {
		self.len
	}
}

/// What one worker did during a round
#[derive(Debug)]
pub struct WorkerReport {
	pub worker: usize,
	pub results: Vec<PairSummary>,
}

/// Fixed number of workers draining a shared WorkQueue
pub struct WorkerPool {
	ctx: Arc<BenchContext>,
}

impl WorkerPool {
	pub fn new(ctx: Arc<BenchContext>) -> Self {
		WorkerPool { ctx }
	}

	/// Spawn `concurrency` workers over `queue` and wait for all of them.
	///
	/// Returns only after every worker has exited, so no sample for this
	/// queue is written to `sink` after the call completes.
	pub async fn drain(
		&self,
		queue: Arc<WorkQueue>,
		sink: Option<Arc<dyn RecordSink>>,
	) -> Vec<WorkerReport> {
		let workers = self.ctx.config.concurrency;
		debug!("starting {} workers for {} items", workers, queue.len());

		let mut handles = Vec::with_capacity(workers);
		for worker in 0..workers {
			let queue = queue.clone();
			let sink = sink.clone();
			let runner = SampleRunner::new(&self.ctx);
			handles.push(tokio::spawn(async move {
				run_worker(worker, &queue, &runner, sink.as_deref()).await
			}));
		}

		let mut reports = Vec::with_capacity(workers);
		for handle in handles {
			match handle.await {
				Ok(report) => {
					debug!("worker {} processed {} items", report.worker, report.results.len());
					reports.push(report);
				}
				Err(e) => error!("worker task failed: {}", e),
			}
		}
		reports
	}
}

async fn run_worker(
	worker: usize,
	queue: &WorkQueue,
	runner: &SampleRunner,
	sink: Option<&dyn RecordSink>,
) -> WorkerReport {
	let mut results = Vec::new();

	while let Some(item) = queue.next().await {
		let aggregate = runner.run(&item).await;
		match aggregate.average {
			Some(average) => info!(
				"{} average latency: {:.2}ms ({}/{} samples, {} failed)",
				item,
				average.as_secs_f64() * 1000.0,
				aggregate.succeeded(),
				aggregate.attempted,
				aggregate.failed(),
			),
			None => warn!(
				"{} average latency: no data ({}/{} samples failed)",
				item, aggregate.failed(), aggregate.attempted,
			),
		}

		if let Some(sink) = sink {
			persist(sink, &aggregate);
		}
		// Samples are not kept past the sink write
		results.push(aggregate.into_summary());
	}

	WorkerReport { worker, results }
}

/// Write every successful sample; a failed write is logged and skipped.
fn persist(sink: &dyn RecordSink, aggregate: &AggregateResult) {
	for (index, sample) in aggregate.samples.iter().enumerate() {
		if let Err(e) = sink.write(sample) {
			error!(
				"{} failed to persist sample {} of {}: {}",
				aggregate.item, index + 1, aggregate.samples.len(), e,
			);
		}
	}
}
