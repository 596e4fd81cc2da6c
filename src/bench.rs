use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::output;
use crate::pool::{WorkQueue, WorkerPool};
use crate::resolver::Resolve;
use crate::sink::SinkProvider;
use crate::work::{build_matrix, PairSummary};

/// Shared state handed to every component of a benchmark run.
///
/// The configuration is read-only for the whole run.
pub struct BenchContext {
	pub config: Config,
	pub resolver: Arc<dyn Resolve>,
	/// Guards the round-completion output
	round_lock: Mutex<()>,
}

impl BenchContext {
	pub fn new(config: Config, resolver: Arc<dyn Resolve>) -> Arc<Self> {
		Arc::new(BenchContext {
			config,
			resolver,
			round_lock: Mutex::new(()),
		})
	}
}

/// Lifecycle of a single round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
	Idle,
	Populating,
	Draining,
	Barrier,
	Complete,
}

/// Outcome of one completed round
#[derive(Debug)]
pub struct RoundSummary {
	pub round: u32,
	/// One entry per work item, sorted by domain then server
	pub results: Vec<PairSummary>,
	pub elapsed: Duration,
}

/// Runs rounds one after another; a round ends only when all of its
/// workers have returned and its sink has been flushed.
pub struct RoundOrchestrator {
	ctx: Arc<BenchContext>,
	sinks: Box<dyn SinkProvider>,
	phase: RoundPhase,
	show_table: bool,
}

impl RoundOrchestrator {
	pub fn new(ctx: Arc<BenchContext>, sinks: Box<dyn SinkProvider>) -> Self {
		RoundOrchestrator {
			ctx,
			sinks,
			phase: RoundPhase::Idle,
			show_table: false,
		}
	}

	/// Print a summary table after each round.
	pub fn with_summary_table(mut self, show: bool) -> Self {
		self.show_table = show;
		self
	}

	#[cfg(test)]
	pub fn phase(&self) -> RoundPhase {
		self.phase
	}

	fn enter(&mut self, round: u32, next: RoundPhase) {
		debug!("round {}: {:?} -> {:?}", round, self.phase, next);
		self.phase = next;
	}

	/// Run all configured rounds in order.
	pub async fn run(&mut self) -> Vec<RoundSummary> {
		let rounds = self.ctx.config.test_rounds;
		let mut summaries = Vec::with_capacity(rounds as usize);
		for round in 1..=rounds {
			info!("starting round {}/{}", round, rounds);
			summaries.push(self.run_round(round).await);
		}
		summaries
	}

	/// Measure the whole domain x server matrix once.
	pub async fn run_round(&mut self, round: u32) -> RoundSummary {
		let started = Instant::now();

		self.enter(round, RoundPhase::Populating);
		let sink = match self.sinks.open(round) {
			Ok(sink) => sink,
			Err(e) => {
				error!("round {}: could not open result sink, samples will not be persisted: {}", round, e);
				None
			}
		};
		let matrix = build_matrix(&self.ctx.config.domains, &self.ctx.config.servers);
		let queue = Arc::new(WorkQueue::populate(matrix).await);

		self.enter(round, RoundPhase::Draining);
		let reports = WorkerPool::new(self.ctx.clone())
			.drain(queue, sink.clone())
			.await;

		// Every worker has returned; nothing else can write to this sink
		self.enter(round, RoundPhase::Barrier);
		if let Some(sink) = sink {
			if let Err(e) = sink.finish() {
				error!("round {}: failed to flush result sink: {}", round, e);
			}
		}

		let mut results: Vec<PairSummary> = reports
			.into_iter()
			.flat_map(|report| report.results)
			.collect();
		results.sort_by(|a, b| {
			(&a.item.domain, &a.item.server).cmp(&(&b.item.domain, &b.item.server))
		});
		let elapsed = started.elapsed();

		{
			let _guard = self.ctx.round_lock.lock().await;
			info!("round {} complete: {} items in {:.2?}", round, results.len(), elapsed);
			if self.show_table {
				output::print_round_table(round, &results);
			}
		}

		self.enter(round, RoundPhase::Complete);
		RoundSummary {
			round,
			results,
			elapsed,
		}
	}
}
