use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{info, warn};

use crate::bench::BenchContext;
use crate::resolver::Resolve;
use crate::stats::mean_duration;
use crate::work::{AggregateResult, SampleResult, WorkItem};

/// Takes the configured number of sequential samples for one work item.
///
/// Samples of a single item never overlap. A failed sample is logged and
/// dropped from the average; it never aborts the item.
pub struct SampleRunner {
	resolver: Arc<dyn Resolve>,
	count: u32,
	interval: Duration,
}

impl SampleRunner {
	pub fn new(ctx: &BenchContext) -> Self {
		SampleRunner {
			resolver: ctx.resolver.clone(),
			count: ctx.config.test_count,
			interval: ctx.config.query_interval,
		}
	}

	pub async fn run(&self, item: &WorkItem) -> AggregateResult {
		let mut samples = Vec::with_capacity(self.count as usize);

		for index in 1..=self.count {
			match self.resolver.resolve(&item.domain, &item.server).await {
				Ok(latency) => {
					info!("{} sample {:<2} latency: {:?}", item, index, latency);
					samples.push(SampleResult {
						domain: item.domain.clone(),
						server: item.server.clone(),
						timestamp: Local::now(),
						latency,
					});
					if index < self.count && !self.interval.is_zero() {
						tokio::time::sleep(self.interval).await;
					}
				}
				Err(e) => {
					warn!("{} sample {:<2} lookup failed: {}", item, index, e);
				}
			}
		}

		let latencies: Vec<Duration> = samples.iter().map(|s| s.latency).collect();
		AggregateResult {
			item: item.clone(),
			average: mean_duration(&latencies),
			samples,
			attempted: self.count,
		}
	}
}
