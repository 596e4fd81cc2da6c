use std::time::Duration;

/// Latency summary for one work item, in milliseconds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencySummary {
	pub min_ms: f64,
	pub p50_ms: f64,
	pub max_ms: f64,
	pub stddev_ms: f64,
}

/// Calculate the arithmetic mean of a list of durations.
///
/// Returns None for an empty list instead of dividing by zero.
pub fn mean_duration(values: &[Duration]) -> Option<Duration> {
	if values.is_empty() {
		return None;
	}
	let total: Duration = values.iter().sum();
	Some(total / values.len() as u32)
}

/// Calculate the p-th percentile from a sorted slice using nearest-rank method.
///
/// Args:
///   sorted_values: Pre-sorted slice of f64 values.
///   p: Percentile between 0.0 and 100.0 (e.g. 50.0 for median).
///
/// Returns:
///   None if the slice is empty, otherwise the percentile value.
pub fn percentile(sorted_values: &[f64], p: f64) -> Option<f64> {
	if sorted_values.is_empty() {
		return None;
	}
	if sorted_values.len() == 1 {
		return Some(sorted_values[0]);
	}
	// Nearest-rank: rank = ceil(p/100 * N)
	let n = sorted_values.len();
	let rank = ((p / 100.0) * n as f64).ceil() as usize;
	let rank = rank.clamp(1, n);
	Some(sorted_values[rank - 1])
}

/// Calculate the arithmetic mean of a slice of values.
pub fn mean(values: &[f64]) -> Option<f64> {
	if values.is_empty() {
		return None;
	}
	let sum: f64 = values.iter().sum();
	Some(sum / values.len() as f64)
}

/// Calculate the population standard deviation of a slice of values.
pub fn stddev(values: &[f64]) -> Option<f64> {
	let avg = mean(values)?;
	let variance = values.iter()
		.map(|v| (v - avg).powi(2))
		.sum::<f64>() / values.len() as f64;
	Some(variance.sqrt())
}

/// Summarize latencies (in milliseconds). None when there are no values.
pub fn summarize(latencies_ms: &[f64]) -> Option<LatencySummary> {
	let mut sorted = latencies_ms.to_vec();
	sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

	Some(LatencySummary {
		min_ms: *sorted.first()?,
		p50_ms: percentile(&sorted, 50.0)?,
		max_ms: *sorted.last()?,
		stddev_ms: stddev(&sorted)?,
	})
}
