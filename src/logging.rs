use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Env, Target};

/// Duplicates every write to two destinations.
struct Tee<A, B> {
	primary: A,
	secondary: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.primary.write_all(buf)?;
		self.secondary.write_all(buf)?;
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		self.primary.flush()?;
		self.secondary.flush()
	}
}

/// Install the global logger.
///
/// Records go to stdout, and are also appended to `log_file` when given.
/// `RUST_LOG` overrides the default filter. env_logger formats each record
/// in full before writing it, so lines from concurrent workers never mix.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
	let default_filter = if verbose {
		"info,dns_latency_bench=debug"
	} else {
		"info"
	};
	let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter));
	builder.format_timestamp_micros();

	match log_file {
		Some(path) => {
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(path)
				.with_context(|| format!("failed to open log file '{}'", path.display()))?;
			builder.target(Target::Pipe(Box::new(Tee {
				primary: io::stdout(),
				secondary: file,
			})));
		}
		None => {
			builder.target(Target::Stdout);
		}
	}

	builder.try_init().context("failed to install logger")?;
	Ok(())
}
