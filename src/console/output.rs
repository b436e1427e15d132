//! Console output sink
//!
//! Everything the console says to the operator goes through [`OutputSink`].
//! The production sink forwards to the tracing pipeline; [`MemorySink`]
//! collects lines for tests and embedders that render console output
//! elsewhere.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Destination for user-facing console output.
///
/// Two entry points: [`info`](OutputSink::info) for a ready-made line and
/// [`info_fmt`](OutputSink::info_fmt) for formatted output. Every command
/// outcome produces exactly one call.
pub trait OutputSink: Send + Sync {
    fn info(&self, message: &str);

    fn info_fmt(&self, args: fmt::Arguments<'_>) {
        self.info(&args.to_string());
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    fn info(&self, message: &str) {
        (**self).info(message)
    }

    fn info_fmt(&self, args: fmt::Arguments<'_>) {
        (**self).info_fmt(args)
    }
}

/// Sink that writes console output to the tracing pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("[console] {message}");
    }
}

/// Sink that buffers output lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// Snapshot of everything emitted so far, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Drain the buffered lines.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap())
    }
}

impl OutputSink for MemorySink {
    fn info(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}
