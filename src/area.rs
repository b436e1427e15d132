//! Named areas and their message log buffers
//!
//! An area is a chat/session partition of the server. Each area keeps a
//! bounded in-memory scrollback of the messages spoken in it; the operator
//! console reads that buffer for `getlog`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::console::AreaRegistry;

/// Default number of log lines retained per area.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// A named area with a bounded, ordered log buffer.
///
/// The buffer drops its oldest line once capacity is reached. All methods
/// take `&self`; the buffer is locked internally so client-handling tasks
/// and the console can touch the same area.
pub struct Area {
    name: String,
    capacity: usize,
    buffer: Mutex<VecDeque<String>>,
}

impl Area {
    pub fn new(name: impl Into<String>) -> Area {
        Area::with_capacity(name, DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Area {
        Area {
            name: name.into(),
            capacity: capacity.max(1),
            buffer: Mutex::new(VecDeque::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a line to the log buffer verbatim.
    pub fn record(&self, line: impl Into<String>) {
        let mut buffer = self.buffer.lock().unwrap();
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(line.into());
    }

    /// Append a spoken message, stamped with the current UTC time.
    pub fn log_message(&self, speaker: &str, text: &str) {
        let stamp = Utc::now().format("%H:%M:%S");
        self.record(format!("[{stamp}] {speaker}: {text}"));
    }

    /// Snapshot of the log buffer, oldest line first.
    pub fn log_buffer(&self) -> Vec<String> {
        self.buffer.lock().unwrap().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().unwrap().is_empty()
    }
}

/// The fixed set of areas the server runs with.
///
/// Areas are created from configuration at startup and live for the whole
/// process; subsystems share them through `Arc`.
pub struct AreaRoster {
    areas: Vec<Arc<Area>>,
}

impl AreaRoster {
    pub fn from_names<I, S>(names: I, capacity: usize) -> AreaRoster
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AreaRoster {
            areas: names
                .into_iter()
                .map(|n| Arc::new(Area::with_capacity(n, capacity)))
                .collect(),
        }
    }

    /// Look up an area by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<Area>> {
        self.areas.iter().find(|a| a.name() == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl AreaRegistry for AreaRoster {
    fn areas(&self) -> Vec<Arc<Area>> {
        self.areas.clone()
    }
}
