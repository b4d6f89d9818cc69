//! Frame-time recording.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::{Duration, Instant};

/// Frame times of one run: seconds since start and seconds since the
/// previous frame.
pub struct FramerateLog {
    start: Instant,
    last: Instant,
    samples: Vec<(f64, f64)>,
}

impl FramerateLog {
    pub fn start(expected_frames: usize) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            samples: Vec::with_capacity(expected_frames),
        }
    }

    /// Record the end of a frame.
    pub fn frame_done(&mut self) {
        let now = Instant::now();
        self.push(now - self.start, now - self.last);
        self.last = now;
    }

    fn push(&mut self, elapsed: Duration, delta: Duration) {
        self.samples.push((elapsed.as_secs_f64(), delta.as_secs_f64()));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn total_seconds(&self) -> f64 {
        self.samples.last().map_or(0.0, |(elapsed, _)| *elapsed)
    }

    pub fn average_fps(&self) -> f64 {
        let total = self.total_seconds();
        if total > 0.0 { self.samples.len() as f64 / total } else { 0.0 }
    }

    /// One `elapsed\tdelta` line per frame.
    pub fn to_text(&self) -> String {
        self.samples
            .iter()
            .map(|(elapsed, delta)| format!("{}\t{}\n", elapsed, delta))
            .collect()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_text())
            .with_context(|| format!("Failed to write framerate file: {}", path.display()))
    }
}
