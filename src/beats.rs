// src/beats.rs

use crate::viewport::TimeWindow;
use serde::{Deserialize, Serialize};

/// One beat marker inside the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BeatLine {
    /// Exact time of the beat in seconds.
    pub time_secs: f64,
    /// 0-based beat number from the start of the song.
    pub beat_index: u64,
    pub is_bar_start: bool,
}

/// Constant-tempo beat grid anchored at t = 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeatGrid {
    pub bpm: f64,
    pub beats_per_bar: u32,
}

impl Default for BeatGrid {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            beats_per_bar: 4,
        }
    }
}

impl BeatGrid {
    pub fn new(bpm: f64, beats_per_bar: u32) -> Self {
        Self { bpm, beats_per_bar }
    }

    /// `None` when the tempo is not usable (zero, negative, NaN).
    pub fn seconds_per_beat(&self) -> Option<f64> {
        if self.bpm.is_finite() && self.bpm > 0.0 {
            Some(60.0 / self.bpm)
        } else {
            None
        }
    }

    /// Beats needed to cover the window's length.
    pub fn visible_beat_count(&self, window: TimeWindow) -> u64 {
        match self.seconds_per_beat() {
            Some(_) => (window.length() * self.bpm / 60.0).ceil() as u64,
            None => 0,
        }
    }

    /// Every beat with `start <= time <= end`, or nothing when the window
    /// holds more than `max_lines` beats.
    pub fn lines_in(&self, window: TimeWindow, max_lines: usize) -> Vec<BeatLine> {
        let Some(spb) = self.seconds_per_beat() else {
            return Vec::new();
        };
        if window.end_secs < window.start_secs
            || self.visible_beat_count(window) > max_lines as u64
        {
            return Vec::new();
        }

        // Step by integer index so there is no float drift across long songs.
        let mut index = (window.start_secs.max(0.0) / spb).ceil() as u64;
        let mut lines = Vec::new();
        loop {
            let time = index as f64 * spb;
            if time > window.end_secs + 1e-9 {
                break;
            }
            let is_bar_start = self.beats_per_bar <= 1 || index % self.beats_per_bar as u64 == 0;
            lines.push(BeatLine {
                time_secs: time,
                beat_index: index,
                is_bar_start,
            });
            index += 1;
        }
        lines
    }
}
