// src/viewport.rs

use serde::Serialize;

/// Half-open range of frames to decode for the visible window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SampleRange {
    pub frame_offset: u64,
    pub frame_count: u64,
}

impl SampleRange {
    pub fn end(&self) -> u64 {
        self.frame_offset + self.frame_count
    }
}

/// Absolute time bounds of the visible window, in seconds.
/// Overlays (beat grid, playback cursor) align to this, not to bar edges.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct TimeWindow {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl TimeWindow {
    pub fn length(&self) -> f64 {
        (self.end_secs - self.start_secs).max(0.0)
    }
}

/// Immutable copy of the viewport, compared against the last built one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportSnapshot {
    pub scroll: f64,
    pub zoom: f64,
    pub bar_count: usize,
}

/// What slice of the song is visible and at which bar resolution.
///
/// `scroll` is the fraction of the song where the window starts, `zoom` the
/// visible fraction of the song (smaller = further in). `scroll + zoom` may
/// exceed 1; the overflow is cut from the right edge when the sample range is
/// derived.
#[derive(Clone, Debug)]
pub struct Viewport {
    scroll: f64,
    zoom: f64,
    bar_count: usize,
    dirty: bool,
}

impl Viewport {
    pub fn new(initial_zoom: f64) -> Self {
        let zoom = if initial_zoom.is_finite() {
            initial_zoom.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            scroll: 0.0,
            zoom,
            bar_count: 0,
            // Nothing has been built for this session yet.
            dirty: true,
        }
    }

    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn snapshot(&self) -> ViewportSnapshot {
        ViewportSnapshot {
            scroll: self.scroll,
            zoom: self.zoom,
            bar_count: self.bar_count,
        }
    }

    /// Adds `delta` to the zoom fraction and clamps it to `[min_zoom, max_zoom]`.
    /// Returns true when the value changed.
    pub fn set_zoom(&mut self, delta: f64, min_zoom: f64, max_zoom: f64) -> bool {
        if !delta.is_finite() || !min_zoom.is_finite() || !max_zoom.is_finite() {
            return false;
        }
        let (lo, hi) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        let next = (self.zoom + delta).clamp(lo, hi);
        if next == self.zoom {
            return false;
        }
        self.zoom = next;
        self.dirty = true;
        true
    }

    /// Moves the left edge of the window. Clamped to `[0, 1]`.
    pub fn set_scroll(&mut self, position: f64) -> bool {
        if !position.is_finite() {
            return false;
        }
        let next = position.clamp(0.0, 1.0);
        if next == self.scroll {
            return false;
        }
        self.scroll = next;
        self.dirty = true;
        true
    }

    pub fn set_bar_count(&mut self, bar_count: usize) -> bool {
        if self.bar_count == bar_count {
            return false;
        }
        self.bar_count = bar_count;
        self.dirty = true;
        true
    }

    /// Zoom actually covered by song data once the right edge is cut at the end.
    pub fn effective_zoom(&self) -> f64 {
        self.zoom.min(1.0 - self.scroll).max(0.0)
    }

    /// Frames to decode for the current window.
    ///
    /// The offset is rounded up to an even frame so buckets always start on a
    /// channel pair boundary. If the window would run past the end, the count
    /// shrinks and the offset stays put.
    pub fn visible_sample_range(&self, total_frames: u64) -> SampleRange {
        if total_frames == 0 {
            return SampleRange::default();
        }
        let total = total_frames as f64;

        let mut frame_offset = (self.scroll * total).floor() as u64;
        if frame_offset % 2 != 0 {
            frame_offset += 1;
        }
        let frame_offset = frame_offset.min(total_frames);

        let wanted = (self.zoom * total).floor() as u64;
        let frame_count = wanted.min(total_frames - frame_offset);

        SampleRange {
            frame_offset,
            frame_count,
        }
    }

    pub fn time_window(&self, duration_secs: f64) -> TimeWindow {
        let duration = duration_secs.max(0.0);
        TimeWindow {
            start_secs: self.scroll * duration,
            end_secs: (self.scroll + self.effective_zoom()) * duration,
        }
    }

    /// Seconds covered by the zoom level, regardless of where the window sits.
    pub fn visible_seconds(&self, duration_secs: f64) -> f64 {
        self.zoom * duration_secs.max(0.0)
    }
}
