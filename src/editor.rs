// src/editor.rs

use crate::beats::{BeatGrid, BeatLine};
use crate::config::EditorConfig;
use crate::render::{RenderSink, WaveformUpdate};
use crate::source::SampleSource;
use crate::viewport::{TimeWindow, Viewport, ViewportSnapshot};
use crate::waveform::{to_stereo, Bucketing, Downsampler};

/// Kind of host pass the refresh runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Input/layout pass: state may have changed.
    Update,
    /// Pure redraw of what is already there.
    Repaint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    /// The sink received a new buffer with this many bars.
    Rebuilt { bars: usize },
    /// Last build still matches the viewport and source.
    UpToDate,
    /// Nothing could or should be built yet (repaint pass, no song, no width).
    Deferred,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BuildKey {
    viewport: ViewportSnapshot,
    source_generation: u64,
}

/// Caches the waveform for one editing session and rebuilds it only when
/// the viewport or the song changes.
pub struct WaveformEditor {
    config: EditorConfig,
    viewport: Viewport,
    downsampler: Downsampler,
    source: Option<Box<dyn SampleSource>>,
    source_generation: u64,
    last_built: Option<BuildKey>,
}

impl WaveformEditor {
    pub fn new(config: EditorConfig) -> Self {
        let (lo, hi) = config.zoom_bounds();
        let viewport = Viewport::new(config.initial_zoom.clamp(lo, hi));
        let downsampler = Downsampler::new(config.frame_budget);
        Self {
            config,
            viewport,
            downsampler,
            source: None,
            source_generation: 0,
            last_built: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_dirty(&self) -> bool {
        self.viewport.is_dirty() || self.last_built != Some(self.build_key())
    }

    /// Swaps the song. Removing it also frees the sink's buffer.
    pub fn set_source(
        &mut self,
        source: Option<Box<dyn SampleSource>>,
        sink: &mut dyn RenderSink,
    ) {
        if source.is_none() {
            sink.release();
        }
        self.source = source;
        self.source_generation += 1;
        self.last_built = None;
        self.viewport.mark_dirty();
    }

    pub fn scroll_to(&mut self, position: f64) -> bool {
        self.viewport.set_scroll(position)
    }

    /// Applies mouse-wheel style zoom. `fine` uses the smaller step.
    pub fn zoom_by(&mut self, wheel_delta: f64, fine: bool) -> bool {
        let step = if fine {
            self.config.fine_zoom_step
        } else {
            self.config.zoom_step
        };
        let (lo, hi) = self.config.zoom_bounds();
        self.viewport.set_zoom(wheel_delta * step, lo, hi)
    }

    /// New display width. Widths of a pixel or less mean "not laid out yet"
    /// and are ignored.
    pub fn resize(&mut self, width_px: f32) -> bool {
        if !width_px.is_finite() || width_px <= 1.0 {
            return false;
        }
        let bars = (width_px / self.config.bar_width()).floor() as usize;
        self.viewport.set_bar_count(bars)
    }

    pub fn time_window(&self) -> TimeWindow {
        let duration = self.source.as_ref().map_or(0.0, |s| s.duration_secs());
        self.viewport.time_window(duration)
    }

    /// Seconds shown at the current zoom.
    pub fn visible_seconds(&self) -> f64 {
        let duration = self.source.as_ref().map_or(0.0, |s| s.duration_secs());
        self.viewport.visible_seconds(duration)
    }

    /// Beats in the visible window. A grid denser than one beat per bar
    /// cannot be drawn and yields nothing.
    pub fn beat_lines(&self, grid: &BeatGrid) -> Vec<BeatLine> {
        if self.source.is_none() {
            return Vec::new();
        }
        grid.lines_in(self.time_window(), self.viewport.bar_count())
    }

    /// Bar that holds the song time `time_secs` in the current window.
    pub fn bar_for_time(&self, time_secs: f64) -> Option<usize> {
        let source = self.source.as_deref()?;
        let range = self.viewport.visible_sample_range(source.total_frames());
        let frame = (time_secs * source.sample_rate() as f64).round();
        let start = range.frame_offset as f64;
        // the offset may sit one frame past the window start after alignment
        if !frame.is_finite() || frame + 1.0 < start {
            return None;
        }
        let relative = (frame - start).max(0.0) as usize;
        Bucketing::new(range.frame_count as usize, self.viewport.bar_count()).bar_for_frame(relative)
    }

    /// Rebuilds the waveform if needed and hands it to `sink`.
    pub fn refresh(&mut self, pass: Pass, sink: &mut dyn RenderSink) -> Refresh {
        if pass == Pass::Repaint {
            return Refresh::Deferred;
        }
        if !self.is_dirty() {
            return Refresh::UpToDate;
        }
        let Some(source) = self.source.as_deref() else {
            return Refresh::Deferred;
        };
        let bar_count = self.viewport.bar_count();
        if bar_count == 0 {
            return Refresh::Deferred;
        }

        let range = self.viewport.visible_sample_range(source.total_frames());
        let raw = source.decode(range.frame_offset, range.frame_count);
        let channels = source.channels();
        let expected = range.frame_count as usize * channels;
        if raw.len() < expected {
            log::warn!(
                "[Waveform] short read: {} of {} samples at frame {}",
                raw.len(),
                expected,
                range.frame_offset
            );
        }

        let stereo = to_stereo(&raw, channels);
        let buffer = self
            .downsampler
            .run(&stereo, range.frame_count as usize, bar_count);
        let window = self.viewport.time_window(source.duration_secs());

        log::debug!(
            "[Waveform] rebuilt {} bars from {} frames at {} ({:.3}s..{:.3}s)",
            bar_count,
            range.frame_count,
            range.frame_offset,
            window.start_secs,
            window.end_secs
        );

        sink.update(WaveformUpdate { buffer, window });
        self.last_built = Some(self.build_key());
        self.viewport.mark_clean();
        Refresh::Rebuilt { bars: bar_count }
    }

    fn build_key(&self) -> BuildKey {
        BuildKey {
            viewport: self.viewport.snapshot(),
            source_generation: self.source_generation,
        }
    }
}
