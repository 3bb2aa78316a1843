// src/render.rs

use crate::viewport::TimeWindow;
use crate::waveform::{Bar, WaveformBuffer};

/// A freshly built waveform together with the time span it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformUpdate {
    pub buffer: WaveformBuffer,
    pub window: TimeWindow,
}

impl WaveformUpdate {
    pub fn bar_count(&self) -> usize {
        self.buffer.len()
    }

    /// 4 floats per bar, ready for upload.
    pub fn as_flat(&self) -> &[f32] {
        self.buffer.as_flat()
    }
}

/// Whatever draws the bars. It owns the render-side resource: each update
/// replaces the whole previous contents, and `release` drops it.
pub trait RenderSink {
    fn update(&mut self, update: WaveformUpdate);

    fn release(&mut self);
}

/// CPU-side stand-in for a GPU structured buffer of `bar_count` float4s.
#[derive(Debug)]
pub struct StagingBuffer {
    data: Vec<f32>,
    bar_count: usize,
}

impl StagingBuffer {
    fn allocate(bar_count: usize) -> Self {
        Self {
            data: vec![0.0; bar_count * Bar::FLOATS],
            bar_count,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }

    pub fn bars(&self) -> &[Bar] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Keeps at most one live staging buffer. A different bar count releases
/// the old buffer before creating the new one.
#[derive(Debug, Default)]
pub struct StagingSink {
    buffer: Option<StagingBuffer>,
    window: TimeWindow,
    allocations: u64,
    uploads: u64,
}

impl StagingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> Option<&StagingBuffer> {
        self.buffer.as_ref()
    }

    pub fn bars(&self) -> &[Bar] {
        self.buffer.as_ref().map(StagingBuffer::bars).unwrap_or(&[])
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Buffers created over the sink's lifetime.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

impl RenderSink for StagingSink {
    fn update(&mut self, update: WaveformUpdate) {
        let bar_count = update.bar_count();
        if bar_count == 0 {
            self.release();
            return;
        }

        if self.buffer.as_ref().map(StagingBuffer::bar_count) != Some(bar_count) {
            self.release();
            log::debug!("[Staging] allocating buffer for {bar_count} bars");
            self.allocations += 1;
        }
        let buffer = self
            .buffer
            .get_or_insert_with(|| StagingBuffer::allocate(bar_count));

        buffer.data.copy_from_slice(update.as_flat());
        self.window = update.window;
        self.uploads += 1;
    }

    fn release(&mut self) {
        if let Some(old) = self.buffer.take() {
            log::debug!("[Staging] releasing buffer of {} bars", old.bar_count);
        }
    }
}

impl Drop for StagingSink {
    fn drop(&mut self) {
        self.release();
    }
}
