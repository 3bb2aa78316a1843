// src/lib.rs

pub mod beats;
pub mod config;
pub mod editor;
pub mod map;
pub mod render;
pub mod source;
pub mod viewport;
pub mod waveform;

pub use beats::{BeatGrid, BeatLine};
pub use config::EditorConfig;
pub use editor::{Pass, Refresh, WaveformEditor};
pub use map::SongMap;
pub use render::{RenderSink, StagingSink, WaveformUpdate};
pub use source::{load_clip, MemoryClip, SampleSource};
pub use viewport::{SampleRange, TimeWindow, Viewport, ViewportSnapshot};
pub use waveform::{downsample, Bar, Downsampler, WaveformBuffer}; // convenience
