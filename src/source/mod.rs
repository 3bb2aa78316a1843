// src/source/mod.rs

pub mod file;

use anyhow::{anyhow, Result};

pub use file::load_clip;

/// Decoded audio the waveform view reads from.
///
/// `decode` must return `frame_count * channels` interleaved samples, or fewer
/// when the request runs past the end of the data (a short read).
pub trait SampleSource {
    /// Frames per channel.
    fn total_frames(&self) -> u64;

    fn channels(&self) -> usize;

    fn sample_rate(&self) -> u32;

    fn duration_secs(&self) -> f64 {
        if self.sample_rate() == 0 {
            return 0.0;
        }
        self.total_frames() as f64 / self.sample_rate() as f64
    }

    fn decode(&self, frame_offset: u64, frame_count: u64) -> Vec<f32>;
}

/// A whole song held in memory as interleaved `f32`.
#[derive(Clone, Debug)]
pub struct MemoryClip {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl MemoryClip {
    pub fn new(mut samples: Vec<f32>, channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(anyhow!("clip must have at least one channel"));
        }
        if sample_rate == 0 {
            return Err(anyhow!("clip sample rate must be non-zero"));
        }
        let whole = samples.len() - samples.len() % channels;
        if whole != samples.len() {
            log::debug!(
                "[Clip] dropping {} trailing samples of a partial frame",
                samples.len() - whole
            );
            samples.truncate(whole);
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

impl SampleSource for MemoryClip {
    fn total_frames(&self) -> u64 {
        (self.samples.len() / self.channels) as u64
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn decode(&self, frame_offset: u64, frame_count: u64) -> Vec<f32> {
        let total = self.total_frames();
        let start = frame_offset.min(total);
        let end = frame_offset.saturating_add(frame_count).min(total);
        let ch = self.channels;
        self.samples[start as usize * ch..end as usize * ch].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_channelless_clip() {
        assert!(MemoryClip::new(vec![0.0; 4], 0, 44_100).is_err());
        assert!(MemoryClip::new(vec![0.0; 4], 2, 0).is_err());
    }

    #[test]
    fn partial_frame_is_truncated() {
        let clip = MemoryClip::new(vec![0.1, 0.2, 0.3], 2, 8).unwrap();
        assert_eq!(clip.total_frames(), 1);
        assert_eq!(clip.samples(), &[0.1, 0.2]);
    }

    #[test]
    fn decode_returns_interleaved_sub_range() {
        let clip = MemoryClip::new((0..12).map(|i| i as f32).collect(), 2, 4).unwrap();
        assert_eq!(clip.total_frames(), 6);
        assert_eq!(clip.duration_secs(), 1.5);
        assert_eq!(clip.decode(2, 2), vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn decode_past_end_is_a_short_read() {
        let clip = MemoryClip::new(vec![0.5; 10], 1, 10).unwrap();
        assert_eq!(clip.decode(8, 5).len(), 2);
        assert!(clip.decode(20, 5).is_empty());
        assert!(clip.decode(u64::MAX, u64::MAX).is_empty());
    }
}
