// src/waveform/mod.rs
pub mod terminal;

use std::borrow::Cow;
use std::ops::Range;

/// One display column: the largest positive and most negative excursion per
/// channel. Laid out as `x = L+, y = L-, z = R+, w = R-` for GPU upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Bar {
    pub left_pos: f32,
    pub left_neg: f32,
    pub right_pos: f32,
    pub right_neg: f32,
}

impl Bar {
    pub const FLOATS: usize = 4;

    #[inline]
    fn accumulate(&mut self, left: f32, right: f32) {
        self.left_pos = self.left_pos.max(left.max(0.0));
        self.left_neg = self.left_neg.min(left.min(0.0));
        self.right_pos = self.right_pos.max(right.max(0.0));
        self.right_neg = self.right_neg.min(right.min(0.0));
    }

    pub fn is_silent(&self) -> bool {
        *self == Bar::default()
    }
}

/// Ordered bars for one rebuild. Index is the x axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveformBuffer {
    bars: Vec<Bar>,
}

impl WaveformBuffer {
    pub fn zeroed(bar_count: usize) -> Self {
        Self {
            bars: vec![Bar::default(); bar_count],
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Flat view, 4 floats per bar.
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.bars)
    }
}

/// How a requested frame range is split into bars.
///
/// Every bar owns the same whole number of frames, except the tail which gets
/// whatever is left (possibly nothing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bucketing {
    samples_per_bar: usize,
    sample_len: usize,
    bar_count: usize,
}

impl Bucketing {
    pub fn new(frame_count: usize, bar_count: usize) -> Self {
        let samples_per_bar = if bar_count == 0 {
            0
        } else {
            // Rounded to whole frames so each bar starts on a left sample.
            frame_count.div_ceil(bar_count) * 2
        };
        Self {
            samples_per_bar,
            sample_len: frame_count * 2,
            bar_count,
        }
    }

    pub fn samples_per_bar(&self) -> usize {
        self.samples_per_bar
    }

    /// Bar holding `frame` (relative to the range start). A frame exactly at
    /// the end maps to the last filled bar; the tail bars of a ceil split can
    /// stay empty, so this is not `frame / frames * bar_count`.
    pub fn bar_for_frame(&self, frame: usize) -> Option<usize> {
        let frames = self.sample_len / 2;
        if self.samples_per_bar == 0 || frame > frames {
            return None;
        }
        let bar = frame.min(frames - 1) * 2 / self.samples_per_bar;
        (bar < self.bar_count).then_some(bar)
    }

    /// Interleaved sample indices owned by `bar`.
    pub fn range(&self, bar: usize) -> Range<usize> {
        let start = (bar * self.samples_per_bar).min(self.sample_len);
        let end = ((bar + 1) * self.samples_per_bar).min(self.sample_len);
        start..end
    }
}

/// Peak-envelope extraction for interleaved stereo.
///
/// With a `frame_budget`, ranges much longer than the budget are scanned
/// every `frame_count / frame_budget` frames instead of every frame. That can
/// miss short transients inside a bar; it is an approximation, not an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Downsampler {
    pub frame_budget: Option<usize>,
}

impl Downsampler {
    pub fn new(frame_budget: Option<usize>) -> Self {
        Self { frame_budget }
    }

    pub fn stride(&self, frame_count: usize) -> usize {
        match self.frame_budget {
            Some(budget) if budget > 0 => (frame_count / budget).max(1),
            _ => 1,
        }
    }

    /// Reduces `samples` (interleaved L/R) into `bar_count` bars.
    ///
    /// Bucket sizes come from `frame_count`, the number of frames that was
    /// asked for. If fewer samples arrived, the scan stops at the data and
    /// the bars past it stay zero.
    pub fn run(&self, samples: &[f32], frame_count: usize, bar_count: usize) -> WaveformBuffer {
        let mut buffer = WaveformBuffer::zeroed(bar_count);
        if bar_count == 0 || frame_count == 0 {
            return buffer;
        }

        let bucketing = Bucketing::new(frame_count, bar_count);
        // whole frames only
        let available = samples.len() & !1;
        let step = self.stride(frame_count) * 2;

        for (index, bar) in buffer.bars.iter_mut().enumerate() {
            let range = bucketing.range(index);
            let end = range.end.min(available);
            let mut s = range.start;
            while s < end {
                bar.accumulate(samples[s], samples[s + 1]);
                s += step;
            }
        }
        buffer
    }
}

/// Exact downsample of a complete interleaved stereo buffer.
pub fn downsample(samples: &[f32], bar_count: usize) -> WaveformBuffer {
    Downsampler::default().run(samples, samples.len() / 2, bar_count)
}

/// Brings any interleaved layout to L/R pairs.
/// Mono is duplicated, wider layouts are averaged into two halves.
pub fn to_stereo(samples: &[f32], channels: usize) -> Cow<'_, [f32]> {
    match channels {
        0 => Cow::Owned(Vec::new()),
        2 => Cow::Borrowed(samples),
        1 => {
            let mut out = Vec::with_capacity(samples.len() * 2);
            for &s in samples {
                out.push(s);
                out.push(s);
            }
            Cow::Owned(out)
        }
        in_ch => {
            let frames = samples.len() / in_ch;
            let factor = in_ch as f32 / 2.0;
            let mut out = vec![0.0f32; frames * 2];
            for f in 0..frames {
                let row = &samples[f * in_ch..(f + 1) * in_ch];
                for oc in 0..2 {
                    let start = (oc as f32 * factor).floor() as usize;
                    let end = (((oc + 1) as f32 * factor).ceil() as usize).min(in_ch);
                    let group = &row[start..end];
                    out[f * 2 + oc] = if group.is_empty() {
                        0.0
                    } else {
                        group.iter().sum::<f32>() / group.len() as f32
                    };
                }
            }
            Cow::Owned(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> Vec<f32> {
        (0..frames)
            .flat_map(|i| {
                let t = i as f32 / frames as f32;
                [(t * 37.0).sin() * t, -(t * 11.0).cos() * 0.5]
            })
            .collect()
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let samples = ramp(10_000);
        let a = downsample(&samples, 137);
        let b = downsample(&samples, 137);
        let bits = |w: &WaveformBuffer| w.as_flat().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn empty_input_gives_zero_bars() {
        for n in [0usize, 1, 5, 640] {
            let out = downsample(&[], n);
            assert_eq!(out.len(), n);
            assert!(out.bars().iter().all(Bar::is_silent));
        }
    }

    #[test]
    fn zero_bar_count_gives_empty_buffer() {
        let out = downsample(&ramp(100), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn single_bar_keeps_channel_extrema() {
        let samples = [0.5, -0.3, 0.8, -0.9, -0.4, 0.2, 0.1, 0.7];
        let out = downsample(&samples, 1);
        assert_eq!(
            out.bars()[0],
            Bar {
                left_pos: 0.8,
                left_neg: -0.4,
                right_pos: 0.7,
                right_neg: -0.9,
            }
        );
    }

    #[test]
    fn right_channel_is_not_compared_against_left() {
        // L is loud, R is quiet: R peaks must come from R samples only.
        let samples = [0.9, 0.1, -0.9, -0.1];
        let bar = downsample(&samples, 1).bars()[0];
        assert_eq!(bar.right_pos, 0.1);
        assert_eq!(bar.right_neg, -0.1);
    }

    #[test]
    fn samples_over_unity_are_kept() {
        let bar = downsample(&[1.25, -1.5], 1).bars()[0];
        assert_eq!(bar.left_pos, 1.25);
        assert_eq!(bar.right_neg, -1.5);
    }

    #[test]
    fn buckets_partition_the_range() {
        for (frames, bars) in [(44_100usize, 4usize), (5, 4), (1, 3), (1000, 7), (17, 17), (3, 10)] {
            let bucketing = Bucketing::new(frames, bars);
            let mut cursor = 0;
            for b in 0..bars {
                let range = bucketing.range(b);
                assert_eq!(range.start, cursor, "gap or overlap at bar {b}");
                assert_eq!(range.start % 2, 0);
                cursor = range.end;
            }
            assert_eq!(cursor, frames * 2);
        }
    }

    #[test]
    fn frame_lookup_follows_filled_bars() {
        // 1000 frames over 999 bars: 2 frames per bar, only 500 bars filled
        let bucketing = Bucketing::new(1000, 999);
        assert_eq!(bucketing.bar_for_frame(0), Some(0));
        assert_eq!(bucketing.bar_for_frame(501), Some(250));
        assert_eq!(bucketing.bar_for_frame(1000), Some(499));
        assert_eq!(bucketing.bar_for_frame(1001), None);
        assert_eq!(Bucketing::new(0, 10).bar_for_frame(0), None);
        assert_eq!(Bucketing::new(10, 0).bar_for_frame(0), None);
    }

    #[test]
    fn quarter_second_buckets_see_only_their_quarter() {
        let frames = 44_100;
        let mut samples = vec![0.0f32; frames * 2];
        // loud spike in the second quarter only
        samples[2 * 20_000] = 0.9;
        samples[2 * 20_000 + 1] = -0.8;
        // small one in the first
        samples[2 * 100] = 0.25;
        samples[2 * 11_024 + 1] = -0.125;

        let bucketing = Bucketing::new(frames, 4);
        assert_eq!(bucketing.samples_per_bar(), 11_025 * 2);

        let out = downsample(&samples, 4);
        let bars = out.bars();
        assert_eq!(bars[0].left_pos, 0.25);
        assert_eq!(bars[0].right_neg, -0.125);
        assert_eq!(bars[1].left_pos, 0.9);
        assert_eq!(bars[1].right_neg, -0.8);
        assert!(bars[2].is_silent());
        assert!(bars[3].is_silent());
    }

    #[test]
    fn short_read_zero_fills_trailing_bars() {
        // 8 frames requested, only 4 delivered.
        let delivered = vec![0.5f32; 8];
        let out = Downsampler::default().run(&delivered, 8, 4);
        assert_eq!(out.len(), 4);
        assert_eq!(out.bars()[0].left_pos, 0.5);
        assert_eq!(out.bars()[1].right_pos, 0.5);
        assert!(out.bars()[2].is_silent());
        assert!(out.bars()[3].is_silent());
    }

    #[test]
    fn odd_trailing_sample_is_ignored() {
        let out = Downsampler::default().run(&[0.1, 0.2, 0.9], 2, 1);
        assert_eq!(out.bars()[0].left_pos, 0.1);
    }

    #[test]
    fn stride_skips_frames_past_budget() {
        let ds = Downsampler::new(Some(100));
        assert_eq!(ds.stride(50), 1);
        assert_eq!(ds.stride(1000), 10);
        assert_eq!(Downsampler::new(Some(0)).stride(1000), 1);

        // Spike on an odd frame is stepped over with stride 10.
        let mut samples = vec![0.0f32; 2000];
        samples[2 * 5] = 0.7;
        samples[2 * 10] = 0.3;
        let out = ds.run(&samples, 1000, 1);
        assert_eq!(out.bars()[0].left_pos, 0.3);
        let exact = downsample(&samples, 1);
        assert_eq!(exact.bars()[0].left_pos, 0.7);
    }

    #[test]
    fn flat_view_is_four_floats_per_bar() {
        let out = downsample(&[0.5, -0.25], 1);
        assert_eq!(out.as_flat(), &[0.5, 0.0, 0.0, -0.25]);
    }

    #[test]
    fn mono_is_duplicated() {
        let stereo = to_stereo(&[0.1, -0.2], 1);
        assert_eq!(&*stereo, &[0.1, 0.1, -0.2, -0.2]);
        assert!(matches!(to_stereo(&[0.1, 0.2], 2), Cow::Borrowed(_)));
    }

    #[test]
    fn quad_is_averaged_into_pairs() {
        let stereo = to_stereo(&[0.2, 0.4, -0.5, -0.25], 4);
        assert_eq!(&*stereo, &[0.3, -0.375]);
    }
}
