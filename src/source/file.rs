// src/source/file.rs

use super::MemoryClip;
use crate::waveform::to_stereo;
use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

/// Decodes a whole audio file into memory.
///
/// The channel layout and rate are locked on the first packet that carries
/// frames; later packets with another layout are mixed to it.
pub fn load_clip(path: impl AsRef<Path>) -> Result<MemoryClip> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    let detected = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("probing {}", path.display()))?;
    let mut format = detected.format;

    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("no default audio track in {}", path.display()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut decoder = get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut sample_rate = codec_params.sample_rate.unwrap_or(44_100);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);
    let mut format_locked = false;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut out = Vec::<f32>::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::debug!("[Loader] skipping undecodable packet: {e}");
                continue;
            }
            Err(SymphoniaError::IoError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let packet_channels = spec.channels.count();

        if !format_locked {
            if decoded.frames() == 0 {
                continue;
            }
            sample_rate = spec.rate;
            channels = packet_channels;
            format_locked = true;
            log::debug!("[Loader] locked format: {sample_rate} Hz / {channels} ch");
        }

        let buf = sample_buffer_for(&mut sample_buf, decoded.capacity(), spec);
        buf.copy_interleaved_ref(decoded);
        let samples = buf.samples();

        if packet_channels == channels {
            out.extend_from_slice(samples);
        } else if channels == 2 {
            out.extend_from_slice(&to_stereo(samples, packet_channels));
        } else if channels == 1 {
            for frame in samples.chunks_exact(packet_channels) {
                out.push(frame.iter().sum::<f32>() / packet_channels as f32);
            }
        } else {
            log::warn!(
                "[Loader] dropping packet with {packet_channels} channels (stream has {channels})"
            );
        }
    }

    log::info!(
        "[Loader] decoded {} ({} frames, {} Hz, {} ch)",
        path.display(),
        out.len() / channels.max(1),
        sample_rate,
        channels
    );
    MemoryClip::new(out, channels, sample_rate)
}

/// Reuses `slot` while it can hold `frames` of `spec`, otherwise replaces it.
/// Capacity is counted in samples, so the packet's channel count matters.
fn sample_buffer_for(
    slot: &mut Option<SampleBuffer<f32>>,
    frames: usize,
    spec: SignalSpec,
) -> &mut SampleBuffer<f32> {
    let needed = frames * spec.channels.count();
    if slot.as_ref().is_none_or(|b| b.capacity() < needed) {
        *slot = Some(SampleBuffer::<f32>::new(frames as u64, spec));
    }
    slot.get_or_insert_with(|| SampleBuffer::<f32>::new(frames as u64, spec))
}
