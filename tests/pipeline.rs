use beatboard::{
    load_clip, EditorConfig, Pass, Refresh, SampleSource, StagingSink, WaveformEditor,
};
use std::path::Path;

fn write_wav(path: &Path, channels: u16, frames: usize, sample: impl Fn(usize, u16) -> i16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for f in 0..frames {
        for c in 0..channels {
            writer.write_sample(sample(f, c)).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn wav_file_to_quarter_bars() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.wav");
    // A single spike per channel in the first quarter, a louder one in the third.
    write_wav(&path, 2, 44_100, |f, c| match (f, c) {
        (100, 0) => 8192,
        (200, 1) => -4096,
        (30_000, 0) => 16_384,
        (30_000, 1) => -16_384,
        _ => 0,
    });

    let clip = load_clip(&path).unwrap();
    assert_eq!(clip.channels(), 2);
    assert_eq!(clip.total_frames(), 44_100);
    assert!(close(clip.duration_secs() as f32, 1.0));

    let mut sink = StagingSink::new();
    let mut editor = WaveformEditor::new(EditorConfig::default());
    editor.set_source(Some(Box::new(clip)), &mut sink);
    editor.resize(4.0);

    assert_eq!(editor.refresh(Pass::Update, &mut sink), Refresh::Rebuilt { bars: 4 });
    let bars = sink.bars();
    assert_eq!(bars.len(), 4);

    assert!(close(bars[0].left_pos, 0.25));
    assert!(close(bars[0].right_neg, -0.125));
    assert_eq!(bars[0].left_neg, 0.0);
    assert_eq!(bars[0].right_pos, 0.0);

    assert!(bars[1].is_silent());
    assert!(close(bars[2].left_pos, 0.5));
    assert!(close(bars[2].right_neg, -0.5));
    assert!(bars[3].is_silent());

    assert_eq!(sink.window().start_secs, 0.0);
    assert!(close(sink.window().end_secs as f32, 1.0));
}

#[test]
fn mono_wav_shows_on_both_lanes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono.wav");
    write_wav(&path, 1, 1000, |f, _| if f == 10 { -8192 } else { 0 });

    let clip = load_clip(&path).unwrap();
    assert_eq!(clip.channels(), 1);

    let mut sink = StagingSink::new();
    let mut editor = WaveformEditor::new(EditorConfig::default());
    editor.set_source(Some(Box::new(clip)), &mut sink);
    editor.resize(10.0);
    editor.refresh(Pass::Update, &mut sink);

    let first = sink.bars()[0];
    assert!(close(first.left_neg, -0.25));
    assert!(close(first.right_neg, -0.25));
}

#[test]
fn window_past_the_end_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tail.wav");
    write_wav(&path, 2, 44_100, |f, _| if f == 44_099 { 16_384 } else { 0 });

    let mut sink = StagingSink::new();
    let mut editor = WaveformEditor::new(EditorConfig::default());
    editor.set_source(Some(Box::new(load_clip(&path).unwrap())), &mut sink);
    editor.resize(16.0);
    editor.scroll_to(0.9);
    editor.zoom_by(-50.0, false);

    let range = editor.viewport().visible_sample_range(44_100);
    assert_eq!(range.end(), 44_100);
    assert!(range.frame_count < 22_050);

    editor.refresh(Pass::Update, &mut sink);
    let bars = sink.bars();
    assert_eq!(bars.len(), 16);
    // the last frame of the song lands somewhere in the visible bars
    assert!(bars.iter().any(|b| close(b.left_pos, 0.5)));
    assert!(close(sink.window().end_secs as f32, 1.0));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_clip(dir.path().join("nope.wav")).is_err());
}
