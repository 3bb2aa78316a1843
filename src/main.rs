// src/main.rs

use anyhow::{anyhow, Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    queue,
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use beatboard::waveform::terminal::{marker_row, render_ascii};
use beatboard::{
    load_clip, BeatGrid, EditorConfig, Pass, SongMap, StagingSink, WaveformEditor,
};

enum Action {
    Quit,
    Changed,
    Ignored,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    let Some(input) = args.get(1) else {
        eprintln!("usage: beatboard <audio-file | map.json> [bpm]");
        return Ok(());
    };

    let (song_path, mut map) = open_input(Path::new(input))?;
    if let Some(bpm) = args.get(2) {
        map.bpm = bpm
            .parse()
            .with_context(|| format!("invalid bpm '{bpm}'"))?;
    }

    let config = match std::env::var("BEATBOARD_CONFIG") {
        Ok(path) => EditorConfig::load_from_disk(path)?,
        Err(_) => EditorConfig::default(),
    };

    let clip = load_clip(&song_path)?;
    let mut sink = StagingSink::new();
    let mut editor = WaveformEditor::new(config);
    editor.set_source(Some(Box::new(clip)), &mut sink);
    let grid = map.beat_grid();

    enable_raw_mode()?;
    let result = run(&mut editor, &mut sink, &grid);
    disable_raw_mode()?;
    println!();
    result
}

/// Accepts either a song map document or an audio file.
fn open_input(path: &Path) -> Result<(PathBuf, SongMap)> {
    let is_map = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_map {
        let map = SongMap::load_from_disk(path)?;
        let song = map
            .song_path(path)
            .ok_or_else(|| anyhow!("{} has no song assigned", path.display()))?;
        Ok((song, map))
    } else {
        let map = SongMap {
            song: Some(path.to_path_buf()),
            ..Default::default()
        };
        Ok((path.to_path_buf(), map))
    }
}

fn run(editor: &mut WaveformEditor, sink: &mut StagingSink, grid: &BeatGrid) -> Result<()> {
    // 20 FPS
    let frame = Duration::from_millis(50);
    let mut changed = true;

    loop {
        let (cols, rows) = terminal::size()?;
        if editor.resize(cols as f32) {
            changed = true;
        }

        let pass = if changed { Pass::Update } else { Pass::Repaint };
        editor.refresh(pass, sink);
        changed = false;
        draw(editor, sink, grid, rows as usize)?;

        if event::poll(frame)? {
            if let Event::Key(ev) = event::read()? {
                if ev.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(editor, ev.code, ev.modifiers) {
                    Action::Quit => break,
                    Action::Changed => changed = true,
                    Action::Ignored => {}
                }
            }
        }
    }
    Ok(())
}

fn handle_key(editor: &mut WaveformEditor, code: KeyCode, modifiers: KeyModifiers) -> Action {
    let fine = modifiers.contains(KeyModifiers::SHIFT);
    // one tenth of the visible window per press
    let nudge = editor.viewport().zoom() * if fine { 0.01 } else { 0.1 };
    let scroll = editor.viewport().scroll();

    let changed = match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Action::Quit,
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
        KeyCode::Left => editor.scroll_to(scroll - nudge),
        KeyCode::Right => editor.scroll_to(scroll + nudge),
        KeyCode::Home => editor.scroll_to(0.0),
        KeyCode::Up => editor.zoom_by(-1.0, fine),
        KeyCode::Down => editor.zoom_by(1.0, fine),
        _ => false,
    };
    if changed {
        Action::Changed
    } else {
        Action::Ignored
    }
}

fn draw(
    editor: &WaveformEditor,
    sink: &StagingSink,
    grid: &BeatGrid,
    rows: usize,
) -> Result<()> {
    let bars = sink.bars();
    let window = sink.window();
    let height = rows
        .saturating_sub(3)
        .min(editor.config().waveform_height)
        .max(4);

    let columns = editor
        .beat_lines(grid)
        .into_iter()
        .filter_map(|line| editor.bar_for_time(line.time_secs));
    let markers = marker_row(bars.len(), columns);

    let mut out = stdout().lock();
    queue!(out, cursor::MoveTo(0, 0), Clear(ClearType::All))?;
    write!(out, "{markers}\r\n")?;
    for line in render_ascii(bars, height) {
        write!(out, "{line}\r\n")?;
    }
    write!(
        out,
        "{:.2}s - {:.2}s | showing {:.2}s | {} bpm beats: {} | \u{2190}/\u{2192} scroll  \u{2191}/\u{2193} zoom (shift: fine)  q quit",
        window.start_secs,
        window.end_secs,
        editor.visible_seconds(),
        grid.bpm,
        grid.visible_beat_count(window),
    )?;
    out.flush()?;
    Ok(())
}
