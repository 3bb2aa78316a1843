// src/waveform/terminal.rs

use super::Bar;

/// Draws the bars as two stacked lanes, left channel on top.
pub fn render_ascii(bars: &[Bar], height: usize) -> Vec<String> {
    let h = height.max(4);
    let lane = h / 2;
    let mut lines = vec![vec![' '; bars.len()]; h];

    let to_row = |v: f32, top: usize| -> usize {
        let clamped = v.clamp(-1.0, 1.0);
        let y = (0.5 - 0.5 * clamped) * (lane as f32 - 1.0);
        top + y.round() as usize
    };

    for (x, bar) in bars.iter().enumerate() {
        for (top, pos, neg) in [
            (0, bar.left_pos, bar.left_neg),
            (lane, bar.right_pos, bar.right_neg),
        ] {
            let a = to_row(pos, top);
            let b = to_row(neg, top);
            for row in lines.iter_mut().take(b + 1).skip(a) {
                row[x] = '█';
            }
        }
    }
    lines.into_iter().map(|row| row.into_iter().collect()).collect()
}

/// Marker line with `|` at every given column, clipped to `width`.
pub fn marker_row(width: usize, columns: impl IntoIterator<Item = usize>) -> String {
    let mut row = vec![' '; width];
    for c in columns {
        if let Some(cell) = row.get_mut(c) {
            *cell = '|';
        }
    }
    row.into_iter().collect()
}
