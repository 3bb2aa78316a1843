// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Tunables for the waveform view. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Smallest visible fraction of the song (most zoomed in).
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub initial_zoom: f64,
    /// Zoom change per wheel unit.
    pub zoom_step: f64,
    /// Zoom change per wheel unit while the fine modifier is held.
    pub fine_zoom_step: f64,
    /// Display width of one bar.
    pub bar_width_px: f32,
    /// Enables strided scanning once a window spans more frames than this.
    pub frame_budget: Option<usize>,
    pub waveform_height: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.04,
            max_zoom: 1.0,
            initial_zoom: 1.0,
            zoom_step: 0.01,
            fine_zoom_step: 0.001,
            bar_width_px: 1.0,
            frame_budget: None,
            waveform_height: 150,
        }
    }
}

impl EditorConfig {
    /// Zoom bounds, ordered and kept inside `[0, 1]`.
    pub fn zoom_bounds(&self) -> (f64, f64) {
        let sane = |v: f64, fallback: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { fallback };
        let lo = sane(self.min_zoom, 0.04);
        let hi = sane(self.max_zoom, 1.0);
        if lo <= hi { (lo, hi) } else { (hi, lo) }
    }

    pub fn bar_width(&self) -> f32 {
        if self.bar_width_px.is_finite() && self.bar_width_px > 0.0 {
            self.bar_width_px
        } else {
            1.0
        }
    }

    pub fn load_from_disk(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to_disk(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{ "min_zoom": 0.1 }"#).unwrap();
        assert_eq!(config.min_zoom, 0.1);
        assert_eq!(config.max_zoom, 1.0);
        assert_eq!(config.frame_budget, None);
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let config = EditorConfig {
            min_zoom: 0.9,
            max_zoom: 0.2,
            ..Default::default()
        };
        assert_eq!(config.zoom_bounds(), (0.2, 0.9));
    }

    #[test]
    fn bad_bar_width_means_one_pixel() {
        let config = EditorConfig {
            bar_width_px: -3.0,
            ..Default::default()
        };
        assert_eq!(config.bar_width(), 1.0);
    }

    #[test]
    fn saves_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        let config = EditorConfig {
            frame_budget: Some(44_100),
            bar_width_px: 2.0,
            ..Default::default()
        };
        config.save_to_disk(&path).unwrap();
        assert_eq!(EditorConfig::load_from_disk(&path).unwrap(), config);
    }
}
