// src/map.rs

use crate::beats::BeatGrid;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// A beatmap document: which song it is authored against and its tempo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongMap {
    pub song: Option<PathBuf>,
    pub bpm: u32,
    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: u32,
}

fn default_beats_per_bar() -> u32 {
    4
}

impl Default for SongMap {
    fn default() -> Self {
        Self {
            song: None,
            bpm: 120,
            beats_per_bar: default_beats_per_bar(),
        }
    }
}

impl SongMap {
    pub fn beat_grid(&self) -> BeatGrid {
        BeatGrid::new(self.bpm as f64, self.beats_per_bar)
    }

    /// Relative song paths are resolved against the map file's folder.
    pub fn song_path(&self, map_path: &Path) -> Option<PathBuf> {
        let song = self.song.as_ref()?;
        if song.is_absolute() {
            return Some(song.clone());
        }
        Some(
            map_path
                .parent()
                .map(|dir| dir.join(song))
                .unwrap_or_else(|| song.clone()),
        )
    }

    pub fn save_to_disk(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_from_disk(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening map {}", path.display()))?;
        let reader = BufReader::new(file);
        let map = serde_json::from_reader(reader)
            .with_context(|| format!("parsing map {}", path.display()))?;
        Ok(map)
    }
}
