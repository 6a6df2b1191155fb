// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::ResolutionPreset;
use crate::orientation::NaturalOrientation;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Session configuration supplied by the embedding layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Capture resolution preset
    pub resolution_preset: ResolutionPreset,
    /// Request the microphone group alongside camera on open
    pub enable_audio: bool,
    /// Route still captures through the storage permission group
    pub requires_storage_permission: bool,
    /// The device's natural orientation (landscape on most tablets)
    pub natural_orientation: NaturalOrientation,
    /// Directory for captured photos; current directory when unset
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution_preset: ResolutionPreset::default(), // High (720p)
            enable_audio: false,
            requires_storage_permission: false,
            natural_orientation: NaturalOrientation::default(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Timestamped default path for a still capture
    pub fn default_photo_path(&self) -> PathBuf {
        let filename = format!("photo_{}.jpg", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
        match &self.output_dir {
            Some(dir) => dir.join(filename),
            None => PathBuf::from(filename),
        }
    }
}
