// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

mod cli;

use crate::camera::CameraSettings;
use crate::display::DisplaySettings;
use crate::gallery::GallerySettings;
use crate::render::RenderSettings;
use crate::storage::StorageSettings;
use crate::temperature::TemperatureRange;
pub(crate) use cli::Args;

#[derive(Debug, Deserialize)]
pub(crate) struct Settings {
    /// Camera-specific settings.
    pub(crate) camera: CameraSettings,

    /// How the thermal image is drawn.
    #[serde(default)]
    pub(crate) render: RenderSettings,

    /// The color range used until one has been saved.
    #[serde(default)]
    pub(crate) range: TemperatureRange,

    #[serde(default)]
    pub(crate) storage: StorageSettings,

    #[serde(default)]
    pub(crate) display: DisplaySettings,

    /// Settings for the HTTP server for browsing snapshots.
    #[serde(default)]
    pub(crate) gallery: GallerySettings,
}

impl Settings {
    pub(crate) fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config_data = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path.display()))?;
        toml::from_str(&config_data)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::Settings;
    use crate::camera::CameraSettings;
    use crate::display::DisplaySettings;
    use crate::gallery::GallerySettings;
    use crate::render::{RenderSettings, VerticalWeighting};
    use crate::temperature::TemperatureRange;

    #[test]
    fn minimal() {
        let source = r#"
        [camera]
        kind = "mlx90640"
        bus = 1
        "#;
        let parsed: Result<Settings, _> = toml::from_str(source);
        assert!(parsed.is_ok(), "Unable to parse TOML: {:?}", parsed);
        let parsed = parsed.unwrap();
        assert!(matches!(parsed.camera, CameraSettings::Mlx90640 { .. }));
        assert_eq!(parsed.render, RenderSettings::default());
        assert_eq!(parsed.range, TemperatureRange::default());
        assert_eq!(parsed.storage.directory, PathBuf::from("snapshots"));
        assert_eq!(parsed.display, DisplaySettings::None);
        assert_eq!(parsed.gallery, GallerySettings::default());
    }

    #[test]
    fn missing_camera() {
        let parsed: Result<Settings, _> = toml::from_str("[render]\nwidth = 640");
        assert!(parsed.is_err(), "Accepted a config without a camera");
    }

    #[test]
    fn full() {
        let source = r#"
        [camera]
        kind = "mock"
        path = "recording.toml"
        frame_rate = 4
        mirror = true

        [render]
        width = 640
        height = 480
        vertical_weighting = "vertical_scale"

        [range]
        min = 20
        max = 40

        [storage]
        directory = "/media/sd"

        [display]
        kind = "framebuffer"
        path = "/dev/fb1"

        [gallery]
        enabled = false
        "#;
        let parsed: Result<Settings, _> = toml::from_str(source);
        assert!(parsed.is_ok(), "Unable to parse TOML: {:?}", parsed);
        let parsed = parsed.unwrap();
        assert!(parsed.camera.common().mirror);
        assert_eq!((parsed.render.width, parsed.render.height), (640, 480));
        assert_eq!(
            parsed.render.vertical_weighting,
            VerticalWeighting::VerticalScale
        );
        assert_eq!(parsed.range, TemperatureRange::new(20, 40).unwrap());
        assert_eq!(parsed.storage.directory, PathBuf::from("/media/sd"));
        assert_eq!(
            parsed.display,
            DisplaySettings::Framebuffer {
                path: PathBuf::from("/dev/fb1")
            }
        );
        assert!(!parsed.gallery.enabled);
    }

    #[test]
    fn invalid_range() {
        let source = r#"
        [camera]
        kind = "mlx90640"
        bus = 1

        [range]
        min = 40
        max = 20
        "#;
        let parsed: Result<Settings, _> = toml::from_str(source);
        assert!(parsed.is_err(), "Accepted an inverted range");
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[camera]\nkind = \"mlx90640\"\nbus = \"/dev/i2c-1\"\n").unwrap();
        assert!(Settings::from_file(&path).is_ok());
        assert!(Settings::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
