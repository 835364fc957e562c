// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bytes::{BufMut, BytesMut};
use serde::Deserialize;
use tracing::{info, warn};

use crate::image_buffer::Rgb565Image;

/// Something that can show a finished screen.
pub(crate) trait Display {
    /// Show `screen`. Failures are logged, not returned, as nothing can be done about them.
    fn present(&mut self, screen: &Rgb565Image);
}

/// Writes each screen to the start of a Linux framebuffer device.
#[derive(Debug)]
pub(crate) struct FramebufferDisplay {
    path: PathBuf,
    device: File,
    buffer: BytesMut,
}

impl FramebufferDisplay {
    pub(crate) fn open(path: &Path) -> anyhow::Result<Self> {
        let device = OpenOptions::new()
            .write(true)
            .open(path)
            .with_context(|| format!("Unable to open framebuffer {}", path.display()))?;
        info!(?path, "Opened framebuffer");
        Ok(Self {
            path: path.to_path_buf(),
            device,
            buffer: BytesMut::new(),
        })
    }

    fn write_screen(&mut self, screen: &Rgb565Image) -> std::io::Result<()> {
        self.buffer.clear();
        self.buffer.reserve(screen.as_raw().len() * 2);
        for pixel in screen.as_raw() {
            self.buffer.put_u16_le(*pixel);
        }
        self.device.seek(SeekFrom::Start(0))?;
        self.device.write_all(&self.buffer)?;
        self.device.flush()
    }
}

impl Display for FramebufferDisplay {
    fn present(&mut self, screen: &Rgb565Image) {
        if let Err(err) = self.write_screen(screen) {
            warn!(path = ?self.path, "Unable to update framebuffer: {}", err);
        }
    }
}

/// Discards every screen, for running without a display attached.
#[derive(Debug, Default)]
pub(crate) struct NullDisplay;

impl Display for NullDisplay {
    fn present(&mut self, _screen: &Rgb565Image) {}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub(crate) enum DisplaySettings {
    Framebuffer { path: PathBuf },
    None,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self::None
    }
}

impl DisplaySettings {
    pub(crate) fn create_display(&self) -> anyhow::Result<Box<dyn Display + Send>> {
        Ok(match self {
            Self::Framebuffer { path } => Box::new(FramebufferDisplay::open(path)?),
            Self::None => {
                info!("No display configured");
                Box::new(NullDisplay)
            }
        })
    }
}
