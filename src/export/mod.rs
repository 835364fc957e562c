// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::image_buffer::Rgb565Image;

mod bmp;

use bmp::write_bmp;

#[derive(Debug)]
pub(crate) enum ExportError {
    /// Writing the file failed.
    Io(io::Error),

    /// The image can't be stored as a bitmap.
    DimensionMismatch { width: u32, height: u32 },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(err) => err.fmt(f),
            ExportError::DimensionMismatch { width, height } => {
                write!(f, "Unable to store a {}x{} image as a bitmap", width, height)
            }
        }
    }
}

impl StdError for ExportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            ExportError::DimensionMismatch { .. } => None,
        }
    }
}

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Which image a snapshot file holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SnapshotKind {
    /// Just the thermal image.
    Thermal,

    /// Everything on the screen.
    Screen,
}

impl SnapshotKind {
    fn suffix(self) -> char {
        match self {
            SnapshotKind::Thermal => 'T',
            SnapshotKind::Screen => 'S',
        }
    }
}

/// Writes numbered bitmap snapshots into a directory.
///
/// Files are named `{boot}_{number}_{kind}.bmp`, with both numbers zero padded to four digits.
/// Every file written takes the next number, so a save normally produces `n_T` and `n+1_S`. A
/// file that fails to write leaves its number for the next one.
#[derive(Debug)]
pub(crate) struct Snapshotter {
    directory: PathBuf,
    boot_count: u16,
    file_count: u16,
}

impl Snapshotter {
    pub(crate) fn new(directory: &Path, boot_count: u16) -> Self {
        Self {
            directory: directory.to_path_buf(),
            boot_count,
            file_count: 0,
        }
    }

    pub(crate) fn directory(&self) -> &Path {
        &self.directory
    }

    /// The name the next file of `kind` will be written to.
    pub(crate) fn file_name(&self, kind: SnapshotKind) -> String {
        format!(
            "{:04}_{:04}_{}.bmp",
            self.boot_count,
            self.file_count.wrapping_add(1),
            kind.suffix()
        )
    }

    /// Write a single bitmap, removing whatever was written if it fails part way.
    fn write_file(
        &mut self,
        kind: SnapshotKind,
        image: &Rgb565Image,
    ) -> Result<PathBuf, ExportError> {
        let path = self.directory.join(self.file_name(kind));
        let result = File::create(&path)
            .map_err(ExportError::from)
            .and_then(|file| write_bmp(BufWriter::new(file), image));
        match result {
            Ok(()) => {
                self.file_count = self.file_count.wrapping_add(1);
                Ok(path)
            }
            Err(err) => {
                if let Err(remove_err) = fs::remove_file(&path) {
                    if remove_err.kind() != io::ErrorKind::NotFound {
                        warn!(?path, "Unable to remove partial snapshot: {}", remove_err);
                    }
                }
                Err(err)
            }
        }
    }

    /// Save the thermal image, then the whole screen. Returns whether both were written.
    pub(crate) fn save(&mut self, thermal: &Rgb565Image, screen: &Rgb565Image) -> bool {
        let thermal_path = match self.write_file(SnapshotKind::Thermal, thermal) {
            Ok(path) => path,
            Err(err) => {
                warn!("Unable to save thermal snapshot: {}", err);
                return false;
            }
        };
        match self.write_file(SnapshotKind::Screen, screen) {
            Ok(screen_path) => {
                info!(thermal = ?thermal_path, screen = ?screen_path, "Saved snapshots");
                true
            }
            Err(err) => {
                warn!(thermal = ?thermal_path, "Unable to save screen snapshot: {}", err);
                false
            }
        }
    }
}
