// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::temperature::TemperatureRange;

/// Name of the state file within the storage directory.
const STATE_FILE: &str = "state.toml";

fn default_directory() -> PathBuf {
    PathBuf::from("snapshots")
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct StorageSettings {
    /// Where snapshots and the state file are kept.
    #[serde(default = "default_directory")]
    pub(crate) directory: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

/// The values kept between runs. Missing keys read as zero, and an out of range pair is
/// ignored when loading, so a fresh or damaged file is harmless.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
struct PersistedState {
    #[serde(default)]
    boot_count: u16,

    #[serde(default)]
    range_min: i16,

    #[serde(default)]
    range_max: i16,
}

/// Persists the boot counter and the color range in a small TOML file.
#[derive(Debug)]
pub(crate) struct StateStore {
    path: PathBuf,
    state: PersistedState,
}

impl StateStore {
    /// Open (or start) the state file inside `directory`.
    pub(crate) fn open(directory: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(directory).with_context(|| {
            format!(
                "Unable to create storage directory {}",
                directory.display()
            )
        })?;
        let path = directory.join(STATE_FILE);
        let state = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(state) => state,
                Err(err) => {
                    warn!(?path, "Ignoring unreadable state file: {}", err);
                    PersistedState::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(?path, "No saved state, starting fresh");
                PersistedState::default()
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Unable to read state file {}", path.display()))
            }
        };
        Ok(Self { path, state })
    }

    fn write(&self) -> anyhow::Result<()> {
        let contents = toml::to_string(&self.state).context("Unable to serialize state")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Unable to write state file {}", self.path.display()))?;
        debug!(path = ?self.path, state = ?self.state, "Saved state");
        Ok(())
    }

    /// Count another start up, returning the new count. The counter wraps around.
    pub(crate) fn record_boot(&mut self) -> anyhow::Result<u16> {
        self.state.boot_count = self.state.boot_count.wrapping_add(1);
        self.write()?;
        Ok(self.state.boot_count)
    }

    pub(crate) fn boot_count(&self) -> u16 {
        self.state.boot_count
    }

    /// The saved range, or `default` if nothing valid was saved.
    pub(crate) fn load_range(&self, default: TemperatureRange) -> TemperatureRange {
        match TemperatureRange::new(self.state.range_min, self.state.range_max) {
            Ok(range) => range,
            Err(err) => {
                debug!("Using the configured range: {}", err);
                default
            }
        }
    }

    /// Save `range`, skipping the write when it is what was last saved.
    pub(crate) fn save_range(&mut self, range: &TemperatureRange) -> anyhow::Result<()> {
        if self.state.range_min == range.min() && self.state.range_max == range.max() {
            return Ok(());
        }
        self.state.range_min = range.min();
        self.state.range_max = range.max();
        self.write()
    }
}
