// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::sync::mpsc;
use std::thread::sleep as thread_sleep;
use std::time::Instant;

use anyhow::Context as _;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::camera::{CommonSettings, Measurement, ThermalCamera, SENSOR_HEIGHT, SENSOR_WIDTH};
use crate::display::Display;
use crate::export::Snapshotter;
use crate::image_buffer::{allocate_rgb565, allocate_thermal, Rgb565Image, ThermalImage};
use crate::render::{Screen, TemporalFilter, Upsampler};
use crate::settings::Settings;
use crate::storage::StateStore;
use crate::temperature::{is_measurable, RangeAdjustment, TemperatureRange};

mod control;
mod statistics;
mod status;

pub(crate) use control::{read_commands, Command};
pub(crate) use statistics::FrameStatistics;
pub(crate) use status::{Probe, Status};

/// Creates a fresh connection to the camera, both at start up and when rebooting.
pub(crate) type CameraFactory =
    Box<dyn Fn() -> anyhow::Result<Box<dyn ThermalCamera + Send>> + Send>;

/// The step of a cycle the frame loop is working on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Idle,
    Acquiring,
    Filtering,
    Rendering,
    Exporting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::Acquiring => "acquiring",
            Stage::Filtering => "filtering",
            Stage::Rendering => "rendering",
            Stage::Exporting => "exporting",
        };
        f.write_str(s)
    }
}

/// Owns every buffer between the camera and the display, and runs them once per frame.
pub(crate) struct FrameLoop {
    camera_factory: CameraFactory,
    camera: Box<dyn ThermalCamera + Send>,
    camera_settings: CommonSettings,
    filter: TemporalFilter,
    upsampler: Upsampler,
    interpolation: bool,
    filtered: ThermalImage,
    raster: Rgb565Image,
    screen: Screen,
    display: Box<dyn Display + Send>,
    range: TemperatureRange,
    statistics: FrameStatistics,
    store: StateStore,
    snapshotter: Snapshotter,
    commands: mpsc::Receiver<Command>,
    status_sender: watch::Sender<Status>,
    status_receiver: watch::Receiver<Status>,
    status_interval: u32,
    stage: Stage,
    probe: (u32, u32),
    loop_number: u64,
    errors: u64,
    corrupted_frames: u64,
    fps: f32,
    ambient: Option<f32>,
    vdd: Option<f32>,
    last_save: Option<bool>,
}

impl FrameLoop {
    pub(crate) fn new(
        settings: &Settings,
        camera_factory: CameraFactory,
        display: Box<dyn Display + Send>,
        commands: mpsc::Receiver<Command>,
    ) -> anyhow::Result<Self> {
        let render = &settings.render;
        let upsampler = Upsampler::new(
            (SENSOR_WIDTH, SENSOR_HEIGHT),
            (render.width, render.height),
            render.vertical_weighting,
        )
        .context("Invalid thermal image size")?;
        let mut store = StateStore::open(&settings.storage.directory)?;
        let boot_count = store.record_boot()?;
        let range = store.load_range(settings.range);
        let camera = camera_factory().context("Error configuring camera")?;
        let camera_settings = settings.camera.common().clone();
        let filtered = allocate_thermal(SENSOR_WIDTH, SENSOR_HEIGHT, range.min() as f32)?;
        let raster = allocate_rgb565(render.width, render.height, 0)?;
        let screen = Screen::new(render.width, render.height)?;
        let statistics = FrameStatistics::new(&range);
        let probe = (render.width / 2, render.height / 2);
        let initial_status = Status {
            boot_count,
            loop_number: 0,
            fps: 0.0,
            errors: 0,
            corrupted_frames: 0,
            range,
            statistics,
            probe: Probe {
                x: probe.0,
                y: probe.1,
                temperature: range.min() as f32,
            },
            ambient: None,
            vdd: None,
            interpolation: render.interpolation,
            smoothing: render.smoothing,
            last_save: None,
        };
        let (status_sender, status_receiver) = watch::channel(initial_status);
        info!(boot_count, %range, "Frame loop ready");
        Ok(Self {
            camera_factory,
            camera,
            filter: TemporalFilter::new(camera_settings.mirror, render.smoothing),
            camera_settings,
            upsampler,
            interpolation: render.interpolation,
            filtered,
            raster,
            screen,
            display,
            range,
            statistics,
            snapshotter: Snapshotter::new(&settings.storage.directory, boot_count),
            store,
            commands,
            status_sender,
            status_receiver,
            status_interval: render.status_interval,
            stage: Stage::Idle,
            probe,
            loop_number: 0,
            errors: 0,
            corrupted_frames: 0,
            fps: 0.0,
            ambient: None,
            vdd: None,
            last_save: None,
        })
    }

    /// A receiver for the status published after every cycle.
    pub(crate) fn status_receiver(&self) -> watch::Receiver<Status> {
        self.status_receiver.clone()
    }

    fn enter(&mut self, stage: Stage) {
        trace!(from = %self.stage, to = %stage, "Changing stage");
        self.stage = stage;
    }

    /// Run cycles until a shutdown command is received.
    pub(crate) fn run(mut self) -> anyhow::Result<()> {
        loop {
            let started = Instant::now();
            self.cycle();
            if !self.handle_commands() {
                info!("Terminating frame loop");
                return Ok(());
            }
            if let Some(remaining) = self.camera.frame_period().checked_sub(started.elapsed()) {
                thread_sleep(remaining);
            }
            let seconds = started.elapsed().as_secs_f32();
            self.fps = if seconds > 0.0 { 1.0 / seconds } else { 0.0 };
            self.publish_status();
        }
    }

    /// Acquire, filter and render a single frame.
    fn cycle(&mut self) {
        self.loop_number += 1;
        self.enter(Stage::Acquiring);
        if let Some(measurement) = self.acquire() {
            self.enter(Stage::Filtering);
            self.process(&measurement);
        }
        self.statistics.update(&self.filtered);
        self.enter(Stage::Rendering);
        self.render();
        if self.status_interval > 0 && self.loop_number % self.status_interval as u64 == 0 {
            debug!(
                loop_number = self.loop_number,
                fps = self.fps,
                errors = self.errors,
                corrupted_frames = self.corrupted_frames,
                min = self.statistics.min,
                max = self.statistics.max,
                all_time_min = self.statistics.all_time_min,
                all_time_max = self.statistics.all_time_max,
                probe = self.probe_temperature(),
                "Frame statistics"
            );
        }
        self.enter(Stage::Idle);
    }

    /// Read a single frame, retrying a few times before giving up on it.
    fn read_frame(&mut self) -> Option<Measurement> {
        let attempts = self.camera_settings.read_attempts.max(1);
        for attempt in 1..=attempts {
            match self.camera.measure() {
                Ok(measurement) => return Some(measurement),
                Err(err) => {
                    trace!(attempt, "Camera read failed: {:?}", err);
                    if attempt < attempts {
                        thread_sleep(self.camera_settings.retry_delay());
                    }
                }
            }
        }
        None
    }

    /// Read this cycle's frames, keeping the last one that arrived. A cycle only counts as an
    /// error when every read failed.
    fn acquire(&mut self) -> Option<Measurement> {
        let mut latest = None;
        for read in 0..self.camera_settings.reads_per_cycle.max(1) {
            match self.read_frame() {
                Some(measurement) => latest = Some(measurement),
                None => debug!(read, "Dropped camera read"),
            }
        }
        if latest.is_none() {
            self.errors += 1;
            warn!(errors = self.errors, "Unable to read a frame from the camera");
        }
        latest
    }

    /// Fold a new frame into the filtered grid, unless it is corrupted.
    fn process(&mut self, measurement: &Measurement) {
        self.ambient = Some(measurement.ambient.in_celsius());
        self.vdd = measurement.vdd;
        let image = &measurement.image;
        if image.dimensions() != self.filtered.dimensions() {
            self.corrupted_frames += 1;
            warn!(
                dimensions = ?image.dimensions(),
                "Skipping frame with unexpected dimensions"
            );
            return;
        }
        if let Some(bad) = image.iter().find(|t| !is_measurable(**t)) {
            self.corrupted_frames += 1;
            warn!(
                value = bad,
                corrupted_frames = self.corrupted_frames,
                "Skipping corrupted frame"
            );
            return;
        }
        self.filter.apply(image, &mut self.filtered);
    }

    fn render(&mut self) {
        if self.interpolation {
            self.upsampler
                .upsample(&self.filtered, &self.range, &mut self.raster);
        } else {
            self.upsampler
                .fill_blocks(&self.filtered, &self.range, &mut self.raster);
        }
        self.screen.compose(&self.raster, Some(self.probe));
        self.display.present(self.screen.image());
    }

    fn probe_temperature(&self) -> f32 {
        let (scale_x, scale_y) = self.upsampler.scale();
        self.filtered
            .get_pixel(self.probe.0 / scale_x, self.probe.1 / scale_y)[0]
    }

    fn persist_range(&mut self) {
        if let Err(err) = self.store.save_range(&self.range) {
            warn!("Unable to save the temperature range: {:?}", err);
        }
    }

    /// Write snapshots of the current raster and screen.
    fn save(&mut self) {
        self.enter(Stage::Exporting);
        self.persist_range();
        let saved = self.snapshotter.save(&self.raster, self.screen.image());
        self.last_save = Some(saved);
        self.enter(Stage::Idle);
    }

    /// Start over as if the device had been power cycled.
    fn reboot(&mut self) {
        info!("Rebooting camera");
        self.persist_range();
        match (self.camera_factory)() {
            Ok(camera) => self.camera = camera,
            Err(err) => warn!("Unable to reconnect to the camera, keeping the old one: {:?}", err),
        }
        match self.store.record_boot() {
            Ok(boot_count) => {
                self.snapshotter = Snapshotter::new(self.snapshotter.directory(), boot_count)
            }
            Err(err) => warn!("Unable to update the boot counter: {:?}", err),
        }
        let min = self.range.min() as f32;
        self.filtered.pixels_mut().for_each(|pixel| pixel[0] = min);
        self.statistics.reset(&self.range);
    }

    fn adjust_range(&mut self, adjustment: RangeAdjustment) {
        match self.range.adjusted(adjustment) {
            Some(range) => {
                info!(old = %self.range, new = %range, "Changing temperature range");
                self.range = range;
            }
            None => debug!(?adjustment, range = %self.range, "Ignoring range adjustment"),
        }
    }

    /// Respond to every pending command. Returns `false` once the loop should stop.
    fn handle_commands(&mut self) -> bool {
        let pending: Vec<Command> = self.commands.try_iter().collect();
        for command in pending {
            debug!(?command, "Handling command");
            match command {
                Command::Save => self.save(),
                Command::Reboot => self.reboot(),
                Command::Adjust(adjustment) => self.adjust_range(adjustment),
                Command::ToggleInterpolation => {
                    self.interpolation = !self.interpolation;
                    info!(enabled = self.interpolation, "Toggled interpolation");
                }
                Command::ToggleSmoothing => {
                    self.filter.smooth = !self.filter.smooth;
                    info!(enabled = self.filter.smooth, "Toggled smoothing");
                }
                Command::Probe { x, y } => {
                    let (width, height) = self.raster.dimensions();
                    self.probe = (x.min(width - 1), y.min(height - 1));
                    debug!(probe = ?self.probe, "Moved probe");
                }
                Command::Shutdown => {
                    self.persist_range();
                    return false;
                }
            }
        }
        true
    }

    fn status(&self) -> Status {
        Status {
            boot_count: self.store.boot_count(),
            loop_number: self.loop_number,
            fps: self.fps,
            errors: self.errors,
            corrupted_frames: self.corrupted_frames,
            range: self.range,
            statistics: self.statistics,
            probe: Probe {
                x: self.probe.0,
                y: self.probe.1,
                temperature: self.probe_temperature(),
            },
            ambient: self.ambient,
            vdd: self.vdd,
            interpolation: self.interpolation,
            smoothing: self.filter.smooth,
            last_save: self.last_save,
        }
    }

    fn publish_status(&self) {
        // The loop holds a receiver itself, so this can't fail.
        #[allow(unused_must_use)]
        {
            self.status_sender.send(self.status());
        }
    }
}
