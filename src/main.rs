// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Context as _;
use structopt::StructOpt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod camera;
mod display;
mod export;
mod frame_loop;
mod gallery;
mod image_buffer;
mod pipeline;
mod render;
mod settings;
mod storage;
mod temperature;
mod util;

use crate::pipeline::Pipeline;
use crate::settings::{Args, Settings};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::from_args();
    let config = Settings::from_file(&args.config_path)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Unable to start async runtime")?;
    let res = runtime.block_on(async { Pipeline::new(config).await?.await });
    // Reading stdin blocks a runtime thread that would otherwise keep shutdown waiting.
    runtime.shutdown_background();
    match &res {
        Ok(()) => info!("Shut down"),
        Err(err) => error!("{:?}", err),
    }
    res
}
