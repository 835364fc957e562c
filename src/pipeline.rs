// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Context as _;
use futures::future::{Future, FutureExt};
use futures::ready;
use futures::stream::{FuturesUnordered, Stream};
use pin_project::pin_project;
use tokio::sync::watch;
use tokio::task::spawn_blocking;
use tracing::{debug, info, info_span};
use tracing_futures::Instrument;

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::mpsc;
use std::task::{Context, Poll};

use crate::frame_loop::{read_commands, CameraFactory, FrameLoop, Status};
use crate::gallery::{self, Gallery, GallerySettings};
use crate::settings::Settings;
use crate::util::flatten_join_result;

type InnerTask = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;
type TaskList = FuturesUnordered<InnerTask>;

/// Every long-running task of the imager. It finishes as soon as any one of them does.
#[pin_project]
pub(crate) struct Pipeline {
    #[pin]
    tasks: TaskList,
}

impl Pipeline {
    pub(crate) async fn new(config: Settings) -> anyhow::Result<Self> {
        let camera_settings = config.camera.clone();
        let camera_factory: CameraFactory = Box::new(move || camera_settings.create_camera());
        let display = config
            .display
            .create_display()
            .context("Error configuring display")?;
        let (command_sender, command_receiver) = mpsc::channel();
        let frame_loop = FrameLoop::new(&config, camera_factory, display, command_receiver)
            .context("Error creating frame loop")?;
        let status = frame_loop.status_receiver();
        let frame_task: InnerTask = spawn_blocking(move || {
            let _span = info_span!("frame_loop").entered();
            frame_loop.run().context("Error within frame loop")
        })
        .map(flatten_join_result)
        .boxed();
        let input_task: InnerTask = read_commands(command_sender)
            .instrument(info_span!("control_input"))
            .boxed();
        let tasks: TaskList = vec![frame_task, input_task].into_iter().collect();
        let mut app = Self { tasks };
        app.create_gallery(&config, status)
            .context("Error creating snapshot gallery")?;
        Ok(app)
    }

    fn create_gallery(
        &mut self,
        config: &Settings,
        status: watch::Receiver<Status>,
    ) -> anyhow::Result<()> {
        let settings: &GallerySettings = &config.gallery;
        if !settings.enabled {
            info!("Gallery disabled, skipping HTTP server setup");
            return Ok(());
        }
        let gallery = Gallery::new(&config.storage.directory, settings.images_per_page);
        let bind_address: SocketAddr = settings.into();
        debug!(address = ?bind_address, "creating warp server");
        let (address, server) = warp::serve(gallery::routes(gallery, status))
            .try_bind_ephemeral(bind_address)
            .with_context(|| format!("Unable to bind gallery server to {}", bind_address))?;
        info!(%address, "Serving snapshot gallery");
        self.tasks.push(
            server
                .instrument(info_span!("gallery_server"))
                .map(Ok)
                .boxed(),
        );
        Ok(())
    }
}

impl Future for Pipeline {
    type Output = anyhow::Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        Poll::Ready(loop {
            if let Some(res) = ready!(this.tasks.as_mut().poll_next(cx)) {
                debug!(result = ?res, "Pipeline terminating");
                break res;
            }
        })
    }
}
