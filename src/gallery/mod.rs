// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::Infallible;
use std::io;
use std::net;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::StatusCode;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::frame_loop::Status;

mod html;
mod listing;

use listing::{is_image_name, last_page, Listing};

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct GallerySettings {
    /// Whether to serve the gallery at all.
    #[serde(default = "GallerySettings::default_enabled")]
    pub(crate) enabled: bool,

    /// The address to bind the server to. Defaults to `0.0.0.0`.
    #[serde(default = "GallerySettings::default_address")]
    address: net::IpAddr,

    /// The port to bind the server to. Defaults to `8080`.
    #[serde(default = "GallerySettings::default_port")]
    port: u16,

    #[serde(default = "GallerySettings::default_images_per_page")]
    pub(crate) images_per_page: usize,
}

impl GallerySettings {
    fn default_enabled() -> bool {
        true
    }

    fn default_address() -> net::IpAddr {
        net::IpAddr::from([0u8, 0u8, 0u8, 0u8])
    }

    fn default_port() -> u16 {
        8080u16
    }

    fn default_images_per_page() -> usize {
        3
    }
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            address: Self::default_address(),
            port: Self::default_port(),
            images_per_page: Self::default_images_per_page(),
        }
    }
}

impl From<&GallerySettings> for net::SocketAddr {
    fn from(settings: &GallerySettings) -> Self {
        net::SocketAddr::from((settings.address, settings.port))
    }
}

/// The saved snapshots, as served over HTTP.
#[derive(Debug)]
pub(crate) struct Gallery {
    directory: PathBuf,
    images_per_page: usize,
}

impl Gallery {
    pub(crate) fn new(directory: &Path, images_per_page: usize) -> Self {
        Self {
            directory: directory.to_path_buf(),
            images_per_page: images_per_page.max(1),
        }
    }

    /// Every image in the directory, newest (reverse alphabetical) first.
    async fn images(&self) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_image_name(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort_unstable_by(|left, right| right.cmp(left));
        Ok(names)
    }

    fn image_path(&self, name: &str) -> Option<PathBuf> {
        if is_image_name(name) {
            Some(self.directory.join(name))
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    page: usize,
}

#[derive(Debug, Deserialize)]
struct FileQuery {
    file: Option<String>,

    #[serde(default)]
    page: usize,
}

fn not_found() -> Response {
    warp::reply::with_status("File not found", StatusCode::NOT_FOUND).into_response()
}

fn server_error(err: io::Error) -> Response {
    warn!("Error accessing snapshots: {}", err);
    warp::reply::with_status("Unable to read snapshots", StatusCode::INTERNAL_SERVER_ERROR)
        .into_response()
}

async fn index(gallery: Arc<Gallery>, query: PageQuery) -> Result<Response, Infallible> {
    let names = match gallery.images().await {
        Ok(names) => names,
        Err(err) => return Ok(server_error(err)),
    };
    let listing = Listing::paginate(&names, query.page, gallery.images_per_page);
    Ok(warp::reply::html(html::index_page(&listing)).into_response())
}

async fn image(gallery: Arc<Gallery>, query: FileQuery) -> Result<Response, Infallible> {
    Ok(match query.file.as_deref() {
        Some(name) if gallery.image_path(name).is_some() => {
            warp::reply::html(html::image_page(name)).into_response()
        }
        _ => not_found(),
    })
}

async fn download(gallery: Arc<Gallery>, query: FileQuery) -> Result<Response, Infallible> {
    let (name, path) = match query
        .file
        .as_deref()
        .and_then(|name| gallery.image_path(name).map(|path| (name, path)))
    {
        Some(found) => found,
        None => return Ok(not_found()),
    };
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(not_found()),
        Err(err) => return Ok(server_error(err)),
    };
    debug!(?path, "Sending snapshot");
    let reply = warp::reply::with_header(data, "content-type", "image/bmp");
    let reply = warp::reply::with_header(
        reply,
        "content-disposition",
        format!("attachment; filename=\"{}\"", name),
    );
    Ok(reply.into_response())
}

async fn delete(gallery: Arc<Gallery>, query: FileQuery) -> Result<Response, Infallible> {
    let path = match query.file.as_deref().and_then(|name| gallery.image_path(name)) {
        Some(path) => path,
        None => return Ok(not_found()),
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => info!(?path, "Deleted snapshot"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => (),
        Err(err) => return Ok(server_error(err)),
    }
    let count = match gallery.images().await {
        Ok(names) => names.len(),
        Err(err) => return Ok(server_error(err)),
    };
    let page = query.page.min(last_page(count, gallery.images_per_page));
    let reply = warp::reply::with_status(warp::reply(), StatusCode::SEE_OTHER);
    Ok(warp::reply::with_header(reply, "location", format!("/?page={}", page)).into_response())
}

/// Every route of the gallery.
pub(crate) fn routes(
    gallery: Gallery,
    status: watch::Receiver<Status>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone + Send + Sync + 'static {
    // Only bitmaps directly inside the directory are served as files.
    let static_files = warp::path::peek()
        .and_then(|peek: warp::path::Peek| async move {
            let mut segments = peek.segments();
            match (segments.next(), segments.next()) {
                (Some(name), None) if is_image_name(name) => Ok(()),
                _ => Err(warp::reject::not_found()),
            }
        })
        .untuple_one()
        .and(warp::fs::dir(gallery.directory.clone()));
    let gallery = Arc::new(gallery);
    let with_gallery = warp::any().map(move || Arc::clone(&gallery));
    let index = warp::path::end()
        .and(with_gallery.clone())
        .and(warp::query::<PageQuery>())
        .and_then(index);
    let image = warp::path("image")
        .and(warp::path::end())
        .and(with_gallery.clone())
        .and(warp::query::<FileQuery>())
        .and_then(image);
    let download = warp::path("download")
        .and(warp::path::end())
        .and(with_gallery.clone())
        .and(warp::query::<FileQuery>())
        .and_then(download);
    let delete = warp::path("delete")
        .and(warp::path::end())
        .and(with_gallery)
        .and(warp::query::<FileQuery>())
        .and_then(delete);
    let status = warp::path("status")
        .and(warp::path::end())
        .map(move || warp::reply::json(&*status.borrow()));
    warp::get().and(
        index
            .or(image)
            .or(download)
            .or(delete)
            .or(status)
            .or(static_files),
    )
}
