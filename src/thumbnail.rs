//! Avatar thumbnails: a fixed 40x40 circular crop with a soft edge.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{FinderError, Result};

pub const THUMBNAIL_SIZE: u32 = 40;
pub const THUMBNAIL_BYTES: usize = (THUMBNAIL_SIZE * THUMBNAIL_SIZE * 4) as usize;

const FEATHER: f32 = 1.0;

/// Decodes an image, resizes it to 40x40 and masks it to a circle.
///
/// Returns straight (non-premultiplied) RGBA8, row major, 6400 bytes.
pub fn resize_and_mask_rgba(input: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(input)?;
    let mut out = img
        .resize_exact(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
        .to_rgba8();
    apply_circle_mask(&mut out);
    Ok(out.into_raw())
}

/// Multiplies each pixel's alpha by a circular mask centred on the image.
pub fn apply_circle_mask(img: &mut RgbaImage) {
    let (w, h) = img.dimensions();
    let cx = (w as f32 - 1.0) / 2.0;
    let cy = (h as f32 - 1.0) / 2.0;
    let r = w.min(h) as f32 / 2.0;

    for (x, y, px) in img.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let mask = mask_alpha((dx * dx + dy * dy).sqrt(), r);
        px[3] = ((u32::from(px[3]) * u32::from(mask)) / 255) as u8;
    }
}

/// Opaque inside `r - 1`, transparent beyond `r + 1`, linear in between.
fn mask_alpha(dist: f32, r: f32) -> u8 {
    if dist <= r - FEATHER {
        255
    } else if dist >= r + FEATHER {
        0
    } else {
        let t = (r + FEATHER - dist) / (2.0 * FEATHER);
        (t.clamp(0.0, 1.0) * 255.0) as u8
    }
}

/// Encodes a thumbnail buffer as PNG.
pub fn encode_png(rgba: Vec<u8>) -> Result<Vec<u8>> {
    let img = RgbaImage::from_raw(THUMBNAIL_SIZE, THUMBNAIL_SIZE, rgba).ok_or_else(|| {
        FinderError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "thumbnail buffer is not 40x40 RGBA",
        ))
    })?;

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Fetches avatars and turns them into thumbnails.
///
/// Every call to [`AvatarLoader::load`] supersedes the previous one: when an
/// older load finishes after a newer one started, its result is dropped.
#[derive(Clone)]
pub struct AvatarLoader {
    client: Client,
    generation: Arc<AtomicU64>,
}

impl AvatarLoader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Token for the load about to start; invalidates earlier tokens.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    /// Loads `url`. `Ok(None)` means a newer load replaced this one.
    pub async fn load(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let token = self.begin();

        let bytes = fetch_bytes(&self.client, url).await?;
        if !self.is_current(token) {
            debug!("Discarding stale avatar {}", url);
            return Ok(None);
        }

        let rgba = thumbnail_blocking(bytes).await?;
        if !self.is_current(token) {
            debug!("Discarding stale avatar {}", url);
            return Ok(None);
        }

        Ok(Some(rgba))
    }
}

/// Runs the decode and resize on the blocking pool.
async fn thumbnail_blocking(bytes: Vec<u8>) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || resize_and_mask_rgba(&bytes))
        .await
        .map_err(|e| FinderError::Io(std::io::Error::other(e)))?
}

pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Thumbnails many avatars with at most `concurrency` in flight.
///
/// Results keep the order of `urls`; a failed avatar yields `None`.
pub async fn thumbnail_all(client: &Client, urls: &[String], concurrency: usize) -> Vec<Option<Vec<u8>>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let tasks = urls.iter().cloned().map(|url| {
        let sem_clone = semaphore.clone();
        let client_clone = client.clone();
        tokio::spawn(async move {
            let _permit = sem_clone.acquire_owned().await.ok()?;
            let result = match fetch_bytes(&client_clone, &url).await {
                Ok(bytes) => thumbnail_blocking(bytes).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(rgba) => Some(rgba),
                Err(e) => {
                    warn!("Avatar {} failed: {}", url, e);
                    None
                }
            }
        })
    });

    join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.ok().flatten())
        .collect()
}
