// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Avatar minification.
//!
//! Avatars arrive inline as base64 `data:` URLs and are stored the same way,
//! so they are shrunk to thumbnail size before they ever reach the store.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::{AppError, Result};

const DEFAULT_MAX_DIMENSION: u32 = 256;
const DEFAULT_JPEG_QUALITY: u8 = 25;

/// A compressed image ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MinifiedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl MinifiedImage {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Compresses raw avatar images.
#[async_trait]
pub trait AvatarMinifier: Send + Sync {
    async fn minify(&self, image: Vec<u8>) -> Result<MinifiedImage>;
}

/// Extract the image bytes from a `data:` URL or a bare base64 string.
pub fn decode_data_url(input: &str) -> Result<Vec<u8>> {
    let payload = match input.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => payload,
        Some(_) => {
            return Err(AppError::BadRequest(
                "Avatar must be a base64 data URL".to_string(),
            ))
        }
        None => input,
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::BadRequest("Avatar is not valid base64".to_string()))
}

/// Downscales to fit a square box and re-encodes with aggressive settings.
#[derive(Debug, Clone)]
pub struct ThumbnailMinifier {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl Default for ThumbnailMinifier {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ThumbnailMinifier {
    pub fn new(max_dimension: u32, jpeg_quality: u8) -> Self {
        Self {
            max_dimension,
            jpeg_quality,
        }
    }

    fn minify_blocking(&self, original: Vec<u8>) -> Result<MinifiedImage> {
        let format = image::guess_format(&original).map_err(|_| unsupported())?;
        if format != ImageFormat::Png && format != ImageFormat::Jpeg {
            return Err(unsupported());
        }

        let decoded = image::load_from_memory_with_format(&original, format).map_err(|e| {
            tracing::debug!(error = %e, "Avatar decode failed");
            AppError::BadRequest("Avatar image could not be decoded".to_string())
        })?;

        let resized = decoded.width() > self.max_dimension || decoded.height() > self.max_dimension;
        let img = if resized {
            decoded.resize(self.max_dimension, self.max_dimension, FilterType::Triangle)
        } else {
            decoded
        };

        let mut bytes = Vec::new();
        let mime = match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality);
                DynamicImage::ImageRgb8(img.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(encode_failed)?;
                "image/jpeg"
            }
            _ => {
                let encoder =
                    PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, PngFilter::Adaptive);
                DynamicImage::ImageRgba8(img.to_rgba8())
                    .write_with_encoder(encoder)
                    .map_err(encode_failed)?;
                "image/png"
            }
        };

        // Re-encoding an already small image can grow it.
        if !resized && bytes.len() >= original.len() {
            bytes = original;
        }

        tracing::debug!(
            mime,
            size = bytes.len(),
            width = img.width(),
            height = img.height(),
            "Avatar minified"
        );

        Ok(MinifiedImage { bytes, mime })
    }
}

#[async_trait]
impl AvatarMinifier for ThumbnailMinifier {
    async fn minify(&self, image: Vec<u8>) -> Result<MinifiedImage> {
        let minifier = self.clone();
        tokio::task::spawn_blocking(move || minifier.minify_blocking(image))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Minify task failed: {}", e)))?
    }
}

fn unsupported() -> AppError {
    AppError::BadRequest("Avatar must be a PNG or JPEG image".to_string())
}

fn encode_failed(e: image::ImageError) -> AppError {
    AppError::Internal(anyhow::anyhow!("Avatar encode failed: {}", e))
}
