//! Writing captures to disk and converting to and from `image` buffers.

use crate::annotate::{annotate_corners, default_ring_radius};
use crate::capture::CaptureResult;
use crate::config::{OutputFormat, ScanConfig};
use crate::core::{Image, PixelFormat};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image buffer does not match {width}x{height}")]
    Buffer { width: usize, height: usize },
}

/// Convert a decoded image, keeping gray/RGB/RGBA 8-bit layouts as they are.
/// Anything else is converted to RGBA8.
pub fn image_from_dynamic(img: DynamicImage) -> Image {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let (format, data) = match img {
        DynamicImage::ImageLuma8(buf) => (PixelFormat::Gray8, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (PixelFormat::Rgb8, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (PixelFormat::Rgba8, buf.into_raw()),
        other => (PixelFormat::Rgba8, other.into_rgba8().into_raw()),
    };
    Image {
        width,
        height,
        format,
        data,
    }
}

pub fn to_dynamic(img: &Image) -> Result<DynamicImage, PersistError> {
    let (w, h) = (img.width as u32, img.height as u32);
    let data = img.data.clone();
    let dynamic = match img.format {
        PixelFormat::Gray8 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
        PixelFormat::Rgb8 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        PixelFormat::Rgba8 => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
    };
    dynamic.ok_or(PersistError::Buffer {
        width: img.width,
        height: img.height,
    })
}

/// Decode an image file.
pub fn load_image(path: impl AsRef<Path>) -> Result<Image, PersistError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| PersistError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image_from_dynamic(img))
}

/// Encode `img` to `path`; parent directories are created as needed.
pub fn save_image(
    img: &Image,
    path: impl AsRef<Path>,
    format: OutputFormat,
) -> Result<(), PersistError> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let dynamic = to_dynamic(img)?;
    let (dynamic, image_format) = match format {
        OutputFormat::Png => (dynamic, ImageFormat::Png),
        // no alpha channel in JPEG
        OutputFormat::Jpeg => match img.format {
            PixelFormat::Rgba8 => (
                DynamicImage::ImageRgb8(dynamic.to_rgb8()),
                ImageFormat::Jpeg,
            ),
            _ => (dynamic, ImageFormat::Jpeg),
        },
    };
    dynamic
        .save_with_format(path, image_format)
        .map_err(|source| PersistError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

fn ensure_parent_dir(path: &Path) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PersistError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Paths written for one capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedCapture {
    pub raw: PathBuf,
    pub rectified: PathBuf,
    pub marked: Option<PathBuf>,
}

/// Writes captures into one directory, named by capture timestamp.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    format: OutputFormat,
    save_marked: bool,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            format: OutputFormat::Png,
            save_marked: false,
        }
    }

    /// `None` when the config has no `save_dir`.
    pub fn from_config(config: &ScanConfig) -> Option<Self> {
        let dir = config.save_dir.as_ref()?;
        Some(
            Self::new(dir)
                .with_format(config.image_format)
                .with_marked(config.save_marked),
        )
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_marked(mut self, save_marked: bool) -> Self {
        self.save_marked = save_marked;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, kind: &str, timestamp: u64) -> PathBuf {
        self.dir
            .join(format!("{kind}_{timestamp}.{}", self.format.extension()))
    }

    /// Write the raw and rectified images, plus the marked image if enabled.
    pub fn save(&self, result: &CaptureResult) -> Result<SavedCapture, PersistError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let raw = self.path_for("raw", result.timestamp);
        save_image(&result.raw, &raw, self.format)?;
        let rectified = self.path_for("rectified", result.timestamp);
        save_image(&result.rectified, &rectified, self.format)?;

        let marked = if self.save_marked {
            let radius = default_ring_radius(result.raw.width, result.raw.height);
            let overlay = annotate_corners(&result.raw, &result.image_corners, radius);
            let path = self.path_for("marked", result.timestamp);
            save_image(&overlay, &path, self.format)?;
            Some(path)
        } else {
            None
        };

        debug!("saved capture of {} to {}", result.target, self.dir.display());
        Ok(SavedCapture {
            raw,
            rectified,
            marked,
        })
    }
}
