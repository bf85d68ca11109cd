//! Raster acquisition boundary.
//!
//! Image sources are resolved into drawable rasters here and nowhere else.
//! The engine only ever sees the resulting dimensions, the optional pixel
//! spacing and a draw call.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use cephkit_core::AcquisitionError;
use image::RgbaImage;
use tiny_skia::{FilterQuality, IntSize, Pixmap, PixmapPaint, Transform};

use crate::calibration::PixelSpacing;
use crate::model::Size;

/// Opaque host-side raster identifier
pub type RasterHandle = u64;

/// Where image content comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Encoded image bytes (PNG, JPEG, ...)
    Raw(Vec<u8>),
    /// File path, `file://` URL or remote URL
    Url(String),
    /// Raster already held by the host
    Handle(RasterHandle),
}

impl ImageSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Url(_) => "url",
            Self::Handle(_) => "handle",
        }
    }
}

/// Something that can paint itself into a pixmap
pub trait Raster: Send + Sync + fmt::Debug {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Draws the raster with its top-left corner at image origin, mapped
    /// through `transform`.
    fn draw(&self, target: &mut Pixmap, transform: Transform);
}

/// Raster backed by a premultiplied tiny-skia pixmap
pub struct ImageRaster {
    pixmap: Pixmap,
}

impl ImageRaster {
    pub fn from_rgba(image: &RgbaImage) -> Result<Self, AcquisitionError> {
        let (width, height) = image.dimensions();
        let size = IntSize::from_wh(width, height).ok_or(AcquisitionError::EmptyRaster { width, height })?;
        let mut data = Vec::with_capacity(image.as_raw().len());
        for px in image.pixels() {
            let [r, g, b, a] = px.0;
            let premul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
            data.extend_from_slice(&[premul(r), premul(g), premul(b), a]);
        }
        let pixmap = Pixmap::from_vec(data, size).ok_or(AcquisitionError::EmptyRaster { width, height })?;
        Ok(Self { pixmap })
    }

    /// Uniform grey raster, handy for hosts that only need geometry.
    pub fn blank(width: u32, height: u32) -> Result<Self, AcquisitionError> {
        Self::from_rgba(&RgbaImage::from_pixel(width, height, image::Rgba([128, 128, 128, 255])))
    }
}

impl fmt::Debug for ImageRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageRaster({}x{})", self.pixmap.width(), self.pixmap.height())
    }
}

impl Raster for ImageRaster {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn draw(&self, target: &mut Pixmap, transform: Transform) {
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(0, 0, self.pixmap.as_ref(), &paint, transform, None);
    }
}

/// What the raster source delivers
#[derive(Debug, Clone)]
pub struct RasterPayload {
    pub raster: Arc<dyn Raster>,
    pub pixel_spacing: Option<PixelSpacing>,
}

impl RasterPayload {
    pub fn new(raster: Arc<dyn Raster>) -> Self {
        Self {
            raster,
            pixel_spacing: None,
        }
    }

    pub fn with_pixel_spacing(mut self, spacing: PixelSpacing) -> Self {
        self.pixel_spacing = Some(spacing);
        self
    }
}

/// Raster accepted for a projection
#[derive(Debug, Clone)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_spacing: Option<PixelSpacing>,
    pub handle: Arc<dyn Raster>,
}

impl RasterInfo {
    pub fn from_payload(payload: RasterPayload) -> Result<Self, AcquisitionError> {
        let (width, height) = (payload.raster.width(), payload.raster.height());
        if width == 0 || height == 0 {
            return Err(AcquisitionError::EmptyRaster { width, height });
        }
        Ok(Self {
            width,
            height,
            pixel_spacing: payload.pixel_spacing,
            handle: payload.raster,
        })
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

/// Pending acquisition, tagged with the generation it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRequest {
    pub generation: u64,
    pub projection: String,
    pub source: ImageSource,
}

/// Resolves an [`ImageSource`] into a raster
pub trait RasterResolver {
    fn resolve(&self, source: &ImageSource) -> Result<RasterPayload, AcquisitionError>;
}

/// Resolver decoding bytes and local files with the `image` crate
#[derive(Debug, Clone, Default)]
pub struct ImageDecoder {
    pixel_spacing: Option<PixelSpacing>,
}

impl ImageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches spacing metadata to every decoded raster.
    pub fn with_pixel_spacing(mut self, spacing: PixelSpacing) -> Self {
        self.pixel_spacing = Some(spacing);
        self
    }

    fn decode(&self, bytes: &[u8]) -> Result<RasterPayload, AcquisitionError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| AcquisitionError::Decode { reason: e.to_string() })?;
        let raster = ImageRaster::from_rgba(&decoded.to_rgba8())?;
        tracing::debug!("Decoded {:?}", raster);
        Ok(RasterPayload {
            raster: Arc::new(raster),
            pixel_spacing: self.pixel_spacing,
        })
    }
}

impl RasterResolver for ImageDecoder {
    fn resolve(&self, source: &ImageSource) -> Result<RasterPayload, AcquisitionError> {
        match source {
            ImageSource::Raw(bytes) => self.decode(bytes),
            ImageSource::Url(url) if url.starts_with("http://") || url.starts_with("https://") => {
                Err(AcquisitionError::Unsupported {
                    source_kind: "remote url".to_string(),
                })
            }
            ImageSource::Url(url) => {
                let path = url.strip_prefix("file://").unwrap_or(url);
                let bytes = std::fs::read(Path::new(path)).map_err(|e| AcquisitionError::Io {
                    reason: format!("{}: {}", path, e),
                })?;
                self.decode(&bytes)
            }
            ImageSource::Handle(_) => Err(AcquisitionError::Unsupported {
                source_kind: source.kind().to_string(),
            }),
        }
    }
}
