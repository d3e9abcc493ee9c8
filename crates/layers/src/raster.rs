use foundation::math::{Vec2, uv_to_texel};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("raster fetch failed: {0}")]
    Fetch(String),
    #[error("raster fetch timed out after {0} ms")]
    Timeout(u32),
    #[error("raster decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("raster has zero width or height")]
    InvalidDimensions,
    #[error("raster buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Decoded equirectangular image, sampled by brightness.
///
/// Pixels are row-major with `channels` interleaved bytes per pixel; only the
/// first channel (luma, or red for RGBA input) is ever sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(RasterError::InvalidDimensions);
        }
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    pub fn from_luma(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        Self::new(width, height, 1, pixels)
    }

    /// RGBA buffer as handed over by a canvas `ImageData`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        Self::new(width, height, 4, pixels)
    }

    /// Decodes an encoded image (PNG or JPEG) into a single brightness channel.
    pub fn decode(bytes: &[u8]) -> Result<Self, RasterError> {
        let luma = image::load_from_memory(bytes)?.to_luma8();
        let (width, height) = luma.dimensions();
        Self::from_luma(width, height, luma.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sample(&self, col: u32, row: u32) -> u8 {
        let col = col.min(self.width - 1) as usize;
        let row = row.min(self.height - 1) as usize;
        let offset = (row * self.width as usize + col) * self.channels as usize;
        self.pixels[offset]
    }

    /// Nearest-texel sample at equirectangular `uv`.
    pub fn sample_uv(&self, uv: Vec2) -> u8 {
        let (col, row) = uv_to_texel(uv, self.width, self.height);
        self.sample(col, row)
    }
}
