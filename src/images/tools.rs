use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use jpeg_encoder::{ColorType, Encoder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Failed to load image: {0}")]
    DecodeError(String),

    #[error("JPEG encoding failed: {0}")]
    EncodeError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeParams {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl Default for TranscodeParams {
    fn default() -> Self {
        Self {
            max_width: 500,
            max_height: 750,
            quality: 85,
        }
    }
}

// Decode, shrink into the bounding box and re-encode as JPEG
pub fn transcode_to_jpeg(
    image_data: &[u8],
    params: &TranscodeParams,
) -> Result<Vec<u8>, TranscodeError> {
    let img = image::load_from_memory(image_data)
        .map_err(|e| TranscodeError::DecodeError(e.to_string()))?;

    let img = fit_inside(img, params.max_width, params.max_height);

    encode_jpeg(img, params.quality)
}

/// Scale down to fit within `max_width`×`max_height`, keeping the aspect ratio.
/// Images already inside the box are returned untouched.
fn fit_inside(img: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (current_width, current_height) = img.dimensions();

    if current_width <= max_width && current_height <= max_height {
        return img;
    }

    img.resize(max_width, max_height, FilterType::Lanczos3)
}

fn encode_jpeg(img: DynamicImage, quality: u8) -> Result<Vec<u8>, TranscodeError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let (width, height) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(width), Ok(height)) => (width, height),
        _ => {
            return Err(TranscodeError::EncodeError(format!(
                "{}x{} exceeds the JPEG size limit",
                width, height
            )))
        }
    };

    let mut output = Vec::new();
    let mut encoder = Encoder::new(&mut output, quality.clamp(1, 100));
    encoder.set_progressive(true);
    encoder
        .encode(rgb.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| TranscodeError::EncodeError(e.to_string()))?;

    Ok(output)
}
