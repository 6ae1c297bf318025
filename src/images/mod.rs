mod fallback;
mod tools;

pub use fallback::{inline_placeholder, CoverStrategy, INLINE_PLACEHOLDER_TYPE};
pub use tools::{transcode_to_jpeg, TranscodeError, TranscodeParams};

use crate::config::TranscodeConfig;

/// Normalizes fetched images to a bounded JPEG, falling back to the original payload when
/// the image cannot be decoded or encoded.
#[derive(Debug, Clone)]
pub struct ImageTranscoder {
    enabled: bool,
    params: TranscodeParams,
}

impl ImageTranscoder {
    pub fn new(config: &TranscodeConfig) -> Self {
        Self {
            enabled: config.enabled,
            params: TranscodeParams {
                max_width: config.max_width,
                max_height: config.max_height,
                quality: config.quality,
            },
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            params: TranscodeParams::default(),
        }
    }

    pub fn applies_to(&self, content_type: &str) -> bool {
        self.enabled && content_type.starts_with("image/") && !content_type.contains("svg")
    }

    pub fn normalize(&self, data: Vec<u8>, content_type: String) -> (Vec<u8>, String) {
        if !self.applies_to(&content_type) {
            return (data, content_type);
        }

        match transcode_to_jpeg(&data, &self.params) {
            Ok(output) => {
                log::debug!(
                    "Transcoded {} ({} bytes) to image/jpeg ({} bytes)",
                    content_type,
                    data.len(),
                    output.len()
                );
                (output, "image/jpeg".to_string())
            }
            Err(e) => {
                log::warn!("Image optimization failed, using original image: {}", e);
                (data, content_type)
            }
        }
    }
}

impl Default for ImageTranscoder {
    fn default() -> Self {
        Self::new(&TranscodeConfig::default())
    }
}

// Function to detect image type from the image data
pub fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if data.starts_with(&[0x47, 0x49, 0x46, 0x38]) {
        Some("image/gif")
    } else if data.starts_with(&[0x52, 0x49, 0x46, 0x46])
        && data.get(8..12) == Some(&[0x57, 0x45, 0x42, 0x50])
    {
        Some("image/webp")
    } else if data.starts_with(&[0x42, 0x4D]) {
        Some("image/bmp")
    } else if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
        || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        Some("image/tiff")
    } else if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        Some("image/x-icon")
    } else {
        None
    }
}
