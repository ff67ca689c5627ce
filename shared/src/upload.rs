use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, ImageReader};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::model::ImageRef;
use crate::{MAX_IMAGE_DIMENSION, MAX_UPLOAD_BYTES};

/// Formats the generative service accepts as inline image input.
const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("input bytes empty")]
    EmptyInput,

    #[error("input too large: {size} bytes, max {max_size}")]
    InputTooLarge { size: usize, max_size: usize },

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("image dimensions too large: {width}x{height}, max {max} per side")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },

    #[error("failed to decode image header: {0}")]
    Decode(String),

    #[error("malformed data URL")]
    MalformedDataUrl,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// Encodes raw file bytes into an [`ImageRef`].
///
/// The format is sniffed from the bytes. The declared mime type is only
/// consulted when sniffing fails.
#[instrument(skip(bytes), fields(input_size = bytes.len()))]
pub fn encode_upload(bytes: &[u8], declared_mime: Option<&str>) -> Result<ImageRef, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyInput);
    }

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ImageError::InputTooLarge {
            size: bytes.len(),
            max_size: MAX_UPLOAD_BYTES,
        });
    }

    let format = image::guess_format(bytes)
        .ok()
        .or_else(|| declared_mime.and_then(ImageFormat::from_mime_type))
        .filter(|f| ALLOWED_FORMATS.contains(f))
        .ok_or(ImageError::UnsupportedFormat)?;

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(ImageError::DimensionsTooLarge {
            width,
            height,
            max: MAX_IMAGE_DIMENSION,
        });
    }

    debug!(?format, width, height, "upload encoded");

    Ok(ImageRef::new(format.to_mime_type(), BASE64.encode(bytes)))
}

/// Decodes a data URL handed over by a shell that already read the file and
/// runs the bytes through the same checks as [`encode_upload`].
pub fn decode_data_url(data_url: &str) -> Result<ImageRef, ImageError> {
    let trimmed = data_url.trim();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return Err(ImageError::MalformedDataUrl);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return Err(ImageError::MalformedDataUrl);
    };
    let Some(declared_mime) = header.strip_suffix(";base64") else {
        return Err(ImageError::MalformedDataUrl);
    };
    if payload.is_empty() {
        return Err(ImageError::MalformedDataUrl);
    }
    if !declared_mime.starts_with("image/") {
        return Err(ImageError::UnsupportedFormat);
    }
    if payload.len() > MAX_UPLOAD_BYTES.div_ceil(3) * 4 {
        return Err(ImageError::InputTooLarge {
            size: payload.len() / 4 * 3,
            max_size: MAX_UPLOAD_BYTES,
        });
    }

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;
    encode_upload(&bytes, Some(declared_mime))
}

/// Strips a `data:...,` prefix if present. Input without a comma is taken
/// to already be a bare payload.
pub fn payload_of(encoded: &str) -> &str {
    match encoded.split_once(',') {
        Some((_, payload)) if !payload.is_empty() => payload,
        _ => encoded,
    }
}

/// Mime type named by a `data:<mime>;base64,` prefix.
pub fn mime_of(encoded: &str) -> Option<&str> {
    let header = encoded.strip_prefix("data:")?.split_once(',')?.0;
    let mime = header.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}
