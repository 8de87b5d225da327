//! Floor-plan image sources and natural-size probing.
//!
//! Backgrounds arrive as `data:` URLs. Only the image header is read to
//! find the natural pixel size; the image is never fully decoded here.

use crate::geometry::ImageDimensions;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::fmt;
use std::io::Cursor;
use winnow::combinator::{preceded, repeat};
use winnow::prelude::*;
use winnow::token::{rest, take_till};

/// A parsed `data:[<media type>][;<param>]*,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    pub media_type: &'a str,
    pub base64: bool,
    pub payload: &'a str,
}

impl DataUrl<'_> {
    /// Raw bytes of the payload.
    pub fn decode(&self) -> Result<Vec<u8>, ImageProbeError> {
        if self.base64 {
            STANDARD
                .decode(self.payload.trim())
                .map_err(ImageProbeError::Base64)
        } else {
            Ok(self.payload.as_bytes().to_vec())
        }
    }
}

/// Errors raised while resolving an image's dimensions.
#[derive(Debug)]
pub enum ImageProbeError {
    InvalidSource(String),
    Base64(base64::DecodeError),
    Io(std::io::Error),
    Decode(image::ImageError),
    Task(String),
}

impl fmt::Display for ImageProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSource(msg) => write!(f, "invalid image source: {msg}"),
            Self::Base64(err) => write!(f, "invalid base64 payload: {err}"),
            Self::Io(err) => write!(f, "image read error: {err}"),
            Self::Decode(err) => write!(f, "image decode error: {err}"),
            Self::Task(msg) => write!(f, "image probe task failed: {msg}"),
        }
    }
}

impl std::error::Error for ImageProbeError {}

impl From<image::ImageError> for ImageProbeError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err)
    }
}

/// Parse a `data:` URL. Parameters other than `base64` are ignored.
pub fn parse_data_url(src: &str) -> Result<DataUrl<'_>, ImageProbeError> {
    data_url
        .parse(src)
        .map_err(|e| ImageProbeError::InvalidSource(e.to_string()))
}

fn data_url<'a>(input: &mut &'a str) -> ModalResult<DataUrl<'a>> {
    let _ = "data:".parse_next(input)?;
    let media_type: &str = take_till(0.., |c: char| c == ';' || c == ',').parse_next(input)?;
    let params: Vec<&str> =
        repeat(0.., preceded(';', take_till(0.., |c: char| c == ';' || c == ',')))
            .parse_next(input)?;
    let _ = ','.parse_next(input)?;
    let payload = rest.parse_next(input)?;
    Ok(DataUrl {
        media_type,
        base64: params.iter().any(|p| p.eq_ignore_ascii_case("base64")),
        payload,
    })
}

/// Read the natural size from encoded image bytes.
pub fn probe_image_dimensions(bytes: &[u8]) -> Result<ImageDimensions, ImageProbeError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageProbeError::Io)?;
    let format = reader.format();
    let (width, height) = reader.into_dimensions()?;
    log::trace!("probed {format:?} image: {width}x{height}");
    Ok(ImageDimensions::new(width, height))
}

/// Synchronous probe of a `data:` URL source.
pub fn dimensions_from_source(src: &str) -> Result<ImageDimensions, ImageProbeError> {
    let bytes = parse_data_url(src)?.decode()?;
    probe_image_dimensions(&bytes)
}

/// Probe a source on the blocking pool.
#[cfg(feature = "runtime")]
pub async fn resolve_image_dimensions(src: String) -> Result<ImageDimensions, ImageProbeError> {
    tokio::task::spawn_blocking(move || dimensions_from_source(&src))
        .await
        .map_err(|e| ImageProbeError::Task(e.to_string()))?
}
