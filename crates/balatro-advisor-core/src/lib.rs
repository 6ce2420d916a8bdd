#![warn(missing_docs)]
//! # balatro-advisor-core
//!
//! ## Purpose
//! Defines the pure data model used across the `balatro-advisor` workspace.
//!
//! ## Responsibilities
//! - Represent one captured window frame as a validated RGB buffer.
//! - Convert native 32-bit BGRX pixel rows into packed RGB.
//! - Pair a frame with fixed analysis instructions and encode it for transport
//!   (PNG, then base64).
//!
//! ## Data flow
//! Capture code emits a [`CapturedFrame`]. The app wraps it in an
//! [`AnalysisRequest`], which [`AnalysisRequest::encode`] consumes into an
//! [`EncodedAnalysisRequest`] ready for the model client.
//!
//! ## Ownership and lifetimes
//! Frames own their pixel buffer and expose it read-only. Encoding consumes
//! the request, so raw pixels are dropped as soon as the PNG exists.
//!
//! ## Error model
//! Shape mismatches and encoder failures return [`CoreError`].
//!
//! ## Example
//! ```rust
//! use balatro_advisor_core::{AnalysisKind, AnalysisRequest, CapturedFrame};
//!
//! let frame = CapturedFrame::new(2, 1, vec![255, 0, 0, 0, 255, 0]).unwrap();
//! let encoded = AnalysisRequest::for_kind(frame, AnalysisKind::Hand)
//!     .encode()
//!     .unwrap();
//! assert_eq!(encoded.width, 2);
//! assert!(!encoded.image_base64.is_empty());
//! ```

pub mod prompts;

use base64::Engine as _;
use image::ImageEncoder as _;
use image::codecs::png::PngEncoder;
use thiserror::Error;

pub use prompts::{AnalysisKind, GAME_STATE_PROMPT, HAND_PROMPT, SHOP_PROMPT, SYSTEM_PROMPT};

/// Bytes per pixel in a [`CapturedFrame`] buffer.
pub const RGB_BYTES_PER_PIXEL: usize = 3;

/// Bytes per pixel in the native 32-bit bitmap layout.
pub const BGRX_BYTES_PER_PIXEL: usize = 4;

/// One window screenshot.
///
/// The buffer is row-major, top row first, 3 bytes per pixel in R, G, B order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl CapturedFrame {
    /// Constructs a validated frame.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyFrame`] when either dimension is zero and
    /// [`CoreError::InvalidFrameShape`] when `rgb.len() != width * height * 3`.
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, CoreError> {
        let expected = required_len(width, height, RGB_BYTES_PER_PIXEL)?;
        if rgb.len() != expected {
            return Err(CoreError::InvalidFrameShape {
                expected,
                actual: rgb.len(),
            });
        }

        Ok(Self { width, height, rgb })
    }

    /// Builds a frame from top-down 32-bit BGRX rows.
    ///
    /// # Errors
    /// Same as [`CapturedFrame::new`], checked against the 4-byte layout.
    pub fn from_bgrx(width: u32, height: u32, bgrx: &[u8]) -> Result<Self, CoreError> {
        let expected = required_len(width, height, BGRX_BYTES_PER_PIXEL)?;
        if bgrx.len() != expected {
            return Err(CoreError::InvalidFrameShape {
                expected,
                actual: bgrx.len(),
            });
        }

        Self::new(width, height, bgrx_to_rgb(bgrx)?)
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read-only view of the RGB buffer.
    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    /// Encodes the frame as a lossless PNG.
    ///
    /// # Errors
    /// Returns [`CoreError::Encode`] when the PNG encoder rejects the buffer.
    pub fn to_png(&self) -> Result<Vec<u8>, CoreError> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(
                &self.rgb,
                self.width,
                self.height,
                image::ColorType::Rgb8.into(),
            )
            .map_err(|error| CoreError::Encode(error.to_string()))?;
        Ok(png)
    }
}

/// Converts 32-bit BGRX (or BGRA) pixels to packed RGB.
///
/// The fourth byte of each pixel is dropped regardless of its value.
///
/// # Errors
/// Returns [`CoreError::InvalidFrameShape`] when `bgrx.len()` is not a multiple
/// of 4.
pub fn bgrx_to_rgb(bgrx: &[u8]) -> Result<Vec<u8>, CoreError> {
    if bgrx.len() % BGRX_BYTES_PER_PIXEL != 0 {
        return Err(CoreError::InvalidFrameShape {
            expected: bgrx.len() - bgrx.len() % BGRX_BYTES_PER_PIXEL,
            actual: bgrx.len(),
        });
    }

    let mut rgb = Vec::with_capacity(bgrx.len() / BGRX_BYTES_PER_PIXEL * RGB_BYTES_PER_PIXEL);
    for px in bgrx.chunks_exact(BGRX_BYTES_PER_PIXEL) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    Ok(rgb)
}

/// A frame paired with the instructions it should be analysed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Screenshot to analyse.
    pub frame: CapturedFrame,
    /// User prompt text.
    pub instructions: String,
}

impl AnalysisRequest {
    /// Pairs a frame with arbitrary instructions.
    pub fn new(frame: CapturedFrame, instructions: impl Into<String>) -> Self {
        Self {
            frame,
            instructions: instructions.into(),
        }
    }

    /// Pairs a frame with the fixed prompt for `kind`.
    pub fn for_kind(frame: CapturedFrame, kind: AnalysisKind) -> Self {
        Self::new(frame, kind.prompt())
    }

    /// Encodes the frame as PNG + base64 and drops the raw pixels.
    ///
    /// # Errors
    /// Returns [`CoreError::Encode`] when PNG encoding fails.
    pub fn encode(self) -> Result<EncodedAnalysisRequest, CoreError> {
        let png = self.frame.to_png()?;
        Ok(EncodedAnalysisRequest {
            instructions: self.instructions,
            width: self.frame.width,
            height: self.frame.height,
            png_len: png.len(),
            image_base64: base64::engine::general_purpose::STANDARD.encode(&png),
        })
    }
}

/// Transport-ready form of an [`AnalysisRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAnalysisRequest {
    /// User prompt text.
    pub instructions: String,
    /// Source frame width.
    pub width: u32,
    /// Source frame height.
    pub height: u32,
    /// Size of the PNG before base64 encoding.
    pub png_len: usize,
    /// Standard base64 of the PNG bytes.
    pub image_base64: String,
}

/// Error type for frame validation and encoding.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Width or height is zero.
    #[error("frame is empty: {width}x{height}")]
    EmptyFrame {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
    /// Pixel buffer length does not match declared geometry.
    #[error("invalid frame shape: expected {expected} bytes, got {actual}")]
    InvalidFrameShape {
        /// Expected byte count.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },
    /// Dimensions overflow addressable memory.
    #[error("frame dimensions overflow: {width}x{height}")]
    Overflow {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
    /// Image encoder failure.
    #[error("image encoding failed: {0}")]
    Encode(String),
}

fn required_len(width: u32, height: u32, bytes_per_pixel: usize) -> Result<usize, CoreError> {
    if width == 0 || height == 0 {
        return Err(CoreError::EmptyFrame { width, height });
    }

    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(bytes_per_pixel))
        .ok_or(CoreError::Overflow { width, height })
}

#[cfg(test)]
mod tests {
    //! Unit tests for frame validation and pixel conversion.

    use super::*;

    #[test]
    fn rejects_buffer_of_wrong_length() {
        let error = CapturedFrame::new(2, 2, vec![0; 11]).expect_err("shape should be rejected");
        assert!(matches!(
            error,
            CoreError::InvalidFrameShape {
                expected: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            CapturedFrame::new(0, 5, Vec::new()),
            Err(CoreError::EmptyFrame { .. })
        ));
    }

    #[test]
    fn bgrx_conversion_reverses_channels_and_drops_padding() {
        let bgrx = [30, 20, 10, 255, 3, 2, 1, 0];
        assert_eq!(bgrx_to_rgb(&bgrx).unwrap(), vec![10, 20, 30, 1, 2, 3]);
    }

    #[test]
    fn bgrx_conversion_rejects_partial_pixels() {
        assert!(bgrx_to_rgb(&[1, 2, 3, 4, 5]).is_err());
    }

    #[test]
    fn from_bgrx_keeps_row_order() {
        // 1x2: top row blue, bottom row red.
        let frame = CapturedFrame::from_bgrx(1, 2, &[255, 0, 0, 0, 0, 0, 255, 0]).unwrap();
        assert_eq!(frame.rgb(), &[0, 0, 255, 255, 0, 0]);
    }
}
