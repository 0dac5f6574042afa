//! # openexr-tools
//!
//! A thin convenience layer over the [`exr`] crate for HDR/linear
//! workflow images:
//!
//! - [`exr::read`](crate::exr::read) - load an EXR file into an
//!   [`ImageData`] buffer plus a [`Metadata`] map
//! - [`clean_metadata`] - normalize a metadata map before writing
//! - [`exr::write`](crate::exr::write) - write a buffer back out with a
//!   chosen [`ImageCodec`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use openexr_tools::{exr, ImageCodec, Metadata};
//!
//! let (image, metadata) = exr::read("render.exr")?;
//! println!("{}x{}x{}", image.width, image.height, image.channels);
//!
//! exr::write("out.exr", &image, &metadata, Some(ImageCodec::Zip))?;
//! ```
//!
//! # Data Layout
//!
//! Pixels are stored row-major and channel-interleaved: sample `c` of
//! pixel `(x, y)` lives at `(y * width + x) * channels + c`. EXR stores
//! 16-bit and 32-bit float samples only; other formats are rejected at
//! write time.
//!
//! # Dependencies
//!
//! - [`exr`] - OpenEXR encoding/decoding (the binary layout is opaque to
//!   this crate)
//! - [`half`] - 16-bit float samples

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod codec;
mod error;
pub mod exr;
pub mod metadata;

pub use codec::ImageCodec;
pub use error::{IoError, IoResult};
pub use metadata::{clean_metadata, AttrValue, Metadata};

use half::f16;

/// Image data container for EXR I/O.
///
/// Format-agnostic interleaved pixel storage. Only the float formats can
/// be written as EXR, but the container accepts integer data so that a
/// write attempt can be rejected with a proper error instead of a
/// silent coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Number of channels. A grayscale image has `channels == 1`.
    pub channels: u32,
    /// Pixel data format.
    pub format: PixelFormat,
    /// Raw pixel data.
    pub data: PixelData,
}

/// Pixel data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit unsigned integer per channel.
    U8,
    /// 16-bit unsigned integer per channel.
    U16,
    /// 32-bit unsigned integer per channel.
    U32,
    /// 16-bit float per channel.
    F16,
    /// 32-bit float per channel.
    F32,
}

/// Raw pixel data storage.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    /// 8-bit unsigned data.
    U8(Vec<u8>),
    /// 16-bit unsigned data.
    U16(Vec<u16>),
    /// 32-bit unsigned data.
    U32(Vec<u32>),
    /// 16-bit float data.
    F16(Vec<f16>),
    /// 32-bit float data.
    F32(Vec<f32>),
}

impl ImageData {
    /// Creates a zero-filled image with the given dimensions and format.
    pub fn new(width: u32, height: u32, channels: u32, format: PixelFormat) -> Self {
        let size = width as usize * height as usize * channels as usize;
        let data = match format {
            PixelFormat::U8 => PixelData::U8(vec![0u8; size]),
            PixelFormat::U16 => PixelData::U16(vec![0u16; size]),
            PixelFormat::U32 => PixelData::U32(vec![0u32; size]),
            PixelFormat::F16 => PixelData::F16(vec![f16::ZERO; size]),
            PixelFormat::F32 => PixelData::F32(vec![0.0f32; size]),
        };

        Self {
            width,
            height,
            channels,
            format,
            data,
        }
    }

    /// Creates an image from interleaved f32 pixel data.
    pub fn from_f32(width: u32, height: u32, channels: u32, data: Vec<f32>) -> Self {
        Self {
            width,
            height,
            channels,
            format: PixelFormat::F32,
            data: PixelData::F32(data),
        }
    }

    /// Creates an image from interleaved f16 pixel data.
    pub fn from_f16(width: u32, height: u32, channels: u32, data: Vec<f16>) -> Self {
        Self {
            width,
            height,
            channels,
            format: PixelFormat::F16,
            data: PixelData::F16(data),
        }
    }

    /// Creates an image from interleaved u8 pixel data.
    pub fn from_u8(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            format: PixelFormat::U8,
            data: PixelData::U8(data),
        }
    }

    /// Returns the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the total number of samples (pixels * channels).
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * self.channels as usize
    }

    /// Converts pixel data to f32.
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.data {
            PixelData::U8(data) => data.iter().map(|&v| f32::from(v) / 255.0).collect(),
            PixelData::U16(data) => data.iter().map(|&v| f32::from(v) / 65535.0).collect(),
            PixelData::U32(data) => data.iter().map(|&v| v as f32).collect(),
            PixelData::F16(data) => data.iter().map(|&v| v.to_f32()).collect(),
            PixelData::F32(data) => data.clone(),
        }
    }
}

impl PixelFormat {
    /// Returns bytes per channel for this format.
    pub const fn bytes_per_channel(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    /// Returns true if this is a floating-point format.
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Lowercase name of this format.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::F16 => "f16",
            Self::F32 => "f32",
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zero_filled() {
        let image = ImageData::new(4, 2, 3, PixelFormat::F16);
        assert_eq!(image.sample_count(), 24);
        assert!(image.to_f32().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_counts_widen_before_multiplying() {
        let image = ImageData {
            width: 100_000,
            height: 100_000,
            channels: 4,
            format: PixelFormat::F32,
            data: PixelData::F32(Vec::new()),
        };
        assert_eq!(image.pixel_count(), 10_000_000_000);
        assert_eq!(image.sample_count(), 40_000_000_000);
    }

    #[test]
    fn test_float_formats() {
        assert!(PixelFormat::F16.is_float());
        assert!(PixelFormat::F32.is_float());
        assert!(!PixelFormat::U8.is_float());
        assert!(!PixelFormat::U16.is_float());
        assert!(!PixelFormat::U32.is_float());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(PixelFormat::F16.to_string(), "f16");
        assert_eq!(PixelFormat::U8.to_string(), "u8");
    }
}
