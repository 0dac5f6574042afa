//! Legal EXR image codecs.
//!
//! [`ImageCodec`] is the closed set of compression schemes the EXR format
//! defines, each carrying a lowercase display name and the numeric code
//! stored in file headers. Name and code lookup are total over the set;
//! anything else is an error, never a default.

use exr::compression::Compression;

use crate::{IoError, IoResult};

/// An EXR compression scheme.
///
/// # Variants
///
/// | name | code | |
/// |------|------|---|
/// | `b44` | 6 | lossy, fixed-rate, f16 only |
/// | `b44a` | 7 | lossy, like b44 with flat-area optimization |
/// | `dwaa` | 8 | lossy DCT, 32-scanline blocks |
/// | `dwab` | 9 | lossy DCT, 256-scanline blocks |
/// | `piz` | 4 | lossless wavelet, best for noisy images |
/// | `pxr24` | 5 | f32 rounded to 24 bits, then zip |
/// | `rle` | 1 | lossless run-length encoding |
/// | `uncompressed` | 0 | no compression |
/// | `zip` | 3 | lossless zip, 16-scanline blocks |
/// | `zips` | 2 | lossless zip, one scanline at a time |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageCodec {
    /// Lossy 4x4 block compression for f16 channels.
    B44,
    /// Lossy 4x4 block compression with better rates for flat areas.
    B44a,
    /// Lossy DCT compression in blocks of 32 scanlines.
    Dwaa,
    /// Lossy DCT compression in blocks of 256 scanlines.
    Dwab,
    /// Lossless wavelet compression (default for writing).
    #[default]
    Piz,
    /// Lossy for f32 (rounded to 24 bits), lossless for f16 and u32.
    Pxr24,
    /// Lossless run-length encoding.
    Rle,
    /// No compression.
    Uncompressed,
    /// Lossless zip compression of 16-scanline blocks.
    Zip,
    /// Lossless zip compression of single scanlines.
    Zips,
}

impl ImageCodec {
    /// Every codec, in name order.
    pub const ALL: [ImageCodec; 10] = [
        Self::B44,
        Self::B44a,
        Self::Dwaa,
        Self::Dwab,
        Self::Piz,
        Self::Pxr24,
        Self::Rle,
        Self::Uncompressed,
        Self::Zip,
        Self::Zips,
    ];

    /// Lowercase display name of this codec.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::B44 => "b44",
            Self::B44a => "b44a",
            Self::Dwaa => "dwaa",
            Self::Dwab => "dwab",
            Self::Piz => "piz",
            Self::Pxr24 => "pxr24",
            Self::Rle => "rle",
            Self::Uncompressed => "uncompressed",
            Self::Zip => "zip",
            Self::Zips => "zips",
        }
    }

    /// Numeric compression code as stored in EXR headers.
    #[inline]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Uncompressed => 0,
            Self::Rle => 1,
            Self::Zips => 2,
            Self::Zip => 3,
            Self::Piz => 4,
            Self::Pxr24 => 5,
            Self::B44 => 6,
            Self::B44a => 7,
            Self::Dwaa => 8,
            Self::Dwab => 9,
        }
    }

    /// Looks up a codec by its numeric header code.
    ///
    /// # Errors
    ///
    /// [`IoError::InvalidCodecCode`] if `code` is not one of the ten known
    /// codes. The message lists the legal codes.
    pub fn from_code(code: i32) -> IoResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|codec| i32::from(codec.code()) == code)
            .ok_or_else(|| IoError::InvalidCodecCode {
                code,
                known: known_codes(),
            })
    }

    /// Looks up a codec by name, case-insensitively.
    ///
    /// # Errors
    ///
    /// [`IoError::InvalidCodecName`] if `name` is not one of the ten known
    /// names. The message lists the legal names.
    pub fn from_name(name: &str) -> IoResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|codec| codec.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| IoError::InvalidCodecName {
                name: name.to_string(),
                known: known_names(),
            })
    }
}

impl std::fmt::Display for ImageCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ImageCodec> for Compression {
    fn from(codec: ImageCodec) -> Self {
        match codec {
            ImageCodec::Uncompressed => Compression::Uncompressed,
            ImageCodec::Rle => Compression::RLE,
            ImageCodec::Zips => Compression::ZIP1,
            ImageCodec::Zip => Compression::ZIP16,
            ImageCodec::Piz => Compression::PIZ,
            ImageCodec::Pxr24 => Compression::PXR24,
            ImageCodec::B44 => Compression::B44,
            ImageCodec::B44a => Compression::B44A,
            ImageCodec::Dwaa => Compression::DWAA(None),
            ImageCodec::Dwab => Compression::DWAB(None),
        }
    }
}

impl TryFrom<Compression> for ImageCodec {
    type Error = IoError;

    /// Compression schemes outside the ten-codec set (HTJ2K and whatever
    /// comes after) are rejected rather than mapped to a near neighbour.
    fn try_from(compression: Compression) -> IoResult<Self> {
        Ok(match compression {
            Compression::Uncompressed => ImageCodec::Uncompressed,
            Compression::RLE => ImageCodec::Rle,
            Compression::ZIP1 => ImageCodec::Zips,
            Compression::ZIP16 => ImageCodec::Zip,
            Compression::PIZ => ImageCodec::Piz,
            Compression::PXR24 => ImageCodec::Pxr24,
            Compression::B44 => ImageCodec::B44,
            Compression::B44A => ImageCodec::B44a,
            Compression::DWAA(_) => ImageCodec::Dwaa,
            Compression::DWAB(_) => ImageCodec::Dwab,
            other => {
                return Err(IoError::Decode(format!(
                    "unsupported compression scheme {other:?}"
                )))
            }
        })
    }
}

fn known_codes() -> String {
    let mut codes: Vec<u8> = ImageCodec::ALL.iter().map(|codec| codec.code()).collect();
    codes.sort_unstable();
    codes
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn known_names() -> String {
    // ALL is already sorted by name
    ImageCodec::ALL
        .iter()
        .map(|codec| codec.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_code_bijection() {
        for codec in ImageCodec::ALL {
            assert_eq!(ImageCodec::from_name(codec.name()).unwrap(), codec);
            assert_eq!(ImageCodec::from_code(i32::from(codec.code())).unwrap(), codec);
        }
    }

    #[test]
    fn test_codes_match_exr_spec() {
        assert_eq!(ImageCodec::Uncompressed.code(), 0);
        assert_eq!(ImageCodec::Rle.code(), 1);
        assert_eq!(ImageCodec::Zips.code(), 2);
        assert_eq!(ImageCodec::Zip.code(), 3);
        assert_eq!(ImageCodec::Piz.code(), 4);
        assert_eq!(ImageCodec::Pxr24.code(), 5);
        assert_eq!(ImageCodec::B44.code(), 6);
        assert_eq!(ImageCodec::B44a.code(), 7);
        assert_eq!(ImageCodec::Dwaa.code(), 8);
        assert_eq!(ImageCodec::Dwab.code(), 9);
    }

    #[test]
    fn test_from_name_case_insensitive() {
        assert_eq!(ImageCodec::from_name("PIZ").unwrap(), ImageCodec::Piz);
        assert_eq!(ImageCodec::from_name("PxR24").unwrap(), ImageCodec::Pxr24);
        assert_eq!(ImageCodec::from_name("B44A").unwrap(), ImageCodec::B44a);
    }

    #[test]
    fn test_from_code_rejects_unknown() {
        for code in [-1, 10, 255] {
            let err = ImageCodec::from_code(code).unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains(&code.to_string()), "message: {msg}");
            assert!(msg.contains("0, 1, 2, 3, 4, 5, 6, 7, 8, 9"), "message: {msg}");
        }
    }

    #[test]
    fn test_from_name_rejects_unknown() {
        let err = ImageCodec::from_name("jpeg").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("jpeg"), "message: {msg}");
        assert!(
            msg.contains("b44, b44a, dwaa, dwab, piz, pxr24, rle, uncompressed, zip, zips"),
            "message: {msg}"
        );
    }

    #[test]
    fn test_default_is_piz() {
        assert_eq!(ImageCodec::default(), ImageCodec::Piz);
    }

    #[test]
    fn test_display_uses_name() {
        assert_eq!(ImageCodec::Uncompressed.to_string(), "uncompressed");
    }

    #[test]
    fn test_compression_conversion_roundtrip() {
        for codec in ImageCodec::ALL {
            let compression: Compression = codec.into();
            assert_eq!(ImageCodec::try_from(compression).unwrap(), codec);
        }
    }

    #[test]
    fn test_unmapped_compression_rejected() {
        let err = ImageCodec::try_from(Compression::HTJ2K32).unwrap_err();
        assert!(err.to_string().contains("HTJ2K32"), "message: {err}");
    }
}
