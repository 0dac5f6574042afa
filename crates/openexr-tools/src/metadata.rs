//! Typed metadata storage and header sanitizing.
//!
//! [`Metadata`] is a string-keyed map of [`AttrValue`]s mirroring an EXR
//! header: arbitrary caller-supplied entries plus the reserved `channels`
//! list and the derived `num_channels` / `compression` entries produced
//! on read.
//!
//! [`clean_metadata`] normalizes a caller's map into one that is safe to
//! hand to the writer: the channel list is padded to the image's channel
//! count and header fields that are derived elsewhere are stripped.

use std::collections::HashMap;

use crate::codec::ImageCodec;
use crate::ImageData;

/// Header keys that are always removed before writing.
///
/// These are either derived from the image itself (window geometry) or
/// supplied through the explicit codec parameter (compression).
pub const RESERVED_KEYS: [&str; 7] = [
    "compression",
    "dataWindow",
    "displayWindow",
    "lineOrder",
    "pixelAspectRatio",
    "screenWindowCenter",
    "screenWindowWidth",
];

/// Typed metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// UTF-8 string value.
    Str(String),
    /// Signed 32-bit integer.
    Int(i32),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// 2D float vector (screen window center and similar).
    FloatVec2(f32, f32),
    /// Integer pixel rectangle (data/display window).
    IntBounds {
        /// Top-left corner.
        position: (i32, i32),
        /// Width and height.
        size: (usize, usize),
    },
    /// Ordered list of strings (the `channels` entry).
    StrList(Vec<String>),
    /// A resolved compression codec.
    Codec(ImageCodec),
}

impl AttrValue {
    /// Returns string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns i32 if this is an integer value.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns f32 if this is a Float value.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string list if this is a StrList value.
    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::StrList(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the codec if this is a Codec value.
    pub fn as_codec(&self) -> Option<ImageCodec> {
        match self {
            AttrValue::Codec(v) => Some(*v),
            _ => None,
        }
    }
}

/// Metadata container: key -> typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    map: HashMap<String, AttrValue>,
}

impl Metadata {
    /// Creates an empty metadata map.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Inserts or replaces an entry.
    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.map.insert(key.into(), value);
    }

    /// Returns a reference to a value by key.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    /// Removes an entry, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.map.remove(key)
    }

    /// Returns true if the key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Iterates over key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.map.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The ordered channel-name list, if present.
    pub fn channels(&self) -> Option<&[String]> {
        self.get("channels").and_then(AttrValue::as_str_list)
    }

    /// Replaces the channel-name list.
    pub fn set_channels(&mut self, channels: Vec<String>) {
        self.set("channels", AttrValue::StrList(channels));
    }

    /// The derived channel count, if present.
    pub fn num_channels(&self) -> Option<usize> {
        self.get("num_channels")
            .and_then(AttrValue::as_i32)
            .map(|n| n as usize)
    }

    /// The resolved compression codec, if present.
    pub fn compression(&self) -> Option<ImageCodec> {
        self.get("compression").and_then(AttrValue::as_codec)
    }
}

/// Builds writable EXR metadata from an image and a caller's metadata map.
///
/// The caller's map is never mutated. The returned copy has a `channels`
/// list padded with `aux_NNNN` names up to the image's channel count
/// (never truncated), a lone unnamed channel renamed to `l` (luminance
/// convention for grayscale), and all [`RESERVED_KEYS`] removed.
pub fn clean_metadata(image: &ImageData, metadata: &Metadata) -> Metadata {
    let mut metadata = metadata.clone();

    let num_channels = image.channels.max(1) as usize;

    // do not assume rgba channel names for unnamed channels
    let mut channels: Vec<String> = metadata
        .channels()
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    // pad names are numbered from zero, independent of the list length
    for i in 0..num_channels.saturating_sub(channels.len()) {
        channels.push(format!("aux_{i:04}"));
    }

    // use l channel name for grayscale images
    if channels == ["aux_0000"] {
        channels = vec!["l".to_string()];
    }

    metadata.set_channels(channels);

    for key in RESERVED_KEYS {
        metadata.remove(key);
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageData;

    fn gray_image() -> ImageData {
        ImageData::from_f32(10, 5, 1, vec![0.0; 50])
    }

    fn image_with_channels(channels: u32) -> ImageData {
        ImageData::from_f32(10, 5, channels, vec![0.0; 50 * channels as usize])
    }

    #[test]
    fn test_grayscale_channel_named_l() {
        let cleaned = clean_metadata(&gray_image(), &Metadata::new());
        assert_eq!(cleaned.channels().unwrap(), ["l"]);
    }

    #[test]
    fn test_named_single_channel_kept() {
        let mut metadata = Metadata::new();
        metadata.set_channels(vec!["depth".to_string()]);
        let cleaned = clean_metadata(&gray_image(), &metadata);
        assert_eq!(cleaned.channels().unwrap(), ["depth"]);
    }

    #[test]
    fn test_unnamed_channels_padded() {
        let cleaned = clean_metadata(&image_with_channels(7), &Metadata::new());
        assert_eq!(
            cleaned.channels().unwrap(),
            ["aux_0000", "aux_0001", "aux_0002", "aux_0003", "aux_0004", "aux_0005", "aux_0006"]
        );
    }

    #[test]
    fn test_partial_channel_list_extended() {
        let mut metadata = Metadata::new();
        metadata.set_channels(
            ["r", "g", "b", "a", "foo"].iter().map(ToString::to_string).collect(),
        );
        let cleaned = clean_metadata(&image_with_channels(7), &metadata);
        assert_eq!(
            cleaned.channels().unwrap(),
            ["r", "g", "b", "a", "foo", "aux_0000", "aux_0001"]
        );
    }

    #[test]
    fn test_pad_numbering_restarts_at_zero() {
        let mut metadata = Metadata::new();
        metadata.set_channels(vec!["depth".to_string()]);
        let cleaned = clean_metadata(&image_with_channels(3), &metadata);
        assert_eq!(cleaned.channels().unwrap(), ["depth", "aux_0000", "aux_0001"]);
    }

    #[test]
    fn test_overlong_channel_list_never_truncated() {
        let mut metadata = Metadata::new();
        metadata.set_channels(
            ["r", "g", "b", "a"].iter().map(ToString::to_string).collect(),
        );
        let cleaned = clean_metadata(&image_with_channels(2), &metadata);
        assert_eq!(cleaned.channels().unwrap(), ["r", "g", "b", "a"]);
    }

    #[test]
    fn test_reserved_keys_stripped() {
        let mut metadata = Metadata::new();
        metadata.set("compression", AttrValue::Codec(ImageCodec::Zip));
        metadata.set(
            "dataWindow",
            AttrValue::IntBounds { position: (0, 0), size: (10, 5) },
        );
        metadata.set(
            "displayWindow",
            AttrValue::IntBounds { position: (0, 0), size: (10, 5) },
        );
        metadata.set("lineOrder", AttrValue::Str("increasing".to_string()));
        metadata.set("pixelAspectRatio", AttrValue::Float(1.0));
        metadata.set("screenWindowCenter", AttrValue::FloatVec2(0.0, 0.0));
        metadata.set("screenWindowWidth", AttrValue::Float(1.0));
        metadata.set("owner", AttrValue::Str("test".to_string()));

        let cleaned = clean_metadata(&gray_image(), &metadata);
        for key in RESERVED_KEYS {
            assert!(!cleaned.contains(key), "reserved key {key} survived");
        }
        assert_eq!(cleaned.get("owner").and_then(AttrValue::as_str), Some("test"));
    }

    #[test]
    fn test_reserved_keys_stripped_regardless_of_value_type() {
        let mut metadata = Metadata::new();
        metadata.set("compression", AttrValue::Str("whatever".to_string()));
        metadata.set("dataWindow", AttrValue::Int(42));
        let cleaned = clean_metadata(&gray_image(), &metadata);
        assert!(!cleaned.contains("compression"));
        assert!(!cleaned.contains("dataWindow"));
    }

    #[test]
    fn test_caller_metadata_untouched() {
        let mut metadata = Metadata::new();
        metadata.set("compression", AttrValue::Codec(ImageCodec::Rle));
        let before = metadata.clone();
        let _ = clean_metadata(&image_with_channels(3), &metadata);
        assert_eq!(metadata, before);
    }
}
