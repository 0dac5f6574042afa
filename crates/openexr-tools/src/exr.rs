//! OpenEXR reading and writing.
//!
//! Orchestrates the `exr` crate: [`read`] loads a file into an
//! [`ImageData`] buffer plus a [`Metadata`] map, [`write`] emits a buffer
//! with sanitized metadata and a chosen [`ImageCodec`]. The EXR binary
//! layout is entirely the wrapped crate's concern.
//!
//! # Channel order
//!
//! EXR headers store channels in a map, so arbitrary channel order does
//! not persist. On read the channel names are sorted lexicographically,
//! then any of `R`, `G`, `B`, `A` are pulled to the front in that fixed
//! order. The returned `channels` metadata entry holds the lowercase
//! names in buffer order.
//!
//! # Example
//!
//! ```rust,ignore
//! use openexr_tools::{exr, ImageCodec};
//!
//! let (image, metadata) = exr::read("render.exr")?;
//! exr::write("out.exr", &image, &metadata, Some(ImageCodec::Zip))?;
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use ::exr::image::read::image::ReadLayers;
use ::exr::image::read::layers::ReadChannels;
use ::exr::image::write::WritableImage;
use ::exr::image::{AnyChannel, AnyChannels, Blocks, Encoding, FlatSamples, Image, Layer};
use ::exr::math::Vec2;
use ::exr::meta::attribute::{AttributeValue, IntegerBounds, LineOrder, Text};
use ::exr::meta::header::LayerAttributes;
use ::exr::meta::magic_number;
use half::f16;
use smallvec::SmallVec;

use crate::metadata::clean_metadata;
use crate::{
    AttrValue, ImageCodec, ImageData, IoError, IoResult, Metadata, PixelData, PixelFormat,
};

/// Channel names that are conventionally uppercase in EXR files.
const WELL_KNOWN_CHANNELS: [&str; 5] = ["l", "r", "g", "b", "a"];

/// Reads an OpenEXR image file.
///
/// Returns the first layer's pixels as a channel-interleaved buffer
/// together with the file's header fields. The buffer is `f16` when
/// every channel is half precision, else `f32`.
///
/// The metadata map carries the native header fields plus `channels`
/// (lowercase names in buffer order), `num_channels`, and `compression`
/// resolved to an [`ImageCodec`].
///
/// # Errors
///
/// [`IoError::NotAnImageFile`] if the file fails the EXR magic-number
/// probe; [`IoError::Decode`] if the file cannot be parsed.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<(ImageData, Metadata)> {
    let path = path.as_ref();
    tracing::debug!("reading EXR file {}", path.display());

    let mut file = File::open(path)?;
    if !magic_number::is_exr(&mut file).unwrap_or(false) {
        return Err(IoError::NotAnImageFile {
            path: path.to_path_buf(),
        });
    }
    drop(file);

    let exr_image = ::exr::image::read::read()
        .no_deep_data()
        .largest_resolution_level()
        .all_channels()
        .first_valid_layer()
        .all_attributes()
        .from_file(path)
        .map_err(|error| IoError::Decode(error.to_string()))?;

    let layer = &exr_image.layer_data;
    let Vec2(width, height) = layer.size;

    // fix an order: lexicographic, with R, G, B, A pulled to the front
    let mut by_name: Vec<(String, &AnyChannel<FlatSamples>)> = layer
        .channel_data
        .list
        .iter()
        .map(|channel| (channel.name.to_string(), channel))
        .collect();
    by_name.sort_by(|a, b| a.0.cmp(&b.0));

    let mut ordered = Vec::with_capacity(by_name.len());
    for rgba in ["R", "G", "B", "A"] {
        if let Some(index) = by_name.iter().position(|(name, _)| name == rgba) {
            ordered.push(by_name.remove(index));
        }
    }
    ordered.extend(by_name);

    let channel_count = ordered.len();
    let all_half = ordered
        .iter()
        .all(|(_, channel)| matches!(channel.sample_data, FlatSamples::F16(_)));

    // stack per-channel planes into one interleaved buffer
    let (format, data) = if all_half {
        let mut samples = vec![f16::ZERO; width * height * channel_count];
        for (offset, (_, channel)) in ordered.iter().enumerate() {
            if let FlatSamples::F16(values) = &channel.sample_data {
                for (pixel, &value) in values.iter().enumerate() {
                    samples[pixel * channel_count + offset] = value;
                }
            }
        }
        (PixelFormat::F16, PixelData::F16(samples))
    } else {
        let mut samples = vec![0.0f32; width * height * channel_count];
        for (offset, (_, channel)) in ordered.iter().enumerate() {
            for (pixel, value) in channel.sample_data.values_as_f32().enumerate() {
                samples[pixel * channel_count + offset] = value;
            }
        }
        (PixelFormat::F32, PixelData::F32(samples))
    };

    let metadata = header_to_metadata(&exr_image, &ordered)?;

    let image = ImageData {
        width: width as u32,
        height: height as u32,
        channels: channel_count as u32,
        format,
        data,
    };

    Ok((image, metadata))
}

/// Writes image data and metadata as EXR to the given file path.
///
/// Metadata is sanitized with [`clean_metadata`] first, so reserved
/// header keys (including any caller-supplied `compression` entry) are
/// discarded; only the explicit `codec` parameter selects compression,
/// defaulting to [`ImageCodec::Piz`] when `None`.
///
/// Channel names matching `l`, `r`, `g`, `b` or `a` case-insensitively
/// are upper-cased in the file, following EXR convention.
///
/// # Errors
///
/// [`IoError::UnsupportedDtype`] if the buffer is not 16-bit or 32-bit
/// float; [`IoError::Encode`] if the sanitized channel list is longer
/// than the buffer's channel count or the file cannot be emitted.
pub fn write<P: AsRef<Path>>(
    path: P,
    image: &ImageData,
    metadata: &Metadata,
    codec: Option<ImageCodec>,
) -> IoResult<()> {
    let path = path.as_ref();
    let codec = codec.unwrap_or_default();
    tracing::debug!("writing EXR file {} with codec {}", path.display(), codec);

    if !image.format.is_float() {
        return Err(IoError::UnsupportedDtype {
            format: image.format,
        });
    }

    let cleaned = clean_metadata(image, metadata);
    let channel_names = cleaned.channels().unwrap_or_default();

    // images without an explicit channel axis get a single channel
    let stride = (image.channels as usize).max(1);
    if channel_names.len() > stride {
        return Err(IoError::Encode(format!(
            "channel list holds {} names but the image has {} channels",
            channel_names.len(),
            stride
        )));
    }

    let mut list: SmallVec<[AnyChannel<FlatSamples>; 4]> = SmallVec::new();
    for (offset, name) in channel_names.iter().enumerate() {
        let file_name = if WELL_KNOWN_CHANNELS.contains(&name.to_ascii_lowercase().as_str()) {
            name.to_ascii_uppercase()
        } else {
            name.clone()
        };

        let samples = match &image.data {
            PixelData::F16(data) => FlatSamples::F16(extract_channel(data, offset, stride)),
            PixelData::F32(data) => FlatSamples::F32(extract_channel(data, offset, stride)),
            _ => {
                return Err(IoError::UnsupportedDtype {
                    format: image.format,
                })
            }
        };

        list.push(AnyChannel::new(text(&file_name)?, samples));
    }

    let (layer_attributes, custom) = metadata_to_attributes(&cleaned)?;

    let layer = Layer::new(
        (image.width as usize, image.height as usize),
        layer_attributes,
        Encoding {
            compression: codec.into(),
            blocks: Blocks::ScanLines,
            line_order: LineOrder::Increasing,
        },
        AnyChannels::sort(list),
    );

    let mut exr_image = Image::from_layer(layer);
    exr_image.attributes.other.extend(custom);

    exr_image
        .write()
        .to_file(path)
        .map_err(|error| IoError::Encode(error.to_string()))?;

    Ok(())
}

/// Pulls one channel plane out of an interleaved buffer.
fn extract_channel<T: Copy>(data: &[T], offset: usize, stride: usize) -> Vec<T> {
    data.iter().skip(offset).step_by(stride).copied().collect()
}

/// Validates a string as EXR header text.
fn text(value: &str) -> IoResult<Text> {
    Text::new_or_none(value)
        .ok_or_else(|| IoError::Encode(format!("{value:?} is not valid EXR header text")))
}

/// Collects header fields of a decoded image into a metadata map.
fn header_to_metadata(
    exr_image: &Image<Layer<AnyChannels<FlatSamples>>>,
    ordered: &[(String, &AnyChannel<FlatSamples>)],
) -> IoResult<Metadata> {
    let mut metadata = Metadata::new();
    let layer = &exr_image.layer_data;
    let attrs = &layer.attributes;

    for (name, value) in &exr_image.attributes.other {
        if let Some(converted) = attr_to_value(value) {
            metadata.set(name.to_string(), converted);
        }
    }
    for (name, value) in &attrs.other {
        if let Some(converted) = attr_to_value(value) {
            metadata.set(name.to_string(), converted);
        }
    }

    if let Some(name) = &attrs.layer_name {
        metadata.set("name", AttrValue::Str(name.to_string()));
    }
    if let Some(owner) = &attrs.owner {
        metadata.set("owner", AttrValue::Str(owner.to_string()));
    }
    if let Some(comments) = &attrs.comments {
        metadata.set("comments", AttrValue::Str(comments.to_string()));
    }
    if let Some(date) = &attrs.capture_date {
        metadata.set("capDate", AttrValue::Str(date.to_string()));
    }
    if let Some(software) = &attrs.software_name {
        metadata.set("software", AttrValue::Str(software.to_string()));
    }

    let display = exr_image.attributes.display_window;
    metadata.set(
        "displayWindow",
        AttrValue::IntBounds {
            position: (display.position.x(), display.position.y()),
            size: (display.size.x(), display.size.y()),
        },
    );
    metadata.set(
        "dataWindow",
        AttrValue::IntBounds {
            position: (attrs.layer_position.x(), attrs.layer_position.y()),
            size: (layer.size.x(), layer.size.y()),
        },
    );
    metadata.set(
        "pixelAspectRatio",
        AttrValue::Float(exr_image.attributes.pixel_aspect),
    );
    metadata.set(
        "screenWindowCenter",
        AttrValue::FloatVec2(attrs.screen_window_center.x(), attrs.screen_window_center.y()),
    );
    metadata.set(
        "screenWindowWidth",
        AttrValue::Float(attrs.screen_window_width),
    );
    metadata.set(
        "lineOrder",
        AttrValue::Str(
            match layer.encoding.line_order {
                LineOrder::Increasing => "increasing",
                LineOrder::Decreasing => "decreasing",
                LineOrder::Unspecified => "unspecified",
            }
            .to_string(),
        ),
    );

    metadata.set(
        "compression",
        AttrValue::Codec(layer.encoding.compression.try_into()?),
    );
    metadata.set_channels(
        ordered
            .iter()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect(),
    );
    metadata.set("num_channels", AttrValue::Int(ordered.len() as i32));

    Ok(metadata)
}

/// Splits sanitized metadata into typed layer attributes and the custom
/// attribute map.
///
/// The `channels` entry is consumed by the channel loop and never lands
/// in the header; well-known text keys map onto the typed fields the
/// `exr` crate serializes under the same names.
fn metadata_to_attributes(
    cleaned: &Metadata,
) -> IoResult<(LayerAttributes, HashMap<Text, AttributeValue>)> {
    let mut attrs = LayerAttributes::default();
    let mut custom = HashMap::new();

    for (key, value) in cleaned.iter() {
        if key == "channels" {
            continue;
        }

        match (key.as_str(), value) {
            ("name", AttrValue::Str(v)) => attrs.layer_name = Some(text(v)?),
            ("owner", AttrValue::Str(v)) => attrs.owner = Some(text(v)?),
            ("comments", AttrValue::Str(v)) => attrs.comments = Some(text(v)?),
            ("capDate", AttrValue::Str(v)) => attrs.capture_date = Some(text(v)?),
            ("software", AttrValue::Str(v)) => attrs.software_name = Some(text(v)?),
            _ => {
                custom.insert(text(key)?, value_to_attr(value)?);
            }
        }
    }

    Ok((attrs, custom))
}

/// Converts a decoded header attribute into a metadata value.
///
/// Structured attribute kinds with no metadata counterpart (previews,
/// tile descriptions and the like) are dropped.
fn attr_to_value(value: &AttributeValue) -> Option<AttrValue> {
    match value {
        AttributeValue::Text(v) => Some(AttrValue::Str(v.to_string())),
        AttributeValue::I32(v) => Some(AttrValue::Int(*v)),
        AttributeValue::F32(v) => Some(AttrValue::Float(*v)),
        AttributeValue::F64(v) => Some(AttrValue::Double(*v)),
        AttributeValue::FloatVec2(v) => Some(AttrValue::FloatVec2(v.x(), v.y())),
        AttributeValue::IntegerBounds(v) => Some(AttrValue::IntBounds {
            position: (v.position.x(), v.position.y()),
            size: (v.size.x(), v.size.y()),
        }),
        AttributeValue::TextVector(v) => Some(AttrValue::StrList(
            v.iter().map(|item| item.to_string()).collect(),
        )),
        _ => None,
    }
}

/// Converts a metadata value into a writable header attribute.
fn value_to_attr(value: &AttrValue) -> IoResult<AttributeValue> {
    Ok(match value {
        AttrValue::Str(v) => AttributeValue::Text(text(v)?),
        AttrValue::Int(v) => AttributeValue::I32(*v),
        AttrValue::Float(v) => AttributeValue::F32(*v),
        AttrValue::Double(v) => AttributeValue::F64(*v),
        AttrValue::FloatVec2(x, y) => AttributeValue::FloatVec2(Vec2(*x, *y)),
        AttrValue::IntBounds { position, size } => AttributeValue::IntegerBounds(
            IntegerBounds::new(Vec2(position.0, position.1), Vec2(size.0, size.1)),
        ),
        AttrValue::StrList(v) => {
            let mut texts = Vec::with_capacity(v.len());
            for item in v {
                texts.push(text(item)?);
            }
            AttributeValue::TextVector(texts)
        }
        AttrValue::Codec(v) => AttributeValue::Text(text(v.name())?),
    })
}
