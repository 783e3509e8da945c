// Opus header support (in Ogg container)
//
// The first reconstructed packet of an Ogg Opus stream is the
// identification header, the second is the comment header:
//
// OpusHead: "OpusHead" (8 bytes), version (1), channel count (1),
//           pre-skip (2, LE), input sample rate (4, LE, informational),
//           output gain (2, LE, signed Q7.8 dB), channel mapping family (1),
//           [stream count (1), coupled count (1), mapping (channels bytes)]
//           present only when the mapping family is > 0.
//
// OpusTags: "OpusTags" (8 bytes), vendor length (4, LE), vendor string,
//           comment count (4, LE), then per comment: length (4, LE) and
//           that many bytes of UTF-8, conventionally "FIELD=value".
//
// Reference:
// - RFC 7845: Ogg Encapsulation for the Opus Audio Codec
// - https://wiki.xiph.org/OggOpus

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

pub const OPUS_HEAD_SIGNATURE: &[u8; 8] = b"OpusHead";
pub const OPUS_TAGS_SIGNATURE: &[u8; 8] = b"OpusTags";

/// One reconstructed Opus packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpusPacket {
    pub data: Vec<u8>,
}

impl OpusPacket {
    /// First byte of every Opus packet is its TOC (table of contents) byte
    pub fn toc(&self) -> Option<u8> {
        self.data.first().copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Channel mapping table, present when the mapping family is > 0.
/// The per-channel indices are kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelMappingTable {
    pub stream_count: u8,
    pub coupled_count: u8,
    pub mapping: Vec<u8>,
}

/// Opus identification header ("OpusHead")
#[derive(Debug, Clone, Serialize)]
pub struct OpusHead {
    pub version: u8,
    pub channel_count: u8,
    pub pre_skip: u16,
    /// Sample rate of the original input; informational only, playback
    /// always runs at 48 kHz
    pub input_sample_rate: u32,
    /// Q7.8 fixed-point dB gain to apply when decoding
    pub output_gain: i16,
    pub channel_mapping_family: u8,
    pub channel_mapping: Option<ChannelMappingTable>,
}

impl OpusHead {
    /// Decode the identification header from the first packet of the stream
    pub fn decode(packet: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(packet);

        let magic = read_header_field(&mut cursor, 8)?;
        if magic != OPUS_HEAD_SIGNATURE {
            return Err(Error::format(format!(
                "bad OpusHead magic {:02X?}",
                magic
            )));
        }

        let version = read_header_byte(&mut cursor)?;
        if version != 1 {
            return Err(Error::format(format!(
                "unsupported OpusHead version {}",
                version
            )));
        }

        let channel_count = read_header_byte(&mut cursor)?;
        let pre_skip = cursor.read_u16_le().map_err(format_short)?;
        let input_sample_rate = cursor.read_u32_le().map_err(format_short)?;
        let output_gain = cursor.read_i16_le().map_err(format_short)?;
        let channel_mapping_family = read_header_byte(&mut cursor)?;

        // Mapping family 0 means mono or plain L/R stereo; the table is
        // absent and must not be read
        let channel_mapping = if channel_mapping_family > 0 {
            let stream_count = read_header_byte(&mut cursor)?;
            let coupled_count = read_header_byte(&mut cursor)?;
            let mapping = read_header_field(&mut cursor, channel_count as usize)?.to_vec();
            Some(ChannelMappingTable {
                stream_count,
                coupled_count,
                mapping,
            })
        } else {
            None
        };

        Ok(OpusHead {
            version,
            channel_count,
            pre_skip,
            input_sample_rate,
            output_gain,
            channel_mapping_family,
            channel_mapping,
        })
    }

    /// Output gain in dB
    pub fn output_gain_db(&self) -> f64 {
        self.output_gain as f64 / 256.0
    }
}

/// Opus comment header ("OpusTags")
#[derive(Debug, Clone, Default, Serialize)]
pub struct OpusTags {
    pub vendor: String,
    /// Comment strings as stored, conventionally "FIELD=value"
    pub comments: Vec<String>,
}

impl OpusTags {
    /// Decode the comment header from the second packet of the stream
    pub fn decode(packet: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(packet);

        let magic = read_header_field(&mut cursor, 8)?;
        if magic != OPUS_TAGS_SIGNATURE {
            return Err(Error::format(format!(
                "bad OpusTags magic {:02X?}",
                magic
            )));
        }

        let vendor_len = cursor.read_u32_le().map_err(format_short)? as usize;
        let vendor_bytes = read_prefixed(&mut cursor, vendor_len)?;
        let vendor = String::from_utf8_lossy(vendor_bytes).to_string();

        let comment_count = cursor.read_u32_le().map_err(format_short)? as usize;
        let mut comments = Vec::new();
        for _ in 0..comment_count {
            let len = cursor.read_u32_le().map_err(format_short)? as usize;
            let bytes = read_prefixed(&mut cursor, len)?;
            comments.push(String::from_utf8_lossy(bytes).to_string());
        }

        Ok(OpusTags { vendor, comments })
    }

    /// Look up a comment value by field name, case-insensitively
    pub fn get(&self, field: &str) -> Option<&str> {
        self.comments.iter().find_map(|comment| {
            let (f, v) = comment.split_once('=')?;
            if f.eq_ignore_ascii_case(field) {
                Some(v)
            } else {
                None
            }
        })
    }
}

// Fixed header fields that run short mean the packet is not the header we
// expected: report Format, not Bounds
fn format_short(err: Error) -> Error {
    match err {
        Error::Bounds { needed, available } => Error::format(format!(
            "header packet too short: needed {} bytes, {} available",
            needed, available
        )),
        other => other,
    }
}

fn read_header_field<'a>(cursor: &mut ByteCursor<'a>, n: usize) -> Result<&'a [u8]> {
    cursor.read(n).map_err(format_short)
}

fn read_header_byte(cursor: &mut ByteCursor<'_>) -> Result<u8> {
    cursor.read_u8().map_err(format_short)
}

// Length-prefixed fields that run short are truncation, distinguishable
// from a wrong-magic packet
fn read_prefixed<'a>(cursor: &mut ByteCursor<'a>, len: usize) -> Result<&'a [u8]> {
    if len > cursor.remaining() {
        return Err(Error::Truncated {
            needed: len,
            available: cursor.remaining(),
        });
    }
    cursor.read(len)
}
