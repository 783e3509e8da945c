// Stream-level orchestration: page-by-page Ogg Opus demuxing and WebM
// header reading over one in-memory buffer.
//
// Each Demuxer owns its cursor, its page parser state, and its counters;
// independent streams get independent Demuxer values, so two buffers can
// be parsed concurrently without sharing anything.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::ogg::{OggPage, OggPageParser, PacketInfo, PlaybackPosition, OGG_SIGNATURE};
use crate::opus::{OpusHead, OpusPacket, OpusTags};
use crate::webm::{EbmlHeaderSegment, EbmlReader, EBML_HEADER_ID};

/// Container type detected from the first bytes of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Container {
    Ogg,
    Webm,
    Unknown,
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Ogg => write!(f, "ogg"),
            Container::Webm => write!(f, "webm"),
            Container::Unknown => write!(f, "unknown"),
        }
    }
}

/// Probe the leading bytes for a known container signature
pub fn detect_container(buf: &[u8]) -> Container {
    if buf.len() >= 4 && &buf[..4] == OGG_SIGNATURE {
        Container::Ogg
    } else if buf.len() >= 4 && buf[..4] == EBML_HEADER_ID {
        Container::Webm
    } else {
        Container::Unknown
    }
}

/// Open an Ogg stream for page-by-page demuxing
pub fn open_ogg_stream(buf: &[u8]) -> Demuxer<'_> {
    Demuxer::new(buf)
}

/// Read the EBML header segment of a WebM buffer
pub fn open_webm_header(buf: &[u8]) -> Result<EbmlHeaderSegment> {
    let mut cursor = ByteCursor::new(buf);
    EbmlReader::read_header_segment(&mut cursor)
}

/// Summary of one whole Ogg Opus stream
#[derive(Debug, Clone, Serialize)]
pub struct OpusStreamInfo {
    pub head: OpusHead,
    pub tags: OpusTags,
    pub page_count: u64,
    pub total_packets: u64,
    /// Position computed from the final page's granule position
    pub position: Option<PlaybackPosition>,
}

/// Pull-based Ogg Opus demuxer over one buffer
pub struct Demuxer<'a> {
    cursor: ByteCursor<'a>,
    parser: OggPageParser,
    total_packets: u64,
    page_count: u64,
}

impl<'a> Demuxer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Demuxer {
            cursor: ByteCursor::new(buf),
            parser: OggPageParser::new(),
            total_packets: 0,
            page_count: 0,
        }
    }

    /// Packets finished across all pages read so far; a packet spanning
    /// several pages counts once, on the page that finishes it
    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    /// Pages read so far
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    /// Bytes left in the buffer
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Read the next page and the packets it finishes.
    ///
    /// With a `pre_skip` from the OpusHead header the page's granule
    /// position is also converted into a playback position.
    pub fn read_page(&mut self, pre_skip: Option<u16>) -> Result<(OggPage, PacketInfo)> {
        let (page, info) = self.parser.read_page(&mut self.cursor, pre_skip)?;
        self.page_count += 1;
        self.total_packets += info.packets.len() as u64;
        Ok((page, info))
    }

    /// Walk the whole stream: OpusHead, OpusTags, then audio pages until
    /// the end-of-stream flag.
    pub fn read_opus_stream(&mut self) -> Result<OpusStreamInfo> {
        // First page carries exactly the identification header
        let (first_page, info) = self.read_page(None)?;
        if !first_page.is_bos() {
            return Err(Error::format(
                "first page is missing the beginning-of-stream flag",
            ));
        }
        let head_packet = info.packets.first().ok_or_else(|| {
            Error::format("first page finished no packet, expected OpusHead")
        })?;
        let head = OpusHead::decode(&head_packet.data)?;

        // The comment header starts on the second page but may span
        // several pages when tags are large
        let tags_packet = self.next_finished_packet(None)?;
        let tags = OpusTags::decode(&tags_packet.data)?;

        // Audio pages until end-of-stream
        let mut position = None;
        loop {
            let (page, info) = self.read_page(Some(head.pre_skip))?;
            if let Some(pos) = info.position {
                position = Some(pos);
            }
            if page.is_eos() {
                break;
            }
            if self.cursor.is_empty() {
                // Buffer exhausted without an end-of-stream page
                return Err(Error::Truncated {
                    needed: 1,
                    available: 0,
                });
            }
        }

        Ok(OpusStreamInfo {
            head,
            tags,
            page_count: self.page_count,
            total_packets: self.total_packets,
            position,
        })
    }

    /// Read pages until one finishes a packet, then return that packet
    fn next_finished_packet(&mut self, pre_skip: Option<u16>) -> Result<OpusPacket> {
        loop {
            let (_, mut info) = self.read_page(pre_skip)?;
            if !info.packets.is_empty() {
                return Ok(info.packets.remove(0));
            }
        }
    }
}
