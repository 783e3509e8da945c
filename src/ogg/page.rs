use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::ogg::{
    OGG_HEADER_TYPE_BOS, OGG_HEADER_TYPE_CONTINUATION, OGG_HEADER_TYPE_EOS, OGG_SIGNATURE,
    OPUS_SAMPLE_RATE,
};
use crate::opus::OpusPacket;

/// Ogg page header fields plus lacing table
///
/// The CRC and page sequence are exposed but not verified here; a caller
/// that wants strict checking can do so on top of these fields.
#[derive(Debug, Clone)]
pub struct OggPage {
    pub version: u8,
    pub header_type: u8,
    pub granule_position: u64,
    pub bitstream_serial: u32,
    pub page_sequence: u32,
    pub crc: u32,
    pub segment_count: u8,
    pub lacing_table: Vec<u8>,
}

impl OggPage {
    pub fn is_continuation(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_CONTINUATION != 0
    }

    pub fn is_bos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_EOS != 0
    }

    /// Total page body size described by the lacing table
    pub fn body_size(&self) -> usize {
        self.lacing_table.iter().map(|&x| x as usize).sum()
    }
}

/// Stream position derived from a page's granule position and the
/// pre-skip declared in the OpusHead header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackPosition {
    pub pcm_sample_position: u64,
    pub playback_time_secs: u64,
}

/// Per-page packet reconstruction results
#[derive(Debug)]
pub struct PacketInfo {
    /// Packets finished by this page, carried-over bytes included
    pub packets: Vec<OpusPacket>,
    /// Lengths of the finished packets, in order
    pub packet_lengths: Vec<usize>,
    /// Sum of the finished packet lengths
    pub total_body_length: usize,
    /// A packet ran off the end of this page's lacing table and is
    /// waiting for the next page
    pub has_pending: bool,
    /// Present when a pre-skip was supplied and the page carries a
    /// meaningful granule position
    pub position: Option<PlaybackPosition>,
}

/// Ogg page reader with cross-page packet reassembly
///
/// A packet whose lacing run is still open when a page's table ends
/// continues on the next page. The parser owns the partial packet bytes
/// between `read_page` calls; `pending` is non-empty only between calls.
#[derive(Debug, Default)]
pub struct OggPageParser {
    pending: Vec<u8>,
    pending_open: bool,
}

impl OggPageParser {
    pub fn new() -> Self {
        OggPageParser::default()
    }

    /// True if a partial packet is waiting for the next page
    pub fn has_pending(&self) -> bool {
        self.pending_open
    }

    /// Read one page: fixed header, lacing table, and body.
    ///
    /// Packets finished by this page are returned in `PacketInfo`; a
    /// trailing unterminated lacing run is held back and prepended to the
    /// first packet of the next page. If `pre_skip` is given, the page's
    /// granule position is converted to a playback position.
    pub fn read_page(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        pre_skip: Option<u16>,
    ) -> Result<(OggPage, PacketInfo)> {
        let capture = cursor.read(4)?;
        if capture != OGG_SIGNATURE {
            return Err(Error::format(format!(
                "bad Ogg capture pattern {:02X?}, stream is unsynchronized",
                capture
            )));
        }

        let version = cursor.read_u8()?;
        if version != 0 {
            return Err(Error::format(format!("unsupported Ogg version {}", version)));
        }

        let header_type = cursor.read_u8()?;
        let granule_position = cursor.read_u64_le()?;
        let bitstream_serial = cursor.read_u32_le()?;
        let page_sequence = cursor.read_u32_le()?;
        let crc = cursor.read_u32_le()?;
        let segment_count = cursor.read_u8()?;
        let lacing_table = cursor.read(segment_count as usize)?.to_vec();

        let page = OggPage {
            version,
            header_type,
            granule_position,
            bitstream_serial,
            page_sequence,
            crc,
            segment_count,
            lacing_table,
        };

        let position = match pre_skip {
            // Granule of all ones means no packet finishes on this page
            Some(_) if page.granule_position == u64::MAX => None,
            Some(skip) => {
                let pcm = page
                    .granule_position
                    .checked_sub(skip as u64)
                    .ok_or(Error::GranuleUnderflow {
                        granule: page.granule_position,
                        pre_skip: skip,
                    })?;
                Some(PlaybackPosition {
                    pcm_sample_position: pcm,
                    playback_time_secs: pcm / OPUS_SAMPLE_RATE,
                })
            }
            None => None,
        };

        let body = cursor.read(page.body_size())?;
        let info = self.split_packets(&page, body, position)?;

        if page.is_eos() && self.pending_open {
            return Err(Error::Truncated {
                needed: self.pending.len() + 1,
                available: self.pending.len(),
            });
        }

        Ok((page, info))
    }

    /// Walk the lacing table and cut the page body into packets.
    ///
    /// An entry of 255 means "at least 255 more bytes belong to this
    /// packet"; an entry < 255 terminates it. A run of 255s that reaches
    /// the end of the table stays open across the page boundary.
    fn split_packets(
        &mut self,
        page: &OggPage,
        body: &[u8],
        position: Option<PlaybackPosition>,
    ) -> Result<PacketInfo> {
        let mut packets = Vec::new();
        let mut offset = 0usize;
        let mut run_len = 0usize;
        let mut run_closed = true;

        for &entry in &page.lacing_table {
            run_len += entry as usize;
            run_closed = entry < 255;
            if run_closed {
                let mut data = std::mem::take(&mut self.pending);
                data.extend_from_slice(&body[offset..offset + run_len]);
                packets.push(OpusPacket { data });
                offset += run_len;
                run_len = 0;
                self.pending_open = false;
            }
        }

        // Unterminated trailing run: hold its bytes until the next page
        if !run_closed || run_len > 0 {
            self.pending.extend_from_slice(&body[offset..offset + run_len]);
            self.pending_open = true;
        }

        let packet_lengths: Vec<usize> = packets.iter().map(|p| p.data.len()).collect();
        let total_body_length = packet_lengths.iter().sum();

        Ok(PacketInfo {
            packets,
            packet_lengths,
            total_body_length,
            has_pending: self.pending_open,
            position,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;

    /// Build a single Ogg page: header, lacing table, body
    pub(crate) fn build_page(
        header_type: u8,
        granule: u64,
        sequence: u32,
        lacing: &[u8],
        body: &[u8],
    ) -> Vec<u8> {
        assert_eq!(lacing.iter().map(|&x| x as usize).sum::<usize>(), body.len());
        let mut page = Vec::new();
        page.extend_from_slice(b"OggS");
        page.push(0); // version
        page.push(header_type);
        page.extend_from_slice(&granule.to_le_bytes());
        page.extend_from_slice(&0x1234_5678u32.to_le_bytes()); // serial
        page.extend_from_slice(&sequence.to_le_bytes());
        page.extend_from_slice(&0u32.to_le_bytes()); // crc, not verified
        page.push(lacing.len() as u8);
        page.extend_from_slice(lacing);
        page.extend_from_slice(body);
        page
    }

    #[test]
    fn test_single_page_packet_lengths() {
        // Three packets: 10, 255+20, 0 bytes
        let lacing = [10, 255, 20, 0];
        let body = vec![0xAB; 285];
        let data = build_page(OGG_HEADER_TYPE_BOS, 0, 0, &lacing, &body);

        let mut cursor = ByteCursor::new(&data);
        let mut parser = OggPageParser::new();
        let (page, info) = parser.read_page(&mut cursor, None).unwrap();

        assert!(page.is_bos());
        assert_eq!(info.packet_lengths, vec![10, 275, 0]);
        assert_eq!(info.total_body_length, 285);
        assert!(!info.has_pending);
        assert!(!parser.has_pending());
    }

    #[test]
    fn test_cross_page_packet_continuation() {
        // Page 1 lacing [255, 10, 255]: one finished packet of 265 bytes,
        // then a pending run of 255 left open at the page boundary. Page 2
        // lacing [255, 5, 20]: the pending packet finishes at
        // 255+255+5 = 515, plus one more of 20.
        let body1: Vec<u8> = (0..520u32).map(|i| (i % 251) as u8).collect();
        let body2: Vec<u8> = (0..280u32).map(|i| (i % 241) as u8).collect();
        let page1 = build_page(OGG_HEADER_TYPE_BOS, 0, 0, &[255, 10, 255], &body1);
        let page2 = build_page(0, 960, 1, &[255, 5, 20], &body2);

        let mut stream = page1;
        stream.extend_from_slice(&page2);
        let mut cursor = ByteCursor::new(&stream);
        let mut parser = OggPageParser::new();

        let (_, info1) = parser.read_page(&mut cursor, None).unwrap();
        assert_eq!(info1.packet_lengths, vec![265]);
        assert!(info1.has_pending);
        assert!(parser.has_pending());

        let (_, info2) = parser.read_page(&mut cursor, None).unwrap();
        assert_eq!(info2.packet_lengths, vec![515, 20]);
        assert!(!info2.has_pending);

        // The merged packet must carry page 1's tail bytes followed by
        // page 2's leading bytes, in order
        let merged = &info2.packets[0].data;
        assert_eq!(merged[..255], body1[265..520]);
        assert_eq!(merged[255..], body2[..260]);
    }

    #[test]
    fn test_bad_capture_pattern() {
        let mut data = build_page(0, 0, 0, &[1], &[0x00]);
        data[3] = b'X'; // "OggX"
        let mut cursor = ByteCursor::new(&data);
        let mut parser = OggPageParser::new();
        assert!(matches!(
            parser.read_page(&mut cursor, None),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_nonzero_version_rejected() {
        let mut data = build_page(0, 0, 0, &[1], &[0x00]);
        data[4] = 1;
        let mut cursor = ByteCursor::new(&data);
        let mut parser = OggPageParser::new();
        assert!(matches!(
            parser.read_page(&mut cursor, None),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_playback_position() {
        let data = build_page(0, 48048, 3, &[4], &[1, 2, 3, 4]);
        let mut cursor = ByteCursor::new(&data);
        let mut parser = OggPageParser::new();
        let (_, info) = parser.read_page(&mut cursor, Some(48)).unwrap();

        let pos = info.position.unwrap();
        assert_eq!(pos.pcm_sample_position, 48000);
        assert_eq!(pos.playback_time_secs, 1);
    }

    #[test]
    fn test_granule_underflow() {
        let data = build_page(0, 10, 3, &[1], &[0xFF]);
        let mut cursor = ByteCursor::new(&data);
        let mut parser = OggPageParser::new();
        assert!(matches!(
            parser.read_page(&mut cursor, Some(48)),
            Err(Error::GranuleUnderflow {
                granule: 10,
                pre_skip: 48
            })
        ));
    }

    #[test]
    fn test_no_position_for_unset_granule() {
        let data = build_page(0, u64::MAX, 3, &[1], &[0xFF]);
        let mut cursor = ByteCursor::new(&data);
        let mut parser = OggPageParser::new();
        let (_, info) = parser.read_page(&mut cursor, Some(48)).unwrap();
        assert!(info.position.is_none());
    }

    #[test]
    fn test_eos_with_pending_packet_is_truncated() {
        let body = vec![0x00; 255];
        let data = build_page(OGG_HEADER_TYPE_EOS, 960, 7, &[255], &body);
        let mut cursor = ByteCursor::new(&data);
        let mut parser = OggPageParser::new();
        assert!(matches!(
            parser.read_page(&mut cursor, None),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_truncated_header_never_reads_past_end() {
        let full = build_page(0, 0, 0, &[1], &[0x00]);
        for cut in 0..full.len() {
            let mut cursor = ByteCursor::new(&full[..cut]);
            let mut parser = OggPageParser::new();
            assert!(parser.read_page(&mut cursor, None).is_err());
        }
    }
}
