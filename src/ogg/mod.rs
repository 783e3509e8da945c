// Ogg container support
//
// Ogg Page layout:
// - Capture Pattern: "OggS" (4 bytes)
// - Version: 0 (1 byte)
// - Header Type: 1=continuation, 2=bos, 4=eos (1 byte)
// - Granule Position (8 bytes, LE)
// - Bitstream Serial Number (4 bytes, LE)
// - Page Sequence Number (4 bytes, LE)
// - CRC Checksum (4 bytes, LE)
// - Number of Page Segments (1 byte)
// - Lacing Table (1 byte per segment)
// - Page Body (sum of lacing entries bytes)
//
// The lacing table splits the body into logical packets: a run of 255
// entries means "packet continues", terminated by an entry < 255. A run
// still open when the table ends continues on the *next* page, so packet
// reassembly state lives in the parser, not in any single page.

pub mod page;

pub use page::{OggPage, OggPageParser, PacketInfo, PlaybackPosition};

// Ogg capture pattern
pub const OGG_SIGNATURE: &[u8; 4] = b"OggS";

// Ogg page header type flags
pub const OGG_HEADER_TYPE_CONTINUATION: u8 = 0x01;
pub const OGG_HEADER_TYPE_BOS: u8 = 0x02; // Beginning of Stream
pub const OGG_HEADER_TYPE_EOS: u8 = 0x04; // End of Stream

/// Opus always runs its granule clock at 48 kHz, whatever the input rate was
pub const OPUS_SAMPLE_RATE: u64 = 48_000;
