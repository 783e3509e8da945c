// opusmeta - a demuxer for Ogg Opus streams and WebM/EBML headers
//
// The crate splits binary media containers into addressable elements
// without decoding any audio: Ogg pages and their reconstructed Opus
// packets (including packets that continue across page boundaries), the
// OpusHead/OpusTags headers, and the fixed EBML header sequence of a WebM
// file. Everything parses out of an in-memory buffer through a
// bounds-checked cursor; nothing panics on malformed input.

pub mod cursor;
pub mod demux;
pub mod error;
pub mod ogg;
pub mod opus;
pub mod webm;

pub use cursor::ByteCursor;
pub use demux::{detect_container, open_ogg_stream, open_webm_header};
pub use demux::{Container, Demuxer, OpusStreamInfo};
pub use error::{Error, Result};
pub use ogg::{OggPage, OggPageParser, PacketInfo, PlaybackPosition};
pub use opus::{OpusHead, OpusPacket, OpusTags};
pub use webm::{EbmlElement, EbmlHeaderSegment, EbmlReader, VarInt};
