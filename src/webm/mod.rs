// WebM / EBML header support
//
// An EBML element is an (ID, size, payload) triple. IDs and sizes are both
// VINTs, but IDs keep their marker bits as part of their identity while
// sizes use the masked value. The EBML header of a WebM file is a fixed
// sequence:
//
//   0x1A45DFA3 (EBML header)      VINT size, then children:
//     0x4286 EBMLVersion          0x42F7 EBMLReadVersion
//     0x42F2 EBMLMaxIDLength      0x42F3 EBMLMaxSizeLength
//     0x4282 DocType ("webm")     0x4287 DocTypeVersion
//     0x4285 DocTypeReadVersion
//   0x18538067 (Segment)          VINT size (often "unknown")
//
// This is a strict reader for exactly that sequence, not a general tree
// walker: an unexpected ID is a format error, never a guess.

pub mod vint;

pub use vint::VarInt;

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

pub const EBML_HEADER_ID: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
pub const SEGMENT_ID: [u8; 4] = [0x18, 0x53, 0x80, 0x67];

pub const EBML_VERSION_ID: [u8; 2] = [0x42, 0x86];
pub const EBML_READ_VERSION_ID: [u8; 2] = [0x42, 0xF7];
pub const EBML_MAX_ID_LENGTH_ID: [u8; 2] = [0x42, 0xF2];
pub const EBML_MAX_SIZE_LENGTH_ID: [u8; 2] = [0x42, 0xF3];
pub const DOC_TYPE_ID: [u8; 2] = [0x42, 0x82];
pub const DOC_TYPE_VERSION_ID: [u8; 2] = [0x42, 0x87];
pub const DOC_TYPE_READ_VERSION_ID: [u8; 2] = [0x42, 0x85];

/// One leaf EBML element: raw ID bytes, declared size, payload copy
#[derive(Debug, Clone)]
pub struct EbmlElement {
    pub id: Vec<u8>,
    pub size: VarInt,
    pub payload: Vec<u8>,
}

impl EbmlElement {
    /// Payload interpreted as a big-endian unsigned integer. Only defined
    /// for payloads of at most 8 bytes; integer-valued header children are
    /// length-checked on read.
    pub fn as_uint(&self) -> u64 {
        self.payload.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
    }
}

/// Decoded EBML header of a WebM file, plus the Segment that follows it
#[derive(Debug, Clone, Serialize)]
pub struct EbmlHeaderSegment {
    pub ebml_version: u64,
    pub ebml_read_version: u64,
    pub max_id_length: u64,
    pub max_size_length: u64,
    pub doc_type: String,
    pub doc_type_version: u64,
    pub doc_type_read_version: u64,
    /// Declared size of the Segment body; None when the stream uses the
    /// all-ones "unknown size" encoding
    pub segment_size: Option<u64>,
}

/// Strict reader for the fixed WebM EBML header sequence
pub struct EbmlReader;

impl EbmlReader {
    /// Read the EBML header and the Segment ID/size that follow it
    pub fn read_header_segment(cursor: &mut ByteCursor<'_>) -> Result<EbmlHeaderSegment> {
        expect_id(cursor, &EBML_HEADER_ID, "EBML header")?;
        // Header size is read but not used to skip: every child is parsed
        let _header_size = vint::read_value(cursor)?;

        let version = read_uint_child(cursor, &EBML_VERSION_ID, "EBMLVersion")?;
        let read_version = read_uint_child(cursor, &EBML_READ_VERSION_ID, "EBMLReadVersion")?;
        let max_id_length = read_uint_child(cursor, &EBML_MAX_ID_LENGTH_ID, "EBMLMaxIDLength")?;
        let max_size_length =
            read_uint_child(cursor, &EBML_MAX_SIZE_LENGTH_ID, "EBMLMaxSizeLength")?;
        let doc_type = read_child(cursor, &DOC_TYPE_ID, "DocType")?;
        let doc_type_version = read_uint_child(cursor, &DOC_TYPE_VERSION_ID, "DocTypeVersion")?;
        let doc_type_read_version =
            read_uint_child(cursor, &DOC_TYPE_READ_VERSION_ID, "DocTypeReadVersion")?;

        expect_id(cursor, &SEGMENT_ID, "Segment")?;
        let segment_size = vint::read_value(cursor)?;

        Ok(EbmlHeaderSegment {
            ebml_version: version.as_uint(),
            ebml_read_version: read_version.as_uint(),
            max_id_length: max_id_length.as_uint(),
            max_size_length: max_size_length.as_uint(),
            doc_type: String::from_utf8_lossy(&doc_type.payload).to_string(),
            doc_type_version: doc_type_version.as_uint(),
            doc_type_read_version: doc_type_read_version.as_uint(),
            segment_size: known_size(segment_size),
        })
    }
}

/// Read one (ID, size, payload) triple and check the ID matches
fn read_child(
    cursor: &mut ByteCursor<'_>,
    expected_id: &[u8],
    name: &str,
) -> Result<EbmlElement> {
    let id = vint::read_raw(cursor)?;
    if id != expected_id {
        return Err(Error::format(format!(
            "expected {} ID {:02X?}, found {:02X?}",
            name, expected_id, id
        )));
    }
    let size = vint::read_value(cursor)?;
    let declared = size.value as usize;
    if declared > cursor.remaining() {
        return Err(Error::Truncated {
            needed: declared,
            available: cursor.remaining(),
        });
    }
    let payload = cursor.read(declared)?.to_vec();
    Ok(EbmlElement { id, size, payload })
}

/// Read a child whose payload is a big-endian unsigned integer. Payloads
/// over 8 bytes cannot fit a u64 and would shift their high bytes away in
/// `as_uint`, so they are rejected up front.
fn read_uint_child(
    cursor: &mut ByteCursor<'_>,
    expected_id: &[u8],
    name: &str,
) -> Result<EbmlElement> {
    let element = read_child(cursor, expected_id, name)?;
    if element.payload.len() > 8 {
        return Err(Error::format(format!(
            "{} payload is {} bytes, integer elements allow at most 8",
            name,
            element.payload.len()
        )));
    }
    Ok(element)
}

fn expect_id(cursor: &mut ByteCursor<'_>, expected: &[u8], name: &str) -> Result<()> {
    let id = vint::read_raw(cursor)?;
    if id != expected {
        return Err(Error::format(format!(
            "expected {} ID {:02X?}, found {:02X?}",
            name, expected, id
        )));
    }
    Ok(())
}

// The all-ones size value means "unknown", used by live streams for the
// Segment body
fn known_size(size: VarInt) -> Option<u64> {
    if size.value == (1u64 << (7 * size.width)) - 1 {
        None
    } else {
        Some(size.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(id: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.push(0x80 | payload.len() as u8);
        out.extend_from_slice(payload);
        out
    }

    pub(crate) fn webm_header_bytes() -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&child(&EBML_VERSION_ID, &[0x01]));
        body.extend_from_slice(&child(&EBML_READ_VERSION_ID, &[0x01]));
        body.extend_from_slice(&child(&EBML_MAX_ID_LENGTH_ID, &[0x04]));
        body.extend_from_slice(&child(&EBML_MAX_SIZE_LENGTH_ID, &[0x08]));
        body.extend_from_slice(&child(&DOC_TYPE_ID, b"webm"));
        body.extend_from_slice(&child(&DOC_TYPE_VERSION_ID, &[0x04]));
        body.extend_from_slice(&child(&DOC_TYPE_READ_VERSION_ID, &[0x02]));

        let mut data = EBML_HEADER_ID.to_vec();
        data.push(0x80 | body.len() as u8);
        data.extend_from_slice(&body);
        data.extend_from_slice(&SEGMENT_ID);
        // Unknown segment size: all value bits set in an 8-byte VINT
        data.extend_from_slice(&[0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        data
    }

    #[test]
    fn test_read_webm_header() {
        let data = webm_header_bytes();
        let mut cursor = ByteCursor::new(&data);
        let header = EbmlReader::read_header_segment(&mut cursor).unwrap();

        assert_eq!(header.ebml_version, 1);
        assert_eq!(header.ebml_read_version, 1);
        assert_eq!(header.max_id_length, 4);
        assert_eq!(header.max_size_length, 8);
        assert_eq!(header.doc_type, "webm");
        assert_eq!(header.doc_type_version, 4);
        assert_eq!(header.doc_type_read_version, 2);
        assert_eq!(header.segment_size, None);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_known_segment_size() {
        let mut data = webm_header_bytes();
        let len = data.len();
        data.truncate(len - 8);
        data.push(0xC4); // width 1, value 0x44
        let mut cursor = ByteCursor::new(&data);
        let header = EbmlReader::read_header_segment(&mut cursor).unwrap();
        assert_eq!(header.segment_size, Some(0x44));
    }

    #[test]
    fn test_wrong_top_level_id() {
        let mut data = webm_header_bytes();
        data[3] = 0xA4;
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            EbmlReader::read_header_segment(&mut cursor),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_wrong_segment_id() {
        let mut data = webm_header_bytes();
        let segment_at = data.len() - 12;
        data[segment_at + 3] = 0x68; // corrupt last Segment ID byte
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            EbmlReader::read_header_segment(&mut cursor),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_reordered_children_rejected() {
        let mut body = Vec::new();
        // EBMLReadVersion first: strict order violated
        body.extend_from_slice(&child(&EBML_READ_VERSION_ID, &[0x01]));
        body.extend_from_slice(&child(&EBML_VERSION_ID, &[0x01]));
        let mut data = EBML_HEADER_ID.to_vec();
        data.push(0x80 | body.len() as u8);
        data.extend_from_slice(&body);

        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            EbmlReader::read_header_segment(&mut cursor),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_oversized_integer_payload_rejected() {
        // A 9-byte EBMLVersion payload cannot fit a u64 and must not be
        // silently truncated to one
        let mut data = EBML_HEADER_ID.to_vec();
        data.push(0x9F);
        data.extend_from_slice(&child(&EBML_VERSION_ID, &[0x01; 9]));
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            EbmlReader::read_header_segment(&mut cursor),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_child_size_past_end_is_truncated() {
        let mut data = EBML_HEADER_ID.to_vec();
        data.push(0x9F);
        data.extend_from_slice(&EBML_VERSION_ID);
        data.push(0x88); // declares 8 payload bytes
        data.push(0x01); // only one present
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            EbmlReader::read_header_segment(&mut cursor),
            Err(Error::Truncated { .. })
        ));
    }
}
