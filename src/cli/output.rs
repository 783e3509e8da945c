// Pretty terminal output for the CLI subcommands

use serde::Serialize;

use opusmeta::{EbmlHeaderSegment, OggPage, OpusStreamInfo, PacketInfo};

/// One row of the `pages` table
#[derive(Debug, Serialize)]
pub struct PageRow {
    pub sequence: u32,
    pub granule_position: u64,
    pub header_type: u8,
    pub body_length: usize,
    pub finished_packets: usize,
    pub has_pending: bool,
}

impl PageRow {
    pub fn new(page: &OggPage, info: &PacketInfo) -> Self {
        PageRow {
            sequence: page.page_sequence,
            granule_position: page.granule_position,
            header_type: page.header_type,
            body_length: info.total_body_length,
            finished_packets: info.packets.len(),
            has_pending: info.has_pending,
        }
    }
}

pub fn print_stream_info(path: &str, info: &OpusStreamInfo, quiet: bool) {
    if !quiet {
        println!("{}:", path);
    }
    println!("  channels:        {}", info.head.channel_count);
    println!("  pre-skip:        {} samples", info.head.pre_skip);
    println!("  input rate:      {} Hz", info.head.input_sample_rate);
    println!("  output gain:     {:.2} dB", info.head.output_gain_db());
    println!("  mapping family:  {}", info.head.channel_mapping_family);
    println!("  vendor:          {}", info.tags.vendor);
    for comment in &info.tags.comments {
        println!("  tag:             {}", comment);
    }
    println!("  pages:           {}", info.page_count);
    println!("  opus packets:    {}", info.total_packets);
    if let Some(pos) = info.position {
        println!(
            "  duration:        {}s ({} PCM samples)",
            pos.playback_time_secs, pos.pcm_sample_position
        );
    }
}

pub fn print_page_table(rows: &[PageRow], total_packets: u64) {
    println!("  seq      granule         type  body    packets  pending");
    for row in rows {
        println!(
            "  {:<8} {:<15} {:#04x}  {:<7} {:<8} {}",
            row.sequence,
            // All-ones granule means no packet finished on the page
            if row.granule_position == u64::MAX {
                "-".to_string()
            } else {
                row.granule_position.to_string()
            },
            row.header_type,
            row.body_length,
            row.finished_packets,
            if row.has_pending { "yes" } else { "no" },
        );
    }
    println!("  total packets: {}", total_packets);
}

pub fn print_webm_header(path: &str, header: &EbmlHeaderSegment, quiet: bool) {
    if !quiet {
        println!("{}:", path);
    }
    println!("  doc type:              {}", header.doc_type);
    println!("  doc type version:      {}", header.doc_type_version);
    println!("  doc type read version: {}", header.doc_type_read_version);
    println!("  ebml version:          {}", header.ebml_version);
    println!("  ebml read version:     {}", header.ebml_read_version);
    println!("  max id length:         {}", header.max_id_length);
    println!("  max size length:       {}", header.max_size_length);
    match header.segment_size {
        Some(size) => println!("  segment size:          {} bytes", size),
        None => println!("  segment size:          unknown (streamed)"),
    }
}
