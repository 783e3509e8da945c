// CLI command implementations

use anyhow::{bail, Context, Result};
use glob::glob;

use crate::cli::{output, Config, OutputFormat};
use opusmeta::{detect_container, open_ogg_stream, open_webm_header, Container};

/// Expand glob patterns and plain paths into a concrete file list
fn expand_files(patterns: &[String]) -> Result<Vec<String>> {
    if patterns.is_empty() {
        bail!("no files specified");
    }

    let mut files = Vec::new();
    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') {
            for entry in
                glob(pattern).with_context(|| format!("invalid glob pattern: {}", pattern))?
            {
                let path = entry.context("failed to read glob entry")?;
                files.push(path.display().to_string());
            }
        } else {
            files.push(pattern.clone());
        }
    }

    if files.is_empty() {
        bail!("no files matched");
    }
    Ok(files)
}

pub fn command_info(patterns: &[String], config: &Config) -> Result<()> {
    for path in expand_files(patterns)? {
        let buf = std::fs::read(&path).with_context(|| format!("failed to read {}", path))?;
        let mut demuxer = open_ogg_stream(&buf);
        let info = demuxer
            .read_opus_stream()
            .with_context(|| format!("failed to demux {}", path))?;

        match config.format {
            OutputFormat::Pretty => output::print_stream_info(&path, &info, config.quiet),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        }
    }
    Ok(())
}

pub fn command_pages(patterns: &[String], config: &Config) -> Result<()> {
    for path in expand_files(patterns)? {
        let buf = std::fs::read(&path).with_context(|| format!("failed to read {}", path))?;
        if !config.quiet {
            println!("{}:", path);
        }

        let mut demuxer = open_ogg_stream(&buf);
        let mut rows = Vec::new();
        loop {
            let (page, info) = demuxer
                .read_page(None)
                .with_context(|| format!("failed to read page in {}", path))?;
            let eos = page.is_eos();
            rows.push(output::PageRow::new(&page, &info));
            if eos {
                break;
            }
            if demuxer.remaining() == 0 {
                bail!("{}: buffer ended without an end-of-stream page", path);
            }
        }

        match config.format {
            OutputFormat::Pretty => output::print_page_table(&rows, demuxer.total_packets()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        }
    }
    Ok(())
}

pub fn command_detect(patterns: &[String], config: &Config) -> Result<()> {
    for path in expand_files(patterns)? {
        let buf = std::fs::read(&path).with_context(|| format!("failed to read {}", path))?;
        let container = detect_container(&buf);
        match config.format {
            OutputFormat::Pretty => println!("{}: {}", path, container),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({ "file": path, "container": container })
                )
            }
        }
        if container == Container::Unknown && !config.quiet {
            eprintln!("warning: {} has no recognized container signature", path);
        }
    }
    Ok(())
}

pub fn command_webm(patterns: &[String], config: &Config) -> Result<()> {
    for path in expand_files(patterns)? {
        let buf = std::fs::read(&path).with_context(|| format!("failed to read {}", path))?;
        let header = open_webm_header(&buf)
            .with_context(|| format!("failed to parse EBML header of {}", path))?;

        match config.format {
            OutputFormat::Pretty => output::print_webm_header(&path, &header, config.quiet),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&header)?),
        }
    }
    Ok(())
}
