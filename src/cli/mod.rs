// Command-line interface for opusmeta
//
// The binary reads whole files into memory and hands the buffers to the
// library; all I/O and printing lives here, none of it in the parsers.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};

/// Ogg Opus / WebM demuxer command-line tool
#[derive(Parser, Debug)]
#[command(name = "opusmeta")]
#[command(about = "Inspect Ogg Opus streams and WebM headers", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Quiet mode (suppress per-file headings)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize Ogg Opus file(s): headers, tags, duration, packet count
    Info {
        /// File path(s), glob patterns allowed
        files: Vec<String>,
    },
    /// Print a per-page table for Ogg Opus file(s)
    Pages {
        /// File path(s), glob patterns allowed
        files: Vec<String>,
    },
    /// Detect the container format of file(s)
    Detect {
        /// File path(s), glob patterns allowed
        files: Vec<String>,
    },
    /// Dump the EBML header of WebM file(s)
    Webm {
        /// File path(s), glob patterns allowed
        files: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Run the selected subcommand
pub fn run(config: Config) -> anyhow::Result<()> {
    match &config.command {
        Commands::Info { files } => commands::command_info(files, &config),
        Commands::Pages { files } => commands::command_pages(files, &config),
        Commands::Detect { files } => commands::command_detect(files, &config),
        Commands::Webm { files } => commands::command_webm(files, &config),
    }
}
