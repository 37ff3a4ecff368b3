use clap::Parser;
use std::path::PathBuf;

/// Destination used when none is given on the command line.
pub const DEFAULT_DEST_DIR: &str = "owfs-root";

#[derive(Parser, Debug)]
#[command(name = "unowfs")]
#[command(version)]
#[command(about = "Extract files from OWFS filesystem images", long_about = None)]
#[command(after_help = "Examples:\n  \
  unowfs firmware.bin                extract into ./owfs-root/\n  \
  unowfs firmware.bin rootfs         extract into ./rootfs/\n  \
  unowfs -l firmware.bin             list files in the image\n  \
  unowfs -lv firmware.bin            list files with sizes and offsets")]
pub struct Cli {
    /// OWFS image or firmware file containing one
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Destination directory, created if missing
    #[arg(value_name = "DEST", default_value = DEFAULT_DEST_DIR)]
    pub dest: PathBuf,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// Log decoding details; with -l also show sizes and offsets
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode, no progress messages
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn is_listing(&self) -> bool {
        self.list
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "unowfs=debug" } else { "warn" }
    }
}
