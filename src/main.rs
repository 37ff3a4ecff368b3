//! Main entry point for the unowfs CLI application.
//!
//! Reads an image file, prepares the destination directory and hands the
//! buffer to the library. Progress goes to stdout, diagnostics to stderr.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs;
use tracing_subscriber::EnvFilter;

use unowfs::{Cli, ExtractionReport, OwfsExtractor};

fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let data = fs::read(&cli.image)
        .with_context(|| format!("failed to read {}", cli.image.display()))?;
    if data.is_empty() {
        bail!("{} is empty", cli.image.display());
    }

    let extractor = OwfsExtractor::new(&data)?;

    // List mode: display image contents and exit
    if cli.is_listing() {
        list_files(&extractor, cli.verbose);
        return Ok(());
    }

    fs::create_dir_all(&cli.dest)
        .with_context(|| format!("failed to create {}", cli.dest.display()))?;

    if !cli.quiet {
        let header = extractor.header();
        println!(
            "Extracting {} files from OWFS version {} image...\n",
            header.entry_count, header.version
        );
    }

    let report = extractor.extract_all(&cli.dest);
    if !cli.quiet {
        print_report(&report);
    }

    if report.attempted() == 0 {
        bail!("no files in image");
    }

    if !cli.quiet {
        println!(
            "\nExtracted {} files to {}/",
            report.attempted(),
            cli.dest.display()
        );
    }

    Ok(())
}

/// Print one line per entry outcome.
fn print_report(report: &ExtractionReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(_) => println!("Extracted file \"{}\"", outcome.name),
            Err(e) => println!("Error extracting file \"{}\": {}", outcome.name, e),
        }
    }
}

/// List entries in the image.
///
/// The verbose format adds sizes, offsets and a summary line.
fn list_files(extractor: &OwfsExtractor<'_>, verbose: bool) {
    let entries = extractor.list_entries();

    if verbose {
        let header = extractor.header();
        println!(
            "OWFS version {}, {} entries at offset {:#x}",
            header.version,
            header.entry_count,
            extractor.parser().base_offset()
        );
        println!("{:>10}  {:>10}  Name", "Size", "Offset");
        println!("{}", "-".repeat(50));
    }

    let mut total = 0u64;
    for entry in &entries {
        if verbose {
            println!(
                "{:>10}  {:>#10x}  {}",
                entry.size, entry.data_offset, entry.name
            );
            total += entry.size as u64;
        } else {
            println!("{}", entry.name);
        }
    }

    if verbose {
        println!("{}", "-".repeat(50));
        println!("{:>10}  {:>10}  {} files", total, "", entries.len());
    }
}
