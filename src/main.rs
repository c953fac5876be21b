//! ba2wcx - drives the packer plugin protocol from the command line

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{warn, LevelFilter};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR};
use wcx_core::codec::decode_timestamp;
use wcx_core::{ArchiveManager, Handle, HeaderRecord, OpenMode, Operation, WcxError};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        wcx_core::logging::init_stderr(LevelFilter::Debug);
    }

    let manager = ArchiveManager::new();

    match cli.command {
        Commands::Probe { archive } => {
            let by_name = manager.probe(&archive);
            let by_signature = bsarc::sniff(&archive)
                .with_context(|| format!("Failed to read {}", archive.display()))?;

            match by_name {
                Some(kind) => println!("{}: {} archive", archive.display(), kind),
                None => println!("{}: unsupported", archive.display()),
            }
            if let Some(kind) = by_signature.filter(|kind| Some(*kind) != by_name) {
                println!("  Signature says {} (rename to .{} to open it)", kind, kind.extension());
            }
            Ok(())
        }

        Commands::List { archive } => {
            let handle = open(&manager, &archive, OpenMode::List)?;
            println!("Listing contents of: {}", archive.display());
            println!();

            let mut count = 0usize;
            let mut total_unpacked = 0u64;
            let mut total_packed = 0u64;
            while let Some(record) = next_header(&manager, handle)? {
                let time = decode_timestamp(record.packed_time())
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{:>12} {:>12}  {}  {}",
                    record.unpacked_size, record.packed_size, time, record.full_path
                );
                count += 1;
                total_unpacked += record.unpacked_size;
                total_packed += record.packed_size;
            }
            manager.close(handle)?;

            println!();
            println!("{} entries, {} bytes ({} packed)", count, total_unpacked, total_packed);
            Ok(())
        }

        Commands::Extract {
            archive,
            output,
            filter,
        } => {
            println!("Extracting archive: {} to {}", archive.display(), output.display());

            let summary = extract_archive(&manager, &archive, &output, filter.as_deref(), true)?;
            for path in &summary.rejected {
                println!("Skipped {}: path leaves the output directory", path);
            }
            println!("Extracted {} files", summary.extracted);
            Ok(())
        }
    }
}

struct ExtractSummary {
    extracted: usize,
    /// Entries whose stored path is absolute or climbs out of the output directory.
    rejected: Vec<String>,
}

fn extract_archive(
    manager: &ArchiveManager,
    archive: &Path,
    output: &Path,
    filter: Option<&str>,
    show_progress: bool,
) -> Result<ExtractSummary> {
    let output_str = output
        .to_str()
        .with_context(|| format!("Output path is not valid UTF-8: {}", output.display()))?;
    let filter = filter.map(str::to_lowercase);
    let handle = open(manager, archive, OpenMode::Extract)?;

    let pb = if show_progress {
        ProgressBar::new(manager.entry_count(handle)? as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut summary = ExtractSummary {
        extracted: 0,
        rejected: Vec::new(),
    };
    let result = (|| -> Result<()> {
        while let Some(record) = next_header(manager, handle)? {
            pb.set_message(record.full_path.clone());
            let destination = entry_destination(&record.full_path);
            match destination {
                Some(dest_name) if wanted(&record, filter.as_deref()) => {
                    manager
                        .process_file(handle, Operation::Extract, Some(output_str), Some(&dest_name))
                        .with_context(|| format!("Failed to extract {}", record.full_path))?;
                    summary.extracted += 1;
                }
                destination => {
                    if destination.is_none() {
                        warn!("Refusing to extract {} outside {}", record.full_path, output.display());
                        summary.rejected.push(record.full_path.clone());
                    }
                    manager.process_file(handle, Operation::Skip, None, None)?;
                }
            }
            pb.inc(1);
        }
        Ok(())
    })();
    manager.close(handle)?;
    result?;

    pb.finish_with_message("Complete");
    Ok(summary)
}

/// `full_path` as a relative path below the output directory, or `None` when
/// the entry is absolute, climbs with `..`, or names nothing.
fn entry_destination(full_path: &str) -> Option<String> {
    let native = full_path.replace(['\\', '/'], MAIN_SEPARATOR_STR);
    let mut relative = PathBuf::new();
    for component in Path::new(&native).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        return None;
    }
    relative.to_str().map(str::to_string)
}

fn open(manager: &ArchiveManager, archive: &Path, mode: OpenMode) -> Result<Handle> {
    manager
        .open(archive, mode)
        .with_context(|| format!("Failed to open {}", archive.display()))
}

/// The next header, or `None` at the end of the archive.
fn next_header(manager: &ArchiveManager, handle: Handle) -> Result<Option<HeaderRecord>> {
    match manager.read_header(handle) {
        Ok(record) => Ok(Some(record)),
        Err(WcxError::EndOfArchive) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn wanted(record: &HeaderRecord, filter: Option<&str>) -> bool {
    filter.is_none_or(|f| record.full_path.to_lowercase().contains(f))
}
