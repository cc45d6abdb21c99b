use anyhow::Result;
use apply_edits::{
    apply_all, parse_edit_stream, DriverOptions, EditBatch, PathResolver, TrackedFiles,
};
use clap::Parser;
use colored::Colorize;
use std::io;
use std::path::PathBuf;

/// Applies edits generated by a source-analysis tool to the working tree.
///
/// Reads one edit per line on stdin, in the form
/// `kind:::path:::offset:::length:::replacement`, and rewrites the target
/// files in place. Only version-controlled files are edited; conflicting
/// edits are dropped and counted, and the process exits with the total
/// conflict count.
#[derive(Parser)]
#[command(name = "apply-edits")]
#[command(about = "Apply a stream of byte-span edits to version-controlled files")]
#[command(version)]
struct Cli {
    /// Path to the build dir (dir that edit paths are relative to)
    build_directory: PathBuf,

    /// Optional paths to filter what files edits are applied to
    path_filter: Vec<PathBuf>,

    /// Apply edits in memory and report, but write nothing to disk
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let tracked = TrackedFiles::from_git(&cli.path_filter)?;
    if tracked.is_empty() {
        eprintln!(
            "{}",
            "Warning: no version-controlled files match the given filters".yellow()
        );
    }

    let mut resolver = PathResolver::new(&cli.build_directory);
    let stdin = io::stdin();
    let parsed = parse_edit_stream(stdin.lock(), &mut resolver)?;

    let eligible: EditBatch = parsed
        .edits
        .into_iter()
        .filter(|(path, _)| tracked.is_eligible(path))
        .collect();

    if cli.dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
    }

    let options = DriverOptions {
        dry_run: cli.dry_run,
        show_diff: cli.diff,
    };
    let totals = apply_all(eligible, &options);

    println!("{}", "Summary:".bold());
    println!(
        "  {} edits applied to {} files",
        format!("{}", totals.edits_applied).green(),
        totals.files_done
    );
    if totals.errors > 0 {
        println!(
            "  {} conflicting edits discarded",
            format!("{}", totals.errors).red()
        );
    }
    if totals.io_failures > 0 {
        println!(
            "  {} files skipped (read/write failure)",
            format!("{}", totals.io_failures).red()
        );
    }
    if parsed.malformed_lines > 0 {
        println!(
            "  {} malformed input lines skipped",
            format!("{}", parsed.malformed_lines).yellow()
        );
    }

    if totals.errors > 0 {
        std::process::exit(totals.errors.min(255) as i32);
    }
    Ok(())
}
