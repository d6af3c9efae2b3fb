//! dirtally - directory tree scanner with hardlink-aware size totals.
//!
//! Usage:
//!   dirtally [PATH]...              Scan summary (same as `scan`)
//!   dirtally scan [PATH]...         Scan summary and size tree
//!   dirtally export [PATH]          Export the scanned tree to JSON
//!   dirtally --help                 Show help

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use dirtally_scan::{ElementTree, Root, ScanConfig, ScanWarning, Scanner};

#[derive(Parser)]
#[command(
    name = "dirtally",
    version,
    about = "Directory tree scanner with hardlink-aware size totals",
    long_about = "dirtally walks directory trees without following symbolic links, \
                  counts every hardlinked file once and reports recursive totals."
)]
struct Cli {
    /// Paths to scan (defaults to current directory)
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    scan: ScanArgs,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Clone)]
struct ScanArgs {
    /// Skip entries whose name starts with a dot
    #[arg(long, global = true)]
    skip_hidden: bool,

    /// Skip entries whose name matches this glob (repeatable)
    #[arg(short, long = "ignore", value_name = "PATTERN", global = true)]
    ignore: Vec<String>,

    /// Do not descend into directories on other filesystems
    #[arg(short = 'x', long, global = true)]
    one_file_system: bool,

    /// Keep unreadable subdirectories as empty entries instead of aborting
    #[arg(short, long, global = true)]
    keep_going: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and show totals plus a size-sorted tree
    Scan {
        /// Paths to scan; several paths are scanned in parallel
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Maximum depth to display
        #[arg(short, long, default_value = "3")]
        depth: usize,

        /// Show all entries (no depth limit on display)
        #[arg(short, long)]
        all: bool,

        /// Number of top entries to show per directory
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,

        /// Print totals as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export the scanned tree to JSON
    Export {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Totals of one scanned root.
#[derive(Serialize)]
struct ScanReport<'a> {
    path: &'a Path,
    size: u64,
    files: u64,
    directories: u64,
    hardlinks: u64,
    symlinks: u64,
    scan_duration: Option<Duration>,
    aggregate_duration: Option<Duration>,
    warnings: &'a [ScanWarning],
}

impl<'a> ScanReport<'a> {
    fn new(root: &'a Root) -> Result<Self> {
        let top = root.top_directory();
        Ok(Self {
            path: root.path(),
            size: top.size()?,
            files: top.total_file_count(),
            directories: top.total_subdirectory_count(),
            hardlinks: top.total_hardlink_count(),
            symlinks: top.total_symlink_count(),
            scan_duration: top.scan_duration(),
            aggregate_duration: top.aggregate_duration(),
            warnings: root.warnings(),
        })
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Scan {
            paths,
            depth,
            all,
            top,
            json,
        }) => {
            run_scan(&paths, &cli.scan, if all { None } else { Some(depth) }, top, json)?;
        }
        Some(Command::Export { path, output }) => {
            run_export(&path, &cli.scan, output)?;
        }
        None => {
            run_scan(&cli.paths, &cli.scan, Some(3), 10, false)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the scan configuration for one path.
fn scan_config(path: &Path, args: &ScanArgs) -> Result<ScanConfig> {
    ScanConfig::builder()
        .root(path)
        .include_hidden(!args.skip_hidden)
        .ignore_patterns(args.ignore.clone())
        .cross_filesystems(!args.one_file_system)
        .keep_going(args.keep_going)
        .build()
        .context("Invalid scan options")
}

fn scan_path(path: &Path, args: &ScanArgs) -> Result<Root> {
    let scanner = Scanner::new(scan_config(path, args)?)?;
    scanner
        .scan()
        .with_context(|| format!("Scan of {} failed", path.display()))
}

/// Scan every path and print its summary.
fn run_scan(
    paths: &[PathBuf],
    args: &ScanArgs,
    max_depth: Option<usize>,
    top_n: usize,
    json: bool,
) -> Result<()> {
    for path in paths {
        eprintln!("Scanning {}...", path.display());
    }

    // Each root owns its registry, so the scans share nothing.
    let roots: Vec<Result<Root>> = paths.par_iter().map(|path| scan_path(path, args)).collect();
    let roots = roots.into_iter().collect::<Result<Vec<_>>>()?;

    if json {
        let reports = roots.iter().map(ScanReport::new).collect::<Result<Vec<_>>>()?;
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for root in &roots {
        print_summary(root, max_depth, top_n)?;
    }
    Ok(())
}

fn print_summary(root: &Root, max_depth: Option<usize>, top_n: usize) -> Result<()> {
    let report = ScanReport::new(root)?;

    println!();
    println!("{}", "─".repeat(60));
    println!(" {} - {}", report.path.display(), format_size(report.size));
    println!(
        " {} files, {} directories, {} hardlinks, {} symlinks",
        report.files, report.directories, report.hardlinks, report.symlinks
    );
    if let (Some(scan), Some(aggregate)) = (report.scan_duration, report.aggregate_duration) {
        println!(
            " Scanned in {:.2}s (aggregation {:.3}s)",
            scan.as_secs_f64(),
            aggregate.as_secs_f64()
        );
    }
    println!("{}", "─".repeat(60));
    println!();

    let tree = sorted_tree(root)?;
    print!("{}", tree.render(max_depth, Some(top_n)));

    if !report.warnings.is_empty() {
        println!();
        println!("{} warning(s) during scan", report.warnings.len());
        for warning in report.warnings {
            println!("{}", format_warning(warning));
        }
    }

    Ok(())
}

/// Export the tree of the root directory, children sorted by size.
fn sorted_tree(root: &Root) -> Result<ElementTree> {
    let mut tree = root
        .top_directory()
        .to_tree()
        .map_err(|e| eyre!("Export failed: {e}"))?;
    tree.sort_by(&mut |a: &ElementTree, b: &ElementTree| {
        b.value().size.cmp(&a.value().size)
    });
    Ok(tree)
}

/// Export scan results to JSON.
fn run_export(path: &Path, args: &ScanArgs, output: Option<PathBuf>) -> Result<()> {
    eprintln!("Scanning {}...", path.display());

    let root = scan_path(path, args)?;
    let tree = sorted_tree(&root)?;
    let json = serde_json::to_string_pretty(&tree)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Cannot write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{json}");
        }
    }

    Ok(())
}

/// One indented line per scan warning.
fn format_warning(warning: &ScanWarning) -> String {
    format!("  {:?}: {}", warning.kind, warning.message)
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
