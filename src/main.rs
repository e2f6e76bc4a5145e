//! diskprobe - a terminal disk-usage analyzer.
//!
//! Usage:
//!   dprobe scan [PATH]       Scan and print the largest entries
//!   dprobe insights [PATH]   Classify temp/cache/build-artifact paths
//!   dprobe --help            Show help

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

use diskprobe_analyze::{
    default_rules, format_bytes, InsightCategory, InsightConfig, InsightGenerator,
};
use diskprobe_core::{top_nodes, NodeKind, ScanConfig, ScanSnapshot};
use diskprobe_scan::Walker;

#[derive(Parser)]
#[command(
    name = "dprobe",
    version,
    about = "Find out where your disk space went",
    long_about = "diskprobe scans a directory tree in parallel and reports the \
                  largest entries plus cleanup candidates: temporary files, \
                  tool caches, and regenerable build artifacts."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and print totals with the largest entries
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of scan workers
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Maximum depth to descend
        #[arg(short = 'd', long)]
        max_depth: Option<u32>,

        /// Number of entries to show per listing
        #[arg(short = 'n', long, default_value = "15")]
        top: usize,
    },

    /// Scan and classify temp, cache and build-artifact paths
    Insights {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of scan workers
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Maximum depth to descend
        #[arg(short = 'd', long)]
        max_depth: Option<u32>,

        /// Number of insights to show
        #[arg(short = 'n', long, default_value = "15")]
        top: usize,

        /// Only show one category: temp, cache or build_artifact
        #[arg(short, long)]
        category: Option<String>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    match Cli::parse().command {
        Command::Scan {
            path,
            workers,
            max_depth,
            top,
        } => run_scan(path, workers, max_depth, top),
        Command::Insights {
            path,
            workers,
            max_depth,
            top,
            category,
        } => run_insights(path, workers, max_depth, top, category),
    }
}

fn scan(path: PathBuf, workers: usize, max_depth: Option<u32>) -> Result<ScanSnapshot> {
    let config = ScanConfig::builder()
        .root(path)
        .workers(workers)
        .max_depth(max_depth)
        .build()?;
    Ok(Walker::new().scan(&config, None, None)?)
}

fn run_scan(path: PathBuf, workers: usize, max_depth: Option<u32>, top: usize) -> Result<()> {
    let snapshot = scan(path, workers, max_depth)?;
    let root = &snapshot.root;

    println!("{}", root.path);
    println!(
        "  {} files, {} directories, {} on disk ({} apparent), {} access errors",
        snapshot.stats.files,
        snapshot.stats.directories,
        format_bytes(root.disk_usage),
        format_bytes(root.size_bytes),
        snapshot.stats.access_errors,
    );

    println!("\nTop level:");
    for child in root.children.iter().take(top) {
        let marker = if child.is_dir() { "/" } else { "" };
        println!(
            "  {:>10}  {}{marker}",
            format_bytes(child.disk_usage),
            child.name
        );
    }

    println!("\nLargest directories:");
    for node in top_nodes(root, top, Some(NodeKind::Directory)) {
        println!("  {:>10}  {}", format_bytes(node.disk_usage), node.path);
    }

    println!("\nLargest files:");
    for node in top_nodes(root, top, Some(NodeKind::File)) {
        println!("  {:>10}  {}", format_bytes(node.disk_usage), node.path);
    }

    Ok(())
}

fn run_insights(
    path: PathBuf,
    workers: usize,
    max_depth: Option<u32>,
    top: usize,
    category: Option<String>,
) -> Result<()> {
    let snapshot = scan(path, workers, max_depth)?;

    let generator = InsightGenerator::with_config(InsightConfig::default());
    let ruleset = generator.compile(&default_rules());
    let bundle = generator.generate(&snapshot.root, &ruleset);

    let categories: Vec<InsightCategory> = match category.as_deref() {
        Some(name) => vec![parse_category(name)?],
        None => InsightCategory::ALL.to_vec(),
    };

    for category in &categories {
        let stats = bundle.stats(*category);
        println!(
            "{}: {} matches, {} reclaimable",
            category.as_str(),
            stats.count,
            format_bytes(stats.disk_usage),
        );
        for insight in bundle.filter(&[*category]).into_iter().take(top) {
            let kind = if insight.kind.is_dir() { "DIR " } else { "FILE" };
            println!(
                "  {:>10}  {kind}  {}  ({})",
                format_bytes(insight.disk_usage),
                insight.path,
                insight.summary,
            );
        }
        println!();
    }

    Ok(())
}

fn parse_category(name: &str) -> Result<InsightCategory> {
    InsightCategory::ALL
        .into_iter()
        .find(|c| c.as_str() == name.to_ascii_lowercase())
        .ok_or_else(|| {
            color_eyre::eyre::eyre!("unknown category '{name}' (temp, cache, build_artifact)")
        })
}
