//! # CLI Module
//!
//! Command-line interface for the film roll archive.
//!
//! ## Usage
//! ```bash
//! # Resolve every roll listed in a manifest
//! roll-index resolve --manifest rolls.json --references references.json
//!
//! # Read tags without exiftool, print JSON
//! roll-index resolve --manifest rolls.json --references references.json \
//!     --metadata embedded --output json
//!
//! # Also write a CSV with one row per exposure
//! roll-index resolve --manifest rolls.json --references references.json --export rolls.csv
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use film_roll_archive::config::ArchiveConfig;
use film_roll_archive::core::aggregate::ReferenceTables;
use film_roll_archive::core::metadata::{EmbeddedExifSource, ExifToolSource, MetadataSource};
use film_roll_archive::core::pipeline::{Pipeline, PipelineResult, RollInput};
use film_roll_archive::core::reporter::export::{export_to_file, format_bytes, ExportFormat};
use film_roll_archive::core::roll::Roll;
use film_roll_archive::error::Result;
use film_roll_archive::events::{Event, EventChannel, PipelineEvent, RollEvent, Severity};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

/// Film Roll Archive - stable identities for scanned film exposures
#[derive(Parser, Debug)]
#[command(name = "roll-index")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve masters, indices and RAW bindings for every roll in a manifest
    Resolve {
        /// JSON array of { id, name, export_dirs, raw_dirs }
        #[arg(short, long)]
        manifest: PathBuf,

        /// Stock and camera reference tables (JSON)
        #[arg(short, long)]
        references: PathBuf,

        /// Configuration file (default: user config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where tags are read from
        #[arg(long, default_value = "exiftool")]
        metadata: MetadataKind,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Also write the resolved rolls to this file (.json or .csv)
        #[arg(long)]
        export: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetadataKind {
    /// exiftool on PATH, full XMP/IPTC support
    Exiftool,
    /// Built-in EXIF reader, no XMP or IPTC fields
    Embedded,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (one line per roll)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            manifest,
            references,
            config,
            metadata,
            output,
            export,
            verbose,
        } => {
            film_roll_archive::init_tracing(if verbose { "info" } else { "warn" });
            run_resolve(manifest, references, config, metadata, output, export, verbose)
        }
    }
}

fn run_resolve(
    manifest: PathBuf,
    references: PathBuf,
    config: Option<PathBuf>,
    metadata: MetadataKind,
    output: OutputFormat,
    export: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Film Roll Archive").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let config = ArchiveConfig::load_or_default(config.as_deref())?;
    let tables = ReferenceTables::load(&references)?;
    let rolls = RollInput::load_manifest(&manifest)?;

    let source: Arc<dyn MetadataSource> = match metadata {
        MetadataKind::Exiftool => Arc::new(ExifToolSource::new()),
        MetadataKind::Embedded => Arc::new(EmbeddedExifSource::new()),
    };

    let pipeline = Pipeline::builder()
        .config(config)
        .references(Arc::new(tables))
        .metadata_source(source)
        .build();

    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(rolls.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Roll(RollEvent::StageChanged { roll, stage }) => {
                    pb.set_message(format!("roll {}: {}", roll, stage));
                }
                Event::Roll(RollEvent::Completed { .. }) => pb.inc(1),
                Event::Roll(RollEvent::Failed { roll, message }) => {
                    pb.inc(1);
                    pb.println(format!("{} roll {}: {}", style("✗").red().bold(), roll, message));
                }
                Event::Diagnostic(d) if verbose && d.severity >= Severity::Warning => {
                    pb.println(format!(
                        "  {} roll {} {}: {}",
                        style(d.kind).yellow(),
                        d.roll,
                        d.exposure.as_deref().unwrap_or(""),
                        d.message
                    ));
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => pb.finish_and_clear(),
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&rolls, &sender);

    drop(sender);
    event_thread.join().ok();
    let result = result?;

    if let Some(path) = export {
        export_to_file(&result.rolls, &path, ExportFormat::from_path(&path))?;
        if matches!(output, OutputFormat::Pretty) {
            term.write_line(&format!("  {} {}", style("Exported").dim(), path.display()))
                .ok();
        }
    }

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, verbose),
        OutputFormat::Json => print_json_results(&result)?,
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &PipelineResult, verbose: bool) {
    let summary = result.summary();

    term.write_line("").ok();
    term.write_line(&format!("{} Resolution Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} rolls resolved in {:.1}s",
        style(summary.rolls_processed).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} masters, {} copies",
        style(summary.total_masters).cyan(),
        style(summary.total_copies).cyan()
    ))
    .ok();
    if summary.unmatched_raws > 0 {
        term.write_line(&format!(
            "  {} RAW files without an exposure",
            style(summary.unmatched_raws).yellow()
        ))
        .ok();
    }
    if summary.rolls_failed > 0 {
        term.write_line(&format!(
            "  {} rolls failed",
            style(summary.rolls_failed).red().bold()
        ))
        .ok();
    }
    term.write_line("").ok();

    for roll in &result.rolls {
        print_roll(term, roll, verbose);
    }

    for failure in &result.failures {
        term.write_line(&format!(
            "  {} {}",
            style(format!("Roll {}:", failure.roll)).bold().red(),
            failure.message
        ))
        .ok();
    }

    term.write_line(&format!(
        "{}",
        style("No files were renamed or moved.").dim()
    ))
    .ok();
}

fn print_roll(term: &Term, roll: &Roll, verbose: bool) {
    let audit = roll.audit();
    let attributes = &roll.attributes;

    let marker = if audit.is_clean() {
        style("●").green()
    } else {
        style("●").yellow()
    };
    term.write_line(&format!(
        "  {} {} ({} frames, {} copies, {})",
        marker,
        style(&roll.name).bold(),
        audit.masters,
        audit.copies,
        format_bytes(attributes.totals.master_bytes + attributes.totals.copy_bytes)
    ))
    .ok();

    let stock = attributes
        .stock
        .record
        .as_ref()
        .map(|s| s.name.as_str())
        .or(audit.unresolved_stock.as_ref().and_then(|u| u.tag.as_deref()))
        .unwrap_or("unknown stock");
    let camera = attributes
        .camera
        .as_ref()
        .map(|c| c.id.as_str())
        .or(attributes.camera_name.as_deref())
        .unwrap_or("unknown camera");
    let days = attributes
        .duration_days
        .map(|d| format!(", {} days", d))
        .unwrap_or_default();
    term.write_line(&format!(
        "    {} · {} · {}{}",
        stock,
        camera,
        attributes.locations.join(" / "),
        days
    ))
    .ok();

    if audit.grouping_overridden {
        term.write_line(&format!("    {}", style("grouping skipped by policy").dim()))
            .ok();
    }
    for problem in &audit.scan_problems {
        term.write_line(&format!("    {} {}", style("!").yellow(), problem)).ok();
    }
    if !audit.missing_raws.is_empty() {
        term.write_line(&format!(
            "    {} exposures without RAW",
            style(audit.missing_raws.len()).yellow()
        ))
        .ok();
    }
    if !audit.unmatched_raws.is_empty() {
        term.write_line(&format!(
            "    {} unmatched RAW files",
            style(audit.unmatched_raws.len()).yellow()
        ))
        .ok();
    }

    if verbose {
        for group in &audit.duplicate_groups {
            term.write_line(&format!(
                "    {} #{} {} ({})",
                style("★").green(),
                group.index.map(|i| i.to_string()).unwrap_or_default(),
                group.master,
                style(group.reason).dim()
            ))
            .ok();
            for copy in &group.copies {
                term.write_line(&format!("      {} {}", style("○").dim(), copy)).ok();
            }
        }
        for raw in &audit.unmatched_raws {
            term.write_line(&format!("    {} {}", style("?").yellow(), raw.display()))
                .ok();
        }
    }

    term.write_line("").ok();
}

fn print_json_results(result: &PipelineResult) -> Result<()> {
    let output = serde_json::json!({
        "run_id": result.run_id.to_string(),
        "summary": result.summary(),
        "rolls": result.rolls.iter().map(|roll| {
            serde_json::json!({
                "id": roll.id,
                "name": roll.name,
                "attributes": roll.attributes,
                "audit": roll.audit(),
            })
        }).collect::<Vec<_>>(),
        "failures": result.failures,
    });

    let text = serde_json::to_string_pretty(&output).map_err(std::io::Error::from)?;
    println!("{}", text);
    Ok(())
}

fn print_minimal_results(result: &PipelineResult) {
    for roll in &result.rolls {
        println!(
            "{}\t{}\t{}\t{}",
            roll.id,
            roll.master_count(),
            roll.copy_count(),
            roll.raw_report.unmatched.len()
        );
    }
    for failure in &result.failures {
        println!("{}\tfailed\t{}", failure.roll, failure.message);
    }
}
