use std::path::PathBuf;

use anyhow::{bail, Context};
use colored::Colorize;
use dagkv_backend::{Backend, BackendConfig, ImportReport, ImportSummary};
use dagkv_types::{ContentHash, Cursor, PieceCid};
use serde::Serialize;

use crate::cli::*;

#[derive(Serialize)]
struct Binding {
    piece: PieceCid,
    cursor: Cursor,
}

#[derive(Serialize)]
struct Entry {
    hash: ContentHash,
    offset: u64,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Init(args) => {
            if let Some(first) = args.first_cursor {
                config.first_cursor = first;
            }
            cmd_init(config, args.force, &format)
        }
        Command::Import(args) => {
            if let Some(suffix) = args.suffix {
                config.index_suffix = suffix;
            }
            config.verify &= !args.no_verify;
            cmd_import(&Backend::open(config)?, args.dir, &format)
        }
        Command::ImportFile(args) => {
            config.verify &= !args.no_verify;
            cmd_import_file(&Backend::open(config)?, &args, &format)
        }
        Command::Lookup(args) => cmd_lookup(&Backend::open(config)?, &args.piece, &format),
        Command::Dump(args) => cmd_dump(&Backend::open(config)?, &args, &format),
        Command::Offset(args) => cmd_offset(&Backend::open(config)?, &args, &format),
        Command::Pieces(_) => cmd_pieces(&Backend::open(config)?, &format),
        Command::Cursor(_) => cmd_cursor(&Backend::open(config)?, &format),
    }
}

/// Config file (or defaults), with the store directory resolved.
fn load_config(cli: &Cli) -> anyhow::Result<BackendConfig> {
    let mut config = match &cli.config {
        Some(path) => BackendConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BackendConfig::default(),
    };
    config.store_path = cli
        .store
        .clone()
        .or(config.store_path)
        .or_else(|| Some(PathBuf::from(DEFAULT_STORE_DIR)));
    Ok(config)
}

fn parse_piece(s: &str) -> anyhow::Result<PieceCid> {
    PieceCid::parse(s).with_context(|| format!("invalid piece CID {s}"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(config: BackendConfig, force: bool, format: &OutputFormat) -> anyhow::Result<()> {
    let start = config.first_cursor()?;
    let backend = Backend::open(config)?;
    if force {
        backend
            .cursors()
            .reseed(start)
            .context("refusing to reseed the cursor counter")?;
    }
    let next = backend.cursors().current()?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "next_cursor": next })),
        OutputFormat::Text => {
            println!("{} Store ready", "✓".green().bold());
            if let Some(path) = &backend.config().store_path {
                println!("  Path: {}", path.display().to_string().bold());
            }
            println!("  Next cursor: {}", next.to_string().cyan());
            Ok(())
        }
    }
}

fn print_report(report: &ImportReport) {
    let check = if report.verified {
        "verified".green()
    } else {
        "unverified".yellow()
    };
    println!(
        "  {} -> {} ({} entries, {})",
        report.piece.to_string().yellow(),
        report.cursor.to_string().cyan(),
        report.entries,
        check
    );
}

fn cmd_import(backend: &Backend, dir: PathBuf, format: &OutputFormat) -> anyhow::Result<()> {
    let summary: ImportSummary = backend
        .import_dir(&dir)
        .with_context(|| format!("importing {}", dir.display()))?;
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            for report in &summary.reports {
                print_report(report);
            }
            println!(
                "{} Imported {} pieces, {} entries",
                "✓".green().bold(),
                summary.pieces.to_string().bold(),
                summary.entries.to_string().bold()
            );
            println!("  Indices:         {}", byte_count_si(summary.index_bytes));
            println!("  Store:           {}", byte_count_si(summary.store_bytes));
            println!(
                "  Cursor overhead: {}",
                byte_count_si(summary.cursor_overhead_bytes)
            );
            Ok(())
        }
    }
}

/// Decimal (SI) byte count: `999 B`, `1.5 kB`, `2.0 MB`.
fn byte_count_si(bytes: u64) -> String {
    const UNIT: u64 = 1000;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = ['k', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {prefix}B", bytes as f64 / div as f64)
}

fn cmd_import_file(
    backend: &Backend,
    args: &ImportFileArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let piece = parse_piece(&args.piece)?;
    let report = backend
        .import_file(&piece, &args.path)
        .with_context(|| format!("importing {}", args.path.display()))?;
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            println!("{} Imported", "✓".green().bold());
            print_report(&report);
            Ok(())
        }
    }
}

fn cmd_lookup(backend: &Backend, piece: &str, format: &OutputFormat) -> anyhow::Result<()> {
    let piece = parse_piece(piece)?;
    let cursor = backend.registry().lookup(&piece)?;
    match format {
        OutputFormat::Json => print_json(&Binding { piece, cursor }),
        OutputFormat::Text => {
            println!("{} -> {}", piece.to_string().yellow(), cursor.to_string().cyan());
            Ok(())
        }
    }
}

fn cmd_dump(backend: &Backend, args: &DumpArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let piece = parse_piece(&args.piece)?;
    let cursor = backend.registry().lookup(&piece)?;
    let limit = args.limit.unwrap_or(usize::MAX);
    let mut entries = Vec::new();
    for item in backend.namespaces().scan_all(cursor)?.take(limit) {
        let (hash, offset) = item?;
        entries.push(Entry { hash, offset });
    }
    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Text => {
            println!(
                "Piece {} (cursor {})",
                piece.to_string().yellow().bold(),
                cursor.to_string().cyan()
            );
            for entry in &entries {
                println!("  {}  {}", entry.hash.to_string().dimmed(), entry.offset);
            }
            Ok(())
        }
    }
}

fn cmd_offset(backend: &Backend, args: &OffsetArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let piece = parse_piece(&args.piece)?;
    let hash = ContentHash::from_hex(&args.hash)
        .with_context(|| format!("invalid hash {}", args.hash))?;
    let Some(offset) = backend.offset(&piece, &hash)? else {
        bail!("hash {hash} not found in piece {piece}");
    };
    match format {
        OutputFormat::Json => print_json(&Entry { hash, offset }),
        OutputFormat::Text => {
            println!("{}", offset.to_string().bold());
            Ok(())
        }
    }
}

fn cmd_pieces(backend: &Backend, format: &OutputFormat) -> anyhow::Result<()> {
    let mut bindings = Vec::new();
    for item in backend.registry().pieces()? {
        let (piece, cursor) = item?;
        bindings.push(Binding { piece, cursor });
    }
    match format {
        OutputFormat::Json => print_json(&bindings),
        OutputFormat::Text => {
            if bindings.is_empty() {
                println!("No pieces registered.");
            }
            for b in &bindings {
                println!("{} -> {}", b.piece.to_string().yellow(), b.cursor.to_string().cyan());
            }
            Ok(())
        }
    }
}

fn cmd_cursor(backend: &Backend, format: &OutputFormat) -> anyhow::Result<()> {
    let next = backend.cursors().current()?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "next_cursor": next })),
        OutputFormat::Text => {
            println!("Next cursor: {}", next.to_string().cyan().bold());
            Ok(())
        }
    }
}
