mod convert;
mod db;
mod miner;
mod paths;
mod walker;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sheetminer", about = "Drawing-sheet title-block miner for A/E project archives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the archive, queue drawing-set PDFs, and label project file paths
    Init {
        /// Archive root directory
        root: PathBuf,
    },
    /// Convert queued PDFs to text via pdftotext
    Convert {
        /// Max documents to convert (default: all unconverted)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Mine title-block records from converted text exports
    Mine {
        /// Max documents to mine (default: all unmined)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Convert + mine in one pipeline
    Run {
        /// Max documents to convert+mine
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show pipeline statistics
    Stats,
    /// Mined projects overview table
    Overview {
        /// Filter by development level (e.g. "DESIGN DEVELOPMENT")
        #[arg(short, long)]
        level: Option<String>,
        /// Filter by project number (e.g. "20-398")
        #[arg(short, long)]
        project: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Export the flattened sheet table as JSON lines
    Export {
        /// Output file (default: data/sheet_index_<date>.jsonl)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { root } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let docs = walker::discover_documents(&root)?;
            let inserted = db::insert_documents(&conn, &docs)?;
            println!("Queued {} new drawing sets ({} PDFs found)", inserted, docs.len());
            let rows = walker::scan_archive(&root)?;
            let saved = db::save_archive_files(&conn, &rows)?;
            println!("Labeled {} new project files ({} parsed)", saved, rows.len());
            Ok(())
        }
        Commands::Convert { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let docs = db::fetch_unconverted(&conn, limit)?;
            if docs.is_empty() {
                println!("No unconverted documents. Run 'init' first or all PDFs are converted.");
                return Ok(());
            }
            println!("Converting {} documents (streaming to DB)...", docs.len());
            let stats = convert::convert_documents_streaming(&conn, docs).await?;
            println!(
                "Done: {} converted ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Mine { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let docs = db::fetch_unmined(&conn, limit)?;
            if docs.is_empty() {
                println!("No unmined documents. Run 'convert' first.");
                return Ok(());
            }
            println!("Mining {} documents...", docs.len());
            let counts = mine_documents(&conn, &docs)?;
            counts.print();
            Ok(())
        }
        Commands::Run { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let docs = db::fetch_unconverted(&conn, limit)?;
            if docs.is_empty() {
                println!("No unconverted documents. Run 'init' first.");
                return Ok(());
            }

            // Phase 1: Convert (streaming to DB)
            let t_convert = Instant::now();
            println!("Pipeline: converting {} documents (streaming to DB)...", docs.len());
            let stats = convert::convert_documents_streaming(&conn, docs).await?;
            println!(
                "Converted {} documents ({} ok, {} errors) in {:.1}s",
                stats.total, stats.ok, stats.errors, t_convert.elapsed().as_secs_f64()
            );

            // Phase 2: Mine
            let t_mine = Instant::now();
            let unmined = db::fetch_unmined(&conn, None)?;
            if unmined.is_empty() {
                println!("Nothing to mine (all conversions failed).");
                return Ok(());
            }
            println!("Mining {} documents...", unmined.len());
            let counts = mine_documents(&conn, &unmined)?;
            println!("Mined in {:.1}s", t_mine.elapsed().as_secs_f64());
            counts.print();
            Ok(())
        }
        Commands::Overview { level, project, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, level.as_deref(), project.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No mined projects found.");
                return Ok(());
            }

            // Compact, readable table
            println!(
                "{:>3} | {:<28} | {:<8} | {:<24} | {:<22} | {:>6}",
                "#", "Drawing set", "Project", "Title", "Address", "Sheets"
            );
            println!("{}", "-".repeat(108));

            for (i, r) in rows.iter().enumerate() {
                let stem = truncate(&r.stem, 28);
                let name = truncate(&r.project_name, 24);
                let addr = truncate(&r.facility_address, 22);

                println!(
                    "{:>3} | {:<28} | {:<8} | {:<24} | {:<22} | {:>6}",
                    i + 1, stem, r.project_number, name, addr, r.sheet_count
                );
            }

            // Development levels summary (separate section to avoid clutter)
            println!("\n--- Development levels ---");
            for r in &rows {
                println!("  {}: {}", truncate(&r.stem, 28), r.development_level);
            }

            println!("\n{} drawing sets", rows.len());
            Ok(())
        }
        Commands::Export { output } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_flat_rows(&conn)?;
            if rows.is_empty() {
                println!("Nothing to export. Run 'mine' first.");
                return Ok(());
            }
            let path = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "data/sheet_index_{}.jsonl",
                    chrono::Local::now().format("%Y%m%d")
                ))
            });
            let mut file = std::fs::File::create(&path)?;
            for row in &rows {
                writeln!(file, "{}", serde_json::to_string(row)?)?;
            }
            println!("Exported {} sheet rows to {}", rows.len(), path.display());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Documents:     {}", s.total);
            println!("Converted:     {}", s.converted);
            println!("Unconverted:   {}", s.unconverted);
            println!("Errors:        {}", s.errors);
            println!("Mined:         {}", s.mined);
            println!("Sheets:        {}", s.sheets);
            println!("Archive files: {}", s.archive_files);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct MineCounts {
    projects: usize,
    sheets: usize,
    errors: usize,
}

impl MineCounts {
    fn print(&self) {
        println!(
            "Saved {} projects, {} sheets ({} unreadable exports skipped).",
            self.projects, self.sheets, self.errors,
        );
    }
}

fn mine_documents(
    conn: &rusqlite::Connection,
    docs: &[db::TextDocument],
) -> anyhow::Result<MineCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut counts = MineCounts {
        projects: 0,
        sheets: 0,
        errors: 0,
    };

    for chunk in docs.chunks(500) {
        let results: Vec<_> = chunk.par_iter().map(miner::process_document).collect();

        let mut projects = Vec::new();
        let mut sheets = Vec::new();

        for result in results {
            match result {
                Ok(data) => {
                    counts.sheets += data.sheets.len();
                    projects.push(data.project);
                    sheets.extend(data.sheets);
                }
                Err(e) => {
                    tracing::warn!("{e:#}");
                    counts.errors += 1;
                }
            }
        }

        counts.projects += projects.len();
        db::save_mined(conn, &projects, &sheets)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
