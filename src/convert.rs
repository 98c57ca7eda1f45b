use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{info, warn};

const CONCURRENCY: usize = 4;
const PDFTOTEXT: &str = "pdftotext";
const TEXT_DIR: &str = "data/drawing_sheet_text";

/// Conversion stats returned after completion.
pub struct ConvertStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// One conversion outcome, streamed back to the save loop.
pub struct ConversionRow {
    pub document_id: i64,
    pub stem: String,
    pub text_path: Option<String>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

/// Convert queued PDFs concurrently, saving each result to DB as it
/// arrives. A failed conversion becomes an error row, never a batch
/// failure.
pub async fn convert_documents_streaming(
    conn: &Connection,
    docs: Vec<(i64, String, String)>,
) -> Result<ConvertStats> {
    std::fs::create_dir_all(TEXT_DIR)?;

    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = docs.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<ConversionRow>(CONCURRENCY * 2);

    for (document_id, pdf_path, stem) in docs {
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let row = convert_one(document_id, &pdf_path, &stem).await;
            if let Some(err) = &row.error {
                warn!("Conversion failed for {}: {}", stem, err);
            }
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    // Prepare statements once, reuse for each row
    let mut insert_stmt = conn.prepare(
        "INSERT INTO document_text (document_id, stem, text_path, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut update_stmt = conn.prepare(
        "UPDATE documents SET converted = 1, converted_at = datetime('now') WHERE id = ?1",
    )?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }

        insert_stmt.execute(rusqlite::params![
            row.document_id,
            row.stem,
            row.text_path,
            row.error,
            row.latency_ms,
        ])?;
        update_stmt.execute(rusqlite::params![row.document_id])?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Converted {} documents ({} ok, {} errors)", total, ok, errors);

    Ok(ConvertStats { total, ok, errors })
}

/// Run `pdftotext <pdf> <txt>` for one document and report the outcome.
async fn convert_one(document_id: i64, pdf_path: &str, stem: &str) -> ConversionRow {
    let text_path = text_path_for(stem);

    let start = Instant::now();
    let output = Command::new(PDFTOTEXT)
        .arg(pdf_path)
        .arg(&text_path)
        .output()
        .await;
    let elapsed = start.elapsed().as_millis() as i64;

    match output {
        Ok(out) if out.status.success() => ConversionRow {
            document_id,
            stem: stem.to_string(),
            text_path: Some(text_path.to_string_lossy().into_owned()),
            error: None,
            latency_ms: Some(elapsed),
        },
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let reason = stderr.lines().next().unwrap_or("non-zero exit").to_string();
            ConversionRow {
                document_id,
                stem: stem.to_string(),
                text_path: None,
                error: Some(format!("{} ({})", reason, out.status)),
                latency_ms: Some(elapsed),
            }
        }
        // Spawn failure: pdftotext missing or not executable.
        Err(e) => ConversionRow {
            document_id,
            stem: stem.to_string(),
            text_path: None,
            error: Some(e.to_string()),
            latency_ms: Some(elapsed),
        },
    }
}

fn text_path_for(stem: &str) -> PathBuf {
    Path::new(TEXT_DIR).join(format!("{stem}.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_path_lands_in_text_dir() {
        let p = text_path_for("20-398 AVAHCS DD Dwgs");
        assert!(p.starts_with(TEXT_DIR));
        assert_eq!(p.extension().and_then(|e| e.to_str()), Some("txt"));
    }
}
