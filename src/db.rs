use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use crate::paths::ArchiveFileRow;

const DB_PATH: &str = "data/archive.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id           INTEGER PRIMARY KEY,
            pdf_path     TEXT UNIQUE NOT NULL,
            stem         TEXT NOT NULL,
            converted    BOOLEAN NOT NULL DEFAULT 0,
            converted_at TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_documents_converted ON documents(converted);

        CREATE TABLE IF NOT EXISTS document_text (
            id           INTEGER PRIMARY KEY,
            document_id  INTEGER NOT NULL REFERENCES documents(id),
            stem         TEXT NOT NULL,
            text_path    TEXT,
            error        TEXT,
            latency_ms   INTEGER,
            converted_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_document_text_stem ON document_text(stem);

        -- Mined title-block data
        CREATE TABLE IF NOT EXISTS projects (
            stem               TEXT PRIMARY KEY,
            document_id        INTEGER NOT NULL REFERENCES documents(id),
            project_number     TEXT NOT NULL,
            project_name       TEXT NOT NULL,
            facility_address   TEXT NOT NULL,
            development_level  TEXT NOT NULL,
            alt_project_number TEXT NOT NULL,
            sheet_count        INTEGER NOT NULL DEFAULT 0,
            mined_at           TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS sheets (
            id           INTEGER PRIMARY KEY,
            stem         TEXT NOT NULL REFERENCES projects(stem),
            position     INTEGER NOT NULL,
            title        TEXT NOT NULL,
            building_id  TEXT NOT NULL,
            drawing_tag  TEXT NOT NULL,
            sheet_suffix TEXT NOT NULL,
            drawn_by     TEXT NOT NULL,
            checked_by   TEXT NOT NULL,
            UNIQUE(stem, position)
        );
        CREATE INDEX IF NOT EXISTS idx_sheets_stem ON sheets(stem);

        -- Labeled archive file paths
        CREATE TABLE IF NOT EXISTS archive_files (
            id             INTEGER PRIMARY KEY,
            file_path      TEXT UNIQUE NOT NULL,
            project_number TEXT NOT NULL,
            project_name   TEXT NOT NULL,
            client         TEXT NOT NULL,
            state          TEXT NOT NULL,
            facility       TEXT NOT NULL,
            year           TEXT NOT NULL,
            sub_directory  TEXT NOT NULL,
            file_name      TEXT NOT NULL,
            file_type      TEXT NOT NULL,
            extra_dirs     TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_archive_project ON archive_files(project_number);
        CREATE INDEX IF NOT EXISTS idx_archive_type ON archive_files(file_type);
        ",
    )?;
    Ok(())
}

// ── Document queue ──

pub fn insert_documents(conn: &Connection, docs: &[(String, String)]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO documents (pdf_path, stem) VALUES (?1, ?2)")?;
        for (pdf_path, stem) in docs {
            count += stmt.execute(rusqlite::params![pdf_path, stem])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_unconverted(
    conn: &Connection,
    limit: Option<usize>,
) -> Result<Vec<(i64, String, String)>> {
    let sql = match limit {
        Some(n) => format!(
            "SELECT id, pdf_path, stem FROM documents WHERE converted = 0 ORDER BY id LIMIT {}",
            n
        ),
        None => {
            "SELECT id, pdf_path, stem FROM documents WHERE converted = 0 ORDER BY id".to_string()
        }
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Mining ──

pub struct TextDocument {
    pub document_id: i64,
    pub stem: String,
    pub text_path: String,
}

pub fn fetch_unmined(conn: &Connection, limit: Option<usize>) -> Result<Vec<TextDocument>> {
    let sql = format!(
        "SELECT dt.document_id, dt.stem, dt.text_path
         FROM document_text dt
         LEFT JOIN projects p ON p.stem = dt.stem
         WHERE dt.text_path IS NOT NULL AND p.stem IS NULL
         ORDER BY dt.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TextDocument {
                document_id: row.get(0)?,
                stem: row.get(1)?,
                text_path: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ProjectRow {
    pub stem: String,
    pub document_id: i64,
    pub project_number: String,
    pub project_name: String,
    pub facility_address: String,
    pub development_level: String,
    pub alt_project_number: String,
    pub sheet_count: i64,
}

pub struct SheetRow {
    pub stem: String,
    pub position: i64,
    pub title: String,
    pub building_id: String,
    pub drawing_tag: String,
    pub sheet_suffix: String,
    pub drawn_by: String,
    pub checked_by: String,
}

pub fn save_mined(conn: &Connection, projects: &[ProjectRow], sheets: &[SheetRow]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut p_stmt = tx.prepare(
            "INSERT OR REPLACE INTO projects
             (stem, document_id, project_number, project_name, facility_address,
              development_level, alt_project_number, sheet_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for p in projects {
            p_stmt.execute(rusqlite::params![
                p.stem,
                p.document_id,
                p.project_number,
                p.project_name,
                p.facility_address,
                p.development_level,
                p.alt_project_number,
                p.sheet_count,
            ])?;
        }

        let mut s_stmt = tx.prepare(
            "INSERT OR REPLACE INTO sheets
             (stem, position, title, building_id, drawing_tag, sheet_suffix, drawn_by, checked_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for s in sheets {
            s_stmt.execute(rusqlite::params![
                s.stem,
                s.position,
                s.title,
                s.building_id,
                s.drawing_tag,
                s.sheet_suffix,
                s.drawn_by,
                s.checked_by,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Archive files ──

pub fn save_archive_files(conn: &Connection, rows: &[ArchiveFileRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO archive_files
             (file_path, project_number, project_name, client, state, facility,
              year, sub_directory, file_name, file_type, extra_dirs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for r in rows {
            let extra_dirs = if r.extra_dirs.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&r.extra_dirs).unwrap_or_default())
            };
            count += stmt.execute(rusqlite::params![
                r.file_path,
                r.project_number,
                r.project_name,
                r.client,
                r.state,
                r.facility,
                r.year,
                r.sub_directory,
                r.file_name,
                r.file_type,
                extra_dirs,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Overview ──

pub struct OverviewRow {
    pub stem: String,
    pub project_number: String,
    pub project_name: String,
    pub development_level: String,
    pub facility_address: String,
    pub sheet_count: i64,
}

pub fn fetch_overview(
    conn: &Connection,
    level: Option<&str>,
    project: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(l) = level {
        conditions.push(format!("development_level = ?{}", params.len() + 1));
        params.push(Box::new(l.to_string()));
    }
    if let Some(p) = project {
        conditions.push(format!("project_number = ?{}", params.len() + 1));
        params.push(Box::new(p.to_string()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT stem, project_number, project_name, development_level,
                facility_address, sheet_count
         FROM projects{}
         ORDER BY project_number, stem
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(OverviewRow {
                stem: row.get(0)?,
                project_number: row.get(1)?,
                project_name: row.get(2)?,
                development_level: row.get(3)?,
                facility_address: row.get(4)?,
                sheet_count: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Export ──

/// One sheet per row with the header scalars repeated, ready for tabular
/// consumers.
#[derive(Debug, Serialize)]
pub struct FlatSheetRow {
    pub source: String,
    pub project_number: String,
    pub project_name: String,
    pub facility_address: String,
    pub development_level: String,
    pub alt_project_number: String,
    pub position: i64,
    pub title: String,
    pub building_id: String,
    pub drawing_tag: String,
    pub sheet_suffix: String,
    pub drawn_by: String,
    pub checked_by: String,
}

pub fn fetch_flat_rows(conn: &Connection) -> Result<Vec<FlatSheetRow>> {
    let mut stmt = conn.prepare(
        "SELECT p.stem, p.project_number, p.project_name, p.facility_address,
                p.development_level, p.alt_project_number,
                s.position, s.title, s.building_id, s.drawing_tag,
                s.sheet_suffix, s.drawn_by, s.checked_by
         FROM projects p
         JOIN sheets s ON s.stem = p.stem
         ORDER BY p.stem, s.position",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FlatSheetRow {
                source: row.get(0)?,
                project_number: row.get(1)?,
                project_name: row.get(2)?,
                facility_address: row.get(3)?,
                development_level: row.get(4)?,
                alt_project_number: row.get(5)?,
                position: row.get(6)?,
                title: row.get(7)?,
                building_id: row.get(8)?,
                drawing_tag: row.get(9)?,
                sheet_suffix: row.get(10)?,
                drawn_by: row.get(11)?,
                checked_by: row.get(12)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub converted: usize,
    pub unconverted: usize,
    pub errors: usize,
    pub mined: usize,
    pub sheets: usize,
    pub archive_files: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let converted: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE converted = 1",
        [],
        |r| r.get(0),
    )?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM document_text WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let mined: usize = conn.query_row("SELECT COUNT(*) FROM projects", [], |r| r.get(0))?;
    let sheets: usize = conn.query_row("SELECT COUNT(*) FROM sheets", [], |r| r.get(0))?;
    let archive_files: usize =
        conn.query_row("SELECT COUNT(*) FROM archive_files", [], |r| r.get(0))?;
    Ok(Stats {
        total,
        converted,
        unconverted: total - converted,
        errors,
        mined,
        sheets,
        archive_files,
    })
}
