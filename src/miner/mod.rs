pub mod fields;
pub mod record;
pub mod scan;
pub mod schedule;

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};

use crate::db::{ProjectRow, SheetRow, TextDocument};

pub struct MinedData {
    pub project: ProjectRow,
    pub sheets: Vec<SheetRow>,
}

/// Single-pass pipeline: converted text export → line scan → flattened rows.
pub fn process_document(doc: &TextDocument) -> Result<MinedData> {
    let file = File::open(&doc.text_path)
        .with_context(|| format!("Failed to open text export {}", doc.text_path))?;
    let record = scan::scan_reader(&doc.stem, BufReader::new(file))
        .with_context(|| format!("Failed to read text export {}", doc.text_path))?;
    let (project, sheets) = record.into_rows(doc.document_id);
    Ok(MinedData { project, sheets })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::record::UNKNOWN;

    fn mine(fixture: &str) -> MinedData {
        let doc = TextDocument {
            document_id: 1,
            stem: fixture.to_string(),
            text_path: format!("tests/fixtures/{}.txt", fixture),
        };
        process_document(&doc).unwrap()
    }

    #[test]
    fn hospital_dd_header() {
        let data = mine("hospital_dd");
        let p = &data.project;
        assert_eq!(p.project_number, "23-145");
        assert_eq!(p.facility_address, "AMARILLO TX");
        assert_eq!(p.development_level, "DESIGN DEVELOPMENT");
        assert_eq!(p.project_name, "MAIN HOSPITAL");
        assert_eq!(p.alt_project_number, "544-21-101");
    }

    #[test]
    fn hospital_dd_sheets() {
        let data = mine("hospital_dd");
        assert_eq!(data.project.sheet_count, 2);
        assert_eq!(data.sheets.len(), 2);

        let titles: Vec<&str> = data.sheets.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["FIRST FLOOR PLAN", "SECOND FLOOR PLAN"]);

        let first = &data.sheets[0];
        assert_eq!(first.checked_by, "JD");
        assert_eq!(first.drawn_by, "MT");
        assert_eq!(first.building_id, "BLDG 1");
        assert_eq!(first.drawing_tag, "101");
        assert_eq!(first.sheet_suffix, "1");

        let second = &data.sheets[1];
        assert_eq!(second.checked_by, "KW");
        assert_eq!(second.drawing_tag, "102");
        assert_eq!(second.sheet_suffix, "2");
    }

    #[test]
    fn clinic_sd_unresolved_fields_land_placeholders() {
        let data = mine("clinic_sd");
        let p = &data.project;
        assert_eq!(p.project_number, "24-012");
        assert_eq!(p.facility_address, UNKNOWN);
        assert_eq!(p.development_level, "100% SCHEMATIC DESIGN");
        assert_eq!(p.project_name, UNKNOWN);
        assert_eq!(p.alt_project_number, "504-24-008");

        assert_eq!(data.sheets.len(), 1);
        let sheet = &data.sheets[0];
        assert_eq!(sheet.title, "SITE PLAN");
        assert_eq!(sheet.checked_by, UNKNOWN);
        assert_eq!(sheet.drawn_by, "RS");
        assert_eq!(sheet.building_id, UNKNOWN);
        assert_eq!(sheet.drawing_tag, "001");
        assert_eq!(sheet.sheet_suffix, "C-001");
    }

    #[test]
    fn missing_text_export_is_an_error() {
        let doc = TextDocument {
            document_id: 1,
            stem: "nope".into(),
            text_path: "tests/fixtures/does_not_exist.txt".into(),
        };
        assert!(process_document(&doc).is_err());
    }
}
