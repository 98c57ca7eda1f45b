use crate::db::{ProjectRow, SheetRow};

/// Placeholder written for any field that never resolves.
pub const UNKNOWN: &str = "Unknown";

/// Everything mined from one drawing-set text export. Owned by a single
/// scan; handed to the save layer once the stream is exhausted and never
/// mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRecord {
    pub source: String,
    // Header fields, set at most once per document. None = unresolved.
    pub project_number: Option<String>,
    pub facility_address: Option<String>,
    pub development_level: Option<String>,
    pub project_name: Option<String>,
    pub alt_project_number: Option<String>,
    // Per-sheet fields, parallel sequences; sheet k is element k of each.
    pub sheet_titles: Vec<String>,
    pub checked_by: Vec<String>,
    pub drawn_by: Vec<String>,
    pub building_ids: Vec<String>,
    pub drawing_tags: Vec<String>,
    pub sheet_suffixes: Vec<String>,
}

impl SheetRecord {
    pub fn new(source: &str) -> Self {
        SheetRecord {
            source: source.to_string(),
            project_number: None,
            facility_address: None,
            development_level: None,
            project_name: None,
            alt_project_number: None,
            sheet_titles: Vec::new(),
            checked_by: Vec::new(),
            drawn_by: Vec::new(),
            building_ids: Vec::new(),
            drawing_tags: Vec::new(),
            sheet_suffixes: Vec::new(),
        }
    }

    /// Number of sheets in the record: the longest per-sheet sequence.
    /// All six are equal after any completed cycle traversal; they can only
    /// differ when the stream ends mid-cycle.
    pub fn sheet_count(&self) -> usize {
        [
            self.sheet_titles.len(),
            self.checked_by.len(),
            self.drawn_by.len(),
            self.building_ids.len(),
            self.drawing_tags.len(),
            self.sheet_suffixes.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Flatten into one project row plus one row per sheet, with header
    /// scalars repeated across rows and any tail gap padded with the
    /// placeholder.
    pub fn into_rows(self, document_id: i64) -> (ProjectRow, Vec<SheetRow>) {
        let count = self.sheet_count();

        let sheets = (0..count)
            .map(|i| SheetRow {
                stem: self.source.clone(),
                position: i as i64,
                title: nth(&self.sheet_titles, i),
                building_id: nth(&self.building_ids, i),
                drawing_tag: nth(&self.drawing_tags, i),
                sheet_suffix: nth(&self.sheet_suffixes, i),
                drawn_by: nth(&self.drawn_by, i),
                checked_by: nth(&self.checked_by, i),
            })
            .collect();

        let project = ProjectRow {
            stem: self.source,
            document_id,
            project_number: self.project_number.unwrap_or_else(|| UNKNOWN.into()),
            project_name: self.project_name.unwrap_or_else(|| UNKNOWN.into()),
            facility_address: self.facility_address.unwrap_or_else(|| UNKNOWN.into()),
            development_level: self.development_level.unwrap_or_else(|| UNKNOWN.into()),
            alt_project_number: self.alt_project_number.unwrap_or_else(|| UNKNOWN.into()),
            sheet_count: count as i64,
        };

        (project, sheets)
    }
}

fn nth(seq: &[String], i: usize) -> String {
    seq.get(i).cloned().unwrap_or_else(|| UNKNOWN.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_flattens_to_unknowns() {
        let rec = SheetRecord::new("empty_set");
        let (project, sheets) = rec.into_rows(1);
        assert_eq!(project.project_number, UNKNOWN);
        assert_eq!(project.project_name, UNKNOWN);
        assert_eq!(project.sheet_count, 0);
        assert!(sheets.is_empty());
    }

    #[test]
    fn scalars_repeat_across_sheet_rows() {
        let mut rec = SheetRecord::new("set_a");
        rec.project_number = Some("23-145".into());
        rec.sheet_titles = vec!["FIRST FLOOR PLAN".into(), "SECOND FLOOR PLAN".into()];
        rec.checked_by = vec!["JD".into(), "KW".into()];
        rec.drawn_by = vec!["MT".into(), "MT".into()];
        rec.building_ids = vec!["BLDG 1".into(), "BLDG 1".into()];
        rec.drawing_tags = vec!["101".into(), "102".into()];
        rec.sheet_suffixes = vec!["1".into(), "2".into()];

        let (project, sheets) = rec.into_rows(7);
        assert_eq!(project.sheet_count, 2);
        assert_eq!(sheets.len(), 2);
        assert!(sheets.iter().all(|s| s.stem == "set_a"));
        assert_eq!(sheets[1].title, "SECOND FLOOR PLAN");
        assert_eq!(sheets[1].position, 1);
    }

    #[test]
    fn uneven_sequences_pad_with_placeholder() {
        let mut rec = SheetRecord::new("set_b");
        rec.sheet_titles = vec!["SITE PLAN".into(), "ROOF PLAN".into()];
        rec.checked_by = vec!["JD".into()];

        let (project, sheets) = rec.into_rows(1);
        assert_eq!(project.sheet_count, 2);
        assert_eq!(sheets[1].checked_by, UNKNOWN);
        assert_eq!(sheets[1].drawing_tag, UNKNOWN);
    }
}
