use std::io::BufRead;

use super::fields::{Feed, Field};
use super::record::SheetRecord;
use super::schedule::Schedule;

/// Line-by-line driver over one drawing-set text export. Holds the scan's
/// entire mutable state: the schedule cursors, the single pending-extractor
/// slot, and the record being accumulated. One instance per document;
/// nothing is shared across scans.
pub struct Scanner {
    schedule: Schedule,
    pending: Option<Field>,
    record: SheetRecord,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            schedule: Schedule::new(),
            pending: None,
            record: SheetRecord::new(source),
        }
    }

    /// Dispatch one line. Order per visit: the pending extractor first (a
    /// resolution consumes the line outright), then the next expected
    /// header trigger, then the repeating front. Header and repeating
    /// checks are mutually exclusive per line, header first.
    pub fn feed_line(&mut self, raw: &str) {
        let line = raw.trim();

        if let Some(field) = self.pending {
            if field.feed(Feed::Line(line), &mut self.record) {
                self.pending = None;
                return;
            }
            // Unresolved: the same line may still carry the next trigger.
        }

        if let Some(directive) = self.schedule.peek_one_shot() {
            if line.contains(directive.trigger) {
                let field = directive.field;
                self.finalize_pending();
                self.schedule.consume_one_shot();
                if !field.feed(Feed::Line(line), &mut self.record) {
                    self.pending = Some(field);
                }
                return;
            }
        }

        let directive = self.schedule.peek_repeating();
        if line.contains(directive.trigger) {
            let field = directive.field;
            self.finalize_pending();
            if !field.feed(Feed::Line(line), &mut self.record) {
                self.pending = Some(field);
            }
            // The cycle advances whether or not the extractor resolved.
            self.schedule.advance_repeating();
        }
    }

    /// Force the in-flight field, if any, to its placeholder. Called when a
    /// new trigger supersedes it and again at stream exhaustion, so every
    /// triggered visit lands exactly one value.
    fn finalize_pending(&mut self) {
        if let Some(field) = self.pending.take() {
            field.feed(Feed::Finalize, &mut self.record);
        }
    }

    /// Exhaust the scan and hand over the record.
    pub fn finish(mut self) -> SheetRecord {
        self.finalize_pending();
        self.record
    }
}

/// Scan a whole text export already in memory.
pub fn scan_text(source: &str, text: &str) -> SheetRecord {
    let mut scanner = Scanner::new(source);
    for line in text.lines() {
        scanner.feed_line(line);
    }
    scanner.finish()
}

/// Scan a line stream, consuming it front to back with no lookahead. The
/// reader is dropped (closed) when the scan ends, early termination
/// included.
pub fn scan_reader<R: BufRead>(source: &str, reader: R) -> std::io::Result<SheetRecord> {
    let mut scanner = Scanner::new(source);
    for line in reader.lines() {
        scanner.feed_line(&line?);
    }
    Ok(scanner.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::record::UNKNOWN;

    const HEADER: &str = "\
Drawing Sheet Index
Project No. 23-145 Rev 2
Location
AMARILLO TX
Phase
DESIGN DEVELOPMENT
Project Title
MAIN
HOSPITAL
Seal and Signature
VA Project No. 544-21-101
";

    #[test]
    fn header_fields_mined_in_order() {
        let rec = scan_text("set_a", HEADER);
        assert_eq!(rec.project_number.as_deref(), Some("23-145"));
        assert_eq!(rec.facility_address.as_deref(), Some("AMARILLO TX"));
        assert_eq!(rec.development_level.as_deref(), Some("DESIGN DEVELOPMENT"));
        assert_eq!(rec.project_name.as_deref(), Some("MAIN HOSPITAL"));
        assert_eq!(rec.alt_project_number.as_deref(), Some("544-21-101"));
    }

    #[test]
    fn repeating_cycle_collects_one_sheet() {
        let text = "Drawing Title\nFIRST FLOOR PLAN\nChecked\nJD\n";
        let rec = scan_text("set_b", text);
        assert_eq!(rec.sheet_titles, vec!["FIRST FLOOR PLAN"]);
        assert_eq!(rec.checked_by, vec!["JD"]);
    }

    #[test]
    fn scans_are_deterministic() {
        let text = format!("{HEADER}\nDrawing Title\nSITE PLAN\nChecked\nJD\n");
        let first = scan_text("set_c", &text);
        let second = scan_text("set_c", &text);
        assert_eq!(first, second);
    }

    #[test]
    fn one_shot_field_set_at_most_once() {
        // A second project-number line arrives after the directive is spent;
        // it must not overwrite the first value.
        let text = "Project No. 23-145\nLocation\nProject No. 99-999\nDALLAS TX\n";
        let rec = scan_text("set_d", text);
        assert_eq!(rec.project_number.as_deref(), Some("23-145"));
        assert_eq!(rec.facility_address.as_deref(), Some("DALLAS TX"));
    }

    #[test]
    fn new_trigger_finalizes_pending_field() {
        // Location's extractor never sees an upper-case line before the
        // Phase trigger fires, so the address lands its placeholder first.
        let text = "Project No. 24-012\nLocation\nPhase\n100% SCHEMATIC DESIGN\n";
        let rec = scan_text("set_e", text);
        assert_eq!(rec.facility_address.as_deref(), Some(UNKNOWN));
        assert_eq!(rec.development_level.as_deref(), Some("100% SCHEMATIC DESIGN"));
    }

    #[test]
    fn pending_field_finalized_at_stream_end() {
        let text = "Drawing Title\n";
        let rec = scan_text("set_f", text);
        assert_eq!(rec.sheet_titles, vec![UNKNOWN]);
    }

    #[test]
    fn cycle_parity_after_full_traversals() {
        let text = "\
Drawing Title
FIRST FLOOR PLAN
Checked
JD
Drawn
MT
Building
BLDG 1
Drawing No. 101
Sheet No. A-101.1
Drawing Title
SECOND FLOOR PLAN
Checked
KW
Drawn
MT
Building
BLDG 1
Drawing No. 102
Sheet No. A-101.2
";
        let rec = scan_text("set_g", text);
        assert_eq!(rec.sheet_titles.len(), 2);
        assert_eq!(rec.checked_by.len(), 2);
        assert_eq!(rec.drawn_by.len(), 2);
        assert_eq!(rec.building_ids.len(), 2);
        assert_eq!(rec.drawing_tags.len(), 2);
        assert_eq!(rec.sheet_suffixes.len(), 2);
        assert_eq!(rec.sheet_titles[1], "SECOND FLOOR PLAN");
        assert_eq!(rec.drawing_tags, vec!["101", "102"]);
        assert_eq!(rec.sheet_suffixes, vec!["1", "2"]);
    }

    #[test]
    fn resolving_line_is_consumed_for_scheduling() {
        // "AMARILLO PHASE ONE" resolves the pending address; the embedded
        // "Phase" must not fire the next header trigger on the same line.
        let text = "Project No. 23-145\nLocation\nAMARILLO PHASE ONE CAMPUS\nPhase\nDESIGN DEVELOPMENT\n";
        let rec = scan_text("set_h", text);
        assert_eq!(rec.facility_address.as_deref(), Some("AMARILLO PHASE ONE CAMPUS"));
        assert_eq!(rec.development_level.as_deref(), Some("DESIGN DEVELOPMENT"));
    }

    #[test]
    fn reader_scan_matches_text_scan() {
        let text = format!("{HEADER}Drawing Title\nROOF PLAN\n");
        let from_reader =
            scan_reader("set_i", std::io::Cursor::new(text.clone())).unwrap();
        let from_text = scan_text("set_i", &text);
        assert_eq!(from_reader, from_text);
    }
}
