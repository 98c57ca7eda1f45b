use std::sync::LazyLock;

use regex::Regex;

use super::record::{SheetRecord, UNKNOWN};

static PROJECT_NO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{2}-\d{3}\b").unwrap());
static ALT_PROJECT_NO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{3}\b").unwrap());
static INITIALS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]{2,3}\b").unwrap());
static UPPER_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]{2,}").unwrap());
static DRAWING_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3}\b").unwrap());

/// Stamp boilerplate that satisfies the upper-case-run rule but is never
/// the development-level label.
const LEVEL_FALSE_POSITIVE: &str = "FULLY SPRINKLERED";

/// Label words whose presence marks a line as the title-block label itself
/// rather than a building identifier.
const BUILDING_LABEL_WORDS: &[&str] = &["Building", "Drawing"];

/// Input to a field extractor: a real line of text, or the finalize signal
/// sent when the field must resolve to its placeholder immediately.
#[derive(Debug, Clone, Copy)]
pub enum Feed<'a> {
    Line(&'a str),
    Finalize,
}

/// One mineable title-block field. Doubles as the dispatch tag for its
/// extraction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ProjectNumber,
    FacilityAddress,
    DevelopmentLevel,
    ProjectName,
    AltProjectNumber,
    SheetTitle,
    CheckedBy,
    DrawnBy,
    BuildingId,
    DrawingTag,
    SheetSuffix,
}

impl Field {
    /// Feed one line (or the finalize signal) to this field's extractor.
    /// Returns true once the field holds its final value for the current
    /// record or cycle visit; false means keep feeding lines. Finalize
    /// always assigns/appends exactly one placeholder and returns true.
    pub fn feed(self, input: Feed<'_>, rec: &mut SheetRecord) -> bool {
        match self {
            Field::ProjectNumber => project_number(input, rec),
            Field::FacilityAddress => facility_address(input, rec),
            Field::DevelopmentLevel => development_level(input, rec),
            Field::ProjectName => project_name(input, rec),
            Field::AltProjectNumber => alt_project_number(input, rec),
            Field::SheetTitle => sheet_title(input, rec),
            Field::CheckedBy => checked_by(input, rec),
            Field::DrawnBy => drawn_by(input, rec),
            Field::BuildingId => building_id(input, rec),
            Field::DrawingTag => drawing_tag(input, rec),
            Field::SheetSuffix => sheet_suffix(input, rec),
        }
    }
}

/// No lower-case letters and at least one upper-case one.
fn is_upper_line(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_uppercase()) && !s.chars().any(|c| c.is_lowercase())
}

// ── Header extractors ──

fn project_number(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.project_number = Some(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    match PROJECT_NO_RE.find(line) {
        Some(m) => {
            rec.project_number = Some(m.as_str().to_string());
            true
        }
        None => false,
    }
}

fn facility_address(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.facility_address = Some(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    if is_upper_line(line) && line.len() > 2 {
        rec.facility_address = Some(line.to_string());
        true
    } else {
        false
    }
}

fn development_level(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.development_level = Some(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    if line.contains(LEVEL_FALSE_POSITIVE) {
        return false;
    }
    if UPPER_RUN_RE.is_match(line) {
        rec.development_level = Some(line.to_string());
        true
    } else {
        false
    }
}

/// The project title may span several consecutive upper-case lines. A
/// non-upper line before any text means the title has not started yet; a
/// non-upper line after some text terminates it.
fn project_name(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.project_name = Some(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    if is_upper_line(line) {
        match rec.project_name.as_mut() {
            Some(title) => {
                title.push(' ');
                title.push_str(line);
            }
            None => rec.project_name = Some(line.to_string()),
        }
        false
    } else {
        rec.project_name.is_some()
    }
}

fn alt_project_number(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.alt_project_number = Some(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    match ALT_PROJECT_NO_RE.find(line) {
        Some(m) => {
            rec.alt_project_number = Some(m.as_str().to_string());
            true
        }
        None => false,
    }
}

// ── Per-sheet extractors ──

fn sheet_title(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.sheet_titles.push(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    if is_upper_line(line) && line.len() > 3 {
        rec.sheet_titles.push(line.to_string());
        true
    } else {
        false
    }
}

fn checked_by(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.checked_by.push(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    match INITIALS_RE.find(line) {
        Some(m) => {
            rec.checked_by.push(m.as_str().to_string());
            true
        }
        None => false,
    }
}

fn drawn_by(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.drawn_by.push(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    match INITIALS_RE.find(line) {
        Some(m) => {
            rec.drawn_by.push(m.as_str().to_string());
            true
        }
        None => false,
    }
}

fn building_id(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.building_ids.push(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    if line.contains('#') || line.len() < 2 {
        return false;
    }
    if BUILDING_LABEL_WORDS.iter().any(|w| line.contains(w)) {
        return false;
    }
    rec.building_ids.push(line.trim().to_string());
    true
}

fn drawing_tag(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.drawing_tags.push(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    match DRAWING_TAG_RE.find(line) {
        Some(m) => {
            rec.drawing_tags.push(m.as_str().to_string());
            true
        }
        None => false,
    }
}

/// The NCS-style sheet number carries the sheet index after its final dot
/// ("A-101.24" → "24"). Lines without a dot are taken whole.
fn sheet_suffix(input: Feed<'_>, rec: &mut SheetRecord) -> bool {
    let line = match input {
        Feed::Finalize => {
            rec.sheet_suffixes.push(UNKNOWN.into());
            return true;
        }
        Feed::Line(l) => l,
    };
    let remainder = match line.rfind('.') {
        Some(i) => &line[i + 1..],
        None => line,
    };
    let remainder = remainder.trim();
    if remainder.is_empty() {
        false
    } else {
        rec.sheet_suffixes.push(remainder.to_string());
        true
    }
}
