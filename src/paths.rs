use std::collections::HashSet;
use std::sync::LazyLock;

const UNKNOWN: &str = "Unknown";

/// Clutter extensions that disqualify a file from the archive index.
const IGNORED_FILE_TYPES: &[&str] = &[".bak", ".rws", ".slog", ".dat", ".db"];

const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC", "PR", "GU", "VI", "AS", "MP",
];

/// Letter-forms of the traditional abbreviations ("Ala." → "ALA"), which
/// older project directories use interchangeably with postal codes.
const TRADITIONAL_CODES: &[&str] = &[
    "ALA", "ARIZ", "ARK", "CALIF", "COLO", "CONN", "DEL", "FLA", "ILL", "IND", "KAN", "MASS",
    "MICH", "MINN", "MISS", "MONT", "NEB", "NEV", "MEX", "OKLA", "ORE", "TENN", "TEX", "WASH",
    "WIS", "WYO",
];

static STATE_CODE_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    STATE_CODES
        .iter()
        .chain(TRADITIONAL_CODES.iter())
        .chain(["US", "SS"].iter())
        .copied()
        .collect()
});

/// One archive file path, tokenized into project labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFileRow {
    pub file_path: String,
    pub project_number: String,
    pub project_name: String,
    pub client: String,
    pub state: String,
    pub facility: String,
    pub year: String,
    pub sub_directory: String,
    pub file_name: String,
    pub file_type: String,
    pub extra_dirs: Vec<String>,
}

/// Tokenize a project file path into labels. Returns None for paths that do
/// not look like project files: too few directories, an ignored file type,
/// or a project directory whose leading number is too short (pre-2015
/// directories carry 7-digit dates instead of project numbers; anything
/// under 5 digits is noise).
pub fn parse_file_path(path: &str) -> Option<ArchiveFileRow> {
    let parts: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 6 {
        return None;
    }

    let file_name = *parts.last().unwrap();
    let (file_type, ignored) = find_file_type(file_name);
    if ignored {
        return None;
    }

    let year = find_year(parts[2]);

    let project_dir = parts[3].trim();
    let (state, remaining) = split_state(project_dir);
    let (project_number, remaining, digit_count) = take_project_number(remaining);
    if digit_count < 5 {
        return None;
    }
    let (client, project_name) = take_client(remaining);
    let facility = find_facility(&project_name);

    let sub_directory = parts[4].to_string();
    let extra_dirs: Vec<String> = parts[5..parts.len() - 1]
        .iter()
        .map(|d| d.to_string())
        .collect();

    Some(ArchiveFileRow {
        file_path: path.to_string(),
        project_number,
        project_name,
        client,
        state,
        facility,
        year,
        sub_directory,
        file_name: file_name.to_string(),
        file_type,
        extra_dirs,
    })
}

fn find_file_type(file_name: &str) -> (String, bool) {
    let file_type = match file_name.rfind('.') {
        Some(i) => &file_name[i..],
        None => return (UNKNOWN.to_string(), false),
    };
    let ignored = IGNORED_FILE_TYPES.contains(&file_type.to_ascii_lowercase().as_str());
    (file_type.to_string(), ignored)
}

fn find_year(year_dir: &str) -> String {
    let year: String = year_dir.chars().take(4).collect();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        year
    } else {
        UNKNOWN.to_string()
    }
}

/// Split a trailing state code off the project directory name. The code is
/// the run of letters at the very end; anything not in the lookup set means
/// no state was encoded.
fn split_state(content: &str) -> (String, &str) {
    let tail_start = content
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic())
        .last()
        .map(|(i, _)| i);
    let Some(start) = tail_start else {
        return (UNKNOWN.to_string(), content);
    };
    let code = content[start..].to_uppercase();
    if start == 0 || !STATE_CODE_SET.contains(code.as_str()) {
        return (UNKNOWN.to_string(), content);
    }
    // Drop the separator character before the code as well.
    let rest_end = content[..start].char_indices().next_back().map(|(i, _)| i).unwrap_or(0);
    (code, &content[..rest_end])
}

/// Consume the leading project number: digits and dashes, allowing a 'Q'
/// only when a digit follows it (quarter-coded numbers). Returns the
/// number, the rest of the directory name, and how many digits were seen.
fn take_project_number(content: &str) -> (String, &str, usize) {
    let chars: Vec<char> = content.chars().collect();
    let mut end = chars.len();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphabetic() {
            let q_coded = c == 'Q' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if !q_coded {
                end = i;
                break;
            }
        }
    }
    let consumed: String = chars[..end].iter().collect();
    let digit_count = consumed.chars().filter(|c| c.is_ascii_digit()).count();
    let number = consumed.trim_matches([' ', '-']).to_string();
    (number, &content[consumed.len()..], digit_count)
}

/// The client is the leading run of letters after the project number.
fn take_client(content: &str) -> (String, String) {
    let end = content
        .find(|c: char| !c.is_alphabetic())
        .unwrap_or(content.len());
    let client = content[..end].to_string();
    let remaining = content[end..].trim_matches(['-', ' ']).to_string();
    (client, remaining)
}

/// The facility is whatever precedes the last dash of the project name.
fn find_facility(content: &str) -> String {
    match content.rfind('-') {
        Some(i) => content[..i].trim_matches([' ', '-']).to_string(),
        None => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str =
        r"P:\Projects\2020\20-398 - VA Amarillo - Ambulatory Care TX\Drawings\Current\site_plan.dwg";

    #[test]
    fn full_project_path() {
        let row = parse_file_path(PATH).unwrap();
        assert_eq!(row.year, "2020");
        assert_eq!(row.project_number, "20-398");
        assert_eq!(row.client, "VA");
        assert_eq!(row.state, "TX");
        assert_eq!(row.project_name, "Amarillo - Ambulatory Care");
        assert_eq!(row.facility, "Amarillo");
        assert_eq!(row.sub_directory, "Drawings");
        assert_eq!(row.extra_dirs, vec!["Current"]);
        assert_eq!(row.file_name, "site_plan.dwg");
        assert_eq!(row.file_type, ".dwg");
    }

    #[test]
    fn forward_slash_paths_parse_too() {
        let path = "P:/Projects/2019/19-020 - VA Dallas TX/Specs/div01.docx";
        let row = parse_file_path(path).unwrap();
        assert_eq!(row.project_number, "19-020");
        assert_eq!(row.state, "TX");
    }

    #[test]
    fn shallow_paths_are_skipped() {
        assert!(parse_file_path(r"P:\Projects\notes.txt").is_none());
    }

    #[test]
    fn ignored_file_types_are_skipped() {
        let path = r"P:\Projects\2020\20-398 - VA Amarillo TX\Drawings\backup.bak";
        assert!(parse_file_path(path).is_none());
    }

    #[test]
    fn short_project_numbers_are_skipped() {
        // Pre-project-number directories ("14 - Admin") carry too few digits.
        let path = r"P:\Projects\2014\14 - Admin TX\Docs\Misc\memo.pdf";
        assert!(parse_file_path(path).is_none());
    }

    #[test]
    fn q_coded_numbers_consume_past_the_q() {
        let (number, _, digits) = take_project_number("20-3Q98 - VA Amarillo");
        assert_eq!(number, "20-3Q98");
        assert_eq!(digits, 5);
    }

    #[test]
    fn unknown_state_leaves_directory_intact() {
        let path = r"P:\Projects\2021\21-100 - City Hall Annex\Drawings\Arch\plan.dwg";
        let row = parse_file_path(path).unwrap();
        assert_eq!(row.state, UNKNOWN);
        // The leading word is still consumed as the client label.
        assert_eq!(row.client, "City");
        assert_eq!(row.project_name, "Hall Annex");
    }

    #[test]
    fn no_dash_means_no_facility() {
        let path = r"P:\Projects\2020\20-398 - VA Amarillo TX\Drawings\Arch\plan.dwg";
        let row = parse_file_path(path).unwrap();
        assert_eq!(row.project_name, "Amarillo");
        assert_eq!(row.facility, UNKNOWN);
    }

    #[test]
    fn year_requires_four_digits() {
        assert_eq!(find_year("2020"), "2020");
        assert_eq!(find_year("2020_archive"), "2020");
        assert_eq!(find_year("archive"), UNKNOWN);
        assert_eq!(find_year("20"), UNKNOWN);
    }
}
