//! CSV reading
//!
//! Turns spreadsheet export text into a [`RawTable`]: normalized headers plus
//! string cells. Header naming follows the conventions the alias table relies
//! on:
//!
//! - runs of whitespace collapse to one space,
//! - a blank header becomes `Unnamed: <index>`,
//! - a repeated header gets a `.1`, `.2`, ... suffix so the first one keeps
//!   its name.

use std::collections::HashMap;

use csv::ReaderBuilder;
use fichas_core::{collapse_whitespace, SourceError};
use tracing::{debug, warn};

/// Header row and data rows of a CSV document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// `(header, value)` pairs of one row; cells past the end of a short row are skipped
    pub fn row_pairs(&self, index: usize) -> impl Iterator<Item = (&str, &str)> + '_ {
        let row = self.rows.get(index).map(Vec::as_slice).unwrap_or_default();
        self.headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn malformed(source_id: &str, reason: impl Into<String>) -> SourceError {
    SourceError::Malformed {
        source_id: source_id.to_string(),
        reason: reason.into(),
    }
}

/// Decode a CSV document as UTF-8
pub fn decode_csv<'a>(bytes: &'a [u8], source_id: &str) -> Result<&'a str, SourceError> {
    std::str::from_utf8(bytes)
        .map_err(|e| malformed(source_id, format!("CSV is not valid UTF-8: {e}")))
}

/// Parse CSV text with a header row
pub fn read_csv(text: &str, source_id: &str) -> Result<RawTable, SourceError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let head: String = text.trim_start().chars().take(15).collect::<String>().to_ascii_lowercase();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        return Err(malformed(
            source_id,
            "received an HTML page instead of CSV (is the spreadsheet shared publicly?)",
        ));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let raw_headers = reader
        .headers()
        .map_err(|e| malformed(source_id, format!("failed to read header row: {e}")))?
        .clone();

    if raw_headers.is_empty() {
        return Err(malformed(source_id, "no header row"));
    }

    let headers = name_headers(raw_headers.iter());
    debug!(source = source_id, columns = headers.len(), "read CSV header row");

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            // Data rows start on line 2
            malformed(source_id, format!("failed to parse row {}: {e}", index + 2))
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

fn name_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    raw.enumerate()
        .map(|(index, header)| {
            let mut name = collapse_whitespace(header);
            if name.is_empty() {
                name = format!("Unnamed: {index}");
            }

            let occurrences = seen.entry(name.clone()).or_insert(0);
            let unique = if *occurrences == 0 {
                name
            } else {
                warn!(header = %name, "duplicate CSV header, renaming later occurrence");
                format!("{name}.{occurrences}")
            };
            *occurrences += 1;
            unique
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_headers_get_positional_names() {
        let table = read_csv("Endereço,,,Bairro\nRua A,10,Centro,x\n", "test").unwrap();
        assert_eq!(table.headers, vec!["Endereço", "Unnamed: 1", "Unnamed: 2", "Bairro"]);
    }

    #[test]
    fn header_whitespace_is_collapsed() {
        let table = read_csv("\"Nome   Completo \",\" Telefone\n(31)9xxxx-xxxx\"\nAna,1\n", "test")
            .unwrap();
        assert_eq!(table.headers, vec!["Nome Completo", "Telefone (31)9xxxx-xxxx"]);
    }

    #[test]
    fn duplicate_headers_are_suffixed() {
        let table = read_csv("Nome,Nome,Nome\na,b,c\n", "test").unwrap();
        assert_eq!(table.headers, vec!["Nome", "Nome.1", "Nome.2"]);
    }

    #[test]
    fn bom_is_stripped() {
        let table = read_csv("\u{feff}Nome\nAna\n", "test").unwrap();
        assert_eq!(table.headers, vec!["Nome"]);
        assert_eq!(table.rows, vec![vec!["Ana".to_string()]]);
    }

    #[test]
    fn ragged_rows_are_accepted() {
        let table = read_csv("A,B,C\n1\n1,2,3,4\n", "test").unwrap();
        assert_eq!(table.len(), 2);
        let short: Vec<_> = table.row_pairs(0).collect();
        assert_eq!(short, vec![("A", "1")]);
        let long: Vec<_> = table.row_pairs(1).collect();
        assert_eq!(long, vec![("A", "1"), ("B", "2"), ("C", "3")]);
    }

    #[test]
    fn empty_input_is_malformed() {
        let err = read_csv("", "sheet-0").unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
        assert_eq!(err.source_id(), "sheet-0");
    }

    #[test]
    fn html_page_is_malformed() {
        let err = read_csv("<!DOCTYPE html><html><body>Sign in</body></html>", "sheet-0")
            .unwrap_err();
        assert!(err.to_string().contains("HTML"));
    }

    #[test]
    fn latin1_bytes_are_malformed() {
        let err = decode_csv(b"Nome Completo\nJo\xe3o\n", "sheet-0").unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn utf8_bytes_decode() {
        let text = decode_csv("Nome Completo\nJoão\n".as_bytes(), "sheet-0").unwrap();
        assert_eq!(read_csv(text, "sheet-0").unwrap().rows, vec![vec!["João".to_string()]]);
    }

    #[test]
    fn header_only_table_has_no_rows() {
        let table = read_csv("Nome,Situação da Demanda\n", "test").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers.len(), 2);
    }
}
